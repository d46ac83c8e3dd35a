//! Rendering of an [`Analysis`] for people or scripts.

use std::fmt::{self, Write as _};

use crate::analyzer::{PlaneReport, PlaneState};
use crate::config::ReportFormat;
use crate::error::Result;
use crate::pipeline::Analysis;

/// Render `analysis` in the requested format.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn render(analysis: &Analysis, format: ReportFormat) -> Result<String> {
    match format {
        ReportFormat::Plain => Ok(render_plain(analysis)),
        ReportFormat::Json => Ok(serde_json::to_string_pretty(analysis)?),
    }
}

/// Human-readable report: one block per plane, then a summary.
#[must_use]
pub fn render_plain(analysis: &Analysis) -> String {
    let report = &analysis.report;
    let mut out = String::new();

    for plane in &report.planes {
        out.push('\n');
        write_plane(&mut out, plane);
    }

    out.push('\n');
    line(&mut out, format_args!("Number of 3D-Planes in stream: {}", report.plane_count));
    line(&mut out, format_args!("Number of empty 3D-Planes: {}", report.empty_planes));
    line(&mut out, format_args!("Number of OFMD records: {}", report.record_count));
    line(&mut out, format_args!("Number of frames: {}", report.total_frames));
    line(&mut out, format_args!("Framerate: {}", report.frame_rate));
    if analysis.scan.rejected_candidates > 0 {
        line(
            &mut out,
            format_args!("Rejected OFMD candidates: {}", analysis.scan.rejected_candidates),
        );
    }
    for truncated in &analysis.scan.truncated_records {
        line(&mut out, format_args!("Warning: {truncated}"));
    }
    out
}

fn write_plane(out: &mut String, plane: &PlaneReport) {
    let stats = match &plane.state {
        PlaneState::Empty => {
            line(out, format_args!("3D-Plane #{:02} is Empty!", plane.index));
            return;
        }
        PlaneState::Analyzed(stats) => stats,
    };

    line(out, format_args!("3D-Plane #{:02}", plane.index));
    line(out, format_args!("NumFrames: {}", plane.num_frames));
    line(out, format_args!("Minimum depth: {}", stats.min_depth));
    line(out, format_args!("Maximum depth: {}", stats.max_depth));
    line(out, format_args!("Average depth: {:.2}", stats.average_depth));
    line(out, format_args!("Number of changes of depth value: {}", stats.cuts));
    line(
        out,
        format_args!("First frame with a defined depth: {}", stats.first_defined_index),
    );
    line(
        out,
        format_args!("Last frame with a defined depth: {}", stats.last_defined_index),
    );
    line(
        out,
        format_args!("Number of frames with undefined depth: {}", stats.undefined_count),
    );
    if stats.identical_planes.is_empty() {
        line(out, format_args!("Identical Planes: None"));
    } else {
        let list: Vec<String> = stats
            .identical_planes
            .iter()
            .map(|i| format!("#{i:02}"))
            .collect();
        line(out, format_args!("Identical Planes: {}", list.join(" ")));
    }
    if stats.degenerate {
        line(
            out,
            format_args!(
                "*** Warning This 3D-Plane has a fixed depth of {}! ***",
                stats.min_depth
            ),
        );
    }
}

/// Append one line of text.
fn line(out: &mut String, text: fmt::Arguments<'_>) {
    // Formatting into a String is infallible
    let _ = out.write_fmt(text);
    out.push('\n');
}
