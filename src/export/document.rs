//! Markdown report rendering

use chrono::{DateTime, Utc};
use std::fmt::Write;

use super::{ExportRow, NOT_AVAILABLE};
use crate::links::display_link;
use crate::view::Summary;

/// Make text safe inside a table cell
fn cell(text: &str) -> String {
    text.replace('|', "\\|").replace(['\r', '\n'], " ")
}

fn links_cell(row: &ExportRow) -> String {
    let parts: Vec<String> = [
        row.links
            .repository
            .as_deref()
            .map(|url| format!("GitHub: {}", display_link(url))),
        row.links
            .package
            .as_deref()
            .map(|url| format!("NPM: {}", display_link(url))),
    ]
    .into_iter()
    .flatten()
    .map(|part| cell(&part))
    .collect();

    if parts.is_empty() {
        NOT_AVAILABLE.to_string()
    } else {
        parts.join("<br>")
    }
}

/// Title, generation time, summary table, then the package table
pub fn render_document(
    title: &str,
    generated_at: DateTime<Utc>,
    summary: &Summary,
    rows: &[ExportRow],
) -> String {
    let mut out = String::new();

    // writing into a String cannot fail
    let _ = writeln!(out, "# {}", cell(title));
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "Generated at {}",
        generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    let _ = writeln!(out);

    let _ = writeln!(out, "## Summary");
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "| Total Packages | Supported | Unsupported | Untested | Unlisted | Unmaintained |"
    );
    let _ = writeln!(out, "| ---: | ---: | ---: | ---: | ---: | ---: |");
    let _ = writeln!(
        out,
        "| {} | {} | {} | {} | {} | {} |",
        summary.total,
        summary.supported,
        summary.unsupported,
        summary.untested,
        summary.unlisted,
        summary.unmaintained
    );
    let _ = writeln!(out);

    let _ = writeln!(out, "## Packages");
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "| {} |",
        super::csv::CSV_HEADERS.join(" | ")
    );
    let _ = writeln!(out, "|{}", " --- |".repeat(super::csv::CSV_HEADERS.len()));

    for row in rows {
        let _ = writeln!(
            out,
            "| {} | {} | {} | {} | {} | {} | {} | {} | {} | {} |",
            row.index,
            cell(&row.name),
            cell(&row.architecture),
            cell(&row.maintenance),
            cell(&row.score),
            cell(&row.stars),
            cell(&row.last_updated),
            cell(&row.platforms),
            links_cell(row),
            cell(&row.alternatives),
        );
    }

    out
}
