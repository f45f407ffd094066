//! CSV rendering

use super::{ExportRow, NOT_AVAILABLE};

/// Column headings, in output order
pub const CSV_HEADERS: [&str; 10] = [
    "#",
    "Package",
    "New Architecture",
    "Maintenance",
    "Score",
    "Stars",
    "Last Updated",
    "Platforms",
    "Links",
    "Alternatives",
];

/// Quote a cell, doubling embedded quotes
fn quote(cell: &str) -> String {
    format!("\"{}\"", cell.replace('"', "\"\""))
}

fn links_cell(row: &ExportRow) -> String {
    let parts: Vec<String> = [
        row.links.repository.as_ref().map(|url| format!("GitHub: {url}")),
        row.links.package.as_ref().map(|url| format!("NPM: {url}")),
    ]
    .into_iter()
    .flatten()
    .collect();

    if parts.is_empty() {
        NOT_AVAILABLE.to_string()
    } else {
        parts.join(" | ")
    }
}

/// Header plus one line per row, every cell quoted, lines joined with `\n`
pub fn render_csv(rows: &[ExportRow]) -> String {
    let header = CSV_HEADERS.map(quote).join(",");

    let lines = rows.iter().map(|row| {
        [
            row.index.to_string(),
            row.name.clone(),
            row.architecture.clone(),
            row.maintenance.clone(),
            row.score.clone(),
            row.stars.clone(),
            row.last_updated.clone(),
            row.platforms.clone(),
            links_cell(row),
            row.alternatives.clone(),
        ]
        .iter()
        .map(|cell| quote(cell))
        .collect::<Vec<_>>()
        .join(",")
    });

    std::iter::once(header)
        .chain(lines)
        .collect::<Vec<_>>()
        .join("\n")
}
