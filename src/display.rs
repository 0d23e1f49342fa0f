//! Markdown tables for the `ls` views.

use crate::metadata::{IndexDocument, LedgerDocument};

/// Render a Markdown table. Pipes and newlines inside cells are escaped so a
/// cell can never break the table layout.
pub fn markdown_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut md = String::new();

    md.push_str("| ");
    md.push_str(&headers.join(" | "));
    md.push_str(" |\n|");
    for _ in headers {
        md.push_str(" --- |");
    }
    md.push('\n');

    for row in rows {
        let cells: Vec<String> = row.iter().map(|c| escape_cell(c)).collect();
        md.push_str("| ");
        md.push_str(&cells.join(" | "));
        md.push_str(" |\n");
    }
    md
}

fn escape_cell(cell: &str) -> String {
    cell.replace('|', "\\|").replace('\n', " ")
}

/// `ls ds-md`: the root index summary block.
pub fn render_index_summary(doc: &IndexDocument) -> String {
    markdown_table(
        &["date_created", "number_of_collections", "collections"],
        &[vec![
            doc.metadata.created_at.clone(),
            doc.metadata.collection_count.to_string(),
            doc.metadata.collections.join(", "),
        ]],
    )
}

/// `ls ds-coll`: one row per registered collection.
pub fn render_collections(doc: &IndexDocument) -> String {
    let rows: Vec<Vec<String>> = doc
        .collections
        .iter()
        .map(|c| {
            vec![
                c.collection_name.clone(),
                c.created_at.clone(),
                c.last_modified_at.clone(),
                c.files.join(", "),
            ]
        })
        .collect();
    markdown_table(
        &["collection_name", "date_created", "date_last_modified", "files"],
        &rows,
    )
}

/// `ls coll-md`: a ledger's summary block.
pub fn render_ledger_summary(doc: &LedgerDocument) -> String {
    let meta = &doc.metadata;
    markdown_table(
        &[
            "collection_name",
            "date_created",
            "number_of_files",
            "most_recent_commit",
            "max_version",
        ],
        &[vec![
            meta.collection_name.clone(),
            meta.created_at.clone(),
            meta.file_count.to_string(),
            meta.most_recent_commit.clone(),
            meta.max_version.to_string(),
        ]],
    )
}

/// `ls coll-files`: the live snapshots of a collection. The ledger's own
/// entry and deleted entries are left out.
pub fn render_ledger_files(doc: &LedgerDocument) -> String {
    let rows: Vec<Vec<String>> = doc
        .active_files()
        .filter(|f| f.is_snapshot())
        .map(|f| {
            vec![
                f.version.map(|v| v.to_string()).unwrap_or_default(),
                f.name.clone(),
                f.tag.clone(),
                f.hash.clone(),
                f.created_at.clone(),
                f.message.clone(),
                f.file_path.display().to_string(),
            ]
        })
        .collect();
    markdown_table(
        &[
            "version",
            "name",
            "tag",
            "hash",
            "date_created",
            "message",
            "file_path",
        ],
        &rows,
    )
}
