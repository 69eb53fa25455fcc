use std::fmt;
use std::fs::File;
use std::path::Path;

use docx_rs::{Docx, Paragraph, Run, Style, StyleType, Table, TableCell, TableRow};

use super::{encoding_error, ExportFormat, TableData};
use crate::error::Result;

const HEADING_STYLE: &str = "Heading1";

/// A heading naming the entity, then a grid table: one header row and one
/// row per record.
pub(super) fn write(table: &TableData, path: &Path) -> Result<()> {
    let fail =
        |err: &dyn fmt::Display| encoding_error(table.entity, ExportFormat::Document, err);

    let heading_style = Style::new(HEADING_STYLE, StyleType::Paragraph)
        .name("Heading 1")
        .size(32)
        .bold();

    let mut rows = Vec::with_capacity(table.records.len() + 1);
    rows.push(TableRow::new(
        table
            .headings()
            .into_iter()
            .map(|heading| cell(Run::new().add_text(heading).bold()))
            .collect(),
    ));
    for record in &table.records {
        rows.push(TableRow::new(
            record
                .cells()
                .into_iter()
                .map(|value| cell(Run::new().add_text(value)))
                .collect(),
        ));
    }

    let docx = Docx::new()
        .add_style(heading_style)
        .add_paragraph(
            Paragraph::new()
                .style(HEADING_STYLE)
                .add_run(Run::new().add_text(table.title())),
        )
        .add_table(Table::new(rows));

    let file = File::create(path).map_err(|err| fail(&err))?;
    docx.build().pack(file).map_err(|err| fail(&err))?;
    Ok(())
}

fn cell(run: Run) -> TableCell {
    TableCell::new().add_paragraph(Paragraph::new().add_run(run))
}
