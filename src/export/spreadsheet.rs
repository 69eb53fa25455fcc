use std::path::Path;

use rust_xlsxwriter::{Format, Workbook};

use super::{encoding_error, ExportFormat, TableData};
use crate::error::Result;
use crate::models::FieldValue;

/// Largest magnitude an xlsx number cell (an `f64`) holds exactly.
const MAX_EXACT_NUMBER: u64 = 1 << 53;

/// One workbook per entity holding a single sheet: a bold heading row
/// followed by one row per record. Integer cells stay numeric unless they are
/// too large for a spreadsheet number, in which case their digits are written
/// as text.
pub(super) fn write(table: &TableData, path: &Path) -> Result<()> {
    let fail = |err| encoding_error(table.entity, ExportFormat::Spreadsheet, err);

    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();
    let sheet = workbook.add_worksheet();
    sheet.set_name(table.title()).map_err(fail)?;

    for (col, heading) in table.headings().into_iter().enumerate() {
        sheet
            .write_string_with_format(0, col as u16, heading, &header)
            .map_err(fail)?;
    }

    for (idx, record) in table.records.iter().enumerate() {
        let row = idx as u32 + 1;
        for (col, value) in record.values.iter().enumerate() {
            let col = col as u16;
            let written = match value {
                FieldValue::Integer(number) if number.unsigned_abs() <= MAX_EXACT_NUMBER => {
                    sheet.write_number(row, col, *number as f64)
                }
                FieldValue::Integer(number) => sheet.write_string(row, col, number.to_string()),
                FieldValue::Text(text) => sheet.write_string(row, col, text),
            };
            written.map_err(fail)?;
        }
    }

    workbook.save(path).map_err(fail)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Entity, Record};
    use calamine::{open_workbook, Data, Reader, Xlsx};
    use tempfile::TempDir;

    #[test]
    fn test_large_integers_are_written_as_text() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("books.xlsx");
        let table = TableData {
            entity: Entity::Book,
            records: vec![Record::from_raw(
                Entity::Book,
                &["Dune", "Herbert", "SF", "9007199254740993", "9007199254740992"],
            )],
        };

        write(&table, &path).unwrap();

        let mut workbook: Xlsx<_> = open_workbook(&path).unwrap();
        let range = workbook.worksheet_range("Books").unwrap();
        let row = range.rows().nth(1).unwrap();
        assert_eq!(row[3], Data::String("9007199254740993".into()));
        assert_eq!(row[4], Data::Float(9007199254740992.0));
    }
}
