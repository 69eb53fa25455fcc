use std::fmt;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use printpdf::{
    BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference,
};

use super::{encoding_error, ExportFormat, TableData};
use crate::error::Result;

const PAGE_WIDTH: Mm = Mm(210.0);
const PAGE_HEIGHT: Mm = Mm(297.0);
const MARGIN: f32 = 20.0;
const TITLE_SIZE: f32 = 16.0;
const BODY_SIZE: f32 = 11.0;
const LINE_HEIGHT: f32 = 6.5;
const LAYER_NAME: &str = "Layer 1";

/// A title line, then one comma-joined line per record. No column headers.
/// A new A4 page starts whenever the current one is full.
pub(super) fn write(table: &TableData, path: &Path) -> Result<()> {
    let fail =
        |err: &dyn fmt::Display| encoding_error(table.entity, ExportFormat::Report, err);

    let (doc, page, layer) = PdfDocument::new(table.title(), PAGE_WIDTH, PAGE_HEIGHT, LAYER_NAME);
    let title_font = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|err| fail(&err))?;
    let body_font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|err| fail(&err))?;

    let mut cursor = PageCursor {
        layer: doc.get_page(page).get_layer(layer),
        y: PAGE_HEIGHT.0 - MARGIN,
    };
    cursor.line(&doc, table.title(), TITLE_SIZE, &title_font);
    cursor.y -= LINE_HEIGHT / 2.0;

    for record in &table.records {
        cursor.line(&doc, &record.cells().join(", "), BODY_SIZE, &body_font);
    }

    let file = File::create(path).map_err(|err| fail(&err))?;
    doc.save(&mut BufWriter::new(file)).map_err(|err| fail(&err))?;
    Ok(())
}

/// Current layer plus the baseline of the next line, in millimetres from the
/// bottom of the page.
struct PageCursor {
    layer: PdfLayerReference,
    y: f32,
}

impl PageCursor {
    fn line(&mut self, doc: &PdfDocumentReference, text: &str, size: f32, font: &IndirectFontRef) {
        if self.y < MARGIN {
            let (page, layer) = doc.add_page(PAGE_WIDTH, PAGE_HEIGHT, LAYER_NAME);
            self.layer = doc.get_page(page).get_layer(layer);
            self.y = PAGE_HEIGHT.0 - MARGIN;
        }
        self.layer.use_text(text, size, Mm(MARGIN), Mm(self.y), font);
        self.y -= LINE_HEIGHT;
    }
}
