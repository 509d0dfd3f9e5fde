use super::canvas::{A4_HEIGHT, A4_WIDTH, Canvas, Page, Painter};
use crate::core::{HybridError, InvoiceRecord};
use crate::pdf::{ContentStream, FontProgram};

const FONT_ID: &str = "F1";
const MARGIN: f64 = 56.7;

/// Minimal painter: one A4 page with the invoice number and date.
///
/// Enough for a conforming hybrid when the visible layout is produced
/// elsewhere or not needed.
#[derive(Debug, Clone)]
pub struct HeaderPainter {
    font: FontProgram,
    size: f64,
}

impl HeaderPainter {
    pub fn new(font: FontProgram) -> Self {
        Self { font, size: 14.0 }
    }

    pub fn font_size(mut self, size: f64) -> Self {
        self.size = size;
        self
    }
}

impl Painter for HeaderPainter {
    fn paint(&mut self, record: &InvoiceRecord, canvas: &mut Canvas<'_>) -> Result<(), HybridError> {
        let number = record.invoice_number()?;
        let date = record.invoice_date()?;
        canvas.declare_font(FONT_ID, self.font.clone())?;

        let top = A4_HEIGHT - MARGIN - self.size;
        let mut content = ContentStream::new();
        content
            .text(FONT_ID, self.size, MARGIN, top, &format!("Rechnung {number}"))?
            .text(
                FONT_ID,
                self.size * 0.75,
                MARGIN,
                top - self.size * 1.6,
                &format!("Datum: {}", date.format("%d.%m.%Y")),
            )?;
        content
            .line_width(0.5)?
            .move_to(MARGIN, top - self.size * 2.4)?
            .line_to(A4_WIDTH - MARGIN, top - self.size * 2.4)?
            .stroke();
        canvas.emit_page(Page::a4(content))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::{FontMetrics, Object, PdfWriter};

    #[test]
    fn paints_one_page_with_number_and_date() {
        let mut data = vec![0x00, 0x01, 0x00, 0x00];
        data.extend_from_slice(&[0u8; 60]);
        let font = FontProgram::new("Body", data).metrics(FontMetrics::default());

        let mut w = PdfWriter::new();
        let parent = w.allocate();
        let mut canvas = Canvas::new(&mut w, parent, false);
        let record = InvoiceRecord::with_header("R-2024-0001", "2024-03-15");
        HeaderPainter::new(font).paint(&record, &mut canvas).unwrap();
        let pages = canvas.finish();
        assert_eq!(pages.len(), 1);

        let page = w.get(pages[0]).unwrap().as_dict().unwrap();
        let content = w.resolve(page.get("Contents").unwrap()).unwrap().as_stream().unwrap();
        let text = String::from_utf8_lossy(&content.content);
        assert!(text.contains("(Rechnung R-2024-0001) Tj"));
        assert!(text.contains("(Datum: 15.03.2024) Tj"));
        assert!(page.get("Resources").and_then(Object::as_dict).unwrap().contains_key("Font"));
    }

    #[test]
    fn missing_date_fails_before_drawing() {
        let mut w = PdfWriter::new();
        let parent = w.allocate();
        let mut canvas = Canvas::new(&mut w, parent, false);
        let record = InvoiceRecord::new().set("invoiceNumber", "R-1");
        let err = HeaderPainter::new(FontProgram::new("Body", Vec::new()))
            .paint(&record, &mut canvas)
            .unwrap_err();
        assert!(matches!(err, HybridError::InvalidInput(_)));
        assert_eq!(canvas.page_count(), 0);
    }
}
