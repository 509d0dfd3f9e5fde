//! Document assembly: runs the painter, then stitches page tree, XMP
//! metadata, the invoice attachment and the output intent into one
//! PDF/A-3u file.
//!
//! ```
//! use hybridbeleg::assemble::{Page, assemble, painter_fn};
//! use hybridbeleg::core::*;
//! use hybridbeleg::pdf::ContentStream;
//!
//! let record = InvoiceRecord::with_header("R-2024-0001", "2024-03-15");
//! let xml = br#"<?xml version="1.0" encoding="UTF-8"?><rsm:CrossIndustryInvoice/>"#;
//! let options = AssembleOptions::builder()
//!     .clock(FixedClock::parse("2024-03-15T10:00:00+01:00").unwrap())
//!     .build()
//!     .unwrap();
//!
//! let painter = painter_fn(|_record, canvas| {
//!     let mut content = ContentStream::new();
//!     content.rect(56.7, 700.0, 480.0, 40.0)?.stroke();
//!     canvas.emit_page(Page::a4(content))?;
//!     Ok(())
//! });
//! let pdf = assemble(&record, xml, painter, &options).unwrap();
//! assert!(pdf.starts_with(b"%PDF-1.7"));
//! assert!(pdf.ends_with(b"%%EOF"));
//! ```

mod canvas;
mod header;

use chrono::SecondsFormat;
use tracing::{Span, debug, info, instrument};

pub use canvas::{A4_HEIGHT, A4_WIDTH, Canvas, FnPainter, Page, Painter, painter_fn};
pub use header::HeaderPainter;

use crate::core::{AssembleOptions, HybridError, InvoiceRecord};
use crate::dictionary;
use crate::pdf::date::pdf_date;
use crate::pdf::{DocumentId, Object, PdfString, PdfWriter};
use crate::pdfa::{ArchivalEnforcer, IccProfile, write_output_intent};
use crate::zugferd::{AttachmentRegistry, EmbeddedFile, XmpMetadata};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Where a [`DocumentAssembler`] is in its single assembly pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssemblyState {
    Fresh,
    /// The painter is emitting pages.
    Painting,
    /// Metadata, attachment, output intent and catalog are being written.
    Assembling,
    /// Bytes were handed out; the assembler accepts no further work.
    Finalized,
}

/// Runs one assembly. A failed pass returns the assembler to
/// [`AssemblyState::Fresh`]; a successful one leaves it finalized.
#[derive(Debug)]
pub struct DocumentAssembler<'o> {
    options: &'o AssembleOptions,
    state: AssemblyState,
}

impl<'o> DocumentAssembler<'o> {
    pub fn new(options: &'o AssembleOptions) -> Self {
        Self {
            options,
            state: AssemblyState::Fresh,
        }
    }

    pub fn state(&self) -> AssemblyState {
        self.state
    }

    fn transition(&mut self, to: AssemblyState) {
        debug!(from = ?self.state, ?to, "assembly state");
        self.state = to;
    }

    /// Produce the hybrid invoice. No bytes are returned unless every
    /// archival check passed.
    #[instrument(name = "assemble", skip_all, fields(invoice = tracing::field::Empty))]
    pub fn assemble(
        &mut self,
        record: &InvoiceRecord,
        xml: &[u8],
        painter: &mut dyn Painter,
    ) -> Result<Vec<u8>, HybridError> {
        if self.state != AssemblyState::Fresh {
            return Err(HybridError::Serialization(format!(
                "assembler is {:?}; create a new one per document",
                self.state
            )));
        }
        match self.run(record, xml, painter) {
            Ok(bytes) => {
                self.transition(AssemblyState::Finalized);
                info!(bytes = bytes.len(), "hybrid invoice assembled");
                Ok(bytes)
            }
            Err(e) => {
                self.transition(AssemblyState::Fresh);
                Err(e)
            }
        }
    }

    fn run(
        &mut self,
        record: &InvoiceRecord,
        xml: &[u8],
        painter: &mut dyn Painter,
    ) -> Result<Vec<u8>, HybridError> {
        let options = self.options;
        let number = record.invoice_number()?;
        Span::current().record("invoice", number);
        let invoice_date = record.invoice_date()?;
        validate_xml(xml)?;
        let now = options.clock().now();

        let mut writer = PdfWriter::new();
        let catalog = writer.allocate();
        let pages = writer.allocate();
        let info = writer.allocate();

        self.transition(AssemblyState::Painting);
        let mut canvas = Canvas::new(&mut writer, pages, options.compress_content());
        painter.paint(record, &mut canvas)?;
        let kids = canvas.finish();
        if kids.is_empty() {
            return Err(HybridError::InvalidInput("painter emitted no pages".into()));
        }

        self.transition(AssemblyState::Assembling);
        writer.write(
            pages,
            dictionary! {
                "Type" => "Pages",
                "Kids" => kids.iter().copied().map(Object::Reference).collect::<Vec<_>>(),
                "Count" => kids.len(),
            },
        )?;

        let title = format!("Rechnung {number}");
        let xmp = XmpMetadata {
            title: title.clone(),
            author: options.author().to_string(),
            invoice_date,
            producer: options.producer().to_string(),
            creator_tool: options.creator().to_string(),
            created: now,
            attachment: options.attachment_name(),
            profile: options.profile(),
        };
        let metadata = writer.add(xmp.to_stream())?;

        let attachment = options.attachment_name();
        let spec = EmbeddedFile::new(attachment, xml, now)
            .profile(options.profile())
            .write(&mut writer)?;
        let mut registry = AttachmentRegistry::new();
        registry.register(attachment.file_name(), spec)?;

        let profile = options.icc_profile().unwrap_or(IccProfile::srgb());
        let intent = write_output_intent(&mut writer, profile)?;

        writer.write(
            catalog,
            dictionary! {
                "Type" => "Catalog",
                "Pages" => pages,
                "Metadata" => metadata,
                "Names" => registry.names_dictionary(),
                "AF" => registry.af_array(),
                "OutputIntents" => vec![Object::Reference(intent)],
                "ViewerPreferences" => dictionary! { "DisplayDocTitle" => true },
            },
        )?;

        let date = pdf_date(&now);
        writer.write(
            info,
            dictionary! {
                "Title" => PdfString::text(&title),
                "Author" => PdfString::text(options.author()),
                "Creator" => PdfString::text(options.creator()),
                "Producer" => PdfString::text(options.producer()),
                "CreationDate" => PdfString::literal(date.clone()),
                "ModDate" => PdfString::literal(date),
            },
        )?;

        let stable = options
            .document_id()
            .unwrap_or_else(|| md5::compute(number.as_bytes()).0);
        let volatile = md5::compute(format!(
            "{}{}",
            now.to_rfc3339_opts(SecondsFormat::Secs, false),
            writer.len()
        ))
        .0;
        let id = DocumentId::new(stable, volatile);

        ArchivalEnforcer::new(&writer, catalog, &id).enforce()?;
        writer.finalize(catalog, info, &id)
    }
}

/// Assemble a hybrid invoice in one call.
pub fn assemble(
    record: &InvoiceRecord,
    xml: &[u8],
    mut painter: impl Painter,
    options: &AssembleOptions,
) -> Result<Vec<u8>, HybridError> {
    DocumentAssembler::new(options).assemble(record, xml, &mut painter)
}

/// The payload must be non-empty UTF-8 that starts with a BOM or `<?xml`.
fn validate_xml(xml: &[u8]) -> Result<(), HybridError> {
    if xml.is_empty() {
        return Err(HybridError::InvalidInput("XML payload is empty".into()));
    }
    if !(xml.starts_with(UTF8_BOM) || xml.starts_with(b"<?xml")) {
        return Err(HybridError::InvalidInput(
            "XML payload must start with a UTF-8 BOM or an <?xml declaration".into(),
        ));
    }
    std::str::from_utf8(xml)
        .map_err(|e| HybridError::InvalidInput(format!("XML payload is not UTF-8: {e}")))?;
    Ok(())
}
