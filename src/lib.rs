//! # hybridbeleg
//!
//! Assembles hybrid electronic invoices: a PDF/A-3u document whose visible
//! pages come from a pluggable painter and which carries the ZUGFeRD /
//! Factur-X XML (EN 16931) as an associated file with the `Alternative`
//! relationship.
//!
//! The PDF is written directly from a small object model, so output is
//! byte-for-byte reproducible for fixed input and a pinned clock.
//!
//! ## Quick Start
//!
//! ```rust
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
//! let pdf = assemble(
//!     &record,
//!     xml,
//!     painter_fn(|_record, canvas| {
//!         let mut content = ContentStream::new();
//!         content.rect(56.7, 760.0, 480.0, 30.0)?.stroke();
//!         canvas.emit_page(Page::a4(content))?;
//!         Ok(())
//!     }),
//!     &options,
//! )
//! .unwrap();
//!
//! assert!(pdf.starts_with(b"%PDF-1.7"));
//! assert_eq!(suggested_file_name(&record).unwrap(), "RG-2024-R-2024-0001-E-Rechnung.pdf");
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `core` (default) | Object model, serializer, XMP, attachment, archival checks, assembler |
//! | `inspect` | Read finished files back with `lopdf`: extract the XML, re-check conformance |
//! | `all` | Everything |

#[cfg(feature = "core")]
pub mod assemble;

#[cfg(feature = "core")]
pub mod core;

#[cfg(feature = "core")]
pub mod pdf;

#[cfg(feature = "core")]
pub mod pdfa;

#[cfg(feature = "core")]
pub mod zugferd;

// Re-export core types at crate root for convenience
#[cfg(feature = "core")]
pub use crate::core::*;
