//! PDF object model and the byte-level serializer.
//!
//! Objects are a tagged [`Object`] enum; [`PdfWriter`] assigns object
//! numbers, emits `N 0 obj ... endobj` bodies and finishes the file with a
//! classic cross-reference table. Output depends only on the objects written
//! and their order, so identical input yields identical bytes.

mod content;
pub mod date;
mod encoding;
mod filter;
mod font;
mod object;
mod writer;

pub use content::{ContentStream, selected_fonts};
pub use encoding::{encode_win_ansi, win_ansi_char};
pub use filter::{decoded_content, flate_stream};
pub use font::{FontEncoding, FontKind, FontMetrics, FontProgram};
pub(crate) use font::descriptor_embeds_program;
pub use object::{Dictionary, Name, Object, ObjectRef, PdfString, Stream, StringFormat};
pub use writer::{DocumentId, PDF_HEADER, PdfWriter, encode_object, format_real};
