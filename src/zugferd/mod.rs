//! ZUGFeRD / Factur-X attachment handling.
//!
//! Wraps the invoice XML as an associated file with the `Alternative`
//! relationship, registers it in the catalog and describes it in the XMP
//! packet. With the `inspect` feature, finished files can be read back.
//!
//! # Attachment names
//!
//! | Name | Standard | XMP schema |
//! |------|----------|------------|
//! | `ZUGFeRD-invoice.xml` | ZUGFeRD 2.x | `zf:` |
//! | `factur-x.xml` | Factur-X 1.0 | `fx:` |

#[cfg(feature = "inspect")]
mod check;
mod embed;
#[cfg(feature = "inspect")]
mod extract;
mod profile;
mod xmp;

#[cfg(feature = "inspect")]
pub use check::check_hybrid;
pub use embed::{AttachmentRegistry, EmbeddedFile};
#[cfg(feature = "inspect")]
pub use extract::extract_xml;
pub use profile::{AfRelationship, AttachmentName, ZugferdProfile};
pub use xmp::{XmpMetadata, escape_xml};
