use tracing::debug;

use super::icc::IccProfile;
use crate::core::HybridError;
use crate::dictionary;
use crate::pdf::{Object, ObjectRef, PdfString, PdfWriter, Stream};

/// Output condition subtype required by PDF/A (all parts).
pub const GTS_PDFA1: &str = "GTS_PDFA1";
const REGISTRY: &str = "http://www.color.org";

/// Write the ICC stream and its `OutputIntent`; returns the intent reference
/// for the catalog's `OutputIntents` array.
///
/// The ICC stream is left unfiltered so validators can read the header directly.
pub fn write_output_intent(
    writer: &mut PdfWriter,
    profile: &IccProfile,
) -> Result<ObjectRef, HybridError> {
    let icc = Stream::new(
        dictionary! {
            "N" => u32::from(profile.components()),
            "Alternate" => profile.alternate(),
        },
        profile.bytes(),
    );
    let icc_ref = writer.add(icc)?;

    let intent = dictionary! {
        "Type" => "OutputIntent",
        "S" => GTS_PDFA1,
        "OutputConditionIdentifier" => PdfString::literal(profile.identifier()),
        "Info" => PdfString::literal(profile.identifier()),
        "RegistryName" => PdfString::literal(REGISTRY),
        "DestOutputProfile" => icc_ref,
    };
    let intent_ref = writer.add(intent)?;
    debug!(
        identifier = profile.identifier(),
        bytes = profile.bytes().len(),
        "wrote output intent"
    );
    Ok(intent_ref)
}

/// Whether `intent` is a `GTS_PDFA1` output intent with an embedded ICC stream.
pub(crate) fn is_pdfa_intent(writer: &PdfWriter, intent: &Object) -> bool {
    let Some(dict) = writer.resolve(intent).and_then(Object::as_dict) else {
        return false;
    };
    dict.get_name("S") == Some(GTS_PDFA1)
        && dict
            .get("DestOutputProfile")
            .and_then(|o| writer.resolve(o))
            .and_then(Object::as_stream)
            .is_some_and(|s| s.content.len() >= 132 && s.dict.get("N").is_some())
}
