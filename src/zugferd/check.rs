use std::collections::BTreeSet;

use lopdf::{Document, Object, ObjectId};
use quick_xml::Reader;
use quick_xml::events::Event;
use tracing::debug;

use super::extract::{embedded_files, file_spec_name, load, resolve, resolve_dict};
use super::profile::{AfRelationship, AttachmentName};
use crate::core::{HybridError, Rule};
use crate::pdfa::{GTS_PDFA1, Violation};

/// Re-check a finished hybrid invoice.
///
/// Reads the file back and reports every hybrid or archival rule it breaks:
/// attachment relationship and registration, metadata stream and its PDF/A
/// identification, output intent, trailer `ID`, encryption and forbidden
/// actions. An empty result means no finding; bytes that are not a PDF are
/// an error.
pub fn check_hybrid(pdf_bytes: &[u8]) -> Result<Vec<Violation>, HybridError> {
    let doc = load(pdf_bytes)?;
    let catalog = doc
        .catalog()
        .map_err(|e| HybridError::Pdf(format!("document has no catalog: {e}")))?;

    let mut findings = Vec::new();
    check_attachment(&doc, &mut findings);
    check_metadata(&doc, catalog, &mut findings);
    check_output_intent(&doc, catalog, &mut findings);
    check_trailer(&doc, &mut findings);
    check_actions(&doc, &mut findings);
    debug!(findings = findings.len(), "checked hybrid invoice");
    Ok(findings)
}

fn finding(rule: Rule, detail: impl Into<String>) -> Violation {
    Violation {
        rule,
        detail: detail.into(),
    }
}

fn check_attachment(doc: &Document, out: &mut Vec<Violation>) {
    let named: BTreeSet<ObjectId> = embedded_files(doc)
        .unwrap_or_default()
        .into_iter()
        .filter(|(name, _)| AttachmentName::parse(name).is_ok())
        .filter_map(|(_, spec)| spec.as_reference().ok())
        .collect();

    let associated: BTreeSet<ObjectId> = doc
        .catalog()
        .ok()
        .and_then(|c| c.get(b"AF").ok())
        .and_then(|af| resolve(doc, af).ok())
        .and_then(|af| af.as_array().ok())
        .map(|items| {
            items
                .iter()
                .filter_map(|o| o.as_reference().ok())
                .filter(|id| {
                    doc.get_dictionary(*id)
                        .ok()
                        .and_then(file_spec_name)
                        .is_some_and(|n| AttachmentName::parse(&n).is_ok())
                })
                .collect()
        })
        .unwrap_or_default();

    if named.is_empty() && associated.is_empty() {
        out.push(finding(
            Rule::EmbeddedFileRegistration,
            "no ZUGFeRD-invoice.xml or factur-x.xml attachment",
        ));
        return;
    }
    if named.is_empty() {
        out.push(finding(
            Rule::EmbeddedFileRegistration,
            "invoice XML is missing from Names/EmbeddedFiles",
        ));
    }
    if associated.is_empty() {
        out.push(finding(
            Rule::EmbeddedFileRegistration,
            "invoice XML is missing from the catalog AF array",
        ));
    }

    for id in named.union(&associated) {
        let relationship = doc
            .get_dictionary(*id)
            .ok()
            .and_then(|spec| spec.get(b"AFRelationship").ok())
            .and_then(|r| r.as_name().ok());
        let parsed = relationship
            .and_then(|r| std::str::from_utf8(r).ok())
            .and_then(AfRelationship::parse);
        match (relationship, parsed) {
            (_, Some(AfRelationship::Alternative)) => {}
            (_, Some(other)) => out.push(finding(
                Rule::AfRelationship,
                format!("AFRelationship is /{}, expected /Alternative", other.as_str()),
            )),
            (Some(raw), None) => out.push(finding(
                Rule::AfRelationship,
                format!(
                    "AFRelationship /{} is not a defined relationship, expected /Alternative",
                    String::from_utf8_lossy(raw)
                ),
            )),
            (None, None) => out.push(finding(
                Rule::AfRelationship,
                "file specification has no AFRelationship",
            )),
        }
    }
}

fn check_metadata(doc: &Document, catalog: &lopdf::Dictionary, out: &mut Vec<Violation>) {
    let stream = match catalog.get(b"Metadata") {
        Ok(Object::Reference(id)) => doc.get_object(*id).ok().and_then(|o| o.as_stream().ok()),
        Ok(_) => {
            out.push(finding(
                Rule::MetadataStream,
                "Metadata is not an indirect stream reference",
            ));
            return;
        }
        Err(_) => None,
    };
    let Some(stream) = stream else {
        out.push(finding(Rule::MetadataStream, "catalog has no metadata stream"));
        return;
    };
    let (part, conformance) = pdfa_identification(&stream.content);
    if part.as_deref() != Some("3") || conformance.as_deref() != Some("U") {
        out.push(finding(
            Rule::MetadataStream,
            format!(
                "XMP declares pdfaid:part {} conformance {}, expected 3 / U",
                part.as_deref().unwrap_or("-"),
                conformance.as_deref().unwrap_or("-")
            ),
        ));
    }
}

/// `pdfaid:part` and `pdfaid:conformance` from an XMP packet, element or attribute form.
fn pdfa_identification(xmp: &[u8]) -> (Option<String>, Option<String>) {
    let mut reader = Reader::from_reader(xmp);
    reader.config_mut().trim_text(true);

    let mut part = None;
    let mut conformance = None;
    let mut current: Option<Vec<u8>> = None;
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                for attr in e.attributes().flatten() {
                    let value = String::from_utf8_lossy(&attr.value).into_owned();
                    match attr.key.as_ref() {
                        b"pdfaid:part" => part = Some(value),
                        b"pdfaid:conformance" => conformance = Some(value),
                        _ => {}
                    }
                }
                current = Some(e.name().as_ref().to_vec());
            }
            Ok(Event::Text(ref e)) => {
                let text = e.unescape().unwrap_or_default().to_string();
                match current.as_deref() {
                    Some(b"pdfaid:part") => part = Some(text),
                    Some(b"pdfaid:conformance") => conformance = Some(text),
                    _ => {}
                }
            }
            Ok(Event::End(_)) => current = None,
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
        buf.clear();
    }
    (part, conformance)
}

fn check_output_intent(doc: &Document, catalog: &lopdf::Dictionary, out: &mut Vec<Violation>) {
    let intents = catalog
        .get(b"OutputIntents")
        .ok()
        .and_then(|o| resolve(doc, o).ok())
        .and_then(|o| o.as_array().ok());
    let ok = intents.is_some_and(|items| {
        items.iter().any(|intent| {
            let Ok(intent) = resolve_dict(doc, intent) else {
                return false;
            };
            let subtype = intent.get(b"S").and_then(Object::as_name).ok();
            let profile = intent
                .get(b"DestOutputProfile")
                .ok()
                .and_then(|p| resolve(doc, p).ok())
                .and_then(|p| p.as_stream().ok());
            subtype == Some(GTS_PDFA1.as_bytes()) && profile.is_some()
        })
    });
    if !ok {
        out.push(finding(
            Rule::OutputIntent,
            "no GTS_PDFA1 output intent with an ICC profile",
        ));
    }
}

fn check_trailer(doc: &Document, out: &mut Vec<Violation>) {
    if doc.trailer.get(b"Encrypt").is_ok() {
        out.push(finding(Rule::Encryption, "trailer references an encryption dictionary"));
    }
    let id_ok = doc
        .trailer
        .get(b"ID")
        .and_then(Object::as_array)
        .is_ok_and(|id| {
            id.len() == 2
                && id
                    .iter()
                    .all(|half| matches!(half, Object::String(bytes, _) if bytes.len() == 16))
        });
    if !id_ok {
        out.push(finding(
            Rule::DocumentId,
            "trailer ID is not a pair of 16-byte strings",
        ));
    }
}

fn check_actions(doc: &Document, out: &mut Vec<Violation>) {
    for (id, object) in &doc.objects {
        let dict = match object {
            Object::Dictionary(d) => d,
            Object::Stream(s) => &s.dict,
            _ => continue,
        };
        let action = dict.get(b"S").and_then(Object::as_name).ok();
        if action == Some(b"JavaScript".as_slice()) || dict.get(b"JS").is_ok() {
            out.push(finding(Rule::JavaScript, format!("JavaScript in object {} {}", id.0, id.1)));
        }
        if action == Some(b"Launch".as_slice()) {
            out.push(finding(Rule::LaunchAction, format!("Launch action in object {} {}", id.0, id.1)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_element_and_attribute_identification() {
        let element = br#"<x:xmpmeta xmlns:x="adobe:ns:meta/"><rdf:RDF><rdf:Description>
            <pdfaid:part>3</pdfaid:part><pdfaid:conformance>U</pdfaid:conformance>
            </rdf:Description></rdf:RDF></x:xmpmeta>"#;
        assert_eq!(
            pdfa_identification(element),
            (Some("3".into()), Some("U".into()))
        );

        let attribute = br#"<rdf:RDF><rdf:Description pdfaid:part="2" pdfaid:conformance="B"></rdf:Description></rdf:RDF>"#;
        assert_eq!(
            pdfa_identification(attribute),
            (Some("2".into()), Some("B".into()))
        );
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(check_hybrid(b"%PDF-1.7\n%%EOF").is_err());
    }
}
