use lopdf::{Dictionary, Document, Object};
use tracing::debug;

use super::profile::AttachmentName;
use crate::core::HybridError;

/// Extract the ZUGFeRD / Factur-X XML from a finished PDF.
///
/// Looks up `ZUGFeRD-invoice.xml` or `factur-x.xml` in the
/// `Names/EmbeddedFiles` tree first, then in the catalog's `AF` array.
/// Returns the attachment bytes exactly as embedded.
pub fn extract_xml(pdf_bytes: &[u8]) -> Result<Vec<u8>, HybridError> {
    let doc = load(pdf_bytes)?;

    extract_via_names(&doc)
        .or_else(|names_err| {
            debug!(%names_err, "falling back to the AF array");
            extract_via_af(&doc)
        })
        .map_err(|e| HybridError::Pdf(format!("no ZUGFeRD/Factur-X XML found in PDF: {e}")))
}

pub(super) fn load(pdf_bytes: &[u8]) -> Result<Document, HybridError> {
    Document::load_mem(pdf_bytes).map_err(|e| HybridError::Pdf(format!("failed to load PDF: {e}")))
}

fn extract_via_names(doc: &Document) -> Result<Vec<u8>, String> {
    for (name, spec) in embedded_files(doc)? {
        if AttachmentName::parse(&name).is_ok() {
            return extract_from_filespec(doc, &spec);
        }
    }
    Err("no invoice XML in EmbeddedFiles name tree".to_string())
}

fn extract_via_af(doc: &Document) -> Result<Vec<u8>, String> {
    let catalog = doc.catalog().map_err(|e| e.to_string())?;
    let af = catalog.get(b"AF").map_err(|e| e.to_string())?;
    for spec in resolve(doc, af)?.as_array().map_err(|e| e.to_string())? {
        let Ok(dict) = resolve_dict(doc, spec) else {
            continue;
        };
        if file_spec_name(dict).is_some_and(|n| AttachmentName::parse(&n).is_ok()) {
            return extract_from_filespec(doc, spec);
        }
    }
    Err("no invoice XML in AF array".to_string())
}

/// `(name, file specification)` pairs of the `Names/EmbeddedFiles` tree.
pub(super) fn embedded_files(doc: &Document) -> Result<Vec<(String, Object)>, String> {
    let catalog = doc.catalog().map_err(|e| e.to_string())?;
    let names = resolve_dict(doc, catalog.get(b"Names").map_err(|e| e.to_string())?)?;
    let tree = resolve_dict(doc, names.get(b"EmbeddedFiles").map_err(|e| e.to_string())?)?;
    let mut out = Vec::new();
    collect_name_tree(doc, tree, 0, &mut out)?;
    Ok(out)
}

fn collect_name_tree(
    doc: &Document,
    node: &Dictionary,
    depth: usize,
    out: &mut Vec<(String, Object)>,
) -> Result<(), String> {
    if depth > 32 {
        return Err("name tree too deep".to_string());
    }
    if let Ok(names) = node.get(b"Names") {
        // [key1 value1 key2 value2 ...]
        for pair in resolve(doc, names)?.as_array().map_err(|e| e.to_string())?.chunks(2) {
            if let [Object::String(key, _), value] = pair {
                out.push((decode_text(key), value.clone()));
            }
        }
    }
    if let Ok(kids) = node.get(b"Kids") {
        for kid in resolve(doc, kids)?.as_array().map_err(|e| e.to_string())? {
            collect_name_tree(doc, resolve_dict(doc, kid)?, depth + 1, out)?;
        }
    }
    Ok(())
}

fn extract_from_filespec(doc: &Document, spec: &Object) -> Result<Vec<u8>, String> {
    let spec = resolve_dict(doc, spec)?;
    let ef = resolve_dict(doc, spec.get(b"EF").map_err(|e| e.to_string())?)?;
    let file = ef
        .get(b"UF")
        .or_else(|_| ef.get(b"F"))
        .map_err(|e| e.to_string())?;
    let stream = resolve(doc, file)?.as_stream().map_err(|e| e.to_string())?;

    // decompressed_content() fails when no Filter is set; the raw bytes are the payload then.
    if stream.dict.get(b"Filter").is_ok() {
        stream.decompressed_content().map_err(|e| e.to_string())
    } else {
        Ok(stream.content.clone())
    }
}

/// `UF`, falling back to `F`, decoded from PDF text-string form.
pub(super) fn file_spec_name(spec: &Dictionary) -> Option<String> {
    match spec.get(b"UF").or_else(|_| spec.get(b"F")).ok()? {
        Object::String(bytes, _) => Some(decode_text(bytes)),
        _ => None,
    }
}

/// UTF-16BE when the BOM is present, otherwise single-byte text.
pub(super) fn decode_text(bytes: &[u8]) -> String {
    match bytes {
        [0xFE, 0xFF, rest @ ..] => {
            let units: Vec<u16> = rest
                .chunks_exact(2)
                .map(|c| u16::from_be_bytes([c[0], c[1]]))
                .collect();
            String::from_utf16_lossy(&units)
        }
        _ => bytes.iter().map(|b| char::from(*b)).collect(),
    }
}

pub(super) fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> Result<&'a Object, String> {
    match obj {
        Object::Reference(id) => doc.get_object(*id).map_err(|e| e.to_string()),
        other => Ok(other),
    }
}

pub(super) fn resolve_dict<'a>(doc: &'a Document, obj: &'a Object) -> Result<&'a Dictionary, String> {
    match resolve(doc, obj)? {
        Object::Dictionary(d) => Ok(d),
        Object::Stream(s) => Ok(&s.dict),
        _ => Err("expected dictionary or reference".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_pdf_text_strings() {
        assert_eq!(decode_text(b"factur-x.xml"), "factur-x.xml");
        assert_eq!(
            decode_text(&[0xFE, 0xFF, 0x00, b'Z', 0x00, b'F']),
            "ZF"
        );
        assert_eq!(decode_text(&[0x47, 0xFC]), "Gü");
    }

    #[test]
    fn garbage_is_a_pdf_error() {
        let err = extract_xml(b"not a pdf").unwrap_err();
        assert!(matches!(err, HybridError::Pdf(_)));
        assert_eq!(err.exit_code(), 4);
    }
}
