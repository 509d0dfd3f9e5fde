use chrono::{DateTime, FixedOffset};
use tracing::debug;

use super::profile::{AfRelationship, AttachmentName, ZugferdProfile};
use crate::core::{HybridError, Rule};
use crate::dictionary;
use crate::pdf::date::pdf_date_utc;
use crate::pdf::{Dictionary, Object, ObjectRef, PdfString, PdfWriter, Stream};

/// An XML payload about to be embedded as an associated file.
#[derive(Debug, Clone)]
pub struct EmbeddedFile<'a> {
    name: AttachmentName,
    payload: &'a [u8],
    modified: DateTime<FixedOffset>,
    relationship: AfRelationship,
    profile: ZugferdProfile,
}

impl<'a> EmbeddedFile<'a> {
    pub fn new(name: AttachmentName, payload: &'a [u8], modified: DateTime<FixedOffset>) -> Self {
        Self {
            name,
            payload,
            modified,
            relationship: AfRelationship::Alternative,
            profile: ZugferdProfile::default(),
        }
    }

    pub fn relationship(mut self, relationship: AfRelationship) -> Self {
        self.relationship = relationship;
        self
    }

    pub fn profile(mut self, profile: ZugferdProfile) -> Self {
        self.profile = profile;
        self
    }

    /// `/Desc` of the file specification.
    pub fn description(&self) -> String {
        match self.profile {
            ZugferdProfile::EN16931 => "ZUGFeRD Invoice XML (EN 16931)".to_string(),
            other => format!("ZUGFeRD Invoice XML ({})", other.conformance_level()),
        }
    }

    /// The `EmbeddedFile` stream. The payload is stored unfiltered.
    pub fn stream(&self) -> Stream {
        let checksum = md5::compute(self.payload);
        Stream::new(
            dictionary! {
                "Type" => "EmbeddedFile",
                "Subtype" => "text/xml",
                "Params" => dictionary! {
                    "Size" => self.payload.len(),
                    "ModDate" => PdfString::literal(pdf_date_utc(&self.modified)),
                    "CheckSum" => PdfString::hex(checksum.0.to_vec()),
                },
            },
            self.payload,
        )
    }

    /// The file specification pointing at an already written stream.
    pub fn file_spec(&self, stream: ObjectRef) -> Dictionary {
        let file_name = self.name.file_name();
        dictionary! {
            "Type" => "Filespec",
            "F" => PdfString::literal(file_name),
            "UF" => PdfString::utf16be(file_name),
            "EF" => dictionary! {
                "F" => stream,
                "UF" => stream,
            },
            "Desc" => PdfString::literal(self.description()),
            "AFRelationship" => self.relationship.as_str(),
        }
    }

    /// Write stream and file specification; returns the file specification.
    ///
    /// Any relationship other than `Alternative` is refused: ZUGFeRD readers
    /// ignore an invoice attached as `Source`, `Data` or `Supplement`.
    pub fn write(&self, writer: &mut PdfWriter) -> Result<ObjectRef, HybridError> {
        if self.relationship != AfRelationship::Alternative {
            return Err(HybridError::violation(
                Rule::AfRelationship,
                format!(
                    "{} must be attached with /Alternative, not /{}",
                    self.name,
                    self.relationship.as_str()
                ),
            ));
        }
        let stream = writer.add(self.stream())?;
        let spec = writer.add(self.file_spec(stream))?;
        debug!(
            file = self.name.file_name(),
            bytes = self.payload.len(),
            %spec,
            "embedded invoice XML"
        );
        Ok(spec)
    }
}

/// File specifications to register in the catalog's `Names/EmbeddedFiles`
/// tree and its `AF` array.
#[derive(Debug, Clone, Default)]
pub struct AttachmentRegistry {
    entries: Vec<(String, ObjectRef)>,
}

impl AttachmentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a file specification under `name`; names must be unique.
    pub fn register(&mut self, name: &str, spec: ObjectRef) -> Result<(), HybridError> {
        if self.entries.iter().any(|(n, _)| n == name) {
            return Err(HybridError::InvalidInput(format!(
                "attachment {name} registered twice"
            )));
        }
        self.entries.push((name.to_string(), spec));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `/Names << /EmbeddedFiles << /Names [...] >> >>`, keys sorted by byte value.
    pub fn names_dictionary(&self) -> Dictionary {
        let mut sorted: Vec<&(String, ObjectRef)> = self.entries.iter().collect();
        sorted.sort_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));
        let names: Vec<Object> = sorted
            .into_iter()
            .flat_map(|(name, spec)| {
                [
                    Object::String(PdfString::literal(name.as_str())),
                    Object::Reference(*spec),
                ]
            })
            .collect();
        dictionary! {
            "EmbeddedFiles" => dictionary! { "Names" => names },
        }
    }

    /// The catalog `AF` array, in registration order.
    pub fn af_array(&self) -> Vec<Object> {
        self.entries
            .iter()
            .map(|(_, spec)| Object::Reference(*spec))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const XML: &[u8] = b"<?xml version=\"1.0\"?><rsm:CrossIndustryInvoice/>";

    fn modified() -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339("2024-03-15T10:00:00+01:00").unwrap()
    }

    #[test]
    fn stream_params() {
        let stream = EmbeddedFile::new(AttachmentName::Zugferd, XML, modified()).stream();
        assert_eq!(stream.content, XML);
        assert_eq!(stream.dict.get_name("Subtype"), Some("text/xml"));
        assert!(!stream.dict.contains_key("Filter"));

        let params = stream.dict.get("Params").and_then(Object::as_dict).unwrap();
        assert_eq!(params.get("Size").and_then(Object::as_i64), Some(XML.len() as i64));
        assert_eq!(
            params.get("ModDate").and_then(Object::as_string).unwrap().bytes,
            b"D:20240315090000Z"
        );
        let checksum = params.get("CheckSum").and_then(Object::as_string).unwrap();
        assert_eq!(checksum.bytes, md5::compute(XML).0);
    }

    #[test]
    fn file_spec_entries() {
        let file = EmbeddedFile::new(AttachmentName::Zugferd, XML, modified());
        let spec = file.file_spec(ObjectRef::new(7));
        assert_eq!(spec.get_name("AFRelationship"), Some("Alternative"));
        assert_eq!(
            spec.get("F").and_then(Object::as_string).unwrap().bytes,
            b"ZUGFeRD-invoice.xml"
        );
        let uf = &spec.get("UF").and_then(Object::as_string).unwrap().bytes;
        assert_eq!(&uf[..4], &[0xFE, 0xFF, 0x00, b'Z']);
        assert_eq!(
            spec.get("Desc").and_then(Object::as_string).unwrap().bytes,
            b"ZUGFeRD Invoice XML (EN 16931)"
        );
        let ef = spec.get("EF").and_then(Object::as_dict).unwrap();
        assert_eq!(ef.get("F").and_then(Object::as_reference), Some(ObjectRef::new(7)));
        assert_eq!(ef.get("UF").and_then(Object::as_reference), Some(ObjectRef::new(7)));
    }

    #[test]
    fn non_alternative_relationship_is_refused() {
        let mut w = PdfWriter::new();
        let err = EmbeddedFile::new(AttachmentName::Zugferd, XML, modified())
            .relationship(AfRelationship::Source)
            .write(&mut w)
            .unwrap_err();
        assert_eq!(err.rule(), Some(Rule::AfRelationship));
        assert!(w.objects().next().is_none());
    }

    #[test]
    fn registry_sorts_name_tree() {
        let mut reg = AttachmentRegistry::new();
        reg.register("factur-x.xml", ObjectRef::new(9)).unwrap();
        reg.register("ZUGFeRD-invoice.xml", ObjectRef::new(4)).unwrap();
        assert!(reg.register("factur-x.xml", ObjectRef::new(10)).is_err());

        let names = reg.names_dictionary();
        let tree = names.get("EmbeddedFiles").and_then(Object::as_dict).unwrap();
        let entries = tree.get("Names").and_then(Object::as_array).unwrap();
        assert_eq!(entries[0].as_string().unwrap().bytes, b"ZUGFeRD-invoice.xml");
        assert_eq!(entries[1].as_reference(), Some(ObjectRef::new(4)));
        assert_eq!(entries[2].as_string().unwrap().bytes, b"factur-x.xml");

        let af = reg.af_array();
        assert_eq!(af, [Object::Reference(ObjectRef::new(9)), Object::Reference(ObjectRef::new(4))]);
    }
}
