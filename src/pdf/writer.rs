use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;

use tracing::trace;

use super::object::{Dictionary, Name, Object, ObjectRef, PdfString, StringFormat};
use crate::core::HybridError;

/// `%PDF-1.7` plus a comment line of four high-bit bytes marking binary content.
pub const PDF_HEADER: &[u8] = b"%PDF-1.7\n%\xE2\xE3\xCF\xD3\n";

/// The trailer `ID` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentId {
    /// Stable across saves of the same document.
    pub permanent: Vec<u8>,
    /// Fresh for every save.
    pub changing: Vec<u8>,
}

impl DocumentId {
    pub fn new(permanent: [u8; 16], changing: [u8; 16]) -> Self {
        Self {
            permanent: permanent.to_vec(),
            changing: changing.to_vec(),
        }
    }
}

/// Writes indirect objects into an in-memory PDF body and finishes it with
/// the cross-reference table and trailer.
///
/// Objects are kept after being written so the archival checks can walk
/// the graph before [`PdfWriter::finalize`].
#[derive(Debug)]
pub struct PdfWriter {
    buf: Vec<u8>,
    next_number: u32,
    offsets: BTreeMap<u32, usize>,
    objects: BTreeMap<u32, Object>,
    referenced: BTreeSet<u32>,
}

impl PdfWriter {
    pub fn new() -> Self {
        Self {
            buf: PDF_HEADER.to_vec(),
            next_number: 1,
            offsets: BTreeMap::new(),
            objects: BTreeMap::new(),
            referenced: BTreeSet::new(),
        }
    }

    /// Reserve the next object number, starting at 1.
    pub fn allocate(&mut self) -> ObjectRef {
        let r = ObjectRef::new(self.next_number);
        self.next_number += 1;
        r
    }

    /// Allocate and write in one step.
    pub fn add(&mut self, object: impl Into<Object>) -> Result<ObjectRef, HybridError> {
        let r = self.allocate();
        self.write(r, object)?;
        Ok(r)
    }

    /// Emit `N 0 obj ... endobj` for a previously allocated number.
    ///
    /// Streams get an indirect `/Length` object written right after them.
    pub fn write(&mut self, r: ObjectRef, object: impl Into<Object>) -> Result<(), HybridError> {
        if r.number == 0 || r.number >= self.next_number || r.generation != 0 {
            return Err(HybridError::Serialization(format!(
                "object {r} was not allocated by this writer"
            )));
        }
        if self.offsets.contains_key(&r.number) {
            return Err(HybridError::Serialization(format!(
                "object {r} written twice"
            )));
        }

        let mut object = object.into();
        let mut length = None;
        if let Object::Stream(stream) = &mut object {
            if stream.dict.contains_key("Length") {
                return Err(HybridError::Serialization(format!(
                    "stream {r} must not carry its own /Length"
                )));
            }
            let length_ref = self.allocate();
            stream.dict.set("Length", length_ref);
            length = Some((length_ref, stream.content.len()));
        }

        let mut body = Vec::new();
        write!(body, "{} {} obj\n", r.number, r.generation)?;
        encode_top_level(&object, &mut body)?;
        body.extend_from_slice(b"\nendobj\n");

        collect_references(&object, &mut self.referenced);
        self.offsets.insert(r.number, self.buf.len());
        self.buf.extend_from_slice(&body);
        self.objects.insert(r.number, object);
        trace!(object = r.number, bytes = body.len(), "wrote object");

        if let Some((length_ref, len)) = length {
            self.write(length_ref, Object::Integer(len as i64))?;
        }
        Ok(())
    }

    pub fn get(&self, r: ObjectRef) -> Option<&Object> {
        self.objects.get(&r.number)
    }

    /// Follow a reference to its written target; direct objects are returned as is.
    pub fn resolve<'a>(&'a self, object: &'a Object) -> Option<&'a Object> {
        match object {
            Object::Reference(r) => self.get(*r),
            other => Some(other),
        }
    }

    /// Every written object in ascending number order.
    pub fn objects(&self) -> impl Iterator<Item = (ObjectRef, &Object)> {
        self.objects.iter().map(|(n, o)| (ObjectRef::new(*n), o))
    }

    /// Bytes emitted so far (header plus bodies).
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Write the cross-reference table and trailer and hand back the file.
    pub fn finalize(
        mut self,
        root: ObjectRef,
        info: ObjectRef,
        id: &DocumentId,
    ) -> Result<Vec<u8>, HybridError> {
        if let Some(missing) = (1..self.next_number).find(|n| !self.offsets.contains_key(n)) {
            return Err(HybridError::UnresolvedReference { object: missing });
        }
        if let Some(dangling) = self
            .referenced
            .iter()
            .find(|n| !self.offsets.contains_key(n))
        {
            return Err(HybridError::UnresolvedReference { object: *dangling });
        }
        for r in [root, info] {
            if !self.offsets.contains_key(&r.number) {
                return Err(HybridError::UnresolvedReference { object: r.number });
            }
        }

        let size = self.next_number;
        let xref_offset = self.buf.len();
        write!(self.buf, "xref\n0 {size}\n")?;
        self.buf.extend_from_slice(b"0000000000 65535 f \n");
        for offset in self.offsets.values() {
            write!(self.buf, "{offset:010} 00000 n \n")?;
        }

        let trailer = crate::dictionary! {
            "Size" => size,
            "Root" => root,
            "Info" => info,
            "ID" => vec![
                Object::String(PdfString::hex(id.permanent.clone())),
                Object::String(PdfString::hex(id.changing.clone())),
            ],
        };
        self.buf.extend_from_slice(b"trailer\n");
        encode_object(&Object::Dictionary(trailer), &mut self.buf)?;
        write!(self.buf, "\nstartxref\n{xref_offset}\n%%EOF")?;
        Ok(self.buf)
    }
}

impl Default for PdfWriter {
    fn default() -> Self {
        Self::new()
    }
}

fn collect_references(object: &Object, out: &mut BTreeSet<u32>) {
    match object {
        Object::Reference(r) => {
            out.insert(r.number);
        }
        Object::Array(items) => items.iter().for_each(|o| collect_references(o, out)),
        Object::Dictionary(d) => d.iter().for_each(|(_, o)| collect_references(o, out)),
        Object::Stream(s) => s.dict.iter().for_each(|(_, o)| collect_references(o, out)),
        _ => {}
    }
}

fn encode_top_level(object: &Object, out: &mut Vec<u8>) -> Result<(), HybridError> {
    match object {
        Object::Stream(stream) => {
            encode_dictionary(&stream.dict, out)?;
            out.extend_from_slice(b"\nstream\n");
            out.extend_from_slice(&stream.content);
            out.extend_from_slice(b"\nendstream");
            Ok(())
        }
        other => encode_object(other, out),
    }
}

/// Serialize a direct object. Streams are only legal as indirect objects.
pub fn encode_object(object: &Object, out: &mut Vec<u8>) -> Result<(), HybridError> {
    match object {
        Object::Null => out.extend_from_slice(b"null"),
        Object::Boolean(b) => out.extend_from_slice(if *b { b"true" } else { b"false" }),
        Object::Integer(i) => out.extend_from_slice(i.to_string().as_bytes()),
        Object::Real(r) => out.extend_from_slice(format_real(*r)?.as_bytes()),
        Object::Name(n) => encode_name(n, out),
        Object::String(s) => encode_string(s, out),
        Object::Array(items) => {
            out.push(b'[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(b' ');
                }
                encode_object(item, out)?;
            }
            out.push(b']');
        }
        Object::Dictionary(d) => encode_dictionary(d, out)?,
        Object::Stream(_) => {
            return Err(HybridError::Serialization(
                "stream objects must be indirect".into(),
            ));
        }
        Object::Reference(r) => out.extend_from_slice(r.to_string().as_bytes()),
    }
    Ok(())
}

fn encode_dictionary(dict: &Dictionary, out: &mut Vec<u8>) -> Result<(), HybridError> {
    out.extend_from_slice(b"<<");
    for (key, value) in dict.iter() {
        out.push(b' ');
        encode_name(key, out);
        out.push(b' ');
        encode_object(value, out)?;
    }
    if !dict.is_empty() {
        out.push(b' ');
    }
    out.extend_from_slice(b">>");
    Ok(())
}

/// `/` plus the name, with delimiters, `#` and bytes outside `!`..`~` as `#HH`.
pub fn encode_name(name: &Name, out: &mut Vec<u8>) {
    out.push(b'/');
    for &b in name.as_str().as_bytes() {
        let regular = (0x21..=0x7E).contains(&b) && !b"#%/<>[]{}()".contains(&b);
        if regular {
            out.push(b);
        } else {
            out.extend_from_slice(format!("#{b:02X}").as_bytes());
        }
    }
}

pub fn encode_string(s: &PdfString, out: &mut Vec<u8>) {
    match s.format {
        StringFormat::Literal => {
            out.push(b'(');
            for &b in &s.bytes {
                match b {
                    b'(' | b')' | b'\\' => {
                        out.push(b'\\');
                        out.push(b);
                    }
                    // A bare CR would be read back as LF.
                    b'\r' => out.extend_from_slice(b"\\r"),
                    _ => out.push(b),
                }
            }
            out.push(b')');
        }
        StringFormat::Hexadecimal => {
            out.push(b'<');
            for b in &s.bytes {
                out.extend_from_slice(format!("{b:02X}").as_bytes());
            }
            out.push(b'>');
        }
    }
}

/// Decimal form with at most five fractional digits, no exponent, no `+`.
pub fn format_real(value: f64) -> Result<String, HybridError> {
    if !value.is_finite() {
        return Err(HybridError::Serialization(format!(
            "cannot write non-finite real {value}"
        )));
    }
    let mut s = format!("{value:.5}");
    if s.contains('.') {
        let trimmed = s.trim_end_matches('0').trim_end_matches('.').len();
        s.truncate(trimmed);
    }
    if s == "-0" {
        s = "0".to_string();
    }
    Ok(s)
}
