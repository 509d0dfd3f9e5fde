use indexmap::IndexMap;

/// A PDF name, stored unescaped (`text/xml`, not `text#2Fxml`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Name(String);

impl Name {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Name {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Name {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Reference to an indirect object. Generation is always 0 for objects we write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectRef {
    pub number: u32,
    pub generation: u16,
}

impl ObjectRef {
    pub fn new(number: u32) -> Self {
        Self {
            number,
            generation: 0,
        }
    }
}

impl std::fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} R", self.number, self.generation)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringFormat {
    /// `( ... )` with `\(`, `\)`, `\\` escapes.
    Literal,
    /// `< ... >`, used for binary data such as the trailer `ID`.
    Hexadecimal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfString {
    pub bytes: Vec<u8>,
    pub format: StringFormat,
}

impl PdfString {
    pub fn literal(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
            format: StringFormat::Literal,
        }
    }

    pub fn hex(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
            format: StringFormat::Hexadecimal,
        }
    }

    /// A text string: plain bytes for ASCII, UTF-16BE with BOM otherwise.
    pub fn text(s: &str) -> Self {
        if s.is_ascii() {
            Self::literal(s.as_bytes())
        } else {
            Self::utf16be(s)
        }
    }

    /// UTF-16BE with a leading byte order mark, as required for `UF` entries.
    pub fn utf16be(s: &str) -> Self {
        let mut bytes = vec![0xFE, 0xFF];
        for unit in s.encode_utf16() {
            bytes.extend_from_slice(&unit.to_be_bytes());
        }
        Self::literal(bytes)
    }
}

/// Insertion-ordered dictionary; entries serialize in the order they were set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dictionary(IndexMap<Name, Object>);

impl Dictionary {
    pub fn new() -> Self {
        Self(IndexMap::new())
    }

    /// Set `key`, keeping its original position if it already exists.
    pub fn set(&mut self, key: impl Into<Name>, value: impl Into<Object>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn with(mut self, key: impl Into<Name>, value: impl Into<Object>) -> Self {
        self.set(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Object> {
        self.0.get(&Name::from(key))
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Object> {
        self.0.get_mut(&Name::from(key))
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(&Name::from(key))
    }

    /// The name stored at `key`, if any.
    pub fn get_name(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Object::as_name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Name, &Object)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(Name, Object)> for Dictionary {
    fn from_iter<I: IntoIterator<Item = (Name, Object)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A stream: dictionary plus raw (already filtered) payload.
///
/// `Length` is managed by the writer and must not be set by callers.
#[derive(Debug, Clone, PartialEq)]
pub struct Stream {
    pub dict: Dictionary,
    pub content: Vec<u8>,
}

impl Stream {
    pub fn new(dict: Dictionary, content: impl Into<Vec<u8>>) -> Self {
        Self {
            dict,
            content: content.into(),
        }
    }
}

/// A PDF object.
#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    Null,
    Boolean(bool),
    Integer(i64),
    Real(f64),
    Name(Name),
    String(PdfString),
    Array(Vec<Object>),
    Dictionary(Dictionary),
    Stream(Stream),
    Reference(ObjectRef),
}

impl Object {
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Self::Name(n) => Some(n.as_str()),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&Dictionary> {
        match self {
            Self::Dictionary(d) => Some(d),
            Self::Stream(s) => Some(&s.dict),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Object]> {
        match self {
            Self::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<ObjectRef> {
        match self {
            Self::Reference(r) => Some(*r),
            _ => None,
        }
    }

    pub fn as_stream(&self) -> Option<&Stream> {
        match self {
            Self::Stream(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&PdfString> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<bool> for Object {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

impl From<i64> for Object {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<i32> for Object {
    fn from(v: i32) -> Self {
        Self::Integer(v.into())
    }
}

impl From<u32> for Object {
    fn from(v: u32) -> Self {
        Self::Integer(v.into())
    }
}

impl From<usize> for Object {
    fn from(v: usize) -> Self {
        Self::Integer(v as i64)
    }
}

impl From<f64> for Object {
    fn from(v: f64) -> Self {
        Self::Real(v)
    }
}

/// Plain string slices become names, as in `"Type" => "Catalog"`.
impl From<&str> for Object {
    fn from(v: &str) -> Self {
        Self::Name(Name::from(v))
    }
}

impl From<Name> for Object {
    fn from(v: Name) -> Self {
        Self::Name(v)
    }
}

impl From<PdfString> for Object {
    fn from(v: PdfString) -> Self {
        Self::String(v)
    }
}

impl From<Vec<Object>> for Object {
    fn from(v: Vec<Object>) -> Self {
        Self::Array(v)
    }
}

impl From<Dictionary> for Object {
    fn from(v: Dictionary) -> Self {
        Self::Dictionary(v)
    }
}

impl From<Stream> for Object {
    fn from(v: Stream) -> Self {
        Self::Stream(v)
    }
}

impl From<ObjectRef> for Object {
    fn from(v: ObjectRef) -> Self {
        Self::Reference(v)
    }
}

/// Build a [`Dictionary`] in insertion order.
///
/// ```
/// use hybridbeleg::dictionary;
/// use hybridbeleg::pdf::Object;
///
/// let d = dictionary! {
///     "Type" => "Metadata",
///     "Subtype" => "XML",
/// };
/// assert_eq!(d.get_name("Subtype"), Some("XML"));
/// ```
#[macro_export]
macro_rules! dictionary {
    () => {
        $crate::pdf::Dictionary::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut dict = $crate::pdf::Dictionary::new();
        $(
            dict.set($key, $value);
        )+
        dict
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dictionary_keeps_insertion_order() {
        let d = crate::dictionary! {
            "Type" => "Filespec",
            "F" => PdfString::literal("a.xml"),
            "AFRelationship" => "Alternative",
        };
        let keys: Vec<&str> = d.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["Type", "F", "AFRelationship"]);
    }

    #[test]
    fn overwrite_keeps_position() {
        let mut d = crate::dictionary! { "A" => 1, "B" => 2 };
        d.set("A", 3);
        let keys: Vec<&str> = d.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["A", "B"]);
        assert_eq!(d.get("A").and_then(Object::as_i64), Some(3));
    }

    #[test]
    fn utf16be_text_has_bom() {
        let s = PdfString::utf16be("Ab");
        assert_eq!(s.bytes, [0xFE, 0xFF, 0x00, b'A', 0x00, b'b']);
        assert_eq!(PdfString::text("Rechnung").bytes, b"Rechnung");
        assert_eq!(PdfString::text("Größe").bytes[..2], [0xFE, 0xFF]);
    }
}
