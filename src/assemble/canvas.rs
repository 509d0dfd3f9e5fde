use indexmap::IndexMap;
use tracing::debug;

use crate::core::{HybridError, InvoiceRecord, Rule};
use crate::dictionary;
use crate::pdf::{
    ContentStream, Dictionary, FontProgram, Name, Object, ObjectRef, PdfWriter, Stream,
    flate_stream, selected_fonts,
};

/// A4 portrait in points.
pub const A4_WIDTH: f64 = 595.276;
pub const A4_HEIGHT: f64 = 841.89;

const RESERVED_PAGE_KEYS: [&str; 5] = ["Type", "Parent", "MediaBox", "Resources", "Contents"];

/// Renders the visible invoice.
///
/// The painter declares its fonts on the [`Canvas`] and emits pages in the
/// order they should appear. It never sees object numbers of the document
/// structure; the assembler owns catalog, page tree and attachments.
pub trait Painter {
    fn paint(&mut self, record: &InvoiceRecord, canvas: &mut Canvas<'_>) -> Result<(), HybridError>;
}

/// Adapter returned by [`painter_fn`].
#[derive(Debug, Clone)]
pub struct FnPainter<F>(F);

impl<F> Painter for FnPainter<F>
where
    F: FnMut(&InvoiceRecord, &mut Canvas<'_>) -> Result<(), HybridError>,
{
    fn paint(&mut self, record: &InvoiceRecord, canvas: &mut Canvas<'_>) -> Result<(), HybridError> {
        (self.0)(record, canvas)
    }
}

/// Use a closure as a [`Painter`].
///
/// ```
/// use hybridbeleg::assemble::{Page, painter_fn};
/// use hybridbeleg::pdf::ContentStream;
///
/// let painter = painter_fn(|_record, canvas| {
///     let mut content = ContentStream::new();
///     content.rect(50.0, 50.0, 100.0, 20.0)?.stroke();
///     canvas.emit_page(Page::a4(content))?;
///     Ok(())
/// });
/// # let _ = painter;
/// ```
pub fn painter_fn<F>(f: F) -> FnPainter<F>
where
    F: FnMut(&InvoiceRecord, &mut Canvas<'_>) -> Result<(), HybridError>,
{
    FnPainter(f)
}

/// One page as handed to [`Canvas::emit_page`].
#[derive(Debug, Clone)]
pub struct Page {
    width: f64,
    height: f64,
    content: Vec<u8>,
    fonts: Vec<String>,
    resources: Dictionary,
    entries: Dictionary,
}

impl Page {
    /// Fonts selected in `content` become the page's font resources.
    pub fn new(width: f64, height: f64, content: ContentStream) -> Self {
        let (content, fonts) = content.into_parts();
        Self {
            width,
            height,
            content,
            fonts,
            resources: Dictionary::new(),
            entries: Dictionary::new(),
        }
    }

    pub fn a4(content: ContentStream) -> Self {
        Self::new(A4_WIDTH, A4_HEIGHT, content)
    }

    /// Raw content operators; fonts selected with `Tf` become the page's font
    /// resources.
    pub fn from_content(width: f64, height: f64, content: Vec<u8>) -> Self {
        Self {
            width,
            height,
            content,
            fonts: Vec::new(),
            resources: Dictionary::new(),
            entries: Dictionary::new(),
        }
    }

    /// Add a declared font to the page's `/Font` resources.
    pub fn font(mut self, id: impl Into<String>) -> Self {
        let id = id.into();
        if !self.fonts.contains(&id) {
            self.fonts.push(id);
        }
        self
    }

    /// Extra resource such as an `/XObject` or `/ExtGState` entry.
    pub fn resource(mut self, category: &str, key: &str, value: impl Into<Object>) -> Self {
        if let Some(Object::Dictionary(existing)) = self.resources.get_mut(category) {
            existing.set(key, value);
            return self;
        }
        self.resources.set(category, dictionary! { key => value });
        self
    }

    /// Extra page dictionary entry (`/Rotate`, `/Annots`, ...).
    pub fn entry(mut self, key: &str, value: impl Into<Object>) -> Self {
        self.entries.set(key, value);
        self
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }
}

/// Drawing handle passed to a [`Painter`].
#[derive(Debug)]
pub struct Canvas<'w> {
    writer: &'w mut PdfWriter,
    parent: ObjectRef,
    compress: bool,
    fonts: IndexMap<String, ObjectRef>,
    pages: Vec<ObjectRef>,
}

impl<'w> Canvas<'w> {
    pub(crate) fn new(writer: &'w mut PdfWriter, parent: ObjectRef, compress: bool) -> Self {
        Self {
            writer,
            parent,
            compress,
            fonts: IndexMap::new(),
            pages: Vec::new(),
        }
    }

    /// Embed a font under the resource name `id` (e.g. `F1`).
    pub fn declare_font(&mut self, id: &str, font: FontProgram) -> Result<(), HybridError> {
        if id.is_empty() {
            return Err(HybridError::InvalidInput("font id must not be empty".into()));
        }
        if self.fonts.contains_key(id) {
            return Err(HybridError::InvalidInput(format!(
                "font /{id} declared twice"
            )));
        }
        let base_font = font.base_font().to_string();
        let font_ref = font.write(self.writer, self.compress)?;
        debug!(id, %base_font, %font_ref, "declared font");
        self.fonts.insert(id.to_string(), font_ref);
        Ok(())
    }

    /// Append a page; pages appear in emission order.
    pub fn emit_page(&mut self, page: Page) -> Result<ObjectRef, HybridError> {
        let number = self.pages.len() + 1;
        if !(page.width.is_finite() && page.height.is_finite())
            || page.width <= 0.0
            || page.height <= 0.0
        {
            return Err(HybridError::InvalidInput(format!(
                "page {number} has invalid size {} x {}",
                page.width, page.height
            )));
        }
        if let Some(key) = RESERVED_PAGE_KEYS.iter().find(|k| page.entries.contains_key(k)) {
            return Err(HybridError::InvalidInput(format!(
                "page {number}: /{key} is set by the assembler"
            )));
        }
        if page.resources.contains_key("Font") {
            return Err(HybridError::InvalidInput(format!(
                "page {number}: fonts must be declared on the canvas, not passed as resources"
            )));
        }

        let mut used = page.fonts;
        for id in selected_fonts(&page.content) {
            if !used.contains(&id) {
                used.push(id);
            }
        }
        let mut fonts = Dictionary::new();
        for id in &used {
            let font_ref = self.fonts.get(id).ok_or_else(|| {
                HybridError::violation(
                    Rule::FontNotEmbedded,
                    format!("page {number} uses font /{id} which was never declared"),
                )
            })?;
            fonts.set(Name::new(id.clone()), *font_ref);
        }
        let mut resources = Dictionary::new();
        if !fonts.is_empty() {
            resources.set("Font", fonts);
        }
        for (key, value) in page.resources.iter() {
            resources.set(key.clone(), value.clone());
        }

        let mut content = Stream::new(Dictionary::new(), page.content);
        if self.compress {
            content = flate_stream(content)?;
        }
        let content_ref = self.writer.add(content)?;

        let mut dict = dictionary! {
            "Type" => "Page",
            "Parent" => self.parent,
            "MediaBox" => vec![0.into(), 0.into(), Object::Real(page.width), Object::Real(page.height)],
            "Resources" => resources,
            "Contents" => content_ref,
        };
        for (key, value) in page.entries.iter() {
            dict.set(key.clone(), value.clone());
        }
        let page_ref = self.writer.add(dict)?;
        debug!(page = number, %page_ref, fonts = used.len(), "emitted page");
        self.pages.push(page_ref);
        Ok(page_ref)
    }

    /// Write an auxiliary object (form XObject, annotation, ...) the page refers to.
    pub fn add_object(&mut self, object: impl Into<Object>) -> Result<ObjectRef, HybridError> {
        self.writer.add(object)
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn is_declared(&self, id: &str) -> bool {
        self.fonts.contains_key(id)
    }

    pub(crate) fn finish(self) -> Vec<ObjectRef> {
        self.pages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::FontMetrics;

    fn font() -> FontProgram {
        let mut data = vec![0x00, 0x01, 0x00, 0x00];
        data.extend_from_slice(&[0u8; 60]);
        FontProgram::new("Body", data).metrics(FontMetrics::default())
    }

    #[test]
    fn page_resources_follow_content() {
        let mut w = PdfWriter::new();
        let parent = w.allocate();
        let mut canvas = Canvas::new(&mut w, parent, false);
        canvas.declare_font("F1", font()).unwrap();
        canvas.declare_font("F2", font()).unwrap();

        let mut content = ContentStream::new();
        content.text("F1", 12.0, 50.0, 800.0, "Rechnung").unwrap();
        let page_ref = canvas.emit_page(Page::a4(content).entry("Rotate", 0)).unwrap();
        assert_eq!(canvas.finish(), [page_ref]);

        let page = w.get(page_ref).unwrap().as_dict().unwrap();
        assert_eq!(page.get("Parent").and_then(Object::as_reference), Some(parent));
        let fonts = page
            .get("Resources")
            .and_then(Object::as_dict)
            .and_then(|r| r.get("Font"))
            .and_then(Object::as_dict)
            .unwrap();
        assert_eq!(fonts.len(), 1);
        assert!(fonts.contains_key("F1"));
        assert_eq!(page.get("Rotate").and_then(Object::as_i64), Some(0));
        let contents = w.resolve(page.get("Contents").unwrap()).unwrap().as_stream().unwrap();
        assert_eq!(contents.content, b"BT\n/F1 12 Tf\n50 800 Td\n(Rechnung) Tj\nET\n");
    }

    #[test]
    fn undeclared_font_is_rejected() {
        let mut w = PdfWriter::new();
        let parent = w.allocate();
        let mut canvas = Canvas::new(&mut w, parent, true);
        let page = Page::from_content(A4_WIDTH, A4_HEIGHT, b"BT /F9 10 Tf ET".to_vec()).font("F9");
        let err = canvas.emit_page(page).unwrap_err();
        assert_eq!(err.rule(), Some(Rule::FontNotEmbedded));
    }

    #[test]
    fn raw_content_fonts_must_be_declared() {
        let mut w = PdfWriter::new();
        let parent = w.allocate();
        let mut canvas = Canvas::new(&mut w, parent, false);
        let page = Page::from_content(595.0, 842.0, b"BT /F9 12 Tf 50 800 Td (Rechnung) Tj ET".to_vec());
        let err = canvas.emit_page(page).unwrap_err();
        assert_eq!(err.rule(), Some(Rule::FontNotEmbedded));
        assert!(err.to_string().contains("/F9"), "{err}");

        let mut content = ContentStream::new();
        content.raw(b"BT /F2 10 Tf (x) Tj ET");
        let err = canvas.emit_page(Page::a4(content)).unwrap_err();
        assert_eq!(err.rule(), Some(Rule::FontNotEmbedded));
        assert_eq!(canvas.page_count(), 0);
    }

    #[test]
    fn raw_content_fonts_become_resources() {
        let mut w = PdfWriter::new();
        let parent = w.allocate();
        let mut canvas = Canvas::new(&mut w, parent, false);
        canvas.declare_font("F1", font()).unwrap();
        let page = Page::from_content(A4_WIDTH, A4_HEIGHT, b"BT /F1 10 Tf (x) Tj ET".to_vec());
        let page_ref = canvas.emit_page(page).unwrap();

        let page = w.get(page_ref).unwrap().as_dict().unwrap();
        let fonts = page
            .get("Resources")
            .and_then(Object::as_dict)
            .and_then(|r| r.get("Font"))
            .and_then(Object::as_dict)
            .unwrap();
        assert_eq!(fonts.len(), 1);
        assert!(fonts.contains_key("F1"));
    }

    #[test]
    fn duplicate_font_and_bad_pages_are_rejected() {
        let mut w = PdfWriter::new();
        let parent = w.allocate();
        let mut canvas = Canvas::new(&mut w, parent, true);
        canvas.declare_font("F1", font()).unwrap();
        assert!(canvas.declare_font("F1", font()).is_err());
        assert!(canvas.is_declared("F1"));

        let zero = Page::from_content(0.0, A4_HEIGHT, Vec::new());
        assert!(matches!(canvas.emit_page(zero), Err(HybridError::InvalidInput(_))));
        let reparented = Page::a4(ContentStream::new()).entry("Parent", ObjectRef::new(1));
        assert!(canvas.emit_page(reparented).is_err());
        assert_eq!(canvas.page_count(), 0);
    }

    #[test]
    fn resources_merge_by_category() {
        let page = Page::a4(ContentStream::new())
            .resource("XObject", "Im1", ObjectRef::new(5))
            .resource("XObject", "Fm1", ObjectRef::new(6));
        let xobjects = page.resources.get("XObject").and_then(Object::as_dict).unwrap();
        assert_eq!(xobjects.len(), 2);
    }

    #[test]
    fn content_is_compressed_when_enabled() {
        let mut w = PdfWriter::new();
        let parent = w.allocate();
        let mut canvas = Canvas::new(&mut w, parent, true);
        let page_ref = canvas
            .emit_page(Page::from_content(100.0, 100.0, b"0 0 m 10 10 l S".to_vec()))
            .unwrap();
        let page = w.get(page_ref).unwrap().as_dict().unwrap();
        let contents = w.resolve(page.get("Contents").unwrap()).unwrap().as_stream().unwrap();
        assert_eq!(contents.dict.get_name("Filter"), Some("FlateDecode"));
    }
}
