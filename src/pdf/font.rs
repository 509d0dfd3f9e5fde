use tracing::debug;
use ttf_parser::Face;

use super::encoding::win_ansi_char;
use super::filter::flate_stream;
use super::object::{Dictionary, Name, Object, ObjectRef, Stream};
use super::writer::PdfWriter;
use crate::core::HybridError;
use crate::dictionary;

const FIRST_CHAR: u8 = 32;
const LAST_CHAR: u8 = 255;

/// Descriptor flag: glyphs outside the standard Latin set.
const FLAG_SYMBOLIC: u32 = 1 << 2;
/// Descriptor flag: standard Latin character set.
const FLAG_NONSYMBOLIC: u32 = 1 << 5;
const FLAG_FIXED_PITCH: u32 = 1;
const FLAG_ITALIC: u32 = 1 << 6;

/// How text bytes map to glyphs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FontEncoding {
    /// `/WinAnsiEncoding` (cp1252); text is encoded by [`ContentStream`](super::ContentStream).
    #[default]
    WinAnsi,
    /// The program's built-in encoding; no `/Encoding` entry is written.
    Symbolic,
}

/// Container format of the font program, detected from its first bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontKind {
    /// glyf-based TrueType, embedded as `FontFile2`.
    TrueType,
    /// CFF-flavoured OpenType, embedded as `FontFile3 /Subtype /OpenType`.
    OpenType,
}

impl FontKind {
    pub fn detect(data: &[u8]) -> Option<Self> {
        match data.get(..4)? {
            [0x00, 0x01, 0x00, 0x00] | b"true" => Some(Self::TrueType),
            b"OTTO" => Some(Self::OpenType),
            _ => None,
        }
    }
}

/// Glyph widths (in 1/1000 em, codes 32..=255) and descriptor metrics.
#[derive(Debug, Clone, PartialEq)]
pub struct FontMetrics {
    pub widths: Vec<f64>,
    pub ascent: f64,
    pub descent: f64,
    pub cap_height: f64,
    pub italic_angle: f64,
    pub stem_v: f64,
    pub bbox: [f64; 4],
    pub fixed_pitch: bool,
    pub italic: bool,
}

impl FontMetrics {
    /// Every code the same advance width.
    pub fn uniform(width: f64) -> Self {
        Self {
            widths: vec![width; (LAST_CHAR - FIRST_CHAR) as usize + 1],
            ..Self::default()
        }
    }

    /// Read widths and vertical metrics from a TrueType/OpenType face.
    pub fn from_face(face: &Face<'_>) -> Self {
        let upem = f64::from(face.units_per_em().max(1));
        let scale = |v: f64| (v * 1000.0 / upem).round();
        let notdef = face
            .glyph_hor_advance(ttf_parser::GlyphId(0))
            .map(f64::from)
            .unwrap_or(0.0);

        let widths = (FIRST_CHAR..=LAST_CHAR)
            .map(|code| {
                win_ansi_char(code)
                    .and_then(|ch| face.glyph_index(ch))
                    .and_then(|gid| face.glyph_hor_advance(gid))
                    .map(f64::from)
                    .unwrap_or(notdef)
            })
            .map(scale)
            .collect();

        let bbox = face.global_bounding_box();
        let ascent = f64::from(face.ascender());
        Self {
            widths,
            ascent: scale(ascent),
            descent: scale(f64::from(face.descender())),
            cap_height: scale(face.capital_height().map(f64::from).unwrap_or(ascent)),
            italic_angle: 0.0,
            stem_v: 80.0,
            bbox: [
                scale(f64::from(bbox.x_min)),
                scale(f64::from(bbox.y_min)),
                scale(f64::from(bbox.x_max)),
                scale(f64::from(bbox.y_max)),
            ],
            fixed_pitch: face.is_monospaced(),
            italic: face.is_italic(),
        }
    }
}

impl Default for FontMetrics {
    /// Helvetica-like vertical metrics with 500-unit advances.
    fn default() -> Self {
        Self {
            widths: vec![500.0; (LAST_CHAR - FIRST_CHAR) as usize + 1],
            ascent: 718.0,
            descent: -207.0,
            cap_height: 718.0,
            italic_angle: 0.0,
            stem_v: 88.0,
            bbox: [-166.0, -225.0, 1000.0, 931.0],
            fixed_pitch: false,
            italic: false,
        }
    }
}

/// A font the painter declares before using it on a page.
#[derive(Debug, Clone)]
pub struct FontProgram {
    base_font: String,
    data: Vec<u8>,
    encoding: FontEncoding,
    metrics: Option<FontMetrics>,
}

impl FontProgram {
    /// `base_font` is the PostScript name written as `/BaseFont`.
    pub fn new(base_font: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            base_font: base_font.into(),
            data,
            encoding: FontEncoding::WinAnsi,
            metrics: None,
        }
    }

    pub fn encoding(mut self, encoding: FontEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Use these metrics instead of reading them from the program.
    pub fn metrics(mut self, metrics: FontMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn base_font(&self) -> &str {
        &self.base_font
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Write program, descriptor and font dictionary; returns the font reference.
    ///
    /// A program without bytes is written without `FontFile*` so the archival
    /// checks can report it against the pages that use it.
    pub(crate) fn write(self, writer: &mut PdfWriter, compress: bool) -> Result<ObjectRef, HybridError> {
        if self.base_font.is_empty() {
            return Err(HybridError::InvalidInput("font base name must not be empty".into()));
        }

        let kind = if self.data.is_empty() {
            None
        } else {
            Some(FontKind::detect(&self.data).ok_or_else(|| {
                HybridError::InvalidInput(format!(
                    "font program for {} is neither TrueType nor OpenType",
                    self.base_font
                ))
            })?)
        };

        let metrics = match (self.metrics, kind) {
            (Some(m), _) => m,
            (None, Some(_)) => {
                let face = Face::parse(&self.data, 0).map_err(|e| {
                    HybridError::InvalidInput(format!(
                        "cannot read font program for {}: {e}",
                        self.base_font
                    ))
                })?;
                FontMetrics::from_face(&face)
            }
            (None, None) => FontMetrics::default(),
        };
        let expected = (LAST_CHAR - FIRST_CHAR) as usize + 1;
        if metrics.widths.len() != expected {
            return Err(HybridError::InvalidInput(format!(
                "font {} needs {expected} widths for codes {FIRST_CHAR}..={LAST_CHAR}, got {}",
                self.base_font,
                metrics.widths.len()
            )));
        }

        let mut flags = match self.encoding {
            FontEncoding::WinAnsi => FLAG_NONSYMBOLIC,
            FontEncoding::Symbolic => FLAG_SYMBOLIC,
        };
        if metrics.fixed_pitch {
            flags |= FLAG_FIXED_PITCH;
        }
        if metrics.italic {
            flags |= FLAG_ITALIC;
        }

        let mut descriptor = dictionary! {
            "Type" => "FontDescriptor",
            "FontName" => Name::new(self.base_font.clone()),
            "Flags" => flags,
            "FontBBox" => metrics.bbox.iter().map(|v| Object::Real(*v)).collect::<Vec<_>>(),
            "ItalicAngle" => metrics.italic_angle,
            "Ascent" => metrics.ascent,
            "Descent" => metrics.descent,
            "CapHeight" => metrics.cap_height,
            "StemV" => metrics.stem_v,
        };

        let subtype = match kind {
            Some(kind) => {
                let raw_len = self.data.len();
                let (file_key, dict) = match kind {
                    FontKind::TrueType => ("FontFile2", dictionary! { "Length1" => raw_len }),
                    FontKind::OpenType => ("FontFile3", dictionary! { "Subtype" => "OpenType" }),
                };
                let mut stream = Stream::new(dict, self.data);
                if compress {
                    stream = flate_stream(stream)?;
                }
                let file_ref = writer.add(stream)?;
                descriptor.set(file_key, file_ref);
                debug!(font = %self.base_font, ?kind, bytes = raw_len, "embedded font program");
                match kind {
                    FontKind::TrueType => "TrueType",
                    FontKind::OpenType => "Type1",
                }
            }
            None => "TrueType",
        };
        let descriptor_ref = writer.add(descriptor)?;

        let mut font = dictionary! {
            "Type" => "Font",
            "Subtype" => subtype,
            "BaseFont" => Name::new(self.base_font),
            "FirstChar" => u32::from(FIRST_CHAR),
            "LastChar" => u32::from(LAST_CHAR),
            "Widths" => metrics.widths.into_iter().map(Object::Real).collect::<Vec<_>>(),
            "FontDescriptor" => descriptor_ref,
        };
        if self.encoding == FontEncoding::WinAnsi {
            font.set("Encoding", "WinAnsiEncoding");
        }
        writer.add(font)
    }
}

/// Whether a font descriptor points at an embedded, non-empty font program.
pub(crate) fn descriptor_embeds_program(writer: &PdfWriter, descriptor: &Dictionary) -> bool {
    ["FontFile", "FontFile2", "FontFile3"].iter().any(|key| {
        descriptor
            .get(key)
            .and_then(|o| writer.resolve(o))
            .and_then(Object::as_stream)
            .is_some_and(|s| !s.content.is_empty())
    })
}
