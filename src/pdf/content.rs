use super::encoding::encode_win_ansi;
use super::object::{Name, PdfString};
use super::writer::{encode_name, encode_string, format_real};
use crate::core::HybridError;

/// Builder for a page content stream.
///
/// Records which font resources are selected with `Tf` so the page's
/// `/Resources /Font` can be derived from the content.
#[derive(Debug, Clone, Default)]
pub struct ContentStream {
    ops: Vec<u8>,
    fonts: Vec<String>,
}

impl ContentStream {
    pub fn new() -> Self {
        Self::default()
    }

    fn operands(&mut self, values: &[f64]) -> Result<(), HybridError> {
        for v in values {
            self.ops.extend_from_slice(format_real(*v)?.as_bytes());
            self.ops.push(b' ');
        }
        Ok(())
    }

    fn op(&mut self, operator: &str) -> &mut Self {
        self.ops.extend_from_slice(operator.as_bytes());
        self.ops.push(b'\n');
        self
    }

    /// `q`
    pub fn save(&mut self) -> &mut Self {
        self.op("q")
    }

    /// `Q`
    pub fn restore(&mut self) -> &mut Self {
        self.op("Q")
    }

    pub fn begin_text(&mut self) -> &mut Self {
        self.op("BT")
    }

    pub fn end_text(&mut self) -> &mut Self {
        self.op("ET")
    }

    /// `/<font> <size> Tf`; `font` is a resource name declared on the canvas.
    pub fn set_font(&mut self, font: &str, size: f64) -> Result<&mut Self, HybridError> {
        encode_name(&Name::from(font), &mut self.ops);
        self.ops.push(b' ');
        self.operands(&[size])?;
        if !self.fonts.iter().any(|f| f == font) {
            self.fonts.push(font.to_string());
        }
        Ok(self.op("Tf"))
    }

    pub fn move_text(&mut self, x: f64, y: f64) -> Result<&mut Self, HybridError> {
        self.operands(&[x, y])?;
        Ok(self.op("Td"))
    }

    /// `(<text>) Tj` with the text encoded as WinAnsi.
    ///
    /// Fails when a character has no WinAnsi code.
    pub fn show_text(&mut self, text: &str) -> Result<&mut Self, HybridError> {
        let (bytes, replaced) = encode_win_ansi(text);
        if replaced > 0 {
            return Err(HybridError::InvalidInput(format!(
                "{replaced} character(s) of {text:?} cannot be encoded as WinAnsi"
            )));
        }
        encode_string(&PdfString::literal(bytes), &mut self.ops);
        self.ops.push(b' ');
        Ok(self.op("Tj"))
    }

    /// A complete `BT .. ET` block placing one line of text.
    pub fn text(
        &mut self,
        font: &str,
        size: f64,
        x: f64,
        y: f64,
        text: &str,
    ) -> Result<&mut Self, HybridError> {
        self.begin_text();
        self.set_font(font, size)?;
        self.move_text(x, y)?;
        self.show_text(text)?;
        Ok(self.end_text())
    }

    pub fn fill_rgb(&mut self, r: f64, g: f64, b: f64) -> Result<&mut Self, HybridError> {
        self.operands(&[r, g, b])?;
        Ok(self.op("rg"))
    }

    pub fn stroke_rgb(&mut self, r: f64, g: f64, b: f64) -> Result<&mut Self, HybridError> {
        self.operands(&[r, g, b])?;
        Ok(self.op("RG"))
    }

    pub fn line_width(&mut self, width: f64) -> Result<&mut Self, HybridError> {
        self.operands(&[width])?;
        Ok(self.op("w"))
    }

    pub fn move_to(&mut self, x: f64, y: f64) -> Result<&mut Self, HybridError> {
        self.operands(&[x, y])?;
        Ok(self.op("m"))
    }

    pub fn line_to(&mut self, x: f64, y: f64) -> Result<&mut Self, HybridError> {
        self.operands(&[x, y])?;
        Ok(self.op("l"))
    }

    pub fn rect(&mut self, x: f64, y: f64, w: f64, h: f64) -> Result<&mut Self, HybridError> {
        self.operands(&[x, y, w, h])?;
        Ok(self.op("re"))
    }

    pub fn fill(&mut self) -> &mut Self {
        self.op("f")
    }

    pub fn stroke(&mut self) -> &mut Self {
        self.op("S")
    }

    /// Append pre-built operators verbatim.
    pub fn raw(&mut self, operators: &[u8]) -> &mut Self {
        self.ops.extend_from_slice(operators);
        if !operators.ends_with(b"\n") {
            self.ops.push(b'\n');
        }
        self
    }

    /// Font resource names selected so far, in first-use order.
    pub fn fonts(&self) -> &[String] {
        &self.fonts
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.ops
    }

    pub fn into_parts(self) -> (Vec<u8>, Vec<String>) {
        (self.ops, self.fonts)
    }
}

const WHITESPACE: &[u8] = b"\0\t\n\x0c\r ";
const DELIMITERS: &[u8] = b"()<>[]{}/%";

fn is_regular(b: u8) -> bool {
    !WHITESPACE.contains(&b) && !DELIMITERS.contains(&b)
}

enum Operand {
    Name(String),
    Other,
}

/// Font resource names selected with `Tf` in a decoded content stream, in
/// first-use order.
///
/// Strings, comments and inline image data are skipped, so a `Tf` inside
/// them does not count.
pub fn selected_fonts(content: &[u8]) -> Vec<String> {
    let mut fonts = Vec::new();
    let mut operands: Vec<Operand> = Vec::new();
    let mut i = 0;
    while i < content.len() {
        let b = content[i];
        match b {
            _ if WHITESPACE.contains(&b) => i += 1,
            b'%' => {
                while i < content.len() && !matches!(content[i], b'\r' | b'\n') {
                    i += 1;
                }
            }
            b'(' => {
                i = skip_literal_string(content, i);
                operands.push(Operand::Other);
            }
            b'<' if content.get(i + 1) == Some(&b'<') => i += 2,
            b'>' if content.get(i + 1) == Some(&b'>') => i += 2,
            b'<' => {
                while i < content.len() && content[i] != b'>' {
                    i += 1;
                }
                i += 1;
                operands.push(Operand::Other);
            }
            b'[' | b']' | b'{' | b'}' | b'>' | b')' => i += 1,
            b'/' => {
                let start = i + 1;
                i = start;
                while i < content.len() && is_regular(content[i]) {
                    i += 1;
                }
                operands.push(Operand::Name(decode_name(&content[start..i])));
            }
            _ => {
                let start = i;
                while i < content.len() && is_regular(content[i]) {
                    i += 1;
                }
                let token = &content[start..i];
                if matches!(token, b"true" | b"false" | b"null")
                    || token
                        .first()
                        .is_some_and(|c| c.is_ascii_digit() || matches!(c, b'+' | b'-' | b'.'))
                {
                    operands.push(Operand::Other);
                    continue;
                }
                match token {
                    b"Tf" => {
                        if let [.., Operand::Name(font), _] = operands.as_slice() {
                            if !fonts.contains(font) {
                                fonts.push(font.clone());
                            }
                        }
                    }
                    b"ID" => i = skip_inline_image(content, i),
                    _ => {}
                }
                operands.clear();
            }
        }
    }
    fonts
}

/// Index just past the `)` closing the literal string opened at `start`.
fn skip_literal_string(content: &[u8], start: usize) -> usize {
    let mut depth = 0usize;
    let mut i = start;
    while i < content.len() {
        match content[i] {
            b'\\' => i += 1,
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return i + 1;
                }
            }
            _ => {}
        }
        i += 1;
    }
    content.len()
}

/// Index just past the `EI` that ends inline image data starting at `start`.
fn skip_inline_image(content: &[u8], start: usize) -> usize {
    let mut i = start + 1;
    while i + 2 <= content.len() {
        if WHITESPACE.contains(&content[i - 1])
            && &content[i..i + 2] == b"EI"
            && content.get(i + 2).is_none_or(|b| WHITESPACE.contains(b))
        {
            return i + 2;
        }
        i += 1;
    }
    content.len()
}

fn decode_name(raw: &[u8]) -> String {
    let mut out = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        let hex = raw
            .get(i + 1..i + 3)
            .and_then(|h| std::str::from_utf8(h).ok())
            .and_then(|h| u8::from_str_radix(h, 16).ok());
        match (raw[i], hex) {
            (b'#', Some(byte)) => {
                out.push(byte);
                i += 3;
            }
            (byte, _) => {
                out.push(byte);
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_block() {
        let mut c = ContentStream::new();
        c.text("F1", 12.0, 56.7, 780.5, "Rechnung (R-1)").unwrap();
        assert_eq!(
            String::from_utf8(c.as_bytes().to_vec()).unwrap(),
            "BT\n/F1 12 Tf\n56.7 780.5 Td\n(Rechnung \\(R-1\\)) Tj\nET\n"
        );
        assert_eq!(c.fonts(), ["F1"]);
    }

    #[test]
    fn graphics_ops() {
        let mut c = ContentStream::new();
        c.fill_rgb(0.86, 0.9, 1.0)
            .unwrap()
            .rect(42.5, 700.0, 510.0, 20.0)
            .unwrap()
            .fill();
        assert_eq!(
            String::from_utf8(c.as_bytes().to_vec()).unwrap(),
            "0.86 0.9 1 rg\n42.5 700 510 20 re\nf\n"
        );
        assert!(c.fonts().is_empty());
    }

    #[test]
    fn fonts_recorded_once() {
        let mut c = ContentStream::new();
        c.text("F1", 10.0, 0.0, 0.0, "a").unwrap();
        c.text("F2", 10.0, 0.0, 0.0, "b").unwrap();
        c.text("F1", 8.0, 0.0, 0.0, "c").unwrap();
        assert_eq!(c.fonts(), ["F1", "F2"]);
    }

    #[test]
    fn text_outside_win_ansi_fails() {
        let mut c = ContentStream::new();
        let err = c.text("F1", 10.0, 0.0, 0.0, "Zahlung \u{2713}").unwrap_err();
        assert!(matches!(err, HybridError::InvalidInput(_)), "{err}");
        assert!(c.show_text("Summe 12,50 \u{20ac}").is_ok());
    }

    #[test]
    fn scans_tf_operands() {
        let content = b"BT /F1 12 Tf 50 800 Td (Rechnung) Tj ET\nBT /F2 9 Tf (x) Tj /F1 8 Tf ET";
        assert_eq!(selected_fonts(content), ["F1", "F2"]);
    }

    #[test]
    fn scan_ignores_strings_and_comments() {
        let content = b"BT /F1 10 Tf (not /F7 10 Tf \\) (nested /F8 1 Tf)) Tj ET\n% /F9 10 Tf\n<2F4639> Tj";
        assert_eq!(selected_fonts(content), ["F1"]);
    }

    #[test]
    fn scan_decodes_escaped_names() {
        assert_eq!(selected_fonts(b"BT /Body#20Bold 11 Tf ET"), ["Body Bold"]);
        assert_eq!(selected_fonts(b"BT /F3 [1 2] 11 Tf ET"), Vec::<String>::new());
    }

    #[test]
    fn scan_skips_inline_images() {
        let content = b"BI /W 2 /H 1 /BPC 8 /CS /G ID \x2fF9 1 Tf EI Q\nBT /F4 10 Tf ET";
        assert_eq!(selected_fonts(content), ["F4"]);
    }

    #[test]
    fn non_finite_operand_fails() {
        let mut c = ContentStream::new();
        assert!(c.move_to(f64::INFINITY, 0.0).is_err());
    }
}
