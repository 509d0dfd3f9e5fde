//! Property-based tests for the hybridbeleg crate.
//!
//! Run with: `cargo test --features all --test proptest_tests`

#![cfg(feature = "core")]

use hybridbeleg::assemble::{HeaderPainter, assemble};
use hybridbeleg::core::*;
use hybridbeleg::pdf::{
    ContentStream, FontMetrics, FontProgram, Name, Object, encode_object, format_real,
    selected_fonts,
};
use hybridbeleg::zugferd::escape_xml;
use proptest::prelude::*;

fn painter() -> HeaderPainter {
    let mut data = vec![0x00, 0x01, 0x00, 0x00];
    data.extend_from_slice(&[0u8; 60]);
    HeaderPainter::new(FontProgram::new("Body", data).metrics(FontMetrics::default()))
}

fn options() -> AssembleOptions {
    AssembleOptions::builder()
        .clock(FixedClock::parse("2024-03-15T10:00:00+01:00").unwrap())
        .build()
        .unwrap()
}

fn invoice_xml(body: &str) -> Vec<u8> {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<rsm:CrossIndustryInvoice>{}</rsm:CrossIndustryInvoice>",
        escape_xml(body)
    )
    .into_bytes()
}

/// Undo `#HH` escapes of an encoded name, without the leading `/`.
fn decode_name(encoded: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut i = 1;
    while i < encoded.len() {
        if encoded[i] == b'#' {
            let hex = std::str::from_utf8(&encoded[i + 1..i + 3]).unwrap();
            out.push(u8::from_str_radix(hex, 16).unwrap());
            i += 3;
        } else {
            out.push(encoded[i]);
            i += 1;
        }
    }
    out
}

// ── Proptest Strategies ─────────────────────────────────────────────────────

fn arb_invoice_number() -> impl Strategy<Value = String> {
    "[A-Z]{1,3}-20[0-9]{2}-[0-9]{1,6}"
}

fn arb_safe_text() -> impl Strategy<Value = String> {
    "[A-Za-z0-9 äöüßÄÖÜ.,;:!?()/-]{0,64}"
}

// ── Property Tests ──────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn escape_is_identity_without_markup(text in arb_safe_text()) {
        prop_assert_eq!(escape_xml(&text), text);
    }

    #[test]
    fn escape_round_trips(text in ".{0,64}") {
        let escaped = escape_xml(&text);
        prop_assert!(!escaped.contains('<'));
        prop_assert!(!escaped.contains('"'));
        let unescaped = quick_xml::escape::unescape(&escaped).unwrap();
        prop_assert_eq!(unescaped.as_ref(), text.as_str());
    }

    #[test]
    fn names_encode_to_regular_bytes(raw in "\\PC{1,24}") {
        let mut out = Vec::new();
        encode_object(&Object::Name(Name::new(raw.clone())), &mut out).unwrap();
        prop_assert_eq!(out[0], b'/');
        const DELIMITERS: &[u8] = b"/()<>[]{}%";
        prop_assert!(out[1..].iter().all(|b| (0x21..=0x7E).contains(b) && !DELIMITERS.contains(b)));
        prop_assert_eq!(decode_name(&out), raw.into_bytes());
    }

    #[test]
    fn scan_finds_the_fonts_the_builder_selected(
        fonts in proptest::collection::vec("\\PC{1,12}", 1..6),
        text in arb_safe_text(),
    ) {
        let mut content = ContentStream::new();
        for font in &fonts {
            content.text(font, 10.0, 50.0, 700.0, &text).unwrap();
        }
        prop_assert_eq!(selected_fonts(content.as_bytes()), content.fonts());
    }

    #[test]
    fn scan_accepts_any_bytes(bytes in proptest::collection::vec(any::<u8>(), 0..512)) {
        let _ = selected_fonts(&bytes);
    }

    #[test]
    fn reals_have_no_exponent(value in -1.0e9f64..1.0e9f64) {
        let s = format_real(value).unwrap();
        prop_assert!(!s.contains('e') && !s.contains('E'));
        let back: f64 = s.parse().unwrap();
        prop_assert!((back - value).abs() <= 5e-6);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn assembly_is_deterministic(number in arb_invoice_number(), body in arb_safe_text()) {
        let record = InvoiceRecord::with_header(number, "2024-03-15");
        let xml = invoice_xml(&body);
        let first = assemble(&record, &xml, painter(), &options()).unwrap();
        let second = assemble(&record, &xml, painter(), &options()).unwrap();
        prop_assert_eq!(first, second);
    }
}

#[cfg(feature = "inspect")]
mod inspect {
    use super::*;
    use hybridbeleg::zugferd::{check_hybrid, extract_xml};

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn attachment_round_trips(number in arb_invoice_number(), body in ".{0,200}") {
            let record = InvoiceRecord::with_header(number, "2024-03-15");
            let xml = invoice_xml(&body);
            let pdf = assemble(&record, &xml, painter(), &options()).unwrap();
            prop_assert_eq!(extract_xml(&pdf).unwrap(), xml);
            prop_assert!(check_hybrid(&pdf).unwrap().is_empty());
        }
    }
}
