#![cfg(feature = "inspect")]

use hybridbeleg::assemble::{HeaderPainter, assemble};
use hybridbeleg::core::*;
use hybridbeleg::pdf::{FontMetrics, FontProgram};
use hybridbeleg::zugferd::{AttachmentName, check_hybrid, extract_xml};

const XML: &[u8] = br#"<?xml version="1.0" encoding="UTF-8"?>
<rsm:CrossIndustryInvoice xmlns:rsm="urn:un:unece:uncefact:data:standard:CrossIndustryInvoice:100">
  <rsm:ExchangedDocument><ram:ID>R-2024-0001</ram:ID></rsm:ExchangedDocument>
</rsm:CrossIndustryInvoice>"#;

fn painter() -> HeaderPainter {
    let mut data = vec![0x00, 0x01, 0x00, 0x00];
    data.extend_from_slice(&[0u8; 60]);
    HeaderPainter::new(FontProgram::new("Body", data).metrics(FontMetrics::default()))
}

fn hybrid(attachment: AttachmentName) -> Vec<u8> {
    let options = AssembleOptions::builder()
        .clock(FixedClock::parse("2024-03-15T10:00:00+01:00").unwrap())
        .attachment_name(attachment)
        .build()
        .unwrap();
    let record = InvoiceRecord::with_header("R-2024-0001", "2024-03-15");
    assemble(&record, XML, painter(), &options).unwrap()
}

/// Replace the only occurrence of `from` with `to`; both must have the same
/// length so the cross-reference offsets stay valid.
fn mutate(pdf: &[u8], from: &[u8], to: &[u8]) -> Vec<u8> {
    assert_eq!(from.len(), to.len());
    let positions: Vec<usize> = pdf
        .windows(from.len())
        .enumerate()
        .filter(|(_, w)| *w == from)
        .map(|(i, _)| i)
        .collect();
    assert_eq!(positions.len(), 1, "{:?}", String::from_utf8_lossy(from));
    let mut out = pdf.to_vec();
    out[positions[0]..positions[0] + to.len()].copy_from_slice(to);
    out
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

#[test]
fn extract_returns_the_attached_bytes() {
    assert_eq!(extract_xml(&hybrid(AttachmentName::Zugferd)).unwrap(), XML);
}

#[test]
fn extract_factur_x_attachment() {
    assert_eq!(extract_xml(&hybrid(AttachmentName::FacturX)).unwrap(), XML);
}

#[test]
fn extract_falls_back_to_af_array() {
    let pdf = mutate(
        &hybrid(AttachmentName::Zugferd),
        b"/EmbeddedFiles",
        b"/EmbeddedFilez",
    );
    assert_eq!(extract_xml(&pdf).unwrap(), XML);
}

#[test]
fn extract_rejects_garbage() {
    assert!(matches!(
        extract_xml(b"not a pdf at all"),
        Err(HybridError::Pdf(_))
    ));
}

// ---------------------------------------------------------------------------
// Conformance re-check
// ---------------------------------------------------------------------------

#[test]
fn assembled_file_has_no_findings() {
    let findings = check_hybrid(&hybrid(AttachmentName::Zugferd)).unwrap();
    assert!(findings.is_empty(), "{findings:?}");
}

#[test]
fn wrong_relationship_is_reported() {
    let pdf = mutate(
        &hybrid(AttachmentName::Zugferd),
        b"/AFRelationship /Alternative",
        b"/AFRelationship /Source     ",
    );
    let findings = check_hybrid(&pdf).unwrap();
    assert_eq!(findings.len(), 1, "{findings:?}");
    assert_eq!(findings[0].rule, Rule::AfRelationship);
    assert!(findings[0].detail.contains("/Source"));
}

#[test]
fn undefined_relationship_is_reported() {
    let pdf = mutate(
        &hybrid(AttachmentName::Zugferd),
        b"/AFRelationship /Alternative",
        b"/AFRelationship /Alternativ ",
    );
    let findings = check_hybrid(&pdf).unwrap();
    assert_eq!(findings.len(), 1, "{findings:?}");
    assert_eq!(findings[0].rule, Rule::AfRelationship);
    assert!(findings[0].detail.contains("/Alternativ is not a defined relationship"));
}

#[test]
fn missing_af_array_is_reported() {
    let pdf = mutate(&hybrid(AttachmentName::Zugferd), b"/AF [", b"/XF [");
    let findings = check_hybrid(&pdf).unwrap();
    assert!(
        findings
            .iter()
            .any(|f| f.rule == Rule::EmbeddedFileRegistration && f.detail.contains("AF array")),
        "{findings:?}"
    );
}

#[test]
fn wrong_conformance_level_is_reported() {
    let pdf = mutate(
        &hybrid(AttachmentName::Zugferd),
        b"<pdfaid:conformance>U<",
        b"<pdfaid:conformance>B<",
    );
    let findings = check_hybrid(&pdf).unwrap();
    assert_eq!(findings.len(), 1, "{findings:?}");
    assert_eq!(findings[0].rule, Rule::MetadataStream);
}

#[test]
fn check_rejects_unparsable_input() {
    assert!(matches!(check_hybrid(b"not a pdf at all"), Err(HybridError::Pdf(_))));
}
