use criterion::{Criterion, black_box, criterion_group, criterion_main};

use hybridbeleg::assemble::{HeaderPainter, Page, assemble, painter_fn};
use hybridbeleg::core::*;
use hybridbeleg::pdf::{ContentStream, FontMetrics, FontProgram};
use hybridbeleg::pdfa::IccProfile;

fn font() -> FontProgram {
    let mut data = vec![0x00, 0x01, 0x00, 0x00];
    data.extend_from_slice(&[0u8; 4096]);
    FontProgram::new("Body", data).metrics(FontMetrics::uniform(500.0))
}

fn options(compress: bool) -> AssembleOptions {
    AssembleOptions::builder()
        .clock(FixedClock::parse("2024-06-15T12:00:00+02:00").unwrap())
        .compress_content(compress)
        .build()
        .unwrap()
}

/// A CII document with `lines` line items, roughly 600 bytes each.
fn invoice_xml(lines: usize) -> Vec<u8> {
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<rsm:CrossIndustryInvoice>\n",
    );
    for i in 1..=lines {
        xml.push_str(&format!(
            "  <ram:IncludedSupplyChainTradeLineItem><ram:AssociatedDocumentLineDocument>\
             <ram:LineID>{i}</ram:LineID></ram:AssociatedDocumentLineDocument>\
             <ram:SpecifiedTradeProduct><ram:Name>Item {i}</ram:Name></ram:SpecifiedTradeProduct>\
             <ram:SpecifiedLineTradeAgreement><ram:NetPriceProductTradePrice>\
             <ram:ChargeAmount>9.99</ram:ChargeAmount></ram:NetPriceProductTradePrice>\
             </ram:SpecifiedLineTradeAgreement></ram:IncludedSupplyChainTradeLineItem>\n"
        ));
    }
    xml.push_str("</rsm:CrossIndustryInvoice>\n");
    xml.into_bytes()
}

fn record() -> InvoiceRecord {
    InvoiceRecord::with_header("BENCH-001", "2024-06-15")
}

// ── Assembly ───────────────────────────────────────────────────────

fn bench_assemble_single_page(c: &mut Criterion) {
    let xml = invoice_xml(10);
    let options = options(true);
    c.bench_function("assemble_1_page_10_lines", |b| {
        b.iter(|| {
            black_box(assemble(
                black_box(&record()),
                black_box(&xml),
                HeaderPainter::new(font()),
                &options,
            ))
        });
    });
}

fn bench_assemble_many_pages(c: &mut Criterion) {
    let xml = invoice_xml(1000);
    for (name, compress) in [("assemble_50_pages_flate", true), ("assemble_50_pages_plain", false)] {
        let options = options(compress);
        c.bench_function(name, |b| {
            b.iter(|| {
                let painter = painter_fn(|_record, canvas| {
                    canvas.declare_font("F1", font())?;
                    for page in 1..=50 {
                        let mut content = ContentStream::new();
                        for row in 0..40 {
                            content.text(
                                "F1",
                                9.0,
                                56.7,
                                780.0 - f64::from(row) * 18.0,
                                &format!("Seite {page} Position {row}: Artikel 9,99 EUR"),
                            )?;
                        }
                        canvas.emit_page(Page::a4(content))?;
                    }
                    Ok(())
                });
                black_box(assemble(&record(), black_box(&xml), painter, &options))
            });
        });
    }
}

// ── Building blocks ────────────────────────────────────────────────

fn bench_srgb_profile(c: &mut Criterion) {
    c.bench_function("icc_parse_srgb", |b| {
        let bytes = IccProfile::srgb().bytes().to_vec();
        b.iter(|| black_box(IccProfile::from_bytes(black_box(bytes.clone()))));
    });
}

#[cfg(feature = "inspect")]
fn bench_extract(c: &mut Criterion) {
    let pdf = assemble(&record(), &invoice_xml(100), HeaderPainter::new(font()), &options(true)).unwrap();
    c.bench_function("extract_xml", |b| {
        b.iter(|| black_box(hybridbeleg::zugferd::extract_xml(black_box(&pdf))));
    });
    c.bench_function("check_hybrid", |b| {
        b.iter(|| black_box(hybridbeleg::zugferd::check_hybrid(black_box(&pdf))));
    });
}

#[cfg(not(feature = "inspect"))]
fn bench_extract(_c: &mut Criterion) {}

criterion_group!(
    benches,
    bench_assemble_single_page,
    bench_assemble_many_pages,
    bench_srgb_profile,
    bench_extract,
);
criterion_main!(benches);
