//! Assemble a hybrid invoice from a TrueType font and a CII XML file.
//!
//! ```text
//! RUST_LOG=hybridbeleg=debug cargo run --example hybrid_invoice -- Font.ttf invoice.xml
//! ```

use std::env;
use std::fs;

use hybridbeleg::assemble::{HeaderPainter, assemble};
use hybridbeleg::core::*;
use hybridbeleg::pdf::FontProgram;
use tracing_subscriber::EnvFilter;

const SAMPLE_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rsm:CrossIndustryInvoice xmlns:rsm="urn:un:unece:uncefact:data:standard:CrossIndustryInvoice:100"
    xmlns:ram="urn:un:unece:uncefact:data:standard:ReusableAggregateBusinessInformationEntity:100">
  <rsm:ExchangedDocumentContext>
    <ram:GuidelineSpecifiedDocumentContextParameter>
      <ram:ID>urn:cen.eu:en16931:2017</ram:ID>
    </ram:GuidelineSpecifiedDocumentContextParameter>
  </rsm:ExchangedDocumentContext>
  <rsm:ExchangedDocument>
    <ram:ID>R-2024-0001</ram:ID>
    <ram:TypeCode>380</ram:TypeCode>
  </rsm:ExchangedDocument>
</rsm:CrossIndustryInvoice>
"#;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut args = env::args().skip(1);
    let Some(font_path) = args.next() else {
        eprintln!("usage: hybrid_invoice <font.ttf> [invoice.xml]");
        std::process::exit(2);
    };
    let font_data = fs::read(&font_path).expect("font file should be readable");
    let xml = match args.next() {
        Some(path) => fs::read(path).expect("XML file should be readable"),
        None => SAMPLE_XML.as_bytes().to_vec(),
    };

    let record = InvoiceRecord::with_header("R-2024-0001", "2024-03-15")
        .set("buyer", "Kunde AG")
        .set("total", 119.0);
    let options = AssembleOptions::builder()
        .author("ACME GmbH")
        .build()
        .expect("default options are valid");

    let painter = HeaderPainter::new(FontProgram::new("InvoiceSans", font_data));
    match assemble(&record, &xml, painter, &options) {
        Ok(pdf) => {
            let name = suggested_file_name(&record).expect("record has an invoice number");
            fs::write(&name, &pdf).expect("output should be writable");
            println!("wrote {name} ({} bytes)", pdf.len());
        }
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(e.exit_code());
        }
    }
}
