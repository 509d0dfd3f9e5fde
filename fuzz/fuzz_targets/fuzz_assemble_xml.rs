#![no_main]

use hybridbeleg::assemble::{Page, assemble, painter_fn};
use hybridbeleg::core::*;
use hybridbeleg::pdf::ContentStream;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(clock) = FixedClock::parse("2024-03-15T10:00:00+01:00") else {
        return;
    };
    let Ok(options) = AssembleOptions::builder().clock(clock).build() else {
        return;
    };
    let record = InvoiceRecord::with_header("FUZZ-1", "2024-03-15");
    let painter = painter_fn(|_record, canvas| {
        canvas.emit_page(Page::a4(ContentStream::new()))?;
        Ok(())
    });

    // Any payload the assembler accepts must come back out unchanged.
    if let Ok(pdf) = assemble(&record, data, painter, &options) {
        let extracted = hybridbeleg::zugferd::extract_xml(&pdf);
        assert_eq!(extracted.ok().as_deref(), Some(data));
    }
});
