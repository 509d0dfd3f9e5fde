use chrono::{DateTime, FixedOffset, SecondsFormat, Utc};

/// PDF date with offset: `D:YYYYMMDDHHmmSS+HH'mm'`.
pub fn pdf_date(at: &DateTime<FixedOffset>) -> String {
    let offset = at.offset().local_minus_utc();
    let sign = if offset < 0 { '-' } else { '+' };
    let offset = offset.abs();
    format!(
        "D:{}{sign}{:02}'{:02}'",
        at.format("%Y%m%d%H%M%S"),
        offset / 3600,
        (offset % 3600) / 60
    )
}

/// PDF date in UTC: `D:YYYYMMDDHHmmSSZ`, used for embedded-file `ModDate`.
pub fn pdf_date_utc(at: &DateTime<FixedOffset>) -> String {
    format!("D:{}Z", at.with_timezone(&Utc).format("%Y%m%d%H%M%S"))
}

/// XMP date with the same offset as [`pdf_date`], e.g. `2024-03-15T10:00:00+01:00`.
pub fn xmp_date(at: &DateTime<FixedOffset>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, false)
}
