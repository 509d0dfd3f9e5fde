use chrono::{DateTime, Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::HybridError;

/// Key holding the invoice number.
pub const INVOICE_NUMBER_KEY: &str = "invoiceNumber";
/// Key holding the ISO-8601 invoice date.
pub const INVOICE_DATE_KEY: &str = "invoiceDate";

/// The pre-parsed invoice record handed to the assembler.
///
/// Only [`INVOICE_NUMBER_KEY`] and [`INVOICE_DATE_KEY`] are read by the
/// container logic; every other entry is passed through to the painter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvoiceRecord(Map<String, Value>);

impl InvoiceRecord {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Build a record carrying just the two fields the container needs.
    pub fn with_header(number: impl Into<String>, date: impl Into<String>) -> Self {
        Self::new()
            .set(INVOICE_NUMBER_KEY, number.into())
            .set(INVOICE_DATE_KEY, date.into())
    }

    /// Parse a record from JSON text. The top level must be an object.
    pub fn from_json(text: &str) -> Result<Self, HybridError> {
        serde_json::from_str(text)
            .map_err(|e| HybridError::InvalidInput(format!("invoice record is not a JSON object: {e}")))
    }

    pub fn set(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// String value at `key`, if present and a string.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    /// The invoice number; must be a non-empty string.
    pub fn invoice_number(&self) -> Result<&str, HybridError> {
        match self.0.get(INVOICE_NUMBER_KEY) {
            Some(Value::String(s)) if !s.trim().is_empty() => Ok(s),
            Some(Value::String(_)) => Err(HybridError::InvalidInput(format!(
                "{INVOICE_NUMBER_KEY} must not be empty"
            ))),
            Some(other) => Err(HybridError::InvalidInput(format!(
                "{INVOICE_NUMBER_KEY} must be a string, got {other}"
            ))),
            None => Err(HybridError::InvalidInput(format!(
                "missing required key {INVOICE_NUMBER_KEY}"
            ))),
        }
    }

    /// The invoice date.
    ///
    /// Accepts a calendar date (`2024-03-15`) or an RFC 3339 timestamp,
    /// in which case the date part is used.
    pub fn invoice_date(&self) -> Result<NaiveDate, HybridError> {
        let raw = self.get_str(INVOICE_DATE_KEY).ok_or_else(|| {
            HybridError::InvalidInput(format!("missing required string key {INVOICE_DATE_KEY}"))
        })?;
        parse_iso_date(raw)
    }
}

fn parse_iso_date(raw: &str) -> Result<NaiveDate, HybridError> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date);
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.date_naive());
    }
    Err(HybridError::InvalidInput(format!(
        "{INVOICE_DATE_KEY} is not an ISO-8601 date: {raw:?}"
    )))
}

/// File name for the finished hybrid invoice, e.g. `RG-2024-R-0001-E-Rechnung.pdf`.
///
/// Characters outside `[A-Za-z0-9._-]` in the invoice number are replaced by `_`.
pub fn suggested_file_name(record: &InvoiceRecord) -> Result<String, HybridError> {
    let number: String = record
        .invoice_number()?
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let year = record.invoice_date()?.year();
    Ok(format!("RG-{year}-{number}-E-Rechnung.pdf"))
}
