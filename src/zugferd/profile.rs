use crate::core::HybridError;

/// ZUGFeRD / Factur-X conformance profile of the embedded XML.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ZugferdProfile {
    /// Minimal machine-readable data (no line items).
    Minimum,
    /// Basic data without line items.
    BasicWl,
    /// Basic with line items.
    Basic,
    /// Full EN 16931 European norm.
    #[default]
    EN16931,
    /// Extended profile (beyond EN 16931).
    Extended,
    /// XRechnung profile (German public sector).
    XRechnung,
}

impl ZugferdProfile {
    /// The XMP `ConformanceLevel` value.
    pub fn conformance_level(&self) -> &'static str {
        match self {
            Self::Minimum => "MINIMUM",
            Self::BasicWl => "BASIC WL",
            Self::Basic => "BASIC",
            Self::EN16931 => "EN 16931",
            Self::Extended => "EXTENDED",
            Self::XRechnung => "XRECHNUNG",
        }
    }
}

/// File name of the embedded invoice. Only these two are recognised by
/// ZUGFeRD 2.x and Factur-X readers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AttachmentName {
    /// `ZUGFeRD-invoice.xml`
    #[default]
    Zugferd,
    /// `factur-x.xml`
    FacturX,
}

impl AttachmentName {
    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Zugferd => "ZUGFeRD-invoice.xml",
            Self::FacturX => "factur-x.xml",
        }
    }

    /// Exact, case-sensitive match against the two accepted names.
    pub fn parse(name: &str) -> Result<Self, HybridError> {
        match name {
            "ZUGFeRD-invoice.xml" => Ok(Self::Zugferd),
            "factur-x.xml" => Ok(Self::FacturX),
            other => Err(HybridError::UnsupportedOption(format!(
                "attachment name {other:?} is neither ZUGFeRD-invoice.xml nor factur-x.xml"
            ))),
        }
    }

    /// Namespace URI of the XMP extension schema that describes the attachment.
    pub fn namespace(&self) -> &'static str {
        match self {
            Self::Zugferd => "urn:zugferd:pdfa:CrossIndustryDocument:invoice:2p0#",
            Self::FacturX => "urn:factur-x:pdfa:CrossIndustryDocument:invoice:1p0#",
        }
    }

    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Zugferd => "zf",
            Self::FacturX => "fx",
        }
    }

    pub fn schema_name(&self) -> &'static str {
        match self {
            Self::Zugferd => "ZUGFeRD PDFA Extension Schema",
            Self::FacturX => "Factur-X PDFA Extension Schema",
        }
    }

    /// Version value of the extension schema.
    pub fn version(&self) -> &'static str {
        "1.0"
    }
}

impl std::fmt::Display for AttachmentName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.file_name())
    }
}

/// `AFRelationship` values defined by PDF 2.0 / PDF/A-3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AfRelationship {
    Source,
    Data,
    Alternative,
    Supplement,
    EncryptedPayload,
    FormData,
    Schema,
    Unspecified,
}

impl AfRelationship {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Source => "Source",
            Self::Data => "Data",
            Self::Alternative => "Alternative",
            Self::Supplement => "Supplement",
            Self::EncryptedPayload => "EncryptedPayload",
            Self::FormData => "FormData",
            Self::Schema => "Schema",
            Self::Unspecified => "Unspecified",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "Source" => Self::Source,
            "Data" => Self::Data,
            "Alternative" => Self::Alternative,
            "Supplement" => Self::Supplement,
            "EncryptedPayload" => Self::EncryptedPayload,
            "FormData" => Self::FormData,
            "Schema" => Self::Schema,
            "Unspecified" => Self::Unspecified,
            _ => return None,
        })
    }
}
