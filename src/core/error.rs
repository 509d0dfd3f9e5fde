use thiserror::Error;

/// Errors that can occur while assembling or inspecting a hybrid invoice.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HybridError {
    /// Missing record key, malformed date, empty or non-UTF-8 XML payload.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An indirect reference points at an object that was never written.
    #[error("unresolved reference: object {object} 0 R was never written")]
    UnresolvedReference { object: u32 },

    /// The archival invariant checks rejected the document.
    #[error("invariant violation ({rule}): {detail}")]
    InvariantViolation { rule: Rule, detail: String },

    /// Unrecognized or mutually exclusive option combination.
    #[error("unsupported option: {0}")]
    UnsupportedOption(String),

    /// The object graph cannot be serialized (duplicate write, nested stream, ...).
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Reading a finished PDF back failed.
    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HybridError {
    pub(crate) fn violation(rule: Rule, detail: impl Into<String>) -> Self {
        Self::InvariantViolation {
            rule,
            detail: detail.into(),
        }
    }

    /// The violated rule, if this is an [`HybridError::InvariantViolation`].
    pub fn rule(&self) -> Option<Rule> {
        match self {
            Self::InvariantViolation { rule, .. } => Some(*rule),
            _ => None,
        }
    }

    /// Process exit code when the assembler is wrapped as a command.
    ///
    /// `2` invalid input, `3` archival invariant violation, `4` I/O.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidInput(_) | Self::UnsupportedOption(_) | Self::Serialization(_) => 2,
            Self::InvariantViolation { .. } | Self::UnresolvedReference { .. } => 3,
            Self::Io(_) | Self::Pdf(_) => 4,
        }
    }
}

/// A named archival or hybrid-invoice rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Rule {
    /// Catalog lacks a `GTS_PDFA1` output intent with an embedded ICC profile.
    OutputIntent,
    /// A font used by a page has no `FontFile*` in its descriptor.
    FontNotEmbedded,
    /// Catalog `Metadata` does not resolve to a metadata stream.
    MetadataStream,
    /// Trailer `ID` missing or not two 16-byte strings.
    DocumentId,
    /// An encryption dictionary is present.
    Encryption,
    /// A JavaScript action or name tree is present.
    JavaScript,
    /// A `Launch` action is present.
    LaunchAction,
    /// The document references external content.
    ExternalReference,
    /// A transparency group without `CS`.
    TransparencyGroup,
    /// The attachment's `AFRelationship` is not `Alternative`.
    AfRelationship,
    /// The attachment is missing from `Names/EmbeddedFiles` or `AF`.
    EmbeddedFileRegistration,
}

impl Rule {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OutputIntent => "output-intent",
            Self::FontNotEmbedded => "font-not-embedded",
            Self::MetadataStream => "metadata-stream",
            Self::DocumentId => "document-id",
            Self::Encryption => "encryption",
            Self::JavaScript => "javascript",
            Self::LaunchAction => "launch-action",
            Self::ExternalReference => "external-reference",
            Self::TransparencyGroup => "transparency-group",
            Self::AfRelationship => "af-relationship",
            Self::EmbeddedFileRegistration => "embedded-file-registration",
        }
    }
}

impl std::fmt::Display for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes() {
        assert_eq!(HybridError::InvalidInput("x".into()).exit_code(), 2);
        assert_eq!(HybridError::UnsupportedOption("x".into()).exit_code(), 2);
        assert_eq!(
            HybridError::violation(Rule::Encryption, "x").exit_code(),
            3
        );
        assert_eq!(
            HybridError::UnresolvedReference { object: 4 }.exit_code(),
            3
        );
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk");
        assert_eq!(HybridError::from(io).exit_code(), 4);
    }

    #[test]
    fn violation_message_names_rule() {
        let err = HybridError::violation(Rule::FontNotEmbedded, "F1 has no FontFile2");
        assert_eq!(
            err.to_string(),
            "invariant violation (font-not-embedded): F1 has no FontFile2"
        );
        assert_eq!(err.rule(), Some(Rule::FontNotEmbedded));
    }
}
