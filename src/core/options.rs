use std::sync::Arc;

use super::clock::{Clock, SystemClock};
use super::error::HybridError;
use crate::pdfa::IccProfile;
use crate::zugferd::{AttachmentName, ZugferdProfile};

/// Producer written to the Info dictionary and `pdf:Producer`.
pub const DEFAULT_PRODUCER: &str = "hybridbeleg PDF/A-3 Generator";
/// Creator tool written to Info `Creator` and `xmp:CreatorTool`.
pub const DEFAULT_CREATOR: &str = "hybridbeleg";

/// Settings for one [`assemble`](crate::assemble::assemble) call.
#[derive(Debug, Clone)]
pub struct AssembleOptions {
    pub(crate) document_id: Option<[u8; 16]>,
    pub(crate) producer: String,
    pub(crate) creator: String,
    pub(crate) author: Option<String>,
    pub(crate) icc_profile: Option<IccProfile>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) attachment_name: AttachmentName,
    pub(crate) profile: ZugferdProfile,
    pub(crate) compress_content: bool,
}

impl Default for AssembleOptions {
    fn default() -> Self {
        Self {
            document_id: None,
            producer: DEFAULT_PRODUCER.to_string(),
            creator: DEFAULT_CREATOR.to_string(),
            author: None,
            icc_profile: None,
            clock: Arc::new(SystemClock),
            attachment_name: AttachmentName::Zugferd,
            profile: ZugferdProfile::EN16931,
            compress_content: true,
        }
    }
}

impl AssembleOptions {
    pub fn builder() -> AssembleOptionsBuilder {
        AssembleOptionsBuilder::new()
    }

    /// Seed for the stable half of the trailer `ID`, if one was supplied.
    pub fn document_id(&self) -> Option<[u8; 16]> {
        self.document_id
    }

    pub fn producer(&self) -> &str {
        &self.producer
    }

    pub fn creator(&self) -> &str {
        &self.creator
    }

    /// `dc:creator` / Info `Author`; falls back to the creator tool.
    pub fn author(&self) -> &str {
        self.author.as_deref().unwrap_or(&self.creator)
    }

    pub fn icc_profile(&self) -> Option<&IccProfile> {
        self.icc_profile.as_ref()
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub fn attachment_name(&self) -> AttachmentName {
        self.attachment_name
    }

    pub fn profile(&self) -> ZugferdProfile {
        self.profile
    }

    pub fn compress_content(&self) -> bool {
        self.compress_content
    }
}

/// Builder for [`AssembleOptions`].
///
/// ```
/// use hybridbeleg::core::*;
/// use hybridbeleg::zugferd::AttachmentName;
///
/// let options = AssembleOptions::builder()
///     .producer("ACME Faktura")
///     .attachment_name(AttachmentName::FacturX)
///     .clock(FixedClock::parse("2024-03-15T10:00:00+01:00").unwrap())
///     .build()
///     .unwrap();
/// assert_eq!(options.producer(), "ACME Faktura");
/// ```
#[derive(Debug)]
pub struct AssembleOptionsBuilder {
    options: AssembleOptions,
    icc_bytes: Option<Vec<u8>>,
}

impl AssembleOptionsBuilder {
    pub fn new() -> Self {
        Self {
            options: AssembleOptions::default(),
            icc_bytes: None,
        }
    }

    pub fn document_id(mut self, seed: [u8; 16]) -> Self {
        self.options.document_id = Some(seed);
        self
    }

    pub fn producer(mut self, producer: impl Into<String>) -> Self {
        self.options.producer = producer.into();
        self
    }

    pub fn creator(mut self, creator: impl Into<String>) -> Self {
        self.options.creator = creator.into();
        self
    }

    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.options.author = Some(author.into());
        self
    }

    /// Replace the built-in sRGB output profile.
    pub fn icc_profile(mut self, bytes: Vec<u8>) -> Self {
        self.icc_bytes = Some(bytes);
        self
    }

    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.options.clock = Arc::new(clock);
        self
    }

    pub fn shared_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.options.clock = clock;
        self
    }

    pub fn attachment_name(mut self, name: AttachmentName) -> Self {
        self.options.attachment_name = name;
        self
    }

    pub fn profile(mut self, profile: ZugferdProfile) -> Self {
        self.options.profile = profile;
        self
    }

    /// Flate-compress page content and font programs (default: on).
    pub fn compress_content(mut self, on: bool) -> Self {
        self.options.compress_content = on;
        self
    }

    pub fn build(self) -> Result<AssembleOptions, HybridError> {
        let mut options = self.options;
        if options.producer.trim().is_empty() {
            return Err(HybridError::UnsupportedOption(
                "producer must not be empty".into(),
            ));
        }
        if options.creator.trim().is_empty() {
            return Err(HybridError::UnsupportedOption(
                "creator must not be empty".into(),
            ));
        }
        if let Some(bytes) = self.icc_bytes {
            options.icc_profile = Some(IccProfile::from_bytes(bytes)?);
        }
        Ok(options)
    }
}

impl Default for AssembleOptionsBuilder {
    fn default() -> Self {
        Self::new()
    }
}
