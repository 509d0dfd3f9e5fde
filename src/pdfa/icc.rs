use std::sync::LazyLock;

use crate::core::HybridError;

const SRGB_DESCRIPTION: &str = "sRGB IEC61966-2.1";
const SRGB_COPYRIGHT: &str = "No copyright, use freely";

/// D50 illuminant, the PCS white point.
const D50: [f64; 3] = [0.9642, 1.0, 0.8249];
/// D65, the sRGB media white point.
const D65: [f64; 3] = [0.9505, 1.0, 1.0890];
/// sRGB primaries, Bradford-adapted to D50.
const SRGB_RED: [f64; 3] = [0.4361, 0.2225, 0.0139];
const SRGB_GREEN: [f64; 3] = [0.3851, 0.7169, 0.0971];
const SRGB_BLUE: [f64; 3] = [0.1431, 0.0606, 0.7141];
/// Samples of the tone curve table.
const TRC_ENTRIES: usize = 1024;

static SRGB: LazyLock<IccProfile> = LazyLock::new(|| IccProfile {
    bytes: build_srgb_profile(),
    components: 3,
    identifier: SRGB_DESCRIPTION.to_string(),
});

/// An ICC profile used as the PDF/A output intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IccProfile {
    bytes: Vec<u8>,
    components: u8,
    identifier: String,
}

impl IccProfile {
    /// The built-in sRGB IEC61966-2.1 display profile.
    pub fn srgb() -> &'static IccProfile {
        &SRGB
    }

    /// Accept a caller-supplied profile after checking its header.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, HybridError> {
        if bytes.len() < 132 || &bytes[36..40] != b"acsp" {
            return Err(HybridError::UnsupportedOption(
                "ICC profile lacks the 'acsp' header signature".into(),
            ));
        }
        let declared = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize;
        if declared > bytes.len() {
            return Err(HybridError::UnsupportedOption(format!(
                "ICC profile declares {declared} bytes but only {} were given",
                bytes.len()
            )));
        }
        let components = match &bytes[16..20] {
            b"RGB " => 3,
            b"GRAY" => 1,
            b"CMYK" => 4,
            other => {
                return Err(HybridError::UnsupportedOption(format!(
                    "ICC colour space {:?} cannot serve as an output intent",
                    String::from_utf8_lossy(other)
                )));
            }
        };
        Ok(Self {
            bytes,
            components,
            identifier: "Custom".to_string(),
        })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Colour components, written as the ICC stream's `/N`.
    pub fn components(&self) -> u8 {
        self.components
    }

    /// `OutputConditionIdentifier` of the output intent.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Device colour space matching the profile's component count.
    pub fn alternate(&self) -> &'static str {
        match self.components {
            1 => "DeviceGray",
            4 => "DeviceCMYK",
            _ => "DeviceRGB",
        }
    }
}

fn s15_fixed16(v: f64) -> [u8; 4] {
    ((v * 65536.0).round() as i32).to_be_bytes()
}

fn xyz_tag(xyz: [f64; 3]) -> Vec<u8> {
    let mut tag = b"XYZ \0\0\0\0".to_vec();
    for v in xyz {
        tag.extend_from_slice(&s15_fixed16(v));
    }
    tag
}

fn text_description_tag(text: &str) -> Vec<u8> {
    let mut tag = b"desc\0\0\0\0".to_vec();
    tag.extend_from_slice(&(text.len() as u32 + 1).to_be_bytes());
    tag.extend_from_slice(text.as_bytes());
    tag.push(0);
    // Unicode language + count, ScriptCode code + count, 67-byte ScriptCode buffer.
    tag.extend_from_slice(&[0; 4 + 4 + 2 + 1 + 67]);
    tag
}

fn text_tag(text: &str) -> Vec<u8> {
    let mut tag = b"text\0\0\0\0".to_vec();
    tag.extend_from_slice(text.as_bytes());
    tag.push(0);
    tag
}

/// sRGB decoding: encoded value in 0..=1 to linear light.
fn srgb_to_linear(v: f64) -> f64 {
    if v <= 0.04045 {
        v / 12.92
    } else {
        ((v + 0.055) / 1.055).powf(2.4)
    }
}

/// The IEC 61966-2.1 transfer function as a sampled `curv` table.
fn srgb_curve_tag() -> Vec<u8> {
    let mut tag = b"curv\0\0\0\0".to_vec();
    tag.extend_from_slice(&(TRC_ENTRIES as u32).to_be_bytes());
    let last = (TRC_ENTRIES - 1) as f64;
    for i in 0..TRC_ENTRIES {
        let linear = srgb_to_linear(i as f64 / last);
        tag.extend_from_slice(&((linear * 65535.0).round() as u16).to_be_bytes());
    }
    tag
}

/// A compact ICC v2.1 monitor profile for sRGB (matrix/TRC form).
///
/// The three tone curves share one tag body.
fn build_srgb_profile() -> Vec<u8> {
    let trc = srgb_curve_tag();
    let tags: [(&[u8; 4], Vec<u8>); 9] = [
        (b"desc", text_description_tag(SRGB_DESCRIPTION)),
        (b"cprt", text_tag(SRGB_COPYRIGHT)),
        (b"wtpt", xyz_tag(D65)),
        (b"rXYZ", xyz_tag(SRGB_RED)),
        (b"gXYZ", xyz_tag(SRGB_GREEN)),
        (b"bXYZ", xyz_tag(SRGB_BLUE)),
        (b"rTRC", trc.clone()),
        (b"gTRC", trc.clone()),
        (b"bTRC", trc),
    ];

    let mut table = Vec::new();
    let mut data = Vec::new();
    let mut written: Vec<(usize, &[u8])> = Vec::new();
    let data_start = 128 + 4 + tags.len() * 12;
    for (sig, body) in &tags {
        let offset = match written.iter().find(|(_, b)| *b == body.as_slice()) {
            Some((offset, _)) => *offset,
            None => {
                let offset = data_start + data.len();
                written.push((offset, body.as_slice()));
                data.extend_from_slice(body);
                while data.len() % 4 != 0 {
                    data.push(0);
                }
                offset
            }
        };
        table.extend_from_slice(*sig);
        table.extend_from_slice(&(offset as u32).to_be_bytes());
        table.extend_from_slice(&(body.len() as u32).to_be_bytes());
    }

    let size = data_start + data.len();
    let mut header = Vec::with_capacity(128);
    header.extend_from_slice(&(size as u32).to_be_bytes());
    header.extend_from_slice(&[0; 4]); // preferred CMM
    header.extend_from_slice(&[0x02, 0x10, 0x00, 0x00]); // version 2.1.0
    header.extend_from_slice(b"mntr");
    header.extend_from_slice(b"RGB ");
    header.extend_from_slice(b"XYZ ");
    for part in [2024u16, 1, 1, 0, 0, 0] {
        header.extend_from_slice(&part.to_be_bytes());
    }
    header.extend_from_slice(b"acsp");
    header.extend_from_slice(&[0; 4 + 4 + 4 + 4 + 8]); // platform, flags, manufacturer, model, attributes
    header.extend_from_slice(&0u32.to_be_bytes()); // perceptual intent
    for v in D50 {
        header.extend_from_slice(&s15_fixed16(v));
    }
    header.extend_from_slice(&[0; 4]); // creator
    header.resize(128, 0);

    let mut profile = header;
    profile.extend_from_slice(&(tags.len() as u32).to_be_bytes());
    profile.extend_from_slice(&table);
    profile.extend_from_slice(&data);
    profile
}
