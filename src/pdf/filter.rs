use std::borrow::Cow;
use std::io::{Read, Write};

use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;

use super::object::{Object, Stream};
use crate::core::HybridError;

/// Zlib/deflate the payload and mark the stream `/Filter /FlateDecode`.
pub fn flate_stream(mut stream: Stream) -> Result<Stream, HybridError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&stream.content)?;
    stream.content = encoder.finish()?;
    stream.dict.set("Filter", "FlateDecode");
    Ok(stream)
}

/// The stream payload with its filter undone. Only `/FlateDecode` is
/// understood; content written by this crate uses nothing else.
pub fn decoded_content(stream: &Stream) -> Result<Cow<'_, [u8]>, HybridError> {
    let filter = match stream.dict.get("Filter") {
        None => return Ok(Cow::Borrowed(&stream.content)),
        Some(Object::Array(filters)) if filters.is_empty() => {
            return Ok(Cow::Borrowed(&stream.content));
        }
        Some(Object::Array(filters)) if filters.len() == 1 => filters[0].as_name(),
        Some(other) => other.as_name(),
    };
    match filter {
        Some("FlateDecode") => {
            let mut out = Vec::new();
            ZlibDecoder::new(&stream.content[..]).read_to_end(&mut out)?;
            Ok(Cow::Owned(out))
        }
        other => Err(HybridError::UnsupportedOption(format!(
            "cannot decode stream filter {}",
            other.unwrap_or("chain")
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::Dictionary;

    #[test]
    fn compresses_and_marks_filter() {
        let raw = b"BT /F1 12 Tf 72 720 Td (Rechnung) Tj ET\n".repeat(20);
        let s = flate_stream(Stream::new(Dictionary::new(), raw.clone())).unwrap();
        assert_eq!(s.dict.get_name("Filter"), Some("FlateDecode"));
        assert!(s.content.len() < raw.len());

        let mut back = Vec::new();
        ZlibDecoder::new(&s.content[..]).read_to_end(&mut back).unwrap();
        assert_eq!(back, raw);
    }

    #[test]
    fn decodes_plain_and_flate_content() {
        let raw = b"BT /F1 12 Tf ET".to_vec();
        let plain = Stream::new(Dictionary::new(), raw.clone());
        assert!(matches!(decoded_content(&plain).unwrap(), Cow::Borrowed(_)));

        let packed = flate_stream(plain.clone()).unwrap();
        assert_eq!(decoded_content(&packed).unwrap().as_ref(), &raw[..]);

        let mut lzw = plain;
        lzw.dict.set("Filter", "LZWDecode");
        assert!(matches!(
            decoded_content(&lzw),
            Err(HybridError::UnsupportedOption(_))
        ));
    }
}
