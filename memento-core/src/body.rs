//! Body serialization variants.
//!
//! A cached body is persisted in one of three explicit formats, selected
//! from the captured `Content-Type`:
//!
//! - [`Annotated`](BodyFormat::Annotated) for HTML: the metadata record is
//!   embedded as a leading comment block, so a cached page is
//!   self-describing when opened directly from the cache directory.
//! - [`Text`](BodyFormat::Text): the body is coerced to plain UTF-8 text.
//! - [`Raw`](BodyFormat::Raw): bytes are written unmodified.
//!
//! The annotation is part of the stored blob, and a cache hit serves the
//! stored blob verbatim.

use crate::entry::CacheMeta;

const ANNOTATION_OPEN: &[u8] = b"<!--\n";
const ANNOTATION_CLOSE: &[u8] = b"\n-->\n";

/// How a body is serialized into the cache.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BodyFormat {
    /// HTML: prepend the metadata record as a comment block.
    Annotated,
    /// Other text: coerce to a plain UTF-8 string.
    Text,
    /// Everything else: raw bytes, unmodified.
    Raw,
}

impl BodyFormat {
    /// Selects the format for a captured `Content-Type` value.
    pub fn for_content_type(content_type: Option<&str>) -> Self {
        let Some(content_type) = content_type else {
            return BodyFormat::Raw;
        };
        let content_type = content_type.to_ascii_lowercase();
        if content_type.contains("html") {
            BodyFormat::Annotated
        } else if content_type.contains("text") {
            BodyFormat::Text
        } else {
            BodyFormat::Raw
        }
    }

    /// Encodes a body for storage.
    pub fn encode(&self, meta: &CacheMeta, body: &[u8]) -> Result<Vec<u8>, serde_json::Error> {
        match self {
            BodyFormat::Annotated => {
                let record = meta.to_pretty_json()?;
                let mut encoded =
                    Vec::with_capacity(ANNOTATION_OPEN.len() + record.len() + ANNOTATION_CLOSE.len() + body.len());
                encoded.extend_from_slice(ANNOTATION_OPEN);
                encoded.extend_from_slice(record.as_bytes());
                encoded.extend_from_slice(ANNOTATION_CLOSE);
                encoded.extend_from_slice(body);
                Ok(encoded)
            }
            BodyFormat::Text => Ok(String::from_utf8_lossy(body).into_owned().into_bytes()),
            BodyFormat::Raw => Ok(body.to_vec()),
        }
    }
}

/// Splits an annotated blob back into its metadata record and body.
///
/// Returns `None` when the blob does not start with a parseable
/// annotation comment.
pub fn parse_annotated(stored: &[u8]) -> Option<(CacheMeta, &[u8])> {
    let rest = stored.strip_prefix(ANNOTATION_OPEN)?;
    let close = rest
        .windows(ANNOTATION_CLOSE.len())
        .position(|window| window == ANNOTATION_CLOSE)?;
    let meta = serde_json::from_slice(&rest[..close]).ok()?;
    Some((meta, &rest[close + ANNOTATION_CLOSE.len()..]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{HeaderRecord, HeaderValues};
    use crate::key::CacheKey;

    fn html_meta() -> CacheMeta {
        let mut headers = HeaderRecord::new();
        headers.insert(
            "Content-Type".into(),
            HeaderValues::One("text/html; charset=utf-8".into()),
        );
        CacheMeta::new(CacheKey::new("abc"), "http://example.com", 200, headers)
    }

    #[test]
    fn selects_annotated_for_html() {
        assert_eq!(
            BodyFormat::for_content_type(Some("text/html; charset=utf-8")),
            BodyFormat::Annotated
        );
        assert_eq!(
            BodyFormat::for_content_type(Some("application/xhtml+xml; profile=html")),
            BodyFormat::Annotated
        );
    }

    #[test]
    fn selects_text_for_other_text_types() {
        assert_eq!(
            BodyFormat::for_content_type(Some("text/plain")),
            BodyFormat::Text
        );
    }

    #[test]
    fn selects_raw_otherwise() {
        assert_eq!(
            BodyFormat::for_content_type(Some("application/octet-stream")),
            BodyFormat::Raw
        );
        assert_eq!(BodyFormat::for_content_type(None), BodyFormat::Raw);
    }

    #[test]
    fn annotation_round_trips() {
        let meta = html_meta();
        let encoded = BodyFormat::Annotated
            .encode(&meta, b"<html>hello</html>")
            .unwrap();
        assert!(encoded.starts_with(b"<!--\n"));

        let (parsed, body) = parse_annotated(&encoded).unwrap();
        assert_eq!(parsed, meta);
        assert_eq!(body, b"<html>hello</html>");
    }

    #[test]
    fn raw_is_byte_identical() {
        let meta = html_meta();
        let payload = [0u8, 159, 146, 150];
        let encoded = BodyFormat::Raw.encode(&meta, &payload).unwrap();
        assert_eq!(encoded, payload);
    }

    #[test]
    fn text_coerces_invalid_utf8() {
        let meta = html_meta();
        let encoded = BodyFormat::Text.encode(&meta, b"ok\xff").unwrap();
        assert_eq!(encoded, "ok\u{fffd}".as_bytes());
    }

    #[test]
    fn parse_rejects_unannotated_blobs() {
        assert!(parse_annotated(b"<html>plain</html>").is_none());
        assert!(parse_annotated(b"<!--\nnot json\n-->\nbody").is_none());
    }
}
