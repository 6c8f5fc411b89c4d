//! Cache entry model.
//!
//! [`CacheMeta`] is the metadata record persisted next to a cached body:
//! `{ key, url, status, headers }`, serialized as pretty-printed JSON so a
//! stored record is readable when opened directly. [`CacheEntry`] pairs the
//! record with the raw body bytes.
//!
//! Headers are captured verbatim from the origin response. A single-valued
//! header serializes as a bare JSON string and a multi-valued header (e.g.
//! `Set-Cookie`) as an array of strings.

use std::collections::BTreeMap;

use bytes::Bytes;
use http::header::{HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};

use crate::key::CacheKey;

/// Captured header values for one header name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HeaderValues {
    /// A header that appeared once.
    One(String),
    /// A header that appeared multiple times.
    Many(Vec<String>),
}

impl HeaderValues {
    /// Iterates over the individual values.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        match self {
            HeaderValues::One(value) => std::slice::from_ref(value).iter().map(String::as_str),
            HeaderValues::Many(values) => values.as_slice().iter().map(String::as_str),
        }
    }

    /// Returns the first value.
    pub fn first(&self) -> Option<&str> {
        self.iter().next()
    }
}

/// Captured origin headers, keyed by header name.
pub type HeaderRecord = BTreeMap<String, HeaderValues>;

fn default_status() -> u16 {
    200
}

/// The metadata record persisted for a cached response.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CacheMeta {
    /// The cache key the entry is stored under.
    pub key: CacheKey,
    /// The target URL the response was captured for.
    pub url: String,
    /// The origin status code. Defaults to 200 when absent from a stored
    /// record.
    #[serde(default = "default_status")]
    pub status: u16,
    /// Origin response headers, captured verbatim.
    #[serde(default)]
    pub headers: HeaderRecord,
}

impl CacheMeta {
    /// Creates a metadata record from already-captured headers.
    pub fn new(key: CacheKey, url: impl Into<String>, status: u16, headers: HeaderRecord) -> Self {
        CacheMeta {
            key,
            url: url.into(),
            status,
            headers,
        }
    }

    /// Creates a metadata record by capturing an origin response's headers.
    pub fn from_origin(
        key: CacheKey,
        url: impl Into<String>,
        status: u16,
        headers: &HeaderMap,
    ) -> Self {
        CacheMeta::new(key, url, status, capture_headers(headers))
    }

    /// Looks up the captured `Content-Type` value, if any.
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case("content-type"))
            .and_then(|(_, values)| values.first())
    }

    /// Rebuilds an [`HeaderMap`] from the captured record.
    ///
    /// Names or values that are not valid HTTP are skipped; a corrupted
    /// record degrades to fewer headers rather than an error.
    pub fn header_map(&self) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, values) in &self.headers {
            let Ok(name) = HeaderName::from_bytes(name.as_bytes()) else {
                continue;
            };
            for value in values.iter() {
                if let Ok(value) = HeaderValue::from_str(value) {
                    map.append(name.clone(), value);
                }
            }
        }
        map
    }

    /// Serializes the record as pretty-printed JSON with 4-space indents,
    /// the on-disk format of the `meta` file.
    pub fn to_pretty_json(&self) -> Result<String, serde_json::Error> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut serializer)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

/// Captures an [`HeaderMap`] into the persistable record form.
///
/// Non-UTF-8 header bytes are replaced lossily; the record is a debugging
/// artifact as much as a replay source.
pub fn capture_headers(headers: &HeaderMap) -> HeaderRecord {
    let mut record = HeaderRecord::new();
    for name in headers.keys() {
        let mut values: Vec<String> = headers
            .get_all(name)
            .iter()
            .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
            .collect();
        let captured = if values.len() == 1 {
            HeaderValues::One(values.remove(0))
        } else {
            HeaderValues::Many(values)
        };
        record.insert(name.as_str().to_owned(), captured);
    }
    record
}

/// A cache entry: the metadata record plus the raw body payload.
#[derive(Clone, Debug, PartialEq)]
pub struct CacheEntry {
    /// The metadata record.
    pub meta: CacheMeta,
    /// The raw response body. May be empty.
    pub body: Bytes,
}

impl CacheEntry {
    /// Creates an entry from a record and body.
    pub fn new(meta: CacheMeta, body: impl Into<Bytes>) -> Self {
        CacheEntry {
            meta,
            body: body.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta_with(headers: HeaderRecord) -> CacheMeta {
        CacheMeta::new(CacheKey::new("abc"), "http://example.com", 200, headers)
    }

    #[test]
    fn single_header_serializes_as_string() {
        let mut headers = HeaderRecord::new();
        headers.insert(
            "Content-Type".into(),
            HeaderValues::One("text/plain".into()),
        );
        let json = serde_json::to_value(meta_with(headers)).unwrap();
        assert_eq!(json["headers"]["Content-Type"], "text/plain");
    }

    #[test]
    fn multi_header_serializes_as_array() {
        let mut headers = HeaderRecord::new();
        headers.insert(
            "set-cookie".into(),
            HeaderValues::Many(vec!["a=1".into(), "b=2".into()]),
        );
        let json = serde_json::to_value(meta_with(headers)).unwrap();
        assert_eq!(json["headers"]["set-cookie"][1], "b=2");
    }

    #[test]
    fn status_defaults_to_200() {
        let meta: CacheMeta =
            serde_json::from_str(r#"{"key": "abc", "url": "http://example.com"}"#).unwrap();
        assert_eq!(meta.status, 200);
        assert!(meta.headers.is_empty());
    }

    #[test]
    fn content_type_lookup_is_case_insensitive() {
        let mut headers = HeaderRecord::new();
        headers.insert("Content-Type".into(), HeaderValues::One("text/html".into()));
        assert_eq!(meta_with(headers).content_type(), Some("text/html"));
    }

    #[test]
    fn header_map_round_trip() {
        let mut origin = HeaderMap::new();
        origin.insert("content-type", HeaderValue::from_static("text/plain"));
        origin.append("set-cookie", HeaderValue::from_static("a=1"));
        origin.append("set-cookie", HeaderValue::from_static("b=2"));

        let meta = CacheMeta::from_origin(
            CacheKey::new("abc"),
            "http://example.com",
            200,
            &origin,
        );
        let rebuilt = meta.header_map();
        assert_eq!(rebuilt.get("content-type").unwrap(), "text/plain");
        assert_eq!(rebuilt.get_all("set-cookie").iter().count(), 2);
    }

    #[test]
    fn header_map_skips_invalid_values() {
        let mut headers = HeaderRecord::new();
        headers.insert("x-bad".into(), HeaderValues::One("line\nbreak".into()));
        headers.insert("x-good".into(), HeaderValues::One("fine".into()));
        let rebuilt = meta_with(headers).header_map();
        assert!(rebuilt.get("x-bad").is_none());
        assert_eq!(rebuilt.get("x-good").unwrap(), "fine");
    }

    #[test]
    fn pretty_json_uses_four_space_indent() {
        let meta = meta_with(HeaderRecord::new());
        let json = meta.to_pretty_json().unwrap();
        assert!(json.contains("\n    \"key\""));
        let parsed: CacheMeta = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, meta);
    }
}
