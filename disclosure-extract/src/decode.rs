//! Byte → text decoding for fetched documents.
//!
//! The charset is taken, in order, from a byte order mark, the `charset`
//! parameter of the served `Content-Type`, and a `<meta charset>` declaration
//! near the top of the document. Undeclared documents must be UTF-8.
//! Decoding never substitutes replacement characters: bytes the chosen
//! encoding cannot map are a parse error.

use std::borrow::Cow;
use std::sync::LazyLock;

use disclosure_common::{LookupError, Result};
use encoding_rs::Encoding;
use regex::Regex;

/// How far into the document a `<meta>` charset declaration is looked for.
const META_SNIFF_BYTES: usize = 1024;

static META_CHARSET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta[^>]*?charset\s*=\s*["']?\s*([a-z0-9_:.\-]+)"#)
        .expect("invalid regex: meta charset")
});

/// Decode `bytes` using the best available charset declaration.
pub fn decode_document<'a>(bytes: &'a [u8], content_type: Option<&str>) -> Result<Cow<'a, str>> {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        return decode_with(encoding, &bytes[bom_len..], "byte order mark");
    }
    if let Some(encoding) = content_type.and_then(header_charset) {
        return decode_with(encoding, bytes, "content-type");
    }
    if let Some(encoding) = meta_charset(bytes) {
        return decode_with(encoding, bytes, "meta");
    }

    std::str::from_utf8(bytes).map(Cow::Borrowed).map_err(|e| {
        LookupError::Parse(format!(
            "document is not valid UTF-8 (at byte {}) and declares no charset",
            e.valid_up_to()
        ))
    })
}

fn decode_with<'a>(encoding: &'static Encoding, bytes: &'a [u8], source: &str) -> Result<Cow<'a, str>> {
    tracing::trace!(encoding = encoding.name(), source, "extract.charset");
    encoding
        .decode_without_bom_handling_and_without_replacement(bytes)
        .ok_or_else(|| {
            LookupError::Parse(format!(
                "document is not valid {} (declared by {source})",
                encoding.name()
            ))
        })
}

/// `charset` parameter of a `Content-Type` value, when it names a known encoding.
fn header_charset(content_type: &str) -> Option<&'static Encoding> {
    content_type
        .split(';')
        .skip(1)
        .filter_map(|param| param.split_once('='))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("charset"))
        .and_then(|(_, value)| known_label(value.trim().trim_matches(|c| c == '"' || c == '\'')))
}

fn meta_charset(bytes: &[u8]) -> Option<&'static Encoding> {
    let head = String::from_utf8_lossy(&bytes[..bytes.len().min(META_SNIFF_BYTES)]);
    let label = META_CHARSET.captures(&head)?.get(1)?.as_str().to_string();
    known_label(&label)
}

fn known_label(label: &str) -> Option<&'static Encoding> {
    let encoding = Encoding::for_label(label.as_bytes());
    if encoding.is_none() {
        tracing::debug!(label, "extract.charset_unknown");
    }
    // A UTF-16 label in an ASCII-readable declaration means UTF-8.
    encoding.map(Encoding::output_encoding)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undeclared_utf8_passes_through_borrowed() {
        let text = decode_document("<p>Rs 5</p>".as_bytes(), None).unwrap();
        assert!(matches!(text, Cow::Borrowed("<p>Rs 5</p>")));
    }

    #[test]
    fn served_latin1_is_decoded() {
        let text = decode_document(b"<td>Rs\xa05,00,000</td>", Some("text/html; charset=ISO-8859-1")).unwrap();
        assert_eq!(text, "<td>Rs\u{a0}5,00,000</td>");
    }

    #[test]
    fn quoted_header_charset_is_understood() {
        let text = decode_document(b"caf\xe9", Some(r#"text/html;charset="windows-1252""#)).unwrap();
        assert_eq!(text, "café");
    }

    #[test]
    fn meta_declaration_is_used_when_the_header_is_silent() {
        let html = b"<html><head><meta http-equiv=\"Content-Type\" content=\"text/html; charset=iso-8859-1\"></head><body>caf\xe9</body></html>";
        let text = decode_document(html, Some("text/html")).unwrap();
        assert!(text.contains("café"));
    }

    #[test]
    fn header_wins_over_meta() {
        let html = "<meta charset=\"iso-8859-1\"><p>café</p>".as_bytes();
        let text = decode_document(html, Some("text/html; charset=utf-8")).unwrap();
        assert!(text.contains("café"));
    }

    #[test]
    fn bom_wins_over_everything() {
        let mut bytes = vec![0xef, 0xbb, 0xbf];
        bytes.extend_from_slice("<p>é</p>".as_bytes());
        let text = decode_document(&bytes, Some("text/html; charset=windows-1252")).unwrap();
        assert_eq!(text, "<p>é</p>");
    }

    #[test]
    fn unknown_charset_falls_back_to_utf8() {
        let text = decode_document(b"<p>ok</p>", Some("text/html; charset=x-made-up")).unwrap();
        assert_eq!(text, "<p>ok</p>");
    }

    #[test]
    fn undeclared_non_utf8_is_a_parse_error() {
        let err = decode_document(b"<td>Rs\xa05</td>", None).unwrap_err();
        assert_eq!(err.kind(), "parse_error");
    }

    #[test]
    fn declared_utf8_with_bad_bytes_is_a_parse_error() {
        let err = decode_document(b"<p>\xff\xfe</p>", Some("text/html; charset=utf-8")).unwrap_err();
        assert_eq!(err.kind(), "parse_error");
        assert!(err.to_string().contains("UTF-8"));
    }
}
