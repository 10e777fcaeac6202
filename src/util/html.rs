//! Text cleaning helpers shared by the extractor and the news pipeline.

use encoding_rs::{Encoding, UTF_8};
use scraper::Html;

/// Collapse every whitespace run to a single space and trim both ends.
pub fn normalize_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Decode a fetched page into text.
///
/// Order of precedence: charset parameter of the `Content-Type` header, byte order
/// mark or `<meta charset>` found by the detector, then statistical detection.
/// Undecodable sequences become U+FFFD.
pub fn decode_html(body: &[u8], content_type: Option<&str>) -> String {
    let encoding = content_type
        .and_then(charset_from_content_type)
        .or_else(|| Encoding::for_bom(body).map(|(encoding, _)| encoding))
        .or_else(|| charset_from_meta(body))
        .unwrap_or_else(|| {
            let mut detector = chardetng::EncodingDetector::new();
            detector.feed(body, true);
            detector.guess(None, true)
        });

    let (text, _, had_errors) = encoding.decode(body);
    if had_errors {
        tracing::debug!(encoding = encoding.name(), "page contained undecodable bytes");
    }
    text.into_owned()
}

fn charset_from_content_type(content_type: &str) -> Option<&'static Encoding> {
    content_type.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        if !key.trim().eq_ignore_ascii_case("charset") {
            return None;
        }
        Encoding::for_label(value.trim().trim_matches('"').as_bytes())
    })
}

// Looks only at the head of the document; charset declarations must appear early.
fn charset_from_meta(body: &[u8]) -> Option<&'static Encoding> {
    let head = &body[..body.len().min(2048)];
    let ascii = String::from_utf8_lossy(head).to_ascii_lowercase();
    let start = ascii.find("charset=")? + "charset=".len();
    let label: String = ascii[start..]
        .trim_start_matches(['"', '\''])
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':' | '.'))
        .collect();
    if label.is_empty() {
        return None;
    }
    Encoding::for_label(label.as_bytes()).map(|encoding| {
        // A page that says utf-16 in ASCII cannot really be utf-16.
        if encoding.name().starts_with("UTF-16") {
            UTF_8
        } else {
            encoding
        }
    })
}

/// Plain text of a provider-supplied field that may carry inline markup.
///
/// NewsAPI truncates `content` and appends a marker such as `[+2310 chars]`; the
/// marker is dropped.
pub fn provider_text(raw: &str) -> String {
    let fragment = Html::parse_fragment(raw);
    let text = fragment.root_element().text().collect::<Vec<_>>().join(" ");
    let normalized = normalize_whitespace(&text);
    strip_truncation_marker(&normalized).to_string()
}

fn strip_truncation_marker(text: &str) -> &str {
    let Some(open) = text.rfind("[+") else {
        return text;
    };
    let tail = &text[open + 2..];
    let is_marker = tail
        .strip_suffix(" chars]")
        .map_or(false, |digits| !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()));
    if is_marker {
        text[..open].trim_end()
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_inner_and_outer_whitespace() {
        assert_eq!(normalize_whitespace("  a \n\t b   c  "), "a b c");
        assert_eq!(normalize_whitespace("   "), "");
    }

    #[test]
    fn header_charset_wins() {
        let body = b"caf\xe9";
        let text = decode_html(body, Some("text/html; charset=windows-1252"));
        assert_eq!(text, "café");
    }

    #[test]
    fn meta_charset_is_used_without_header() {
        let mut body = b"<html><head><meta charset=\"iso-8859-1\"></head><body>".to_vec();
        body.extend_from_slice(b"na\xefve</body></html>");
        let text = decode_html(&body, Some("text/html"));
        assert!(text.contains("naïve"));
    }

    #[test]
    fn utf8_pages_decode_untouched() {
        let text = decode_html("<p>Zürich</p>".as_bytes(), None);
        assert_eq!(text, "<p>Zürich</p>");
    }

    #[test]
    fn provider_text_drops_markup_and_marker() {
        let raw = "<ul><li>Markets rallied</li></ul> on Friday as investors… [+2310 chars]";
        assert_eq!(provider_text(raw), "Markets rallied on Friday as investors…");
    }

    #[test]
    fn provider_text_keeps_bracketed_prose() {
        assert_eq!(provider_text("Scores [+3 points] today"), "Scores [+3 points] today");
    }
}
