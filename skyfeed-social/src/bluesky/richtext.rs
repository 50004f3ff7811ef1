//! Facet-aware rendering of post text into inline HTML.
//!
//! Facets address the text in UTF-8 bytes; everything here works on
//! character positions, so offsets go through [`byte_to_char_index`] first.
use crate::bluesky::types::{Facet, FacetFeature};
use html_escape::encode_quoted_attribute;

pub const PROFILE_BASE: &str = "https://bsky.app/profile";

/// A resolved hyperlink over the half-open character range `start..end`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkSpan {
    pub start: usize,
    pub end: usize,
    pub target: String,
}

/// Number of characters in the UTF-8 prefix of `text` ending at `byte_index`.
///
/// A cut that lands inside a multi-byte character drops that character;
/// indices past the end clamp to the text length.
pub fn byte_to_char_index(text: &str, byte_index: i64) -> usize {
    if byte_index <= 0 {
        return 0;
    }
    let bytes = text.as_bytes();
    let cut = usize::try_from(byte_index).unwrap_or(usize::MAX).min(bytes.len());
    let prefix = &bytes[..cut];
    let valid = match std::str::from_utf8(prefix) {
        Ok(s) => s,
        Err(e) => std::str::from_utf8(&prefix[..e.valid_up_to()]).unwrap_or_default(),
    };
    valid.chars().count()
}

fn link_target(features: &[FacetFeature]) -> Option<String> {
    for feature in features {
        match feature {
            FacetFeature::Link { uri } => {
                // The first link feature decides, even when its URI is blank.
                let uri = uri.as_deref().unwrap_or("").trim();
                return (!uri.is_empty()).then(|| uri.to_string());
            }
            FacetFeature::Mention { did } => {
                let did = did.as_deref().unwrap_or("").trim();
                if !did.is_empty() {
                    return Some(format!("{PROFILE_BASE}/{did}"));
                }
            }
            FacetFeature::Other => {}
        }
    }
    None
}

/// Resolve facets into sorted, non-overlapping character spans.
///
/// Facets without a usable target or with an empty/inverted range are
/// dropped. After sorting by `(start, end)`, a span that starts before the
/// end of the previously accepted one is discarded.
pub fn resolve_spans(text: &str, facets: &[Facet]) -> Vec<LinkSpan> {
    let mut spans: Vec<LinkSpan> = facets
        .iter()
        .filter_map(|facet| {
            let index = facet.index?;
            let (byte_start, byte_end) = (index.byte_start?, index.byte_end?);
            if byte_end <= byte_start {
                return None;
            }
            let start = byte_to_char_index(text, byte_start);
            let end = byte_to_char_index(text, byte_end);
            if end <= start {
                return None;
            }
            let target = link_target(&facet.features)?;
            Some(LinkSpan { start, end, target })
        })
        .collect();

    spans.sort_by_key(|s| (s.start, s.end));

    let mut cursor = 0usize;
    spans.retain(|span| {
        if span.start < cursor {
            return false;
        }
        cursor = span.end;
        true
    });
    spans
}

fn char_slice<'a>(text: &'a str, boundaries: &[usize], start: usize, end: usize) -> &'a str {
    &text[boundaries[start]..boundaries[end]]
}

fn escape_text(s: &str) -> String {
    encode_quoted_attribute(s).replace('\n', "<br>\n")
}

/// Render `text` as HTML, wrapping faceted ranges in links.
///
/// ```
/// use skyfeed_social::bluesky::richtext::render_rich_text_html;
///
/// assert_eq!(render_rich_text_html("a < b\nc", &[]), "a &lt; b<br>\nc");
/// ```
pub fn render_rich_text_html(text: &str, facets: &[Facet]) -> String {
    if text.is_empty() {
        return String::new();
    }

    // Byte offset of every char boundary, including the end of the text.
    let boundaries: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let slice = |start: usize, end: usize| char_slice(text, &boundaries, start, end);
    let char_len = boundaries.len() - 1;

    let mut out = String::with_capacity(text.len());
    let mut last = 0usize;
    for span in resolve_spans(text, facets) {
        if span.start > last {
            out.push_str(&escape_text(slice(last, span.start)));
        }
        out.push_str(&format!(
            r#"<a href="{}" target="_blank" rel="noopener noreferrer">{}</a>"#,
            encode_quoted_attribute(&span.target),
            encode_quoted_attribute(slice(span.start, span.end)),
        ));
        last = span.end;
    }
    if last < char_len {
        out.push_str(&escape_text(slice(last, char_len)));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bluesky::types::ByteSlice;

    fn link(start: i64, end: i64, uri: &str) -> Facet {
        Facet {
            index: Some(ByteSlice {
                byte_start: Some(start),
                byte_end: Some(end),
            }),
            features: vec![FacetFeature::Link {
                uri: Some(uri.into()),
            }],
        }
    }

    fn mention(start: i64, end: i64, did: &str) -> Facet {
        Facet {
            index: Some(ByteSlice {
                byte_start: Some(start),
                byte_end: Some(end),
            }),
            features: vec![FacetFeature::Mention {
                did: Some(did.into()),
            }],
        }
    }

    #[test]
    fn byte_offsets_account_for_multibyte_chars() {
        let text = "héllo world";
        // "é" is two bytes, so "world" spans bytes 7..12 but chars 6..11.
        assert_eq!(byte_to_char_index(text, 7), 6);
        assert_eq!(byte_to_char_index(text, 12), 11);
        let chars: String = text.chars().skip(6).take(5).collect();
        assert_eq!(chars, "world");
    }

    #[test]
    fn cut_inside_a_char_drops_it() {
        // Byte 2 falls in the middle of "é" (bytes 1..3).
        assert_eq!(byte_to_char_index("héllo", 2), 1);
    }

    #[test]
    fn out_of_range_offsets_clamp() {
        assert_eq!(byte_to_char_index("abc", -4), 0);
        assert_eq!(byte_to_char_index("abc", 0), 0);
        assert_eq!(byte_to_char_index("abc", 99), 3);
    }

    #[test]
    fn plain_text_is_escaped_with_line_breaks() {
        let html = render_rich_text_html("Tom & \"Jerry\"\n<3 'em", &[]);
        assert_eq!(html, "Tom &amp; &quot;Jerry&quot;<br>\n&lt;3 &#x27;em");
    }

    #[test]
    fn empty_text_renders_empty() {
        assert_eq!(render_rich_text_html("", &[link(0, 3, "https://x.example")]), "");
    }

    #[test]
    fn link_over_multibyte_text_wraps_the_right_word() {
        let html = render_rich_text_html("héllo world", &[link(7, 12, "https://w.example/?a=1&b=2")]);
        assert_eq!(
            html,
            "héllo <a href=\"https://w.example/?a=1&amp;b=2\" target=\"_blank\" \
             rel=\"noopener noreferrer\">world</a>"
        );
    }

    #[test]
    fn mentions_link_to_profile_by_did() {
        let spans = resolve_spans("hi @bob", &[mention(3, 7, "did:plc:bob")]);
        assert_eq!(
            spans,
            vec![LinkSpan {
                start: 3,
                end: 7,
                target: "https://bsky.app/profile/did:plc:bob".into()
            }]
        );
    }

    #[test]
    fn overlapping_spans_keep_the_earliest() {
        let facets = [link(2, 8, "https://late.example"), link(0, 4, "https://early.example")];
        let spans = resolve_spans("abcdefghij", &facets);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].target, "https://early.example");

        let html = render_rich_text_html("abcdefghij", &facets);
        assert!(html.starts_with("<a href=\"https://early.example\""));
        assert!(html.ends_with("</a>efghij"));
        assert!(!html.contains("late.example"));
    }

    #[test]
    fn adjacent_spans_are_both_kept() {
        let spans = resolve_spans("abcdef", &[link(3, 6, "https://b"), link(0, 3, "https://a")]);
        assert_eq!(spans.len(), 2);
        assert_eq!((spans[0].start, spans[1].start), (0, 3));
    }

    #[test]
    fn invalid_ranges_and_targets_are_dropped() {
        let mut missing_end = link(0, 2, "https://x");
        missing_end.index = Some(ByteSlice {
            byte_start: Some(0),
            byte_end: None,
        });
        let facets = [
            link(3, 3, "https://empty"),
            link(4, 1, "https://inverted"),
            link(0, 2, "   "),
            mention(0, 2, ""),
            missing_end,
            Facet {
                index: Some(ByteSlice {
                    byte_start: Some(0),
                    byte_end: Some(2),
                }),
                features: vec![FacetFeature::Other],
            },
        ];
        assert!(resolve_spans("abcdef", &facets).is_empty());
    }

    #[test]
    fn anchor_text_keeps_raw_newlines() {
        let html = render_rich_text_html("a\nb", &[link(0, 3, "https://x")]);
        assert_eq!(
            html,
            "<a href=\"https://x\" target=\"_blank\" rel=\"noopener noreferrer\">a\nb</a>"
        );
    }
}
