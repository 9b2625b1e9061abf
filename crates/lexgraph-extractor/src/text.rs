//! Statute text segmentation
//!
//! Splits raw statute text into article-level segments on article markers:
//! `제N조`, `제N조의M`, `제N조제P항` and their English counterparts
//! `Article N`, `Article N-M`, `Article N paragraph P`.

use once_cell::sync::Lazy;
use regex::Regex;

static ARTICLE_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"제\s*\d+\s*조(?:\s*의\s*\d+)?(?:\s*제\s*\d+\s*항)?|(?i:article)\s+\d+(?:-\d+)?(?:\s+paragraph\s+\d+|\(\d+\))?",
    )
    .expect("article marker pattern is valid")
});

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

/// An article marker found in source text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleMarker {
    /// Byte offset of the marker start
    pub start: usize,
    /// Byte offset just past the marker
    pub end: usize,
    /// Marker text as written (e.g. "제2조의2")
    pub text: String,
}

/// Find every article marker in order of appearance
pub fn article_markers(text: &str) -> Vec<ArticleMarker> {
    ARTICLE_MARKER
        .find_iter(text)
        .map(|m| ArticleMarker {
            start: m.start(),
            end: m.end(),
            text: m.as_str().to_string(),
        })
        .collect()
}

/// Split statute text into article segments
///
/// Each segment runs from one marker to the next (or end of text) and is
/// trimmed; empty segments are dropped. Without markers the whole input is
/// returned as the only segment, so `""` yields `[""]`.
pub fn split_articles(text: &str) -> Vec<String> {
    let markers = article_markers(text);
    if markers.is_empty() {
        return vec![text.to_string()];
    }

    let mut articles = Vec::with_capacity(markers.len());
    for (i, marker) in markers.iter().enumerate() {
        let end = markers.get(i + 1).map_or(text.len(), |next| next.start);
        let article = text[marker.start..end].trim();
        if !article.is_empty() {
            articles.push(article.to_string());
        }
    }

    articles
}

/// Collapse whitespace runs (including no-break spaces) and trim
pub fn clean_text(text: &str) -> String {
    let normalized = text.replace('\u{a0}', " ");
    WHITESPACE.replace_all(&normalized, " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const PRIVACY_ACT: &str = "제1조(목적) 이 법은 개인정보의 처리 및 보호에 관한 사항을 정함으로써 개인의 자유와 권리를 보호한다.

제2조(정의) 이 법에서 사용하는 용어의 뜻은 다음과 같다.
1. \"개인정보\"란 살아 있는 개인에 관한 정보를 말한다.

제3조(개인정보 보호 원칙) ① 개인정보처리자는 개인정보의 처리 목적을 명확하게 하여야 한다.";

    #[test]
    fn test_split_korean_articles() {
        let articles = split_articles(PRIVACY_ACT);

        assert_eq!(articles.len(), 3);
        assert!(articles[0].starts_with("제1조(목적)"));
        assert!(articles[1].starts_with("제2조(정의)"));
        assert!(articles[1].ends_with("정보를 말한다."));
        assert!(articles[2].starts_with("제3조"));
    }

    #[test]
    fn test_split_sub_numbered_and_paragraph_markers() {
        let text = "제2조의2(적용 범위) 내용 A 제3조제1항 내용 B 제 4 조 내용 C";
        let articles = split_articles(text);

        assert_eq!(
            articles,
            vec!["제2조의2(적용 범위) 내용 A", "제3조제1항 내용 B", "제 4 조 내용 C"]
        );
    }

    #[test]
    fn test_split_english_articles() {
        let text = "Article 1 (Purpose) This Act aims... Article 2-1 Definitions. Article 3 paragraph 2 Exceptions.";
        let articles = split_articles(text);

        assert_eq!(articles.len(), 3);
        assert_eq!(articles[1], "Article 2-1 Definitions.");
        assert_eq!(articles[2], "Article 3 paragraph 2 Exceptions.");

        let lowercase = split_articles("article 1 purpose. article 2 definitions.");
        assert_eq!(lowercase, vec!["article 1 purpose.", "article 2 definitions."]);
    }

    #[test]
    fn test_split_drops_preamble_before_first_marker() {
        let text = "개인정보 보호법\n\n제1조(목적) 내용";
        assert_eq!(split_articles(text), vec!["제1조(목적) 내용"]);
    }

    #[test]
    fn test_split_empty_and_markerless() {
        assert_eq!(split_articles(""), vec![String::new()]);
        assert_eq!(split_articles("  부칙  "), vec!["  부칙  ".to_string()]);
    }

    #[test]
    fn test_markers_offsets() {
        let markers = article_markers("앞 제1조 뒤 제2조의3");
        assert_eq!(markers.len(), 2);
        assert_eq!(markers[0].text, "제1조");
        assert_eq!(markers[1].text, "제2조의3");
        assert_eq!(&"앞 제1조 뒤 제2조의3"[markers[1].start..markers[1].end], "제2조의3");
    }

    #[test]
    fn test_clean_text() {
        assert_eq!(clean_text("  제1조\u{a0}(목적)\n\n\t이 법은  "), "제1조 (목적) 이 법은");
        assert_eq!(clean_text(""), "");
        assert_eq!(clean_text(" \u{a0} "), "");
    }

    proptest! {
        #[test]
        fn prop_clean_text_idempotent(s in "\\PC*") {
            let once = clean_text(&s);
            prop_assert_eq!(clean_text(&once), once);
        }

        #[test]
        fn prop_clean_text_idempotent_whitespace_heavy(s in "[ \\t\\n\u{a0}a가]{0,40}") {
            let once = clean_text(&s);
            prop_assert_eq!(clean_text(&once), once);
        }

        #[test]
        fn prop_one_segment_per_marker(bodies in proptest::collection::vec("[a-z ,.]{0,30}", 1..8)) {
            let text: String = bodies
                .iter()
                .enumerate()
                .map(|(i, body)| format!("제{}조 {}\n", i + 1, body))
                .collect();

            let articles = split_articles(&text);
            prop_assert_eq!(articles.len(), bodies.len());
            for (i, article) in articles.iter().enumerate() {
                let marker = format!("제{}조", i + 1);
                let expected = format!("{} {}", marker, bodies[i]);
                prop_assert!(article.starts_with(&marker));
                prop_assert_eq!(article.as_str(), expected.trim());
            }
        }
    }
}
