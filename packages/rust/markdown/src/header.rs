//! Post header: title, metadata line and featured image.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

/// Alt text that marks the featured image of a post.
pub const FEATURED_IMAGE_MARKER: &str = "![Featured Image]";

/// Estimated reading time: one minute per 1000 characters, at least five.
pub fn reading_time_minutes(md: &str) -> usize {
    (md.chars().count() / 1000).max(5)
}

pub fn has_featured_image(md: &str) -> bool {
    md.contains(FEATURED_IMAGE_MARKER)
}

/// URL of the featured image, when the document carries one.
pub fn featured_image_url(md: &str) -> Option<String> {
    static FEATURED_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"!\[Featured Image\]\(\s*([^)\s]+)[^)]*\)").expect("valid regex")
    });

    FEATURED_RE.captures(md).map(|caps| caps[1].to_string())
}

/// Prepend the title, metadata line and featured image to `md`.
///
/// A document that already carries a featured image is returned unchanged.
pub fn inject_header(md: &str, topic: &str, image_url: &str, published: NaiveDate) -> String {
    if has_featured_image(md) {
        return md.to_string();
    }

    let reading_time = reading_time_minutes(md);
    format!(
        "# {topic}\n\n\
         > **Reading time:** {reading_time} min | **Difficulty:** Intermediate | **Published:** {}\n\n\
         {FEATURED_IMAGE_MARKER}({image_url})\n\n\
         {md}",
        published.format("%B %d, %Y"),
    )
}

/// First level-1 heading, trimmed.
pub fn extract_title(md: &str) -> Option<String> {
    static H1_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?m)^#[ \t]+(.+)$").expect("valid regex"));

    H1_RE
        .captures(md)
        .map(|caps| caps[1].trim().to_string())
        .filter(|title| !title.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 7).unwrap()
    }

    #[test]
    fn reading_time_has_floor() {
        assert_eq!(reading_time_minutes(""), 5);
        assert_eq!(reading_time_minutes(&"a".repeat(5999)), 5);
        assert_eq!(reading_time_minutes(&"a".repeat(7000)), 7);
    }

    #[test]
    fn inject_header_prepends_block() {
        let result = inject_header("## Intro\n\nBody", "Edge Computing", "https://img/a.jpg", date());
        assert_eq!(
            result,
            "# Edge Computing\n\n\
             > **Reading time:** 5 min | **Difficulty:** Intermediate | **Published:** March 07, 2024\n\n\
             ![Featured Image](https://img/a.jpg)\n\n\
             ## Intro\n\nBody"
        );
    }

    #[test]
    fn inject_header_skips_when_marker_present() {
        let md = "# T\n\n![Featured Image](https://img/x.jpg)\n\nBody";
        assert_eq!(inject_header(md, "T", "https://img/y.jpg", date()), md);
    }

    #[test]
    fn featured_image_url_reads_marker() {
        let md = "# T\n\n![Featured Image](https://img/x.jpg \"cover\")\n";
        assert_eq!(featured_image_url(md).as_deref(), Some("https://img/x.jpg"));
        assert_eq!(featured_image_url("![Other](https://img/y.jpg)"), None);
    }

    #[test]
    fn extract_title_first_h1() {
        assert_eq!(
            extract_title("Intro\n\n## Sub\n\n# Real Title \n\n# Second"),
            Some("Real Title".into())
        );
        assert_eq!(extract_title("## Only sub"), None);
        assert_eq!(extract_title("#hashtag"), None);
    }
}
