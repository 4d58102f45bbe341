//! Heading extraction, slugs and the in-document table of contents.

use std::sync::LazyLock;

use pulldown_cmark::{Event, Parser, Tag, TagEnd};
use regex::Regex;
use tracing::debug;

use crate::render::options;

/// Marker heading of an injected table of contents.
pub const TOC_HEADING: &str = "## Table of Contents";

const TOC_TITLE: &str = "Table of Contents";

/// A level 2-4 heading found in a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    pub level: usize,
    pub title: String,
}

impl Heading {
    /// Anchor target used by TOC links and rendered heading ids.
    pub fn anchor(&self) -> String {
        slugify(&self.title)
    }
}

/// Derive a URL/anchor-safe identifier from free text.
///
/// Strips everything except word characters, whitespace and hyphens, trims,
/// lowercases, then collapses whitespace/hyphen runs into a single `-`.
pub fn slugify(text: &str) -> String {
    static STRIP_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"[^\w\s-]").expect("valid regex"));
    static COLLAPSE_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"[-\s]+").expect("valid regex"));

    let stripped = STRIP_RE.replace_all(text, "");
    let lowered = stripped.trim().to_lowercase();
    COLLAPSE_RE.replace_all(&lowered, "-").to_string()
}

/// A heading located by the Markdown parser, with its plain-text title and
/// the byte offset where its source line ends.
struct LocatedHeading {
    level: usize,
    title: String,
    line_end: usize,
}

/// Every heading of every level in document order.
///
/// Titles are built from the heading's text and inline code only, the same
/// way [`render_html`](crate::render_html) derives heading ids. Fenced code
/// is never scanned.
fn locate_headings(md: &str) -> Vec<LocatedHeading> {
    let mut found = Vec::new();
    let mut current: Option<LocatedHeading> = None;

    for (event, range) in Parser::new_ext(md, options()).into_offset_iter() {
        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                let line_end = range.start + md[range].trim_end().len();
                current = Some(LocatedHeading {
                    level: level as usize,
                    title: String::new(),
                    line_end,
                });
            }
            Event::Text(text) | Event::Code(text) => {
                if let Some(heading) = current.as_mut() {
                    heading.title.push_str(&text);
                }
            }
            Event::End(TagEnd::Heading(_)) => {
                if let Some(mut heading) = current.take() {
                    heading.title = heading.title.trim().to_string();
                    found.push(heading);
                }
            }
            _ => {}
        }
    }

    found
}

/// Extract level 2-4 headings in document order.
pub fn extract_headings(md: &str) -> Vec<Heading> {
    locate_headings(md)
        .into_iter()
        .filter(|h| (2..=4).contains(&h.level) && !h.title.is_empty())
        .map(|h| Heading {
            level: h.level,
            title: h.title,
        })
        .collect()
}

/// Render a TOC block: the marker heading, one nested list entry per
/// heading, and a trailing blank line.
pub fn build_toc(headings: &[Heading]) -> String {
    let mut toc = format!("{TOC_HEADING}\n\n");
    for heading in headings {
        let indent = "  ".repeat(heading.level.saturating_sub(2));
        toc.push_str(&format!(
            "{indent}- [{}](#{})\n",
            heading.title,
            heading.anchor()
        ));
    }
    toc.push('\n');
    toc
}

/// Insert a TOC after the first level-2 heading (else after the first
/// level-1 heading).
///
/// Returns `md` unchanged when `add_toc` is false, a TOC heading already
/// exists, the document has no level 2-4 headings, or there is no insertion
/// point. Headings inside fenced code are ignored.
pub fn inject_toc(md: &str, add_toc: bool) -> String {
    if !add_toc {
        return md.to_string();
    }

    let located = locate_headings(md);
    if located
        .iter()
        .any(|h| h.level == 2 && h.title == TOC_TITLE)
    {
        return md.to_string();
    }

    let headings = extract_headings(md);
    if headings.is_empty() {
        return md.to_string();
    }

    let Some(anchor) = located
        .iter()
        .find(|h| h.level == 2)
        .or_else(|| located.iter().find(|h| h.level == 1))
    else {
        debug!("no level 1 or 2 heading, skipping TOC");
        return md.to_string();
    };

    let pos = anchor.line_end;
    let toc = build_toc(&headings);
    debug!(entries = headings.len(), "injecting TOC");

    let mut out = String::with_capacity(md.len() + toc.len() + 2);
    out.push_str(&md[..pos]);
    out.push_str("\n\n");
    out.push_str(&toc);
    out.push_str(&md[pos..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_basic() {
        assert_eq!(slugify("Edge Computing"), "edge-computing");
        assert_eq!(slugify("  What's New in C++?  "), "whats-new-in-c");
        assert_eq!(slugify("Rust -- async / await"), "rust-async-await");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn slugify_is_idempotent() {
        for text in ["Edge Computing", "A  -  B", "Ünïcode Façade", "-lead-", "x_y z"] {
            let once = slugify(text);
            assert_eq!(slugify(&once), once, "{text}");
        }
    }

    #[test]
    fn extract_headings_levels_two_to_four() {
        let md = "# Title\n\n## Intro\n\n### Detail \n\n#### Deeper\n\n##### Too deep\n";
        let headings = extract_headings(md);
        assert_eq!(
            headings,
            vec![
                Heading { level: 2, title: "Intro".into() },
                Heading { level: 3, title: "Detail".into() },
                Heading { level: 4, title: "Deeper".into() },
            ]
        );
    }

    #[test]
    fn build_toc_nests_by_level() {
        let headings = vec![
            Heading { level: 2, title: "Intro".into() },
            Heading { level: 3, title: "Why Edge?".into() },
            Heading { level: 4, title: "Latency".into() },
        ];
        assert_eq!(
            build_toc(&headings),
            "## Table of Contents\n\n- [Intro](#intro)\n  - [Why Edge?](#why-edge)\n    - [Latency](#latency)\n\n"
        );
    }

    #[test]
    fn inject_toc_after_first_h2() {
        let md = "# Title\n\nLead.\n\n## Intro\n\nText.\n\n## Outro\n\nBye.";
        let result = inject_toc(md, true);
        let expected = "# Title\n\nLead.\n\n## Intro\n\n## Table of Contents\n\n- [Intro](#intro)\n- [Outro](#outro)\n\n\n\nText.\n\n## Outro\n\nBye.";
        assert_eq!(result, expected);
    }

    #[test]
    fn inject_toc_falls_back_to_h1() {
        let md = "# Title\n\n### Only Deep\n\nText.";
        let result = inject_toc(md, true);
        assert!(result.starts_with("# Title\n\n## Table of Contents\n\n  - [Only Deep](#only-deep)"));
    }

    #[test]
    fn inject_toc_noops() {
        let md = "# Title\n\n## Table of Contents\n\n- [A](#a)\n\n## A\n";
        assert_eq!(inject_toc(md, true), md);

        let md = "# Title\n\n## A\n";
        assert_eq!(inject_toc(md, false), md);

        let md = "Just text, no headings.";
        assert_eq!(inject_toc(md, true), md);

        // level 3 heading but nowhere to insert
        let md = "### Orphan\n\nText.";
        assert_eq!(inject_toc(md, true), md);
    }

    #[test]
    fn extract_headings_uses_rendered_text() {
        let md = "## __init__ method\n\n## See [the docs](https://example.com)\n\n### Using `Arc`\n";
        let titles: Vec<String> = extract_headings(md).into_iter().map(|h| h.title).collect();
        assert_eq!(titles, vec!["init method", "See the docs", "Using Arc"]);
    }

    #[test]
    fn inject_toc_skips_fenced_code() {
        let md = "# Title\n\n```bash\n## not a heading\n```\n\n## Real\n\nText.";
        let result = inject_toc(md, true);
        assert!(result.contains("```bash\n## not a heading\n```"));
        assert!(result.contains("## Real\n\n## Table of Contents\n\n- [Real](#real)\n"));
        assert!(!result.contains("(#not-a-heading)"));
    }

    #[test]
    fn inject_toc_ignores_similar_headings() {
        let md = "# Title\n\n## Intro\n\n### Table of Contents, revisited\n\nText.";
        let result = inject_toc(md, true);
        assert!(result.contains("## Intro\n\n## Table of Contents\n\n- [Intro](#intro)\n"));

        let fenced = "# Title\n\n```\n## Table of Contents\n```\n\n## Intro\n";
        assert_ne!(inject_toc(fenced, true), fenced);
    }
}
