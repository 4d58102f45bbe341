//! Non-blocking quality checks for a finished post.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// Posts shorter than this many characters are flagged.
pub const MIN_CONTENT_CHARS: usize = 1000;

const TECH_TERMS: [&str; 4] = ["code", "programming", "python", "javascript"];

/// A quality warning about a post. Never blocks persistence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationIssue {
    TooShort,
    NoImages,
    NoHeadings,
    NoCodeExamples,
    NoCitations,
}

impl ValidationIssue {
    pub fn message(&self) -> &'static str {
        match self {
            Self::TooShort => "Content may be too short for a comprehensive blog post",
            Self::NoImages => "No images found in content",
            Self::NoHeadings => "No proper header structure found",
            Self::NoCodeExamples => "Technical topic with no code examples",
            Self::NoCitations => "No citations or references found",
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Check `md` for common quality problems, in a fixed order.
pub fn validate_content(md: &str) -> Vec<ValidationIssue> {
    static IMAGE_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"!\[[^\]]*\]\([^)\s]+[^)]*\)").expect("valid regex"));
    static HEADING_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?m)^#{1,6}[ \t]+\S").expect("valid regex"));
    static CITATION_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\[\d+\]|\[\w+\d*\]|Source:").expect("valid regex"));

    let mut issues = Vec::new();

    if md.chars().count() < MIN_CONTENT_CHARS {
        issues.push(ValidationIssue::TooShort);
    }

    if !IMAGE_RE.is_match(md) && !md.contains("<img") {
        issues.push(ValidationIssue::NoImages);
    }

    if !HEADING_RE.is_match(md) {
        issues.push(ValidationIssue::NoHeadings);
    }

    let lower = md.to_lowercase();
    if TECH_TERMS.iter().any(|term| lower.contains(term)) && !md.contains("```") {
        issues.push(ValidationIssue::NoCodeExamples);
    }

    if !CITATION_RE.is_match(md) {
        issues.push(ValidationIssue::NoCitations);
    }

    issues
}
