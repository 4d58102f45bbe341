//! Cleanup pipeline for model-produced Markdown.
//!
//! Each pass is a function `&str -> String` applied in sequence.

use std::sync::LazyLock;

use regex::Regex;

/// Run the full cleanup pipeline on raw model output.
pub(crate) fn run_pipeline(md: &str) -> String {
    let mut result = md.to_string();

    result = strip_wrapping_fence(&result);
    result = strip_fence_languages(&result);
    result = result.trim().to_string();

    result
}

// ---------------------------------------------------------------------------
// Pass 1: Strip a whole-document wrapping fence
// ---------------------------------------------------------------------------

/// Remove a fence that wraps the entire document.
///
/// The opener must be tagged `markdown`/`md` or untagged, and the closer must
/// be a bare fence on the last line. An untagged opener only counts as a
/// wrapper when no other fence line sits between the two, otherwise it is an
/// ordinary code block that happens to span the whole text.
fn strip_wrapping_fence(md: &str) -> String {
    let trimmed = md.trim();
    let lines: Vec<&str> = trimmed.lines().collect();
    if lines.len() < 2 {
        return trimmed.to_string();
    }

    let first = lines[0].trim();
    let last = lines[lines.len() - 1].trim();
    let Some(tag) = first.strip_prefix("```") else {
        return trimmed.to_string();
    };
    if last != "```" {
        return trimmed.to_string();
    }

    let inner = &lines[1..lines.len() - 1];
    let wraps = match tag.trim().to_ascii_lowercase().as_str() {
        "markdown" | "md" => true,
        "" => !inner.iter().any(|line| line.trim_start().starts_with("```")),
        _ => false,
    };

    if wraps {
        inner.join("\n")
    } else {
        trimmed.to_string()
    }
}

// ---------------------------------------------------------------------------
// Pass 2: Strip fence language tags
// ---------------------------------------------------------------------------

/// Turn every tagged fence opener (```` ```python ````) into a bare fence.
fn strip_fence_languages(md: &str) -> String {
    static LANG_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?m)^([ \t]*)```[A-Za-z0-9_+#.-]+[ \t]*$").expect("valid regex")
    });

    LANG_RE.replace_all(md, "$1```").to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_markdown_tagged_wrapper() {
        let input = "```markdown\n# Title\n\nBody text\n```";
        assert_eq!(strip_wrapping_fence(input), "# Title\n\nBody text");
    }

    #[test]
    fn strips_md_wrapper_with_inner_code_block() {
        let input = "```md\n# Title\n\n```rust\nfn main() {}\n```\n\nEnd\n```";
        assert_eq!(
            strip_wrapping_fence(input),
            "# Title\n\n```rust\nfn main() {}\n```\n\nEnd"
        );
    }

    #[test]
    fn strips_untagged_wrapper_without_inner_fences() {
        let input = "```\n# Title\n\nBody\n```";
        assert_eq!(strip_wrapping_fence(input), "# Title\n\nBody");
    }

    #[test]
    fn keeps_untagged_fence_when_inner_fences_exist() {
        // First and last lines belong to two separate code blocks.
        let input = "```\nlet a = 1;\n```\n\nText\n\n```\nlet b = 2;\n```";
        assert_eq!(strip_wrapping_fence(input), input);
    }

    #[test]
    fn keeps_document_starting_with_language_block() {
        let input = "```python\nprint('hi')\n```";
        assert_eq!(strip_wrapping_fence(input), input);
    }

    #[test]
    fn strip_fence_languages_removes_tags() {
        let input = "Intro\n\n```python\nprint('hi')\n```\n\n  ```c++\nint x;\n  ```";
        let result = strip_fence_languages(input);
        assert_eq!(
            result,
            "Intro\n\n```\nprint('hi')\n```\n\n  ```\nint x;\n  ```"
        );
    }

    #[test]
    fn strip_fence_languages_ignores_inline_backticks() {
        let input = "Use ```rust inline``` sparingly";
        assert_eq!(strip_fence_languages(input), input);
    }

    #[test]
    fn full_pipeline_cleans_output() {
        let input = "\n\n```markdown\n# Edge Computing\n\n```javascript\nconsole.log(1);\n```\n```\n\n";
        let result = run_pipeline(input);
        assert_eq!(result, "# Edge Computing\n\n```\nconsole.log(1);\n```");
    }
}
