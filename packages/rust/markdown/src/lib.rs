//! Content transforms for generated posts.
//!
//! Every function here is pure: cleanup of raw model output, quality
//! checks, slugs, header and table-of-contents injection, and
//! Markdown-to-HTML rendering.

mod cleanup;
mod header;
mod render;
mod toc;
mod validate;

use tracing::{debug, instrument};

pub use header::{
    FEATURED_IMAGE_MARKER, extract_title, featured_image_url, has_featured_image, inject_header,
    reading_time_minutes,
};
pub use render::{render_document, render_html};
pub use toc::{Heading, TOC_HEADING, build_toc, extract_headings, inject_toc, slugify};
pub use validate::{MIN_CONTENT_CHARS, ValidationIssue, validate_content};

/// Clean raw model output into publishable Markdown.
///
/// Removes a fence wrapping the whole document, strips language tags from
/// remaining fence openers, and trims surrounding whitespace.
#[instrument(skip_all, fields(input_len = md.len()))]
pub fn clean_markdown(md: &str) -> String {
    let cleaned = cleanup::run_pipeline(md);
    debug!(output_len = cleaned.len(), "markdown cleaned");
    cleaned
}
