//! Core domain types for postcrew generation runs and persisted posts.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{PostcrewError, Result};

/// Focus used when the caller leaves it blank.
pub const DEFAULT_FOCUS: &str = "latest trends and developments";

/// Inclusive temperature bounds accepted by a generation request.
pub const TEMPERATURE_RANGE: std::ops::RangeInclusive<f32> = 0.1..=1.0;

// ---------------------------------------------------------------------------
// PostId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper for post identifiers (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostId(pub Uuid);

impl PostId {
    /// Generate a new time-sortable post identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for PostId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PostId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

// ---------------------------------------------------------------------------
// Request options
// ---------------------------------------------------------------------------

/// How far back web research should look.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DateRange {
    #[default]
    AllTime,
    LastWeek,
    LastMonth,
    LastYear,
    /// The last `n` months, `n` in `1..=6`.
    Months(u8),
}

impl FromStr for DateRange {
    type Err = PostcrewError;

    fn from_str(s: &str) -> Result<Self> {
        let tag = s.trim().to_ascii_lowercase().replace('_', "-");
        match tag.as_str() {
            "" | "none" | "all-time" => Ok(Self::AllTime),
            "last-week" => Ok(Self::LastWeek),
            "last-month" => Ok(Self::LastMonth),
            "last-year" => Ok(Self::LastYear),
            other => {
                let months = other
                    .strip_suffix('m')
                    .and_then(|n| n.parse::<u8>().ok())
                    .filter(|n| (1..=6).contains(n));
                months.map(Self::Months).ok_or_else(|| {
                    PostcrewError::validation(format!(
                        "unknown date range '{s}': expected all-time, last-week, last-month, last-year or 1m..6m"
                    ))
                })
            }
        }
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AllTime => f.write_str("all-time"),
            Self::LastWeek => f.write_str("last-week"),
            Self::LastMonth => f.write_str("last-month"),
            Self::LastYear => f.write_str("last-year"),
            Self::Months(n) => write!(f, "{n}m"),
        }
    }
}

impl TryFrom<String> for DateRange {
    type Error = PostcrewError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<DateRange> for String {
    fn from(value: DateRange) -> Self {
        value.to_string()
    }
}

/// Target length of the written post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostLength {
    Short,
    #[default]
    Medium,
    Long,
}

impl PostLength {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Short => "short",
            Self::Medium => "medium",
            Self::Long => "long",
        }
    }
}

impl FromStr for PostLength {
    type Err = PostcrewError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "short" => Ok(Self::Short),
            "medium" => Ok(Self::Medium),
            "long" => Ok(Self::Long),
            _ => Err(PostcrewError::validation(format!(
                "unknown length '{s}': expected short, medium or long"
            ))),
        }
    }
}

impl fmt::Display for PostLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// GenerationRequest
// ---------------------------------------------------------------------------

/// Everything a caller supplies for one generation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub topic: String,
    pub focus: String,
    pub date_range: DateRange,
    pub tone: String,
    pub length: PostLength,
    pub add_toc: bool,
    pub seo_optimized: bool,
    pub temperature: f32,
}

impl GenerationRequest {
    /// A request for `topic` with every other field at its default.
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            focus: DEFAULT_FOCUS.to_string(),
            date_range: DateRange::AllTime,
            tone: "professional".to_string(),
            length: PostLength::Medium,
            add_toc: true,
            seo_optimized: true,
            temperature: 0.7,
        }
    }

    /// Check the request and return a normalized copy.
    ///
    /// The topic and tone are trimmed, a blank focus becomes [`DEFAULT_FOCUS`].
    pub fn validated(&self) -> Result<Self> {
        let topic = self.topic.trim();
        if topic.is_empty() {
            return Err(PostcrewError::precondition("a blog topic is required"));
        }
        if !TEMPERATURE_RANGE.contains(&self.temperature) {
            return Err(PostcrewError::validation(format!(
                "temperature {} is outside {}..={}",
                self.temperature,
                TEMPERATURE_RANGE.start(),
                TEMPERATURE_RANGE.end()
            )));
        }

        let focus = match self.focus.trim() {
            "" => DEFAULT_FOCUS,
            f => f,
        };
        let tone = match self.tone.trim() {
            "" => "professional".to_string(),
            t => t.to_lowercase(),
        };

        Ok(Self {
            topic: topic.to_string(),
            focus: focus.to_string(),
            tone,
            ..self.clone()
        })
    }
}

// ---------------------------------------------------------------------------
// Roles and tasks
// ---------------------------------------------------------------------------

/// External capability a role may draw on while working.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    None,
    WebSearch,
    ImageLookup,
}

/// Stable identifier of a pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskId {
    Research,
    Write,
    FactCheck,
    Edit,
    Illustrate,
}

impl TaskId {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Research => "research",
            Self::Write => "write",
            Self::FactCheck => "fact_check",
            Self::Edit => "edit",
            Self::Illustrate => "illustrate",
        }
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named stage in the generation pipeline with a fixed responsibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Researcher,
    Writer,
    FactChecker,
    Editor,
    Illustrator,
}

impl Role {
    /// All roles in pipeline order.
    pub const ALL: [Role; 5] = [
        Role::Researcher,
        Role::Writer,
        Role::FactChecker,
        Role::Editor,
        Role::Illustrator,
    ];

    /// The task this role performs.
    pub fn task_id(&self) -> TaskId {
        match self {
            Self::Researcher => TaskId::Research,
            Self::Writer => TaskId::Write,
            Self::FactChecker => TaskId::FactCheck,
            Self::Editor => TaskId::Edit,
            Self::Illustrator => TaskId::Illustrate,
        }
    }

    pub fn capability(&self) -> Capability {
        match self {
            Self::Researcher | Self::FactChecker => Capability::WebSearch,
            Self::Illustrator => Capability::ImageLookup,
            Self::Writer | Self::Editor => Capability::None,
        }
    }

    /// Job title used as the agent's persona.
    pub fn title(&self) -> &'static str {
        match self {
            Self::Researcher => "Senior Research Analyst",
            Self::Writer => "Tech Content Writer",
            Self::FactChecker => "Technical Fact Checker",
            Self::Editor => "Senior Editor",
            Self::Illustrator => "Content Illustrator",
        }
    }

    pub fn goal(&self) -> &'static str {
        match self {
            Self::Researcher => {
                "Find and analyze the latest and most relevant information on given topics"
            }
            Self::Writer => "Write engaging, detailed blog posts about technology topics",
            Self::FactChecker => "Verify all technical claims and ensure information accuracy",
            Self::Editor => "Ensure the content is high quality, accurate, and well-structured",
            Self::Illustrator => "Find or create appropriate visual elements for the blog post",
        }
    }

    pub fn backstory(&self) -> &'static str {
        match self {
            Self::Researcher => {
                "You're an expert researcher specialized in technology, AI, and GenAI. \
                 You have a knack for finding cutting-edge information and identifying key trends. \
                 You're thorough and verify your sources. You always include specific dates \
                 and citations for all facts and figures."
            }
            Self::Writer => {
                "You're an experienced technical writer with expertise in AI and GenAI. \
                 You explain complex concepts in simple terms and create well-structured content. \
                 You include relevant examples and code snippets when appropriate. Your writing is \
                 concise and engaging, with a strong hook and conclusion."
            }
            Self::FactChecker => {
                "You're a thorough fact checker with expertise in technology and AI. \
                 You verify technical claims, dates, statistics, and references. You flag \
                 potential inaccuracies and make sure the content is up-to-date and trustworthy. \
                 You also check for technical inconsistencies and logical errors."
            }
            Self::Editor => {
                "You're a meticulous editor with deep knowledge of technology content. \
                 You improve clarity, fix errors, and hold the content to high standards. \
                 You verify technical accuracy and keep transitions between paragraphs \
                 and sections smooth."
            }
            Self::Illustrator => {
                "You specialize in finding or describing appropriate visuals for technical content. \
                 You know what makes a good technical illustration and can find free-to-use images. \
                 You suggest diagrams or charts when needed and always provide detailed alt text \
                 for accessibility."
            }
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// One pipeline stage: who runs it, what it asks for, and what it reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskDescriptor {
    pub id: TaskId,
    pub role: Role,
    pub description: String,
    pub expected_output: String,
    /// Predecessor tasks whose output this task consumes, in order.
    pub context_refs: Vec<TaskId>,
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Polarity scores for a piece of text.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentScores {
    pub positive: f64,
    pub neutral: f64,
    pub negative: f64,
    /// Normalized overall score in `[-1, 1]`.
    pub compound: f64,
}

/// Everything the pipeline produced for one run, before persistence.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineResult {
    /// Output of the final task, untouched.
    pub raw_text: String,
    /// Cleaned markdown with the header and table of contents applied.
    pub cleaned_text: String,
    pub validation_issues: Vec<String>,
    pub image_url: String,
    pub sentiment: Option<SentimentScores>,
}

/// Index entry for a persisted post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostRecord {
    pub id: PostId,
    pub topic: String,
    pub focus: String,
    /// The `.md` file.
    pub content_path: PathBuf,
    /// The `.html` file; same stem as `content_path`.
    pub rendered_path: PathBuf,
    /// SHA-256 of the markdown content as last written.
    pub content_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Success shape of a generation result record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedPost {
    pub topic: String,
    pub focus: String,
    pub content: String,
    pub html_content: String,
    pub image_url: String,
    pub filepath: PathBuf,
    pub html_path: PathBuf,
    pub validation_issues: Vec<String>,
    pub sentiment: Option<SentimentScores>,
}

/// Failure shape of a generation result record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationFailure {
    pub error: String,
    pub topic: String,
    pub content: String,
}

/// The record returned by every generation call, success or not.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GenerationOutcome {
    Failure(GenerationFailure),
    Success(GeneratedPost),
}

impl GenerationOutcome {
    /// Build the failure shape for `topic` from any error.
    pub fn failed(topic: &str, error: &PostcrewError) -> Self {
        Self::Failure(GenerationFailure {
            error: error.to_string(),
            topic: topic.to_string(),
            content: format!("Error generating content: {error}"),
        })
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn topic(&self) -> &str {
        match self {
            Self::Success(post) => &post.topic,
            Self::Failure(failure) => &failure.topic,
        }
    }

    /// Markdown content, or the fallback description on failure.
    pub fn content(&self) -> &str {
        match self {
            Self::Success(post) => &post.content,
            Self::Failure(failure) => &failure.content,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_id_roundtrip() {
        let id = PostId::new();
        let parsed: PostId = id.to_string().parse().expect("parse PostId");
        assert_eq!(id, parsed);
    }

    #[test]
    fn date_range_parses_tags() {
        assert_eq!("none".parse::<DateRange>().unwrap(), DateRange::AllTime);
        assert_eq!("last_week".parse::<DateRange>().unwrap(), DateRange::LastWeek);
        assert_eq!("last-month".parse::<DateRange>().unwrap(), DateRange::LastMonth);
        assert_eq!("last_year".parse::<DateRange>().unwrap(), DateRange::LastYear);
        assert_eq!("3m".parse::<DateRange>().unwrap(), DateRange::Months(3));
        assert!("0m".parse::<DateRange>().is_err());
        assert!("7m".parse::<DateRange>().is_err());
        assert!("fortnight".parse::<DateRange>().is_err());
    }

    #[test]
    fn date_range_serializes_as_tag() {
        let json = serde_json::to_string(&DateRange::Months(2)).unwrap();
        assert_eq!(json, r#""2m""#);
        let parsed: DateRange = serde_json::from_str(r#""last-week""#).unwrap();
        assert_eq!(parsed, DateRange::LastWeek);
    }

    #[test]
    fn request_validation_normalizes() {
        let mut request = GenerationRequest::new("  Edge Computing ");
        request.focus = "   ".into();
        request.tone = "Conversational".into();
        let normalized = request.validated().expect("valid request");
        assert_eq!(normalized.topic, "Edge Computing");
        assert_eq!(normalized.focus, DEFAULT_FOCUS);
        assert_eq!(normalized.tone, "conversational");
    }

    #[test]
    fn request_validation_rejects_bad_input() {
        let request = GenerationRequest::new("   ");
        assert!(matches!(
            request.validated(),
            Err(PostcrewError::Precondition { .. })
        ));

        let mut request = GenerationRequest::new("Rust");
        request.temperature = 1.5;
        assert!(matches!(
            request.validated(),
            Err(PostcrewError::Validation { .. })
        ));

        request.temperature = 0.1;
        assert!(request.validated().is_ok());
        request.temperature = 1.0;
        assert!(request.validated().is_ok());
    }

    #[test]
    fn roles_declare_capabilities() {
        assert_eq!(Role::Researcher.capability(), Capability::WebSearch);
        assert_eq!(Role::FactChecker.capability(), Capability::WebSearch);
        assert_eq!(Role::Illustrator.capability(), Capability::ImageLookup);
        assert_eq!(Role::Writer.capability(), Capability::None);
        assert_eq!(Role::Editor.capability(), Capability::None);
        assert_eq!(Role::FactChecker.task_id().as_str(), "fact_check");
    }

    #[test]
    fn outcome_serializes_both_shapes() {
        let failure = GenerationOutcome::failed("Rust", &PostcrewError::Llm("quota".into()));
        let json = serde_json::to_value(&failure).unwrap();
        assert_eq!(json["topic"], "Rust");
        assert_eq!(json["error"], "llm error: quota");
        assert_eq!(json["content"], "Error generating content: llm error: quota");
        assert!(json.get("filepath").is_none());

        let success = GenerationOutcome::Success(GeneratedPost {
            topic: "Rust".into(),
            focus: DEFAULT_FOCUS.into(),
            content: "# Rust".into(),
            html_content: "<h1>Rust</h1>".into(),
            image_url: "https://example.com/a.jpg".into(),
            filepath: "generated_posts/rust.md".into(),
            html_path: "generated_posts/rust.html".into(),
            validation_issues: vec![],
            sentiment: None,
        });
        let json = serde_json::to_value(&success).unwrap();
        assert_eq!(json["html_path"], "generated_posts/rust.html");
        assert!(json.get("error").is_none());
        assert!(success.is_success());
    }
}
