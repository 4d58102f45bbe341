//! Generation orchestrator: topic in, persisted post out.
//!
//! Runs the five tasks strictly in order, binds capability shims to the
//! roles that declare them, applies the content transforms to the final
//! output and persists the result. Errors never escape [`Generator::generate`];
//! they become the failure-shaped [`GenerationOutcome`].

use std::collections::HashMap;
use std::time::Instant;

use chrono::Local;
use tracing::{debug, error, info, instrument, warn};

use postcrew_capabilities::{ImageFinder, WebSearch};
use postcrew_markdown::{
    clean_markdown, featured_image_url, has_featured_image, inject_header, inject_toc, slugify,
    validate_content,
};
use postcrew_shared::{
    Capability, GeneratedPost, GenerationOutcome, GenerationRequest, PipelineResult,
    PostcrewError, Result, Role, TaskDescriptor, TaskId,
};

use crate::library::Library;
use crate::llm::{AgentRuntime, TaskInvocation, ToolOutput};
use crate::sentiment;
use crate::tasks::{build_tasks, validate_dependencies};

/// Progress callback for reporting generation status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called before task `index` (1-based) of `total` starts.
    fn task_started(&self, index: usize, total: usize, role: Role);
    /// Called once with the final outcome.
    fn done(&self, outcome: &GenerationOutcome);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn task_started(&self, _index: usize, _total: usize, _role: Role) {}
    fn done(&self, _outcome: &GenerationOutcome) {}
}

pub struct Generator {
    runtime: Box<dyn AgentRuntime>,
    search: WebSearch,
    images: ImageFinder,
    library: Library,
}

impl Generator {
    pub fn new(
        runtime: Box<dyn AgentRuntime>,
        search: WebSearch,
        images: ImageFinder,
        library: Library,
    ) -> Self {
        Self {
            runtime,
            search,
            images,
            library,
        }
    }

    pub fn library(&self) -> &Library {
        &self.library
    }

    /// Generate, transform and persist one post.
    #[instrument(skip_all, fields(topic = %request.topic))]
    pub async fn generate(
        &self,
        request: &GenerationRequest,
        progress: &dyn ProgressReporter,
    ) -> GenerationOutcome {
        let start = Instant::now();
        info!("generating post");

        let outcome = match self.try_generate(request, progress).await {
            Ok(post) => {
                info!(
                    path = %post.filepath.display(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "post generated"
                );
                GenerationOutcome::Success(post)
            }
            Err(e) => {
                error!(error = %e, "generation failed");
                GenerationOutcome::failed(&request.topic, &e)
            }
        };

        progress.done(&outcome);
        outcome
    }

    async fn try_generate(
        &self,
        request: &GenerationRequest,
        progress: &dyn ProgressReporter,
    ) -> Result<GeneratedPost> {
        let request = request.validated()?;
        let tasks = build_tasks(&request);
        validate_dependencies(&tasks)?;

        let result = self.run_pipeline(&request, &tasks, progress).await?;

        progress.phase("Saving post");
        let slug = slugify(&request.topic);
        let stem = format!(
            "{}_{}",
            if slug.is_empty() { "post" } else { slug.as_str() },
            Local::now().format("%Y%m%d_%H%M%S")
        );
        let saved = self
            .library
            .create(&stem, &result.cleaned_text, &request.topic, &request.focus)
            .await?;

        Ok(GeneratedPost {
            topic: request.topic,
            focus: request.focus,
            content: result.cleaned_text,
            html_content: saved.html,
            image_url: result.image_url,
            filepath: saved.content_path,
            html_path: saved.rendered_path,
            validation_issues: result.validation_issues,
            sentiment: result.sentiment,
        })
    }

    /// Run the tasks in order, then clean, check and decorate the final output.
    pub async fn run_pipeline(
        &self,
        request: &GenerationRequest,
        tasks: &[TaskDescriptor],
        progress: &dyn ProgressReporter,
    ) -> Result<PipelineResult> {
        let raw_text = self.run_tasks(request, tasks, progress).await?;

        progress.phase("Cleaning content");
        let cleaned = clean_markdown(&raw_text);

        let validation_issues: Vec<String> = validate_content(&cleaned)
            .iter()
            .map(ToString::to_string)
            .collect();
        if !validation_issues.is_empty() {
            warn!(issues = ?validation_issues, "content validation issues");
        }

        progress.phase("Adding header and table of contents");
        let (image_url, with_header) = if has_featured_image(&cleaned) {
            let url = featured_image_url(&cleaned).unwrap_or_default();
            (url, cleaned.clone())
        } else {
            let url = self.images.find(&request.topic).await;
            let today = Local::now().date_naive();
            let with_header = inject_header(&cleaned, &request.topic, &url, today);
            (url, with_header)
        };
        let final_text = inject_toc(&with_header, request.add_toc);

        let sentiment = sentiment::score(&cleaned);
        debug!(has_sentiment = sentiment.is_some(), "sentiment scored");

        Ok(PipelineResult {
            raw_text,
            cleaned_text: final_text,
            validation_issues,
            image_url,
            sentiment,
        })
    }

    /// Execute every task in order and return the last task's output.
    async fn run_tasks(
        &self,
        request: &GenerationRequest,
        tasks: &[TaskDescriptor],
        progress: &dyn ProgressReporter,
    ) -> Result<String> {
        let total = tasks.len();
        let mut outputs: HashMap<TaskId, String> = HashMap::with_capacity(total);
        let mut last_output = None;

        for (i, task) in tasks.iter().enumerate() {
            progress.task_started(i + 1, total, task.role);

            let context = task
                .context_refs
                .iter()
                .map(|dep| {
                    outputs.get(dep).cloned().ok_or_else(|| {
                        PostcrewError::validation(format!(
                            "task '{}' ran before its dependency '{dep}'",
                            task.id
                        ))
                    })
                })
                .collect::<Result<Vec<_>>>()?;

            let tool_output = self.call_capability(task.role, request).await;

            let invocation = TaskInvocation {
                descriptor: task.clone(),
                context,
                tool_output,
                temperature: request.temperature,
            };

            let output = self.runtime.run_task(&invocation).await?;
            debug!(task = %task.id, chars = output.len(), "task output captured");

            outputs.insert(task.id, output.clone());
            last_output = Some(output);
        }

        last_output.ok_or_else(|| PostcrewError::validation("pipeline has no tasks"))
    }

    /// Call the shim bound to `role`, if it declares one.
    async fn call_capability(
        &self,
        role: Role,
        request: &GenerationRequest,
    ) -> Option<ToolOutput> {
        match role.capability() {
            Capability::None => None,
            Capability::WebSearch => {
                let query = match role {
                    Role::Researcher => format!("{} {}", request.topic, request.focus),
                    _ => request.topic.clone(),
                };
                let text = self.search.search(&query, request.date_range).await;
                Some(ToolOutput {
                    capability: Capability::WebSearch,
                    query,
                    text,
                })
            }
            Capability::ImageLookup => {
                let query = request.topic.clone();
                let text = self.images.find(&query).await;
                Some(ToolOutput {
                    capability: Capability::ImageLookup,
                    query,
                    text,
                })
            }
        }
    }
}
