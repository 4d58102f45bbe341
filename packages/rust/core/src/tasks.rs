//! Task pipeline builder.
//!
//! Turns a [`GenerationRequest`] into the five role-bound task descriptors
//! and checks that every dependency points at an earlier task.

use std::collections::HashSet;

use postcrew_shared::{GenerationRequest, PostcrewError, Result, Role, TaskDescriptor, TaskId};

/// Build the descriptors for one generation run, in execution order:
/// research, write, fact_check, edit, illustrate.
pub fn build_tasks(request: &GenerationRequest) -> Vec<TaskDescriptor> {
    let topic = &request.topic;
    let focus = &request.focus;
    let tone = &request.tone;
    let length = request.length;
    let title_kind = if request.seo_optimized {
        "SEO-optimized title"
    } else {
        "Descriptive title"
    };

    vec![
        TaskDescriptor {
            id: TaskId::Research,
            role: Role::Researcher,
            description: format!(
                "Conduct thorough research on '{topic}' with focus on {focus}.\n\
                 Search the web for the most relevant and recent information."
            ),
            expected_output: format!(
                "A comprehensive research report on '{topic}' covering:\n\
                 1. Topic overview\n\
                 2. Key concepts\n\
                 3. Current trends\n\
                 4. Applications\n\
                 5. Statistics with sources\n\
                 6. References with links\n\
                 7. Controversies\n\
                 8. Future development"
            ),
            context_refs: vec![],
        },
        TaskDescriptor {
            id: TaskId::Write,
            role: Role::Writer,
            description: format!(
                "Write a {length} blog post about '{topic}' focusing on {focus} in a {tone} tone.\n\
                 The post should be informative yet accessible, suitable for a technical audience.\n\
                 DO NOT include markdown code block markers (```) in the output."
            ),
            expected_output: format!(
                "A complete blog post in markdown format about '{topic}' with:\n\
                 1. {title_kind}\n\
                 2. Engaging introduction\n\
                 3. Clear section headers\n\
                 4. Detailed explanations\n\
                 5. Code snippets (if applicable)\n\
                 6. Cited sources\n\
                 7. Actionable insights\n\
                 8. Strong conclusion"
            ),
            context_refs: vec![TaskId::Research],
        },
        TaskDescriptor {
            id: TaskId::FactCheck,
            role: Role::FactChecker,
            description: format!(
                "Review the blog post about '{topic}' and verify all technical claims."
            ),
            expected_output: "A detailed fact-checking report with specific corrections"
                .to_string(),
            context_refs: vec![TaskId::Write],
        },
        TaskDescriptor {
            id: TaskId::Edit,
            role: Role::Editor,
            description: format!(
                "Review and edit the blog post about '{topic}'.\n\
                 Ensure technical accuracy, clear writing style, and proper structure.\n\
                 Remove any unnecessary markdown code block markers."
            ),
            expected_output: "A polished, publication-ready blog post in markdown format"
                .to_string(),
            context_refs: vec![TaskId::Write, TaskId::FactCheck],
        },
        TaskDescriptor {
            id: TaskId::Illustrate,
            role: Role::Illustrator,
            description: format!(
                "Find appropriate visual elements for the blog post about '{topic}'.\n\
                 Include featured image and supporting images at key points."
            ),
            expected_output: "Markdown formatted image references positioned in the post"
                .to_string(),
            context_refs: vec![TaskId::Edit],
        },
    ]
}

/// Check that task ids are unique and every context ref names an earlier task.
pub fn validate_dependencies(tasks: &[TaskDescriptor]) -> Result<()> {
    let mut defined: HashSet<TaskId> = HashSet::new();

    for task in tasks {
        for dep in &task.context_refs {
            if !defined.contains(dep) {
                return Err(PostcrewError::validation(format!(
                    "task '{}' depends on '{dep}', which is not defined before it",
                    task.id
                )));
            }
        }
        if !defined.insert(task.id) {
            return Err(PostcrewError::validation(format!(
                "task '{}' is defined twice",
                task.id
            )));
        }
    }
    Ok(())
}
