//! CLI command definitions, routing, and tracing setup.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use postcrew_capabilities::{ImageFinder, WebSearch};
use postcrew_core::{GeminiRuntime, Generator, Library, ProgressReporter};
use postcrew_shared::{
    AppConfig, DateRange, GenerationOutcome, GenerationRequest, PostLength, Role, init_config,
    load_config,
};
use postcrew_storage::rendered_path_for;
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// postcrew: a crew of agents that researches, writes and illustrates
/// technical blog posts.
#[derive(Parser)]
#[command(
    name = "postcrew",
    version,
    about = "Generate, review and manage technical blog posts with a multi-agent pipeline.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Directory holding generated posts (defaults to the configured output_dir).
    #[arg(long, global = true, env = "POSTCREW_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Generate a new post on a topic.
    Generate {
        /// Subject of the post.
        topic: String,

        /// Angle to emphasise.
        #[arg(long)]
        focus: Option<String>,

        /// Recency window for research: none, last-week, last-month,
        /// last-year, or 1m..6m.
        #[arg(long, default_value = "none")]
        date_range: DateRange,

        /// Writing tone (defaults to the configured tone).
        #[arg(long)]
        tone: Option<String>,

        /// Post length: short, medium or long.
        #[arg(long)]
        length: Option<PostLength>,

        /// Sampling temperature in 0.1..=1.0.
        #[arg(long)]
        temperature: Option<f32>,

        /// Skip the table of contents.
        #[arg(long)]
        no_toc: bool,

        /// Ask for a descriptive rather than SEO-optimized title.
        #[arg(long)]
        no_seo: bool,

        /// Print the full result record as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List post files, newest first.
    List,

    /// Show indexed generation history.
    History,

    /// Print a post.
    Show {
        /// Post file to show.
        path: Option<PathBuf>,

        /// Use the most recently modified post.
        #[arg(long)]
        latest: bool,

        /// Print the rendered HTML instead of the markdown.
        #[arg(long)]
        html: bool,
    },

    /// Replace a post's content and re-render it.
    Edit {
        /// Post file to edit.
        path: Option<PathBuf>,

        /// Use the most recently modified post.
        #[arg(long)]
        latest: bool,

        /// Read the new content from this file instead of stdin.
        #[arg(long)]
        from: Option<PathBuf>,
    },

    /// Delete a post and its rendered view.
    Delete {
        /// Post file to delete.
        path: Option<PathBuf>,

        /// Use the most recently modified post.
        #[arg(long)]
        latest: bool,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "postcrew=info",
        1 => "postcrew=debug",
        _ => "postcrew=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config = load_config()?;
    let output_dir = cli
        .output_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.defaults.output_dir));

    match cli.command {
        Command::Generate {
            topic,
            focus,
            date_range,
            tone,
            length,
            temperature,
            no_toc,
            no_seo,
            json,
        } => {
            let mut request = GenerationRequest::new(topic);
            if let Some(focus) = focus {
                request.focus = focus;
            }
            request.date_range = date_range;
            request.tone = tone.unwrap_or_else(|| config.defaults.tone.clone());
            request.length = match length {
                Some(length) => length,
                None => config.defaults.length.parse()?,
            };
            request.temperature = temperature.unwrap_or(config.defaults.temperature);
            request.add_toc = !no_toc;
            request.seo_optimized = !no_seo;

            cmd_generate(&config, &output_dir, &request, json).await
        }
        Command::List => cmd_list(&output_dir).await,
        Command::History => cmd_history(&output_dir).await,
        Command::Show { path, latest, html } => cmd_show(&output_dir, path, latest, html).await,
        Command::Edit { path, latest, from } => {
            cmd_edit(&output_dir, path, latest, from.as_deref()).await
        }
        Command::Delete { path, latest } => cmd_delete(&output_dir, path, latest).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show(&config).await,
        },
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_generate(
    config: &AppConfig,
    output_dir: &Path,
    request: &GenerationRequest,
    json: bool,
) -> Result<()> {
    // The model key is checked before anything touches the output directory.
    let runtime = GeminiRuntime::from_config(&config.model)?;
    let search = WebSearch::from_config(&config.search)?;
    let images = ImageFinder::from_config(&config.images)?;
    let library = Library::open(output_dir).await?;

    info!(
        topic = %request.topic,
        model = runtime.model(),
        output_dir = %output_dir.display(),
        "starting generation"
    );

    let generator = Generator::new(Box::new(runtime), search, images, library);
    let reporter = CliProgress::new();
    let outcome = generator.generate(request, &reporter).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    }

    match outcome {
        GenerationOutcome::Success(post) => {
            if !json {
                println!();
                println!("  Post generated!");
                println!("  Topic:    {}", post.topic);
                println!("  Markdown: {}", post.filepath.display());
                println!("  HTML:     {}", post.html_path.display());
                println!("  Image:    {}", post.image_url);
                if let Some(sentiment) = post.sentiment {
                    println!("  Tone:     {:+.2} compound", sentiment.compound);
                }
                for issue in &post.validation_issues {
                    println!("  Warning:  {issue}");
                }
                println!();
            }
            Ok(())
        }
        GenerationOutcome::Failure(failure) => Err(eyre!("generation failed: {}", failure.error)),
    }
}

async fn cmd_list(output_dir: &Path) -> Result<()> {
    let library = Library::open(output_dir).await?;
    let posts = library.list()?;
    if posts.is_empty() {
        println!("No posts in {}", output_dir.display());
        return Ok(());
    }
    for path in posts {
        println!("{}", path.display());
    }
    Ok(())
}

async fn cmd_history(output_dir: &Path) -> Result<()> {
    let library = Library::open(output_dir).await?;
    let records = library.history().await?;
    if records.is_empty() {
        println!("No generation history in {}", output_dir.display());
        return Ok(());
    }
    for record in records {
        println!(
            "{}  {:<40}  {}",
            record.created_at.format("%Y-%m-%d %H:%M"),
            record.topic,
            record.content_path.display()
        );
    }
    Ok(())
}

async fn cmd_show(output_dir: &Path, path: Option<PathBuf>, latest: bool, html: bool) -> Result<()> {
    let library = Library::open(output_dir).await?;
    let path = library.select(path, latest)?;
    let target = if html {
        rendered_path_for(&path)
    } else {
        path
    };
    print!("{}", library.load(&target)?);
    Ok(())
}

async fn cmd_edit(
    output_dir: &Path,
    path: Option<PathBuf>,
    latest: bool,
    from: Option<&Path>,
) -> Result<()> {
    let library = Library::open(output_dir).await?;
    let path = library.select(path, latest)?;

    let content = match from {
        Some(file) => std::fs::read_to_string(file)
            .map_err(|e| eyre!("failed to read '{}': {e}", file.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let saved = library.save(&path, &content).await?;
    println!("Saved '{}'", saved.title);
    println!("  Markdown: {}", saved.content_path.display());
    println!("  HTML:     {}", saved.rendered_path.display());
    Ok(())
}

async fn cmd_delete(output_dir: &Path, path: Option<PathBuf>, latest: bool) -> Result<()> {
    let library = Library::open(output_dir).await?;
    let path = library.select(path, latest)?;
    library.delete(&path).await?;
    println!("Deleted {}", path.display());
    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show(config: &AppConfig) -> Result<()> {
    let toml_str = toml::to_string_pretty(config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        spinner.set_style(style);
        spinner.enable_steady_tick(Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn task_started(&self, index: usize, total: usize, role: Role) {
        self.spinner.set_message(format!("[{index}/{total}] {role}"));
    }

    fn done(&self, _outcome: &GenerationOutcome) {
        self.spinner.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn generate_parses_typed_flags() {
        let cli = Cli::try_parse_from([
            "postcrew",
            "generate",
            "Edge Computing",
            "--date-range",
            "3m",
            "--length",
            "long",
            "--temperature",
            "0.4",
            "--no-toc",
        ])
        .unwrap();

        match cli.command {
            Command::Generate {
                topic,
                date_range,
                length,
                temperature,
                no_toc,
                no_seo,
                ..
            } => {
                assert_eq!(topic, "Edge Computing");
                assert_eq!(date_range, DateRange::Months(3));
                assert_eq!(length, Some(PostLength::Long));
                assert_eq!(temperature, Some(0.4));
                assert!(no_toc);
                assert!(!no_seo);
            }
            _ => panic!("expected generate"),
        }
    }

    #[test]
    fn generate_rejects_unknown_date_range() {
        assert!(
            Cli::try_parse_from(["postcrew", "generate", "x", "--date-range", "9m"]).is_err()
        );
    }

    #[test]
    fn show_accepts_latest_without_path() {
        let cli = Cli::try_parse_from(["postcrew", "show", "--latest", "--html"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Show {
                path: None,
                latest: true,
                html: true
            }
        ));
    }
}
