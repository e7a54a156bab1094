//! copyloop - generate, evaluate, fix, repeat
//!
//! ## Commands
//!
//! - `generate`: draft copy for a scenario and refine it until every
//!   evaluator passes
//! - `lint`: check a one-line short description
//! - `evaluators`: list the available evaluators
//! - `show`: print a stored run artifact

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn, Level};

use copyloop_core::{
    build_fix, cancel_pair, lint_short_description, read_run_artifact, render_outcome_md,
    render_outcome_text, write_run_artifact, EvaluatorContext, EvaluatorRegistry,
    EvaluatorSelection, RefineConfig, RefineLoop, RefineOutcome,
};
use copyloop_llm::{ChatClient, ChatGenerator, ChatJudge, LlmConfig};

#[derive(Parser)]
#[command(name = "copyloop")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Generate short copy and refine it against evaluators", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Draft copy for a scenario and refine it until the evaluators pass
    Generate(GenerateArgs),

    /// Lint a one-line short description
    Lint {
        /// Text to check
        text: String,

        /// Print fix instructions for any violations
        #[arg(long)]
        fixes: bool,
    },

    /// List available evaluators
    Evaluators,

    /// Print a stored run after verifying its digest
    Show {
        /// Run ID
        run: String,

        /// Root directory containing run artifacts
        #[arg(long, default_value = ".copyloop/runs")]
        artifacts_dir: PathBuf,
    },
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// Situation the copy is for, e.g. "card declined at checkout"
    #[arg(short, long)]
    scenario: String,

    /// Writing style to follow
    #[arg(long, default_value = "Shopify Polaris")]
    style: String,

    /// Maximum refinement rounds (default: COPYLOOP_MAX_ITERS or 5)
    #[arg(long)]
    max_iters: Option<u32>,

    /// Stop when one failure message repeats this often (default: 3)
    #[arg(long)]
    repeat_threshold: Option<u32>,

    /// Comma-separated evaluators to run, in order
    #[arg(long, value_delimiter = ',', conflicts_with = "no_eval")]
    eval: Option<Vec<String>>,

    /// Run only the fast (non-model) evaluators
    #[arg(long, conflicts_with = "no_eval")]
    fast: bool,

    /// Skip evaluation and accept the first draft
    #[arg(long)]
    no_eval: bool,

    /// Forbidden words file, one word per line
    #[arg(long)]
    forbidden_file: Option<PathBuf>,

    /// Brand voice for the tone evaluator
    #[arg(long)]
    brand_voice: Option<String>,

    /// Show every evaluator report of the final round
    #[arg(long)]
    show_details: bool,

    /// Print the outcome as JSON
    #[arg(long)]
    json: bool,

    /// Chat API base URL (default: COPYLOOP_BASE_URL or https://api.openai.com)
    #[arg(long)]
    base_url: Option<String>,

    /// Model that drafts and revises the copy (default: COPYLOOP_GENERATOR_MODEL)
    #[arg(long)]
    model: Option<String>,

    /// Model behind the judged evaluators (default: COPYLOOP_JUDGE_MODEL)
    #[arg(long)]
    judge_model: Option<String>,

    /// Persist the outcome under <dir>/<run_id>/
    #[arg(long)]
    artifacts_dir: Option<PathBuf>,

    /// Write a Markdown summary to this path
    #[arg(long)]
    markdown: Option<PathBuf>,
}

impl GenerateArgs {
    fn selection(&self) -> EvaluatorSelection {
        if self.no_eval {
            EvaluatorSelection::None
        } else if let Some(names) = &self.eval {
            EvaluatorSelection::Named(names.iter().map(|n| n.trim().to_string()).collect())
        } else if self.fast {
            EvaluatorSelection::FastOnly
        } else {
            EvaluatorSelection::Default
        }
    }

    fn refine_config(&self) -> Result<RefineConfig> {
        let mut config = RefineConfig::from_env().context("Invalid refine configuration")?;
        if let Some(max_iters) = self.max_iters {
            config = config.with_max_iters(max_iters);
        }
        if let Some(threshold) = self.repeat_threshold {
            config = config.with_repeat_threshold(threshold);
        }
        Ok(config)
    }

    fn llm_config(&self) -> LlmConfig {
        let mut config = LlmConfig::from_env();
        if let Some(url) = &self.base_url {
            config = config.with_base_url(url);
        }
        if let Some(model) = &self.model {
            config = config.with_generator_model(model);
        }
        if let Some(model) = &self.judge_model {
            config = config.with_judge_model(model);
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else if cli.quiet {
        Level::WARN
    } else {
        Level::INFO
    };
    copyloop_core::init_tracing(cli.log_json, level);

    match cli.command {
        Commands::Generate(args) => cmd_generate(args).await,
        Commands::Lint { text, fixes } => Ok(if cmd_lint(&text, fixes) {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        }),
        Commands::Evaluators => {
            cmd_evaluators();
            Ok(ExitCode::SUCCESS)
        }
        Commands::Show { run, artifacts_dir } => cmd_show(&run, &artifacts_dir),
    }
}

async fn cmd_generate(args: GenerateArgs) -> Result<ExitCode> {
    let config = args.refine_config()?;
    let registry = EvaluatorRegistry::builtin();

    let llm = args.llm_config();
    let client = Arc::new(ChatClient::new(&llm).context("Failed to configure chat backend")?);

    let mut ctx = EvaluatorContext::default().with_judge(Arc::new(ChatJudge::new(
        client.clone(),
        llm.judge.clone(),
    )));
    if let Some(path) = &args.forbidden_file {
        ctx = ctx.with_forbidden_file(path);
    }
    if let Some(voice) = &args.brand_voice {
        ctx = ctx.with_brand_voice(voice);
    }

    let evaluators = registry
        .resolve(&args.selection(), &ctx)
        .context("Failed to set up evaluators")?;

    let generator = Arc::new(ChatGenerator::new(client, llm.generator.clone()));
    let refine = RefineLoop::new(generator, evaluators, config);

    let (handle, signal) = cancel_pair();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping after the current step");
            handle.cancel();
        }
    });

    let outcome = refine
        .run_with_cancel(&args.scenario, &args.style, &signal)
        .await
        .context("Refinement failed")?;

    emit_outcome(&args, &outcome)?;

    Ok(if outcome.succeeded() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn emit_outcome(args: &GenerateArgs, outcome: &RefineOutcome) -> Result<()> {
    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(outcome).context("Failed to serialize outcome")?
        );
    } else {
        print!("{}", render_outcome_text(outcome, args.show_details));
    }

    if let Some(dir) = &args.artifacts_dir {
        let path = write_run_artifact(outcome, dir)
            .with_context(|| format!("Failed to write run artifact under {:?}", dir))?;
        info!("Run artifact written to {:?}", path);
    }

    if let Some(path) = &args.markdown {
        std::fs::write(path, render_outcome_md(outcome))
            .with_context(|| format!("Failed to write {:?}", path))?;
        info!("Markdown summary written to {:?}", path);
    }
    Ok(())
}

/// Print the lint report; returns whether the text passed.
fn cmd_lint(text: &str, fixes: bool) -> bool {
    let report = lint_short_description(text);
    if report.passed() {
        println!("PASS");
        return true;
    }

    println!("FAIL");
    for error in &report.errors {
        println!("  - {}", error);
    }
    if fixes {
        println!("\nFix: {}", build_fix(&report.errors));
    }
    false
}

fn cmd_evaluators() {
    let registry = EvaluatorRegistry::builtin();
    let defaults = registry.selected_names(&EvaluatorSelection::Default);
    for (name, kind) in registry.describe() {
        let marker = if defaults.iter().any(|d| d == name) {
            "  (default)"
        } else {
            ""
        };
        println!("{:<12} {}{}", name, kind, marker);
    }
}

fn cmd_show(run: &str, artifacts_dir: &Path) -> Result<ExitCode> {
    let outcome = read_run_artifact(run, artifacts_dir)
        .with_context(|| format!("Failed to read run {} from {:?}", run, artifacts_dir))?;
    print!("{}", render_outcome_text(&outcome, true));
    Ok(ExitCode::SUCCESS)
}
