use clap::Parser;
use colored::*;
use eyre::{Context, Result, bail};
use log::info;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::Arc;

mod cli;
mod config;

use algoviz::domain::{Attempt, AttemptOutcome, GenerationRequest, LoopResult, TemplateMode};
use algoviz::generator::LlmCodeGenerator;
use algoviz::llm::{GeminiClient, LlmClient};
use algoviz::metaphor::MetaphorDesigner;
use algoviz::prompt::{BaseClass, PromptBuilder, PromptLoader, defaults};
use algoviz::render::{ManimRenderer, RenderWorkspace, display_artifact};
use algoviz::runner::RepairLoop;
use algoviz::storage::JsonlFailureLog;
use cli::Cli;
use cli::commands::{Commands, GenerateArgs};
use config::Config;

/// Environment variable the generated scene reads its input from
const INPUT_DATA_ENV: &str = "ALGO_USER_INPUT_DATA";

fn setup_logging() -> Result<()> {
    // Create log directory
    let log_dir = config::data_dir().join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("algoviz.log");

    // Setup env_logger with file output
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

async fn run_application(cli: &Cli, config: &Config) -> Result<()> {
    info!("Starting application");

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
    }

    match &cli.command {
        None => handle_generate(&GenerateArgs::default(), config, cli.is_verbose()).await,
        Some(Commands::Generate(args)) => handle_generate(args, config, cli.is_verbose()).await,
        Some(Commands::Design {
            algorithm,
            data,
            output,
        }) => handle_design(algorithm.as_deref(), data.as_deref(), output.as_deref(), config).await,
    }
}

/// Read one trimmed line from stdin after printing `label`
fn ask(label: &str) -> Result<String> {
    print!("{}", label.cyan());
    io::stdout().flush().context("Failed to flush stdout")?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line).context("Failed to read from stdin")?;
    Ok(line.trim().to_string())
}

fn gather_input(algorithm: Option<&str>, data: Option<&str>) -> Result<(String, String)> {
    let algorithm = match algorithm {
        Some(a) => a.trim().to_string(),
        None => ask("Algorithm name (e.g. Bubble Sort): ")?,
    };
    let data = match data {
        Some(d) => d.trim().to_string(),
        None => ask("Input data (e.g. [8, 2, 6, 4]): ")?,
    };

    if algorithm.is_empty() || data.is_empty() {
        bail!("Algorithm name and input data must not be empty");
    }
    Ok((algorithm, data))
}

fn prompt_loader(config: &Config) -> PromptLoader {
    match &config.prompts.templates_dir {
        Some(dir) => PromptLoader::new(dir),
        None => PromptLoader::builtin(),
    }
}

fn gemini_client(config: &Config) -> Result<Arc<GeminiClient>> {
    let client = GeminiClient::from_env(&config.llm.api_key_env, config.llm.gemini()).with_context(|| {
        format!(
            "Set {} to your Gemini API key before running algoviz",
            config.llm.api_key_env
        )
    })?;
    Ok(Arc::new(client))
}

async fn handle_generate(args: &GenerateArgs, config: &Config, verbose: bool) -> Result<()> {
    println!("{}", "--- algoviz: AI algorithm animation generator ---".bold());
    let (algorithm, data) = gather_input(args.algorithm.as_deref(), args.data.as_deref())?;

    let mode = args.mode.unwrap_or_default();
    let max_attempts = args.max_attempts.unwrap_or(config.repair.max_attempts);
    let review = args.review || config.repair.review;
    let open_video = config.render.open_video && !args.no_open;
    let workspace_dir = args
        .workspace
        .clone()
        .unwrap_or_else(|| config.render.workspace_dir.clone());

    let llm = gemini_client(config)?;
    let loader = prompt_loader(config);

    let mut request = GenerationRequest::from_user_input(&algorithm, &data).with_mode(mode);
    if let Some(spec) = visual_spec(args, &loader, &llm, &algorithm, &data).await? {
        request = request.with_visual_spec(spec);
    }

    let full = BaseClass::load(TemplateMode::Full, config.prompts.full_base_class.as_deref())
        .context("Failed to load full-mode base class")?;
    let simple = BaseClass::load(TemplateMode::Simple, config.prompts.simple_base_class.as_deref())
        .context("Failed to load simple-mode base class")?;
    let prompts = PromptBuilder::from_loader(&loader, &config.render.scene_class, full, simple)
        .context("Failed to load generation template")?;
    let base = prompts.base_class(mode).clone();

    let workspace = RenderWorkspace::new(&workspace_dir, &config.render.source_file, &config.render.scene_class)
        .with_env(INPUT_DATA_ENV, request.input_data_text());
    workspace
        .install(&base.file_name(), &base.source)
        .with_context(|| format!("Failed to install {} into {}", base.file_name(), workspace_dir.display()))?;

    let mut generator = LlmCodeGenerator::new(llm.clone(), config.generator());
    if review {
        let template = loader.load(defaults::REVIEW).context("Failed to load review template")?;
        generator = generator.with_review(template, base);
    }

    let recorder = JsonlFailureLog::new(&config.log.failure_log_dir).context("Failed to open failure log")?;
    info!("Recording failed attempts in {}", recorder.path().display());

    let repair_loop = RepairLoop::new(
        Arc::new(generator),
        Arc::new(ManimRenderer::new(config.render.manim())),
        Arc::new(recorder),
        prompts,
    )
    .on_attempt(move |attempt| report_attempt(attempt, max_attempts, verbose));

    println!(
        "Generating {} ({} mode) with {}, up to {} attempt(s)...",
        algorithm.bold(),
        mode,
        llm.model(),
        max_attempts
    );
    println!("{}", "Rendering with Manim can take a while.".dimmed());

    let result = repair_loop
        .run(&request, &workspace, max_attempts)
        .await
        .context("Repair loop could not start")?;

    report_result(&result, &workspace, verbose)?;

    if let Some(artifact) = &result.artifact_path {
        if open_video {
            open_artifact(artifact);
        }
    }
    Ok(())
}

async fn visual_spec(
    args: &GenerateArgs,
    loader: &PromptLoader,
    llm: &Arc<GeminiClient>,
    algorithm: &str,
    data: &str,
) -> Result<Option<String>> {
    if let Some(path) = &args.visual_spec {
        let spec = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
        return Ok(Some(spec));
    }

    if !args.design {
        return Ok(None);
    }

    println!("{}", "Designing a visual metaphor...".cyan());
    let designer = MetaphorDesigner::from_loader(llm.clone(), loader).context("Failed to load metaphor template")?;
    match designer.design(algorithm, data).await {
        Ok(metaphor) => {
            println!("{} {}", "Visual metaphor:".green(), metaphor.metaphor_explanation);
            Ok(Some(metaphor.to_json()?))
        }
        Err(e) => {
            log::warn!("Visual metaphor design failed: {}", e);
            println!("{} {}; continuing without it", "Visual metaphor design failed:".yellow(), e);
            Ok(None)
        }
    }
}

fn report_attempt(attempt: &Attempt, max_attempts: u32, verbose: bool) {
    let label = format!("Attempt {}/{}", attempt.index, max_attempts);
    match attempt.outcome {
        AttemptOutcome::Success => {
            println!("{} {} ({} ms)", label.green(), "rendered".green(), attempt.duration_ms);
        }
        AttemptOutcome::RenderError => {
            println!("{} {}", label.yellow(), "failed to render".yellow());
            if let Some(error) = &attempt.error_text {
                print_transcript(error, verbose);
            }
        }
        AttemptOutcome::GenerationError => {
            println!(
                "{} {} {}",
                label.red(),
                "could not generate code:".red(),
                attempt.error_text.as_deref().unwrap_or("unknown error")
            );
        }
    }
}

/// Last lines of a transcript, or all of it in verbose mode
fn print_transcript(transcript: &str, verbose: bool) {
    let lines: Vec<&str> = transcript.lines().collect();
    let shown = if verbose { 0 } else { lines.len().saturating_sub(8) };
    if shown > 0 {
        println!("    {}", format!("... {} more line(s)", shown).dimmed());
    }
    for line in &lines[shown..] {
        println!("    {}", line.dimmed());
    }
}

fn report_result(result: &LoopResult, workspace: &RenderWorkspace, verbose: bool) -> Result<()> {
    println!("{}", "=".repeat(50));
    let source_path = workspace.source_path();

    if let Some(artifact) = &result.artifact_path {
        println!("{} {}", "Animation rendered:".green().bold(), display_artifact(artifact));
        println!("{} {}", "Generated code:".green(), source_path.display());
        return Ok(());
    }

    if result.stopped_by_generation_failure() {
        println!(
            "{} {}",
            "Could not generate valid Manim code:".red().bold(),
            result.last_error().unwrap_or("unknown error")
        );
        println!("Check your input and your API key.");
        bail!("Code generation failed after {} attempt(s)", result.attempts.len());
    }

    println!(
        "{}",
        format!("Manim could not render the animation after {} attempt(s).", result.attempts.len())
            .red()
            .bold()
    );
    if let Some(error) = result.last_error() {
        println!("Last error reported by Manim:");
        println!("{}", "-".repeat(50));
        print_transcript(error, verbose);
        println!("{}", "-".repeat(50));
    }
    if result.last_source().is_some() {
        println!("{} {}", "Last generated code:".yellow(), source_path.display());
    }
    bail!("Render failed after {} attempt(s)", result.attempts.len())
}

/// Open the video with the platform's default player
fn open_artifact(path: &Path) {
    let mut command = if cfg!(target_os = "windows") {
        let mut c = std::process::Command::new("cmd");
        c.args(["/C", "start", ""]);
        c
    } else if cfg!(target_os = "macos") {
        std::process::Command::new("open")
    } else {
        std::process::Command::new("xdg-open")
    };

    if let Err(e) = command.arg(path).spawn() {
        log::warn!("Failed to open {}: {}", path.display(), e);
        println!("{}", "Could not open the video automatically; open it manually.".yellow());
    }
}

async fn handle_design(
    algorithm: Option<&str>,
    data: Option<&str>,
    output: Option<&Path>,
    config: &Config,
) -> Result<()> {
    let (algorithm, data) = gather_input(algorithm, data)?;
    let llm = gemini_client(config)?;
    let designer =
        MetaphorDesigner::from_loader(llm, &prompt_loader(config)).context("Failed to load metaphor template")?;

    println!("Designing a visual metaphor for {}...", algorithm.bold());
    let metaphor = designer
        .design(&algorithm, &data)
        .await
        .context("Visual metaphor design failed")?;
    let json = metaphor.to_json()?;

    match output {
        Some(path) => {
            fs::write(path, &json).with_context(|| format!("Failed to write {}", path.display()))?;
            println!("{} {}", "Design written to".green(), path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Setup logging first
    setup_logging().context("Failed to setup logging")?;

    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    info!("Starting with config from: {:?}", cli.config);

    // Run the main application logic
    run_application(&cli, &config).await.context("Application failed")?;

    Ok(())
}
