//! CLI binary for fridge2list.
//!
//! A thin collaborator over the library: reads the diet plan and the photo,
//! runs one analysis, prints the list, and optionally keeps an interactive
//! checklist open.

use anyhow::{Context, Result};
use clap::Parser;
use fridge2list::pipeline::input::read_file;
use fridge2list::{
    extract_diet_plan, AnalysisConfig, AnalysisProgressCallback, ConversationalClient,
    InferenceClient, ProgressCallback, ResponseMode, Session, ShoppingList, StructuredClient,
    DEFAULT_DAYS,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Spinner shown while the diet plan is read and while the provider thinks.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  ⏱ {elapsed}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Preparing");
        bar.set_message("Reading diet plan…");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl AnalysisProgressCallback for CliProgressCallback {
    fn on_extraction_complete(&self, pages: usize, chars: usize) {
        self.bar.println(format!(
            "  {} Diet plan read  {}",
            green("✓"),
            dim(&format!("{pages} pages, {chars} chars"))
        ));
    }

    fn on_analysis_start(&self, days: u8) {
        // A retry from the interactive loop starts on a finished bar.
        if self.bar.is_finished() {
            self.bar.reset();
            self.bar.enable_steady_tick(Duration::from_millis(80));
        }
        self.bar.set_prefix("Analysing");
        self.bar
            .set_message(format!("checking the fridge against {days} days of meals…"));
    }

    fn on_analysis_complete(&self, categories: usize, items: usize) {
        self.bar.finish_and_clear();
        eprintln!(
            "{} Shopping list ready  {}",
            green("✔"),
            dim(&format!("{categories} categories, {items} items"))
        );
    }

    fn on_analysis_error(&self, error: &str) {
        self.bar.finish_and_clear();
        eprintln!("{} {}", red("✘"), red(error));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Free-text list for three days (OpenAI)
  fridge2list diet.pdf --photo fridge.jpg

  # Structured list for five days (Gemini), as JSON
  fridge2list diet.pdf --photo fridge.jpg --days 5 --provider gemini --json

  # Tick items off while shopping
  fridge2list diet.pdf --photo fridge.jpg --provider gemini --interactive

  # Show the text extracted from the diet plan (no API key needed)
  fridge2list diet.pdf --print-diet

INTERACTIVE COMMANDS:
  <n>   toggle item number n
  r     re-run the analysis with the same photo
  c     clear the list
  q     quit

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          Credential for --provider openai
  GEMINI_API_KEY          Credential for --provider gemini (GOOGLE_API_KEY also accepted)
  PDFIUM_LIB_PATH         Path to an existing libpdfium
  RUST_LOG                Override the log filter
"#;

/// Turn a diet plan and a fridge photo into a shopping list.
#[derive(Parser, Debug)]
#[command(
    name = "fridge2list",
    version,
    about = "Turn a diet plan PDF and a fridge photo into a shopping list using Vision LLMs",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Diet plan PDF.
    diet: PathBuf,

    /// Photo of the refrigerator contents (JPEG or PNG).
    #[arg(short, long, env = "FRIDGE2LIST_PHOTO", required_unless_present = "print_diet")]
    photo: Option<PathBuf>,

    /// Number of days to shop for (1–7).
    #[arg(short, long, env = "FRIDGE2LIST_DAYS", default_value_t = DEFAULT_DAYS,
          value_parser = clap::value_parser!(u8).range(1..=7))]
    days: u8,

    /// Inference provider.
    #[arg(long, env = "FRIDGE2LIST_PROVIDER", value_enum, default_value = "openai")]
    provider: ProviderArg,

    /// Response mode; defaults to the provider's natural mode.
    #[arg(long, env = "FRIDGE2LIST_MODE", value_enum)]
    mode: Option<ModeArg>,

    /// Model ID (default: gpt-4o for openai, gemini-2.0-flash for gemini).
    #[arg(long, env = "FRIDGE2LIST_MODEL")]
    model: Option<String>,

    /// Max output tokens for the list.
    #[arg(long, env = "FRIDGE2LIST_MAX_TOKENS", default_value_t = 1500)]
    max_tokens: usize,

    /// Sampling temperature (0.0–2.0).
    #[arg(long, env = "FRIDGE2LIST_TEMPERATURE", default_value_t = 0.2)]
    temperature: f32,

    /// Provider call timeout in seconds.
    #[arg(long, env = "FRIDGE2LIST_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,

    /// Longest photo edge sent to the structured provider, in pixels.
    #[arg(long, env = "FRIDGE2LIST_MAX_IMAGE_DIMENSION", default_value_t = 2048)]
    max_image_dimension: u32,

    /// Print the list as JSON.
    #[arg(long, env = "FRIDGE2LIST_JSON")]
    json: bool,

    /// Keep an interactive checklist open after the analysis.
    #[arg(short, long)]
    interactive: bool,

    /// Print the extracted diet text and exit.
    #[arg(long)]
    print_diet: bool,

    /// Disable the spinner.
    #[arg(long, env = "FRIDGE2LIST_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "FRIDGE2LIST_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "FRIDGE2LIST_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum ProviderArg {
    Openai,
    Gemini,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum ModeArg {
    FreeText,
    Structured,
}

impl From<ModeArg> for ResponseMode {
    fn from(v: ModeArg) -> Self {
        match v {
            ModeArg::FreeText => ResponseMode::FreeText,
            ModeArg::Structured => ResponseMode::Structured,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner provides all the feedback that matters; keep library logs
    // quiet while it is shown.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.print_diet;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Print-diet mode ──────────────────────────────────────────────────
    if cli.print_diet {
        let bytes = read_file(&cli.diet).await.context("Failed to read diet plan")?;
        let plan = extract_diet_plan(bytes)
            .await
            .context("Failed to extract diet plan text")?;
        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&plan).context("Failed to serialise diet plan")?
            );
        } else {
            println!("{}", plan.text());
        }
        return Ok(());
    }

    // ── Build config and client ──────────────────────────────────────────
    // The client is built before anything else is read so a missing
    // credential stops the process immediately.
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn AnalysisProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;
    let client = build_client(cli.provider, &config)?;

    let photo_path = cli
        .photo
        .as_ref()
        .context("--photo is required unless --print-diet is given")?;

    let mut session = Session::new(config);

    let diet_bytes = read_file(&cli.diet).await.context("Failed to read diet plan")?;
    session
        .load_document(diet_bytes)
        .await
        .context("Failed to load diet plan")?;

    let photo = read_file(photo_path).await.context("Failed to read photo")?;

    let result = session.analyze(client.as_ref(), photo.clone(), cli.days).await;
    if let Err(e) = result {
        if cli.interactive && e.is_retryable() {
            eprintln!("{}", dim("Type r to try again, q to quit."));
        } else {
            return Err(e).context("Analysis failed");
        }
    }

    print_list(&session, cli.json)?;
    if let Some(stats) = session.last_stats() {
        if !cli.quiet && !cli.json {
            eprintln!(
                "   {} tokens in  /  {} tokens out  /  {}ms",
                dim(&stats.input_tokens.to_string()),
                dim(&stats.output_tokens.to_string()),
                stats.duration_ms,
            );
        }
    }

    if cli.interactive {
        run_interactive(&mut session, client.as_ref(), &photo, cli.days).await?;
    }

    Ok(())
}

/// Map CLI args to `AnalysisConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<AnalysisConfig> {
    let mut builder = AnalysisConfig::builder()
        .max_tokens(cli.max_tokens)
        .temperature(cli.temperature)
        .api_timeout_secs(cli.api_timeout)
        .max_image_dimension(cli.max_image_dimension);

    if let Some(ref model) = cli.model {
        builder = builder.model(model.clone());
    }
    if let Some(mode) = cli.mode {
        builder = builder.response_mode(mode.into());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

fn build_client(provider: ProviderArg, config: &AnalysisConfig) -> Result<Box<dyn InferenceClient>> {
    Ok(match provider {
        ProviderArg::Openai => Box::new(
            ConversationalClient::from_env(config).context("Provider setup failed")?,
        ),
        ProviderArg::Gemini => Box::new(
            StructuredClient::from_env(config).context("Provider setup failed")?,
        ),
    })
}

/// Print the current list: Markdown checklist or JSON.
fn print_list(session: &Session, json: bool) -> Result<()> {
    let Some(list) = session.shopping_list() else {
        return Ok(());
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();

    if json {
        let value = serde_json::to_string_pretty(list).context("Failed to serialise list")?;
        writeln!(out, "{value}").context("Failed to write to stdout")?;
        return Ok(());
    }

    match list {
        ShoppingList::FreeText(text) => {
            writeln!(out, "{}", text.trim_end()).context("Failed to write to stdout")?;
        }
        ShoppingList::Categorized(_) if list.is_empty() => {
            writeln!(out, "Nothing to buy, the fridge covers the plan.")
                .context("Failed to write to stdout")?;
        }
        ShoppingList::Categorized(_) => {
            let mut current = "";
            for (n, entry) in session.checklist().entries().iter().enumerate() {
                if entry.category != current {
                    if !current.is_empty() {
                        writeln!(out)?;
                    }
                    writeln!(out, "## {}", entry.category)?;
                    current = entry.category;
                }
                let mark = if entry.acquired { "x" } else { " " };
                writeln!(out, "{:>3}. [{mark}] {}", n + 1, entry.item)?;
            }
        }
    }
    Ok(())
}

/// Read commands from stdin until `q` or EOF.
async fn run_interactive(
    session: &mut Session,
    client: &dyn InferenceClient,
    photo: &[u8],
    days: u8,
) -> Result<()> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        eprint!("{} ", bold(">"));
        io::stderr().flush().ok();

        let Some(line) = lines.next() else {
            return Ok(());
        };
        let line = line.context("Failed to read stdin")?;
        let command = line.trim();

        match command {
            "q" | "quit" => return Ok(()),
            "c" | "clear" => {
                session.clear();
                eprintln!("{}", dim("List cleared. Type r to analyse again."));
            }
            "r" | "retry" => {
                match session.analyze(client, photo.to_vec(), days).await {
                    Ok(_) => print_list(session, false)?,
                    Err(e) if e.is_retryable() => {
                        eprintln!("{}", dim("Type r to try again, q to quit."));
                    }
                    Err(e) => return Err(e).context("Analysis failed"),
                }
            }
            "" => {}
            other => match other.parse::<usize>() {
                Ok(n) if n >= 1 => {
                    let target = session
                        .checklist()
                        .entries()
                        .get(n - 1)
                        .map(|e| (e.category.to_string(), e.item.to_string()));
                    match target {
                        Some((category, item)) => {
                            session.toggle(&category, &item);
                            print_list(session, false)?;
                        }
                        None => eprintln!("{}", red(&format!("No item {n}"))),
                    }
                }
                _ => eprintln!("{}", dim("Commands: <n> toggle, r retry, c clear, q quit")),
            },
        }
    }
}
