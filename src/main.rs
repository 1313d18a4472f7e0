use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use manual_qa::assistant::interpret_response;
use manual_qa::pages::Cell;
use manual_qa::{
    Answer, AssistantError, GeminiClientBuilder, ManualAssistant, ModelError, PageCollection,
    PageError, ParseError, Selection, SkippedInput, select,
};
use serde_json::Value;

/// mqa - ask questions about a machine manual
#[derive(Parser)]
#[command(name = "mqa")]
#[command(about = "Answer questions about a machine manual and show the cited pages")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// Ask the model a question about the manual
    Ask(AskCommand),
    /// Interpret a saved model response without calling the model
    Parse(ParseCommand),
    /// Check page numbers against a page count
    Select(SelectCommand),
}

/// Ask a question
#[derive(Parser)]
struct AskCommand {
    /// The question to ask
    #[arg(value_name = "QUESTION")]
    question: String,

    /// Directory holding the manual's page images
    #[arg(short, long, value_name = "DIR")]
    pages: PathBuf,

    /// Number of columns in the page grid
    #[arg(short, long, default_value_t = 3)]
    columns: usize,

    /// Model name (overrides GEMINI_MODEL)
    #[arg(short, long)]
    model: Option<String>,

    /// Cached content resource name (overrides GEMINI_CACHED_CONTENT)
    #[arg(long, value_name = "NAME")]
    cached_content: Option<String>,
}

/// Interpret a saved response
#[derive(Parser)]
struct ParseCommand {
    /// Directory holding the manual's page images
    #[arg(short, long, value_name = "DIR")]
    pages: PathBuf,

    /// File holding the raw response; reads stdin when omitted
    #[arg(short, long, value_name = "FILE")]
    input: Option<PathBuf>,

    /// Number of columns in the page grid
    #[arg(short, long, default_value_t = 3)]
    columns: usize,
}

/// Check page numbers
#[derive(Parser)]
struct SelectCommand {
    /// Number of pages in the manual
    #[arg(short, long)]
    total_pages: usize,

    /// Number of columns in the page grid
    #[arg(short, long, default_value_t = 3)]
    columns: usize,

    /// Requested pages; JSON literals are parsed, anything else is a string
    #[arg(value_name = "VALUE", allow_hyphen_values = true)]
    values: Vec<String>,
}

fn main() {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let result = match &cli.command {
        Commands::Ask(cmd) => handle_ask(cmd),
        Commands::Parse(cmd) => handle_parse(cmd),
        Commands::Select(cmd) => handle_select(cmd),
    };

    if let Err(e) = result {
        // Determine exit code based on error type
        let exit_code = if is_user_error(&e) { 1 } else { 2 };
        eprintln!("Error: {e:#}");
        std::process::exit(exit_code);
    }
}

/// Determines if an error is a user error (vs internal error).
///
/// User errors are bad input or configuration, such as a response without an
/// answer, an invalid column count, an empty page directory or a missing API key.
/// Network, I/O and API failures are internal errors.
fn is_user_error(error: &anyhow::Error) -> bool {
    if error.to_string().contains("cannot be empty") {
        return true;
    }

    error.chain().any(|cause| {
        if let Some(e) = cause.downcast_ref::<AssistantError>() {
            return match e {
                AssistantError::Parse(_) => true,
                AssistantError::Pages(e) => is_user_page_error(e),
                AssistantError::Model(e) => is_user_model_error(e),
            };
        }
        cause.downcast_ref::<ParseError>().is_some()
            || cause.downcast_ref::<PageError>().is_some_and(is_user_page_error)
            || cause.downcast_ref::<ModelError>().is_some_and(is_user_model_error)
    })
}

fn is_user_page_error(error: &PageError) -> bool {
    matches!(
        error,
        PageError::InvalidColumns { .. } | PageError::NoPages { .. }
    )
}

fn is_user_model_error(error: &ModelError) -> bool {
    matches!(error, ModelError::MissingApiKey | ModelError::InvalidUrl(_))
}

/// Handles the ask command by querying the model.
fn handle_ask(cmd: &AskCommand) -> Result<()> {
    if cmd.question.trim().is_empty() {
        anyhow::bail!("Question cannot be empty");
    }

    let pages = load_pages(&cmd.pages)?;

    let mut builder = GeminiClientBuilder::new();
    if let Some(model) = &cmd.model {
        builder = builder.model(model);
    }
    if let Some(name) = &cmd.cached_content {
        builder = builder.cached_content(name);
    }
    let client = builder.build().context("Failed to configure Gemini client")?;

    let assistant = ManualAssistant::new(Arc::new(client));
    let answer = assistant
        .ask(&cmd.question, &pages, cmd.columns)
        .context("Failed to answer question")?;

    write_answer(&mut io::stdout().lock(), &answer, &pages)?;
    Ok(())
}

/// Handles the parse command by interpreting a saved response.
fn handle_parse(cmd: &ParseCommand) -> Result<()> {
    let raw = match &cmd.input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read response file: {}", path.display()))?,
        None => {
            let mut raw = String::new();
            io::stdin()
                .read_to_string(&mut raw)
                .context("Failed to read response from stdin")?;
            raw
        }
    };

    let pages = load_pages(&cmd.pages)?;
    let answer = interpret_response(&raw, pages.len(), cmd.columns)
        .context("Failed to interpret response")?;

    write_answer(&mut io::stdout().lock(), &answer, &pages)?;
    Ok(())
}

/// Handles the select command by validating literal page values.
fn handle_select(cmd: &SelectCommand) -> Result<()> {
    let requested: Vec<Value> = cmd.values.iter().map(|v| parse_value(v)).collect();
    let selection = select(cmd.total_pages, &requested, cmd.columns)?;

    write_selection(&mut io::stdout().lock(), &selection)?;
    Ok(())
}

fn load_pages(dir: &Path) -> Result<PageCollection> {
    PageCollection::load(dir)
        .with_context(|| format!("Failed to load manual pages from {}", dir.display()))
}

/// Parses a command-line value as JSON, falling back to a plain string.
fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn write_answer(out: &mut impl Write, answer: &Answer, pages: &PageCollection) -> io::Result<()> {
    writeln!(out, "{}", answer.text())?;
    writeln!(out)?;

    match answer.grid(pages) {
        Some(grid) => {
            write!(out, "{grid}")?;
            writeln!(out, "Files:")?;
            for cell in grid.cells() {
                if let Cell::Page { index, content } = cell {
                    writeln!(out, "  p.{index} {}", content.path().display())?;
                }
            }
        }
        None if !answer.parsed().has_page_references() => {
            writeln!(out, "The answer cites no pages.")?
        }
        None => writeln!(out, "No valid pages to display.")?,
    }

    write_skipped(out, answer.skipped_inputs())
}

fn write_selection(out: &mut impl Write, selection: &Selection) -> io::Result<()> {
    match selection.display_request() {
        Some(request) => {
            let valid: Vec<String> = request
                .valid_indexes()
                .iter()
                .map(ToString::to_string)
                .collect();
            writeln!(out, "Valid: {}", valid.join(", "))?;
        }
        None => writeln!(out, "No valid pages to display.")?,
    }

    write_skipped(out, selection.skipped_inputs())
}

fn write_skipped(out: &mut impl Write, skipped: &[SkippedInput]) -> io::Result<()> {
    if skipped.is_empty() {
        return Ok(());
    }
    writeln!(out, "Skipped:")?;
    for input in skipped {
        writeln!(out, "  {input}")?;
    }
    Ok(())
}
