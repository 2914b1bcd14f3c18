use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use yomi::chat_log::{ChatLog, RecentLog};
use yomi::commands::LOGS_MAX_CHARS;
use yomi::style::read_transcript;
use yomi::{Config, Daemon, Error, PersonaArtifact, StyleExtractor};

/// Yomi - a Telegram chat bot that texts in your style
#[derive(Parser)]
#[command(name = "yomi", version, about)]
struct Cli {
    /// Path to a TOML config file
    #[arg(short, long, global = true, env = "YOMI_CONFIG")]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Start the bot (default)
    Run,
    /// Build the persona artifact from a chat transcript
    Extract {
        /// Transcript file with lines like `[date, time] speaker: message`
        #[arg(short, long, default_value = "chat.txt")]
        transcript: PathBuf,
        /// Speaker label whose messages are sampled
        #[arg(short, long)]
        speaker: Option<String>,
        /// Where to write the artifact (defaults to the configured persona path)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the most recent chat log lines
    Logs {
        /// Number of lines to show
        #[arg(short = 'n', long, default_value = "40")]
        lines: usize,
    },
    /// Print exchange counts from the chat log
    Stats,
}

#[tokio::main]
async fn main() -> ExitCode {
    // .env is optional
    let dotenv = dotenvy::dotenv();

    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,yomi=info",
        1 => "info,yomi=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    if let Ok(path) = dotenv {
        tracing::debug!(path = %path.display(), "loaded .env");
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load(cli.config.as_deref())?;

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => {
            tracing::info!("starting yomi bot");
            Daemon::new(config)?.run().await?;
            Ok(())
        }
        Command::Extract {
            transcript,
            speaker,
            output,
        } => {
            let speaker = speaker.unwrap_or_else(|| config.speaker.clone());
            let output = output.unwrap_or_else(|| config.persona_path.clone());
            cmd_extract(&transcript, &speaker, &output)
        }
        Command::Logs { lines } => cmd_logs(&config, lines),
        Command::Stats => cmd_stats(&config),
    }
}

fn cmd_extract(transcript: &Path, speaker: &str, output: &Path) -> anyhow::Result<()> {
    tracing::info!(path = %transcript.display(), speaker, "reading transcript");
    let text = read_transcript(transcript)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", transcript.display()))?;

    let extraction = StyleExtractor::new(speaker)?.extract(&text);
    let report = extraction.report;

    tracing::info!(
        matched = report.matched,
        unique = report.unique,
        "found messages from {speaker}"
    );
    tracing::info!(
        early = report.early,
        middle = report.middle,
        recent = report.recent,
        early_span = ?report.early_span,
        middle_span = ?report.middle_span,
        recent_span = ?report.recent_span,
        "style bands"
    );

    if extraction.examples.is_empty() {
        return Err(Error::NoMessages {
            speaker: speaker.to_string(),
        }
        .into());
    }

    let artifact = PersonaArtifact::render(speaker, &extraction.texts());
    artifact.write(output)?;

    let preview: Vec<&str> = extraction
        .examples
        .iter()
        .take(5)
        .map(|m| m.text.as_str())
        .collect();
    tracing::info!(
        examples = report.examples,
        output = %output.display(),
        preview = ?preview,
        "persona artifact ready"
    );
    Ok(())
}

fn cmd_logs(config: &Config, lines: usize) -> anyhow::Result<()> {
    let log = ChatLog::open(&config.logs_dir)?;
    match log.recent(lines, LOGS_MAX_CHARS)? {
        RecentLog::Missing => println!("No log file found in {}", log.dir().display()),
        RecentLog::Empty => println!("No conversations logged yet."),
        RecentLog::Lines(text) => println!("{text}"),
    }
    Ok(())
}

fn cmd_stats(config: &Config) -> anyhow::Result<()> {
    let log = ChatLog::open(&config.logs_dir)?;
    let stats = log.stats(Utc::now().date_naive())?;
    println!("Total messages: {}", stats.total);
    println!("Today's messages: {}", stats.today);
    Ok(())
}
