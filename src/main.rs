use anyhow::Context;
use chase_source::config::Settings;
use chase_source::models::InputText;
use chase_source::pipeline::{cancel_pair, LlmCompletion, Pipeline, PipelineOptions, TavilySearch};
use clap::Parser;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tracing_subscriber::fmt;

/// Trace a claim back to the sources that support or contradict it.
#[derive(Parser)]
#[command(name = "chase-source")]
#[command(version)]
struct Cli {
    /// URL the text was taken from; results from that site are ignored
    #[arg(long)]
    origin_url: Option<String>,

    /// Cancel the run after this many seconds (defaults to CHASE_RUN_TIMEOUT_SECS)
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Print the verdict on a single line
    #[arg(long)]
    compact: bool,

    /// Text to check; read from stdin when omitted
    text: Option<String>,
}

fn init_logging(settings: &Settings) {
    fmt()
        .with_env_filter(settings.log_filter())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn read_text(arg: Option<String>) -> anyhow::Result<String> {
    match arg {
        Some(text) => Ok(text),
        None => {
            let mut buf = String::new();
            tokio::io::stdin()
                .read_to_string(&mut buf)
                .await
                .context("failed to read text from stdin")?;
            Ok(buf)
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    let settings = Settings::from_env()?;
    init_logging(&settings);

    let input = InputText::parse(&read_text(cli.text).await?)?;

    let pipeline = Pipeline::new(
        LlmCompletion::from_settings(&settings),
        TavilySearch::from_settings(&settings)?,
        PipelineOptions::from(&settings),
    );

    let timeout = Duration::from_secs(cli.timeout_secs.unwrap_or(settings.run_timeout_secs));
    let (handle, token) = cancel_pair();
    let timer = tokio::spawn(async move {
        tokio::time::sleep(timeout).await;
        tracing::warn!(secs = timeout.as_secs(), "run timed out, cancelling");
        handle.cancel();
    });

    let report = pipeline
        .run(input, cli.origin_url.as_deref(), &token)
        .await;
    timer.abort();

    for error in &report.errors {
        tracing::warn!(run_id = %report.run_id, %error, "non-fatal error");
    }

    let json = if cli.compact {
        serde_json::to_string(&report.verdict)?
    } else {
        serde_json::to_string_pretty(&report.verdict)?
    };
    println!("{json}");
    Ok(())
}
