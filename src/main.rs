use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use interview_coach::api::{ApiServer, ApiState};
use interview_coach::voice::AudioCapture;
use interview_coach::{scrape, Config};

/// Interview Coach - voice-driven mock interview assistant
#[derive(Parser)]
#[command(name = "interview-coach", version, about)]
struct Cli {
    /// Port to listen on
    #[arg(long, env = "INTERVIEW_API_PORT", default_value = "5000")]
    port: u16,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Disable voice features (for headless servers without audio hardware)
    #[arg(long, env = "INTERVIEW_DISABLE_VOICE")]
    disable_voice: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch a problem statement and write the plain-text dump
    Scrape {
        /// Problem URL (e.g. <https://leetcode.com/problems/two-sum/>)
        url: String,
    },
    /// Test microphone input
    TestMic {
        /// Duration in seconds
        #[arg(short, long, default_value = "5")]
        duration: u64,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "info,interview_coach=info",
        1 => "info,interview_coach=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    if let Some(cmd) = cli.command {
        return match cmd {
            Command::Scrape { url } => cmd_scrape(&url).await,
            Command::TestMic { duration } => test_mic(duration).await,
        };
    }

    tracing::info!(
        port = cli.port,
        disable_voice = cli.disable_voice,
        "starting interview coach"
    );

    let config = Config::load_with_options(cli.disable_voice)?;
    let state = Arc::new(ApiState::from_config(&config)?);

    tracing::info!(
        transcript = %config.transcript_path.display(),
        "interview coach ready"
    );

    ApiServer::new(state, cli.port).run().await?;
    Ok(())
}

/// Fetch a problem and write the plain-text dump
async fn cmd_scrape(url: &str) -> anyhow::Result<()> {
    let slug = scrape::extract_slug(url)
        .ok_or_else(|| anyhow::anyhow!("invalid problem URL: {url}"))?;

    let config = Config::load()?;
    let client = scrape::LeetCodeClient::new()?;
    let problem = client.fetch_problem(&slug).await?;
    problem.save_to_file(&config.problem_dump_path)?;

    println!(
        "Saved \"{}\" ({}) to {}",
        problem.title,
        problem.difficulty,
        config.problem_dump_path.display()
    );

    Ok(())
}

/// Test microphone input with a simple level meter
async fn test_mic(duration: u64) -> anyhow::Result<()> {
    println!("Testing microphone for {duration} seconds... speak now!\n");

    let mut capture = AudioCapture::new()?;
    capture.start()?;

    for i in 0..duration {
        tokio::time::sleep(Duration::from_secs(1)).await;

        let samples = capture.peek();
        let peak = samples.iter().map(|s| s.abs()).fold(0.0f32, f32::max);

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let meter_len = (peak * 50.0).min(50.0) as usize;
        println!(
            "[{:2}s] peak: {:.4} [{}{}]",
            i + 1,
            peak,
            "#".repeat(meter_len),
            " ".repeat(50 - meter_len)
        );

        capture.drain();
    }

    capture.stop();
    println!("\nIf the meter moved, your microphone is working.");
    Ok(())
}
