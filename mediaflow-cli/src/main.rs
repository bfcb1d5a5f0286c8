//! mediaflow CLI - upload a file, encode it in the cloud, publish the result.

use anyhow::Context;
use clap::{Parser, ValueEnum};
use console::style;
use mediaflow::{
    ClientCredentials, CollisionPolicy, EncodingPreset, JobOrchestrator, PollOptions,
    RestMediaClient, RunNames, Settings,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Collision handling for the output asset name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum CollisionArg {
    /// Create under a suffixed name and continue.
    Rename,
    /// Abort the run.
    Fail,
}

impl From<CollisionArg> for CollisionPolicy {
    fn from(arg: CollisionArg) -> Self {
        match arg {
            CollisionArg::Rename => CollisionPolicy::Rename,
            CollisionArg::Fail => CollisionPolicy::Fail,
        }
    }
}

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(name = "mediaflow")]
#[command(version)]
#[command(about = "Upload, encode, and publish a media file through a cloud encoding account")]
struct Args {
    /// Settings file (JSON); defaults to ./settings.json when present.
    /// Every setting can also come from MEDIAFLOW_* environment variables.
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// Source file to upload (overrides the configured one)
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Base name for the output asset (overrides the configured one)
    #[arg(long)]
    asset_name: Option<String>,

    /// Transform name (overrides the configured one)
    #[arg(long)]
    transform: Option<String>,

    /// Seconds between job polls
    #[arg(long, default_value = "20")]
    poll_interval: u64,

    /// Give up after this many seconds of waiting (0 = wait forever)
    #[arg(long, default_value = "7200")]
    max_wait: u64,

    /// What to do when the output asset name is already taken
    #[arg(long, value_enum, default_value = "rename")]
    collision: CollisionArg,

    /// Delete the job and assets after printing the playback URLs
    #[arg(long)]
    cleanup: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let _ = dotenvy::dotenv();
    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .init();

    let mut settings =
        Settings::load(args.settings.as_deref()).context("failed to load settings")?;
    if let Some(file) = args.file {
        settings.file_to_upload = file;
    }
    if let Some(asset_name) = args.asset_name {
        settings.asset_name = asset_name;
    }
    if let Some(transform) = args.transform {
        settings.transform_name = transform;
    }

    println!();
    println!("{}", style("Configuration:").cyan().bold());
    println!("  Account:      {}", style(&settings.account_name).white());
    println!("  Source:       {}", style(settings.file_to_upload.display()).white());
    println!("  Transform:    {}", style(&settings.transform_name).white());
    println!();

    let credentials = Arc::new(
        ClientCredentials::new(
            &settings.token_endpoint,
            &settings.tenant_id,
            &settings.client_id,
            &settings.client_secret,
            settings.audience(),
        )
        .context("failed to build credentials")?,
    );
    let api = Arc::new(
        RestMediaClient::new(settings.api_url()?, credentials)
            .context("failed to build API client")?,
    );
    tracing::info!(account = %settings.account_name, "connected");

    // Ctrl-C aborts the poll loop instead of killing the process mid-call.
    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, cancelling");
            signal_cancel.cancel();
        }
    });

    let max_wait = match args.max_wait {
        0 => None,
        secs => Some(Duration::from_secs(secs)),
    };
    let poll = PollOptions::default()
        .interval(Duration::from_secs(args.poll_interval))
        .max_wait(max_wait)
        .cancel(cancel);

    let orchestrator = JobOrchestrator::builder()
        .api(api)
        .scope(settings.account_scope())
        .collision_policy(args.collision.into())
        .poll(poll)
        .build()?;

    let names = RunNames::generate(&settings.asset_name);
    let outcome = match orchestrator
        .run(
            &settings.file_to_upload,
            &names,
            &settings.transform_name,
            EncodingPreset::AdaptiveStreaming,
        )
        .await
    {
        Ok(outcome) => outcome,
        Err(e) => {
            eprintln!("{} {e}", style("Error:").red().bold());
            std::process::exit(1);
        }
    };

    println!("{}", style("Encoding complete!").green().bold());
    println!();
    println!("{}", style("Playback URLs:").cyan().bold());
    for url in &outcome.playback_urls {
        println!("  {}", style(url.as_str()).green());
    }
    println!();

    if args.cleanup {
        println!("{}", style("Cleaning up...").cyan());
        orchestrator
            .cleanup(
                &settings.transform_name,
                &outcome.job.name,
                &[outcome.input_asset.clone(), outcome.output_asset.clone()],
                None,
            )
            .await
            .context("cleanup failed")?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collision_arg_mapping() {
        assert_eq!(CollisionPolicy::from(CollisionArg::Rename), CollisionPolicy::Rename);
        assert_eq!(CollisionPolicy::from(CollisionArg::Fail), CollisionPolicy::Fail);
    }

    #[test]
    fn test_args_parse_defaults() {
        let args = Args::parse_from(["mediaflow"]);
        assert_eq!(args.poll_interval, 20);
        assert_eq!(args.max_wait, 7200);
        assert_eq!(args.collision, CollisionArg::Rename);
        assert!(!args.cleanup);
    }

    #[test]
    fn test_args_parse_overrides() {
        let args = Args::parse_from([
            "mediaflow",
            "--file",
            "clip.mp4",
            "--collision",
            "fail",
            "--max-wait",
            "0",
            "--cleanup",
        ]);
        assert_eq!(args.file, Some(PathBuf::from("clip.mp4")));
        assert_eq!(args.collision, CollisionArg::Fail);
        assert_eq!(args.max_wait, 0);
        assert!(args.cleanup);
    }
}
