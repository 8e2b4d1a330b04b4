use anyhow::{Context, Result};
use awful_aj::{config, template};
use chrono::Utc;
use clap::{Parser, Subcommand};
use sentiment_compass::export::{from_json, write_all_exports};
use sentiment_compass::ingest::read_upload;
use sentiment_compass::render::render_dashboard_text;
use sentiment_compass::viz_export::write_all_viz;
use sentiment_compass::{AwfulJadeService, Dashboard, Outcome, RecordStore, Source};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Sentiment Compass - LLM sentiment audit for text signals
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Output directory for exports and view files (default: "out")
    #[arg(short, long, default_value = "out")]
    output_dir: String,

    /// Path to config file (overrides AJ_CONFIG environment variable)
    #[arg(short, long)]
    config: Option<String>,

    /// Previously exported JSON to seed the session with
    #[arg(long)]
    session: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Classify texts given as arguments (one signal per line), or stdin when none
    Analyze { texts: Vec<String> },
    /// Fetch and classify a synthetic batch of posts about a keyword
    Pulse {
        #[arg(short, long)]
        keyword: String,
        /// Platform to draw posts from; repeatable (default: X, TikTok)
        #[arg(short, long = "platform")]
        platforms: Vec<String>,
    },
    /// Classify the first usable lines of a text file
    Upload { file: PathBuf },
    /// Recompute views and exports for --session without calling the model
    Report,
}

fn resolve_paths() -> Result<(PathBuf, PathBuf, PathBuf)> {
    // 1) Base config dir: prefer env override, else awful_aj::config_dir()
    let base_dir = if let Ok(dir) = std::env::var("AJ_CONFIG_DIR") {
        PathBuf::from(dir)
    } else {
        awful_aj::config_dir().map_err(|e| anyhow::anyhow!(e.to_string()))?
    };

    // 2) Config file: prefer AJ_CONFIG, else <base>/config.yaml
    let cfg_path = if let Ok(p) = std::env::var("AJ_CONFIG") {
        PathBuf::from(p)
    } else {
        base_dir.join("config.yaml")
    };

    // 3) Template dir: prefer AJ_TEMPLATE_DIR, else <base>/templates
    let tpl_dir = if let Ok(p) = std::env::var("AJ_TEMPLATE_DIR") {
        PathBuf::from(p)
    } else {
        let d = base_dir.join("templates");
        // make it visible to awful_aj::template loader
        std::env::set_var("AJ_TEMPLATE_DIR", &d);
        d
    };

    Ok((base_dir, cfg_path, tpl_dir))
}

async fn load_service(config_arg: Option<&str>) -> Result<AwfulJadeService> {
    // Determine config path: CLI arg > resolve_paths logic
    let cfg_path = if let Some(config_path) = config_arg {
        debug!("Using config file from --config argument: {}", config_path);
        PathBuf::from(config_path)
    } else {
        let (_base_dir, cfg_path, _tpl_dir) = resolve_paths()?;
        debug!("Using config file from environment/default: {}", cfg_path.display());
        cfg_path
    };

    if !cfg_path.exists() {
        return Err(anyhow::anyhow!(
            "awful_aj config not found at {}\n\
             Use --config to specify a config file, or set AJ_CONFIG environment variable.\n\
             Example config.yaml:\n\
             api_key: \"YOUR_KEY\"\napi_base: \"http://localhost:5001/v1\"\nmodel: \"qwen3_30b_a3\"\n",
            cfg_path.display()
        ));
    }

    let cfg = config::load_config(
        cfg_path
            .to_str()
            .ok_or_else(|| anyhow::anyhow!("invalid config path"))?,
    )
    .map_err(|e| anyhow::anyhow!(e.to_string()))?;

    // Template by name; loader uses AJ_TEMPLATE_DIR (see templates/sentiment_compass.yaml)
    let tpl_name =
        std::env::var("AJ_TEMPLATE_SENTIMENT").unwrap_or_else(|_| "sentiment_compass".to_string());
    let tpl = template::load_template(&tpl_name)
        .await
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;
    debug!("Loaded template: {}", tpl_name);

    Ok(AwfulJadeService::new(cfg, tpl))
}

fn check_args(args: &Args) -> Result<()> {
    if matches!(args.command, Command::Report) && args.session.is_none() {
        return Err(anyhow::anyhow!("report needs a session: pass --session <exported JSON>"));
    }
    Ok(())
}

fn load_session(path: Option<&Path>) -> Result<RecordStore> {
    let Some(path) = path else {
        return Ok(RecordStore::new());
    };
    let body = std::fs::read_to_string(path).with_context(|| format!("Reading session {}", path.display()))?;
    let records = from_json(&body)?;
    info!("Session loaded - records={}, path={}", records.len(), path.display());
    Ok(RecordStore::from_records(records))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_thread_ids(false)
        .with_line_number(true)
        .init();

    info!("Starting sentiment_compass");

    let args = Args::parse();
    check_args(&args)?;
    let mut dashboard = Dashboard::with_store(load_session(args.session.as_deref())?);

    let outcome = match &args.command {
        Command::Report => None,
        Command::Analyze { texts } => {
            let input = if texts.is_empty() {
                let mut buf = String::new();
                std::io::stdin().read_to_string(&mut buf).context("Reading stdin")?;
                buf
            } else {
                texts.join("\n")
            };
            let service = load_service(args.config.as_deref()).await?;
            Some(dashboard.analyze_text(&service, &input).await)
        }
        Command::Pulse { keyword, platforms } => {
            if !platforms.is_empty() {
                dashboard.set_platforms(platforms.iter().map(|p| Source::parse(p)).collect());
            }
            let service = load_service(args.config.as_deref()).await?;
            Some(dashboard.social_pulse(&service, keyword).await)
        }
        Command::Upload { file } => {
            let contents = read_upload(file)?;
            let service = load_service(args.config.as_deref()).await?;
            Some(dashboard.upload(&service, &contents).await)
        }
    };

    match outcome {
        Some(Outcome::Ingested(n)) => info!("Request completed - ingested={}", n),
        Some(Outcome::Skipped) => info!("Nothing to analyze - empty input"),
        Some(Outcome::Busy) => warn!("Request skipped - analysis already in flight"),
        Some(Outcome::Failed(e)) => warn!("Request failed, store unchanged - error={}", e),
        None => debug!("Report only - no model request"),
    }

    println!("{}", render_dashboard_text(dashboard.records(), dashboard.selected()));

    if dashboard.store().is_empty() {
        info!("Store is empty - skipping exports");
        return Ok(());
    }

    let stamp = Utc::now().timestamp_millis();
    let date_dir = Path::new(&args.output_dir).join(Utc::now().format("%Y-%m-%d").to_string());
    let paths = write_all_exports(&date_dir, stamp, dashboard.records())?;
    write_all_viz(&date_dir, stamp, dashboard.records())?;
    info!(
        "Output persisted - json={}, csv={}, report={}",
        paths.json.display(),
        paths.csv.display(),
        paths.report.display()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_requires_a_session() {
        let args = Args::try_parse_from(["sentiment_compass", "report"]).unwrap();
        assert!(check_args(&args).is_err());

        let args = Args::try_parse_from(["sentiment_compass", "--session", "audit.json", "report"]).unwrap();
        assert!(check_args(&args).is_ok());
    }

    #[test]
    fn analyze_needs_no_session() {
        let args = Args::try_parse_from(["sentiment_compass", "analyze", "Lekker service today"]).unwrap();
        assert!(check_args(&args).is_ok());
    }
}
