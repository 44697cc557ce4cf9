//! stagewatch CLI: follow documents through the grading pipeline.
//!
//! Usage:
//!   stagewatch watch --exam KEY[:CONSUMERS]... [--exams-file list.json] [--config path]
//!   stagewatch infer STATUS [--chunks N]
//!   stagewatch config [--config path]

use clap::{Parser, Subcommand};
use stagewatch::config::default_config_path;
use stagewatch::exam::parse_exam_list;
use stagewatch::{
    infer_stage, Config, PollConfig, ProbeMode, ProgressSnapshot, ProgressTracker, Session,
    TrackedEntity,
};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinSet;

#[derive(Parser)]
#[command(
    name = "stagewatch",
    version,
    about = "Progress inference for documents in the exam-grading pipeline"
)]
struct Cli {
    /// Path to YAML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll documents and print progress until all are done (or Ctrl-C)
    Watch {
        /// Document key to follow, optionally with the number of students awaiting grading
        #[arg(long = "exam", value_name = "KEY[:CONSUMERS]")]
        exams: Vec<String>,
        /// JSON exam listing (full response or bare array)
        #[arg(long)]
        exams_file: Option<PathBuf>,
        /// Override the polling interval (milliseconds)
        #[arg(long)]
        interval_ms: Option<u64>,
        /// Override the probe mode
        #[arg(long, value_parser = parse_probe_mode)]
        probe: Option<ProbeMode>,
        /// Use the reduced-load list preset (60 s, no probing)
        #[arg(long)]
        bulk: bool,
    },
    /// Show the stage and progress a raw status maps to
    Infer {
        /// Raw status string reported by the pipeline
        status: String,
        /// Chunk count reported alongside the status
        #[arg(long, default_value_t = 0)]
        chunks: u64,
    },
    /// Print the effective configuration
    Config,
}

fn parse_probe_mode(value: &str) -> Result<ProbeMode, String> {
    match value.to_ascii_lowercase().as_str() {
        "auto" => Ok(ProbeMode::Auto),
        "off" => Ok(ProbeMode::Off),
        other => Err(format!("expected 'auto' or 'off', got '{}'", other)),
    }
}

/// `KEY` or `KEY:CONSUMERS`
fn parse_exam_arg(arg: &str) -> TrackedEntity {
    if let Some((key, count)) = arg.rsplit_once(':') {
        if let Ok(count) = count.parse::<usize>() {
            return TrackedEntity::new(key).with_pending_consumers(count);
        }
    }
    TrackedEntity::new(arg)
}

fn load_config(path: Option<PathBuf>) -> Result<Config, String> {
    let path = path.unwrap_or_else(default_config_path);
    Config::load_or_default(&path).map_err(|e| format!("Failed to load config {}: {}", path.display(), e))
}

fn cmd_infer(config: &Config, status: &str, chunks: u64) -> i32 {
    let stage = infer_stage(status, chunks);
    let snapshot = ProgressSnapshot::compute(stage, None, &config.polling.weights);
    println!("{:<12} {:>3}%  {}", stage, snapshot.progress, snapshot.label());
    0
}

fn cmd_config(config: &Config) -> i32 {
    match serde_yaml::to_string(config) {
        Ok(text) => {
            print!("{}", text);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn collect_entities(exams: &[String], exams_file: Option<&Path>) -> Result<Vec<TrackedEntity>, String> {
    let mut entities: Vec<TrackedEntity> = exams.iter().map(|arg| parse_exam_arg(arg)).collect();

    if let Some(path) = exams_file {
        let text = std::fs::read_to_string(path)
            .map_err(|e| format!("cannot read '{}': {}", path.display(), e))?;
        let items = parse_exam_list(&text).map_err(|e| format!("cannot parse '{}': {}", path.display(), e))?;
        for item in items {
            match item.tracked_entity() {
                Some(entity) => entities.push(entity),
                None => eprintln!("Skipping exam {} ('{}'): no document reference", item.exam_id, item.title),
            }
        }
    }

    // One follower per key; the first mention wins.
    let mut seen = HashSet::new();
    entities.retain(|entity| seen.insert(entity.key.clone()));

    if entities.is_empty() {
        return Err("nothing to watch: pass --exam or --exams-file".to_string());
    }
    Ok(entities)
}

async fn follow(key: String, mut receiver: watch::Receiver<ProgressSnapshot>) {
    loop {
        let snapshot = *receiver.borrow_and_update();
        println!("{:<40} {}", key, snapshot);
        if snapshot.stage.is_terminal() {
            break;
        }
        if receiver.changed().await.is_err() {
            break;
        }
    }
}

async fn run_watch(session: Session, poll: PollConfig, entities: Vec<TrackedEntity>) {
    let tracker = Arc::new(ProgressTracker::new(session, poll));
    let mut followers = JoinSet::new();
    for entity in entities {
        let key = entity.key.clone();
        let receiver = tracker.watch(entity);
        followers.spawn(follow(key, receiver));
    }

    tokio::select! {
        _ = async { while followers.join_next().await.is_some() {} } => {
            println!("All documents done.");
        }
        _ = tokio::signal::ctrl_c() => {
            eprintln!("Interrupted.");
        }
    }
    tracker.shutdown().await;
}

fn cmd_watch(
    config: &Config,
    exams: &[String],
    exams_file: Option<&Path>,
    interval_ms: Option<u64>,
    probe: Option<ProbeMode>,
    bulk: bool,
) -> i32 {
    let entities = match collect_entities(exams, exams_file) {
        Ok(entities) => entities,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    let mut poll = if bulk {
        PollConfig::bulk_list().with_weights(config.polling.weights)
    } else {
        config.polling.clone()
    };
    if let Some(ms) = interval_ms {
        if ms == 0 {
            eprintln!("Error: --interval-ms must be positive");
            return 1;
        }
        poll = poll.with_interval(Duration::from_millis(ms));
    }
    if let Some(mode) = probe {
        poll = poll.with_probe(mode);
    }

    let session = match Session::http(&config.services) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: failed to start runtime: {}", e);
            return 1;
        }
    };
    runtime.block_on(run_watch(session, poll, entities));
    0
}

fn main() {
    let cli = Cli::parse();
    let config = match load_config(cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    stagewatch::logging::init(&config.logging.level);

    let code = match cli.command {
        Commands::Watch {
            exams,
            exams_file,
            interval_ms,
            probe,
            bulk,
        } => cmd_watch(&config, &exams, exams_file.as_deref(), interval_ms, probe, bulk),
        Commands::Infer { status, chunks } => cmd_infer(&config, &status, chunks),
        Commands::Config => cmd_config(&config),
    };
    std::process::exit(code);
}
