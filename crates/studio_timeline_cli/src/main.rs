// SPDX-License-Identifier: MIT OR Apache-2.0
//! `studio-timeline` - inspect and normalize timeline project files.
//!
//! Loads a project record (JSON or RON, picked by extension) into a
//! [`TimelineEngine`], validates it, prints a summary and can write the
//! normalized record back out in either format.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use studio_timeline::{EngineConfig, FileProjectStore, TimelineEngine, TimelineError};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Timeline(#[from] TimelineError),

    #[error("failed to start runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

#[derive(Parser, Debug, PartialEq)]
#[command(name = "studio-timeline", version)]
struct Args {
    /// Project file (`.json` or `.ron`).
    project: PathBuf,

    /// Engine config in RON.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the normalized project here.
    #[arg(long)]
    normalize: Option<PathBuf>,
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig, CliError> {
    match path {
        Some(path) => {
            let config = EngineConfig::load(path)?;
            tracing::debug!(path = %path.display(), "loaded engine config");
            Ok(config)
        }
        None => Ok(EngineConfig::default()),
    }
}

async fn run(args: Args) -> Result<(), CliError> {
    let config = load_config(args.config.as_deref())?;
    let mut engine = TimelineEngine::with_config(config);

    let record = FileProjectStore::read_path(&args.project).await?;
    engine.import_record(record)?;

    if let Some(project) = engine.project() {
        println!("{} ({})", project.name, project.id);
        println!(
            "  {}x{} @ {} fps, {:.2}s",
            project.resolution.width, project.resolution.height, project.fps, project.duration
        );
        println!(
            "  {} tracks, {} layers, {} elements, {} markers",
            project.track_count(),
            project.layer_count(),
            project.element_count(),
            project.markers().len()
        );
        println!("  content ends at {:.2}s", project.content_end());
    }

    if let Some(out) = &args.normalize {
        let record = engine.export_record()?;
        FileProjectStore::write_path(out, &record).await?;
        tracing::info!(path = %out.display(), "wrote normalized project");
    }
    Ok(())
}

fn main() -> ExitCode {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("studio_timeline=info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let result = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(CliError::from)
        .and_then(|runtime| runtime.block_on(run(args)));

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Args, clap::Error> {
        Args::try_parse_from(std::iter::once("studio-timeline").chain(args.iter().copied()))
    }

    #[test]
    fn test_parse_project_only() {
        let args = parse(&["demo.json"]).unwrap();
        assert_eq!(args.project, PathBuf::from("demo.json"));
        assert!(args.config.is_none());
        assert!(args.normalize.is_none());
    }

    #[test]
    fn test_parse_options() {
        let args = parse(&["--config", "engine.ron", "demo.ron", "--normalize", "out.json"]).unwrap();
        assert_eq!(args.project, PathBuf::from("demo.ron"));
        assert_eq!(args.config, Some(PathBuf::from("engine.ron")));
        assert_eq!(args.normalize, Some(PathBuf::from("out.json")));
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse(&[]).is_err());
        assert!(parse(&["a.json", "b.json"]).is_err());
        assert!(parse(&["a.json", "--config"]).is_err());
        assert!(parse(&["a.json", "--verbose"]).is_err());
    }
}
