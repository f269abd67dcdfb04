use anyhow::{Context, Result};
use clap::{Arg, ArgAction, Command};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use sports_highlighter::api::ApiServer;
use sports_highlighter::assembler::FfmpegAssembler;
use sports_highlighter::config::Config;
use sports_highlighter::lexicon::SportLexicon;
use sports_highlighter::pipeline::HighlightPipeline;
use sports_highlighter::transcription::WhisperTranscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter("sports_highlighter=info,warn")
        .init();

    let matches = Command::new("Sports Highlighter")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Extract highlight clips from sports videos via transcript keyword matching")
        .subcommand_required(true)
        .subcommand(
            Command::new("serve")
                .about("Run the HTTP upload API")
                .arg(
                    Arg::new("port")
                        .short('p')
                        .long("port")
                        .value_name("PORT")
                        .help("Listen port (overrides configuration)"),
                ),
        )
        .subcommand(
            Command::new("extract")
                .about("Extract highlights from a local video file")
                .arg(
                    Arg::new("input")
                        .short('i')
                        .long("input")
                        .value_name("FILE")
                        .help("Source video file")
                        .required(true),
                )
                .arg(
                    Arg::new("category")
                        .short('c')
                        .long("category")
                        .value_name("SPORT")
                        .help("Sport category from the lexicon")
                        .default_value("Football"),
                )
                .arg(
                    Arg::new("moment")
                        .short('m')
                        .long("moment")
                        .value_name("PHRASE")
                        .help("Single moment to scan for (e.g. penalty_kick) instead of the full category"),
                )
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .value_name("FILE")
                        .help("Output clip path")
                        .default_value("highlights.mp4"),
                )
                .arg(
                    Arg::new("merge")
                        .long("merge-overlapping")
                        .help("Merge overlapping clip windows")
                        .action(ArgAction::SetTrue),
                ),
        )
        .get_matches();

    let mut config = Config::load().unwrap_or_else(|e| {
        warn!("Failed to load config, using defaults: {}", e);
        Config::default()
    });

    match matches.subcommand() {
        Some(("serve", sub_matches)) => {
            if let Some(port) = sub_matches.get_one::<String>("port") {
                config.server.port = port.parse().context("Invalid port")?;
            }
            config.validate()?;

            let config = Arc::new(config);
            let pipeline = build_pipeline(Arc::clone(&config)).await?;

            info!("Sports Highlighter starting on port {}", config.server.port);
            ApiServer::new(pipeline, config).start().await
        }
        Some(("extract", sub_matches)) => {
            if sub_matches.get_flag("merge") {
                config.clips.merge_overlapping = true;
            }
            config.validate()?;

            let input = PathBuf::from(
                sub_matches
                    .get_one::<String>("input")
                    .expect("input is required"),
            );
            let category = sub_matches
                .get_one::<String>("category")
                .expect("category has a default");
            let moment = sub_matches.get_one::<String>("moment").map(String::as_str);
            let output = PathBuf::from(
                sub_matches
                    .get_one::<String>("output")
                    .expect("output has a default"),
            );

            if !input.exists() {
                return Err(anyhow::anyhow!("Input file not found: {}", input.display()));
            }

            let pipeline = build_pipeline(Arc::new(config)).await?;

            let clip = pipeline.run(&input, category, moment).await?;
            tokio::fs::copy(&clip.clip_path, &output)
                .await
                .context("Failed to write output clip")?;

            info!(
                "Wrote {} highlight windows to {} in {:.2}s",
                clip.window_count,
                output.display(),
                clip.processing_time.as_secs_f64()
            );
            Ok(())
        }
        _ => unreachable!("subcommand required"),
    }
}

/// Wire the pipeline with its production collaborators
async fn build_pipeline(config: Arc<Config>) -> Result<Arc<HighlightPipeline>> {
    let lexicon = match &config.transcription.lexicon_file {
        Some(path) if path.exists() => SportLexicon::from_file(path).await?,
        Some(path) => {
            warn!(
                "Lexicon file not found: {}, using built-in keywords",
                path.display()
            );
            SportLexicon::new()
        }
        None => SportLexicon::new(),
    };
    info!(
        "Sport lexicon loaded: {} categories, {} phrases",
        lexicon.categories().len(),
        lexicon.phrase_count()
    );

    let transcriber = Arc::new(WhisperTranscriber::new(config.transcription.clone()));
    let assembler = Arc::new(FfmpegAssembler::new(
        config.clips.encoder_preset.clone(),
        config.clips.encoder_threads,
    ));

    Ok(Arc::new(HighlightPipeline::new(
        Arc::clone(&config),
        Arc::new(lexicon),
        transcriber,
        assembler,
    )))
}
