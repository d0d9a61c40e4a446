use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use visamatch_core::{Classifier, FaceDetector, FaceRecognizer, OnnxEmbedder, Strategy};
use visamatch_pipeline::{Config, MatchOptions, Operator, Outcome, Relocation};

#[derive(Parser)]
#[command(name = "visamatch", version, about = "Sort passport scans and pair visa pages with personal photos")]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding passports/, visa/, personal/ and the outputs
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Print the report as JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Move passports/*.jpg into visa/ or personal/
    Classify,
    /// Pair personal/ with visa/ into people/<id>/
    Match(MatchArgs),
    /// Classify, then match
    Run(MatchArgs),
    /// Print the effective configuration
    Config,
}

#[derive(clap::Args)]
struct MatchArgs {
    /// Pairing strategy
    #[arg(short, long, value_enum)]
    strategy: Option<StrategyArg>,

    /// Cosine distance below which a pair is accepted
    #[arg(short, long)]
    threshold: Option<f32>,

    /// Copy files into their destination, keeping the inputs
    #[arg(long, conflicts_with = "move_files")]
    copy: bool,

    /// Move files into their destination
    #[arg(long = "move")]
    move_files: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum StrategyArg {
    GlobalGreedy,
    BestAvailable,
}

impl From<StrategyArg> for Strategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::GlobalGreedy => Strategy::GlobalGreedy,
            StrategyArg::BestAvailable => Strategy::BestAvailable,
        }
    }
}

impl MatchArgs {
    fn apply(&self, config: &mut Config) {
        if let Some(strategy) = self.strategy {
            config.strategy = strategy.into();
        }
        if let Some(threshold) = self.threshold {
            config.match_threshold = Some(threshold);
        }
        if self.copy {
            config.relocation = Some(Relocation::Copy);
        } else if self.move_files {
            config.relocation = Some(Relocation::Move);
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;
    if let Some(root) = &cli.root {
        config.root = root.clone();
    }
    if let Commands::Match(args) | Commands::Run(args) = &cli.command {
        args.apply(&mut config);
    }
    config.validate().context("invalid configuration")?;

    let operator = Operator::new();

    match &cli.command {
        Commands::Classify => {
            let report = classify(&operator, &config)?;
            emit(cli.json, &report, report.lines())?;
        }
        Commands::Match(_) => {
            let report = match_images(&operator, &config)?;
            emit(cli.json, &report, report.lines())?;
        }
        Commands::Run(_) => {
            let classified = classify(&operator, &config)?;
            let matched = match_images(&operator, &config)?;
            if cli.json {
                let both = serde_json::json!({ "classify": classified, "match": matched });
                println!("{}", serde_json::to_string_pretty(&both)?);
            } else {
                print_lines(classified.lines());
                print_lines(matched.lines());
            }
        }
        Commands::Config => {
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                print!("{}", toml::to_string_pretty(&config)?);
            }
        }
    }

    Ok(())
}

fn load_detector(config: &Config) -> Result<FaceDetector> {
    let path = config.detector_model_path();
    FaceDetector::load(&path, config.detector_config())
        .with_context(|| format!("failed to load detector model {}", path.display()))
}

fn classify(operator: &Operator, config: &Config) -> Result<visamatch_pipeline::ClassifyReport> {
    let mut classifier = Classifier::new(load_detector(config)?, config.classify_rule());
    let layout = config.layout();
    tracing::info!(root = %config.root.display(), "classifying");
    operator
        .classify(&mut classifier, &layout)
        .context("classification failed")
}

fn match_images(operator: &Operator, config: &Config) -> Result<visamatch_pipeline::MatchReport> {
    let path = config.recognizer_model_path();
    let recognizer = FaceRecognizer::load(&path)
        .with_context(|| format!("failed to load recognition model {}", path.display()))?;
    let mut embedder = OnnxEmbedder::new(
        load_detector(config)?,
        recognizer,
        config.face_selection,
        config.enforce_detection,
    );
    let options = MatchOptions {
        strategy: config.strategy,
        threshold: config.match_threshold(),
        relocation: config.relocation(),
    };
    tracing::info!(strategy = %options.strategy, threshold = options.threshold, "matching");
    operator
        .match_images(&mut embedder, &config.layout(), &options)
        .context("matching failed")
}

fn emit<T: Serialize>(json: bool, report: &T, lines: Vec<(Outcome, String)>) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        print_lines(lines);
    }
    Ok(())
}

fn print_lines(lines: Vec<(Outcome, String)>) {
    for (outcome, line) in lines {
        println!("{} {line}", outcome.symbol());
    }
}
