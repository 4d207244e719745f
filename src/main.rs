use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use diary_recommender::cleaning::MetadataCleaner;
use diary_recommender::nouns::build_tagger;
use diary_recommender::pipeline::{self, CLUSTERED_FILE, MODEL_FILE};
use diary_recommender::records::{read_diaries, read_diarists, write_cleaned, Diarist};
use diary_recommender::topics::TopicModel;
use diary_recommender::{ModelBundle, OverrideTables, PipelineConfig, Query, Recommendation, Recommender};

/// Money diary recommender - find diaries written by people like you
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Pipeline config (JSON); missing keys take defaults
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args, Debug)]
struct RawInputs {
    /// Diarist metadata CSV
    #[arg(long, default_value = "data/diarists.csv")]
    diarists: PathBuf,

    /// Manual corrections for salary, location and flags
    #[arg(long, default_value = "data/overrides.json")]
    overrides: PathBuf,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Clean the diarist table and write it out without training
    Clean {
        #[command(flatten)]
        inputs: RawInputs,

        /// Output CSV
        #[arg(short, long, default_value = "out/cleaned_diarists.csv")]
        output: PathBuf,
    },
    /// Cluster diarists, fit the topic models and write the model bundle
    Train {
        #[command(flatten)]
        inputs: RawInputs,

        /// Diary texts, one JSON object per line
        #[arg(long, default_value = "data/diaries.jsonl")]
        diaries: PathBuf,

        /// Output directory for the model and exports
        #[arg(short, long, default_value = "out")]
        output_dir: PathBuf,
    },
    /// Recommend three diaries for a reader
    Recommend {
        #[arg(long, default_value = "out/model.json")]
        model: PathBuf,

        #[arg(long)]
        age: u32,

        #[arg(long)]
        salary: f64,

        /// What a typical week of spending looks like for you
        #[arg(long, conflicts_with = "text_file")]
        text: Option<String>,

        #[arg(long)]
        text_file: Option<PathBuf>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the top terms of every topic
    Topics {
        #[arg(long, default_value = "out/model.json")]
        model: PathBuf,

        /// Show the model fitted on all diarists instead of each cluster
        #[arg(long)]
        all: bool,

        #[arg(long)]
        top: Option<usize>,
    },
}

fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    match path {
        Some(path) => PipelineConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(PipelineConfig::default()),
    }
}

fn clean(inputs: &RawInputs) -> Result<Vec<Diarist>> {
    println!("Loading diarists from {}...", inputs.diarists.display());
    let raw = read_diarists(&inputs.diarists)
        .with_context(|| format!("Failed to read {}", inputs.diarists.display()))?;
    let overrides = OverrideTables::load(&inputs.overrides)
        .with_context(|| format!("Failed to read overrides {}", inputs.overrides.display()))?;
    let diarists = MetadataCleaner::new(&overrides)
        .clean(raw)
        .context("Failed to clean diarist table")?;
    println!("Cleaned {} diarists", diarists.len());
    Ok(diarists)
}

fn print_topics(model: &TopicModel, top: usize) {
    println!("== {} ({} diaries) ==", model.scope(), model.n_documents());
    for (topic, terms) in model.top_terms(top).iter().enumerate() {
        println!("Topic {}: {}", topic, terms.join(", "));
    }
}

fn print_recommendation(recommendation: &Recommendation) {
    match recommendation {
        Recommendation::Ranked { cluster, picks } => {
            println!("You belong to cluster {}. Diaries for you:", cluster);
            for pick in picks {
                println!("  {}. {} (distance {:.4})", pick.rank, pick.url, pick.distance);
            }
        }
        Recommendation::InsufficientText { cluster, reason } => {
            println!(
                "You belong to cluster {}, but your text is not enough to recommend diaries: {}",
                cluster, reason
            );
            println!("Try describing what you spend money on in a few more words.");
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;

    match args.command {
        Command::Clean { inputs, output } => {
            let diarists = clean(&inputs)?;
            write_cleaned(&output, &diarists)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            println!("Wrote cleaned table to {}", output.display());
        }
        Command::Train {
            inputs,
            diaries,
            output_dir,
        } => {
            let diarists = clean(&inputs)?;
            println!("Loading diaries from {}...", diaries.display());
            let diary_texts = read_diaries(&diaries)
                .with_context(|| format!("Failed to read {}", diaries.display()))?;

            println!("Initializing {:?} tagger...", config.nouns.tagger);
            let tagger = build_tagger(config.nouns.tagger)?;

            println!("Training models...");
            let output = pipeline::train(&config, diarists, &diary_texts, tagger.as_ref())
                .context("Training failed")?;
            let written = output
                .write_to(&output_dir)
                .with_context(|| format!("Failed to write outputs to {}", output_dir.display()))?;
            for path in &written {
                println!("Wrote {}", path.display());
            }
            info!(
                "Model in {}, clustered table in {}",
                output_dir.join(MODEL_FILE).display(),
                output_dir.join(CLUSTERED_FILE).display()
            );
            println!("Training complete!");
        }
        Command::Recommend {
            model,
            age,
            salary,
            text,
            text_file,
            json,
        } => {
            let text = match (text, text_file) {
                (Some(text), _) => text,
                (None, Some(path)) => fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read {}", path.display()))?,
                (None, None) => bail!("Provide a description with --text or --text-file"),
            };
            let bundle = ModelBundle::load(&model)
                .with_context(|| format!("Failed to load model {}", model.display()))?;
            let tagger = build_tagger(bundle.config.nouns.tagger)?;
            let recommender = Recommender::new(&bundle, tagger.as_ref());

            let recommendation = recommender.recommend(&Query { age, salary, text })?;
            if json {
                println!("{}", serde_json::to_string_pretty(&recommendation)?);
            } else {
                print_recommendation(&recommendation);
            }
        }
        Command::Topics { model, all, top } => {
            let bundle = ModelBundle::load(&model)
                .with_context(|| format!("Failed to load model {}", model.display()))?;
            let top = top.unwrap_or(bundle.config.topics.top_terms);
            if all {
                print_topics(&bundle.corpus, top);
            } else {
                for cluster_model in bundle.clusters.values() {
                    print_topics(cluster_model, top);
                    println!();
                }
            }
        }
    }

    Ok(())
}
