use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use log::info;

use dltc::{
    build_structure, CentroidClassifier, EmbeddingLookup, InputShape, ModelCluster, ModelConfig,
    WordEmbeddings,
};

const DEFAULT_SAMPLE_LENGTH: usize = 100;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the configuration summary of a model source directory
    Info {
        /// Directory containing model.json and the raw content files
        src_dir: PathBuf,
    },
    /// Rebuild the normalized training structure from a source directory
    BuildStructure {
        /// Directory containing model.json and the raw content files
        src_dir: PathBuf,
        /// Target directory for the rebuilt structure
        out_dir: PathBuf,
    },
    /// Train a model cluster from a source directory and pre-trained
    /// word vectors, and save it
    Train {
        /// Directory containing model.json and the raw content files
        src_dir: PathBuf,
        /// Target directory for the saved model cluster
        model_dir: PathBuf,
        /// Pre-trained word vectors in word2vec text format
        #[arg(long)]
        embeddings: PathBuf,
        /// Where to rebuild the training structure
        #[arg(long)]
        structure_dir: Option<PathBuf>,
        /// Word positions per document
        #[arg(long, default_value_t = DEFAULT_SAMPLE_LENGTH)]
        sample_length: usize,
        /// Replace an existing classifier artifact in the target directory
        #[arg(long)]
        overwrite: bool,
    },
    /// Classify text with a saved model cluster
    Classify {
        /// Directory holding the cluster manifest and artifacts
        model_dir: PathBuf,
        /// Text to classify
        #[arg(long, conflicts_with = "file")]
        text: Option<String>,
        /// File to classify
        #[arg(long)]
        file: Option<PathBuf>,
        /// Show only the N highest-confidence labels
        #[arg(long)]
        top: Option<usize>,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    match args.command {
        Command::Info { src_dir } => {
            let config = ModelConfig::load(&src_dir)?;
            println!("--- Model Configuration Information ---");
            println!("  Name         : {}", config.model.name);
            println!("  Author       : {}", config.model.author);
            println!("  Version      : {}", config.model.version);
            println!("  Description  : {}", config.model.description);
            println!("---------------------------------------");
            println!("  Epoch        : {}", config.training_properties.epoch);
            println!("  Vec dim      : {}", config.training_properties.vec_dim);
            println!("  Test ratio   : {}", config.training_properties.test_ratio);
            println!("  Architecture : {}", config.training_properties.architecture);
            println!("  Batch size   : {}", config.training_properties.batch_size);
            for entry in &config.classification {
                let samples = config.classifier_range(&entry.label)?;
                println!("  Label '{}': {} samples from {}", entry.label, samples, entry.file);
            }
        }
        Command::BuildStructure { src_dir, out_dir } => {
            let config = ModelConfig::load(&src_dir)?;
            let structure = build_structure(&config, &out_dir)
                .with_context(|| format!("building training structure at {}", out_dir.display()))?;
            info!("training structure ready at {}", out_dir.display());
            println!(
                "Built {} samples over labels: {}",
                structure.samples()?.len(),
                structure.labels().join(", ")
            );
        }
        Command::Train {
            src_dir,
            model_dir,
            embeddings,
            structure_dir,
            sample_length,
            overwrite,
        } => {
            let config = ModelConfig::load(&src_dir)?;
            let structure_dir = structure_dir.unwrap_or_else(|| src_dir.join("structure"));
            let structure = build_structure(&config, &structure_dir)
                .with_context(|| format!("building training structure at {}", structure_dir.display()))?;

            let embeddings = WordEmbeddings::import_word2vec_text(&embeddings)
                .with_context(|| format!("importing word vectors from {}", embeddings.display()))?;
            anyhow::ensure!(
                embeddings.dimension() == config.training_properties.vec_dim,
                "word vectors have dimension {}, model.json declares vec_dim {}",
                embeddings.dimension(),
                config.training_properties.vec_dim
            );

            let mut cluster = ModelCluster::new();
            cluster.set_embeddings(embeddings);
            cluster.fit_scaler(&structure)?;

            let classifier = CentroidClassifier::new(
                InputShape::new(sample_length, config.training_properties.vec_dim),
                structure.labels().len(),
            );
            cluster.train_classifier(Box::new(classifier), &structure)?;
            cluster.save(&model_dir, overwrite)?;

            info!("model cluster trained and saved");
            println!(
                "Trained '{}' over labels [{}]; saved to {}",
                config.model.name,
                structure.labels().join(", "),
                model_dir.display()
            );
        }
        Command::Classify {
            model_dir,
            text,
            file,
            top,
        } => {
            let cluster = ModelCluster::load(&model_dir)
                .with_context(|| format!("loading model cluster from {}", model_dir.display()))?;
            let ranked = match (text, file) {
                (Some(text), None) => cluster.predict_text(&text)?,
                (None, Some(path)) => cluster.predict_file(&path)?,
                _ => anyhow::bail!("pass exactly one of --text or --file"),
            };
            let shown = dltc::top(&ranked, top.unwrap_or(ranked.len()));
            println!("Results:");
            for entry in shown {
                println!("  {}: {:.4}", entry.label, entry.score);
            }
        }
    }
    Ok(())
}
