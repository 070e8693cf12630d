//! citegraph CLI: prepare citation-graph training data from a sharded corpus.
//!
//! Usage:
//!   citegraph build [DATA_DIR] [SAVE_DIR] [--config file.yaml] [options]
//!   citegraph qrel --data data.json --paper-ids paper_ids.json --queries val.txt --out val.qrel
//!   citegraph metadata DATA_DIR SAVE_DIR

use citegraph::{
    extract_metadata, qrels_from_files, Pipeline, PipelineConfig, PositiveMode, QrelConfig,
    QrelFiles, DEFAULT_SEED, DEFAULT_SHARD_COUNT,
};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "citegraph",
    version,
    about = "Citation graph preparation for embedding training"
)]
struct Cli {
    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the citation graph, splits and optional qrels
    Build(BuildArgs),
    /// Sample qrels for a list of queries from a prepared graph
    Qrel(QrelArgs),
    /// Extract titles and abstracts for a prepared graph
    Metadata {
        /// Directory containing `metadata/` and `pdf_parses/`
        data_dir: PathBuf,
        /// Output directory of an earlier build
        save_dir: PathBuf,
        #[arg(long, default_value_t = DEFAULT_SHARD_COUNT)]
        shard_count: usize,
        /// Worker threads (0 = all cores)
        #[arg(long, default_value_t = 0)]
        workers: usize,
    },
}

#[derive(clap::Args)]
struct BuildArgs {
    /// Directory containing `metadata/` (and `pdf_parses/`)
    data_dir: Option<PathBuf>,
    /// Directory receiving the outputs
    save_dir: Option<PathBuf>,
    /// YAML configuration; flags override its values
    #[arg(long)]
    config: Option<PathBuf>,
    /// Only keep query papers with one of these fields
    #[arg(long, num_args = 1..)]
    fields_of_study: Vec<String>,
    #[arg(long)]
    workers: Option<usize>,
    #[arg(long)]
    seed: Option<u64>,
    /// Shards whose query papers are kept
    #[arg(long, num_args = 1..)]
    shards: Vec<usize>,
    #[arg(long)]
    shard_count: Option<usize>,
    #[arg(long)]
    val_proportion: Option<f64>,
    #[arg(long)]
    test_proportion: Option<f64>,
    #[arg(long)]
    train_proportion: Option<f64>,
    /// Require query papers to span two or more fields
    #[arg(long)]
    cross_domain: bool,
    /// Co-citation mode: require and keep inbound citations
    #[arg(long)]
    cocite: bool,
    /// Resample fields towards a smoothed distribution
    #[arg(long)]
    smoothed_weighting: bool,
    /// External identifiers restricting query papers
    #[arg(long)]
    id_list: Option<PathBuf>,
    /// TSV mapping external identifiers to paper IDs
    #[arg(long)]
    id_mapping: Option<PathBuf>,
    /// Abort on the first malformed record
    #[arg(long)]
    strict: bool,
    /// Also write val.qrel and test.qrel
    #[arg(long)]
    qrels: bool,
}

#[derive(clap::Args)]
struct QrelArgs {
    #[arg(long)]
    data: PathBuf,
    #[arg(long)]
    paper_ids: PathBuf,
    /// Query IDs, one per line
    #[arg(long)]
    queries: PathBuf,
    #[arg(long)]
    out: PathBuf,
    #[arg(long)]
    cited_by: Option<PathBuf>,
    /// Outbound citations of the citers (`cites.json`)
    #[arg(long)]
    cites: Option<PathBuf>,
    /// Per-paper field labels
    #[arg(long)]
    fields: Option<PathBuf>,
    /// Draw positives from co-cited papers
    #[arg(long)]
    cocite: bool,
    /// Draw negatives from other fields only
    #[arg(long)]
    cross_field: bool,
    #[arg(long, default_value_t = 5)]
    positives: usize,
    #[arg(long, default_value_t = 25)]
    negatives: usize,
    #[arg(long, default_value_t = DEFAULT_SEED)]
    seed: u64,
}

fn init_logging(level: &str) {
    let parsed = level.parse::<tracing::Level>().ok();
    tracing_subscriber::fmt()
        .with_max_level(parsed.unwrap_or(tracing::Level::INFO))
        .with_writer(std::io::stderr)
        .init();
    if parsed.is_none() {
        tracing::warn!(level, "unknown log level, using info");
    }
}

fn build_config(args: BuildArgs) -> Result<PipelineConfig, String> {
    let mut config = match &args.config {
        Some(path) => PipelineConfig::from_yaml_file(path).map_err(|e| e.to_string())?,
        None => PipelineConfig::default(),
    };
    if let Some(dir) = args.data_dir {
        config.data_dir = dir;
    }
    if let Some(dir) = args.save_dir {
        config.save_dir = dir;
    }
    if !args.fields_of_study.is_empty() {
        config.filter.fields_of_study = args.fields_of_study;
    }
    if let Some(workers) = args.workers {
        config.workers = workers;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if !args.shards.is_empty() {
        config.query_shards = Some(args.shards);
    }
    if let Some(count) = args.shard_count {
        config.shard_count = count;
    }
    if let Some(p) = args.val_proportion {
        config.split.val_proportion = p;
    }
    if let Some(p) = args.test_proportion {
        config.split.test_proportion = p;
    }
    if let Some(p) = args.train_proportion {
        config.split.train_proportion = Some(p);
    }
    if args.id_list.is_some() {
        config.filter.id_list = args.id_list;
    }
    if args.id_mapping.is_some() {
        config.filter.id_mapping = args.id_mapping;
    }
    config.filter.cross_domain |= args.cross_domain;
    config.filter.cocite |= args.cocite;
    config.split.smoothed |= args.smoothed_weighting;
    config.strict |= args.strict;
    if args.qrels && config.qrel.is_none() {
        let mode = if config.filter.cocite {
            PositiveMode::Cocite
        } else {
            PositiveMode::Direct
        };
        config.qrel = Some(QrelConfig {
            mode,
            ..Default::default()
        });
    }
    Ok(config)
}

fn cmd_build(args: BuildArgs) -> i32 {
    let config = match build_config(args) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let save_dir = config.save_dir.clone();
    match Pipeline::new(config).run() {
        Ok(summary) => {
            println!(
                "Wrote {} query papers ({} train, {} val, {} test) to {}",
                summary.final_queries,
                summary.split_sizes.get("train").copied().unwrap_or(0),
                summary.split_sizes.get("val").copied().unwrap_or(0),
                summary.split_sizes.get("test").copied().unwrap_or(0),
                save_dir.display()
            );
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_qrel(args: QrelArgs) -> i32 {
    let files = QrelFiles {
        data: args.data,
        paper_ids: args.paper_ids,
        queries: args.queries,
        out: args.out,
        cited_by: args.cited_by,
        cites: args.cites,
        fields: args.fields,
    };
    let config = QrelConfig {
        positives: args.positives,
        negatives: args.negatives,
        mode: if args.cocite {
            PositiveMode::Cocite
        } else {
            PositiveMode::Direct
        },
        cross_field: args.cross_field,
        ..Default::default()
    };
    if config.mode == PositiveMode::Cocite && files.cited_by.is_none() {
        eprintln!("Error: --cocite needs --cited-by");
        return 1;
    }
    match qrels_from_files(&files, config, args.seed) {
        Ok(summary) => {
            println!(
                "Wrote {} qrel lines for {} queries to {}",
                summary.lines,
                summary.queries - summary.skipped_not_in_graph - summary.skipped_no_candidates,
                files.out.display()
            );
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_metadata(data_dir: PathBuf, save_dir: PathBuf, shard_count: usize, workers: usize) -> i32 {
    match extract_metadata(&data_dir, &save_dir, shard_count, workers) {
        Ok(collection) => {
            println!(
                "Extracted {} abstracts ({} missing)",
                collection.papers.len(),
                collection.missing.len()
            );
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli.log_level);
    let code = match cli.command {
        Commands::Build(args) => cmd_build(args),
        Commands::Qrel(args) => cmd_qrel(args),
        Commands::Metadata {
            data_dir,
            save_dir,
            shard_count,
            workers,
        } => cmd_metadata(data_dir, save_dir, shard_count, workers),
    };
    std::process::exit(code);
}
