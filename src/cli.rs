use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::DEFAULT_CONFIG_PATH;
use crate::keywords::{DEFAULT_CONTEXT_WORDS, DEFAULT_FUZZY_THRESHOLD};

#[derive(Parser, Debug)]
#[command(
    name = "rplan",
    version,
    about = "Regional-plan text segmentation and keyword search"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Inventory(InventoryArgs),
    Segment(SegmentArgs),
    Search(SearchArgs),
    Status(StatusArgs),
}

#[derive(Args, Debug, Clone)]
pub struct InventoryArgs {
    #[arg(long, default_value = ".cache/rplan")]
    pub cache_root: PathBuf,

    /// Directory of extracted plan texts; defaults to `<cache-root>/text`.
    #[arg(long)]
    pub text_dir: Option<PathBuf>,

    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    pub config_path: PathBuf,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

#[derive(Args, Debug, Clone)]
pub struct SegmentArgs {
    #[arg(long, default_value = ".cache/rplan")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub text_dir: Option<PathBuf>,

    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    pub config_path: PathBuf,

    #[arg(long)]
    pub output_path: Option<PathBuf>,

    #[arg(long)]
    pub db_path: Option<PathBuf>,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct SearchArgs {
    #[arg(long, default_value = ".cache/rplan")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,

    /// JSON object: category -> [keywords].
    #[arg(long)]
    pub exact_keywords: Option<PathBuf>,

    /// JSON object: category -> { keywords: [..], threshold?: n }.
    #[arg(long)]
    pub fuzzy_keywords: Option<PathBuf>,

    /// JSON list of phrases; sections containing one are not searched.
    #[arg(long)]
    pub negate_keywords: Option<PathBuf>,

    #[arg(long, default_value_t = DEFAULT_FUZZY_THRESHOLD)]
    pub threshold: u8,

    #[arg(long, default_value_t = DEFAULT_CONTEXT_WORDS)]
    pub context_words: usize,

    #[arg(long, default_value_t = false)]
    pub drop_empty: bool,

    #[arg(long, default_value_t = false)]
    pub boolean: bool,

    #[arg(long)]
    pub output_path: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[arg(long, default_value = ".cache/rplan")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,
}
