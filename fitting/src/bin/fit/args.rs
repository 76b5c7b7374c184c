use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(name = "Body Fit")]
#[command(author = "Jørgen Hanssen <jorgen@hanssen.io>")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Args {
    /// JSON config with TRAIN and DATASET sections.
    #[arg(short, long)]
    pub config: PathBuf,

    /// Body model (.safetensors with v_template, shapedirs, posedirs, J_regressor).
    #[arg(short, long)]
    pub model: PathBuf,

    /// Target joints (.safetensors).
    #[arg(short, long)]
    pub target: PathBuf,

    /// Name of the (batch, joints, 3) tensor inside the target file.
    #[arg(long, default_value = "joints")]
    pub target_key: String,

    /// Directory for the snapshot and metrics. Defaults to a new timestamped run directory.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Overrides TRAIN.MAX_EPOCH.
    #[arg(long)]
    pub max_epoch: Option<usize>,

    /// Overrides TRAIN.LEARNING_RATE.
    #[arg(long)]
    pub learning_rate: Option<f64>,

    /// Overrides TRAIN.SEED.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Write a debug log to this file instead of logging to the terminal.
    #[arg(short, long)]
    pub log_file: Option<PathBuf>,

    /// Log per-epoch scalars.
    #[arg(short, long)]
    pub verbose: bool,
}
