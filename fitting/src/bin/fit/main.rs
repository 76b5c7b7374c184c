mod args;
mod device;

use args::Args;
use body::BlendShapeModel;
use candle_core::{DType, Device, Tensor};
use clap::Parser;
use fitting::metrics::{CsvScalarWriter, LogScalarWriter};
use fitting::runs::{RunManager, DEFAULT_RUNS_DIR};
use fitting::{FitConfig, Fitter, JointMap};
use log::LevelFilter;
use simplelog::{Config, SimpleLogger, WriteLogger};
use std::{
    error::Error,
    fs::{self, File},
    io::BufWriter,
    path::{Path, PathBuf},
};

fn main() -> Result<(), Box<dyn Error>> {
    let args = init()?;

    let mut config = FitConfig::load(&args.config)?;
    apply_overrides(&mut config, &args);
    config.validate()?;

    let device = device::get_device()?;
    let model = BlendShapeModel::load(&args.model, &device)?;
    let target = load_target(&args.target, &args.target_key, &device)?;

    let output_dir = create_output_dir(&args)?;
    log::info!("Writing results to {}", output_dir.display());

    let metrics_file = BufWriter::new(File::create(output_dir.join("metrics.csv"))?);
    let mut metrics = (CsvScalarWriter::new(metrics_file)?, LogScalarWriter);

    let fitter = Fitter::new(
        config.train.clone(),
        JointMap::new(&config.dataset.data_map)?,
        device,
    )?
    .with_progress(args.log_file.is_none());

    let outcome = fitter.fit(&model, &target, &mut metrics)?;

    match outcome.snapshot {
        Some(snapshot) => {
            log::info!(
                "Best epoch {} of {}{}",
                snapshot.epoch,
                outcome.epochs,
                if outcome.early_stopped {
                    " (stopped early)"
                } else {
                    ""
                }
            );
            snapshot.save(output_dir.join("snapshot.safetensors"))?;
        }
        None => log::warn!("No snapshot captured, nothing to save"),
    }

    log::info!("Done!");
    Ok(())
}

fn init() -> Result<Args, Box<dyn Error>> {
    let args = Args::parse();

    let level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    match &args.log_file {
        Some(log_file) => WriteLogger::init(
            LevelFilter::Debug,
            Config::default(),
            File::create(log_file)?,
        )?,
        None => SimpleLogger::init(level, Config::default())?,
    }

    Ok(args)
}

fn apply_overrides(config: &mut FitConfig, args: &Args) {
    if let Some(max_epoch) = args.max_epoch {
        config.train.max_epoch = max_epoch;
    }
    if let Some(learning_rate) = args.learning_rate {
        config.train.learning_rate = learning_rate;
    }
    if let Some(seed) = args.seed {
        config.train.seed = Some(seed);
    }
}

fn load_target(path: &Path, key: &str, device: &Device) -> Result<Tensor, Box<dyn Error>> {
    let mut tensors = candle_core::safetensors::load(path, device)?;
    let target = tensors
        .remove(key)
        .ok_or_else(|| format!("No tensor '{}' in {}", key, path.display()))?
        .to_dtype(DType::F32)?;

    log::info!("Loaded target {:?} from {}", target.shape(), path.display());
    Ok(target)
}

fn create_output_dir(args: &Args) -> Result<PathBuf, Box<dyn Error>> {
    if let Some(dir) = &args.output {
        fs::create_dir_all(dir)?;
        return Ok(dir.clone());
    }

    let manager = RunManager::new(DEFAULT_RUNS_DIR)?;
    let run = manager.create_run()?;
    Ok(manager.run_path(&run))
}
