pub mod config;
pub mod early_stop;
pub mod error;
pub mod fitter;
pub mod joint_map;
pub mod loss;
pub mod metrics;
pub mod params;
pub mod progress;
pub mod runs;
pub mod snapshot;

pub use config::{DatasetConfig, FitConfig, TrainConfig};
pub use early_stop::EarlyStop;
pub use error::{FitError, Result};
pub use fitter::{FitOutcome, Fitter};
pub use joint_map::JointMap;
pub use snapshot::FitSnapshot;
