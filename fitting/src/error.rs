use thiserror::Error;

#[derive(Error, Debug)]
pub enum FitError {
    #[error("Tensor error: {0}")]
    Candle(#[from] candle_core::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Config(String),

    #[error("DATA_MAP is empty, no joints to fit")]
    EmptyJointMap,

    #[error("DATA_MAP pair {pair} ({model}, {dataset}) out of range: model has {model_joints} joints, target has {dataset_joints}")]
    JointOutOfRange {
        pair: usize,
        model: usize,
        dataset: usize,
        model_joints: usize,
        dataset_joints: usize,
    },

    #[error("DATA_MAP pair {pair} index {index} does not fit a u32 joint index")]
    JointIndexOverflow { pair: usize, index: usize },

    #[error("Relative loss change is undefined: the best loss so far is exactly zero")]
    ZeroMinimumLoss,

    #[error("Progress bar template error: {0}")]
    Progress(#[from] indicatif::style::TemplateError),
}

pub type Result<T> = std::result::Result<T, FitError>;
