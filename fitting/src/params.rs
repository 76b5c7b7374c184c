use candle_core::{DType, Device, Tensor, Var};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::TrainConfig;
use crate::error::Result;

/// Shape coefficients start as uniform noise in `[0, SHAPE_INIT_SCALE)`.
pub const SHAPE_INIT_SCALE: f32 = 0.03;

/// Pose, shape and global scale being fitted.
pub struct BodyParams {
    pub pose: Var,
    pub shape: Var,
    pub scale: Var,
    optimize_shape: bool,
    optimize_scale: bool,
}

impl BodyParams {
    /// Zero pose, small random shape, unit scale.
    pub fn init(
        batch: usize,
        pose_dim: usize,
        shape_dim: usize,
        config: &TrainConfig,
        device: &Device,
    ) -> Result<Self> {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let shape: Vec<f32> = (0..batch * shape_dim)
            .map(|_| rng.gen::<f32>() * SHAPE_INIT_SCALE)
            .collect();

        Ok(Self {
            pose: Var::zeros((batch, pose_dim), DType::F32, device)?,
            shape: Var::from_tensor(&Tensor::from_vec(shape, (batch, shape_dim), device)?)?,
            scale: Var::ones(1, DType::F32, device)?,
            optimize_shape: config.optimize_shape,
            optimize_scale: config.optimize_scale,
        })
    }

    /// Vars the optimizer may update. Pose is always among them.
    pub fn trainable(&self) -> Vec<Var> {
        let mut vars = vec![self.pose.clone()];
        if self.optimize_shape {
            vars.push(self.shape.clone());
        }
        if self.optimize_scale {
            vars.push(self.scale.clone());
        }
        vars
    }
}
