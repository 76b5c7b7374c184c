use candle_core::{Result, Tensor};

/// Axis-angle pose of the SMPL body: 24 joints x 3.
pub const SMPL_POSE_DIM: usize = 72;

/// Number of SMPL shape coefficients (betas).
pub const SMPL_SHAPE_DIM: usize = 10;

pub const SMPL_NUM_JOINTS: usize = 24;

/// Output of a body forward pass.
#[derive(Debug, Clone)]
pub struct BodyOutput {
    /// (batch, num_verts, 3)
    pub verts: Tensor,
    /// (batch, num_joints, 3)
    pub joints: Tensor,
}

/// A differentiable parametric body.
///
/// Implementations must build `verts` and `joints` from `pose` and `shape`
/// with candle ops only, so gradients reach both inputs on `backward`.
pub trait BodyModel {
    fn pose_dim(&self) -> usize {
        SMPL_POSE_DIM
    }

    fn shape_dim(&self) -> usize {
        SMPL_SHAPE_DIM
    }

    fn num_joints(&self) -> usize;

    /// `pose` is (batch, pose_dim) and `shape` is (batch, shape_dim).
    fn forward(&self, pose: &Tensor, shape: &Tensor) -> Result<BodyOutput>;
}
