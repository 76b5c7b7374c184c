use candle_core::{Result, Tensor};

use crate::joint_map::JointIndex;

const SMOOTH_L1_BETA: f64 = 1.0;

/// Joints are compared in centimeters; model and target are in meters.
pub const JOINT_SCALE: f64 = 100.0;

/// Smooth-L1 loss, mean over all elements.
pub fn smooth_l1(pred: &Tensor, target: &Tensor) -> Result<Tensor> {
    let diff = (pred - target)?;
    let abs_diff = diff.abs()?;

    let is_small = abs_diff.lt(SMOOTH_L1_BETA)?;

    let quadratic = (diff.sqr()? * (0.5 / SMOOTH_L1_BETA))?;
    let linear = (abs_diff - 0.5 * SMOOTH_L1_BETA)?;

    let loss = is_small.where_cond(&quadratic, &linear)?;
    loss.mean_all()
}

/// Loss between the mapped model joints, scaled by the global `scale`, and
/// the mapped target joints.
pub fn joint_loss(
    joints: &Tensor,
    target: &Tensor,
    scale: &Tensor,
    index: &JointIndex,
) -> crate::Result<Tensor> {
    let pred = (index.select_model(joints)? * JOINT_SCALE)?.broadcast_mul(scale)?;
    let target = (index.select_dataset(target)? * JOINT_SCALE)?;
    Ok(smooth_l1(&pred, &target)?)
}
