use std::collections::HashMap;
use std::path::Path;

use candle_core::Tensor;

use crate::error::Result;
use crate::params::BodyParams;

/// Parameters and body output at the best epoch.
///
/// Parameter tensors are deep copies: the optimizer keeps writing into the
/// live vars after the snapshot is taken.
#[derive(Debug, Clone)]
pub struct FitSnapshot {
    pub epoch: usize,
    pub loss: f64,
    pub pose: Tensor,
    pub shape: Tensor,
    pub scale: Tensor,
    pub verts: Tensor,
    pub joints: Tensor,
}

impl FitSnapshot {
    pub fn capture(
        epoch: usize,
        loss: f64,
        params: &BodyParams,
        verts: &Tensor,
        joints: &Tensor,
    ) -> Result<Self> {
        Ok(Self {
            epoch,
            loss,
            pose: params.pose.as_tensor().copy()?,
            shape: params.shape.as_tensor().copy()?,
            scale: params.scale.as_tensor().copy()?,
            verts: verts.detach(),
            joints: joints.detach(),
        })
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let tensors: HashMap<&str, Tensor> = [
            ("pose", self.pose.clone()),
            ("shape", self.shape.clone()),
            ("scale", self.scale.clone()),
            ("verts", self.verts.clone()),
            ("joints", self.joints.clone()),
        ]
        .into_iter()
        .collect();

        candle_core::safetensors::save(&tensors, path.as_ref())?;
        log::info!(
            "Saved snapshot of epoch {} (loss {:.6}) to {}",
            self.epoch,
            self.loss,
            path.as_ref().display()
        );
        Ok(())
    }
}
