use body::BodyModel;
use candle_core::{Device, Tensor};
use candle_nn::{AdamW, Optimizer, ParamsAdamW};

use crate::config::TrainConfig;
use crate::early_stop::EarlyStop;
use crate::error::Result;
use crate::joint_map::JointMap;
use crate::loss::joint_loss;
use crate::metrics::ScalarWriter;
use crate::params::BodyParams;
use crate::progress::FitProgress;
use crate::snapshot::FitSnapshot;

/// Result of a fit run.
#[derive(Debug)]
pub struct FitOutcome {
    /// Best epoch's parameters and output. `None` if no epoch ever produced a
    /// finite loss below the previous minimum (NaN or infinite losses).
    pub snapshot: Option<FitSnapshot>,
    pub min_loss: f64,
    /// Epochs actually run, including the one that triggered early stop.
    pub epochs: usize,
    pub early_stopped: bool,
}

pub struct Fitter {
    config: TrainConfig,
    joint_map: JointMap,
    device: Device,
    show_progress: bool,
}

impl Fitter {
    pub fn new(config: TrainConfig, joint_map: JointMap, device: Device) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            joint_map,
            device,
            show_progress: false,
        })
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Fits pose, shape and scale so the mapped model joints match the mapped
    /// joints of `target` (batch, dataset_joints, 3).
    pub fn fit<M: BodyModel, W: ScalarWriter>(
        &self,
        model: &M,
        target: &Tensor,
        metrics: &mut W,
    ) -> Result<FitOutcome> {
        let (batch, dataset_joints, _) = target.dims3()?;
        self.joint_map.validate(model.num_joints(), dataset_joints)?;

        let target = target.to_device(&self.device)?;
        let index = self.joint_map.tensors(&self.device)?;

        let params = BodyParams::init(
            batch,
            model.pose_dim(),
            model.shape_dim(),
            &self.config,
            &self.device,
        )?;
        let mut optimizer = AdamW::new(
            params.trainable(),
            ParamsAdamW {
                lr: self.config.learning_rate,
                weight_decay: 0.0,
                ..Default::default()
            },
        )?;

        log::info!(
            "Fitting {} sample(s) over {} joint pairs (shape: {}, scale: {}, lr: {})",
            batch,
            self.joint_map.len(),
            self.config.optimize_shape,
            self.config.optimize_scale,
            self.config.learning_rate
        );

        let progress = if self.show_progress {
            FitProgress::new(self.config.max_epoch)?
        } else {
            FitProgress::hidden()
        };

        let mut early_stop =
            EarlyStop::new(self.config.early_stop_eps, self.config.early_stop_patience);
        let mut snapshot = None;
        let mut epochs = 0;
        let mut early_stopped = false;

        for epoch in 0..self.config.max_epoch {
            epochs = epoch + 1;

            let output = model.forward(params.pose.as_tensor(), params.shape.as_tensor())?;
            let loss = joint_loss(&output.joints, &target, params.scale.as_tensor(), &index)?;
            let loss_value = loss.to_vec0::<f32>()? as f64;

            let (is_new_best, should_stop) = early_stop.update(loss_value)?;
            progress.update(loss_value, early_stop.min_loss());

            // The step writes into the vars, so copy the ones that produced `output` first.
            if is_new_best {
                snapshot = Some(FitSnapshot::capture(
                    epoch,
                    loss_value,
                    &params,
                    &output.verts,
                    &output.joints,
                )?);
            }
            optimizer.backward_step(&loss)?;

            if should_stop {
                log::info!("Early stop at epoch {} !", epoch);
                early_stopped = true;
                break;
            }

            if epoch % self.config.write == 0 {
                metrics.add_scalar("loss", loss_value, epoch)?;
                metrics.add_scalar("learning_rate", optimizer.learning_rate(), epoch)?;
            }
        }

        progress.finish(epochs, early_stop.min_loss());
        metrics.flush()?;

        log::info!("Train ended, min_loss = {:.9}", early_stop.min_loss());
        if snapshot.is_none() {
            log::warn!("No epoch improved on the initial loss, returning an empty result");
        }

        Ok(FitOutcome {
            snapshot,
            min_loss: early_stop.min_loss(),
            epochs,
            early_stopped,
        })
    }
}
