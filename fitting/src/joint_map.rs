use candle_core::{Device, Tensor};

use crate::error::{FitError, Result};

/// Correspondence between body-model joints and dataset joints.
///
/// Pair `i` says model joint `smpl_index[i]` lines up with dataset joint
/// `dataset_index[i]`; both sides are selected in that order so they align
/// positionally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JointMap {
    smpl_index: Vec<u32>,
    dataset_index: Vec<u32>,
}

/// The two index vectors as tensors, ready for `index_select`.
#[derive(Debug, Clone)]
pub struct JointIndex {
    pub smpl: Tensor,
    pub dataset: Tensor,
}

impl JointMap {
    /// Splits `(model, dataset)` pairs into the two index vectors.
    pub fn new(pairs: &[(usize, usize)]) -> Result<Self> {
        let mut smpl_index = Vec::with_capacity(pairs.len());
        let mut dataset_index = Vec::with_capacity(pairs.len());

        for (pair, &(model, dataset)) in pairs.iter().enumerate() {
            smpl_index.push(to_index(pair, model)?);
            dataset_index.push(to_index(pair, dataset)?);
        }

        Ok(Self {
            smpl_index,
            dataset_index,
        })
    }

    pub fn smpl_index(&self) -> &[u32] {
        &self.smpl_index
    }

    pub fn dataset_index(&self) -> &[u32] {
        &self.dataset_index
    }

    pub fn len(&self) -> usize {
        self.smpl_index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.smpl_index.is_empty()
    }

    /// Checks every pair against the joint counts on both sides.
    pub fn validate(&self, model_joints: usize, dataset_joints: usize) -> Result<()> {
        if self.is_empty() {
            return Err(FitError::EmptyJointMap);
        }

        let pairs = self.smpl_index.iter().zip(&self.dataset_index);
        for (pair, (&model, &dataset)) in pairs.enumerate() {
            if model as usize >= model_joints || dataset as usize >= dataset_joints {
                return Err(FitError::JointOutOfRange {
                    pair,
                    model: model as usize,
                    dataset: dataset as usize,
                    model_joints,
                    dataset_joints,
                });
            }
        }
        Ok(())
    }

    pub fn tensors(&self, device: &Device) -> Result<JointIndex> {
        let len = self.len();
        Ok(JointIndex {
            smpl: Tensor::from_slice(self.smpl_index.as_slice(), len, device)?,
            dataset: Tensor::from_slice(self.dataset_index.as_slice(), len, device)?,
        })
    }
}

fn to_index(pair: usize, index: usize) -> Result<u32> {
    u32::try_from(index).map_err(|_| FitError::JointIndexOverflow { pair, index })
}

impl JointIndex {
    /// Selects mapped joints from (batch, model_joints, 3) model output.
    pub fn select_model(&self, joints: &Tensor) -> Result<Tensor> {
        Ok(joints.index_select(&self.smpl, 1)?)
    }

    /// Selects mapped joints from (batch, dataset_joints, 3) targets.
    pub fn select_dataset(&self, target: &Tensor) -> Result<Tensor> {
        Ok(target.index_select(&self.dataset, 1)?)
    }
}
