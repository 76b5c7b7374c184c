use std::collections::HashMap;
use std::path::Path;

use candle_core::{bail, DType, Device, Error, Result, Tensor};

use crate::model::{BodyModel, BodyOutput};

const V_TEMPLATE: &str = "v_template";
const SHAPEDIRS: &str = "shapedirs";
const POSEDIRS: &str = "posedirs";
const J_REGRESSOR: &str = "J_regressor";

/// Body built from linear blend shapes only.
///
/// `verts = template + shapedirs * shape + posedirs * pose` and joints are
/// regressed from the vertices. There is no articulated skinning, so the pose
/// vector acts as a set of corrective offsets rather than joint rotations.
pub struct BlendShapeModel {
    // (1, V * 3)
    v_template: Tensor,
    // (S, V * 3)
    shapedirs: Tensor,
    // (P, V * 3)
    posedirs: Tensor,
    // (J, V)
    j_regressor: Tensor,
    num_verts: usize,
    num_joints: usize,
    shape_dim: usize,
    pose_dim: usize,
}

impl BlendShapeModel {
    /// Shapes: `v_template` (V, 3), `shapedirs` (V, 3, S), `posedirs` (V, 3, P),
    /// `j_regressor` (J, V).
    pub fn new(
        v_template: Tensor,
        shapedirs: Tensor,
        posedirs: Tensor,
        j_regressor: Tensor,
    ) -> Result<Self> {
        let (num_verts, coords) = v_template.dims2()?;
        if coords != 3 {
            bail!("{} must be (V, 3), got {:?}", V_TEMPLATE, v_template.shape());
        }

        let (sv, sc, shape_dim) = shapedirs.dims3()?;
        if (sv, sc) != (num_verts, 3) {
            bail!(
                "{} must be ({}, 3, S), got {:?}",
                SHAPEDIRS,
                num_verts,
                shapedirs.shape()
            );
        }

        let (pv, pc, pose_dim) = posedirs.dims3()?;
        if (pv, pc) != (num_verts, 3) {
            bail!(
                "{} must be ({}, 3, P), got {:?}",
                POSEDIRS,
                num_verts,
                posedirs.shape()
            );
        }

        let (num_joints, rv) = j_regressor.dims2()?;
        if rv != num_verts {
            bail!(
                "{} must be (J, {}), got {:?}",
                J_REGRESSOR,
                num_verts,
                j_regressor.shape()
            );
        }

        Ok(Self {
            v_template: v_template
                .to_dtype(DType::F32)?
                .reshape((1, num_verts * 3))?,
            shapedirs: flatten_dirs(&shapedirs, num_verts, shape_dim)?,
            posedirs: flatten_dirs(&posedirs, num_verts, pose_dim)?,
            j_regressor: j_regressor.to_dtype(DType::F32)?,
            num_verts,
            num_joints,
            shape_dim,
            pose_dim,
        })
    }

    pub fn load<P: AsRef<Path>>(path: P, device: &Device) -> Result<Self> {
        let path = path.as_ref();
        let mut tensors = candle_core::safetensors::load(path, device)?;

        let mut take = |name: &str| {
            tensors
                .remove(name)
                .ok_or_else(|| Error::Msg(format!("missing '{}' in {}", name, path.display())))
        };

        let v_template = take(V_TEMPLATE)?;
        let shapedirs = take(SHAPEDIRS)?;
        let posedirs = take(POSEDIRS)?;
        let j_regressor = take(J_REGRESSOR)?;

        let model = Self::new(v_template, shapedirs, posedirs, j_regressor)?;
        log::info!(
            "Loaded body model from {}: {} verts, {} joints, {} shape / {} pose coefficients",
            path.display(),
            model.num_verts,
            model.num_joints,
            model.shape_dim,
            model.pose_dim
        );
        Ok(model)
    }

    /// Writes the model in the layout `load` expects.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut tensors = HashMap::new();
        tensors.insert(
            V_TEMPLATE.to_string(),
            self.v_template.reshape((self.num_verts, 3))?,
        );
        tensors.insert(
            SHAPEDIRS.to_string(),
            unflatten_dirs(&self.shapedirs, self.num_verts, self.shape_dim)?,
        );
        tensors.insert(
            POSEDIRS.to_string(),
            unflatten_dirs(&self.posedirs, self.num_verts, self.pose_dim)?,
        );
        tensors.insert(J_REGRESSOR.to_string(), self.j_regressor.clone());
        candle_core::safetensors::save(&tensors, path.as_ref())
    }

    pub fn num_verts(&self) -> usize {
        self.num_verts
    }
}

impl BodyModel for BlendShapeModel {
    fn pose_dim(&self) -> usize {
        self.pose_dim
    }

    fn shape_dim(&self) -> usize {
        self.shape_dim
    }

    fn num_joints(&self) -> usize {
        self.num_joints
    }

    fn forward(&self, pose: &Tensor, shape: &Tensor) -> Result<BodyOutput> {
        let (batch, pose_dim) = pose.dims2()?;
        let (shape_batch, shape_dim) = shape.dims2()?;
        if pose_dim != self.pose_dim || shape_dim != self.shape_dim || shape_batch != batch {
            bail!(
                "expected pose (B, {}) and shape (B, {}), got {:?} and {:?}",
                self.pose_dim,
                self.shape_dim,
                pose.shape(),
                shape.shape()
            );
        }

        let offsets = (shape.matmul(&self.shapedirs)? + pose.matmul(&self.posedirs)?)?;
        let verts = offsets
            .broadcast_add(&self.v_template)?
            .reshape((batch, self.num_verts, 3))?;

        let regressor = self
            .j_regressor
            .unsqueeze(0)?
            .broadcast_as((batch, self.num_joints, self.num_verts))?
            .contiguous()?;
        let joints = regressor.matmul(&verts)?;

        Ok(BodyOutput { verts, joints })
    }
}

// (V, 3, N) -> (N, V * 3)
fn flatten_dirs(dirs: &Tensor, num_verts: usize, n: usize) -> Result<Tensor> {
    dirs.to_dtype(DType::F32)?
        .permute((2, 0, 1))?
        .contiguous()?
        .reshape((n, num_verts * 3))
}

// (N, V * 3) -> (V, 3, N)
fn unflatten_dirs(dirs: &Tensor, num_verts: usize, n: usize) -> Result<Tensor> {
    dirs.reshape((n, num_verts, 3))?
        .permute((1, 2, 0))?
        .contiguous()
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::Var;

    // Two vertices, two joints, one shape and two pose coefficients.
    fn tiny_model() -> Result<BlendShapeModel> {
        let device = Device::Cpu;
        let v_template = Tensor::new(&[[0f32, 0., 0.], [1., 1., 1.]], &device)?;
        let shapedirs = Tensor::new(&[[[1f32], [0.], [0.]], [[1.], [0.], [0.]]], &device)?;
        let posedirs = Tensor::new(
            &[[[0f32, 0.], [1., 0.], [0., 0.]], [[0., 0.], [0., 0.], [0., 2.]]],
            &device,
        )?;
        let j_regressor = Tensor::new(&[[1f32, 0.], [0.5, 0.5]], &device)?;
        BlendShapeModel::new(v_template, shapedirs, posedirs, j_regressor)
    }

    #[test]
    fn test_dimensions() -> Result<()> {
        let model = tiny_model()?;
        assert_eq!(model.num_verts(), 2);
        assert_eq!(model.num_joints(), 2);
        assert_eq!(model.shape_dim(), 1);
        assert_eq!(model.pose_dim(), 2);
        Ok(())
    }

    #[test]
    fn test_zero_params_regress_template() -> Result<()> {
        let model = tiny_model()?;
        let pose = Tensor::zeros((1, 2), DType::F32, &Device::Cpu)?;
        let shape = Tensor::zeros((1, 1), DType::F32, &Device::Cpu)?;

        let out = model.forward(&pose, &shape)?;
        assert_eq!(out.verts.dims(), &[1, 2, 3]);
        assert_eq!(out.joints.dims(), &[1, 2, 3]);

        let joints = out.joints.to_vec3::<f32>()?;
        assert_eq!(joints[0][0], vec![0.0, 0.0, 0.0]);
        assert_eq!(joints[0][1], vec![0.5, 0.5, 0.5]);
        Ok(())
    }

    #[test]
    fn test_blend_offsets() -> Result<()> {
        let model = tiny_model()?;
        let pose = Tensor::new(&[[1f32, 1.]], &Device::Cpu)?;
        let shape = Tensor::new(&[[2f32]], &Device::Cpu)?;

        let verts = model.forward(&pose, &shape)?.verts.to_vec3::<f32>()?;
        // Shape moves both vertices along x, pose adds y to the first and 2z to the second.
        assert_eq!(verts[0][0], vec![2.0, 1.0, 0.0]);
        assert_eq!(verts[0][1], vec![3.0, 1.0, 3.0]);
        Ok(())
    }

    #[test]
    fn test_batched_forward() -> Result<()> {
        let model = tiny_model()?;
        let pose = Tensor::zeros((3, 2), DType::F32, &Device::Cpu)?;
        let shape = Tensor::zeros((3, 1), DType::F32, &Device::Cpu)?;

        let out = model.forward(&pose, &shape)?;
        assert_eq!(out.joints.dims(), &[3, 2, 3]);
        Ok(())
    }

    #[test]
    fn test_rejects_wrong_pose_dim() -> Result<()> {
        let model = tiny_model()?;
        let pose = Tensor::zeros((1, 72), DType::F32, &Device::Cpu)?;
        let shape = Tensor::zeros((1, 1), DType::F32, &Device::Cpu)?;
        assert!(model.forward(&pose, &shape).is_err());
        Ok(())
    }

    #[test]
    fn test_rejects_mismatched_regressor() {
        let device = Device::Cpu;
        let result = (|| -> Result<BlendShapeModel> {
            let v_template = Tensor::zeros((2, 3), DType::F32, &device)?;
            let shapedirs = Tensor::zeros((2, 3, 1), DType::F32, &device)?;
            let posedirs = Tensor::zeros((2, 3, 1), DType::F32, &device)?;
            let j_regressor = Tensor::zeros((1, 5), DType::F32, &device)?;
            BlendShapeModel::new(v_template, shapedirs, posedirs, j_regressor)
        })();
        assert!(result.is_err());
    }

    #[test]
    fn test_gradients_reach_pose_and_shape() -> Result<()> {
        let model = tiny_model()?;
        let pose = Var::zeros((1, 2), DType::F32, &Device::Cpu)?;
        let shape = Var::zeros((1, 1), DType::F32, &Device::Cpu)?;

        let out = model.forward(pose.as_tensor(), shape.as_tensor())?;
        let grads = out.joints.sum_all()?.backward()?;

        assert!(grads.get(pose.as_tensor()).is_some());
        assert!(grads.get(shape.as_tensor()).is_some());
        Ok(())
    }

    #[test]
    fn test_save_and_load() -> Result<()> {
        let model = tiny_model()?;
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("body.safetensors");
        model.save(&path)?;

        let loaded = BlendShapeModel::load(&path, &Device::Cpu)?;
        assert_eq!(loaded.num_joints(), 2);
        assert_eq!(loaded.pose_dim(), 2);

        let pose = Tensor::new(&[[0.5f32, -1.]], &Device::Cpu)?;
        let shape = Tensor::new(&[[0.25f32]], &Device::Cpu)?;
        let a = model.forward(&pose, &shape)?.joints.to_vec3::<f32>()?;
        let b = loaded.forward(&pose, &shape)?.joints.to_vec3::<f32>()?;
        assert_eq!(a, b);
        Ok(())
    }
}
