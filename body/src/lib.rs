mod blend_shape;
mod model;

pub use blend_shape::BlendShapeModel;
pub use model::{BodyModel, BodyOutput, SMPL_NUM_JOINTS, SMPL_POSE_DIM, SMPL_SHAPE_DIM};
