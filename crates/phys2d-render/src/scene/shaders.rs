/// Uniform names shared by the bundled programs.
pub const PROJ_MAT: &str = "proj_mat";
pub const WORLD_MAT: &str = "world_mat";
/// Body color; shape program only.
pub const ALBEDO: &str = "albedo";

/// WGSL sources of one program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderSource {
    pub vertex: String,
    pub fragment: String,
}

impl ShaderSource {
    pub fn new(vertex: impl Into<String>, fragment: impl Into<String>) -> Self {
        Self {
            vertex: vertex.into(),
            fragment: fragment.into(),
        }
    }
}

/// Programs used by [`super::WorldRenderer`].
///
/// `shape` draws plain outlines with `proj_mat`, `world_mat` and `albedo`;
/// `joint` draws colored vertices with `proj_mat` and `world_mat`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderSet {
    pub shape: ShaderSource,
    pub joint: ShaderSource,
}

impl Default for ShaderSet {
    fn default() -> Self {
        Self {
            shape: ShaderSource::new(
                include_str!("shaders/shape.vert.wgsl"),
                include_str!("shaders/shape.frag.wgsl"),
            ),
            joint: ShaderSource::new(
                include_str!("shaders/joint.vert.wgsl"),
                include_str!("shaders/joint.frag.wgsl"),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{validate_program, UniformKind};

    #[test]
    fn bundled_programs_satisfy_the_uniform_contract() {
        let shaders = ShaderSet::default();

        let shape = validate_program(&shaders.shape.vertex, &shaders.shape.fragment).unwrap();
        assert_eq!(shape.slot(PROJ_MAT).map(|s| s.kind), Some(UniformKind::Mat4));
        assert_eq!(shape.slot(WORLD_MAT).map(|s| s.kind), Some(UniformKind::Mat4));
        assert_eq!(shape.slot(ALBEDO).map(|s| s.kind), Some(UniformKind::Vec4));

        let joint = validate_program(&shaders.joint.vertex, &shaders.joint.fragment).unwrap();
        assert!(joint.slot(PROJ_MAT).is_some());
        assert!(joint.slot(WORLD_MAT).is_some());
        assert!(joint.slot(ALBEDO).is_none());
    }
}
