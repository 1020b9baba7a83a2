//! WGSL program validation and uniform reflection.
//!
//! Each stage is parsed and validated with naga. The link step checks the entry
//! points and that both stages agree on the uniform block at
//! `@group(0) @binding(0)`, which is the only resource a program may declare.

use std::fmt;

use naga::valid::{Capabilities, ValidationFlags, Validator};

/// Upper bound for a program's uniform block, in bytes.
pub const MAX_UNIFORM_BLOCK_SIZE: u32 = 256;

const VERTEX_ENTRY: &str = "vs_main";
const FRAGMENT_ENTRY: &str = "fs_main";

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    fn naga(self) -> naga::ShaderStage {
        match self {
            ShaderStage::Vertex => naga::ShaderStage::Vertex,
            ShaderStage::Fragment => naga::ShaderStage::Fragment,
        }
    }

    fn entry_point(self) -> &'static str {
        match self {
            ShaderStage::Vertex => VERTEX_ENTRY,
            ShaderStage::Fragment => FRAGMENT_ENTRY,
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShaderError {
    #[error("{stage} shader failed to compile:\n{log}")]
    Compile { stage: ShaderStage, log: String },
    #[error("shader program failed to link: {log}")]
    Link { log: String },
}

impl ShaderError {
    fn link(log: impl Into<String>) -> Self {
        ShaderError::Link { log: log.into() }
    }
}

/// Type of a settable uniform member.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum UniformKind {
    Vec4,
    Mat4,
}

impl UniformKind {
    #[inline]
    pub const fn size(self) -> u32 {
        match self {
            UniformKind::Vec4 => 16,
            UniformKind::Mat4 => 64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformSlot {
    pub name: String,
    pub kind: UniformKind,
    /// Byte offset inside the uniform block.
    pub offset: u32,
}

/// Reflected uniform block of a linked program.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgramLayout {
    slots: Vec<UniformSlot>,
    block_size: u32,
}

impl ProgramLayout {
    pub fn slot(&self, name: &str) -> Option<&UniformSlot> {
        self.slots.iter().find(|s| s.name == name)
    }

    pub fn slots(&self) -> &[UniformSlot] {
        &self.slots
    }

    /// Size of the uniform block; zero when the program declares none.
    #[inline]
    pub fn block_size(&self) -> u32 {
        self.block_size
    }
}

/// Validates both stages and links them into a [`ProgramLayout`].
pub fn validate_program(vertex: &str, fragment: &str) -> Result<ProgramLayout, ShaderError> {
    let vs = compile_stage(vertex, ShaderStage::Vertex)?;
    let fs = compile_stage(fragment, ShaderStage::Fragment)?;

    for (module, stage) in [(&vs, ShaderStage::Vertex), (&fs, ShaderStage::Fragment)] {
        let found = module
            .entry_points
            .iter()
            .any(|ep| ep.stage == stage.naga() && ep.name == stage.entry_point());
        if !found {
            return Err(ShaderError::link(format!(
                "{stage} module has no `{}` entry point",
                stage.entry_point()
            )));
        }
    }

    let layout = match (uniform_block(&vs)?, uniform_block(&fs)?) {
        (Some(a), Some(b)) if a != b => {
            return Err(ShaderError::link("uniform block differs between stages"));
        }
        (Some(a), _) => a,
        (None, Some(b)) => b,
        (None, None) => ProgramLayout::default(),
    };

    if layout.block_size > MAX_UNIFORM_BLOCK_SIZE {
        return Err(ShaderError::link(format!(
            "uniform block is {} bytes, limit is {MAX_UNIFORM_BLOCK_SIZE}",
            layout.block_size
        )));
    }

    Ok(layout)
}

fn compile_stage(source: &str, stage: ShaderStage) -> Result<naga::Module, ShaderError> {
    let module = naga::front::wgsl::parse_str(source).map_err(|e| ShaderError::Compile {
        stage,
        log: e.emit_to_string(source),
    })?;

    Validator::new(ValidationFlags::all(), Capabilities::empty())
        .validate(&module)
        .map_err(|e| ShaderError::Compile {
            stage,
            log: e.emit_to_string(source),
        })?;

    Ok(module)
}

fn uniform_block(module: &naga::Module) -> Result<Option<ProgramLayout>, ShaderError> {
    let mut block = None;

    for (_, var) in module.global_variables.iter() {
        let Some(binding) = &var.binding else { continue };
        let name = var.name.as_deref().unwrap_or("<unnamed>");

        if binding.group != 0 || binding.binding != 0 {
            return Err(ShaderError::link(format!(
                "`{name}` is bound at @group({}) @binding({}); only @group(0) @binding(0) is supported",
                binding.group, binding.binding
            )));
        }
        if var.space != naga::AddressSpace::Uniform {
            return Err(ShaderError::link(format!("`{name}` must be a uniform buffer")));
        }

        let naga::TypeInner::Struct { members, span } = &module.types[var.ty].inner else {
            return Err(ShaderError::link(format!("uniform `{name}` must be a struct")));
        };

        let slots = members
            .iter()
            .filter_map(|m| {
                let kind = uniform_kind(&module.types[m.ty].inner)?;
                Some(UniformSlot {
                    name: m.name.clone()?,
                    kind,
                    offset: m.offset,
                })
            })
            .collect();

        block = Some(ProgramLayout {
            slots,
            block_size: *span,
        });
    }

    Ok(block)
}

fn uniform_kind(inner: &naga::TypeInner) -> Option<UniformKind> {
    use naga::{Scalar, TypeInner, VectorSize};

    match inner {
        TypeInner::Vector {
            size: VectorSize::Quad,
            scalar,
        } if *scalar == Scalar::F32 => Some(UniformKind::Vec4),
        TypeInner::Matrix {
            columns: VectorSize::Quad,
            rows: VectorSize::Quad,
            scalar,
        } if *scalar == Scalar::F32 => Some(UniformKind::Mat4),
        _ => None,
    }
}
