use std::collections::HashMap;
use std::ffi::CStr;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use ash::vk;
use crate::renderer::device::{PipelineDevice, Scoped};
use crate::renderer::error::{PipelineError, PipelineResult};

const SHADERS_DIR: &str = "shaders-built";
const SHADERS_DIR_ENV: &str = "SHADERS_DIR";
const ENTRY_POINT: &CStr = c"main";
const SPIRV_MAGIC: u32 = 0x0723_0203;
const SPIRV_HEADER_WORDS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderKind {
    Vertex,
    Fragment,
}

impl ShaderKind {
    pub fn stage_flags(self) -> vk::ShaderStageFlags {
        match self {
            ShaderKind::Vertex => vk::ShaderStageFlags::VERTEX,
            ShaderKind::Fragment => vk::ShaderStageFlags::FRAGMENT,
        }
    }
}

impl fmt::Display for ShaderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderKind::Vertex => write!(f, "vertex"),
            ShaderKind::Fragment => write!(f, "fragment"),
        }
    }
}

/// Resolves a logical shader name to compiled SPIR-V bytes.
pub trait ShaderSource {
    fn load(&self, name: &str) -> io::Result<Vec<u8>>;
}

impl<S: ShaderSource + ?Sized> ShaderSource for &S {
    fn load(&self, name: &str) -> io::Result<Vec<u8>> {
        (**self).load(name)
    }
}

/// In-memory shaders keyed by name.
impl ShaderSource for HashMap<String, Vec<u8>> {
    fn load(&self, name: &str) -> io::Result<Vec<u8>> {
        self.get(name).cloned().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("no shader named {name:?}"))
        })
    }
}

/// Directory of `<name>.spv` files, as written by the build script.
#[derive(Debug, Clone)]
pub struct ShaderDirectory {
    root: PathBuf,
}

impl ShaderDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `$SHADERS_DIR` if set, `shaders-built` otherwise.
    pub fn from_env() -> Self {
        match std::env::var_os(SHADERS_DIR_ENV) {
            Some(dir) => Self::new(dir),
            None => Self::default(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_of(&self, name: &str) -> PathBuf {
        self.root.join(format!("{}.spv", name))
    }
}

impl Default for ShaderDirectory {
    fn default() -> Self {
        Self::new(SHADERS_DIR)
    }
}

impl ShaderSource for ShaderDirectory {
    fn load(&self, name: &str) -> io::Result<Vec<u8>> {
        std::fs::read(self.path_of(name))
    }
}

/// A shader module living only as long as pipeline creation needs it.
pub(crate) struct ShaderStage<'d, D: PipelineDevice> {
    kind: ShaderKind,
    module: Scoped<'d, D, vk::ShaderModule>,
}

impl<'d, D: PipelineDevice> ShaderStage<'d, D> {
    pub(crate) fn load<S: ShaderSource + ?Sized>(
        device: &'d D,
        shaders: &S,
        name: &str,
        kind: ShaderKind,
    ) -> PipelineResult<Self> {
        let bytes = shaders.load(name).map_err(|source| PipelineError::Load {
            name: name.to_owned(),
            source,
        })?;
        log::debug!("Loaded {} shader {:?} ({} bytes)", kind, name, bytes.len());

        let code = decode_spirv(&bytes).map_err(|reason| PipelineError::StageCreation {
            name: name.to_owned(),
            kind,
            reason,
        })?;

        let module_info = vk::ShaderModuleCreateInfo::default().code(&code);
        let module = unsafe { device.create_shader_module(&module_info) }.map_err(|err| {
            PipelineError::StageCreation {
                name: name.to_owned(),
                kind,
                reason: format!("driver rejected the module: {}", err),
            }
        })?;

        Ok(Self {
            kind,
            module: Scoped::new(device, module, D::destroy_shader_module),
        })
    }

    pub(crate) fn create_info(&self) -> vk::PipelineShaderStageCreateInfo<'static> {
        vk::PipelineShaderStageCreateInfo::default()
            .stage(self.kind.stage_flags())
            .module(self.module.handle())
            .name(ENTRY_POINT)
    }
}

/// Turns raw bytes into SPIR-V words, rejecting anything the driver would
/// only choke on later.
pub fn decode_spirv(bytes: &[u8]) -> Result<Vec<u32>, String> {
    if bytes.is_empty() {
        return Err("bytecode is empty".to_owned());
    }
    let words = ash::util::read_spv(&mut io::Cursor::new(bytes))
        .map_err(|err| format!("bytecode is not SPIR-V: {}", err))?;
    if words.len() < SPIRV_HEADER_WORDS {
        return Err(format!(
            "bytecode is {} bytes, shorter than a SPIR-V header",
            bytes.len(),
        ));
    }
    if words[0] != SPIRV_MAGIC {
        return Err(format!("bad SPIR-V magic number {:#010x}", words[0]));
    }
    Ok(words)
}
