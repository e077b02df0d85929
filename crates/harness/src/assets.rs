use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Directory (relative to the base path) holding GLSL/WGSL shader sources.
pub const SHADER_SOURCE_DIR: &str = "Content/Shaders/Source";
/// Directory (relative to the base path) holding precompiled SPIR-V blobs.
pub const SHADER_COMPILED_DIR: &str = "Content/Shaders/Compiled";

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("asset not found at {}", .0.display())]
    NotFound(PathBuf),
    #[error("failed to read asset at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl AssetError {
    pub fn path(&self) -> &Path {
        match self {
            AssetError::NotFound(path) => path,
            AssetError::Io { path, .. } => path,
        }
    }
}

/// Reads a whole asset file located under `base_path`.
pub fn load_asset(base_path: &Path, relative: impl AsRef<Path>) -> Result<Vec<u8>, AssetError> {
    let path = base_path.join(relative);
    match fs::read(&path) {
        Ok(bytes) => {
            tracing::trace!(path = %path.display(), bytes = bytes.len(), "loaded asset");
            Ok(bytes)
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => Err(AssetError::NotFound(path)),
        Err(source) => Err(AssetError::Io { path, source }),
    }
}
