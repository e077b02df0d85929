use std::env;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use directories_next::ProjectDirs;

pub const ENV_CONFIG_DIR: &str = "GALLERY_CONFIG_DIR";
pub const ENV_CONTENT_DIR: &str = "GALLERY_CONTENT_DIR";

const QUALIFIER: &str = "org";
const ORGANISATION: &str = "WgpuGallery";
const APPLICATION: &str = "gallery";
const SETTINGS_FILE: &str = "gallery.toml";

#[derive(Debug, Clone)]
pub struct GalleryPaths {
    config_dir: PathBuf,
}

impl GalleryPaths {
    pub fn discover() -> Result<Self> {
        if let Some(config_dir) = env_override(ENV_CONFIG_DIR) {
            return Ok(Self { config_dir });
        }
        let project_dirs = ProjectDirs::from(QUALIFIER, ORGANISATION, APPLICATION)
            .ok_or_else(|| anyhow!("failed to determine user directories"))?;
        Ok(Self {
            config_dir: project_dirs.config_dir().to_path_buf(),
        })
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn settings_file(&self) -> PathBuf {
        self.config_dir.join(SETTINGS_FILE)
    }
}

/// Content root: explicit flag (or `GALLERY_CONTENT_DIR`), then the
/// settings file, then the content bundled with the samples crate.
pub fn resolve_content_dir(cli: Option<&Path>, from_settings: Option<&Path>) -> PathBuf {
    cli.or(from_settings)
        .map(Path::to_path_buf)
        .unwrap_or_else(samples::content_dir)
}

fn env_override(name: &str) -> Option<PathBuf> {
    match env::var_os(name) {
        Some(value) if !value.is_empty() => Some(PathBuf::from(value)),
        _ => None,
    }
}
