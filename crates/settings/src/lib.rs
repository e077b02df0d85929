use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::de::{self, Deserializer};
use serde::Deserialize;

pub const DEFAULT_WIDTH: u32 = 640;
pub const DEFAULT_HEIGHT: u32 = 480;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read settings at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse settings: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid settings: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorSpace {
    #[default]
    Auto,
    Gamma,
    Linear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShaderBackend {
    #[default]
    Naga,
    Shaderc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerPreference {
    Low,
    #[default]
    High,
}

macro_rules! impl_from_str {
    ($ty:ty, $what:literal, { $($name:literal => $variant:expr),+ $(,)? }) => {
        impl FromStr for $ty {
            type Err = String;

            fn from_str(raw: &str) -> Result<Self, Self::Err> {
                match raw.trim().to_ascii_lowercase().as_str() {
                    $($name => Ok($variant),)+
                    other => Err(format!(
                        concat!("invalid ", $what, " '{}'; expected one of: {}"),
                        other,
                        [$($name),+].join(", ")
                    )),
                }
            }
        }
    };
}

impl_from_str!(ColorSpace, "color space", {
    "auto" => ColorSpace::Auto,
    "gamma" => ColorSpace::Gamma,
    "linear" => ColorSpace::Linear,
});

impl_from_str!(ShaderBackend, "shader compiler", {
    "naga" => ShaderBackend::Naga,
    "shaderc" => ShaderBackend::Shaderc,
});

impl_from_str!(PowerPreference, "power preference", {
    "low" => PowerPreference::Low,
    "high" => PowerPreference::High,
});

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct WindowSettings {
    pub width: u32,
    pub height: u32,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GpuSettings {
    pub power: PowerPreference,
    pub vsync: bool,
    pub color_space: ColorSpace,
    pub shader_compiler: ShaderBackend,
}

impl Default for GpuSettings {
    fn default() -> Self {
        Self {
            power: PowerPreference::default(),
            vsync: true,
            color_space: ColorSpace::default(),
            shader_compiler: ShaderBackend::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RunSettings {
    /// Example opened first when none is named on the command line.
    pub start: Option<String>,
    pub fps: Option<f32>,
    /// Constant frame delta instead of wall-clock time.
    #[serde(deserialize_with = "deserialize_duration_opt")]
    pub fixed_delta: Option<Duration>,
    pub content_dir: Option<PathBuf>,
}

/// Contents of `gallery.toml`. Every section and key is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct GallerySettings {
    pub window: WindowSettings,
    pub gpu: GpuSettings,
    pub run: RunSettings,
}

fn deserialize_duration_opt<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    struct Visitor;
    impl<'de> de::Visitor<'de> for Visitor {
        type Value = Option<Duration>;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a duration as number of seconds or human-readable string")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            humantime::parse_duration(v)
                .map(Some)
                .map_err(|err| E::custom(format!("invalid duration '{v}': {err}")))
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(Duration::from_secs(v)))
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            u64::try_from(v)
                .map(|secs| Some(Duration::from_secs(secs)))
                .map_err(|_| E::custom("duration must be non-negative"))
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if !v.is_finite() || v.is_sign_negative() {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Some(Duration::from_secs_f64(v)))
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }
    }

    deserializer.deserialize_any(Visitor)
}

impl GallerySettings {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let raw: GallerySettings = toml::from_str(input)?;
        raw.validate()?;
        Ok(raw)
    }

    /// Reads `path`, or returns defaults when the file does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        match fs::read_to_string(path) {
            Ok(contents) => Self::from_toml_str(&contents),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "window size must be non-zero, got {}x{}",
                self.window.width, self.window.height
            )));
        }

        if let Some(fps) = self.run.fps {
            if !fps.is_finite() || fps < 0.0 {
                return Err(ConfigError::Invalid("run.fps must be >= 0".into()));
            }
        }

        if let Some(delta) = self.run.fixed_delta {
            if delta.is_zero() {
                return Err(ConfigError::Invalid(
                    "run.fixed_delta must be greater than zero".into(),
                ));
            }
        }

        if let Some(start) = &self.run.start {
            if start.trim().is_empty() {
                return Err(ConfigError::Invalid("run.start may not be empty".into()));
            }
        }

        Ok(())
    }
}
