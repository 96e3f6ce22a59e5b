//! Render and scene settings, loadable from a JSON document of the form
//! `{ "render": { ... }, "scene": { ... } }`. Missing fields take defaults.

use crate::math::{v, V3};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::{error, fmt, fs, io};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub render: RenderConfig,
    pub scene: SceneConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub width: u32,
    pub height: u32,
    /// Frame rate used to turn frame indices into milliseconds.
    pub fps: f64,
    /// Samples per axis in each pixel.
    pub antialias: u32,
    /// Randomize sample positions inside their subpixel cells.
    pub jitter: bool,
    pub seed: u64,
    pub frames: u64,
    pub start_frame: u64,
    pub output: PathBuf,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            width: 640,
            height: 360,
            fps: 60.,
            antialias: 1,
            jitter: false,
            seed: 0,
            frames: 1,
            start_frame: 0,
            output: PathBuf::from("out.png"),
        }
    }
}

impl RenderConfig {
    /// Where frame `frame` is written. A single-frame render uses `output` as is,
    /// a sequence numbers each file as `<stem>_<frame:04>.<ext>`.
    pub fn frame_path(&self, frame: u64) -> PathBuf {
        if self.frames <= 1 {
            return self.output.clone();
        }
        let stem = self
            .output
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "frame".to_string());
        let ext = self
            .output
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_else(|| "png".to_string());
        self.output
            .with_file_name(format!("{}_{:04}.{}", stem, frame, ext))
    }
}

/// Placement of the sphere and the light. The ground plane is always `y = 0`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub sphere_center: V3,
    pub sphere_radius: f64,
    pub light_base: V3,
    pub orbit_radius: f64,
    /// Milliseconds per radian of light orbit.
    pub orbit_period: f64,
    /// Factor applied to diffuse light in shadow.
    pub shadow_floor: f64,
}

impl Default for SceneConfig {
    fn default() -> Self {
        SceneConfig {
            sphere_center: v(2., 1., 10.),
            sphere_radius: 1.,
            light_base: v(2., 1., 10.),
            orbit_radius: 5.,
            orbit_period: 2000.,
            shadow_floor: 0.1,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(io::Error),
    Parse(serde_json::Error),
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "could not read config: {}", e),
            ConfigError::Parse(e) => write!(f, "could not parse config: {}", e),
            ConfigError::Invalid(msg) => write!(f, "invalid config: {}", msg),
        }
    }
}

impl error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
            ConfigError::Invalid(_) => None,
        }
    }
}

impl From<io::Error> for ConfigError {
    fn from(e: io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Parse(e)
    }
}

impl Config {
    pub fn from_json(src: &str) -> Result<Config, ConfigError> {
        let config: Config = serde_json::from_str(src)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        let src = fs::read_to_string(path)?;
        Config::from_json(&src)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let r = &self.render;
        if r.width == 0 || r.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "frame size {}x{} has a zero side",
                r.width, r.height
            )));
        }
        if !(r.fps > 0.) || !r.fps.is_finite() {
            return Err(ConfigError::Invalid(format!("fps must be positive, got {}", r.fps)));
        }
        if r.antialias == 0 {
            return Err(ConfigError::Invalid("antialias must be at least 1".into()));
        }
        if r.frames == 0 {
            return Err(ConfigError::Invalid("frames must be at least 1".into()));
        }
        if r.start_frame.checked_add(r.frames).is_none() {
            return Err(ConfigError::Invalid(format!(
                "{} frames from frame {} run past the last frame index",
                r.frames, r.start_frame
            )));
        }
        let s = &self.scene;
        if !(s.sphere_radius >= 0.) || !(s.orbit_radius >= 0.) {
            return Err(ConfigError::Invalid("radii must not be negative".into()));
        }
        if s.orbit_period == 0. || !s.orbit_period.is_finite() {
            return Err(ConfigError::Invalid(format!(
                "orbit period must be finite and non-zero, got {}",
                s.orbit_period
            )));
        }
        if !(0. ..=1.).contains(&s.shadow_floor) {
            return Err(ConfigError::Invalid(format!(
                "shadow floor must be within [0, 1], got {}",
                s.shadow_floor
            )));
        }
        Ok(())
    }
}
