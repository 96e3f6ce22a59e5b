pub mod config;
pub mod frame;
pub mod marcher;
pub mod math;
pub mod scene;

pub use config::{Config, ConfigError, RenderConfig, SceneConfig};
pub use frame::{render_frame, Frame, Resolution, Sampling};
pub use scene::{Color, Scene};
