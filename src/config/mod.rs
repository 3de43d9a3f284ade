//! Configuration module.
//!
//! Provides [`AssistantConfig`] (top-level settings), sub-configs for the
//! avatar renderer, the realtime speech API and the audio path, plus
//! [`AppPaths`] for the platform config directory.  Persistence is TOML via
//! `AssistantConfig::load` / `AssistantConfig::save`.

pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{AssistantConfig, AudioConfig, AvatarConfig, RealtimeConfig, Voice};
