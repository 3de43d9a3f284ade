//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and handed to the
//! session by value.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;

// ---------------------------------------------------------------------------
// Voice
// ---------------------------------------------------------------------------

/// Synthesised voice used by the realtime speech API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Voice {
    Alloy,
    Ash,
    Ballad,
    Coral,
    Echo,
    Sage,
    Shimmer,
    Verse,
}

impl Voice {
    /// Identifier as sent to the realtime API.
    pub fn as_str(&self) -> &'static str {
        match self {
            Voice::Alloy => "alloy",
            Voice::Ash => "ash",
            Voice::Ballad => "ballad",
            Voice::Coral => "coral",
            Voice::Echo => "echo",
            Voice::Sage => "sage",
            Voice::Shimmer => "shimmer",
            Voice::Verse => "verse",
        }
    }
}

impl Default for Voice {
    fn default() -> Self {
        Self::Alloy
    }
}

// ---------------------------------------------------------------------------
// AvatarConfig
// ---------------------------------------------------------------------------

/// Settings handed to the avatar renderer when a session starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AvatarConfig {
    /// Face identifier of the rendered avatar.
    pub face_id: String,
    /// Environment variable holding the avatar API key.
    pub api_key_env: String,
    /// Let the renderer animate idle silence between speech chunks.
    pub handle_silence: bool,
    /// Hard limit on a session's length, in seconds.
    pub max_session_secs: u64,
    /// Idle time after which the renderer ends the session, in seconds.
    pub max_idle_secs: u64,
}

impl Default for AvatarConfig {
    fn default() -> Self {
        Self {
            face_id: String::new(),
            api_key_env: "AVATAR_API_KEY".into(),
            handle_silence: true,
            max_session_secs: 6_000,
            max_idle_secs: 6_000,
        }
    }
}

impl AvatarConfig {
    /// Read the API key from [`api_key_env`](Self::api_key_env).
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env).ok().filter(|k| !k.is_empty())
    }
}

// ---------------------------------------------------------------------------
// RealtimeConfig
// ---------------------------------------------------------------------------

/// Session parameters for the realtime speech/LLM API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RealtimeConfig {
    /// Model identifier.
    pub model: String,
    /// Environment variable holding the realtime API key.
    pub api_key_env: String,
    pub voice: Voice,
    /// System instructions that open the conversation.
    pub instructions: String,
    /// Turn detection mode (`"server_vad"` lets the server detect speech end).
    pub turn_detection: String,
    /// Model used to transcribe the user's speech.
    pub transcription_model: String,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini-realtime-preview-2024-12-17".into(),
            api_key_env: "REALTIME_API_KEY".into(),
            voice: Voice::default(),
            instructions: "You are a friendly assistant on a personal portfolio site. \
                           Greet the visitor and answer questions about the owner's work."
                .into(),
            turn_detection: "server_vad".into(),
            transcription_model: "whisper-1".into(),
        }
    }
}

impl RealtimeConfig {
    /// Read the API key from [`api_key_env`](Self::api_key_env).
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env).ok().filter(|k| !k.is_empty())
    }
}

// ---------------------------------------------------------------------------
// AudioConfig
// ---------------------------------------------------------------------------

/// Sample rates and buffer sizes of the audio path.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Rate of PCM exchanged with the realtime API, both directions (Hz).
    pub realtime_rate: u32,
    /// Rate the avatar renderer expects (Hz).
    pub avatar_rate: u32,
    /// Fixed microphone buffer size in frames; `0` keeps the device default.
    pub capture_buffer_frames: u32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            realtime_rate: 24_000,
            avatar_rate: 16_000,
            capture_buffer_frames: 2_048,
        }
    }
}

impl AudioConfig {
    /// Buffer size request for [`crate::audio::AudioCapture::new`].
    pub fn capture_buffer(&self) -> Option<u32> {
        (self.capture_buffer_frames > 0).then_some(self.capture_buffer_frames)
    }
}

// ---------------------------------------------------------------------------
// AssistantConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level configuration, serialised as `settings.toml`.
///
/// ```rust,no_run
/// use avatar_assistant::config::AssistantConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AssistantConfig::load().unwrap();
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    pub avatar: AvatarConfig,
    pub realtime: RealtimeConfig,
    pub audio: AudioConfig,
}

impl AssistantConfig {
    /// Load from the platform `settings.toml`, or defaults when absent.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path.
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save to the platform `settings.toml`, creating parent directories.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path.
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn default_values() {
        let cfg = AssistantConfig::default();

        assert_eq!(cfg.audio.realtime_rate, 24_000);
        assert_eq!(cfg.audio.avatar_rate, 16_000);
        assert_eq!(cfg.audio.capture_buffer(), Some(2_048));
        assert_eq!(cfg.realtime.voice, Voice::Alloy);
        assert_eq!(cfg.realtime.turn_detection, "server_vad");
        assert_eq!(cfg.realtime.transcription_model, "whisper-1");
        assert!(cfg.avatar.handle_silence);
        assert_eq!(cfg.avatar.max_session_secs, 6_000);
        assert_eq!(cfg.avatar.max_idle_secs, 6_000);
    }

    #[test]
    fn round_trip_modified_values() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("nested").join("settings.toml");

        let mut cfg = AssistantConfig::default();
        cfg.avatar.face_id = "face-123".into();
        cfg.realtime.voice = Voice::Shimmer;
        cfg.realtime.instructions = "Be brief.".into();
        cfg.audio.avatar_rate = 8_000;
        cfg.audio.capture_buffer_frames = 0;

        cfg.save_to(&path).expect("save");
        let loaded = AssistantConfig::load_from(&path).expect("load");

        assert_eq!(loaded.avatar.face_id, "face-123");
        assert_eq!(loaded.realtime.voice, Voice::Shimmer);
        assert_eq!(loaded.realtime.instructions, "Be brief.");
        assert_eq!(loaded.audio.avatar_rate, 8_000);
        assert_eq!(loaded.audio.capture_buffer(), None);
    }

    #[test]
    fn load_missing_returns_default() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("nonexistent.toml");

        let cfg = AssistantConfig::load_from(&path).expect("should not error");
        assert_eq!(cfg.audio.realtime_rate, 24_000);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("partial.toml");
        std::fs::write(
            &path,
            "[audio]\nrealtime_rate = 48000\navatar_rate = 16000\ncapture_buffer_frames = 1024\n",
        )
        .expect("write");

        let cfg = AssistantConfig::load_from(&path).expect("load");
        assert_eq!(cfg.audio.realtime_rate, 48_000);
        assert_eq!(cfg.realtime.voice, Voice::Alloy);
    }

    #[test]
    fn single_key_sections_fill_in_remaining_fields() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("sparse.toml");
        std::fs::write(
            &path,
            "[audio]\navatar_rate = 8000\n\n[realtime]\nvoice = \"echo\"\n\n[avatar]\nface_id = \"face-1\"\n",
        )
        .expect("write");

        let cfg = AssistantConfig::load_from(&path).expect("load");
        assert_eq!(cfg.audio.avatar_rate, 8_000);
        assert_eq!(cfg.audio.realtime_rate, 24_000);
        assert_eq!(cfg.audio.capture_buffer_frames, 2_048);
        assert_eq!(cfg.realtime.voice, Voice::Echo);
        assert_eq!(cfg.realtime.turn_detection, "server_vad");
        assert_eq!(cfg.avatar.face_id, "face-1");
        assert_eq!(cfg.avatar.api_key_env, "AVATAR_API_KEY");
        assert!(cfg.avatar.handle_silence);
    }

    #[test]
    fn voice_serialises_lowercase() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("voice.toml");

        let mut cfg = AssistantConfig::default();
        cfg.realtime.voice = Voice::Coral;
        cfg.save_to(&path).expect("save");

        let text = std::fs::read_to_string(&path).expect("read");
        assert!(text.contains("voice = \"coral\""), "{text}");
        assert_eq!(Voice::Coral.as_str(), "coral");
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[audio\nrealtime_rate = ").expect("write");
        assert!(AssistantConfig::load_from(&path).is_err());
    }

    #[test]
    fn api_key_reads_named_variable() {
        let mut cfg = AvatarConfig::default();
        cfg.api_key_env = "AVATAR_ASSISTANT_TEST_KEY_UNSET".into();
        assert_eq!(cfg.api_key(), None);
    }
}
