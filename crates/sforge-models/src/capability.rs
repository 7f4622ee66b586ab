//! Process-wide capability snapshot.
//!
//! The snapshot is computed once at startup (see the worker's probe) and then
//! only read. Components receive it by reference instead of probing the
//! environment themselves.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Optional subsystems whose presence is detected at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Video compositing/encoding (ffmpeg + ffprobe)
    CompositingEngine,
    /// In-process image rendering
    ImageLibrary,
    /// Neural speech engine (edge-tts)
    PremiumSpeechEngine,
    /// Baseline speech engine (Google translate TTS)
    FallbackSpeechEngine,
    /// Object storage for publication
    StorageSink,
    /// Language model writing topic scripts (Ollama)
    ScriptModel,
}

impl Capability {
    pub const ALL: &'static [Capability] = &[
        Capability::CompositingEngine,
        Capability::ImageLibrary,
        Capability::PremiumSpeechEngine,
        Capability::FallbackSpeechEngine,
        Capability::StorageSink,
        Capability::ScriptModel,
    ];

    /// Key used in the health-check `features` map, if the capability is
    /// reported there.
    pub fn feature_key(&self) -> Option<&'static str> {
        match self {
            Capability::CompositingEngine => Some("moviepy"),
            Capability::ImageLibrary => Some("pil"),
            Capability::PremiumSpeechEngine => Some("edge_tts"),
            Capability::FallbackSpeechEngine => Some("gtts"),
            Capability::StorageSink => Some("b2"),
            Capability::ScriptModel => None,
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Capability::CompositingEngine => "compositing-engine",
            Capability::ImageLibrary => "image-library",
            Capability::PremiumSpeechEngine => "premium-speech-engine",
            Capability::FallbackSpeechEngine => "fallback-speech-engine",
            Capability::StorageSink => "storage-sink",
            Capability::ScriptModel => "script-model",
        };
        write!(f, "{}", name)
    }
}

/// Immutable availability snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    compositing_engine: bool,
    image_library: bool,
    premium_speech_engine: bool,
    fallback_speech_engine: bool,
    storage_sink: bool,
    script_model: bool,
}

impl Capabilities {
    /// Snapshot with nothing available.
    pub fn none() -> Self {
        Self::default()
    }

    /// Snapshot with everything available.
    pub fn all() -> Self {
        Capability::ALL
            .iter()
            .fold(Self::none(), |caps, cap| caps.with(*cap, true))
    }

    /// Return a copy with one capability set. Used while building the snapshot.
    pub fn with(mut self, capability: Capability, available: bool) -> Self {
        match capability {
            Capability::CompositingEngine => self.compositing_engine = available,
            Capability::ImageLibrary => self.image_library = available,
            Capability::PremiumSpeechEngine => self.premium_speech_engine = available,
            Capability::FallbackSpeechEngine => self.fallback_speech_engine = available,
            Capability::StorageSink => self.storage_sink = available,
            Capability::ScriptModel => self.script_model = available,
        }
        self
    }

    pub fn is_available(&self, capability: Capability) -> bool {
        match capability {
            Capability::CompositingEngine => self.compositing_engine,
            Capability::ImageLibrary => self.image_library,
            Capability::PremiumSpeechEngine => self.premium_speech_engine,
            Capability::FallbackSpeechEngine => self.fallback_speech_engine,
            Capability::StorageSink => self.storage_sink,
            Capability::ScriptModel => self.script_model,
        }
    }

    /// `{capability -> available}` pairs in declaration order.
    pub fn entries(&self) -> Vec<(Capability, bool)> {
        Capability::ALL
            .iter()
            .map(|cap| (*cap, self.is_available(*cap)))
            .collect()
    }

    /// Health-check view of the snapshot.
    pub fn features(&self) -> FeatureFlags {
        FeatureFlags {
            moviepy: self.compositing_engine,
            pil: self.image_library,
            edge_tts: self.premium_speech_engine,
            gtts: self.fallback_speech_engine,
            b2: self.storage_sink,
        }
    }
}

/// `features` object of the health response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FeatureFlags {
    pub moviepy: bool,
    pub pil: bool,
    pub edge_tts: bool,
    pub gtts: bool,
    pub b2: bool,
}
