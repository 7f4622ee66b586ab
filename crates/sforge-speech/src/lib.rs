//! Narration synthesis for the StoryForge pipeline.
//!
//! This crate provides:
//! - The `SpeechEngine` contract every provider implements
//! - Edge TTS (CLI) and Google Translate TTS (HTTP) engines
//! - An ordered provider chain with per-attempt timeouts and attempt records

pub mod chain;
pub mod edge;
pub mod engine;
pub mod error;
pub mod google;
pub mod provider;
pub mod voice;

pub use chain::{Narration, NarrationChain};
pub use edge::EdgeTtsEngine;
pub use engine::{SpeechEngine, SynthesizedAudio};
pub use error::{SpeechError, SpeechResult};
pub use google::GoogleTtsEngine;
pub use provider::NarrationProvider;
