//! StoryForge worker.
//!
//! Turns one generation request into one vertical video: script
//! (model-written or templated), narration, gradient segments, composition
//! and publication, sequenced by [`Pipeline`].

pub mod capabilities;
pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod narration;
pub mod pipeline;
pub mod publisher;
pub mod retry;
pub mod script;
pub mod script_model;
pub mod visuals;

pub use capabilities::probe_capabilities;
pub use config::WorkerConfig;
pub use error::{PipelineError, PipelineResult};
pub use logging::{init_tracing, RunLogger};
pub use pipeline::Pipeline;
pub use publisher::{Publication, PublishSink, Publisher};
pub use retry::{retry_async, RetryConfig, RetryResult};
pub use script::{ScriptSynthesizer, StyleTemplate};
pub use script_model::{ModelDraft, OllamaScriptWriter, ScriptModelError};
pub use visuals::{VisualGenerator, VisualSet};
