//! Run orchestration.
//!
//! A run moves strictly forward through
//! `Validating → Scripting → Narrating → GeneratingVisuals → Composing →
//! Publishing → Done`. Any fatal error ends it in `Failed`, tagged with the
//! stage it happened in. Publication problems are never fatal.

use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tempfile::TempDir;
use tracing::Instrument;

use sforge_media::{FfmpegRenderer, Timeline, TitleOverlay, VideoRenderer};
use sforge_models::{
    Capabilities, Capability, Diagnostics, ErrorKind, GenerationRequest, HealthResponse,
    PipelineStage, RunId, Script, ScriptSource, StageTiming, SuccessResponse, WorkerResponse,
};
use sforge_speech::{NarrationChain, NarrationProvider, SpeechEngine};

use crate::config::WorkerConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::logging::RunLogger;
use crate::metrics;
use crate::narration::{build_chain, narrate};
use crate::publisher::{Publication, Publisher};
use crate::script::ScriptSynthesizer;
use crate::script_model::{build_writer, OllamaScriptWriter};
use crate::visuals::VisualGenerator;

/// Longest title slug used in output file names.
const MAX_SLUG_CHARS: usize = 40;

/// Current stage and accumulated diagnostics of one run.
///
/// Lives outside the timed run future so the stage is still known after the
/// run timeout drops it.
struct RunState {
    inner: Mutex<StageClock>,
}

struct StageClock {
    stage: PipelineStage,
    started: Instant,
    diagnostics: Diagnostics,
}

impl RunState {
    fn new(run_id: &RunId) -> Self {
        Self {
            inner: Mutex::new(StageClock {
                stage: PipelineStage::Validating,
                started: Instant::now(),
                diagnostics: Diagnostics::new(run_id.as_str()),
            }),
        }
    }

    fn with<T>(&self, f: impl FnOnce(&mut StageClock) -> T) -> T {
        let mut guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut guard)
    }

    fn current(&self) -> PipelineStage {
        self.with(|clock| clock.stage)
    }

    /// Close the current stage's timing and move to `next`.
    fn advance(&self, next: PipelineStage, logger: &RunLogger) {
        let (finished, elapsed) = self.with(|clock| {
            let finished = clock.stage;
            let elapsed = clock.started.elapsed();
            clock.diagnostics.stages.push(StageTiming {
                stage: finished,
                elapsed_ms: elapsed.as_millis() as u64,
            });
            clock.stage = next;
            clock.started = Instant::now();
            (finished, elapsed)
        });
        metrics::record_stage_duration(finished, elapsed.as_secs_f64());
        logger.log_stage(next, &format!("{} -> {}", finished, next));
    }

    fn diagnostics(&self) -> Diagnostics {
        self.with(|clock| clock.diagnostics.clone())
    }
}

/// End-to-end generation pipeline.
pub struct Pipeline<E: SpeechEngine = NarrationProvider> {
    config: WorkerConfig,
    caps: Capabilities,
    scripts: ScriptSynthesizer,
    writer: Option<OllamaScriptWriter>,
    chain: NarrationChain<E>,
    visuals: VisualGenerator,
    renderer: Arc<dyn VideoRenderer>,
    publisher: Publisher,
}

impl Pipeline<NarrationProvider> {
    /// Production wiring from the capability snapshot.
    pub fn new(config: WorkerConfig, caps: Capabilities) -> Self {
        let chain = build_chain(&caps, &config);
        let renderer = Arc::new(FfmpegRenderer::new().with_timeout(config.compose_timeout.as_secs()));
        let publisher = Publisher::from_capabilities(&caps, &config);
        let writer = build_writer(&caps, &config);
        Self::with_components(config, caps, chain, renderer, publisher).with_script_writer(writer)
    }
}

impl<E: SpeechEngine> Pipeline<E> {
    pub fn with_components(
        config: WorkerConfig,
        caps: Capabilities,
        chain: NarrationChain<E>,
        renderer: Arc<dyn VideoRenderer>,
        publisher: Publisher,
    ) -> Self {
        Self {
            config,
            caps,
            scripts: ScriptSynthesizer::new(),
            writer: None,
            chain,
            visuals: VisualGenerator::default(),
            renderer,
            publisher,
        }
    }

    /// Topic scripts are asked from `writer` first; templates remain the fallback.
    pub fn with_script_writer(mut self, writer: Option<OllamaScriptWriter>) -> Self {
        self.writer = writer;
        self
    }

    pub fn with_visuals(mut self, visuals: VisualGenerator) -> Self {
        self.visuals = visuals;
        self
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.caps
    }

    /// Handle one request. Never panics on bad input; every outcome is a response.
    pub async fn run(&self, request: &GenerationRequest) -> WorkerResponse {
        if request.is_test_mode() {
            metrics::record_run("health");
            return WorkerResponse::Health(HealthResponse::from_capabilities(&self.caps));
        }

        let run_id = RunId::new();
        let logger = RunLogger::new(&run_id, "generate");
        let state = RunState::new(&run_id);
        logger.log_start(&format!(
            "style={} num_images={} duration_hint={}s",
            request.style, request.num_images, request.duration
        ));

        let outcome = tokio::time::timeout(
            self.config.run_timeout,
            self.execute(request, &run_id, &state, &logger)
                .instrument(logger.create_span()),
        )
        .await
        .unwrap_or_else(|_| {
            Err(PipelineError::timeout(format!(
                "run exceeded {}s",
                self.config.run_timeout.as_secs()
            )))
        });

        match outcome {
            Ok(response) => {
                let outcome = if response.degraded { "degraded" } else { "success" };
                metrics::record_run(outcome);
                logger.log_completion(&format!(
                    "{} ({:.2}s, {})",
                    response.title, response.duration_seconds, outcome
                ));
                WorkerResponse::Success(response)
            }
            Err(e) => {
                let e = e.at(state.current());
                state.advance(PipelineStage::Failed, &logger);
                logger.log_error(e.stage, &e.message);
                metrics::record_run(e.kind.as_str());
                WorkerResponse::Error(e.to_response())
            }
        }
    }

    async fn execute(
        &self,
        request: &GenerationRequest,
        run_id: &RunId,
        state: &RunState,
        logger: &RunLogger,
    ) -> PipelineResult<SuccessResponse> {
        let source = request.validate_for_generation()?;

        state.advance(PipelineStage::Scripting, logger);
        let script = self.write_script(&source, request, state, logger).await;
        state.with(|clock| clock.diagnostics.script_origin = Some(script.origin));

        // Removed on every exit path, including the run timeout dropping this future.
        let work_dir = self.work_dir()?;

        state.advance(PipelineStage::Narrating, logger);
        let narration = narrate(&self.chain, &script, request.voice(), work_dir.path()).await?;
        state.with(|clock| {
            clock.diagnostics.narration_provider = Some(narration.track.provider.clone());
            clock.diagnostics.attempts = narration.attempts.clone();
        });

        state.advance(PipelineStage::GeneratingVisuals, logger);
        let visuals = within(
            self.config.visuals_timeout,
            "visual generation",
            self.visuals.generate(
                request.style,
                request.num_images as usize,
                narration.track.duration_ms(),
                work_dir.path(),
            ),
        )
        .await??;
        for index in &visuals.placeholders {
            logger.log_warning(
                PipelineStage::GeneratingVisuals,
                &format!("segment {} fell back to a placeholder", index),
            );
        }
        state.with(|clock| clock.diagnostics.placeholders = visuals.placeholders.clone());

        state.advance(PipelineStage::Composing, logger);
        if !self.caps.is_available(Capability::CompositingEngine) {
            return Err(PipelineError::render("compositing engine unavailable"));
        }
        let title = TitleOverlay::new(script.title.clone())
            .with_lead(self.config.title_lead_secs)
            .with_font(self.config.font_path.clone());
        let timeline = Timeline::plan(visuals.assets, &narration.track, Some(title))?;
        let file_name = output_file_name(&script.title, run_id);
        let artifact = within(
            self.config.compose_timeout,
            "composition",
            self.renderer
                .render(&timeline, work_dir.path(), &self.config.output_dir, &file_name),
        )
        .await??;

        state.advance(PipelineStage::Publishing, logger);
        let publication = tokio::time::timeout(
            self.config.publish_timeout,
            self.publisher.publish(&artifact, run_id),
        )
        .await
        .unwrap_or_else(|_| {
            Publication::degraded(
                &artifact.path,
                format!("publication timed out after {}s", self.config.publish_timeout.as_secs()),
            )
        });
        if let Some(warning) = &publication.warning {
            logger.log_warning(PipelineStage::Publishing, warning);
            state.with(|clock| clock.diagnostics.warn(ErrorKind::PublishError, warning));
        }

        state.advance(PipelineStage::Done, logger);
        Ok(SuccessResponse::new(
            &script,
            &publication.result,
            artifact.duration_secs,
            request.num_images,
            state.diagnostics(),
        ))
    }

    /// Model draft for topics when a writer is configured, else the templates.
    async fn write_script(
        &self,
        source: &ScriptSource,
        request: &GenerationRequest,
        state: &RunState,
        logger: &RunLogger,
    ) -> Script {
        if let (ScriptSource::Topic(topic), Some(writer)) = (source, &self.writer) {
            let reason = match within(
                self.config.script_timeout,
                "script model",
                writer.write(topic, request.style, request.duration),
            )
            .await
            {
                Ok(Ok(draft)) => {
                    return self
                        .scripts
                        .from_draft(draft, topic, request.style, request.title())
                }
                Ok(Err(e)) => e.to_string(),
                Err(e) => e.message,
            };
            logger.log_warning(
                PipelineStage::Scripting,
                &format!("script model failed, using template: {}", reason),
            );
            state.with(|clock| {
                clock
                    .diagnostics
                    .warnings
                    .push(format!("script model: {}", reason))
            });
        }

        self.scripts
            .synthesize(source, request.style, request.title(), request.duration)
    }

    fn work_dir(&self) -> PipelineResult<TempDir> {
        let builder = || {
            let mut builder = tempfile::Builder::new();
            builder.prefix("sforge-run-");
            builder
        };
        builder()
            .tempdir_in(&self.config.temp_dir)
            .or_else(|_| builder().tempdir())
            .map_err(|e| PipelineError::render(format!("failed to create work area: {}", e)))
    }
}

/// Run a stage future under its own timeout.
async fn within<T>(
    limit: Duration,
    what: &str,
    future: impl Future<Output = T>,
) -> PipelineResult<T> {
    tokio::time::timeout(limit, future)
        .await
        .map_err(|_| PipelineError::timeout(format!("{} exceeded {}s", what, limit.as_secs())))
}

/// `<title-slug>-<run id prefix>.mp4`
pub fn output_file_name(title: &str, run_id: &RunId) -> String {
    let mut slug = String::new();
    for c in title.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
        if slug.len() >= MAX_SLUG_CHARS {
            break;
        }
    }
    let slug = slug.trim_end_matches('-');
    let slug = if slug.is_empty() { "video" } else { slug };

    let short_id: String = run_id
        .as_str()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(8)
        .collect();
    format!("{}-{}.mp4", slug, short_id)
}
