//! End-to-end pipeline runs with scripted speech engines, a recording
//! renderer and an in-memory storage sink.

use async_trait::async_trait;
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

use sforge_media::{MediaResult, Timeline, VideoRenderer};
use sforge_models::{
    Capabilities, Capability, ErrorKind, GenerationRequest, PipelineStage, ScriptOrigin, Style,
    VideoArtifact, WorkerResponse,
};
use sforge_speech::{NarrationChain, SpeechEngine, SpeechError, SpeechResult, SynthesizedAudio};
use sforge_storage::{PresignedUrl, StorageResult};
use sforge_worker::{
    OllamaScriptWriter, Pipeline, PublishSink, Publisher, RetryConfig, VisualGenerator,
    WorkerConfig,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct ScriptedEngine {
    name: &'static str,
    duration_secs: Option<f64>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedEngine {
    fn ok(name: &'static str, duration_secs: f64, calls: &Arc<AtomicUsize>) -> Self {
        Self {
            name,
            duration_secs: Some(duration_secs),
            calls: calls.clone(),
        }
    }

    fn failing(name: &'static str, calls: &Arc<AtomicUsize>) -> Self {
        Self {
            name,
            duration_secs: None,
            calls: calls.clone(),
        }
    }
}

#[async_trait]
impl SpeechEngine for ScriptedEngine {
    async fn synthesize(
        &self,
        _text: &str,
        _voice: &str,
        output: &Path,
    ) -> SpeechResult<SynthesizedAudio> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.duration_secs {
            Some(duration_secs) => {
                tokio::fs::write(output, b"ID3").await?;
                Ok(SynthesizedAudio {
                    path: output.to_path_buf(),
                    duration_secs,
                })
            }
            None => Err(SpeechError::engine_failed(self.name, "voice not installed")),
        }
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

#[derive(Debug, Clone)]
struct RenderedTimeline {
    segments: usize,
    offsets: Vec<f64>,
    duration_secs: f64,
    crossfade_secs: f64,
    title: Option<String>,
    filter_graph: String,
}

#[derive(Default)]
struct RecordingRenderer {
    hang: bool,
    seen: Mutex<Option<RenderedTimeline>>,
}

#[async_trait]
impl VideoRenderer for RecordingRenderer {
    async fn render(
        &self,
        timeline: &Timeline,
        _work_dir: &Path,
        output_dir: &Path,
        file_name: &str,
    ) -> MediaResult<VideoArtifact> {
        if self.hang {
            tokio::time::sleep(Duration::from_secs(30)).await;
        }
        *self.seen.lock().unwrap() = Some(RenderedTimeline {
            segments: timeline.segments.len(),
            offsets: timeline.xfade_offsets(),
            duration_secs: timeline.duration_secs,
            crossfade_secs: timeline.crossfade_secs,
            title: timeline.title.as_ref().map(|t| t.text.clone()),
            filter_graph: timeline.filter_graph(),
        });

        let path = output_dir.join(file_name);
        tokio::fs::write(&path, b"mp4").await?;
        Ok(VideoArtifact {
            path,
            duration_secs: timeline.duration_secs,
            width: timeline.width,
            height: timeline.height,
            fps: timeline.fps,
            video_codec: "h264".into(),
            audio_codec: "aac".into(),
            size_bytes: 3,
        })
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

#[derive(Default)]
struct MemorySink {
    keys: Mutex<Vec<String>>,
}

#[async_trait]
impl PublishSink for MemorySink {
    async fn upload(&self, _path: &Path, key: &str) -> StorageResult<u64> {
        self.keys.lock().unwrap().push(key.to_string());
        Ok(3)
    }

    async fn sign(&self, key: &str, expires_in: Duration) -> StorageResult<PresignedUrl> {
        Ok(PresignedUrl {
            url: format!("https://f004.example.com/{}?X-Amz-Expires={}", key, expires_in.as_secs()),
            expires_at: Utc::now() + chrono::Duration::seconds(expires_in.as_secs() as i64),
        })
    }

    async fn remove(&self, _key: &str) -> StorageResult<()> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

struct Harness {
    _root: TempDir,
    config: WorkerConfig,
}

impl Harness {
    async fn new() -> Self {
        let root = TempDir::new().unwrap();
        let config = WorkerConfig {
            output_dir: root.path().join("output"),
            temp_dir: root.path().join("temp"),
            font_path: None,
            ..WorkerConfig::default()
        };
        config.ensure_dirs().await.unwrap();
        Self {
            _root: root,
            config,
        }
    }

    fn pipeline(
        &self,
        caps: Capabilities,
        engines: Vec<ScriptedEngine>,
        renderer: Arc<RecordingRenderer>,
        sink: Option<Arc<dyn PublishSink>>,
    ) -> Pipeline<ScriptedEngine> {
        self.pipeline_with(self.config.clone(), caps, engines, renderer, sink)
    }

    fn pipeline_with(
        &self,
        config: WorkerConfig,
        caps: Capabilities,
        engines: Vec<ScriptedEngine>,
        renderer: Arc<RecordingRenderer>,
        sink: Option<Arc<dyn PublishSink>>,
    ) -> Pipeline<ScriptedEngine> {
        let chain = NarrationChain::new(engines, config.narration_timeout);
        Pipeline::with_components(config, caps, chain, renderer, Publisher::new(sink))
            .with_visuals(VisualGenerator::new(36, 64))
    }

    fn temp_entries(&self) -> usize {
        std::fs::read_dir(&self.config.temp_dir).unwrap().count()
    }
}

fn local_caps() -> Capabilities {
    Capabilities::all().with(Capability::StorageSink, false)
}

fn expect_error(response: WorkerResponse) -> (ErrorKind, Option<PipelineStage>) {
    match response {
        WorkerResponse::Error(e) => (e.error, e.stage),
        other => panic!("expected error response, got {:?}", other),
    }
}

#[tokio::test]
async fn test_health_check_reports_capabilities() {
    let harness = Harness::new().await;
    let calls = Arc::new(AtomicUsize::new(0));
    let pipeline = harness.pipeline(
        local_caps(),
        vec![ScriptedEngine::ok("premium", 5.0, &calls)],
        Arc::new(RecordingRenderer::default()),
        None,
    );

    let mut request = GenerationRequest::for_topic("ignored");
    request.mode = Some("test".into());
    let json = serde_json::to_value(pipeline.run(&request).await).unwrap();

    assert_eq!(json["status"], "success");
    assert_eq!(json["version"], "2.0");
    assert_eq!(json["features"]["b2"], false);
    assert_eq!(json["features"]["moviepy"], true);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_missing_source_fails_before_any_stage() {
    let harness = Harness::new().await;
    let calls = Arc::new(AtomicUsize::new(0));
    let renderer = Arc::new(RecordingRenderer::default());
    let pipeline = harness.pipeline(
        local_caps(),
        vec![ScriptedEngine::ok("premium", 5.0, &calls)],
        renderer.clone(),
        None,
    );

    let mut request = GenerationRequest::for_topic("");
    request.script = None;
    let (kind, stage) = expect_error(pipeline.run(&request).await);

    assert_eq!(kind, ErrorKind::InputError);
    assert_eq!(stage, Some(PipelineStage::Validating));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(renderer.seen.lock().unwrap().is_none());
    assert_eq!(harness.temp_entries(), 0);
}

#[tokio::test]
async fn test_fallback_narration_and_degraded_publication() {
    let harness = Harness::new().await;
    let calls = Arc::new(AtomicUsize::new(0));
    let renderer = Arc::new(RecordingRenderer::default());
    let pipeline = harness.pipeline(
        local_caps(),
        vec![
            ScriptedEngine::failing("premium", &calls),
            ScriptedEngine::ok("baseline", 12.0, &calls),
        ],
        renderer.clone(),
        None,
    );

    let mut request = GenerationRequest::for_script(
        "Octopuses have three hearts. Two pump blood to the gills. One pumps it everywhere else.",
    );
    request.num_images = 3;
    request.style = Style::Educational;

    let response = match pipeline.run(&request).await {
        WorkerResponse::Success(success) => success,
        other => panic!("expected success, got {:?}", other),
    };

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(response.duration_seconds, 12.0);
    assert_eq!(response.num_images, 3);
    assert_eq!(response.title, "Octopuses have three hearts");
    assert!(response.degraded);
    assert!(response.video_url.is_none());
    let local = PathBuf::from(response.local_path.unwrap());
    assert!(local.starts_with(&harness.config.output_dir));
    assert!(local.exists());

    let diag = &response.diagnostics;
    assert_eq!(diag.narration_provider.as_deref(), Some("baseline"));
    assert_eq!(diag.attempts.len(), 2);
    assert!(!diag.attempts[0].ok);
    assert!(diag.attempts[1].ok);
    assert!(diag.warnings.iter().any(|w| w.starts_with("PublishError")));
    let stages: Vec<_> = diag.stages.iter().map(|t| t.stage).collect();
    assert_eq!(
        stages,
        vec![
            PipelineStage::Validating,
            PipelineStage::Scripting,
            PipelineStage::Narrating,
            PipelineStage::GeneratingVisuals,
            PipelineStage::Composing,
            PipelineStage::Publishing,
        ]
    );

    let seen = renderer.seen.lock().unwrap().clone().unwrap();
    assert_eq!(seen.segments, 3);
    assert_eq!(seen.offsets, vec![4.0, 8.0]);
    assert_eq!(seen.duration_secs, 12.0);
    assert_eq!(seen.crossfade_secs, 0.5);
    assert_eq!(seen.title.as_deref(), Some("Octopuses have three hearts"));
    assert_eq!(seen.filter_graph.matches("xfade=").count(), 2);
    assert!(seen.filter_graph.contains("fade=t=in"));
    assert!(seen.filter_graph.contains("fade=t=out"));
    assert!(seen.filter_graph.contains("borderw="));

    assert_eq!(harness.temp_entries(), 0);
}

#[tokio::test]
async fn test_remote_publication() {
    let harness = Harness::new().await;
    let calls = Arc::new(AtomicUsize::new(0));
    let sink = Arc::new(MemorySink::default());
    let dyn_sink: Arc<dyn PublishSink> = sink.clone();
    let pipeline = harness.pipeline(
        Capabilities::all(),
        vec![ScriptedEngine::ok("premium", 9.0, &calls)],
        Arc::new(RecordingRenderer::default()),
        Some(dyn_sink),
    );

    let response = match pipeline.run(&GenerationRequest::for_topic("black holes")).await {
        WorkerResponse::Success(success) => success,
        other => panic!("expected success, got {:?}", other),
    };

    assert!(!response.degraded);
    assert!(response.local_path.is_none());
    let url = response.video_url.unwrap();
    assert!(url.contains("X-Amz-Expires=3600"));
    let remaining = response.expires_at.unwrap() - Utc::now();
    assert!(remaining > chrono::Duration::minutes(59));
    assert_eq!(response.hashtags[0], "#blackholes");

    let keys = sink.keys.lock().unwrap();
    assert_eq!(keys.len(), 1);
    assert!(keys[0].starts_with("private/outputs/"));
    assert!(keys[0].ends_with(".mp4"));
}

#[tokio::test]
async fn test_exhausted_chain_is_synthesis_error() {
    let harness = Harness::new().await;
    let calls = Arc::new(AtomicUsize::new(0));
    let renderer = Arc::new(RecordingRenderer::default());
    let pipeline = harness.pipeline(
        local_caps(),
        vec![
            ScriptedEngine::failing("premium", &calls),
            ScriptedEngine::failing("baseline", &calls),
        ],
        renderer.clone(),
        None,
    );

    let (kind, stage) = expect_error(pipeline.run(&GenerationRequest::for_topic("AI")).await);

    assert_eq!(kind, ErrorKind::SynthesisError);
    assert_eq!(stage, Some(PipelineStage::Narrating));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert!(renderer.seen.lock().unwrap().is_none());
    assert_eq!(harness.temp_entries(), 0);
}

#[tokio::test]
async fn test_missing_compositing_engine_is_render_error() {
    let harness = Harness::new().await;
    let calls = Arc::new(AtomicUsize::new(0));
    let pipeline = harness.pipeline(
        local_caps().with(Capability::CompositingEngine, false),
        vec![ScriptedEngine::ok("premium", 6.0, &calls)],
        Arc::new(RecordingRenderer::default()),
        None,
    );

    let (kind, stage) = expect_error(pipeline.run(&GenerationRequest::for_topic("AI")).await);
    assert_eq!(kind, ErrorKind::RenderError);
    assert_eq!(stage, Some(PipelineStage::Composing));
}

#[tokio::test]
async fn test_run_timeout_reports_current_stage() {
    let harness = Harness::new().await;
    let calls = Arc::new(AtomicUsize::new(0));
    let config = WorkerConfig {
        run_timeout: Duration::from_millis(300),
        ..harness.config.clone()
    };
    let pipeline = harness.pipeline_with(
        config,
        local_caps(),
        vec![ScriptedEngine::ok("premium", 6.0, &calls)],
        Arc::new(RecordingRenderer {
            hang: true,
            ..Default::default()
        }),
        None,
    );

    let (kind, stage) = expect_error(pipeline.run(&GenerationRequest::for_topic("AI")).await);

    assert_eq!(kind, ErrorKind::TimeoutError);
    assert_eq!(stage, Some(PipelineStage::Composing));
    assert_eq!(harness.temp_entries(), 0);
    assert_eq!(
        std::fs::read_dir(&harness.config.output_dir).unwrap().count(),
        0
    );
}

#[tokio::test]
async fn test_compose_timeout_is_timeout_error() {
    let harness = Harness::new().await;
    let calls = Arc::new(AtomicUsize::new(0));
    let config = WorkerConfig {
        compose_timeout: Duration::from_millis(100),
        ..harness.config.clone()
    };
    let pipeline = harness.pipeline_with(
        config,
        local_caps(),
        vec![ScriptedEngine::ok("premium", 6.0, &calls)],
        Arc::new(RecordingRenderer {
            hang: true,
            ..Default::default()
        }),
        None,
    );

    let (kind, stage) = expect_error(pipeline.run(&GenerationRequest::for_topic("AI")).await);
    assert_eq!(kind, ErrorKind::TimeoutError);
    assert_eq!(stage, Some(PipelineStage::Composing));
}

#[tokio::test]
async fn test_num_images_out_of_range_rejected() {
    let harness = Harness::new().await;
    let calls = Arc::new(AtomicUsize::new(0));
    let pipeline = harness.pipeline(
        local_caps(),
        vec![ScriptedEngine::ok("premium", 6.0, &calls)],
        Arc::new(RecordingRenderer::default()),
        None,
    );

    let mut request = GenerationRequest::for_topic("AI");
    request.num_images = 0;
    let (kind, stage) = expect_error(pipeline.run(&request).await);
    assert_eq!(kind, ErrorKind::InputError);
    assert_eq!(stage, Some(PipelineStage::Validating));
}

#[tokio::test]
async fn test_custom_script_with_five_segments() {
    let harness = Harness::new().await;
    let calls = Arc::new(AtomicUsize::new(0));
    let renderer = Arc::new(RecordingRenderer::default());
    let pipeline = harness.pipeline(
        local_caps(),
        vec![ScriptedEngine::ok("premium", 10.003, &calls)],
        renderer.clone(),
        None,
    );

    let mut request = GenerationRequest::for_script("Bees can recognize faces. They remember them for days.");
    request.num_images = 5;
    request.title = Some("Clever Bees".into());

    let response = match pipeline.run(&request).await {
        WorkerResponse::Success(success) => success,
        other => panic!("expected success, got {:?}", other),
    };
    assert_eq!(response.title, "Clever Bees");
    assert_eq!(response.duration_seconds, 10.003);
    assert!(response.diagnostics.placeholders.is_empty());

    let seen = renderer.seen.lock().unwrap().clone().unwrap();
    assert_eq!(seen.segments, 5);
    assert_eq!(seen.offsets, vec![2.0, 4.0, 6.0, 8.0]);
    assert_eq!(seen.filter_graph.matches("xfade=").count(), 4);
    assert_eq!(seen.duration_secs, 10.003);
}

#[tokio::test]
async fn test_sub_millisecond_narration_length_agrees_everywhere() {
    let harness = Harness::new().await;
    let calls = Arc::new(AtomicUsize::new(0));
    let renderer = Arc::new(RecordingRenderer::default());
    let pipeline = harness.pipeline(
        local_caps(),
        vec![ScriptedEngine::ok("premium", 12.3456, &calls)],
        renderer.clone(),
        None,
    );

    let mut request = GenerationRequest::for_script("Only 5% of the ocean is mapped. The rest is dark.");
    request.num_images = 3;

    let response = match pipeline.run(&request).await {
        WorkerResponse::Success(success) => success,
        other => panic!("expected success, got {:?}", other),
    };
    assert_eq!(response.duration_seconds, 12.346);

    let seen = renderer.seen.lock().unwrap().clone().unwrap();
    assert_eq!(seen.duration_secs, 12.346);
    assert_eq!(seen.offsets, vec![4.115, 8.23]);
    assert!(seen.filter_graph.contains("Only 5% of the ocean"));
    assert!(seen.filter_graph.contains("expansion=none"));
}

fn script_writer(server: &MockServer) -> OllamaScriptWriter {
    OllamaScriptWriter::new(&server.uri(), "llama3.1:8b")
        .unwrap()
        .with_retry(RetryConfig::new("script model").with_base_delay(Duration::from_millis(1)))
}

#[tokio::test]
async fn test_topic_script_written_by_model() {
    let server = MockServer::start().await;
    let narration = vec!["Bioluminescent creatures light up the deep."; 10].join(" ");
    let draft = serde_json::json!({
        "title": "Lights In The Abyss",
        "script": narration,
        "hashtags": ["#DeepSea"],
        "cta": "Follow for more deep sea secrets."
    });
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "message": { "role": "assistant", "content": draft.to_string() },
            "done": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let harness = Harness::new().await;
    let calls = Arc::new(AtomicUsize::new(0));
    let renderer = Arc::new(RecordingRenderer::default());
    let pipeline = harness
        .pipeline(
            local_caps(),
            vec![ScriptedEngine::ok("premium", 20.0, &calls)],
            renderer.clone(),
            None,
        )
        .with_script_writer(Some(script_writer(&server)));

    let response = match pipeline.run(&GenerationRequest::for_topic("deep sea")).await {
        WorkerResponse::Success(success) => success,
        other => panic!("expected success, got {:?}", other),
    };
    assert_eq!(response.title, "Lights In The Abyss");
    assert_eq!(response.script, narration);
    assert_eq!(response.cta, "Follow for more deep sea secrets.");
    assert_eq!(response.hashtags[0], "#deepsea");
    assert_eq!(response.diagnostics.script_origin, Some(ScriptOrigin::Model));
    assert!(response.diagnostics.warnings.is_empty());
    assert_eq!(
        renderer.seen.lock().unwrap().as_ref().unwrap().title.as_deref(),
        Some("Lights In The Abyss")
    );
}

#[tokio::test]
async fn test_failing_model_falls_back_to_template() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let harness = Harness::new().await;
    let calls = Arc::new(AtomicUsize::new(0));
    let pipeline = harness
        .pipeline(
            local_caps(),
            vec![ScriptedEngine::ok("premium", 20.0, &calls)],
            Arc::new(RecordingRenderer::default()),
            None,
        )
        .with_script_writer(Some(script_writer(&server)));

    let response = match pipeline.run(&GenerationRequest::for_topic("deep sea")).await {
        WorkerResponse::Success(success) => success,
        other => panic!("expected success, got {:?}", other),
    };
    assert_eq!(response.title, "Deep Sea - You Need To See This!");
    assert_eq!(response.diagnostics.script_origin, Some(ScriptOrigin::Topic));
    assert!(response
        .diagnostics
        .warnings
        .iter()
        .any(|w| w.starts_with("script model: model server returned 503")));
}

#[tokio::test]
async fn test_caller_script_skips_model() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let harness = Harness::new().await;
    let calls = Arc::new(AtomicUsize::new(0));
    let pipeline = harness
        .pipeline(
            local_caps(),
            vec![ScriptedEngine::ok("premium", 8.0, &calls)],
            Arc::new(RecordingRenderer::default()),
            None,
        )
        .with_script_writer(Some(script_writer(&server)));

    let response = match pipeline.run(&GenerationRequest::for_script("Cats sleep a lot. Really.")).await {
        WorkerResponse::Success(success) => success,
        other => panic!("expected success, got {:?}", other),
    };
    assert_eq!(response.diagnostics.script_origin, Some(ScriptOrigin::User));
}
