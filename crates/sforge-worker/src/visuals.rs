//! Segment image generation.

use futures::future::join_all;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use sforge_media::{write_gradient, write_placeholder, GradientSpec, MediaResult};
use sforge_models::{partition_duration, Style, VisualAsset, OUTPUT_HEIGHT, OUTPUT_WIDTH};

use crate::error::{PipelineError, PipelineResult};

/// Draws one gradient segment to a PNG path.
pub type Painter = fn(&GradientSpec, u32, u32, &Path) -> MediaResult<()>;

/// Generated segments, in index order.
#[derive(Debug, Clone)]
pub struct VisualSet {
    pub assets: Vec<VisualAsset>,
    /// Indices that fell back to a solid placeholder
    pub placeholders: Vec<usize>,
}

/// Renders one image per segment on blocking tasks.
#[derive(Debug, Clone)]
pub struct VisualGenerator {
    width: u32,
    height: u32,
    painter: Painter,
}

impl Default for VisualGenerator {
    fn default() -> Self {
        Self::new(OUTPUT_WIDTH, OUTPUT_HEIGHT)
    }
}

impl VisualGenerator {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            painter: write_gradient,
        }
    }

    pub fn with_painter(mut self, painter: Painter) -> Self {
        self.painter = painter;
        self
    }

    /// Render `count` segments partitioning `total_ms` into `work_dir`.
    pub async fn generate(
        &self,
        style: Style,
        count: usize,
        total_ms: u64,
        work_dir: &Path,
    ) -> PipelineResult<VisualSet> {
        let slices = partition_duration(total_ms, count);
        let tasks = slices.into_iter().enumerate().map(|(index, slice)| {
            let spec = GradientSpec::for_segment(style, index, count);
            let path = work_dir.join(format!("segment_{:03}.png", index));
            let (width, height, painter) = (self.width, self.height, self.painter);

            async move {
                let placeholder = render_segment(index, spec.clone(), path.clone(), width, height, painter)
                    .await?;
                Ok::<_, PipelineError>(VisualAsset {
                    index,
                    image_path: path,
                    slice,
                    caption: spec.caption,
                    placeholder,
                })
            }
        });

        let mut assets = join_all(tasks)
            .await
            .into_iter()
            .collect::<PipelineResult<Vec<_>>>()?;
        assets.sort_by_key(|a| a.index);

        let placeholders = assets
            .iter()
            .filter(|a| a.placeholder)
            .map(|a| a.index)
            .collect();

        Ok(VisualSet {
            assets,
            placeholders,
        })
    }
}

/// Paint one segment. Returns whether the placeholder was used.
async fn render_segment(
    index: usize,
    spec: GradientSpec,
    path: PathBuf,
    width: u32,
    height: u32,
    painter: Painter,
) -> PipelineResult<bool> {
    let target = path.clone();
    let painted = tokio::task::spawn_blocking(move || painter(&spec, width, height, &target)).await;

    let reason = match painted {
        Ok(Ok(())) => {
            debug!(index, "Rendered segment image");
            return Ok(false);
        }
        Ok(Err(e)) => e.to_string(),
        Err(e) => format!("render task failed: {}", e),
    };
    warn!(index, "Segment image failed, using placeholder: {}", reason);

    tokio::task::spawn_blocking(move || write_placeholder(index, width, height, &path))
        .await
        .map_err(|e| PipelineError::render(format!("placeholder task failed: {}", e)))?
        .map_err(|e| PipelineError::render(format!("placeholder for segment {}: {}", index, e)))?;

    Ok(true)
}
