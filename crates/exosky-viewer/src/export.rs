//! Sky chart export: send the current camera orientation to the catalog's
//! chart endpoint on a worker thread and save the returned image.
//!
//! At most one export is in flight. The result is collected by
//! [`ChartExporter::poll`] on the render thread.

use crate::tracker::CameraSnapshot;
use crossbeam_channel::{Receiver, TryRecvError};
use exosky_catalog::{CatalogClient, CatalogError, ChartImage, ChartRequest};
use exosky_config::ExportConfig;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("chart request failed: {0}")]
    Catalog(#[from] CatalogError),

    #[error("no download directory available; set export.output_dir")]
    NoOutputDir,

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to start export worker: {0}")]
    Spawn(std::io::Error),

    #[error("export worker exited without a result")]
    WorkerLost,
}

/// Anything that can render a chart for a request.
pub trait ChartSource: Send + Sync + 'static {
    fn chart(&self, request: &ChartRequest) -> Result<ChartImage, CatalogError>;
}

impl ChartSource for CatalogClient {
    fn chart(&self, request: &ChartRequest) -> Result<ChartImage, CatalogError> {
        CatalogClient::chart(self, request)
    }
}

/// What happened to an export request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportStart {
    Started,
    /// Another export is still running.
    Busy,
    /// No frame has been rendered yet, so there is no orientation to send.
    NoSnapshot,
}

pub struct ChartExporter {
    source: Arc<dyn ChartSource>,
    chart_size: u32,
    output_dir: PathBuf,
    in_flight: Option<Receiver<Result<PathBuf, ExportError>>>,
}

impl ChartExporter {
    pub fn new(source: Arc<dyn ChartSource>, chart_size: u32, output_dir: PathBuf) -> Self {
        Self {
            source,
            chart_size,
            output_dir,
            in_flight: None,
        }
    }

    /// Exporter writing to `config.output_dir`, or the user's download
    /// directory when unset.
    pub fn from_config(
        source: Arc<dyn ChartSource>,
        config: &ExportConfig,
    ) -> Result<Self, ExportError> {
        let output_dir = match &config.output_dir {
            Some(dir) => dir.clone(),
            None => dirs::download_dir().ok_or(ExportError::NoOutputDir)?,
        };
        Ok(Self::new(source, config.chart_size, output_dir))
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Start exporting the chart for `planet` as seen from the latest camera
    /// snapshot.
    pub fn request(
        &mut self,
        planet: &str,
        snapshot: &CameraSnapshot,
    ) -> Result<ExportStart, ExportError> {
        if self.is_busy() {
            return Ok(ExportStart::Busy);
        }
        let Some(vectors) = snapshot.latest() else {
            tracing::debug!("Chart export requested before the first frame");
            return Ok(ExportStart::NoSnapshot);
        };

        let request = ChartRequest {
            pl_name: planet.to_owned(),
            quaternion: vectors.quaternion(),
            chart_size: self.chart_size,
        };
        let source = Arc::clone(&self.source);
        let output_dir = self.output_dir.clone();
        let (tx, rx) = crossbeam_channel::bounded(1);

        std::thread::Builder::new()
            .name("chart-export".into())
            .spawn(move || {
                let result = source
                    .chart(&request)
                    .map_err(ExportError::from)
                    .and_then(|image| save_chart(&output_dir, &request.pl_name, &image));
                // The receiver may be gone if the viewer closed meanwhile.
                let _ = tx.send(result);
            })
            .map_err(ExportError::Spawn)?;

        tracing::info!(planet, "Chart export started");
        self.in_flight = Some(rx);
        Ok(ExportStart::Started)
    }

    /// Collect a finished export, clearing the busy flag. `None` while idle or
    /// still running.
    pub fn poll(&mut self) -> Option<Result<PathBuf, ExportError>> {
        let rx = self.in_flight.as_ref()?;
        let result = match rx.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => Err(ExportError::WorkerLost),
        };
        self.in_flight = None;
        match &result {
            Ok(path) => tracing::info!(path = %path.display(), "Chart saved"),
            Err(e) => tracing::warn!("Chart export failed: {e}"),
        }
        Some(result)
    }
}

/// Write `image` into `dir` under a name derived from `planet`, never
/// overwriting an existing file.
pub fn save_chart(dir: &Path, planet: &str, image: &ChartImage) -> Result<PathBuf, ExportError> {
    std::fs::create_dir_all(dir).map_err(|source| ExportError::Write {
        path: dir.to_path_buf(),
        source,
    })?;

    let stem = format!("{}-chart", file_stem(planet));
    let ext = image.extension();
    let mut path = dir.join(format!("{stem}.{ext}"));
    let mut n = 1;
    while path.exists() {
        path = dir.join(format!("{stem}-{n}.{ext}"));
        n += 1;
    }

    std::fs::write(&path, &image.bytes).map_err(|source| ExportError::Write {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

/// Planet names contain spaces and punctuation ("HD 189733 b").
fn file_stem(planet: &str) -> String {
    let stem: String = planet
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if stem.is_empty() {
        "planet".to_owned()
    } else {
        stem
    }
}
