//! JSON run manifest (`run.json`) and the file-backed time series it describes.
//!
//! Relative paths inside the manifest resolve against the manifest's directory.
//! Step files are only opened when the step is processed, so a damaged step
//! file surfaces as a recoverable per-step failure.

mod parser;

pub use parser::{
    GaugeFile, GridFiles, ReferencePointEntry, RunManifest, StepFiles, load_run_manifest,
};

use super::classify::ReferenceGeometry;
use super::indicators::ReferenceInput;
use super::mesh::{Grid, GridParseError, MeshField, MeshGeometry, MeshSlice, read_grid_file};
use super::series::{GaugeSeries, MeshTimeSeries};
use crate::domain::{ImpactError, ImpactResult};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("failed to read '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to load grid '{}': {source}", path.display())]
    Grid {
        path: PathBuf,
        source: GridParseError,
    },
    #[error("invalid run manifest: {0}")]
    Invalid(String),
}

impl From<ManifestError> for ImpactError {
    fn from(error: ManifestError) -> Self {
        let message = error.to_string();
        match error {
            ManifestError::Read { .. } => ImpactError::io_system("IO.MANIFEST_READ", message),
            ManifestError::Parse { .. } => {
                ImpactError::configuration("CONFIG.MANIFEST_PARSE", message)
            }
            ManifestError::Grid { source, .. } if source.is_read_failure() => {
                ImpactError::io_system("IO.GRID_READ", message)
            }
            ManifestError::Grid { .. } => ImpactError::configuration("CONFIG.GRID_PARSE", message),
            ManifestError::Invalid(_) => ImpactError::configuration("CONFIG.MANIFEST", message),
        }
    }
}

pub fn validate_manifest(manifest: &RunManifest) -> Result<(), ManifestError> {
    if manifest.run_id.trim().is_empty() {
        return Err(ManifestError::Invalid("runId must not be empty".to_string()));
    }
    if manifest.steps.is_empty() {
        return Err(ManifestError::Invalid(
            "steps must list at least one output step".to_string(),
        ));
    }

    let mut previous: Option<f64> = None;
    for (index, step) in manifest.steps.iter().enumerate() {
        if !step.time.is_finite() {
            return Err(ManifestError::Invalid(format!(
                "step {} has a non-finite time",
                index
            )));
        }
        if let Some(previous) = previous.filter(|previous| step.time <= *previous) {
            return Err(ManifestError::Invalid(format!(
                "step {} time {} does not follow {}; steps must be strictly ascending",
                index, step.time, previous
            )));
        }
        previous = Some(step.time);
    }
    Ok(())
}

fn load_grid(path: PathBuf) -> Result<Grid, ManifestError> {
    read_grid_file(&path).map_err(|source| ManifestError::Grid { path, source })
}

/// A run described by a manifest on disk.
#[derive(Debug, Clone)]
pub struct ManifestTimeSeries {
    manifest_path: PathBuf,
    base_dir: PathBuf,
    manifest: RunManifest,
    geometry: MeshGeometry,
    gauges: Option<GaugeSeries>,
    removed_gauge: Option<usize>,
}

impl ManifestTimeSeries {
    pub fn open(manifest_path: impl AsRef<Path>) -> ImpactResult<Self> {
        let manifest_path = manifest_path.as_ref().to_path_buf();
        let manifest = load_run_manifest(&manifest_path)?;
        validate_manifest(&manifest)?;
        manifest.config.validate()?;

        let base_dir = manifest_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        let x = load_grid(base_dir.join(&manifest.grid.x))?;
        let y = load_grid(base_dir.join(&manifest.grid.y))?;
        let geometry = MeshGeometry::new(x, y)?;

        let (gauges, removed_gauge) = match &manifest.gauges {
            Some(relative) => {
                let file: GaugeFile = parser::read_json(&base_dir.join(relative))?;
                let gauges = GaugeSeries::new(
                    file.times,
                    Grid::from_rows(&file.x)?,
                    Grid::from_rows(&file.y)?,
                )?;
                match manifest.dummy_point {
                    Some(dummy) => {
                        let (trimmed, removed) = gauges.without_dummy_gauge(dummy)?;
                        debug!(gauge = removed, "removed dummy gauge");
                        (Some(trimmed), Some(removed))
                    }
                    None => (Some(gauges), None),
                }
            }
            None => (None, None),
        };

        info!(
            run = manifest.run_id.as_str(),
            rows = geometry.rows(),
            cols = geometry.cols(),
            steps = manifest.steps.len(),
            gauges = gauges.as_ref().map_or(0, GaugeSeries::gauge_count),
            "opened run manifest"
        );

        Ok(Self {
            manifest_path,
            base_dir,
            manifest,
            geometry,
            gauges,
            removed_gauge,
        })
    }

    pub fn manifest(&self) -> &RunManifest {
        &self.manifest
    }

    pub fn manifest_path(&self) -> &Path {
        &self.manifest_path
    }

    pub fn run_id(&self) -> &str {
        &self.manifest.run_id
    }

    pub fn removed_gauge(&self) -> Option<usize> {
        self.removed_gauge
    }

    pub fn resolve(&self, relative: &Path) -> PathBuf {
        self.base_dir.join(relative)
    }

    /// Reference points listed by the manifest, or `None` when it lists none.
    pub fn reference_inputs(&self) -> ImpactResult<Option<Vec<ReferenceInput>>> {
        let Some(relative) = &self.manifest.reference_points else {
            return Ok(None);
        };

        let entries: Vec<ReferencePointEntry> = parser::read_json(&self.resolve(relative))?;
        let inputs = entries
            .into_iter()
            .map(|entry| {
                let anchor = [entry.x, entry.y];
                ReferenceInput {
                    id: entry.id,
                    alongshore: entry.alongshore,
                    geometry: match entry.end {
                        Some(end) => ReferenceGeometry::Segment(anchor, end),
                        None => ReferenceGeometry::Point(anchor),
                    },
                }
            })
            .collect();
        Ok(Some(inputs))
    }

    fn field_path(&self, step: &StepFiles, field: MeshField) -> Option<PathBuf> {
        let relative = match field {
            MeshField::BedLevel => Some(&step.bed),
            MeshField::MaxWaterLevel => step.zs_max.as_ref(),
            MeshField::MaxVelocityU => step.u_max.as_ref(),
            MeshField::MaxVelocityV => step.v_max.as_ref(),
        };
        relative.map(|relative| self.resolve(relative))
    }
}

impl MeshTimeSeries for ManifestTimeSeries {
    fn geometry(&self) -> &MeshGeometry {
        &self.geometry
    }

    fn step_count(&self) -> usize {
        self.manifest.steps.len()
    }

    fn step_time(&self, step_index: usize) -> Option<f64> {
        self.manifest.steps.get(step_index).map(|step| step.time)
    }

    fn available_fields(&self, step_index: usize) -> Vec<MeshField> {
        let Some(step) = self.manifest.steps.get(step_index) else {
            return Vec::new();
        };
        [
            MeshField::BedLevel,
            MeshField::MaxWaterLevel,
            MeshField::MaxVelocityU,
            MeshField::MaxVelocityV,
        ]
        .into_iter()
        .filter(|field| self.field_path(step, *field).is_some())
        .collect()
    }

    fn load_step(&self, step_index: usize, fields: &[MeshField]) -> ImpactResult<MeshSlice<'_>> {
        let step = self.manifest.steps.get(step_index).ok_or_else(|| {
            ImpactError::step_unavailable(
                "STEP.INDEX",
                format!(
                    "step {} is beyond the {}-step manifest",
                    step_index,
                    self.manifest.steps.len()
                ),
            )
        })?;

        let mut slice = MeshSlice::new(&self.geometry, step_index, step.time);
        for field in fields {
            let path = self.field_path(step, *field).ok_or_else(|| {
                ImpactError::step_unavailable(
                    "STEP.FIELD_MISSING",
                    format!(
                        "step {} (t={}s) lists no '{}' file",
                        step_index, step.time, field
                    ),
                )
            })?;
            let placeholder = if *field == MeshField::BedLevel {
                "STEP.BED_READ"
            } else {
                "STEP.FIELD_READ"
            };
            let grid = read_grid_file(&path).map_err(|source| {
                ImpactError::step_unavailable(
                    placeholder,
                    format!(
                        "step {} (t={}s) '{}' from '{}': {}",
                        step_index,
                        step.time,
                        field,
                        path.display(),
                        source
                    ),
                )
            })?;
            slice = slice
                .with_field(*field, grid)
                .map_err(|error| error.into_step_unavailable(placeholder))?;
        }
        Ok(slice)
    }

    fn gauges(&self) -> Option<&GaugeSeries> {
        self.gauges.as_ref()
    }
}
