use super::ManifestError;
use crate::common::config::RunConfig;
use crate::numerics::Point2;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunManifest {
    pub run_id: String,
    #[serde(default)]
    pub epsg: Option<u32>,
    pub grid: GridFiles,
    pub steps: Vec<StepFiles>,
    #[serde(default)]
    pub gauges: Option<PathBuf>,
    #[serde(default)]
    pub dummy_point: Option<Point2>,
    #[serde(default)]
    pub reference_points: Option<PathBuf>,
    #[serde(default)]
    pub config: RunConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GridFiles {
    pub x: PathBuf,
    pub y: PathBuf,
}

/// Files written by the solver for one global output step.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepFiles {
    pub time: f64,
    pub bed: PathBuf,
    #[serde(default)]
    pub zs_max: Option<PathBuf>,
    #[serde(default)]
    pub u_max: Option<PathBuf>,
    #[serde(default)]
    pub v_max: Option<PathBuf>,
}

/// Per-gauge tracks; `x[g][s]` is gauge `g` at `times[s]`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GaugeFile {
    pub times: Vec<f64>,
    pub x: Vec<Vec<f64>>,
    pub y: Vec<Vec<f64>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReferencePointEntry {
    pub id: String,
    pub alongshore: f64,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub end: Option<Point2>,
}

pub(super) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ManifestError> {
    let source = fs::read_to_string(path).map_err(|source| ManifestError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&source).map_err(|source| ManifestError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

pub fn load_run_manifest(path: impl AsRef<Path>) -> Result<RunManifest, ManifestError> {
    read_json(path.as_ref())
}
