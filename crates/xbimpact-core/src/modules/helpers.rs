use super::serialization::{write_grid_artifact, write_json_artifact};
use super::mesh::Grid;
use crate::domain::{ImpactError, ImpactResult, PipelineStage, StageArtifact, StageRequest};
use serde::Serialize;
use std::fs;
use std::path::Path;

pub(crate) fn validate_request_shape(
    request: &StageRequest,
    expected: PipelineStage,
) -> ImpactResult<()> {
    if request.stage != expected {
        return Err(ImpactError::configuration(
            "CONFIG.STAGE_MISMATCH",
            format!(
                "{} stage received a request for {}",
                expected, request.stage
            ),
        ));
    }

    if !request.manifest_path.is_file() {
        return Err(ImpactError::io_system(
            "IO.MANIFEST_READ",
            format!(
                "{} stage expects a run manifest at '{}'",
                expected,
                request.manifest_path.display()
            ),
        ));
    }

    Ok(())
}

pub(crate) fn artifact_list(paths: &[&str]) -> Vec<StageArtifact> {
    paths.iter().copied().map(StageArtifact::new).collect()
}

/// Writes stage artifacts under one output directory and records what was written.
#[derive(Debug)]
pub(crate) struct ArtifactWriter<'a> {
    root: &'a Path,
    stage: PipelineStage,
    written: Vec<StageArtifact>,
}

impl<'a> ArtifactWriter<'a> {
    pub(crate) fn create(root: &'a Path, stage: PipelineStage) -> ImpactResult<Self> {
        fs::create_dir_all(root).map_err(|source| {
            ImpactError::io_system(
                "IO.OUTPUT_DIRECTORY",
                format!(
                    "failed to create {} output directory '{}': {}",
                    stage,
                    root.display(),
                    source
                ),
            )
        })?;
        Ok(Self {
            root,
            stage,
            written: Vec::new(),
        })
    }

    pub(crate) fn json<T: Serialize + ?Sized>(
        &mut self,
        relative: &str,
        value: &T,
    ) -> ImpactResult<()> {
        let path = self.prepare(relative)?;
        write_json_artifact(&path, value).map_err(|source| self.write_error(&path, source))?;
        self.written.push(StageArtifact::new(relative));
        Ok(())
    }

    pub(crate) fn grid(&mut self, relative: &str, grid: &Grid) -> ImpactResult<()> {
        let path = self.prepare(relative)?;
        write_grid_artifact(&path, grid).map_err(|source| self.write_error(&path, source))?;
        self.written.push(StageArtifact::new(relative));
        Ok(())
    }

    pub(crate) fn finish(self) -> Vec<StageArtifact> {
        self.written
    }

    fn prepare(&self, relative: &str) -> ImpactResult<std::path::PathBuf> {
        let path = self.root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| {
                ImpactError::io_system(
                    "IO.OUTPUT_DIRECTORY",
                    format!(
                        "failed to create {} artifact directory '{}': {}",
                        self.stage,
                        parent.display(),
                        source
                    ),
                )
            })?;
        }
        Ok(path)
    }

    fn write_error(&self, path: &Path, source: std::io::Error) -> ImpactError {
        ImpactError::io_system(
            "IO.ARTIFACT_WRITE",
            format!(
                "failed to write {} artifact '{}': {}",
                self.stage,
                path.display(),
                source
            ),
        )
    }
}
