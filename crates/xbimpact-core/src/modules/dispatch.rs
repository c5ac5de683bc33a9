use super::indicators::IndicatorsStage;
use super::postprocess::PostProcessStage;
use super::traits::StageExecutor;
use crate::domain::{PipelineStage, StageArtifact, StageRequest, StageResult};
use tracing::info;

pub fn execute_stage(request: &StageRequest) -> StageResult<Vec<StageArtifact>> {
    info!(
        run = request.run_id.as_str(),
        stage = request.stage.as_str(),
        manifest = %request.manifest_path.display(),
        output = %request.output_dir.display(),
        "executing stage"
    );

    let artifacts = match request.stage {
        PipelineStage::PostProcess => PostProcessStage.execute(request),
        PipelineStage::Indicators => IndicatorsStage.execute(request),
    }?;

    info!(
        stage = request.stage.as_str(),
        artifacts = artifacts.len(),
        "stage finished"
    );
    Ok(artifacts)
}
