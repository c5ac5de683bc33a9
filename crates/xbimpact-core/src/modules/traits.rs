use crate::domain::{StageArtifact, StageRequest, StageResult};

pub trait StageExecutor {
    fn execute(&self, request: &StageRequest) -> StageResult<Vec<StageArtifact>>;
}
