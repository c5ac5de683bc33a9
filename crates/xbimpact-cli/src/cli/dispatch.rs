use xbimpact_core::domain::PipelineStage;

#[derive(Debug, Clone, Copy)]
pub(super) struct StageCommandSpec {
    pub(super) command: &'static str,
    pub(super) stage: PipelineStage,
    pub(super) summary_artifact: &'static str,
}

pub(super) const STAGE_COMMANDS: [StageCommandSpec; 2] = [
    StageCommandSpec {
        command: "postprocess",
        stage: PipelineStage::PostProcess,
        summary_artifact: "postprocess_summary.json",
    },
    StageCommandSpec {
        command: "indicators",
        stage: PipelineStage::Indicators,
        summary_artifact: "indicators_summary.json",
    },
];

pub(super) fn stage_command_spec(command: &str) -> Option<StageCommandSpec> {
    STAGE_COMMANDS
        .iter()
        .copied()
        .find(|spec| spec.command == command)
}

#[cfg(test)]
mod tests {
    use super::{STAGE_COMMANDS, stage_command_spec};
    use xbimpact_core::domain::PipelineStage;

    #[test]
    fn every_stage_has_exactly_one_command() {
        for stage in [PipelineStage::PostProcess, PipelineStage::Indicators] {
            let count = STAGE_COMMANDS
                .iter()
                .filter(|spec| spec.stage == stage)
                .count();
            assert_eq!(count, 1, "{stage} should be registered once");
        }
    }

    #[test]
    fn unknown_commands_are_not_registered() {
        assert!(stage_command_spec("indicators").is_some());
        assert!(stage_command_spec("regression").is_none());
    }
}
