//! Post-processing stage: frontier geometry per step, overall frontiers, and
//! field maxima grids.

mod model;

pub use model::{
    FrontierDocument, PostProcessSummary, gauge_export_path, overall_frontier_path,
    step_frontier_path,
};

use super::StageExecutor;
use super::frontier::FrontierSweep;
use super::helpers::{ArtifactWriter, artifact_list, validate_request_shape};
use super::manifest::ManifestTimeSeries;
use super::maxima::{FieldMaxima, MaximaField};
use super::mesh::MeshField;
use super::series::MeshTimeSeries;
use crate::common::config::RunContext;
use crate::domain::{
    FrontierKind, ImpactResult, PipelineStage, StageArtifact, StageRequest, StageResult,
};
use std::path::Path;
use tracing::info;

pub(crate) const POSTPROCESS_REQUIRED_INPUTS: [&str; 1] = ["run.json"];
pub(crate) const POSTPROCESS_EXPECTED_OUTPUTS: [&str; 3] = [
    "water_line_overall.json",
    "erosion_scarp_overall.json",
    "postprocess_summary.json",
];
pub(crate) const POSTPROCESS_SUMMARY: &str = "postprocess_summary.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostProcessContract {
    pub required_inputs: Vec<StageArtifact>,
    pub expected_outputs: Vec<StageArtifact>,
}

pub struct PostProcessStage;

impl PostProcessStage {
    pub fn contract_for_request(
        &self,
        request: &StageRequest,
    ) -> StageResult<PostProcessContract> {
        validate_request_shape(request, PipelineStage::PostProcess)?;
        Ok(PostProcessContract {
            required_inputs: artifact_list(&POSTPROCESS_REQUIRED_INPUTS),
            expected_outputs: artifact_list(&POSTPROCESS_EXPECTED_OUTPUTS),
        })
    }
}

impl StageExecutor for PostProcessStage {
    fn execute(&self, request: &StageRequest) -> StageResult<Vec<StageArtifact>> {
        validate_request_shape(request, PipelineStage::PostProcess)?;
        let series = ManifestTimeSeries::open(&request.manifest_path)?;
        let manifest = series.manifest();
        let context = RunContext {
            run_id: &manifest.run_id,
            epsg: manifest.epsg,
            config: &manifest.config,
        };

        let (_, artifacts) =
            postprocess_series(&series, context, series.removed_gauge(), &request.output_dir)?;
        Ok(artifacts)
    }
}

/// Traces both frontiers over `series` and writes every post-processing artifact.
pub fn postprocess_series<S>(
    series: &S,
    context: RunContext<'_>,
    removed_gauge: Option<usize>,
    output_dir: &Path,
) -> ImpactResult<(PostProcessSummary, Vec<StageArtifact>)>
where
    S: MeshTimeSeries + ?Sized,
{
    let optional_fields = [
        MeshField::MaxWaterLevel,
        MeshField::MaxVelocityU,
        MeshField::MaxVelocityV,
    ];
    let sweep =
        FrontierSweep::prepare(series, context.config)?.with_optional_fields(&optional_fields);
    let window = sweep.window();
    let mut writer = ArtifactWriter::create(output_dir, PipelineStage::PostProcess)?;

    let exports = sweep.gauge_exports()?;
    for (time, frontier) in &exports {
        let document = FrontierDocument::overall(
            context.run_id,
            context.epsg,
            FrontierKind::WaterLine,
            frontier,
        )
        .at(None, *time);
        writer.json(&gauge_export_path(*time), &document)?;
    }

    let baseline = sweep.baseline_bed().clone();
    let mut maxima = FieldMaxima::new();
    let outcome = sweep.run(|frontiers, slice| {
        if frontiers.optional_gap.is_none() {
            maxima.accumulate(slice, &baseline)?;
        }

        let water = FrontierDocument::overall(
            context.run_id,
            context.epsg,
            FrontierKind::WaterLine,
            &frontiers.water_line,
        )
        .at(Some(frontiers.step_index), frontiers.time);
        writer.json(
            &step_frontier_path(FrontierKind::WaterLine, frontiers.time),
            &water,
        )?;

        if let Some(scarp) = &frontiers.erosion_scarp {
            let document = FrontierDocument::overall(
                context.run_id,
                context.epsg,
                FrontierKind::ErosionScarp,
                scarp,
            )
            .at(Some(frontiers.step_index), frontiers.time);
            writer.json(
                &step_frontier_path(FrontierKind::ErosionScarp, frontiers.time),
                &document,
            )?;
        }
        Ok(())
    })?;

    for (kind, frontier) in [
        (FrontierKind::WaterLine, &outcome.water_line),
        (FrontierKind::ErosionScarp, &outcome.erosion_scarp),
    ] {
        let document = FrontierDocument::overall(context.run_id, context.epsg, kind, frontier);
        writer.json(&overall_frontier_path(kind), &document)?;
    }

    let computed = maxima.computed();
    for (field, grid) in &computed {
        writer.grid(field.file_name(), grid)?;
    }

    let rows = series.geometry().rows();
    let summary = PostProcessSummary {
        run_id: context.run_id.to_string(),
        steps_total: series.step_count(),
        steps_processed: outcome.processed_steps,
        steps_skipped: outcome.skipped_steps.len(),
        erosion_steps: outcome.erosion_steps,
        erosion_baseline_step: window.baseline_index,
        erosion_trace_start: window.trace_start,
        water_line_rows: outcome.water_line.len(),
        erosion_scarp_rows: outcome.erosion_scarp.len(),
        rows_without_water_line: rows - outcome.water_line.len(),
        rows_without_erosion_scarp: rows - outcome.erosion_scarp.len(),
        gauge_exports: exports.len(),
        removed_gauge,
        maxima: computed
            .iter()
            .map(|(field, _)| MaximaField::file_name(*field).to_string())
            .collect(),
        skipped: outcome.skipped_steps,
        maxima_gaps: outcome.optional_gaps,
    };
    writer.json(POSTPROCESS_SUMMARY, &summary)?;

    info!(
        processed = summary.steps_processed,
        skipped = summary.steps_skipped,
        maxima = summary.maxima.len(),
        maxima_gaps = summary.maxima_gaps.len(),
        "post-processing finished"
    );
    Ok((summary, writer.finish()))
}
