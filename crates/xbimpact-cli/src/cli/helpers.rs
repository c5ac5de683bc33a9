use super::CliError;
use anyhow::Context;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing_subscriber::EnvFilter;
use xbimpact_core::domain::StageArtifact;

/// Stderr filter used when neither `--log-level` nor `RUST_LOG` is set.
pub(super) const DEFAULT_LOG_FILTER: &str = "warn";

pub(super) fn init_logging(level: Option<&str>) -> Result<(), CliError> {
    let filter = match level {
        Some(level) => EnvFilter::try_new(level).map_err(|error| {
            CliError::Usage(format!("invalid --log-level '{}': {}", level, error))
        })?,
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to install log subscriber: {}", error))?;
    Ok(())
}

/// The parts of a stage summary file shown to the user.
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub(super) struct StageSummaryView {
    pub(super) run_id: String,
    pub(super) steps_total: usize,
    pub(super) steps_processed: usize,
    pub(super) steps_skipped: usize,
    #[serde(default)]
    pub(super) rows_without_water_line: Option<usize>,
    #[serde(default)]
    pub(super) rows_without_erosion_scarp: Option<usize>,
    #[serde(default)]
    pub(super) maxima: Vec<String>,
    #[serde(default)]
    pub(super) indicators: Vec<IndicatorTotalsView>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub(super) struct IndicatorTotalsView {
    pub(super) indicator: String,
    pub(super) highest_level: Option<String>,
    pub(super) rows_without_frontier: usize,
}

pub(super) fn load_stage_summary(path: &Path) -> Result<StageSummaryView, CliError> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("failed to read stage summary '{}'", path.display()))?;
    let summary = serde_json::from_str(&source)
        .with_context(|| format!("failed to parse stage summary '{}'", path.display()))?;
    Ok(summary)
}

pub(super) fn render_stage_summary(summary: &StageSummaryView) -> String {
    let mut lines = vec![
        format!("Run: {}", summary.run_id),
        format!(
            "Steps processed: {} of {} (skipped: {})",
            summary.steps_processed, summary.steps_total, summary.steps_skipped
        ),
    ];

    if let Some(rows) = summary.rows_without_water_line {
        lines.push(format!("Rows without water line: {}", rows));
    }
    if let Some(rows) = summary.rows_without_erosion_scarp {
        lines.push(format!("Rows without erosion scarp: {}", rows));
    }
    if !summary.maxima.is_empty() {
        lines.push(format!("Field maxima: {}", summary.maxima.join(", ")));
    }
    for totals in &summary.indicators {
        lines.push(format!(
            "Indicator {}: highest level {}, rows without frontier {}",
            totals.indicator,
            totals.highest_level.as_deref().unwrap_or("none"),
            totals.rows_without_frontier
        ));
    }

    lines.join("\n")
}

pub(super) fn render_artifact_list(output_dir: &Path, artifacts: &[StageArtifact]) -> String {
    let mut lines = vec![format!(
        "Artifacts written to {} ({}):",
        output_dir.display(),
        artifacts.len()
    )];
    lines.extend(
        artifacts
            .iter()
            .map(|artifact| format!("  - {}", artifact.display_name())),
    );
    lines.join("\n")
}
