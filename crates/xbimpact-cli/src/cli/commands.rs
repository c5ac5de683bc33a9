use super::CliError;
use super::dispatch::StageCommandSpec;
use super::helpers::{load_stage_summary, render_artifact_list, render_stage_summary};
use std::path::PathBuf;
use xbimpact_core::domain::{ImpactError, StageRequest};
use xbimpact_core::modules::execute_stage;
use xbimpact_core::modules::frontier::ErosionWindow;
use xbimpact_core::modules::indicators::assign_reference_rows;
use xbimpact_core::modules::manifest::{ManifestTimeSeries, load_run_manifest};
use xbimpact_core::modules::series::MeshTimeSeries;

#[derive(clap::Args)]
pub(super) struct StageArgs {
    /// Run manifest path
    #[arg(long, default_value = "run.json")]
    manifest: PathBuf,

    /// Directory receiving the stage artifacts
    #[arg(long)]
    output: PathBuf,
}

#[derive(clap::Args)]
pub(super) struct InspectArgs {
    /// Run manifest path
    #[arg(long, default_value = "run.json")]
    manifest: PathBuf,
}

pub(super) fn run_stage_command(spec: StageCommandSpec, args: StageArgs) -> Result<i32, CliError> {
    let manifest = load_run_manifest(&args.manifest).map_err(ImpactError::from)?;
    let request = StageRequest::new(
        manifest.run_id.as_str(),
        spec.stage,
        &args.manifest,
        &args.output,
    );

    println!("Running {} for run '{}'...", spec.stage, request.run_id);
    let artifacts = execute_stage(&request)?;

    let summary = load_stage_summary(&args.output.join(spec.summary_artifact))?;
    println!("{}", render_stage_summary(&summary));
    println!("{}", render_artifact_list(&args.output, &artifacts));
    Ok(0)
}

pub(super) fn run_inspect_command(args: InspectArgs) -> Result<i32, CliError> {
    let series = ManifestTimeSeries::open(&args.manifest)?;
    let manifest = series.manifest();
    let (rows, cols) = series.geometry().shape();
    let window = ErosionWindow::from_config(&manifest.config, series.step_count())?;

    println!("Run: {}", manifest.run_id);
    match manifest.epsg {
        Some(epsg) => println!("EPSG: {}", epsg),
        None => println!("EPSG: unspecified"),
    }
    println!("Mesh: {} rows x {} columns", rows, cols);
    println!("Steps: {}", series.step_count());
    println!(
        "Erosion baseline step: {} (tracing from step {})",
        window.baseline_index, window.trace_start
    );

    match series.gauges() {
        Some(gauges) => {
            gauges.ensure_matches_mesh(series.geometry())?;
            println!(
                "Gauges: {} ({} samples)",
                gauges.gauge_count(),
                gauges.sample_count()
            );
        }
        None => println!("Gauges: none"),
    }
    if let Some(removed) = series.removed_gauge() {
        println!("Removed dummy gauge: {}", removed);
    }

    match series.reference_inputs()? {
        Some(inputs) => {
            let assigned = assign_reference_rows(inputs, rows)?;
            println!("Reference points: {}", assigned.len());
        }
        None => println!("Reference points: none"),
    }
    Ok(0)
}
