use super::{
    Envelope, ErosionWindow, Frontier, FrontierTracer, GaugeWaterLine, erosion_columns,
    flow_depth_columns,
};
use crate::common::config::{RunConfig, WaterLineMethod};
use crate::domain::{FrontierKind, ImpactError, ImpactErrorCategory, ImpactResult};
use crate::modules::mesh::{Grid, MeshField, MeshSlice};
use crate::modules::series::MeshTimeSeries;
use serde::Serialize;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub enum WaterSource {
    Gauges(GaugeWaterLine),
    FlowDepth { min_depth: f64 },
}

/// Frontiers traced for one global output step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepFrontiers {
    pub step_index: usize,
    pub time: f64,
    pub water_line: Frontier,
    /// `None` before the erosion window opens.
    pub erosion_scarp: Option<Frontier>,
    /// Set when optional fields of this step could not be read; the
    /// frontiers above are still complete.
    pub optional_gap: Option<SkippedStep>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedStep {
    pub step_index: usize,
    pub time: Option<f64>,
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SweepOutcome {
    pub water_line: Frontier,
    pub erosion_scarp: Frontier,
    pub water_envelope: Envelope,
    pub erosion_envelope: Envelope,
    pub processed_steps: usize,
    pub erosion_steps: usize,
    pub skipped_steps: Vec<SkippedStep>,
    /// Traced steps whose optional fields failed to load.
    pub optional_gaps: Vec<SkippedStep>,
}

struct TracedStep {
    water: Envelope,
    erosion: Option<Envelope>,
}

/// Drives the water-line and erosion-scarp tracers over a time series.
///
/// All setup checks run in [`FrontierSweep::prepare`]; once it returns, only
/// per-step failures remain and those never abort the sweep.
pub struct FrontierSweep<'s, S: MeshTimeSeries + ?Sized> {
    series: &'s S,
    config: &'s RunConfig,
    window: ErosionWindow,
    baseline_bed: Grid,
    water: WaterSource,
    optional_fields: Vec<MeshField>,
}

impl<'s, S: MeshTimeSeries + ?Sized> FrontierSweep<'s, S> {
    pub fn prepare(series: &'s S, config: &'s RunConfig) -> ImpactResult<Self> {
        config.validate()?;

        let step_count = series.step_count();
        if step_count == 0 {
            return Err(ImpactError::configuration(
                "CONFIG.EMPTY_SERIES",
                "time series contains no output steps",
            ));
        }

        let window = ErosionWindow::from_config(config, step_count)?;
        let baseline_bed = series
            .load_step(window.baseline_index, &[MeshField::BedLevel])
            .and_then(|slice| slice.require_field(MeshField::BedLevel).cloned())
            .map_err(|error| {
                ImpactError::io_system(
                    "IO.EROSION_BASELINE",
                    format!(
                        "erosion baseline step {} is unreadable: {}",
                        window.baseline_index,
                        error.message()
                    ),
                )
            })?;

        let geometry = series.geometry();
        let water = match config.water_line_method {
            WaterLineMethod::GaugeTracking => {
                let gauges = series.gauges().ok_or_else(|| {
                    ImpactError::configuration(
                        "CONFIG.GAUGES_MISSING",
                        "gauge tracking needs a gauge series for the run",
                    )
                })?;
                gauges.ensure_matches_mesh(geometry)?;
                WaterSource::Gauges(GaugeWaterLine::new(&geometry.index(), gauges)?)
            }
            WaterLineMethod::FlowDepth { min_depth } => WaterSource::FlowDepth { min_depth },
        };

        if window.trace_start >= step_count {
            warn!(
                trace_start = window.trace_start,
                step_count, "erosion window opens after the last step; no scarp will be traced"
            );
        }

        Ok(Self {
            series,
            config,
            window,
            baseline_bed,
            water,
            optional_fields: Vec::new(),
        })
    }

    pub fn window(&self) -> ErosionWindow {
        self.window
    }

    pub fn baseline_bed(&self) -> &Grid {
        &self.baseline_bed
    }

    pub fn water_source(&self) -> &WaterSource {
        &self.water
    }

    pub fn required_fields(&self) -> Vec<MeshField> {
        match self.water {
            WaterSource::Gauges(_) => vec![MeshField::BedLevel],
            WaterSource::FlowDepth { .. } => vec![MeshField::BedLevel, MeshField::MaxWaterLevel],
        }
    }

    /// Also load these fields on steps that declare them. They are read after
    /// the required fields; a failure there is recorded as an optional gap.
    pub fn with_optional_fields(mut self, fields: &[MeshField]) -> Self {
        self.optional_fields = fields.to_vec();
        self
    }

    fn optional_step_fields(&self, step_index: usize) -> Vec<MeshField> {
        let required = self.required_fields();
        let declared = self.series.available_fields(step_index);
        self.optional_fields
            .iter()
            .copied()
            .filter(|field| declared.contains(field) && !required.contains(field))
            .collect()
    }

    fn attach_optional_fields<'g>(
        &self,
        mut slice: MeshSlice<'g>,
        time: f64,
    ) -> ImpactResult<(MeshSlice<'g>, Option<SkippedStep>)> {
        let step_index = slice.step_index();
        let fields = self.optional_step_fields(step_index);
        if fields.is_empty() {
            return Ok((slice, None));
        }

        let loaded = self.series.load_step(step_index, &fields).and_then(|extra| {
            slice
                .absorb(extra)
                .map_err(|error| error.into_step_unavailable("STEP.FIELD_SHAPE"))
        });
        match loaded {
            Ok(()) => Ok((slice, None)),
            Err(error) if error.category() == ImpactErrorCategory::StepUnavailable => {
                warn!(
                    step = step_index,
                    time,
                    code = error.placeholder(),
                    "optional fields unavailable, step left out of maxima: {}",
                    error.message()
                );
                let gap = SkippedStep {
                    step_index,
                    time: Some(time),
                    code: error.placeholder(),
                    message: error.message().to_string(),
                };
                Ok((slice, Some(gap)))
            }
            Err(error) => Err(error),
        }
    }

    /// Water lines at every gauge time on the export interval, each the
    /// landward-most reach since the previous export.
    pub fn gauge_exports(&self) -> ImpactResult<Vec<(f64, Frontier)>> {
        let WaterSource::Gauges(gauges) = &self.water else {
            return Ok(Vec::new());
        };

        let geometry = self.series.geometry();
        let index = geometry.index();
        let mut previous = None;
        let mut exports = Vec::new();
        for time in gauges.export_times(self.config.water_line_export_interval_seconds) {
            let window = gauges.window(previous, time, geometry.rows());
            exports.push((time, window.to_frontier(&index)?));
            previous = Some(time);
        }
        Ok(exports)
    }

    /// Runs every step in order. `on_step` sees each processed step with its
    /// mesh slice; an error from it aborts the sweep.
    pub fn run<F>(self, mut on_step: F) -> ImpactResult<SweepOutcome>
    where
        F: FnMut(&StepFrontiers, &MeshSlice<'_>) -> ImpactResult<()>,
    {
        let geometry = self.series.geometry();
        let index = geometry.index();
        let mut water_tracer = FrontierTracer::new(FrontierKind::WaterLine, geometry.rows());
        let mut erosion_tracer = FrontierTracer::new(FrontierKind::ErosionScarp, geometry.rows());
        let mut skipped_steps = Vec::new();
        let mut optional_gaps = Vec::new();
        let mut last_processed_time = None;

        info!(
            steps = self.series.step_count(),
            rows = geometry.rows(),
            cols = geometry.cols(),
            baseline = self.window.baseline_index,
            erosion_start = self.window.trace_start,
            "tracing frontiers"
        );

        for step_index in 0..self.series.step_count() {
            let time = self.series.step_time(step_index);
            let traced = time
                .ok_or_else(|| {
                    ImpactError::step_unavailable(
                        "STEP.TIME",
                        format!("step {step_index} has no output time"),
                    )
                })
                .and_then(|time| {
                    let slice = self.series.load_step(step_index, &self.required_fields())?;
                    let step = self.trace_slice(&slice, last_processed_time, time)?;
                    Ok((slice, time, step))
                });

            let (slice, time, step) = match traced {
                Ok(traced) => traced,
                Err(error) if error.category() == ImpactErrorCategory::StepUnavailable => {
                    warn!(
                        step = step_index,
                        time = time.unwrap_or(f64::NAN),
                        code = error.placeholder(),
                        "skipping unavailable step: {}",
                        error.message()
                    );
                    water_tracer.skip_step()?;
                    if self.window.is_active(step_index) {
                        erosion_tracer.skip_step()?;
                    }
                    skipped_steps.push(SkippedStep {
                        step_index,
                        time,
                        code: error.placeholder(),
                        message: error.message().to_string(),
                    });
                    continue;
                }
                Err(error) => return Err(error),
            };

            let (slice, optional_gap) = self.attach_optional_fields(slice, time)?;
            if let Some(gap) = &optional_gap {
                optional_gaps.push(gap.clone());
            }

            let water_line = water_tracer.record(&index, &step.water)?;
            let erosion_scarp = match &step.erosion {
                Some(columns) => Some(erosion_tracer.record(&index, columns)?),
                None => None,
            };

            debug!(
                step = step_index,
                time,
                water_rows = water_line.len(),
                scarp_rows = erosion_scarp.as_ref().map_or(0, Frontier::len),
                "traced step"
            );

            let frontiers = StepFrontiers {
                step_index,
                time,
                water_line,
                erosion_scarp,
                optional_gap,
            };
            on_step(&frontiers, &slice)?;
            last_processed_time = Some(time);
        }

        let water_line = water_tracer.finalize(&index)?;
        let erosion_scarp = erosion_tracer.finalize(&index)?;

        info!(
            processed = water_tracer.steps_traced(),
            skipped = skipped_steps.len(),
            water_rows = water_line.len(),
            scarp_rows = erosion_scarp.len(),
            "frontier tracing finished"
        );

        Ok(SweepOutcome {
            water_line,
            erosion_scarp,
            water_envelope: water_tracer.envelope().clone(),
            erosion_envelope: erosion_tracer.envelope().clone(),
            processed_steps: water_tracer.steps_traced(),
            erosion_steps: erosion_tracer.steps_traced(),
            skipped_steps,
            optional_gaps,
        })
    }

    fn trace_slice(
        &self,
        slice: &MeshSlice<'_>,
        previous_time: Option<f64>,
        time: f64,
    ) -> ImpactResult<TracedStep> {
        let index = slice.index();
        let water = match &self.water {
            WaterSource::Gauges(gauges) => gauges.window(previous_time, time, index.rows()),
            WaterSource::FlowDepth { min_depth } => flow_depth_columns(&index, slice, *min_depth)?,
        };

        let erosion = if self.window.is_active(slice.step_index()) {
            let bed = slice.require_field(MeshField::BedLevel)?;
            Some(erosion_columns(
                &index,
                &self.baseline_bed,
                bed,
                self.config.erosion_threshold,
            )?)
        } else {
            None
        };

        Ok(TracedStep { water, erosion })
    }
}
