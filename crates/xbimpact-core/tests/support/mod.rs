#![allow(dead_code)]

use serde_json::{Value, json};
use std::fs;
use std::path::{Path, PathBuf};

/// Cross-shore spacing of the synthetic meshes; column `c` sits at `x = c * SPACING`.
pub const SPACING: f64 = 10.0;

pub struct StepFixture {
    pub time: f64,
    pub bed: String,
    pub zs_max: Option<String>,
    pub u_max: Option<String>,
}

impl StepFixture {
    pub fn bed(time: f64, bed: &[Vec<f64>]) -> Self {
        Self {
            time,
            bed: grid_text(bed),
            zs_max: None,
            u_max: None,
        }
    }

    pub fn with_zs_max(mut self, zs_max: &[Vec<f64>]) -> Self {
        self.zs_max = Some(grid_text(zs_max));
        self
    }

    pub fn with_u_max(mut self, u_max: &[Vec<f64>]) -> Self {
        self.u_max = Some(grid_text(u_max));
        self
    }

    /// Lists a `uMax` file that is ragged and cannot be parsed.
    pub fn with_corrupted_u_max(mut self) -> Self {
        self.u_max = Some("0.5 0.5\n0.5\n".to_string());
        self
    }

    /// A step whose bed file is written ragged so it cannot be parsed.
    pub fn corrupted(time: f64) -> Self {
        Self {
            time,
            bed: "1 1 1\n1 1\n".to_string(),
            zs_max: None,
            u_max: None,
        }
    }
}

pub fn write_file(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("fixture directory should be created");
    }
    fs::write(path, content).expect("fixture file should be written");
}

pub fn grid_text(rows: &[Vec<f64>]) -> String {
    let mut text = String::new();
    for row in rows {
        let line: Vec<String> = row.iter().map(|value| format!("{value}")).collect();
        text.push_str(&line.join(" "));
        text.push('\n');
    }
    text
}

pub fn filled(rows: usize, cols: usize, value: f64) -> Vec<Vec<f64>> {
    vec![vec![value; cols]; rows]
}

/// Writes `x.grd`/`y.grd` for a regular `rows x cols` mesh with rows along `y`.
pub fn write_mesh(dir: &Path, rows: usize, cols: usize) {
    let x: Vec<Vec<f64>> = (0..rows)
        .map(|_| (0..cols).map(|col| col as f64 * SPACING).collect())
        .collect();
    let y: Vec<Vec<f64>> = (0..rows)
        .map(|row| vec![row as f64 * SPACING; cols])
        .collect();
    write_file(&dir.join("x.grd"), &grid_text(&x));
    write_file(&dir.join("y.grd"), &grid_text(&y));
}

/// Writes step files plus `run.json`; keys of `extra` are merged into the manifest.
pub fn write_manifest(
    dir: &Path,
    run_id: &str,
    steps: &[StepFixture],
    extra: Value,
) -> PathBuf {
    let mut step_entries = Vec::new();
    for (index, step) in steps.iter().enumerate() {
        let bed = format!("steps/zb_{index}.grd");
        write_file(&dir.join(&bed), &step.bed);
        let mut entry = json!({ "time": step.time, "bed": bed });
        if let Some(zs_max) = &step.zs_max {
            let path = format!("steps/zs_max_{index}.grd");
            write_file(&dir.join(&path), zs_max);
            entry["zsMax"] = json!(path);
        }
        if let Some(u_max) = &step.u_max {
            let path = format!("steps/u_max_{index}.grd");
            write_file(&dir.join(&path), u_max);
            entry["uMax"] = json!(path);
        }
        step_entries.push(entry);
    }

    let mut manifest = json!({
        "runId": run_id,
        "grid": { "x": "x.grd", "y": "y.grd" },
        "steps": step_entries,
    });
    if let (Some(target), Some(extra)) = (manifest.as_object_mut(), extra.as_object()) {
        for (key, value) in extra {
            target.insert(key.clone(), value.clone());
        }
    }

    let path = dir.join("run.json");
    write_file(
        &path,
        &serde_json::to_string_pretty(&manifest).expect("manifest should serialize"),
    );
    path
}

/// Writes a gauge series where gauge `g` at sample `s` sits over column
/// `(s + g) % cols` of row `g`.
pub fn write_cycling_gauges(dir: &Path, rows: usize, cols: usize, times: &[f64]) {
    let x: Vec<Vec<f64>> = (0..rows)
        .map(|gauge| {
            (0..times.len())
                .map(|sample| ((sample + gauge) % cols) as f64 * SPACING)
                .collect()
        })
        .collect();
    let y: Vec<Vec<f64>> = (0..rows)
        .map(|gauge| vec![gauge as f64 * SPACING; times.len()])
        .collect();
    write_file(
        &dir.join("gauges.json"),
        &json!({ "times": times, "x": x, "y": y }).to_string(),
    );
}

pub fn write_reference_points(dir: &Path, points: &[(&str, f64, f64, f64)]) {
    let entries: Vec<Value> = points
        .iter()
        .map(|(id, alongshore, x, y)| {
            json!({ "id": id, "alongshore": alongshore, "x": x, "y": y })
        })
        .collect();
    write_file(
        &dir.join("reference_points.json"),
        &Value::Array(entries).to_string(),
    );
}

pub fn read_json(path: &Path) -> Value {
    let source = fs::read_to_string(path)
        .unwrap_or_else(|error| panic!("artifact '{}' should exist: {}", path.display(), error));
    serde_json::from_str(&source).expect("artifact should be valid JSON")
}
