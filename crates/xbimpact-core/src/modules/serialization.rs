use super::mesh::Grid;
use serde::Serialize;
use std::fs;
use std::path::Path;

fn write_text_artifact(path: &Path, content: &str) -> std::io::Result<()> {
    if content.ends_with('\n') {
        fs::write(path, content)
    } else {
        fs::write(path, format!("{content}\n"))
    }
}

/// Tab-delimited grid text, one mesh row per line, readable by the grid parser.
pub fn render_grid_text(grid: &Grid) -> String {
    let mut content = String::new();
    for row in grid.row_iter() {
        let line = row
            .iter()
            .map(|value| format!("{value:.6}"))
            .collect::<Vec<_>>()
            .join("\t");
        content.push_str(&line);
        content.push('\n');
    }
    content
}

pub fn write_grid_artifact(path: &Path, grid: &Grid) -> std::io::Result<()> {
    write_text_artifact(path, &render_grid_text(grid))
}

/// Pretty JSON. Non-finite floats are written as `null`.
pub fn write_json_artifact<T: Serialize + ?Sized>(
    path: &Path,
    value: &T,
) -> std::io::Result<()> {
    let content = serde_json::to_string_pretty(value).map_err(std::io::Error::other)?;
    write_text_artifact(path, &content)
}

/// `12.5` hours becomes `012.50`, the fixed-width stamp used in step artifact names.
pub fn hours_stamp(time_seconds: f64) -> String {
    format!("{:06.2}", time_seconds / 3600.0)
}

#[cfg(test)]
mod tests {
    use super::{hours_stamp, render_grid_text, write_grid_artifact, write_json_artifact};
    use crate::modules::mesh::{Grid, parse_grid_source};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn grid_cells_use_six_decimals_without_padding() {
        let grid = Grid::from_rows(&[vec![1.23, 13.0, 1.0e7], vec![-0.5, 0.0, 2.0e-7]])
            .expect("grid");

        assert_eq!(
            render_grid_text(&grid),
            "1.230000\t13.000000\t10000000.000000\n-0.500000\t0.000000\t0.000000\n"
        );
    }

    #[test]
    fn repeated_grid_writes_produce_identical_bytes() {
        let temp = TempDir::new().expect("tempdir should be created");
        let path = temp.path().join("xbout_maxEro.grd");
        let grid = Grid::from_rows(&[vec![0.25, 1.0], vec![2.0, 0.0]]).expect("grid");

        write_grid_artifact(&path, &grid).expect("first write should succeed");
        let first = fs::read(&path).expect("artifact should be readable");
        write_grid_artifact(&path, &grid).expect("second write should succeed");
        let second = fs::read(&path).expect("artifact should be readable");

        assert_eq!(first, second);
        assert_eq!(second, b"0.250000\t1.000000\n2.000000\t0.000000\n");
    }

    #[test]
    fn rendered_grids_parse_back_to_the_same_shape() {
        let grid = Grid::from_rows(&[vec![0.5, -1.25], vec![f64::NAN, 3.0]]).expect("grid");
        let text = render_grid_text(&grid);

        assert_eq!(text, "0.500000\t-1.250000\nNaN\t3.000000\n");
        let parsed = parse_grid_source(&text).expect("rendered grid should parse");
        assert_eq!(parsed.shape(), (2, 2));
        assert!(parsed.get(1, 0).expect("cell").is_nan());
    }

    #[test]
    fn json_artifacts_write_infinite_distances_as_null() {
        let temp = TempDir::new().expect("tempdir should be created");
        let path = temp.path().join("record.json");
        write_json_artifact(&path, &serde_json::json!({"distance": f64::INFINITY}))
            .expect("json should be written");

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).expect("json should be readable"))
                .expect("json should parse");
        assert!(value["distance"].is_null());
        assert!(
            fs::read_to_string(&path)
                .expect("json should be readable")
                .ends_with("}\n")
        );
    }

    #[test]
    fn hours_stamp_is_zero_padded() {
        assert_eq!(hours_stamp(0.0), "000.00");
        assert_eq!(hours_stamp(5400.0), "001.50");
        assert_eq!(hours_stamp(36.0 * 3600.0), "036.00");
    }
}
