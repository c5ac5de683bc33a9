use super::Grid;
use std::fs;
use std::path::{Path, PathBuf};

/// Failure reading a whitespace-delimited grid text matrix (`.grd`).
#[derive(Debug, thiserror::Error)]
pub enum GridParseError {
    #[error("failed to read grid '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("line {line}, column {column}: '{token}' is not a number")]
    Token {
        line: usize,
        column: usize,
        token: String,
    },
    #[error("line {line} has {found} values but earlier rows have {expected}")]
    Ragged {
        line: usize,
        expected: usize,
        found: usize,
    },
    #[error("grid contains no values")]
    Empty,
}

impl GridParseError {
    pub fn is_read_failure(&self) -> bool {
        matches!(self, Self::Read { .. })
    }
}

/// Parses one mesh row per non-blank line. Tokens are split on any whitespace,
/// so tab- and space-delimited solver output both load.
pub fn parse_grid_source(source: &str) -> Result<Grid, GridParseError> {
    let mut values = Vec::new();
    let mut cols = None;
    let mut rows = 0_usize;

    for (line_index, line) in source.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }

        let before = values.len();
        for (column, token) in line.split_whitespace().enumerate() {
            let value = token.parse::<f64>().map_err(|_| GridParseError::Token {
                line: line_index + 1,
                column: column + 1,
                token: token.to_string(),
            })?;
            values.push(value);
        }

        let found = values.len() - before;
        match cols {
            None => cols = Some(found),
            Some(expected) if expected != found => {
                return Err(GridParseError::Ragged {
                    line: line_index + 1,
                    expected,
                    found,
                });
            }
            Some(_) => {}
        }
        rows += 1;
    }

    match cols {
        Some(cols) if cols > 0 => Ok(Grid::from_row_major(rows, cols, values)),
        _ => Err(GridParseError::Empty),
    }
}

pub fn read_grid_file(path: &Path) -> Result<Grid, GridParseError> {
    let source = fs::read_to_string(path).map_err(|source| GridParseError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_grid_source(&source)
}
