// Delimiter and column-count detection from the first line of the input
use crate::error::{PipelineError, Result};
use serde::Serialize;
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Delimiter {
    Semicolon,
    Comma,
}

impl Delimiter {
    pub fn as_char(self) -> char {
        match self {
            Delimiter::Semicolon => ';',
            Delimiter::Comma => ',',
        }
    }

    pub fn as_byte(self) -> u8 {
        self.as_char() as u8
    }
}

impl fmt::Display for Delimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Shape every row of the file is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CsvShape {
    pub delimiter: Delimiter,
    pub expected_columns: usize,
}

impl CsvShape {
    /// Semicolon wins when present anywhere in the line, otherwise comma.
    /// A line with neither still yields comma and a single column.
    pub fn from_first_line(line: &str) -> Self {
        let delimiter = if line.contains(';') { Delimiter::Semicolon } else { Delimiter::Comma };
        let expected_columns = line.trim().split(delimiter.as_char()).count();
        CsvShape { delimiter, expected_columns }
    }
}

pub fn detect_shape(path: &Path) -> Result<CsvShape> {
    let file = File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => PipelineError::InputNotFound { path: path.to_path_buf() },
        _ => PipelineError::from(e),
    })?;
    detect_shape_from_reader(BufReader::new(file), path)
}

// Reads exactly one line; `path` is only used for error reporting.
pub fn detect_shape_from_reader<R: BufRead>(mut reader: R, path: &Path) -> Result<CsvShape> {
    let mut first_line = String::new();
    let bytes_read = reader.read_line(&mut first_line)?;
    if bytes_read == 0 {
        return Err(PipelineError::EmptyInput { path: path.to_path_buf() });
    }

    let shape = CsvShape::from_first_line(&first_line);
    tracing::debug!(
        path = %path.display(),
        delimiter = %shape.delimiter,
        expected_columns = shape.expected_columns,
        "Detected CSV shape"
    );
    Ok(shape)
}
