// Partitions every row of the input into shape-conforming and malformed
// rows, and writes the conforming ones to the cleaned artifact.
use super::atomic_write::write_atomically;
use super::detector::{CsvShape, Delimiter};
use crate::error::{PipelineError, Result};
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Fields of one input line, verbatim.
pub type RawRow = Vec<String>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvalidRow {
    /// 1-based line where the row starts in the input file.
    pub line: u64,
    pub fields: RawRow,
}

/// Total, disjoint, order-preserving partition of the input rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    pub valid_rows: Vec<RawRow>,
    pub invalid_rows: Vec<InvalidRow>,
}

impl ValidationResult {
    pub fn valid_count(&self) -> usize {
        self.valid_rows.len()
    }

    pub fn invalid_count(&self) -> usize {
        self.invalid_rows.len()
    }

    pub fn total_rows(&self) -> usize {
        self.valid_count() + self.invalid_count()
    }
}

// Physical line lookup over the raw input.
struct LineIndex {
    newlines: Vec<usize>,
    total_lines: u64,
}

impl LineIndex {
    fn new(data: &[u8]) -> Self {
        let newlines: Vec<usize> = data.iter().enumerate().filter(|(_, b)| **b == b'\n').map(|(i, _)| i).collect();
        let unterminated = data.last().is_some_and(|b| *b != b'\n');
        let total_lines = newlines.len() as u64 + u64::from(unterminated);
        LineIndex { newlines, total_lines }
    }

    /// 1-based line holding the byte at `offset`.
    fn line_of(&self, offset: usize) -> u64 {
        self.newlines.partition_point(|&nl| nl < offset) as u64 + 1
    }
}

fn is_line_break(b: &u8) -> bool {
    *b == b'\n' || *b == b'\r'
}

// The header row goes through the same check as data rows. Blank lines,
// which the CSV reader skips, are rows with zero fields and always invalid.
pub fn split_rows<R: Read>(mut reader: R, shape: &CsvShape) -> Result<ValidationResult> {
    let mut data = Vec::new();
    reader.read_to_end(&mut data)?;
    let lines = LineIndex::new(&data);

    let mut rdr = ReaderBuilder::new()
        .delimiter(shape.delimiter.as_byte())
        .has_headers(false)
        .flexible(true)
        .from_reader(data.as_slice());

    let mut result = ValidationResult::default();
    let mut record = StringRecord::new();
    let mut span_start = 0usize;
    let mut next_line = 1u64;
    while rdr.read_record(&mut record)? {
        let span_end = (rdr.position().byte() as usize).clamp(span_start, data.len());
        let span = &data[span_start..span_end];
        let lead = span.iter().take_while(|b| is_line_break(b)).count();
        let trail = span[lead..].iter().rev().take_while(|b| is_line_break(b)).count();
        let first_line = lines.line_of(span_start + lead);
        let last_line = if span.len() > lead + trail {
            lines.line_of(span_end - trail - 1)
        } else {
            first_line
        };

        push_blank_lines(&mut result, next_line..first_line);

        let fields: RawRow = record.iter().map(str::to_string).collect();
        if fields.len() == shape.expected_columns {
            result.valid_rows.push(fields);
        } else {
            tracing::debug!(line = first_line, found = fields.len(), expected = shape.expected_columns, "Row shape mismatch");
            result.invalid_rows.push(InvalidRow { line: first_line, fields });
        }

        next_line = last_line + 1;
        span_start = span_end;
    }
    push_blank_lines(&mut result, next_line..lines.total_lines + 1);
    Ok(result)
}

fn push_blank_lines(result: &mut ValidationResult, blank: std::ops::Range<u64>) {
    for line in blank {
        tracing::debug!(line, "Blank line");
        result.invalid_rows.push(InvalidRow { line, fields: Vec::new() });
    }
}

pub fn split_file(path: &Path, shape: &CsvShape) -> Result<ValidationResult> {
    let file = File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => PipelineError::InputNotFound { path: path.to_path_buf() },
        _ => PipelineError::from(e),
    })?;
    let result = split_rows(BufReader::new(file), shape)?;
    tracing::info!(
        path = %path.display(),
        valid = result.valid_count(),
        invalid = result.invalid_count(),
        "Split input rows"
    );
    Ok(result)
}

/// Writes `rows` with `delimiter`, quoting only where CSV requires it.
pub fn write_cleaned(rows: &[RawRow], delimiter: Delimiter, dest: &Path) -> Result<()> {
    write_atomically(dest, |file| {
        let mut wtr = WriterBuilder::new()
            .delimiter(delimiter.as_byte())
            .flexible(true)
            .from_writer(file);
        for row in rows {
            wtr.write_record(row)?;
        }
        wtr.flush()?;
        Ok(())
    })?;
    tracing::debug!(path = %dest.display(), rows = rows.len(), "Wrote cleaned artifact");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::tempdir;

    fn shape(delimiter: Delimiter, expected_columns: usize) -> CsvShape {
        CsvShape { delimiter, expected_columns }
    }

    #[test]
    fn test_partition_by_field_count() {
        let input = "A;B;C\n1;2\n1;2;3\n4;5;6;7\n";
        let result = split_rows(Cursor::new(input), &shape(Delimiter::Semicolon, 3)).unwrap();

        assert_eq!(result.valid_rows, vec![
            vec!["A".to_string(), "B".to_string(), "C".to_string()],
            vec!["1".to_string(), "2".to_string(), "3".to_string()],
        ]);
        assert_eq!(result.invalid_count(), 2);
        assert_eq!(result.invalid_rows[0].line, 2);
        assert_eq!(result.invalid_rows[0].fields, vec!["1".to_string(), "2".to_string()]);
        assert_eq!(result.invalid_rows[1].line, 4);
        assert_eq!(result.total_rows(), 4);
    }

    #[test]
    fn test_blank_lines_are_invalid_rows() {
        let input = "A;B\n1;2\n\n3;4\n";
        let result = split_rows(Cursor::new(input), &shape(Delimiter::Semicolon, 2)).unwrap();
        assert_eq!(result.valid_count(), 3);
        assert_eq!(result.invalid_rows, vec![InvalidRow { line: 3, fields: Vec::new() }]);
        assert_eq!(result.total_rows(), 4);
    }

    #[test]
    fn test_trailing_and_crlf_blank_lines() {
        let input = "A;B\r\n1;2\r\n\r\n3;4\r\n\r\n\r\n";
        let result = split_rows(Cursor::new(input), &shape(Delimiter::Semicolon, 2)).unwrap();
        let lines: Vec<u64> = result.invalid_rows.iter().map(|r| r.line).collect();
        assert_eq!(lines, vec![3, 5, 6]);
        assert_eq!(result.total_rows(), 6);
    }

    #[test]
    fn test_multiline_field_spans_one_row() {
        let input = "A;B\n\"x\ny\";2\n\n3;4;5";
        let result = split_rows(Cursor::new(input), &shape(Delimiter::Semicolon, 2)).unwrap();
        assert_eq!(result.valid_rows[1], vec!["x\ny".to_string(), "2".to_string()]);
        let lines: Vec<u64> = result.invalid_rows.iter().map(|r| r.line).collect();
        assert_eq!(lines, vec![4, 5]);
        assert_eq!(result.total_rows(), 4);
    }

    #[test]
    fn test_quoted_delimiter_stays_in_field() {
        let input = "Fornecedor;Valor\n\"ACME; Ltda\";10\n";
        let result = split_rows(Cursor::new(input), &shape(Delimiter::Semicolon, 2)).unwrap();
        assert_eq!(result.invalid_count(), 0);
        assert_eq!(result.valid_rows[1][0], "ACME; Ltda");
    }

    #[test]
    fn test_fields_are_not_trimmed() {
        let input = "a,b\n  x , y\n";
        let result = split_rows(Cursor::new(input), &shape(Delimiter::Comma, 2)).unwrap();
        assert_eq!(result.valid_rows[1], vec!["  x ".to_string(), " y".to_string()]);
    }

    #[test]
    fn test_header_mismatch_is_treated_like_any_row() {
        // Naive split of the first line sees 3 fields, the CSV reader sees 2.
        let input = "\"a;b\";c\n1;2;3\n";
        let result = split_rows(Cursor::new(input), &shape(Delimiter::Semicolon, 3)).unwrap();
        assert_eq!(result.invalid_rows[0].line, 1);
        assert_eq!(result.valid_rows.len(), 1);
    }

    #[test]
    fn test_cleaned_artifact_round_trip() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("csv_validado.csv");
        let input = "Fornecedor;Qtde\n\"ACME; Ltda\";10\nbroken\n\"Quote \"\"X\"\"\";3\n";
        let sh = shape(Delimiter::Semicolon, 2);
        let result = split_rows(Cursor::new(input), &sh).unwrap();

        write_cleaned(&result.valid_rows, sh.delimiter, &dest).unwrap();

        let reread = split_file(&dest, &sh).unwrap();
        assert_eq!(reread.valid_rows, result.valid_rows);
        assert_eq!(reread.invalid_count(), 0);
        assert_eq!(reread.valid_rows[2][0], "Quote \"X\"");
    }

    #[test]
    fn test_write_to_missing_directory_fails() {
        let rows = vec![vec!["a".to_string()]];
        let result = write_cleaned(&rows, Delimiter::Comma, Path::new("missing/dir/out.csv"));
        assert!(matches!(result, Err(PipelineError::Write { .. })));
    }
}
