use std::collections::HashSet;
use std::path::Path;

use log::{debug, info, warn};

use super::error::TableError;
use super::model::{Column, ColumnData, ColumnType, SkippedRow, Table};
use super::options::{Delimiter, MalformedRowPolicy, ReadOptions};

/// Number of data lines (after the reference line) looked at when guessing
/// the delimiter.
const DETECT_SAMPLE_LINES: usize = 20;

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Read a delimited catalog file into a [`Table`].
///
/// The whole file is read in one go; the handle is closed before parsing
/// starts.
pub fn read_file(path: &Path, options: &ReadOptions) -> Result<Table, TableError> {
    let text = std::fs::read_to_string(path).map_err(|source| TableError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("Read {} bytes from {}", text.len(), path.display());
    read_str(&text, options)
}

/// Parse delimited text already in memory.
pub fn read_str(text: &str, options: &ReadOptions) -> Result<Table, TableError> {
    let lines: Vec<&str> = text.lines().collect();
    read_lines(&lines, options)
}

/// Parse a sequence of physical lines.
pub fn read_lines<S: AsRef<str>>(lines: &[S], options: &ReadOptions) -> Result<Table, TableError> {
    let lines = retained_lines(lines, options);
    if lines.is_empty() {
        return Err(TableError::Format(
            "input is empty or holds only comments".to_string(),
        ));
    }

    let data_start = options.data_start();
    if options.has_header {
        if options.header_row_index >= lines.len() {
            return Err(TableError::Format(format!(
                "header row index {} is out of range; there are only {} non-comment lines",
                options.header_row_index,
                lines.len()
            )));
        }
        if data_start <= options.header_row_index {
            return Err(TableError::Format(format!(
                "data start index {data_start} must come after header row index {}",
                options.header_row_index
            )));
        }
    }
    if data_start > lines.len() {
        return Err(TableError::Format(format!(
            "data start index {data_start} is out of range; there are only {} non-comment lines",
            lines.len()
        )));
    }

    let header_line = options
        .has_header
        .then(|| &lines[options.header_row_index]);
    let data_lines = &lines[data_start..];

    let delimiter = match options.delimiter {
        Some(d) => d,
        None => {
            let d = detect_delimiter(header_line.or(data_lines.first()), data_lines);
            debug!("Detected {d} as the delimiter");
            d
        }
    };

    let header_fields = header_line
        .map(|l| split_line(l.text, delimiter))
        .transpose()?;
    let split_rows = data_lines
        .iter()
        .map(|l| Ok((l.number, split_line(l.text, delimiter)?)))
        .collect::<Result<Vec<_>, TableError>>()?;

    let names = column_names(options, header_fields, split_rows.first().map(|(_, f)| f.len()))?;
    let width = names.len();

    if let Some(unknown) = options.column_types.keys().find(|k| !names.contains(k)) {
        return Err(TableError::Format(format!(
            "a type was given for column '{unknown}', but there is no such column"
        )));
    }

    let mut rows = Vec::with_capacity(split_rows.len());
    let mut skipped = Vec::new();
    for (line, fields) in split_rows {
        if fields.len() == width {
            rows.push((line, fields));
            continue;
        }
        match options.on_malformed_row {
            MalformedRowPolicy::Reject => {
                return Err(TableError::RowLength {
                    line,
                    expected: width,
                    found: fields.len(),
                })
            }
            MalformedRowPolicy::Skip => {
                warn!(
                    "Skipping line {line}: expected {width} fields but found {}",
                    fields.len()
                );
                skipped.push(SkippedRow {
                    line,
                    expected: width,
                    found: fields.len(),
                });
            }
        }
    }

    let mut columns = Vec::with_capacity(width);
    for (j, name) in names.into_iter().enumerate() {
        let cells: Vec<(usize, Option<&str>)> = rows
            .iter()
            .map(|(line, fields)| {
                let cell = fields[j].trim();
                (*line, (!options.is_missing(cell)).then_some(cell))
            })
            .collect();

        let column_type = match options.column_types.get(&name) {
            Some(&forced) => forced,
            None => infer_type(cells.iter().filter_map(|(_, c)| *c)),
        };
        debug!("Column '{name}' is {column_type}");

        let data = convert_cells(&name, &cells, column_type)?;
        columns.push(Column::new(name, data));
    }

    let table = Table::new(columns)?.with_skipped_rows(skipped);
    info!(
        "Read a table with {} rows and {} columns ({} lines skipped)",
        table.num_rows(),
        table.num_columns(),
        table.skipped_rows().len()
    );
    Ok(table)
}

// ---------------------------------------------------------------------------
// Line handling
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
struct SourceLine<'a> {
    /// 1-based physical line number.
    number: usize,
    text: &'a str,
}

/// Drop comment and blank lines, remembering where the rest came from.
fn retained_lines<'a, S: AsRef<str>>(lines: &'a [S], options: &ReadOptions) -> Vec<SourceLine<'a>> {
    lines
        .iter()
        .enumerate()
        .map(|(i, l)| SourceLine {
            number: i + 1,
            text: l.as_ref().trim_end_matches('\r'),
        })
        .filter(|l| !l.text.trim().is_empty() && !options.is_comment(l.text))
        .collect()
}

fn split_line(text: &str, delimiter: Delimiter) -> Result<Vec<String>, TableError> {
    let Some(byte) = delimiter.csv_byte()? else {
        return Ok(text.split_whitespace().map(str::to_string).collect());
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .delimiter(byte)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());
    let mut record = csv::StringRecord::new();
    if !reader.read_record(&mut record)? {
        return Ok(Vec::new());
    }
    Ok(record.iter().map(str::to_string).collect())
}

/// Pick the candidate delimiter that splits `reference` into at least two
/// fields and agrees with the most sample lines. Ties go to the earlier
/// candidate. With no such candidate the input is a single column.
fn detect_delimiter(reference: Option<&SourceLine>, data: &[SourceLine]) -> Delimiter {
    let Some(reference) = reference else {
        return Delimiter::Comma;
    };
    let sample = &data[..data.len().min(DETECT_SAMPLE_LINES)];
    let field_count = |text: &str, d: Delimiter| split_line(text, d).map_or(0, |f| f.len());

    let mut best: Option<(Delimiter, usize)> = None;
    for candidate in Delimiter::CANDIDATES {
        let width = field_count(reference.text, candidate);
        if width < 2 {
            continue;
        }
        let score = sample
            .iter()
            .filter(|l| field_count(l.text, candidate) == width)
            .count();
        if best.map_or(true, |(_, best_score)| score > best_score) {
            best = Some((candidate, score));
        }
    }
    best.map_or(Delimiter::Comma, |(d, _)| d)
}

// ---------------------------------------------------------------------------
// Column names
// ---------------------------------------------------------------------------

fn column_names(
    options: &ReadOptions,
    header_fields: Option<Vec<String>>,
    first_row_width: Option<usize>,
) -> Result<Vec<String>, TableError> {
    let raw = match (&options.names, header_fields) {
        (Some(names), Some(header)) if names.len() != header.len() => {
            return Err(TableError::Format(format!(
                "{} names were given but the header line has {} fields",
                names.len(),
                header.len()
            )))
        }
        (Some(names), None) if first_row_width.is_some_and(|w| w != names.len()) => {
            return Err(TableError::Format(format!(
                "{} names were given but the first data line has {} fields",
                names.len(),
                first_row_width.unwrap_or(0)
            )))
        }
        (Some(names), _) => names.clone(),
        (None, Some(header)) => header,
        (None, None) => {
            let width = first_row_width.ok_or_else(|| {
                TableError::Format(
                    "no header and no data lines; cannot tell how many columns there are"
                        .to_string(),
                )
            })?;
            vec![String::new(); width]
        }
    };
    Ok(dedupe_names(raw))
}

/// Replace each blank or repeated name with `col<position>` (1-based),
/// leaving every other name as it was.
fn dedupe_names(raw: Vec<String>) -> Vec<String> {
    let mut taken: HashSet<String> = HashSet::new();
    let mut names: Vec<Option<String>> = raw
        .into_iter()
        .map(|n| {
            let n = n.trim().to_string();
            (!n.is_empty() && taken.insert(n.clone())).then_some(n)
        })
        .collect();

    for (i, slot) in names.iter_mut().enumerate() {
        if slot.is_some() {
            continue;
        }
        let base = format!("col{}", i + 1);
        let mut candidate = base.clone();
        let mut n = 1;
        while taken.contains(&candidate) {
            candidate = format!("{base}_{n}");
            n += 1;
        }
        taken.insert(candidate.clone());
        *slot = Some(candidate);
    }
    names.into_iter().flatten().collect()
}

// ---------------------------------------------------------------------------
// Typing
// ---------------------------------------------------------------------------

/// Integer if every present cell is an integer, else float if every present
/// cell is a float, else string. A column with no present cells is integer.
fn infer_type<'a>(mut cells: impl Iterator<Item = &'a str> + Clone) -> ColumnType {
    if cells.clone().all(|c| c.parse::<i64>().is_ok()) {
        ColumnType::Integer
    } else if cells.all(|c| c.parse::<f64>().is_ok()) {
        ColumnType::Float
    } else {
        ColumnType::String
    }
}

fn convert_cells(
    column: &str,
    cells: &[(usize, Option<&str>)],
    column_type: ColumnType,
) -> Result<ColumnData, TableError> {
    fn parse_all<T: std::str::FromStr>(
        column: &str,
        cells: &[(usize, Option<&str>)],
        expected: ColumnType,
    ) -> Result<Vec<Option<T>>, TableError> {
        cells
            .iter()
            .map(|&(line, cell)| {
                cell.map(|c| {
                    c.parse::<T>().map_err(|_| TableError::CellParse {
                        column: column.to_string(),
                        line,
                        value: c.to_string(),
                        expected,
                    })
                })
                .transpose()
            })
            .collect()
    }

    Ok(match column_type {
        ColumnType::Integer => ColumnData::Integer(parse_all(column, cells, column_type)?),
        ColumnType::Float => ColumnData::Float(parse_all(column, cells, column_type)?),
        ColumnType::String => ColumnData::String(
            cells
                .iter()
                .map(|(_, c)| c.map(str::to_string))
                .collect(),
        ),
    })
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::data::model::Value;

    #[test]
    fn test_comment_then_header_then_data() {
        let lines = ["#comment", "name,ra,dec", "BLG100,17:51:00.0,-29:59:48"];
        let table = read_lines(&lines, &ReadOptions::default()).unwrap();
        assert_eq!(table.column_names(), vec!["name", "ra", "dec"]);
        assert_eq!(table.num_rows(), 1);
        assert_eq!(
            table.try_column("name").unwrap().get(0),
            Some(Value::String("BLG100".into()))
        );
        assert_eq!(
            table.try_column("ra").unwrap().column_type(),
            ColumnType::String
        );
    }

    #[test]
    fn test_float_column_with_missing_cell() {
        let table = read_lines(&["id,x", "a,1.0", "b,", "c,3.0"], &ReadOptions::default()).unwrap();
        let x = table.try_column("x").unwrap();
        assert_eq!(x.column_type(), ColumnType::Float);
        assert!(!x.is_missing(0));
        assert!(x.is_missing(1));

        let dense = x.filled(&Value::Float(f64::NAN)).unwrap();
        let v = dense.to_f64_vec(0.0).unwrap();
        assert_abs_diff_eq!(v[0], 1.0);
        assert!(v[1].is_nan());
        assert_abs_diff_eq!(v[2], 3.0);
    }

    #[test]
    fn test_blank_lines_are_not_rows() {
        let table = read_lines(&["x", "1.0", "", "   ", "3.0"], &ReadOptions::default()).unwrap();
        assert_eq!(table.num_rows(), 2);
        assert_eq!(table.try_column("x").unwrap().missing_count(), 0);
    }

    #[test]
    fn test_infer_type() {
        assert_eq!(infer_type(["1", "-2", "+3"].into_iter()), ColumnType::Integer);
        assert_eq!(infer_type(["1", "2.5", "1e3"].into_iter()), ColumnType::Float);
        assert_eq!(infer_type(["1", "two"].into_iter()), ColumnType::String);
        assert_eq!(infer_type(std::iter::empty()), ColumnType::Integer);
    }

    #[test]
    fn test_dedupe_names_is_per_name() {
        let raw = ["ra", "", "dec", "ra", "col2"].map(String::from).to_vec();
        assert_eq!(dedupe_names(raw), vec!["ra", "col2_1", "dec", "col4", "col2"]);

        let raw = ["a", " ", "b"].map(String::from).to_vec();
        assert_eq!(dedupe_names(raw), vec!["a", "col2", "b"]);
    }

    #[test]
    fn test_detect_delimiter() {
        let line = |number, text| SourceLine { number, text };
        let header = line(1, "name, ra, dec");
        let data = [line(2, "a, 1, 2"), line(3, "b, 3, 4")];
        assert_eq!(detect_delimiter(Some(&header), &data), Delimiter::Comma);

        let header = line(1, "name\tra\tdec");
        let data = [line(2, "a b\t1\t2")];
        assert_eq!(detect_delimiter(Some(&header), &data), Delimiter::Tab);

        let header = line(1, "name   ra  dec");
        let data = [line(2, "a 1 2"), line(3, "b 3 4")];
        assert_eq!(detect_delimiter(Some(&header), &data), Delimiter::Whitespace);

        let header = line(1, "name");
        assert_eq!(detect_delimiter(Some(&header), &[]), Delimiter::Comma);
    }

    #[test]
    fn test_quoted_fields() {
        let lines = ["name,note", r#"BLG100,"bright, variable""#];
        let table = read_lines(&lines, &ReadOptions::default()).unwrap();
        assert_eq!(
            table.try_column("note").unwrap().get(0),
            Some(Value::String("bright, variable".into()))
        );
    }

    #[test]
    fn test_forced_column_type() {
        let mut options = ReadOptions::default();
        options.column_types.insert("id".into(), ColumnType::String);
        let table = read_lines(&["id,v", "007,1", "008,2"], &options).unwrap();
        assert_eq!(
            table.try_column("id").unwrap().get(0),
            Some(Value::String("007".into()))
        );

        let mut options = ReadOptions::default();
        options.column_types.insert("v".into(), ColumnType::Float);
        let err = read_lines(&["id,v", "a,1", "b,oops"], &options).unwrap_err();
        assert!(matches!(
            err,
            TableError::CellParse { line: 3, expected: ColumnType::Float, .. }
        ));
    }

    #[test]
    fn test_names_must_match_width_without_header() {
        for policy in [MalformedRowPolicy::Reject, MalformedRowPolicy::Skip] {
            let options = ReadOptions {
                has_header: false,
                names: Some(vec!["a".into()]),
                on_malformed_row: policy,
                ..Default::default()
            };
            let result = read_lines(&["1,2", "3,4"], &options);
            assert!(matches!(result, Err(TableError::Format(_))));
        }
    }

    #[test]
    fn test_unknown_forced_column_is_an_error() {
        let mut options = ReadOptions::default();
        options.column_types.insert("V".into(), ColumnType::Float);
        let err = read_lines(&["id,v", "a,1"], &options).unwrap_err();
        assert!(matches!(err, TableError::Format(msg) if msg.contains("'V'")));
    }
}
