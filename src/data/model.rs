use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use super::angle::{self, AngleUnit};
use super::error::TableError;

// ---------------------------------------------------------------------------
// ColumnType – the type fixed for a column at ingestion
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ColumnType {
    Integer,
    Float,
    String,
}

// ---------------------------------------------------------------------------
// Value – a single cell
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value. `Missing` is the explicit missing-value
/// marker; it never stands for any particular text in the source file.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(i64),
    Float(f64),
    String(String),
    Missing,
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::String(s) => write!(f, "{s}"),
            Value::Missing => write!(f, "--"),
        }
    }
}

impl Value {
    /// Try to interpret the value as an `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Missing => "missing",
        }
    }
}

// ---------------------------------------------------------------------------
// Column – one named, typed sequence of cells
// ---------------------------------------------------------------------------

/// Per-row storage. `None` marks a missing cell.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Integer(Vec<Option<i64>>),
    Float(Vec<Option<f64>>),
    String(Vec<Option<String>>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Integer(v) => v.len(),
            ColumnData::Float(v) => v.len(),
            ColumnData::String(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn column_type(&self) -> ColumnType {
        match self {
            ColumnData::Integer(_) => ColumnType::Integer,
            ColumnData::Float(_) => ColumnType::Float,
            ColumnData::String(_) => ColumnType::String,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    data: ColumnData,
}

impl Column {
    pub fn new(name: impl Into<String>, data: ColumnData) -> Self {
        Column {
            name: name.into(),
            data,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> &ColumnData {
        &self.data
    }

    pub fn column_type(&self) -> ColumnType {
        self.data.column_type()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Cell at `row`, or `None` if `row` is out of bounds.
    pub fn get(&self, row: usize) -> Option<Value> {
        let value = match &self.data {
            ColumnData::Integer(v) => v.get(row)?.map_or(Value::Missing, Value::Integer),
            ColumnData::Float(v) => v.get(row)?.map_or(Value::Missing, Value::Float),
            ColumnData::String(v) => v
                .get(row)?
                .as_ref()
                .map_or(Value::Missing, |s| Value::String(s.clone())),
        };
        Some(value)
    }

    pub fn is_missing(&self, row: usize) -> bool {
        match &self.data {
            ColumnData::Integer(v) => matches!(v.get(row), Some(None)),
            ColumnData::Float(v) => matches!(v.get(row), Some(None)),
            ColumnData::String(v) => matches!(v.get(row), Some(None)),
        }
    }

    pub fn missing_count(&self) -> usize {
        match &self.data {
            ColumnData::Integer(v) => v.iter().filter(|c| c.is_none()).count(),
            ColumnData::Float(v) => v.iter().filter(|c| c.is_none()).count(),
            ColumnData::String(v) => v.iter().filter(|c| c.is_none()).count(),
        }
    }

    /// Return a copy of this column in which every missing cell holds
    /// `fill`. Non-missing cells are unchanged.
    ///
    /// * Float columns accept a float (NaN included) or an integer fill.
    /// * Integer columns accept an integer fill.
    /// * String columns accept a string fill.
    pub fn filled(&self, fill: &Value) -> Result<Column, TableError> {
        let data = match (&self.data, fill) {
            (ColumnData::Float(v), Value::Float(_) | Value::Integer(_)) => {
                let f = fill.as_f64().unwrap_or(f64::NAN);
                ColumnData::Float(v.iter().map(|c| Some(c.unwrap_or(f))).collect())
            }
            (ColumnData::Integer(v), Value::Integer(i)) => {
                ColumnData::Integer(v.iter().map(|c| Some(c.unwrap_or(*i))).collect())
            }
            (ColumnData::String(v), Value::String(s)) => ColumnData::String(
                v.iter()
                    .map(|c| Some(c.clone().unwrap_or_else(|| s.clone())))
                    .collect(),
            ),
            _ => return Err(self.type_error(fill.kind())),
        };
        Ok(Column::new(self.name.clone(), data))
    }

    /// Dense `f64` view of a numeric column, with `fill` standing in for
    /// missing cells. This is what plotting code wants.
    pub fn to_f64_vec(&self, fill: f64) -> Result<Vec<f64>, TableError> {
        match &self.data {
            ColumnData::Float(v) => Ok(v.iter().map(|c| c.unwrap_or(fill)).collect()),
            ColumnData::Integer(v) => Ok(v.iter().map(|c| c.map_or(fill, |i| i as f64)).collect()),
            ColumnData::String(_) => Err(TableError::Type {
                column: self.name.clone(),
                expected: ColumnType::String,
                got: "float",
            }),
        }
    }

    /// Convert a column of sexagesimal text into a float column of decimal
    /// degrees. Numeric columns are taken as decimal values in `unit`.
    /// Missing cells stay missing.
    pub fn sexagesimal_to_degrees(&self, unit: AngleUnit) -> Result<Column, TableError> {
        let degrees: Vec<Option<f64>> = match &self.data {
            ColumnData::String(v) => v
                .iter()
                .map(|c| {
                    c.as_deref()
                        .map(|s| angle::parse_sexagesimal(s, unit))
                        .transpose()
                })
                .collect::<Result<Vec<_>, _>>()?,
            ColumnData::Float(v) => v.iter().map(|c| c.map(|x| unit.to_degrees(x))).collect(),
            ColumnData::Integer(v) => v
                .iter()
                .map(|c| c.map(|i| unit.to_degrees(i as f64)))
                .collect(),
        };
        Ok(Column::new(self.name.clone(), ColumnData::Float(degrees)))
    }

    /// Wrap every angle (degrees) of a numeric column into
    /// `[wrap_at - 360, wrap_at)`.
    pub fn wrapped(&self, wrap_at: f64) -> Result<Column, TableError> {
        let wrapped: Vec<Option<f64>> = match &self.data {
            ColumnData::Float(v) => v
                .iter()
                .map(|c| c.map(|x| angle::wrap_angle(x, wrap_at)))
                .collect(),
            ColumnData::Integer(v) => v
                .iter()
                .map(|c| c.map(|i| angle::wrap_angle(i as f64, wrap_at)))
                .collect(),
            ColumnData::String(_) => return Err(self.type_error("float")),
        };
        Ok(Column::new(self.name.clone(), ColumnData::Float(wrapped)))
    }

    /// Same data under another name.
    pub fn renamed(&self, name: impl Into<String>) -> Column {
        Column::new(name, self.data.clone())
    }

    fn type_error(&self, got: &'static str) -> TableError {
        TableError::Type {
            column: self.name.clone(),
            expected: self.column_type(),
            got,
        }
    }
}

// ---------------------------------------------------------------------------
// SkippedRow – a malformed data line dropped under the skip policy
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRow {
    /// 1-based physical line number in the source text.
    pub line: usize,
    pub expected: usize,
    pub found: usize,
}

// ---------------------------------------------------------------------------
// Table – the complete ingested catalog
// ---------------------------------------------------------------------------

/// An ordered collection of equal-length, uniquely named columns.
///
/// Tables are never mutated after construction; methods that derive new data
/// return new values.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
    num_rows: usize,
    skipped_rows: Vec<SkippedRow>,
}

impl Table {
    /// Build a table, checking that column lengths agree and names are
    /// unique.
    pub fn new(columns: Vec<Column>) -> Result<Self, TableError> {
        let num_rows = columns.first().map_or(0, Column::len);
        let mut seen = BTreeSet::new();
        for col in &columns {
            if col.len() != num_rows {
                return Err(TableError::Format(format!(
                    "column '{}' has {} rows but '{}' has {num_rows}",
                    col.name(),
                    col.len(),
                    columns[0].name(),
                )));
            }
            if !seen.insert(col.name()) {
                return Err(TableError::Format(format!(
                    "duplicate column name '{}'",
                    col.name()
                )));
            }
        }
        Ok(Table {
            columns,
            num_rows,
            skipped_rows: Vec::new(),
        })
    }

    pub(crate) fn with_skipped_rows(mut self, skipped_rows: Vec<SkippedRow>) -> Self {
        self.skipped_rows = skipped_rows;
        self
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.num_rows == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(Column::name).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name() == name)
    }

    /// Like [`Table::column`], but an absent column is an error.
    pub fn try_column(&self, name: &str) -> Result<&Column, TableError> {
        self.column(name)
            .ok_or_else(|| TableError::NoSuchColumn(name.to_string()))
    }

    /// All cells of one row, in column order.
    pub fn row(&self, row: usize) -> Option<Vec<Value>> {
        self.columns.iter().map(|c| c.get(row)).collect()
    }

    /// Data lines dropped because their field count didn't match the header.
    pub fn skipped_rows(&self) -> &[SkippedRow] {
        &self.skipped_rows
    }

    /// A new table with `column` appended, or replacing the column of the
    /// same name in place.
    pub fn with_column(&self, column: Column) -> Result<Table, TableError> {
        let mut columns = self.columns.clone();
        match columns.iter_mut().find(|c| c.name() == column.name()) {
            Some(existing) => *existing = column,
            None => columns.push(column),
        }
        Ok(Table::new(columns)?.with_skipped_rows(self.skipped_rows.clone()))
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    fn float_col(values: &[Option<f64>]) -> Column {
        Column::new("mag", ColumnData::Float(values.to_vec()))
    }

    #[test]
    fn test_filled_float_with_nan() {
        let col = float_col(&[Some(1.0), None, Some(3.0)]);
        let filled = col.filled(&Value::Float(f64::NAN)).unwrap();
        let ColumnData::Float(v) = filled.data() else {
            panic!("expected float column");
        };
        assert_eq!(v[0], Some(1.0));
        assert!(v[1].unwrap().is_nan());
        assert_eq!(v[2], Some(3.0));
        assert_eq!(filled.missing_count(), 0);

        // The source is untouched.
        assert!(col.is_missing(1));
        assert_eq!(col.missing_count(), 1);
    }

    #[test]
    fn test_filled_keeps_present_values_for_every_numeric_type() {
        let mask = [false, true, true, false, true];
        for fill in [-99_i64, 0, 7] {
            let data: Vec<Option<i64>> = mask
                .iter()
                .enumerate()
                .map(|(i, &m)| if m { None } else { Some(i as i64 * 10) })
                .collect();
            let col = Column::new("n", ColumnData::Integer(data));
            let filled = col.filled(&Value::Integer(fill)).unwrap();
            for (i, &m) in mask.iter().enumerate() {
                let expected = if m { fill } else { i as i64 * 10 };
                assert_eq!(filled.get(i), Some(Value::Integer(expected)));
            }

            let col = Column::new(
                "x",
                ColumnData::Float(
                    mask.iter()
                        .enumerate()
                        .map(|(i, &m)| if m { None } else { Some(i as f64 + 0.5) })
                        .collect(),
                ),
            );
            let filled = col.filled(&Value::Integer(fill)).unwrap();
            for (i, &m) in mask.iter().enumerate() {
                let expected = if m { fill as f64 } else { i as f64 + 0.5 };
                assert_eq!(filled.get(i), Some(Value::Float(expected)));
            }
        }
    }

    #[test]
    fn test_filled_rejects_incompatible_values() {
        let ints = Column::new("n", ColumnData::Integer(vec![Some(1), None]));
        assert!(matches!(
            ints.filled(&Value::Float(f64::NAN)),
            Err(TableError::Type { expected: ColumnType::Integer, got: "float", .. })
        ));

        let strings = Column::new("s", ColumnData::String(vec![None]));
        assert!(matches!(
            strings.filled(&Value::Integer(0)),
            Err(TableError::Type { .. })
        ));
        assert_eq!(
            strings.filled(&Value::String("--".into())).unwrap().get(0),
            Some(Value::String("--".into()))
        );

        assert!(float_col(&[None]).filled(&Value::Missing).is_err());
    }

    #[test]
    fn test_to_f64_vec() {
        let col = Column::new("n", ColumnData::Integer(vec![Some(2), None]));
        let v = col.to_f64_vec(-1.0).unwrap();
        assert_abs_diff_eq!(v[0], 2.0);
        assert_abs_diff_eq!(v[1], -1.0);

        let col = Column::new("s", ColumnData::String(vec![Some("a".into())]));
        assert!(col.to_f64_vec(0.0).is_err());
    }

    #[test]
    fn test_sexagesimal_column_to_degrees() {
        let col = Column::new(
            "ra",
            ColumnData::String(vec![Some("17:51:00.0".into()), None]),
        );
        let deg = col.sexagesimal_to_degrees(AngleUnit::Hours).unwrap();
        assert_eq!(deg.column_type(), ColumnType::Float);
        assert_abs_diff_eq!(deg.get(0).unwrap().as_f64().unwrap(), 267.75, epsilon = 1e-9);
        assert!(deg.is_missing(1));

        let bad = Column::new("ra", ColumnData::String(vec![Some("17:51".into())]));
        assert!(matches!(
            bad.sexagesimal_to_degrees(AngleUnit::Hours),
            Err(TableError::Angle(_))
        ));
    }

    #[test]
    fn test_wrapped_column() {
        let col = float_col(&[Some(267.75), Some(-190.0), None]);
        let w = col.wrapped(180.0).unwrap();
        assert_abs_diff_eq!(w.get(0).unwrap().as_f64().unwrap(), -92.25, epsilon = 1e-9);
        assert_abs_diff_eq!(w.get(1).unwrap().as_f64().unwrap(), 170.0, epsilon = 1e-9);
        assert!(w.is_missing(2));
    }

    #[test]
    fn test_table_rejects_ragged_and_duplicate_columns() {
        let a = Column::new("a", ColumnData::Integer(vec![Some(1), Some(2)]));
        let b = Column::new("b", ColumnData::Integer(vec![Some(1)]));
        assert!(matches!(
            Table::new(vec![a.clone(), b]),
            Err(TableError::Format(_))
        ));
        assert!(matches!(
            Table::new(vec![a.clone(), a.clone()]),
            Err(TableError::Format(_))
        ));

        let table = Table::new(vec![a]).unwrap();
        assert_eq!(table.num_rows(), 2);
        assert!(table.try_column("nope").is_err());
    }

    #[test]
    fn test_with_column_does_not_touch_original() {
        let a = Column::new("a", ColumnData::Float(vec![Some(1.0), None]));
        let table = Table::new(vec![a.clone()]).unwrap();
        let derived = table
            .with_column(a.filled(&Value::Float(0.0)).unwrap())
            .unwrap();
        assert!(table.try_column("a").unwrap().is_missing(1));
        assert!(!derived.try_column("a").unwrap().is_missing(1));

        let extended = table.with_column(a.renamed("b")).unwrap();
        assert_eq!(extended.column_names(), vec!["a", "b"]);
        assert_eq!(table.num_columns(), 1);
    }
}
