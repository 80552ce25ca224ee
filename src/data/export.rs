use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;

use super::error::TableError;
use super::model::{Column, ColumnData, Table};

// ---------------------------------------------------------------------------
// Table → Arrow
// ---------------------------------------------------------------------------

/// Columnar hand-off for plotting code: one Arrow array per column, with
/// missing cells as Arrow nulls.
impl Table {
    pub fn to_record_batch(&self) -> Result<RecordBatch, TableError> {
        let fields: Vec<Field> = self.columns().iter().map(column_field).collect();
        let arrays: Vec<ArrayRef> = self.columns().iter().map(column_array).collect();
        let schema = Arc::new(Schema::new(fields));
        Ok(RecordBatch::try_new(schema, arrays)?)
    }
}

fn column_field(column: &Column) -> Field {
    let data_type = match column.data() {
        ColumnData::Integer(_) => DataType::Int64,
        ColumnData::Float(_) => DataType::Float64,
        ColumnData::String(_) => DataType::Utf8,
    };
    Field::new(column.name(), data_type, column.missing_count() > 0)
}

fn column_array(column: &Column) -> ArrayRef {
    match column.data() {
        ColumnData::Integer(v) => Arc::new(Int64Array::from(v.clone())),
        ColumnData::Float(v) => Arc::new(Float64Array::from(v.clone())),
        ColumnData::String(v) => Arc::new(StringArray::from(
            v.iter().map(|c| c.as_deref()).collect::<Vec<_>>(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use arrow::array::{Array, AsArray};
    use arrow::datatypes::{Float64Type, Int64Type};

    use super::*;
    use crate::data::options::ReadOptions;
    use crate::data::reader::read_lines;

    #[test]
    fn test_record_batch_keeps_names_types_and_nulls() {
        let lines = ["name,n,mag", "a,1,", "b,,2.5", ",3,3.5"];
        let table = read_lines(&lines, &ReadOptions::default()).unwrap();
        let batch = table.to_record_batch().unwrap();

        assert_eq!(batch.num_rows(), 3);
        let schema = batch.schema();
        let names: Vec<&str> = schema.fields().iter().map(|f| f.name().as_str()).collect();
        assert_eq!(names, vec!["name", "n", "mag"]);

        let name = batch.column(0).as_string::<i32>();
        assert_eq!(name.value(0), "a");
        assert!(name.is_null(2));

        let n = batch.column(1).as_primitive::<Int64Type>();
        assert_eq!(n.value(2), 3);
        assert!(n.is_null(1));

        let mag = batch.column(2).as_primitive::<Float64Type>();
        assert!(mag.is_null(0));
        assert_eq!(mag.value(1), 2.5);
        assert_eq!(mag.null_count(), 1);
    }

    #[test]
    fn test_dense_column_is_not_nullable() {
        let table = read_lines(&["x", "1", "2"], &ReadOptions::default()).unwrap();
        let batch = table.to_record_batch().unwrap();
        assert!(!batch.schema().field(0).is_nullable());
    }
}
