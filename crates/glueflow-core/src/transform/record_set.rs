//! In-memory table the transformation works on.

use crate::error::TransformError;
use crate::Result;
use arrow::array::{ArrayRef, BooleanArray, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use std::collections::HashMap;
use std::sync::Arc;

/// Rows of optional string cells under a header.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordSet {
    columns: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
}

impl RecordSet {
    /// Build a record set; every row must have one cell per column.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Option<String>>>) -> Result<Self> {
        if let Some((row, cells)) = rows
            .iter()
            .enumerate()
            .find(|(_, cells)| cells.len() != columns.len())
        {
            return Err(TransformError::RowWidth {
                row,
                expected: columns.len(),
                found: cells.len(),
            }
            .into());
        }
        Ok(Self { columns, rows })
    }

    /// Parse delimited text with a header row.
    ///
    /// Empty fields and fields missing from short rows are null; fields past
    /// the header width are dropped.
    pub fn from_csv(data: &[u8], delimiter: u8) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .flexible(true)
            .from_reader(data);

        let columns: Vec<String> = reader
            .headers()
            .map_err(TransformError::from)?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();
        if columns.is_empty() {
            return Err(TransformError::MissingHeader.into());
        }

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(TransformError::from)?;
            let row = (0..columns.len())
                .map(|i| {
                    record
                        .get(i)
                        .filter(|v| !v.is_empty())
                        .map(str::to_string)
                })
                .collect();
            rows.push(row);
        }

        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Option<String>>] {
        &self.rows
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Keep only rows with a value in every column.
    pub fn drop_nulls(mut self) -> Self {
        self.rows.retain(|row| row.iter().all(Option::is_some));
        self
    }

    /// Append the rows of `other`, which must have the same header.
    ///
    /// `source` names `other` in the error.
    pub fn append(&mut self, other: RecordSet, source: &str) -> Result<()> {
        if other.columns != self.columns {
            return Err(TransformError::HeaderMismatch {
                source_file: source.to_string(),
                expected: self.columns.clone(),
                found: other.columns,
            }
            .into());
        }
        self.rows.extend(other.rows);
        Ok(())
    }

    /// Lowercase every column name.
    ///
    /// Fails when two columns differ only by case.
    pub fn lowercase_columns(mut self) -> Result<Self> {
        let mut seen: HashMap<String, &str> = HashMap::with_capacity(self.columns.len());
        for column in &self.columns {
            let lowercase = column.to_lowercase();
            if let Some(first) = seen.get(&lowercase) {
                return Err(TransformError::DuplicateColumn {
                    first: first.to_string(),
                    second: column.clone(),
                    lowercase,
                }
                .into());
            }
            seen.insert(lowercase, column);
        }

        self.columns = self.columns.iter().map(|c| c.to_lowercase()).collect();
        Ok(self)
    }

    /// Convert to an Arrow batch, inferring one type per column.
    pub fn to_record_batch(&self) -> Result<RecordBatch> {
        let mut fields = Vec::with_capacity(self.columns.len());
        let mut arrays: Vec<ArrayRef> = Vec::with_capacity(self.columns.len());

        for (index, name) in self.columns.iter().enumerate() {
            let cells: Vec<Option<&str>> = self
                .rows
                .iter()
                .map(|row| row.get(index).and_then(Option::as_deref))
                .collect();
            let data_type = infer_type(&cells);

            let array: ArrayRef = match data_type {
                DataType::Int64 => Arc::new(Int64Array::from(
                    cells
                        .iter()
                        .map(|c| c.and_then(|v| v.trim().parse::<i64>().ok()))
                        .collect::<Vec<_>>(),
                )),
                DataType::Float64 => Arc::new(Float64Array::from(
                    cells
                        .iter()
                        .map(|c| c.and_then(|v| v.trim().parse::<f64>().ok()))
                        .collect::<Vec<_>>(),
                )),
                DataType::Boolean => Arc::new(BooleanArray::from(
                    cells
                        .iter()
                        .map(|c| c.and_then(parse_bool))
                        .collect::<Vec<_>>(),
                )),
                _ => Arc::new(StringArray::from(cells.clone())),
            };

            fields.push(Field::new(name, data_type, true));
            arrays.push(array);
        }

        let batch = RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)
            .map_err(TransformError::from)?;
        Ok(batch)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

/// Digits after a leading zero, as in zip codes or part numbers.
fn has_leading_zero(value: &str) -> bool {
    let value = value.trim();
    let digits = value.strip_prefix(['-', '+']).unwrap_or(value);
    digits.len() > 1 && digits.starts_with('0') && digits.as_bytes()[1].is_ascii_digit()
}

/// Narrowest of Int64, Float64, Boolean that holds every non-null cell,
/// otherwise Utf8. A column with no values, or with a zero-padded number, is
/// Utf8.
fn infer_type(cells: &[Option<&str>]) -> DataType {
    let values: Vec<&str> = cells.iter().flatten().copied().collect();
    if values.is_empty() || values.iter().any(|v| has_leading_zero(v)) {
        return DataType::Utf8;
    }

    if values.iter().all(|v| v.trim().parse::<i64>().is_ok()) {
        DataType::Int64
    } else if values.iter().all(|v| v.trim().parse::<f64>().is_ok()) {
        DataType::Float64
    } else if values.iter().all(|v| parse_bool(v).is_some()) {
        DataType::Boolean
    } else {
        DataType::Utf8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use arrow::array::Array;

    const SAMPLE: &str = "Name,Value\nwidget,3\ngadget,\nsprocket,7\ngizmo,1\ndoohickey,4\n";

    #[test]
    fn test_from_csv_empty_field_is_null() {
        let set = RecordSet::from_csv(SAMPLE.as_bytes(), b',').unwrap();
        assert_eq!(set.columns(), &["Name".to_string(), "Value".to_string()]);
        assert_eq!(set.num_rows(), 5);
        assert_eq!(set.rows()[1], vec![Some("gadget".to_string()), None]);
    }

    #[test]
    fn test_drop_nulls_then_lowercase() {
        let set = RecordSet::from_csv(SAMPLE.as_bytes(), b',')
            .unwrap()
            .drop_nulls()
            .lowercase_columns()
            .unwrap();

        assert_eq!(set.num_rows(), 4);
        assert_eq!(set.columns(), &["name".to_string(), "value".to_string()]);
        assert!(set.rows().iter().all(|r| r.iter().all(Option::is_some)));
    }

    #[test]
    fn test_short_row_is_null_padded() {
        let set = RecordSet::from_csv(b"a,b,c\n1,2\n", b',').unwrap();
        assert_eq!(
            set.rows()[0],
            vec![Some("1".to_string()), Some("2".to_string()), None]
        );
        assert_eq!(set.drop_nulls().num_rows(), 0);
    }

    #[test]
    fn test_custom_delimiter() {
        let set = RecordSet::from_csv(b"id;label\n1;one\n", b';').unwrap();
        assert_eq!(set.columns(), &["id".to_string(), "label".to_string()]);
        assert_eq!(set.rows()[0][1].as_deref(), Some("one"));
    }

    #[test]
    fn test_missing_header() {
        let err = RecordSet::from_csv(b"", b',').unwrap_err();
        assert!(matches!(err, Error::Transform(TransformError::MissingHeader)));
    }

    #[test]
    fn test_to_record_batch_infers_types() {
        let data = "id,price,active,label\n1,2.5,true,a\n2,3,FALSE,b\n";
        let batch = RecordSet::from_csv(data.as_bytes(), b',')
            .unwrap()
            .to_record_batch()
            .unwrap();

        let schema = batch.schema();
        assert_eq!(schema.field(0).data_type(), &DataType::Int64);
        assert_eq!(schema.field(1).data_type(), &DataType::Float64);
        assert_eq!(schema.field(2).data_type(), &DataType::Boolean);
        assert_eq!(schema.field(3).data_type(), &DataType::Utf8);
        assert_eq!(batch.num_rows(), 2);

        let ids = batch
            .column(0)
            .as_any()
            .downcast_ref::<Int64Array>()
            .unwrap();
        assert_eq!(ids.value(1), 2);
        let active = batch
            .column(2)
            .as_any()
            .downcast_ref::<BooleanArray>()
            .unwrap();
        assert!(!active.value(1));
    }

    #[test]
    fn test_to_record_batch_keeps_nulls() {
        let batch = RecordSet::from_csv(SAMPLE.as_bytes(), b',')
            .unwrap()
            .to_record_batch()
            .unwrap();
        assert_eq!(batch.num_rows(), 5);
        assert_eq!(batch.column(1).null_count(), 1);
    }

    #[test]
    fn test_new_rejects_ragged_rows() {
        let err = RecordSet::new(
            vec!["a".into(), "b".into()],
            vec![vec![Some("1".into()), Some("2".into())], vec![Some("1".into())]],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            Error::Transform(TransformError::RowWidth {
                row: 1,
                expected: 2,
                found: 1
            })
        ));

        let set = RecordSet::new(vec!["a".into()], vec![vec![None]]).unwrap();
        assert_eq!(set.to_record_batch().unwrap().column(0).null_count(), 1);
    }

    #[test]
    fn test_lowercase_column_collision() {
        let err = RecordSet::from_csv(b"Name,name
x,y
", b',')
            .unwrap()
            .lowercase_columns()
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Transform(TransformError::DuplicateColumn { ref lowercase, .. }) if lowercase == "name"
        ));
    }

    #[test]
    fn test_leading_zeros_stay_text() {
        let data = "zip,qty,delta
02134,0,-7
00501,10,0.5
";
        let batch = RecordSet::from_csv(data.as_bytes(), b',')
            .unwrap()
            .to_record_batch()
            .unwrap();

        let schema = batch.schema();
        assert_eq!(schema.field(0).data_type(), &DataType::Utf8);
        assert_eq!(schema.field(1).data_type(), &DataType::Int64);
        assert_eq!(schema.field(2).data_type(), &DataType::Float64);
        let zips = batch
            .column(0)
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap();
        assert_eq!(zips.value(0), "02134");
    }

    #[test]
    fn test_append_requires_same_header() {
        let mut set = RecordSet::from_csv(b"a,b
1,2
", b',').unwrap();
        set.append(RecordSet::from_csv(b"a,b
3,4
", b',').unwrap(), "part-2.csv")
            .unwrap();
        assert_eq!(set.num_rows(), 2);

        let err = set
            .append(RecordSet::from_csv(b"a,c
5,6
", b',').unwrap(), "part-3.csv")
            .unwrap_err();
        assert!(err.to_string().contains("part-3.csv"));
        assert_eq!(set.num_rows(), 2);
    }

    #[test]
    fn test_empty_record_set_batch() {
        let set = RecordSet::from_csv(b"Name,Value\n", b',').unwrap();
        let batch = set.to_record_batch().unwrap();
        assert_eq!(batch.num_rows(), 0);
        assert_eq!(batch.num_columns(), 2);
        assert_eq!(batch.schema().field(0).data_type(), &DataType::Utf8);
    }
}
