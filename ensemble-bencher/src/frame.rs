//! In-memory table combined from shard sections.

use std::sync::Arc;

use arrow_array::{Array, ArrayRef, Float64Array, RecordBatch, RecordBatchOptions};
use arrow_schema::{DataType, Field, Schema};

use crate::container::Section;
use crate::errors::{Error, Result};

/// A table indexed by row position, with one labeled `f64` column per joined section.
#[derive(Debug, Clone, Default)]
pub struct Frame {
    num_rows: usize,
    names: Vec<String>,
    columns: Vec<Float64Array>,
}

impl Frame {
    /// Returns a frame with `num_rows` rows and no columns.
    pub fn with_rows(num_rows: usize) -> Frame {
        Frame {
            num_rows,
            names: Vec::new(),
            columns: Vec::new(),
        }
    }

    /// Joins the section as a new column on row position.
    ///
    /// Rows beyond the frame are dropped and missing rows are null. Fails if
    /// the frame already has a column with the same label.
    pub fn join(&mut self, section: Section) -> Result<()> {
        if self.names.iter().any(|name| name == section.label()) {
            return Err(Error::DuplicateColumn(section.label().to_string()));
        }

        let (label, values) = section.into_parts();
        let values = match values.len() {
            len if len == self.num_rows => values,
            len if len > self.num_rows => values.slice(0, self.num_rows),
            len => values
                .iter()
                .chain(std::iter::repeat(None).take(self.num_rows - len))
                .collect(),
        };
        self.names.push(label);
        self.columns.push(values);

        Ok(())
    }

    /// Returns `(rows, columns)` of the frame.
    pub fn shape(&self) -> (usize, usize) {
        (self.num_rows, self.columns.len())
    }

    /// Fails if the shape of the frame isn't `expected`.
    pub fn check_shape(&self, expected: (usize, usize)) -> Result<()> {
        let actual = self.shape();
        if actual != expected {
            return Err(Error::ShapeMismatch { expected, actual });
        }
        Ok(())
    }

    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    pub fn column(&self, name: &str) -> Option<&Float64Array> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|index| &self.columns[index])
    }

    /// Converts the frame into a record batch.
    pub fn to_record_batch(&self) -> Result<RecordBatch> {
        let fields: Vec<_> = self
            .names
            .iter()
            .map(|name| Field::new(name, DataType::Float64, true))
            .collect();
        let columns: Vec<ArrayRef> = self
            .columns
            .iter()
            .map(|column| Arc::new(column.clone()) as ArrayRef)
            .collect();
        let options = RecordBatchOptions::new().with_row_count(Some(self.num_rows));
        let batch =
            RecordBatch::try_new_with_options(Arc::new(Schema::new(fields)), columns, &options)?;

        Ok(batch)
    }
}
