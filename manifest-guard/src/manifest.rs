//! The manifest: one tabular metadata submission.
//!
//! A manifest is a `RecordBatch` of nullable Utf8 columns: every cell is
//! `string | null`, matching what the file-parsing collaborator produces from
//! CSV/XLSX/JSON. Rule executors treat it as read-only; the one sanctioned
//! mutation is [`Manifest::backfill_entity_ids`], which rebuilds the
//! `entityId` column rather than patching values in place.

use crate::error::{GuardError, Result};
use arrow::array::{Array, ArrayRef, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use std::sync::Arc;
use tracing::{debug, instrument};

/// The column naming the component every manifest must declare.
pub const COMPONENT_COLUMN: &str = "Component";
/// The column holding file paths for file-based manifests.
pub const FILENAME_COLUMN: &str = "Filename";
/// The column holding asset-store entity identifiers.
pub const ENTITY_ID_COLUMN: &str = "entityId";

/// A tabular metadata submission mapped to one component.
#[derive(Debug, Clone)]
pub struct Manifest {
    batch: RecordBatch,
}

impl Manifest {
    /// Wraps a record batch, verifying every column is nullable Utf8.
    pub fn try_new(batch: RecordBatch) -> Result<Self> {
        for field in batch.schema().fields() {
            if field.data_type() != &DataType::Utf8 {
                return Err(GuardError::TypeMismatch {
                    column: field.name().clone(),
                    expected: "Utf8".to_string(),
                    found: format!("{:?}", field.data_type()),
                });
            }
        }
        Ok(Self { batch })
    }

    /// Builds a manifest from `(column name, cells)` pairs.
    ///
    /// All columns must have the same number of rows.
    pub fn from_columns<S: AsRef<str>>(columns: Vec<(S, Vec<Option<&str>>)>) -> Result<Self> {
        let mut fields = Vec::with_capacity(columns.len());
        let mut arrays: Vec<ArrayRef> = Vec::with_capacity(columns.len());
        for (name, cells) in &columns {
            fields.push(Field::new(name.as_ref(), DataType::Utf8, true));
            arrays.push(Arc::new(StringArray::from(cells.clone())));
        }
        let schema = Arc::new(Schema::new(fields));
        let batch = RecordBatch::try_new(schema, arrays)?;
        Self::try_new(batch)
    }

    /// The underlying record batch.
    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    /// Column names in manifest order.
    pub fn column_names(&self) -> Vec<&str> {
        self.batch
            .schema_ref()
            .fields()
            .iter()
            .map(|f| f.name().as_str())
            .collect()
    }

    /// True if the manifest has a column with the given name.
    pub fn has_column(&self, name: &str) -> bool {
        self.batch.schema_ref().index_of(name).is_ok()
    }

    /// Number of data rows.
    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    /// The string array backing one column.
    pub fn column(&self, name: &str) -> Result<&StringArray> {
        let index = self
            .batch
            .schema_ref()
            .index_of(name)
            .map_err(|_| GuardError::ColumnNotFound {
                column: name.to_string(),
            })?;
        self.batch
            .column(index)
            .as_any()
            .downcast_ref::<StringArray>()
            .ok_or_else(|| GuardError::TypeMismatch {
                column: name.to_string(),
                expected: "Utf8".to_string(),
                found: format!("{:?}", self.batch.column(index).data_type()),
            })
    }

    /// One cell; `None` for null or whitespace-empty values.
    pub fn cell(&self, name: &str, row: usize) -> Result<Option<&str>> {
        let array = self.column(name)?;
        if array.is_null(row) {
            return Ok(None);
        }
        let value = array.value(row);
        Ok((!value.trim().is_empty()).then_some(value))
    }

    /// Materializes one column as `(row index, value)` pairs for executors.
    ///
    /// Null and whitespace-empty cells yield `None`.
    pub fn column_values(&self, name: &str) -> Result<Vec<(usize, Option<String>)>> {
        let array = self.column(name)?;
        Ok(array
            .iter()
            .enumerate()
            .map(|(row, value)| {
                (
                    row,
                    value
                        .map(str::trim)
                        .filter(|v| !v.is_empty())
                        .map(String::from),
                )
            })
            .collect())
    }

    /// The component this manifest declares: the `Component` value of the
    /// first data row.
    ///
    /// The structural pass separately rejects rows with empty component
    /// values; this accessor only needs one.
    pub fn declared_component(&self) -> Result<String> {
        let array = self.column(COMPONENT_COLUMN)?;
        for row in 0..array.len() {
            if !array.is_null(row) && !array.value(row).trim().is_empty() {
                return Ok(array.value(row).trim().to_string());
            }
        }
        Err(GuardError::Internal(
            "manifest has no non-empty Component value".to_string(),
        ))
    }

    /// Fills missing `entityId` cells from a `(entity id, path)` file
    /// listing, matching on the `Filename` column.
    ///
    /// Explicitly a mutation visible to the caller, and idempotent: re-running
    /// with the same listing produces identical manifest content. Cells that
    /// already hold an entity id are left untouched. Returns the number of
    /// cells filled.
    #[instrument(skip(self, listing), fields(rows = self.num_rows(), listing = listing.len()))]
    pub fn backfill_entity_ids(&mut self, listing: &[(String, String)]) -> Result<usize> {
        let filenames = self.column_values(FILENAME_COLUMN)?;
        let existing: Vec<Option<String>> = if self.has_column(ENTITY_ID_COLUMN) {
            self.column_values(ENTITY_ID_COLUMN)?
                .into_iter()
                .map(|(_, v)| v)
                .collect()
        } else {
            vec![None; self.num_rows()]
        };

        let mut filled = 0usize;
        let rebuilt: Vec<Option<String>> = filenames
            .iter()
            .zip(existing.iter())
            .map(|((_, filename), current)| match current {
                Some(id) => Some(id.clone()),
                None => {
                    let found = filename.as_ref().and_then(|path| {
                        listing
                            .iter()
                            .find(|(_, listed)| listed == path)
                            .map(|(id, _)| id.clone())
                    });
                    if found.is_some() {
                        filled += 1;
                    }
                    found
                }
            })
            .collect();

        self.replace_column(ENTITY_ID_COLUMN, rebuilt)?;
        debug!(filled, "entity id backfill complete");
        Ok(filled)
    }

    /// Rebuilds the batch with one column replaced (or appended).
    fn replace_column(&mut self, name: &str, cells: Vec<Option<String>>) -> Result<()> {
        let schema = self.batch.schema();
        let mut fields: Vec<Field> = schema
            .fields()
            .iter()
            .map(|f| f.as_ref().clone())
            .collect();
        let mut arrays: Vec<ArrayRef> = self.batch.columns().to_vec();
        let replacement: ArrayRef = Arc::new(StringArray::from(cells));

        match schema.index_of(name) {
            Ok(index) => arrays[index] = replacement,
            Err(_) => {
                fields.push(Field::new(name, DataType::Utf8, true));
                arrays.push(replacement);
            }
        }

        self.batch = RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)?;
        Ok(())
    }
}
