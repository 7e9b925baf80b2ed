//! Shard file container.
//!
//! A shard file is a parquet file where every section is a top-level struct
//! column named after the section. The struct has a single `Float64` child
//! labeled by the shard id, so a section reads back as a labeled column.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow_array::{Array, ArrayRef, Float64Array, RecordBatch, StructArray};
use arrow_schema::{DataType, Field, Fields, Schema};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::{ArrowWriter, ProjectionMask};
use parquet::file::properties::WriterProperties;
use tempfile::NamedTempFile;

use crate::errors::{Error, Result};

/// Section holding the generated parameters.
pub const PARAMETERS: &str = "parameters";
/// Section holding the generated responses.
pub const RESPONSES: &str = "responses";

const READ_BATCH_SIZE: usize = 8192;

/// A single labeled column of values.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    label: String,
    values: Float64Array,
}

impl Section {
    pub fn new(label: impl Into<String>, values: Vec<f64>) -> Section {
        Section::from_array(label, Float64Array::from(values))
    }

    pub fn from_array(label: impl Into<String>, values: Float64Array) -> Section {
        Section {
            label: label.into(),
            values,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn values(&self) -> &Float64Array {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn into_parts(self) -> (String, Float64Array) {
        (self.label, self.values)
    }

    fn to_struct(&self) -> Result<StructArray> {
        let fields = Fields::from(vec![Field::new(&self.label, DataType::Float64, true)]);
        let values: ArrayRef = Arc::new(self.values.clone());
        let array = StructArray::try_new(fields, vec![values], None)?;
        Ok(array)
    }
}

/// File holding named sections of one shard.
pub struct ShardFile {
    path: PathBuf,
    properties: WriterProperties,
}

impl ShardFile {
    pub fn new(path: PathBuf) -> ShardFile {
        ShardFile {
            path,
            properties: WriterProperties::builder().build(),
        }
    }

    /// Sets properties to write the file.
    pub fn with_properties(mut self, properties: WriterProperties) -> Self {
        self.properties = properties;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the section to the file.
    ///
    /// Other sections already in the file are kept, a section with the same
    /// name is replaced. Creates the file if it doesn't exist.
    pub fn write_section(&self, name: &str, section: &Section) -> Result<()> {
        self.write_sections(&[(name, section)])
    }

    /// Writes multiple sections to the file with a single rewrite.
    ///
    /// Same as calling [ShardFile::write_section] for each section in order.
    pub fn write_sections(&self, new_sections: &[(&str, &Section)]) -> Result<()> {
        let mut sections = match self.load_sections(None) {
            Ok(sections) => sections,
            Err(e) if e.is_not_found() => Vec::new(),
            Err(e) => return Err(e),
        };

        for (name, section) in new_sections {
            match sections.iter_mut().find(|(n, _)| n == name) {
                Some((_, old)) => *old = (*section).clone(),
                None => sections.push((name.to_string(), (*section).clone())),
            }
        }

        self.write_all(&sections)
    }

    /// Reads only the section with given name.
    pub fn read_section(&self, name: &str) -> Result<Section> {
        let mut sections = self.load_sections(Some(name))?;
        match sections.pop() {
            Some((_, section)) => Ok(section),
            None => Err(Error::SectionNotFound {
                path: self.path.clone(),
                section: name.to_string(),
            }),
        }
    }

    /// Returns names of all sections in the file.
    pub fn section_names(&self) -> Result<Vec<String>> {
        let builder = self.reader_builder()?;
        Ok(builder
            .schema()
            .fields()
            .iter()
            .map(|field| field.name().clone())
            .collect())
    }

    fn reader_builder(&self) -> Result<ParquetRecordBatchReaderBuilder<File>> {
        let file = File::open(&self.path).map_err(|e| Error::io(&self.path, e))?;
        let builder =
            ParquetRecordBatchReaderBuilder::try_new(file)?.with_batch_size(READ_BATCH_SIZE);
        Ok(builder)
    }

    /// Loads sections in the file, only loads the section named `only` if it is set.
    fn load_sections(&self, only: Option<&str>) -> Result<Vec<(String, Section)>> {
        let mut builder = self.reader_builder()?;
        if let Some(name) = only {
            let Some((index, _)) = builder.schema().column_with_name(name) else {
                return Err(Error::SectionNotFound {
                    path: self.path.clone(),
                    section: name.to_string(),
                });
            };
            let mask = ProjectionMask::roots(builder.parquet_schema(), [index]);
            builder = builder.with_projection(mask);
        }

        let schema = builder.schema().clone();
        let reader = builder.build()?;

        // (section name, label, values) of projected sections.
        let mut buffers: Vec<(String, Option<String>, Vec<Option<f64>>)> = schema
            .fields()
            .iter()
            // The builder's schema is the file schema, not the projected one.
            .filter(|field| only.map_or(true, |name| field.name() == name))
            .map(|field| (field.name().clone(), None, Vec::new()))
            .collect();

        for batch in reader {
            let batch = batch?;
            for (name, label, values) in &mut buffers {
                let Some(column) = batch.column_by_name(name) else {
                    return Err(self.malformed(name, "column missing in batch"));
                };
                let (column_label, column_values) = self.decode_section(name, column)?;
                let label = label.get_or_insert_with(|| column_label.to_string());
                if label.as_str() != column_label {
                    return Err(self.malformed(name, "label changes between batches"));
                }
                values.extend(column_values.iter());
            }
        }

        buffers
            .into_iter()
            .map(|(name, label, values)| match label {
                Some(label) => {
                    let section = Section::from_array(label, Float64Array::from(values));
                    Ok((name, section))
                }
                // A file without rows still keeps the label in the schema.
                None => {
                    let label = self.label_from_schema(&schema, &name)?;
                    Ok((name, Section::new(label, Vec::new())))
                }
            })
            .collect()
    }

    fn decode_section<'a>(
        &self,
        name: &str,
        column: &'a ArrayRef,
    ) -> Result<(&'a str, &'a Float64Array)> {
        let Some(array) = column.as_any().downcast_ref::<StructArray>() else {
            return Err(self.malformed(name, "section is not a struct column"));
        };
        if array.num_columns() != 1 {
            return Err(self.malformed(
                name,
                &format!("expect 1 labeled column, found {}", array.num_columns()),
            ));
        }
        let Some(values) = array.column(0).as_any().downcast_ref::<Float64Array>() else {
            return Err(self.malformed(name, "values are not float64"));
        };
        let label = array.column_names()[0];

        Ok((label, values))
    }

    fn label_from_schema(&self, schema: &Schema, name: &str) -> Result<String> {
        let field = schema
            .field_with_name(name)
            .map_err(|_| self.malformed(name, "column missing in schema"))?;
        match field.data_type() {
            DataType::Struct(children) if children.len() == 1 => {
                Ok(children[0].name().clone())
            }
            _ => Err(self.malformed(name, "section is not a single column struct")),
        }
    }

    fn write_all(&self, sections: &[(String, Section)]) -> Result<()> {
        if let Some((first, rest)) = sections.split_first() {
            for (name, section) in rest {
                if section.len() != first.1.len() {
                    return Err(self.malformed(
                        name,
                        &format!(
                            "length {} doesn't match section {} with length {}",
                            section.len(),
                            first.0,
                            first.1.len()
                        ),
                    ));
                }
            }
        }

        let mut fields = Vec::with_capacity(sections.len());
        let mut columns = Vec::with_capacity(sections.len());
        for (name, section) in sections {
            let array = section.to_struct()?;
            fields.push(Field::new(name, array.data_type().clone(), false));
            columns.push(Arc::new(array) as ArrayRef);
        }
        let schema = Arc::new(Schema::new(fields));
        let batch = RecordBatch::try_new(schema.clone(), columns)?;

        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        let mut temp_file = NamedTempFile::new_in(dir).map_err(|e| Error::io(dir, e))?;
        {
            let mut writer = ArrowWriter::try_new(
                temp_file.as_file_mut(),
                schema,
                Some(self.properties.clone()),
            )?;
            writer.write(&batch)?;
            writer.close()?;
        }
        temp_file
            .persist(&self.path)
            .map_err(|e| Error::io(&self.path, e.error))?;

        Ok(())
    }

    fn malformed(&self, section: &str, reason: &str) -> Error {
        Error::MalformedSection {
            path: self.path.clone(),
            section: section.to_string(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use parquet::basic::Compression;
    use tempfile::TempDir;

    use super::*;
    use crate::config::ContainerConfig;

    fn new_shard_file(dir: &TempDir, name: &str) -> ShardFile {
        ShardFile::new(dir.path().join(name))
    }

    #[test]
    fn test_write_read_sections() {
        let dir = tempfile::tempdir().unwrap();
        let file = new_shard_file(&dir, "Ensemble_0.h5");

        let parameters = Section::new("0", vec![1.0, 2.0, 3.0]);
        let responses = Section::new("0", vec![-1.0, -2.0, -3.0]);
        file.write_section(PARAMETERS, &parameters).unwrap();
        file.write_section(RESPONSES, &responses).unwrap();

        assert_eq!(
            vec![PARAMETERS.to_string(), RESPONSES.to_string()],
            file.section_names().unwrap()
        );
        assert_eq!(parameters, file.read_section(PARAMETERS).unwrap());
        assert_eq!(responses, file.read_section(RESPONSES).unwrap());
    }

    #[test]
    fn test_replace_section_keeps_others() {
        let dir = tempfile::tempdir().unwrap();
        let file = new_shard_file(&dir, "Ensemble_1.h5");

        file.write_section(PARAMETERS, &Section::new("1", vec![1.0, 2.0]))
            .unwrap();
        file.write_section(RESPONSES, &Section::new("1", vec![3.0, 4.0]))
            .unwrap();
        let replaced = Section::new("1", vec![5.0, 6.0]);
        file.write_section(PARAMETERS, &replaced).unwrap();

        assert_eq!(2, file.section_names().unwrap().len());
        assert_eq!(replaced, file.read_section(PARAMETERS).unwrap());
        assert_eq!(
            Section::new("1", vec![3.0, 4.0]),
            file.read_section(RESPONSES).unwrap()
        );
    }

    #[test]
    fn test_write_sections_once() {
        let dir = tempfile::tempdir().unwrap();
        let file = new_shard_file(&dir, "Ensemble_8.h5");
        file.write_section(RESPONSES, &Section::new("8", vec![0.0, 0.0]))
            .unwrap();

        let parameters = Section::new("8", vec![1.0, 2.0]);
        let responses = Section::new("8", vec![3.0, 4.0]);
        file.write_sections(&[(PARAMETERS, &parameters), (RESPONSES, &responses)])
            .unwrap();

        // Existing sections keep their position, new ones are appended.
        assert_eq!(
            vec![RESPONSES.to_string(), PARAMETERS.to_string()],
            file.section_names().unwrap()
        );
        assert_eq!(parameters, file.read_section(PARAMETERS).unwrap());
        assert_eq!(responses, file.read_section(RESPONSES).unwrap());
    }

    #[test]
    fn test_write_with_properties() {
        let dir = tempfile::tempdir().unwrap();
        let properties = ContainerConfig {
            compression: Some(Compression::SNAPPY),
            max_row_group_size: 2,
        }
        .writer_properties();
        let file = new_shard_file(&dir, "Ensemble_9.h5").with_properties(properties);

        let parameters = Section::new("9", vec![1.0, 2.0, 3.0, 4.0, 5.0]);
        let responses = Section::new("9", vec![-1.0, -2.0, -3.0, -4.0, -5.0]);
        file.write_sections(&[(PARAMETERS, &parameters), (RESPONSES, &responses)])
            .unwrap();

        let metadata = ParquetRecordBatchReaderBuilder::try_new(File::open(file.path()).unwrap())
            .unwrap()
            .metadata()
            .clone();
        assert_eq!(3, metadata.num_row_groups());
        assert_eq!(
            Compression::SNAPPY,
            metadata.row_group(0).column(0).compression()
        );
        assert_eq!(parameters, file.read_section(PARAMETERS).unwrap());
        assert_eq!(responses, file.read_section(RESPONSES).unwrap());
    }

    #[test]
    fn test_read_large_section() {
        let dir = tempfile::tempdir().unwrap();
        let file = new_shard_file(&dir, "Ensemble_2.h5");
        let values: Vec<f64> = (0..READ_BATCH_SIZE * 3 + 7).map(|i| i as f64).collect();
        let section = Section::new("2", values);
        file.write_section(PARAMETERS, &section).unwrap();

        let read = file.read_section(PARAMETERS).unwrap();
        assert_eq!("2", read.label());
        assert_eq!(section, read);
    }

    #[test]
    fn test_read_missing_section() {
        let dir = tempfile::tempdir().unwrap();
        let file = new_shard_file(&dir, "Ensemble_3.h5");
        file.write_section(RESPONSES, &Section::new("3", vec![1.0]))
            .unwrap();

        let err = file.read_section(PARAMETERS).unwrap_err();
        assert!(matches!(err, Error::SectionNotFound { .. }), "{err}");
    }

    #[test]
    fn test_read_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = new_shard_file(&dir, "Ensemble_4.h5");

        let err = file.read_section(PARAMETERS).unwrap_err();
        assert!(err.is_not_found(), "{err}");
    }

    #[test]
    fn test_read_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = new_shard_file(&dir, "Ensemble_5.h5");
        std::fs::write(file.path(), b"not a container").unwrap();

        let err = file.read_section(PARAMETERS).unwrap_err();
        assert!(matches!(err, Error::Parquet(_)), "{err}");
    }

    #[test]
    fn test_section_length_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let file = new_shard_file(&dir, "Ensemble_6.h5");
        file.write_section(PARAMETERS, &Section::new("6", vec![1.0, 2.0]))
            .unwrap();

        let err = file
            .write_section(RESPONSES, &Section::new("6", vec![1.0]))
            .unwrap_err();
        assert!(matches!(err, Error::MalformedSection { .. }), "{err}");
        // The file is untouched.
        assert_eq!(vec![PARAMETERS.to_string()], file.section_names().unwrap());
    }

    #[test]
    fn test_empty_section() {
        let dir = tempfile::tempdir().unwrap();
        let file = new_shard_file(&dir, "Ensemble_7.h5");
        file.write_section(PARAMETERS, &Section::new("7", Vec::new()))
            .unwrap();

        let read = file.read_section(PARAMETERS).unwrap();
        assert_eq!("7", read.label());
        assert!(read.is_empty());
    }
}
