// ── CSV export ──
//
// Exports ignore paging: every record matching the current search and
// filters is fetched, then written under a fixed column schema. The
// file is staged next to the destination and renamed into place, so
// a failed export never leaves a partial file behind.

use std::path::{Path, PathBuf};

use erpdesk_api::ListQuery;
use tempfile::NamedTempFile;
use tracing::info;

use crate::backend::Backend;
use crate::error::CoreError;
use crate::model::Record;
use crate::query::QueryState;
use crate::resource::{Column, Resource};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub path: PathBuf,
    pub rows: usize,
}

#[derive(Debug, Clone)]
pub struct ExportJob {
    resource: &'static Resource,
    query: ListQuery,
}

impl ExportJob {
    pub fn new(resource: &'static Resource, state: &QueryState) -> Self {
        Self {
            resource,
            query: resource.unpaginated_request(state),
        }
    }

    pub fn columns(&self) -> &'static [Column] {
        self.resource
            .export
            .map_or(self.resource.columns, |e| e.columns)
    }

    /// `<stem>.csv`, from the export schema or the resource title.
    pub fn default_file_name(&self) -> String {
        let stem = self
            .resource
            .export
            .map_or(self.resource.title, |e| e.file_stem);
        format!("{stem}.csv")
    }

    pub fn query(&self) -> &ListQuery {
        &self.query
    }

    pub async fn run<B: Backend>(&self, backend: &B, dest: &Path) -> Result<ExportSummary, CoreError> {
        let records = backend.list_all(self.resource.endpoint, &self.query).await?;
        let rows = write_csv(dest, self.columns(), &records)?;
        info!(resource = self.resource.key, rows, path = %dest.display(), "export written");
        Ok(ExportSummary {
            path: dest.to_path_buf(),
            rows,
        })
    }
}

/// Write `records` atomically to `dest`. Returns the number of data rows.
pub fn write_csv(dest: &Path, columns: &[Column], records: &[Record]) -> Result<usize, CoreError> {
    let dir = dest
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let staged = NamedTempFile::new_in(dir)?;

    let mut writer = csv::Writer::from_writer(staged);
    writer.write_record(columns.iter().map(|c| c.header))?;
    for record in records {
        writer.write_record(columns.iter().map(|c| record.text(c.key)))?;
    }
    let staged = writer.into_inner().map_err(|e| CoreError::Export {
        message: e.error().to_string(),
    })?;
    staged.persist(dest).map_err(|e| e.error)?;
    Ok(records.len())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::catalog::MRF_PRODUCTS;

    #[test]
    fn writes_fixed_columns_with_header() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("MRF Products.csv");
        let records = vec![
            Record::try_from(json!({
                "id": 1, "date": "2024-05-01", "product": "Tape 48mm",
                "unit": "ROLL", "quantity": 12, "branch": "Delhi", "extra": "ignored"
            }))
            .unwrap(),
            Record::try_from(json!({"id": 2, "product": "Glue, white"})).unwrap(),
        ];
        let job = ExportJob::new(&MRF_PRODUCTS, &MRF_PRODUCTS.initial_query());

        let rows = write_csv(&dest, job.columns(), &records).unwrap();
        assert_eq!(rows, 2);

        let text = std::fs::read_to_string(&dest).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "ID,DATE,PRODUCT,UNIT,QUANTITY,BRANCH");
        assert_eq!(lines[1], "1,2024-05-01,Tape 48mm,ROLL,12,Delhi");
        assert_eq!(lines[2], "2,,\"Glue, white\",,,");
    }

    #[test]
    fn default_file_name_uses_export_stem() {
        let job = ExportJob::new(&MRF_PRODUCTS, &MRF_PRODUCTS.initial_query());
        assert_eq!(job.default_file_name(), "MRF Products.csv");
        assert_eq!(job.query().page, None);
    }

    #[test]
    fn missing_directory_leaves_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("nope").join("out.csv");
        let err = write_csv(&dest, MRF_PRODUCTS.columns, &[]).unwrap_err();
        assert!(matches!(err, CoreError::Export { .. }));
        assert!(!dest.exists());
    }
}
