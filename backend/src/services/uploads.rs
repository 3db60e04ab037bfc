//! Storage of uploaded climate and dengue case CSV files

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::Serialize;
use shared::missing_columns;

use crate::error::{AppError, AppResult};
use crate::services::training::{CASE_COLUMNS, CLIMATE_COLUMNS};

/// Kind of data file accepted by the upload endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Climate,
    Dengue,
}

impl UploadKind {
    pub fn prefix(self) -> &'static str {
        match self {
            UploadKind::Climate => "climate",
            UploadKind::Dengue => "dengue",
        }
    }

    pub fn required_columns(self) -> &'static [&'static str] {
        match self {
            UploadKind::Climate => CLIMATE_COLUMNS,
            UploadKind::Dengue => CASE_COLUMNS,
        }
    }

    fn success_message(self) -> &'static str {
        match self {
            UploadKind::Climate => "Climate data uploaded successfully",
            UploadKind::Dengue => "Dengue cases data uploaded successfully",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UploadReceipt {
    pub message: String,
    pub filename: Option<String>,
    pub saved_as: String,
    pub rows: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct UploadedFile {
    pub filename: String,
    pub size: u64,
    pub modified: String,
}

/// Upload service
#[derive(Clone)]
pub struct UploadService {
    data_dir: PathBuf,
}

impl UploadService {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Validate the header row, count the records and store the file as
    /// `{kind}_{YYYYmmdd_HHMMSS}.csv`
    pub fn store_csv(
        &self,
        kind: UploadKind,
        original_filename: Option<String>,
        contents: &[u8],
    ) -> AppResult<UploadReceipt> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(contents);

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| AppError::ValidationError(format!("Could not read CSV: {}", e)))?
            .iter()
            .map(str::to_string)
            .collect();

        let required = kind.required_columns();
        if !missing_columns(&headers, required).is_empty() {
            return Err(AppError::Validation {
                field: "file".to_string(),
                message: format!("CSV must contain columns: {}", required.join(", ")),
            });
        }

        let mut rows = 0;
        for record in reader.records() {
            record.map_err(|e| AppError::ValidationError(format!("Could not read CSV: {}", e)))?;
            rows += 1;
        }

        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let path = self
            .data_dir
            .join(format!("{}_{}.csv", kind.prefix(), timestamp));
        std::fs::create_dir_all(&self.data_dir)
            .and_then(|_| std::fs::write(&path, contents))
            .map_err(|e| AppError::Storage(format!("could not save {}: {}", path.display(), e)))?;

        tracing::info!("Stored {} upload with {} rows at {}", kind.prefix(), rows, path.display());

        Ok(UploadReceipt {
            message: kind.success_message().to_string(),
            filename: original_filename,
            saved_as: path.display().to_string(),
            rows,
        })
    }

    /// CSV files in the data directory, sorted by name
    pub fn list_uploads(&self) -> AppResult<Vec<UploadedFile>> {
        if !self.data_dir.exists() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry in std::fs::read_dir(&self.data_dir)? {
            let entry = entry?;
            let path = entry.path();
            if !is_csv(&path) {
                continue;
            }
            let metadata = entry.metadata()?;
            let modified = metadata
                .modified()
                .map(|t| DateTime::<Local>::from(t).to_rfc3339())
                .unwrap_or_default();
            files.push(UploadedFile {
                filename: entry.file_name().to_string_lossy().into_owned(),
                size: metadata.len(),
                modified,
            });
        }
        files.sort_by(|a, b| a.filename.cmp(&b.filename));
        Ok(files)
    }
}

fn is_csv(path: &Path) -> bool {
    path.is_file() && path.extension().is_some_and(|ext| ext == "csv")
}
