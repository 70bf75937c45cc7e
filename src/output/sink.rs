use super::{SinkError, SinkResult};
use crate::record::{CsvRecord, ListingRecord};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// Turns a query or title into a safe file stem
///
/// Path separators are replaced so a destination can never leave the output
/// directory; everything else is kept as-is.
pub fn destination_stem(name: &str) -> String {
    let stem: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => '-',
            c => c,
        })
        .collect();

    match stem.as_str() {
        "" | "." | ".." => "_".to_string(),
        _ => stem,
    }
}

/// Appends records to `<directory>/<destination>.csv`
///
/// The header row is written only when the destination does not exist yet
/// (or is empty); later appends, in this run or a later one, add rows only.
/// Appends are serialized through a single writer lock, and every append is
/// flushed before it returns.
pub struct CsvSink {
    directory: PathBuf,
    lock: Mutex<()>,
}

impl CsvSink {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            lock: Mutex::new(()),
        }
    }

    /// Path of the file backing `destination`
    pub fn path_for(&self, destination: &str) -> PathBuf {
        self.directory
            .join(format!("{}.csv", destination_stem(destination)))
    }

    /// Appends `records` to `destination`, returning the number of rows written
    ///
    /// # Errors
    ///
    /// `SinkError::EmptyInput` when `records` is empty; no file is created or
    /// touched in that case.
    pub async fn append<R: CsvRecord>(&self, records: &[R], destination: &str) -> SinkResult<usize> {
        if records.is_empty() {
            return Err(SinkError::EmptyInput);
        }

        let path = self.path_for(destination);
        let directory = self.directory.clone();
        let rows: Vec<Vec<String>> = records.iter().map(CsvRecord::row).collect();
        let header = R::HEADER;
        let count = rows.len();

        let _guard = self.lock.lock().await;
        tokio::task::spawn_blocking(move || {
            std::fs::create_dir_all(&directory)?;
            write_rows(&path, header, &rows)
        })
        .await
        .map_err(|e| SinkError::Io(std::io::Error::other(e)))??;

        tracing::debug!("Appended {} row(s) to {}", count, destination);
        Ok(count)
    }
}

fn write_rows(path: &Path, header: &[&str], rows: &[Vec<String>]) -> SinkResult<()> {
    let needs_header = std::fs::metadata(path)
        .map(|m| m.len() == 0)
        .unwrap_or(true);

    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);

    if needs_header {
        writer.write_record(header)?;
    }
    for row in rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Reads a listing file written by [`CsvSink`] back into records
///
/// Rows that do not deserialize (a hand-edited price, a truncated line) are
/// skipped with a warning instead of failing the whole file.
pub fn read_listing_file(path: &Path) -> SinkResult<Vec<ListingRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)?;

    let mut records = Vec::new();
    for (index, row) in reader.deserialize::<ListingRecord>().enumerate() {
        match row {
            Ok(record) => records.push(record),
            Err(e) => tracing::warn!("Skipping row {} of {}: {}", index + 2, path.display(), e),
        }
    }
    Ok(records)
}
