//! Report file discovery.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{IngestError, Result};
use crate::source::REPORT_EXTENSIONS;

fn is_report_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            REPORT_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

/// Lists all report files (`.pdf`, `.txt`) in a directory.
///
/// Returns files sorted by filename. Subdirectories are not searched.
pub fn list_report_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(IngestError::DirectoryNotFound {
            path: dir.to_path_buf(),
        });
    }

    let entries = std::fs::read_dir(dir).map_err(|e| IngestError::DirectoryRead {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let mut files = Vec::new();
    for entry_result in entries {
        let entry = entry_result.map_err(|e| IngestError::DirectoryRead {
            path: dir.to_path_buf(),
            source: e,
        })?;
        let path = entry.path();
        if path.is_file() && is_report_file(&path) {
            files.push(path);
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    debug!(dir = %dir.display(), count = files.len(), "discovered report files");
    Ok(files)
}

/// Expands command-line inputs into a list of documents.
///
/// Directories are replaced by their report files; files are kept in the
/// given order whatever their extension, so an unsupported file is reported
/// as a per-document failure later rather than silently dropped.
pub fn expand_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut documents = Vec::new();
    for input in inputs {
        if input.is_dir() {
            documents.extend(list_report_files(input)?);
        } else {
            documents.push(input.clone());
        }
    }
    Ok(documents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        for name in &["b_sept.pdf", "a_aug.TXT", "notes.docx", "c_oct.txt"] {
            std::fs::write(dir.path().join(name), "HbA1c 6.8").unwrap();
        }
        std::fs::create_dir(dir.path().join("nested.pdf")).unwrap();
        dir
    }

    fn names(paths: &[PathBuf]) -> Vec<String> {
        paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_list_report_files() {
        let dir = create_test_dir();
        let files = list_report_files(dir.path()).unwrap();
        assert_eq!(names(&files), vec!["a_aug.TXT", "b_sept.pdf", "c_oct.txt"]);
    }

    #[test]
    fn test_list_report_files_not_a_directory() {
        let dir = TempDir::new().unwrap();
        let file_path = dir.path().join("report.pdf");
        std::fs::write(&file_path, "data").unwrap();
        assert!(matches!(
            list_report_files(&file_path),
            Err(IngestError::DirectoryNotFound { .. })
        ));
    }

    #[test]
    fn test_expand_inputs_keeps_explicit_files() {
        let dir = create_test_dir();
        let explicit = dir.path().join("notes.docx");
        let documents = expand_inputs(&[explicit, dir.path().to_path_buf()]).unwrap();
        assert_eq!(
            names(&documents),
            vec!["notes.docx", "a_aug.TXT", "b_sept.pdf", "c_oct.txt"]
        );
    }
}
