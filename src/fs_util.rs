use std::fs;

use camino::{Utf8Path, Utf8PathBuf};

use crate::error::CatalogError;

/// Regular, non-hidden files directly inside `dir`, sorted by file name.
pub fn list_dataset_files(dir: &Utf8Path) -> Result<Vec<Utf8PathBuf>, CatalogError> {
    let entries = fs::read_dir(dir.as_std_path())
        .map_err(|err| CatalogError::Filesystem(format!("read dir {dir}: {err}")))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|err| CatalogError::Filesystem(err.to_string()))?;
        let file_type = entry
            .file_type()
            .map_err(|err| CatalogError::Filesystem(err.to_string()))?;
        if !file_type.is_file() {
            continue;
        }
        let path = Utf8PathBuf::from_path_buf(entry.path()).map_err(|path| {
            CatalogError::Filesystem(format!("non UTF-8 path: {}", path.display()))
        })?;
        if is_hidden(&path) {
            continue;
        }
        files.push(path);
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

// .DS_Store and friends
fn is_hidden(path: &Utf8Path) -> bool {
    path.file_name()
        .map(|name| name.starts_with('.'))
        .unwrap_or(true)
}
