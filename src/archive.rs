//! Directory archiving for uploads
//!
//! Directories are zipped before the size-threshold logic runs, so a single
//! object lands in the bucket per upload.

use crate::error::{Error, Result};
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Zip `dir` into `<dir>.zip` next to it, returning the archive path.
///
/// Entry names are stored relative to `dir`. An existing archive at the
/// destination is overwritten.
pub fn archive_dir(dir: &Path) -> Result<PathBuf> {
    if !dir.is_dir() {
        return Err(Error::Archive {
            message: format!("{} is not a directory", dir.display()),
        });
    }

    let zip_path = dir.with_extension("zip");
    let file = File::create(&zip_path).map_err(|e| Error::io("creating zip archive", e))?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for entry in WalkDir::new(dir) {
        let entry = entry.map_err(|e| Error::Archive {
            message: format!("walking {}: {}", dir.display(), e),
        })?;
        let path = entry.path();
        let relative = path
            .strip_prefix(dir)
            .map_err(|e| Error::Archive {
                message: format!("resolving relative path: {}", e),
            })?
            .to_string_lossy()
            .replace('\\', "/");

        if relative.is_empty() {
            continue;
        }

        if entry.file_type().is_dir() {
            zip.add_directory(relative.as_str(), options).map_err(zip_err)?;
        } else if entry.file_type().is_file() {
            zip.start_file(relative.as_str(), options).map_err(zip_err)?;
            let mut src = File::open(path).map_err(|e| Error::io("reading file for zip", e))?;
            io::copy(&mut src, &mut zip).map_err(|e| Error::io("writing zip entry", e))?;
        }
        // Symlinks and other special files are skipped
    }

    let mut file = zip.finish().map_err(zip_err)?;
    file.flush().map_err(|e| Error::io("flushing zip archive", e))?;

    Ok(zip_path)
}

fn zip_err(e: zip::result::ZipError) -> Error {
    Error::Archive {
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_archive_dir_contains_relative_entries() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("data");
        fs::create_dir_all(dir.join("sub")).unwrap();
        fs::write(dir.join("a.txt"), b"hello").unwrap();
        fs::write(dir.join("sub/b.txt"), b"world").unwrap();

        let zip_path = archive_dir(&dir).unwrap();
        assert_eq!(zip_path, tmp.path().join("data.zip"));
        assert!(zip_path.exists());

        let mut archive = zip::ZipArchive::new(File::open(&zip_path).unwrap()).unwrap();
        let names: Vec<String> = (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect();
        assert!(names.contains(&"a.txt".to_string()));
        assert!(names.contains(&"sub/b.txt".to_string()));
    }

    #[test]
    fn test_archive_rejects_file() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("plain.txt");
        fs::write(&file, b"x").unwrap();
        assert!(archive_dir(&file).is_err());
    }
}
