//! Integration tests for the local pieces: archiving, target configuration
//! and checkpoint persistence across runs

use bucketeer::archive::archive_dir;
use bucketeer::config::{Config, Target};
use bucketeer::resume::{unix_now, DownloadState, ResumeManager};
use bucketeer::transfer::{select_upload_mode, TransferMode, SINGLE_REQUEST_LIMIT};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Create a test file with specified content
fn create_file(dir: &TempDir, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_directory_upload_archives_then_selects_mode() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("dataset");
    fs::create_dir_all(dir.join("inner")).unwrap();
    fs::write(dir.join("readme.txt"), b"small file").unwrap();
    fs::write(dir.join("inner/data.bin"), vec![0u8; 4096]).unwrap();

    // Archive first, then apply the threshold to the archive size
    let zip_path = archive_dir(&dir).unwrap();
    assert!(zip_path.exists());
    assert_eq!(zip_path.extension().unwrap(), "zip");

    let size = fs::metadata(&zip_path).unwrap().len();
    assert!(size > 0);
    assert!(size <= SINGLE_REQUEST_LIMIT);
    assert_eq!(select_upload_mode(size, false), TransferMode::Single);
}

#[test]
fn test_archive_is_reproducible_content() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("docs");
    fs::create_dir_all(&dir).unwrap();
    create_file(&tmp, "docs/a.txt", b"alpha");
    create_file(&tmp, "docs/b/c.txt", b"nested");

    let zip_path = archive_dir(&dir).unwrap();

    let mut archive = zip::ZipArchive::new(fs::File::open(&zip_path).unwrap()).unwrap();
    let mut names: Vec<String> = (0..archive.len())
        .map(|i| archive.by_index(i).unwrap().name().trim_end_matches('/').to_string())
        .collect();
    names.sort();
    assert_eq!(names, vec!["a.txt", "b", "b/c.txt"]);
}

#[test]
fn test_config_file_round_trip_and_resolution() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("targets.json");

    let config = Config {
        targets: vec![Target {
            name: "jakarta".to_string(),
            endpoint: "https://s3.ap-southeast-5.example.com".to_string(),
            internal_endpoint: None,
            bucket: "asia-download".to_string(),
            accelerate: false,
            region: Some("ap-southeast-5".to_string()),
            access_key_id: None,
            secret_access_key: None,
        }],
    };
    config.save_to(&path).unwrap();

    let loaded = Config::load_from(&path).unwrap();
    let target = loaded.resolve("jakarta").unwrap();
    assert_eq!(target.bucket, "asia-download");
    assert_eq!(target.endpoint_for(false).unwrap(), "https://s3.ap-southeast-5.example.com");

    let err = loaded.resolve("virginia").unwrap_err().to_string();
    assert!(err.contains("virginia"));
    assert!(err.contains("jakarta"));
}

#[test]
fn test_config_parses_handwritten_json() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("targets.json");
    fs::write(
        &path,
        r#"{
            "targets": [
                {
                    "name": "virginia",
                    "endpoint": "https://s3.us-east-1.example.com",
                    "internal_endpoint": "https://s3-internal.us-east-1.example.com",
                    "bucket": "oversea-download",
                    "accelerate": true
                }
            ]
        }"#,
    )
    .unwrap();

    let config = Config::load_from(&path).unwrap();
    let target = config.resolve("virginia").unwrap();
    assert!(target.accelerate);
    assert_eq!(
        target.endpoint_for(true).unwrap(),
        "https://s3-internal.us-east-1.example.com"
    );
}

#[test]
fn test_download_checkpoint_survives_restart() {
    let tmp = TempDir::new().unwrap();
    let cache = tmp.path().join("cache");
    let dest = tmp.path().join("big.bin");

    {
        let mgr = ResumeManager::with_cache_dir(cache.clone()).unwrap();
        mgr.save_download(&DownloadState {
            remote_key: "big.bin".to_string(),
            local_path: dest.clone(),
            remote_size: 10 * 1024 * 1024 * 1024,
            remote_etag: Some("etag-xyz".to_string()),
            bytes_written: 3 * 1024 * 1024 * 1024,
            started_at: unix_now(),
        })
        .unwrap();
    }

    // A fresh manager (new process) sees the same checkpoint
    let mgr = ResumeManager::with_cache_dir(cache).unwrap();
    let state = mgr.load_download(&dest, "big.bin").unwrap().unwrap();
    assert_eq!(state.bytes_written, 3 * 1024 * 1024 * 1024);
    assert!(state.matches_remote(10 * 1024 * 1024 * 1024, Some("etag-xyz")));
    assert!(!state.matches_remote(10 * 1024 * 1024 * 1024, Some("changed")));
}
