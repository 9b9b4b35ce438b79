//! High-level transfer orchestration
//!
//! Drives uploads and downloads against an [`S3Store`], applying the
//! size-threshold mode selection, directory archiving, checkpointing and
//! progress display.

use crate::archive::archive_dir;
use crate::error::{Error, Result};
use crate::format::format_size;
use crate::progress::TransferProgress;
use crate::resume::{unix_mtime, unix_now, DownloadState, PartInfo, ResumeManager, UploadState};
use crate::storage::{CompletedPart, ObjectInfo, S3Store};
use crate::transfer::{
    determine_part_size, part_ranges, select_download_mode, select_upload_mode, TransferMode,
};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// Transfer driver bound to one storage target
pub struct Transfers {
    store: S3Store,
    resume: ResumeManager,
    progress_enabled: bool,
}

impl Transfers {
    /// Create a transfer driver
    pub fn new(store: S3Store, resume: ResumeManager, progress_enabled: bool) -> Self {
        Self {
            store,
            resume,
            progress_enabled,
        }
    }

    /// Upload a local file or directory.
    ///
    /// Directories are zipped first. The object key defaults to the file
    /// name. A missing local path is logged and reported, not a panic.
    pub async fn upload(&self, path: &Path, key: Option<&str>, resumable: bool) -> Result<()> {
        if !path.exists() {
            tracing::error!(path = %path.display(), "Local path does not exist");
            return Ok(());
        }

        let path: PathBuf = if path.is_dir() {
            tracing::warn!(path = %path.display(), "Path is a directory, archiving to zip");
            archive_dir(path)?
        } else {
            path.to_path_buf()
        };

        let meta = tokio::fs::metadata(&path)
            .await
            .map_err(|e| Error::io("reading file metadata", e))?;
        let size = meta.len();

        let key = match key {
            Some(k) => k.to_string(),
            None => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .ok_or_else(|| Error::storage("cannot derive object key from path"))?,
        };

        let mode = select_upload_mode(size, resumable);
        tracing::info!(
            source = %path.display(),
            destination = %key,
            bucket = %self.store.bucket(),
            size = %format_size(size),
            mode = mode.name(),
            "Starting upload"
        );

        let progress = TransferProgress::new(self.progress_enabled);
        progress.start(&key, size);

        match mode {
            TransferMode::Single => {
                self.store.put_file(&key, &path).await?;
                progress.set_position(size);
            }
            TransferMode::Multipart => {
                self.upload_multipart(&path, &key, size, false, &progress)
                    .await?;
            }
            TransferMode::Resumable => {
                self.upload_multipart(&path, &key, size, true, &progress)
                    .await?;
            }
        }

        progress.finish();
        tracing::info!(
            source = %path.display(),
            destination = %key,
            size = %format_size(size),
            "Upload complete"
        );
        Ok(())
    }

    /// Upload a file in sequential parts, optionally checkpointing so an
    /// interrupted upload resumes instead of restarting
    async fn upload_multipart(
        &self,
        path: &Path,
        key: &str,
        size: u64,
        checkpoint: bool,
        progress: &TransferProgress,
    ) -> Result<()> {
        let state = if checkpoint {
            self.resume.load_upload(path, key)?
        } else {
            None
        };

        if let Some(ref s) = state {
            tracing::info!(
                upload_id = %s.upload_id,
                completed_parts = s.completed_parts.len(),
                "Resuming multipart upload"
            );
        }

        let (upload_id, part_size, mut parts) = match state {
            Some(s) => (s.upload_id, s.part_size, s.completed_parts),
            None => {
                let upload_id = self.store.create_multipart_upload(key).await?;
                (upload_id, determine_part_size(size), Vec::new())
            }
        };

        // Parts upload sequentially, so the checkpoint always covers a
        // prefix of the range list
        let completed_count = parts.len();
        progress.set_position(parts.iter().map(|p| p.size).sum::<u64>());

        let result: Result<()> = async {
            for (index, (offset, length)) in part_ranges(size, part_size)
                .enumerate()
                .skip(completed_count)
            {
                let part_number = index as i32 + 1;
                let part = self
                    .store
                    .upload_part(key, &upload_id, part_number, path, offset, length)
                    .await?;

                progress.set_position(offset + length);

                parts.push(PartInfo {
                    part_number: part.part_number,
                    etag: part.etag,
                    size: length,
                });

                if checkpoint {
                    let meta = tokio::fs::metadata(path)
                        .await
                        .map_err(|e| Error::io("reading file metadata", e))?;
                    self.resume.save_upload(&UploadState {
                        upload_id: upload_id.clone(),
                        remote_key: key.to_string(),
                        local_path: path.to_path_buf(),
                        local_size: size,
                        local_mtime: unix_mtime(&meta),
                        part_size,
                        completed_parts: parts.clone(),
                        started_at: unix_now(),
                    })?;
                }
            }

            let completed: Vec<CompletedPart> = parts.iter().map(CompletedPart::from).collect();
            self.store
                .complete_multipart_upload(key, &upload_id, completed)
                .await
        }
        .await;

        match result {
            Ok(()) => {
                if checkpoint {
                    self.resume.remove_upload(path, key);
                }
                Ok(())
            }
            Err(e) => {
                if checkpoint {
                    // Checkpoint survives so the next run picks up here
                    tracing::warn!(key = %key, "Upload interrupted, checkpoint kept for resume");
                } else if let Err(abort_err) =
                    self.store.abort_multipart_upload(key, &upload_id).await
                {
                    tracing::warn!(key = %key, error = %abort_err, "Failed to abort multipart upload");
                }
                Err(e)
            }
        }
    }

    /// Download an object to a local path.
    ///
    /// A missing object is logged, followed by a listing of the keys that
    /// are available, instead of failing the run.
    pub async fn download(&self, key: &str, path: Option<&Path>) -> Result<()> {
        let Some(info) = self.store.head(key).await? else {
            tracing::error!(key = %key, bucket = %self.store.bucket(), "Object does not exist");
            println!("Available objects:");
            for key in self.store.list_keys().await? {
                println!("  {}", key);
            }
            return Ok(());
        };

        let dest: PathBuf = match path {
            Some(p) => p.to_path_buf(),
            None => PathBuf::from("./").join(key),
        };
        if let Some(parent) = dest.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| Error::io("creating destination directory", e))?;
            }
        }

        let mode = select_download_mode(info.size);
        tracing::info!(
            source = %key,
            destination = %dest.display(),
            bucket = %self.store.bucket(),
            size = %format_size(info.size),
            mode = mode.name(),
            "Starting download"
        );

        let progress = TransferProgress::new(self.progress_enabled);
        progress.start(key, info.size);

        match mode {
            TransferMode::Single => {
                self.store.get_to_file(key, &dest, &progress).await?;
            }
            _ => {
                self.download_ranged(key, &dest, &info, &progress).await?;
            }
        }

        progress.finish();
        tracing::info!(
            source = %key,
            destination = %dest.display(),
            size = %format_size(info.size),
            "Download complete"
        );
        Ok(())
    }

    /// Download an object in ranged chunks, checkpointing progress to a
    /// `.part` file that is renamed into place on completion
    async fn download_ranged(
        &self,
        key: &str,
        dest: &Path,
        info: &ObjectInfo,
        progress: &TransferProgress,
    ) -> Result<()> {
        let part_path = PathBuf::from(format!("{}.part", dest.display()));
        let part_size = determine_part_size(info.size);

        let mut offset = match self.resume.load_download(dest, key)? {
            Some(state) if state.matches_remote(info.size, info.etag.as_deref()) => {
                // The partial file must agree with the checkpoint
                let on_disk = tokio::fs::metadata(&part_path)
                    .await
                    .map(|m| m.len())
                    .unwrap_or(0);
                if on_disk == state.bytes_written {
                    tracing::info!(
                        key = %key,
                        resumed_at = %format_size(state.bytes_written),
                        "Resuming download"
                    );
                    state.bytes_written
                } else {
                    self.resume.remove_download(dest, key);
                    0
                }
            }
            Some(_) => {
                tracing::debug!(key = %key, "Remote object changed, discarding download checkpoint");
                self.resume.remove_download(dest, key);
                0
            }
            None => 0,
        };

        let mut file = if offset > 0 {
            tokio::fs::OpenOptions::new()
                .append(true)
                .open(&part_path)
                .await
                .map_err(|e| Error::io("opening partial file", e))?
        } else {
            tokio::fs::File::create(&part_path)
                .await
                .map_err(|e| Error::io("creating partial file", e))?
        };
        progress.set_position(offset);

        while offset < info.size {
            let end = (offset + part_size).min(info.size) - 1;
            let chunk = self.store.get_range(key, offset, end).await?;
            file.write_all(&chunk)
                .await
                .map_err(|e| Error::io("writing partial file", e))?;
            offset += chunk.len() as u64;
            progress.set_position(offset);

            self.resume.save_download(&DownloadState {
                remote_key: key.to_string(),
                local_path: dest.to_path_buf(),
                remote_size: info.size,
                remote_etag: info.etag.clone(),
                bytes_written: offset,
                started_at: unix_now(),
            })?;
        }

        file.flush()
            .await
            .map_err(|e| Error::io("flushing partial file", e))?;
        drop(file);

        tokio::fs::rename(&part_path, dest)
            .await
            .map_err(|e| Error::io("renaming partial file", e))?;
        self.resume.remove_download(dest, key);

        Ok(())
    }
}
