//! CLI argument parsing for bucketeer

use crate::error::{Error, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// bucketeer - upload/download files to object storage; directories are
/// zipped before uploading
#[derive(Parser, Debug)]
#[command(name = "bucketeer")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Transfer direction
    #[arg(long, value_enum, default_value_t = Mode::Upload)]
    pub mode: Mode,

    /// Local file path (source for upload, destination for download)
    #[arg(long, alias = "file_path")]
    pub file_path: Option<PathBuf>,

    /// Remote object name (destination key for upload, source for download)
    #[arg(long, alias = "file_name")]
    pub file_name: Option<String>,

    /// Named target from the configuration file
    #[arg(long)]
    pub target: Option<String>,

    /// Use the target's internal-network endpoint
    #[arg(long)]
    pub internal: bool,

    /// Checkpoint large uploads so an interrupted run resumes
    #[arg(long)]
    pub resumable: bool,

    /// Disable the progress bar
    #[arg(long)]
    pub no_progress: bool,

    /// Configuration file path (default: platform config dir)
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Write a starter configuration file and exit
    #[arg(long)]
    pub init_config: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Output console logs as JSON
    #[arg(long)]
    pub json: bool,
}

/// Transfer direction
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Upload a local file or directory
    #[value(alias = "up")]
    Upload,
    /// Download a remote object
    #[value(alias = "down")]
    Download,
}

/// A validated transfer request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Upload {
        path: PathBuf,
        key: Option<String>,
        resumable: bool,
    },
    Download {
        key: String,
        path: Option<PathBuf>,
    },
}

impl Cli {
    /// Validate the mode-specific required arguments into a [`Request`]
    pub fn to_request(&self) -> Result<Request> {
        match self.mode {
            Mode::Upload => {
                let path = self.file_path.clone().ok_or_else(|| {
                    Error::missing_argument("file path is required in upload mode (--file-path)")
                })?;
                Ok(Request::Upload {
                    path,
                    key: self.file_name.clone(),
                    resumable: self.resumable,
                })
            }
            Mode::Download => {
                let key = self.file_name.clone().ok_or_else(|| {
                    Error::missing_argument("file name is required in download mode (--file-name)")
                })?;
                Ok(Request::Download {
                    key,
                    path: self.file_path.clone(),
                })
            }
        }
    }

    /// The target name, required for any transfer
    pub fn target_name(&self) -> Result<&str> {
        self.target
            .as_deref()
            .ok_or_else(|| Error::missing_argument("a target is required (--target)"))
    }
}
