use std::ffi::OsStr;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf, MAIN_SEPARATOR};
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::query::TagIndex;
use crate::store::{ObjectStore, Tag};

const MESSAGE_SUCCESS: &str = "+ SUCCESS ------> ";
const MESSAGE_FAILED: &str = "- FAILED  ------> ";
const MESSAGE_REASON: &str = "? REASON  ======> ";

/// Stem starting with a non-blank character, then an accepted image extension.
static IMAGE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\S.*\.(?i:jpg|jpeg|png)$").expect("Invalid image name pattern")
});

/// Failure of a single file or object. Never aborts the batch.
#[derive(Debug, Error)]
pub enum ItemError {
    #[error("The picture \"{0}\" has an invalid extension. Use jpg, jpeg or png.")]
    InvalidExtension(String),

    #[error("The object key \"{0}\" is not a plain file name")]
    UnsafeKey(String),

    #[error("Failed to read {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("Failed to write {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error("Remote call failed for \"{key}\": {message}")]
    Remote { key: String, message: String },
}

impl ItemError {
    fn remote(key: &str, err: anyhow::Error) -> Self {
        Self::Remote {
            key: key.to_string(),
            message: format!("{err:#}"),
        }
    }
}

/// Failure that stops a whole upload or download before anything moves.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("No such folder: {}", .0.display())]
    MissingFolder(PathBuf),

    #[error("Folder is empty - nothing to upload")]
    NothingToUpload(PathBuf),

    #[error("No such album")]
    NoSuchAlbum(String),

    #[error("Failed to read folder {}: {source}", path.display())]
    ReadFolder { path: PathBuf, source: io::Error },

    #[error("Failed to query the tag index: {0:#}")]
    Index(anyhow::Error),
}

impl TransferError {
    /// Tag index failures end the process; everything else ends the command.
    pub fn is_fatal(&self) -> bool {
        matches!(self, TransferError::Index(_))
    }
}

#[derive(Debug)]
pub enum Outcome {
    Success,
    Failed(ItemError),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }
}

/// Per-item outcomes of one batch, in processing order.
#[derive(Debug, Default)]
pub struct TransferReport {
    items: Vec<(String, Outcome)>,
}

impl TransferReport {
    pub fn record(&mut self, name: impl Into<String>, outcome: Outcome) {
        self.items.push((name.into(), outcome));
    }

    pub fn items(&self) -> &[(String, Outcome)] {
        &self.items
    }

    pub fn total(&self) -> usize {
        self.items.len()
    }

    pub fn succeeded(&self) -> usize {
        self.items
            .iter()
            .filter(|(_, outcome)| outcome.is_success())
            .count()
    }

    pub fn failed(&self) -> usize {
        self.total() - self.succeeded()
    }
}

impl fmt::Display for TransferReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, outcome) in &self.items {
            match outcome {
                Outcome::Success => writeln!(f, "{MESSAGE_SUCCESS}{name}")?,
                Outcome::Failed(reason) => {
                    writeln!(f, "{MESSAGE_FAILED}{name}")?;
                    writeln!(f, "{MESSAGE_REASON}{reason}")?;
                }
            }
        }

        let total = self.total();
        writeln!(f, "TOTAL: {total}")?;
        writeln!(f, "SUCCESS: {}/{total}", self.succeeded())?;
        write!(f, "FAILED: {}/{total}", self.failed())
    }
}

pub fn validate_image_name(name: &str) -> Result<(), ItemError> {
    if IMAGE_NAME.is_match(name) {
        Ok(())
    } else {
        Err(ItemError::InvalidExtension(name.to_string()))
    }
}

/// Relative paths are resolved against the working directory.
pub fn resolve_dir(path: &str) -> PathBuf {
    if Path::new(path).is_absolute() {
        PathBuf::from(path)
    } else {
        PathBuf::from(format!(".{MAIN_SEPARATOR}{path}"))
    }
}

/// `dir` with trailing separators collapsed to exactly one.
pub fn with_trailing_separator(dir: &str) -> String {
    format!("{}{MAIN_SEPARATOR}", dir.trim_end_matches(MAIN_SEPARATOR))
}

fn is_plain_file_name(key: &str) -> bool {
    Path::new(key).file_name() == Some(OsStr::new(key))
}

/// Moves images between a local folder and an album of the store.
pub struct TransferEngine<'a> {
    store: &'a dyn ObjectStore,
    tag_key: &'a str,
}

impl<'a> TransferEngine<'a> {
    pub fn new(store: &'a dyn ObjectStore, tag_key: &'a str) -> Self {
        Self { store, tag_key }
    }

    /// Upload every image directly inside `path` and tag it with `album`.
    pub async fn upload(&self, path: &str, album: &str) -> Result<TransferReport, TransferError> {
        let folder = resolve_dir(path);
        if !is_dir(&folder).await {
            return Err(TransferError::MissingFolder(folder));
        }

        let files = regular_files(&folder).await?;
        if files.is_empty() {
            return Err(TransferError::NothingToUpload(folder));
        }

        tracing::info!(
            "Uploading {} files from {} to album {}",
            files.len(),
            folder.display(),
            album
        );

        let tags = [Tag::new(self.tag_key, album)];
        let mut report = TransferReport::default();

        for (name, file_path) in files {
            let outcome = match self.upload_one(&name, &file_path, &tags).await {
                Ok(()) => Outcome::Success,
                Err(e) => {
                    tracing::debug!("Upload skipped: file={}, reason={}", name, e);
                    Outcome::Failed(e)
                }
            };
            report.record(name, outcome);
        }

        Ok(report)
    }

    async fn upload_one(&self, name: &str, file_path: &Path, tags: &[Tag]) -> Result<(), ItemError> {
        validate_image_name(name)?;

        let data = tokio::fs::read(file_path).await.map_err(|source| ItemError::Read {
            path: file_path.to_path_buf(),
            source,
        })?;

        self.store
            .put_object(name, data, tags)
            .await
            .map_err(|e| ItemError::remote(name, e))
    }

    /// Download every object of `album` into the folder at `path`.
    pub async fn download(&self, path: &str, album: &str) -> Result<TransferReport, TransferError> {
        let objects = TagIndex::new(self.store, self.tag_key)
            .album_images(album)
            .await
            .map_err(TransferError::Index)?;

        if objects.is_empty() {
            return Err(TransferError::NoSuchAlbum(album.to_string()));
        }

        let folder = resolve_dir(path);
        if !is_dir(&folder).await {
            return Err(TransferError::MissingFolder(folder));
        }

        tracing::info!(
            "Downloading {} objects of album {} to {}",
            objects.len(),
            album,
            folder.display()
        );

        let prefix = with_trailing_separator(&folder.to_string_lossy());
        let mut report = TransferReport::default();

        for object in objects {
            let outcome = match self.download_one(&object.key, &prefix).await {
                Ok(()) => Outcome::Success,
                Err(e) => {
                    tracing::debug!("Download skipped: key={}, reason={}", object.key, e);
                    Outcome::Failed(e)
                }
            };
            report.record(object.key, outcome);
        }

        Ok(report)
    }

    async fn download_one(&self, key: &str, prefix: &str) -> Result<(), ItemError> {
        validate_image_name(key)?;
        if !is_plain_file_name(key) {
            return Err(ItemError::UnsafeKey(key.to_string()));
        }

        let data = self
            .store
            .get_object(key)
            .await
            .map_err(|e| ItemError::remote(key, e))?;

        let target = PathBuf::from(format!("{prefix}{key}"));
        tokio::fs::write(&target, data)
            .await
            .map_err(|source| ItemError::Write {
                path: target,
                source,
            })
    }
}

async fn is_dir(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|metadata| metadata.is_dir())
        .unwrap_or(false)
}

/// Regular files directly inside `folder`, sorted by name. Not recursive.
async fn regular_files(folder: &Path) -> Result<Vec<(String, PathBuf)>, TransferError> {
    let read_error = |source: io::Error| TransferError::ReadFolder {
        path: folder.to_path_buf(),
        source,
    };

    let mut entries = tokio::fs::read_dir(folder).await.map_err(read_error)?;
    let mut files = Vec::new();

    while let Some(entry) = entries.next_entry().await.map_err(read_error)? {
        let path = entry.path();
        let is_file = tokio::fs::metadata(&path)
            .await
            .map(|metadata| metadata.is_file())
            .unwrap_or(false);

        if is_file {
            files.push((entry.file_name().to_string_lossy().into_owned(), path));
        }
    }

    files.sort();
    Ok(files)
}
