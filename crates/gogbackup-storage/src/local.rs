//! Local filesystem backend.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use futures_util::StreamExt;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use gogbackup_core::{ByteStream, StorageBackend, StorageError, temp_name};

use crate::error::{BackendError, BackendResult};

/// Backend that mirrors into a directory on the local disk.
///
/// Payloads are written to `.<filename>.tmp` next to the final file, synced,
/// then renamed into place.
#[derive(Debug, Clone)]
pub struct LocalBackend {
    root: String,
}

impl LocalBackend {
    /// Create a backend rooted at `root` without touching the filesystem.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into().to_string_lossy().into_owned(),
        }
    }

    /// Create a backend rooted at `root`, creating the directory if needed.
    pub async fn open(root: impl Into<PathBuf>) -> BackendResult<Self> {
        let root = root.into();
        let unusable = |message: String| BackendError::LocalDirectory {
            path: root.display().to_string(),
            message,
        };

        fs::create_dir_all(&root)
            .await
            .map_err(|e| unusable(e.to_string()))?;
        let metadata = fs::metadata(&root)
            .await
            .map_err(|e| unusable(e.to_string()))?;
        if !metadata.is_dir() {
            return Err(unusable("not a directory".to_string()));
        }

        tracing::info!(root = %root.display(), "Using local backup directory");
        Ok(Self::new(root))
    }

    /// Root directory.
    pub fn root(&self) -> &Path {
        Path::new(&self.root)
    }
}

/// Write `content` to `path` via a sibling temp file and rename.
async fn write_atomic(path: &Path, content: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    let mut file = fs::File::create(&tmp).await?;
    file.write_all(content).await?;
    file.sync_all().await?;
    drop(file);
    fs::rename(&tmp, path).await
}

/// Drain `stream` into a freshly created file at `path`.
async fn write_stream(path: &Path, stream: &mut ByteStream) -> Result<u64, StorageError> {
    let mut file = fs::File::create(path).await?;
    let mut written = 0u64;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;
    file.sync_all().await?;
    Ok(written)
}

#[async_trait]
impl StorageBackend for LocalBackend {
    fn prefix(&self) -> &str {
        &self.root
    }

    fn display_prefix(&self) -> &str {
        ""
    }

    async fn read_marker(&self, path: &str) -> Result<Option<String>, StorageError> {
        match fs::read(path).await {
            Ok(bytes) => Ok(Some(String::from_utf8_lossy(&bytes).into_owned())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_marker(&self, path: &str, content: &str) -> Result<(), StorageError> {
        write_atomic(Path::new(path), content.as_bytes()).await?;
        Ok(())
    }

    async fn exists(&self, path: &str) -> Result<bool, StorageError> {
        Ok(fs::try_exists(path).await?)
    }

    async fn transfer(
        &self,
        mut stream: ByteStream,
        dest_dir: &str,
        filename: &str,
    ) -> Result<u64, StorageError> {
        if filename.is_empty() {
            return Err(StorageError::MissingFilename);
        }

        let dir = Path::new(dest_dir);
        fs::create_dir_all(dir).await?;
        let tmp = dir.join(temp_name(filename));
        let out = dir.join(filename);

        match write_stream(&tmp, &mut stream).await {
            Ok(written) => {
                fs::rename(&tmp, &out).await?;
                tracing::debug!(path = %out.display(), bytes = written, "Stored file");
                Ok(written)
            }
            Err(e) => {
                if let Err(cleanup) = fs::remove_file(&tmp).await {
                    tracing::debug!(
                        path = %tmp.display(),
                        error = %cleanup,
                        "Could not remove temp file"
                    );
                }
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use futures_util::stream;

    fn stream_of(parts: &[&'static [u8]]) -> ByteStream {
        let items: Vec<std::io::Result<Bytes>> =
            parts.iter().map(|p| Ok(Bytes::from_static(p))).collect();
        Box::pin(stream::iter(items))
    }

    fn failing_stream() -> ByteStream {
        let items: Vec<std::io::Result<Bytes>> = vec![
            Ok(Bytes::from_static(b"partial")),
            Err(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "connection reset",
            )),
        ];
        Box::pin(stream::iter(items))
    }

    fn dir_str(path: &Path) -> String {
        path.to_string_lossy().into_owned()
    }

    #[tokio::test]
    async fn transfer_creates_directories_and_renames() {
        let tmp = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new(tmp.path());
        let dest = tmp.path().join("Game/Linux");

        let written = backend
            .transfer(stream_of(&[b"hello ", b"world"]), &dir_str(&dest), "game.sh")
            .await
            .unwrap();

        assert_eq!(written, 11);
        assert_eq!(std::fs::read(dest.join("game.sh")).unwrap(), b"hello world");
        assert!(!dest.join(".game.sh.tmp").exists());
    }

    #[tokio::test]
    async fn failed_stream_leaves_no_final_file() {
        let tmp = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new(tmp.path());
        let dest = tmp.path().join("Game/Windows");

        let err = backend
            .transfer(failing_stream(), &dir_str(&dest), "setup.exe")
            .await
            .unwrap_err();

        assert!(matches!(err, StorageError::Io { .. }));
        assert!(!dest.join("setup.exe").exists());
        assert!(!dest.join(".setup.exe.tmp").exists());
    }

    #[tokio::test]
    async fn failed_stream_keeps_previous_version() {
        let tmp = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new(tmp.path());
        let dest = tmp.path().join("Game/Mac");
        let dest_str = dir_str(&dest);

        backend
            .transfer(stream_of(&[b"v1"]), &dest_str, "game.pkg")
            .await
            .unwrap();
        backend
            .transfer(failing_stream(), &dest_str, "game.pkg")
            .await
            .unwrap_err();

        assert_eq!(std::fs::read(dest.join("game.pkg")).unwrap(), b"v1");
    }

    #[tokio::test]
    async fn empty_filename_touches_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new(tmp.path());
        let dest = tmp.path().join("never-created");

        let err = backend
            .transfer(stream_of(&[b"x"]), &dir_str(&dest), "")
            .await
            .unwrap_err();

        assert_eq!(err, StorageError::MissingFilename);
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn markers_round_trip_without_trailing_newline() {
        let tmp = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new(tmp.path());
        let marker = tmp.path().join("Game/Linux/.game.sh.version");
        let marker = dir_str(&marker);

        assert_eq!(backend.read_marker(&marker).await.unwrap(), None);
        backend.write_marker(&marker, "2.1.0").await.unwrap();
        assert_eq!(
            backend.read_marker(&marker).await.unwrap().as_deref(),
            Some("2.1.0")
        );
        assert_eq!(std::fs::read(&marker).unwrap(), b"2.1.0");
    }

    #[tokio::test]
    async fn exists_reflects_filesystem() {
        let tmp = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new(tmp.path());
        let file = tmp.path().join("present.bin");
        std::fs::write(&file, b"x").unwrap();

        assert!(backend.exists(&dir_str(&file)).await.unwrap());
        assert!(
            !backend
                .exists(&dir_str(&tmp.path().join("absent.bin")))
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn open_creates_root_and_rejects_files() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("GoG");
        let backend = LocalBackend::open(&root).await.unwrap();
        assert!(root.is_dir());
        assert_eq!(backend.prefix(), dir_str(&root));
        assert_eq!(backend.display_prefix(), "");

        let file = tmp.path().join("file");
        std::fs::write(&file, b"x").unwrap();
        assert!(matches!(
            LocalBackend::open(&file).await,
            Err(BackendError::LocalDirectory { .. })
        ));
    }
}
