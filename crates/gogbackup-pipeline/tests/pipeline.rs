//! End-to-end pipeline runs against a scripted catalog and a local backend.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream;
use gogbackup_core::{
    ByteStream, CatalogClient, CatalogError, CatalogItem, CatalogPage, FileTransferDescriptor,
    GameDetails, GameFile, LanguageDownloads, MediaType, PlatformFiles, RateLimiter, RemoteFile,
    StorageBackend, StorageError, TransferOutcome, TransferQueue,
};
use gogbackup_pipeline::{Pipeline, PipelineConfig, SummarySnapshot, TransferWorker, WorkerConfig};
use gogbackup_storage::LocalBackend;
use tokio_util::sync::CancellationToken;

const EMBED: &str = "https://embed.gog.com/downloads";

/// How the fake serves a download URL.
#[derive(Clone)]
enum Payload {
    Bytes { filename: &'static str, body: Vec<u8> },
    Unreachable,
    BreaksMidStream { filename: &'static str },
    Stalls { filename: &'static str },
    NoFilename,
}

/// Scripted catalog: fixed pages, details and payloads, counting opens.
#[derive(Default)]
struct FakeCatalog {
    pages: Vec<CatalogPage>,
    details: HashMap<u64, GameDetails>,
    payloads: HashMap<String, Payload>,
    opens: Mutex<HashMap<String, u32>>,
}

impl FakeCatalog {
    fn serve(&mut self, key: &str, payload: Payload) {
        self.payloads.insert(format!("{EMBED}/{key}"), payload);
    }

    fn opens(&self, key: &str) -> u32 {
        self.opens
            .lock()
            .unwrap()
            .get(&format!("{EMBED}/{key}"))
            .copied()
            .unwrap_or_default()
    }
}

fn remote(filename: &str, stream: ByteStream) -> RemoteFile {
    RemoteFile {
        filename: filename.to_string(),
        stream,
        content_length: None,
    }
}

#[async_trait]
impl CatalogClient for FakeCatalog {
    async fn catalog_page(
        &self,
        _media_type: MediaType,
        page: u32,
    ) -> Result<CatalogPage, CatalogError> {
        self.pages
            .get(page as usize - 1)
            .cloned()
            .ok_or_else(|| CatalogError::network_with_status("no such page", 404))
    }

    async fn details(&self, item: CatalogItem) -> Result<GameDetails, CatalogError> {
        self.details
            .get(&item.id())
            .cloned()
            .ok_or_else(|| CatalogError::network_with_status("no such product", 404))
    }

    async fn open_stream(&self, url: &str) -> Result<RemoteFile, CatalogError> {
        *self
            .opens
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default() += 1;

        match self.payloads.get(url).cloned() {
            None | Some(Payload::Unreachable) => Err(CatalogError::network("connection refused")),
            Some(Payload::Bytes { filename, body }) => Ok(remote(
                filename,
                Box::pin(stream::iter(vec![Ok(Bytes::from(body))])),
            )),
            Some(Payload::BreaksMidStream { filename }) => Ok(remote(
                filename,
                Box::pin(stream::iter(vec![
                    Ok(Bytes::from_static(b"partial")),
                    Err(std::io::Error::other("connection reset")),
                ])),
            )),
            Some(Payload::Stalls { filename }) => Ok(remote(filename, Box::pin(stream::pending()))),
            Some(Payload::NoFilename) => Ok(remote(
                "",
                Box::pin(stream::iter(vec![Ok(Bytes::from_static(b"x"))])),
            )),
        }
    }
}

/// Local storage whose marker writes always fail.
struct MarkerWritesFail(LocalBackend);

#[async_trait]
impl StorageBackend for MarkerWritesFail {
    fn prefix(&self) -> &str {
        self.0.prefix()
    }

    fn display_prefix(&self) -> &str {
        self.0.display_prefix()
    }

    async fn read_marker(&self, path: &str) -> Result<Option<String>, StorageError> {
        self.0.read_marker(path).await
    }

    async fn write_marker(&self, _path: &str, _content: &str) -> Result<(), StorageError> {
        Err(StorageError::object_store("access denied"))
    }

    async fn exists(&self, path: &str) -> Result<bool, StorageError> {
        self.0.exists(path).await
    }

    async fn transfer(
        &self,
        stream: ByteStream,
        dest_dir: &str,
        filename: &str,
    ) -> Result<u64, StorageError> {
        self.0.transfer(stream, dest_dir, filename).await
    }
}

fn file(key: &str, version: Option<&str>) -> GameFile {
    GameFile {
        name: key.to_string(),
        url: format!("{EMBED}/{key}"),
        version: version.map(ToString::to_string),
        size: "1 MB".to_string(),
    }
}

fn game(
    title: &str,
    platforms: PlatformFiles,
    extras: Vec<GameFile>,
    dlcs: Vec<GameDetails>,
) -> GameDetails {
    GameDetails {
        title: title.to_string(),
        downloads: vec![LanguageDownloads {
            language: "English".to_string(),
            platforms,
        }],
        extras,
        dlcs,
    }
}

/// Two owned titles over two pages, one with a DLC, plus one product whose
/// details cannot be fetched.
fn library(installer_version: &str) -> FakeCatalog {
    let foo = game(
        "Foo: Bar",
        PlatformFiles {
            windows: vec![file("foo-win", Some(installer_version))],
            mac: Vec::new(),
            linux: vec![file("foo-linux", None)],
        },
        vec![file("foo-manual", None)],
        vec![game(
            "Soundtrack",
            PlatformFiles::default(),
            vec![file("foo-ost", Some("1"))],
            Vec::new(),
        )],
    );
    let baz = game(
        "Baz",
        PlatformFiles {
            mac: vec![file("baz-mac", Some("2.0"))],
            ..PlatformFiles::default()
        },
        Vec::new(),
        Vec::new(),
    );

    let mut catalog = FakeCatalog {
        pages: vec![
            CatalogPage::new([CatalogItem(1)], 2),
            CatalogPage::new([CatalogItem(2), CatalogItem(99)], 2),
        ],
        details: HashMap::from([(1, foo), (2, baz)]),
        ..FakeCatalog::default()
    };
    catalog.serve(
        "foo-win",
        Payload::Bytes {
            filename: "setup_foo.exe",
            body: format!("installer {installer_version}").into_bytes(),
        },
    );
    catalog.serve(
        "foo-linux",
        Payload::Bytes {
            filename: "foo.sh",
            body: b"#!/bin/sh".to_vec(),
        },
    );
    catalog.serve(
        "foo-manual",
        Payload::Bytes {
            filename: "manual.pdf",
            body: b"%PDF".to_vec(),
        },
    );
    catalog.serve(
        "foo-ost",
        Payload::Bytes {
            filename: "ost.zip",
            body: b"PK".to_vec(),
        },
    );
    catalog.serve(
        "baz-mac",
        Payload::Bytes {
            filename: "baz.pkg",
            body: b"xar!".to_vec(),
        },
    );
    catalog
}

fn config() -> PipelineConfig {
    PipelineConfig::new().with_worker(WorkerConfig::new().with_retry_delay(Duration::ZERO))
}

async fn run(catalog: Arc<FakeCatalog>, root: &Path, config: PipelineConfig) -> SummarySnapshot {
    let backend: Arc<dyn StorageBackend> = Arc::new(LocalBackend::open(root).await.unwrap());
    Pipeline::new(catalog, backend, config)
        .run(CancellationToken::new())
        .await
}

/// Every file under `root`, relative and sorted.
fn files_under(root: &Path) -> Vec<String> {
    fn walk(dir: &Path, root: &Path, out: &mut Vec<String>) {
        for entry in std::fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                walk(&path, root, out);
            } else {
                let rel = path.strip_prefix(root).unwrap();
                out.push(rel.to_string_lossy().replace('\\', "/"));
            }
        }
    }
    let mut out = Vec::new();
    walk(root, root, &mut out);
    out.sort();
    out
}

fn sorted(paths: &[&str]) -> Vec<String> {
    let mut paths: Vec<String> = paths.iter().map(ToString::to_string).collect();
    paths.sort();
    paths
}

fn read(root: &Path, rel: &str) -> String {
    std::fs::read_to_string(root.join(rel)).unwrap()
}

#[tokio::test]
async fn first_run_backs_up_everything_in_layout() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path().join("GoG");

    let summary = run(Arc::new(library("1.0")), &root, config()).await;

    assert_eq!(summary.transferred, 5);
    assert_eq!(summary.failed, 0);
    assert_eq!(
        files_under(&root),
        sorted(&[
            "Foo - Bar/Windows/setup_foo.exe",
            "Foo - Bar/Windows/.setup_foo.exe.version",
            "Foo - Bar/Linux/foo.sh",
            "Foo - Bar/Extras/manual.pdf",
            "Foo - Bar/Soundtrack/Extras/ost.zip",
            "Foo - Bar/Soundtrack/Extras/.ost.zip.version",
            "Baz/Mac/baz.pkg",
            "Baz/Mac/.baz.pkg.version",
        ])
    );
    assert_eq!(read(&root, "Foo - Bar/Windows/.setup_foo.exe.version"), "1.0");
    assert_eq!(read(&root, "Baz/Mac/.baz.pkg.version"), "2.0");
    assert_eq!(read(&root, "Foo - Bar/Windows/setup_foo.exe"), "installer 1.0");
}

#[tokio::test]
async fn second_run_over_warm_destination_transfers_nothing() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path().join("GoG");

    run(Arc::new(library("1.0")), &root, config()).await;
    let before = files_under(&root);
    let summary = run(Arc::new(library("1.0")), &root, config()).await;

    assert_eq!(summary.transferred, 0);
    assert_eq!(summary.up_to_date, 3);
    assert_eq!(summary.already_present, 2);
    assert_eq!(summary.failed, 0);
    assert_eq!(files_under(&root), before);
}

#[tokio::test]
async fn new_version_retransfers_only_that_file() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path().join("GoG");

    run(Arc::new(library("1.0")), &root, config()).await;
    let summary = run(Arc::new(library("1.1")), &root, config()).await;

    assert_eq!(summary.transferred, 1);
    assert_eq!(summary.skipped(), 4);
    assert_eq!(read(&root, "Foo - Bar/Windows/.setup_foo.exe.version"), "1.1");
    assert_eq!(read(&root, "Foo - Bar/Windows/setup_foo.exe"), "installer 1.1");
}

#[tokio::test]
async fn interrupted_transfer_leaves_nothing_and_next_run_recovers() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path().join("GoG");

    let mut broken = library("1.0");
    broken.serve(
        "foo-win",
        Payload::BreaksMidStream {
            filename: "setup_foo.exe",
        },
    );
    let broken = Arc::new(broken);
    let summary = run(Arc::clone(&broken), &root, config()).await;

    assert_eq!(summary.failed, 1);
    assert_eq!(summary.transferred, 4);
    assert_eq!(broken.opens("foo-win"), 3);
    assert!(
        files_under(&root)
            .iter()
            .all(|f| !f.starts_with("Foo - Bar/Windows/"))
    );

    let summary = run(Arc::new(library("1.0")), &root, config()).await;
    assert_eq!(summary.transferred, 1);
    assert_eq!(summary.skipped(), 4);
    assert_eq!(read(&root, "Foo - Bar/Windows/setup_foo.exe"), "installer 1.0");
}

#[tokio::test]
async fn retries_are_bounded_and_siblings_unaffected() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path().join("GoG");

    let mut catalog = library("1.0");
    catalog.serve("foo-linux", Payload::Unreachable);
    let catalog = Arc::new(catalog);
    let config = PipelineConfig::new().with_worker(
        WorkerConfig::new()
            .with_max_retries(4)
            .with_retry_delay(Duration::ZERO),
    );

    let summary = run(Arc::clone(&catalog), &root, config).await;

    assert_eq!(catalog.opens("foo-linux"), 4);
    assert_eq!(catalog.opens("foo-win"), 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.transferred, 4);
}

#[tokio::test]
async fn missing_filename_is_not_retried() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path().join("GoG");

    let mut catalog = library("1.0");
    catalog.serve("foo-manual", Payload::NoFilename);
    let catalog = Arc::new(catalog);

    let summary = run(Arc::clone(&catalog), &root, config()).await;

    assert_eq!(catalog.opens("foo-manual"), 1);
    assert_eq!(summary.failed, 1);
    assert!(!root.join("Foo - Bar/Extras").exists());
}

#[tokio::test]
async fn extras_complete_while_an_installer_stalls() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path().join("GoG");

    let mut catalog = library("1.0");
    catalog.serve(
        "foo-win",
        Payload::Stalls {
            filename: "setup_foo.exe",
        },
    );
    let backend: Arc<dyn StorageBackend> = Arc::new(LocalBackend::open(&root).await.unwrap());
    let pipeline = Pipeline::new(
        Arc::new(catalog),
        backend,
        config().with_installer_workers(1),
    );
    let running = tokio::spawn(async move { pipeline.run(CancellationToken::new()).await });

    let manual: PathBuf = root.join("Foo - Bar/Extras/manual.pdf");
    let appeared = tokio::time::timeout(Duration::from_secs(10), async {
        while !manual.exists() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;

    assert!(appeared.is_ok(), "extra was blocked behind the stalled installer");
    assert!(!root.join("Foo - Bar/Windows/setup_foo.exe").exists());
    assert!(!running.is_finished());
    running.abort();
}

#[tokio::test]
async fn cancelled_before_start_discovers_nothing() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path().join("GoG");
    let backend: Arc<dyn StorageBackend> = Arc::new(LocalBackend::open(&root).await.unwrap());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let summary = Pipeline::new(Arc::new(library("1.0")), backend, config())
        .run(cancel)
        .await;

    assert_eq!(summary.total(), 0);
    assert!(files_under(&root).is_empty());
}

#[tokio::test]
async fn failed_marker_write_still_transfers_and_next_run_repeats_it() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path().join("GoG");
    let backend: Arc<dyn StorageBackend> =
        Arc::new(MarkerWritesFail(LocalBackend::open(&root).await.unwrap()));

    let summary = Pipeline::new(Arc::new(library("1.0")), backend, config())
        .run(CancellationToken::new())
        .await;

    assert_eq!(summary.transferred, 5);
    assert_eq!(summary.failed, 0);
    assert_eq!(read(&root, "Foo - Bar/Windows/setup_foo.exe"), "installer 1.0");
    assert!(!root.join("Foo - Bar/Windows/.setup_foo.exe.version").exists());
    assert!(files_under(&root).iter().all(|f| !f.ends_with(".version")));

    // Versioned files had no marker, so they are sent again; the rest exist.
    let catalog = Arc::new(library("1.0"));
    let summary = run(Arc::clone(&catalog), &root, config()).await;
    assert_eq!(summary.transferred, 3);
    assert_eq!(summary.already_present, 2);
    assert_eq!(catalog.opens("foo-win"), 1);
    assert_eq!(read(&root, "Foo - Bar/Windows/.setup_foo.exe.version"), "1.0");
}

#[tokio::test]
async fn downloads_are_paced_by_the_shared_limiter() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path().join("GoG");
    let mut catalog = FakeCatalog::default();
    catalog.serve(
        "big",
        Payload::Bytes {
            filename: "big.bin",
            body: vec![0; 1_500],
        },
    );
    let backend: Arc<dyn StorageBackend> = Arc::new(LocalBackend::open(&root).await.unwrap());
    let worker = TransferWorker::new(backend, Arc::new(catalog), WorkerConfig::new())
        .with_download_limiter(RateLimiter::shared(Some(1_000)));
    let descriptor = FileTransferDescriptor {
        display_name: "big.bin [Linux] [1 MB]".to_string(),
        url: format!("{EMBED}/big"),
        destination: "Big/Linux".to_string(),
        version: None,
        queue: TransferQueue::Installers,
    };

    // One second of burst covers 1000 bytes; the last 500 wait about 0.5s.
    let start = std::time::Instant::now();
    let outcome = worker.process(&descriptor).await;

    assert_eq!(outcome, TransferOutcome::Transferred { bytes: 1_500 });
    assert!(start.elapsed() >= Duration::from_millis(400));
    assert_eq!(read(&root, "Big/Linux/big.bin").len(), 1_500);
}
