mod config;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use filedock_http::{HttpBackend, HttpNetwork, HttpStorage};
use filedock_offline_cache::{
    DiskCacheStore, OfflineRetriever, OfflineWorker, Request, SystemClock,
};
use filedock_protocol::WorkerMessage;
use filedock_transfer::{FileSource, LocalFile, TransferState};
use filedock_upload::{UploadCoordinator, UploadEvent};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::FiledockConfig;

#[derive(Parser, Debug)]
#[command(name = "filedock", version)]
#[command(about = "Upload files and read them back through the offline cache")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Commands {
    /// Upload a file, optionally into a folder.
    Upload {
        path: PathBuf,
        folder_id: Option<String>,
    },
    /// Fetch a URL through the offline cache.
    Fetch { url: String },
    /// Rebuild a cached file into OUT (a file, or a directory to write into).
    Retrieve { file_id: String, out: PathBuf },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = FiledockConfig::load().context("loading configuration")?;
    info!(version = env!("CARGO_PKG_VERSION"), "starting filedock");

    match cli.command {
        Commands::Upload { path, folder_id } => upload(&config, &path, folder_id.as_deref()).await,
        Commands::Fetch { url } => fetch(&config, &url).await,
        Commands::Retrieve { file_id, out } => retrieve(&config, &file_id, &out),
    }
}

async fn upload(config: &FiledockConfig, path: &Path, folder_id: Option<&str>) -> anyhow::Result<()> {
    let backend = HttpBackend::new(&config.api_base_url, config.auth_token())?;
    let storage = HttpStorage::new()?;
    let file: Arc<dyn FileSource> =
        Arc::new(LocalFile::open(path).with_context(|| format!("opening {}", path.display()))?);

    let (events_tx, mut events_rx) = mpsc::channel(64);
    let progress = tokio::spawn(async move {
        while let Some(event) = events_rx.recv().await {
            match event {
                UploadEvent::Transfer(TransferState::AwaitingChunk { index, total }) => {
                    info!(index, total, "uploading block");
                }
                UploadEvent::Transfer(TransferState::AwaitingFinalize { blocks }) => {
                    info!(blocks, "committing block list");
                }
                UploadEvent::ChecksumComputed { checksum } => info!(%checksum, "checksum computed"),
                _ => {}
            }
        }
    });

    let coordinator = UploadCoordinator::new(&backend, &storage).with_events(events_tx);
    let result = coordinator.upload_file(file, folder_id).await;
    drop(coordinator);
    let _ = progress.await;

    let committed = result?;
    println!(
        "uploaded {} ({} bytes, {:?}) as {}",
        path.display(),
        committed.size,
        committed.strategy,
        committed.file_id
    );
    Ok(())
}

fn open_store(config: &FiledockConfig) -> anyhow::Result<Arc<DiskCacheStore>> {
    let root = config.cache_root();
    let store = DiskCacheStore::open(&root)
        .with_context(|| format!("opening cache at {}", root.display()))?;
    Ok(Arc::new(store))
}

async fn fetch(config: &FiledockConfig, url: &str) -> anyhow::Result<()> {
    let mut network = HttpNetwork::new()?;
    if let Some(token) = config.auth_token() {
        network = network.with_bearer_for(&config.app_origin, token);
    }

    let worker = OfflineWorker::new(
        config.router_config(),
        open_store(config)?,
        Arc::new(network),
        Arc::new(SystemClock),
    );
    // A one-shot process has no previous version to wait for.
    worker.handle_message(WorkerMessage::SkipWaiting);
    if let Err(e) = worker.install().await {
        warn!(error = %e, "app shell not cached; requests will bypass the cache");
    }

    let outcome = worker.handle_fetch(Request::get(url)).await?;
    if let Some(refresh) = outcome.revalidation {
        let _ = refresh.await;
    }
    println!(
        "{} {} bytes from {:?}",
        outcome.response.status,
        outcome.response.body.len(),
        outcome.source
    );
    Ok(())
}

fn retrieve(config: &FiledockConfig, file_id: &str, out: &Path) -> anyhow::Result<()> {
    let retriever = OfflineRetriever::new(open_store(config)?);
    let file = retriever.retrieve_offline(file_id)?;

    let target = if out.is_dir() {
        out.join(output_file_name(&file.suggested_file_name, file_id))
    } else {
        out.to_path_buf()
    };
    std::fs::write(&target, &file.blob).with_context(|| format!("writing {}", target.display()))?;
    println!("wrote {} ({} bytes)", target.display(), file.blob.len());
    Ok(())
}

/// Last path component of the cached file name, or `file_id` when that
/// leaves nothing usable. Cached metadata decides the name, so it must not
/// steer the write outside the chosen directory.
fn output_file_name(suggested: &str, file_id: &str) -> String {
    match suggested.rsplit(['/', '\\']).next() {
        Some(name) if !name.is_empty() && name != "." && name != ".." => name.to_string(),
        _ => file_id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Result<Commands, clap::Error> {
        Cli::try_parse_from(std::iter::once("filedock").chain(argv.iter().copied())).map(|cli| cli.command)
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_upload() {
        assert_eq!(
            parse(&["upload", "a.bin"]).unwrap(),
            Commands::Upload {
                path: PathBuf::from("a.bin"),
                folder_id: None
            }
        );
        assert_eq!(
            parse(&["upload", "a.bin", "f9"]).unwrap(),
            Commands::Upload {
                path: PathBuf::from("a.bin"),
                folder_id: Some("f9".into())
            }
        );
    }

    #[test]
    fn parse_fetch_and_retrieve() {
        assert_eq!(
            parse(&["fetch", "https://x/y"]).unwrap(),
            Commands::Fetch {
                url: "https://x/y".into()
            }
        );
        assert_eq!(
            parse(&["retrieve", "abc", "out"]).unwrap(),
            Commands::Retrieve {
                file_id: "abc".into(),
                out: PathBuf::from("out")
            }
        );
    }

    #[test]
    fn parse_help_and_errors() {
        use clap::error::ErrorKind;
        assert_eq!(parse(&["--help"]).unwrap_err().kind(), ErrorKind::DisplayHelp);
        assert!(parse(&[]).is_err());
        assert!(parse(&["upload"]).is_err());
        assert!(parse(&["delete", "x"]).is_err());
    }

    #[test]
    fn output_name_keeps_last_component() {
        assert_eq!(output_file_name("notes.txt", "abc"), "notes.txt");
        assert_eq!(output_file_name("../escaped.txt", "abc"), "escaped.txt");
        assert_eq!(output_file_name("/etc/passwd", "abc"), "passwd");
        assert_eq!(output_file_name("..\\..\\boot.ini", "abc"), "boot.ini");
        assert_eq!(output_file_name("..", "abc"), "abc");
        assert_eq!(output_file_name("dir/", "abc"), "abc");
        assert_eq!(output_file_name("", "abc"), "abc");
    }

    #[test]
    fn retrieve_writes_into_directory() {
        use filedock_offline_cache::{CacheEntry, CacheNamespace, CacheStore, Clock, Response};

        let tmp = tempfile::tempdir().unwrap();
        let config = FiledockConfig {
            cache_dir: tmp.path().join("cache").to_string_lossy().into_owned(),
            ..FiledockConfig::default()
        };
        let store = open_store(&config).unwrap();
        let now = SystemClock.now();
        store
            .put(
                CacheNamespace::Metadata,
                CacheEntry::new(
                    "http://localhost:8080/api/file/abc",
                    Response::new(
                        200,
                        br#"{"fileName":"notes.txt","downloadUrl":"http://localhost:10000/c/abc?sig=1"}"#.to_vec(),
                    ),
                    now,
                ),
            )
            .unwrap();
        store
            .put(
                CacheNamespace::BlobContent,
                CacheEntry::new("http://localhost:10000/c/abc", Response::new(200, b"hi".to_vec()), now),
            )
            .unwrap();

        let out = tmp.path().join("out");
        std::fs::create_dir_all(&out).unwrap();
        retrieve(&config, "abc", &out).unwrap();
        assert_eq!(std::fs::read(out.join("notes.txt")).unwrap(), b"hi");
    }

    #[test]
    fn retrieve_stays_inside_directory() {
        use filedock_offline_cache::{CacheEntry, CacheNamespace, CacheStore, Clock, Response};

        let tmp = tempfile::tempdir().unwrap();
        let config = FiledockConfig {
            cache_dir: tmp.path().join("cache").to_string_lossy().into_owned(),
            ..FiledockConfig::default()
        };
        let store = open_store(&config).unwrap();
        let now = SystemClock.now();
        store
            .put(
                CacheNamespace::Metadata,
                CacheEntry::new(
                    "http://localhost:8080/api/file/abc",
                    Response::new(
                        200,
                        br#"{"fileName":"../escaped.txt","downloadUrl":"http://localhost:10000/c/abc?sig=1"}"#.to_vec(),
                    ),
                    now,
                ),
            )
            .unwrap();
        store
            .put(
                CacheNamespace::BlobContent,
                CacheEntry::new("http://localhost:10000/c/abc", Response::new(200, b"hi".to_vec()), now),
            )
            .unwrap();

        let out = tmp.path().join("out");
        std::fs::create_dir_all(&out).unwrap();
        retrieve(&config, "abc", &out).unwrap();

        assert!(!tmp.path().join("escaped.txt").exists());
        assert_eq!(std::fs::read(out.join("escaped.txt")).unwrap(), b"hi");
    }
}
