fn main() {
    println!("Run `cargo test -p wire-compat` to execute wire compatibility tests.");
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use filedock_offline_cache::{CacheEntry, CacheNamespace, CacheStore, MemoryCacheStore, OfflineRetriever};
    use filedock_protocol::{
        CommitUploadRequest, FileMetadata, GenerateUploadLinkRequest, GenerateUploadLinkResponse,
        WorkerMessage,
    };
    use filedock_transfer::{ChunkPlan, block_list_xml};

    /// Returns the path to the fixtures directory.
    fn fixtures_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
    }

    fn read_fixture(name: &str) -> String {
        let path = fixtures_dir().join(name);
        fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()))
    }

    /// Loads a fixture JSON file and returns it as a `serde_json::Value`.
    fn load_fixture(name: &str) -> serde_json::Value {
        serde_json::from_str(&read_fixture(name))
            .unwrap_or_else(|e| panic!("failed to parse fixture {name}: {e}"))
    }

    /// Deserializes a fixture into a Rust type, re-serializes it, and compares
    /// the JSON values (order-independent).
    fn roundtrip_test<T>(name: &str) -> T
    where
        T: serde::de::DeserializeOwned + serde::Serialize,
    {
        let fixture = load_fixture(name);
        let parsed: T = serde_json::from_value(fixture.clone())
            .unwrap_or_else(|e| panic!("failed to deserialize {name}: {e}"));
        let reserialized = serde_json::to_value(&parsed)
            .unwrap_or_else(|e| panic!("failed to re-serialize {name}: {e}"));

        assert_eq!(
            fixture, reserialized,
            "roundtrip mismatch for {name}:\n  wire: {fixture}\n  rust: {reserialized}"
        );
        parsed
    }

    // --- Backend contract ---

    #[test]
    fn fixture_generate_upload_link_request() {
        let req: GenerateUploadLinkRequest = roundtrip_test("generate_upload_link_request.json");
        assert_eq!(req.expected_size, 10_485_760);
    }

    #[test]
    fn fixture_generate_upload_link_request_root_folder() {
        let req: GenerateUploadLinkRequest =
            roundtrip_test("generate_upload_link_request_root.json");
        assert!(req.folder_id.is_none());
    }

    #[test]
    fn fixture_generate_upload_link_response() {
        let resp: GenerateUploadLinkResponse = roundtrip_test("generate_upload_link_response.json");
        assert!(resp.upload_url.contains('?'));
    }

    #[test]
    fn fixture_commit_upload_request() {
        let req: CommitUploadRequest = roundtrip_test("commit_upload_request.json");
        assert_eq!(req.checksum.len(), 24);
    }

    #[test]
    fn fixture_file_metadata() {
        let meta: FileMetadata = roundtrip_test("file_metadata.json");
        assert_eq!(meta.download_url, "https://store.example/files/abc?sig=1");
    }

    // --- Worker ---

    #[test]
    fn fixture_worker_skip_waiting() {
        let msg: WorkerMessage = roundtrip_test("worker_skip_waiting.json");
        assert_eq!(msg, WorkerMessage::SkipWaiting);
    }

    #[test]
    fn fixture_cache_entry() {
        let entry: CacheEntry = roundtrip_test("cache_entry.json");
        assert!(entry.response.is_opaque());
        assert_eq!(entry.response.body, b"%PDF-1.7");
    }

    /// The persisted entry plus the metadata fixture are enough to rebuild
    /// the file offline.
    #[test]
    fn fixtures_compose_into_offline_file() {
        let entry: CacheEntry = serde_json::from_value(load_fixture("cache_entry.json")).unwrap();
        let metadata = read_fixture("file_metadata.json");

        let store = std::sync::Arc::new(MemoryCacheStore::new());
        store.put(CacheNamespace::BlobContent, entry).unwrap();
        store
            .put(
                CacheNamespace::Metadata,
                CacheEntry::new(
                    "https://app.example/api/file/abc",
                    filedock_offline_cache::Response::new(200, metadata.into_bytes()),
                    chrono::Utc::now(),
                ),
            )
            .unwrap();

        let file = OfflineRetriever::new(store).retrieve_offline("abc").unwrap();
        assert_eq!(file.suggested_file_name, "quarterly-report.pdf");
        assert_eq!(file.blob, b"%PDF-1.7");
    }

    // --- Storage ---

    #[test]
    fn fixture_block_list_three_chunks() {
        let plan = ChunkPlan::for_size(10 * 1024 * 1024);
        let xml = block_list_xml(&plan.block_ids());
        assert_eq!(xml, read_fixture("block_list_three_chunks.xml"));
    }
}
