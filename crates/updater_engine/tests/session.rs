use std::fs;
use std::io::{Cursor, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use pretty_assertions::assert_eq;
use serde_json::json;
use tempfile::TempDir;
use updater_engine::{
    ErrorKind, ManifestReader, PackageJsonManifest, PackageStore, PersistError, ReqwestTransport,
    SessionConfig, UpdateCallback, UpdateSession, ZipExtractor, DEFAULT_LOG_FILENAME,
    UPDATE_FILENAME,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

type Calls = Arc<Mutex<Vec<(Option<ErrorKind>, Option<String>)>>>;

fn recording_callback() -> (Calls, UpdateCallback) {
    let calls: Calls = Arc::new(Mutex::new(Vec::new()));
    let sink = calls.clone();
    let callback: UpdateCallback = Box::new(move |error, latest| {
        sink.lock()
            .unwrap()
            .push((error, latest.map(ToOwned::to_owned)));
    });
    (calls, callback)
}

fn install_root(version: Option<&str>) -> TempDir {
    let root = tempfile::tempdir().expect("tempdir");
    if let Some(version) = version {
        let manifest = json!({ "name": "demo-app", "version": version });
        fs::write(root.path().join("package.json"), manifest.to_string()).expect("write manifest");
    }
    root
}

fn config_for(root: &TempDir, endpoint: &str) -> SessionConfig {
    SessionConfig::new(root.path()).with_endpoint(endpoint)
}

fn build_zip(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    for (name, content) in entries {
        writer.start_file(*name, options).expect("start entry");
        writer.write_all(content.as_bytes()).expect("write entry");
    }
    writer.finish().expect("finish zip").into_inner()
}

async fn mount_metadata(server: &MockServer, body: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path("/check"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn full_update_run_succeeds_end_to_end() {
    let server = MockServer::start().await;
    let source = format!("{}/u.zip", server.uri());
    mount_metadata(&server, json!({ "last": "1.2.0", "source": source })).await;
    Mock::given(method("GET"))
        .and(path("/u.zip"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            build_zip(&[("app.js", "updated body")]),
            "application/octet-stream",
        ))
        .mount(&server)
        .await;

    let root = install_root(Some("1.0.0"));
    let (calls, callback) = recording_callback();
    let endpoint = format!("{}/check", server.uri());
    let mut session = UpdateSession::new(config_for(&root, &endpoint));

    let outcome = session.check(Some(callback)).await;

    assert!(outcome.is_success());
    assert_eq!(outcome.latest_version.as_deref(), Some("1.2.0"));
    assert_eq!(
        fs::read_to_string(root.path().join("app.js")).unwrap(),
        "updated body"
    );
    assert!(root.path().join(UPDATE_FILENAME).exists());

    let descriptor = session.descriptor();
    assert_eq!(descriptor.latest_version.as_deref(), Some("1.2.0"));
    assert_eq!(descriptor.source_url.as_deref(), Some(source.as_str()));
    assert_eq!(
        descriptor.local_file,
        Some(root.path().join(UPDATE_FILENAME))
    );

    let calls = calls.lock().unwrap();
    assert_eq!(calls.as_slice(), [(None, Some("1.2.0".to_string()))]);

    let log = fs::read_to_string(root.path().join(DEFAULT_LOG_FILENAME)).unwrap();
    assert!(log.contains("Update available: 1.2.0"));
    assert!(log.contains("End of update."));
}

#[tokio::test]
async fn response_without_source_reports_no_update_and_skips_download() {
    let server = MockServer::start().await;
    mount_metadata(&server, json!({ "last": "1.0.0" })).await;

    let root = install_root(Some("1.0.0"));
    let (calls, callback) = recording_callback();
    let endpoint = format!("{}/check", server.uri());
    let mut session = UpdateSession::new(config_for(&root, &endpoint));

    let outcome = session.check(Some(callback)).await;

    assert_eq!(outcome.error, Some(ErrorKind::NoUpdateAvailable));
    assert_eq!(outcome.latest_version.as_deref(), Some("1.0.0"));
    assert_eq!(
        calls.lock().unwrap().as_slice(),
        [(
            Some(ErrorKind::NoUpdateAvailable),
            Some("1.0.0".to_string())
        )]
    );

    // Only the metadata POST reached the server; no download request.
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method.as_str(), "POST");
}

#[tokio::test]
async fn unreachable_endpoint_reports_cannot_connect() {
    let root = install_root(Some("1.0.0"));
    let (calls, callback) = recording_callback();
    // Nothing listens on the discard port.
    let mut session = UpdateSession::new(config_for(&root, "http://127.0.0.1:9/check"));

    let outcome = session.check(Some(callback)).await;

    assert_eq!(outcome.error, Some(ErrorKind::CannotConnectToApi));
    assert_eq!(outcome.latest_version, None);
    assert_eq!(
        calls.lock().unwrap().as_slice(),
        [(Some(ErrorKind::CannotConnectToApi), None)]
    );
}

#[tokio::test]
async fn missing_endpoint_also_reports_cannot_connect() {
    let root = install_root(Some("1.0.0"));
    let mut session = UpdateSession::new(SessionConfig::new(root.path()));

    let outcome = session.check(None).await;

    assert_eq!(outcome.error, Some(ErrorKind::CannotConnectToApi));
}

#[tokio::test]
async fn unparseable_body_reports_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/check"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let root = install_root(Some("1.0.0"));
    let endpoint = format!("{}/check", server.uri());
    let mut session = UpdateSession::new(config_for(&root, &endpoint));

    let outcome = session.check(None).await;

    assert_eq!(outcome.error, Some(ErrorKind::ApiResponseNotValid));
    assert_eq!(outcome.latest_version, None);
}

#[tokio::test]
async fn response_without_last_reports_invalid_response() {
    let server = MockServer::start().await;
    mount_metadata(&server, json!({ "source": "https://example.com/u.zip" })).await;

    let root = install_root(Some("1.0.0"));
    let endpoint = format!("{}/check", server.uri());
    let mut session = UpdateSession::new(config_for(&root, &endpoint));

    let outcome = session.check(None).await;

    assert_eq!(outcome.error, Some(ErrorKind::ApiResponseNotValid));
}

#[tokio::test]
async fn missing_manifest_reports_without_any_network_request() {
    let server = MockServer::start().await;
    mount_metadata(&server, json!({ "last": "1.2.0" })).await;

    let root = install_root(None);
    let (calls, callback) = recording_callback();
    let endpoint = format!("{}/check", server.uri());
    let mut session = UpdateSession::new(config_for(&root, &endpoint));

    let outcome = session.check(Some(callback)).await;

    assert_eq!(outcome.error, Some(ErrorKind::VersionNotSpecified));
    assert_eq!(outcome.latest_version, None);
    assert_eq!(
        calls.lock().unwrap().as_slice(),
        [(Some(ErrorKind::VersionNotSpecified), None)]
    );
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn empty_manifest_version_reports_without_any_network_request() {
    let server = MockServer::start().await;
    mount_metadata(&server, json!({ "last": "1.2.0" })).await;

    let root = install_root(Some("  "));
    let endpoint = format!("{}/check", server.uri());
    let mut session = UpdateSession::new(config_for(&root, &endpoint));

    let outcome = session.check(None).await;

    assert_eq!(outcome.error, Some(ErrorKind::VersionNotSpecified));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn missing_package_reports_update_file_not_found() {
    let server = MockServer::start().await;
    let source = format!("{}/u.zip", server.uri());
    mount_metadata(&server, json!({ "last": "1.2.0", "source": source })).await;
    // No GET mock: the download comes back 404.

    let root = install_root(Some("1.0.0"));
    let endpoint = format!("{}/check", server.uri());
    let mut session = UpdateSession::new(config_for(&root, &endpoint));

    let outcome = session.check(None).await;

    assert_eq!(outcome.error, Some(ErrorKind::UpdateFileNotFound));
    assert_eq!(outcome.latest_version.as_deref(), Some("1.2.0"));
}

struct FailingStore;

impl PackageStore for FailingStore {
    fn store(&self, _filename: &str, _bytes: &[u8]) -> Result<PathBuf, PersistError> {
        Err(PersistError::InstallDir("disk full".into()))
    }
}

#[tokio::test]
async fn write_failure_reports_failed_download_with_latest_version() {
    let server = MockServer::start().await;
    let source = format!("{}/u.zip", server.uri());
    mount_metadata(&server, json!({ "last": "1.2.0", "source": source })).await;
    Mock::given(method("GET"))
        .and(path("/u.zip"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            build_zip(&[("app.js", "updated body")]),
            "application/octet-stream",
        ))
        .mount(&server)
        .await;

    let root = install_root(Some("1.0.0"));
    let (calls, callback) = recording_callback();
    let endpoint = format!("{}/check", server.uri());
    let config = config_for(&root, &endpoint);
    let manifest = Box::new(PackageJsonManifest::new(config.install_dir.clone()));
    let mut session = UpdateSession::with_parts(
        config,
        Box::new(ReqwestTransport),
        Box::new(FailingStore),
        Box::new(ZipExtractor),
        manifest,
    );

    let outcome = session.check(Some(callback)).await;

    assert_eq!(outcome.error, Some(ErrorKind::FailedToDownloadUpdate));
    assert_eq!(outcome.latest_version.as_deref(), Some("1.2.0"));
    assert_eq!(
        calls.lock().unwrap().as_slice(),
        [(
            Some(ErrorKind::FailedToDownloadUpdate),
            Some("1.2.0".to_string())
        )]
    );
}

#[tokio::test]
async fn corrupt_archive_reports_failed_apply_and_keeps_staged_file() {
    let server = MockServer::start().await;
    let source = format!("{}/u.zip", server.uri());
    mount_metadata(&server, json!({ "last": "1.2.0", "source": source })).await;
    Mock::given(method("GET"))
        .and(path("/u.zip"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(&b"definitely not a zip"[..], "application/octet-stream"),
        )
        .mount(&server)
        .await;

    let root = install_root(Some("1.0.0"));
    let (calls, callback) = recording_callback();
    let endpoint = format!("{}/check", server.uri());
    let mut session = UpdateSession::new(config_for(&root, &endpoint));

    let outcome = session.check(Some(callback)).await;

    assert_eq!(outcome.error, Some(ErrorKind::FailedToApplyUpdate));
    assert_eq!(outcome.latest_version.as_deref(), Some("1.2.0"));
    assert_eq!(
        calls.lock().unwrap().as_slice(),
        [(
            Some(ErrorKind::FailedToApplyUpdate),
            Some("1.2.0".to_string())
        )]
    );
    // The staged file survives the failed apply for inspection.
    assert!(root.path().join(UPDATE_FILENAME).exists());
    assert_eq!(
        session.descriptor().local_file,
        Some(root.path().join(UPDATE_FILENAME))
    );
}

#[tokio::test]
async fn call_time_callback_persists_for_subsequent_runs() {
    let server = MockServer::start().await;
    mount_metadata(&server, json!({ "last": "1.0.0" })).await;

    let root = install_root(Some("1.0.0"));
    let (calls, callback) = recording_callback();
    let endpoint = format!("{}/check", server.uri());
    let mut session = UpdateSession::new(config_for(&root, &endpoint));

    session.check(Some(callback)).await;
    session.check(None).await;

    // Exactly one invocation per run, on the callback set at call time.
    assert_eq!(calls.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn manifest_reader_trims_the_version_field() {
    let root = install_root(Some(" 1.0.0 "));
    let manifest = PackageJsonManifest::new(root.path().to_path_buf());
    assert_eq!(manifest.local_version().as_deref(), Some("1.0.0"));
}
