//! Whole-pipeline deploys against the mock backend: filter, encode, upload,
//! sign, ingest, cleanup.

use httpmock::Method::{DELETE, GET, POST, PUT};
use httpmock::MockServer;

use siteship::deploy::manifest::{self, DeployManifest};
use siteship::deploy::{deploy_folder, DeployOutcome};
use siteship::error::ShipError;

use crate::fixture::{AzureFixture, DeployFolder};

struct PipelineMocks<'a> {
    create: Option<httpmock::Mock<'a>>,
    get: Option<httpmock::Mock<'a>>,
    upload: httpmock::Mock<'a>,
    key: httpmock::Mock<'a>,
    ingest: httpmock::Mock<'a>,
    cleanup: httpmock::Mock<'a>,
}

/// Register the full mock surface one deploy needs. `ingest_status` controls
/// the zipdeploy answer so failure paths reuse the same setup.
fn mock_pipeline<'a>(
    az: &'a AzureFixture,
    slug: &str,
    first_deploy: bool,
    ingest_status: u16,
) -> PipelineMocks<'a> {
    let server: &MockServer = &az.server;

    let create = first_deploy.then(|| {
        server.mock(|when, then| {
            when.method(PUT).path(az.site_path(slug));
            then.status(200)
                .json_body(az.site_body(slug, "My App", "The demo app"));
        })
    });
    let get = (!first_deploy).then(|| {
        server.mock(|when, then| {
            when.method(GET).path(az.site_path(slug));
            then.status(200)
                .json_body(az.site_body(slug, "My App", "The demo app"));
        })
    });

    let upload = server.mock(|when, then| {
        when.method(PUT)
            .path_includes("/app-content/_deploy-temp/")
            .header("x-ms-blob-type", "BlockBlob");
        then.status(201);
    });
    let key = server.mock(|when, then| {
        when.method(POST)
            .query_param("restype", "service")
            .query_param("comp", "userdelegationkey");
        then.status(200)
            .header("content-type", "application/xml")
            .body(az.delegation_key_xml());
    });
    let ingest = server.mock(move |when, then| {
        when.method(POST)
            .path_includes("/zipdeploy")
            .body_includes("\"provider\":\"siteship\"");
        if ingest_status < 400 {
            then.status(ingest_status);
        } else {
            then.status(ingest_status).json_body(serde_json::json!({
                "error": { "code": "DeploymentFailed", "message": "could not fetch content" },
            }));
        }
    });
    let cleanup = server.mock(|when, then| {
        when.method(DELETE).path_includes("/app-content/_deploy-temp/");
        then.status(202);
    });

    PipelineMocks {
        create,
        get,
        upload,
        key,
        ingest,
        cleanup,
    }
}

#[test]
fn first_deploy_runs_the_full_pipeline_and_writes_the_manifest() {
    let az = AzureFixture::new();
    let folder = DeployFolder::new()
        .file("index.html", b"<html><body>hello</body></html>")
        .file("styles.css", b"body { margin: 0; }")
        .file(".env", b"SECRET=1");
    let mocks = mock_pipeline(&az, "my-app", true, 202);

    let outcome: DeployOutcome = deploy_folder(
        &az.config,
        "arm-token",
        "storage-token",
        folder.path(),
        Some("My App"),
        Some("The demo app"),
    )
    .unwrap();

    mocks.create.as_ref().unwrap().assert();
    mocks.upload.assert();
    mocks.key.assert();
    mocks.ingest.assert();
    mocks.cleanup.assert();

    assert!(outcome.created);
    assert_eq!(outcome.slug, "my-app");
    assert_eq!(outcome.url, "https://my-app.azurestaticapps.net");
    assert_eq!(outcome.resource_id, az.site_path("my-app"));
    // .env is on the deny list, so only two files ship.
    assert_eq!(outcome.file_count, 2);
    assert!(outcome.archive_bytes > 0);

    let written = manifest::read_manifest(folder.path()).unwrap().unwrap();
    assert_eq!(written.app_slug, "my-app");
    assert_eq!(written.app_name, "My App");
    assert_eq!(written.app_description, "The demo app");
    assert_eq!(written.resource_id, az.site_path("my-app"));
}

#[test]
fn ingestion_failure_still_cleans_up_and_writes_no_manifest() {
    let az = AzureFixture::new();
    let folder = DeployFolder::new().file("index.html", b"<html>");
    let mocks = mock_pipeline(&az, "my-app", true, 500);

    let err = deploy_folder(
        &az.config,
        "arm-token",
        "storage-token",
        folder.path(),
        Some("My App"),
        Some("The demo app"),
    )
    .unwrap_err();

    match err {
        ShipError::Ingestion { status, code, .. } => {
            assert_eq!(status, 500);
            assert_eq!(code, "DeploymentFailed");
        }
        other => panic!("expected an ingestion error, got {other:?}"),
    }

    // The temp blob is removed even though the deploy failed.
    mocks.upload.assert();
    mocks.cleanup.assert();
    assert!(!folder.path().join(manifest::MANIFEST_NAME).exists());
}

#[test]
fn failed_upload_skips_signing_ingestion_and_cleanup() {
    let az = AzureFixture::new();
    let folder = DeployFolder::new().file("index.html", b"<html>");

    az.server.mock(|when, then| {
        when.method(PUT).path(az.site_path("my-app"));
        then.status(200)
            .json_body(az.site_body("my-app", "My App", "The demo app"));
    });
    az.server.mock(|when, then| {
        when.method(PUT).path_includes("/app-content/_deploy-temp/");
        then.status(403).body("no write access");
    });
    let key = az.server.mock(|when, then| {
        when.method(POST).query_param("comp", "userdelegationkey");
        then.status(200).body(az.delegation_key_xml());
    });
    let cleanup = az.server.mock(|when, then| {
        when.method(DELETE).path_includes("/app-content/_deploy-temp/");
        then.status(202);
    });

    let err = deploy_folder(
        &az.config,
        "arm-token",
        "storage-token",
        folder.path(),
        Some("My App"),
        Some("The demo app"),
    )
    .unwrap_err();

    assert!(matches!(err, ShipError::Upload { status: 403, .. }));
    // Nothing was uploaded, so there is nothing to sign or delete.
    key.assert_hits(0);
    cleanup.assert_hits(0);
}

#[test]
fn redeploy_reads_the_manifest_and_skips_creation() {
    let az = AzureFixture::new();
    let folder = DeployFolder::new().file("index.html", b"<html>v2</html>");
    let original = DeployManifest {
        app_slug: "my-app".to_string(),
        app_name: "My App".to_string(),
        app_description: "The demo app".to_string(),
        resource_id: az.site_path("my-app"),
    };
    manifest::write_manifest(folder.path(), &original).unwrap();

    let mocks = mock_pipeline(&az, "my-app", false, 200);

    // No name or description needed the second time around.
    let outcome = deploy_folder(
        &az.config,
        "arm-token",
        "storage-token",
        folder.path(),
        None,
        None,
    )
    .unwrap();

    mocks.get.as_ref().unwrap().assert();
    mocks.ingest.assert();
    mocks.cleanup.assert();

    assert!(!outcome.created);
    assert_eq!(outcome.slug, "my-app");
    // The manifest itself never ships.
    assert_eq!(outcome.file_count, 1);
    assert_eq!(
        manifest::read_manifest(folder.path()).unwrap().unwrap(),
        original
    );
}

#[test]
fn signed_url_handed_to_ingestion_covers_the_uploaded_blob() {
    let az = AzureFixture::new();
    let folder = DeployFolder::new().file("index.html", b"<html>");

    az.server.mock(|when, then| {
        when.method(PUT).path(az.site_path("my-app"));
        then.status(200)
            .json_body(az.site_body("my-app", "My App", "The demo app"));
    });
    az.server.mock(|when, then| {
        when.method(PUT).path_includes("/app-content/_deploy-temp/");
        then.status(201);
    });
    az.server.mock(|when, then| {
        when.method(POST).query_param("comp", "userdelegationkey");
        then.status(200).body(az.delegation_key_xml());
    });
    az.server.mock(|when, then| {
        when.method(DELETE).path_includes("/app-content/_deploy-temp/");
        then.status(202);
    });
    // The ingestion call must carry a read-only SAS URL for the temp blob.
    let ingest = az.server.mock(|when, then| {
        when.method(POST)
            .path_includes("/zipdeploy")
            .body_includes("/app-content/_deploy-temp/")
            .body_includes("sp=r")
            .body_includes("sr=b")
            .body_includes("&sig=");
        then.status(202);
    });

    deploy_folder(
        &az.config,
        "arm-token",
        "storage-token",
        folder.path(),
        Some("My App"),
        Some("The demo app"),
    )
    .unwrap();

    ingest.assert();
}
