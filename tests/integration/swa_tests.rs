//! Static Web Apps control-plane calls against the mock ARM endpoint.

use httpmock::Method::{DELETE, GET, POST, PUT};
use serde_json::json;

use siteship::azure::SwaClient;
use siteship::error::ShipError;

use crate::fixture::AzureFixture;

fn arm_error(code: &str, message: &str) -> serde_json::Value {
    json!({ "error": { "code": code, "message": message } })
}

#[test]
fn create_puts_tags_and_parses_the_resource() {
    let az = AzureFixture::new();
    let create_mock = az.server.mock(|when, then| {
        when.method(PUT)
            .path(az.site_path("my-app"))
            .query_param("api-version", "2022-09-01")
            .header("authorization", "Bearer arm-token")
            .body_includes("\"appName\":\"My App\"")
            .body_includes("\"appDescription\":\"A demo\"");
        then.status(200)
            .json_body(az.site_body("my-app", "My App", "A demo"));
    });

    let swa = SwaClient::new(&az.config, "arm-token");
    let site = swa.create("my-app", "My App", "A demo").unwrap();

    create_mock.assert();
    assert_eq!(site.name, "my-app");
    assert_eq!(site.display_name(), "My App");
    assert_eq!(site.description(), "A demo");
    assert_eq!(site.url(), "https://my-app.azurestaticapps.net");
}

#[test]
fn get_maps_resource_not_found_to_a_missing_app() {
    let az = AzureFixture::new();
    az.server.mock(|when, then| {
        when.method(GET).path(az.site_path("ghost-app"));
        then.status(404)
            .json_body(arm_error("ResourceNotFound", "no such site"));
    });
    az.server.mock(|when, then| {
        when.method(GET).path(az.site_path("other-app"));
        then.status(404)
            .json_body(arm_error("ResourceGroupNotFound", "no such group"));
    });

    let swa = SwaClient::new(&az.config, "arm-token");

    let err = swa.get("ghost-app").unwrap_err();
    assert!(matches!(err, ShipError::NotFound(_)));
    assert!(err.to_string().contains("ghost-app"));

    // A 404 for any other reason keeps the raw ARM error.
    let err = swa.get("other-app").unwrap_err();
    assert!(matches!(err, ShipError::Api { status: 404, .. }));
}

#[test]
fn list_unwraps_the_value_collection() {
    let az = AzureFixture::new();
    let list_mock = az.server.mock(|when, then| {
        when.method(GET)
            .path(format!(
                "/subscriptions/{}/resourceGroups/{}/providers/Microsoft.Web/staticSites",
                crate::fixture::SUBSCRIPTION_ID,
                crate::fixture::RESOURCE_GROUP
            ))
            .query_param("api-version", "2022-09-01");
        then.status(200).json_body(json!({
            "value": [
                az.site_body("alpha", "Alpha", ""),
                az.site_body("beta", "Beta", "Second app"),
            ],
        }));
    });

    let swa = SwaClient::new(&az.config, "arm-token");
    let sites = swa.list().unwrap();

    list_mock.assert();
    assert_eq!(sites.len(), 2);
    assert_eq!(sites[0].name, "alpha");
    assert_eq!(sites[1].description(), "Second app");
}

#[test]
fn delete_accepts_an_async_response() {
    let az = AzureFixture::new();
    let delete_mock = az.server.mock(|when, then| {
        when.method(DELETE).path(az.site_path("my-app"));
        then.status(202);
    });

    let swa = SwaClient::new(&az.config, "arm-token");
    swa.delete("my-app").unwrap();
    delete_mock.assert();
}

#[test]
fn deployment_token_reads_the_secret() {
    let az = AzureFixture::new();
    let secrets_mock = az.server.mock(|when, then| {
        when.method(POST)
            .path(format!("{}/listSecrets", az.site_path("my-app")));
        then.status(200)
            .json_body(json!({ "properties": { "apiKey": "deploy-token-xyz" } }));
    });

    let swa = SwaClient::new(&az.config, "arm-token");
    let token = swa.deployment_token("my-app").unwrap();

    secrets_mock.assert();
    assert_eq!(token, "deploy-token-xyz");
}

#[test]
fn zip_deploy_treats_accepted_as_success() {
    let az = AzureFixture::new();
    let deploy_mock = az.server.mock(|when, then| {
        when.method(POST)
            .path(format!("{}/zipdeploy", az.site_path("my-app")))
            .query_param("api-version", "2024-04-01")
            .body_includes("\"appZipUrl\":\"https://signed.example/archive.zip\"")
            .body_includes("\"provider\":\"siteship\"");
        then.status(202);
    });

    let swa = SwaClient::new(&az.config, "arm-token");
    swa.zip_deploy("my-app", "https://signed.example/archive.zip")
        .unwrap();
    deploy_mock.assert();
}

#[test]
fn zip_deploy_failure_is_an_ingestion_error() {
    let az = AzureFixture::new();
    az.server.mock(|when, then| {
        when.method(POST)
            .path(format!("{}/zipdeploy", az.site_path("my-app")));
        then.status(500)
            .json_body(arm_error("DeploymentFailed", "content pull failed"));
    });

    let swa = SwaClient::new(&az.config, "arm-token");
    let err = swa.zip_deploy("my-app", "https://signed.example/a.zip").unwrap_err();

    match err {
        ShipError::Ingestion { status, code, message } => {
            assert_eq!(status, 500);
            assert_eq!(code, "DeploymentFailed");
            assert_eq!(message, "content pull failed");
        }
        other => panic!("expected an ingestion error, got {other:?}"),
    }
}
