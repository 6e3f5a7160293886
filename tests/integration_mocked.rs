/// Integration tests with mocked upstream providers
/// Drives the real router end to end without hitting external services
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::FixedOffset;
use rust_player_api::config::Config;
use rust_player_api::handlers::{self, AppState};
use rust_player_api::integrations::providers::ProviderClient;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Helper function to create test config
fn create_test_config(primary: String, secondary: String) -> Config {
    Config {
        port: 0,
        extra_ports: vec![],
        primary_provider_url: primary,
        secondary_provider_url: secondary,
        outfit_image_url: "https://outfit.test".to_string(),
        banner_image_url: "https://banner.test".to_string(),
        upstream_timeout_secs: 2,
        default_region: "bd".to_string(),
        display_utc_offset: FixedOffset::east_opt(0),
        static_dir: "public".to_string(),
        provider_cache_ttl_secs: 0,
        rate_limit_replenish_ms: 100,
        rate_limit_burst: 20,
    }
}

fn test_app(config: Config) -> Router {
    let state = Arc::new(AppState::new(config).unwrap());
    handlers::app(state, handlers::player_routes())
}

async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn primary_body() -> Value {
    json!({
        "data": {
            "player_info": {
                "nikname": "ShadowFox",
                "level": 40,
                "region": "BD",
                "last_login": "Jun 1, 2025, 08:00"
            },
            "petInfo": {"name": "Falco"},
            "guildInfo": {"name": "NightOwls"}
        }
    })
}

fn secondary_body() -> Value {
    json!({
        "player_info": {
            "basicInfo": {
                "nickname": "Other",
                "level": 99,
                "createAt": 1672912320,
                "weaponSkinShows": ["AK_GOLD", "AWM_RED"]
            },
            "captainBasicInfo": {"nickname": "CaptainRex", "lastLoginAt": 1672912320},
            "socialInfo": {"language": "Language_EN"}
        }
    })
}

#[tokio::test]
async fn test_both_providers_reconciled() {
    let primary = MockServer::start().await;
    let secondary = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/info"))
        .and(query_param("uid", "12345678"))
        .respond_with(ResponseTemplate::new(200).set_body_json(primary_body()))
        .expect(1)
        .mount(&primary)
        .await;

    Mock::given(method("GET"))
        .and(path("/player-info"))
        .and(query_param("uid", "12345678"))
        .and(query_param("region", "br"))
        .respond_with(ResponseTemplate::new(200).set_body_json(secondary_body()))
        .expect(1)
        .mount(&secondary)
        .await;

    let app = test_app(create_test_config(primary.uri(), secondary.uri()));
    let (status, body) = get(app, "/api/player-info?uid=12345678&region=BR").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["basic"]["nickname"], "ShadowFox");
    assert_eq!(body["basic"]["uid"], "12345678");
    assert_eq!(body["basic"]["level"], 40);
    assert_eq!(body["basic"]["region"], "BD");
    assert_eq!(body["basic"]["lastLogin"], "Jun 1, 2025, 08:00");
    assert_eq!(body["basic"]["accountCreated"], "Jan 5, 2023, 09:52");
    assert_eq!(body["pet"]["name"], "Falco");
    assert_eq!(body["guild"]["name"], "NightOwls");
    assert_eq!(body["captain"]["nickname"], "CaptainRex");
    assert_eq!(body["captain"]["lastLogin"], "Jan 5, 2023, 09:52");
    assert_eq!(body["social"]["language"], "Language_EN");
    assert_eq!(body["weapons"]["skins"], "AK_GOLD, AWM_RED");
    assert_eq!(
        body["images"]["outfitUrl"],
        "https://outfit.test/generate-profile?uid=12345678&region=br"
    );
    assert_eq!(
        body["images"]["bannerUrl"],
        "https://banner.test/banner-image?uid=12345678&region=br"
    );
    assert_eq!(body["metadata"]["apiVersion"], "2.0");
}

#[tokio::test]
async fn test_failed_provider_degrades_to_placeholders() {
    let primary = MockServer::start().await;
    let secondary = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/info"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&primary)
        .await;

    Mock::given(method("GET"))
        .and(path("/player-info"))
        .respond_with(ResponseTemplate::new(200).set_body_json(secondary_body()))
        .mount(&secondary)
        .await;

    let app = test_app(create_test_config(primary.uri(), secondary.uri()));
    let (status, body) = get(app, "/api/player-info?uid=12345678").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["basic"]["nickname"], "Other");
    assert_eq!(body["basic"]["level"], 99);
    // region falls back to the default request region, uppercased
    assert_eq!(body["basic"]["region"], "BD");
    assert_eq!(body["basic"]["signature"], "None");
    assert_eq!(body["pet"]["name"], "None");
    assert_eq!(body["appearance"]["badgeCount"], "-");
}

#[tokio::test]
async fn test_timeout_degrades_like_failure() {
    let primary = MockServer::start().await;
    let secondary = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/info"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(primary_body())
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&primary)
        .await;

    Mock::given(method("GET"))
        .and(path("/player-info"))
        .respond_with(ResponseTemplate::new(200).set_body_json(secondary_body()))
        .mount(&secondary)
        .await;

    let app = test_app(create_test_config(primary.uri(), secondary.uri()));
    let (status, body) = get(app, "/api/player-info?uid=12345678").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["basic"]["nickname"], "Other");
}

#[tokio::test]
async fn test_no_records_is_player_not_found() {
    let primary = MockServer::start().await;
    let secondary = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {}})))
        .mount(&primary)
        .await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "not found"})))
        .mount(&secondary)
        .await;

    let app = test_app(create_test_config(primary.uri(), secondary.uri()));
    let (status, body) = get(app, "/api/player-info?uid=99999999").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "PLAYER_NOT_FOUND");
    assert_eq!(
        body["error"],
        "No data found for that UID. Please check the UID and region."
    );
}

#[tokio::test]
async fn test_malformed_body_is_treated_as_empty() {
    let primary = MockServer::start().await;
    let secondary = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&primary)
        .await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&secondary)
        .await;

    let app = test_app(create_test_config(primary.uri(), secondary.uri()));
    let (status, body) = get(app, "/api/player-info?uid=12345678").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "PLAYER_NOT_FOUND");
}

#[tokio::test]
async fn test_invalid_uid_never_calls_providers() {
    let primary = MockServer::start().await;
    let secondary = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(primary_body()))
        .expect(0)
        .mount(&primary)
        .await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(secondary_body()))
        .expect(0)
        .mount(&secondary)
        .await;

    for uri in [
        "/api/player-info",
        "/api/player-info?uid=",
        "/api/player-info?uid=abc123",
        "/api/player-info?uid=%2012345678",
        // duplicate keys fail query deserialization before validation
        "/api/player-info?uid=12345678&uid=87654321",
    ] {
        let app = test_app(create_test_config(primary.uri(), secondary.uri()));
        let (status, body) = get(app, uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(body["code"], "INVALID_UID");
        assert_eq!(body["error"], "Please provide a valid UID");
    }
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = test_app(create_test_config(
        "http://127.0.0.1:9".to_string(),
        "http://127.0.0.1:9".to_string(),
    ));
    let (status, body) = get(app, "/api/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["version"], "2.0.0");
}

#[tokio::test]
async fn test_provider_cache_serves_repeat_lookups() {
    let primary = MockServer::start().await;
    let secondary = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/info"))
        .respond_with(ResponseTemplate::new(200).set_body_json(primary_body()))
        .expect(1)
        .mount(&primary)
        .await;

    // Failures are never cached, so the secondary is hit on every lookup
    Mock::given(method("GET"))
        .and(path("/player-info"))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&secondary)
        .await;

    let mut config = create_test_config(primary.uri(), secondary.uri());
    config.provider_cache_ttl_secs = 60;
    let client = ProviderClient::new(&config).unwrap();

    let first = client.fetch_sources("12345678", "bd").await;
    let second = client.fetch_sources("12345678", "bd").await;

    assert_eq!(first, second);
    assert_eq!(first[0], primary_body());
    assert_eq!(first[1], json!({}));
}

#[tokio::test]
async fn test_concurrent_lookups() {
    let primary = MockServer::start().await;
    let secondary = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(primary_body()))
        .expect(10)
        .mount(&primary)
        .await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(secondary_body()))
        .expect(10)
        .mount(&secondary)
        .await;

    let app = test_app(create_test_config(primary.uri(), secondary.uri()));

    let mut handles = vec![];
    for i in 0..10 {
        let app = app.clone();
        handles.push(tokio::spawn(async move {
            get(app, &format!("/api/player-info?uid=1234567{}", i)).await
        }));
    }

    for handle in handles {
        let (status, body) = handle.await.unwrap();
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["basic"]["nickname"], "ShadowFox");
    }
}
