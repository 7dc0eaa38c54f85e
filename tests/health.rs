use axum::{extract::State, http::StatusCode};
use gymfog_shop::{
    config::{AppConfig, parse_origins},
    routes::health::health_check,
    state::AppState,
};
use sea_orm::DatabaseConnection;

fn test_config() -> AppConfig {
    AppConfig {
        database_url: String::new(),
        host: "127.0.0.1".into(),
        port: 0,
        jwt_secret: "test-secret".into(),
        upload_dir: std::env::temp_dir()
            .join("gymfog-health-uploads")
            .display()
            .to_string(),
        allowed_origins: Vec::new(),
        courier: None,
    }
}

#[tokio::test]
async fn health_check_reports_unreachable_database() {
    let state = AppState::new(DatabaseConnection::Disconnected, &test_config(), None);

    let (status, response) = health_check(State(state)).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.0.message, "Health check");

    let data = response.0.data.expect("health data");
    assert_eq!(data.status, "degraded");
    assert_eq!(data.database, "down");
}

#[test]
fn allowed_origins_are_split_and_trimmed() {
    assert_eq!(
        parse_origins(" https://gymfog.dz, ,http://localhost:5173 "),
        vec!["https://gymfog.dz".to_string(), "http://localhost:5173".to_string()]
    );
    assert!(parse_origins("").is_empty());
}
