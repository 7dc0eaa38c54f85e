use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub upload_dir: String,
    pub allowed_origins: Vec<String>,
    pub courier: Option<CourierConfig>,
}

/// Credentials for the parcel delivery API. Delivery hand-off is disabled
/// when any of the three variables is missing.
#[derive(Debug, Clone)]
pub struct CourierConfig {
    pub base_url: String,
    pub token: String,
    pub key: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let jwt_secret = env::var("JWT_SECRET")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let upload_dir = env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".to_string());
        let allowed_origins = env::var("ALLOWED_ORIGINS")
            .map(|raw| parse_origins(&raw))
            .unwrap_or_default();

        let courier = match (
            env::var("COURIER_BASE_URL"),
            env::var("COURIER_TOKEN"),
            env::var("COURIER_KEY"),
        ) {
            (Ok(base_url), Ok(token), Ok(key)) => Some(CourierConfig {
                base_url,
                token,
                key,
            }),
            _ => None,
        };

        Ok(Self {
            port,
            database_url,
            host,
            jwt_secret,
            upload_dir,
            allowed_origins,
            courier,
        })
    }
}

pub fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
