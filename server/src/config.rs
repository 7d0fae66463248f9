use anyhow::{Context, Result, anyhow};
use axum_extra::extract::cookie::Key;
use base64::{Engine as _, engine::general_purpose::STANDARD};

const DEFAULT_SESSION_TTL_DAYS: i64 = 30;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub cookie_key: Key,
    pub cors_allowed_origins: Vec<String>,
    pub session_ttl_days: i64,
    /// Marks the session cookie `Secure`. Off only for plain-http local runs.
    pub secure_cookies: bool,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        let cookie_secret =
            std::env::var("COOKIE_SECRET_BASE64").context("COOKIE_SECRET_BASE64 missing")?;
        let cookie_key = cookie_key_from_base64(&cookie_secret)?;

        let cors_allowed_origins = parse_origins(
            &std::env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "http://localhost:5173".into()),
        );

        let session_ttl_days = match std::env::var("SESSION_TTL_DAYS") {
            Ok(raw) => raw
                .trim()
                .parse::<i64>()
                .ok()
                .filter(|days| *days > 0)
                .ok_or_else(|| anyhow!("SESSION_TTL_DAYS must be a positive integer"))?,
            Err(_) => DEFAULT_SESSION_TTL_DAYS,
        };

        let secure_cookies = std::env::var("INSECURE_COOKIES")
            .map(|val| !matches!(val.to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(true);

        Ok(Self {
            cookie_key,
            cors_allowed_origins,
            session_ttl_days,
            secure_cookies,
        })
    }
}

pub fn cookie_key_from_base64(secret: &str) -> Result<Key> {
    let secret_bytes = STANDARD
        .decode(secret.trim())
        .context("invalid COOKIE_SECRET_BASE64")?;
    if secret_bytes.len() < 32 {
        return Err(anyhow!(
            "COOKIE_SECRET_BASE64 must decode to at least 32 bytes"
        ));
    }
    // Private jars need a 64-byte master key.
    Ok(Key::derive_from(&secret_bytes))
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .filter_map(|s| {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        })
        .collect()
}
