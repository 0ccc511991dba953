//! Environment-driven configuration.

use serde::{Deserialize, Serialize};

use crate::auth::Identity;
use crate::error::AppError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub feed: FeedConfig,
    pub media: MediaConfig,
    pub demo_user: DemoUserConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub env: String,
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Document collection the feed subscribes to and mutates.
    pub collection: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Base URL prefixed to stored object keys when building durable links.
    pub public_base_url: String,
}

/// Identity handed out by the local sign-in provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemoUserConfig {
    pub id: String,
    pub name: String,
    pub email: String,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let port = match std::env::var("PHOTOFEED_PORT") {
            Ok(raw) => raw
                .parse::<u16>()
                .map_err(|_| AppError::Config(format!("invalid PHOTOFEED_PORT: {raw}")))?,
            Err(_) => 8080,
        };

        Ok(Config {
            app: AppConfig {
                env: env_or("APP_ENV", "development"),
                host: env_or("PHOTOFEED_HOST", "127.0.0.1"),
                port,
            },
            feed: FeedConfig {
                collection: env_or("FEED_COLLECTION", "posts"),
            },
            media: MediaConfig {
                public_base_url: env_or("MEDIA_PUBLIC_BASE_URL", "https://media.local"),
            },
            demo_user: DemoUserConfig {
                id: env_or("DEMO_USER_ID", "demo-user"),
                name: env_or("DEMO_USER_NAME", "Demo User"),
                email: env_or("DEMO_USER_EMAIL", "demo@example.com"),
            },
        })
    }

    /// Identity the local provider signs in as. An empty display name is
    /// normalized to `None` so downstream fallbacks apply.
    pub fn demo_identity(&self) -> Identity {
        let name = self.demo_user.name.trim();
        Identity {
            id: self.demo_user.id.clone(),
            display_name: (!name.is_empty()).then(|| name.to_string()),
            email: self.demo_user.email.clone(),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(name: &str) -> Config {
        Config {
            app: AppConfig {
                env: "test".into(),
                host: "127.0.0.1".into(),
                port: 0,
            },
            feed: FeedConfig {
                collection: "posts".into(),
            },
            media: MediaConfig {
                public_base_url: "https://media.local".into(),
            },
            demo_user: DemoUserConfig {
                id: "u1".into(),
                name: name.into(),
                email: "u1@example.com".into(),
            },
        }
    }

    #[test]
    fn demo_identity_carries_display_name() {
        let identity = sample("Ada").demo_identity();
        assert_eq!(identity.id, "u1");
        assert_eq!(identity.display_name.as_deref(), Some("Ada"));
        assert_eq!(identity.email, "u1@example.com");
    }

    #[test]
    fn blank_display_name_becomes_none() {
        let identity = sample("   ").demo_identity();
        assert_eq!(identity.display_name, None);
    }
}
