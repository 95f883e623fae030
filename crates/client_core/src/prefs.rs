//! Persistence seam for the two durable client values.
//!
//! The session store only needs "remember a token"; it does not care
//! where. Production goes through [`DurablePrefs`] onto SQLite,
//! tests and ephemeral sessions use [`MemoryPrefs`].

use anyhow::Result;
use async_trait::async_trait;
use shared::domain::Theme;
use std::sync::Mutex;

#[async_trait]
pub trait PrefsStore: Send + Sync {
    async fn token(&self) -> Result<Option<String>>;
    async fn set_token(&self, token: &str) -> Result<()>;
    async fn clear_token(&self) -> Result<()>;
    async fn theme(&self) -> Result<Theme>;
    async fn set_theme(&self, theme: Theme) -> Result<()>;
}

/// SQLite-backed preferences.
pub struct DurablePrefs {
    inner: storage::Prefs,
}

impl DurablePrefs {
    pub fn new(inner: storage::Prefs) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl PrefsStore for DurablePrefs {
    async fn token(&self) -> Result<Option<String>> {
        self.inner.token().await
    }

    async fn set_token(&self, token: &str) -> Result<()> {
        self.inner.set_token(token).await
    }

    async fn clear_token(&self) -> Result<()> {
        self.inner.clear_token().await
    }

    async fn theme(&self) -> Result<Theme> {
        let raw = self.inner.theme().await?;
        Ok(raw
            .map(|value| Theme::from_str_lossy(&value))
            .unwrap_or_default())
    }

    async fn set_theme(&self, theme: Theme) -> Result<()> {
        self.inner.set_theme(theme.as_str()).await
    }
}

/// In-memory preferences; nothing survives the process.
#[derive(Default)]
pub struct MemoryPrefs {
    state: Mutex<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    token: Option<String>,
    theme: Theme,
}

#[async_trait]
impl PrefsStore for MemoryPrefs {
    async fn token(&self) -> Result<Option<String>> {
        Ok(self.state.lock().expect("prefs lock").token.clone())
    }

    async fn set_token(&self, token: &str) -> Result<()> {
        self.state.lock().expect("prefs lock").token = Some(token.to_string());
        Ok(())
    }

    async fn clear_token(&self) -> Result<()> {
        self.state.lock().expect("prefs lock").token = None;
        Ok(())
    }

    async fn theme(&self) -> Result<Theme> {
        Ok(self.state.lock().expect("prefs lock").theme)
    }

    async fn set_theme(&self, theme: Theme) -> Result<()> {
        self.state.lock().expect("prefs lock").theme = theme;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn durable_prefs_round_trip_token_and_theme() {
        let dir = tempfile::TempDir::new().expect("temp dir");
        let db = dir.path().join("prefs.sqlite3");
        let prefs = DurablePrefs::new(
            storage::Prefs::new(&db.to_string_lossy())
                .await
                .expect("open prefs"),
        );

        assert_eq!(prefs.token().await.expect("read"), None);
        prefs.set_token("jwt").await.expect("set token");
        assert_eq!(prefs.token().await.expect("read"), Some("jwt".into()));
        prefs.clear_token().await.expect("clear");
        assert_eq!(prefs.token().await.expect("read"), None);

        assert_eq!(prefs.theme().await.expect("read"), Theme::Light);
        prefs.set_theme(Theme::Dark).await.expect("set theme");
        assert_eq!(prefs.theme().await.expect("read"), Theme::Dark);
    }

    #[tokio::test]
    async fn memory_prefs_default_to_logged_out_light() {
        let prefs = MemoryPrefs::default();
        assert_eq!(prefs.token().await.expect("read"), None);
        assert_eq!(prefs.theme().await.expect("read"), Theme::Light);
    }
}
