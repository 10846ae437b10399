use std::time::Duration;

use crate::sync::SyncError;

pub const DEFAULT_API_BASE: &str = "https://api.notion.com";
pub const NOTION_VERSION: &str = "2022-06-28";
pub const SECRET_VARIABLE: &str = "NOTION_SECRET";
pub const DATABASE_VARIABLE: &str = "DATABASE_ID";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_PAGE_SIZE: u32 = 100;

/// Connection settings for the hosted database, scoped to one run.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub secret: String,
    pub database_id: String,
    pub api_base: String,
    pub timeout: Duration,
    pub page_size: u32
}

impl SyncConfig {
    pub fn new(secret: impl Into<String>, database_id: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            database_id: database_id.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            timeout: DEFAULT_TIMEOUT,
            page_size: DEFAULT_PAGE_SIZE
        }
    }

    /// Builds a config from optional credential values, as collected from the
    /// command line or environment.
    ///
    /// # Errors
    /// Returns `SyncError::MissingConfig` naming the first absent or blank value.
    pub fn from_credentials(secret: Option<String>, database_id: Option<String>) -> Result<Self, SyncError> {
        let secret = non_blank(secret).ok_or(SyncError::MissingConfig(SECRET_VARIABLE))?;
        let database_id = non_blank(database_id).ok_or(SyncError::MissingConfig(DATABASE_VARIABLE))?;

        Ok(Self::new(secret, database_id))
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|value| value.trim().to_string()).filter(|value| !value.is_empty())
}
