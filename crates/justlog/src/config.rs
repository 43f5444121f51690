use std::env;

/// Default table name when `JUSTLOG_TABLE` is unset.
pub const DEFAULT_TABLE_NAME: &str = "justlog";

/// Default AWS region when `AWS_REGION` is unset.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// DynamoDB table holding every record kind (default: "justlog")
    pub table_name: String,
    /// Endpoint override, e.g. a local DynamoDB (default: none)
    pub endpoint_url: Option<String>,
    /// AWS region (default: "us-east-1")
    pub region: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `JUSTLOG_TABLE` - Table name (default: "justlog")
    /// - `AWS_ENDPOINT_URL` - Endpoint override (default: none)
    /// - `AWS_REGION` - Region (default: "us-east-1")
    pub fn from_env() -> Self {
        Self {
            table_name: env::var("JUSTLOG_TABLE")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| DEFAULT_TABLE_NAME.to_string()),
            endpoint_url: env::var("AWS_ENDPOINT_URL").ok().filter(|v| !v.is_empty()),
            region: env::var("AWS_REGION")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| DEFAULT_REGION.to_string()),
        }
    }

    /// Override the table name.
    pub fn with_table_name(mut self, table_name: impl Into<String>) -> Self {
        self.table_name = table_name.into();
        self
    }

    /// Override the endpoint.
    pub fn with_endpoint_url(mut self, endpoint_url: impl Into<String>) -> Self {
        self.endpoint_url = Some(endpoint_url.into());
        self
    }

    /// Returns a display string for the target environment.
    pub fn target_display(&self) -> String {
        match &self.endpoint_url {
            Some(url) => format!("Local DynamoDB ({url}), table {}", self.table_name),
            None => format!(
                "AWS DynamoDB (region: {}), table {}",
                self.region, self.table_name
            ),
        }
    }
}
