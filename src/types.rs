use serde::Deserialize;

/// Every backend response wraps its payload as `{ "data": ... }`.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub errors: Option<Vec<serde_json::Value>>,
    #[serde(default = "default_success")]
    pub success: bool,
}

#[derive(Debug, Deserialize)]
pub struct PaginatedEnvelope<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub total: u64,
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default)]
    pub size: u64,
    #[serde(default = "default_page")]
    pub pages: u64,
}

/// Body of `/auth/login` and `/auth/refresh` successes.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenPayload {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
}

/// Error bodies carry `message` and/or `detail`; `detail` is a list for validation failures.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ErrorBody {
    pub message: Option<String>,
    pub detail: Option<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ErrorDetail {
    Text(String),
    Items(Vec<ValidationItem>),
    Other(serde_json::Value),
}

#[derive(Debug, Deserialize)]
pub struct ValidationItem {
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default)]
    pub loc: Vec<serde_json::Value>,
}

impl ErrorBody {
    /// The most specific human-readable message in the body, if any.
    pub fn best_message(&self) -> Option<String> {
        if let Some(message) = self.message.as_deref().filter(|m| !m.trim().is_empty()) {
            return Some(message.to_string());
        }
        match self.detail.as_ref()? {
            ErrorDetail::Text(text) if !text.trim().is_empty() => Some(text.clone()),
            ErrorDetail::Items(items) => items.iter().find_map(|item| item.msg.clone()),
            _ => None,
        }
    }
}

fn default_success() -> bool {
    true
}

fn default_page() -> u64 {
    1
}
