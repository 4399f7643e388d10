/// Why an asset failed to resolve.
///
/// Asset errors never escape coordinator operations. They end up in the record
/// (`AssetRecord::last_error`) and in the `on_error` callback.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum AssetError {
    #[error("network error: {0}")]
    Network(String),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("resolver rejected the asset: {0}")]
    Rejected(String),
    #[error("request cancelled")]
    Cancelled,
}

impl AssetError {
    pub fn network(reason: impl Into<String>) -> Self {
        Self::Network(reason.into())
    }

    pub fn decode(reason: impl Into<String>) -> Self {
        Self::Decode(reason.into())
    }

    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected(reason.into())
    }
}
