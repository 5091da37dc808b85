use async_trait::async_trait;
use std::collections::HashMap;

/// HTTP headers to send with the opening handshake
pub type Headers = HashMap<String, String>;

/// Trait for providing handshake headers dynamically
///
/// Called once per connection attempt, right before the handshake
/// request is sent, so tokens and timestamps can be generated fresh.
/// Headers whose name or value is not valid HTTP are skipped with a
/// warning rather than failing the connection.
///
/// `Sec-WebSocket-Protocol` is managed by the builder's protocol list;
/// a provider should not set it.
///
/// # Example
/// ```ignore
/// struct ApiKeyHeaders {
///     api_key: String,
/// }
///
/// #[async_trait::async_trait]
/// impl HeaderProvider for ApiKeyHeaders {
///     async fn get_headers(&self) -> Headers {
///         let mut headers = HashMap::new();
///         headers.insert("X-API-Key".to_string(), self.api_key.clone());
///         headers
///     }
/// }
/// ```
#[async_trait]
pub trait HeaderProvider: Send + Sync {
    /// Generate headers for the next handshake request
    async fn get_headers(&self) -> Headers;
}

/// A no-op header provider that doesn't add any headers
pub struct NoHeaders;

#[async_trait]
impl HeaderProvider for NoHeaders {
    async fn get_headers(&self) -> Headers {
        HashMap::new()
    }
}
