use crate::worker::error::WorkerResult;
use crate::worker::types::{Request, Response};

/// Access to the real network, the `fetch()` of the host.
///
/// Only transport failures are errors. Any HTTP status, including 4xx and
/// 5xx, comes back as a response.
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
pub trait Network: Send + Sync {
    async fn fetch(&self, request: &Request) -> WorkerResult<Response>;
}

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use reqwest::header::{HeaderName, HeaderValue};
    use reqwest::{Client, Method};

    use super::Network;
    use crate::worker::error::{internal_error, network_error, WorkerResult};
    use crate::worker::types::{Request, Response};

    /// `reqwest`-backed network for native hosts.
    #[derive(Clone, Debug)]
    pub struct HttpNetwork {
        http: Client,
    }

    impl HttpNetwork {
        pub fn new() -> WorkerResult<Self> {
            let http = Client::builder()
                .user_agent(format!("cms-mobile-sw/{}", env!("CARGO_PKG_VERSION")))
                .build()
                .map_err(|err| internal_error(format!("Failed to build HTTP client: {err}")))?;
            Ok(Self { http })
        }

        pub fn with_client(http: Client) -> Self {
            Self { http }
        }
    }

    #[async_trait::async_trait]
    impl Network for HttpNetwork {
        async fn fetch(&self, request: &Request) -> WorkerResult<Response> {
            let method = Method::from_bytes(request.method.as_bytes())
                .map_err(|err| internal_error(format!("Invalid method '{}': {err}", request.method)))?;
            let mut builder = self.http.request(method, request.url.clone());
            for (name, value) in &request.headers {
                let header_name = HeaderName::from_bytes(name.as_bytes())
                    .map_err(|err| internal_error(format!("Invalid header name: {err}")))?;
                let header_value = HeaderValue::from_str(value)
                    .map_err(|err| internal_error(format!("Invalid header value: {err}")))?;
                builder = builder.header(header_name, header_value);
            }

            let response = builder
                .send()
                .await
                .map_err(|err| network_error(format!("Failed to fetch {}: {err}", request.url)))?;

            let status = response.status();
            let headers = response
                .headers()
                .iter()
                .filter_map(|(name, value)| {
                    value
                        .to_str()
                        .ok()
                        .map(|value| (name.as_str().to_string(), value.to_string()))
                })
                .collect();
            let body = response
                .bytes()
                .await
                .map_err(|err| network_error(format!("Failed to read {}: {err}", request.url)))?;

            Ok(Response {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or_default().to_string(),
                headers,
                body,
            })
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub use native::HttpNetwork;
