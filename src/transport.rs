use std::future::Future;

use snafu::ResultExt;
use url::Url;

use crate::error::{DecodeSnafu, FetchError, SendSnafu, StatusSnafu};

/// Issues authenticated GET requests expecting a JSON response.
pub trait JsonTransport {
    fn get_json(
        &self,
        url: Url,
        bearer_token: &str,
    ) -> impl Future<Output = Result<serde_json::Value, FetchError>>;
}

/// [`JsonTransport`] backed by `reqwest`, which uses the browser's `fetch` on wasm.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl JsonTransport for ReqwestTransport {
    async fn get_json(&self, url: Url, bearer_token: &str) -> Result<serde_json::Value, FetchError> {
        tracing::debug!(%url, "Fetching");

        let response = self
            .client
            .get(url.clone())
            .bearer_auth(bearer_token)
            .send()
            .await
            .context(SendSnafu { url: url.clone() })?;

        let status = response.status();
        if !status.is_success() {
            return StatusSnafu { url, status }.fail();
        }

        response
            .json::<serde_json::Value>()
            .await
            .context(DecodeSnafu { url })
    }
}
