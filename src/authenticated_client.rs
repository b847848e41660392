use snafu::ResultExt;
use url::Url;

use crate::error::{FetchError, TokenSnafu};
use crate::{AuthorizationParams, IdentityClient, JsonTransport};

/// Fetches JSON from APIs protected by the identity provider.
///
/// Each request first obtains an access token for the API's audience and scope, then presents it
/// as a bearer token.
#[derive(Debug, Clone)]
pub struct AuthenticatedClient<I, T> {
    identity: I,
    transport: T,
}

impl<I: IdentityClient, T: JsonTransport> AuthenticatedClient<I, T> {
    pub fn new(identity: I, transport: T) -> Self {
        Self {
            identity,
            transport,
        }
    }

    pub fn identity(&self) -> &I {
        &self.identity
    }

    pub async fn get_json(
        &self,
        url: Url,
        params: AuthorizationParams,
    ) -> Result<serde_json::Value, FetchError> {
        let access_token = self
            .identity
            .get_access_token(params)
            .await
            .context(TokenSnafu {})?;
        self.transport.get_json(url, &access_token).await
    }
}
