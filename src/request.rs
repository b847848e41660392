use crate::{
    AuthorizationCode, DiscoveryEndpoint, JwkSetEndpoint, RefreshToken, TokenEndpoint,
    oidc::OidcConfig,
    response::{ErrorResponse, SuccessTokenResponse, TokenResponse},
    token::AuthorizationParams,
};
use serde::Deserialize;
use snafu::{ResultExt, Snafu};

/// Failures talking to the identity provider.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum RequestError {
    #[snafu(display("RequestError: Could not send request"))]
    Send { source: reqwest::Error },

    #[snafu(display("RequestError: Could not decode payload"))]
    Decode { source: reqwest::Error },

    #[snafu(display("RequestError: Received an error response: {error_response:?}"))]
    ErrResponse { error_response: ErrorResponse },
}

pub(crate) async fn retrieve_oidc_config(
    discovery_endpoint: DiscoveryEndpoint,
) -> Result<OidcConfig, RequestError> {
    reqwest::Client::new()
        .get(discovery_endpoint)
        .send()
        .await
        .context(SendSnafu {})?
        .json::<OidcConfig>()
        .await
        .context(DecodeSnafu {})
}

/// Keys we cannot decode (E.g. using an unsupported algorithm) are skipped.
pub(crate) async fn retrieve_jwk_set(
    jwk_set_endpoint: JwkSetEndpoint,
) -> Result<jsonwebtoken::jwk::JwkSet, RequestError> {
    #[derive(Deserialize)]
    struct RawJwkSet {
        keys: Vec<serde_json::Value>,
    }
    let raw_set = reqwest::Client::new()
        .get(jwk_set_endpoint)
        .send()
        .await
        .context(SendSnafu {})?
        .json::<RawJwkSet>()
        .await
        .context(DecodeSnafu {})?;
    let mut set = jsonwebtoken::jwk::JwkSet { keys: Vec::new() };
    for key in raw_set.keys {
        match serde_json::from_value::<jsonwebtoken::jwk::Jwk>(key) {
            Ok(parsed) => set.keys.push(parsed),
            Err(err) => tracing::warn!(?err, "Found non-decodable JWK"),
        }
    }
    Ok(set)
}

/// Redeems the code received in the login callback.
pub(crate) async fn exchange_code_for_token(
    token_endpoint: TokenEndpoint,
    client_id: &str,
    redirect_uri: &str,
    code: &AuthorizationCode,
    code_verifier: &str,
) -> Result<SuccessTokenResponse, RequestError> {
    let params = [
        ("grant_type", "authorization_code"),
        ("client_id", client_id),
        ("code", code.as_str()),
        ("redirect_uri", redirect_uri),
        ("code_verifier", code_verifier),
    ];
    post_token_request(token_endpoint, &params).await
}

/// Obtains a token for `params` without user interaction.
pub(crate) async fn refresh_token(
    token_endpoint: TokenEndpoint,
    client_id: &str,
    refresh_token: &RefreshToken,
    params: &AuthorizationParams,
) -> Result<SuccessTokenResponse, RequestError> {
    let mut form = vec![
        ("grant_type", "refresh_token"),
        ("client_id", client_id),
        ("refresh_token", refresh_token.as_str()),
    ];
    if let Some(audience) = params.audience.as_deref() {
        form.push(("audience", audience));
    }
    if let Some(scope) = params.scope.as_deref() {
        form.push(("scope", scope));
    }
    post_token_request(token_endpoint, &form).await
}

async fn post_token_request(
    token_endpoint: TokenEndpoint,
    form: &[(&str, &str)],
) -> Result<SuccessTokenResponse, RequestError> {
    // Error responses arrive with a 4xx status and are decoded from the body like any other.
    match reqwest::Client::new()
        .post(token_endpoint)
        .form(form)
        .send()
        .await
        .context(SendSnafu {})?
        .json::<TokenResponse>()
        .await
        .context(DecodeSnafu {})?
    {
        TokenResponse::Success(success) => Ok(success),
        TokenResponse::Error(error) => Err(ErrResponseSnafu {
            error_response: error,
        }
        .build()),
    }
}
