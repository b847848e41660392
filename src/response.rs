use leptos_router::params::{ParamsError, ParamsMap};
use serde::{Deserialize, Serialize};

/// What the identity provider appended to our redirect url after an interactive login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum CallbackResponse {
    Authorized {
        code: String,
        state: Option<String>,
    },
    Error {
        error_response: ErrorResponse,
        state: Option<String>,
    },
}

impl CallbackResponse {
    pub(crate) fn parse(get: impl Fn(&str) -> Option<String>) -> Result<Self, ParamsError> {
        let state = get("state");

        if let Some(code) = get("code") {
            return Ok(CallbackResponse::Authorized { code, state });
        }

        let Some(error) = get("error") else {
            // Expected whenever the app is loaded without callback parameters.
            return Err(ParamsError::MissingParam(
                "Neither query parameter 'code' nor 'error' is present.".to_string(),
            ));
        };
        let error = serde_json::Value::String(error);
        let Ok(error) = serde_json::from_value::<OidcErrorCode>(error) else {
            return Err(ParamsError::MissingParam(
                "Could not parse query parameter 'error' as `OidcErrorCode`.".to_string(),
            ));
        };

        Ok(CallbackResponse::Error {
            error_response: ErrorResponse {
                error,
                error_description: get("error_description"),
                error_uri: get("error_uri"),
            },
            state,
        })
    }
}

impl leptos_router::params::Params for CallbackResponse {
    fn from_map(map: &ParamsMap) -> Result<Self, ParamsError> {
        CallbackResponse::parse(|key| map.get(key))
    }
}

/// Response to requests against the token endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub(crate) enum TokenResponse {
    Success(SuccessTokenResponse),
    Error(ErrorResponse),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub(crate) struct SuccessTokenResponse {
    pub access_token: String,
    pub expires_in: i64,

    /// Only issued when `offline_access` was granted. Absent on refreshes unless the provider
    /// rotates refresh tokens.
    #[serde(default)]
    pub refresh_token: Option<String>,

    /// Only issued when `openid` was requested.
    #[serde(default)]
    pub id_token: Option<String>,

    #[serde(default)]
    pub token_type: Option<String>,

    #[serde(default)]
    pub scope: Option<String>,
}

/// See [RFC 6749 Section 4.1.2.1](https://datatracker.ietf.org/doc/html/rfc6749#section-4.1.2.1),
/// [RFC 6749 Section 5.2](https://datatracker.ietf.org/doc/html/rfc6749#section-5.2) and
/// [OIDC Core Section 3.1.2.6](https://openid.net/specs/openid-connect-core-1_0.html#AuthError).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub enum KnownOidcErrorCode {
    #[serde(rename = "invalid_request")]
    InvalidRequest,

    #[serde(rename = "invalid_client")]
    InvalidClient,

    /// The authorization code or refresh token is invalid, expired or revoked.
    #[serde(rename = "invalid_grant")]
    InvalidGrant,

    #[serde(rename = "unauthorized_client")]
    UnauthorizedClient,

    #[serde(rename = "unsupported_grant_type")]
    UnsupportedGrantType,

    #[serde(rename = "invalid_scope")]
    InvalidScope,

    /// The user or the provider denied the request, E.g. the consent screen was declined.
    #[serde(rename = "access_denied")]
    AccessDenied,

    #[serde(rename = "login_required")]
    LoginRequired,

    #[serde(rename = "consent_required")]
    ConsentRequired,

    #[serde(rename = "interaction_required")]
    InteractionRequired,

    /// Auth0 specific: a refresh was attempted without a refresh token at hand.
    #[serde(rename = "missing_refresh_token")]
    MissingRefreshToken,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum OidcErrorCode {
    Known(KnownOidcErrorCode),
    Unknown(String),
}

/// OAuth/OIDC error response received from the identity provider, either as query parameters of
/// the login callback or as the body of a failed token request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ErrorResponse {
    /// The error code (e.g., `invalid_client` or `invalid_grant`).
    pub error: OidcErrorCode,

    /// OPTIONAL. Human-readable text providing additional information.
    #[serde(default)]
    pub error_description: Option<String>,

    /// OPTIONAL. A URI identifying a human-readable web page with information about the error.
    #[serde(default)]
    pub error_uri: Option<String>,
}

impl ErrorResponse {
    /// Whether only a new interactive login can resolve this error.
    pub fn requires_interaction(&self) -> bool {
        matches!(
            self.error,
            OidcErrorCode::Known(
                KnownOidcErrorCode::InvalidGrant
                    | KnownOidcErrorCode::LoginRequired
                    | KnownOidcErrorCode::ConsentRequired
                    | KnownOidcErrorCode::InteractionRequired
                    | KnownOidcErrorCode::MissingRefreshToken
            )
        )
    }
}
