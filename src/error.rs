use crate::request::RequestError;
use crate::response::ErrorResponse;
use snafu::Snafu;
use url::Url;

/// Failures of the identity client: obtaining, exchanging or refreshing tokens.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum AuthError {
    /// No usable token is cached and there is no refresh token to obtain one silently.
    /// The user has to go through the interactive login again.
    #[snafu(display("AuthError: Login required"))]
    LoginRequired,

    #[snafu(display("AuthError: Not ready, {what} is not known yet"))]
    NotReady { what: &'static str },

    #[snafu(display("AuthError: Request error"))]
    Request { source: RequestError },

    #[snafu(display("AuthError: Identity provider reported an error: {error_response:?}"))]
    Callback { error_response: ErrorResponse },

    #[snafu(display("AuthError: Received state does not match the pending login"))]
    StateMismatch,

    /// Logged out while the token was being obtained.
    #[snafu(display("AuthError: Session ended"))]
    SessionEnded,
}

/// Failures of an authenticated API call.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum FetchError {
    #[snafu(display("FetchError: Could not obtain an access token"))]
    Token { source: AuthError },

    #[snafu(display("FetchError: Could not send request to {url}"))]
    Send { url: Url, source: reqwest::Error },

    #[snafu(display("FetchError: {url} responded with status {status}"))]
    Status { url: Url, status: http::StatusCode },

    #[snafu(display("FetchError: Could not decode JSON payload from {url}"))]
    Decode { url: Url, source: reqwest::Error },

    #[snafu(display("FetchError: Cannot build a request url from {url}"))]
    InvalidRequestUrl { url: String },
}

/// Session options which cannot be turned into provider urls.
#[derive(Debug, Clone, PartialEq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ConfigError {
    #[snafu(display("ConfigError: '{domain}' is not a valid identity provider domain"))]
    InvalidDomain {
        domain: String,
        source: url::ParseError,
    },

    #[snafu(display("ConfigError: '{value}' is not a valid url for {name}"))]
    InvalidUrl {
        name: &'static str,
        value: String,
        source: url::ParseError,
    },
}
