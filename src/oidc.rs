use serde::{Deserialize, Serialize};

/// The parts of an OpenID provider's discovery document this app relies on.
///
/// See: https://openid.net/specs/openid-connect-discovery-1_0.html#ProviderMetadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct OidcConfig {
    pub(crate) issuer: String,
    pub(crate) authorization_endpoint: String,
    pub(crate) token_endpoint: String,
    pub(crate) jwks_uri: String,

    /// Not announced by every provider. Auth0 only lists it when RP-initiated logout is enabled
    /// for the tenant.
    #[serde(default)]
    pub(crate) end_session_endpoint: Option<String>,

    #[serde(default)]
    pub(crate) userinfo_endpoint: Option<String>,

    #[serde(default)]
    pub(crate) scopes_supported: Vec<String>,
}
