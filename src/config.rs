use crate::token::AuthorizationParams;
use crate::{DiscoveryEndpoint, EndSessionEndpoint};
use leptos_use::storage::StorageType;
use std::time::Duration;
use url::Url;

/// Scopes always requested in addition to any scope given explicitly.
pub(crate) const DEFAULT_SCOPE: &str = "openid profile email";

/// Scope that makes the provider hand out refresh tokens.
pub(crate) const OFFLINE_ACCESS_SCOPE: &str = "offline_access";

/// Parameters required to initialize the [`Session`](crate::Session).
#[derive(Debug)]
pub struct UseSessionOptions {
    /// Domain of your identity provider tenant, E.g. "dev-abc123.us.auth0.com".
    /// Assumed to be served over https unless an explicit `http://` scheme is given.
    pub domain: String,

    /// The id of this application as registered at the identity provider.
    pub client_id: String,

    /// Url to which you want to be redirected after a successful login.
    pub post_login_redirect_url: Url,

    /// Url to which you want to be redirected after a successful logout.
    pub post_logout_redirect_url: Url,

    /// Audience and scope requested during login. Also used as the fallback for every
    /// [`get_access_token`](crate::IdentityClient::get_access_token) call not naming an audience.
    pub authorization: AuthorizationParams,

    pub advanced: AdvancedOptions,
}

impl UseSessionOptions {
    pub(crate) fn issuer_url(&self) -> Result<Url, url::ParseError> {
        issuer_url(&self.domain)
    }

    /// The issuer we expect in ID tokens: the tenant url including its trailing slash.
    pub(crate) fn expected_issuer(&self) -> Result<String, url::ParseError> {
        self.issuer_url().map(String::from)
    }

    pub(crate) fn discovery_endpoint(&self) -> Result<DiscoveryEndpoint, url::ParseError> {
        self.issuer_url()?.join(".well-known/openid-configuration")
    }

    /// Logout endpoint used when discovery does not announce an `end_session_endpoint`.
    pub(crate) fn fallback_logout_endpoint(&self) -> Result<EndSessionEndpoint, url::ParseError> {
        self.issuer_url()?.join("v2/logout")
    }

    /// Authorization params used for the login and as defaults for all later token requests.
    pub(crate) fn default_authorization(&self) -> AuthorizationParams {
        let mut scope = String::from(DEFAULT_SCOPE);
        if self.advanced.use_refresh_tokens {
            scope.push(' ');
            scope.push_str(OFFLINE_ACCESS_SCOPE);
        }
        AuthorizationParams {
            audience: None,
            scope: Some(scope),
        }
        .merged_with(&self.authorization)
    }
}

#[derive(Debug)]
pub struct AdvancedOptions {
    /// Where tokens are persisted between page loads.
    /// Defaults to `TokenStorage::Local`.
    pub token_storage: TokenStorage,

    /// Request `offline_access` so that tokens for further audiences and scopes can be obtained
    /// without user interaction.
    /// Defaults to `true`.
    pub use_refresh_tokens: bool,

    /// Cached access tokens expiring within this duration are not handed out anymore.
    /// Defaults to `Duration::from_secs(60)`.
    pub expiry_leeway: Duration,

    /// Interval in which the ID token is checked for expiry.
    /// Defaults to `Duration::from_secs(1)`.
    pub expiry_check_interval: Duration,

    /// Interval after which the oidc configuration and JWK set are checked for their age.
    /// Defaults to `Duration::from_secs(3)`.
    pub discovery_age_check_interval: Duration,

    /// Time after which a discovered OIDC config is considered too old.
    /// Defaults to `Duration::from_secs(60 * 5)`.
    pub max_oidc_config_age: Duration,

    /// Time after which the loaded JWK set is considered too old.
    /// Defaults to `Duration::from_secs(60 * 5)`.
    pub max_jwk_set_age: Duration,
}

impl Default for AdvancedOptions {
    fn default() -> Self {
        Self {
            token_storage: TokenStorage::Local,
            use_refresh_tokens: true,
            expiry_leeway: Duration::from_secs(60),
            expiry_check_interval: Duration::from_secs(1),
            discovery_age_check_interval: Duration::from_secs(3),
            max_oidc_config_age: Duration::from_secs(60 * 5),
            max_jwk_set_age: Duration::from_secs(60 * 5),
        }
    }
}

/// Browser storage holding the session's tokens.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum TokenStorage {
    /// Survives closing the tab. Sessions are shared between tabs.
    #[default]
    Local,

    /// Scoped to the current tab.
    Session,
}

impl From<TokenStorage> for StorageType {
    fn from(value: TokenStorage) -> Self {
        match value {
            TokenStorage::Local => StorageType::Local,
            TokenStorage::Session => StorageType::Session,
        }
    }
}

/// The APIs this app talks to, besides the identity provider itself.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiEndpoints {
    pub management: ManagementApi,
    pub backend: BackendEndpoint,
}

/// The identity provider's management API, serving per-user metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct ManagementApi {
    /// E.g. "https://dev-abc123.us.auth0.com/api/v2/". Doubles as the API's audience.
    pub base_url: Url,
}

/// Permission required to read the signed-in user through the management API.
pub const READ_CURRENT_USER_SCOPE: &str = "read:current_user";

impl ManagementApi {
    pub fn for_domain(domain: &str) -> Result<Self, url::ParseError> {
        Ok(Self {
            base_url: issuer_url(domain)?.join("api/v2/")?,
        })
    }

    pub fn audience(&self) -> String {
        self.base_url.to_string()
    }

    /// Token parameters allowing to read the currently signed-in user.
    pub fn read_current_user(&self) -> AuthorizationParams {
        AuthorizationParams::default()
            .with_audience(self.audience())
            .with_scope(READ_CURRENT_USER_SCOPE)
    }

    /// Url of the given user. The subject is encoded as a single path segment.
    pub fn user_url(&self, subject: &str) -> Option<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .ok()?
            .pop_if_empty()
            .extend(["users", subject]);
        Some(url)
    }
}

/// The local backend serving the user list.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendEndpoint {
    /// E.g. "http://localhost:8080/api/users".
    pub users_url: Url,

    /// Audience and scope of tokens presented to this backend.
    pub authorization: AuthorizationParams,
}

fn issuer_url(domain: &str) -> Result<Url, url::ParseError> {
    let domain = domain.trim().trim_end_matches('/');
    match domain.starts_with("http://") || domain.starts_with("https://") {
        true => Url::parse(&format!("{domain}/")),
        false => Url::parse(&format!("https://{domain}/")),
    }
}
