use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::time::Duration as StdDuration;
use time::{Duration, OffsetDateTime};

use crate::AccessToken;
use crate::response::SuccessTokenResponse;

/// What an access token is requested for.
///
/// Both values are forwarded to the identity provider. Access tokens are cached per audience and
/// reused for any request whose scopes they already cover.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AuthorizationParams {
    /// The API the token is meant for, E.g. "https://dev-abc123.us.auth0.com/api/v2/".
    pub audience: Option<String>,

    /// Space separated list of permissions, E.g. "read:current_user".
    pub scope: Option<String>,
}

impl AuthorizationParams {
    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    /// Falls back to the audience of `defaults` and requests the union of both scopes.
    pub(crate) fn merged_with(&self, defaults: &AuthorizationParams) -> AuthorizationParams {
        let scope = normalize_scope(
            defaults
                .scope
                .iter()
                .chain(self.scope.iter())
                .join(" ")
                .as_str(),
        );
        AuthorizationParams {
            audience: self.audience.clone().or_else(|| defaults.audience.clone()),
            scope: (!scope.is_empty()).then_some(scope),
        }
    }

    pub(crate) fn scope_str(&self) -> &str {
        self.scope.as_deref().unwrap_or_default()
    }
}

/// Sorted, deduplicated, single-space separated.
pub(crate) fn normalize_scope(scope: &str) -> String {
    scope.split_whitespace().sorted().dedup().join(" ")
}

/// Whether every scope in `requested` is part of `granted`.
pub(crate) fn scope_covers(granted: &str, requested: &str) -> bool {
    let granted = granted.split_whitespace().collect::<Vec<_>>();
    requested
        .split_whitespace()
        .all(|scope| granted.contains(&scope))
}

/// An access token issued for one audience.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct CachedAccessToken {
    pub(crate) audience: Option<String>,

    /// Normalized scope the provider granted.
    pub(crate) scope: String,

    pub(crate) access_token: AccessToken,

    #[serde(with = "time::serde::rfc3339")]
    pub(crate) expires_at: OffsetDateTime,
}

impl CachedAccessToken {
    fn usable_for(
        &self,
        params: &AuthorizationParams,
        leeway: StdDuration,
        now: OffsetDateTime,
    ) -> bool {
        self.audience == params.audience
            && scope_covers(&self.scope, params.scope_str())
            && self.expires_at > now + leeway
    }
}

/// Everything we persist about the current session's tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct TokenCache {
    /// Raw ID token of the most recent login or refresh.
    pub(crate) id_token: Option<String>,

    /// Most recent refresh token. Providers rotating refresh tokens hand out a new one on every
    /// refresh, others only on login.
    pub(crate) refresh_token: Option<String>,

    pub(crate) access_tokens: Vec<CachedAccessToken>,
}

impl TokenCache {
    pub(crate) fn lookup(
        &self,
        params: &AuthorizationParams,
        leeway: StdDuration,
        now: OffsetDateTime,
    ) -> Option<&CachedAccessToken> {
        self.access_tokens
            .iter()
            .find(|it| it.usable_for(params, leeway, now))
    }

    /// Records a token response obtained for `params`, replacing any token previously issued for
    /// the same audience and scope. Expired tokens are dropped along the way.
    pub(crate) fn store(
        &mut self,
        params: &AuthorizationParams,
        response: SuccessTokenResponse,
        now: OffsetDateTime,
    ) -> AccessToken {
        let scope = normalize_scope(response.scope.as_deref().unwrap_or(params.scope_str()));
        let cached = CachedAccessToken {
            audience: params.audience.clone(),
            scope,
            access_token: response.access_token,
            expires_at: now + Duration::seconds(response.expires_in),
        };

        self.access_tokens.retain(|it| {
            it.expires_at > now && !(it.audience == cached.audience && it.scope == cached.scope)
        });
        self.access_tokens.push(cached.clone());

        if let Some(refresh_token) = response.refresh_token {
            self.refresh_token = Some(refresh_token);
        }
        if let Some(id_token) = response.id_token {
            self.id_token = Some(id_token);
        }

        cached.access_token
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.id_token.is_none() && self.refresh_token.is_none() && self.access_tokens.is_empty()
    }
}
