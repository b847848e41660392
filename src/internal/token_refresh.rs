use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration as StdDuration;

use futures::lock::Mutex;
use snafu::OptionExt;
use time::OffsetDateTime;

use crate::error::{LoginRequiredSnafu, NotReadySnafu, SessionEndedSnafu};
use crate::request::{self, RequestError};
use crate::token::{AuthorizationParams, TokenCache};
use crate::{AccessToken, AuthError, RefreshToken, TokenEndpoint};

/// Somewhere the session's [`TokenCache`] lives. Both accessors return `None` once it is gone.
pub(crate) trait TokenSlot {
    fn with_cache<R>(&self, f: impl FnOnce(&TokenCache) -> R) -> Option<R>;

    fn update_cache<R>(&self, f: impl FnOnce(&mut TokenCache) -> R) -> Option<R>;
}

/// How an access token for some params can be obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TokenSource {
    Cached(AccessToken),
    Refresh(RefreshToken),
}

pub(crate) fn token_source(
    cache: &TokenCache,
    params: &AuthorizationParams,
    leeway: StdDuration,
    now: OffsetDateTime,
) -> Result<TokenSource, AuthError> {
    if let Some(cached) = cache.lookup(params, leeway, now) {
        return Ok(TokenSource::Cached(cached.access_token.clone()));
    }
    let refresh_token = cache.refresh_token.clone().context(LoginRequiredSnafu {})?;
    Ok(TokenSource::Refresh(refresh_token))
}

/// Which authentication session we are currently in. Refresh responses arriving after the session
/// moved on are discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SessionVersion(u64);

/// Runs at most one refresh at a time.
///
/// Callers queue up behind a running refresh and re-check the cache once it completed, so
/// concurrent requests for the same params hit the provider only once. Refresh tokens may be
/// rotated by the provider, so refreshes for different params are serialized as well.
#[derive(Debug, Clone, Default)]
pub(crate) struct RefreshCoordinator {
    running: Arc<Mutex<()>>,
    version: Arc<AtomicU64>,
}

impl RefreshCoordinator {
    pub(crate) fn version(&self) -> SessionVersion {
        SessionVersion(self.version.load(Ordering::SeqCst))
    }

    /// Invalidates all refreshes in flight.
    pub(crate) fn end_session(&self) {
        self.version.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) async fn access_token(
        &self,
        slot: &impl TokenSlot,
        token_endpoint: Option<TokenEndpoint>,
        client_id: &str,
        params: &AuthorizationParams,
        leeway: StdDuration,
    ) -> Result<AccessToken, AuthError> {
        let lookup = || {
            slot.with_cache(|cache| token_source(cache, params, leeway, OffsetDateTime::now_utc()))
                .context(SessionEndedSnafu {})?
        };

        if let TokenSource::Cached(access_token) = lookup()? {
            return Ok(access_token);
        }

        let version = self.version();
        let _running = self.running.lock().await;
        if self.version() != version {
            return SessionEndedSnafu {}.fail();
        }

        // Whatever completed while we waited may already have produced a token.
        let refresh_token = match lookup()? {
            TokenSource::Cached(access_token) => return Ok(access_token),
            TokenSource::Refresh(refresh_token) => refresh_token,
        };
        let token_endpoint = token_endpoint.context(NotReadySnafu {
            what: "token endpoint",
        })?;

        tracing::trace!(audience = ?params.audience, scope = ?params.scope, "Refreshing access token.");
        let result = request::refresh_token(token_endpoint, client_id, &refresh_token, params).await;

        if self.version() != version {
            tracing::debug!("Session ended while refreshing. Dropping the response.");
            return SessionEndedSnafu {}.fail();
        }

        match result {
            Ok(response) => slot
                .update_cache(|cache| cache.store(params, response, OffsetDateTime::now_utc()))
                .context(SessionEndedSnafu {}),
            Err(RequestError::ErrResponse { error_response })
                if error_response.requires_interaction() =>
            {
                tracing::debug!(?error_response, "Refresh token was rejected. Login required.");
                slot.update_cache(|cache| cache.refresh_token = None);
                LoginRequiredSnafu {}.fail()
            }
            Err(source) => Err(AuthError::Request { source }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::SuccessTokenResponse;
    use assertr::prelude::*;
    use serde_json::json;
    use std::cell::RefCell;
    use url::Url;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const LEEWAY: StdDuration = StdDuration::from_secs(60);

    impl TokenSlot for RefCell<TokenCache> {
        fn with_cache<R>(&self, f: impl FnOnce(&TokenCache) -> R) -> Option<R> {
            Some(f(&self.borrow()))
        }

        fn update_cache<R>(&self, f: impl FnOnce(&mut TokenCache) -> R) -> Option<R> {
            Some(f(&mut self.borrow_mut()))
        }
    }

    fn backend() -> AuthorizationParams {
        AuthorizationParams::default()
            .with_audience("http://localhost:8080/api")
            .with_scope("openid profile email")
    }

    fn management() -> AuthorizationParams {
        AuthorizationParams::default()
            .with_audience("https://example.auth0.com/api/v2/")
            .with_scope("openid profile email read:current_user")
    }

    fn signed_in(refresh_token: &str) -> RefCell<TokenCache> {
        RefCell::new(TokenCache {
            refresh_token: Some(refresh_token.to_owned()),
            ..TokenCache::default()
        })
    }

    fn token_endpoint(server: &MockServer) -> Option<TokenEndpoint> {
        Some(Url::parse(&format!("{}/oauth/token", server.uri())).unwrap())
    }

    fn refreshed(access_token: &str, refresh_token: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({
            "access_token": access_token,
            "refresh_token": refresh_token,
            "expires_in": 86400,
            "token_type": "Bearer"
        }))
    }

    #[test]
    fn cached_tokens_are_preferred_over_refreshing() {
        let now = OffsetDateTime::now_utc();
        let mut cache = signed_in("rt");
        cache.get_mut().store(
            &backend(),
            SuccessTokenResponse {
                access_token: "at".to_owned(),
                expires_in: 3600,
                refresh_token: None,
                id_token: None,
                token_type: Some("Bearer".to_owned()),
                scope: None,
            },
            now,
        );

        assert_that(token_source(&cache.borrow(), &backend(), LEEWAY, now).unwrap())
            .is_equal_to(TokenSource::Cached("at".to_owned()));
        assert_that(token_source(&cache.borrow(), &management(), LEEWAY, now).unwrap())
            .is_equal_to(TokenSource::Refresh("rt".to_owned()));

        // Tokens about to expire are refreshed.
        let later = now + time::Duration::seconds(3590);
        assert_that(token_source(&cache.borrow(), &backend(), LEEWAY, later).unwrap())
            .is_equal_to(TokenSource::Refresh("rt".to_owned()));
    }

    #[test]
    fn without_refresh_token_login_is_required() {
        let err = token_source(
            &TokenCache::default(),
            &backend(),
            LEEWAY,
            OffsetDateTime::now_utc(),
        )
        .unwrap_err();

        assert_that(matches!(err, AuthError::LoginRequired)).is_true();
    }

    #[tokio::test]
    async fn refreshed_token_is_cached() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .and(body_string_contains("refresh_token=rt-1"))
            .and(body_string_contains("audience=http%3A%2F%2Flocalhost%3A8080%2Fapi"))
            .respond_with(refreshed("at", "rt-2"))
            .expect(1)
            .mount(&server)
            .await;
        let cache = signed_in("rt-1");
        let coordinator = RefreshCoordinator::default();

        for _ in 0..2 {
            let token = coordinator
                .access_token(&cache, token_endpoint(&server), "client", &backend(), LEEWAY)
                .await
                .unwrap();
            assert_that(token.as_str()).is_equal_to("at");
        }
        assert_that(cache.borrow().refresh_token.clone()).is_equal_to(Some("rt-2".to_owned()));
    }

    #[tokio::test]
    async fn concurrent_requests_share_one_refresh() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .respond_with(refreshed("at", "rt-2").set_delay(StdDuration::from_millis(100)))
            .expect(1)
            .mount(&server)
            .await;
        let cache = signed_in("rt-1");
        let coordinator = RefreshCoordinator::default();
        let endpoint = token_endpoint(&server);

        let (backend_a, backend_b) = (backend(), backend());
        let (first, second) = tokio::join!(
            coordinator.access_token(&cache, endpoint.clone(), "client", &backend_a, LEEWAY),
            coordinator.access_token(&cache, endpoint.clone(), "client", &backend_b, LEEWAY),
        );

        assert_that(first.unwrap().as_str()).is_equal_to("at");
        assert_that(second.unwrap().as_str()).is_equal_to("at");
    }

    #[tokio::test]
    async fn refreshes_for_other_params_use_the_rotated_refresh_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string_contains("refresh_token=rt-1"))
            .respond_with(refreshed("backend-at", "rt-2").set_delay(StdDuration::from_millis(100)))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_string_contains("refresh_token=rt-2"))
            .respond_with(refreshed("management-at", "rt-3"))
            .expect(1)
            .mount(&server)
            .await;
        let cache = signed_in("rt-1");
        let coordinator = RefreshCoordinator::default();
        let endpoint = token_endpoint(&server);

        let (backend_params, management_params) = (backend(), management());
        let (backend_token, management_token) = tokio::join!(
            coordinator.access_token(&cache, endpoint.clone(), "client", &backend_params, LEEWAY),
            coordinator.access_token(&cache, endpoint.clone(), "client", &management_params, LEEWAY),
        );

        assert_that(backend_token.unwrap().as_str()).is_equal_to("backend-at");
        assert_that(management_token.unwrap().as_str()).is_equal_to("management-at");
        assert_that(cache.borrow().refresh_token.clone()).is_equal_to(Some("rt-3".to_owned()));
    }

    #[tokio::test]
    async fn responses_arriving_after_the_session_ended_are_dropped() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(refreshed("at", "rt-2").set_delay(StdDuration::from_millis(200)))
            .mount(&server)
            .await;
        let cache = signed_in("rt-1");
        let coordinator = RefreshCoordinator::default();

        let backend_params = backend();
        let (result, ()) = tokio::join!(
            coordinator.access_token(&cache, token_endpoint(&server), "client", &backend_params, LEEWAY),
            async {
                tokio::time::sleep(StdDuration::from_millis(50)).await;
                cache.replace(TokenCache::default());
                coordinator.end_session();
            },
        );

        assert_that(matches!(result, Err(AuthError::SessionEnded))).is_true();
        assert_that(cache.borrow().is_empty()).is_true();
    }

    #[tokio::test]
    async fn rejected_refresh_token_is_forgotten() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": "invalid_grant",
                "error_description": "Unknown or invalid refresh token."
            })))
            .expect(1)
            .mount(&server)
            .await;
        let cache = signed_in("rt-1");
        let coordinator = RefreshCoordinator::default();

        let err = coordinator
            .access_token(&cache, token_endpoint(&server), "client", &backend(), LEEWAY)
            .await
            .unwrap_err();

        assert_that(matches!(err, AuthError::LoginRequired)).is_true();
        assert_that(cache.borrow().refresh_token.clone()).is_none();
    }

    #[tokio::test]
    async fn other_refresh_failures_keep_the_refresh_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({
                "error": "server_error"
            })))
            .mount(&server)
            .await;
        let cache = signed_in("rt-1");
        let coordinator = RefreshCoordinator::default();

        let err = coordinator
            .access_token(&cache, token_endpoint(&server), "client", &backend(), LEEWAY)
            .await
            .unwrap_err();

        assert_that(matches!(err, AuthError::Request { .. })).is_true();
        assert_that(cache.borrow().refresh_token.clone()).is_equal_to(Some("rt-1".to_owned()));
    }

    #[tokio::test]
    async fn refreshing_requires_a_known_token_endpoint() {
        let cache = signed_in("rt-1");

        let err = RefreshCoordinator::default()
            .access_token(&cache, None, "client", &backend(), LEEWAY)
            .await
            .unwrap_err();

        assert_that(matches!(err, AuthError::NotReady { what: "token endpoint" })).is_true();
    }
}
