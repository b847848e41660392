use leptos::prelude::*;
use leptos_router::NavigateOptions;
use leptos_router::hooks::{use_navigate, use_query};
use leptos_use::{UseIntervalReturn, use_interval};
use snafu::ResultExt;
use std::sync::Arc;
use url::{Position, Url};

use crate::code_verifier::CodeVerifier;
use crate::error::{ConfigError, InvalidDomainSnafu};
use crate::internal::derived_urls::DerivedUrlError;
use crate::internal::discovery::DiscoveryManager;
use crate::internal::interval_millis;
use crate::internal::login_transaction::{LoginTransaction, LoginTransactionStore};
use crate::internal::token_refresh::RefreshCoordinator;
use crate::internal::token_store::TokenStore;
use crate::request::RequestError;
use crate::response::{CallbackResponse, SuccessTokenResponse};
use crate::token_validation::{self, IdTokenError};
use crate::{
    AccessToken, AuthError, AuthorizationCode, AuthorizationParams, EndSessionEndpoint,
    IdentityClient, LogoutOptions, UseSessionOptions, UserRecord, action, login, logout,
};

/// The identity provider session of this app.
///
/// Created once through [`init_session`] and provided as context. Components obtain it with
/// [`use_session`].
#[derive(Debug, Clone, Copy)]
pub struct Session {
    options: StoredValue<UseSessionOptions>,
    discovery: DiscoveryManager,
    tokens: TokenStore,
    refreshes: StoredValue<RefreshCoordinator>,
    transaction: LoginTransactionStore,
    login_url: Memo<Option<Url>>,
    last_error: RwSignal<Option<Arc<AuthError>>>,

    /// Whether a valid (signed, unexpired, issued for us) ID token is present.
    pub is_authenticated: Signal<bool>,

    /// The user described by the current ID token.
    pub user: Signal<Option<UserRecord>>,
}

/// Initializes the session and provides it as context. Calling this again in the same reactive
/// tree returns the session already provided.
pub fn init_session(options: UseSessionOptions) -> Result<Session, ConfigError> {
    if let Some(session) = try_use_session() {
        tracing::trace!("Session already initialized.");
        return Ok(session);
    }
    tracing::trace!("Initializing session...");

    let discovery_endpoint = options.discovery_endpoint().context(InvalidDomainSnafu {
        domain: options.domain.clone(),
    })?;
    let expected_issuer = options.expected_issuer().context(InvalidDomainSnafu {
        domain: options.domain.clone(),
    })?;
    let expiry_check_interval = options.advanced.expiry_check_interval;
    let options = StoredValue::new(options);

    let last_error = RwSignal::<Option<Arc<AuthError>>>::new(None);
    let handle_req_error = Callback::new(move |source: RequestError| {
        last_error.set(Some(Arc::new(AuthError::Request { source })));
    });

    let discovery = DiscoveryManager::new(options, discovery_endpoint, handle_req_error);
    let tokens = TokenStore::new(options);
    let transaction = LoginTransactionStore::new();

    let login_url = login::create_login_url_signal(
        discovery.urls.authorization_endpoint,
        options,
        transaction.current,
    );

    let (callback_handled, set_callback_handled) = signal(0_u64);
    let exchange_code_for_token = action::create_exchange_code_for_token_action(
        options,
        Callback::new(move |result| {
            finish_code_exchange(
                result,
                |response| {
                    let params = options.read_value().default_authorization();
                    tokens.store(&params, response);
                    // A code and state are only ever redeemed once.
                    transaction.renew();
                    tracing::trace!("Login completed.");
                },
                |source| handle_req_error.run(source),
                || set_callback_handled.update(|it| *it += 1),
            );
        }),
    );

    let callback = use_query::<CallbackResponse>();
    let handled_callback = StoredValue::new(None::<CallbackResponse>);
    Effect::new(move |_| {
        // Fails whenever the app is loaded without callback parameters.
        let Ok(response) = callback.get() else {
            return;
        };
        let token_endpoint = discovery.urls.token_endpoint.get();
        let step = handled_callback.with_value(|handled| {
            transaction.current.with_untracked(|pending| {
                next_callback_step(&response, handled.as_ref(), token_endpoint.is_ok(), pending.as_ref())
            })
        });
        match step {
            CallbackStep::Ignore => {}
            CallbackStep::AwaitDiscovery => {
                tracing::trace!("Received authorization code, but no token endpoint is known yet. Waiting...");
            }
            CallbackStep::Exchange {
                code,
                code_verifier,
            } => {
                handled_callback.set_value(Some(response));
                if let Ok(token_endpoint) = token_endpoint {
                    exchange_code_for_token.dispatch((token_endpoint, code, code_verifier));
                }
            }
            CallbackStep::Fail(err) => {
                tracing::warn!(?err, "Login callback failed.");
                handled_callback.set_value(Some(response));
                last_error.set(Some(Arc::new(err)));
                set_callback_handled.update(|it| *it += 1);
            }
        }
    });

    // Drop the callback parameters from the url, so that a reload does not replay them.
    Effect::new(move |_| {
        if callback_handled.get() == 0 {
            return;
        }
        let navigate = use_navigate();
        let target = options.read_value().post_login_redirect_url.clone();
        navigate(
            local_path(&target),
            NavigateOptions {
                replace: true,
                ..NavigateOptions::default()
            },
        );
    });

    let UseIntervalReturn {
        counter: expiry_check,
        ..
    } = use_interval::<u64>(interval_millis(expiry_check_interval));
    let validated_id_token: Memo<Result<UserRecord, IdTokenError>> = Memo::new(move |_| {
        expiry_check.track();
        let client_id = options.read_value().client_id.clone();
        tokens.cache.with(|cache| {
            discovery.jwk_set.with(|jwk_set| {
                token_validation::validate(
                    cache.id_token.as_deref(),
                    jwk_set.as_ref().map(|it| &it.jwk_set),
                    &client_id,
                    &expected_issuer,
                )
            })
        })
    });
    Effect::new(move |_| {
        if let Err(reason) = &*validated_id_token.read() {
            tracing::trace!(?reason, "Not authenticated.");
        }
    });

    let is_authenticated = Memo::new(move |_| validated_id_token.read().is_ok());

    let session = Session {
        options,
        discovery,
        tokens,
        refreshes: StoredValue::new(RefreshCoordinator::default()),
        transaction,
        login_url,
        last_error,
        is_authenticated: is_authenticated.into(),
        user: Signal::derive(move || validated_id_token.get().ok()),
    };

    provide_context(session);

    Ok(session)
}

/// The session provided by an enclosing [`init_session`] call.
///
/// # Panics
///
/// When no session was initialized higher up in the component tree.
#[must_use]
pub fn use_session() -> Session {
    expect_context::<Session>()
}

#[must_use]
pub fn try_use_session() -> Option<Session> {
    use_context::<Session>()
}

impl Session {
    /// Forgets all tokens and invalidates the pending login. Does not contact the provider.
    pub fn teardown(&self) {
        tracing::trace!("Tearing down session.");
        self.refreshes.with_value(RefreshCoordinator::end_session);
        self.tokens.forget();
        self.transaction.renew();
        self.last_error.try_set(None);
    }

    /// Most recent failure while talking to the identity provider.
    #[must_use]
    pub fn last_error(&self) -> Signal<Option<Arc<AuthError>>> {
        self.last_error.into()
    }
}

impl IdentityClient for Session {
    fn is_authenticated(&self) -> bool {
        self.is_authenticated.get_untracked()
    }

    fn current_user(&self) -> Option<UserRecord> {
        self.user.get_untracked()
    }

    fn login_with_redirect(&self) {
        match self.login_url.get_untracked() {
            Some(login_url) => navigate_external(&login_url),
            None => tracing::warn!("Cannot log in yet. The authorization endpoint is not known."),
        }
    }

    fn logout(&self, options: LogoutOptions) {
        let logout_url = {
            let session_options = self.options.read_value();
            let return_to = options
                .return_to
                .unwrap_or_else(|| session_options.post_logout_redirect_url.clone());
            let id_token = self.tokens.cache.with_untracked(|it| it.id_token.clone());
            create_logout_url(
                self.discovery.urls.end_session_endpoint.get_untracked(),
                session_options.fallback_logout_endpoint(),
                &session_options.client_id,
                return_to,
                id_token.as_deref(),
            )
        };
        self.teardown();
        navigate_external(&logout_url);
    }

    async fn get_access_token(
        &self,
        params: AuthorizationParams,
    ) -> Result<AccessToken, AuthError> {
        let (params, leeway, client_id) = {
            let options = self.options.read_value();
            (
                params.merged_with(&options.default_authorization()),
                options.advanced.expiry_leeway,
                options.client_id.clone(),
            )
        };

        let token_endpoint = self.discovery.urls.token_endpoint.get_untracked().ok();
        let refreshes = self.refreshes.get_value();
        refreshes
            .access_token(&self.tokens, token_endpoint, &client_id, &params, leeway)
            .await
    }
}

/// What to do with the parameters the provider redirected back with.
#[derive(Debug)]
enum CallbackStep {
    /// Already handled, or no login of ours is pending.
    Ignore,

    /// The code can only be redeemed once the token endpoint is known.
    AwaitDiscovery,

    Exchange {
        code: AuthorizationCode,
        code_verifier: CodeVerifier<128>,
    },

    Fail(AuthError),
}

fn next_callback_step(
    response: &CallbackResponse,
    handled: Option<&CallbackResponse>,
    token_endpoint_known: bool,
    pending: Option<&LoginTransaction>,
) -> CallbackStep {
    if handled == Some(response) {
        return CallbackStep::Ignore;
    }
    match response {
        CallbackResponse::Authorized { code, state } => {
            if !token_endpoint_known {
                return CallbackStep::AwaitDiscovery;
            }
            let Some(pending) = pending else {
                return CallbackStep::Ignore;
            };
            if !pending.state.matches(state.as_deref()) {
                return CallbackStep::Fail(AuthError::StateMismatch);
            }
            CallbackStep::Exchange {
                code: code.clone(),
                code_verifier: pending.code_verifier.clone(),
            }
        }
        CallbackResponse::Error { error_response, .. } => CallbackStep::Fail(AuthError::Callback {
            error_response: error_response.clone(),
        }),
    }
}

/// The callback parameters are dropped from the url whether or not the exchange succeeded.
fn finish_code_exchange(
    result: Result<SuccessTokenResponse, RequestError>,
    on_tokens: impl FnOnce(SuccessTokenResponse),
    on_error: impl FnOnce(RequestError),
    drop_callback_params: impl FnOnce(),
) {
    match result {
        Ok(response) => on_tokens(response),
        Err(err) => on_error(err),
    }
    drop_callback_params();
}

/// Prefers the discovered end-session endpoint, then the tenant's own logout endpoint. Without
/// either, the browser is sent straight to `return_to`.
fn create_logout_url(
    end_session_endpoint: Result<EndSessionEndpoint, DerivedUrlError>,
    fallback_endpoint: Result<EndSessionEndpoint, url::ParseError>,
    client_id: &str,
    return_to: Url,
    id_token_hint: Option<&str>,
) -> Url {
    match (end_session_endpoint, fallback_endpoint) {
        (Ok(endpoint), _) => {
            logout::create_end_session_url(endpoint, client_id, &return_to, id_token_hint)
        }
        (Err(_), Ok(endpoint)) => logout::create_tenant_logout_url(endpoint, client_id, &return_to),
        (Err(reason), Err(err)) => {
            tracing::warn!(?reason, ?err, "No logout endpoint known. Only ending the local session.");
            return_to
        }
    }
}

/// Path, query and fragment of `url`, as understood by the router.
fn local_path(url: &Url) -> &str {
    &url[Position::BeforePath..]
}

fn navigate_external(url: &Url) {
    if let Err(err) = window().location().set_href(url.as_str()) {
        tracing::error!(?err, %url, "Could not navigate.");
    }
}
