use leptos::prelude::*;
use time::OffsetDateTime;

use crate::code_verifier::CodeVerifier;
use crate::config::UseSessionOptions;
use crate::internal::{JwkSetWithTimestamp, OidcConfigWithTimestamp};
use crate::response::SuccessTokenResponse;
use crate::{
    AuthorizationCode, DiscoveryEndpoint, JwkSetEndpoint, TokenEndpoint,
    request::{self, RequestError},
};

pub(crate) fn create_retrieve_oidc_config_action(
    set_oidc_config_wt: Callback<Option<OidcConfigWithTimestamp>>,
    handle_req_error: Callback<RequestError>,
) -> Action<DiscoveryEndpoint, ()> {
    Action::new(move |discovery_endpoint: &DiscoveryEndpoint| {
        let discovery_endpoint = discovery_endpoint.clone();
        async move {
            leptos::task::spawn_local(async move {
                match request::retrieve_oidc_config(discovery_endpoint.clone()).await {
                    Ok(oidc_config) => {
                        set_oidc_config_wt.run(Some(OidcConfigWithTimestamp {
                            oidc_config,
                            retrieved: OffsetDateTime::now_utc(),
                            source: discovery_endpoint,
                        }));
                    }
                    Err(err) => {
                        tracing::error!(?err, "Could not retrieve OIDC config through discovery.");
                        handle_req_error.run(err);
                    }
                }
            });
        }
    })
}

pub(crate) fn create_retrieve_jwk_set_action(
    set_jwk_set_wt: Callback<Option<JwkSetWithTimestamp>>,
    handle_req_error: Callback<RequestError>,
) -> Action<(JwkSetEndpoint, DiscoveryEndpoint), ()> {
    Action::new(
        move |(jwk_set_endpoint, source): &(JwkSetEndpoint, DiscoveryEndpoint)| {
            let jwk_set_endpoint = jwk_set_endpoint.clone();
            let source = source.clone();
            async move {
                leptos::task::spawn_local(async move {
                    match request::retrieve_jwk_set(jwk_set_endpoint).await {
                        Ok(jwk_set) => {
                            set_jwk_set_wt.run(Some(JwkSetWithTimestamp {
                                jwk_set,
                                retrieved: OffsetDateTime::now_utc(),
                                source,
                            }));
                        }
                        Err(err) => {
                            tracing::error!(?err, "Could not retrieve JWK set.");
                            handle_req_error.run(err);
                        }
                    }
                });
            }
        },
    )
}

pub(crate) fn create_exchange_code_for_token_action(
    options: StoredValue<UseSessionOptions>,
    handle_result: Callback<Result<SuccessTokenResponse, RequestError>>,
) -> Action<(TokenEndpoint, AuthorizationCode, CodeVerifier<128>), ()> {
    Action::new(
        move |(token_endpoint, code, verifier): &(
            TokenEndpoint,
            AuthorizationCode,
            CodeVerifier<128>,
        )| {
            let token_endpoint = token_endpoint.clone();
            let client_id = options.read_value().client_id.clone();
            let redirect_uri = options.read_value().post_login_redirect_url.to_string();
            let code = code.clone();
            let code_verifier = verifier.code_verifier().to_owned();
            async move {
                leptos::task::spawn_local(async move {
                    let result = request::exchange_code_for_token(
                        token_endpoint,
                        &client_id,
                        &redirect_uri,
                        &code,
                        &code_verifier,
                    )
                    .await;
                    if let Err(err) = &result {
                        tracing::error!(?err, "Could not exchange authorization code for tokens.");
                    }
                    handle_result.run(result);
                });
            }
        },
    )
}
