use codee::string::JsonSerdeCodec;
use leptos::prelude::*;
use leptos_use::storage::StorageType;

use crate::{
    DiscoveryEndpoint, action,
    config::UseSessionOptions,
    internal::{
        JwkSetWithTimestamp, OidcConfigWithTimestamp, derived_urls::DerivedUrls, track_age_of,
    },
    request::RequestError,
    storage::{Persisted, use_persisted},
};

/// Keeps the provider's discovery document and signing keys available and fresh.
///
/// Both are cached in local storage and reloaded once older than their configured maximum age.
#[derive(Debug, Clone, Copy)]
pub(crate) struct DiscoveryManager {
    pub(crate) jwk_set: Signal<Option<JwkSetWithTimestamp>>,
    pub(crate) urls: DerivedUrls,
}

impl DiscoveryManager {
    pub(crate) fn new(
        options: StoredValue<UseSessionOptions>,
        discovery_endpoint: DiscoveryEndpoint,
        handle_req_error: Callback<RequestError>,
    ) -> Self {
        let Persisted {
            read: oidc_config,
            write: set_oidc_config,
        } = use_persisted::<Option<OidcConfigWithTimestamp>, JsonSerdeCodec>(
            StorageType::Local,
            "oidc_config",
            None,
        );
        let Persisted {
            read: jwk_set,
            write: set_jwk_set,
        } = use_persisted::<Option<JwkSetWithTimestamp>, JsonSerdeCodec>(
            StorageType::Local,
            "jwk_set",
            None,
        );

        // Forget whatever was cached for a previously configured tenant.
        if oidc_config
            .read_untracked()
            .as_ref()
            .is_some_and(|it| it.source != discovery_endpoint)
        {
            tracing::trace!("Cached OIDC config came from another discovery endpoint. Dropping it.");
            set_oidc_config.set(None);
        }
        if jwk_set
            .read_untracked()
            .as_ref()
            .is_some_and(|it| it.source != discovery_endpoint)
        {
            tracing::trace!("Cached JWK set belongs to another discovery endpoint. Dropping it.");
            set_jwk_set.set(None);
        }

        let check_interval = options.read_value().advanced.discovery_age_check_interval;
        let oidc_config_age = track_age_of(oidc_config, check_interval);
        let jwk_set_age = track_age_of(jwk_set, check_interval);

        let oidc_config_too_old = Memo::new(move |_| {
            oidc_config_age.get() > options.read_value().advanced.max_oidc_config_age
        });
        let jwk_set_too_old =
            Memo::new(move |_| jwk_set_age.get() > options.read_value().advanced.max_jwk_set_age);

        let urls = DerivedUrls::new(oidc_config);

        let retrieve_oidc_config = action::create_retrieve_oidc_config_action(
            Callback::new(move |val| set_oidc_config.set(val)),
            handle_req_error,
        );
        let retrieve_jwk_set = action::create_retrieve_jwk_set_action(
            Callback::new(move |val| set_jwk_set.set(val)),
            handle_req_error,
        );

        let source = discovery_endpoint.clone();
        Effect::new(move |_| {
            if oidc_config_too_old.get() {
                retrieve_oidc_config.dispatch(source.clone());
            }
        });

        Effect::new(move |_| {
            if jwk_set_too_old.get() {
                match urls.jwks_endpoint.read().as_ref() {
                    Ok(jwks_endpoint) => {
                        retrieve_jwk_set
                            .dispatch((jwks_endpoint.clone(), discovery_endpoint.clone()));
                    }
                    Err(err) => {
                        tracing::trace!(reason = ?err, "JWK set is outdated, but no jwks_uri is known yet. Skipping update...");
                    }
                }
            }
        });

        Self { jwk_set, urls }
    }
}
