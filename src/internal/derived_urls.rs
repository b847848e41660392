use leptos::prelude::*;
use snafu::{ResultExt, Snafu};
use url::Url;

use crate::{
    AuthorizationEndpoint, EndSessionEndpoint, JwkSetEndpoint, TokenEndpoint,
    internal::OidcConfigWithTimestamp, oidc::OidcConfig,
};

#[derive(Debug, Clone, PartialEq, Snafu)]
pub(crate) enum DerivedUrlError {
    #[snafu(display("DerivedUrlError: Could not parse"))]
    Parsing { source: url::ParseError },

    #[snafu(display("DerivedUrlError: No config data to read from"))]
    NoConfig,

    #[snafu(display("DerivedUrlError: Provider does not announce an end_session_endpoint"))]
    NoEndSessionEndpoint,
}

/// Provider endpoints, following the discovered OIDC config.
#[derive(Debug, Clone, Copy)]
#[allow(clippy::struct_field_names)]
pub(crate) struct DerivedUrls {
    pub(crate) jwks_endpoint: Signal<Result<JwkSetEndpoint, DerivedUrlError>>,
    pub(crate) authorization_endpoint: Signal<Result<AuthorizationEndpoint, DerivedUrlError>>,
    pub(crate) token_endpoint: Signal<Result<TokenEndpoint, DerivedUrlError>>,
    pub(crate) end_session_endpoint: Signal<Result<EndSessionEndpoint, DerivedUrlError>>,
}

impl DerivedUrls {
    pub(crate) fn new(oidc_config: Signal<Option<OidcConfigWithTimestamp>>) -> Self {
        let derive = move |select: fn(&OidcConfig) -> Option<&str>,
                           missing: fn() -> DerivedUrlError| {
            Signal::derive(move || match oidc_config.read().as_ref() {
                Some(it) => match select(&it.oidc_config) {
                    Some(url) => Url::parse(url).context(ParsingSnafu {}),
                    None => Err(missing()),
                },
                None => Err(NoConfigSnafu {}.build()),
            })
        };

        Self {
            jwks_endpoint: derive(|it| Some(it.jwks_uri.as_str()), || NoConfigSnafu {}.build()),
            authorization_endpoint: derive(
                |it| Some(it.authorization_endpoint.as_str()),
                || NoConfigSnafu {}.build(),
            ),
            token_endpoint: derive(|it| Some(it.token_endpoint.as_str()), || NoConfigSnafu {}.build()),
            end_session_endpoint: derive(
                |it| it.end_session_endpoint.as_deref(),
                || NoEndSessionEndpointSnafu {}.build(),
            ),
        }
    }
}
