//! Deployment settings, read from `.env` at compile time. Variables set in the build environment
//! take precedence over the file.

use std::sync::LazyLock;

use dotenv_codegen::dotenv;
use snafu::ResultExt;
use url::Url;

use crate::error::{ConfigError, InvalidDomainSnafu, InvalidUrlSnafu};
use crate::{
    AdvancedOptions, ApiEndpoints, AuthorizationParams, BackendEndpoint, ManagementApi,
    UseSessionOptions,
};

pub static ENVIRONMENT: LazyLock<Environment> = LazyLock::new(|| Environment {
    auth_domain: dotenv!("AUTH_DOMAIN"),
    auth_client_id: dotenv!("AUTH_CLIENT_ID"),
    app_url: dotenv!("APP_URL"),
    backend_url: dotenv!("BACKEND_URL"),
    backend_audience: dotenv!("BACKEND_AUDIENCE"),
});

#[derive(Debug)]
pub struct Environment {
    pub auth_domain: &'static str,
    pub auth_client_id: &'static str,
    /// Where this app is served. Used as redirect target after login and logout.
    pub app_url: &'static str,
    pub backend_url: &'static str,
    pub backend_audience: &'static str,
}

impl Environment {
    pub fn session_options(&self) -> Result<UseSessionOptions, ConfigError> {
        let app_url = parse_url("APP_URL", self.app_url)?;
        Ok(UseSessionOptions {
            domain: self.auth_domain.to_owned(),
            client_id: self.auth_client_id.to_owned(),
            post_login_redirect_url: app_url.clone(),
            post_logout_redirect_url: app_url,
            authorization: AuthorizationParams::default(),
            advanced: AdvancedOptions::default(),
        })
    }

    pub fn api_endpoints(&self) -> Result<ApiEndpoints, ConfigError> {
        Ok(ApiEndpoints {
            management: ManagementApi::for_domain(self.auth_domain).context(InvalidDomainSnafu {
                domain: self.auth_domain,
            })?,
            backend: BackendEndpoint {
                users_url: parse_url("BACKEND_URL", self.backend_url)?,
                authorization: AuthorizationParams::default().with_audience(self.backend_audience),
            },
        })
    }
}

fn parse_url(name: &'static str, value: &str) -> Result<Url, ConfigError> {
    Url::parse(value).context(InvalidUrlSnafu { name, value })
}
