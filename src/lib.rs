//! Single-page Leptos app authenticating against an OpenID Connect provider (Auth0 by default),
//! showing the signed-in user's profile and provider metadata, and listing users of a local
//! backend on demand.
//!
//! ```no_run
//! use leptos::prelude::*;
//! use leptos_router::components::Router;
//! use leptos_profile_viewer::components::{GetUser, LoginButton, LogoutButton, Profile, SessionProvider};
//! use leptos_profile_viewer::environment::ENVIRONMENT;
//!
//! #[component]
//! pub fn Root() -> impl IntoView {
//!     let options = ENVIRONMENT.session_options().expect("valid session options");
//!     let endpoints = ENVIRONMENT.api_endpoints().expect("valid api endpoints");
//!
//!     view! {
//!         <Router>
//!             <SessionProvider options=options endpoints=endpoints>
//!                 <LoginButton/>
//!                 <LogoutButton/>
//!                 <Profile/>
//!                 <GetUser/>
//!             </SessionProvider>
//!         </Router>
//!     }
//! }
//! ```
//!

mod action;
pub mod app;
mod authenticated_client;
mod code_verifier;
pub mod components;
mod config;
mod csrf_token;
pub mod environment;
mod error;
mod identity;
mod internal;
mod lifecycle;
mod login;
mod logout;
mod oidc;
pub mod profile;
mod request;
mod response;
mod session;
mod storage;
mod token;
mod token_claims;
mod token_validation;
mod transport;
pub mod triggers;
pub mod user_list;

#[cfg(test)]
pub(crate) mod testing;

// Library exports (additional to pub modules).
pub use authenticated_client::AuthenticatedClient;
pub use config::*;
pub use error::*;
pub use identity::*;
pub use lifecycle::TaskScope;
pub use request::RequestError;
pub use response::{ErrorResponse, KnownOidcErrorCode, OidcErrorCode};
pub use session::*;
pub use token::AuthorizationParams;
pub use token_claims::UserRecord;
pub use token_validation::{IdTokenError, JwtValidationError};
pub use transport::*;
pub mod url {
    pub use url::Url;
}

type DiscoveryEndpoint = url::Url;
type JwkSetEndpoint = url::Url;
type AuthorizationEndpoint = url::Url;
type TokenEndpoint = url::Url;
type EndSessionEndpoint = url::Url;

type AuthorizationCode = String;
type RefreshToken = String;

/// Bearer credential handed out by [`IdentityClient::get_access_token`].
pub type AccessToken = String;
