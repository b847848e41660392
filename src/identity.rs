use std::future::Future;
use url::Url;

use crate::{AccessToken, AuthError, AuthorizationParams, UserRecord};

/// The identity provider as seen by the UI.
///
/// Implemented by [`Session`](crate::Session). Components only ever talk to this trait, so they
/// can be exercised against fakes.
pub trait IdentityClient {
    /// Snapshot, not tracked by the reactive system.
    fn is_authenticated(&self) -> bool;

    /// Snapshot, not tracked by the reactive system.
    fn current_user(&self) -> Option<UserRecord>;

    /// Navigates away to the provider's login page.
    fn login_with_redirect(&self);

    /// Ends the local session and navigates to the provider's logout page.
    fn logout(&self, options: LogoutOptions);

    /// A bearer token for `params`, obtained without user interaction.
    fn get_access_token(
        &self,
        params: AuthorizationParams,
    ) -> impl Future<Output = Result<AccessToken, AuthError>>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogoutOptions {
    /// Where the provider sends the browser after logging out. Falls back to the configured
    /// `post_logout_redirect_url`.
    pub return_to: Option<Url>,
}
