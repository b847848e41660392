//! What the login and logout buttons do when activated.

use url::Url;

use crate::{IdentityClient, LogoutOptions};

pub fn activate_login(identity: &impl IdentityClient) {
    tracing::trace!("Login requested.");
    identity.login_with_redirect();
}

/// Leaving `return_to` empty returns to the configured post-logout redirect url.
pub fn activate_logout(identity: &impl IdentityClient, return_to: Option<Url>) {
    tracing::trace!(?return_to, "Logout requested.");
    identity.logout(LogoutOptions { return_to });
}
