use crate::EndSessionEndpoint;
use url::Url;

/// RP-initiated logout as announced through discovery.
///
/// See: https://openid.net/specs/openid-connect-rpinitiated-1_0.html
pub(crate) fn create_end_session_url(
    end_session_endpoint: EndSessionEndpoint,
    client_id: &str,
    post_logout_redirect_url: &Url,
    id_token_hint: Option<&str>,
) -> Url {
    let mut logout_url: Url = end_session_endpoint;
    {
        let mut query = logout_url.query_pairs_mut();
        query
            .append_pair("client_id", client_id)
            .append_pair("post_logout_redirect_uri", post_logout_redirect_url.as_str());
        if let Some(id_token) = id_token_hint {
            query.append_pair("id_token_hint", id_token);
        }
    }
    logout_url
}

/// Auth0's own logout endpoint, `/v2/logout`, available on every tenant.
pub(crate) fn create_tenant_logout_url(
    logout_endpoint: EndSessionEndpoint,
    client_id: &str,
    return_to: &Url,
) -> Url {
    let mut logout_url: Url = logout_endpoint;
    logout_url
        .query_pairs_mut()
        .append_pair("client_id", client_id)
        .append_pair("returnTo", return_to.as_str());
    logout_url
}
