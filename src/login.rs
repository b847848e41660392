use crate::AuthorizationEndpoint;
use crate::config::UseSessionOptions;
use crate::internal::derived_urls::DerivedUrlError;
use crate::internal::login_transaction::LoginTransaction;
use crate::token::AuthorizationParams;
use leptos::prelude::*;
use url::Url;

pub(crate) fn create_login_url_signal(
    authorization_endpoint: Signal<Result<AuthorizationEndpoint, DerivedUrlError>>,
    options: StoredValue<UseSessionOptions>,
    transaction: Signal<Option<LoginTransaction>>,
) -> Memo<Option<Url>> {
    Memo::new(move |_| {
        let authorization_endpoint = match authorization_endpoint.read().as_ref() {
            Ok(it) => it.clone(),
            Err(_) => return None,
        };
        let transaction = transaction.read();
        let transaction = transaction.as_ref()?;
        let options = options.read_value();

        Some(create_login_url(
            authorization_endpoint,
            transaction,
            &options.client_id,
            options.post_login_redirect_url.as_str(),
            &options.default_authorization(),
        ))
    })
}

fn create_login_url(
    authorization_endpoint: Url,
    transaction: &LoginTransaction,
    client_id: &str,
    post_login_redirect_url: &str,
    authorization: &AuthorizationParams,
) -> Url {
    let code_challenge = transaction.code_verifier.to_code_challenge();

    let mut login_url: Url = authorization_endpoint;
    {
        let mut query = login_url.query_pairs_mut();
        query
            .append_pair("response_type", "code")
            .append_pair("client_id", client_id)
            .append_pair("redirect_uri", post_login_redirect_url)
            .append_pair("scope", authorization.scope_str());
        if let Some(audience) = authorization.audience.as_deref() {
            query.append_pair("audience", audience);
        }
        query
            .append_pair("state", transaction.state.as_str())
            .append_pair("code_challenge", code_challenge.code_challenge())
            .append_pair(
                "code_challenge_method",
                code_challenge.code_challenge_method().as_str(),
            );
    }
    login_url
}

#[cfg(test)]
mod tests {
    use super::*;
    use assertr::prelude::*;
    use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
    use sha2::Digest;
    use std::collections::HashMap;

    fn query_of(url: &Url) -> HashMap<String, String> {
        url.query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    #[test]
    fn login_url_carries_pkce_and_state() {
        let transaction = LoginTransaction::new();
        let authorization = AuthorizationParams::default()
            .with_audience("https://api.example.com")
            .with_scope("email openid profile");

        let url = create_login_url(
            Url::parse("https://example.auth0.com/authorize").unwrap(),
            &transaction,
            "my-client",
            "http://127.0.0.1:3000/",
            &authorization,
        );
        let query = query_of(&url);

        assert_that(url.path()).is_equal_to("/authorize");
        assert_that(query.get("response_type").map(String::as_str)).is_equal_to(Some("code"));
        assert_that(query.get("client_id").map(String::as_str)).is_equal_to(Some("my-client"));
        assert_that(query.get("redirect_uri").map(String::as_str))
            .is_equal_to(Some("http://127.0.0.1:3000/"));
        assert_that(query.get("scope").map(String::as_str))
            .is_equal_to(Some("email openid profile"));
        assert_that(query.get("audience").map(String::as_str))
            .is_equal_to(Some("https://api.example.com"));
        assert_that(query.get("state").map(String::as_str))
            .is_equal_to(Some(transaction.state.as_str()));
        assert_that(query.get("code_challenge_method").map(String::as_str))
            .is_equal_to(Some("S256"));

        let expected_challenge = URL_SAFE_NO_PAD.encode(sha2::Sha256::digest(
            transaction.code_verifier.code_verifier().as_bytes(),
        ));
        assert_that(query.get("code_challenge").cloned()).is_equal_to(Some(expected_challenge));
    }

    #[test]
    fn audience_is_omitted_when_not_configured() {
        let url = create_login_url(
            Url::parse("https://example.auth0.com/authorize").unwrap(),
            &LoginTransaction::new(),
            "my-client",
            "http://127.0.0.1:3000/",
            &AuthorizationParams::default().with_scope("openid"),
        );

        assert_that(query_of(&url).contains_key("audience")).is_false();
    }
}
