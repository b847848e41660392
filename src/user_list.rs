//! Fetching the user list of the local backend on demand.

use crate::error::FetchError;
use crate::{AuthenticatedClient, BackendEndpoint, IdentityClient, JsonTransport};

/// Displayed before the first successful fetch.
pub const USER_LIST_PLACEHOLDER: &str = "null";

/// The event activating a fetch, E.g. a button click.
pub trait ActivationEvent {
    fn prevent_default(&self);
}

impl ActivationEvent for leptos::ev::MouseEvent {
    fn prevent_default(&self) {
        leptos::web_sys::Event::prevent_default(self);
    }
}

#[derive(Debug, Clone)]
pub struct UserListFetcher<I, T> {
    client: AuthenticatedClient<I, T>,
    backend: BackendEndpoint,
}

impl<I: IdentityClient, T: JsonTransport> UserListFetcher<I, T> {
    pub fn new(identity: I, transport: T, backend: BackendEndpoint) -> Self {
        Self {
            client: AuthenticatedClient::new(identity, transport),
            backend,
        }
    }

    /// Whether a fetch should run for `event`. While signed out, the event is left untouched.
    /// Once authenticated, its default action is suppressed, even if no user is known yet.
    pub fn begin(&self, event: &impl ActivationEvent) -> bool {
        let identity = self.client.identity();
        if !identity.is_authenticated() {
            return false;
        }
        event.prevent_default();
        identity.current_user().is_some()
    }

    /// The user list, serialized as compact JSON.
    pub async fn fetch(&self) -> Result<String, FetchError> {
        let users = self
            .client
            .get_json(
                self.backend.users_url.clone(),
                self.backend.authorization.clone(),
            )
            .await?;
        Ok(users.to_string())
    }

    /// Failures are logged and yield `None`.
    pub async fn run(self) -> Option<String> {
        match self.fetch().await {
            Ok(text) => Some(text),
            Err(err) => {
                tracing::error!(?err, "Could not fetch user list.");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AuthorizationParams;
    use crate::testing::{FakeIdentity, FakeTransport};
    use assertr::prelude::*;
    use serde_json::json;
    use std::cell::Cell;
    use url::Url;

    #[derive(Default)]
    struct FakeClick {
        prevented: Cell<bool>,
    }

    impl ActivationEvent for FakeClick {
        fn prevent_default(&self) {
            self.prevented.set(true);
        }
    }

    fn backend() -> BackendEndpoint {
        BackendEndpoint {
            users_url: Url::parse("http://localhost:8080/api/users").unwrap(),
            authorization: AuthorizationParams::default().with_audience("http://localhost:8080/api"),
        }
    }

    /// Mirrors what the `GetUser` component does with each activation.
    async fn activate(
        fetcher: &UserListFetcher<FakeIdentity, FakeTransport>,
        click: &FakeClick,
        displayed: &std::cell::RefCell<String>,
    ) {
        if !fetcher.begin(click) {
            return;
        }
        if let Some(text) = fetcher.clone().run().await {
            *displayed.borrow_mut() = text;
        }
    }

    #[tokio::test]
    async fn signed_out_activation_does_nothing() {
        let transport = FakeTransport::default();
        let identity = FakeIdentity::signed_out();
        let fetcher = UserListFetcher::new(identity.clone(), transport.clone(), backend());
        let click = FakeClick::default();
        let displayed = std::cell::RefCell::new(USER_LIST_PLACEHOLDER.to_owned());

        activate(&fetcher, &click, &displayed).await;

        assert_that(click.prevented.get()).is_false();
        assert_that(transport.requests().is_empty()).is_true();
        assert_that(identity.token_requests().is_empty()).is_true();
        assert_that(displayed.borrow().clone()).is_equal_to(USER_LIST_PLACEHOLDER.to_owned());
    }

    #[tokio::test]
    async fn activation_without_user_fetches_nothing() {
        let transport = FakeTransport::default();
        let identity = FakeIdentity::authenticated_without_user();
        let fetcher = UserListFetcher::new(identity.clone(), transport.clone(), backend());
        let click = FakeClick::default();
        let displayed = std::cell::RefCell::new(USER_LIST_PLACEHOLDER.to_owned());

        activate(&fetcher, &click, &displayed).await;

        assert_that(click.prevented.get()).is_true();
        assert_that(transport.requests().is_empty()).is_true();
        assert_that(identity.token_requests().is_empty()).is_true();
        assert_that(displayed.borrow().clone()).is_equal_to(USER_LIST_PLACEHOLDER.to_owned());
    }

    #[tokio::test]
    async fn activation_fetches_with_backend_token() {
        let transport = FakeTransport::default();
        transport.respond_with(json!([{"id": 1, "name": "jane"}]));
        let identity = FakeIdentity::signed_in("auth0|123");
        let fetcher = UserListFetcher::new(identity.clone(), transport.clone(), backend());
        let click = FakeClick::default();
        let displayed = std::cell::RefCell::new(USER_LIST_PLACEHOLDER.to_owned());

        activate(&fetcher, &click, &displayed).await;

        assert_that(click.prevented.get()).is_true();
        assert_that(displayed.borrow().clone())
            .is_equal_to(r#"[{"id":1,"name":"jane"}]"#.to_owned());
        assert_that(identity.token_requests()).is_equal_to(vec![backend().authorization]);
        assert_that(transport.requests()).is_equal_to(vec![(
            "http://localhost:8080/api/users".to_owned(),
            "token-for-http://localhost:8080/api".to_owned(),
        )]);
    }

    #[tokio::test]
    async fn failed_fetch_keeps_displayed_text() {
        let transport = FakeTransport::default();
        transport.respond_with(json!(["first"]));
        transport.respond_with_status(http::StatusCode::INTERNAL_SERVER_ERROR);
        let fetcher =
            UserListFetcher::new(FakeIdentity::signed_in("auth0|123"), transport, backend());
        let click = FakeClick::default();
        let displayed = std::cell::RefCell::new(USER_LIST_PLACEHOLDER.to_owned());

        activate(&fetcher, &click, &displayed).await;
        activate(&fetcher, &click, &displayed).await;

        assert_that(displayed.borrow().clone()).is_equal_to(r#"["first"]"#.to_owned());
    }

    #[tokio::test]
    async fn overlapping_activations_show_the_last_resolved_response() {
        let transport = FakeTransport::default();
        let first_reply = transport.respond_later();
        let second_reply = transport.respond_later();
        let fetcher =
            UserListFetcher::new(FakeIdentity::signed_in("auth0|123"), transport, backend());
        let click = FakeClick::default();
        let displayed = std::cell::RefCell::new(USER_LIST_PLACEHOLDER.to_owned());

        let mut first = Box::pin(activate(&fetcher, &click, &displayed));
        let mut second = Box::pin(activate(&fetcher, &click, &displayed));
        assert_that(futures::poll!(&mut first).is_pending()).is_true();
        assert_that(futures::poll!(&mut second).is_pending()).is_true();

        second_reply.send(json!(["second"])).unwrap();
        second.await;
        assert_that(displayed.borrow().clone()).is_equal_to(r#"["second"]"#.to_owned());

        first_reply.send(json!(["first"])).unwrap();
        first.await;
        assert_that(displayed.borrow().clone()).is_equal_to(r#"["first"]"#.to_owned());
    }
}
