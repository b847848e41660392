use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use tokio::sync::oneshot;
use url::Url;

use crate::error::FetchError;
use crate::{
    AccessToken, AuthError, AuthorizationParams, IdentityClient, JsonTransport, LogoutOptions,
    UserRecord,
};

pub(crate) fn user(subject: &str) -> UserRecord {
    UserRecord {
        subject: subject.to_owned(),
        name: Some("Jane Doe".to_owned()),
        nickname: None,
        email: Some("jane@example.com".to_owned()),
        email_verified: Some(true),
        picture: None,
        additional_claims: HashMap::new(),
    }
}

#[derive(Default)]
struct IdentityState {
    authenticated: Cell<bool>,
    user: RefCell<Option<UserRecord>>,
    logins: Cell<usize>,
    logouts: RefCell<Vec<LogoutOptions>>,
    token_requests: RefCell<Vec<AuthorizationParams>>,
    token_failure: RefCell<Option<Box<dyn Fn() -> AuthError>>>,
}

/// Records every interaction. Hands out `token-for-{audience}` as access token.
#[derive(Clone, Default)]
pub(crate) struct FakeIdentity {
    state: Rc<IdentityState>,
}

impl FakeIdentity {
    pub(crate) fn signed_out() -> Self {
        Self::default()
    }

    pub(crate) fn signed_in(subject: &str) -> Self {
        let identity = Self::default();
        identity.sign_in(subject);
        identity
    }

    pub(crate) fn sign_in(&self, subject: &str) {
        self.state.authenticated.set(true);
        *self.state.user.borrow_mut() = Some(user(subject));
    }

    /// Authenticated, but the user profile is not known (yet).
    pub(crate) fn authenticated_without_user() -> Self {
        let identity = Self::default();
        identity.state.authenticated.set(true);
        identity
    }

    pub(crate) fn fail_token_requests_with(&self, err: impl Fn() -> AuthError + 'static) {
        *self.state.token_failure.borrow_mut() = Some(Box::new(err));
    }

    pub(crate) fn login_count(&self) -> usize {
        self.state.logins.get()
    }

    pub(crate) fn logouts(&self) -> Vec<LogoutOptions> {
        self.state.logouts.borrow().clone()
    }

    pub(crate) fn token_requests(&self) -> Vec<AuthorizationParams> {
        self.state.token_requests.borrow().clone()
    }
}

impl IdentityClient for FakeIdentity {
    fn is_authenticated(&self) -> bool {
        self.state.authenticated.get()
    }

    fn current_user(&self) -> Option<UserRecord> {
        self.state.user.borrow().clone()
    }

    fn login_with_redirect(&self) {
        self.state.logins.set(self.state.logins.get() + 1);
    }

    fn logout(&self, options: LogoutOptions) {
        self.state.logouts.borrow_mut().push(options);
    }

    async fn get_access_token(
        &self,
        params: AuthorizationParams,
    ) -> Result<AccessToken, AuthError> {
        let audience = params.audience.clone().unwrap_or_default();
        self.state.token_requests.borrow_mut().push(params);
        match self.state.token_failure.borrow().as_ref() {
            Some(err) => Err(err()),
            None => Ok(format!("token-for-{audience}")),
        }
    }
}

enum Reply {
    Value(serde_json::Value),
    Status(http::StatusCode),
    Later(oneshot::Receiver<serde_json::Value>),
}

#[derive(Default)]
struct TransportState {
    requests: Vec<(String, String)>,
    replies: VecDeque<Reply>,
}

/// Answers requests with queued replies, in order. Panics when no reply is queued.
#[derive(Clone, Default)]
pub(crate) struct FakeTransport {
    state: Rc<RefCell<TransportState>>,
}

impl FakeTransport {
    pub(crate) fn respond_with(&self, value: serde_json::Value) {
        self.state.borrow_mut().replies.push_back(Reply::Value(value));
    }

    pub(crate) fn respond_with_status(&self, status: http::StatusCode) {
        self.state.borrow_mut().replies.push_back(Reply::Status(status));
    }

    /// The reply is delivered once a value is sent through the returned sender.
    pub(crate) fn respond_later(&self) -> oneshot::Sender<serde_json::Value> {
        let (tx, rx) = oneshot::channel();
        self.state.borrow_mut().replies.push_back(Reply::Later(rx));
        tx
    }

    /// `(url, bearer token)` of every request made so far.
    pub(crate) fn requests(&self) -> Vec<(String, String)> {
        self.state.borrow().requests.clone()
    }
}

impl JsonTransport for FakeTransport {
    async fn get_json(&self, url: Url, bearer_token: &str) -> Result<serde_json::Value, FetchError> {
        let reply = {
            let mut state = self.state.borrow_mut();
            state
                .requests
                .push((url.to_string(), bearer_token.to_owned()));
            state.replies.pop_front().expect("a queued reply")
        };
        match reply {
            Reply::Value(value) => Ok(value),
            Reply::Status(status) => Err(FetchError::Status { url, status }),
            Reply::Later(rx) => Ok(rx.await.expect("reply to be sent")),
        }
    }
}
