use codee::string::JsonSerdeCodec;
use leptos::prelude::*;
use leptos_use::storage::StorageType;
use serde::{Deserialize, Serialize};

use crate::{
    code_verifier::CodeVerifier,
    csrf_token::CsrfToken,
    storage::{Persisted, use_persisted},
};

/// Secrets of one interactive login, needed again once the provider redirects back to us.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct LoginTransaction {
    pub(crate) code_verifier: CodeVerifier<128>,
    pub(crate) state: CsrfToken,
}

impl LoginTransaction {
    pub(crate) fn new() -> Self {
        Self {
            code_verifier: CodeVerifier::generate(),
            state: CsrfToken::new(),
        }
    }
}

/// Holds the transaction of the next (or currently running) login in session storage, as it must
/// survive the redirect to the provider but not leak into other tabs.
///
/// A transaction is always present, so that it is already persisted when the login is triggered.
#[derive(Debug, Clone, Copy)]
pub(crate) struct LoginTransactionStore {
    pub(crate) current: Signal<Option<LoginTransaction>>,
    set_current: WriteSignal<Option<LoginTransaction>>,
}

impl LoginTransactionStore {
    pub(crate) fn new() -> Self {
        let Persisted { read, write } = use_persisted::<Option<LoginTransaction>, JsonSerdeCodec>(
            StorageType::Session,
            "login_transaction",
            None,
        );
        if read.read_untracked().is_none() {
            write.set(Some(LoginTransaction::new()));
        }
        Self {
            current: read,
            set_current: write,
        }
    }

    /// Invalidates the current transaction. A code or state issued for it is no longer accepted.
    pub(crate) fn renew(&self) {
        self.set_current.try_set(Some(LoginTransaction::new()));
    }
}
