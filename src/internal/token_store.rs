use codee::string::JsonSerdeCodec;
use leptos::prelude::*;
use time::OffsetDateTime;

use crate::{
    AccessToken,
    config::UseSessionOptions,
    response::SuccessTokenResponse,
    storage::{Persisted, use_persisted},
    internal::token_refresh::TokenSlot,
    token::{AuthorizationParams, TokenCache},
};

/// The session's tokens, persisted in the configured browser storage.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TokenStore {
    pub(crate) cache: Signal<TokenCache>,
    set_cache: WriteSignal<TokenCache>,
}

impl TokenStore {
    pub(crate) fn new(options: StoredValue<UseSessionOptions>) -> Self {
        let storage_type = options.read_value().advanced.token_storage.into();
        let Persisted { read, write } =
            use_persisted::<TokenCache, JsonSerdeCodec>(storage_type, "tokens", TokenCache::default());
        Self {
            cache: read,
            set_cache: write,
        }
    }

    /// Writes after the owning session was disposed are dropped.
    pub(crate) fn store(
        &self,
        params: &AuthorizationParams,
        response: SuccessTokenResponse,
    ) -> AccessToken {
        let now = OffsetDateTime::now_utc();
        let access_token = response.access_token.clone();
        self.set_cache
            .try_update(|cache| cache.store(params, response, now))
            .unwrap_or(access_token)
    }

    pub(crate) fn forget(&self) {
        if self.cache.try_with_untracked(TokenCache::is_empty).unwrap_or(true) {
            return;
        }
        self.set_cache.try_set(TokenCache::default());
    }
}

impl TokenSlot for TokenStore {
    fn with_cache<R>(&self, f: impl FnOnce(&TokenCache) -> R) -> Option<R> {
        self.cache.try_with_untracked(f)
    }

    fn update_cache<R>(&self, f: impl FnOnce(&mut TokenCache) -> R) -> Option<R> {
        self.set_cache.try_update(f)
    }
}
