use codee::{CodecError, Decoder, Encoder};
use leptos::prelude::*;
use leptos_use::storage::{
    StorageType, UseStorageError, UseStorageOptions, use_storage_with_options,
};
use std::fmt::Debug;

/// Prepended to every key this crate persists.
pub(crate) const KEY_PREFIX: &str = "leptos_profile_viewer__";

#[derive(Debug, Clone, Copy)]
pub(crate) struct Persisted<T>
where
    T: Send + Sync + 'static,
{
    pub(crate) read: Signal<T>,
    pub(crate) write: WriteSignal<T>,
}

/// A value kept in browser storage under `KEY_PREFIX` + `key`.
///
/// A stored value which can no longer be decoded (the persisted format changed) is removed and
/// replaced by `initial_value`.
pub(crate) fn use_persisted<T, C>(
    storage_type: StorageType,
    key: &str,
    initial_value: T,
) -> Persisted<T>
where
    T: Debug + Clone + PartialEq + Default + Send + Sync + 'static,
    C: Encoder<T, Encoded = String> + Decoder<T, Encoded = str>,
    <C as Encoder<T>>::Error: Debug,
    <C as Decoder<T>>::Error: Debug,
{
    let key = format!("{KEY_PREFIX}{key}");
    let (decode_err, set_decode_err) = signal(false);

    let options = UseStorageOptions::default()
        .initial_value(initial_value.clone())
        .listen_to_storage_changes(true)
        .delay_during_hydration(false)
        .on_error({
            let key = key.clone();
            move |err| match &err {
                UseStorageError::ItemCodecError(CodecError::Decode(_)) => {
                    // Decode errors may be reported repeatedly before the effect below ran.
                    if !decode_err.get_untracked() {
                        tracing::debug!(?err, %key, "Persisted data format changed. Scheduling removal.");
                        set_decode_err.set(true);
                    }
                }
                _ => tracing::error!(?err, %key, "Error accessing storage."),
            }
        });

    let (read, write, remove) =
        use_storage_with_options::<T, C>(storage_type, key.clone(), options);

    Effect::new(move |_| {
        if decode_err.get() {
            tracing::trace!(%key, "Removing undecodable value. Using initial value: {initial_value:?}");
            remove();
            write.set(initial_value.clone());
            set_decode_err.update_untracked(|it| *it = false);
        }
    });

    Persisted { read, write }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::internal::{JwkSetWithTimestamp, OidcConfigWithTimestamp};
    use crate::internal::login_transaction::LoginTransaction;
    use crate::token::TokenCache;
    use assertr::prelude::*;

    fn persistable<T>() -> T
    where
        T: Debug + Clone + PartialEq + Default + Send + Sync + 'static,
    {
        T::default()
    }

    #[test]
    fn persisted_values_start_out_empty() {
        assert_that(persistable::<TokenCache>().is_empty()).is_true();
        assert_that(persistable::<Option<LoginTransaction>>()).is_none();
        assert_that(persistable::<Option<OidcConfigWithTimestamp>>()).is_none();
        assert_that(persistable::<Option<JwkSetWithTimestamp>>()).is_none();
    }
}
