use crate::oidc::OidcConfig;
use leptos::prelude::*;
use leptos_use::{UseIntervalReturn, use_interval};
use serde::{Deserialize, Serialize};
use std::time::Duration as StdDuration;
use time::OffsetDateTime;
use url::Url;

pub(crate) mod derived_urls;
pub(crate) mod discovery;
pub(crate) mod login_transaction;
pub(crate) mod token_refresh;
pub(crate) mod token_store;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct OidcConfigWithTimestamp {
    pub(crate) oidc_config: OidcConfig,
    #[serde(with = "time::serde::rfc3339")]
    pub(crate) retrieved: OffsetDateTime,

    /// The discovery endpoint this config was loaded from. Once the app is configured for another
    /// tenant, the cached config no longer applies.
    pub(crate) source: Url,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct JwkSetWithTimestamp {
    pub(crate) jwk_set: jsonwebtoken::jwk::JwkSet,
    #[serde(with = "time::serde::rfc3339")]
    pub(crate) retrieved: OffsetDateTime,

    /// The discovery endpoint of the tenant owning these keys.
    pub(crate) source: Url,
}

pub(crate) trait Retrieved {
    fn retrieved(&self) -> OffsetDateTime;
}

impl Retrieved for OidcConfigWithTimestamp {
    fn retrieved(&self) -> OffsetDateTime {
        self.retrieved
    }
}

impl Retrieved for JwkSetWithTimestamp {
    fn retrieved(&self) -> OffsetDateTime {
        self.retrieved
    }
}

/// Age of `value`, re-evaluated every `check_interval`. `Duration::MAX` while nothing is known.
pub(crate) fn track_age_of<T>(value: Signal<Option<T>>, check_interval: StdDuration) -> Memo<StdDuration>
where
    T: Retrieved + Send + Sync + 'static,
{
    let UseIntervalReturn { counter, .. } = use_interval::<u64>(interval_millis(check_interval));
    Memo::new(move |_| {
        let _count = counter.get();
        value
            .read()
            .as_ref()
            .map(|it| age_at(it.retrieved(), OffsetDateTime::now_utc()))
            .unwrap_or(StdDuration::MAX)
    })
}

pub(crate) fn interval_millis(interval: StdDuration) -> u64 {
    u64::try_from(interval.as_millis()).unwrap_or(u64::MAX)
}

/// Timestamps from the future count as brand new.
fn age_at(retrieved: OffsetDateTime, now: OffsetDateTime) -> StdDuration {
    StdDuration::try_from(now - retrieved).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assertr::prelude::*;

    #[test]
    fn age_is_never_negative() {
        let now = OffsetDateTime::now_utc();
        assert_that(age_at(now - time::Duration::seconds(5), now))
            .is_equal_to(StdDuration::from_secs(5));
        assert_that(age_at(now + time::Duration::seconds(5), now)).is_equal_to(StdDuration::ZERO);
    }

    #[test]
    fn interval_millis_saturates() {
        assert_that(interval_millis(StdDuration::from_secs(3))).is_equal_to(3000);
        assert_that(interval_millis(StdDuration::MAX)).is_equal_to(u64::MAX);
    }
}
