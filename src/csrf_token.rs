/// Cryptographically secure value sent as the OAuth `state` parameter, tying a callback to the
/// login this tab started.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub(crate) struct CsrfToken {
    csrf_token: String,
}

impl CsrfToken {
    /// 32 bytes of random data, base64 url encoded as a 43 character string.
    pub(crate) fn new() -> Self {
        use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
        use rand::Rng;

        let bytes: [u8; 32] = rand::rng().random();
        Self {
            csrf_token: URL_SAFE_NO_PAD.encode(bytes),
        }
    }

    pub(crate) fn as_str(&self) -> &str {
        &self.csrf_token
    }

    /// A callback without a state never matches.
    pub(crate) fn matches(&self, received: Option<&str>) -> bool {
        received.is_some_and(|received| received == self.csrf_token)
    }
}

impl Default for CsrfToken {
    fn default() -> Self {
        Self::new()
    }
}
