use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// See: <https://openid.net/specs/openid-connect-core-1_0.html#IDToken>
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub(crate) struct StandardIdTokenClaims {
    pub(crate) iss: String,
    pub(crate) sub: String,
    pub(crate) aud: RawAudiences,
    pub(crate) exp: i64,
    pub(crate) iat: i64,
    pub(crate) nonce: Option<String>,
    pub(crate) azp: Option<String>,
    #[serde(flatten)]
    pub(crate) remaining: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub(crate) enum RawAudiences {
    Single(String),
    Multiple(Vec<String>),
}

/// The signed-in user, as described by a validated ID token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    /// (sub) Identifier of the user at the identity provider, E.g. "auth0|64b9f1c2d3e4f5a6b7c8d9e0".
    pub subject: String,

    pub name: Option<String>,

    pub nickname: Option<String>,

    pub email: Option<String>,

    pub email_verified: Option<bool>,

    /// Url of the user's avatar.
    pub picture: Option<String>,

    /// All further claims not mentioned above.
    pub additional_claims: HashMap<String, serde_json::Value>,
}

impl From<StandardIdTokenClaims> for UserRecord {
    fn from(mut raw: StandardIdTokenClaims) -> Self {
        fn take<T: serde::de::DeserializeOwned>(
            claims: &mut HashMap<String, serde_json::Value>,
            name: &str,
        ) -> Option<T> {
            claims
                .remove(name)
                .and_then(|it| serde_json::from_value(it).ok())
        }

        Self {
            subject: raw.sub,
            name: take(&mut raw.remaining, "name"),
            nickname: take(&mut raw.remaining, "nickname"),
            email: take(&mut raw.remaining, "email"),
            email_verified: take(&mut raw.remaining, "email_verified"),
            picture: take(&mut raw.remaining, "picture"),
            additional_claims: raw.remaining,
        }
    }
}
