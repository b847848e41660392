//! Loading and presenting the signed-in user's provider-side metadata.

use serde_json::Value;
use snafu::OptionExt;

use crate::error::{FetchError, InvalidRequestUrlSnafu};
use crate::{AuthenticatedClient, IdentityClient, JsonTransport, ManagementApi, UserRecord};

/// Shown in place of metadata which is absent, `null` or could not be loaded.
pub const NO_METADATA_TEXT: &str = "No user metadata defined";

/// Metadata as loaded for one particular user.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedMetadata {
    pub subject: String,
    pub metadata: Option<Value>,
}

/// Loaded metadata, but only while it belongs to the user currently signed in.
pub fn visible_metadata<'a>(
    loaded: Option<&'a LoadedMetadata>,
    current_subject: Option<&str>,
) -> Option<&'a Value> {
    loaded
        .filter(|it| Some(it.subject.as_str()) == current_subject)
        .and_then(|it| it.metadata.as_ref())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataView {
    /// Pretty-printed with an indentation of two spaces.
    Json(String),
    Fallback,
}

impl MetadataView {
    pub fn of(metadata: Option<&Value>) -> Self {
        match metadata {
            None | Some(Value::Null) => MetadataView::Fallback,
            Some(value) => match serde_json::to_string_pretty(value) {
                Ok(json) => MetadataView::Json(json),
                Err(err) => {
                    tracing::error!(?err, "Could not render user metadata.");
                    MetadataView::Fallback
                }
            },
        }
    }
}

/// Everything the profile viewer displays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileContent {
    pub picture: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub metadata: MetadataView,
}

impl ProfileContent {
    /// Nothing is displayed unless a user is signed in.
    pub fn of(
        is_authenticated: bool,
        user: Option<&UserRecord>,
        loaded: Option<&LoadedMetadata>,
    ) -> Option<Self> {
        let user = user.filter(|_| is_authenticated)?;
        Some(Self {
            picture: user.picture.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            metadata: MetadataView::of(visible_metadata(loaded, Some(&user.subject))),
        })
    }
}

/// Reads a user's `user_metadata` through the provider's management API.
#[derive(Debug, Clone)]
pub struct ProfileLoader<I, T> {
    client: AuthenticatedClient<I, T>,
    api: ManagementApi,
}

impl<I: IdentityClient, T: JsonTransport> ProfileLoader<I, T> {
    pub fn new(identity: I, transport: T, api: ManagementApi) -> Self {
        Self {
            client: AuthenticatedClient::new(identity, transport),
            api,
        }
    }

    pub async fn fetch(&self, subject: &str) -> Result<Option<Value>, FetchError> {
        let url = self.api.user_url(subject).context(InvalidRequestUrlSnafu {
            url: self.api.base_url.to_string(),
        })?;

        let mut user = self
            .client
            .get_json(url, self.api.read_current_user())
            .await?;

        Ok(match user.get_mut("user_metadata").map(Value::take) {
            None | Some(Value::Null) => None,
            Some(metadata) => Some(metadata),
        })
    }

    /// Failures are logged and yield `None`.
    pub async fn load(self, subject: String) -> Option<LoadedMetadata> {
        match self.fetch(&subject).await {
            Ok(metadata) => Some(LoadedMetadata { subject, metadata }),
            Err(err) => {
                tracing::error!(?err, %subject, "Could not load user metadata.");
                None
            }
        }
    }
}
