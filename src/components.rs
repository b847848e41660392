use leptos::either::Either;
use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::profile::{LoadedMetadata, MetadataView, NO_METADATA_TEXT, ProfileContent, ProfileLoader};
use crate::user_list::{USER_LIST_PLACEHOLDER, UserListFetcher};
use crate::{
    ApiEndpoints, ReqwestTransport, TaskScope, UseSessionOptions, init_session, triggers,
    use_session,
};

/// Initializes the [`Session`](crate::Session) and makes it, together with the given API
/// endpoints, available to all children.
#[component]
#[allow(clippy::must_use_candidate)]
pub fn SessionProvider(
    options: UseSessionOptions,

    /// The APIs queried by [`Profile`] and [`GetUser`].
    endpoints: ApiEndpoints,

    children: Children,
) -> impl IntoView {
    match init_session(options) {
        Ok(_session) => {
            provide_context(endpoints);
            Either::Left(children())
        }
        Err(err) => {
            tracing::error!(?err, "Could not initialize session.");
            Either::Right(view! { <p>"Authentication is not configured correctly."</p> })
        }
    }
}

#[component]
#[allow(clippy::must_use_candidate)]
pub fn LoginButton() -> impl IntoView {
    let session = use_session();
    view! {
        <button on:click=move |_| triggers::activate_login(&session)>"Log In"</button>
    }
}

/// Logs out and returns to the configured post-logout redirect url.
#[component]
#[allow(clippy::must_use_candidate)]
pub fn LogoutButton() -> impl IntoView {
    let session = use_session();
    view! {
        <button on:click=move |_| triggers::activate_logout(&session, None)>"Log Out"</button>
    }
}

/// The signed-in user and their metadata, as kept by the identity provider. Renders nothing while
/// signed out.
#[component]
#[allow(clippy::must_use_candidate)]
pub fn Profile() -> impl IntoView {
    let session = use_session();
    let api = expect_context::<ApiEndpoints>().management;

    let loads = TaskScope::new();
    loads.tie_to_owner();

    let (loaded, set_loaded) = signal(None::<LoadedMetadata>);

    let subject = Memo::new(move |_| match session.is_authenticated.get() {
        true => session.user.read().as_ref().map(|it| it.subject.clone()),
        false => None,
    });

    Effect::new(move |_| {
        let subject = subject.get();
        loads.cancel_all();
        set_loaded.set(None);

        let Some(subject) = subject else {
            return;
        };
        let loader = ProfileLoader::new(session, ReqwestTransport::default(), api.clone());
        let load = loads.wrap(loader.load(subject));
        spawn_local(async move {
            if let Some(Some(metadata)) = load.await {
                set_loaded.try_set(Some(metadata));
            }
        });
    });

    move || {
        let content = session.user.with(|user| {
            loaded.with(|loaded| {
                ProfileContent::of(
                    session.is_authenticated.get(),
                    user.as_ref(),
                    loaded.as_ref(),
                )
            })
        })?;

        Some(view! {
            <div>
                <img src=content.picture alt=content.name.clone()/>
                <h2>{content.name}</h2>
                <p>{content.email}</p>
                <h3>"User Metadata"</h3>
                {match content.metadata {
                    MetadataView::Json(json) => Either::Left(view! { <pre>{json}</pre> }),
                    MetadataView::Fallback => Either::Right(NO_METADATA_TEXT),
                }}
            </div>
        })
    }
}

/// Fetches the user list of the backend on each click and shows the most recently received one.
#[component]
#[allow(clippy::must_use_candidate)]
pub fn GetUser() -> impl IntoView {
    let session = use_session();
    let backend = expect_context::<ApiEndpoints>().backend;

    let fetches = TaskScope::new();
    fetches.tie_to_owner();

    let (users, set_users) = signal(USER_LIST_PLACEHOLDER.to_owned());
    let fetcher = UserListFetcher::new(session, ReqwestTransport::default(), backend);

    // Earlier fetches are not cancelled. Whichever response arrives last is shown.
    let on_click = move |ev: leptos::ev::MouseEvent| {
        if !fetcher.begin(&ev) {
            return;
        }
        let fetch = fetches.wrap(fetcher.clone().run());
        spawn_local(async move {
            if let Some(Some(text)) = fetch.await {
                set_users.try_set(text);
            }
        });
    };

    view! {
        <button on:click=on_click>"Get User"</button>
        <h5>{users}</h5>
    }
}
