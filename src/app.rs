use leptos::either::Either;
use leptos::prelude::*;
use leptos_router::components::Router;

use crate::components::{GetUser, LoginButton, LogoutButton, Profile, SessionProvider};
use crate::environment::ENVIRONMENT;

#[component]
#[allow(clippy::must_use_candidate)]
pub fn App() -> impl IntoView {
    let config = ENVIRONMENT
        .session_options()
        .and_then(|options| Ok((options, ENVIRONMENT.api_endpoints()?)));

    match config {
        Ok((options, endpoints)) => Either::Left(view! {
            <Router>
                <main>
                    <SessionProvider options=options endpoints=endpoints>
                        <LoginButton/>
                        <LogoutButton/>
                        <Profile/>
                        <GetUser/>
                    </SessionProvider>
                </main>
            </Router>
        }),
        Err(err) => {
            tracing::error!(?err, "Invalid app configuration.");
            Either::Right(view! { <p>"This app is not configured correctly."</p> })
        }
    }
}
