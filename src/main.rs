#[cfg(target_arch = "wasm32")]
fn main() {
    console_error_panic_hook::set_once();
    tracing_wasm::set_as_global_default();

    leptos::mount::mount_to_body(leptos_profile_viewer::app::App);
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    // Only runs in the browser. Build with Trunk: `trunk serve`.
}
