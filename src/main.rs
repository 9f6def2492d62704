use dioxus::logger::tracing::Level;
use dioxus::prelude::*;

mod components;
// The stage drives DOM media, so native renderers only build it for tests.
#[cfg(any(target_arch = "wasm32", test))]
mod diagnostics;
#[cfg(any(target_arch = "wasm32", test))]
mod settings;
#[cfg(any(target_arch = "wasm32", test))]
mod stage;

use components::Showcase;

fn main() {
    if let Err(err) = dioxus::logger::init(Level::INFO) {
        eprintln!("failed to init logger: {err}");
    }
    dioxus::launch(App);
}

#[component]
fn App() -> Element {
    rsx! {
        document::Title { "ReelStage" }
        document::Meta { name: "theme-color", content: "#111111" }

        Showcase {}
    }
}
