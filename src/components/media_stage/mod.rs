//! Mounts the media stage over every managed video on the page.

use dioxus::prelude::*;

#[cfg(target_arch = "wasm32")]
mod binding;
#[cfg(target_arch = "wasm32")]
mod web_media;
#[cfg(target_arch = "wasm32")]
mod web_page;

#[cfg(target_arch = "wasm32")]
use dioxus::core::{Runtime, RuntimeGuard};

/// One instance finishing its ready sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadyEntry {
    /// Value of the element's `data-video-id`.
    pub id: u32,
    pub at: chrono::DateTime<chrono::Local>,
}

impl ReadyEntry {
    #[cfg(target_arch = "wasm32")]
    pub fn now(id: u32) -> Self {
        Self {
            id,
            at: chrono::Local::now(),
        }
    }

    pub fn label(&self) -> String {
        format!("#{} ready at {}", self.id, self.at.format("%H:%M:%S"))
    }
}

/// Boots the stage after the page content has mounted and tears it down on
/// unmount. Place it after the managed videos in the tree.
#[cfg(target_arch = "wasm32")]
#[component]
pub fn MediaStageController(ready_log: Signal<Vec<ReadyEntry>>) -> Element {
    use std::cell::RefCell;
    use std::rc::Rc;

    use dioxus::logger::tracing::warn;

    use crate::settings::load_settings;
    use crate::stage::InstanceId;
    use binding::StageHandle;

    let handle = use_hook(|| Rc::new(RefCell::new(None::<StageHandle>)));

    let boot_handle = handle.clone();
    use_effect(move || {
        if boot_handle.borrow().is_some() {
            return;
        }
        let runtime = Runtime::current();
        let mut ready_log = ready_log;
        let on_ready = move |id: InstanceId| {
            let _guard = RuntimeGuard::new(runtime.clone());
            ready_log.write().push(ReadyEntry::now(id));
        };
        match StageHandle::boot(load_settings(), on_ready) {
            Ok(stage) => *boot_handle.borrow_mut() = Some(stage),
            Err(err) => warn!("media stage failed to boot: {err}"),
        }
    });

    use_drop(move || {
        handle.borrow_mut().take();
    });

    rsx! {}
}

/// Native renderers have no DOM media to drive.
#[cfg(not(target_arch = "wasm32"))]
#[component]
pub fn MediaStageController(ready_log: Signal<Vec<ReadyEntry>>) -> Element {
    let _ = ready_log;
    rsx! {}
}
