//! Wires a `MediaStage` to live DOM events and browser timers.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};
use std::time::Duration;

use dioxus::logger::tracing::{debug, info, warn};
use gloo_timers::callback::{Interval, Timeout};
use gloo_timers::future::TimeoutFuture;
use js_sys::Array;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{
    window, Document, Element, Event, EventTarget, HtmlVideoElement, MutationObserver,
    MutationObserverInit, MutationRecord, Node,
};

use super::web_media::WebMedia;
use super::web_page::WebPage;
use crate::stage::{
    InstanceId, MediaPolicy, MediaStage, StageError, StageEvent, StageSettings, TimerRequest,
    ATTR_INSTANCE_ID,
};

type WebStage = MediaStage<WebMedia, WebPage>;

/// DOM listener that is removed again when dropped.
struct EventBinding {
    target: EventTarget,
    kind: &'static str,
    callback: Closure<dyn FnMut(Event)>,
}

impl EventBinding {
    fn bind<F>(target: &EventTarget, kind: &'static str, handler: F) -> Result<Self, StageError>
    where
        F: FnMut(Event) + 'static,
    {
        let callback = Closure::wrap(Box::new(handler) as Box<dyn FnMut(Event)>);
        target
            .add_event_listener_with_callback(kind, callback.as_ref().unchecked_ref())
            .map_err(|err| StageError::Platform(format!("failed to listen for {kind}: {err:?}")))?;
        Ok(Self {
            target: target.clone(),
            kind,
            callback,
        })
    }
}

impl Drop for EventBinding {
    fn drop(&mut self) {
        let _ = self
            .target
            .remove_event_listener_with_callback(self.kind, self.callback.as_ref().unchecked_ref());
    }
}

/// Timers and per-element listeners owned on behalf of the stage.
#[derive(Default)]
struct HostResources {
    watchdogs: HashMap<InstanceId, Timeout>,
    scroll_apply: Option<Interval>,
    element_bindings: HashMap<InstanceId, Vec<EventBinding>>,
}

impl HostResources {
    fn clear(&mut self) -> usize {
        let cancelled = self.watchdogs.len() + usize::from(self.scroll_apply.is_some());
        self.watchdogs.clear();
        self.scroll_apply = None;
        self.element_bindings.clear();
        cancelled
    }
}

fn millis(duration: Duration) -> u32 {
    u32::try_from(duration.as_millis()).unwrap_or(u32::MAX)
}

/// Routes browser callbacks into the stage. Holds weak references so the
/// closures it lives in never keep the stage alive on their own.
#[derive(Clone)]
struct Dispatcher {
    stage: Weak<RefCell<WebStage>>,
    resources: Weak<RefCell<HostResources>>,
}

impl Dispatcher {
    fn send(&self, event: StageEvent) {
        let Some(stage) = self.stage.upgrade() else {
            return;
        };
        let (requests, removed) = match stage.try_borrow_mut() {
            Ok(mut stage) => {
                let requests = stage.dispatch(event);
                (requests, stage.take_removed())
            }
            Err(_) => {
                warn!(?event, "media stage busy, dropping event");
                return;
            }
        };
        self.schedule(requests, removed);
    }

    /// Changes are applied on the next task so a timer or listener callback
    /// never drops its own handle while it is running.
    fn schedule(&self, requests: Vec<TimerRequest>, removed: Vec<InstanceId>) {
        if requests.is_empty() && removed.is_empty() {
            return;
        }
        let dispatcher = self.clone();
        spawn_local(async move {
            TimeoutFuture::new(0).await;
            dispatcher.apply(requests, removed);
        });
    }

    fn apply(&self, requests: Vec<TimerRequest>, removed: Vec<InstanceId>) {
        let Some(resources) = self.resources.upgrade() else {
            return;
        };
        let mut resources = resources.borrow_mut();
        for id in removed {
            if let Some(bindings) = resources.element_bindings.remove(&id) {
                debug!(id, listeners = bindings.len(), "released element listeners");
            }
        }
        for request in requests {
            match request {
                TimerRequest::ArmWatchdog {
                    id,
                    generation,
                    delay,
                } => {
                    let dispatcher = self.clone();
                    let timeout = Timeout::new(millis(delay), move || {
                        dispatcher.send(StageEvent::WatchdogFired { id, generation });
                    });
                    resources.watchdogs.insert(id, timeout);
                }
                TimerRequest::CancelWatchdog(id) => {
                    resources.watchdogs.remove(&id);
                }
                TimerRequest::StartScrollApply { period } => {
                    if resources.scroll_apply.is_none() {
                        let dispatcher = self.clone();
                        resources.scroll_apply = Some(Interval::new(millis(period), move || {
                            dispatcher.send(StageEvent::ScrollApplyTick);
                        }));
                    }
                }
                TimerRequest::StopScrollApply => {
                    resources.scroll_apply = None;
                }
            }
        }
    }
}

fn instance_id_of(element: &Element) -> Option<InstanceId> {
    element.get_attribute(ATTR_INSTANCE_ID)?.parse().ok()
}

/// Managed ids inside a node that has left the document. Nodes that were
/// moved rather than removed are still connected and yield nothing.
fn removed_instance_ids(node: &Node) -> Vec<InstanceId> {
    let Some(element) = node.dyn_ref::<Element>() else {
        return Vec::new();
    };
    if element.is_connected() {
        return Vec::new();
    }
    let mut ids: Vec<InstanceId> = instance_id_of(element).into_iter().collect();
    if let Ok(nested) = element.query_selector_all(&format!("[{ATTR_INSTANCE_ID}]")) {
        for index in 0..nested.length() {
            let id = nested
                .item(index)
                .and_then(|node| node.dyn_into::<Element>().ok())
                .and_then(|element| instance_id_of(&element));
            ids.extend(id);
        }
    }
    ids
}

/// Reports managed elements removed from the page as `StageEvent::Removed`.
struct RemovalObserver {
    observer: MutationObserver,
    _callback: Closure<dyn FnMut(Array, MutationObserver)>,
}

impl RemovalObserver {
    fn observe(root: &Node, dispatcher: Dispatcher) -> Result<Self, StageError> {
        let callback = Closure::wrap(Box::new(move |records: Array, _: MutationObserver| {
            for record in records.iter() {
                let Ok(record) = record.dyn_into::<MutationRecord>() else {
                    continue;
                };
                let nodes = record.removed_nodes();
                for index in 0..nodes.length() {
                    let Some(node) = nodes.item(index) else {
                        continue;
                    };
                    for id in removed_instance_ids(&node) {
                        dispatcher.send(StageEvent::Removed(id));
                    }
                }
            }
        }) as Box<dyn FnMut(Array, MutationObserver)>);

        let observer = MutationObserver::new(callback.as_ref().unchecked_ref())
            .map_err(|err| StageError::Platform(format!("MutationObserver: {err:?}")))?;
        let options = MutationObserverInit::new();
        options.set_child_list(true);
        options.set_subtree(true);
        observer
            .observe_with_options(root, &options)
            .map_err(|err| StageError::Platform(format!("observe failed: {err:?}")))?;

        Ok(Self {
            observer,
            _callback: callback,
        })
    }
}

impl Drop for RemovalObserver {
    fn drop(&mut self) {
        self.observer.disconnect();
    }
}

fn discover_videos(
    document: &Document,
    selector: &str,
) -> Result<Vec<HtmlVideoElement>, StageError> {
    let nodes = document
        .query_selector_all(selector)
        .map_err(|err| StageError::Platform(format!("bad selector {selector:?}: {err:?}")))?;
    let mut videos = Vec::new();
    for index in 0..nodes.length() {
        let Some(node) = nodes.item(index) else {
            continue;
        };
        match node.dyn_into::<HtmlVideoElement>() {
            Ok(video) => videos.push(video),
            Err(_) => warn!("{selector} matched a non-video element, skipping it"),
        }
    }
    Ok(videos)
}

fn push_binding(bindings: &mut Vec<EventBinding>, binding: Result<EventBinding, StageError>) {
    match binding {
        Ok(binding) => bindings.push(binding),
        Err(err) => warn!("{err}"),
    }
}

/// A booted stage plus the listeners and timers driving it. Dropping the
/// handle detaches everything.
pub struct StageHandle {
    stage: Rc<RefCell<WebStage>>,
    resources: Rc<RefCell<HostResources>>,
    window_bindings: Vec<EventBinding>,
    observer: Option<RemovalObserver>,
}

impl StageHandle {
    pub fn boot<F>(settings: StageSettings, on_ready: F) -> Result<Self, StageError>
    where
        F: FnMut(InstanceId) + 'static,
    {
        let window = window().ok_or_else(|| StageError::Platform("no window".into()))?;
        let document = window
            .document()
            .ok_or_else(|| StageError::Platform("no document".into()))?;
        let videos = discover_videos(&document, &settings.selector)?;

        let mut stage = MediaStage::new(WebPage::new(window.clone(), document.clone()), settings);
        stage.set_ready_listener(on_ready);
        let stage = Rc::new(RefCell::new(stage));
        let resources = Rc::new(RefCell::new(HostResources::default()));
        let dispatcher = Dispatcher {
            stage: Rc::downgrade(&stage),
            resources: Rc::downgrade(&resources),
        };

        for video in videos {
            let policy = MediaPolicy::from_attributes(|name| video.get_attribute(name));
            let preload = policy.preload;
            let sized = policy.size_mode.is_sized();
            let id = stage.borrow_mut().discover(WebMedia::new(video.clone()), policy);
            if let Err(err) = video.set_attribute(ATTR_INSTANCE_ID, &id.to_string()) {
                warn!(id, "failed to tag media element: {err:?}");
            }
            let bindings = bind_element(&video, id, preload, sized, &dispatcher);
            resources.borrow_mut().element_bindings.insert(id, bindings);
        }

        let needs = stage.borrow().listeners();
        let window_target: &EventTarget = window.as_ref();
        let mut window_bindings = Vec::new();
        if needs.scroll {
            let d = dispatcher.clone();
            push_binding(
                &mut window_bindings,
                EventBinding::bind(window_target, "scroll", move |_| d.send(StageEvent::Scroll)),
            );
        }
        if needs.resize {
            let d = dispatcher.clone();
            push_binding(
                &mut window_bindings,
                EventBinding::bind(window_target, "resize", move |_| d.send(StageEvent::Resize)),
            );
        }

        let observer = match document.document_element() {
            Some(root) => match RemovalObserver::observe(&root, dispatcher.clone()) {
                Ok(observer) => Some(observer),
                Err(err) => {
                    warn!("removed elements will only be noticed on scroll or resize: {err}");
                    None
                }
            },
            None => None,
        };

        let (requests, removed) = {
            let mut stage = stage.borrow_mut();
            let requests = stage.boot();
            (requests, stage.take_removed())
        };
        dispatcher.schedule(requests, removed);
        info!(
            instances = stage.borrow().registry().len(),
            observing = observer.is_some(),
            "media stage booted"
        );

        Ok(Self {
            stage,
            resources,
            window_bindings,
            observer,
        })
    }
}

fn bind_element(
    video: &HtmlVideoElement,
    id: InstanceId,
    preload: bool,
    sized: bool,
    dispatcher: &Dispatcher,
) -> Vec<EventBinding> {
    let target: &EventTarget = video.as_ref();
    let mut bindings = Vec::new();
    if preload {
        let d = dispatcher.clone();
        push_binding(
            &mut bindings,
            EventBinding::bind(target, "progress", move |_| d.send(StageEvent::Progress(id))),
        );
    }
    if sized {
        let d = dispatcher.clone();
        push_binding(
            &mut bindings,
            EventBinding::bind(target, "loadedmetadata", move |_| {
                d.send(StageEvent::MetadataReady(id))
            }),
        );
    }
    let d = dispatcher.clone();
    push_binding(
        &mut bindings,
        EventBinding::bind(target, "ended", move |_| d.send(StageEvent::Ended(id))),
    );
    let d = dispatcher.clone();
    push_binding(
        &mut bindings,
        EventBinding::bind(target, "click", move |event: Event| {
            event.prevent_default();
            d.send(StageEvent::Click(id));
        }),
    );
    bindings
}

impl Drop for StageHandle {
    fn drop(&mut self) {
        self.observer = None;
        self.window_bindings.clear();
        let requested = match self.stage.try_borrow_mut() {
            Ok(mut stage) => stage.shutdown().len(),
            Err(_) => 0,
        };
        let cancelled = match self.resources.try_borrow_mut() {
            Ok(mut resources) => resources.clear(),
            Err(_) => 0,
        };
        debug!(requested, cancelled, "media stage torn down");
    }
}
