//! Stage controller: owns the registry and routes page events to the policies.

use dioxus::logger::tracing::{debug, info, warn};

use crate::diagnostics::log_perf;

use super::platform::{ListenerNeeds, MediaElement, PageHost, StageEvent, TimerRequest};
use super::policy::{MediaPolicy, StageSettings};
use super::preload::{PreloadMonitor, ProgressSample, ResolveReason};
use super::registry::{InstanceId, InstanceRegistry};
use super::scroll_seek::{apply_scroll_targets, recompute_scroll_targets};
use super::sizing::compute_fit;
use super::visibility::schedule_visibility;

type ReadyListener = Box<dyn FnMut(InstanceId)>;

pub struct MediaStage<E: MediaElement, P: PageHost> {
    registry: InstanceRegistry<E>,
    page: P,
    settings: StageSettings,
    scroll_apply_running: bool,
    ready_listener: Option<ReadyListener>,
    /// Pruned since the host last asked; it drops their per-element listeners.
    removed: Vec<InstanceId>,
}

impl<E: MediaElement, P: PageHost> MediaStage<E, P> {
    pub fn new(page: P, settings: StageSettings) -> Self {
        Self {
            registry: InstanceRegistry::new(),
            page,
            settings,
            scroll_apply_running: false,
            ready_listener: None,
            removed: Vec::new(),
        }
    }

    pub fn registry(&self) -> &InstanceRegistry<E> {
        &self.registry
    }

    /// Ids dropped from the registry since the last call.
    pub fn take_removed(&mut self) -> Vec<InstanceId> {
        std::mem::take(&mut self.removed)
    }

    /// Called once per instance when it becomes ready to play.
    pub fn set_ready_listener<F>(&mut self, listener: F)
    where
        F: FnMut(InstanceId) + 'static,
    {
        self.ready_listener = Some(Box::new(listener));
    }

    /// Register a discovered element and start its preload or ready sequence.
    pub fn discover(&mut self, element: E, policy: MediaPolicy) -> InstanceId {
        let preload = policy.preload;
        let id = self.registry.create(element, policy);

        if preload {
            if let Ok(instance) = self.registry.get_mut(id) {
                instance.element.set_visible(false);
                instance.element.load();
                instance.preload = Some(PreloadMonitor::start());
                debug!(id, "preloading");
            }
        } else {
            self.make_ready(id);
        }
        id
    }

    /// Global listeners the host should bind for the current instances.
    pub fn listeners(&self) -> ListenerNeeds {
        let in_view = self.registry.any(|p| p.play_when_in_view);
        ListenerNeeds {
            scroll: in_view || self.registry.any(|p| p.bind_scroll),
            resize: in_view || self.registry.any(|p| p.size_mode.is_sized()),
        }
    }

    /// Startup pass once discovery is done.
    pub fn boot(&mut self) -> Vec<TimerRequest> {
        let mut requests = Vec::new();
        info!(
            instances = self.registry.len(),
            "media stage booting"
        );
        self.sweep_detached(&mut requests);

        if self.registry.any(|p| p.bind_scroll) {
            let missing = recompute_scroll_targets(&mut self.registry, &self.page);
            self.prune(missing, &mut requests);
            self.ensure_scroll_apply(&mut requests);
        }
        self.resize_pass(&mut requests);
        self.visibility_pass(&mut requests);
        requests
    }

    pub fn dispatch(&mut self, event: StageEvent) -> Vec<TimerRequest> {
        let mut requests = Vec::new();

        match event {
            StageEvent::Progress(id) => self.on_progress(id, &mut requests),
            StageEvent::WatchdogFired { id, generation } => {
                self.on_watchdog(id, generation, &mut requests)
            }
            StageEvent::MetadataReady(id) => {
                let sized = self
                    .registry
                    .get(id)
                    .map(|instance| instance.policy().size_mode.is_sized());
                match sized {
                    Ok(true) => {
                        self.resize_pass(&mut requests);
                        self.visibility_pass(&mut requests);
                    }
                    Ok(false) => {}
                    Err(_) => self.prune(vec![id], &mut requests),
                }
            }
            StageEvent::Ended(id) => self.on_ended(id, &mut requests),
            StageEvent::Click(id) => self.on_click(id, &mut requests),
            StageEvent::Scroll => {
                self.sweep_detached(&mut requests);
                if self.registry.any(|p| p.bind_scroll) {
                    let missing = recompute_scroll_targets(&mut self.registry, &self.page);
                    self.prune(missing, &mut requests);
                }
                self.visibility_pass(&mut requests);
            }
            StageEvent::Resize => {
                self.sweep_detached(&mut requests);
                self.resize_pass(&mut requests);
                self.visibility_pass(&mut requests);
            }
            StageEvent::ScrollApplyTick => {
                let missing = apply_scroll_targets(&mut self.registry);
                self.prune(missing, &mut requests);
            }
            StageEvent::Removed(id) => self.prune(vec![id], &mut requests),
        }

        requests
    }

    /// Drop every instance and cancel every live timer.
    pub fn shutdown(&mut self) -> Vec<TimerRequest> {
        let mut requests = Vec::new();
        let ids = self.registry.ids();
        info!(instances = ids.len(), "media stage shutting down");
        self.prune(ids, &mut requests);
        if self.scroll_apply_running {
            self.scroll_apply_running = false;
            requests.push(TimerRequest::StopScrollApply);
        }
        requests
    }

    fn on_progress(&mut self, id: InstanceId, requests: &mut Vec<TimerRequest>) {
        let now = self.page.now_seconds();
        let nudge = self.settings.preload_nudge_seconds;
        let instance = match self.registry.get_mut(id) {
            Ok(instance) => instance,
            Err(_) => return self.prune(vec![id], requests),
        };
        let element = &instance.element;
        let Some(monitor) = instance.preload.as_mut() else {
            return;
        };
        let (Some(duration), Some(buffered_end)) = (element.duration(), element.buffered_end())
        else {
            return;
        };

        let step = monitor.on_progress(ProgressSample {
            buffered_end,
            duration,
            now,
        });

        if let Some(generation) = step.arm_watchdog {
            requests.push(TimerRequest::ArmWatchdog {
                id,
                generation,
                delay: self.settings.stuck_timeout(),
            });
        }

        match step.resolved {
            Some(reason) => self.finish_preload(id, reason, requests),
            None if !monitor.is_resolved() => {
                // Keep the platform fetching ahead of the playhead.
                element.set_current_time(element.current_time() + nudge);
            }
            None => {}
        }
    }

    fn on_watchdog(&mut self, id: InstanceId, generation: u64, requests: &mut Vec<TimerRequest>) {
        let instance = match self.registry.get_mut(id) {
            Ok(instance) => instance,
            Err(_) => return self.prune(vec![id], requests),
        };
        let reason = instance
            .preload
            .as_mut()
            .and_then(|monitor| monitor.on_watchdog(generation));
        if let Some(reason) = reason {
            self.finish_preload(id, reason, requests);
        }
    }

    fn finish_preload(
        &mut self,
        id: InstanceId,
        reason: ResolveReason,
        requests: &mut Vec<TimerRequest>,
    ) {
        requests.push(TimerRequest::CancelWatchdog(id));
        if let Ok(instance) = self.registry.get(id) {
            instance.element.set_current_time(0.0);
        }
        info!(id, ?reason, "preload finished");

        self.make_ready(id);
        self.resize_pass(requests);
        self.visibility_pass(requests);
    }

    /// Volume, fade, reveal and input handling for an instance allowed to play.
    fn make_ready(&mut self, id: InstanceId) {
        let fade_duration = self.settings.fade_in_duration();
        let Ok(instance) = self.registry.get_mut(id) else {
            return;
        };
        if instance.ready {
            return;
        }

        let element = &instance.element;
        element.set_volume(0.0);
        if instance.policy().fade_in {
            element.fade_to(0.0, std::time::Duration::ZERO);
        }
        element.set_volume(instance.policy().initial_volume);
        element.set_visible(true);
        if instance.policy().fade_in {
            element.fade_to(1.0, fade_duration);
        }
        instance.ready = true;

        if let Some(listener) = self.ready_listener.as_mut() {
            listener(id);
        }
    }

    fn on_ended(&mut self, id: InstanceId, requests: &mut Vec<TimerRequest>) {
        match self.registry.get(id) {
            Ok(instance) if instance.ready && !instance.element.is_looping() => {
                // Show the first frame again instead of the last one.
                instance.element.set_current_time(0.0);
                instance.element.pause();
            }
            Ok(_) => {}
            Err(_) => self.prune(vec![id], requests),
        }
    }

    fn on_click(&mut self, id: InstanceId, requests: &mut Vec<TimerRequest>) {
        match self.registry.get(id) {
            Ok(instance) if instance.ready => {
                if instance.element.is_paused() {
                    instance.element.play();
                } else {
                    instance.element.pause();
                }
            }
            Ok(_) => {}
            Err(_) => self.prune(vec![id], requests),
        }
    }

    fn resize_pass(&mut self, requests: &mut Vec<TimerRequest>) {
        let ids = self.registry.ids_where(|p| p.size_mode.is_sized());
        if ids.is_empty() {
            return;
        }
        let started_at = self.page.now_seconds();
        let mut missing = Vec::new();

        for id in ids {
            let Ok(instance) = self.registry.get(id) else {
                missing.push(id);
                continue;
            };
            let container = instance.element.container_box().size();
            let media = instance.element.intrinsic_size();
            if let Some(fit) = compute_fit(container, media, instance.policy().size_mode) {
                instance.element.apply_fit(&fit);
            }
        }

        log_perf("resize pass", started_at, self.page.now_seconds(), "");
        self.prune(missing, requests);
    }

    fn visibility_pass(&mut self, requests: &mut Vec<TimerRequest>) {
        if !self.registry.any(|p| p.play_when_in_view) {
            return;
        }
        let started_at = self.page.now_seconds();
        let report = schedule_visibility(&mut self.registry, self.page.viewport());
        log_perf(
            "visibility pass",
            started_at,
            self.page.now_seconds(),
            &format!("visible={} hidden={}", report.visible.len(), report.hidden.len()),
        );
        self.prune(report.missing, requests);
    }

    fn ensure_scroll_apply(&mut self, requests: &mut Vec<TimerRequest>) {
        if !self.scroll_apply_running {
            self.scroll_apply_running = true;
            requests.push(TimerRequest::StartScrollApply {
                period: self.settings.scroll_apply_period(),
            });
        }
    }

    /// Instances no policy pass visits would otherwise never notice detachment.
    fn sweep_detached(&mut self, requests: &mut Vec<TimerRequest>) {
        let detached = self.registry.detached_ids();
        if !detached.is_empty() {
            self.prune(detached, requests);
        }
    }

    /// Forget instances whose element is gone and release their timers.
    fn prune(&mut self, ids: Vec<InstanceId>, requests: &mut Vec<TimerRequest>) {
        for id in ids {
            let Some(instance) = self.registry.remove(id) else {
                continue;
            };
            if instance.preload.is_some() {
                requests.push(TimerRequest::CancelWatchdog(id));
            }
            if instance.element.is_attached() {
                debug!(id, "instance removed");
            } else {
                warn!(id, "media element detached, dropping instance");
            }
            self.removed.push(id);
        }

        if self.scroll_apply_running && !self.registry.any(|p| p.bind_scroll) {
            self.scroll_apply_running = false;
            requests.push(TimerRequest::StopScrollApply);
        }
    }
}
