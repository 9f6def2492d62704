//! Play-while-visible scheduling.

use dioxus::logger::tracing::debug;

use super::geometry::{Rect, Viewport};
use super::platform::MediaElement;
use super::policy::SizeMode;
use super::registry::{InstanceId, InstanceRegistry, MediaInstance};

/// Whether an instance should resume playing once visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StartingIntent {
    #[default]
    Unknown,
    Play,
    Pause,
}

impl StartingIntent {
    /// Resolve the intent on first use; later calls return the stored value.
    pub fn resolve_with<F>(&mut self, autoplay: F) -> StartingIntent
    where
        F: FnOnce() -> bool,
    {
        if *self == StartingIntent::Unknown {
            *self = if autoplay() {
                StartingIntent::Play
            } else {
                StartingIntent::Pause
            };
        }
        *self
    }
}

/// Open-interval overlap of `bounds` with the viewport on both axes.
pub fn is_visible(bounds: Rect, viewport: Viewport) -> bool {
    let view = viewport.rect();
    bounds.top < view.bottom()
        && bounds.left < view.right()
        && bounds.bottom() > view.top
        && bounds.right() > view.left
}

/// Box used for the visibility test. Covered media overflows its container,
/// so the container is the region that is actually on screen.
pub fn visibility_bounds<E: MediaElement>(instance: &MediaInstance<E>) -> Rect {
    if instance.policy().size_mode == SizeMode::Cover {
        instance.element.container_box()
    } else {
        instance.element.element_box()
    }
}

/// Outcome of one visibility pass.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct VisibilityReport {
    pub visible: Vec<InstanceId>,
    pub hidden: Vec<InstanceId>,
    /// Instances that could not be evaluated (gone or detached).
    pub missing: Vec<InstanceId>,
}

/// Evaluate every play-when-in-view instance against the viewport.
///
/// Invisible instances are always paused. Visible ones are played only when
/// their starting intent is `Play` and they are ready (a preloading instance
/// never starts early).
pub fn schedule_visibility<E: MediaElement>(
    registry: &mut InstanceRegistry<E>,
    viewport: Viewport,
) -> VisibilityReport {
    let mut report = VisibilityReport::default();

    for id in registry.ids_where(|policy| policy.play_when_in_view) {
        let instance = match registry.get_mut(id) {
            Ok(instance) => instance,
            Err(err) => {
                debug_assert!(err.is_missing());
                report.missing.push(id);
                continue;
            }
        };

        let element = &instance.element;
        let intent = instance
            .starting_intent
            .resolve_with(|| element.has_autoplay());

        if is_visible(visibility_bounds(instance), viewport) {
            if intent == StartingIntent::Play && instance.ready && instance.element.is_paused() {
                debug!(id, "in view, playing");
                instance.element.play();
            }
            report.visible.push(id);
        } else {
            instance.element.pause();
            report.hidden.push(id);
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::policy::MediaPolicy;
    use crate::stage::testing::{FakeMedia, MediaCommand};

    fn viewport(scroll_y: f64) -> Viewport {
        Viewport {
            scroll_x: 0.0,
            scroll_y,
            width: 800.0,
            height: 500.0,
        }
    }

    fn in_view_policy() -> MediaPolicy {
        MediaPolicy {
            play_when_in_view: true,
            ..MediaPolicy::default()
        }
    }

    #[test]
    fn overlap_is_open_interval() {
        let bounds = Rect::new(500.0, 0.0, 100.0, 100.0);
        // Touching the bottom edge is not visible.
        assert!(!is_visible(bounds, viewport(0.0)));
        assert!(is_visible(bounds, viewport(1.0)));
        // Touching the top edge is not visible either.
        assert!(!is_visible(bounds, viewport(600.0)));
    }

    #[test]
    fn intent_is_resolved_once() {
        let mut intent = StartingIntent::Unknown;
        assert_eq!(intent.resolve_with(|| true), StartingIntent::Play);
        assert_eq!(intent.resolve_with(|| false), StartingIntent::Play);
    }

    #[test]
    fn toggles_with_scroll() {
        let media = FakeMedia::new().with_autoplay(true);
        media.set_element_box(Rect::new(1000.0, 0.0, 400.0, 100.0));
        let mut registry = InstanceRegistry::new();
        let id = registry.create(media.clone(), in_view_policy());
        registry.get_mut(id).unwrap().ready = true;

        let report = schedule_visibility(&mut registry, viewport(0.0));
        assert_eq!(report.hidden, vec![id]);
        assert_eq!(media.last_command(), Some(MediaCommand::Pause));

        let report = schedule_visibility(&mut registry, viewport(950.0));
        assert_eq!(report.visible, vec![id]);
        assert_eq!(media.last_command(), Some(MediaCommand::Play));
        assert!(!media.is_paused());

        // Same position again: no duplicate play.
        let plays = media.count(MediaCommand::Play);
        schedule_visibility(&mut registry, viewport(950.0));
        assert_eq!(media.count(MediaCommand::Play), plays);
    }

    #[test]
    fn pause_intent_never_starts() {
        let media = FakeMedia::new().with_autoplay(false);
        media.set_element_box(Rect::new(0.0, 0.0, 100.0, 100.0));
        let mut registry = InstanceRegistry::new();
        let id = registry.create(media.clone(), in_view_policy());
        registry.get_mut(id).unwrap().ready = true;

        schedule_visibility(&mut registry, viewport(0.0));
        assert_eq!(media.count(MediaCommand::Play), 0);
        assert_eq!(
            registry.get(id).unwrap().starting_intent,
            StartingIntent::Pause
        );

        // Started by hand, then scrolled away: still paused.
        media.play();
        schedule_visibility(&mut registry, viewport(5000.0));
        assert!(media.is_paused());
    }

    #[test]
    fn cover_uses_container_box() {
        let media = FakeMedia::new().with_autoplay(true);
        media.set_element_box(Rect::new(-400.0, 0.0, 100.0, 100.0));
        media.set_container_box(Rect::new(100.0, 0.0, 100.0, 100.0));
        let mut registry = InstanceRegistry::new();
        let id = registry.create(
            media.clone(),
            MediaPolicy {
                size_mode: SizeMode::Cover,
                ..in_view_policy()
            },
        );

        let instance = registry.get(id).unwrap();
        assert!(is_visible(visibility_bounds(instance), viewport(0.0)));
    }

    #[test]
    fn preloading_instances_are_not_started() {
        let media = FakeMedia::new().with_autoplay(true);
        media.set_element_box(Rect::new(0.0, 0.0, 100.0, 100.0));
        let mut registry = InstanceRegistry::new();
        registry.create(media.clone(), in_view_policy());

        schedule_visibility(&mut registry, viewport(0.0));
        assert_eq!(media.count(MediaCommand::Play), 0);
    }

    #[test]
    fn detached_instances_are_reported_missing() {
        let gone = FakeMedia::new();
        let kept = FakeMedia::new().with_autoplay(true);
        kept.set_element_box(Rect::new(0.0, 0.0, 100.0, 100.0));
        let mut registry = InstanceRegistry::new();
        let gone_id = registry.create(gone.clone(), in_view_policy());
        let kept_id = registry.create(kept.clone(), in_view_policy());
        registry.get_mut(kept_id).unwrap().ready = true;
        gone.detach();

        let report = schedule_visibility(&mut registry, viewport(0.0));
        assert_eq!(report.missing, vec![gone_id]);
        assert_eq!(report.visible, vec![kept_id]);
        assert!(!kept.is_paused());
    }
}
