//! Scroll-bound seeking.
//!
//! Recompute runs on every scroll event and only stores a target; apply runs
//! on a fixed period and performs the seek, so bursts of scroll events cost
//! at most one seek per period.

use super::platform::{MediaElement, PageHost};
use super::registry::{InstanceId, InstanceRegistry};

/// Map whole-document scroll progress onto the seekable duration.
///
/// A page that cannot scroll maps to `0.0`; the result is always within
/// `[0, seekable_duration]`.
pub fn scroll_target(
    scroll_top: f64,
    document_height: f64,
    viewport_height: f64,
    seekable_duration: f64,
) -> f64 {
    let scrollable = document_height - viewport_height;
    if scrollable.is_nan()
        || scrollable <= 0.0
        || seekable_duration.is_nan()
        || seekable_duration <= 0.0
        || !scroll_top.is_finite()
    {
        return 0.0;
    }
    let progress = (scroll_top / scrollable).clamp(0.0, 1.0);
    progress * seekable_duration
}

/// Pause each scroll-bound instance and store its new target time.
///
/// Returns the ids that could not be reached.
pub fn recompute_scroll_targets<E, P>(registry: &mut InstanceRegistry<E>, page: &P) -> Vec<InstanceId>
where
    E: MediaElement,
    P: PageHost,
{
    let viewport = page.viewport();
    let document_height = page.document_height();
    let mut missing = Vec::new();

    for id in registry.ids_where(|policy| policy.bind_scroll) {
        let Ok(instance) = registry.get_mut(id) else {
            missing.push(id);
            continue;
        };
        instance.element.pause();
        let seekable = instance.element.seekable_end().unwrap_or(0.0);
        instance.scroll_target_seconds =
            scroll_target(viewport.scroll_y, document_height, viewport.height, seekable);
    }

    missing
}

/// Seek each scroll-bound instance to its stored target.
pub fn apply_scroll_targets<E: MediaElement>(registry: &mut InstanceRegistry<E>) -> Vec<InstanceId> {
    let mut missing = Vec::new();

    for id in registry.ids_where(|policy| policy.bind_scroll) {
        match registry.get(id) {
            Ok(instance) => instance
                .element
                .set_current_time(instance.scroll_target_seconds),
            Err(_) => missing.push(id),
        }
    }

    missing
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::policy::MediaPolicy;
    use crate::stage::testing::{FakeMedia, FakePage, MediaCommand};

    #[test]
    fn maps_scroll_progress_linearly() {
        assert_eq!(scroll_target(500.0, 2000.0, 1000.0, 60.0), 30.0);
        assert_eq!(scroll_target(0.0, 2000.0, 1000.0, 60.0), 0.0);
        assert_eq!(scroll_target(1000.0, 2000.0, 1000.0, 60.0), 60.0);
    }

    #[test]
    fn unscrollable_page_clamps_to_zero() {
        let target = scroll_target(0.0, 1000.0, 1000.0, 60.0);
        assert_eq!(target, 0.0);
        assert!(target.is_finite());
        assert_eq!(scroll_target(10.0, 800.0, 1000.0, 60.0), 0.0);
    }

    #[test]
    fn nan_layout_clamps_to_zero() {
        assert_eq!(scroll_target(100.0, f64::NAN, 1000.0, 60.0), 0.0);
        assert_eq!(scroll_target(100.0, 2000.0, 1000.0, f64::NAN), 0.0);
        assert_eq!(scroll_target(f64::NAN, 2000.0, 1000.0, 60.0), 0.0);
    }

    #[test]
    fn overscroll_stays_in_range() {
        assert_eq!(scroll_target(-40.0, 2000.0, 1000.0, 60.0), 0.0);
        assert_eq!(scroll_target(1200.0, 2000.0, 1000.0, 60.0), 60.0);
    }

    #[test]
    fn recompute_then_apply() {
        let media = FakeMedia::new().with_seekable_end(60.0);
        media.play();
        let page = FakePage::new(1000.0, 2000.0);
        page.scroll_to(500.0);

        let mut registry = InstanceRegistry::new();
        let id = registry.create(
            media.clone(),
            MediaPolicy {
                bind_scroll: true,
                ..MediaPolicy::default()
            },
        );

        assert!(recompute_scroll_targets(&mut registry, &page).is_empty());
        assert!(media.is_paused());
        assert_eq!(registry.get(id).unwrap().scroll_target_seconds, 30.0);
        // Nothing seeks until the apply tick.
        assert_eq!(media.count(MediaCommand::Seek(30.0)), 0);

        assert!(apply_scroll_targets(&mut registry).is_empty());
        assert_eq!(media.current_time(), 30.0);
    }

    #[test]
    fn unbound_instances_are_untouched() {
        let media = FakeMedia::new().with_seekable_end(60.0);
        let page = FakePage::new(1000.0, 2000.0);
        page.scroll_to(500.0);
        let mut registry = InstanceRegistry::new();
        registry.create(media.clone(), MediaPolicy::default());

        recompute_scroll_targets(&mut registry, &page);
        apply_scroll_targets(&mut registry);
        assert!(media.commands().is_empty());
    }
}
