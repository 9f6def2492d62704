//! Seams between the stage and whatever hosts the media (browser, tests).

use std::time::Duration;

use super::geometry::{Rect, Size, Viewport};
use super::registry::InstanceId;
use super::sizing::FitStyle;

/// Capabilities the stage needs from one playable media element.
///
/// Methods take `&self`; implementations wrap handles with interior
/// mutability the same way DOM handles behave. Values the platform cannot
/// report yet (NaN duration, empty time ranges) come back as `None`.
pub trait MediaElement {
    fn load(&self);
    fn play(&self);
    fn pause(&self);
    fn is_paused(&self) -> bool;
    fn current_time(&self) -> f64;
    fn set_current_time(&self, seconds: f64);
    fn set_volume(&self, volume: f64);
    fn duration(&self) -> Option<f64>;
    fn seekable_end(&self) -> Option<f64>;
    fn buffered_end(&self) -> Option<f64>;
    fn is_looping(&self) -> bool;
    fn has_autoplay(&self) -> bool;
    fn is_attached(&self) -> bool;
    fn set_visible(&self, visible: bool);
    fn fade_to(&self, opacity: f64, duration: Duration);
    /// Box of the element itself, in document coordinates.
    fn element_box(&self) -> Rect;
    /// Box of the element's container, in document coordinates.
    fn container_box(&self) -> Rect;
    /// Natural size of the media once metadata is known.
    fn intrinsic_size(&self) -> Size;
    fn apply_fit(&self, fit: &FitStyle);
}

/// Page-level layout queries plus the wall clock.
pub trait PageHost {
    fn viewport(&self) -> Viewport;
    fn document_height(&self) -> f64;
    fn now_seconds(&self) -> f64;
}

/// Timer work the stage asks its host to perform.
#[derive(Debug, Clone, PartialEq)]
pub enum TimerRequest {
    /// (Re)arm the stuck watchdog of one instance, replacing any pending one.
    ArmWatchdog {
        id: InstanceId,
        generation: u64,
        delay: Duration,
    },
    CancelWatchdog(InstanceId),
    StartScrollApply {
        period: Duration,
    },
    StopScrollApply,
}

/// Everything the host can report to the stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StageEvent {
    Progress(InstanceId),
    WatchdogFired { id: InstanceId, generation: u64 },
    MetadataReady(InstanceId),
    Ended(InstanceId),
    Click(InstanceId),
    Scroll,
    Resize,
    ScrollApplyTick,
    Removed(InstanceId),
}

/// Global listeners the host must install for the current set of instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ListenerNeeds {
    pub scroll: bool,
    pub resize: bool,
}
