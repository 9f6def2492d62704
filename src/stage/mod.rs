//! Media stage - coordinates playback of every managed media element on a page.
//!
//! The stage is platform independent. Browsers (or tests) plug in through the
//! [`MediaElement`] and [`PageHost`] traits, feed [`StageEvent`]s into
//! [`MediaStage::dispatch`] and execute the [`TimerRequest`]s it hands back.

mod controller;
mod error;
mod geometry;
mod platform;
mod policy;
mod preload;
mod registry;
mod scroll_seek;
mod sizing;
mod visibility;

#[cfg(test)]
pub(crate) mod testing;

pub use controller::*;
pub use error::*;
pub use geometry::*;
pub use platform::*;
pub use policy::*;
pub use preload::*;
pub use registry::*;
pub use scroll_seek::*;
pub use sizing::*;
pub use visibility::*;
