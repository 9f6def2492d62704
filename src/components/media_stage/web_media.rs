use std::time::Duration;

use dioxus::logger::tracing::{debug, warn};
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::{window, Element, HtmlVideoElement, TimeRanges};

use crate::stage::{FitStyle, MediaElement, Rect, Size};

pub struct WebMedia {
    video: HtmlVideoElement,
}

impl WebMedia {
    pub fn new(video: HtmlVideoElement) -> Self {
        Self { video }
    }

    fn set_style(&self, name: &str, value: &str) {
        if let Err(err) = self.video.style().set_property(name, value) {
            warn!("failed to set {name}={value}: {err:?}");
        }
    }
}

fn first_range_end(ranges: TimeRanges) -> Option<f64> {
    if ranges.length() == 0 {
        return None;
    }
    ranges.end(0).ok().filter(|end| end.is_finite())
}

/// Bounding box of `element` in document coordinates.
fn page_rect(element: &Element) -> Rect {
    let rect = element.get_bounding_client_rect();
    let (scroll_x, scroll_y) = window()
        .map(|w| (w.scroll_x().unwrap_or(0.0), w.scroll_y().unwrap_or(0.0)))
        .unwrap_or((0.0, 0.0));
    Rect::new(
        rect.top() + scroll_y,
        rect.left() + scroll_x,
        rect.width(),
        rect.height(),
    )
}

impl MediaElement for WebMedia {
    fn load(&self) {
        self.video.load();
    }

    fn play(&self) {
        match self.video.play() {
            Ok(promise) => spawn_local(async move {
                // Autoplay policies reject the promise; the element just stays paused.
                if let Err(err) = JsFuture::from(promise).await {
                    debug!("play() rejected: {err:?}");
                }
            }),
            Err(err) => warn!("play() failed: {err:?}"),
        }
    }

    fn pause(&self) {
        if let Err(err) = self.video.pause() {
            warn!("pause() failed: {err:?}");
        }
    }

    fn is_paused(&self) -> bool {
        self.video.paused()
    }

    fn current_time(&self) -> f64 {
        self.video.current_time()
    }

    fn set_current_time(&self, seconds: f64) {
        self.video.set_current_time(seconds);
    }

    fn set_volume(&self, volume: f64) {
        self.video.set_volume(volume.clamp(0.0, 1.0));
    }

    fn duration(&self) -> Option<f64> {
        let duration = self.video.duration();
        (duration.is_finite() && duration > 0.0).then_some(duration)
    }

    fn seekable_end(&self) -> Option<f64> {
        first_range_end(self.video.seekable())
    }

    fn buffered_end(&self) -> Option<f64> {
        first_range_end(self.video.buffered())
    }

    fn is_looping(&self) -> bool {
        self.video.loop_()
    }

    fn has_autoplay(&self) -> bool {
        self.video.has_attribute("autoplay")
    }

    fn is_attached(&self) -> bool {
        self.video.is_connected()
    }

    fn set_visible(&self, visible: bool) {
        if visible {
            if let Err(err) = self.video.style().remove_property("display") {
                warn!("failed to show media: {err:?}");
            }
        } else {
            self.set_style("display", "none");
        }
    }

    fn fade_to(&self, opacity: f64, duration: Duration) {
        if duration.is_zero() {
            self.set_style("transition", "none");
        } else {
            // Flush the previous opacity so the transition actually runs.
            let _ = self.video.offset_height();
            self.set_style(
                "transition",
                &format!("opacity {}ms linear", duration.as_millis()),
            );
        }
        self.set_style("opacity", &opacity.clamp(0.0, 1.0).to_string());
    }

    fn element_box(&self) -> Rect {
        page_rect(&self.video)
    }

    fn container_box(&self) -> Rect {
        match self.video.parent_element() {
            Some(parent) => page_rect(&parent),
            None => self.element_box(),
        }
    }

    fn intrinsic_size(&self) -> Size {
        Size::new(
            f64::from(self.video.video_width()),
            f64::from(self.video.video_height()),
        )
    }

    fn apply_fit(&self, fit: &FitStyle) {
        self.set_style("width", &fit.width.to_css());
        self.set_style("height", &fit.height.to_css());
        if let Some(min_width) = fit.min_width {
            self.set_style("min-width", &min_width.to_css());
        }
        if let Some(min_height) = fit.min_height {
            self.set_style("min-height", &min_height.to_css());
        }
        if let Some(top) = fit.margin_top {
            self.set_style("margin-top", &format!("{top}px"));
        }
        if let Some(left) = fit.margin_left {
            self.set_style("margin-left", &format!("{left}px"));
        }
    }
}
