//! Cover/contain fitting of media inside its container.

use super::geometry::Size;
use super::policy::SizeMode;

/// Overflow below this many pixels is treated as none.
const OVERFLOW_EPSILON: f64 = 1e-6;

/// A CSS length as applied to the media element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Length {
    Auto,
    Px(f64),
    Percent(f64),
}

impl Length {
    pub fn to_css(&self) -> String {
        match self {
            Length::Auto => "auto".to_string(),
            Length::Px(v) => format!("{v}px"),
            Length::Percent(v) => format!("{v}%"),
        }
    }
}

/// Style to apply to a media element so it fits its container.
///
/// `None` fields are left untouched on the element.
#[derive(Debug, Clone, PartialEq)]
pub struct FitStyle {
    pub width: Length,
    pub height: Length,
    pub min_width: Option<Length>,
    pub min_height: Option<Length>,
    pub margin_top: Option<f64>,
    pub margin_left: Option<f64>,
    /// Box the media ends up rendering at.
    pub rendered: Size,
}

/// Compute the fit for `media` inside `container`.
///
/// Pure function of its inputs. Returns `None` for `SizeMode::None` or while
/// either box is still unknown (zero-sized before metadata arrives).
pub fn compute_fit(container: Size, media: Size, mode: SizeMode) -> Option<FitStyle> {
    if !mode.is_sized() || !container.is_usable() || !media.is_usable() {
        return None;
    }

    let width_ratio = container.width / media.width;
    let height_ratio = container.height / media.height;

    match mode {
        SizeMode::Contain => Some(if width_ratio < height_ratio {
            FitStyle {
                width: Length::Px(container.width),
                height: Length::Auto,
                min_width: None,
                min_height: None,
                margin_top: None,
                margin_left: None,
                rendered: Size::new(container.width, media.height * width_ratio),
            }
        } else {
            FitStyle {
                width: Length::Auto,
                height: Length::Px(container.height),
                min_width: None,
                min_height: None,
                margin_top: None,
                margin_left: None,
                rendered: Size::new(media.width * height_ratio, container.height),
            }
        }),
        SizeMode::Cover => {
            let scale = width_ratio.max(height_ratio);
            let rendered = Size::new(media.width * scale, media.height * scale);
            Some(FitStyle {
                width: Length::Px(rendered.width),
                height: Length::Px(rendered.height),
                min_width: Some(Length::Percent(100.0)),
                min_height: Some(Length::Percent(100.0)),
                margin_top: Some(centering_offset(rendered.height, container.height)),
                margin_left: Some(centering_offset(rendered.width, container.width)),
                rendered,
            })
        }
        SizeMode::None => None,
    }
}

fn centering_offset(rendered: f64, container: f64) -> f64 {
    let overflow = rendered - container;
    if overflow > OVERFLOW_EPSILON {
        -(overflow / 2.0)
    } else {
        0.0
    }
}
