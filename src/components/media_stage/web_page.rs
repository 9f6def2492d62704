use wasm_bindgen::JsValue;
use web_sys::{Document, Window};

use crate::stage::{PageHost, Viewport};

/// Layout queries against the live browser window.
pub struct WebPage {
    window: Window,
    document: Document,
}

impl WebPage {
    pub fn new(window: Window, document: Document) -> Self {
        Self { window, document }
    }
}

fn js_number(value: Result<JsValue, JsValue>) -> f64 {
    value.ok().and_then(|v| v.as_f64()).unwrap_or(0.0)
}

impl PageHost for WebPage {
    fn viewport(&self) -> Viewport {
        Viewport {
            scroll_x: self.window.scroll_x().unwrap_or(0.0),
            scroll_y: self.window.scroll_y().unwrap_or(0.0),
            width: js_number(self.window.inner_width()),
            height: js_number(self.window.inner_height()),
        }
    }

    fn document_height(&self) -> f64 {
        let root = self
            .document
            .document_element()
            .map(|el| el.scroll_height())
            .unwrap_or(0);
        let body = self.document.body().map(|b| b.scroll_height()).unwrap_or(0);
        f64::from(root.max(body))
    }

    fn now_seconds(&self) -> f64 {
        js_sys::Date::now() / 1000.0
    }
}
