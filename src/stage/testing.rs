use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use super::geometry::{Rect, Size, Viewport};
use super::platform::{MediaElement, PageHost};
use super::sizing::FitStyle;

#[derive(Debug, Clone, PartialEq)]
pub enum MediaCommand {
    Load,
    Play,
    Pause,
    Seek(f64),
    Volume(f64),
    Visible(bool),
    Fade(f64),
}

#[derive(Debug)]
struct MediaState {
    paused: bool,
    current_time: f64,
    volume: f64,
    duration: Option<f64>,
    seekable_end: Option<f64>,
    buffered_end: Option<f64>,
    looping: bool,
    autoplay: bool,
    attached: bool,
    visible: bool,
    opacity: f64,
    element_box: Rect,
    container_box: Rect,
    intrinsic: Size,
    fits: Vec<FitStyle>,
    commands: Vec<MediaCommand>,
}

/// Fake media element. Clones share state so a test can keep a handle after
/// moving one into the registry.
#[derive(Debug, Clone)]
pub struct FakeMedia {
    state: Rc<RefCell<MediaState>>,
}

impl FakeMedia {
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(MediaState {
                paused: true,
                current_time: 0.0,
                volume: 1.0,
                duration: None,
                seekable_end: None,
                buffered_end: None,
                looping: false,
                autoplay: false,
                attached: true,
                visible: true,
                opacity: 1.0,
                element_box: Rect::default(),
                container_box: Rect::default(),
                intrinsic: Size::default(),
                fits: Vec::new(),
                commands: Vec::new(),
            })),
        }
    }

    pub fn with_autoplay(self, autoplay: bool) -> Self {
        self.state.borrow_mut().autoplay = autoplay;
        self
    }

    pub fn with_looping(self, looping: bool) -> Self {
        self.state.borrow_mut().looping = looping;
        self
    }

    pub fn with_seekable_end(self, seconds: f64) -> Self {
        self.state.borrow_mut().seekable_end = Some(seconds);
        self
    }

    pub fn with_duration(self, seconds: f64) -> Self {
        self.state.borrow_mut().duration = Some(seconds);
        self
    }

    pub fn with_intrinsic(self, size: Size) -> Self {
        self.state.borrow_mut().intrinsic = size;
        self
    }

    pub fn set_buffered_end(&self, seconds: f64) {
        self.state.borrow_mut().buffered_end = Some(seconds);
    }

    pub fn set_element_box(&self, rect: Rect) {
        self.state.borrow_mut().element_box = rect;
    }

    pub fn set_container_box(&self, rect: Rect) {
        self.state.borrow_mut().container_box = rect;
    }

    pub fn detach(&self) {
        self.state.borrow_mut().attached = false;
    }

    pub fn volume(&self) -> f64 {
        self.state.borrow().volume
    }

    pub fn visible(&self) -> bool {
        self.state.borrow().visible
    }

    pub fn opacity(&self) -> f64 {
        self.state.borrow().opacity
    }

    pub fn fits(&self) -> Vec<FitStyle> {
        self.state.borrow().fits.clone()
    }

    pub fn commands(&self) -> Vec<MediaCommand> {
        self.state.borrow().commands.clone()
    }

    pub fn last_command(&self) -> Option<MediaCommand> {
        self.state.borrow().commands.last().cloned()
    }

    pub fn count(&self, command: MediaCommand) -> usize {
        self.state
            .borrow()
            .commands
            .iter()
            .filter(|c| **c == command)
            .count()
    }

    pub fn clear_commands(&self) {
        self.state.borrow_mut().commands.clear();
    }

    fn record(&self, command: MediaCommand) {
        self.state.borrow_mut().commands.push(command);
    }
}

impl MediaElement for FakeMedia {
    fn load(&self) {
        self.record(MediaCommand::Load);
    }

    fn play(&self) {
        self.state.borrow_mut().paused = false;
        self.record(MediaCommand::Play);
    }

    fn pause(&self) {
        self.state.borrow_mut().paused = true;
        self.record(MediaCommand::Pause);
    }

    fn is_paused(&self) -> bool {
        self.state.borrow().paused
    }

    fn current_time(&self) -> f64 {
        self.state.borrow().current_time
    }

    fn set_current_time(&self, seconds: f64) {
        self.state.borrow_mut().current_time = seconds;
        self.record(MediaCommand::Seek(seconds));
    }

    fn set_volume(&self, volume: f64) {
        self.state.borrow_mut().volume = volume;
        self.record(MediaCommand::Volume(volume));
    }

    fn duration(&self) -> Option<f64> {
        self.state.borrow().duration
    }

    fn seekable_end(&self) -> Option<f64> {
        self.state.borrow().seekable_end
    }

    fn buffered_end(&self) -> Option<f64> {
        self.state.borrow().buffered_end
    }

    fn is_looping(&self) -> bool {
        self.state.borrow().looping
    }

    fn has_autoplay(&self) -> bool {
        self.state.borrow().autoplay
    }

    fn is_attached(&self) -> bool {
        self.state.borrow().attached
    }

    fn set_visible(&self, visible: bool) {
        self.state.borrow_mut().visible = visible;
        self.record(MediaCommand::Visible(visible));
    }

    fn fade_to(&self, opacity: f64, _duration: Duration) {
        self.state.borrow_mut().opacity = opacity;
        self.record(MediaCommand::Fade(opacity));
    }

    fn element_box(&self) -> Rect {
        self.state.borrow().element_box
    }

    fn container_box(&self) -> Rect {
        self.state.borrow().container_box
    }

    fn intrinsic_size(&self) -> Size {
        self.state.borrow().intrinsic
    }

    fn apply_fit(&self, fit: &FitStyle) {
        self.state.borrow_mut().fits.push(fit.clone());
    }
}

#[derive(Debug)]
struct PageState {
    viewport: Viewport,
    document_height: f64,
    now: f64,
}

/// Scripted page: scroll position, document height and clock are set by the test.
#[derive(Debug, Clone)]
pub struct FakePage {
    state: Rc<RefCell<PageState>>,
}

impl FakePage {
    pub fn new(viewport_height: f64, document_height: f64) -> Self {
        Self {
            state: Rc::new(RefCell::new(PageState {
                viewport: Viewport {
                    scroll_x: 0.0,
                    scroll_y: 0.0,
                    width: 1280.0,
                    height: viewport_height,
                },
                document_height,
                now: 0.0,
            })),
        }
    }

    pub fn scroll_to(&self, scroll_y: f64) {
        self.state.borrow_mut().viewport.scroll_y = scroll_y;
    }

    pub fn set_now(&self, seconds: f64) {
        self.state.borrow_mut().now = seconds;
    }
}

impl PageHost for FakePage {
    fn viewport(&self) -> Viewport {
        self.state.borrow().viewport
    }

    fn document_height(&self) -> f64 {
        self.state.borrow().document_height
    }

    fn now_seconds(&self) -> f64 {
        self.state.borrow().now
    }
}
