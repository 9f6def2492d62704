use dioxus::prelude::*;

use super::media_stage::{MediaStageController, ReadyEntry};

const PAGE_STYLE: &str = "margin: 0; font-family: system-ui, sans-serif; background: #111; color: #eee;";
const SPACER_STYLE: &str = "min-height: 120vh; padding: 4rem 2rem;";

#[component]
pub fn Showcase() -> Element {
    let ready_log = use_signal(Vec::<ReadyEntry>::new);

    rsx! {
        main { style: PAGE_STYLE,
            ReadyStrip { entries: ready_log }

            section { style: "position: relative; height: 100vh; overflow: hidden;",
                video {
                    class: "js-video-player",
                    autoplay: true,
                    muted: true,
                    r#loop: true,
                    "data-video-preload": "true",
                    "data-video-play-when-in-view": "true",
                    "data-video-fade-in": "true",
                    "data-video-size": "cover",
                    "data-video-volume": "0",
                    source { src: "media/hero.mp4", r#type: "video/mp4" }
                }
            }

            section { style: SPACER_STYLE,
                h2 { "Contained clip" }
                p { "Click the clip to toggle playback. It rewinds when it ends." }
                div { style: "width: 640px; height: 360px; background: #000;",
                    video {
                        class: "js-video-player",
                        autoplay: true,
                        "data-video-play-when-in-view": "true",
                        "data-video-size": "contain",
                        "data-video-volume": "0.4",
                        source { src: "media/clip.mp4", r#type: "video/mp4" }
                    }
                }
            }

            section { style: SPACER_STYLE,
                h2 { "Scroll-bound clip" }
                p { "The playhead follows the page scroll position." }
                video {
                    class: "js-video-player",
                    style: "width: 100%; max-width: 960px;",
                    "data-video-bind-scroll": "true",
                    source { src: "media/scrub.mp4", r#type: "video/mp4" }
                }
            }

            section { style: SPACER_STYLE, p { "End of page." } }

            MediaStageController { ready_log }
        }
    }
}

#[component]
fn ReadyStrip(entries: Signal<Vec<ReadyEntry>>) -> Element {
    rsx! {
        aside { style: "position: fixed; top: 0; right: 0; z-index: 10; padding: 0.5rem 1rem; background: rgba(0,0,0,0.6); font-size: 0.8rem;",
            if entries.read().is_empty() {
                span { "Loading media..." }
            } else {
                for entry in entries.read().iter() {
                    div { key: "{entry.id}", {entry.label()} }
                }
            }
        }
    }
}
