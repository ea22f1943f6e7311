use async_trait::async_trait;

use crate::error::EngineError;
use crate::menu::MenuButtonSpec;

/// Content type sent with every channel switch. The engine picks its parser from it.
pub const DASH_CONTENT_TYPE: &str = "application/dash+xml";

/// Callback invoked by the engine when playback fails.
pub type ErrorListener = Box<dyn Fn(&EngineError) + Send + Sync>;

/// A source handed to [`PlaybackEngine::set_source`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSpec {
    pub url: String,
    pub content_type: String,
}

impl SourceSpec {
    pub fn dash(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            content_type: DASH_CONTENT_TYPE.to_string(),
        }
    }
}

/**
    Synchronous control of an embedded playback engine.

    Calls are fire-and-forget: the engine starts work in the background and
    reports failures to its registered error listeners, never to the caller.
*/
pub trait PlaybackEngine: Send + Sync {
    fn set_source(&self, source: SourceSpec);

    fn play(&self);

    fn pause(&self);

    fn add_error_listener(&self, listener: ErrorListener);

    fn control_surface(&self) -> &dyn ControlSurface;
}

/// The on-screen control bar of a playback engine.
pub trait ControlSurface: Send + Sync {
    fn add_child(&self, component: &str, button: MenuButtonSpec, position: usize);
}

/**
    Engine entry point that resolves once the new stream has started (or failed to).
*/
#[async_trait]
pub trait StreamLoader: Send + Sync {
    async fn load(&self, url: &str) -> Result<(), EngineError>;

    fn add_error_listener(&self, listener: ErrorListener);
}
