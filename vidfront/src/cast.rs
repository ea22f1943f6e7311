use std::sync::Arc;

use crate::console::DevConsole;

/// Status change reported by a casting integration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CastStatusEvent {
    pub new_status: String,
}

impl CastStatusEvent {
    pub fn new(new_status: impl Into<String>) -> Self {
        Self {
            new_status: new_status.into(),
        }
    }
}

/// Casting subsystem that announces status transitions.
pub trait CastStatusSource {
    fn add_status_change_listener(&self, listener: Box<dyn Fn(&CastStatusEvent) + Send + Sync>);
}

/// Passive observer that logs every cast status change.
pub struct CastStatusListener;

impl CastStatusListener {
    pub fn subscribe(source: &dyn CastStatusSource, console: Arc<dyn DevConsole>) {
        source.add_status_change_listener(Box::new(move |event| {
            console.log(&format!("New cast status: {}", event.new_status));
        }));
    }
}
