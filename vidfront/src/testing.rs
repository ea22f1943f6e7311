/*!
    Recording doubles for the injected capabilities.
*/

use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::cast::{CastStatusEvent, CastStatusSource};
use crate::console::DevConsole;
use crate::engine::{ControlSurface, ErrorListener, PlaybackEngine, SourceSpec, StreamLoader};
use crate::error::EngineError;
use crate::menu::MenuButtonSpec;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCall {
    SetSource(SourceSpec),
    Play,
    Pause,
}

#[derive(Default)]
pub struct RecordingSurface {
    children: Mutex<Vec<(String, MenuButtonSpec, usize)>>,
}

impl RecordingSurface {
    pub fn children(&self) -> Vec<(String, MenuButtonSpec, usize)> {
        self.children.lock().unwrap().clone()
    }
}

impl ControlSurface for RecordingSurface {
    fn add_child(&self, component: &str, button: MenuButtonSpec, position: usize) {
        self.children
            .lock()
            .unwrap()
            .push((component.to_string(), button, position));
    }
}

#[derive(Default)]
pub struct RecordingEngine {
    calls: Mutex<Vec<EngineCall>>,
    listeners: Mutex<Vec<ErrorListener>>,
    pub surface: RecordingSurface,
}

impl RecordingEngine {
    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn sources(&self) -> Vec<SourceSpec> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                EngineCall::SetSource(s) => Some(s),
                _ => None,
            })
            .collect()
    }
}

impl PlaybackEngine for RecordingEngine {
    fn set_source(&self, source: SourceSpec) {
        self.calls.lock().unwrap().push(EngineCall::SetSource(source));
    }

    fn play(&self) {
        self.calls.lock().unwrap().push(EngineCall::Play);
    }

    fn pause(&self) {
        self.calls.lock().unwrap().push(EngineCall::Pause);
    }

    fn add_error_listener(&self, listener: ErrorListener) {
        self.listeners.lock().unwrap().push(listener);
    }

    fn control_surface(&self) -> &dyn ControlSurface {
        &self.surface
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleLevel {
    Log,
    Error,
}

#[derive(Default)]
pub struct RecordingConsole {
    entries: Mutex<Vec<(ConsoleLevel, String)>>,
}

impl RecordingConsole {
    pub fn entries(&self) -> Vec<(ConsoleLevel, String)> {
        self.entries.lock().unwrap().clone()
    }

    fn at_level(&self, level: ConsoleLevel) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m)
            .collect()
    }

    pub fn logs(&self) -> Vec<String> {
        self.at_level(ConsoleLevel::Log)
    }

    pub fn errors(&self) -> Vec<String> {
        self.at_level(ConsoleLevel::Error)
    }
}

impl DevConsole for RecordingConsole {
    fn log(&self, message: &str) {
        self.entries
            .lock()
            .unwrap()
            .push((ConsoleLevel::Log, message.to_string()));
    }

    fn error(&self, message: &str) {
        self.entries
            .lock()
            .unwrap()
            .push((ConsoleLevel::Error, message.to_string()));
    }
}

/// Loader that answers every request with a fixed outcome, optionally held until released.
pub struct ScriptedLoader {
    outcome: Result<(), EngineError>,
    gate: Option<Notify>,
    loaded: Mutex<Vec<String>>,
    listeners: Mutex<Vec<ErrorListener>>,
}

impl ScriptedLoader {
    fn with(outcome: Result<(), EngineError>, gate: Option<Notify>) -> Self {
        Self {
            outcome,
            gate,
            loaded: Mutex::new(Vec::new()),
            listeners: Mutex::new(Vec::new()),
        }
    }

    pub fn resolving() -> Self {
        Self::with(Ok(()), None)
    }

    pub fn rejecting(error: EngineError) -> Self {
        Self::with(Err(error), None)
    }

    pub fn gated(outcome: Result<(), EngineError>) -> Self {
        Self::with(outcome, Some(Notify::new()))
    }

    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.notify_one();
        }
    }

    pub fn loaded(&self) -> Vec<String> {
        self.loaded.lock().unwrap().clone()
    }

    pub fn emit_error(&self, error: &EngineError) {
        for listener in self.listeners.lock().unwrap().iter() {
            listener(error);
        }
    }
}

#[async_trait]
impl StreamLoader for ScriptedLoader {
    async fn load(&self, url: &str) -> Result<(), EngineError> {
        self.loaded.lock().unwrap().push(url.to_string());
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.outcome.clone()
    }

    fn add_error_listener(&self, listener: ErrorListener) {
        self.listeners.lock().unwrap().push(listener);
    }
}

type CastListener = Box<dyn Fn(&CastStatusEvent) + Send + Sync>;

#[derive(Default)]
pub struct FakeCaster {
    listeners: Mutex<Vec<CastListener>>,
}

impl FakeCaster {
    pub fn emit(&self, event: CastStatusEvent) {
        for listener in self.listeners.lock().unwrap().iter() {
            listener(&event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().unwrap().len()
    }
}

impl CastStatusSource for FakeCaster {
    fn add_status_change_listener(&self, listener: CastListener) {
        self.listeners.lock().unwrap().push(listener);
    }
}
