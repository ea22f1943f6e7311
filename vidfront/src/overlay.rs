use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::console::DevConsole;
use crate::engine::StreamLoader;
use crate::registry::ChannelRegistry;

/// Display state of the selector panel. Panels start hidden.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PanelDisplay {
    Shown,
    #[default]
    Hidden,
}

impl PanelDisplay {
    pub fn toggled(self) -> Self {
        match self {
            PanelDisplay::Hidden => PanelDisplay::Shown,
            PanelDisplay::Shown => PanelDisplay::Hidden,
        }
    }
}

/// A pre-rendered panel whose visibility the overlay controls.
pub trait Panel {
    fn display(&self) -> PanelDisplay;

    fn set_display(&mut self, display: PanelDisplay);
}

impl Panel for PanelDisplay {
    fn display(&self) -> PanelDisplay {
        *self
    }

    fn set_display(&mut self, display: PanelDisplay) {
        *self = display;
    }
}

/// A channel button inside the selector panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorButton {
    pub label: String,
    pub data_url: String,
}

/**
    Show/hide panel of channel buttons that loads the clicked channel.

    Loads are dispatched onto the tokio runtime and the panel closes right
    away, so it stays closed even when the load is later rejected. Rapid
    clicks dispatch overlapping loads with no cancellation; whichever
    resolves last decides what the engine ends up playing.
*/
pub struct SelectorOverlay<P: Panel = PanelDisplay> {
    panel: P,
    loader: Arc<dyn StreamLoader>,
    console: Arc<dyn DevConsole>,
    buttons: Vec<SelectorButton>,
}

impl<P: Panel> SelectorOverlay<P> {
    pub fn new(
        panel: P,
        loader: Arc<dyn StreamLoader>,
        console: Arc<dyn DevConsole>,
        registry: &ChannelRegistry,
    ) -> Self {
        let buttons = registry
            .iter()
            .map(|e| SelectorButton {
                label: e.label.clone(),
                data_url: e.stream_url.clone(),
            })
            .collect();

        let error_console = Arc::clone(&console);
        loader.add_error_listener(Box::new(move |err| {
            error_console.error(&format!("Engine error: {err}"));
        }));

        Self {
            panel,
            loader,
            console,
            buttons,
        }
    }

    pub fn buttons(&self) -> &[SelectorButton] {
        &self.buttons
    }

    pub fn display(&self) -> PanelDisplay {
        self.panel.display()
    }

    pub fn panel(&self) -> &P {
        &self.panel
    }

    pub fn toggle_visibility(&mut self) {
        let next = self.panel.display().toggled();
        self.panel.set_display(next);
    }

    /**
        Dispatch a load for `url` and hide the panel.

        Must be called from within a tokio runtime. The returned handle
        completes once the outcome has been logged; it never carries an error.
    */
    pub fn on_button_selected(&mut self, url: &str) -> JoinHandle<()> {
        let loader = Arc::clone(&self.loader);
        let console = Arc::clone(&self.console);
        let url = url.to_string();

        let handle = tokio::spawn(async move {
            match loader.load(&url).await {
                Ok(()) => console.log(&format!("Loaded {url}")),
                Err(e) => console.error(&e.to_string()),
            }
        });

        self.panel.set_display(PanelDisplay::Hidden);
        handle
    }
}
