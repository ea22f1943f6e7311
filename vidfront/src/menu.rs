use std::fmt;
use std::sync::Arc;

use crate::engine::{PlaybackEngine, SourceSpec};
use crate::registry::{ChannelEntry, ChannelRegistry};

/// Component name the channel menu is registered under on the control surface.
pub const CHANNEL_MENU_COMPONENT: &str = "ChannelMenuButton";

/// Slot on the control surface the channel menu is inserted at.
pub const CHANNEL_MENU_POSITION: usize = 10;

const CHANNEL_MENU_TEXT: &str = "Channels";

/// One selectable row in a dropdown menu.
#[derive(Clone)]
pub struct MenuItemSpec {
    pub label: String,
    pub url: String,
    pub on_select: Arc<dyn Fn() + Send + Sync>,
}

impl MenuItemSpec {
    pub fn select(&self) {
        (self.on_select)();
    }
}

impl fmt::Debug for MenuItemSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MenuItemSpec")
            .field("label", &self.label)
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

/// A dropdown button for a control surface.
#[derive(Debug, Clone)]
pub struct MenuButtonSpec {
    pub control_text: String,
    pub items: Vec<MenuItemSpec>,
}

/**
    Channel dropdown for a control-bar based player.

    Selecting an item pauses the engine, swaps the source and resumes
    immediately. There is no loading state and no local error handling;
    set-source and play failures reach the engine's own error listeners.
*/
pub struct ChannelMenu {
    engine: Arc<dyn PlaybackEngine>,
    registry: Arc<ChannelRegistry>,
}

impl ChannelMenu {
    pub fn new(engine: Arc<dyn PlaybackEngine>, registry: Arc<ChannelRegistry>) -> Self {
        Self { engine, registry }
    }

    /**
        Load the default channel and attach the menu to the control surface.

        Call once from the player's ready hook, before any user interaction.
    */
    pub fn install(&self) {
        let initial = self.registry.default_entry();
        self.engine.set_source(SourceSpec::dash(&initial.stream_url));

        self.engine.control_surface().add_child(
            CHANNEL_MENU_COMPONENT,
            self.menu_button(),
            CHANNEL_MENU_POSITION,
        );
    }

    pub fn menu_button(&self) -> MenuButtonSpec {
        MenuButtonSpec {
            control_text: CHANNEL_MENU_TEXT.to_string(),
            items: self.build_menu_items(),
        }
    }

    pub fn build_menu_items(&self) -> Vec<MenuItemSpec> {
        self.registry
            .iter()
            .map(|entry| {
                let engine = Arc::clone(&self.engine);
                let selected = entry.clone();
                MenuItemSpec {
                    label: entry.label.clone(),
                    url: entry.stream_url.clone(),
                    on_select: Arc::new(move || switch_channel(engine.as_ref(), &selected)),
                }
            })
            .collect()
    }

    pub fn on_item_selected(&self, entry: &ChannelEntry) {
        switch_channel(self.engine.as_ref(), entry);
    }
}

fn switch_channel(engine: &dyn PlaybackEngine, entry: &ChannelEntry) {
    engine.pause();
    engine.set_source(SourceSpec::dash(&entry.stream_url));
    engine.play();
}
