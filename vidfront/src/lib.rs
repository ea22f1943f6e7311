/*!
    Player front-end glue for vidstream channels.

    Nothing here plays video. The playback engine, its control surface, the
    casting subsystem and the developer console are handed in as trait objects,
    and the components in this crate only decide *what* to ask of them.
*/

mod cast;
mod console;
mod engine;
mod error;
mod menu;
mod overlay;
mod registry;

#[cfg(test)]
mod testing;

pub use self::cast::{CastStatusEvent, CastStatusListener, CastStatusSource};
pub use self::console::{DevConsole, LogConsole};
pub use self::engine::{
    ControlSurface, DASH_CONTENT_TYPE, ErrorListener, PlaybackEngine, SourceSpec, StreamLoader,
};
pub use self::error::{EngineError, RegistryError};
pub use self::menu::{
    CHANNEL_MENU_COMPONENT, CHANNEL_MENU_POSITION, ChannelMenu, MenuButtonSpec, MenuItemSpec,
};
pub use self::overlay::{Panel, PanelDisplay, SelectorButton, SelectorOverlay};
pub use self::registry::{ChannelEntry, ChannelRegistry};
