//! Deck core: pure settings state machine and view-model helpers.
mod effect;
mod msg;
mod settings;
mod state;
mod update;
mod view_model;

pub use effect::Effect;
pub use msg::Msg;
pub use settings::{
    AvatarsShape, FlagSetting, ScrollbarsMode, SettingChange, SettingKey, SettingValue, Settings,
    SettingsError,
};
pub use state::{Section, SettingsState};
pub use update::update;
pub use view_model::{SectionView, SettingsViewModel};
