use crate::Settings;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Replace the persisted settings document with this one.
    PersistSettings(Settings),
    /// Open the host application's own settings panel.
    OpenHostSettings,
}
