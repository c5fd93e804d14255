#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User picked a section in the sidebar.
    SectionSelected(crate::Section),
    /// User edited one setting in the draft.
    SettingChanged(crate::SettingChange),
    /// User clicked Save.
    SaveClicked,
    /// The store wrote the committed settings.
    SaveSucceeded,
    /// The store refused the committed settings; nothing changed on disk.
    SaveFailed,
    /// User clicked the button that opens the host's native settings.
    OpenHostSettingsClicked,
}
