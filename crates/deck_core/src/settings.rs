use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AvatarsShape {
    #[default]
    Circle,
    Square,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrollbarsMode {
    #[default]
    Default,
    Slim,
    Hidden,
}

/// The persisted user settings. Every key has a fixed value type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub avatars_shape: AvatarsShape,
    pub badges_on_top_of_avatars: bool,
    pub collapse_read_dms: bool,
    pub disable_gifs_in_profile_pictures: bool,
    pub replace_hearts_by_stars: bool,
    pub scrollbars_mode: ScrollbarsMode,
    pub custom_accent_color: String,
    pub custom_dark_theme: String,
    pub hide_column_icons: bool,
    pub show_clear_button_in_columns_header: bool,
    pub show_collapse_button_in_columns_header: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            avatars_shape: AvatarsShape::Circle,
            badges_on_top_of_avatars: true,
            collapse_read_dms: false,
            disable_gifs_in_profile_pictures: false,
            replace_hearts_by_stars: false,
            scrollbars_mode: ScrollbarsMode::Default,
            custom_accent_color: "default".to_string(),
            custom_dark_theme: "default".to_string(),
            hide_column_icons: false,
            show_clear_button_in_columns_header: true,
            show_collapse_button_in_columns_header: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKey {
    AvatarsShape,
    BadgesOnTopOfAvatars,
    CollapseReadDms,
    DisableGifsInProfilePictures,
    ReplaceHeartsByStars,
    ScrollbarsMode,
    CustomAccentColor,
    CustomDarkTheme,
    HideColumnIcons,
    ShowClearButtonInColumnsHeader,
    ShowCollapseButtonInColumnsHeader,
}

impl SettingKey {
    pub const ALL: [SettingKey; 11] = [
        SettingKey::AvatarsShape,
        SettingKey::BadgesOnTopOfAvatars,
        SettingKey::CollapseReadDms,
        SettingKey::DisableGifsInProfilePictures,
        SettingKey::ReplaceHeartsByStars,
        SettingKey::ScrollbarsMode,
        SettingKey::CustomAccentColor,
        SettingKey::CustomDarkTheme,
        SettingKey::HideColumnIcons,
        SettingKey::ShowClearButtonInColumnsHeader,
        SettingKey::ShowCollapseButtonInColumnsHeader,
    ];

    /// Name used in the persisted document.
    pub fn as_str(self) -> &'static str {
        match self {
            SettingKey::AvatarsShape => "avatarsShape",
            SettingKey::BadgesOnTopOfAvatars => "badgesOnTopOfAvatars",
            SettingKey::CollapseReadDms => "collapseReadDms",
            SettingKey::DisableGifsInProfilePictures => "disableGifsInProfilePictures",
            SettingKey::ReplaceHeartsByStars => "replaceHeartsByStars",
            SettingKey::ScrollbarsMode => "scrollbarsMode",
            SettingKey::CustomAccentColor => "customAccentColor",
            SettingKey::CustomDarkTheme => "customDarkTheme",
            SettingKey::HideColumnIcons => "hideColumnIcons",
            SettingKey::ShowClearButtonInColumnsHeader => "showClearButtonInColumnsHeader",
            SettingKey::ShowCollapseButtonInColumnsHeader => "showCollapseButtonInColumnsHeader",
        }
    }

    fn as_flag(self) -> Option<FlagSetting> {
        let flag = match self {
            SettingKey::BadgesOnTopOfAvatars => FlagSetting::BadgesOnTopOfAvatars,
            SettingKey::CollapseReadDms => FlagSetting::CollapseReadDms,
            SettingKey::DisableGifsInProfilePictures => FlagSetting::DisableGifsInProfilePictures,
            SettingKey::ReplaceHeartsByStars => FlagSetting::ReplaceHeartsByStars,
            SettingKey::HideColumnIcons => FlagSetting::HideColumnIcons,
            SettingKey::ShowClearButtonInColumnsHeader => {
                FlagSetting::ShowClearButtonInColumnsHeader
            }
            SettingKey::ShowCollapseButtonInColumnsHeader => {
                FlagSetting::ShowCollapseButtonInColumnsHeader
            }
            SettingKey::AvatarsShape
            | SettingKey::ScrollbarsMode
            | SettingKey::CustomAccentColor
            | SettingKey::CustomDarkTheme => return None,
        };
        Some(flag)
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Settings whose value is a plain on/off toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlagSetting {
    BadgesOnTopOfAvatars,
    CollapseReadDms,
    DisableGifsInProfilePictures,
    ReplaceHeartsByStars,
    HideColumnIcons,
    ShowClearButtonInColumnsHeader,
    ShowCollapseButtonInColumnsHeader,
}

impl FlagSetting {
    pub fn key(self) -> SettingKey {
        match self {
            FlagSetting::BadgesOnTopOfAvatars => SettingKey::BadgesOnTopOfAvatars,
            FlagSetting::CollapseReadDms => SettingKey::CollapseReadDms,
            FlagSetting::DisableGifsInProfilePictures => SettingKey::DisableGifsInProfilePictures,
            FlagSetting::ReplaceHeartsByStars => SettingKey::ReplaceHeartsByStars,
            FlagSetting::HideColumnIcons => SettingKey::HideColumnIcons,
            FlagSetting::ShowClearButtonInColumnsHeader => {
                SettingKey::ShowClearButtonInColumnsHeader
            }
            FlagSetting::ShowCollapseButtonInColumnsHeader => {
                SettingKey::ShowCollapseButtonInColumnsHeader
            }
        }
    }
}

/// Untyped view of a single setting, used by generic rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingValue {
    Flag(bool),
    AvatarsShape(AvatarsShape),
    ScrollbarsMode(ScrollbarsMode),
    Text(String),
}

impl SettingValue {
    fn kind(&self) -> &'static str {
        match self {
            SettingValue::Flag(_) => "flag",
            SettingValue::AvatarsShape(_) => "avatars shape",
            SettingValue::ScrollbarsMode(_) => "scrollbars mode",
            SettingValue::Text(_) => "text",
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("setting {key} does not accept a {found} value")]
    TypeMismatch { key: SettingKey, found: &'static str },
}

/// A single edit to the draft. The payload type is fixed by the key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingChange {
    Flag(FlagSetting, bool),
    AvatarsShape(AvatarsShape),
    ScrollbarsMode(ScrollbarsMode),
    CustomAccentColor(String),
    CustomDarkTheme(String),
}

impl SettingChange {
    /// Pairs an untyped value with its key, rejecting values of the wrong type.
    pub fn new(key: SettingKey, value: SettingValue) -> Result<Self, SettingsError> {
        let change = match (key, value) {
            (SettingKey::AvatarsShape, SettingValue::AvatarsShape(shape)) => {
                SettingChange::AvatarsShape(shape)
            }
            (SettingKey::ScrollbarsMode, SettingValue::ScrollbarsMode(mode)) => {
                SettingChange::ScrollbarsMode(mode)
            }
            (SettingKey::CustomAccentColor, SettingValue::Text(text)) => {
                SettingChange::CustomAccentColor(text)
            }
            (SettingKey::CustomDarkTheme, SettingValue::Text(text)) => {
                SettingChange::CustomDarkTheme(text)
            }
            (key, SettingValue::Flag(on)) => match key.as_flag() {
                Some(flag) => SettingChange::Flag(flag, on),
                None => {
                    return Err(SettingsError::TypeMismatch {
                        key,
                        found: "flag",
                    })
                }
            },
            (key, value) => {
                return Err(SettingsError::TypeMismatch {
                    key,
                    found: value.kind(),
                })
            }
        };
        Ok(change)
    }

    pub fn key(&self) -> SettingKey {
        match self {
            SettingChange::Flag(flag, _) => flag.key(),
            SettingChange::AvatarsShape(_) => SettingKey::AvatarsShape,
            SettingChange::ScrollbarsMode(_) => SettingKey::ScrollbarsMode,
            SettingChange::CustomAccentColor(_) => SettingKey::CustomAccentColor,
            SettingChange::CustomDarkTheme(_) => SettingKey::CustomDarkTheme,
        }
    }
}

impl Settings {
    pub fn get(&self, key: SettingKey) -> SettingValue {
        match key {
            SettingKey::AvatarsShape => SettingValue::AvatarsShape(self.avatars_shape),
            SettingKey::ScrollbarsMode => SettingValue::ScrollbarsMode(self.scrollbars_mode),
            SettingKey::CustomAccentColor => SettingValue::Text(self.custom_accent_color.clone()),
            SettingKey::CustomDarkTheme => SettingValue::Text(self.custom_dark_theme.clone()),
            SettingKey::BadgesOnTopOfAvatars => SettingValue::Flag(self.badges_on_top_of_avatars),
            SettingKey::CollapseReadDms => SettingValue::Flag(self.collapse_read_dms),
            SettingKey::DisableGifsInProfilePictures => {
                SettingValue::Flag(self.disable_gifs_in_profile_pictures)
            }
            SettingKey::ReplaceHeartsByStars => SettingValue::Flag(self.replace_hearts_by_stars),
            SettingKey::HideColumnIcons => SettingValue::Flag(self.hide_column_icons),
            SettingKey::ShowClearButtonInColumnsHeader => {
                SettingValue::Flag(self.show_clear_button_in_columns_header)
            }
            SettingKey::ShowCollapseButtonInColumnsHeader => {
                SettingValue::Flag(self.show_collapse_button_in_columns_header)
            }
        }
    }

    pub fn apply(&mut self, change: SettingChange) {
        match change {
            SettingChange::AvatarsShape(shape) => self.avatars_shape = shape,
            SettingChange::ScrollbarsMode(mode) => self.scrollbars_mode = mode,
            SettingChange::CustomAccentColor(text) => self.custom_accent_color = text,
            SettingChange::CustomDarkTheme(text) => self.custom_dark_theme = text,
            SettingChange::Flag(flag, on) => *self.flag_mut(flag) = on,
        }
    }

    fn flag_mut(&mut self, flag: FlagSetting) -> &mut bool {
        match flag {
            FlagSetting::BadgesOnTopOfAvatars => &mut self.badges_on_top_of_avatars,
            FlagSetting::CollapseReadDms => &mut self.collapse_read_dms,
            FlagSetting::DisableGifsInProfilePictures => {
                &mut self.disable_gifs_in_profile_pictures
            }
            FlagSetting::ReplaceHeartsByStars => &mut self.replace_hearts_by_stars,
            FlagSetting::HideColumnIcons => &mut self.hide_column_icons,
            FlagSetting::ShowClearButtonInColumnsHeader => {
                &mut self.show_clear_button_in_columns_header
            }
            FlagSetting::ShowCollapseButtonInColumnsHeader => {
                &mut self.show_collapse_button_in_columns_header
            }
        }
    }
}
