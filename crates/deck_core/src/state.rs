use crate::view_model::{SectionView, SettingsViewModel};
use crate::{SettingChange, Settings};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Section {
    Interface,
    ThemeTweaks,
    #[default]
    Columns,
}

impl Section {
    pub const ALL: [Section; 3] = [Section::Interface, Section::ThemeTweaks, Section::Columns];

    pub fn id(self) -> &'static str {
        match self {
            Section::Interface => "interface",
            Section::ThemeTweaks => "theme-tweaks",
            Section::Columns => "columns",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Section::Interface => "Interface",
            Section::ThemeTweaks => "Theme tweaks",
            Section::Columns => "Columns",
        }
    }
}

/// Settings editor state: the last persisted copy and the draft being edited.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SettingsState {
    persisted: Settings,
    draft: Settings,
    touched: bool,
    selected: Section,
    render_pending: bool,
    /// Persisted copy from before the save still in flight.
    rollback: Option<Settings>,
}

impl SettingsState {
    /// Starts an editing session from the settings loaded at session start.
    pub fn new(persisted: Settings) -> Self {
        Self {
            draft: persisted.clone(),
            persisted,
            touched: false,
            selected: Section::default(),
            render_pending: true,
            rollback: None,
        }
    }

    pub fn view(&self) -> SettingsViewModel {
        SettingsViewModel {
            sections: Section::ALL
                .iter()
                .map(|&section| SectionView {
                    id: section.id(),
                    label: section.label(),
                    active: section == self.selected,
                })
                .collect(),
            selected: self.selected,
            draft: self.draft.clone(),
            can_save: self.can_save(),
        }
    }

    /// True only when a field was touched since load and the draft differs
    /// from the persisted copy.
    pub fn can_save(&self) -> bool {
        self.touched && self.draft != self.persisted
    }

    pub fn persisted(&self) -> &Settings {
        &self.persisted
    }

    pub fn draft(&self) -> &Settings {
        &self.draft
    }

    pub fn selected(&self) -> Section {
        self.selected
    }

    /// Returns whether the view changed since the last call, and resets the flag.
    pub fn consume_render_pending(&mut self) -> bool {
        std::mem::take(&mut self.render_pending)
    }

    pub(crate) fn select(&mut self, section: Section) -> bool {
        if self.selected == section {
            return false;
        }
        self.selected = section;
        self.render_pending = true;
        true
    }

    pub(crate) fn edit(&mut self, change: SettingChange) {
        self.draft.apply(change);
        self.touched = true;
        self.render_pending = true;
    }

    /// Whether a committed save has not been confirmed or refused yet.
    pub fn save_in_flight(&self) -> bool {
        self.rollback.is_some()
    }

    /// Makes the draft the new persisted copy and returns it. The previous
    /// copy is kept until the store confirms or refuses the write.
    pub(crate) fn commit(&mut self) -> Settings {
        let previous = std::mem::replace(&mut self.persisted, self.draft.clone());
        self.rollback = Some(previous);
        self.touched = false;
        self.render_pending = true;
        self.persisted.clone()
    }

    pub(crate) fn confirm_save(&mut self) {
        self.rollback = None;
    }

    /// Restores the copy that is still on disk so the draft can be saved
    /// again. Returns false when no save was in flight.
    pub(crate) fn reject_save(&mut self) -> bool {
        let Some(previous) = self.rollback.take() else {
            return false;
        };
        self.persisted = previous;
        self.touched = true;
        self.render_pending = true;
        true
    }
}
