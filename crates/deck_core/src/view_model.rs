use crate::{Section, Settings};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionView {
    pub id: &'static str,
    pub label: &'static str,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SettingsViewModel {
    pub sections: Vec<SectionView>,
    pub selected: Section,
    pub draft: Settings,
    pub can_save: bool,
}
