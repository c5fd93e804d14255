use deck_logging::deck_warn;

use crate::{Effect, Msg, SettingsState};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: SettingsState, msg: Msg) -> (SettingsState, Vec<Effect>) {
    let effects = match msg {
        Msg::SectionSelected(section) => {
            state.select(section);
            Vec::new()
        }
        Msg::SettingChanged(change) => {
            state.edit(change);
            Vec::new()
        }
        Msg::SaveClicked => {
            // The button is disabled in this case; a stray click must not write.
            if !state.can_save() {
                return (state, Vec::new());
            }
            let committed = state.commit();
            vec![Effect::PersistSettings(committed)]
        }
        Msg::SaveSucceeded => {
            state.confirm_save();
            Vec::new()
        }
        Msg::SaveFailed => {
            if !state.reject_save() {
                deck_warn!("save failure reported with no save in flight");
            }
            Vec::new()
        }
        Msg::OpenHostSettingsClicked => vec![Effect::OpenHostSettings],
    };

    (state, effects)
}
