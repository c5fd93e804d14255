use deck_core::{Effect, Msg};
use deck_logging::{deck_error, deck_info};

use crate::persist::SettingsStore;

/// Opens the host application's native settings panel.
pub trait HostSettingsOpener: Send + Sync {
    fn open_host_settings(&self);
}

/// Executes the effects produced by the settings editor.
pub struct SettingsEffectRunner<S, O> {
    store: S,
    opener: O,
}

impl<S: SettingsStore, O: HostSettingsOpener> SettingsEffectRunner<S, O> {
    pub fn new(store: S, opener: O) -> Self {
        Self { store, opener }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Runs every effect in order and returns the messages to feed back
    /// into `update`. Stops at the first failed save.
    pub fn run(&self, effects: Vec<Effect>) -> Vec<Msg> {
        let mut feedback = Vec::new();
        for effect in effects {
            match effect {
                Effect::PersistSettings(settings) => match self.store.save(&settings) {
                    Ok(()) => {
                        deck_info!("settings saved");
                        feedback.push(Msg::SaveSucceeded);
                    }
                    Err(err) => {
                        deck_error!("failed to save settings: {}", err);
                        feedback.push(Msg::SaveFailed);
                        break;
                    }
                },
                Effect::OpenHostSettings => self.opener.open_host_settings(),
            }
        }
        feedback
    }
}
