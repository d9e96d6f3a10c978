//! Theme slice

use serde::{Deserialize, Serialize};

use super::Reducer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    Light,
    Dark,
    /// Follow the OS appearance
    #[default]
    System,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ThemeState {
    pub mode: ThemeMode,
    pub system_dark: bool,
}

impl ThemeState {
    pub fn is_dark(&self) -> bool {
        match self.mode {
            ThemeMode::Light => false,
            ThemeMode::Dark => true,
            ThemeMode::System => self.system_dark,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum ThemeAction {
    SetMode(ThemeMode),
    SystemAppearanceChanged { dark: bool },
}

impl Reducer for ThemeState {
    type Action = ThemeAction;

    fn reduce(&mut self, action: ThemeAction) {
        match action {
            ThemeAction::SetMode(mode) => self.mode = mode,
            ThemeAction::SystemAppearanceChanged { dark } => self.system_dark = dark,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_mode_follows_os() {
        let mut state = ThemeState::default();
        assert!(!state.is_dark());

        state.reduce(ThemeAction::SystemAppearanceChanged { dark: true });
        assert!(state.is_dark());

        state.reduce(ThemeAction::SetMode(ThemeMode::Light));
        assert!(!state.is_dark());
    }
}
