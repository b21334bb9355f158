use std::collections::HashMap;
use std::fmt;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Quit,
    // Panel navigation
    FocusNext,
    FocusPrev,
    // Panel lifecycle
    SavePanel,
    HidePanel,
    ShowHidden,
    ClosePanel,
    // Save prompt
    PromptSave,
    PromptDiscard,
    PromptCancel,
    PromptNext,
    PromptPrev,
    PromptAccept,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Action::Quit => "Quit",
            Action::FocusNext => "Focus next panel",
            Action::FocusPrev => "Focus previous panel",
            Action::SavePanel => "Save panel",
            Action::HidePanel => "Hide panel",
            Action::ShowHidden => "Show hidden panels",
            Action::ClosePanel => "Close panel",
            Action::PromptSave => "Prompt: save",
            Action::PromptDiscard => "Prompt: discard",
            Action::PromptCancel => "Prompt: cancel",
            Action::PromptNext => "Prompt: next button",
            Action::PromptPrev => "Prompt: previous button",
            Action::PromptAccept => "Prompt: press selected button",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyCombo {
    pub code: KeyCode,
    pub mods: KeyModifiers,
}

impl KeyCombo {
    pub fn new(code: KeyCode, mods: KeyModifiers) -> Self {
        Self { code, mods }
    }

    pub fn matches(&self, key: &KeyEvent) -> bool {
        key.code == self.code && key.modifiers == self.mods
    }

    pub fn display(&self) -> String {
        let mut parts = Vec::new();
        if self.mods.contains(KeyModifiers::CONTROL) {
            parts.push("Ctrl".to_string());
        }
        if self.mods.contains(KeyModifiers::SHIFT) {
            parts.push("Shift".to_string());
        }
        if self.mods.contains(KeyModifiers::ALT) {
            parts.push("Alt".to_string());
        }
        let code = match self.code {
            KeyCode::Char(c) => c.to_ascii_uppercase().to_string(),
            KeyCode::Esc => "Esc".to_string(),
            KeyCode::Enter => "Enter".to_string(),
            KeyCode::Tab => "Tab".to_string(),
            KeyCode::BackTab => "BackTab".to_string(),
            KeyCode::Left => "Left".to_string(),
            KeyCode::Right => "Right".to_string(),
            KeyCode::F(n) => format!("F{}", n),
            _ => format!("{:?}", self.code),
        };
        parts.push(code);
        parts.join("+")
    }
}

impl fmt::Display for KeyCombo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display())
    }
}

#[derive(Debug, Clone)]
pub struct KeyBindings {
    map: HashMap<Action, Vec<KeyCombo>>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        use Action::*;
        let mut kb = Self::new();
        kb.add(
            Quit,
            KeyCombo::new(KeyCode::Char('q'), KeyModifiers::CONTROL),
        );
        kb.add(FocusNext, KeyCombo::new(KeyCode::Tab, KeyModifiers::NONE));
        kb.add(
            FocusPrev,
            KeyCombo::new(KeyCode::BackTab, KeyModifiers::SHIFT),
        );
        kb.add(
            FocusPrev,
            KeyCombo::new(KeyCode::BackTab, KeyModifiers::NONE),
        );
        kb.add(
            SavePanel,
            KeyCombo::new(KeyCode::Char('s'), KeyModifiers::CONTROL),
        );
        kb.add(HidePanel, KeyCombo::new(KeyCode::F(2), KeyModifiers::NONE));
        kb.add(ShowHidden, KeyCombo::new(KeyCode::F(3), KeyModifiers::NONE));
        kb.add(
            ClosePanel,
            KeyCombo::new(KeyCode::Char('w'), KeyModifiers::CONTROL),
        );
        // Save prompt
        kb.add(
            PromptSave,
            KeyCombo::new(KeyCode::Char('s'), KeyModifiers::NONE),
        );
        kb.add(
            PromptSave,
            KeyCombo::new(KeyCode::Char('y'), KeyModifiers::NONE),
        );
        kb.add(
            PromptDiscard,
            KeyCombo::new(KeyCode::Char('d'), KeyModifiers::NONE),
        );
        kb.add(
            PromptDiscard,
            KeyCombo::new(KeyCode::Char('n'), KeyModifiers::NONE),
        );
        kb.add(PromptCancel, KeyCombo::new(KeyCode::Esc, KeyModifiers::NONE));
        kb.add(
            PromptCancel,
            KeyCombo::new(KeyCode::Char('c'), KeyModifiers::NONE),
        );
        kb.add(PromptNext, KeyCombo::new(KeyCode::Tab, KeyModifiers::NONE));
        kb.add(PromptNext, KeyCombo::new(KeyCode::Right, KeyModifiers::NONE));
        kb.add(
            PromptPrev,
            KeyCombo::new(KeyCode::BackTab, KeyModifiers::SHIFT),
        );
        kb.add(
            PromptPrev,
            KeyCombo::new(KeyCode::BackTab, KeyModifiers::NONE),
        );
        kb.add(PromptPrev, KeyCombo::new(KeyCode::Left, KeyModifiers::NONE));
        kb.add(
            PromptAccept,
            KeyCombo::new(KeyCode::Enter, KeyModifiers::NONE),
        );
        kb
    }
}

impl KeyBindings {
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    pub fn add(&mut self, action: Action, combo: KeyCombo) {
        self.map.entry(action).or_default().push(combo);
    }

    pub fn matches(&self, action: Action, key: &KeyEvent) -> bool {
        if let Some(list) = self.map.get(&action) {
            list.iter().any(|c| c.matches(key))
        } else {
            false
        }
    }

    /// Return the first `KeyCombo` mapped to `action`, if any.
    pub fn first_combo(&self, action: Action) -> Option<KeyCombo> {
        self.map.get(&action).and_then(|list| list.first().cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_quit() {
        let kb = KeyBindings::default();
        let ev = KeyEvent::new(KeyCode::Char('q'), KeyModifiers::CONTROL);
        assert!(kb.matches(Action::Quit, &ev));
    }

    #[test]
    fn prompt_keys_follow_yes_no_cancel() {
        let kb = KeyBindings::default();
        let key = |c| KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE);
        assert!(kb.matches(Action::PromptSave, &key('y')));
        assert!(kb.matches(Action::PromptDiscard, &key('n')));
        assert!(kb.matches(Action::PromptCancel, &key('c')));
        assert!(kb.matches(
            Action::PromptCancel,
            &KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE)
        ));
    }

    #[test]
    fn combo_display_lists_modifiers() {
        let kb = KeyBindings::default();
        assert_eq!(kb.first_combo(Action::SavePanel).unwrap().display(), "Ctrl+S");
        assert_eq!(kb.first_combo(Action::HidePanel).unwrap().display(), "F2");
    }
}
