use eframe::egui;

use crate::nav::Transition;

/// Keys the presenter reacts to, independent of the windowing backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    ArrowRight,
    ArrowLeft,
    Space,
    Home,
    End,
    Escape,
    Char(char),
}

impl KeyInput {
    pub fn from_egui(key: egui::Key, shift: bool) -> Option<Self> {
        let input = match key {
            egui::Key::ArrowRight => Self::ArrowRight,
            egui::Key::ArrowLeft => Self::ArrowLeft,
            egui::Key::Space => Self::Space,
            egui::Key::Home => Self::Home,
            egui::Key::End => Self::End,
            egui::Key::Escape => Self::Escape,
            egui::Key::P => Self::Char(if shift { 'P' } else { 'p' }),
            egui::Key::F => Self::Char(if shift { 'F' } else { 'f' }),
            _ => return None,
        };
        Some(input)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Navigate(Transition),
    TogglePresenter,
    ToggleFullscreen,
    ExitFullscreen,
}

/// Map a key to an action. `None` means the key is not ours and must be left
/// for other handlers.
pub fn map_key(key: KeyInput) -> Option<Action> {
    match key {
        KeyInput::ArrowRight | KeyInput::Space => Some(Action::Navigate(Transition::Next)),
        KeyInput::ArrowLeft => Some(Action::Navigate(Transition::Previous)),
        KeyInput::Home => Some(Action::Navigate(Transition::First)),
        KeyInput::End => Some(Action::Navigate(Transition::Last)),
        KeyInput::Char('p' | 'P') => Some(Action::TogglePresenter),
        KeyInput::Char('f' | 'F') => Some(Action::ToggleFullscreen),
        KeyInput::Escape => Some(Action::ExitFullscreen),
        KeyInput::Char(_) => None,
    }
}

/// Collect the actions for this frame's key presses, consuming every key that
/// maps to one so it does not reach other widgets.
pub fn take_actions(ctx: &egui::Context) -> Vec<Action> {
    ctx.input_mut(|i| {
        let pressed: Vec<(egui::Key, egui::Modifiers)> = i
            .events
            .iter()
            .filter_map(|e| match e {
                egui::Event::Key {
                    key,
                    pressed: true,
                    modifiers,
                    ..
                } => Some((*key, *modifiers)),
                _ => None,
            })
            .collect();

        let mut actions = Vec::new();
        for (key, modifiers) in pressed {
            let Some(action) = KeyInput::from_egui(key, modifiers.shift).and_then(map_key) else {
                continue;
            };
            i.consume_key(modifiers, key);
            actions.push(action);
        }
        actions
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_navigation_keys() {
        assert_eq!(
            map_key(KeyInput::ArrowRight),
            Some(Action::Navigate(Transition::Next))
        );
        assert_eq!(
            map_key(KeyInput::Space),
            Some(Action::Navigate(Transition::Next))
        );
        assert_eq!(
            map_key(KeyInput::ArrowLeft),
            Some(Action::Navigate(Transition::Previous))
        );
        assert_eq!(
            map_key(KeyInput::Home),
            Some(Action::Navigate(Transition::First))
        );
        assert_eq!(
            map_key(KeyInput::End),
            Some(Action::Navigate(Transition::Last))
        );
    }

    #[test]
    fn test_mode_keys_both_cases() {
        assert_eq!(map_key(KeyInput::Char('p')), Some(Action::TogglePresenter));
        assert_eq!(map_key(KeyInput::Char('P')), Some(Action::TogglePresenter));
        assert_eq!(map_key(KeyInput::Char('f')), Some(Action::ToggleFullscreen));
        assert_eq!(map_key(KeyInput::Char('F')), Some(Action::ToggleFullscreen));
        assert_eq!(map_key(KeyInput::Escape), Some(Action::ExitFullscreen));
    }

    #[test]
    fn test_unmapped_keys_pass_through() {
        assert_eq!(map_key(KeyInput::Char('x')), None);
        assert_eq!(KeyInput::from_egui(egui::Key::Q, false), None);
        assert_eq!(KeyInput::from_egui(egui::Key::ArrowUp, false), None);
    }

    #[test]
    fn test_from_egui_shift() {
        assert_eq!(
            KeyInput::from_egui(egui::Key::P, true),
            Some(KeyInput::Char('P'))
        );
        assert_eq!(
            KeyInput::from_egui(egui::Key::F, false),
            Some(KeyInput::Char('f'))
        );
    }
}
