use engine::{EffectGroup, ResetChannel};
use winit::keyboard::{Key, NamedKey};

/// What a key press asks the engine to do.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HotkeyAction {
    TogglePause,
    Reset(ResetChannel),
    Randomize(EffectGroup),
    RandomizePalette,
    QualityNudge(f32),
    Quit,
}

/// Maps a logical key to its action. Unbound keys return `None`.
pub fn action_for(key: &Key) -> Option<HotkeyAction> {
    match key {
        Key::Named(NamedKey::Space) => Some(HotkeyAction::TogglePause),
        Key::Named(NamedKey::Escape) => Some(HotkeyAction::Quit),
        Key::Character(value) => match value.as_str() {
            " " => Some(HotkeyAction::TogglePause),
            "q" => Some(HotkeyAction::Quit),
            "r" => Some(HotkeyAction::Reset(ResetChannel::All)),
            "s" => Some(HotkeyAction::Reset(ResetChannel::Spin)),
            "f" => Some(HotkeyAction::Reset(ResetChannel::Rotation)),
            "m" => Some(HotkeyAction::Reset(ResetChannel::Motion)),
            "w" => Some(HotkeyAction::Reset(ResetChannel::Warps)),
            "v" => Some(HotkeyAction::Reset(ResetChannel::Camera)),
            "e" => Some(HotkeyAction::Randomize(EffectGroup::SdfEffect)),
            "d" => Some(HotkeyAction::Randomize(EffectGroup::Displacement)),
            "c" => Some(HotkeyAction::Randomize(EffectGroup::Crunch)),
            "p" => Some(HotkeyAction::RandomizePalette),
            "[" => Some(HotkeyAction::QualityNudge(-0.1)),
            "]" => Some(HotkeyAction::QualityNudge(0.1)),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::keyboard::SmolStr;

    fn character(value: &str) -> Key {
        Key::Character(SmolStr::new(value))
    }

    #[test]
    fn space_toggles_pause_in_both_forms() {
        assert_eq!(
            action_for(&Key::Named(NamedKey::Space)),
            Some(HotkeyAction::TogglePause)
        );
        assert_eq!(action_for(&character(" ")), Some(HotkeyAction::TogglePause));
    }

    #[test]
    fn reset_and_randomize_bindings() {
        assert_eq!(
            action_for(&character("r")),
            Some(HotkeyAction::Reset(ResetChannel::All))
        );
        assert_eq!(
            action_for(&character("d")),
            Some(HotkeyAction::Randomize(EffectGroup::Displacement))
        );
        assert_eq!(
            action_for(&character("[")),
            Some(HotkeyAction::QualityNudge(-0.1))
        );
    }

    #[test]
    fn unbound_keys_are_ignored() {
        assert_eq!(action_for(&character("z")), None);
        assert_eq!(action_for(&Key::Named(NamedKey::Tab)), None);
    }
}
