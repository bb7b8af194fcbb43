//! Keyboard shortcuts understood by the review surface.

use std::collections::HashMap;

/// A key, independent of any windowing toolkit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// A printable character (compared case-insensitively by [`KeyChord::new`]).
    Char(char),
    /// Arrow up
    ArrowUp,
    /// Arrow down
    ArrowDown,
    /// Escape
    Escape,
    /// Tab
    Tab,
}

/// Modifier state of a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers {
    /// Control (or Command on macOS hosts).
    pub ctrl: bool,
    /// Shift
    pub shift: bool,
    /// Alt / Option
    pub alt: bool,
}

impl Modifiers {
    /// No modifiers.
    pub const NONE: Self = Self {
        ctrl: false,
        shift: false,
        alt: false,
    };
    /// Control only.
    pub const CTRL: Self = Self {
        ctrl: true,
        shift: false,
        alt: false,
    };
    /// Control + Shift.
    pub const CTRL_SHIFT: Self = Self {
        ctrl: true,
        shift: true,
        alt: false,
    };
    /// Alt only.
    pub const ALT: Self = Self {
        ctrl: false,
        shift: false,
        alt: true,
    };
}

/// A key together with its modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyChord {
    /// The key
    pub key: Key,
    /// Held modifiers
    pub modifiers: Modifiers,
}

impl KeyChord {
    /// Build a chord; character keys are normalized to lowercase.
    pub fn new(key: Key, modifiers: Modifiers) -> Self {
        let key = match key {
            Key::Char(ch) => Key::Char(ch.to_ascii_lowercase()),
            other => other,
        };
        Self { key, modifiers }
    }
}

/// Actions a shortcut can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShortcutAction {
    /// Undo the last committed edit.
    Undo,
    /// Redo the last undone edit.
    Redo,
    /// Select the next active insight (wrapping).
    NextInsight,
    /// Select the previous active insight (wrapping).
    PreviousInsight,
    /// Clear the insight selection.
    ClearSelection,
}

/// Chord → action bindings.
#[derive(Debug, Clone)]
pub struct Keymap {
    bindings: HashMap<KeyChord, ShortcutAction>,
}

impl Default for Keymap {
    fn default() -> Self {
        let mut keymap = Self {
            bindings: HashMap::new(),
        };
        let ctrl = |key| KeyChord::new(key, Modifiers::CTRL);
        let alt = |key| KeyChord::new(key, Modifiers::ALT);
        let ctrl_shift_z = KeyChord::new(Key::Char('z'), Modifiers::CTRL_SHIFT);
        let escape = KeyChord::new(Key::Escape, Modifiers::NONE);

        keymap.bind(ctrl(Key::Char('z')), ShortcutAction::Undo);
        keymap.bind(ctrl(Key::Char('y')), ShortcutAction::Redo);
        keymap.bind(ctrl_shift_z, ShortcutAction::Redo);
        keymap.bind(alt(Key::ArrowDown), ShortcutAction::NextInsight);
        keymap.bind(alt(Key::ArrowUp), ShortcutAction::PreviousInsight);
        keymap.bind(escape, ShortcutAction::ClearSelection);
        keymap
    }
}

impl Keymap {
    /// A keymap with no bindings.
    pub fn empty() -> Self {
        Self {
            bindings: HashMap::new(),
        }
    }

    /// Bind (or rebind) a chord.
    pub fn bind(&mut self, chord: KeyChord, action: ShortcutAction) {
        self.bindings.insert(chord, action);
    }

    /// Remove a binding.
    pub fn unbind(&mut self, chord: &KeyChord) -> Option<ShortcutAction> {
        self.bindings.remove(chord)
    }

    /// Action bound to `chord`.
    pub fn resolve(&self, chord: &KeyChord) -> Option<ShortcutAction> {
        let normalized = KeyChord::new(chord.key, chord.modifiers);
        self.bindings.get(&normalized).copied()
    }
}
