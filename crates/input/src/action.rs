use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use ratmaze_common::MoveIntent;
use serde::{Deserialize, Serialize};

/// A high-level action a key can be bound to.
///
/// The kernel consumes [`MoveIntent`]s built from held movement actions,
/// never raw key events. View and mode actions are one-shot and are handled
/// by the front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    MoveForward,
    MoveBackward,
    TurnLeft,
    TurnRight,
    StrafeLeft,
    StrafeRight,
    /// Switch to the overhead camera.
    TopView,
    /// Switch to the third-person camera.
    ObservationView,
    /// Switch to the first-person camera.
    RatView,
    /// Toggle render-distance culling.
    TogglePerformance,
    /// Bound but does nothing.
    Noop,
}

impl Action {
    pub const ALL: [Action; 11] = [
        Action::MoveForward,
        Action::MoveBackward,
        Action::TurnLeft,
        Action::TurnRight,
        Action::StrafeLeft,
        Action::StrafeRight,
        Action::TopView,
        Action::ObservationView,
        Action::RatView,
        Action::TogglePerformance,
        Action::Noop,
    ];

    /// Movement actions are held; everything else fires once on press.
    pub fn is_movement(self) -> bool {
        matches!(
            self,
            Action::MoveForward
                | Action::MoveBackward
                | Action::TurnLeft
                | Action::TurnRight
                | Action::StrafeLeft
                | Action::StrafeRight
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            Action::MoveForward => "move_forward",
            Action::MoveBackward => "move_backward",
            Action::TurnLeft => "turn_left",
            Action::TurnRight => "turn_right",
            Action::StrafeLeft => "strafe_left",
            Action::StrafeRight => "strafe_right",
            Action::TopView => "top_view",
            Action::ObservationView => "observation_view",
            Action::RatView => "rat_view",
            Action::TogglePerformance => "toggle_performance",
            Action::Noop => "noop",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BindingError {
    #[error("unknown action '{0}'")]
    UnknownAction(String),
    #[error("empty key name")]
    EmptyKey,
}

impl FromStr for Action {
    type Err = BindingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::ALL
            .into_iter()
            .find(|a| a.name() == s)
            .ok_or_else(|| BindingError::UnknownAction(s.to_string()))
    }
}

/// Key code to action bindings. Key names follow DOM `KeyboardEvent.code`
/// (`KeyW`, `ArrowUp`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InputMap {
    bindings: BTreeMap<String, Action>,
}

impl Default for InputMap {
    fn default() -> Self {
        let mut map = Self::empty();
        for (key, action) in [
            ("KeyW", Action::MoveForward),
            ("KeyS", Action::MoveBackward),
            ("KeyA", Action::TurnLeft),
            ("KeyD", Action::TurnRight),
            ("KeyQ", Action::StrafeLeft),
            ("KeyE", Action::StrafeRight),
            ("KeyT", Action::TopView),
            ("KeyO", Action::ObservationView),
            ("KeyR", Action::RatView),
            ("KeyP", Action::TogglePerformance),
        ] {
            map.bindings.insert(key.to_string(), action);
        }
        map
    }
}

impl InputMap {
    pub fn empty() -> Self {
        Self {
            bindings: BTreeMap::new(),
        }
    }

    /// Bind `key` to `action`, returning the action it replaces.
    pub fn bind(&mut self, key: &str, action: Action) -> Result<Option<Action>, BindingError> {
        let key = key.trim();
        if key.is_empty() {
            return Err(BindingError::EmptyKey);
        }
        Ok(self.bindings.insert(key.to_string(), action))
    }

    /// Parse a `key=action` binding.
    pub fn bind_spec(&mut self, spec: &str) -> Result<Option<Action>, BindingError> {
        let (key, action) = spec.split_once('=').ok_or(BindingError::EmptyKey)?;
        self.bind(key, action.trim().parse()?)
    }

    pub fn unbind(&mut self, key: &str) -> Option<Action> {
        self.bindings.remove(key)
    }

    pub fn action_for(&self, key: &str) -> Option<Action> {
        self.bindings.get(key).copied()
    }

    /// Keys bound to `action`, in key order.
    pub fn keys_for(&self, action: Action) -> impl Iterator<Item = &str> + '_ {
        self.bindings
            .iter()
            .filter(move |(_, a)| **a == action)
            .map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// Held-key tracker that turns key events into a per-tick [`MoveIntent`].
#[derive(Debug, Clone, Default)]
pub struct InputState {
    map: InputMap,
    /// Pressed keys and the movement action each was bound to when pressed.
    held: BTreeMap<String, Action>,
}

impl InputState {
    pub fn new(map: InputMap) -> Self {
        Self {
            map,
            held: BTreeMap::new(),
        }
    }

    pub fn map(&self) -> &InputMap {
        &self.map
    }

    /// Handle a key press. Returns the bound action, if any. Movement actions
    /// stay held until every key pressed for them is released.
    pub fn key_down(&mut self, key: &str) -> Option<Action> {
        let action = self.map.action_for(key)?;
        if action.is_movement() {
            self.held.insert(key.to_owned(), action);
        }
        tracing::trace!(key, %action, "key down");
        Some(action)
    }

    pub fn key_up(&mut self, key: &str) {
        if let Some(action) = self.held.remove(key) {
            tracing::trace!(key, %action, "key up");
        }
    }

    /// Drop every held action, e.g. on focus loss or game over.
    pub fn release_all(&mut self) {
        self.held.clear();
    }

    pub fn is_held(&self, action: Action) -> bool {
        self.held.values().any(|&held| held == action)
    }

    pub fn intent(&self) -> MoveIntent {
        MoveIntent {
            forward: self.is_held(Action::MoveForward),
            backward: self.is_held(Action::MoveBackward),
            turn_left: self.is_held(Action::TurnLeft),
            turn_right: self.is_held(Action::TurnRight),
            strafe_left: self.is_held(Action::StrafeLeft),
            strafe_right: self.is_held(Action::StrafeRight),
        }
    }
}
