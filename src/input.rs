//! Input surface.
//!
//! The host feeds raw key/pointer events into a [`KeyTracker`]; once per tick
//! the tracker is sampled into one [`InputState`] per player. The simulation
//! only ever reads those snapshots.

use std::collections::{HashMap, HashSet};

use crossterm::event::KeyCode;
use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::entities::WeaponKind;

/// A key counts as held if its last press/repeat arrived within this many
/// frames. Covers terminals that never report key releases.
pub const HOLD_WINDOW: u64 = 8;

/// How a player's facing angle is chosen. Fixed per player at session start.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AimStrategy {
    /// Face the pointer position.
    Pointer,
    /// Face the last nonzero movement direction.
    #[default]
    MovementFacing,
    /// Movement facing, but lock onto the nearest hostile while standing
    /// still (only when auto-aim is enabled in the config).
    AutoAim,
}

/// One player's controls for a single tick.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct InputState {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    pub fire: bool,
    pub reload: bool,
    /// -1 / +1 to step through owned weapons.
    pub cycle: i32,
    pub select: Option<WeaponKind>,
    /// Pointer position in canvas coordinates.
    pub pointer: Option<Vec2>,
}

impl InputState {
    /// Unit movement vector, or zero with no directional input.
    pub fn direction(&self) -> Vec2 {
        let x = self.right as i32 - self.left as i32;
        let y = self.down as i32 - self.up as i32;
        Vec2::new(x as f32, y as f32).normalize_or_zero()
    }
}

#[derive(Clone, Debug)]
pub struct KeyBindings {
    pub up: Vec<KeyCode>,
    pub down: Vec<KeyCode>,
    pub left: Vec<KeyCode>,
    pub right: Vec<KeyCode>,
    pub fire: Vec<KeyCode>,
    pub reload: KeyCode,
    pub next_weapon: KeyCode,
    pub prev_weapon: KeyCode,
    /// Direct-select keys, in `WeaponKind::ALL` order.
    pub select: Vec<KeyCode>,
}

impl KeyBindings {
    /// Player one: WASD, space to fire, number row to pick a weapon.
    pub fn primary() -> Self {
        Self {
            up: vec![KeyCode::Char('w'), KeyCode::Char('W')],
            down: vec![KeyCode::Char('s'), KeyCode::Char('S')],
            left: vec![KeyCode::Char('a'), KeyCode::Char('A')],
            right: vec![KeyCode::Char('d'), KeyCode::Char('D')],
            fire: vec![KeyCode::Char(' ')],
            reload: KeyCode::Char('r'),
            next_weapon: KeyCode::Char('e'),
            prev_weapon: KeyCode::Char('q'),
            select: ('1'..='7').map(KeyCode::Char).collect(),
        }
    }

    /// Player two on the same keyboard: arrows, enter to fire.
    pub fn secondary() -> Self {
        Self {
            up: vec![KeyCode::Up],
            down: vec![KeyCode::Down],
            left: vec![KeyCode::Left],
            right: vec![KeyCode::Right],
            fire: vec![KeyCode::Enter],
            reload: KeyCode::Char('/'),
            next_weapon: KeyCode::Char('.'),
            prev_weapon: KeyCode::Char(','),
            select: Vec::new(),
        }
    }
}

/// Continuously updated from asynchronous events, sampled once per tick.
#[derive(Debug, Default)]
pub struct KeyTracker {
    last_seen: HashMap<KeyCode, u64>,
    pressed: HashSet<KeyCode>,
    pointer: Option<Vec2>,
    pointer_down: bool,
    frame: u64,
}

impl KeyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_frame(&mut self, frame: u64) {
        self.frame = frame;
    }

    pub fn press(&mut self, code: KeyCode) {
        self.last_seen.insert(code, self.frame);
        self.pressed.insert(code);
    }

    pub fn repeat(&mut self, code: KeyCode) {
        self.last_seen.insert(code, self.frame);
    }

    pub fn release(&mut self, code: KeyCode) {
        self.last_seen.remove(&code);
    }

    pub fn pointer_moved(&mut self, pos: Vec2) {
        self.pointer = Some(pos);
    }

    pub fn pointer_button(&mut self, down: bool) {
        self.pointer_down = down;
    }

    pub fn is_held(&self, code: &KeyCode) -> bool {
        self.last_seen
            .get(code)
            .map(|&last| self.frame.saturating_sub(last) <= HOLD_WINDOW)
            .unwrap_or(false)
    }

    fn any_held(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.is_held(c))
    }

    /// Build one player's snapshot. `with_pointer` routes pointer position and
    /// button to this player.
    pub fn sample(&self, bindings: &KeyBindings, with_pointer: bool) -> InputState {
        let cycle = self.pressed.contains(&bindings.next_weapon) as i32
            - self.pressed.contains(&bindings.prev_weapon) as i32;
        let select = bindings
            .select
            .iter()
            .zip(WeaponKind::ALL)
            .find(|(code, _)| self.pressed.contains(*code))
            .map(|(_, weapon)| weapon);
        InputState {
            up: self.any_held(&bindings.up),
            down: self.any_held(&bindings.down),
            left: self.any_held(&bindings.left),
            right: self.any_held(&bindings.right),
            fire: self.any_held(&bindings.fire) || (with_pointer && self.pointer_down),
            reload: self.pressed.contains(&bindings.reload),
            cycle,
            select,
            pointer: if with_pointer { self.pointer } else { None },
        }
    }

    /// Forget one-shot presses once every player has been sampled.
    pub fn end_frame(&mut self) {
        self.pressed.clear();
    }
}
