//! Entity types for one run. Data only; the subsystems own the behaviour.

use std::collections::BTreeMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::config::{GameConfig, LevelConfig, WeaponProfile};
use crate::geometry::{Bounds, Rect};
use crate::input::AimStrategy;
use crate::progression::{ComboState, RunStats};
use crate::registry::{EntityRegistry, Handle};
use crate::waves::WaveScheduler;

// ── Enumerations ──────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HostileKind {
    Basic,
    Fast,
    /// Stops at range and shoots.
    Ranged,
    /// Detonates on death or on touching a player.
    Exploder,
    Armored,
    /// Weak reinforcement summoned by the boss.
    Minion,
    Boss,
}

impl HostileKind {
    pub fn label(self) -> &'static str {
        match self {
            HostileKind::Basic => "Grunt",
            HostileKind::Fast => "Runner",
            HostileKind::Ranged => "Spitter",
            HostileKind::Exploder => "Bloater",
            HostileKind::Armored => "Brute",
            HostileKind::Minion => "Spawnling",
            HostileKind::Boss => "Overlord",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WeaponKind {
    Pistol,
    Shotgun,
    Smg,
    Sniper,
    Flamethrower,
    /// Placeable explosive barrel.
    Barrel,
    /// Placeable wall segment.
    Wall,
}

impl WeaponKind {
    pub const ALL: [WeaponKind; 7] = [
        WeaponKind::Pistol,
        WeaponKind::Shotgun,
        WeaponKind::Smg,
        WeaponKind::Sniper,
        WeaponKind::Flamethrower,
        WeaponKind::Barrel,
        WeaponKind::Wall,
    ];

    pub fn is_placeable(self) -> bool {
        matches!(self, WeaponKind::Barrel | WeaponKind::Wall)
    }

    pub fn label(self) -> &'static str {
        match self {
            WeaponKind::Pistol => "Pistol",
            WeaponKind::Shotgun => "Shotgun",
            WeaponKind::Smg => "SMG",
            WeaponKind::Sniper => "Sniper",
            WeaponKind::Flamethrower => "Flamer",
            WeaponKind::Barrel => "Barrel",
            WeaponKind::Wall => "Wall",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ItemKind {
    Heal,
    Ammo,
    /// Kills every live hostile.
    Nuke,
    RapidFire,
    DoubleScore,
    Shield,
    Freeze,
}

/// Sound grouping for pickup cues.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum PickupCategory {
    Supply,
    Powerup,
    Bomb,
}

impl ItemKind {
    pub fn buff(self) -> Option<Buff> {
        match self {
            ItemKind::RapidFire => Some(Buff::RapidFire),
            ItemKind::DoubleScore => Some(Buff::DoubleScore),
            ItemKind::Shield => Some(Buff::Shield),
            ItemKind::Freeze => Some(Buff::Freeze),
            ItemKind::Heal | ItemKind::Ammo | ItemKind::Nuke => None,
        }
    }

    pub fn category(self) -> PickupCategory {
        match self {
            ItemKind::Heal | ItemKind::Ammo => PickupCategory::Supply,
            ItemKind::Nuke => PickupCategory::Bomb,
            _ => PickupCategory::Powerup,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ItemKind::Heal => "MEDKIT",
            ItemKind::Ammo => "AMMO",
            ItemKind::Nuke => "NUKE",
            ItemKind::RapidFire => "RAPID FIRE",
            ItemKind::DoubleScore => "2X SCORE",
            ItemKind::Shield => "SHIELD",
            ItemKind::Freeze => "FREEZE",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ObstacleKind {
    Wall,
    Crate,
    Barrel,
    PlacedWall,
}

impl ObstacleKind {
    /// Wall-type obstacles always stop a shot, piercing or not.
    pub fn stops_piercing(self) -> bool {
        matches!(self, ObstacleKind::Wall | ObstacleKind::PlacedWall)
    }
}

/// Timed modifiers granted by pickups.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Buff {
    RapidFire,
    DoubleScore,
    Shield,
    Freeze,
}

impl Buff {
    pub fn label(self) -> &'static str {
        match self {
            Buff::RapidFire => "RAPID",
            Buff::DoubleScore => "2X",
            Buff::Shield => "SHIELD",
            Buff::Freeze => "FREEZE",
        }
    }
}

/// Colour hint carried by visual entities; the renderer maps it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tint {
    White,
    Yellow,
    Orange,
    Red,
    Cyan,
    Green,
    Magenta,
    Grey,
    Blue,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "kind")]
pub enum GameMode {
    /// Fixed number of waves on a chosen level.
    Campaign,
    /// Waves never run out; hostiles grow each wave.
    Endless,
    /// Continuous spawning until the clock runs out.
    TimeAttack { ticks: u32 },
}

/// How dead co-op players come back.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "kind")]
pub enum RespawnModel {
    None,
    /// Revive at a living teammate after `delay` ticks.
    Timed { delay: u32 },
    /// Revive when the current wave is cleared.
    WaveBoundary,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Victory,
    Defeat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameStatus {
    Playing,
    Over(Outcome),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PlayerId(pub usize);

/// Who fired a projectile.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Owner {
    Player(PlayerId),
    Hostile(Handle),
}

// ── Bodies ────────────────────────────────────────────────────────────────────

/// Shared physical state of players and hostiles.
///
/// `radius` and `max_hp` are fixed at construction; `hp` only changes
/// through the clamping mutators.
#[derive(Clone, Debug)]
pub struct Body {
    pub pos: Vec2,
    pub angle: f32,
    pub speed: f32,
    hp: i32,
    max_hp: i32,
    radius: f32,
}

impl Body {
    pub fn new(pos: Vec2, radius: f32, max_hp: i32, speed: f32) -> Self {
        let max_hp = max_hp.max(1);
        Self {
            pos,
            angle: 0.0,
            speed,
            hp: max_hp,
            max_hp,
            radius,
        }
    }

    pub fn hp(&self) -> i32 {
        self.hp
    }

    pub fn max_hp(&self) -> i32 {
        self.max_hp
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    /// Subtract up to `amount` hp, never below zero. Returns what was taken.
    pub fn damage(&mut self, amount: i32) -> i32 {
        let taken = amount.max(0).min(self.hp);
        self.hp -= taken;
        taken
    }

    /// Add up to `amount` hp, never above max. Returns what was restored.
    pub fn heal(&mut self, amount: i32) -> i32 {
        let restored = amount.max(0).min(self.max_hp - self.hp);
        self.hp += restored;
        restored
    }

    pub fn kill(&mut self) {
        self.hp = 0;
    }

    pub fn restore(&mut self) {
        self.hp = self.max_hp;
    }
}

// ── Players ───────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct AmmoState {
    pub clip: u32,
    pub reserve: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Reload {
    pub weapon: WeaponKind,
    pub remaining: u32,
}

/// Weapons a player owns, which one is in hand, and per-weapon ammo.
#[derive(Clone, Debug)]
pub struct Loadout {
    owned: Vec<WeaponKind>,
    active: WeaponKind,
    ammo: BTreeMap<WeaponKind, AmmoState>,
}

impl Loadout {
    pub fn new(start: &WeaponProfile) -> Self {
        let mut ammo = BTreeMap::new();
        ammo.insert(start.kind, start.full_ammo());
        Self {
            owned: vec![start.kind],
            active: start.kind,
            ammo,
        }
    }

    pub fn active(&self) -> WeaponKind {
        self.active
    }

    pub fn owned(&self) -> &[WeaponKind] {
        &self.owned
    }

    pub fn owns(&self, weapon: WeaponKind) -> bool {
        self.owned.contains(&weapon)
    }

    /// Add a weapon with a full load. No-op if already owned.
    pub fn grant(&mut self, profile: &WeaponProfile) -> bool {
        if self.owns(profile.kind) {
            return false;
        }
        self.owned.push(profile.kind);
        self.owned.sort();
        self.ammo.insert(profile.kind, profile.full_ammo());
        true
    }

    /// Switch to an owned weapon; locked weapons are ignored.
    pub fn select(&mut self, weapon: WeaponKind) -> bool {
        if !self.owns(weapon) || self.active == weapon {
            return false;
        }
        self.active = weapon;
        true
    }

    /// Step through owned weapons, wrapping at either end.
    pub fn cycle(&mut self, step: i32) -> WeaponKind {
        let n = self.owned.len() as i32;
        if n > 0 {
            let at = self.owned.iter().position(|w| *w == self.active).unwrap_or(0) as i32;
            self.active = self.owned[(at + step).rem_euclid(n) as usize];
        }
        self.active
    }

    pub fn ammo(&self, weapon: WeaponKind) -> AmmoState {
        self.ammo.get(&weapon).copied().unwrap_or_default()
    }

    pub fn ammo_mut(&mut self, weapon: WeaponKind) -> &mut AmmoState {
        self.ammo.entry(weapon).or_default()
    }
}

#[derive(Clone, Debug)]
pub struct Player {
    pub id: PlayerId,
    pub body: Body,
    pub aim: AimStrategy,
    pub loadout: Loadout,
    /// Last nonzero movement direction (unit length).
    pub facing: Vec2,
    pub ticks_since_shot: u32,
    pub ticks_since_place: u32,
    pub reload: Option<Reload>,
    pub respawn_timer: Option<u32>,
    pub score: u32,
    /// Fire was held last tick; empty-clip feedback only fires on the press edge.
    pub trigger_held: bool,
    /// Permanent upgrade bonuses.
    pub speed_bonus: f32,
    pub damage_bonus: f32,
}

// ── Hostiles ──────────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct Hostile {
    pub kind: HostileKind,
    pub body: Body,
    /// Ranged kinds: ticks until the next shot.
    pub attack_timer: u32,
    /// Ticks until this hostile may deal contact damage again.
    pub contact_cooldown: u32,
    /// Boss only: ticks until the next reinforcement burst.
    pub reinforce_timer: u32,
    /// Boss only: set once when hp first drops below half.
    pub enraged: bool,
}

// ── Projectiles ───────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct Projectile {
    pub pos: Vec2,
    pub vel: Vec2,
    pub damage: i32,
    pub owner: Owner,
    /// Ticks left to live; also bounds the reach of short-range weapons.
    pub duration: u32,
    /// Additional hostiles this shot may pass through.
    pub pierce: u32,
    pub radius: f32,
    pub tint: Tint,
    /// Hostiles already struck, so a piercing shot damages each once.
    pub struck: Vec<Handle>,
    /// Obstacles already passed through by a piercing shot.
    pub passed: Vec<Handle>,
}

// ── Terrain & items ───────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct Obstacle {
    pub rect: Rect,
    pub kind: ObstacleKind,
    /// `None` means indestructible.
    pub hp: Option<i32>,
}

#[derive(Clone, Debug)]
pub struct Pickup {
    pub pos: Vec2,
    pub kind: ItemKind,
    pub lifetime: u32,
    /// Float animation phase in radians.
    pub phase: f32,
}

// ── Visual effects ────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub life: u32,
    pub tint: Tint,
}

#[derive(Clone, Debug)]
pub struct FloatingText {
    pub pos: Vec2,
    pub text: String,
    pub life: u32,
    pub tint: Tint,
}

/// Pending area damage, resolved after the subsystem that caused it.
#[derive(Clone, Debug)]
pub struct Blast {
    pub center: Vec2,
    pub radius: f32,
    pub damage: i32,
    /// Player credited with kills caused by this blast.
    pub credit: Option<PlayerId>,
}

// ── Buffs ─────────────────────────────────────────────────────────────────────

/// Independent countdowns, one per buff; zero means inactive.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BuffTimers {
    pub rapid_fire: u32,
    pub double_score: u32,
    pub shield: u32,
    pub freeze: u32,
}

impl BuffTimers {
    pub fn start(&mut self, buff: Buff, ticks: u32) {
        *self.slot(buff) = ticks;
    }

    pub fn is_active(&self, buff: Buff) -> bool {
        self.remaining(buff) > 0
    }

    pub fn remaining(&self, buff: Buff) -> u32 {
        match buff {
            Buff::RapidFire => self.rapid_fire,
            Buff::DoubleScore => self.double_score,
            Buff::Shield => self.shield,
            Buff::Freeze => self.freeze,
        }
    }

    pub fn tick(&mut self) {
        for t in [
            &mut self.rapid_fire,
            &mut self.double_score,
            &mut self.shield,
            &mut self.freeze,
        ] {
            *t = t.saturating_sub(1);
        }
    }

    /// Active buffs and their remaining ticks.
    pub fn active(&self) -> Vec<(Buff, u32)> {
        [Buff::RapidFire, Buff::DoubleScore, Buff::Shield, Buff::Freeze]
            .into_iter()
            .map(|b| (b, self.remaining(b)))
            .filter(|(_, t)| *t > 0)
            .collect()
    }

    fn slot(&mut self, buff: Buff) -> &mut u32 {
        match buff {
            Buff::RapidFire => &mut self.rapid_fire,
            Buff::DoubleScore => &mut self.double_score,
            Buff::Shield => &mut self.shield,
            Buff::Freeze => &mut self.freeze,
        }
    }
}

// ── Master game state ─────────────────────────────────────────────────────────

/// The entire state of one run. Every subsystem takes `&mut` to this; there
/// is no other mutable state anywhere in the simulation.
#[derive(Clone, Debug)]
pub struct SimulationState {
    pub config: GameConfig,
    pub level: LevelConfig,
    pub mode: GameMode,
    pub difficulty: Difficulty,
    pub respawn: RespawnModel,
    pub bounds: Bounds,
    pub world: EntityRegistry,
    pub waves: WaveScheduler,
    pub buffs: BuffTimers,
    pub combo: ComboState,
    pub stats: RunStats,
    pub blasts: Vec<Blast>,
    pub status: GameStatus,
    pub paused: bool,
    pub frame: u64,
}

impl SimulationState {
    pub fn is_over(&self) -> bool {
        matches!(self.status, GameStatus::Over(_))
    }

    pub fn outcome(&self) -> Option<Outcome> {
        match self.status {
            GameStatus::Over(outcome) => Some(outcome),
            GameStatus::Playing => None,
        }
    }

    pub fn is_coop(&self) -> bool {
        self.world.players.len() > 1
    }
}
