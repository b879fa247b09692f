//! Static tables and tunables.
//!
//! Weapon, hostile and item tables are data, not code: every table has a
//! built-in default and may be overridden from a TOML file. Nothing here
//! is mutated once a run has started.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::entities::{AmmoState, Difficulty, HostileKind, ItemKind, ObstacleKind, Tint, WeaponKind};
use crate::error::ConfigError;
use crate::geometry::{Bounds, Rect};

// ── Weapons ───────────────────────────────────────────────────────────────────

/// How a trigger pull turns into projectiles (or terrain).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "mode")]
pub enum FireMode {
    /// One projectile straight along the aim.
    Single,
    /// `projectile_count` pellets at fixed angular offsets `step` apart.
    Fan { step: f32 },
    /// `projectile_count` projectiles, each jittered randomly within `spread`.
    Spray,
    /// Drops an obstacle instead of firing.
    Place { obstacle: ObstacleKind },
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WeaponProfile {
    pub kind: WeaponKind,
    pub damage: i32,
    /// Ticks between shots (or placements).
    pub cooldown: u32,
    pub speed: f32,
    /// Total jitter cone in radians (spray weapons).
    pub spread: f32,
    pub projectile_count: u32,
    pub clip_size: u32,
    pub reload_ticks: u32,
    /// `None` = infinite reserve.
    pub max_reserve: Option<u32>,
    pub pierce: u32,
    /// Projectile ticks-to-live.
    pub lifetime: u32,
    pub projectile_radius: f32,
    pub fire: FireMode,
}

impl WeaponProfile {
    pub fn builtin(kind: WeaponKind) -> Self {
        let base = WeaponProfile {
            kind,
            damage: 25,
            cooldown: 15,
            speed: 10.0,
            spread: 0.0,
            projectile_count: 1,
            clip_size: 12,
            reload_ticks: 60,
            max_reserve: None,
            pierce: 0,
            lifetime: 90,
            projectile_radius: 3.0,
            fire: FireMode::Single,
        };
        match kind {
            WeaponKind::Pistol => base,
            WeaponKind::Shotgun => WeaponProfile {
                damage: 15,
                cooldown: 45,
                speed: 9.0,
                projectile_count: 5,
                clip_size: 6,
                reload_ticks: 90,
                max_reserve: Some(36),
                lifetime: 35,
                fire: FireMode::Fan { step: 0.12 },
                ..base
            },
            WeaponKind::Smg => WeaponProfile {
                damage: 12,
                cooldown: 5,
                speed: 11.0,
                spread: 0.15,
                clip_size: 30,
                reload_ticks: 75,
                max_reserve: Some(180),
                lifetime: 70,
                projectile_radius: 2.0,
                fire: FireMode::Spray,
                ..base
            },
            WeaponKind::Sniper => WeaponProfile {
                damage: 100,
                cooldown: 60,
                speed: 18.0,
                clip_size: 5,
                reload_ticks: 100,
                max_reserve: Some(25),
                pierce: 2,
                lifetime: 80,
                projectile_radius: 2.0,
                ..base
            },
            WeaponKind::Flamethrower => WeaponProfile {
                damage: 4,
                cooldown: 3,
                speed: 6.0,
                spread: 0.5,
                projectile_count: 2,
                clip_size: 100,
                reload_ticks: 120,
                max_reserve: Some(300),
                pierce: 1,
                lifetime: 25,
                projectile_radius: 5.0,
                fire: FireMode::Spray,
                ..base
            },
            WeaponKind::Barrel => WeaponProfile {
                damage: 0,
                cooldown: 30,
                speed: 0.0,
                projectile_count: 0,
                clip_size: 0,
                reload_ticks: 0,
                max_reserve: Some(5),
                lifetime: 0,
                fire: FireMode::Place {
                    obstacle: ObstacleKind::Barrel,
                },
                ..base
            },
            WeaponKind::Wall => WeaponProfile {
                damage: 0,
                cooldown: 20,
                speed: 0.0,
                projectile_count: 0,
                clip_size: 0,
                reload_ticks: 0,
                max_reserve: Some(10),
                lifetime: 0,
                fire: FireMode::Place {
                    obstacle: ObstacleKind::PlacedWall,
                },
                ..base
            },
        }
    }

    pub fn is_placeable(&self) -> bool {
        matches!(self.fire, FireMode::Place { .. })
    }

    /// A freshly acquired weapon: full clip and full reserve.
    pub fn full_ammo(&self) -> AmmoState {
        AmmoState {
            clip: self.clip_size,
            reserve: self.max_reserve.unwrap_or(0),
        }
    }
}

// ── Hostiles ──────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RangedAttack {
    pub cooldown: u32,
    pub damage: i32,
    pub speed: f32,
    /// Stops advancing once the target is this close.
    pub range: f32,
    pub lifetime: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct HostileProfile {
    pub kind: HostileKind,
    pub hp: i32,
    pub speed: f32,
    pub radius: f32,
    pub score: u32,
    pub contact_damage: i32,
    pub ranged: Option<RangedAttack>,
    pub tint: Tint,
}

impl HostileProfile {
    pub fn builtin(kind: HostileKind) -> Self {
        let (hp, speed, radius, score, contact_damage, tint) = match kind {
            HostileKind::Basic => (50, 1.4, 12.0, 100, 10, Tint::Green),
            HostileKind::Fast => (30, 2.6, 10.0, 150, 8, Tint::Yellow),
            HostileKind::Ranged => (40, 1.1, 12.0, 200, 8, Tint::Magenta),
            HostileKind::Exploder => (30, 1.9, 13.0, 175, 0, Tint::Orange),
            HostileKind::Armored => (150, 0.9, 16.0, 300, 20, Tint::Grey),
            HostileKind::Minion => (20, 2.0, 8.0, 25, 5, Tint::Red),
            HostileKind::Boss => (4000, 0.8, 40.0, 5000, 25, Tint::Red),
        };
        let ranged = (kind == HostileKind::Ranged).then_some(RangedAttack {
            cooldown: 90,
            damage: 10,
            speed: 5.0,
            range: 220.0,
            lifetime: 120,
        });
        HostileProfile {
            kind,
            hp,
            speed,
            radius,
            score,
            contact_damage,
            ranged,
            tint,
        }
    }
}

// ── Items & difficulty ────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ItemDrop {
    pub kind: ItemKind,
    pub probability: f64,
}

pub fn default_drops() -> Vec<ItemDrop> {
    [
        (ItemKind::Heal, 0.05),
        (ItemKind::Ammo, 0.06),
        (ItemKind::Nuke, 0.01),
        (ItemKind::RapidFire, 0.03),
        (ItemKind::DoubleScore, 0.02),
        (ItemKind::Shield, 0.02),
        (ItemKind::Freeze, 0.01),
    ]
    .into_iter()
    .map(|(kind, probability)| ItemDrop { kind, probability })
    .collect()
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DifficultyModifiers {
    pub hostile_hp: f32,
    pub hostile_speed: f32,
    pub damage_taken: f32,
    pub score: f32,
}

impl Difficulty {
    pub fn modifiers(self) -> DifficultyModifiers {
        match self {
            Difficulty::Easy => DifficultyModifiers {
                hostile_hp: 0.75,
                hostile_speed: 0.85,
                damage_taken: 0.5,
                score: 0.75,
            },
            Difficulty::Normal => DifficultyModifiers {
                hostile_hp: 1.0,
                hostile_speed: 1.0,
                damage_taken: 1.0,
                score: 1.0,
            },
            Difficulty::Hard => DifficultyModifiers {
                hostile_hp: 1.5,
                hostile_speed: 1.2,
                damage_taken: 1.5,
                score: 1.5,
            },
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ComboUnlock {
    pub streak: u32,
    pub weapon: WeaponKind,
}

pub fn default_combo_unlocks() -> Vec<ComboUnlock> {
    [
        (5, WeaponKind::Shotgun),
        (10, WeaponKind::Smg),
        (15, WeaponKind::Barrel),
        (20, WeaponKind::Sniper),
        (25, WeaponKind::Wall),
        (30, WeaponKind::Flamethrower),
    ]
    .into_iter()
    .map(|(streak, weapon)| ComboUnlock { streak, weapon })
    .collect()
}

// ── Tunables ──────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlastProfile {
    pub radius: f32,
    pub damage: i32,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "kind")]
pub enum SpawnPlacement {
    /// Uniformly along one of the four canvas edges.
    Edges,
    /// At a fixed distance from the nearest living player.
    Radial { distance: f32 },
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tunables {
    pub waves_per_level: u32,
    pub intermission_ticks: u32,
    pub min_spawn_interval: u32,
    pub spawn_interval_step: u32,
    pub endless_hp_growth: f32,
    pub endless_speed_growth: f32,
    pub spawn_placement: SpawnPlacement,
    pub combo_window: u32,
    pub combo_milestone: u32,
    pub combo_bonus_per_kill: u32,
    pub contact_interval: u32,
    pub respawn_delay: u32,
    pub pickup_lifetime: u32,
    pub pickup_radius: f32,
    pub pickup_reach: f32,
    pub buff_ticks: u32,
    pub rapid_fire_speed_bonus: f32,
    pub heal_amount: i32,
    pub ammo_refill_clips: u32,
    pub barrel_blast: BlastProfile,
    pub exploder_blast: BlastProfile,
    pub auto_aim_radius: f32,
    pub boss_reinforce_interval: u32,
    pub boss_reinforce_count: u32,
    pub boss_enrage_speed: f32,
    pub placement_distance: f32,
    pub placement_grid: f32,
    pub placement_size: f32,
    pub credit_rate: f32,
    pub endless_wave_goal: u32,
    pub player_hp: i32,
    pub player_speed: f32,
    pub player_radius: f32,
    pub upgrade_speed_step: f32,
    pub upgrade_damage_step: f32,
    pub upgrade_hp_step: i32,
}

impl Default for Tunables {
    fn default() -> Self {
        Self {
            waves_per_level: 5,
            intermission_ticks: 180,
            min_spawn_interval: 20,
            spawn_interval_step: 8,
            endless_hp_growth: 1.10,
            endless_speed_growth: 1.03,
            spawn_placement: SpawnPlacement::Edges,
            combo_window: 120,
            combo_milestone: 5,
            combo_bonus_per_kill: 10,
            contact_interval: 30,
            respawn_delay: 300,
            pickup_lifetime: 600,
            pickup_radius: 10.0,
            pickup_reach: 8.0,
            buff_ticks: 600,
            rapid_fire_speed_bonus: 1.0,
            heal_amount: 30,
            ammo_refill_clips: 3,
            barrel_blast: BlastProfile {
                radius: 100.0,
                damage: 60,
            },
            exploder_blast: BlastProfile {
                radius: 80.0,
                damage: 40,
            },
            auto_aim_radius: 300.0,
            boss_reinforce_interval: 300,
            boss_reinforce_count: 4,
            boss_enrage_speed: 1.5,
            placement_distance: 40.0,
            placement_grid: 20.0,
            placement_size: 40.0,
            credit_rate: 0.1,
            endless_wave_goal: 10,
            player_hp: 100,
            player_speed: 3.0,
            player_radius: 14.0,
            upgrade_speed_step: 0.3,
            upgrade_damage_step: 0.1,
            upgrade_hp_step: 10,
        }
    }
}

// ── Levels ────────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObstacleSpec {
    pub rect: Rect,
    pub kind: ObstacleKind,
    /// Overrides the kind's default hit points.
    #[serde(default)]
    pub hp: Option<i32>,
}

impl ObstacleSpec {
    fn new(x: f32, y: f32, w: f32, h: f32, kind: ObstacleKind) -> Self {
        Self {
            rect: Rect::new(x, y, w, h),
            kind,
            hp: None,
        }
    }

    /// Hit points this obstacle starts with; `None` is indestructible.
    pub fn starting_hp(&self) -> Option<i32> {
        self.hp.or(default_obstacle_hp(self.kind))
    }
}

pub fn default_obstacle_hp(kind: ObstacleKind) -> Option<i32> {
    match kind {
        ObstacleKind::Wall => None,
        ObstacleKind::Crate => Some(100),
        ObstacleKind::Barrel => Some(50),
        ObstacleKind::PlacedWall => Some(300),
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LevelConfig {
    pub id: u32,
    pub name: String,
    pub description: String,
    pub base_count: u32,
    /// Ticks between spawns on the first wave.
    pub spawn_interval: u32,
    pub hostile_kinds: Vec<HostileKind>,
    /// Weapon granted when the level starts.
    #[serde(default)]
    pub unlock_weapon: Option<WeaponKind>,
    pub background: [u8; 3],
    #[serde(default)]
    pub obstacles: Vec<ObstacleSpec>,
    #[serde(default)]
    pub boss: bool,
}

impl LevelConfig {
    /// Open arena used by endless and time-attack runs.
    pub fn arena() -> Self {
        use ObstacleKind::*;
        LevelConfig {
            id: 100,
            name: "The Pit".into(),
            description: "No exits. No end.".into(),
            base_count: 5,
            spawn_interval: 80,
            hostile_kinds: vec![
                HostileKind::Basic,
                HostileKind::Fast,
                HostileKind::Ranged,
                HostileKind::Exploder,
                HostileKind::Armored,
            ],
            unlock_weapon: None,
            background: [26, 16, 16],
            obstacles: vec![
                ObstacleSpec::new(200.0, 150.0, 40.0, 40.0, Crate),
                ObstacleSpec::new(560.0, 150.0, 40.0, 40.0, Crate),
                ObstacleSpec::new(200.0, 410.0, 40.0, 40.0, Crate),
                ObstacleSpec::new(560.0, 410.0, 40.0, 40.0, Crate),
                ObstacleSpec::new(380.0, 120.0, 30.0, 30.0, Barrel),
                ObstacleSpec::new(380.0, 450.0, 30.0, 30.0, Barrel),
            ],
            boss: false,
        }
    }
}

pub fn campaign_levels() -> Vec<LevelConfig> {
    use HostileKind::*;
    use ObstacleKind::*;
    vec![
        LevelConfig {
            id: 1,
            name: "Outskirts".into(),
            description: "The first of them are crossing the fields.".into(),
            base_count: 6,
            spawn_interval: 90,
            hostile_kinds: vec![Basic, Fast],
            unlock_weapon: None,
            background: [16, 28, 16],
            obstacles: vec![
                ObstacleSpec::new(150.0, 120.0, 120.0, 20.0, Wall),
                ObstacleSpec::new(530.0, 460.0, 120.0, 20.0, Wall),
                ObstacleSpec::new(380.0, 140.0, 40.0, 40.0, Crate),
            ],
            boss: false,
        },
        LevelConfig {
            id: 2,
            name: "Warehouse".into(),
            description: "Stacked crates and something spitting from the dark.".into(),
            base_count: 8,
            spawn_interval: 80,
            hostile_kinds: vec![Basic, Fast, Ranged],
            unlock_weapon: Some(WeaponKind::Shotgun),
            background: [28, 22, 14],
            obstacles: vec![
                ObstacleSpec::new(120.0, 100.0, 40.0, 40.0, Crate),
                ObstacleSpec::new(160.0, 100.0, 40.0, 40.0, Crate),
                ObstacleSpec::new(600.0, 100.0, 40.0, 40.0, Crate),
                ObstacleSpec::new(120.0, 460.0, 40.0, 40.0, Crate),
                ObstacleSpec::new(600.0, 460.0, 40.0, 40.0, Crate),
                ObstacleSpec::new(640.0, 460.0, 40.0, 40.0, Crate),
                ObstacleSpec::new(300.0, 250.0, 20.0, 100.0, Wall),
                ObstacleSpec::new(480.0, 250.0, 20.0, 100.0, Wall),
            ],
            boss: false,
        },
        LevelConfig {
            id: 3,
            name: "Refinery".into(),
            description: "Fuel everywhere. Watch your fire.".into(),
            base_count: 10,
            spawn_interval: 75,
            hostile_kinds: vec![Basic, Fast, Ranged, Exploder],
            unlock_weapon: Some(WeaponKind::Smg),
            background: [30, 18, 10],
            obstacles: vec![
                ObstacleSpec::new(180.0, 150.0, 30.0, 30.0, Barrel),
                ObstacleSpec::new(590.0, 150.0, 30.0, 30.0, Barrel),
                ObstacleSpec::new(180.0, 420.0, 30.0, 30.0, Barrel),
                ObstacleSpec::new(590.0, 420.0, 30.0, 30.0, Barrel),
                ObstacleSpec::new(350.0, 200.0, 100.0, 20.0, Wall),
                ObstacleSpec::new(350.0, 380.0, 100.0, 20.0, Wall),
                ObstacleSpec::new(240.0, 285.0, 30.0, 30.0, Crate),
            ],
            boss: false,
        },
        LevelConfig {
            id: 4,
            name: "Bunker".into(),
            description: "Concrete corridors. The big ones are here.".into(),
            base_count: 12,
            spawn_interval: 70,
            hostile_kinds: vec![Basic, Fast, Ranged, Exploder, Armored],
            unlock_weapon: Some(WeaponKind::Sniper),
            background: [18, 18, 24],
            obstacles: vec![
                ObstacleSpec::new(100.0, 200.0, 200.0, 20.0, Wall),
                ObstacleSpec::new(500.0, 200.0, 200.0, 20.0, Wall),
                ObstacleSpec::new(100.0, 380.0, 200.0, 20.0, Wall),
                ObstacleSpec::new(500.0, 380.0, 200.0, 20.0, Wall),
                ObstacleSpec::new(380.0, 100.0, 40.0, 40.0, Crate),
                ObstacleSpec::new(380.0, 460.0, 40.0, 40.0, Crate),
                ObstacleSpec::new(240.0, 285.0, 30.0, 30.0, Barrel),
            ],
            boss: false,
        },
        LevelConfig {
            id: 5,
            name: "The Lair".into(),
            description: "It is waiting at the end of the fifth wave.".into(),
            base_count: 12,
            spawn_interval: 65,
            hostile_kinds: vec![Basic, Fast, Ranged, Exploder, Armored],
            unlock_weapon: Some(WeaponKind::Shotgun),
            background: [30, 10, 18],
            obstacles: vec![
                ObstacleSpec::new(160.0, 140.0, 40.0, 40.0, Crate),
                ObstacleSpec::new(600.0, 140.0, 40.0, 40.0, Crate),
                ObstacleSpec::new(160.0, 420.0, 40.0, 40.0, Crate),
                ObstacleSpec::new(600.0, 420.0, 40.0, 40.0, Crate),
                ObstacleSpec::new(300.0, 290.0, 30.0, 30.0, Barrel),
                ObstacleSpec::new(470.0, 290.0, 30.0, 30.0, Barrel),
            ],
            boss: true,
        },
    ]
}

// ── Root config ───────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub canvas: Bounds,
    /// Per-weapon overrides of the built-in profiles.
    pub weapons: Vec<WeaponProfile>,
    /// Per-hostile overrides of the built-in profiles.
    pub hostiles: Vec<HostileProfile>,
    /// Drop table walked in order; probabilities may sum below 1.
    pub items: Vec<ItemDrop>,
    pub combo_unlocks: Vec<ComboUnlock>,
    pub tunables: Tunables,
    pub auto_aim: bool,
    pub levels: Vec<LevelConfig>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            canvas: Bounds::new(800.0, 600.0),
            weapons: Vec::new(),
            hostiles: Vec::new(),
            items: default_drops(),
            combo_unlocks: default_combo_unlocks(),
            tunables: Tunables::default(),
            auto_aim: false,
            levels: campaign_levels(),
        }
    }
}

impl GameConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.canvas.width <= 0.0 || self.canvas.height <= 0.0 {
            return Err(ConfigError::Invalid("canvas must have a positive size".into()));
        }
        if self.levels.is_empty() {
            return Err(ConfigError::Invalid("at least one level is required".into()));
        }
        if self.tunables.waves_per_level == 0 {
            return Err(ConfigError::Invalid("waves_per_level must be at least 1".into()));
        }
        if let Some(bad) = self
            .items
            .iter()
            .find(|d| !(0.0..=1.0).contains(&d.probability))
        {
            return Err(ConfigError::Invalid(format!(
                "drop probability for {:?} is outside 0..=1",
                bad.kind
            )));
        }
        let total: f64 = self.items.iter().map(|d| d.probability).sum();
        if total > 1.0 + 1e-9 {
            return Err(ConfigError::Invalid(format!(
                "drop probabilities sum to {total:.3}, above 1"
            )));
        }
        for level in &self.levels {
            if level.hostile_kinds.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "level {} permits no hostile kinds",
                    level.id
                )));
            }
            for obstacle in &level.obstacles {
                let r = obstacle.rect;
                let finite = [r.x, r.y, r.w, r.h].iter().all(|v| v.is_finite());
                if !finite || r.w <= 0.0 || r.h <= 0.0 {
                    return Err(ConfigError::Invalid(format!(
                        "level {} has an obstacle with a degenerate rect {:?}",
                        level.id, r
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn weapon(&self, kind: WeaponKind) -> WeaponProfile {
        self.weapons
            .iter()
            .find(|w| w.kind == kind)
            .copied()
            .unwrap_or_else(|| WeaponProfile::builtin(kind))
    }

    pub fn hostile(&self, kind: HostileKind) -> HostileProfile {
        self.hostiles
            .iter()
            .find(|h| h.kind == kind)
            .copied()
            .unwrap_or_else(|| HostileProfile::builtin(kind))
    }

    pub fn level(&self, id: u32) -> Option<&LevelConfig> {
        self.levels.iter().find(|l| l.id == id)
    }

    /// Weapon unlocked by reaching exactly `streak` kills in a combo.
    pub fn combo_unlock_at(&self, streak: u32) -> Option<WeaponKind> {
        self.combo_unlocks
            .iter()
            .find(|u| u.streak == streak)
            .map(|u| u.weapon)
    }
}
