//! Session construction and the per-frame tick.
//!
//! `tick` runs every subsystem in a fixed order against one
//! `SimulationState`. All randomness and audio go through the injected
//! [`TickCtx`], so a seeded RNG gives a fully reproducible run.

use glam::Vec2;
use rand::RngCore;
use tracing::info;

use crate::combat;
use crate::config::{GameConfig, LevelConfig};
use crate::entities::{
    Body, BuffTimers, Difficulty, GameMode, GameStatus, Loadout, Obstacle, Outcome, Player,
    PlayerId, RespawnModel, SimulationState, WeaponKind,
};
use crate::error::ConfigError;
use crate::geometry::angle_to;
use crate::input::{AimStrategy, InputState};
use crate::movement;
use crate::pickups;
use crate::progression::{ComboState, RunStats, Upgrades};
use crate::registry::EntityRegistry;
use crate::services::AudioSink;
use crate::waves::{self, SpawnPhase, WaveScheduler};

const PLAYER_SPACING: f32 = 60.0;

/// Side-effect channels for one tick.
pub struct TickCtx<'a> {
    pub rng: &'a mut dyn RngCore,
    pub audio: &'a mut dyn AudioSink,
}

impl<'a> TickCtx<'a> {
    pub fn new(rng: &'a mut dyn RngCore, audio: &'a mut dyn AudioSink) -> Self {
        Self { rng, audio }
    }
}

/// Choices made in the menu before a run starts.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionSetup {
    pub mode: GameMode,
    /// Campaign level; endless and time-attack always use the arena.
    pub level_id: u32,
    pub difficulty: Difficulty,
    /// One aim strategy per player.
    pub players: Vec<AimStrategy>,
    pub respawn: RespawnModel,
    pub upgrades: Upgrades,
}

impl Default for SessionSetup {
    fn default() -> Self {
        Self {
            mode: GameMode::Campaign,
            level_id: 1,
            difficulty: Difficulty::Normal,
            players: vec![AimStrategy::MovementFacing],
            respawn: RespawnModel::None,
            upgrades: Upgrades::default(),
        }
    }
}

// ── Constructors ─────────────────────────────────────────────────────────────

/// Build the opening state of a run. Fails only on an unknown campaign level.
pub fn init_state(config: GameConfig, setup: &SessionSetup) -> Result<SimulationState, ConfigError> {
    let level = match setup.mode {
        GameMode::Campaign => config
            .level(setup.level_id)
            .cloned()
            .ok_or_else(|| ConfigError::Invalid(format!("unknown level id {}", setup.level_id)))?,
        GameMode::Endless | GameMode::TimeAttack { .. } => LevelConfig::arena(),
    };
    let t = config.tunables;
    let bounds = config.canvas;

    let mut world = EntityRegistry::default();
    for spec in &level.obstacles {
        world.obstacles.insert(Obstacle {
            rect: spec.rect,
            kind: spec.kind,
            hp: spec.starting_hp(),
        });
    }

    let aims = if setup.players.is_empty() {
        vec![AimStrategy::default()]
    } else {
        setup.players.clone()
    };
    let mid = (aims.len() - 1) as f32 / 2.0;
    let pistol = config.weapon(WeaponKind::Pistol);
    let unlock = level.unlock_weapon.map(|w| config.weapon(w));
    let up = setup.upgrades;
    let facing = Vec2::new(0.0, -1.0);
    for (i, aim) in aims.into_iter().enumerate() {
        let pos = bounds.center() + Vec2::new((i as f32 - mid) * PLAYER_SPACING, 0.0);
        let mut body = Body::new(
            pos,
            t.player_radius,
            t.player_hp + up.vitality as i32 * t.upgrade_hp_step,
            t.player_speed,
        );
        body.angle = angle_to(Vec2::ZERO, facing);
        let mut loadout = Loadout::new(&pistol);
        if let Some(profile) = &unlock {
            loadout.grant(profile);
            if !profile.is_placeable() {
                loadout.select(profile.kind);
            }
        }
        world.players.push(Player {
            id: PlayerId(i),
            body,
            aim,
            loadout,
            facing,
            ticks_since_shot: u32::MAX / 2,
            ticks_since_place: u32::MAX / 2,
            reload: None,
            respawn_timer: None,
            score: 0,
            trigger_held: false,
            speed_bonus: up.speed as f32 * t.upgrade_speed_step,
            damage_bonus: up.damage as f32 * t.upgrade_damage_step,
        });
    }

    let waves = match setup.mode {
        GameMode::Campaign => WaveScheduler::campaign(t.waves_per_level, t.intermission_ticks),
        GameMode::Endless => WaveScheduler::endless(t.intermission_ticks),
        GameMode::TimeAttack { ticks } => WaveScheduler::time_attack(ticks),
    };

    info!(
        mode = ?setup.mode,
        level = level.id,
        players = world.players.len(),
        difficulty = ?setup.difficulty,
        "run started"
    );

    Ok(SimulationState {
        combo: ComboState::new(t.combo_window),
        config,
        level,
        mode: setup.mode,
        difficulty: setup.difficulty,
        respawn: setup.respawn,
        bounds,
        world,
        waves,
        buffs: BuffTimers::default(),
        stats: RunStats::default(),
        blasts: Vec::new(),
        status: GameStatus::Playing,
        paused: false,
        frame: 0,
    })
}

/// Flip the pause flag. Has no effect once the run is over.
pub fn toggle_pause(state: &mut SimulationState) -> bool {
    if !state.is_over() {
        state.paused = !state.paused;
    }
    state.paused
}

// ── Per-frame tick ───────────────────────────────────────────────────────────

/// Advance the simulation by one frame. Returns the outcome on the single
/// tick the run ends, `None` otherwise (including while paused).
pub fn tick(state: &mut SimulationState, inputs: &[InputState], ctx: &mut TickCtx) -> Option<Outcome> {
    if state.paused || state.is_over() {
        return None;
    }
    state.frame += 1;
    state.stats.elapsed_ticks += 1;

    // ── 1. Waves ─────────────────────────────────────────────────────────────
    waves::update(state, ctx);

    // ── 2. Movement ──────────────────────────────────────────────────────────
    movement::update(state, inputs);

    // ── 3. Combat ────────────────────────────────────────────────────────────
    combat::update(state, inputs, ctx);

    // ── 4. Pickups and buffs ─────────────────────────────────────────────────
    pickups::update(state, ctx);

    // ── 5. Chain reactions, effects ──────────────────────────────────────────
    combat::resolve_blasts(state, ctx);
    state.world.age_effects();

    // ── 6. Outcome; defeat wins a tie ────────────────────────────────────────
    let outcome = if state.world.all_players_dead() {
        Outcome::Defeat
    } else if state.waves.phase == SpawnPhase::Victory {
        Outcome::Victory
    } else {
        return None;
    };
    state.status = GameStatus::Over(outcome);
    info!(
        ?outcome,
        score = state.stats.score,
        wave = state.waves.wave,
        kills = state.stats.kills,
        "game over"
    );
    Some(outcome)
}
