//! Wave and spawn scheduling.
//!
//! [`WaveScheduler::step`] is a pure state machine over counters; [`update`]
//! wires it to the world (spawning hostiles, respawning players).

use glam::Vec2;
use rand::Rng;
use serde::Serialize;
use tracing::debug;

use crate::combat::revive_player;
use crate::compute::TickCtx;
use crate::config::SpawnPlacement;
use crate::entities::{Body, GameMode, Hostile, HostileKind, PlayerId, RespawnModel, SimulationState};
use crate::geometry::unit;
use crate::registry::Handle;
use crate::services::Cue;

const SPAWN_ATTEMPTS: usize = 8;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum SpawnPhase {
    Intermission,
    Spawning,
    /// Quota spawned; waiting for the last hostile to die.
    Clearing,
    Victory,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WavePlan {
    pub quota: u32,
    /// Ticks between spawns.
    pub cadence: u32,
}

/// What a scheduler step asks the world to do.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WaveSignal {
    Idle,
    Spawn,
    Started(u32),
    Cleared(u32),
    Victory,
}

#[derive(Clone, Debug, PartialEq)]
pub struct WaveScheduler {
    pub wave: u32,
    pub phase: SpawnPhase,
    pub intermission_timer: u32,
    pub intermission_ticks: u32,
    pub spawn_timer: u32,
    /// Hostiles still to spawn this wave.
    pub remaining: u32,
    /// `None` in endless and time-attack runs.
    pub total_waves: Option<u32>,
    /// Time-attack countdown.
    pub clock: Option<u32>,
}

impl WaveScheduler {
    pub fn campaign(total_waves: u32, intermission_ticks: u32) -> Self {
        Self {
            wave: 1,
            phase: SpawnPhase::Intermission,
            intermission_timer: intermission_ticks,
            intermission_ticks,
            spawn_timer: 0,
            remaining: 0,
            total_waves: Some(total_waves.max(1)),
            clock: None,
        }
    }

    pub fn endless(intermission_ticks: u32) -> Self {
        Self {
            total_waves: None,
            ..Self::campaign(1, intermission_ticks)
        }
    }

    /// Spawns continuously from the first tick until the clock runs out.
    pub fn time_attack(ticks: u32) -> Self {
        Self {
            wave: 1,
            phase: SpawnPhase::Spawning,
            intermission_timer: 0,
            intermission_ticks: 0,
            spawn_timer: 0,
            remaining: u32::MAX,
            total_waves: None,
            clock: Some(ticks),
        }
    }

    pub fn is_final_wave(&self) -> bool {
        self.total_waves == Some(self.wave)
    }

    /// Advance one tick. `plan` maps a wave number to its quota and cadence.
    pub fn step(&mut self, live_hostiles: usize, plan: impl Fn(u32) -> WavePlan) -> WaveSignal {
        if self.phase == SpawnPhase::Victory {
            return WaveSignal::Idle;
        }
        if let Some(clock) = self.clock.as_mut() {
            *clock = clock.saturating_sub(1);
            if *clock == 0 {
                self.phase = SpawnPhase::Victory;
                return WaveSignal::Victory;
            }
        }

        match self.phase {
            SpawnPhase::Victory => WaveSignal::Idle,
            SpawnPhase::Intermission => {
                self.intermission_timer = self.intermission_timer.saturating_sub(1);
                if self.intermission_timer > 0 {
                    return WaveSignal::Idle;
                }
                self.remaining = plan(self.wave).quota;
                self.spawn_timer = 0;
                self.phase = SpawnPhase::Spawning;
                WaveSignal::Started(self.wave)
            }
            SpawnPhase::Spawning => {
                if self.remaining == 0 {
                    self.phase = SpawnPhase::Clearing;
                    return WaveSignal::Idle;
                }
                self.spawn_timer = self.spawn_timer.saturating_sub(1);
                if self.spawn_timer > 0 {
                    return WaveSignal::Idle;
                }
                if self.clock.is_none() {
                    self.remaining -= 1;
                }
                self.spawn_timer = plan(self.wave).cadence.max(1);
                if self.remaining == 0 {
                    self.phase = SpawnPhase::Clearing;
                }
                WaveSignal::Spawn
            }
            SpawnPhase::Clearing => {
                if live_hostiles > 0 {
                    WaveSignal::Idle
                } else if self.is_final_wave() {
                    self.phase = SpawnPhase::Victory;
                    WaveSignal::Victory
                } else {
                    let cleared = self.wave;
                    self.wave += 1;
                    self.phase = SpawnPhase::Intermission;
                    self.intermission_timer = self.intermission_ticks;
                    WaveSignal::Cleared(cleared)
                }
            }
        }
    }
}

/// The slice of run configuration that shapes each wave.
#[derive(Clone, Copy, Debug)]
pub struct WaveRules {
    pub endless: bool,
    pub base_count: u32,
    pub spawn_interval: u32,
    pub interval_step: u32,
    pub min_interval: u32,
    pub boss_level: bool,
    pub total_waves: Option<u32>,
}

impl WaveRules {
    pub fn from_state(state: &SimulationState) -> Self {
        let t = &state.config.tunables;
        Self {
            endless: state.mode == GameMode::Endless,
            base_count: state.level.base_count,
            spawn_interval: state.level.spawn_interval,
            interval_step: t.spawn_interval_step,
            min_interval: t.min_spawn_interval,
            boss_level: state.level.boss,
            total_waves: state.waves.total_waves,
        }
    }

    pub fn is_boss_wave(&self, wave: u32) -> bool {
        self.boss_level && self.total_waves == Some(wave)
    }

    pub fn plan(&self, wave: u32) -> WavePlan {
        let step = wave.saturating_sub(1);
        let quota = if self.is_boss_wave(wave) {
            1
        } else if self.endless {
            5 + wave * 3
        } else {
            self.base_count + step * 3
        };
        let cadence = self
            .spawn_interval
            .saturating_sub(step.saturating_mul(self.interval_step))
            .max(self.min_interval);
        WavePlan { quota, cadence }
    }
}

const KIND_THRESHOLDS: [(f64, HostileKind); 4] = [
    (0.85, HostileKind::Armored),
    (0.75, HostileKind::Exploder),
    (0.65, HostileKind::Ranged),
    (0.50, HostileKind::Fast),
];

/// Map one uniform draw in `[0, 1)` to a hostile kind. A kind the level does
/// not permit falls through to the next lower threshold.
pub fn choose_kind(draw: f64, permitted: &[HostileKind]) -> HostileKind {
    KIND_THRESHOLDS
        .iter()
        .find(|(threshold, kind)| draw > *threshold && permitted.contains(kind))
        .map(|(_, kind)| *kind)
        .or_else(|| {
            (!permitted.is_empty() && !permitted.contains(&HostileKind::Basic))
                .then(|| permitted[0])
        })
        .unwrap_or(HostileKind::Basic)
}

fn spawn_point(state: &SimulationState, radius: f32, rng: &mut dyn rand::RngCore) -> Vec2 {
    let bounds = state.bounds;
    let mut pos = bounds.center();
    for _ in 0..SPAWN_ATTEMPTS {
        pos = match state.config.tunables.spawn_placement {
            SpawnPlacement::Edges => {
                let t: f32 = rng.gen();
                match rng.gen_range(0..4) {
                    0 => Vec2::new(t * bounds.width, radius),
                    1 => Vec2::new(bounds.width - radius, t * bounds.height),
                    2 => Vec2::new(t * bounds.width, bounds.height - radius),
                    _ => Vec2::new(radius, t * bounds.height),
                }
            }
            SpawnPlacement::Radial { distance } => {
                let anchor = state
                    .world
                    .nearest_living_player(bounds.center())
                    .and_then(|id| state.world.player(id))
                    .map_or(bounds.center(), |p| p.body.pos);
                let angle = rng.gen::<f32>() * std::f32::consts::TAU;
                anchor + unit(angle) * distance
            }
        };
        pos = bounds.clamp_circle(pos, radius);
        if !state.world.blocked(pos, radius) {
            break;
        }
    }
    pos
}

/// Insert a hostile of `kind` at `pos`, scaled for difficulty and, in
/// endless runs, for the current wave.
pub fn spawn_hostile(state: &mut SimulationState, kind: HostileKind, pos: Vec2) -> Handle {
    let profile = state.config.hostile(kind);
    let modifiers = state.difficulty.modifiers();
    let t = &state.config.tunables;
    let mut hp_scale = modifiers.hostile_hp;
    let mut speed_scale = modifiers.hostile_speed;
    if state.mode == GameMode::Endless {
        let growth = state.waves.wave.saturating_sub(1) as i32;
        hp_scale *= t.endless_hp_growth.powi(growth);
        speed_scale *= t.endless_speed_growth.powi(growth);
    }
    let hp = (profile.hp as f32 * hp_scale).round() as i32;
    let hostile = Hostile {
        kind,
        body: Body::new(pos, profile.radius, hp, profile.speed * speed_scale),
        attack_timer: profile.ranged.map_or(0, |r| r.cooldown),
        contact_cooldown: 0,
        reinforce_timer: t.boss_reinforce_interval,
        enraged: false,
    };
    state.world.hostiles.insert(hostile)
}

pub fn update(state: &mut SimulationState, ctx: &mut TickCtx) {
    let rules = WaveRules::from_state(state);
    let live = state.world.hostiles.len();
    match state.waves.step(live, |wave| rules.plan(wave)) {
        WaveSignal::Idle | WaveSignal::Victory => {}
        WaveSignal::Started(wave) => {
            state.stats.highest_wave = state.stats.highest_wave.max(wave);
            debug!(wave, remaining = state.waves.remaining, "wave started");
        }
        WaveSignal::Spawn => {
            // Time attack never signals a wave start.
            state.stats.highest_wave = state.stats.highest_wave.max(state.waves.wave);
            let kind = if rules.is_boss_wave(state.waves.wave) {
                HostileKind::Boss
            } else {
                choose_kind(ctx.rng.gen(), &state.level.hostile_kinds)
            };
            let radius = state.config.hostile(kind).radius;
            let pos = spawn_point(state, radius, ctx.rng);
            spawn_hostile(state, kind, pos);
            if kind == HostileKind::Boss {
                ctx.audio.play(Cue::BossRoar);
                debug!(?pos, "boss spawned");
            }
        }
        WaveSignal::Cleared(wave) => {
            debug!(wave, "wave cleared");
            if state.respawn == RespawnModel::WaveBoundary {
                let dead: Vec<PlayerId> = state
                    .world
                    .players
                    .iter()
                    .filter(|p| !p.body.is_alive())
                    .map(|p| p.id)
                    .collect();
                for id in dead {
                    revive_player(state, id);
                }
            }
        }
    }
}
