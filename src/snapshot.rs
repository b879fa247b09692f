//! Read-only projection of the run for HUD overlays.
//!
//! Captured after each tick and never fed back into the simulation.

use serde::Serialize;

use crate::entities::{Buff, Outcome, SimulationState, WeaponKind};
use crate::waves::SpawnPhase;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PlayerHud {
    pub id: usize,
    pub hp: i32,
    pub max_hp: i32,
    pub alive: bool,
    /// Ticks until a timed respawn.
    pub respawn_in: Option<u32>,
    pub weapon: WeaponKind,
    pub owned: Vec<WeaponKind>,
    pub clip: u32,
    pub clip_size: u32,
    /// `None` for infinite reserve.
    pub reserve: Option<u32>,
    /// Reload progress in `0.0..1.0`, while reloading.
    pub reloading: Option<f32>,
    pub score: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct UiSnapshot {
    pub frame: u64,
    pub players: Vec<PlayerHud>,
    pub score: u32,
    pub wave: u32,
    pub total_waves: Option<u32>,
    pub phase: SpawnPhase,
    /// Time-attack ticks left.
    pub time_remaining: Option<u32>,
    /// Ticks until the next wave, during an intermission.
    pub intermission: Option<u32>,
    pub hostiles_alive: usize,
    pub buffs: Vec<(Buff, u32)>,
    pub combo: u32,
    pub paused: bool,
    pub outcome: Option<Outcome>,
}

pub fn capture(state: &SimulationState) -> UiSnapshot {
    let players = state
        .world
        .players
        .iter()
        .map(|p| {
            let profile = state.config.weapon(p.loadout.active());
            let ammo = p.loadout.ammo(profile.kind);
            PlayerHud {
                id: p.id.0,
                hp: p.body.hp(),
                max_hp: p.body.max_hp(),
                alive: p.body.is_alive(),
                respawn_in: p.respawn_timer,
                weapon: profile.kind,
                owned: p.loadout.owned().to_vec(),
                clip: ammo.clip,
                clip_size: profile.clip_size,
                reserve: profile.max_reserve.map(|_| ammo.reserve),
                reloading: p.reload.map(|r| {
                    let total = profile.reload_ticks.max(1) as f32;
                    1.0 - r.remaining as f32 / total
                }),
                score: p.score,
            }
        })
        .collect();

    let waves = &state.waves;
    UiSnapshot {
        frame: state.frame,
        players,
        score: state.stats.score,
        wave: waves.wave,
        total_waves: waves.total_waves,
        phase: waves.phase,
        time_remaining: waves.clock,
        intermission: (waves.phase == SpawnPhase::Intermission).then_some(waves.intermission_timer),
        hostiles_alive: state.world.hostiles.len(),
        buffs: state.buffs.active(),
        combo: state.combo.streak,
        paused: state.paused,
        outcome: state.outcome(),
    }
}
