#![allow(dead_code)]

use glam::Vec2;
use rand::RngCore;

use wave_shooter::compute::{init_state, SessionSetup};
use wave_shooter::config::GameConfig;
use wave_shooter::entities::{HostileKind, PlayerId, RespawnModel, SimulationState};
use wave_shooter::input::{AimStrategy, InputState};
use wave_shooter::registry::Handle;
use wave_shooter::services::{AudioSink, Cue};
use wave_shooter::waves::spawn_hostile;

/// Every draw is zero: `gen::<f64>()` is 0.0 and `gen_range(a..b)` is `a`.
pub struct ZeroRng;

impl RngCore for ZeroRng {
    fn next_u32(&mut self) -> u32 {
        0
    }

    fn next_u64(&mut self) -> u64 {
        0
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        dest.fill(0);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        dest.fill(0);
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct RecordingAudio(pub Vec<Cue>);

impl RecordingAudio {
    pub fn count(&self, cue: Cue) -> usize {
        self.0.iter().filter(|c| **c == cue).count()
    }
}

impl AudioSink for RecordingAudio {
    fn play(&mut self, cue: Cue) {
        self.0.push(cue);
    }
}

/// Built-in config with every campaign level emptied of obstacles.
pub fn open_config() -> GameConfig {
    let mut config = GameConfig::default();
    for level in &mut config.levels {
        level.obstacles.clear();
    }
    config
}

/// Single player, campaign level 1, no obstacles. The player stands at the
/// canvas centre (400, 300) facing up.
pub fn make_state() -> SimulationState {
    init_state(open_config(), &SessionSetup::default()).expect("level 1 exists")
}

pub fn make_state_with(config: GameConfig, setup: SessionSetup) -> SimulationState {
    init_state(config, &setup).expect("valid setup")
}

/// Two players (370, 300) and (430, 300).
pub fn coop_state(respawn: RespawnModel) -> SimulationState {
    make_state_with(
        open_config(),
        SessionSetup {
            players: vec![AimStrategy::MovementFacing, AimStrategy::MovementFacing],
            respawn,
            ..SessionSetup::default()
        },
    )
}

pub fn spawn(state: &mut SimulationState, kind: HostileKind, x: f32, y: f32) -> Handle {
    spawn_hostile(state, kind, Vec2::new(x, y))
}

pub fn hp_of(state: &SimulationState, h: Handle) -> Option<i32> {
    state.world.hostiles.get(h).map(|hostile| hostile.body.hp())
}

pub fn player_hp(state: &SimulationState, id: usize) -> i32 {
    state.world.player(PlayerId(id)).map_or(0, |p| p.body.hp())
}

pub fn fire() -> InputState {
    InputState {
        fire: true,
        ..InputState::default()
    }
}

pub fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-3
}
