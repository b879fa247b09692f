mod common;

use std::f32::consts::FRAC_PI_2;

use common::*;
use glam::Vec2;

use wave_shooter::entities::{Buff, HostileKind, Obstacle, ObstacleKind};
use wave_shooter::geometry::Rect;
use wave_shooter::input::{AimStrategy, InputState};
use wave_shooter::movement;

fn held(up: bool, down: bool, left: bool, right: bool) -> InputState {
    InputState {
        up,
        down,
        left,
        right,
        ..InputState::default()
    }
}

// ── Players ───────────────────────────────────────────────────────────────────

#[test]
fn player_moves_at_its_speed() {
    let mut state = make_state();
    movement::update(&mut state, &[held(false, false, false, true)]);
    assert_eq!(state.world.players[0].body.pos, Vec2::new(403.0, 300.0));
}

#[test]
fn diagonal_movement_is_normalised() {
    let mut state = make_state();
    movement::update(&mut state, &[held(false, true, false, true)]);
    let moved = state.world.players[0].body.pos - Vec2::new(400.0, 300.0);
    assert!(approx(moved.length(), 3.0));
}

#[test]
fn player_slides_along_a_wall() {
    let mut state = make_state();
    state.world.obstacles.insert(Obstacle {
        rect: Rect::new(420.0, 200.0, 20.0, 300.0),
        kind: ObstacleKind::Wall,
        hp: None,
    });

    for _ in 0..20 {
        movement::update(&mut state, &[held(false, true, false, true)]);
    }

    let pos = state.world.players[0].body.pos;
    assert!(pos.x <= 406.0);
    assert!(pos.y > 330.0);
}

#[test]
fn player_stays_on_the_canvas() {
    let mut state = make_state();
    for _ in 0..500 {
        movement::update(&mut state, &[held(true, false, true, false)]);
    }
    let p = &state.world.players[0];
    assert_eq!(p.body.pos, Vec2::new(p.body.radius(), p.body.radius()));
}

#[test]
fn movement_facing_keeps_the_last_direction() {
    let mut state = make_state();
    movement::update(&mut state, &[held(false, false, false, true)]);
    assert!(approx(state.world.players[0].body.angle, 0.0));
    movement::update(&mut state, &[InputState::default()]);
    assert!(approx(state.world.players[0].body.angle, 0.0));
    assert_eq!(state.world.players[0].facing, Vec2::X);
}

#[test]
fn pointer_aim_faces_the_pointer() {
    let mut state = make_state();
    state.world.players[0].aim = AimStrategy::Pointer;
    let input = InputState {
        right: true,
        pointer: Some(Vec2::new(403.0, 100.0)),
        ..InputState::default()
    };
    movement::update(&mut state, &[input]);
    assert!(approx(state.world.players[0].body.angle, -FRAC_PI_2));
}

#[test]
fn auto_aim_locks_on_only_when_standing_still() {
    let mut state = make_state();
    state.config.auto_aim = true;
    state.world.players[0].aim = AimStrategy::AutoAim;
    spawn(&mut state, HostileKind::Basic, 400.0, 500.0);

    movement::update(&mut state, &[InputState::default()]);
    assert!(approx(state.world.players[0].body.angle, FRAC_PI_2));

    movement::update(&mut state, &[held(false, false, false, true)]);
    assert!(approx(state.world.players[0].body.angle, 0.0));
}

#[test]
fn auto_aim_is_inert_when_disabled() {
    let mut state = make_state();
    state.world.players[0].aim = AimStrategy::AutoAim;
    spawn(&mut state, HostileKind::Basic, 400.0, 500.0);

    movement::update(&mut state, &[InputState::default()]);
    assert!(approx(state.world.players[0].body.angle, -FRAC_PI_2));
}

#[test]
fn rapid_fire_adds_move_speed() {
    let mut state = make_state();
    state.buffs.start(Buff::RapidFire, 10);
    movement::update(&mut state, &[held(false, false, false, true)]);
    assert_eq!(state.world.players[0].body.pos, Vec2::new(404.0, 300.0));
}

// ── Hostiles ──────────────────────────────────────────────────────────────────

#[test]
fn hostiles_chase_the_nearest_player() {
    let mut state = make_state();
    let h = spawn(&mut state, HostileKind::Basic, 100.0, 300.0);
    movement::update(&mut state, &[]);
    let pos = state.world.hostiles.get(h).unwrap().body.pos;
    assert!(approx(pos.x, 101.4));
    assert!(approx(pos.y, 300.0));
}

#[test]
fn freeze_stops_hostiles_but_not_the_boss() {
    let mut state = make_state();
    state.buffs.start(Buff::Freeze, 10);
    let grunt = spawn(&mut state, HostileKind::Basic, 100.0, 300.0);
    let boss = spawn(&mut state, HostileKind::Boss, 700.0, 300.0);

    movement::update(&mut state, &[]);

    assert_eq!(state.world.hostiles.get(grunt).unwrap().body.pos, Vec2::new(100.0, 300.0));
    assert!(state.world.hostiles.get(boss).unwrap().body.pos.x < 700.0);
}

#[test]
fn hostiles_go_around_blocked_axes() {
    let mut state = make_state();
    // Wall directly to the right of the hostile; it should still close vertically.
    state.world.obstacles.insert(Obstacle {
        rect: Rect::new(113.0, 0.0, 20.0, 200.0),
        kind: ObstacleKind::Wall,
        hp: None,
    });
    let h = spawn(&mut state, HostileKind::Basic, 100.0, 100.0);
    movement::update(&mut state, &[]);
    let pos = state.world.hostiles.get(h).unwrap().body.pos;
    assert_eq!(pos.x, 100.0);
    assert!(pos.y > 100.0);
}

#[test]
fn ranged_hostile_holds_position_and_fires() {
    let mut state = make_state();
    let h = spawn(&mut state, HostileKind::Ranged, 400.0, 150.0);
    let cooldown = state
        .config
        .hostile(HostileKind::Ranged)
        .ranged
        .map_or(0, |r| r.cooldown);

    for _ in 0..cooldown - 1 {
        movement::update(&mut state, &[]);
    }
    assert!(state.world.hostile_shots.is_empty());
    movement::update(&mut state, &[]);

    assert_eq!(state.world.hostiles.get(h).unwrap().body.pos, Vec2::new(400.0, 150.0));
    assert_eq!(state.world.hostile_shots.len(), 1);
}
