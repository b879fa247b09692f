//! Player and hostile motion.

use glam::Vec2;

use crate::entities::{Buff, HostileKind, Owner, Projectile, SimulationState, Tint};
use crate::geometry::{angle_to, unit, Bounds};
use crate::input::{AimStrategy, InputState};
use crate::registry::EntityRegistry;

const HOSTILE_SHOT_RADIUS: f32 = 4.0;

pub fn update(state: &mut SimulationState, inputs: &[InputState]) {
    move_players(state, inputs);
    move_hostiles(state);
}

/// Move each axis separately so a mover pressed against a wall still slides
/// along it.
fn slide(world: &EntityRegistry, bounds: &Bounds, pos: Vec2, delta: Vec2, radius: f32) -> Vec2 {
    let mut out = pos;
    let along_x = bounds.clamp_circle(Vec2::new(out.x + delta.x, out.y), radius);
    if !world.blocked(along_x, radius) {
        out = along_x;
    }
    let along_y = bounds.clamp_circle(Vec2::new(out.x, out.y + delta.y), radius);
    if !world.blocked(along_y, radius) {
        out = along_y;
    }
    out
}

/// Full step if clear, otherwise whichever single axis is clear, otherwise stay.
fn deflect(world: &EntityRegistry, bounds: &Bounds, pos: Vec2, delta: Vec2, radius: f32) -> Vec2 {
    [
        pos + delta,
        Vec2::new(pos.x + delta.x, pos.y),
        Vec2::new(pos.x, pos.y + delta.y),
    ]
    .into_iter()
    .map(|p| bounds.clamp_circle(p, radius))
    .find(|p| !world.blocked(*p, radius))
    .unwrap_or(pos)
}

fn move_players(state: &mut SimulationState, inputs: &[InputState]) {
    let t = state.config.tunables;
    let rapid_bonus = if state.buffs.is_active(Buff::RapidFire) {
        t.rapid_fire_speed_bonus
    } else {
        0.0
    };

    for i in 0..state.world.players.len() {
        let input = inputs.get(i).copied().unwrap_or_default();
        let player = &state.world.players[i];
        if !player.body.is_alive() {
            continue;
        }
        let dir = input.direction();
        let speed = player.body.speed + player.speed_bonus + rapid_bonus;
        let pos = slide(
            &state.world,
            &state.bounds,
            player.body.pos,
            dir * speed,
            player.body.radius(),
        );

        let facing = if dir != Vec2::ZERO { dir } else { player.facing };
        let locked = match player.aim {
            AimStrategy::AutoAim if dir == Vec2::ZERO && state.config.auto_aim => state
                .world
                .nearest_hostile(pos, t.auto_aim_radius)
                .and_then(|h| state.world.hostiles.get(h))
                .map(|h| h.body.pos),
            _ => None,
        };
        let angle = match player.aim {
            AimStrategy::Pointer => input.pointer.map(|p| angle_to(pos, p)),
            AimStrategy::MovementFacing | AimStrategy::AutoAim => None,
        }
        .or_else(|| locked.map(|target| angle_to(pos, target)))
        .unwrap_or_else(|| angle_to(Vec2::ZERO, facing));

        let player = &mut state.world.players[i];
        player.body.pos = pos;
        player.facing = facing;
        player.body.angle = angle;
    }
}

fn move_hostiles(state: &mut SimulationState) {
    let frozen = state.buffs.is_active(Buff::Freeze);
    let enrage_factor = state.config.tunables.boss_enrage_speed;

    for h in state.world.hostiles.handles() {
        let Some(hostile) = state.world.hostiles.get(h) else {
            continue;
        };
        if frozen && hostile.kind != HostileKind::Boss {
            continue;
        }
        let Some(target) = state
            .world
            .nearest_living_player(hostile.body.pos)
            .and_then(|id| state.world.player(id))
            .map(|p| p.body.pos)
        else {
            continue;
        };

        let profile = state.config.hostile(hostile.kind);
        let pos = hostile.body.pos;
        let angle = angle_to(pos, target);
        let mut speed = hostile.body.speed;
        if hostile.enraged {
            speed *= enrage_factor;
        }
        let in_range = profile
            .ranged
            .filter(|r| pos.distance(target) <= r.range);
        let next = if in_range.is_some() {
            pos
        } else {
            deflect(
                &state.world,
                &state.bounds,
                pos,
                unit(angle) * speed,
                hostile.body.radius(),
            )
        };

        let Some(hostile) = state.world.hostiles.get_mut(h) else {
            continue;
        };
        hostile.body.pos = next;
        hostile.body.angle = angle;

        let Some(attack) = in_range else {
            continue;
        };
        hostile.attack_timer = hostile.attack_timer.saturating_sub(1);
        if hostile.attack_timer > 0 {
            continue;
        }
        hostile.attack_timer = attack.cooldown;
        state.world.hostile_shots.insert(Projectile {
            pos: next,
            vel: unit(angle) * attack.speed,
            damage: attack.damage,
            owner: Owner::Hostile(h),
            duration: attack.lifetime,
            pierce: 0,
            radius: HOSTILE_SHOT_RADIUS,
            tint: Tint::Magenta,
            struck: Vec::new(),
            passed: Vec::new(),
        });
    }
}
