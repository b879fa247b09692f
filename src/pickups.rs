//! Item drops, pickup lifetime and collection, and the buff countdowns.

use glam::Vec2;
use rand::Rng;

use crate::combat::{kill_hostile, DeathCause};
use crate::compute::TickCtx;
use crate::config::ItemDrop;
use crate::entities::{ItemKind, Pickup, PlayerId, SimulationState, Tint};
use crate::geometry::circles_overlap;
use crate::services::Cue;

/// Walk the drop table accumulating probabilities; the first item whose
/// running total exceeds `draw` wins. A draw past the total is no drop.
pub fn roll_drop(items: &[ItemDrop], draw: f64) -> Option<ItemKind> {
    let mut total = 0.0;
    for item in items {
        total += item.probability;
        if total > draw {
            return Some(item.kind);
        }
    }
    None
}

/// Roll once against the drop table and place the result at `pos`.
pub fn spawn_drop(state: &mut SimulationState, pos: Vec2, ctx: &mut TickCtx) -> Option<ItemKind> {
    let kind = roll_drop(&state.config.items, ctx.rng.gen::<f64>())?;
    state.world.pickups.insert(Pickup {
        pos,
        kind,
        lifetime: state.config.tunables.pickup_lifetime,
        phase: 0.0,
    });
    Some(kind)
}

pub fn update(state: &mut SimulationState, ctx: &mut TickCtx) {
    state.buffs.tick();

    let t = state.config.tunables;
    for h in state.world.pickups.handles() {
        let Some(pickup) = state.world.pickups.get_mut(h) else {
            continue;
        };
        pickup.lifetime = pickup.lifetime.saturating_sub(1);
        pickup.phase += 0.1;
        if pickup.lifetime == 0 {
            state.world.pickups.remove(h);
            continue;
        }
        let pos = pickup.pos;
        let collector = state
            .world
            .living_players()
            .find(|p| circles_overlap(pos, t.pickup_radius + t.pickup_reach, p.body.pos, p.body.radius()))
            .map(|p| p.id);
        let Some(id) = collector else {
            continue;
        };
        let Some(pickup) = state.world.pickups.remove(h) else {
            continue;
        };
        apply(state, id, pickup.kind, ctx);
        state.stats.pickups_collected += 1;
        state.world.float_text(pos, pickup.kind.label().into(), Tint::Green);
        ctx.audio.play(Cue::Pickup(pickup.kind.category()));
    }
}

/// Apply an item's effect on behalf of player `id`.
pub fn apply(state: &mut SimulationState, id: PlayerId, kind: ItemKind, ctx: &mut TickCtx) {
    let t = state.config.tunables;
    match kind {
        ItemKind::Heal => {
            if let Some(player) = state.world.player_mut(id) {
                player.body.heal(t.heal_amount);
            }
        }
        ItemKind::Ammo => {
            let config = &state.config;
            if let Some(player) = state.world.players.get_mut(id.0) {
                let owned = player.loadout.owned().to_vec();
                for weapon in owned {
                    let profile = config.weapon(weapon);
                    let Some(max) = profile.max_reserve else {
                        continue;
                    };
                    let refill = if profile.is_placeable() {
                        0
                    } else {
                        profile.clip_size * t.ammo_refill_clips
                    };
                    let ammo = player.loadout.ammo_mut(weapon);
                    ammo.reserve = ammo.reserve.saturating_add(refill).min(max);
                }
            }
        }
        ItemKind::Nuke => {
            for h in state.world.hostiles.handles() {
                if let Some(hostile) = state.world.hostiles.get_mut(h) {
                    hostile.body.kill();
                }
                kill_hostile(state, h, DeathCause::Nuke(id), ctx);
            }
            ctx.audio.play(Cue::Explosion);
        }
        ItemKind::RapidFire | ItemKind::DoubleScore | ItemKind::Shield | ItemKind::Freeze => {
            if let Some(buff) = kind.buff() {
                state.buffs.start(buff, t.buff_ticks);
            }
        }
    }
}
