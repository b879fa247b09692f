mod common;

use common::*;
use glam::Vec2;

use wave_shooter::compute::TickCtx;
use wave_shooter::config::{default_drops, ItemDrop};
use wave_shooter::entities::{AmmoState, Buff, HostileKind, ItemKind, PickupCategory, Pickup, PlayerId, WeaponKind};
use wave_shooter::pickups::{self, apply, roll_drop, spawn_drop};
use wave_shooter::services::Cue;

fn pickup_at(pos: Vec2, kind: ItemKind, lifetime: u32) -> Pickup {
    Pickup {
        pos,
        kind,
        lifetime,
        phase: 0.0,
    }
}

// ── Drop table ────────────────────────────────────────────────────────────────

#[test]
fn roll_drop_walks_cumulative_probabilities() {
    let table = default_drops();
    assert_eq!(roll_drop(&table, 0.0), Some(ItemKind::Heal));
    assert_eq!(roll_drop(&table, 0.02), Some(ItemKind::Heal));
    // Exactly on a boundary belongs to the next entry.
    assert_eq!(roll_drop(&table, 0.05), Some(ItemKind::Ammo));
    assert_eq!(roll_drop(&table, 0.105), Some(ItemKind::Ammo));
    assert_eq!(roll_drop(&table, 0.115), Some(ItemKind::Nuke));
    assert_eq!(roll_drop(&table, 0.99), None);
}

#[test]
fn roll_drop_on_empty_table_is_nothing() {
    assert_eq!(roll_drop(&[], 0.0), None);
    let certain = [ItemDrop {
        kind: ItemKind::Shield,
        probability: 1.0,
    }];
    assert_eq!(roll_drop(&certain, 0.999), Some(ItemKind::Shield));
}

#[test]
fn spawn_drop_places_the_rolled_item() {
    let mut state = make_state();
    let mut rng = ZeroRng;
    let mut audio = RecordingAudio::default();
    let mut ctx = TickCtx::new(&mut rng, &mut audio);

    let kind = spawn_drop(&mut state, Vec2::new(50.0, 60.0), &mut ctx);

    assert_eq!(kind, Some(ItemKind::Heal));
    let pickup = state.world.pickups.values().next().expect("dropped");
    assert_eq!(pickup.pos, Vec2::new(50.0, 60.0));
    assert_eq!(pickup.lifetime, state.config.tunables.pickup_lifetime);
}

// ── Lifetime & collection ─────────────────────────────────────────────────────

#[test]
fn walking_over_a_medkit_heals_and_consumes_it() {
    let mut state = make_state();
    state.world.players[0].body.damage(50);
    let at = state.world.players[0].body.pos + Vec2::new(20.0, 0.0);
    state.world.pickups.insert(pickup_at(at, ItemKind::Heal, 100));
    let mut rng = ZeroRng;
    let mut audio = RecordingAudio::default();
    let mut ctx = TickCtx::new(&mut rng, &mut audio);

    pickups::update(&mut state, &mut ctx);

    assert_eq!(player_hp(&state, 0), 80);
    assert!(state.world.pickups.is_empty());
    assert_eq!(state.stats.pickups_collected, 1);
    assert_eq!(audio.count(Cue::Pickup(PickupCategory::Supply)), 1);
}

#[test]
fn heal_never_exceeds_max_hp() {
    let mut state = make_state();
    state.world.players[0].body.damage(10);
    let mut rng = ZeroRng;
    let mut audio = RecordingAudio::default();
    let mut ctx = TickCtx::new(&mut rng, &mut audio);

    apply(&mut state, PlayerId(0), ItemKind::Heal, &mut ctx);
    assert_eq!(player_hp(&state, 0), 100);
}

#[test]
fn uncollected_pickups_expire() {
    let mut state = make_state();
    state
        .world
        .pickups
        .insert(pickup_at(Vec2::new(50.0, 50.0), ItemKind::Ammo, 3));
    let mut rng = ZeroRng;
    let mut audio = RecordingAudio::default();
    let mut ctx = TickCtx::new(&mut rng, &mut audio);

    pickups::update(&mut state, &mut ctx);
    pickups::update(&mut state, &mut ctx);
    assert_eq!(state.world.pickups.len(), 1);
    pickups::update(&mut state, &mut ctx);
    assert!(state.world.pickups.is_empty());
    assert_eq!(state.stats.pickups_collected, 0);
}

#[test]
fn dead_players_do_not_collect() {
    let mut state = make_state();
    let pos = state.world.players[0].body.pos;
    state.world.players[0].body.kill();
    state.world.pickups.insert(pickup_at(pos, ItemKind::Heal, 100));
    let mut rng = ZeroRng;
    let mut audio = RecordingAudio::default();
    let mut ctx = TickCtx::new(&mut rng, &mut audio);

    pickups::update(&mut state, &mut ctx);
    assert_eq!(state.world.pickups.len(), 1);
}

// ── Effects ───────────────────────────────────────────────────────────────────

#[test]
fn ammo_refills_limited_guns_but_not_placeables() {
    let mut state = make_state();
    let shotgun = state.config.weapon(WeaponKind::Shotgun);
    let barrel = state.config.weapon(WeaponKind::Barrel);
    {
        let player = &mut state.world.players[0];
        player.loadout.grant(&shotgun);
        player.loadout.grant(&barrel);
        *player.loadout.ammo_mut(WeaponKind::Shotgun) = AmmoState { clip: 0, reserve: 0 };
        player.loadout.ammo_mut(WeaponKind::Barrel).reserve = 2;
    }
    let mut rng = ZeroRng;
    let mut audio = RecordingAudio::default();
    let mut ctx = TickCtx::new(&mut rng, &mut audio);

    apply(&mut state, PlayerId(0), ItemKind::Ammo, &mut ctx);
    let loadout = &state.world.players[0].loadout;
    assert_eq!(loadout.ammo(WeaponKind::Shotgun).reserve, 18);
    assert_eq!(loadout.ammo(WeaponKind::Barrel).reserve, 2);

    apply(&mut state, PlayerId(0), ItemKind::Ammo, &mut ctx);
    apply(&mut state, PlayerId(0), ItemKind::Ammo, &mut ctx);
    let reserve = state.world.players[0].loadout.ammo(WeaponKind::Shotgun).reserve;
    assert_eq!(reserve, shotgun.max_reserve.unwrap_or(0));
}

#[test]
fn nuke_kills_everything_and_pays_out() {
    let mut state = make_state();
    for x in [100.0, 200.0, 300.0] {
        spawn(&mut state, HostileKind::Basic, x, 100.0);
    }
    let mut rng = ZeroRng;
    let mut audio = RecordingAudio::default();
    let mut ctx = TickCtx::new(&mut rng, &mut audio);

    apply(&mut state, PlayerId(0), ItemKind::Nuke, &mut ctx);

    assert!(state.world.hostiles.is_empty());
    assert_eq!(state.stats.kills, 3);
    assert_eq!(state.world.players[0].score, 300);
    assert_eq!(state.combo.streak, 3);
}

#[test]
fn buff_pickups_start_their_timer() {
    let mut state = make_state();
    let mut rng = ZeroRng;
    let mut audio = RecordingAudio::default();
    let mut ctx = TickCtx::new(&mut rng, &mut audio);
    let ticks = state.config.tunables.buff_ticks;

    apply(&mut state, PlayerId(0), ItemKind::RapidFire, &mut ctx);
    apply(&mut state, PlayerId(0), ItemKind::Freeze, &mut ctx);
    assert_eq!(state.buffs.remaining(Buff::RapidFire), ticks);
    pickups::update(&mut state, &mut ctx);
    assert_eq!(state.buffs.remaining(Buff::RapidFire), ticks - 1);
    assert!(state.buffs.is_active(Buff::Freeze));
    assert!(!state.buffs.is_active(Buff::Shield));
}

#[test]
fn double_score_doubles_kill_points() {
    let mut state = make_state();
    state.buffs.start(Buff::DoubleScore, 10);
    let h = spawn(&mut state, HostileKind::Fast, 100.0, 100.0);
    let mut rng = ZeroRng;
    let mut audio = RecordingAudio::default();
    let mut ctx = TickCtx::new(&mut rng, &mut audio);

    wave_shooter::combat::kill_hostile(
        &mut state,
        h,
        wave_shooter::combat::DeathCause::Shot(Some(PlayerId(0))),
        &mut ctx,
    );
    assert_eq!(state.stats.score, 300);
}
