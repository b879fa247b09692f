use glam::Vec2;

use wave_shooter::config::WeaponProfile;
use wave_shooter::entities::*;
use wave_shooter::registry::{Arena, EntityRegistry};

fn body(hp: i32) -> Body {
    Body::new(Vec2::ZERO, 10.0, hp, 1.0)
}

// ── Body ──────────────────────────────────────────────────────────────────────

#[test]
fn damage_and_heal_are_clamped() {
    let mut b = body(100);
    assert_eq!(b.damage(30), 30);
    assert_eq!(b.hp(), 70);
    assert_eq!(b.damage(-5), 0);
    assert_eq!(b.heal(50), 30);
    assert_eq!(b.hp(), 100);
    assert_eq!(b.damage(500), 100);
    assert_eq!(b.hp(), 0);
    assert!(!b.is_alive());
    b.restore();
    assert_eq!(b.hp(), b.max_hp());
}

#[test]
fn max_hp_is_at_least_one() {
    let b = body(0);
    assert_eq!(b.max_hp(), 1);
    assert!(b.is_alive());
}

// ── Loadout ───────────────────────────────────────────────────────────────────

#[test]
fn locked_weapons_cannot_be_selected() {
    let mut l = Loadout::new(&WeaponProfile::builtin(WeaponKind::Pistol));
    assert!(!l.select(WeaponKind::Sniper));
    assert_eq!(l.active(), WeaponKind::Pistol);
}

#[test]
fn grant_is_idempotent_and_fills_ammo() {
    let sniper = WeaponProfile::builtin(WeaponKind::Sniper);
    let mut l = Loadout::new(&WeaponProfile::builtin(WeaponKind::Pistol));
    assert!(l.grant(&sniper));
    l.ammo_mut(WeaponKind::Sniper).clip = 1;
    assert!(!l.grant(&sniper));
    assert_eq!(l.ammo(WeaponKind::Sniper).clip, 1);
    assert_eq!(l.ammo(WeaponKind::Sniper).reserve, sniper.max_reserve.unwrap_or(0));
}

#[test]
fn cycle_wraps_in_weapon_order() {
    let mut l = Loadout::new(&WeaponProfile::builtin(WeaponKind::Pistol));
    l.grant(&WeaponProfile::builtin(WeaponKind::Wall));
    l.grant(&WeaponProfile::builtin(WeaponKind::Shotgun));
    assert_eq!(l.owned(), &[WeaponKind::Pistol, WeaponKind::Shotgun, WeaponKind::Wall]);

    assert_eq!(l.cycle(1), WeaponKind::Shotgun);
    assert_eq!(l.cycle(1), WeaponKind::Wall);
    assert_eq!(l.cycle(1), WeaponKind::Pistol);
    assert_eq!(l.cycle(-1), WeaponKind::Wall);
}

// ── Buffs ─────────────────────────────────────────────────────────────────────

#[test]
fn buffs_count_down_independently() {
    let mut b = BuffTimers::default();
    b.start(Buff::Shield, 2);
    b.start(Buff::Freeze, 1);
    b.tick();
    assert_eq!(b.active(), vec![(Buff::Shield, 1)]);
    // Restarting refreshes rather than stacks.
    b.start(Buff::Shield, 5);
    assert_eq!(b.remaining(Buff::Shield), 5);
    for _ in 0..10 {
        b.tick();
    }
    assert!(b.active().is_empty());
}

#[test]
fn item_kinds_map_to_buffs() {
    assert_eq!(ItemKind::Shield.buff(), Some(Buff::Shield));
    assert_eq!(ItemKind::Heal.buff(), None);
    assert_eq!(ItemKind::Nuke.category(), PickupCategory::Bomb);
    assert_eq!(ItemKind::Ammo.category(), PickupCategory::Supply);
    assert_eq!(ItemKind::DoubleScore.category(), PickupCategory::Powerup);
}

// ── Registry ──────────────────────────────────────────────────────────────────

#[test]
fn stale_handles_resolve_to_nothing() {
    let mut arena = Arena::new();
    let a = arena.insert("a");
    assert_eq!(arena.remove(a), Some("a"));
    let b = arena.insert("b");
    assert_eq!(arena.get(a), None);
    assert_eq!(arena.remove(a), None);
    assert_eq!(arena.get(b), Some(&"b"));
    assert_eq!(arena.len(), 1);
}

#[test]
fn handle_snapshot_survives_removal_during_iteration() {
    let mut arena = Arena::new();
    for i in 0..5 {
        arena.insert(i);
    }
    let mut seen = Vec::new();
    for h in arena.handles() {
        let Some(v) = arena.get(h).copied() else {
            continue;
        };
        seen.push(v);
        // Remove the next element as a side effect.
        let next = arena.iter().find(|(_, x)| **x == v + 1).map(|(h, _)| h);
        if let Some(next) = next {
            arena.remove(next);
        }
    }
    assert_eq!(seen, vec![0, 2, 4]);
}

#[test]
fn effects_fade_out() {
    let mut world = EntityRegistry::default();
    world.float_text(Vec2::new(10.0, 10.0), "+100".into(), Tint::Yellow);
    world.age_effects();
    assert!(world.floating_texts[0].pos.y < 10.0);
    for _ in 0..100 {
        world.age_effects();
    }
    assert!(world.floating_texts.is_empty());
}
