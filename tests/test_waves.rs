mod common;

use common::*;

use wave_shooter::compute::{SessionSetup, TickCtx};
use wave_shooter::entities::{Difficulty, GameMode, HostileKind, PlayerId, RespawnModel};
use wave_shooter::waves::{self, choose_kind, SpawnPhase, WavePlan, WaveRules, WaveScheduler, WaveSignal};

use HostileKind::*;

fn plan(_wave: u32) -> WavePlan {
    WavePlan { quota: 2, cadence: 4 }
}

fn idle_steps(s: &mut WaveScheduler, live: usize, n: usize) {
    for _ in 0..n {
        assert_eq!(s.step(live, plan), WaveSignal::Idle);
    }
}

// ── Scheduler ─────────────────────────────────────────────────────────────────

#[test]
fn campaign_scheduler_walks_every_phase() {
    let mut s = WaveScheduler::campaign(2, 3);

    idle_steps(&mut s, 0, 2);
    assert_eq!(s.step(0, plan), WaveSignal::Started(1));
    assert_eq!(s.phase, SpawnPhase::Spawning);
    assert_eq!(s.remaining, 2);

    assert_eq!(s.step(0, plan), WaveSignal::Spawn);
    idle_steps(&mut s, 1, 3);
    assert_eq!(s.step(1, plan), WaveSignal::Spawn);
    assert_eq!(s.phase, SpawnPhase::Clearing);

    // Hostiles still alive keep the wave open.
    idle_steps(&mut s, 2, 5);
    assert_eq!(s.step(0, plan), WaveSignal::Cleared(1));
    assert_eq!(s.wave, 2);
    assert_eq!(s.phase, SpawnPhase::Intermission);
    assert_eq!(s.intermission_timer, 3);

    idle_steps(&mut s, 0, 2);
    assert_eq!(s.step(0, plan), WaveSignal::Started(2));
    assert_eq!(s.step(0, plan), WaveSignal::Spawn);
    idle_steps(&mut s, 0, 3);
    assert_eq!(s.step(0, plan), WaveSignal::Spawn);
    assert!(s.is_final_wave());
    assert_eq!(s.step(0, plan), WaveSignal::Victory);
    assert_eq!(s.phase, SpawnPhase::Victory);

    // Victory is terminal.
    idle_steps(&mut s, 0, 10);
    assert_eq!(s.wave, 2);
}

#[test]
fn endless_scheduler_never_reaches_victory() {
    let mut s = WaveScheduler::endless(1);
    for wave in 1..=20 {
        assert_eq!(s.step(0, plan), WaveSignal::Started(wave));
        assert_eq!(s.step(0, plan), WaveSignal::Spawn);
        idle_steps(&mut s, 1, 3);
        assert_eq!(s.step(1, plan), WaveSignal::Spawn);
        assert_eq!(s.step(0, plan), WaveSignal::Cleared(wave));
    }
    assert_eq!(s.total_waves, None);
}

#[test]
fn time_attack_spawns_until_the_clock_expires() {
    let mut s = WaveScheduler::time_attack(10);
    let cadence_one = |_: u32| WavePlan { quota: 0, cadence: 1 };
    for _ in 0..9 {
        assert_eq!(s.step(0, cadence_one), WaveSignal::Spawn);
    }
    assert_eq!(s.step(0, cadence_one), WaveSignal::Victory);
    assert_eq!(s.clock, Some(0));
    assert_eq!(s.wave, 1);
    assert_eq!(s.step(0, cadence_one), WaveSignal::Idle);
}

// ── Wave shape ────────────────────────────────────────────────────────────────

fn campaign_rules() -> WaveRules {
    WaveRules {
        endless: false,
        base_count: 6,
        spawn_interval: 90,
        interval_step: 8,
        min_interval: 20,
        boss_level: true,
        total_waves: Some(5),
    }
}

#[test]
fn wave_plan_grows_and_speeds_up() {
    let rules = campaign_rules();
    assert_eq!(rules.plan(1), WavePlan { quota: 6, cadence: 90 });
    assert_eq!(rules.plan(3), WavePlan { quota: 12, cadence: 74 });
}

#[test]
fn final_wave_of_a_boss_level_is_a_single_boss() {
    let rules = campaign_rules();
    assert!(!rules.is_boss_wave(4));
    assert!(rules.is_boss_wave(5));
    assert_eq!(rules.plan(5).quota, 1);
}

#[test]
fn cadence_never_drops_below_the_floor() {
    let rules = campaign_rules();
    assert_eq!(rules.plan(40).cadence, 20);
}

#[test]
fn endless_quota_follows_wave_number() {
    let rules = WaveRules {
        endless: true,
        boss_level: false,
        total_waves: None,
        ..campaign_rules()
    };
    assert_eq!(rules.plan(1).quota, 8);
    assert_eq!(rules.plan(4).quota, 17);
}

#[test]
fn choose_kind_uses_thresholds_and_falls_back() {
    let all = [Basic, Fast, Ranged, Exploder, Armored];
    assert_eq!(choose_kind(0.90, &all), Armored);
    assert_eq!(choose_kind(0.80, &all), Exploder);
    assert_eq!(choose_kind(0.70, &all), Ranged);
    assert_eq!(choose_kind(0.60, &all), Fast);
    assert_eq!(choose_kind(0.30, &all), Basic);
    // Thresholds are strict.
    assert_eq!(choose_kind(0.50, &all), Basic);

    assert_eq!(choose_kind(0.90, &[Basic, Fast]), Fast);
    assert_eq!(choose_kind(0.30, &[Fast, Ranged]), Fast);
    assert_eq!(choose_kind(0.99, &[Basic]), Basic);
}

// ── Spawning ──────────────────────────────────────────────────────────────────

#[test]
fn difficulty_scales_hostile_hp_and_speed() {
    let mut s = make_state_with(
        open_config(),
        SessionSetup {
            difficulty: Difficulty::Hard,
            ..SessionSetup::default()
        },
    );
    let h = spawn(&mut s, Basic, 100.0, 100.0);
    let hostile = s.world.hostiles.get(h).unwrap();
    assert_eq!(hostile.body.max_hp(), 75);
    assert!(approx(hostile.body.speed, 1.4 * 1.2));
}

#[test]
fn endless_hostiles_grow_each_wave() {
    let mut s = make_state_with(
        open_config(),
        SessionSetup {
            mode: GameMode::Endless,
            ..SessionSetup::default()
        },
    );
    let first = spawn(&mut s, Basic, 100.0, 100.0);
    s.waves.wave = 4;
    let later = spawn(&mut s, Basic, 100.0, 100.0);
    let hp = |h| s.world.hostiles.get(h).unwrap().body.max_hp();
    assert_eq!(hp(first), 50);
    assert!(hp(later) > 60 && hp(later) < 75);
}

#[test]
fn boss_level_final_wave_spawns_the_boss() {
    let mut s = make_state_with(
        open_config(),
        SessionSetup {
            level_id: 5,
            ..SessionSetup::default()
        },
    );
    s.waves.wave = 5;
    s.waves.intermission_timer = 1;
    let mut rng = ZeroRng;
    let mut audio = RecordingAudio::default();
    let mut ctx = TickCtx::new(&mut rng, &mut audio);

    waves::update(&mut s, &mut ctx);
    assert_eq!(s.waves.remaining, 1);
    waves::update(&mut s, &mut ctx);

    let kinds: Vec<_> = s.world.hostiles.values().map(|h| h.kind).collect();
    assert_eq!(kinds, vec![Boss]);
    assert_eq!(s.waves.phase, SpawnPhase::Clearing);
    assert_eq!(audio.count(wave_shooter::services::Cue::BossRoar), 1);
}

#[test]
fn spawns_respect_level_hostile_kinds() {
    let mut s = make_state();
    s.waves.intermission_timer = 1;
    let mut rng = ZeroRng;
    let mut audio = RecordingAudio::default();
    let mut ctx = TickCtx::new(&mut rng, &mut audio);
    for _ in 0..2 {
        waves::update(&mut s, &mut ctx);
    }
    let hostile = s.world.hostiles.values().next().expect("one spawn");
    assert!(s.level.hostile_kinds.contains(&hostile.kind));
    assert!(s.bounds.clamp_circle(hostile.body.pos, hostile.body.radius()) == hostile.body.pos);
}

#[test]
fn wave_boundary_revives_fallen_players() {
    let mut s = coop_state(RespawnModel::WaveBoundary);
    s.world.players[1].body.kill();
    s.waves.phase = SpawnPhase::Clearing;
    let mut rng = ZeroRng;
    let mut audio = RecordingAudio::default();
    let mut ctx = TickCtx::new(&mut rng, &mut audio);

    waves::update(&mut s, &mut ctx);

    assert_eq!(s.waves.wave, 2);
    let revived = s.world.player(PlayerId(1)).unwrap();
    assert!(revived.body.is_alive());
    assert_eq!(revived.body.pos, s.world.players[0].body.pos);
}
