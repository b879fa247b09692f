//! Shooting, reloads, projectile flight, damage and death processing.
//!
//! Every loop that can remove entities walks a handle snapshot and
//! re-resolves each handle before touching it, so a hostile killed by one
//! projectile is simply skipped by the next.

use rand::Rng;
use tracing::{debug, info};

use crate::compute::TickCtx;
use crate::config::{default_obstacle_hp, FireMode, WeaponProfile};
use crate::entities::{
    AmmoState, Blast, Buff, HostileKind, Obstacle, ObstacleKind, Owner, Player, PlayerId, Projectile,
    Reload, RespawnModel, SimulationState, Tint, WeaponKind,
};
use crate::geometry::{circle_intersects_rect, circles_overlap, unit, Rect};
use crate::input::InputState;
use crate::pickups::spawn_drop;
use crate::progression::check_combo_unlock;
use crate::registry::Handle;
use crate::services::{AudioSink, Cue};
use crate::waves::spawn_hostile;

/// Why a hostile died. Decides who gets the reward, if anyone.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeathCause {
    Shot(Option<PlayerId>),
    Blast(Option<PlayerId>),
    Nuke(PlayerId),
    /// An exploder that reached a player. Never rewarded.
    SelfDestruct,
}

impl DeathCause {
    fn credit(self) -> Option<PlayerId> {
        match self {
            DeathCause::Shot(by) | DeathCause::Blast(by) => by,
            DeathCause::Nuke(by) => Some(by),
            DeathCause::SelfDestruct => None,
        }
    }
}

pub fn update(state: &mut SimulationState, inputs: &[InputState], ctx: &mut TickCtx) {
    state.combo.tick();
    for i in 0..state.world.players.len() {
        let input = inputs.get(i).copied().unwrap_or_default();
        handle_player(state, PlayerId(i), &input, ctx);
    }
    update_player_shots(state, ctx);
    update_hostile_shots(state, ctx);
    update_bosses(state);
    contact_damage(state, ctx);
    resolve_blasts(state, ctx);
    update_respawns(state);
}

// ── Weapons ───────────────────────────────────────────────────────────────────

/// Begin reloading `profile`'s weapon. Returns whether a reload is running
/// after the call; an existing reload is left untouched.
pub fn start_reload(player: &mut Player, profile: &WeaponProfile, audio: &mut dyn AudioSink) -> bool {
    if player.reload.is_some() {
        return true;
    }
    if profile.is_placeable() {
        return false;
    }
    let ammo = player.loadout.ammo(profile.kind);
    if ammo.clip >= profile.clip_size || (profile.max_reserve.is_some() && ammo.reserve == 0) {
        return false;
    }
    player.reload = Some(Reload {
        weapon: profile.kind,
        remaining: profile.reload_ticks.max(1),
    });
    audio.play(Cue::Reload);
    debug!(player = player.id.0, weapon = ?profile.kind, "reload started");
    true
}

/// Count a running reload down by one tick; moves ammo when it finishes.
pub fn advance_reload(player: &mut Player, profile: &WeaponProfile) -> bool {
    let Some(reload) = player.reload.as_mut() else {
        return false;
    };
    if reload.weapon != profile.kind {
        player.reload = None;
        return false;
    }
    reload.remaining = reload.remaining.saturating_sub(1);
    if reload.remaining > 0 {
        return false;
    }
    player.reload = None;
    transfer_ammo(profile, player.loadout.ammo_mut(profile.kind));
    true
}

/// Top the clip up from reserve. Returns the rounds moved.
pub fn transfer_ammo(profile: &WeaponProfile, ammo: &mut AmmoState) -> u32 {
    let wanted = profile.clip_size.saturating_sub(ammo.clip);
    let moved = match profile.max_reserve {
        None => wanted,
        Some(_) => wanted.min(ammo.reserve),
    };
    ammo.clip += moved;
    if profile.max_reserve.is_some() {
        ammo.reserve -= moved;
    }
    moved
}

fn shot_tint(kind: WeaponKind) -> Tint {
    match kind {
        WeaponKind::Flamethrower => Tint::Orange,
        WeaponKind::Sniper => Tint::Cyan,
        _ => Tint::Yellow,
    }
}

/// Projectile headings for one trigger pull.
fn spread_angles(profile: &WeaponProfile, aim: f32, rng: &mut dyn rand::RngCore) -> Vec<f32> {
    let count = profile.projectile_count.max(1);
    match profile.fire {
        FireMode::Single => vec![aim],
        FireMode::Fan { step } => {
            let mid = (count - 1) as f32 / 2.0;
            (0..count).map(|k| aim + (k as f32 - mid) * step).collect()
        }
        FireMode::Spray => (0..count)
            .map(|_| aim + (rng.gen::<f32>() - 0.5) * profile.spread)
            .collect(),
        FireMode::Place { .. } => Vec::new(),
    }
}

fn handle_player(state: &mut SimulationState, id: PlayerId, input: &InputState, ctx: &mut TickCtx) {
    let config = &state.config;
    let rapid = state.buffs.is_active(Buff::RapidFire);
    let Some(player) = state.world.players.get_mut(id.0) else {
        return;
    };
    if !player.body.is_alive() {
        player.trigger_held = false;
        return;
    }
    player.ticks_since_shot = player.ticks_since_shot.saturating_add(1);
    player.ticks_since_place = player.ticks_since_place.saturating_add(1);

    let held = config.weapon(player.loadout.active());
    if advance_reload(player, &held) {
        debug!(player = id.0, "reload finished");
    }

    let before = player.loadout.active();
    if let Some(weapon) = input.select {
        player.loadout.select(weapon);
    }
    if input.cycle != 0 {
        player.loadout.cycle(input.cycle);
    }
    if player.loadout.active() != before {
        player.reload = None;
    }

    let profile = config.weapon(player.loadout.active());
    if input.reload {
        start_reload(player, &profile, ctx.audio);
    }

    let pressed = input.fire && !player.trigger_held;
    player.trigger_held = input.fire;
    if !input.fire || player.reload.is_some() {
        return;
    }

    if let FireMode::Place { obstacle } = profile.fire {
        if player.ticks_since_place < profile.cooldown {
            return;
        }
        if player.loadout.ammo(profile.kind).reserve == 0 {
            if pressed {
                ctx.audio.play(Cue::EmptyClip);
            }
            return;
        }
        place_obstacle(state, id, &profile, obstacle, ctx);
        return;
    }

    let cooldown = if rapid {
        (profile.cooldown / 2).max(1)
    } else {
        profile.cooldown
    };
    if player.ticks_since_shot < cooldown {
        return;
    }
    if player.loadout.ammo(profile.kind).clip == 0 {
        if !start_reload(player, &profile, ctx.audio) && pressed {
            ctx.audio.play(Cue::EmptyClip);
        }
        return;
    }

    player.loadout.ammo_mut(profile.kind).clip -= 1;
    player.ticks_since_shot = 0;
    let aim = player.body.angle;
    let origin = player.body.pos + unit(aim) * player.body.radius();
    let damage = (profile.damage as f32 * (1.0 + player.damage_bonus)).round() as i32;

    let angles = spread_angles(&profile, aim, ctx.rng);
    state.stats.shots_fired += 1;
    state.stats.weapons_used.insert(profile.kind);
    for angle in angles {
        state.world.player_shots.insert(Projectile {
            pos: origin,
            vel: unit(angle) * profile.speed,
            damage,
            owner: Owner::Player(id),
            duration: profile.lifetime,
            pierce: profile.pierce,
            radius: profile.projectile_radius,
            tint: shot_tint(profile.kind),
            struck: Vec::new(),
            passed: Vec::new(),
        });
    }
    ctx.audio.play(Cue::Shoot(profile.kind));
}

/// Drop a grid-snapped obstacle in front of the player. Refused without
/// consuming anything if the cell is occupied or off the canvas.
fn place_obstacle(
    state: &mut SimulationState,
    id: PlayerId,
    profile: &WeaponProfile,
    obstacle: ObstacleKind,
    ctx: &mut TickCtx,
) -> bool {
    let t = &state.config.tunables;
    let Some(player) = state.world.player(id) else {
        return false;
    };
    let target = player.body.pos + unit(player.body.angle) * t.placement_distance;
    let half = t.placement_size / 2.0;
    let grid = t.placement_grid.max(1.0);
    let rect = Rect::new(
        ((target.x - half) / grid).round() * grid,
        ((target.y - half) / grid).round() * grid,
        t.placement_size,
        t.placement_size,
    );
    if !state.bounds.contains_rect(&rect) || !state.world.rect_is_free(&rect) {
        return false;
    }

    state.world.obstacles.insert(Obstacle {
        rect,
        kind: obstacle,
        hp: default_obstacle_hp(obstacle),
    });
    if let Some(player) = state.world.player_mut(id) {
        let ammo = player.loadout.ammo_mut(profile.kind);
        ammo.reserve = ammo.reserve.saturating_sub(1);
        player.ticks_since_place = 0;
    }
    state.stats.weapons_used.insert(profile.kind);
    ctx.audio.play(Cue::Shoot(profile.kind));
    true
}

// ── Projectiles ───────────────────────────────────────────────────────────────

fn update_player_shots(state: &mut SimulationState, ctx: &mut TickCtx) {
    for sh in state.world.player_shots.handles() {
        let Some(shot) = state.world.player_shots.get_mut(sh) else {
            continue;
        };
        shot.pos += shot.vel;
        shot.duration = shot.duration.saturating_sub(1);
        if shot.duration == 0 || state.bounds.is_outside(shot.pos, shot.radius) {
            state.world.player_shots.remove(sh);
            continue;
        }
        let (pos, radius, damage) = (shot.pos, shot.radius, shot.damage);
        let credit = match shot.owner {
            Owner::Player(id) => Some(id),
            Owner::Hostile(_) => None,
        };
        let piercing = shot.pierce > 0;
        let passed = shot.passed.clone();

        if let Some(oh) = state.world.obstacle_at(pos, radius, &passed) {
            let passes = piercing
                && state
                    .world
                    .obstacles
                    .get(oh)
                    .is_some_and(|o| !o.kind.stops_piercing());
            damage_obstacle(state, oh, damage, credit, ctx);
            let kept = passes
                && match state.world.player_shots.get_mut(sh) {
                    Some(shot) => {
                        shot.passed.push(oh);
                        true
                    }
                    None => false,
                };
            if !kept {
                state.world.player_shots.remove(sh);
                continue;
            }
        }

        for hh in state.world.hostiles.handles() {
            let Some(hostile) = state.world.hostiles.get(hh) else {
                continue;
            };
            let Some(shot) = state.world.player_shots.get_mut(sh) else {
                break;
            };
            if shot.struck.contains(&hh)
                || !circles_overlap(shot.pos, shot.radius, hostile.body.pos, hostile.body.radius())
            {
                continue;
            }
            if shot.struck.is_empty() {
                state.stats.shots_hit += 1;
            }
            shot.struck.push(hh);
            let spent = shot.pierce == 0;
            if spent {
                state.world.player_shots.remove(sh);
            } else {
                shot.pierce -= 1;
            }
            damage_hostile(state, hh, damage, DeathCause::Shot(credit), ctx);
            if spent {
                break;
            }
        }
    }
}

fn update_hostile_shots(state: &mut SimulationState, ctx: &mut TickCtx) {
    for sh in state.world.hostile_shots.handles() {
        let Some(shot) = state.world.hostile_shots.get_mut(sh) else {
            continue;
        };
        shot.pos += shot.vel;
        shot.duration = shot.duration.saturating_sub(1);
        let (pos, radius, damage) = (shot.pos, shot.radius, shot.damage);
        if shot.duration == 0
            || state.bounds.is_outside(pos, radius)
            || state.world.blocked(pos, radius)
        {
            state.world.hostile_shots.remove(sh);
            continue;
        }
        let hit = state
            .world
            .living_players()
            .find(|p| circles_overlap(pos, radius, p.body.pos, p.body.radius()))
            .map(|p| p.id);
        if let Some(id) = hit {
            state.world.hostile_shots.remove(sh);
            hurt_player(state, id, damage, ctx);
        }
    }
}

// ── Damage & death ────────────────────────────────────────────────────────────

/// Apply damage to a hostile, killing it at zero hp. Returns whether it died.
pub fn damage_hostile(
    state: &mut SimulationState,
    h: Handle,
    amount: i32,
    cause: DeathCause,
    ctx: &mut TickCtx,
) -> bool {
    let Some(hostile) = state.world.hostiles.get_mut(h) else {
        return false;
    };
    let taken = hostile.body.damage(amount);
    let pos = hostile.body.pos;
    let enrage = hostile.kind == HostileKind::Boss
        && !hostile.enraged
        && hostile.body.is_alive()
        && hostile.body.hp() * 2 < hostile.body.max_hp();
    if enrage {
        hostile.enraged = true;
    }
    let dead = !hostile.body.is_alive();

    state.world.burst(pos, 3, Tint::Red, ctx.rng);
    state.world.float_text(pos, format!("-{taken}"), Tint::White);
    ctx.audio.play(Cue::Hit);
    if enrage {
        state.world.float_text(pos, "ENRAGED".into(), Tint::Red);
        ctx.audio.play(Cue::BossRoar);
        info!("boss enraged");
    }
    if dead {
        kill_hostile(state, h, cause, ctx);
    }
    dead
}

fn award(state: &mut SimulationState, credit: Option<PlayerId>, points: u32) {
    state.stats.score = state.stats.score.saturating_add(points);
    if let Some(player) = credit.and_then(|id| state.world.player_mut(id)) {
        player.score = player.score.saturating_add(points);
    }
}

/// Remove a hostile and run its death effects: exploder blast, reward,
/// combo, unlocks and the item drop.
pub fn kill_hostile(state: &mut SimulationState, h: Handle, cause: DeathCause, ctx: &mut TickCtx) {
    let Some(hostile) = state.world.hostiles.remove(h) else {
        return;
    };
    let pos = hostile.body.pos;
    let profile = state.config.hostile(hostile.kind);
    let credit = cause.credit();
    state.world.burst(pos, 12, profile.tint, ctx.rng);

    if hostile.kind == HostileKind::Exploder {
        let blast = state.config.tunables.exploder_blast;
        state.blasts.push(Blast {
            center: pos,
            radius: blast.radius,
            damage: blast.damage,
            credit,
        });
        ctx.audio.play(Cue::Explosion);
    }
    if cause == DeathCause::SelfDestruct {
        return;
    }

    let mut points = profile.score as f32 * state.difficulty.modifiers().score;
    if state.buffs.is_active(Buff::DoubleScore) {
        points *= 2.0;
    }
    let points = points.round() as u32;
    award(state, credit, points);
    state.world.float_text(pos, format!("+{points}"), Tint::Yellow);
    state.stats.kills += 1;
    if hostile.kind == HostileKind::Boss {
        state.stats.bosses_killed += 1;
        info!(?credit, "boss killed");
    }

    let streak = state.combo.register_kill();
    state.stats.max_combo = state.stats.max_combo.max(streak);
    let t = state.config.tunables;
    if t.combo_milestone > 0 && streak % t.combo_milestone == 0 {
        let bonus = streak * t.combo_bonus_per_kill;
        award(state, credit, bonus);
        state
            .world
            .float_text(pos, format!("COMBO x{streak} +{bonus}"), Tint::Magenta);
        ctx.audio.play(Cue::ComboMilestone(streak));
    }
    check_combo_unlock(state, streak);

    if hostile.kind != HostileKind::Exploder {
        spawn_drop(state, pos, ctx);
    }
}

/// Damage a destructible obstacle. Returns whether it was destroyed.
pub fn damage_obstacle(
    state: &mut SimulationState,
    oh: Handle,
    amount: i32,
    credit: Option<PlayerId>,
    ctx: &mut TickCtx,
) -> bool {
    let Some(hp) = state
        .world
        .obstacles
        .get_mut(oh)
        .and_then(|o| o.hp.as_mut())
    else {
        return false;
    };
    *hp = (*hp - amount.max(0)).max(0);
    if *hp > 0 {
        return false;
    }
    let Some(obstacle) = state.world.obstacles.remove(oh) else {
        return false;
    };
    let center = obstacle.rect.center();
    state.stats.obstacles_destroyed += 1;
    state.world.burst(center, 8, Tint::Grey, ctx.rng);
    match obstacle.kind {
        ObstacleKind::Barrel => {
            let blast = state.config.tunables.barrel_blast;
            state.blasts.push(Blast {
                center,
                radius: blast.radius,
                damage: blast.damage,
                credit,
            });
            ctx.audio.play(Cue::Explosion);
        }
        ObstacleKind::Crate => {
            spawn_drop(state, center, ctx);
        }
        ObstacleKind::Wall | ObstacleKind::PlacedWall => {}
    }
    true
}

/// Resolve queued blasts until none remain. A blast that destroys a barrel
/// or kills an exploder queues another one; each source can only detonate
/// once, so the chain always ends.
pub fn resolve_blasts(state: &mut SimulationState, ctx: &mut TickCtx) {
    while let Some(blast) = state.blasts.pop() {
        state.world.burst(blast.center, 16, Tint::Orange, ctx.rng);

        for h in state.world.hostiles.handles() {
            let in_reach = state.world.hostiles.get(h).is_some_and(|hostile| {
                hostile.body.pos.distance(blast.center) <= blast.radius + hostile.body.radius()
            });
            if in_reach {
                damage_hostile(state, h, blast.damage, DeathCause::Blast(blast.credit), ctx);
            }
        }

        let caught: Vec<PlayerId> = state
            .world
            .living_players()
            .filter(|p| p.body.pos.distance(blast.center) <= blast.radius + p.body.radius())
            .map(|p| p.id)
            .collect();
        for id in caught {
            hurt_player(state, id, blast.damage, ctx);
        }

        for oh in state.world.obstacles.handles() {
            let in_reach = state.world.obstacles.get(oh).is_some_and(|o| {
                o.hp.is_some() && circle_intersects_rect(blast.center, blast.radius, &o.rect)
            });
            if in_reach {
                damage_obstacle(state, oh, blast.damage, blast.credit, ctx);
            }
        }
    }
}

/// Damage a living player, honouring shield and difficulty. Returns the hp
/// actually lost.
pub fn hurt_player(state: &mut SimulationState, id: PlayerId, amount: i32, ctx: &mut TickCtx) -> i32 {
    if state.buffs.is_active(Buff::Shield) {
        return 0;
    }
    let scaled = (amount as f32 * state.difficulty.modifiers().damage_taken).round() as i32;
    let respawn = state.respawn;
    let Some(player) = state.world.players.get_mut(id.0) else {
        return 0;
    };
    if !player.body.is_alive() {
        return 0;
    }
    let taken = player.body.damage(scaled);
    let pos = player.body.pos;
    let died = !player.body.is_alive();
    if died {
        player.reload = None;
        player.respawn_timer = match respawn {
            RespawnModel::Timed { delay } => Some(delay),
            RespawnModel::None | RespawnModel::WaveBoundary => None,
        };
    }

    state.stats.damage_taken = state.stats.damage_taken.saturating_add(taken as u32);
    if taken > 0 {
        state.world.float_text(pos, format!("-{taken}"), Tint::Red);
        ctx.audio.play(Cue::Hit);
    }
    if died {
        state.world.burst(pos, 20, Tint::Blue, ctx.rng);
        info!(player = id.0, "player down");
    }
    taken
}

fn contact_damage(state: &mut SimulationState, ctx: &mut TickCtx) {
    let frozen = state.buffs.is_active(Buff::Freeze);
    let interval = state.config.tunables.contact_interval;
    for h in state.world.hostiles.handles() {
        let Some(hostile) = state.world.hostiles.get_mut(h) else {
            continue;
        };
        hostile.contact_cooldown = hostile.contact_cooldown.saturating_sub(1);
        if frozen && hostile.kind != HostileKind::Boss {
            continue;
        }
        let (kind, pos, radius, ready) = (
            hostile.kind,
            hostile.body.pos,
            hostile.body.radius(),
            hostile.contact_cooldown == 0,
        );
        let Some(target) = state
            .world
            .living_players()
            .find(|p| circles_overlap(pos, radius, p.body.pos, p.body.radius()))
            .map(|p| p.id)
        else {
            continue;
        };

        if kind == HostileKind::Exploder {
            kill_hostile(state, h, DeathCause::SelfDestruct, ctx);
            continue;
        }
        if !ready {
            continue;
        }
        if let Some(hostile) = state.world.hostiles.get_mut(h) {
            hostile.contact_cooldown = interval;
        }
        let damage = state.config.hostile(kind).contact_damage;
        hurt_player(state, target, damage, ctx);
    }
}

/// Boss reinforcement: a ring of minions every interval.
fn update_bosses(state: &mut SimulationState) {
    let t = state.config.tunables;
    let minion_radius = state.config.hostile(HostileKind::Minion).radius;
    for h in state.world.hostiles.handles() {
        let Some(boss) = state
            .world
            .hostiles
            .get_mut(h)
            .filter(|b| b.kind == HostileKind::Boss)
        else {
            continue;
        };
        boss.reinforce_timer = boss.reinforce_timer.saturating_sub(1);
        if boss.reinforce_timer > 0 {
            continue;
        }
        boss.reinforce_timer = t.boss_reinforce_interval.max(1);
        let (center, ring) = (boss.body.pos, boss.body.radius() + minion_radius * 2.0);
        let count = t.boss_reinforce_count;
        for k in 0..count {
            let angle = std::f32::consts::TAU * k as f32 / count as f32;
            let pos = state.bounds.clamp_circle(center + unit(angle) * ring, minion_radius);
            spawn_hostile(state, HostileKind::Minion, pos);
        }
        debug!(count, "boss reinforcements");
    }
}

// ── Respawn ───────────────────────────────────────────────────────────────────

/// Bring a dead player back at full health beside a living teammate, or at
/// the canvas centre if nobody is standing.
pub fn revive_player(state: &mut SimulationState, id: PlayerId) {
    let anchor = state
        .world
        .living_players()
        .find(|p| p.id != id)
        .map_or(state.bounds.center(), |p| p.body.pos);
    let Some(player) = state.world.player_mut(id) else {
        return;
    };
    player.body.restore();
    player.body.pos = anchor;
    player.respawn_timer = None;
    player.reload = None;
    player.trigger_held = false;
    state.world.float_text(anchor, "REVIVED".into(), Tint::Green);
    info!(player = id.0, "player revived");
}

fn update_respawns(state: &mut SimulationState) {
    let mut due = Vec::new();
    for player in state.world.players.iter_mut() {
        if player.body.is_alive() {
            continue;
        }
        if let Some(timer) = player.respawn_timer.as_mut() {
            *timer = timer.saturating_sub(1);
            if *timer == 0 {
                due.push(player.id);
            }
        }
    }
    for id in due {
        if state.world.living_players().any(|p| p.id != id) {
            revive_player(state, id);
        }
    }
}
