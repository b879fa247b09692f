//! Combo streaks, weapon unlocks, run statistics and everything that is
//! handed to the persistence layer when a run ends.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::entities::{Difficulty, GameMode, Outcome, SimulationState, Tint, WeaponKind};
use crate::error::StoreError;
use crate::persistence::{get_u32, set_u32, KeyValueStore};
use crate::services::{AudioSink, Cue};

pub const KEY_HIGH_SCORE: &str = "high_score";
pub const KEY_CREDITS: &str = "credits";
pub const KEY_ACHIEVEMENTS: &str = "achievements";
pub const KEY_HIGHEST_LEVEL: &str = "campaign.highest_level";
pub const KEY_LIFETIME_KILLS: &str = "lifetime.kills";
pub const KEY_UPGRADE_SPEED: &str = "upgrade.speed";
pub const KEY_UPGRADE_DAMAGE: &str = "upgrade.damage";
pub const KEY_UPGRADE_VITALITY: &str = "upgrade.vitality";

// ── Combo ─────────────────────────────────────────────────────────────────────

/// Kill streak with a rolling decay window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ComboState {
    pub streak: u32,
    /// Ticks left before the streak resets.
    pub timer: u32,
    pub window: u32,
}

impl ComboState {
    pub fn new(window: u32) -> Self {
        Self {
            streak: 0,
            timer: 0,
            window,
        }
    }

    /// Count a kill and refresh the window. Returns the new streak.
    pub fn register_kill(&mut self) -> u32 {
        self.streak += 1;
        self.timer = self.window;
        self.streak
    }

    /// Advance one tick; the streak drops to zero when the window lapses.
    pub fn tick(&mut self) {
        if self.timer > 0 {
            self.timer -= 1;
            if self.timer == 0 {
                self.streak = 0;
            }
        }
    }
}

// ── Statistics ────────────────────────────────────────────────────────────────

/// Accumulates monotonically for one playthrough.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RunStats {
    pub kills: u32,
    pub shots_fired: u32,
    pub shots_hit: u32,
    pub damage_taken: u32,
    pub max_combo: u32,
    pub score: u32,
    pub elapsed_ticks: u64,
    pub weapons_used: BTreeSet<WeaponKind>,
    pub highest_wave: u32,
    pub bosses_killed: u32,
    pub pickups_collected: u32,
    pub obstacles_destroyed: u32,
}

impl RunStats {
    /// Hits per trigger pull. Spread and piercing shots can land several
    /// hits from one pull, so the ratio is capped at 1.
    pub fn accuracy(&self) -> f32 {
        if self.shots_fired == 0 {
            0.0
        } else {
            (self.shots_hit as f32 / self.shots_fired as f32).min(1.0)
        }
    }
}

// ── Unlocks ───────────────────────────────────────────────────────────────────

/// Grant the weapon mapped to exactly `streak`, if any, to every player
/// that lacks it. Guns are equipped on the spot; placeables are not.
pub fn check_combo_unlock(state: &mut SimulationState, streak: u32) -> Option<WeaponKind> {
    let weapon = state.config.combo_unlock_at(streak)?;
    let profile = state.config.weapon(weapon);
    let mut announced = Vec::new();
    for player in state.world.players.iter_mut() {
        if !player.loadout.grant(&profile) {
            continue;
        }
        if !profile.is_placeable() {
            player.loadout.select(weapon);
            player.reload = None;
        }
        announced.push(player.body.pos);
    }
    if announced.is_empty() {
        return None;
    }
    for pos in announced {
        state
            .world
            .float_text(pos, format!("{} UNLOCKED", weapon.label()), Tint::Cyan);
    }
    info!(?weapon, streak, "combo unlock");
    Some(weapon)
}

/// Monotonic pointer gating level selection in the external menu.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CampaignProgress {
    pub highest_unlocked: u32,
}

impl CampaignProgress {
    pub fn load(store: &dyn KeyValueStore) -> Self {
        Self {
            highest_unlocked: get_u32(store, KEY_HIGHEST_LEVEL).max(1),
        }
    }

    /// Record a cleared level. Never moves the pointer backwards.
    pub fn advance(&mut self, cleared_level: u32) -> bool {
        let next = cleared_level.saturating_add(1);
        if next > self.highest_unlocked {
            self.highest_unlocked = next;
            true
        } else {
            false
        }
    }

    pub fn save(&self, store: &mut dyn KeyValueStore) -> Result<(), StoreError> {
        set_u32(store, KEY_HIGHEST_LEVEL, self.highest_unlocked)
    }
}

/// Permanent upgrade levels bought in the external menu.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Upgrades {
    pub speed: u32,
    pub damage: u32,
    pub vitality: u32,
}

impl Upgrades {
    pub fn load(store: &dyn KeyValueStore) -> Self {
        Self {
            speed: get_u32(store, KEY_UPGRADE_SPEED),
            damage: get_u32(store, KEY_UPGRADE_DAMAGE),
            vitality: get_u32(store, KEY_UPGRADE_VITALITY),
        }
    }
}

// ── Achievements ──────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Achievement {
    FirstBlood,
    Untouchable,
    Specialist,
    Survivor,
    BuddySystem,
    BossSlayer,
    ComboMaster,
}

impl Achievement {
    pub const ALL: [Achievement; 7] = [
        Achievement::FirstBlood,
        Achievement::Untouchable,
        Achievement::Specialist,
        Achievement::Survivor,
        Achievement::BuddySystem,
        Achievement::BossSlayer,
        Achievement::ComboMaster,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Achievement::FirstBlood => "first-blood",
            Achievement::Untouchable => "untouchable",
            Achievement::Specialist => "specialist",
            Achievement::Survivor => "survivor",
            Achievement::BuddySystem => "buddy-system",
            Achievement::BossSlayer => "boss-slayer",
            Achievement::ComboMaster => "combo-master",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Achievement::FirstBlood => "First Blood",
            Achievement::Untouchable => "Untouchable",
            Achievement::Specialist => "Specialist",
            Achievement::Survivor => "Survivor",
            Achievement::BuddySystem => "Buddy System",
            Achievement::BossSlayer => "Boss Slayer",
            Achievement::ComboMaster => "Combo Master",
        }
    }

    pub fn earned(self, run: &RunSummary) -> bool {
        let s = &run.stats;
        match self {
            Achievement::FirstBlood => s.kills > 0,
            Achievement::Untouchable => s.damage_taken == 0 && s.score > 0,
            Achievement::Specialist => {
                run.outcome == Outcome::Victory && s.weapons_used.len() == 1
            }
            Achievement::Survivor => {
                run.mode == GameMode::Endless && s.highest_wave >= run.endless_wave_goal
            }
            Achievement::BuddySystem => run.coop,
            Achievement::BossSlayer => s.bosses_killed > 0,
            Achievement::ComboMaster => s.max_combo >= 30,
        }
    }
}

/// Everything about a finished run the persistence layer cares about.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RunSummary {
    pub outcome: Outcome,
    pub mode: GameMode,
    pub level_id: u32,
    pub difficulty: Difficulty,
    pub coop: bool,
    pub endless_wave_goal: u32,
    pub stats: RunStats,
}

impl RunSummary {
    /// `None` while the run is still going.
    pub fn from_state(state: &SimulationState) -> Option<Self> {
        Some(Self {
            outcome: state.outcome()?,
            mode: state.mode,
            level_id: state.level.id,
            difficulty: state.difficulty,
            coop: state.is_coop(),
            endless_wave_goal: state.config.tunables.endless_wave_goal,
            stats: state.stats.clone(),
        })
    }
}

/// Achievements earned by `run` that are not in `already`.
pub fn evaluate_achievements(run: &RunSummary, already: &BTreeSet<String>) -> Vec<Achievement> {
    Achievement::ALL
        .into_iter()
        .filter(|a| !already.contains(a.key()) && a.earned(run))
        .collect()
}

fn load_achievements(store: &dyn KeyValueStore) -> BTreeSet<String> {
    store
        .get(KEY_ACHIEVEMENTS)
        .and_then(|raw| serde_json::from_str(&raw).ok())
        .unwrap_or_default()
}

/// What `record_run` changed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RunRecord {
    pub new_high_score: bool,
    pub credits_earned: u32,
    pub achievements: Vec<Achievement>,
    pub highest_level: u32,
}

/// Push the end-of-run results into the store. Called once per run.
pub fn record_run(
    store: &mut dyn KeyValueStore,
    run: &RunSummary,
    credit_rate: f32,
    audio: &mut dyn AudioSink,
) -> Result<RunRecord, StoreError> {
    let mut record = RunRecord::default();

    let best = get_u32(store, KEY_HIGH_SCORE);
    if run.stats.score > best {
        set_u32(store, KEY_HIGH_SCORE, run.stats.score)?;
        record.new_high_score = true;
    }

    record.credits_earned = (run.stats.score as f32 * credit_rate).floor() as u32;
    let credits = get_u32(store, KEY_CREDITS).saturating_add(record.credits_earned);
    set_u32(store, KEY_CREDITS, credits)?;

    let kills = get_u32(store, KEY_LIFETIME_KILLS).saturating_add(run.stats.kills);
    set_u32(store, KEY_LIFETIME_KILLS, kills)?;

    let mut unlocked = load_achievements(store);
    record.achievements = evaluate_achievements(run, &unlocked);
    if !record.achievements.is_empty() {
        for a in &record.achievements {
            unlocked.insert(a.key().to_string());
            audio.play(Cue::AchievementUnlocked(*a));
            info!(achievement = a.title(), "achievement unlocked");
        }
        store.set(KEY_ACHIEVEMENTS, serde_json::to_string(&unlocked)?)?;
    }

    let mut progress = CampaignProgress::load(store);
    if run.mode == GameMode::Campaign && run.outcome == Outcome::Victory && progress.advance(run.level_id) {
        progress.save(store)?;
    }
    record.highest_level = progress.highest_unlocked;

    Ok(record)
}
