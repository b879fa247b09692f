//! Fire-and-forget collaborators: audio cues and briefing text.

use crate::config::LevelConfig;
use crate::entities::{PickupCategory, WeaponKind};
use crate::progression::Achievement;

/// Named sound moments. The simulation emits these and never waits on them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cue {
    Shoot(WeaponKind),
    Hit,
    Reload,
    EmptyClip,
    Pickup(PickupCategory),
    Explosion,
    ComboMilestone(u32),
    BossRoar,
    AchievementUnlocked(Achievement),
}

pub trait AudioSink {
    fn play(&mut self, cue: Cue);
}

/// Discards every cue.
#[derive(Debug, Default)]
pub struct NullAudio;

impl AudioSink for NullAudio {
    fn play(&mut self, _cue: Cue) {}
}

/// Terminal stand-in: rings the bell on loud moments and traces the rest.
#[derive(Debug, Default)]
pub struct BellAudio {
    pub rang: u64,
}

impl AudioSink for BellAudio {
    fn play(&mut self, cue: Cue) {
        match cue {
            Cue::Explosion | Cue::BossRoar | Cue::AchievementUnlocked(_) => {
                self.rang += 1;
                tracing::trace!(?cue, "bell");
            }
            _ => tracing::trace!(?cue, "cue"),
        }
    }
}

/// Narrative text shown before a level. Purely decorative.
pub fn briefing(level: &LevelConfig) -> String {
    let threat = match level.hostile_kinds.len() {
        0..=2 => "Light resistance expected.",
        3..=4 => "Mixed hostiles, some armed.",
        _ => "Every kind of horror we have on file.",
    };
    let sighted: Vec<&str> = level.hostile_kinds.iter().map(|k| k.label()).collect();
    let mut text = format!(
        "SECTOR {:02} - {}\n\n{}\n{}\nSighted: {}.",
        level.id,
        level.name.to_uppercase(),
        level.description,
        threat,
        sighted.join(", ")
    );
    if let Some(weapon) = level.unlock_weapon {
        text.push_str(&format!("\nSupply drop: {} issued on arrival.", weapon.label()));
    }
    if level.boss {
        text.push_str("\nWarning: a large signature sits behind the final wave.");
    }
    text
}
