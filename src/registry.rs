//! Typed entity containers.
//!
//! Hostiles, projectiles, pickups and obstacles live in generation-checked
//! arenas so cross-collection references (a projectile's owner, the list of
//! hostiles a piercing shot already struck) stay valid lookups even after
//! the referenced element is removed mid-tick.

use glam::Vec2;
use rand::{Rng, RngCore};

use crate::entities::{
    FloatingText, Hostile, Obstacle, Particle, Pickup, Player, PlayerId, Projectile, Tint,
};
use crate::geometry::{circle_intersects_rect, Rect};

/// Stable reference into an [`Arena`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Handle {
    index: u32,
    generation: u32,
}

#[derive(Clone, Debug)]
struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Dense slot storage. Removing an element bumps its slot's generation so
/// stale handles resolve to `None`.
#[derive(Clone, Debug)]
pub struct Arena<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    len: usize,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            len: 0,
        }
    }
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, value: T) -> Handle {
        self.len += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.value = Some(value);
            return Handle {
                index,
                generation: slot.generation,
            };
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            value: Some(value),
        });
        Handle {
            index,
            generation: 0,
        }
    }

    pub fn remove(&mut self, handle: Handle) -> Option<T> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);
        self.len -= 1;
        Some(value)
    }

    pub fn get(&self, handle: Handle) -> Option<&T> {
        self.slots
            .get(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.value.as_ref())
    }

    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        self.slots
            .get_mut(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.value.as_mut())
    }

    pub fn contains(&self, handle: Handle) -> bool {
        self.get(handle).is_some()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (Handle, &T)> {
        self.slots.iter().enumerate().filter_map(|(i, slot)| {
            slot.value.as_ref().map(|v| {
                (
                    Handle {
                        index: i as u32,
                        generation: slot.generation,
                    },
                    v,
                )
            })
        })
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.slots.iter().filter_map(|slot| slot.value.as_ref())
    }

    /// Snapshot of the live handles. Iterate this when the loop body may
    /// insert or remove elements.
    pub fn handles(&self) -> Vec<Handle> {
        self.iter().map(|(h, _)| h).collect()
    }
}

const TEXT_LIFE: u32 = 45;
const PARTICLE_LIFE: u32 = 20;

/// All live entities of one run.
#[derive(Clone, Debug, Default)]
pub struct EntityRegistry {
    /// Indexed by [`PlayerId`]; players are never removed, only marked dead.
    pub players: Vec<Player>,
    pub hostiles: Arena<Hostile>,
    pub player_shots: Arena<Projectile>,
    pub hostile_shots: Arena<Projectile>,
    pub pickups: Arena<Pickup>,
    pub obstacles: Arena<Obstacle>,
    pub particles: Vec<Particle>,
    pub floating_texts: Vec<FloatingText>,
}

impl EntityRegistry {
    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(id.0)
    }

    pub fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.get_mut(id.0)
    }

    pub fn living_players(&self) -> impl Iterator<Item = &Player> {
        self.players.iter().filter(|p| p.body.is_alive())
    }

    pub fn all_players_dead(&self) -> bool {
        !self.players.is_empty() && self.players.iter().all(|p| !p.body.is_alive())
    }

    pub fn nearest_living_player(&self, pos: Vec2) -> Option<PlayerId> {
        self.living_players()
            .min_by(|a, b| {
                a.body
                    .pos
                    .distance_squared(pos)
                    .total_cmp(&b.body.pos.distance_squared(pos))
            })
            .map(|p| p.id)
    }

    /// Nearest hostile whose centre lies within `max_distance` of `pos`.
    pub fn nearest_hostile(&self, pos: Vec2, max_distance: f32) -> Option<Handle> {
        self.hostiles
            .iter()
            .map(|(h, hostile)| (h, hostile.body.pos.distance_squared(pos)))
            .filter(|(_, d2)| *d2 <= max_distance * max_distance)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(h, _)| h)
    }

    /// Whether a circle at `pos` would intersect any obstacle.
    pub fn blocked(&self, pos: Vec2, radius: f32) -> bool {
        self.obstacles
            .values()
            .any(|o| circle_intersects_rect(pos, radius, &o.rect))
    }

    /// First obstacle a circle intersects, skipping the `ignore` list.
    pub fn obstacle_at(&self, pos: Vec2, radius: f32, ignore: &[Handle]) -> Option<Handle> {
        self.obstacles
            .iter()
            .find(|(h, o)| !ignore.contains(h) && circle_intersects_rect(pos, radius, &o.rect))
            .map(|(h, _)| h)
    }

    pub fn rect_is_free(&self, rect: &Rect) -> bool {
        !self.obstacles.values().any(|o| o.rect.overlaps(rect))
            && !self
                .living_players()
                .any(|p| circle_intersects_rect(p.body.pos, p.body.radius(), rect))
            && !self
                .hostiles
                .values()
                .any(|h| circle_intersects_rect(h.body.pos, h.body.radius(), rect))
    }

    pub fn float_text(&mut self, pos: Vec2, text: String, tint: Tint) {
        self.floating_texts.push(FloatingText {
            pos,
            text,
            life: TEXT_LIFE,
            tint,
        });
    }

    /// Scatter `count` short-lived sparks around `pos`.
    pub fn burst(&mut self, pos: Vec2, count: usize, tint: Tint, rng: &mut dyn RngCore) {
        for _ in 0..count {
            let angle = rng.gen::<f32>() * std::f32::consts::TAU;
            let speed = 0.5 + rng.gen::<f32>() * 2.5;
            self.particles.push(Particle {
                pos,
                vel: Vec2::from_angle(angle) * speed,
                life: PARTICLE_LIFE,
                tint,
            });
        }
    }

    /// Drift and fade particles and floating text by one tick.
    pub fn age_effects(&mut self) {
        for p in &mut self.particles {
            p.pos += p.vel;
            p.vel *= 0.9;
            p.life = p.life.saturating_sub(1);
        }
        self.particles.retain(|p| p.life > 0);
        for t in &mut self.floating_texts {
            t.pos.y -= 0.5;
            t.life = t.life.saturating_sub(1);
        }
        self.floating_texts.retain(|t| t.life > 0);
    }
}
