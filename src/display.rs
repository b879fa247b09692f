//! Rendering layer. All terminal I/O lives here.
//!
//! Entities are drawn straight from the simulation state; every number in
//! the HUD comes from the per-tick `UiSnapshot`. Nothing here mutates the
//! simulation.

use std::io::Write;

use crossterm::{
    cursor,
    style::{self, Color, Print},
    terminal, QueueableCommand,
};
use glam::Vec2;
use wave_shooter::entities::{HostileKind, ItemKind, ObstacleKind, Outcome, SimulationState, Tint};
use wave_shooter::geometry::{Bounds, Rect};
use wave_shooter::progression::RunRecord;
use wave_shooter::snapshot::{PlayerHud, UiSnapshot};
use wave_shooter::waves::SpawnPhase;

// ── Colour palette ────────────────────────────────────────────────────────────

const C_HUD_SCORE: Color = Color::Yellow;
const C_HUD_HP: Color = Color::Red;
const C_HUD_AMMO: Color = Color::White;
const C_HINT: Color = Color::DarkGrey;
const C_PLAYER: [Color; 2] = [Color::White, Color::Cyan];
const C_HOSTILE_SHOT: Color = Color::Magenta;
const C_MINIMAP: Color = Color::DarkGrey;

const MINIMAP_W: u16 = 20;
const MINIMAP_H: u16 = 7;
/// Ticks per second, for countdown display.
const TPS: u32 = 60;

/// Maps canvas coordinates onto terminal cells.
#[derive(Clone, Copy, Debug)]
pub struct Viewport {
    cols: u16,
    rows: u16,
    /// First row of the play area.
    top: u16,
    play_rows: u16,
    sx: f32,
    sy: f32,
}

impl Viewport {
    /// Fit the canvas into the current terminal, leaving one header row and
    /// one status row per player.
    pub fn fit(bounds: &Bounds, players: u16) -> std::io::Result<Self> {
        let (cols, rows) = terminal::size()?;
        let top = 1;
        let play_rows = rows.saturating_sub(top + players.max(1)).max(1);
        Ok(Self {
            cols,
            rows,
            top,
            play_rows,
            sx: cols as f32 / bounds.width,
            sy: play_rows as f32 / bounds.height,
        })
    }

    fn cell(&self, p: Vec2) -> Option<(u16, u16)> {
        let col = (p.x * self.sx).floor();
        let row = (p.y * self.sy).floor();
        if col < 0.0 || row < 0.0 || col >= self.cols as f32 || row >= self.play_rows as f32 {
            return None;
        }
        Some((col as u16, self.top + row as u16))
    }

    /// Terminal cell back to canvas coordinates (cell centre).
    pub fn to_canvas(&self, col: u16, row: u16) -> Vec2 {
        let row = row.saturating_sub(self.top);
        Vec2::new(
            (col as f32 + 0.5) / self.sx,
            (row as f32 + 0.5) / self.sy,
        )
    }

    fn cells_of(&self, rect: &Rect) -> Vec<(u16, u16)> {
        let x0 = (rect.x * self.sx).floor().max(0.0) as u16;
        let x1 = ((rect.x + rect.w) * self.sx).ceil().min(self.cols as f32) as u16;
        let y0 = (rect.y * self.sy).floor().max(0.0) as u16;
        let y1 = ((rect.y + rect.h) * self.sy).ceil().min(self.play_rows as f32) as u16;
        let mut cells = Vec::new();
        for row in y0..y1.max(y0 + 1).min(self.play_rows) {
            for col in x0..x1.max(x0 + 1).min(self.cols) {
                cells.push((col, self.top + row));
            }
        }
        cells
    }
}

fn tint_color(tint: Tint) -> Color {
    match tint {
        Tint::White => Color::White,
        Tint::Yellow => Color::Yellow,
        Tint::Orange => Color::DarkYellow,
        Tint::Red => Color::Red,
        Tint::Cyan => Color::Cyan,
        Tint::Green => Color::Green,
        Tint::Magenta => Color::Magenta,
        Tint::Grey => Color::Grey,
        Tint::Blue => Color::Blue,
    }
}

fn put<W: Write>(out: &mut W, at: (u16, u16), color: Color, text: &str) -> std::io::Result<()> {
    out.queue(cursor::MoveTo(at.0, at.1))?;
    out.queue(style::SetForegroundColor(color))?;
    out.queue(Print(text))?;
    Ok(())
}

fn centered<W: Write>(out: &mut W, view: &Viewport, row: u16, color: Color, text: &str) -> std::io::Result<()> {
    let col = (view.cols / 2).saturating_sub(text.chars().count() as u16 / 2);
    put(out, (col, row), color, text)
}

// ── Public entry points ───────────────────────────────────────────────────────

/// Render one complete frame.
pub fn render<W: Write>(
    out: &mut W,
    state: &SimulationState,
    ui: &UiSnapshot,
    record: Option<&RunRecord>,
    high_score: u32,
) -> std::io::Result<()> {
    let view = Viewport::fit(&state.bounds, ui.players.len() as u16)?;
    let [r, g, b] = state.level.background;
    out.queue(style::SetBackgroundColor(Color::Rgb { r, g, b }))?;
    out.queue(terminal::Clear(terminal::ClearType::All))?;

    draw_obstacles(out, &view, state)?;
    draw_pickups(out, &view, state)?;
    for p in &state.world.particles {
        if let Some(at) = view.cell(p.pos) {
            put(out, at, tint_color(p.tint), "·")?;
        }
    }
    draw_hostiles(out, &view, state)?;
    draw_players(out, &view, state)?;
    draw_projectiles(out, &view, state)?;
    for t in &state.world.floating_texts {
        if let Some(at) = view.cell(t.pos) {
            put(out, at, tint_color(t.tint), &t.text)?;
        }
    }
    draw_minimap(out, &view, state)?;
    draw_hud(out, &view, ui, high_score)?;

    if ui.phase == SpawnPhase::Intermission && ui.outcome.is_none() {
        if let Some(ticks) = ui.intermission {
            let row = view.top + view.play_rows / 3;
            let text = format!("WAVE {} INCOMING  {}s", ui.wave, ticks / TPS + 1);
            centered(out, &view, row, Color::Yellow, &text)?;
        }
    }
    if ui.paused {
        let row = view.top + view.play_rows / 2;
        centered(out, &view, row, Color::White, "PAUSED  -  P to resume")?;
    }
    if let Some(outcome) = ui.outcome {
        draw_game_over(out, &view, ui, outcome, record, high_score)?;
    }

    out.queue(style::ResetColor)?;
    out.queue(cursor::MoveTo(0, view.rows.saturating_sub(1)))?;
    out.flush()?;
    Ok(())
}

/// Pre-level briefing card.
pub fn briefing<W: Write>(out: &mut W, text: &str, high_score: u32) -> std::io::Result<()> {
    let (cols, rows) = terminal::size()?;
    out.queue(style::ResetColor)?;
    out.queue(terminal::Clear(terminal::ClearType::All))?;
    let lines: Vec<&str> = text.lines().collect();
    let start = (rows / 2).saturating_sub(lines.len() as u16 / 2 + 2);
    for (i, line) in lines.iter().enumerate() {
        let col = (cols / 2).saturating_sub(line.chars().count() as u16 / 2);
        let color = if i == 0 { Color::Cyan } else { Color::White };
        put(out, (col, start + i as u16), color, line)?;
    }
    let mut row = start + lines.len() as u16 + 1;
    if high_score > 0 {
        let best = format!("Best Score: {high_score}");
        put(out, ((cols / 2).saturating_sub(best.len() as u16 / 2), row), Color::Yellow, &best)?;
        row += 1;
    }
    let hint = "ENTER / SPACE - Deploy    ESC - Quit";
    put(out, ((cols / 2).saturating_sub(hint.len() as u16 / 2), row + 1), C_HINT, hint)?;
    out.queue(style::ResetColor)?;
    out.flush()?;
    Ok(())
}

// ── World ─────────────────────────────────────────────────────────────────────

fn draw_obstacles<W: Write>(out: &mut W, view: &Viewport, state: &SimulationState) -> std::io::Result<()> {
    for o in state.world.obstacles.values() {
        let (glyph, color) = match o.kind {
            ObstacleKind::Wall => ("█", Color::Grey),
            ObstacleKind::Crate => ("▒", Color::DarkYellow),
            ObstacleKind::Barrel => ("◍", Color::Red),
            ObstacleKind::PlacedWall => ("▓", Color::Blue),
        };
        for at in view.cells_of(&o.rect) {
            put(out, at, color, glyph)?;
        }
    }
    Ok(())
}

fn draw_pickups<W: Write>(out: &mut W, view: &Viewport, state: &SimulationState) -> std::io::Result<()> {
    for p in state.world.pickups.values() {
        // Blink during the last two seconds.
        if p.lifetime < 2 * TPS && (state.frame / 8) % 2 == 0 {
            continue;
        }
        let bob = Vec2::new(0.0, p.phase.sin() * 3.0);
        let Some(at) = view.cell(p.pos + bob) else {
            continue;
        };
        let (glyph, color) = match p.kind {
            ItemKind::Heal => ("+", Color::Green),
            ItemKind::Ammo => ("≡", Color::Yellow),
            ItemKind::Nuke => ("☢", Color::Red),
            ItemKind::RapidFire => ("»", Color::Cyan),
            ItemKind::DoubleScore => ("$", Color::Yellow),
            ItemKind::Shield => ("◊", Color::Blue),
            ItemKind::Freeze => ("*", Color::White),
        };
        put(out, at, color, glyph)?;
    }
    Ok(())
}

fn draw_hostiles<W: Write>(out: &mut W, view: &Viewport, state: &SimulationState) -> std::io::Result<()> {
    for h in state.world.hostiles.values() {
        let Some(at) = view.cell(h.body.pos) else {
            continue;
        };
        let color = if h.enraged && (state.frame / 4) % 2 == 0 {
            Color::White
        } else {
            tint_color(state.config.hostile(h.kind).tint)
        };
        let glyph = match h.kind {
            HostileKind::Basic => "z",
            HostileKind::Fast => "f",
            HostileKind::Ranged => "s",
            HostileKind::Exploder => "@",
            HostileKind::Armored => "B",
            HostileKind::Minion => "m",
            HostileKind::Boss => {
                // 3x3 block centred on the boss.
                for dy in 0..3u16 {
                    let row = (at.1 + dy).saturating_sub(1);
                    let col = at.0.saturating_sub(1);
                    if row >= view.top && row < view.top + view.play_rows {
                        put(out, (col, row), color, if dy == 1 { "▐Ω▌" } else { "███" })?;
                    }
                }
                continue;
            }
        };
        put(out, at, color, glyph)?;
    }
    Ok(())
}

fn facing_glyph(angle: f32) -> &'static str {
    let octant = ((angle / std::f32::consts::FRAC_PI_4).round() as i32).rem_euclid(8);
    match octant {
        0 => "▶",
        1 => "◢",
        2 => "▼",
        3 => "◣",
        4 => "◀",
        5 => "◤",
        6 => "▲",
        _ => "◥",
    }
}

fn draw_players<W: Write>(out: &mut W, view: &Viewport, state: &SimulationState) -> std::io::Result<()> {
    for (i, p) in state.world.players.iter().enumerate() {
        let Some(at) = view.cell(p.body.pos) else {
            continue;
        };
        if p.body.is_alive() {
            put(out, at, C_PLAYER[i % C_PLAYER.len()], facing_glyph(p.body.angle))?;
        } else {
            put(out, at, Color::DarkGrey, "x")?;
        }
    }
    Ok(())
}

fn draw_projectiles<W: Write>(out: &mut W, view: &Viewport, state: &SimulationState) -> std::io::Result<()> {
    for shot in state.world.player_shots.values() {
        if let Some(at) = view.cell(shot.pos) {
            put(out, at, tint_color(shot.tint), "•")?;
        }
    }
    for shot in state.world.hostile_shots.values() {
        if let Some(at) = view.cell(shot.pos) {
            put(out, at, C_HOSTILE_SHOT, "∗")?;
        }
    }
    Ok(())
}

fn draw_minimap<W: Write>(out: &mut W, view: &Viewport, state: &SimulationState) -> std::io::Result<()> {
    if view.cols < MINIMAP_W * 3 || view.play_rows < MINIMAP_H * 2 {
        return Ok(());
    }
    let left = view.cols - MINIMAP_W - 1;
    let top = view.top + view.play_rows - MINIMAP_H - 1;
    put(out, (left, top), C_MINIMAP, &format!("┌{}┐", "─".repeat(MINIMAP_W as usize - 2)))?;
    for row in 1..MINIMAP_H - 1 {
        put(out, (left, top + row), C_MINIMAP, &format!("│{}│", " ".repeat(MINIMAP_W as usize - 2)))?;
    }
    put(out, (left, top + MINIMAP_H - 1), C_MINIMAP, &format!("└{}┘", "─".repeat(MINIMAP_W as usize - 2)))?;

    let inner_w = (MINIMAP_W - 2) as f32;
    let inner_h = (MINIMAP_H - 2) as f32;
    let dot = |p: Vec2| {
        let col = (p.x / state.bounds.width * inner_w).clamp(0.0, inner_w - 1.0) as u16;
        let row = (p.y / state.bounds.height * inner_h).clamp(0.0, inner_h - 1.0) as u16;
        (left + 1 + col, top + 1 + row)
    };
    for p in state.world.pickups.values() {
        put(out, dot(p.pos), Color::Green, "·")?;
    }
    for h in state.world.hostiles.values() {
        let glyph = if h.kind == HostileKind::Boss { "●" } else { "·" };
        put(out, dot(h.body.pos), Color::Red, glyph)?;
    }
    for (i, p) in state.world.players.iter().enumerate() {
        if p.body.is_alive() {
            put(out, dot(p.body.pos), C_PLAYER[i % C_PLAYER.len()], "■")?;
        }
    }
    Ok(())
}

// ── HUD ───────────────────────────────────────────────────────────────────────

fn draw_hud<W: Write>(out: &mut W, view: &Viewport, ui: &UiSnapshot, high_score: u32) -> std::io::Result<()> {
    out.queue(style::SetBackgroundColor(Color::Reset))?;
    let left = format!("Score:{:>7}  Hi:{:>7}", ui.score, high_score.max(ui.score));
    put(out, (1, 0), C_HUD_SCORE, &left)?;

    let progress = match (ui.time_remaining, ui.total_waves) {
        (Some(ticks), _) => format!("[ TIME {:>3}s ]", ticks / TPS),
        (None, Some(total)) => format!("[ WAVE {}/{} ]", ui.wave, total),
        (None, None) => format!("[ WAVE {} ]", ui.wave),
    };
    centered(out, view, 0, Color::White, &progress)?;

    let mut right = String::new();
    if ui.combo > 1 {
        right.push_str(&format!("COMBO x{}  ", ui.combo));
    }
    for (buff, ticks) in &ui.buffs {
        right.push_str(&format!("[{} {}s] ", buff.label(), ticks / TPS + 1));
    }
    right.push_str(&format!("Hostiles:{}", ui.hostiles_alive));
    let col = view.cols.saturating_sub(right.chars().count() as u16 + 1);
    put(out, (col, 0), Color::Cyan, &right)?;

    for (i, hud) in ui.players.iter().enumerate() {
        let row = view.top + view.play_rows + i as u16;
        draw_player_status(out, row, i, hud)?;
    }
    Ok(())
}

fn draw_player_status<W: Write>(out: &mut W, row: u16, i: usize, hud: &PlayerHud) -> std::io::Result<()> {
    put(out, (1, row), C_PLAYER[i % C_PLAYER.len()], &format!("P{} ", hud.id + 1))?;
    if !hud.alive {
        let text = match hud.respawn_in {
            Some(ticks) => format!("DOWN - back in {}s", ticks / TPS + 1),
            None => "DOWN".to_string(),
        };
        return put(out, (4, row), Color::DarkGrey, &text);
    }
    let filled = (hud.hp.max(0) as usize * 10).div_ceil(hud.max_hp.max(1) as usize);
    let bar = format!("♥ {}{} {:>3}/{:<3}", "█".repeat(filled), "░".repeat(10 - filled.min(10)), hud.hp, hud.max_hp);
    put(out, (4, row), C_HUD_HP, &bar)?;

    let reserve = hud.reserve.map_or("∞".to_string(), |r| r.to_string());
    let ammo = match hud.reloading {
        Some(progress) => format!("  {:<8} RELOADING {:>3}%", hud.weapon.label(), (progress * 100.0) as u32),
        None => format!("  {:<8} {:>3}/{:<3} | {}", hud.weapon.label(), hud.clip, hud.clip_size, reserve),
    };
    put(out, (26, row), C_HUD_AMMO, &ammo)?;

    let owned: Vec<&str> = hud.owned.iter().map(|w| w.label()).collect();
    put(out, (62, row), C_HINT, &format!("{}   score {}", owned.join(" "), hud.score))?;
    Ok(())
}

// ── Game-over overlay ─────────────────────────────────────────────────────────

fn draw_game_over<W: Write>(
    out: &mut W,
    view: &Viewport,
    ui: &UiSnapshot,
    outcome: Outcome,
    record: Option<&RunRecord>,
    high_score: u32,
) -> std::io::Result<()> {
    let (title, color) = match outcome {
        Outcome::Victory => ("║      VICTORY       ║", Color::Green),
        Outcome::Defeat => ("║    GAME  OVER      ║", Color::Red),
    };
    let mut lines: Vec<(String, Color)> = vec![
        ("╔════════════════════╗".into(), color),
        (title.into(), color),
        ("╚════════════════════╝".into(), color),
        (format!("Final Score: {:>7}", ui.score), Color::Yellow),
    ];
    match record {
        Some(r) if r.new_high_score => {
            lines.push((format!("★ NEW BEST: {:>7} ★", ui.score), Color::Yellow));
        }
        _ => lines.push((format!("Best Score:  {:>7}", high_score.max(ui.score)), Color::DarkGrey)),
    }
    if let Some(r) = record {
        lines.push((format!("Credits earned: {}", r.credits_earned), Color::Cyan));
        for a in &r.achievements {
            lines.push((format!("Achievement: {}", a.title()), Color::Magenta));
        }
    }
    lines.push(("R - Play Again  ESC - Quit".into(), Color::White));

    let start = (view.top + view.play_rows / 2).saturating_sub(lines.len() as u16 / 2);
    for (i, (text, color)) in lines.iter().enumerate() {
        centered(out, view, start + i as u16, *color, text)?;
    }
    Ok(())
}
