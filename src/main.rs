mod display;

use std::fs::File;
use std::io::{stdout, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{mpsc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use crossterm::{
    cursor,
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, KeyboardEnhancementFlags, MouseButton, MouseEvent, MouseEventKind,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    terminal, ExecutableCommand,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use wave_shooter::compute::{init_state, tick, toggle_pause, SessionSetup, TickCtx};
use wave_shooter::config::{GameConfig, LevelConfig};
use wave_shooter::entities::{Difficulty, GameMode, RespawnModel, SimulationState};
use wave_shooter::input::{AimStrategy, InputState, KeyBindings, KeyTracker};
use wave_shooter::persistence::{get_u32, JsonFileStore, KeyValueStore};
use wave_shooter::progression::{record_run, RunRecord, RunSummary, Upgrades, KEY_HIGH_SCORE};
use wave_shooter::services::{briefing, BellAudio};
use wave_shooter::snapshot;

const FRAME: Duration = Duration::from_micros(16_667); // ≈60 FPS
const TICKS_PER_SECOND: u32 = 60;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ModeArg {
    Campaign,
    Endless,
    TimeAttack,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum DifficultyArg {
    Easy,
    Normal,
    Hard,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum RespawnArg {
    None,
    Timed,
    Wave,
}

#[derive(Parser, Debug)]
#[command(name = "wave_shooter")]
#[command(about = "Top-down wave-survival shooter for the terminal")]
struct Args {
    #[arg(long, value_enum, default_value_t = ModeArg::Campaign)]
    mode: ModeArg,

    /// Campaign level id
    #[arg(long, default_value_t = 1)]
    level: u32,

    #[arg(long, value_enum, default_value_t = DifficultyArg::Normal)]
    difficulty: DifficultyArg,

    /// Add a second player on the arrow keys
    #[arg(long)]
    coop: bool,

    /// Player one aims with the mouse
    #[arg(long)]
    mouse: bool,

    /// Lock onto the nearest hostile while standing still
    #[arg(long)]
    auto_aim: bool,

    /// How downed co-op players come back
    #[arg(long, value_enum, default_value_t = RespawnArg::Timed)]
    respawn: RespawnArg,

    /// Time-attack length in seconds
    #[arg(long, default_value_t = 120)]
    time_limit: u32,

    /// Fixed RNG seed for a reproducible run
    #[arg(long)]
    seed: Option<u64>,

    /// TOML file overriding the built-in tables
    #[arg(long)]
    config: Option<PathBuf>,

    /// Progress file
    #[arg(long, default_value = "wave_shooter_save.json")]
    save: PathBuf,

    /// Log file (the terminal itself is the game screen)
    #[arg(long, default_value = "wave_shooter.log")]
    log: PathBuf,
}

fn init_logging(path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn session_setup(args: &Args, config: &GameConfig, store: &dyn KeyValueStore) -> SessionSetup {
    let mode = match args.mode {
        ModeArg::Campaign => GameMode::Campaign,
        ModeArg::Endless => GameMode::Endless,
        ModeArg::TimeAttack => GameMode::TimeAttack {
            ticks: args.time_limit.saturating_mul(TICKS_PER_SECOND),
        },
    };
    let difficulty = match args.difficulty {
        DifficultyArg::Easy => Difficulty::Easy,
        DifficultyArg::Normal => Difficulty::Normal,
        DifficultyArg::Hard => Difficulty::Hard,
    };
    let respawn = match args.respawn {
        RespawnArg::None => RespawnModel::None,
        RespawnArg::Timed => RespawnModel::Timed {
            delay: config.tunables.respawn_delay,
        },
        RespawnArg::Wave => RespawnModel::WaveBoundary,
    };
    let fallback = if args.auto_aim {
        AimStrategy::AutoAim
    } else {
        AimStrategy::MovementFacing
    };
    let mut players = vec![if args.mouse { AimStrategy::Pointer } else { fallback }];
    if args.coop {
        players.push(fallback);
    }
    SessionSetup {
        mode,
        level_id: args.level,
        difficulty,
        players,
        respawn,
        upgrades: Upgrades::load(store),
    }
}

/// Why the game loop returned.
enum LoopExit {
    Quit,
    Restart,
}

// ── Game loop ─────────────────────────────────────────────────────────────────

/// Input model: a `KeyTracker` remembers the frame each key was last seen
/// (press or repeat). Keys seen within `HOLD_WINDOW` frames count as held,
/// so fire and movement can be combined on terminals that never report
/// releases; keyboard-enhanced terminals release keys immediately.
fn game_loop<W: Write>(
    out: &mut W,
    state: &mut SimulationState,
    rx: &mpsc::Receiver<Event>,
    rng: &mut StdRng,
    store: &mut dyn KeyValueStore,
    mouse: bool,
) -> Result<LoopExit> {
    let bindings = [KeyBindings::primary(), KeyBindings::secondary()];
    let mut tracker = KeyTracker::new();
    let mut audio = BellAudio::default();
    let mut record: Option<RunRecord> = None;
    let high_score = get_u32(store, KEY_HIGH_SCORE);
    let mut frame: u64 = 0;

    loop {
        let frame_start = Instant::now();
        frame += 1;
        tracker.begin_frame(frame);

        // ── Drain all pending input events (non-blocking) ─────────────────────
        while let Ok(ev) = rx.try_recv() {
            match ev {
                Event::Key(KeyEvent { code, kind, modifiers, .. }) => match kind {
                    KeyEventKind::Press => {
                        tracker.press(code);
                        match code {
                            KeyCode::Esc => return Ok(LoopExit::Quit),
                            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                                return Ok(LoopExit::Quit);
                            }
                            KeyCode::Char('p') | KeyCode::Char('P') => {
                                let paused = toggle_pause(state);
                                info!(paused, "pause toggled");
                            }
                            KeyCode::Char('r') | KeyCode::Char('R') if state.is_over() => {
                                return Ok(LoopExit::Restart);
                            }
                            _ => {}
                        }
                    }
                    KeyEventKind::Repeat => tracker.repeat(code),
                    KeyEventKind::Release => tracker.release(code),
                },
                Event::Mouse(MouseEvent { kind, column, row, .. }) if mouse => {
                    let view = display::Viewport::fit(&state.bounds, state.world.players.len() as u16)?;
                    tracker.pointer_moved(view.to_canvas(column, row));
                    match kind {
                        MouseEventKind::Down(MouseButton::Left) => tracker.pointer_button(true),
                        MouseEventKind::Up(MouseButton::Left) => tracker.pointer_button(false),
                        _ => {}
                    }
                }
                _ => {}
            }
        }

        // ── Sample one input snapshot per player, then tick ──────────────────
        let inputs: Vec<InputState> = (0..state.world.players.len())
            .map(|i| tracker.sample(&bindings[i.min(bindings.len() - 1)], mouse && i == 0))
            .collect();
        tracker.end_frame();

        let outcome = tick(state, &inputs, &mut TickCtx::new(&mut *rng, &mut audio));
        if outcome.is_some() {
            if let Some(summary) = RunSummary::from_state(state) {
                match record_run(store, &summary, state.config.tunables.credit_rate, &mut audio) {
                    Ok(r) => record = Some(r),
                    Err(e) => warn!(error = %e, "failed to record run"),
                }
            }
        }

        let ui = snapshot::capture(state);
        display::render(out, state, &ui, record.as_ref(), high_score)?;

        let elapsed = frame_start.elapsed();
        if elapsed < FRAME {
            thread::sleep(FRAME - elapsed);
        }
    }
}

/// Show the briefing and wait for the player. `false` means quit.
fn wait_for_deploy<W: Write>(
    out: &mut W,
    rx: &mpsc::Receiver<Event>,
    level: &LevelConfig,
    high_score: u32,
) -> Result<bool> {
    display::briefing(out, &briefing(level), high_score)?;
    loop {
        let Ok(ev) = rx.recv() else {
            return Ok(false);
        };
        if let Event::Key(KeyEvent {
            code,
            kind: KeyEventKind::Press,
            modifiers,
            ..
        }) = ev
        {
            match code {
                KeyCode::Enter | KeyCode::Char(' ') => return Ok(true),
                KeyCode::Esc => return Ok(false),
                KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => return Ok(false),
                _ => {}
            }
        }
    }
}

fn run<W: Write>(
    out: &mut W,
    rx: &mpsc::Receiver<Event>,
    config: &GameConfig,
    setup: &SessionSetup,
    store: &mut dyn KeyValueStore,
    seed: Option<u64>,
) -> Result<()> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    loop {
        let mut state = init_state(config.clone(), setup)?;
        if !wait_for_deploy(out, rx, &state.level, get_u32(store, KEY_HIGH_SCORE))? {
            break;
        }
        match game_loop(out, &mut state, rx, &mut rng, store, setup.players.first() == Some(&AimStrategy::Pointer))? {
            LoopExit::Quit => break,
            LoopExit::Restart => continue,
        }
    }
    Ok(())
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log)?;

    let mut config = match &args.config {
        Some(path) => GameConfig::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => GameConfig::default(),
    };
    config.auto_aim |= args.auto_aim;
    let mut store = JsonFileStore::open(&args.save)
        .with_context(|| format!("opening save file {}", args.save.display()))?;
    let setup = session_setup(&args, &config, &store);
    // Surface a bad level id before the terminal is taken over.
    init_state(config.clone(), &setup)?;

    let raw_out = stdout();
    let mut out = BufWriter::new(raw_out);

    terminal::enable_raw_mode()?;
    out.execute(terminal::EnterAlternateScreen)?;
    out.execute(cursor::Hide)?;
    if args.mouse {
        out.execute(EnableMouseCapture)?;
    }

    // Request key-release (and key-repeat) events from the terminal.
    // Kitty-protocol terminals support this; others fall back gracefully.
    let keyboard_enhanced = out
        .execute(PushKeyboardEnhancementFlags(
            KeyboardEnhancementFlags::REPORT_EVENT_TYPES,
        ))
        .is_ok();

    // Dedicate a thread exclusively to blocking event reads, sending them
    // through a channel so the game loop never has to block on I/O.
    let (tx, rx) = mpsc::channel::<Event>();
    thread::spawn(move || {
        while let Ok(ev) = event::read() {
            if tx.send(ev).is_err() {
                break;
            }
        }
    });

    let result = run(&mut out, &rx, &config, &setup, &mut store, args.seed);

    // Always restore the terminal
    if keyboard_enhanced {
        let _ = out.execute(PopKeyboardEnhancementFlags);
    }
    if args.mouse {
        let _ = out.execute(DisableMouseCapture);
    }
    let _ = out.execute(cursor::Show);
    let _ = out.execute(terminal::LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();

    if let Err(e) = &result {
        warn!(error = %e, "exiting with error");
    }
    result
}
