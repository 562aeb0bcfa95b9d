#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

use std::io::{self, Stdout, Write};
use std::thread;
use std::time::Duration;

use anyhow::Result;
use crossterm::cursor::{Hide, MoveTo, MoveToNextLine, Show};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::style::Print;
use crossterm::terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{ExecutableCommand, QueueableCommand};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::cavern::{Cavern, CavernError};

mod cavern;

const DEFAULT_WIDTH: i32 = 96;
const DEFAULT_HEIGHT: i32 = 54;
const DEFAULT_TICK_MS: u64 = 10;

#[derive(Copy, Clone)]
enum View {
    Map,
    Weights,
}

fn main() -> Result<()> {
    env_logger::init();

    let (width, height, tick_ms, seed) = read_settings();
    if let Some(seed) = seed {
        log::info!("using fixed seed {seed}");
    }
    let rng = seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
    let mut cavern = Cavern::new(width, height, rng)?;
    log::info!("digging a {width}x{height} cavern, one square every {tick_ms}ms");

    let mut stdout = io::stdout();
    terminal::enable_raw_mode()?;
    stdout.execute(EnterAlternateScreen)?;
    stdout.execute(Hide)?;

    let result = run(&mut stdout, &mut cavern, Duration::from_millis(tick_ms));

    stdout.execute(Show)?;
    stdout.execute(LeaveAlternateScreen)?;
    terminal::disable_raw_mode()?;

    log::info!("finished with {} squares dug", cavern.dug_squares());
    result
}

fn run(stdout: &mut Stdout, cavern: &mut Cavern<StdRng>, tick: Duration) -> Result<()> {
    let mut view = View::Map;

    loop {
        draw(stdout, cavern, view)?;

        match cavern.dig_next_square() {
            Ok(()) => {}
            Err(CavernError::Exhausted) => break,
            Err(err) => return Err(err.into()),
        }

        if handle_keys(&mut view)? {
            return Ok(());
        }
        thread::sleep(tick);
    }

    // Fully dug: keep the finished cavern on screen until a key is pressed.
    draw(stdout, cavern, view)?;
    stdout.queue(Print("fully dug - press any key"))?;
    stdout.flush()?;
    event::read()?;
    Ok(())
}

fn draw(stdout: &mut Stdout, cavern: &Cavern<StdRng>, view: View) -> Result<()> {
    let rendered = match view {
        View::Map => cavern.render_map(),
        View::Weights => cavern.render_weights(),
    };
    stdout.queue(Clear(ClearType::All))?;
    stdout.queue(MoveTo(0, 0))?;
    for line in rendered.lines() {
        stdout.queue(Print(line))?;
        stdout.queue(MoveToNextLine(1))?;
    }
    stdout.flush()?;
    Ok(())
}

/// Drains pending input. Returns `true` when the user asked to quit.
fn handle_keys(view: &mut View) -> Result<bool> {
    while event::poll(Duration::from_millis(0))? {
        if let Event::Key(key) = event::read()? {
            if !matches!(key.kind, KeyEventKind::Press | KeyEventKind::Repeat) {
                continue;
            }
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(true),
                KeyCode::Char('w') => {
                    *view = match *view {
                        View::Map => View::Weights,
                        View::Weights => View::Map,
                    };
                }
                _ => {}
            }
        }
    }
    Ok(false)
}

fn read_settings() -> (i32, i32, u64, Option<u64>) {
    let width = std::env::var("CAVERN_WIDTH")
        .ok()
        .and_then(|v| v.parse::<i32>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(DEFAULT_WIDTH);
    let height = std::env::var("CAVERN_HEIGHT")
        .ok()
        .and_then(|v| v.parse::<i32>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(DEFAULT_HEIGHT);
    let tick_ms = std::env::var("CAVERN_TICK_MS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(DEFAULT_TICK_MS);
    let seed = std::env::var("CAVERN_SEED")
        .ok()
        .and_then(|v| v.parse::<u64>().ok());
    (width, height, tick_ms, seed)
}
