//! Synthetic pointer and keyboard input

use crate::errors::BotError;
use crate::vision::Rect;
use enigo::{Button, Coordinate, Direction, Enigo, Keyboard, Mouse, Settings};
use rand::Rng;
use std::ops::RangeInclusive;
use std::sync::Mutex;
use std::thread;
use std::time::Duration;
use tracing::{debug, instrument};

/// How far past the avoided region the pointer lands after a move-away.
const MOVE_AWAY_MARGIN: RangeInclusive<i32> = 15..=100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Left,
    Right,
    Up,
    Down,
    Enter,
    Escape,
    Space,
    Tab,
    Char(char),
}

impl Key {
    pub const ARROWS: [Key; 4] = [Key::Left, Key::Right, Key::Up, Key::Down];
}

/// Timing and pointer behavior around a single click.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClickOptions {
    /// Pause before pressing, in milliseconds, drawn uniformly.
    pub pre_delay_ms: RangeInclusive<u64>,
    /// Pause after releasing, in milliseconds, drawn uniformly.
    pub post_delay_ms: RangeInclusive<u64>,
    /// Region the pointer must leave once the click has landed.
    pub away_from: Option<Rect>,
}

impl Default for ClickOptions {
    fn default() -> Self {
        Self {
            pre_delay_ms: 0..=100,
            post_delay_ms: 0..=100,
            away_from: None,
        }
    }
}

impl ClickOptions {
    pub fn move_away_from(mut self, region: Rect) -> Self {
        self.away_from = Some(region);
        self
    }
}

/// Blocking pointer/keyboard actions against the client.
pub trait InputInjector {
    /// Left-click a random point inside `target`.
    fn click(&self, target: Rect, options: &ClickOptions) -> Result<(), BotError>;

    fn key_press(&self, key: Key) -> Result<(), BotError>;
}

/// Uniform random point inside `target`. Degenerate rectangles collapse to
/// their origin.
pub fn click_point<R: Rng + ?Sized>(target: Rect, rng: &mut R) -> (i32, i32) {
    let x = if target.width > 0 {
        rng.gen_range(target.left..target.right())
    } else {
        target.left
    };
    let y = if target.height > 0 {
        rng.gen_range(target.top..target.bottom())
    } else {
        target.top
    };
    (x, y)
}

/// A point horizontally clear of `avoid`, at a random vertical position
/// alongside it. Prefers the left side unless that would go off-screen.
pub fn move_away_point<R: Rng + ?Sized>(avoid: Rect, rng: &mut R) -> (i32, i32) {
    let margin = rng.gen_range(MOVE_AWAY_MARGIN);
    let go_left = rng.gen_bool(0.5) && avoid.left - margin >= 0;
    let x = if go_left {
        avoid.left - margin
    } else {
        avoid.right() + margin
    };
    let (_, y) = click_point(avoid, rng);
    (x, y)
}

fn sleep_in<R: Rng + ?Sized>(range: &RangeInclusive<u64>, rng: &mut R) {
    if range.is_empty() {
        return;
    }
    let ms = rng.gen_range(range.clone());
    if ms > 0 {
        thread::sleep(Duration::from_millis(ms));
    }
}

/// [`InputInjector`] driving the real pointer and keyboard through enigo.
pub struct EnigoInjector<R> {
    enigo: Mutex<Enigo>,
    rng: Mutex<R>,
}

impl<R: Rng> EnigoInjector<R> {
    pub fn new(rng: R) -> Result<Self, BotError> {
        let enigo = Enigo::new(&Settings::default())
            .map_err(|e| BotError::Input(format!("Failed to initialize enigo: {e:?}")))?;
        Ok(Self {
            enigo: Mutex::new(enigo),
            rng: Mutex::new(rng),
        })
    }

    fn move_to(enigo: &mut Enigo, (x, y): (i32, i32)) -> Result<(), BotError> {
        enigo
            .move_mouse(x, y, Coordinate::Abs)
            .map_err(|e| BotError::Input(format!("Failed to move pointer: {e:?}")))
    }
}

impl<R: Rng> InputInjector for EnigoInjector<R> {
    #[instrument(level = "debug", skip(self, options))]
    fn click(&self, target: Rect, options: &ClickOptions) -> Result<(), BotError> {
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| BotError::Input("Random source lock poisoned".to_string()))?;
        let mut enigo = self
            .enigo
            .lock()
            .map_err(|_| BotError::Input("Enigo lock poisoned".to_string()))?;

        let point = click_point(target, &mut *rng);
        Self::move_to(&mut enigo, point)?;
        sleep_in(&options.pre_delay_ms, &mut *rng);
        enigo
            .button(Button::Left, Direction::Click)
            .map_err(|e| BotError::Input(format!("Click failed: {e:?}")))?;
        debug!(x = point.0, y = point.1, "Clicked");
        sleep_in(&options.post_delay_ms, &mut *rng);

        if let Some(avoid) = options.away_from {
            Self::move_to(&mut enigo, move_away_point(avoid, &mut *rng))?;
        }
        Ok(())
    }

    #[instrument(level = "debug", skip(self))]
    fn key_press(&self, key: Key) -> Result<(), BotError> {
        let key = match key {
            Key::Left => enigo::Key::LeftArrow,
            Key::Right => enigo::Key::RightArrow,
            Key::Up => enigo::Key::UpArrow,
            Key::Down => enigo::Key::DownArrow,
            Key::Enter => enigo::Key::Return,
            Key::Escape => enigo::Key::Escape,
            Key::Space => enigo::Key::Space,
            Key::Tab => enigo::Key::Tab,
            Key::Char(c) => enigo::Key::Unicode(c),
        };
        self.enigo
            .lock()
            .map_err(|_| BotError::Input("Enigo lock poisoned".to_string()))?
            .key(key, Direction::Click)
            .map_err(|e| BotError::Input(format!("Key press failed: {e:?}")))
    }
}
