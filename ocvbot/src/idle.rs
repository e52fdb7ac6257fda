//! Keeps the client logged in by nudging the camera now and then.

use crate::errors::BotError;
use crate::input::{ClickOptions, InputInjector, Key};
use crate::vision::Rect;
use rand::seq::SliceRandom;
use rand::Rng;
use std::ops::RangeInclusive;
use std::time::Duration;
use tracing::info;

/// Pause between nudges, in milliseconds.
pub const NUDGE_INTERVAL_MS: RangeInclusive<u64> = 180_000..=299_000;

pub struct IdleKeeper<I> {
    input: I,
    focus: Rect,
}

impl<I: InputInjector> IdleKeeper<I> {
    /// `focus` is clicked to give the client keyboard focus; pick a region
    /// where a click has no in-game effect, such as the chat pane.
    pub fn new(input: I, focus: Rect) -> Self {
        Self { input, focus }
    }

    pub fn input(&self) -> &I {
        &self.input
    }

    pub fn focus(&self) -> Result<(), BotError> {
        self.input
            .click(self.focus, &ClickOptions::default().move_away_from(self.focus))
    }

    pub fn next_delay<R: Rng + ?Sized>(rng: &mut R) -> Duration {
        Duration::from_millis(rng.gen_range(NUDGE_INTERVAL_MS))
    }

    /// Press one arrow key, chosen uniformly.
    pub fn nudge<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Key, BotError> {
        let key = *Key::ARROWS.choose(rng).unwrap_or(&Key::Left);
        info!("Hitting arrow key {:?}", key);
        self.input.key_press(key)?;
        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Recorder {
        clicks: RefCell<Vec<(Rect, ClickOptions)>>,
        keys: RefCell<Vec<Key>>,
    }

    impl InputInjector for Recorder {
        fn click(&self, target: Rect, options: &ClickOptions) -> Result<(), BotError> {
            self.clicks.borrow_mut().push((target, options.clone()));
            Ok(())
        }

        fn key_press(&self, key: Key) -> Result<(), BotError> {
            self.keys.borrow_mut().push(key);
            Ok(())
        }
    }

    #[test]
    fn test_focus_clicks_and_moves_away() {
        let region = Rect::new(0, 374, 506, 129);
        let keeper = IdleKeeper::new(Recorder::default(), region);
        keeper.focus().unwrap();

        let clicks = keeper.input().clicks.borrow();
        assert_eq!(clicks.len(), 1);
        assert_eq!(clicks[0].0, region);
        assert_eq!(clicks[0].1.away_from, Some(region));
    }

    #[test]
    fn test_nudge_presses_arrow_keys_only() {
        let mut rng = StdRng::seed_from_u64(9);
        let keeper = IdleKeeper::new(Recorder::default(), Rect::new(0, 0, 1, 1));
        for _ in 0..40 {
            let key = keeper.nudge(&mut rng).unwrap();
            assert!(Key::ARROWS.contains(&key));
        }
        let keys = keeper.input().keys.borrow();
        assert_eq!(keys.len(), 40);
        // Forty uniform draws over four keys cover more than one of them.
        assert!(keys.iter().any(|k| *k != keys[0]));
    }

    #[test]
    fn test_next_delay_bounds() {
        let mut rng = StdRng::seed_from_u64(10);
        for _ in 0..200 {
            let delay = IdleKeeper::<Recorder>::next_delay(&mut rng);
            assert!(delay >= Duration::from_secs(180));
            assert!(delay <= Duration::from_millis(299_000));
        }
    }
}
