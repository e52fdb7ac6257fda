//! Confirmed interactions with buttons, toggles and other interface elements
//!
//! Every action here is expressed as a pair of visual states: a "disabled"
//! needle that must be on screen before the click, and an "enabled" needle
//! that proves the click took effect. [`Interface::confirm_action`] drives
//! the element from one to the other with bounded retries.

use crate::errors::BotError;
use crate::input::{ClickOptions, InputInjector};
use crate::vision::{Needle, Rect, VisualProbe};
use tracing::{debug, info, instrument, warn};

/// Attempts before giving up on confirmation.
pub const DEFAULT_ATTEMPTS: u32 = 5;
/// Polls for the enabled needle after each click.
pub const DEFAULT_LOOP_NUM: u32 = 5;
/// Polls for the disabled needle before each click, absorbing rendering lag.
pub const DISABLED_POLLS: u32 = 2;

/// A needle and the region it is searched in.
#[derive(Debug, Clone, PartialEq)]
pub struct Target {
    pub needle: Needle,
    pub region: Rect,
}

impl Target {
    pub fn new(needle: impl Into<Needle>, region: Rect) -> Self {
        Self {
            needle: needle.into(),
            region,
        }
    }
}

/// One UI action to perform and confirm.
///
/// # Examples
///
/// Open a side stone:
///
/// ```
/// use ocvbot::{ActionConfirmation, Rect};
///
/// let side_stones = Rect::new(547, 168, 249, 366);
/// let request = ActionConfirmation::new(
///     ("needles/side-stones/attacks-deselected.png", side_stones),
///     ("needles/side-stones/attacks-selected.png", side_stones),
/// );
/// assert_eq!(request.attempts, 5);
/// ```
///
/// Close a window whose close button disappears once clicked:
///
/// ```
/// use ocvbot::{ActionConfirmation, Rect};
///
/// let game_screen = Rect::new(4, 4, 512, 340);
/// let request = ActionConfirmation::new(
///     ("needles/buttons/close.png", game_screen),
///     ("needles/buttons/close.png", game_screen),
/// )
/// .invert(true);
/// assert!(request.invert);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ActionConfirmation {
    pub disabled: Target,
    pub enabled: Target,
    /// Polls for the enabled needle after each click.
    pub loop_num: u32,
    pub attempts: u32,
    /// Success means the enabled needle is absent rather than present.
    pub invert: bool,
    pub click: ClickOptions,
}

impl ActionConfirmation {
    pub fn new(disabled: impl Into<Target>, enabled: impl Into<Target>) -> Self {
        Self {
            disabled: disabled.into(),
            enabled: enabled.into(),
            loop_num: DEFAULT_LOOP_NUM,
            attempts: DEFAULT_ATTEMPTS,
            invert: false,
            click: ClickOptions::default(),
        }
    }

    /// Confidence required of the enabled needle.
    pub fn confidence(mut self, confidence: f32) -> Self {
        self.enabled.needle = self.enabled.needle.with_confidence(confidence);
        self
    }

    pub fn loop_num(mut self, loop_num: u32) -> Self {
        self.loop_num = loop_num;
        self
    }

    pub fn attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }

    pub fn invert(mut self, invert: bool) -> Self {
        self.invert = invert;
        self
    }

    pub fn click_options(mut self, click: ClickOptions) -> Self {
        self.click = click;
        self
    }
}

impl<N: Into<Needle>> From<(N, Rect)> for Target {
    fn from((needle, region): (N, Rect)) -> Self {
        Target::new(needle, region)
    }
}

/// Performs confirmed UI actions against the client.
pub struct Interface<P, I> {
    probe: P,
    input: I,
}

impl<P: VisualProbe, I: InputInjector> Interface<P, I> {
    pub fn new(probe: P, input: I) -> Self {
        Self { probe, input }
    }

    pub fn probe(&self) -> &P {
        &self.probe
    }

    pub fn input(&self) -> &I {
        &self.input
    }

    /// Drive an element into its enabled state and confirm it.
    ///
    /// Returns immediately if the enabled state already holds, so callers may
    /// use this speculatively. Otherwise clicks the disabled needle and waits
    /// for confirmation, up to `attempts` times.
    ///
    /// # Errors
    ///
    /// - [`BotError::PreconditionMissing`] as soon as the disabled needle is
    ///   not found on some attempt. Nothing further is clicked.
    /// - [`BotError::ConfirmationTimeout`] when every attempt clicked but
    ///   none was confirmed.
    /// - Backend errors from the probe or injector, unchanged.
    #[instrument(
        skip(self, request),
        fields(
            enabled = %request.enabled.needle.template.display(),
            invert = request.invert
        )
    )]
    pub fn confirm_action(&self, request: &ActionConfirmation) -> Result<(), BotError> {
        if self.confirmed(request, 1)? {
            debug!("Already enabled");
            return Ok(());
        }

        let click = match request.click.away_from {
            Some(_) => request.click.clone(),
            None => request.click.clone().move_away_from(request.enabled.region),
        };

        for attempt in 1..=request.attempts {
            debug!(attempt, "Attempting to enable");

            let Some(found) = self.probe.probe(
                request.disabled.region,
                &request.disabled.needle,
                DISABLED_POLLS,
            )?
            else {
                warn!(
                    attempt,
                    needle = %request.disabled.needle.template.display(),
                    "Disabled needle not found"
                );
                return Err(BotError::PreconditionMissing {
                    needle: request.disabled.needle.template.clone(),
                });
            };

            self.input.click(found, &click)?;

            if self.confirmed(request, request.loop_num)? {
                info!(attempt, "Enabled");
                return Ok(());
            }
        }

        warn!(attempts = request.attempts, "Could not confirm action");
        Err(BotError::ConfirmationTimeout {
            needle: request.enabled.needle.template.clone(),
            attempts: request.attempts,
        })
    }

    /// Whether the enabled state holds, honoring `invert`.
    fn confirmed(&self, request: &ActionConfirmation, polls: u32) -> Result<bool, BotError> {
        let enabled = &request.enabled;
        if request.invert {
            self.probe
                .wait_for_vanish(enabled.region, &enabled.needle, polls)
        } else {
            Ok(self
                .probe
                .probe(enabled.region, &enabled.needle, polls)?
                .is_some())
        }
    }
}
