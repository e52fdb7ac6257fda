//! Screen regions, needles, and the visual probe seam
//!
//! A probe answers one question: does a needle (a template image) appear
//! inside a region of the screen with at least the needle's confidence,
//! within a bounded number of polls? Template scoring itself is delegated
//! to a [`TemplateMatcher`]; this module only owns capture, polling and
//! coordinate bookkeeping.

use crate::errors::BotError;
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use tracing::{debug, instrument};

/// Confidence used when a needle does not specify one.
pub const DEFAULT_CONFIDENCE: f32 = 0.95;

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Rectangular area of the screen, in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(left: i32, top: i32, width: u32, height: u32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Exclusive right edge.
    pub fn right(&self) -> i32 {
        self.left + self.width as i32
    }

    /// Exclusive bottom edge.
    pub fn bottom(&self) -> i32 {
        self.top + self.height as i32
    }

    pub fn center(&self) -> (i32, i32) {
        (
            self.left + (self.width / 2) as i32,
            self.top + (self.height / 2) as i32,
        )
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.left && x < self.right() && y >= self.top && y < self.bottom()
    }

    pub fn offset(&self, dx: i32, dy: i32) -> Self {
        Self::new(self.left + dx, self.top + dy, self.width, self.height)
    }
}

/// A template image to search for, with the minimum match confidence.
#[derive(Debug, Clone, PartialEq)]
pub struct Needle {
    pub template: PathBuf,
    pub confidence: f32,
}

impl Needle {
    pub fn new(template: impl Into<PathBuf>) -> Self {
        Self {
            template: template.into(),
            confidence: DEFAULT_CONFIDENCE,
        }
    }

    /// Override the match confidence. Values are clamped to `0.0..=1.0`.
    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
        self
    }
}

impl From<&str> for Needle {
    fn from(path: &str) -> Self {
        Needle::new(path)
    }
}

impl From<PathBuf> for Needle {
    fn from(path: PathBuf) -> Self {
        Needle::new(path)
    }
}

/// Blocking visual query against the client's screen output.
pub trait VisualProbe: Send + Sync {
    /// Look for `needle` inside `region`, polling up to `max_polls` times.
    ///
    /// Returns the screen rectangle covered by the match, or `None` if the
    /// needle never appeared.
    fn probe(
        &self,
        region: Rect,
        needle: &Needle,
        max_polls: u32,
    ) -> Result<Option<Rect>, BotError>;

    /// Poll single-shot until `needle` is absent from `region`, up to
    /// `max_polls` times. Returns `true` as soon as a poll misses.
    fn wait_for_vanish(
        &self,
        region: Rect,
        needle: &Needle,
        max_polls: u32,
    ) -> Result<bool, BotError> {
        for _ in 0..max_polls {
            if self.probe(region, needle, 1)?.is_none() {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

/// Supplies pixels for a screen region.
pub trait ScreenSource: Send + Sync {
    fn capture(&self, region: Rect) -> Result<RgbaImage, BotError>;
}

/// Template scoring, owned by the matcher implementation.
pub trait TemplateMatcher: Send + Sync {
    /// Top-left offset, relative to `haystack`, of a match of `needle` that
    /// scores at least `confidence`.
    fn locate(&self, haystack: &RgbaImage, needle: &RgbaImage, confidence: f32)
        -> Option<(u32, u32)>;
}

/// Captures from whichever physical monitor contains the region's origin.
#[derive(Debug, Default, Clone, Copy)]
pub struct MonitorSource;

impl ScreenSource for MonitorSource {
    fn capture(&self, region: Rect) -> Result<RgbaImage, BotError> {
        let monitors = xcap::Monitor::all()
            .map_err(|e| BotError::Capture(format!("Failed to enumerate monitors: {e}")))?;

        for mon in monitors.iter() {
            let mon_x = mon
                .x()
                .map_err(|e| BotError::Capture(format!("Failed to get monitor x: {e}")))?;
            let mon_y = mon
                .y()
                .map_err(|e| BotError::Capture(format!("Failed to get monitor y: {e}")))?;
            let mon_w = mon
                .width()
                .map_err(|e| BotError::Capture(format!("Failed to get monitor width: {e}")))?;
            let mon_h = mon
                .height()
                .map_err(|e| BotError::Capture(format!("Failed to get monitor height: {e}")))?;

            let bounds = Rect::new(mon_x, mon_y, mon_w, mon_h);
            if !bounds.contains(region.left, region.top) {
                continue;
            }

            let image = mon
                .capture_image()
                .map_err(|e| BotError::Capture(format!("Failed to capture screen: {e}")))?;

            // Clip to the monitor; a region hanging off the edge is truncated.
            let x = (region.left - mon_x) as u32;
            let y = (region.top - mon_y) as u32;
            let width = region.width.min(image.width().saturating_sub(x));
            let height = region.height.min(image.height().saturating_sub(y));
            return Ok(image::imageops::crop_imm(&image, x, y, width, height).to_image());
        }

        Err(BotError::Capture(format!(
            "No monitor contains region origin ({}, {})",
            region.left, region.top
        )))
    }
}

/// A [`VisualProbe`] built from a screen source and a template matcher.
pub struct ScreenProbe<S, M> {
    source: S,
    matcher: M,
    poll_interval: Duration,
    templates: Mutex<HashMap<PathBuf, Arc<RgbaImage>>>,
}

impl<M: TemplateMatcher> ScreenProbe<MonitorSource, M> {
    /// Probe the physical monitors with the given matcher.
    pub fn on_monitors(matcher: M) -> Self {
        Self::new(MonitorSource, matcher)
    }
}

impl<S: ScreenSource, M: TemplateMatcher> ScreenProbe<S, M> {
    pub fn new(source: S, matcher: M) -> Self {
        Self {
            source,
            matcher,
            poll_interval: DEFAULT_POLL_INTERVAL,
            templates: Mutex::new(HashMap::new()),
        }
    }

    /// Pause between consecutive polls of the same query.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    fn template(&self, path: &Path) -> Result<Arc<RgbaImage>, BotError> {
        let mut cache = self
            .templates
            .lock()
            .map_err(|_| BotError::Capture("Template cache lock poisoned".to_string()))?;
        if let Some(template) = cache.get(path) {
            return Ok(template.clone());
        }

        let template = image::open(path)
            .map_err(|e| {
                BotError::Capture(format!("Failed to load needle {}: {e}", path.display()))
            })?
            .to_rgba8();
        let template = Arc::new(template);
        cache.insert(path.to_path_buf(), template.clone());
        Ok(template)
    }

    fn poll_once(
        &self,
        region: Rect,
        needle: &Needle,
        template: &RgbaImage,
    ) -> Result<Option<Rect>, BotError> {
        let haystack = self.source.capture(region)?;
        Ok(self
            .matcher
            .locate(&haystack, template, needle.confidence)
            .map(|(x, y)| {
                Rect::new(
                    region.left + x as i32,
                    region.top + y as i32,
                    template.width(),
                    template.height(),
                )
            }))
    }
}

impl<S: ScreenSource, M: TemplateMatcher> VisualProbe for ScreenProbe<S, M> {
    #[instrument(level = "debug", skip(self, needle), fields(needle = %needle.template.display()))]
    fn probe(
        &self,
        region: Rect,
        needle: &Needle,
        max_polls: u32,
    ) -> Result<Option<Rect>, BotError> {
        let template = self.template(&needle.template)?;
        // A query always looks at least once.
        for poll in 0..max_polls.max(1) {
            if poll > 0 {
                thread::sleep(self.poll_interval);
            }
            if let Some(found) = self.poll_once(region, needle, &template)? {
                debug!(poll, ?found, "Needle found");
                return Ok(Some(found));
            }
        }
        Ok(None)
    }

    fn wait_for_vanish(
        &self,
        region: Rect,
        needle: &Needle,
        max_polls: u32,
    ) -> Result<bool, BotError> {
        let template = self.template(&needle.template)?;
        for poll in 0..max_polls {
            if poll > 0 {
                thread::sleep(self.poll_interval);
            }
            if self.poll_once(region, needle, &template)?.is_none() {
                debug!(poll, "Needle vanished");
                return Ok(true);
            }
        }
        Ok(false)
    }
}
