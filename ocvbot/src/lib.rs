//! Screen-driven automation of an uncooperative game client
//!
//! The client is observed only through its pixels and driven only through
//! synthetic input. Two pieces reason about that uncertainty:
//!
//! - [`Interface::confirm_action`] turns "click this and look for that" into
//!   a confirmed, bounded-retry UI action.
//! - [`build_schedule`] and [`SessionState`] decide when a work session ends,
//!   from configured duration and session-count bounds.

pub mod config;
pub mod errors;
pub mod idle;
pub mod input;
pub mod interface;
pub mod regions;
pub mod session;
pub mod vision;

pub use config::{BotConfig, MainConfig};
pub use errors::BotError;
pub use idle::IdleKeeper;
pub use input::{ClickOptions, EnigoInjector, InputInjector, Key};
pub use interface::{ActionConfirmation, Interface, Target};
pub use regions::ClientLayout;
pub use session::{
    build_schedule, Checkpoint, CheckpointDecision, Schedule, SessionConfig, SessionEnd,
    SessionState,
};
pub use vision::{
    MonitorSource, Needle, Rect, ScreenProbe, ScreenSource, TemplateMatcher, VisualProbe,
};
