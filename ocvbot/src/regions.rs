//! Geometry of the fixed-size game client, in pixels

use crate::vision::Rect;

/// The entire client.
pub const CLIENT_WIDTH: u32 = 765;
pub const CLIENT_HEIGHT: u32 = 503;

/// The player's inventory.
pub const INV_WIDTH: u32 = 186;
pub const INV_HEIGHT: u32 = 262;
pub const INV_HALF_WIDTH: u32 = INV_WIDTH / 2 + 5;
pub const INV_HALF_HEIGHT: u32 = INV_HEIGHT / 2;

/// The bank window, minus tabs and surrounding chrome.
pub const BANK_ITEMS_WINDOW_WIDTH: u32 = 375;
pub const BANK_ITEMS_WINDOW_HEIGHT: u32 = 215;

/// The inventory plus the top and bottom rows of side stones.
pub const SIDE_STONES_WIDTH: u32 = 249;
pub const SIDE_STONES_HEIGHT: u32 = 366;

/// The view of the game world.
pub const GAME_SCREEN_WIDTH: u32 = 512;
pub const GAME_SCREEN_HEIGHT: u32 = 340;

/// The bottom chat pane.
pub const CHAT_MENU_WIDTH: u32 = 506;
pub const CHAT_MENU_HEIGHT: u32 = 129;

/// The most recent line of chat history.
pub const CHAT_MENU_RECENT_WIDTH: u32 = 490;
pub const CHAT_MENU_RECENT_HEIGHT: u32 = 17;

/// "Login" and "Password" fields on the login screen.
pub const LOGIN_FIELD_WIDTH: u32 = 258;
pub const LOGIN_FIELD_HEIGHT: u32 = 12;

pub const MINIMAP_WIDTH: u32 = 146;
pub const MINIMAP_HEIGHT: u32 = 151;

/// Largest player-centered area of the minimap usable for locating the player.
pub const MINIMAP_SLICE_WIDTH: u32 = 85;
pub const MINIMAP_SLICE_HEIGHT: u32 = 85;

/// Regions derived from where the client sits on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientLayout {
    pub origin: (i32, i32),
}

impl ClientLayout {
    pub fn new(left: i32, top: i32) -> Self {
        Self { origin: (left, top) }
    }

    pub fn client(&self) -> Rect {
        Rect::new(self.origin.0, self.origin.1, CLIENT_WIDTH, CLIENT_HEIGHT)
    }

    /// The chat pane, anchored to the client's bottom-left corner.
    pub fn chat_menu(&self) -> Rect {
        Rect::new(
            self.origin.0,
            self.origin.1 + (CLIENT_HEIGHT - CHAT_MENU_HEIGHT) as i32,
            CHAT_MENU_WIDTH,
            CHAT_MENU_HEIGHT,
        )
    }
}
