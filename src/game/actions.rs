//! Semantic action IDs for click targets. Keyboard keys map onto the same
//! handlers in `MilkGame::handle_input`.

/// Tap the cow.
pub const CLICK_COW: u16 = 1;
/// Leave the current sub-screen.
pub const BACK_TO_FARM: u16 = 2;

// Farm screen
pub const BUY_QUALITY: u16 = 10;
pub const BUY_COUNT: u16 = 11;
pub const BUY_HAPPINESS: u16 = 12;
pub const SWAP_MILK: u16 = 20;
pub const WATCH_AD: u16 = 21;
pub const GO_REFERRAL: u16 = 30;
pub const GO_WITHDRAW: u16 = 31;

// Referral screen
pub const COPY_REF_LINK: u16 = 40;

// Withdraw screen
pub const FOCUS_ADDRESS: u16 = 50;
pub const FOCUS_AMOUNT: u16 = 51;
pub const SUBMIT_WITHDRAW: u16 = 52;

// Offline earnings overlay
pub const CLAIM_OFFLINE: u16 = 60;
pub const DISMISS_OFFLINE: u16 = 61;
