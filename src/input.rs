//! Shared input handling: normalized events, click targets, and pixel→cell
//! coordinate conversion.

use ratzilla::ratatui::layout::Rect;

/// All input events, normalized from keyboard, mouse, and touch sources.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// A printable key press.
    Key(char),
    /// Backspace (text field editing).
    Backspace,
    /// Enter (form submission).
    Enter,
    /// Tab (form field focus).
    Tab,
    /// Escape (leave the current screen).
    Escape,
    /// A click/tap on a registered target, identified by a semantic action ID.
    Click(u16),
}

/// A screen region that triggers an action when tapped.
#[derive(Debug, Clone)]
pub struct ClickTarget {
    /// Hit region in terminal cell coordinates.
    pub rect: Rect,
    /// Semantic action ID (constants in `game::actions`).
    pub action_id: u16,
}

/// Shared between the render loop (which registers targets each frame) and
/// the mouse handler (which hit-tests them).
pub struct ClickState {
    pub targets: Vec<ClickTarget>,
    pub terminal_cols: u16,
    pub terminal_rows: u16,
}

impl ClickState {
    pub fn new() -> Self {
        Self {
            targets: Vec::new(),
            terminal_cols: 0,
            terminal_rows: 0,
        }
    }

    pub fn clear_targets(&mut self) {
        self.targets.clear();
    }

    /// Register a rectangular click target.
    pub fn add_target(&mut self, rect: Rect, action_id: u16) {
        self.targets.push(ClickTarget { rect, action_id });
    }

    /// Find the action under a terminal cell, last-registered first so
    /// overlays win over what they cover.
    pub fn hit_test(&self, col: u16, row: u16) -> Option<u16> {
        self.targets
            .iter()
            .rev()
            .find(|t| {
                col >= t.rect.x
                    && col < t.rect.x + t.rect.width
                    && row >= t.rect.y
                    && row < t.rect.y + t.rect.height
            })
            .map(|t| t.action_id)
    }
}

/// Convert a pixel coordinate within the grid to a terminal cell index.
/// Returns None when outside the grid.
pub fn pixel_to_cell(pixel: f64, grid_size_px: f64, cells: u16) -> Option<u16> {
    if pixel < 0.0 || grid_size_px <= 0.0 || cells == 0 {
        return None;
    }
    let cell = (pixel / grid_size_px * cells as f64) as u16;
    if cell < cells {
        Some(cell)
    } else {
        None
    }
}
