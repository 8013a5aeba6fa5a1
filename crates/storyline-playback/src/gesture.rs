//! Touch input for the viewer
//!
//! Taps are split into three horizontal zones; a vertical drag past the
//! dismiss threshold closes the viewer.

use serde::{Deserialize, Serialize};

/// What a tap asks the sequencer to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TapAction {
    Retreat,
    Advance,
    /// Middle zone, or a tap on a viewport with no usable width
    None,
}

/// Map a tap at `x` on a viewport `width` wide to an action
///
/// `zone_fraction` is the share of the width on each side (a third by
/// default): left of `width * zone_fraction` retreats, right of
/// `width * (1 - zone_fraction)` advances.
pub fn classify_tap(x: f32, width: f32, zone_fraction: f32) -> TapAction {
    if !(width.is_finite() && width > 0.0) || !x.is_finite() {
        return TapAction::None;
    }
    let zone = width * zone_fraction.clamp(0.0, 0.5);
    if x < zone {
        TapAction::Retreat
    } else if x > width - zone {
        TapAction::Advance
    } else {
        TapAction::None
    }
}

/// Result of releasing a drag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GestureOutcome {
    Dismiss,
    Ignored,
}

/// Tracks one vertical drag over the viewer
#[derive(Debug, Clone)]
pub struct DismissGesture {
    threshold: f32,
    activation: f32,
    claimed: bool,
    offset: f32,
}

impl DismissGesture {
    pub fn new(threshold: f32, activation: f32) -> Self {
        Self {
            threshold,
            activation,
            claimed: false,
            offset: 0.0,
        }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Whether the current drag has moved far enough to be ours
    pub fn is_claimed(&self) -> bool {
        self.claimed
    }

    /// Downward displacement to render as a partial-dismiss preview
    pub fn offset(&self) -> f32 {
        self.offset
    }

    /// Feed the total vertical displacement so far; returns the preview offset
    pub fn update(&mut self, dy: f32) -> f32 {
        if !dy.is_finite() {
            return self.offset;
        }
        if !self.claimed && dy.abs() > self.activation {
            self.claimed = true;
        }
        if self.claimed {
            self.offset = dy.max(0.0);
        }
        self.offset
    }

    /// Finish the drag with its final vertical displacement
    ///
    /// Only a downward release strictly past the threshold dismisses.
    pub fn release(&mut self, dy: f32) -> GestureOutcome {
        self.reset();
        if dy.is_finite() && dy > self.threshold {
            GestureOutcome::Dismiss
        } else {
            GestureOutcome::Ignored
        }
    }

    pub fn reset(&mut self) {
        self.claimed = false;
        self.offset = 0.0;
    }
}
