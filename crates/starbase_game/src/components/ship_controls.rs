//! Ship controls component

use bitflags::bitflags;

bitflags! {
    /// Actions requested by the pilot of a ship
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct ActionFlags: u8 {
        /// Thrust along the ship's nose
        const THRUST_FORWARD = 1 << 0;
        /// Rotate counter-clockwise
        const ROTATE_LEFT = 1 << 1;
        /// Rotate clockwise
        const ROTATE_RIGHT = 1 << 2;
        /// Fire the primary weapon once
        const FIRE_PRIMARY = 1 << 3;
    }
}

/// Pilot input of a ship
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShipControls {
    /// Requested actions
    pub action_flags: ActionFlags,
}

impl ShipControls {
    /// Controls with the given actions requested
    pub fn new(action_flags: ActionFlags) -> Self {
        Self { action_flags }
    }
}
