//! Per-tick navigation frames.
//!
//! An [`InputFrame`] is the only thing the rest of an application sees from
//! padnav: eight booleans, each set on the tick where its logical input went
//! from released to pressed.
//!
//! ## Value conventions
//! - Every field is an **edge**, never a level. Holding a button yields `true`
//!   once and `false` on every following tick until it is released and pressed again.
//! - Direction fields merge all directional sources of a backend (d-pad, hat,
//!   stick) with a logical OR. Pushing the d-pad and the stick together in the same
//!   tick produces one edge.
//! - A frame depends on two raw snapshots only: the current one and the one
//!   from the previous tick.

use serde::{Deserialize, Serialize};

/// Edge-triggered navigation input for one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InputFrame {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
    pub a: bool,
    pub b: bool,
    pub start: bool,
    pub back: bool,
}

impl InputFrame {
    /// The all-false frame returned whenever no controller is connected.
    pub const EMPTY: InputFrame = InputFrame {
        left: false,
        right: false,
        up: false,
        down: false,
        a: false,
        b: false,
        start: false,
        back: false,
    };

    /// `true` when no field fired this tick.
    #[inline]
    pub fn is_empty(&self) -> bool {
        *self == Self::EMPTY
    }

    /// `true` when any of the four direction fields fired.
    #[inline]
    pub fn any_direction(&self) -> bool {
        self.left || self.right || self.up || self.down
    }

    /// Names of the fields that fired, in declaration order.
    ///
    /// Handy for logging: `frame.pressed().join("+")`.
    pub fn pressed(&self) -> Vec<&'static str> {
        [
            (self.left, "left"),
            (self.right, "right"),
            (self.up, "up"),
            (self.down, "down"),
            (self.a, "a"),
            (self.b, "b"),
            (self.start, "start"),
            (self.back, "back"),
        ]
        .into_iter()
        .filter_map(|(on, name)| on.then_some(name))
        .collect()
    }
}

/// Rising-edge test shared by every backend: active now, not active before.
///
/// `prev` is `None` when there is no previous snapshot (first tick after
/// connecting), which counts as "not active".
#[inline]
pub(crate) fn rising(now: bool, prev: Option<bool>) -> bool {
    now && !prev.unwrap_or(false)
}

/// Per-direction activity of one directional source (d-pad, hat, or stick).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Directions {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
}

impl Directions {
    /// Edges of `now` against `prev`, applied independently to each direction.
    pub fn edges(now: Directions, prev: Option<Directions>) -> Directions {
        Directions {
            left: rising(now.left, prev.map(|p| p.left)),
            right: rising(now.right, prev.map(|p| p.right)),
            up: rising(now.up, prev.map(|p| p.up)),
            down: rising(now.down, prev.map(|p| p.down)),
        }
    }

    /// Logical OR of two edge sets.
    pub fn or(self, other: Directions) -> Directions {
        Directions {
            left: self.left || other.left,
            right: self.right || other.right,
            up: self.up || other.up,
            down: self.down || other.down,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_empty() {
        assert!(InputFrame::default().is_empty());
        assert_eq!(InputFrame::default(), InputFrame::EMPTY);
    }

    #[test]
    fn pressed_lists_fields_in_order() {
        let f = InputFrame {
            down: true,
            a: true,
            back: true,
            ..InputFrame::EMPTY
        };
        assert_eq!(f.pressed(), vec!["down", "a", "back"]);
        assert!(f.any_direction());
        assert!(!f.is_empty());
    }

    #[test]
    fn rising_needs_a_release_first() {
        assert!(rising(true, None));
        assert!(rising(true, Some(false)));
        assert!(!rising(true, Some(true)));
        assert!(!rising(false, Some(false)));
        assert!(!rising(false, None));
    }

    #[test]
    fn or_of_two_edges_is_one_edge() {
        let dpad = Directions {
            left: true,
            ..Default::default()
        };
        let stick = Directions {
            left: true,
            up: true,
            ..Default::default()
        };
        let merged = dpad.or(stick);
        assert!(merged.left);
        assert!(merged.up);
        assert!(!merged.right);
    }
}
