//! Velocity components and Reynolds-stress pairs shared by every module.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of velocity components (u, v, w).
pub const N_COMP: usize = 3;

/// One of the three velocity components.
///
/// `U` is streamwise, `V` lateral (along y), `W` vertical (along z).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Component {
    U,
    V,
    W,
}

impl Component {
    /// All components in array order.
    pub const ALL: [Component; N_COMP] = [Component::U, Component::V, Component::W];

    /// Index of this component in `[comp, ...]` arrays.
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Component::U => 0,
            Component::V => 1,
            Component::W => 2,
        }
    }

    /// Component for an array index, if in range.
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Component::U),
            1 => Some(Component::V),
            2 => Some(Component::W),
            _ => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Component::U => "u",
            Component::V => "v",
            Component::W => "w",
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A pair of velocity components whose covariance is a Reynolds stress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StressPair {
    /// u'v'
    UV,
    /// u'w'
    UW,
    /// v'w'
    VW,
}

impl StressPair {
    /// All pairs in array order (u'v', u'w', v'w').
    pub const ALL: [StressPair; 3] = [StressPair::UV, StressPair::UW, StressPair::VW];

    #[inline]
    pub const fn index(self) -> usize {
        match self {
            StressPair::UV => 0,
            StressPair::UW => 1,
            StressPair::VW => 2,
        }
    }

    /// The two components of this pair, in (a, b) order.
    pub const fn components(self) -> (Component, Component) {
        match self {
            StressPair::UV => (Component::U, Component::V),
            StressPair::UW => (Component::U, Component::W),
            StressPair::VW => (Component::V, Component::W),
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            StressPair::UV => "u'v'",
            StressPair::UW => "u'w'",
            StressPair::VW => "v'w'",
        }
    }
}

impl fmt::Display for StressPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
