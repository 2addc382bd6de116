//! Strongly-typed identifiers.

use std::fmt;

/// Identifies the physical edge a transfer travels along.
///
/// Link ids are supplied by the mesh collaborator and handed to the loss
/// function untouched. The engine never does arithmetic on them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LinkId(pub usize);

impl LinkId {
    /// Conventional id for self-loops and unused receiver slots.
    pub const NONE: LinkId = LinkId(usize::MAX);

    /// Returns `true` unless this is [`LinkId::NONE`].
    pub fn is_some(self) -> bool {
        self != Self::NONE
    }
}

impl fmt::Display for LinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::NONE {
            write!(f, "none")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

impl From<usize> for LinkId {
    fn from(v: usize) -> Self {
        Self(v)
    }
}
