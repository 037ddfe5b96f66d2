//! Collision layer masks used by overlap queries.

use serde::{Deserialize, Serialize};

/// Bit set of collision layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct LayerMask(u32);

impl LayerMask {
    /// No layers.
    pub const NONE: Self = Self(0);
    /// The player layer.
    pub const PLAYER: Self = Self(1 << 0);
    /// Regular enemies.
    pub const ENEMY: Self = Self(1 << 1);
    /// Bosses and mini-bosses.
    pub const BOSS: Self = Self(1 << 2);
    /// Every layer.
    pub const ALL: Self = Self(u32::MAX);

    /// Creates a mask from raw bits.
    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Returns the raw bits.
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Checks whether every bit of `other` is set in this mask.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Checks whether the masks share any bit.
    #[must_use]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }
}

impl std::ops::BitOr for LayerMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for LayerMask {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}
