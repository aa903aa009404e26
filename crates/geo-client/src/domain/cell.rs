//! Hierarchical cell identifiers.
//!
//! A `CellId` packs a cube-face number and a path of quadtree child positions
//! into one `u64`:
//!
//! ```text
//!  63   61 60 59 58 57          2k+1 2k ...   0
//! ┌──────┬─────┬─────┬─────┬─────┬──┬────────┐
//! │ face │ d1  │ d2  │ ... │ dL  │1 │ 0 ... 0│
//! └──────┴─────┴─────┴─────┴─────┴──┴────────┘
//!  3 bits  2 bits per level        marker
//! ```
//!
//! The marker bit sits immediately below the last digit, so the level can be
//! recovered from the number of trailing zeros.

use std::fmt;

/// Deepest subdivision level.
pub const MAX_LEVEL: u8 = 30;

/// Number of root faces.
pub const NUM_FACES: u8 = 6;

/// Bits below the face field.
const POS_BITS: u32 = 2 * MAX_LEVEL as u32 + 1;

/// Hex digits in a full-width token.
const TOKEN_WIDTH: usize = 16;

/// Opaque hierarchical cell handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct CellId(u64);

impl CellId {
    /// Wrap a raw 64-bit identifier without validation.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw 64-bit identifier.
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Build a cell from a face and child positions (each 0-3).
    ///
    /// Returns `None` for a face outside 0-5, a digit outside 0-3 or more than
    /// `MAX_LEVEL` digits.
    pub fn from_face_digits(face: u8, digits: &[u8]) -> Option<Self> {
        if face >= NUM_FACES || digits.len() > usize::from(MAX_LEVEL) {
            return None;
        }

        let mut raw = u64::from(face) << POS_BITS;
        let mut shift = POS_BITS;
        for &digit in digits {
            if digit > 3 {
                return None;
            }
            shift -= 2;
            raw |= u64::from(digit) << shift;
        }
        raw |= 1u64 << (shift - 1);

        Some(Self(raw))
    }

    /// Root face (0-5).
    pub fn face(self) -> u8 {
        (self.0 >> POS_BITS) as u8
    }

    /// Lowest set bit (the level marker).
    pub fn lsb(self) -> u64 {
        self.0 & self.0.wrapping_neg()
    }

    /// Subdivision level (0 = whole face, 30 = leaf).
    pub fn level(self) -> u8 {
        MAX_LEVEL.saturating_sub((self.0.trailing_zeros() / 2) as u8)
    }

    /// Whether the face is in range and the marker sits on a level boundary.
    pub fn is_valid(self) -> bool {
        self.face() < NUM_FACES && (self.lsb() & 0x1555_5555_5555_5555) != 0
    }

    /// Whether this is a leaf (level 30) cell.
    pub fn is_leaf(self) -> bool {
        self.0 & 1 != 0
    }

    /// Child position (0-3) taken at `level` (1..=level()).
    pub fn child_position(self, level: u8) -> u8 {
        ((self.0 >> (2 * u32::from(MAX_LEVEL - level) + 1)) & 3) as u8
    }

    /// Child positions from level 1 down to this cell's level.
    pub fn digits(self) -> Vec<u8> {
        (1..=self.level()).map(|l| self.child_position(l)).collect()
    }

    /// Ancestor at a coarser level (clamped to this cell's own level).
    #[must_use]
    pub fn parent(self, level: u8) -> Self {
        let level = level.min(self.level());
        let lsb = 1u64 << (2 * u32::from(MAX_LEVEL - level));
        Self((self.0 & lsb.wrapping_neg()) | lsb)
    }

    /// Whether `other` lies inside this cell (or is this cell).
    pub fn contains(self, other: CellId) -> bool {
        if !self.is_valid() {
            return false;
        }
        let lsb = self.lsb();
        let lo = self.0 - (lsb - 1);
        let hi = self.0 + (lsb - 1);
        (lo..=hi).contains(&other.0)
    }

    /// Canonical compact token: hex with trailing zero nibbles removed.
    pub fn to_token(self) -> String {
        if self.0 == 0 {
            return "X".to_owned();
        }
        let hex = format!("{:0width$x}", self.0, width = TOKEN_WIDTH);
        hex.trim_end_matches('0').to_owned()
    }

    /// Parse a compact token produced by [`CellId::to_token`].
    pub fn from_token(token: &str) -> Option<Self> {
        if token == "X" {
            return Some(Self(0));
        }
        if token.is_empty() || token.len() > TOKEN_WIDTH {
            return None;
        }
        let value = u64::from_str_radix(token, 16).ok()?;
        Some(Self(value << (4 * (TOKEN_WIDTH - token.len()))))
    }
}

impl From<u64> for CellId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

/// `face/digits` rendering, e.g. `0/1132231002223`.
impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.is_valid() {
            return write!(f, "Invalid: {:016x}", self.0);
        }
        write!(f, "{}/", self.face())?;
        for digit in self.digits() {
            write!(f, "{digit}")?;
        }
        Ok(())
    }
}
