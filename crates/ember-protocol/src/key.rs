//! Packed key codes.
//!
//! A keystroke travels as a single integer combining a Unicode codepoint
//! with modifier bits. Codepoints occupy the low 21 bits; the control, meta,
//! and compound-prefix (`C-x`) modifiers sit above bit 27, so the two ranges
//! never overlap. Keys are their own type so command marshalling can tell a
//! keystroke apart from a numeric argument.

use std::fmt;

/// A keystroke: a base character plus modifier bits, packed into one code.
///
/// Modified keys store their base character upper-cased, matching the host's
/// convention (`C-m` and `C-M` are the same key).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Key(u32);

impl Key {
    /// Control modifier bit.
    pub const CTRL: u32 = 0x1000_0000;
    /// Meta modifier bit.
    pub const META: u32 = 0x2000_0000;
    /// Compound-prefix (`C-x`) modifier bit.
    pub const CTLX: u32 = 0x4000_0000;
    /// Mask covering every valid codepoint (21 bits).
    pub const CHAR_MASK: u32 = 0x0010_FFFF;

    /// The host's "random key" sentinel, meaning no key was supplied.
    pub const RANDOM: Self = Self(0x80);

    const MODIFIER_MASK: u32 = Self::CTRL | Self::META | Self::CTLX;

    fn compose(character: char, modifiers: u32) -> Self {
        if modifiers == 0 {
            return Self(character as u32);
        }
        let upper = character.to_uppercase().next().unwrap_or(character);
        Self(upper as u32 | modifiers)
    }

    /// An unmodified key.
    #[must_use]
    pub fn plain(character: char) -> Self {
        Self::compose(character, 0)
    }

    /// A control-modified key.
    #[must_use]
    pub fn ctrl(character: char) -> Self {
        Self::compose(character, Self::CTRL)
    }

    /// A meta-modified key.
    #[must_use]
    pub fn meta(character: char) -> Self {
        Self::compose(character, Self::META)
    }

    /// A key behind the compound `C-x` prefix.
    #[must_use]
    pub fn ctlx(character: char) -> Self {
        Self::compose(character, Self::CTLX)
    }

    /// A meta-and-control-modified key.
    #[must_use]
    pub fn meta_ctrl(character: char) -> Self {
        Self::compose(character, Self::META | Self::CTRL)
    }

    /// A control-modified key behind the compound `C-x` prefix.
    #[must_use]
    pub fn ctlx_ctrl(character: char) -> Self {
        Self::compose(character, Self::CTLX | Self::CTRL)
    }

    /// Reconstructs a key from its wire code.
    ///
    /// Returns `None` if the code carries bits outside the codepoint and
    /// modifier ranges, or if the codepoint is not a valid character.
    #[must_use]
    pub fn from_code(code: i64) -> Option<Self> {
        let bits = u32::try_from(code).ok()?;
        let modifiers = bits & Self::MODIFIER_MASK;
        let codepoint = bits & Self::CHAR_MASK;
        if bits != modifiers | codepoint {
            return None;
        }
        char::from_u32(codepoint)?;
        Some(Self(bits))
    }

    /// Returns the wire code.
    #[must_use]
    pub const fn code(self) -> i64 {
        self.0 as i64
    }

    /// Returns the base character, without modifier bits.
    #[must_use]
    pub fn character(self) -> char {
        char::from_u32(self.0 & Self::CHAR_MASK).unwrap_or(char::REPLACEMENT_CHARACTER)
    }

    /// Whether the control modifier is set.
    #[must_use]
    pub const fn is_ctrl(self) -> bool {
        self.0 & Self::CTRL != 0
    }

    /// Whether the meta modifier is set.
    #[must_use]
    pub const fn is_meta(self) -> bool {
        self.0 & Self::META != 0
    }

    /// Whether the compound-prefix modifier is set.
    #[must_use]
    pub const fn is_ctlx(self) -> bool {
        self.0 & Self::CTLX != 0
    }

    /// Whether no modifier is set.
    #[must_use]
    pub const fn is_normal(self) -> bool {
        self.0 & Self::MODIFIER_MASK == 0
    }
}

impl fmt::Display for Key {
    /// Renders the key in the host's notation: `C-X ` for the compound
    /// prefix, then `M-`, then `C-`, then the base character (upper-cased
    /// when any modifier is present).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_ctlx() {
            write!(f, "C-X ")?;
        }
        if self.is_meta() {
            write!(f, "M-")?;
        }
        if self.is_ctrl() {
            write!(f, "C-")?;
        }
        if self.is_normal() {
            write!(f, "{}", self.character())
        } else {
            let upper = self.character().to_uppercase().next();
            write!(f, "{}", upper.unwrap_or(char::REPLACEMENT_CHARACTER))
        }
    }
}
