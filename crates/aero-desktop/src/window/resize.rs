//! Resize handle direction masks.

/// 4-bit direction mask carried by each of the eight resize handles.
///
/// Edges set one bit, corners set two. During a resize drag each set bit
/// adjusts its axis, clamped independently to the window's minimum size.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ResizeMask(u8);

impl ResizeMask {
    /// Top edge follows the cursor (adjusts y and height).
    pub const TOP: ResizeMask = ResizeMask(1);
    /// Left edge follows the cursor (adjusts x and width).
    pub const LEFT: ResizeMask = ResizeMask(1 << 1);
    /// Bottom edge follows the cursor (adjusts height).
    pub const BOTTOM: ResizeMask = ResizeMask(1 << 2);
    /// Right edge follows the cursor (adjusts width).
    pub const RIGHT: ResizeMask = ResizeMask(1 << 3);

    /// Top-left corner.
    pub const NW: ResizeMask = ResizeMask(Self::TOP.0 | Self::LEFT.0);
    /// Top-right corner.
    pub const NE: ResizeMask = ResizeMask(Self::TOP.0 | Self::RIGHT.0);
    /// Bottom-left corner.
    pub const SW: ResizeMask = ResizeMask(Self::BOTTOM.0 | Self::LEFT.0);
    /// Bottom-right corner.
    pub const SE: ResizeMask = ResizeMask(Self::BOTTOM.0 | Self::RIGHT.0);

    /// Build from raw bits, masking off anything beyond the low 4.
    pub const fn from_bits(bits: u8) -> Self {
        ResizeMask(bits & 0b1111)
    }

    /// Raw bit value.
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Combine two masks.
    pub const fn union(self, other: ResizeMask) -> Self {
        ResizeMask(self.0 | other.0)
    }

    /// Whether the mask is empty (no handle grabbed).
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn has_top(self) -> bool {
        self.0 & Self::TOP.0 != 0
    }

    #[inline]
    pub const fn has_left(self) -> bool {
        self.0 & Self::LEFT.0 != 0
    }

    #[inline]
    pub const fn has_bottom(self) -> bool {
        self.0 & Self::BOTTOM.0 != 0
    }

    #[inline]
    pub const fn has_right(self) -> bool {
        self.0 & Self::RIGHT.0 != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corner_masks_combine_edges() {
        assert!(ResizeMask::SE.has_bottom());
        assert!(ResizeMask::SE.has_right());
        assert!(!ResizeMask::SE.has_top());
        assert!(!ResizeMask::SE.has_left());

        assert_eq!(ResizeMask::TOP.union(ResizeMask::LEFT), ResizeMask::NW);
    }

    #[test]
    fn test_from_bits_masks_high_bits() {
        let m = ResizeMask::from_bits(0b1111_0101);
        assert_eq!(m.bits(), 0b0101);
        assert!(m.has_top());
        assert!(m.has_bottom());
    }

    #[test]
    fn test_empty() {
        assert!(ResizeMask::default().is_empty());
        assert!(!ResizeMask::TOP.is_empty());
    }
}
