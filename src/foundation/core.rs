use serde::{Deserialize, Serialize};

/// Width/height pair in pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Size {
    /// Horizontal extent.
    pub width: u32,
    /// Vertical extent.
    pub height: u32,
}

impl Size {
    /// Create a size.
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Return the size with width and height exchanged.
    pub const fn swapped(self) -> Self {
        Self {
            width: self.height,
            height: self.width,
        }
    }

    /// Pixel count, widened to avoid overflow.
    pub const fn area(self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Return `true` when either extent is zero.
    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Axis-aligned integer rectangle: position plus size.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge.
    pub x: u32,
    /// Top edge.
    pub y: u32,
    /// Extent.
    pub size: Size,
}

impl Rect {
    /// Create a rectangle from position and extent.
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            size: Size::new(width, height),
        }
    }

    /// Rectangle at the origin covering `size`.
    pub const fn from_size(size: Size) -> Self {
        Self { x: 0, y: 0, size }
    }

    /// Exclusive right edge.
    pub const fn right(self) -> u32 {
        self.x.saturating_add(self.size.width)
    }

    /// Exclusive bottom edge.
    pub const fn bottom(self) -> u32 {
        self.y.saturating_add(self.size.height)
    }

    /// Return `true` when the rectangle covers no pixels.
    pub const fn is_empty(self) -> bool {
        self.size.is_empty()
    }

    /// Return `true` when the rectangle lies entirely within `bounds` anchored at the origin.
    pub const fn fits_in(self, bounds: Size) -> bool {
        self.right() <= bounds.width && self.bottom() <= bounds.height
    }
}

bitflags::bitflags! {
    /// Display transform applied to a source layer, in window-framework convention.
    ///
    /// Rotation by 180 and 270 degrees are expressed as flip combinations, so only a
    /// 90 degree rotation bit exists.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct Transform: u32 {
        /// Mirror horizontally.
        const FLIP_H = 0x01;
        /// Mirror vertically.
        const FLIP_V = 0x02;
        /// Rotate 90 degrees clockwise.
        const ROT_90 = 0x04;
        /// Rotate 180 degrees.
        const ROT_180 = Self::FLIP_H.bits() | Self::FLIP_V.bits();
        /// Rotate 270 degrees.
        const ROT_270 = Self::ROT_180.bits() | Self::ROT_90.bits();
    }
}

/// Synchronization file handle. Ownership stays with the caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fence(pub i32);

impl Fence {
    /// Wire value for "no fence".
    pub const NONE_RAW: i32 = -1;

    /// Convert from the wire representation where negative values mean no fence.
    pub fn from_raw(raw: i32) -> Option<Self> {
        (raw >= 0).then_some(Self(raw))
    }

    /// Convert an optional fence into its wire representation.
    pub fn to_raw(fence: Option<Self>) -> i32 {
        fence.map_or(Self::NONE_RAW, |f| f.0)
    }
}

/// How a layer's color is combined with the layers below it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompositingMode {
    /// No blending: the layer replaces what is below.
    #[default]
    None,
    /// Color channels are premultiplied by alpha.
    Premultiplied,
    /// Straight alpha, blended by coverage.
    Coverage,
}

impl CompositingMode {
    /// Return `true` for premultiplied-alpha content.
    pub fn is_premultiplied(self) -> bool {
        self == Self::Premultiplied
    }
}

/// Color standard component of a [`Dataspace`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ColorStandard {
    /// Not specified; treated as BT.709.
    Unspecified = 0,
    /// ITU-R BT.709.
    Bt709 = 1,
    /// ITU-R BT.601 625-line.
    Bt601_625 = 2,
    /// ITU-R BT.601 625-line, unadjusted primaries.
    Bt601_625Unadjusted = 3,
    /// ITU-R BT.601 525-line.
    Bt601_525 = 4,
    /// ITU-R BT.601 525-line, unadjusted primaries.
    Bt601_525Unadjusted = 5,
    /// ITU-R BT.2020.
    Bt2020 = 6,
    /// ITU-R BT.2020 constant luminance.
    Bt2020ConstantLuminance = 7,
    /// ITU-R BT.470 System M.
    Bt470M = 8,
    /// Generic film.
    Film = 9,
    /// SMPTE DCI-P3.
    DciP3 = 10,
    /// Adobe RGB.
    AdobeRgb = 11,
}

/// Dataspace tag of an image, packed as in the window-compositing framework:
/// standard in bits 16..22, transfer in bits 22..27, range in bits 27..30.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dataspace(pub u32);

impl Dataspace {
    const STANDARD_SHIFT: u32 = 16;
    const STANDARD_MASK: u32 = 63 << Self::STANDARD_SHIFT;
    const RANGE_SHIFT: u32 = 27;

    /// Full-range bit.
    pub const RANGE_FULL: u32 = 1 << Self::RANGE_SHIFT;
    /// Limited-range value.
    pub const RANGE_LIMITED: u32 = 2 << Self::RANGE_SHIFT;

    /// Unknown dataspace.
    pub const UNKNOWN: Self = Self(0);

    /// Build a dataspace from a raw standard number and a range flag.
    pub const fn from_parts(standard: u32, full_range: bool) -> Self {
        let range = if full_range {
            Self::RANGE_FULL
        } else {
            Self::RANGE_LIMITED
        };
        Self(((standard << Self::STANDARD_SHIFT) & Self::STANDARD_MASK) | range)
    }

    /// Raw standard number.
    pub const fn standard_raw(self) -> u32 {
        (self.0 & Self::STANDARD_MASK) >> Self::STANDARD_SHIFT
    }

    /// Decoded color standard, if known.
    pub fn standard(self) -> Option<ColorStandard> {
        use ColorStandard::*;
        Some(match self.standard_raw() {
            0 => Unspecified,
            1 => Bt709,
            2 => Bt601_625,
            3 => Bt601_625Unadjusted,
            4 => Bt601_525,
            5 => Bt601_525Unadjusted,
            6 => Bt2020,
            7 => Bt2020ConstantLuminance,
            8 => Bt470M,
            9 => Film,
            10 => DciP3,
            11 => AdobeRgb,
            _ => return None,
        })
    }

    /// Return `true` when the full-range bit is set.
    pub const fn is_full_range(self) -> bool {
        self.0 & Self::RANGE_FULL != 0
    }
}

impl std::fmt::LowerHex for Dataspace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::LowerHex::fmt(&self.0, f)
    }
}

/// Round `value` up to the next multiple of `align` (a power of two).
pub(crate) const fn align_up(value: u32, align: u32) -> u32 {
    (value + align - 1) & !(align - 1)
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
