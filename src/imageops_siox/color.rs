//! Packed pixel to CIE L*a*b* conversion.
//!
//! sRGB channels are linearized, mapped to XYZ with the D65 / 2° matrix and
//! then to L*a*b* with the cube-root/linear piecewise transform. Euclidean
//! distance in the result approximates perceived color difference, which is
//! what the clustering limits are expressed in.

/// Breakpoint between the cube-root and the linear segment of the Lab transform.
const LAB_EPSILON: f64 = 0.008856;
/// Slope of the linear segment of the Lab transform.
const LAB_KAPPA: f64 = 7.787;
/// D65 reference white, 2° observer.
const WHITE_X: f64 = 95.047;
const WHITE_Y: f64 = 100.0;
const WHITE_Z: f64 = 108.883;

/// A point in L*a*b* space with an optional weight.
///
/// Raw samples carry a cardinality of 1. Cluster centroids carry the number
/// of samples they summarize.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ColorPoint {
    pub l: f32,
    pub a: f32,
    pub b: f32,
    pub cardinality: u32,
}

impl ColorPoint {
    /// Creates a single-sample point.
    #[inline]
    #[must_use]
    pub const fn new(l: f32, a: f32, b: f32) -> Self {
        Self {
            l,
            a,
            b,
            cardinality: 1,
        }
    }

    /// Returns the same point weighted by `cardinality`.
    #[inline]
    #[must_use]
    pub const fn with_cardinality(self, cardinality: u32) -> Self {
        Self {
            cardinality,
            ..self
        }
    }

    /// Channel by index: 0 = L, 1 = a, anything else = b.
    #[inline]
    #[must_use]
    pub const fn channel(&self, dim: usize) -> f32 {
        match dim {
            0 => self.l,
            1 => self.a,
            _ => self.b,
        }
    }

    /// Squared Euclidean distance.
    #[inline]
    #[must_use]
    pub fn distance_squared(&self, other: &Self) -> f32 {
        let dl = self.l - other.l;
        let da = self.a - other.a;
        let db = self.b - other.b;
        dl * dl + da * da + db * db
    }
}

/// Byte layout of a packed 32-bit pixel.
///
/// The two layouts differ only in where red and blue live; the top byte is
/// ignored in both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelOrder {
    /// Red in bits 16..24, green in 8..16, blue in 0..8.
    #[default]
    Xrgb,
    /// Blue in bits 16..24, green in 8..16, red in 0..8.
    Xbgr,
}

impl ChannelOrder {
    /// Extracts `[red, green, blue]` from a packed pixel.
    #[inline]
    #[must_use]
    pub const fn unpack(self, pixel: u32) -> [u8; 3] {
        let hi = ((pixel >> 16) & 0xff) as u8;
        let mid = ((pixel >> 8) & 0xff) as u8;
        let lo = (pixel & 0xff) as u8;
        match self {
            Self::Xrgb => [hi, mid, lo],
            Self::Xbgr => [lo, mid, hi],
        }
    }

    /// Packs `[red, green, blue]` with the top byte cleared.
    #[inline]
    #[must_use]
    pub const fn pack(self, [red, green, blue]: [u8; 3]) -> u32 {
        match self {
            Self::Xrgb => (red as u32) << 16 | (green as u32) << 8 | blue as u32,
            Self::Xbgr => (blue as u32) << 16 | (green as u32) << 8 | red as u32,
        }
    }

    /// Normalizes a packed pixel to `Xrgb` with the top byte cleared.
    ///
    /// Used as the key of the classification cache so that the same color
    /// always maps to the same entry.
    #[inline]
    #[must_use]
    pub const fn color_key(self, pixel: u32) -> u32 {
        Self::Xrgb.pack(self.unpack(pixel))
    }
}

#[inline]
fn srgb_to_linear(channel: u8) -> f64 {
    let value = f64::from(channel) / 255.0;
    let linear = if value > 0.04045 {
        ((value + 0.055) / 1.055).powf(2.4)
    } else {
        value / 12.92
    };
    linear * 100.0
}

#[inline]
fn lab_f(t: f64) -> f64 {
    if t > LAB_EPSILON {
        t.cbrt()
    } else {
        LAB_KAPPA * t + 16.0 / 116.0
    }
}

/// Converts 8-bit sRGB channels to L*a*b*.
#[must_use]
pub fn rgb_to_lab([red, green, blue]: [u8; 3]) -> ColorPoint {
    let r = srgb_to_linear(red);
    let g = srgb_to_linear(green);
    let b = srgb_to_linear(blue);

    let x = r * 0.4124 + g * 0.3576 + b * 0.1805;
    let y = r * 0.2126 + g * 0.7152 + b * 0.0722;
    let z = r * 0.0193 + g * 0.1192 + b * 0.9505;

    let fx = lab_f(x / WHITE_X);
    let fy = lab_f(y / WHITE_Y);
    let fz = lab_f(z / WHITE_Z);

    ColorPoint::new(
        (116.0 * fy - 16.0) as f32,
        (500.0 * (fx - fy)) as f32,
        (200.0 * (fy - fz)) as f32,
    )
}

/// Converts a packed pixel to L*a*b* using the given byte layout.
#[inline]
#[must_use]
pub fn packed_to_lab(pixel: u32, order: ChannelOrder) -> ColorPoint {
    rgb_to_lab(order.unpack(pixel))
}
