/// Linear-space RGBA color with straight alpha.
///
/// Hex and byte constructors take sRGB-encoded input and convert it, so
/// `Color::from_hex(0x00ff00)` matches what a color picker shows once the
/// sRGB surface re-encodes it.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Self = Self::linear(0.0, 0.0, 0.0);
    pub const WHITE: Self = Self::linear(1.0, 1.0, 1.0);

    /// Creates an opaque color from linear components.
    #[inline]
    pub const fn linear(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Creates an opaque color from a `0xRRGGBB` sRGB literal.
    pub fn from_hex(hex: u32) -> Self {
        let [_, r, g, b] = hex.to_be_bytes();
        Self::from_srgb_u8(r, g, b, 255)
    }

    /// Creates a color from straight sRGB bytes (`0`–`255`).
    pub fn from_srgb_u8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self {
            r: srgb_to_linear(r as f32 / 255.0),
            g: srgb_to_linear(g as f32 / 255.0),
            b: srgb_to_linear(b as f32 / 255.0),
            a: a as f32 / 255.0,
        }
    }

    /// Multiplies the RGB channels, leaving alpha alone.
    #[inline]
    pub fn scaled(self, factor: f32) -> Self {
        Self {
            r: self.r * factor,
            g: self.g * factor,
            b: self.b * factor,
            a: self.a,
        }
    }

    #[inline]
    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    #[inline]
    pub fn to_wgpu(self) -> wgpu::Color {
        wgpu::Color {
            r: self.r as f64,
            g: self.g as f64,
            b: self.b as f64,
            a: self.a as f64,
        }
    }
}

fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Color, b: Color) -> bool {
        a.to_array()
            .iter()
            .zip(b.to_array())
            .all(|(x, y)| (x - y).abs() < 1e-6)
    }

    #[test]
    fn hex_primaries_stay_saturated() {
        assert!(approx(Color::from_hex(0x00ff00), Color::linear(0.0, 1.0, 0.0)));
        assert!(approx(Color::from_hex(0xffffff), Color::WHITE));
        assert!(approx(Color::from_hex(0x000000), Color::BLACK));
    }

    #[test]
    fn mid_grey_is_darker_in_linear_space() {
        let c = Color::from_hex(0x808080);
        assert!((c.r - 0.2158605).abs() < 1e-5);
        assert_eq!(c.r, c.g);
        assert_eq!(c.a, 1.0);
    }

    #[test]
    fn scaling_keeps_alpha() {
        let c = Color::from_srgb_u8(255, 255, 255, 128).scaled(0.5);
        assert!((c.r - 0.5).abs() < 1e-6);
        assert!((c.a - 128.0 / 255.0).abs() < 1e-6);
    }
}
