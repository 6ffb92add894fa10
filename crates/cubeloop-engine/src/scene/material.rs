use super::Color;

/// Blinn-Phong surface description.
#[derive(Debug, Clone, PartialEq)]
pub struct PhongMaterial {
    /// Diffuse albedo.
    pub color: Color,
    pub specular: Color,
    /// Specular exponent; higher is glossier.
    pub shininess: f32,
}

impl PhongMaterial {
    pub fn new(color: Color) -> Self {
        Self {
            color,
            ..Self::default()
        }
    }
}

impl Default for PhongMaterial {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            specular: Color::from_hex(0x111111),
            shininess: 30.0,
        }
    }
}
