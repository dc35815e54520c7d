use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
#[error("Unrecognized color '{0}'")]
pub struct ColorError(pub String);

/// A CSS color: 8-bit channels plus a float alpha in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Rgba {
    pub const BLACK: Rgba = Rgba::rgb(0, 0, 0);
    pub const TRANSPARENT: Rgba = Rgba {
        r: 0,
        g: 0,
        b: 0,
        a: 0.0,
    };

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Parse hex (`#rgb`, `#rgba`, `#rrggbb`, `#rrggbbaa`), functional
    /// (`rgb()`, `rgba()`) and named colors.
    pub fn parse(input: &str) -> Result<Self, ColorError> {
        let s = input.trim().to_ascii_lowercase();
        let parsed = if let Some(hex) = s.strip_prefix('#') {
            parse_hex(hex)
        } else if let Some(args) = s
            .strip_prefix("rgba(")
            .or_else(|| s.strip_prefix("rgb("))
            .and_then(|rest| rest.strip_suffix(')'))
        {
            parse_functional(args)
        } else {
            named(&s)
        };
        parsed.ok_or_else(|| ColorError(input.to_string()))
    }

    /// Parse, falling back to `default` with a warning.
    pub fn parse_or(input: &str, default: Rgba) -> Self {
        match Self::parse(input) {
            Ok(color) => color,
            Err(e) => {
                log::warn!("{}, using {}", e, default.to_css());
                default
            }
        }
    }

    pub fn is_transparent(&self) -> bool {
        self.a <= 0.0
    }

    /// Skia color with the alpha further multiplied by `opacity`.
    pub fn to_skia(&self, opacity: f32) -> tiny_skia::Color {
        tiny_skia::Color::from_rgba8(
            self.r,
            self.g,
            self.b,
            (self.a * opacity.clamp(0.0, 1.0) * 255.0).round() as u8,
        )
    }

    pub fn to_css(&self) -> String {
        if self.a >= 1.0 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
        }
    }
}

fn parse_hex(hex: &str) -> Option<Rgba> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let nibble = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok().map(|v| v * 17);
    let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    match hex.len() {
        3 => Some(Rgba::rgb(nibble(0)?, nibble(1)?, nibble(2)?)),
        4 => Some(Rgba {
            a: f32::from(nibble(3)?) / 255.0,
            ..Rgba::rgb(nibble(0)?, nibble(1)?, nibble(2)?)
        }),
        6 => Some(Rgba::rgb(byte(0)?, byte(2)?, byte(4)?)),
        8 => Some(Rgba {
            a: f32::from(byte(6)?) / 255.0,
            ..Rgba::rgb(byte(0)?, byte(2)?, byte(4)?)
        }),
        _ => None,
    }
}

/// Accepts both `r, g, b[, a]` and `r g b[ / a]`.
fn parse_functional(args: &str) -> Option<Rgba> {
    let cleaned = args.replace([',', '/'], " ");
    let parts: Vec<&str> = cleaned.split_whitespace().collect();
    if parts.len() != 3 && parts.len() != 4 {
        return None;
    }

    let channel = |s: &str| -> Option<u8> {
        let value = match s.strip_suffix('%') {
            Some(pct) => pct.parse::<f32>().ok()? * 2.55,
            None => s.parse::<f32>().ok()?,
        };
        Some(value.round().clamp(0.0, 255.0) as u8)
    };
    let alpha = |s: &str| -> Option<f32> {
        let value = match s.strip_suffix('%') {
            Some(pct) => pct.parse::<f32>().ok()? / 100.0,
            None => s.parse::<f32>().ok()?,
        };
        Some(value.clamp(0.0, 1.0))
    };

    Some(Rgba {
        r: channel(parts[0])?,
        g: channel(parts[1])?,
        b: channel(parts[2])?,
        a: match parts.get(3) {
            Some(a) => alpha(a)?,
            None => 1.0,
        },
    })
}

fn named(name: &str) -> Option<Rgba> {
    let color = match name {
        "transparent" => Rgba::TRANSPARENT,
        "black" => Rgba::rgb(0, 0, 0),
        "white" => Rgba::rgb(255, 255, 255),
        "red" => Rgba::rgb(255, 0, 0),
        "green" => Rgba::rgb(0, 128, 0),
        "lime" => Rgba::rgb(0, 255, 0),
        "blue" => Rgba::rgb(0, 0, 255),
        "yellow" => Rgba::rgb(255, 255, 0),
        "orange" => Rgba::rgb(255, 165, 0),
        "purple" => Rgba::rgb(128, 0, 128),
        "pink" => Rgba::rgb(255, 192, 203),
        "cyan" | "aqua" => Rgba::rgb(0, 255, 255),
        "magenta" | "fuchsia" => Rgba::rgb(255, 0, 255),
        "gray" | "grey" => Rgba::rgb(128, 128, 128),
        "silver" => Rgba::rgb(192, 192, 192),
        "navy" => Rgba::rgb(0, 0, 128),
        "teal" => Rgba::rgb(0, 128, 128),
        "maroon" => Rgba::rgb(128, 0, 0),
        "olive" => Rgba::rgb(128, 128, 0),
        "gold" => Rgba::rgb(255, 215, 0),
        _ => return None,
    };
    Some(color)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex() {
        assert_eq!(Rgba::parse("#ffffff").unwrap(), Rgba::rgb(255, 255, 255));
        assert_eq!(Rgba::parse("#F00").unwrap(), Rgba::rgb(255, 0, 0));
        let c = Rgba::parse("#00000080").unwrap();
        assert_eq!((c.r, c.g, c.b), (0, 0, 0));
        assert!((c.a - 128.0 / 255.0).abs() < 1e-6);
        assert!(Rgba::parse("#12345").is_err());
        assert!(Rgba::parse("#gggggg").is_err());
    }

    #[test]
    fn test_parse_functional() {
        let c = Rgba::parse("rgba(0, 0, 0, 0.8)").unwrap();
        assert_eq!((c.r, c.g, c.b), (0, 0, 0));
        assert!((c.a - 0.8).abs() < 1e-6);
        assert_eq!(Rgba::parse("rgb(10 20 30)").unwrap(), Rgba::rgb(10, 20, 30));
        let c = Rgba::parse("rgb(100% 0% 0% / 50%)").unwrap();
        assert_eq!(c.r, 255);
        assert!((c.a - 0.5).abs() < 1e-6);
        assert!(Rgba::parse("rgb(1, 2)").is_err());
    }

    #[test]
    fn test_parse_named() {
        assert_eq!(Rgba::parse("White").unwrap(), Rgba::rgb(255, 255, 255));
        assert!(Rgba::parse("transparent").unwrap().is_transparent());
        assert!(Rgba::parse("chartreuse-ish").is_err());
    }

    #[test]
    fn test_parse_or_falls_back() {
        assert_eq!(Rgba::parse_or("nope", Rgba::BLACK), Rgba::BLACK);
    }

    #[test]
    fn test_to_css() {
        assert_eq!(Rgba::rgb(255, 0, 16).to_css(), "#ff0010");
        assert_eq!(Rgba::parse("rgba(1,2,3,0.5)").unwrap().to_css(), "rgba(1, 2, 3, 0.5)");
    }
}
