use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// A text layer identifier, unique within one project's collection.
pub type LayerId = i64;

/// Stored magnitudes (font size, shadow size, letter spacing) are kept at
/// ten times their rendered value.
pub const MAGNITUDE_SCALE: f64 = 10.0;

/// Font families offered by the editor.
pub const FONT_CATALOG: &[&str] = &[
    "Inter",
    "Arial",
    "Helvetica",
    "Verdana",
    "Roboto",
    "Open Sans",
    "Montserrat",
    "Poppins",
    "Oswald",
    "Bebas Neue",
    "Anton",
    "Times New Roman",
    "Georgia",
    "Playfair Display",
    "Merriweather",
    "Lobster",
    "Pacifico",
    "Courier New",
    "Fira Code",
];

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LayerError {
    #[error("Unknown layer attribute '{0}'")]
    UnknownAttribute(String),

    #[error("Invalid value for '{attribute}': expected {expected}")]
    InvalidValue {
        attribute: &'static str,
        expected: &'static str,
    },
}

/// One positioned, styled text string belonging to a project.
///
/// `left`/`top` are percentage-like offsets from the image center, `top`
/// growing upward. Font size, shadow size and letter spacing are stored at
/// [`MAGNITUDE_SCALE`] times their rendered size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextLayer {
    pub id: LayerId,
    pub text: String,
    pub font_family: String,
    pub top: f64,
    pub left: f64,
    pub color: String,
    pub font_size: f64,
    pub font_weight: u16,
    pub opacity: f64,
    pub shadow_color: String,
    pub shadow_size: f64,
    pub rotation: f64,
    pub tilt_x: f64,
    pub tilt_y: f64,
    pub letter_spacing: f64,
}

impl TextLayer {
    /// A centered layer carrying the editor defaults.
    pub fn new(id: LayerId) -> Self {
        Self {
            id,
            text: "edit".to_string(),
            font_family: "Inter".to_string(),
            top: 0.0,
            left: 0.0,
            color: "white".to_string(),
            font_size: 200.0,
            font_weight: 800,
            opacity: 1.0,
            shadow_color: "rgba(0, 0, 0, 0.8)".to_string(),
            shadow_size: 4.0,
            rotation: 0.0,
            tilt_x: 0.0,
            tilt_y: 0.0,
            letter_spacing: 0.0,
        }
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn with_position(mut self, left: f64, top: f64) -> Self {
        self.left = left;
        self.top = top;
        self
    }

    pub fn with_font(mut self, family: &str, size: f64, weight: u16) -> Self {
        self.font_family = family.to_string();
        self.font_size = size;
        self.font_weight = weight;
        self
    }

    pub fn with_color(mut self, color: &str) -> Self {
        self.color = color.to_string();
        self
    }

    pub fn with_shadow(mut self, color: &str, size: f64) -> Self {
        self.shadow_color = color.to_string();
        self.shadow_size = size;
        self
    }

    /// Font size in preview-space pixels.
    pub fn rendered_font_size(&self) -> f64 {
        self.font_size / MAGNITUDE_SCALE
    }

    /// Shadow offset in preview-space pixels.
    pub fn rendered_shadow_size(&self) -> f64 {
        self.shadow_size / MAGNITUDE_SCALE
    }

    /// Extra inter-character space in preview-space pixels (may be negative).
    pub fn rendered_letter_spacing(&self) -> f64 {
        self.letter_spacing / MAGNITUDE_SCALE
    }

    /// Replace one field. No range checking is done here.
    pub fn apply(&mut self, attribute: LayerAttribute) {
        match attribute {
            LayerAttribute::Text(v) => self.text = v,
            LayerAttribute::FontFamily(v) => self.font_family = v,
            LayerAttribute::Top(v) => self.top = v,
            LayerAttribute::Left(v) => self.left = v,
            LayerAttribute::Color(v) => self.color = v,
            LayerAttribute::FontSize(v) => self.font_size = v,
            LayerAttribute::FontWeight(v) => self.font_weight = v,
            LayerAttribute::Opacity(v) => self.opacity = v,
            LayerAttribute::ShadowColor(v) => self.shadow_color = v,
            LayerAttribute::ShadowSize(v) => self.shadow_size = v,
            LayerAttribute::Rotation(v) => self.rotation = v,
            LayerAttribute::TiltX(v) => self.tilt_x = v,
            LayerAttribute::TiltY(v) => self.tilt_y = v,
            LayerAttribute::LetterSpacing(v) => self.letter_spacing = v,
        }
    }
}

/// A single editable field of a [`TextLayer`] together with its new value.
#[derive(Debug, Clone, PartialEq)]
pub enum LayerAttribute {
    Text(String),
    FontFamily(String),
    Top(f64),
    Left(f64),
    Color(String),
    FontSize(f64),
    FontWeight(u16),
    Opacity(f64),
    ShadowColor(String),
    ShadowSize(f64),
    Rotation(f64),
    TiltX(f64),
    TiltY(f64),
    LetterSpacing(f64),
}

impl LayerAttribute {
    /// Field name as it appears in the persisted layer shape.
    pub fn name(&self) -> &'static str {
        match self {
            LayerAttribute::Text(_) => "text",
            LayerAttribute::FontFamily(_) => "fontFamily",
            LayerAttribute::Top(_) => "top",
            LayerAttribute::Left(_) => "left",
            LayerAttribute::Color(_) => "color",
            LayerAttribute::FontSize(_) => "fontSize",
            LayerAttribute::FontWeight(_) => "fontWeight",
            LayerAttribute::Opacity(_) => "opacity",
            LayerAttribute::ShadowColor(_) => "shadowColor",
            LayerAttribute::ShadowSize(_) => "shadowSize",
            LayerAttribute::Rotation(_) => "rotation",
            LayerAttribute::TiltX(_) => "tiltX",
            LayerAttribute::TiltY(_) => "tiltY",
            LayerAttribute::LetterSpacing(_) => "letterSpacing",
        }
    }

    /// Build an attribute from a field name and a dynamic JSON value, the way
    /// editor controls report their changes.
    pub fn from_json(name: &str, value: &Value) -> Result<Self, LayerError> {
        fn text(attribute: &'static str, value: &Value) -> Result<String, LayerError> {
            value
                .as_str()
                .map(str::to_string)
                .ok_or(LayerError::InvalidValue {
                    attribute,
                    expected: "a string",
                })
        }

        fn number(attribute: &'static str, value: &Value) -> Result<f64, LayerError> {
            value.as_f64().ok_or(LayerError::InvalidValue {
                attribute,
                expected: "a number",
            })
        }

        let attribute = match name {
            "text" => LayerAttribute::Text(text("text", value)?),
            "fontFamily" => LayerAttribute::FontFamily(text("fontFamily", value)?),
            "top" => LayerAttribute::Top(number("top", value)?),
            "left" => LayerAttribute::Left(number("left", value)?),
            "color" => LayerAttribute::Color(text("color", value)?),
            "fontSize" => LayerAttribute::FontSize(number("fontSize", value)?),
            "fontWeight" => {
                let weight = number("fontWeight", value)?;
                if !(0.0..=f64::from(u16::MAX)).contains(&weight) {
                    return Err(LayerError::InvalidValue {
                        attribute: "fontWeight",
                        expected: "an integer weight",
                    });
                }
                LayerAttribute::FontWeight(weight.round() as u16)
            }
            "opacity" => LayerAttribute::Opacity(number("opacity", value)?),
            "shadowColor" => LayerAttribute::ShadowColor(text("shadowColor", value)?),
            "shadowSize" => LayerAttribute::ShadowSize(number("shadowSize", value)?),
            "rotation" => LayerAttribute::Rotation(number("rotation", value)?),
            "tiltX" => LayerAttribute::TiltX(number("tiltX", value)?),
            "tiltY" => LayerAttribute::TiltY(number("tiltY", value)?),
            "letterSpacing" => LayerAttribute::LetterSpacing(number("letterSpacing", value)?),
            other => return Err(LayerError::UnknownAttribute(other.to_string())),
        };
        Ok(attribute)
    }
}

/// Slider limits of an editor control.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttributeRange {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl AttributeRange {
    const fn new(min: f64, max: f64, step: f64) -> Self {
        Self { min, max, step }
    }

    /// Control limits for a numeric attribute, if it has a slider.
    pub fn for_attribute(name: &str) -> Option<Self> {
        let range = match name {
            "left" => Self::new(-200.0, 200.0, 1.0),
            "top" => Self::new(-100.0, 100.0, 1.0),
            "fontSize" => Self::new(10.0, 3000.0, 10.0),
            "fontWeight" => Self::new(100.0, 900.0, 100.0),
            "letterSpacing" => Self::new(-20.0, 100.0, 1.0),
            "opacity" => Self::new(0.0, 1.0, 0.01),
            "rotation" => Self::new(-180.0, 180.0, 1.0),
            "tiltX" | "tiltY" => Self::new(-90.0, 90.0, 1.0),
            _ => return None,
        };
        Some(range)
    }

    /// Clamp into range and snap to the nearest step.
    pub fn clamp(&self, value: f64) -> f64 {
        let snapped = self.min + ((value - self.min) / self.step).round() * self.step;
        snapped.clamp(self.min, self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_layer_defaults() {
        let layer = TextLayer::new(1);
        assert_eq!(layer.text, "edit");
        assert_eq!(layer.font_family, "Inter");
        assert_eq!(layer.font_weight, 800);
        assert!((layer.top - 0.0).abs() < 1e-10);
        assert!((layer.left - 0.0).abs() < 1e-10);
        assert!((layer.rendered_font_size() - 20.0).abs() < 1e-10);
    }

    #[test]
    fn test_layer_serializes_camel_case() {
        let value = serde_json::to_value(TextLayer::new(7)).unwrap();
        assert_eq!(value["fontFamily"], "Inter");
        assert_eq!(value["letterSpacing"], 0.0);
        assert_eq!(value["tiltX"], 0.0);
        let back: TextLayer = serde_json::from_value(value).unwrap();
        assert_eq!(back.id, 7);
    }

    #[test]
    fn test_attribute_from_json() {
        let attr = LayerAttribute::from_json("fontSize", &json!(400)).unwrap();
        assert_eq!(attr, LayerAttribute::FontSize(400.0));
        assert_eq!(attr.name(), "fontSize");

        let attr = LayerAttribute::from_json("fontWeight", &json!(700)).unwrap();
        assert_eq!(attr, LayerAttribute::FontWeight(700));

        assert_eq!(
            LayerAttribute::from_json("zIndex", &json!(1)),
            Err(LayerError::UnknownAttribute("zIndex".to_string()))
        );
        assert!(matches!(
            LayerAttribute::from_json("text", &json!(3)),
            Err(LayerError::InvalidValue { attribute: "text", .. })
        ));
    }

    #[test]
    fn test_apply_does_not_validate() {
        let mut layer = TextLayer::new(1);
        layer.apply(LayerAttribute::Opacity(4.0));
        layer.apply(LayerAttribute::LetterSpacing(-35.0));
        assert!((layer.opacity - 4.0).abs() < 1e-10);
        assert!((layer.rendered_letter_spacing() + 3.5).abs() < 1e-10);
    }

    #[test]
    fn test_attribute_range_clamp() {
        let range = AttributeRange::for_attribute("fontWeight").unwrap();
        assert!((range.clamp(1234.0) - 900.0).abs() < 1e-10);
        assert!((range.clamp(449.0) - 400.0).abs() < 1e-10);
        assert!(AttributeRange::for_attribute("text").is_none());
    }
}
