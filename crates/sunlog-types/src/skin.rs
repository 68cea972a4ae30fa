use std::fmt;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

/// One 8-bit RGB triplet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColorSample {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl ColorSample {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Mean channel intensity normalised to `0.0..=1.0`.
    pub fn brightness(&self) -> f64 {
        (self.r as f64 + self.g as f64 + self.b as f64) / 3.0 / 255.0
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

/// Ordinal skin reactivity class, 1 (most burn-prone) through 6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SkinClass(u8);

const REFERENCE_COLORS: [ColorSample; 6] = [
    ColorSample::new(244, 208, 177),
    ColorSample::new(231, 180, 143),
    ColorSample::new(210, 158, 124),
    ColorSample::new(186, 120, 81),
    ColorSample::new(165, 94, 43),
    ColorSample::new(60, 31, 29),
];

impl SkinClass {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 6;
    pub const FALLBACK: SkinClass = SkinClass(3);

    pub fn new(value: u8) -> Option<Self> {
        (Self::MIN..=Self::MAX)
            .contains(&value)
            .then_some(SkinClass(value))
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// Maps a normalised brightness onto the class table. Every threshold is exclusive.
    pub fn from_brightness(avg: f64) -> Self {
        let class = if avg > 0.75 {
            1
        } else if avg > 0.65 {
            2
        } else if avg > 0.50 {
            3
        } else if avg > 0.35 {
            4
        } else if avg > 0.20 {
            5
        } else {
            6
        };
        SkinClass(class)
    }

    /// Fixed palette entry for the class, independent of any measured colour.
    pub fn reference_color(self) -> ColorSample {
        REFERENCE_COLORS[(self.0 - 1) as usize]
    }

    pub fn index(self) -> usize {
        (self.0 - 1) as usize
    }

    pub fn all() -> impl Iterator<Item = SkinClass> {
        (Self::MIN..=Self::MAX).map(SkinClass)
    }
}

impl Default for SkinClass {
    fn default() -> Self {
        Self::FALLBACK
    }
}

impl fmt::Display for SkinClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for SkinClass {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.0)
    }
}

impl<'de> Deserialize<'de> for SkinClass {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = u8::deserialize(deserializer)?;
        SkinClass::new(raw).ok_or_else(|| {
            de::Error::custom(format!(
                "skin class {raw} outside {}..={}",
                SkinClass::MIN,
                SkinClass::MAX
            ))
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkinClassification {
    pub skin_class: SkinClass,
    pub representative_color: ColorSample,
    pub confidence: Confidence,
}

impl SkinClassification {
    /// Answer used whenever the input cannot support a measurement.
    pub fn fallback() -> Self {
        Self {
            skin_class: SkinClass::FALLBACK,
            representative_color: SkinClass::FALLBACK.reference_color(),
            confidence: Confidence::Low,
        }
    }

    pub fn measured(skin_class: SkinClass) -> Self {
        Self {
            skin_class,
            representative_color: skin_class.reference_color(),
            confidence: Confidence::High,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.confidence == Confidence::Low
    }
}
