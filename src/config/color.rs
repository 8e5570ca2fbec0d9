use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Alpha applied to colors picked at runtime, so additive blending keeps its glow.
pub const PICKED_COLOR_ALPHA: f64 = 0.5;

/// Straight-alpha color with normalized `0..=1` channels.
///
/// Serialized as a CSS `rgba(r, g, b, a)` string; deserialized from hex (`#rrggbb`,
/// `#rrggbbaa`), CSS `rgb()`/`rgba()`, or a `[r, g, b]`/`[r, g, b, a]` float array.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandColor {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl BandColor {
    pub fn rgba(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    pub fn rgba8(r: u8, g: u8, b: u8, a: f64) -> Self {
        Self::rgba(
            f64::from(r) / 255.0,
            f64::from(g) / 255.0,
            f64::from(b) / 255.0,
            a,
        )
    }

    /// Parse a color-picker value (`#rrggbb`) and apply [`PICKED_COLOR_ALPHA`].
    pub fn from_picker_hex(hex: &str) -> Result<Self, String> {
        let c = parse_hex(hex)?;
        Ok(c.with_alpha(PICKED_COLOR_ALPHA))
    }

    pub fn with_alpha(self, a: f64) -> Self {
        Self { a, ..self }
    }

    pub fn to_rgba8_straight(self) -> [u8; 4] {
        let [r, g, b] = self.channels_u8();
        [r, g, b, (self.a.clamp(0.0, 1.0) * 255.0).round() as u8]
    }

    /// Hex form without alpha, as shown by a color picker.
    pub fn to_hex_rgb(self) -> String {
        let [r, g, b] = self.channels_u8();
        format!("#{r:02x}{g:02x}{b:02x}")
    }

    fn channels_u8(self) -> [u8; 3] {
        let to_u8 = |x: f64| (x.clamp(0.0, 1.0) * 255.0).round() as u8;
        [to_u8(self.r), to_u8(self.g), to_u8(self.b)]
    }
}

impl fmt::Display for BandColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b] = self.channels_u8();
        write!(f, "rgba({r}, {g}, {b}, {})", self.a.clamp(0.0, 1.0))
    }
}

impl FromStr for BandColor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.starts_with('#') {
            return parse_hex(s);
        }
        if s.starts_with("rgb") {
            return parse_css_rgb(s);
        }
        Err(format!(
            "unrecognized color \"{s}\" (expected #rrggbb, #rrggbbaa, rgb() or rgba())"
        ))
    }
}

impl Serialize for BandColor {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for BandColor {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Str(String),
            Arr(Vec<f64>),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Str(s) => s.parse().map_err(serde::de::Error::custom),
            Repr::Arr(v) => match v.as_slice() {
                [r, g, b] => Ok(Self::rgba(*r, *g, *b, 1.0)),
                [r, g, b, a] => Ok(Self::rgba(*r, *g, *b, *a)),
                _ => Err(serde::de::Error::custom(
                    "rgba array must have len 3 ([r,g,b]) or 4 ([r,g,b,a])",
                )),
            },
        }
    }
}

fn parse_hex(s: &str) -> Result<BandColor, String> {
    let s = s.trim();
    let s = s.strip_prefix('#').unwrap_or(s);
    if !s.is_ascii() {
        return Err("hex color must be ASCII".to_owned());
    }

    fn hex_byte(pair: &str) -> Result<u8, String> {
        u8::from_str_radix(pair, 16).map_err(|_| format!("invalid hex byte \"{pair}\""))
    }

    let (r, g, b, a) = match s.len() {
        6 => (
            hex_byte(&s[0..2])?,
            hex_byte(&s[2..4])?,
            hex_byte(&s[4..6])?,
            255,
        ),
        8 => (
            hex_byte(&s[0..2])?,
            hex_byte(&s[2..4])?,
            hex_byte(&s[4..6])?,
            hex_byte(&s[6..8])?,
        ),
        _ => {
            return Err("hex color must be #RRGGBB or #RRGGBBAA (case-insensitive)".to_owned());
        }
    };

    Ok(BandColor::rgba8(r, g, b, f64::from(a) / 255.0))
}

fn parse_css_rgb(s: &str) -> Result<BandColor, String> {
    let (name, rest) = s
        .split_once('(')
        .ok_or_else(|| format!("malformed css color \"{s}\""))?;
    let body = rest
        .strip_suffix(')')
        .ok_or_else(|| format!("css color \"{s}\" is missing ')'"))?;
    let parts = body
        .split(',')
        .map(|p| {
            p.trim()
                .parse::<f64>()
                .map_err(|_| format!("invalid css color component \"{}\"", p.trim()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let channel = |v: f64| v.clamp(0.0, 255.0) / 255.0;
    match (name.trim(), parts.as_slice()) {
        ("rgb", [r, g, b]) => Ok(BandColor::rgba(channel(*r), channel(*g), channel(*b), 1.0)),
        ("rgba", [r, g, b, a]) => Ok(BandColor::rgba(
            channel(*r),
            channel(*g),
            channel(*b),
            a.clamp(0.0, 1.0),
        )),
        _ => Err(format!(
            "css color \"{s}\" must be rgb(r, g, b) or rgba(r, g, b, a)"
        )),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/config/color.rs"]
mod tests;
