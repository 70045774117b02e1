use crate::foundation::error::{ReelError, ReelResult};

pub use kurbo::{Point, Rect};

/// Output canvas dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Canvas {
    /// Round both dimensions up to the next even value (yuv420p requirement).
    pub fn even(self) -> Self {
        Self {
            width: self.width + (self.width & 1),
            height: self.height + (self.height & 1),
        }
    }
}

/// Straight-alpha RGBA8 color.
///
/// Serialized as `"#rrggbb"`, `"#rrggbbaa"` or one of a few well-known names.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl Color {
    /// Opaque white.
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    /// Opaque black.
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    /// Opaque yellow.
    pub const YELLOW: Self = Self::rgb(255, 255, 0);
    /// Opaque magenta.
    pub const MAGENTA: Self = Self::rgb(255, 0, 255);
    /// Opaque red.
    pub const RED: Self = Self::rgb(255, 0, 0);
    /// Opaque mid gray.
    pub const GRAY: Self = Self::rgb(128, 128, 128);

    /// Build an opaque color.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Same color with a different alpha.
    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    /// Parse `#rrggbb`, `#rrggbbaa` or a color name.
    pub fn parse(s: &str) -> ReelResult<Self> {
        let t = s.trim();
        if let Some(hex) = t.strip_prefix('#') {
            let byte = |i: usize| {
                hex.get(i..i + 2)
                    .and_then(|h| u8::from_str_radix(h, 16).ok())
                    .ok_or_else(|| ReelError::configuration(format!("invalid hex color '{s}'")))
            };
            return match hex.len() {
                6 => Ok(Self::rgb(byte(0)?, byte(2)?, byte(4)?)),
                8 => Ok(Self::rgb(byte(0)?, byte(2)?, byte(4)?).with_alpha(byte(6)?)),
                _ => Err(ReelError::configuration(format!(
                    "hex color '{s}' must have 6 or 8 digits"
                ))),
            };
        }
        match t.to_ascii_lowercase().as_str() {
            "white" | "w" => Ok(Self::WHITE),
            "black" | "k" => Ok(Self::BLACK),
            "yellow" | "y" => Ok(Self::YELLOW),
            "magenta" | "m" => Ok(Self::MAGENTA),
            "red" | "r" => Ok(Self::RED),
            "green" | "g" => Ok(Self::rgb(0, 128, 0)),
            "blue" | "b" => Ok(Self::rgb(0, 0, 255)),
            "cyan" | "c" => Ok(Self::rgb(0, 255, 255)),
            "gray" | "grey" => Ok(Self::GRAY),
            "lightgray" | "lightgrey" => Ok(Self::rgb(211, 211, 211)),
            _ => Err(ReelError::configuration(format!("unknown color '{s}'"))),
        }
    }
}

impl TryFrom<String> for Color {
    type Error = ReelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Color> for String {
    fn from(c: Color) -> Self {
        if c.a == 255 {
            format!("#{:02x}{:02x}{:02x}", c.r, c.g, c.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", c.r, c.g, c.b, c.a)
        }
    }
}

/// Numeric type of a plane's samples.
///
/// Values are always stored as `f32`; the sample type decides how integer results are quantized
/// and how raw intensities map onto display range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleType {
    /// 8-bit unsigned integer samples.
    U8,
    /// 16-bit unsigned integer samples.
    U16,
    /// Floating point samples, nominally in `[0, 1]`.
    F32,
}

impl SampleType {
    /// Largest representable display value.
    pub fn max_value(self) -> f32 {
        match self {
            Self::U8 => u8::MAX as f32,
            Self::U16 => u16::MAX as f32,
            Self::F32 => 1.0,
        }
    }

    /// Numeric cast into this type: truncation toward zero for integers, never clipping.
    pub fn quantize(self, v: f32) -> f32 {
        match self {
            Self::U8 | Self::U16 => v.trunc(),
            Self::F32 => v,
        }
    }

    /// `true` for integer sample types.
    pub fn is_integer(self) -> bool {
        !matches!(self, Self::F32)
    }
}

/// One 2-D intensity array (a single channel at a single z-level and frame).
#[derive(Clone, Debug, PartialEq)]
pub struct Plane {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Sample type of the source data.
    pub sample: SampleType,
    /// Row-major samples, `width * height` long.
    pub data: Vec<f32>,
}

impl Plane {
    /// Build a plane, checking the sample count.
    pub fn new(width: u32, height: u32, sample: SampleType, data: Vec<f32>) -> ReelResult<Self> {
        let expected = (width as usize) * (height as usize);
        if data.len() != expected {
            return Err(ReelError::dimension_mismatch(format!(
                "plane {width}x{height} expects {expected} samples, got {}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            sample,
            data,
        })
    }

    /// Plane filled with a single value.
    pub fn filled(width: u32, height: u32, sample: SampleType, value: f32) -> Self {
        Self {
            width,
            height,
            sample,
            data: vec![value; (width as usize) * (height as usize)],
        }
    }

    /// `(width, height)` pair.
    pub fn shape(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Sample at `(x, y)`.
    pub fn get(&self, x: u32, y: u32) -> f32 {
        self.data[(y as usize) * (self.width as usize) + x as usize]
    }
}

/// Premultiplied RGBA8 frame produced by a render context.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Row-major RGBA8 bytes, `width * height * 4` long.
    pub data: Vec<u8>,
}

impl Frame {
    /// Opaque black frame.
    pub fn black(width: u32, height: u32) -> Self {
        let mut data = vec![0u8; (width as usize) * (height as usize) * 4];
        for px in data.chunks_exact_mut(4) {
            px[3] = 255;
        }
        Self {
            width,
            height,
            data,
        }
    }

    /// RGBA value at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = ((y as usize) * (self.width as usize) + x as usize) * 4;
        [
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ]
    }
}
