//! Font metrics for measuring rendered line widths
//!
//! Two measurers are provided. [`BuiltinMetrics`] carries the advance widths of
//! the Arial/Helvetica metric set, which is what the generated document
//! declares, so no font file is needed at runtime. [`ShapedFont`] shapes text
//! with `rustybuzz` against a real TrueType/OpenType file (plus its bold
//! face) for exact widths.

use std::path::{Path, PathBuf};

use log::debug;

use crate::error::{Error, Result};

/// Single line spacing of Arial as a multiple of the font size
/// (hhea ascender + descender + line gap over units per em)
pub const ARIAL_LINE_HEIGHT: f32 = 1.15;

/// Widening applied to regular advances when a bold line has to be measured
/// without a bold face. Covers Arial, Liberation Sans and DejaVu Sans, whose
/// bold faces run 5-11% wider than their regular faces.
pub const SYNTHETIC_BOLD_ALLOWANCE: f32 = 1.12;

/// Measures rendered text
pub trait TextMeasure {
    /// Rendered width in points of `text` at `size_pt`
    fn text_width(&self, text: &str, size_pt: f32, bold: bool) -> f32;

    /// Height in points of one line of text set at `size_pt` with single spacing
    fn line_height(&self, size_pt: f32) -> f32 {
        size_pt * ARIAL_LINE_HEIGHT
    }
}

impl<M: TextMeasure + ?Sized> TextMeasure for &M {
    fn text_width(&self, text: &str, size_pt: f32, bold: bool) -> f32 {
        (**self).text_width(text, size_pt, bold)
    }

    fn line_height(&self, size_pt: f32) -> f32 {
        (**self).line_height(size_pt)
    }
}

impl<M: TextMeasure + ?Sized> TextMeasure for Box<M> {
    fn text_width(&self, text: &str, size_pt: f32, bold: bool) -> f32 {
        (**self).text_width(text, size_pt, bold)
    }

    fn line_height(&self, size_pt: f32) -> f32 {
        (**self).line_height(size_pt)
    }
}

/// Arial advance widths for chars 32-126, in 1/1000ths of the em square
#[rustfmt::skip]
const ARIAL_REGULAR: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191,  // 32-39   space ! " # $ % & '
    333, 333, 389, 584, 278, 333, 278, 278,  // 40-47   ( ) * + , - . /
    556, 556, 556, 556, 556, 556, 556, 556,  // 48-55   0-7
    556, 556, 278, 278, 584, 584, 584, 556,  // 56-63   8 9 : ; < = > ?
    1015, 667, 667, 722, 722, 667, 611, 778, // 64-71   @ A-G
    722, 278, 500, 667, 556, 833, 722, 778,  // 72-79   H-O
    667, 778, 722, 667, 611, 722, 667, 944,  // 80-87   P-W
    667, 667, 611, 278, 278, 278, 469, 556,  // 88-95   X Y Z [ \ ] ^ _
    333, 556, 556, 500, 556, 556, 278, 556,  // 96-103  ` a-g
    556, 222, 222, 500, 222, 833, 556, 556,  // 104-111 h-o
    556, 556, 333, 500, 278, 556, 500, 722,  // 112-119 p-w
    500, 500, 500, 334, 260, 334, 584,       // 120-126 x y z { | } ~
];

/// Arial Bold advance widths for chars 32-126, in 1/1000ths of the em square
#[rustfmt::skip]
const ARIAL_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238,  // 32-39
    333, 333, 389, 584, 278, 333, 278, 278,  // 40-47
    556, 556, 556, 556, 556, 556, 556, 556,  // 48-55
    556, 556, 333, 333, 584, 584, 584, 611,  // 56-63
    975, 722, 722, 722, 722, 667, 611, 778,  // 64-71
    722, 278, 556, 722, 611, 833, 722, 778,  // 72-79
    667, 778, 722, 667, 611, 722, 667, 944,  // 80-87
    667, 667, 611, 333, 278, 333, 584, 556,  // 88-95
    333, 556, 611, 556, 611, 556, 333, 611,  // 96-103
    611, 278, 278, 556, 278, 889, 611, 611,  // 104-111
    611, 611, 389, 556, 333, 611, 556, 778,  // 112-119
    556, 556, 500, 389, 280, 389, 584,       // 120-126
];

/// Width used for characters outside the table
const FALLBACK_REGULAR: u16 = 667;
const FALLBACK_BOLD: u16 = 722;

/// Static metrics for the Arial family (metric-compatible with Helvetica and Liberation Sans)
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinMetrics;

impl BuiltinMetrics {
    fn advance(c: char, bold: bool) -> u16 {
        let table = if bold { &ARIAL_BOLD } else { &ARIAL_REGULAR };
        match c as u32 {
            code @ 32..=126 => table[(code - 32) as usize],
            // Tabs and other controls never reach a run, treat as space
            0..=31 => table[0],
            _ if bold => FALLBACK_BOLD,
            _ => FALLBACK_REGULAR,
        }
    }
}

impl TextMeasure for BuiltinMetrics {
    fn text_width(&self, text: &str, size_pt: f32, bold: bool) -> f32 {
        let units: u32 = text.chars().map(|c| Self::advance(c, bold) as u32).sum();
        units as f32 * size_pt / 1000.0
    }
}

/// One parsed face of a font file
#[derive(Clone)]
struct FaceData {
    data: Vec<u8>,
    index: u32,
    units_per_em: f32,
    /// Ascender + descender + line gap, in font units
    line_extent: f32,
}

impl FaceData {
    fn parse(data: Vec<u8>, index: u32) -> Result<Self> {
        let (units_per_em, line_extent) = {
            let face = rustybuzz::Face::from_slice(&data, index)
                .ok_or_else(|| Error::Font("unrecognised font data".to_string()))?;
            let extent = face.ascender() as f32 - face.descender() as f32 + face.line_gap() as f32;
            (face.units_per_em() as f32, extent)
        };
        if units_per_em <= 0.0 {
            return Err(Error::Font("font reports zero units per em".to_string()));
        }
        Ok(Self { data, index, units_per_em, line_extent })
    }

    fn read(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)
            .map_err(|e| Error::Font(format!("{}: {}", path.display(), e)))?;
        Self::parse(data, 0)
    }

    /// Advance width of `text` in em units
    fn advance_em(&self, text: &str) -> f32 {
        let Some(face) = rustybuzz::Face::from_slice(&self.data, self.index) else {
            return 0.0;
        };

        let mut buffer = rustybuzz::UnicodeBuffer::new();
        buffer.push_str(text);
        let shaped = rustybuzz::shape(&face, &[], buffer);

        let advance: i32 = shaped.glyph_positions().iter().map(|p| p.x_advance).sum();
        advance as f32 / self.units_per_em
    }
}

/// A font family measured through `rustybuzz` shaping
///
/// Regular text is shaped with the regular face and bold text with the bold
/// face. Without a bold face, bold widths are the regular widths scaled by
/// [`SYNTHETIC_BOLD_ALLOWANCE`]. Faces are re-parsed from the owned bytes on
/// each measurement.
#[derive(Clone)]
pub struct ShapedFont {
    regular: FaceData,
    bold: Option<FaceData>,
}

impl std::fmt::Debug for ShapedFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShapedFont")
            .field("bytes", &self.regular.data.len())
            .field("index", &self.regular.index)
            .field("units_per_em", &self.regular.units_per_em)
            .field("bold", &self.bold.as_ref().map(|face| face.data.len()))
            .finish()
    }
}

impl ShapedFont {
    /// Load the first face of a TrueType/OpenType file as the regular face
    pub fn from_file(path: &Path) -> Result<Self> {
        Ok(Self {
            regular: FaceData::read(path)?,
            bold: None,
        })
    }

    /// Use an in-memory font, selecting `index` within a collection
    pub fn from_bytes(data: Vec<u8>, index: u32) -> Result<Self> {
        Ok(Self {
            regular: FaceData::parse(data, index)?,
            bold: None,
        })
    }

    /// Measure bold text with the first face of `path`
    pub fn with_bold_file(mut self, path: &Path) -> Result<Self> {
        self.bold = Some(FaceData::read(path)?);
        Ok(self)
    }

    /// Measure bold text with an in-memory face
    pub fn with_bold_bytes(mut self, data: Vec<u8>, index: u32) -> Result<Self> {
        self.bold = Some(FaceData::parse(data, index)?);
        Ok(self)
    }

    pub fn has_bold(&self) -> bool {
        self.bold.is_some()
    }
}

impl TextMeasure for ShapedFont {
    fn text_width(&self, text: &str, size_pt: f32, bold: bool) -> f32 {
        let em = match (&self.bold, bold) {
            (Some(face), true) => face.advance_em(text),
            (None, true) => self.regular.advance_em(text) * SYNTHETIC_BOLD_ALLOWANCE,
            (_, false) => self.regular.advance_em(text),
        };
        em * size_pt
    }

    fn line_height(&self, size_pt: f32) -> f32 {
        let extent = self
            .bold
            .iter()
            .chain(std::iter::once(&self.regular))
            .map(|face| face.line_extent / face.units_per_em)
            .fold(0.0_f32, f32::max);
        extent * size_pt
    }
}

/// Look for the bold face that ships next to a regular font file
///
/// Tries the common naming schemes: `Name-Bold.ttf`, `NameBold.ttf`,
/// `Name_Bold.ttf`, `Name-bold.ttf`, `namebd.ttf` and `Name-Regular` →
/// `Name-Bold`.
pub fn find_bold_sibling(regular: &Path) -> Option<PathBuf> {
    let dir = regular.parent().unwrap_or_else(|| Path::new(""));
    let stem = regular.file_stem()?.to_string_lossy();
    let ext = regular
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    let mut names = Vec::new();
    for suffix in ["-Regular", "_Regular", "Regular"] {
        if let Some(base) = stem.strip_suffix(suffix) {
            names.push(format!("{}{}{}", base, suffix.replace("Regular", "Bold"), ext));
        }
    }
    for pattern in ["-Bold", "Bold", "_Bold", "-bold", "bd"] {
        names.push(format!("{}{}{}", stem, pattern, ext));
    }

    names.into_iter().map(|name| dir.join(name)).find(|path| {
        debug!("Looking for bold face at {}", path.display());
        path.is_file()
    })
}
