//! Page layout calculations

use crate::fit::SizeRange;

/// EMUs (English Metric Units) per millimeter, as used by DrawingML
const EMU_PER_MM: f64 = 36_000.0;

/// Size of text that carries no explicit size (blank spacer paragraphs)
pub const DEFAULT_FONT_SIZE_PT: f32 = 11.0;
/// Space after every paragraph, declared once in the document styles
pub const PARAGRAPH_SPACING_AFTER_PT: f64 = 6.0;

/// Simple length type in millimeters
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Length(pub f64);

impl Length {
    /// Create a length from millimeters
    pub fn from_mm(mm: f64) -> Self {
        Length(mm)
    }

    /// Create a length from inches
    pub fn from_inches(inches: f64) -> Self {
        Length(inches * 25.4)
    }

    /// Create a length from points (1/72 inch)
    pub fn from_pt(pt: f64) -> Self {
        Length(pt * 25.4 / 72.0)
    }

    /// Get the value in millimeters
    pub fn mm(&self) -> f64 {
        self.0
    }

    /// Get the value in points (1/72 inch)
    pub fn pt(&self) -> f64 {
        self.0 * 72.0 / 25.4
    }

    /// Get the value in twentieths of a point, the unit of WordprocessingML page setup
    pub fn twips(&self) -> u32 {
        (self.pt() * 20.0).round().max(0.0) as u32
    }

    /// Get the value in EMUs, the unit of DrawingML extents
    pub fn emu(&self) -> u64 {
        (self.0 * EMU_PER_MM).round().max(0.0) as u64
    }

    pub fn min(self, other: Length) -> Length {
        if other.0 < self.0 { other } else { self }
    }
}

/// Page dimensions
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageDimensions {
    pub width: Length,
    pub height: Length,
}

impl PageDimensions {
    /// US Letter size (8.5" × 11")
    pub fn letter() -> Self {
        Self {
            width: Length::from_mm(215.9),
            height: Length::from_mm(279.4),
        }
    }

    /// A4 size (210mm × 297mm)
    pub fn a4() -> Self {
        Self {
            width: Length::from_mm(210.0),
            height: Length::from_mm(297.0),
        }
    }
}

/// Margins for page content
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Margins {
    pub top: Length,
    pub bottom: Length,
    pub left: Length,
    pub right: Length,
}

impl Margins {
    /// Create margins with same value on all sides
    pub fn uniform(margin: Length) -> Self {
        Self {
            top: margin,
            bottom: margin,
            left: margin,
            right: margin,
        }
    }

    /// Standard 1-inch margins on all sides
    pub fn standard() -> Self {
        Self::uniform(Length::from_inches(1.0))
    }
}

/// Everything the assembler needs to place content on a sticker page
#[derive(Debug, Clone)]
pub struct LayoutConfig {
    pub page: PageDimensions,
    pub margins: Margins,
    /// Font family declared in the document; metrics must match it
    pub font_family: String,
    /// Sizing for the FRONT SIDE / BACK SIDE headings
    pub heading: SizeRange,
    /// Sizing for field lines
    pub body: SizeRange,
    pub image_max_width: Length,
    /// Keeps a tall sticker image from pushing text onto an extra page
    pub image_max_height: Length,
    /// The image may shrink to this height to make room for text; below it,
    /// field lines are shrunk instead
    pub image_min_height: Length,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            page: PageDimensions::letter(),
            margins: Margins::standard(),
            font_family: "Arial".to_string(),
            heading: SizeRange {
                initial: 48.0,
                floor: 14.0,
                step: 1.0,
            },
            body: SizeRange::default(),
            image_max_width: Length::from_inches(6.3),
            image_max_height: Length::from_inches(5.0),
            image_min_height: Length::from_inches(1.0),
        }
    }
}

impl LayoutConfig {
    /// Width available to a line of text between the left and right margins
    pub fn printable_width(&self) -> Length {
        Length::from_mm(self.page.width.mm() - self.margins.left.mm() - self.margins.right.mm())
    }

    /// Height available between the top and bottom margins
    pub fn printable_height(&self) -> Length {
        Length::from_mm(self.page.height.mm() - self.margins.top.mm() - self.margins.bottom.mm())
    }

    /// Scale an image of the given pixel size for placement on the page
    ///
    /// The image is stretched to the maximum width (never wider than the
    /// printable area) with its aspect ratio kept, then shrunk further if
    /// that makes it taller than the maximum height.
    pub fn scale_image(&self, width_px: u32, height_px: u32) -> (Length, Length) {
        let max_width = self.image_max_width.min(self.printable_width());
        if width_px == 0 || height_px == 0 {
            return (max_width, Length::from_mm(0.0));
        }

        let aspect = height_px as f64 / width_px as f64;
        let mut width = max_width;
        let mut height = Length::from_mm(width.mm() * aspect);

        if height.mm() > self.image_max_height.mm() {
            height = self.image_max_height;
            width = Length::from_mm(height.mm() / aspect);
        }

        (width, height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_conversions() {
        let len = Length::from_inches(1.0);
        assert!((len.mm() - 25.4).abs() < 0.01);
        assert!((len.pt() - 72.0).abs() < 0.01);
        assert_eq!(len.twips(), 1440);
        assert_eq!(len.emu(), 914_400);
    }

    #[test]
    fn test_from_pt_round_trips_through_inches() {
        let len = Length::from_pt(36.0);
        assert!((len.mm() - 12.7).abs() < 0.001);
    }

    #[test]
    fn test_letter_size() {
        let letter = PageDimensions::letter();
        // 8.5 inches = 215.9 mm
        assert!((letter.width.mm() - 215.9).abs() < 0.1);
        // 11 inches = 279.4 mm
        assert!((letter.height.mm() - 279.4).abs() < 0.1);
        assert_eq!(letter.width.twips(), 12240);
        assert_eq!(letter.height.twips(), 15840);
    }

    #[test]
    fn test_standard_margins() {
        let margins = Margins::standard();
        assert_eq!(margins.top.mm(), 25.4); // 1 inch
        assert_eq!(margins.bottom.mm(), 25.4);
        assert_eq!(margins.left.mm(), 25.4);
        assert_eq!(margins.right.mm(), 25.4);
    }

    #[test]
    fn test_printable_width_letter() {
        let config = LayoutConfig::default();
        // 8.5" page less two 1" margins
        assert!((config.printable_width().pt() - 468.0).abs() < 0.01);
    }

    #[test]
    fn test_printable_height_letter() {
        let config = LayoutConfig::default();
        assert!((config.printable_height().pt() - 648.0).abs() < 0.01);
    }

    #[test]
    fn test_scale_image_keeps_aspect_ratio() {
        let config = LayoutConfig::default();
        let (w, h) = config.scale_image(630, 315);
        assert!((w.mm() - Length::from_inches(6.3).mm()).abs() < 0.001);
        assert!((h.mm() - Length::from_inches(3.15).mm()).abs() < 0.001);
    }

    #[test]
    fn test_scale_image_clamps_tall_images() {
        let config = LayoutConfig::default();
        let (w, h) = config.scale_image(100, 400);
        assert!((h.mm() - config.image_max_height.mm()).abs() < 0.001);
        assert!((w.mm() * 4.0 - h.mm()).abs() < 0.001);
    }

    #[test]
    fn test_scale_image_never_exceeds_printable_width_on_a4() {
        let config = LayoutConfig {
            page: PageDimensions::a4(),
            ..LayoutConfig::default()
        };
        let (w, _) = config.scale_image(1000, 100);
        assert!(w.mm() <= config.printable_width().mm() + 1e-9);
        assert!(w.mm() < config.image_max_width.mm());
    }
}
