//! WordprocessingML (.docx) document model, writer and reader

pub mod metadata;
pub mod package;
mod xml;

// Re-export commonly used items
pub use metadata::{extract_metadata, DocxMetadata, RenderedLine};
pub use package::write_package;

use crate::job::Color;
use crate::layout::{Length, Margins, PageDimensions};

/// Horizontal paragraph alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
}

/// A span of uniformly formatted text
#[derive(Debug, Clone, PartialEq)]
pub struct Run {
    pub text: String,
    pub size_pt: f32,
    pub bold: bool,
    pub underline: bool,
    pub color: Color,
}

/// One line of text; runs are never wrapped by the assembler
#[derive(Debug, Clone, PartialEq)]
pub struct Paragraph {
    pub runs: Vec<Run>,
    pub align: Align,
}

/// Placement of the shared embedded image
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Picture {
    pub width: Length,
    pub height: Length,
}

impl Picture {
    /// The same picture scaled to `height_pt`, keeping its aspect ratio
    pub fn with_height(self, height_pt: f32) -> Self {
        if self.height.mm() <= 0.0 {
            return self;
        }
        let height = Length::from_pt(f64::from(height_pt.max(0.0)));
        let scale = height.mm() / self.height.mm();
        Picture {
            width: Length::from_mm(self.width.mm() * scale),
            height,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Paragraph(Paragraph),
    Picture(Picture),
    /// Empty paragraph used as vertical spacing
    Blank,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub blocks: Vec<Block>,
}

/// Image formats Word embeds natively
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Png,
    Jpeg,
}

impl ImageKind {
    pub fn extension(&self) -> &'static str {
        match self {
            ImageKind::Png => "png",
            ImageKind::Jpeg => "jpeg",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ImageKind::Png => "image/png",
            ImageKind::Jpeg => "image/jpeg",
        }
    }
}

/// Encoded image bytes stored once in the package and shared by every page
#[derive(Clone, PartialEq)]
pub struct EmbeddedImage {
    pub bytes: Vec<u8>,
    pub kind: ImageKind,
}

impl std::fmt::Debug for EmbeddedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddedImage")
            .field("bytes", &self.bytes.len())
            .field("kind", &self.kind)
            .finish()
    }
}

/// In-memory document ready to be packaged
///
/// Each [`Page`] after the first starts with a hard page break, so the page
/// count of the written file is `pages.len()`.
#[derive(Debug, Clone)]
pub struct Document {
    pub title: String,
    pub font_family: String,
    pub page_size: PageDimensions,
    pub margins: Margins,
    pub background: Option<Color>,
    pub image: Option<EmbeddedImage>,
    pub pages: Vec<Page>,
}
