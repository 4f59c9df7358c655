//! Document assembly
//!
//! Turns [`StickerJob`]s into a finished `.docx`. Each job becomes a FRONT
//! SIDE page (heading, sticker image, product fields) followed by a BACK
//! SIDE page (heading, sticker image, customer name, job number). Every text
//! line is sized on its own with [`fit_font_size`] so it stays on one line,
//! and each page is then kept within the printable height by shrinking the
//! image and, if needed, the field lines.
//!
//! The whole package is built in memory and only written to disk once it is
//! complete, through a temporary file in the destination directory that is
//! renamed into place.

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use image::ImageFormat;
use log::{debug, info, warn};

use crate::docx::{
    write_package, Align, Block, Document, EmbeddedImage, ImageKind, Page, Paragraph, Picture, Run,
};
use crate::error::{Error, Result};
use crate::fit::{fit_font_size, SizeRange};
use crate::job::{Color, StickerJob, Theme};
use crate::layout::{LayoutConfig, DEFAULT_FONT_SIZE_PT, PARAGRAPH_SPACING_AFTER_PT};
use crate::metrics::{BuiltinMetrics, TextMeasure};
use crate::resources;

pub const FRONT_HEADING: &str = "FRONT SIDE";
pub const BACK_HEADING: &str = "BACK SIDE";

/// The decoded sticker image, ready to embed
#[derive(Debug, Clone)]
pub struct StickerImage {
    embedded: EmbeddedImage,
    width_px: u32,
    height_px: u32,
}

impl StickerImage {
    /// Read and decode an image file
    ///
    /// PNG and JPEG are embedded as-is; any other format the `image` crate
    /// can decode is re-encoded to PNG.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|e| Error::ImageMissing {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_bytes(bytes).map_err(|reason| Error::ImageMissing {
            path: path.to_path_buf(),
            reason,
        })
    }

    fn from_bytes(bytes: Vec<u8>) -> std::result::Result<Self, String> {
        let format = image::guess_format(&bytes).map_err(|e| e.to_string())?;
        let decoded = image::load_from_memory_with_format(&bytes, format).map_err(|e| e.to_string())?;
        let (width_px, height_px) = (decoded.width(), decoded.height());

        let embedded = match format {
            ImageFormat::Png => EmbeddedImage { bytes, kind: ImageKind::Png },
            ImageFormat::Jpeg => EmbeddedImage { bytes, kind: ImageKind::Jpeg },
            other => {
                debug!("Re-encoding {:?} sticker image as PNG", other);
                let mut png = Vec::new();
                decoded
                    .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
                    .map_err(|e| e.to_string())?;
                EmbeddedImage { bytes: png, kind: ImageKind::Png }
            }
        };

        Ok(Self { embedded, width_px, height_px })
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width_px, self.height_px)
    }
}

/// Builds sticker documents from jobs
pub struct Assembler {
    layout: LayoutConfig,
    image_path: PathBuf,
    measure: Box<dyn TextMeasure>,
}

impl std::fmt::Debug for Assembler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Assembler")
            .field("layout", &self.layout)
            .field("image_path", &self.image_path)
            .finish_non_exhaustive()
    }
}

impl Assembler {
    /// Assembler with the default layout and built-in Arial metrics
    pub fn new(image_path: impl Into<PathBuf>) -> Self {
        Self {
            layout: LayoutConfig::default(),
            image_path: image_path.into(),
            measure: Box::new(BuiltinMetrics),
        }
    }

    pub fn with_layout(mut self, layout: LayoutConfig) -> Self {
        self.layout = layout;
        self
    }

    /// Measure lines with a different font; the layout's font family should name the same font
    pub fn with_measure(mut self, measure: impl TextMeasure + 'static) -> Self {
        self.measure = Box::new(measure);
        self
    }

    pub fn layout(&self) -> &LayoutConfig {
        &self.layout
    }

    pub fn image_path(&self) -> &Path {
        &self.image_path
    }

    /// Write the two-page sticker document for one job
    pub fn generate(&self, job: &StickerJob, output_path: &Path) -> Result<PathBuf> {
        self.generate_batch(std::slice::from_ref(job), output_path)
    }

    /// Write one document containing a front/back pair for every job, in order
    pub fn generate_batch(&self, jobs: &[StickerJob], output_path: &Path) -> Result<PathBuf> {
        if jobs.is_empty() {
            return Err(Error::InvalidInput("no sticker jobs to generate".to_string()));
        }
        for job in jobs {
            job.validate()?;
        }

        let image = StickerImage::load(&self.image_path)?;
        let document = self.build_document(jobs, &image)?;
        let bytes = write_package(&document)?;

        persist(&bytes, output_path)?;
        info!(
            "Wrote {} page(s) for {} job(s) to {}",
            document.pages.len(),
            jobs.len(),
            output_path.display()
        );
        Ok(output_path.to_path_buf())
    }

    /// Lay out every page in memory
    ///
    /// Fails with [`Error::InvalidInput`] when a job has more lines than fit
    /// on one page even at the floor size with the smallest image.
    pub fn build_document(&self, jobs: &[StickerJob], image: &StickerImage) -> Result<Document> {
        let (width, height) = self.layout.scale_image(image.width_px, image.height_px);
        let picture = Picture { width, height };

        let mut pages = Vec::with_capacity(jobs.len() * 2);
        for job in jobs {
            pages.push(self.front_page(job, picture)?);
            pages.push(self.back_page(job, picture)?);
        }

        // Batches share one theme; the first job decides it
        let theme = jobs.first().map(|job| job.theme).unwrap_or_default();

        Ok(Document {
            title: document_title(jobs),
            font_family: self.layout.font_family.clone(),
            page_size: self.layout.page,
            margins: self.layout.margins,
            background: theme.background(),
            image: Some(image.embedded.clone()),
            pages,
        })
    }

    fn front_page(&self, job: &StickerJob, picture: Picture) -> Result<Page> {
        let lines = job
            .product_fields
            .iter()
            .map(|field| {
                vec![
                    (format!("{}: ", field.label.trim()), true),
                    (field.value.trim().to_string(), false),
                ]
            })
            .collect();
        self.layout_page(FRONT_HEADING, lines, job.theme, picture)
    }

    fn back_page(&self, job: &StickerJob, picture: Picture) -> Result<Page> {
        let lines = [job.customer_name.trim(), job.job_number.trim()]
            .into_iter()
            .map(|text| vec![(text.to_string(), true)])
            .collect();
        self.layout_page(BACK_HEADING, lines, job.theme, picture)
    }

    /// Fit a page into the printable area
    ///
    /// Every line is first fitted to the printable width. If the page is then
    /// too tall, the image gives up height down to `image_min_height`, after
    /// which the largest lines are capped one step at a time towards the
    /// floor.
    fn layout_page(
        &self,
        heading: &str,
        lines: Vec<Vec<(String, bool)>>,
        theme: Theme,
        picture: Picture,
    ) -> Result<Page> {
        let body = self.layout.body;
        let heading_size = self.fit(heading, self.layout.heading);
        let mut sizes: Vec<f32> = lines
            .iter()
            .map(|segments| self.fit(&joined(segments), body))
            .collect();

        let printable = self.layout.printable_height().pt() as f32;
        let min_image = self.layout.image_min_height.min(picture.height).pt() as f32;
        let floor = body.floor.min(body.initial);

        loop {
            let text_only =
                self.compose(heading, heading_size, &lines, &sizes, theme, picture.with_height(0.0));
            let room = printable - self.page_height(&text_only);
            if room >= min_image {
                let natural = picture.height.pt() as f32;
                let picture = if room < natural {
                    debug!("{} image reduced from {:.1}pt to {:.1}pt high", heading, natural, room);
                    picture.with_height(room)
                } else {
                    picture
                };
                return Ok(self.compose(heading, heading_size, &lines, &sizes, theme, picture));
            }

            let largest = sizes.iter().copied().fold(floor, f32::max);
            if largest <= floor {
                return Err(Error::InvalidInput(format!(
                    "{} page: {} lines do not fit on one page even at {}pt",
                    heading,
                    lines.len(),
                    floor
                )));
            }
            let cap = if body.step.is_finite() && body.step > 0.0 {
                (largest - body.step).max(floor)
            } else {
                floor
            };
            debug!("{} page too tall, capping lines at {}pt", heading, cap);
            for size in &mut sizes {
                *size = size.min(cap);
            }
        }
    }

    fn compose(
        &self,
        heading: &str,
        heading_size: f32,
        lines: &[Vec<(String, bool)>],
        sizes: &[f32],
        theme: Theme,
        picture: Picture,
    ) -> Page {
        let mut heading_run = text_run(heading.to_string(), heading_size, true, theme.heading_color());
        heading_run.underline = true;

        let mut blocks = vec![
            Block::Paragraph(Paragraph { runs: vec![heading_run], align: Align::Center }),
            Block::Blank,
            Block::Picture(picture),
            Block::Blank,
        ];

        let color = theme.text_color();
        for (segments, &size) in lines.iter().zip(sizes) {
            let runs = segments
                .iter()
                .map(|(text, bold)| text_run(text.clone(), size, *bold, color))
                .collect();
            blocks.push(Block::Paragraph(Paragraph { runs, align: Align::Center }));
        }

        Page { blocks }
    }

    /// Estimated height of a laid-out page in points
    ///
    /// Counts single-spaced lines at each paragraph's size (a line wider than
    /// the printable width counts once per wrapped row), the image with the
    /// descent of its line, and the spacing after every paragraph.
    pub fn page_height(&self, page: &Page) -> f32 {
        page.blocks.iter().map(|block| self.block_height(block)).sum()
    }

    fn block_height(&self, block: &Block) -> f32 {
        let spacing = PARAGRAPH_SPACING_AFTER_PT as f32;
        let blank_line = self.measure.line_height(DEFAULT_FONT_SIZE_PT);
        match block {
            Block::Paragraph(paragraph) => {
                let size = paragraph.runs.first().map_or(DEFAULT_FONT_SIZE_PT, |run| run.size_pt);
                let text: String = paragraph.runs.iter().map(|run| run.text.as_str()).collect();
                let max_width = self.layout.printable_width().pt() as f32;
                let rows = (self.measure.text_width(&text, size, true) / max_width).ceil().max(1.0);
                rows * self.measure.line_height(size) + spacing
            }
            Block::Picture(picture) => picture.height.pt() as f32 + blank_line + spacing,
            Block::Blank => blank_line + spacing,
        }
    }

    /// Lines are measured bold throughout so a bold label never pushes a fitted line over
    fn fit(&self, text: &str, range: SizeRange) -> f32 {
        let max_width = self.layout.printable_width().pt() as f32;
        let size = fit_font_size(text, max_width, range, true, &self.measure);
        if size < range.initial {
            let width = self.measure.text_width(text, size, true);
            if width > max_width {
                warn!("'{}' still overflows at {}pt ({:.1}pt > {:.1}pt)", text, size, width, max_width);
            } else {
                debug!("'{}' reduced from {}pt to {}pt", text, range.initial, size);
            }
        }
        size
    }
}

fn text_run(text: String, size_pt: f32, bold: bool, color: Color) -> Run {
    Run {
        text,
        size_pt,
        bold,
        underline: false,
        color,
    }
}

fn joined(segments: &[(String, bool)]) -> String {
    segments.iter().map(|(text, _)| text.as_str()).collect()
}

fn document_title(jobs: &[StickerJob]) -> String {
    match jobs {
        [job] => format!("Sticker: {} / {}", job.customer_name.trim(), job.job_number.trim()),
        [first, ..] => format!("Stickers: {} ({} jobs)", first.customer_name.trim(), jobs.len()),
        [] => "Stickers".to_string(),
    }
}

/// Write `bytes` to `path` atomically
///
/// Any failure here (missing directory, permissions, disk full) is reported
/// as [`Error::WriteFailure`], and the temporary file is removed on drop.
fn persist(bytes: &[u8], path: &Path) -> Result<()> {
    let write_failure = |source: std::io::Error| Error::WriteFailure {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp = tempfile::NamedTempFile::new_in(dir).map_err(write_failure)?;
    temp.write_all(bytes).map_err(write_failure)?;
    temp.as_file().sync_all().map_err(write_failure)?;
    temp.persist(path).map_err(|e| write_failure(e.error))?;
    Ok(())
}

/// Generate a sticker document using the bundled sticker image
pub fn generate(job: &StickerJob, output_path: &Path) -> Result<PathBuf> {
    let image_path = resources::bundled_image_path().ok_or_else(|| Error::ImageMissing {
        path: PathBuf::from(resources::STICKER_IMAGE),
        reason: "not found next to the executable or in the working directory".to_string(),
    })?;
    Assembler::new(image_path).generate(job, output_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::ProductField;

    fn image() -> StickerImage {
        let mut png = Vec::new();
        image::RgbImage::from_pixel(40, 20, image::Rgb([200, 30, 30]))
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .unwrap();
        StickerImage::from_bytes(png).unwrap()
    }

    fn texts(page: &Page) -> Vec<String> {
        page.blocks
            .iter()
            .filter_map(|block| match block {
                Block::Paragraph(p) => Some(p.runs.iter().map(|r| r.text.as_str()).collect()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_two_pages_front_then_back() {
        let assembler = Assembler::new("unused.png");
        let job = StickerJob::new("Acme Corp", "JOB-2024-001")
            .with_field("Model", "UPS-3000")
            .with_field("Serial", "SN123456");
        let doc = assembler.build_document(&[job], &image()).unwrap();

        assert_eq!(doc.pages.len(), 2);
        assert_eq!(
            texts(&doc.pages[0]),
            vec!["FRONT SIDE", "Model: UPS-3000", "Serial: SN123456"]
        );
        assert_eq!(texts(&doc.pages[1]), vec!["BACK SIDE", "Acme Corp", "JOB-2024-001"]);
        assert!(doc.pages.iter().all(|p| p.blocks.iter().any(|b| matches!(b, Block::Picture(_)))));
    }

    #[test]
    fn test_picture_scaled_to_max_width() {
        let assembler = Assembler::new("unused.png");
        let doc = assembler.build_document(&[StickerJob::new("A", "1")], &image()).unwrap();
        let picture = doc.pages[0]
            .blocks
            .iter()
            .find_map(|b| match b {
                Block::Picture(p) => Some(*p),
                _ => None,
            })
            .unwrap();
        assert!((picture.width.mm() - assembler.layout().image_max_width.mm()).abs() < 1e-9);
        assert!((picture.height.mm() * 2.0 - picture.width.mm()).abs() < 1e-9);
    }

    #[test]
    fn test_long_value_is_shrunk_but_not_split() {
        let assembler = Assembler::new("unused.png");
        let long = "X".repeat(80);
        let job = StickerJob {
            product_fields: vec![ProductField::new("Model", long.clone())],
            ..StickerJob::new("Acme", long.clone())
        };
        let doc = assembler.build_document(&[job], &image()).unwrap();

        let back_job_line = match &doc.pages[1].blocks[5] {
            Block::Paragraph(p) => p,
            other => panic!("expected paragraph, got {:?}", other),
        };
        assert_eq!(back_job_line.runs.len(), 1);
        assert_eq!(back_job_line.runs[0].text, long);
        assert!(back_job_line.runs[0].size_pt < assembler.layout().body.initial);
        assert!(back_job_line.runs[0].size_pt >= assembler.layout().body.floor);
    }

    #[test]
    fn test_dark_theme_sets_background_and_colors() {
        let assembler = Assembler::new("unused.png");
        let job = StickerJob::new("Acme", "J1").with_theme(Theme::Dark);
        let doc = assembler.build_document(&[job], &image()).unwrap();
        assert_eq!(doc.background, Theme::Dark.background());
        match &doc.pages[1].blocks[4] {
            Block::Paragraph(p) => assert_eq!(p.runs[0].color, Theme::Dark.text_color()),
            other => panic!("expected paragraph, got {:?}", other),
        }
    }

    fn tall_image() -> StickerImage {
        let mut png = Vec::new();
        image::RgbImage::from_pixel(20, 80, image::Rgb([0, 90, 200]))
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .unwrap();
        StickerImage::from_bytes(png).unwrap()
    }

    fn picture(page: &Page) -> Picture {
        page.blocks
            .iter()
            .find_map(|b| match b {
                Block::Picture(p) => Some(*p),
                _ => None,
            })
            .unwrap()
    }

    fn job_with_fields(count: usize, value: &str) -> StickerJob {
        (1..=count).fold(StickerJob::new("Acme Corp", "JOB-2024-001"), |job, i| {
            job.with_field(format!("Field {}", i), format!("{} {}", value, i))
        })
    }

    fn assert_pages_fit(assembler: &Assembler, doc: &Document) {
        let printable = assembler.layout().printable_height().pt() as f32;
        for (i, page) in doc.pages.iter().enumerate() {
            let used = assembler.page_height(page);
            assert!(used <= printable + 0.01, "page {} uses {:.1}pt of {:.1}pt", i, used, printable);
        }
    }

    #[test]
    fn test_tall_image_shrinks_to_make_room_for_fields() {
        let assembler = Assembler::new("unused.png");
        let doc = assembler
            .build_document(&[job_with_fields(8, "UPS-3000")], &tall_image())
            .unwrap();
        assert_pages_fit(&assembler, &doc);

        let front = picture(&doc.pages[0]);
        let max_height = assembler.layout().image_max_height;
        assert!(front.height.mm() < max_height.mm());
        assert!(front.height.mm() >= assembler.layout().image_min_height.mm());
        assert!((front.height.mm() - 4.0 * front.width.mm()).abs() < 1e-6);
        // Field lines keep their size while the image can give way
        for block in &doc.pages[0].blocks[4..] {
            if let Block::Paragraph(p) = block {
                assert_eq!(p.runs[0].size_pt, assembler.layout().body.initial);
            }
        }
        // The back page has room for the full-size image
        assert!((picture(&doc.pages[1]).height.mm() - max_height.mm()).abs() < 1e-6);
    }

    #[test]
    fn test_many_fields_are_shrunk_to_fit_the_page() {
        let assembler = Assembler::new("unused.png");
        let doc = assembler
            .build_document(&[job_with_fields(20, "Value")], &tall_image())
            .unwrap();
        assert_pages_fit(&assembler, &doc);

        let body = assembler.layout().body;
        let sizes: Vec<f32> = doc.pages[0].blocks[4..]
            .iter()
            .filter_map(|b| match b {
                Block::Paragraph(p) => Some(p.runs[0].size_pt),
                _ => None,
            })
            .collect();
        assert_eq!(sizes.len(), 20);
        assert!(sizes.iter().all(|&size| size < body.initial && size >= body.floor));
    }

    #[test]
    fn test_wrapped_long_values_still_fit() {
        let assembler = Assembler::new("unused.png");
        let doc = assembler
            .build_document(&[job_with_fields(8, &"X".repeat(80))], &tall_image())
            .unwrap();
        assert_pages_fit(&assembler, &doc);
    }

    #[test]
    fn test_too_many_fields_is_invalid() {
        let assembler = Assembler::new("unused.png");
        let result = assembler.build_document(&[job_with_fields(40, "Value")], &image());
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_page_height_counts_wrapped_rows() {
        let assembler = Assembler::new("unused.png");
        let line = |text: String| Page {
            blocks: vec![Block::Paragraph(Paragraph {
                runs: vec![text_run(text, 14.0, true, Color::rgb(0, 0, 0))],
                align: Align::Center,
            })],
        };
        let short = assembler.page_height(&line("X".to_string()));
        let long = assembler.page_height(&line("X".repeat(80)));
        let row = assembler.measure.line_height(14.0);
        assert!((long - short - row).abs() < 0.01);
    }

    #[test]
    fn test_empty_batch_is_invalid() {
        let assembler = Assembler::new("unused.png");
        let result = assembler.generate_batch(&[], Path::new("out.docx"));
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_undecodable_image_is_missing() {
        assert!(StickerImage::from_bytes(b"not an image".to_vec()).is_err());
    }

    #[test]
    fn test_bmp_is_reencoded_as_png() {
        let mut bmp = Vec::new();
        image::RgbImage::from_pixel(8, 8, image::Rgb([0, 0, 0]))
            .write_to(&mut Cursor::new(&mut bmp), ImageFormat::Bmp)
            .unwrap();
        let sticker = StickerImage::from_bytes(bmp).unwrap();
        assert_eq!(sticker.embedded.kind, ImageKind::Png);
        assert_eq!(sticker.dimensions(), (8, 8));
    }

    #[test]
    fn test_document_title() {
        let one = [StickerJob::new("Acme", "J1")];
        assert_eq!(document_title(&one), "Sticker: Acme / J1");
        let two = [StickerJob::new("Acme", "J1"), StickerJob::new("Acme", "J2")];
        assert_eq!(document_title(&two), "Stickers: Acme (2 jobs)");
    }
}
