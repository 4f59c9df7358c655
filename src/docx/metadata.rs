//! Document metadata extraction
//!
//! Reads back what the assembler wrote: page count, title and the text lines
//! with their font sizes. Used by the `info` command and by tests that verify
//! fit-to-width sizing in the finished file.

use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use zip::ZipArchive;

use super::package::{CORE_PART, DOCUMENT_PART};
use crate::error::{Error, Result};

/// A paragraph of text as rendered in the document
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedLine {
    pub text: String,
    /// Size of the first run, in points
    pub size_pt: f32,
    /// Zero-based page index the line is on
    pub page: usize,
}

/// Document metadata
#[derive(Debug, Clone)]
pub struct DocxMetadata {
    /// Number of pages (one plus the number of hard page breaks)
    pub page_count: usize,
    /// Document title (if present)
    pub title: Option<String>,
    /// Number of embedded drawings
    pub image_count: usize,
    pub lines: Vec<RenderedLine>,
}

impl DocxMetadata {
    pub fn lines_on_page(&self, page: usize) -> impl Iterator<Item = &RenderedLine> {
        self.lines.iter().filter(move |line| line.page == page)
    }

    pub fn find_line(&self, text: &str) -> Option<&RenderedLine> {
        self.lines.iter().find(|line| line.text == text)
    }
}

/// Extract metadata from a .docx file
pub fn extract_metadata(path: &Path) -> Result<DocxMetadata> {
    if !path.exists() {
        return Err(Error::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("File not found: {}", path.display()),
        )));
    }

    let file = File::open(path)?;
    let mut archive = ZipArchive::new(file)?;

    let document = read_part(&mut archive, DOCUMENT_PART)?;
    let mut metadata = parse_document(&document)?;

    if let Ok(core) = read_part(&mut archive, CORE_PART) {
        metadata.title = parse_title(&core)?;
    }

    Ok(metadata)
}

/// Count the number of pages in a .docx file
pub fn count_pages(path: &Path) -> Result<usize> {
    Ok(extract_metadata(path)?.page_count)
}

fn read_part<R: Read + Seek>(archive: &mut ZipArchive<R>, name: &str) -> Result<String> {
    let mut part = archive.by_name(name)?;
    let mut text = String::new();
    part.read_to_string(&mut text)?;
    Ok(text)
}

fn size_attribute(e: &BytesStart<'_>) -> Result<Option<f32>> {
    let Some(attr) = e.try_get_attribute("w:val")? else {
        return Ok(None);
    };
    let value = attr.unescape_value()?;
    Ok(value.trim().parse::<f32>().ok().map(|half_points| half_points / 2.0))
}

fn parse_document(xml: &str) -> Result<DocxMetadata> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);

    let mut page_count = 1;
    let mut image_count = 0;
    let mut lines = Vec::new();

    let mut paragraph_text = String::new();
    let mut paragraph_size: Option<f32> = None;
    let mut in_text = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.name().as_ref() {
                b"w:p" => {
                    paragraph_text.clear();
                    paragraph_size = None;
                }
                b"w:t" => in_text = true,
                b"w:drawing" => image_count += 1,
                _ => (),
            },
            Event::Empty(e) => match e.name().as_ref() {
                b"w:pageBreakBefore" => page_count += 1,
                b"w:sz" if paragraph_size.is_none() => paragraph_size = size_attribute(&e)?,
                _ => (),
            },
            Event::Text(t) if in_text => paragraph_text.push_str(&t.unescape()?),
            Event::End(e) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:p" if !paragraph_text.is_empty() => lines.push(RenderedLine {
                    text: std::mem::take(&mut paragraph_text),
                    size_pt: paragraph_size.unwrap_or(0.0),
                    page: page_count - 1,
                }),
                _ => (),
            },
            Event::Eof => break,
            _ => (),
        }
    }

    Ok(DocxMetadata {
        page_count,
        title: None,
        image_count,
        lines,
    })
}

fn parse_title(xml: &str) -> Result<Option<String>> {
    let mut reader = Reader::from_str(xml);
    let mut in_title = false;
    let mut title = String::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) if e.name().as_ref() == b"dc:title" => in_title = true,
            Event::Text(t) if in_title => title.push_str(&t.unescape()?),
            Event::End(e) if e.name().as_ref() == b"dc:title" => break,
            Event::Eof => break,
            _ => (),
        }
    }

    Ok(if title.is_empty() { None } else { Some(title) })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_pages_nonexistent_file() {
        let result = count_pages(Path::new("nonexistent.docx"));
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[test]
    fn test_parse_document_lines_and_pages() {
        let xml = concat!(
            r#"<w:document xmlns:w="w"><w:body>"#,
            r#"<w:p><w:r><w:rPr><w:sz w:val="96"/></w:rPr><w:t>FRONT SIDE</w:t></w:r></w:p>"#,
            r#"<w:p/>"#,
            r#"<w:p><w:r><w:drawing/></w:r></w:p>"#,
            r#"<w:p><w:r><w:rPr><w:sz w:val="46"/></w:rPr><w:t xml:space="preserve">Model: </w:t></w:r>"#,
            r#"<w:r><w:rPr><w:sz w:val="46"/></w:rPr><w:t>A &amp; B</w:t></w:r></w:p>"#,
            r#"<w:p><w:pPr><w:pageBreakBefore/></w:pPr><w:r><w:rPr><w:sz w:val="28"/></w:rPr><w:t>BACK SIDE</w:t></w:r></w:p>"#,
            r#"</w:body></w:document>"#,
        );
        let meta = parse_document(xml).unwrap();
        assert_eq!(meta.page_count, 2);
        assert_eq!(meta.lines.len(), 3);
        assert_eq!(meta.lines[0].size_pt, 48.0);
        assert_eq!(meta.lines[1].text, "Model: A & B");
        assert_eq!(meta.lines[1].size_pt, 23.0);
        assert_eq!(meta.lines[2].page, 1);
        assert_eq!(meta.lines[2].size_pt, 14.0);
        assert_eq!(meta.lines_on_page(0).count(), 2);
    }

    #[test]
    fn test_parse_title() {
        let xml = r#"<cp:coreProperties xmlns:cp="c" xmlns:dc="d"><dc:title>Sticker: A&amp;B</dc:title></cp:coreProperties>"#;
        assert_eq!(parse_title(xml).unwrap(), Some("Sticker: A&B".to_string()));
        assert_eq!(parse_title("<x/>").unwrap(), None);
    }
}
