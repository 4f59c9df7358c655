//! Zip packaging of the document parts
//!
//! Every entry gets the same fixed timestamp and the parts are written in a
//! fixed order, so identical input always yields identical bytes.

use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

use super::xml::{document_xml, escape, half_points, IMAGE_REL_ID, XML_DECLARATION};
use super::Document;
use crate::error::Result;
use crate::layout::{Length, DEFAULT_FONT_SIZE_PT, PARAGRAPH_SPACING_AFTER_PT};

pub const APPLICATION_NAME: &str = "Sticker Generator";

pub(crate) const DOCUMENT_PART: &str = "word/document.xml";
pub(crate) const CORE_PART: &str = "docProps/core.xml";

/// Serialize a document into `.docx` bytes
pub fn write_package(doc: &Document) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

    let deflated = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default());
    // Image formats are already compressed
    let stored = deflated.compression_method(CompressionMethod::Stored);

    zip.start_file("[Content_Types].xml", deflated)?;
    zip.write_all(content_types_xml(doc).as_bytes())?;

    zip.start_file("_rels/.rels", deflated)?;
    zip.write_all(package_rels_xml().as_bytes())?;

    zip.start_file(DOCUMENT_PART, deflated)?;
    zip.write_all(document_xml(doc).as_bytes())?;

    zip.start_file("word/_rels/document.xml.rels", deflated)?;
    zip.write_all(document_rels_xml(doc).as_bytes())?;

    zip.start_file("word/styles.xml", deflated)?;
    zip.write_all(styles_xml(&doc.font_family).as_bytes())?;

    zip.start_file("word/settings.xml", deflated)?;
    zip.write_all(settings_xml(doc.background.is_some()).as_bytes())?;

    if let Some(image) = &doc.image {
        zip.start_file(format!("word/media/image1.{}", image.kind.extension()), stored)?;
        zip.write_all(&image.bytes)?;
    }

    zip.start_file(CORE_PART, deflated)?;
    zip.write_all(core_xml(&doc.title).as_bytes())?;

    zip.start_file("docProps/app.xml", deflated)?;
    zip.write_all(app_xml(doc.pages.len()).as_bytes())?;

    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}

fn content_types_xml(doc: &Document) -> String {
    let image_default = doc
        .image
        .as_ref()
        .map(|image| {
            format!(
                r#"<Default Extension="{}" ContentType="{}"/>"#,
                image.kind.extension(),
                image.kind.content_type()
            )
        })
        .unwrap_or_default();

    format!(
        concat!(
            "{decl}",
            r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
            r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
            r#"<Default Extension="xml" ContentType="application/xml"/>"#,
            "{image}",
            r#"<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>"#,
            r#"<Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/>"#,
            r#"<Override PartName="/word/settings.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.settings+xml"/>"#,
            r#"<Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/>"#,
            r#"<Override PartName="/docProps/app.xml" ContentType="application/vnd.openxmlformats-officedocument.extended-properties+xml"/>"#,
            "</Types>",
        ),
        decl = XML_DECLARATION,
        image = image_default,
    )
}

fn package_rels_xml() -> String {
    format!(
        concat!(
            "{decl}",
            r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
            r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>"#,
            r#"<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/>"#,
            r#"<Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties" Target="docProps/app.xml"/>"#,
            "</Relationships>",
        ),
        decl = XML_DECLARATION,
    )
}

fn document_rels_xml(doc: &Document) -> String {
    let image_rel = doc
        .image
        .as_ref()
        .map(|image| {
            format!(
                r#"<Relationship Id="{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="media/image1.{}"/>"#,
                IMAGE_REL_ID,
                image.kind.extension()
            )
        })
        .unwrap_or_default();

    format!(
        concat!(
            "{decl}",
            r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
            r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>"#,
            r#"<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/settings" Target="settings.xml"/>"#,
            "{image}",
            "</Relationships>",
        ),
        decl = XML_DECLARATION,
        image = image_rel,
    )
}

fn styles_xml(font_family: &str) -> String {
    let font = escape(font_family);
    format!(
        concat!(
            "{decl}",
            r#"<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">"#,
            r#"<w:docDefaults><w:rPrDefault><w:rPr>"#,
            r#"<w:rFonts w:ascii="{font}" w:hAnsi="{font}" w:cs="{font}" w:eastAsia="{font}"/>"#,
            r#"<w:sz w:val="{size}"/><w:szCs w:val="{size}"/></w:rPr></w:rPrDefault>"#,
            r#"<w:pPrDefault><w:pPr><w:spacing w:after="{after}" w:line="240" w:lineRule="auto"/></w:pPr></w:pPrDefault>"#,
            r#"</w:docDefaults>"#,
            r#"<w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/><w:qFormat/></w:style>"#,
            "</w:styles>",
        ),
        decl = XML_DECLARATION,
        font = font,
        size = half_points(DEFAULT_FONT_SIZE_PT),
        after = Length::from_pt(PARAGRAPH_SPACING_AFTER_PT).twips(),
    )
}

fn settings_xml(show_background: bool) -> String {
    format!(
        concat!(
            "{decl}",
            r#"<w:settings xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">"#,
            "{background}",
            r#"<w:defaultTabStop w:val="720"/>"#,
            r#"<w:compat><w:compatSetting w:name="compatibilityMode" w:uri="http://schemas.microsoft.com/office/word" w:val="15"/></w:compat>"#,
            "</w:settings>",
        ),
        decl = XML_DECLARATION,
        background = if show_background { "<w:displayBackgroundShape/>" } else { "" },
    )
}

/// Core properties carry no created/modified dates
fn core_xml(title: &str) -> String {
    format!(
        concat!(
            "{decl}",
            r#"<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/">"#,
            "<dc:title>{title}</dc:title>",
            "<dc:creator>{creator}</dc:creator>",
            "</cp:coreProperties>",
        ),
        decl = XML_DECLARATION,
        title = escape(title),
        creator = APPLICATION_NAME,
    )
}

fn app_xml(pages: usize) -> String {
    format!(
        concat!(
            "{decl}",
            r#"<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties">"#,
            "<Application>{app}</Application>",
            "<Pages>{pages}</Pages>",
            "</Properties>",
        ),
        decl = XML_DECLARATION,
        app = APPLICATION_NAME,
        pages = pages,
    )
}
