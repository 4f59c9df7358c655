//! XML part generation

use std::fmt::Write;

use super::{Align, Block, Document, Paragraph, Picture, Run};

pub(crate) const XML_DECLARATION: &str =
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

const NS_W: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const NS_R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_WP: &str = "http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing";
const NS_A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const NS_PIC: &str = "http://schemas.openxmlformats.org/drawingml/2006/picture";

/// Relationship id of the shared image in `word/_rels/document.xml.rels`
pub(crate) const IMAGE_REL_ID: &str = "rId3";

/// Escape text for element content and attribute values
///
/// Characters XML 1.0 cannot carry at all (C0 controls, U+FFFE, U+FFFF) are
/// replaced with a space.
pub(crate) fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c if (c as u32) < 0x20 => out.push(' '),
            '\u{FFFE}' | '\u{FFFF}' => out.push(' '),
            c => out.push(c),
        }
    }
    out
}

/// Font sizes are stored in half-points, rounded down so a fitted line never grows
pub(crate) fn half_points(size_pt: f32) -> u32 {
    (size_pt * 2.0 + 1e-3).floor().max(1.0) as u32
}

/// Build `word/document.xml`
pub(crate) fn document_xml(doc: &Document) -> String {
    let mut out = String::new();
    out.push_str(XML_DECLARATION);
    let _ = write!(
        out,
        r#"<w:document xmlns:w="{NS_W}" xmlns:r="{NS_R}" xmlns:wp="{NS_WP}" xmlns:a="{NS_A}" xmlns:pic="{NS_PIC}">"#
    );

    if let Some(background) = doc.background {
        let _ = write!(out, r#"<w:background w:color="{}"/>"#, background.hex());
    }

    out.push_str("<w:body>");

    let mut drawing_id = 0u32;
    for (page_index, page) in doc.pages.iter().enumerate() {
        for (block_index, block) in page.blocks.iter().enumerate() {
            let page_break = page_index > 0 && block_index == 0;
            match block {
                Block::Paragraph(paragraph) => {
                    write_paragraph(&mut out, paragraph, &doc.font_family, page_break)
                }
                Block::Picture(picture) => {
                    drawing_id += 1;
                    write_picture(&mut out, picture, drawing_id, page_break);
                }
                Block::Blank => write_blank(&mut out, page_break),
            }
        }
    }

    let _ = write!(
        out,
        r#"<w:sectPr><w:pgSz w:w="{}" w:h="{}"/><w:pgMar w:top="{}" w:right="{}" w:bottom="{}" w:left="{}" w:header="720" w:footer="720" w:gutter="0"/></w:sectPr>"#,
        doc.page_size.width.twips(),
        doc.page_size.height.twips(),
        doc.margins.top.twips(),
        doc.margins.right.twips(),
        doc.margins.bottom.twips(),
        doc.margins.left.twips(),
    );
    out.push_str("</w:body></w:document>");
    out
}

fn write_paragraph_properties(out: &mut String, align: Align, page_break: bool) {
    out.push_str("<w:pPr>");
    if page_break {
        out.push_str("<w:pageBreakBefore/>");
    }
    // Single-line fields must never be split by the word processor
    out.push_str("<w:keepLines/>");
    match align {
        Align::Left => out.push_str(r#"<w:jc w:val="left"/>"#),
        Align::Center => out.push_str(r#"<w:jc w:val="center"/>"#),
    }
    out.push_str("</w:pPr>");
}

fn write_paragraph(out: &mut String, paragraph: &Paragraph, font: &str, page_break: bool) {
    out.push_str("<w:p>");
    write_paragraph_properties(out, paragraph.align, page_break);
    for run in &paragraph.runs {
        write_run(out, run, font);
    }
    out.push_str("</w:p>");
}

fn write_run(out: &mut String, run: &Run, font: &str) {
    let font = escape(font);
    let size = half_points(run.size_pt);
    out.push_str("<w:r><w:rPr>");
    let _ = write!(
        out,
        r#"<w:rFonts w:ascii="{font}" w:hAnsi="{font}" w:cs="{font}"/>"#
    );
    if run.bold {
        out.push_str("<w:b/><w:bCs/>");
    }
    let _ = write!(out, r#"<w:color w:val="{}"/>"#, run.color.hex());
    let _ = write!(out, r#"<w:sz w:val="{size}"/><w:szCs w:val="{size}"/>"#);
    if run.underline {
        out.push_str(r#"<w:u w:val="single"/>"#);
    }
    let _ = write!(
        out,
        r#"</w:rPr><w:t xml:space="preserve">{}</w:t></w:r>"#,
        escape(&run.text)
    );
}

fn write_blank(out: &mut String, page_break: bool) {
    if page_break {
        out.push_str("<w:p><w:pPr><w:pageBreakBefore/></w:pPr></w:p>");
    } else {
        out.push_str("<w:p/>");
    }
}

fn write_picture(out: &mut String, picture: &Picture, id: u32, page_break: bool) {
    let cx = picture.width.emu();
    let cy = picture.height.emu();
    out.push_str("<w:p>");
    write_paragraph_properties(out, Align::Center, page_break);
    let _ = write!(
        out,
        concat!(
            r#"<w:r><w:drawing><wp:inline distT="0" distB="0" distL="0" distR="0">"#,
            r#"<wp:extent cx="{cx}" cy="{cy}"/>"#,
            r#"<wp:docPr id="{id}" name="Sticker {id}"/>"#,
            r#"<wp:cNvGraphicFramePr><a:graphicFrameLocks noChangeAspect="1"/></wp:cNvGraphicFramePr>"#,
            r#"<a:graphic><a:graphicData uri="{ns_pic}"><pic:pic>"#,
            r#"<pic:nvPicPr><pic:cNvPr id="{id}" name="sticker"/><pic:cNvPicPr/></pic:nvPicPr>"#,
            r#"<pic:blipFill><a:blip r:embed="{rel}"/><a:stretch><a:fillRect/></a:stretch></pic:blipFill>"#,
            r#"<pic:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm>"#,
            r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom></pic:spPr>"#,
            r#"</pic:pic></a:graphicData></a:graphic></wp:inline></w:drawing></w:r>"#,
        ),
        cx = cx,
        cy = cy,
        id = id,
        ns_pic = NS_PIC,
        rel = IMAGE_REL_ID,
    );
    out.push_str("</w:p>");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::Page;
    use crate::job::Color;
    use crate::layout::{Length, Margins, PageDimensions};

    fn run(text: &str) -> Run {
        Run {
            text: text.to_string(),
            size_pt: 23.0,
            bold: true,
            underline: false,
            color: Color::rgb(0, 0, 0),
        }
    }

    fn doc_with(pages: Vec<Page>) -> Document {
        Document {
            title: "t".to_string(),
            font_family: "Arial".to_string(),
            page_size: PageDimensions::letter(),
            margins: Margins::standard(),
            background: None,
            image: None,
            pages,
        }
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("A&B <c> \"d\" 'e'"), "A&amp;B &lt;c&gt; &quot;d&quot; &apos;e&apos;");
        assert_eq!(escape("tab\there"), "tab here");
        assert_eq!(escape("a\u{FFFE}b\u{FFFF}c\u{FFFD}"), "a b c\u{FFFD}");
    }

    #[test]
    fn test_half_points() {
        assert_eq!(half_points(23.0), 46);
        assert_eq!(half_points(14.0), 28);
        assert_eq!(half_points(10.5), 21);
        // Never rounds up past the fitted size
        assert_eq!(half_points(17.8), 35);
        assert_eq!(half_points(17.74), 35);
    }

    #[test]
    fn test_page_break_only_before_later_pages() {
        let page = |text: &str| Page {
            blocks: vec![Block::Paragraph(Paragraph {
                runs: vec![run(text)],
                align: Align::Center,
            })],
        };
        let xml = document_xml(&doc_with(vec![page("front"), page("back")]));
        assert_eq!(xml.matches("<w:pageBreakBefore/>").count(), 1);
        let brk = xml.find("<w:pageBreakBefore/>").unwrap();
        assert!(xml.find("front").unwrap() < brk);
        assert!(xml.find("back").unwrap() > brk);
    }

    #[test]
    fn test_run_formatting() {
        let mut underlined = run("FRONT SIDE");
        underlined.underline = true;
        let xml = document_xml(&doc_with(vec![Page {
            blocks: vec![Block::Paragraph(Paragraph {
                runs: vec![underlined],
                align: Align::Center,
            })],
        }]));
        assert!(xml.contains(r#"<w:sz w:val="46"/>"#));
        assert!(xml.contains("<w:b/>"));
        assert!(xml.contains(r#"<w:u w:val="single"/>"#));
        assert!(xml.contains(r#"<w:jc w:val="center"/>"#));
        assert!(xml.contains(r#"<w:pgSz w:w="12240" w:h="15840"/>"#));
    }

    #[test]
    fn test_picture_ids_are_unique() {
        let picture = Block::Picture(Picture {
            width: Length::from_inches(6.3),
            height: Length::from_inches(3.0),
        });
        let xml = document_xml(&doc_with(vec![
            Page { blocks: vec![picture.clone()] },
            Page { blocks: vec![picture] },
        ]));
        assert!(xml.contains(r#"<wp:docPr id="1""#));
        assert!(xml.contains(r#"<wp:docPr id="2""#));
        assert!(xml.contains(r#"cx="5760720""#));
    }
}
