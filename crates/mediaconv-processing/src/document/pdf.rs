//! Minimal PDF writer built on lopdf.
//!
//! Text pages use the standard Helvetica font, so no font file is embedded.
//! Images are embedded as baseline JPEG (`DCTDecode`) on a page sized to the
//! image at 100 dpi.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use mediaconv_core::ConvertError;
use std::path::Path;

/// US letter, in points
const PAGE_WIDTH: i64 = 612;
const PAGE_HEIGHT: i64 = 792;

const FONT_SIZE: i64 = 12;
const LINE_HEIGHT: i64 = 15;
const MARGIN_LEFT: i64 = 50;
const TOP_Y: i64 = 750;
const BOTTOM_Y: i64 = 50;

/// Resolution used to size image pages
const IMAGE_DPI: u32 = 100;

/// Write `lines` as left-aligned text, one line per row, breaking to a new
/// page when the cursor drops below the bottom margin.
///
/// Blank lines are skipped. The result always has at least one page.
pub fn write_text_pdf<S: AsRef<str>>(lines: &[S], path: &Path) -> Result<(), ConvertError> {
    let pages = layout_pages(lines);

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids = Vec::with_capacity(pages.len());
    for page in &pages {
        let mut operations = Vec::with_capacity(page.len() * 4);
        for (y, text) in page {
            operations.push(Operation::new("BT", vec![]));
            operations.push(Operation::new("Tf", vec!["F1".into(), FONT_SIZE.into()]));
            operations.push(Operation::new("Td", vec![MARGIN_LEFT.into(), (*y).into()]));
            operations.push(Operation::new(
                "Tj",
                vec![Object::string_literal(to_win_ansi(text))],
            ));
            operations.push(Operation::new("ET", vec![]));
        }
        let content = Content { operations };
        kids.push(add_page(&mut doc, pages_id, content, None)?);
    }

    finish(doc, pages_id, kids, Some(resources_id), path)
}

/// Embed one JPEG image filling a single page.
pub fn write_image_pdf(
    jpeg: Vec<u8>,
    width: u32,
    height: u32,
    path: &Path,
) -> Result<(), ConvertError> {
    let (page_w, page_h) = image_page_size(width, height);

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let image_id = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => i64::from(width),
            "Height" => i64::from(height),
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
            "Filter" => "DCTDecode",
        },
        jpeg,
    ));
    let resources_id = doc.add_object(dictionary! {
        "XObject" => dictionary! { "Im1" => image_id },
    });

    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    page_w.into(),
                    0.into(),
                    0.into(),
                    page_h.into(),
                    0.into(),
                    0.into(),
                ],
            ),
            Operation::new("Do", vec!["Im1".into()]),
            Operation::new("Q", vec![]),
        ],
    };
    let page_id = add_page(&mut doc, pages_id, content, Some((page_w, page_h)))?;

    finish(doc, pages_id, vec![page_id], Some(resources_id), path)
}

/// Number of pages in the PDF at `path`.
pub fn page_count(path: &Path) -> Result<usize, ConvertError> {
    let doc = Document::load(path).map_err(|e| ConvertError::Document(e.to_string()))?;
    Ok(doc.get_pages().len())
}

/// Assign a baseline y to every non-blank line and group them into pages.
fn layout_pages<S: AsRef<str>>(lines: &[S]) -> Vec<Vec<(i64, String)>> {
    let mut pages = vec![Vec::new()];
    let mut y = TOP_Y;

    for line in lines {
        let text = line.as_ref().trim_end();
        if text.trim().is_empty() {
            continue;
        }
        if y < BOTTOM_Y {
            pages.push(Vec::new());
            y = TOP_Y;
        }
        if let Some(page) = pages.last_mut() {
            page.push((y, text.to_string()));
        }
        y -= LINE_HEIGHT;
    }

    pages
}

fn image_page_size(width: u32, height: u32) -> (i64, i64) {
    let to_points = |px: u32| ((i64::from(px) * 72) / i64::from(IMAGE_DPI)).max(1);
    (to_points(width), to_points(height))
}

fn add_page(
    doc: &mut Document,
    pages_id: ObjectId,
    content: Content,
    media_box: Option<(i64, i64)>,
) -> Result<ObjectId, ConvertError> {
    let encoded = content
        .encode()
        .map_err(|e| ConvertError::Document(e.to_string()))?;
    let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));

    let mut page = dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    };
    if let Some((w, h)) = media_box {
        page.set("MediaBox", media_box_of(w, h));
    }
    Ok(doc.add_object(page))
}

fn media_box_of(width: i64, height: i64) -> Vec<Object> {
    vec![0.into(), 0.into(), width.into(), height.into()]
}

fn finish(
    mut doc: Document,
    pages_id: ObjectId,
    kids: Vec<ObjectId>,
    resources_id: Option<ObjectId>,
    path: &Path,
) -> Result<(), ConvertError> {
    let count = kids.len() as i64;
    let mut pages = dictionary! {
        "Type" => "Pages",
        "Kids" => kids.into_iter().map(Object::from).collect::<Vec<_>>(),
        "Count" => count,
        "MediaBox" => media_box_of(PAGE_WIDTH, PAGE_HEIGHT),
    };
    if let Some(id) = resources_id {
        pages.set("Resources", id);
    }
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    doc.save(path)?;
    Ok(())
}

/// Helvetica only covers Latin-1 here; anything outside becomes `?`.
fn to_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '\t' => b' ',
            c if (c as u32) < 0x20 => b' ',
            // C1 controls have no glyph; CP1252 puts punctuation there instead.
            c if (0x80..=0x9F).contains(&(c as u32)) => b'?',
            c if (c as u32) <= 0xFF => c as u32 as u8,
            c => cp1252_extra(c).unwrap_or(b'?'),
        })
        .collect()
}

/// Code points that CP1252 maps into 0x80..=0x9F.
fn cp1252_extra(c: char) -> Option<u8> {
    let byte = match c {
        '\u{20AC}' => 0x80,
        '\u{201A}' => 0x82,
        '\u{0192}' => 0x83,
        '\u{201E}' => 0x84,
        '\u{2026}' => 0x85,
        '\u{2020}' => 0x86,
        '\u{2021}' => 0x87,
        '\u{02C6}' => 0x88,
        '\u{2030}' => 0x89,
        '\u{0160}' => 0x8A,
        '\u{2039}' => 0x8B,
        '\u{0152}' => 0x8C,
        '\u{017D}' => 0x8E,
        '\u{2018}' => 0x91,
        '\u{2019}' => 0x92,
        '\u{201C}' => 0x93,
        '\u{201D}' => 0x94,
        '\u{2022}' => 0x95,
        '\u{2013}' => 0x96,
        '\u{2014}' => 0x97,
        '\u{02DC}' => 0x98,
        '\u{2122}' => 0x99,
        '\u{0161}' => 0x9A,
        '\u{203A}' => 0x9B,
        '\u{0153}' => 0x9C,
        '\u{017E}' => 0x9E,
        '\u{0178}' => 0x9F,
        _ => return None,
    };
    Some(byte)
}
