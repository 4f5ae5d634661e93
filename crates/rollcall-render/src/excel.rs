//! XLSX serialization.
//!
//! Converts the in-memory [`Workbook`] model into XLSX bytes with
//! `rust_xlsxwriter`. One `Format` is built per interned style, then every
//! sheet is written in order:
//!
//! 1. column widths and row heights
//! 2. merged ranges (blank, with the top-left cell's format)
//! 3. cells, overwriting the merge placeholders
//! 4. hyperlinks, notes and images

use rust_xlsxwriter::{
    Color, Format, FormatAlign, FormatBorder, FormatPattern, FormatUnderline, Image as XlsxImage,
    Note, Url, Workbook as XlsxWorkbook, Worksheet,
};
use tracing::debug;

use crate::style::{BorderLine, CellStyle, HAlign, Rgb, StyleId, VAlign};
use crate::workbook::{CellValue, Sheet, Workbook};
use crate::RenderError;

/// XLSX writer for [`Workbook`]s
#[derive(Clone, Debug, Default)]
pub struct ExcelRenderer {
    /// Author stored in the document properties
    pub author: Option<String>,
}

impl ExcelRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the document author
    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    /// Generate XLSX bytes
    pub fn render(&self, workbook: &Workbook) -> Result<Vec<u8>, RenderError> {
        let mut xlsx = XlsxWorkbook::new();

        if let Some(author) = &self.author {
            let properties = rust_xlsxwriter::DocProperties::new().set_author(author);
            xlsx.set_properties(&properties);
        }

        let formats = Self::create_formats(workbook);

        for sheet in workbook.sheets() {
            let worksheet = xlsx.add_worksheet();
            Self::write_sheet(worksheet, sheet, &formats)?;
        }

        let bytes = xlsx
            .save_to_buffer()
            .map_err(|e| RenderError::Format(format!("Failed to create Excel: {e}")))?;
        debug!(sheets = workbook.len(), bytes = bytes.len(), "rendered workbook");
        Ok(bytes)
    }

    /// One `Format` per style id, in table order
    fn create_formats(workbook: &Workbook) -> Vec<Format> {
        workbook
            .styles
            .iter()
            .map(|(_, style)| to_format(style))
            .collect()
    }

    fn write_sheet(
        worksheet: &mut Worksheet,
        sheet: &Sheet,
        formats: &[Format],
    ) -> Result<(), RenderError> {
        let default_format = Format::new();
        let format_of = |style: Option<StyleId>| {
            style
                .and_then(|id| formats.get(id.0 as usize))
                .unwrap_or(&default_format)
        };

        worksheet
            .set_name(&sheet.name)
            .map_err(|e| RenderError::Format(e.to_string()))?;

        for (&col, &width) in &sheet.column_widths {
            worksheet
                .set_column_width(col, width)
                .map_err(|e| RenderError::Format(e.to_string()))?;
        }
        for (&row, &height) in &sheet.row_heights {
            worksheet
                .set_row_height(row, height)
                .map_err(|e| RenderError::Format(e.to_string()))?;
        }

        for rect in sheet.merges().iter() {
            let format = format_of(sheet.style_at(rect.first_row, rect.first_col));
            worksheet
                .merge_range(
                    rect.first_row,
                    rect.first_col,
                    rect.last_row,
                    rect.last_col,
                    "",
                    format,
                )
                .map_err(|e| RenderError::Format(e.to_string()))?;
        }

        for ((row, col), cell) in sheet.cells() {
            let format = format_of(cell.style);
            match &cell.value {
                CellValue::String(s) => worksheet
                    .write_string_with_format(row, col, s, format)
                    .map(|_| ()),
                CellValue::Number(n) => worksheet
                    .write_number_with_format(row, col, *n, format)
                    .map(|_| ()),
                CellValue::Bool(b) => worksheet
                    .write_boolean_with_format(row, col, *b, format)
                    .map(|_| ()),
                CellValue::Formula(f) => worksheet
                    .write_formula_with_format(row, col, f.as_str(), format)
                    .map(|_| ()),
                CellValue::Blank => {
                    // An unstyled blank has nothing to show; the file simply omits the cell
                    if cell.style.is_none() {
                        continue;
                    }
                    worksheet.write_blank(row, col, format).map(|_| ())
                }
            }
            .map_err(|e| RenderError::Format(e.to_string()))?;
        }

        for ((row, col), link) in sheet.hyperlinks() {
            let mut url = Url::new(link.url.as_str());
            if let Some(tip) = &link.tip {
                url = url.set_tip(tip.as_str());
            }
            let text = link
                .text
                .as_deref()
                .or_else(|| sheet.text(row, col))
                .unwrap_or(link.url.as_str());
            worksheet
                .write_url_with_text(row, col, &url, text)
                .map_err(|e| RenderError::Format(e.to_string()))?;
        }

        for ((row, col), comment) in sheet.comments() {
            let mut note = Note::new(comment.text.as_str()).add_author_prefix(false);
            if let Some(author) = &comment.author {
                note = note.set_author(author.as_str());
            }
            worksheet
                .insert_note(row, col, &note)
                .map_err(|e| RenderError::Format(e.to_string()))?;
        }

        for image in &sheet.images {
            let anchor = image.anchor;
            let picture = decode_image(&image.bytes)?.set_scale_to_size(anchor.width, anchor.height, true);
            worksheet
                .insert_image_with_offset(
                    anchor.row,
                    anchor.col,
                    &picture,
                    anchor.x_offset,
                    anchor.y_offset,
                )
                .map_err(|e| RenderError::Format(e.to_string()))?;
        }

        Ok(())
    }
}

fn decode_image(bytes: &[u8]) -> Result<XlsxImage, RenderError> {
    XlsxImage::new_from_buffer(bytes)
        .map_err(|e| RenderError::InvalidData(format!("unreadable image: {e}")))
}

/// Fail unless `bytes` is an image type XLSX output can embed
pub fn check_image(bytes: &[u8]) -> Result<(), RenderError> {
    decode_image(bytes).map(|_| ())
}

fn color(rgb: Rgb) -> Color {
    Color::RGB(rgb.0)
}

fn border(line: BorderLine) -> FormatBorder {
    match line {
        BorderLine::None => FormatBorder::None,
        BorderLine::Thin => FormatBorder::Thin,
        BorderLine::Medium => FormatBorder::Medium,
        BorderLine::Dashed => FormatBorder::Dashed,
        BorderLine::Thick => FormatBorder::Thick,
        BorderLine::Double => FormatBorder::Double,
    }
}

/// Build the `rust_xlsxwriter` format for a style
pub fn to_format(style: &CellStyle) -> Format {
    let mut f = Format::new();

    let font = &style.font;
    if font.bold {
        f = f.set_bold();
    }
    if font.italic {
        f = f.set_italic();
    }
    if font.underline {
        f = f.set_underline(FormatUnderline::Single);
    }
    if font.strikethrough {
        f = f.set_font_strikethrough();
    }
    if let Some(name) = &font.name {
        f = f.set_font_name(name.as_str());
    }
    if let Some(size) = font.size {
        f = f.set_font_size(f64::from(size));
    }
    if let Some(c) = font.color {
        f = f.set_font_color(color(c));
    }

    if let Some(fill) = style.fill {
        f = f
            .set_pattern(FormatPattern::Solid)
            .set_background_color(color(fill));
    }

    let b = &style.borders;
    if b.top.line != BorderLine::None {
        f = f.set_border_top(border(b.top.line));
    }
    if b.bottom.line != BorderLine::None {
        f = f.set_border_bottom(border(b.bottom.line));
    }
    if b.left.line != BorderLine::None {
        f = f.set_border_left(border(b.left.line));
    }
    if b.right.line != BorderLine::None {
        f = f.set_border_right(border(b.right.line));
    }
    if let Some(c) = b.top.color {
        f = f.set_border_top_color(color(c));
    }
    if let Some(c) = b.bottom.color {
        f = f.set_border_bottom_color(color(c));
    }
    if let Some(c) = b.left.color {
        f = f.set_border_left_color(color(c));
    }
    if let Some(c) = b.right.color {
        f = f.set_border_right_color(color(c));
    }

    match style.h_align {
        HAlign::General => {}
        HAlign::Left => f = f.set_align(FormatAlign::Left),
        HAlign::Center => f = f.set_align(FormatAlign::Center),
        HAlign::Right => f = f.set_align(FormatAlign::Right),
    }
    match style.v_align {
        VAlign::Bottom => {}
        VAlign::Center => f = f.set_align(FormatAlign::VerticalCenter),
        VAlign::Top => f = f.set_align(FormatAlign::Top),
    }
    if style.wrap {
        f = f.set_text_wrap();
    }

    f
}
