//! In-memory workbook model.
//!
//! A [`Workbook`] is an ordered list of [`Sheet`]s plus a shared [`StyleTable`].
//! Sheets carry explicit owner metadata (employee id, and month for
//! timesheets); lookups go through that metadata and never parse the
//! display name.
//!
//! Coordinates are zero-based `(row, col)`, as in `rust_xlsxwriter`.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

use regex::Regex;
use rollcall_core::{Employee, EmployeeId};
use serde::{Deserialize, Serialize};

use crate::style::{Edge, Side, StyleId, StyleTable};
use crate::{col_to_letter, RenderError};

/// Longest sheet name a spreadsheet accepts
pub const MAX_SHEET_NAME: usize = 31;

// ============================================================================
// Geometry
// ============================================================================

/// Inclusive cell rectangle
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Rect {
    pub first_row: u32,
    pub first_col: u16,
    pub last_row: u32,
    pub last_col: u16,
}

impl Rect {
    /// Rectangle spanning the two corners, in either order
    pub fn new(row_a: u32, col_a: u16, row_b: u32, col_b: u16) -> Self {
        Self {
            first_row: row_a.min(row_b),
            first_col: col_a.min(col_b),
            last_row: row_a.max(row_b),
            last_col: col_a.max(col_b),
        }
    }

    pub fn cell(row: u32, col: u16) -> Self {
        Self::new(row, col, row, col)
    }

    pub fn contains(&self, row: u32, col: u16) -> bool {
        (self.first_row..=self.last_row).contains(&row)
            && (self.first_col..=self.last_col).contains(&col)
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.first_row <= other.last_row
            && other.first_row <= self.last_row
            && self.first_col <= other.last_col
            && other.first_col <= self.last_col
    }

    pub fn is_single_cell(&self) -> bool {
        self.first_row == self.last_row && self.first_col == self.last_col
    }

    /// Every `(row, col)` in the rectangle, row-major
    pub fn cells(&self) -> impl Iterator<Item = (u32, u16)> + '_ {
        (self.first_row..=self.last_row)
            .flat_map(move |r| (self.first_col..=self.last_col).map(move |c| (r, c)))
    }
}

impl std::fmt::Display for Rect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}{}:{}{}",
            col_to_letter(self.first_col),
            self.first_row + 1,
            col_to_letter(self.last_col),
            self.last_row + 1
        )
    }
}

/// Merged regions of a sheet, non-overlapping
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MergeIndex {
    regions: BTreeSet<Rect>,
}

impl MergeIndex {
    /// Add a merged region. Single cells and overlaps are rejected.
    pub fn insert(&mut self, rect: Rect) -> Result<(), RenderError> {
        if rect.is_single_cell() {
            return Err(RenderError::InvalidData(format!(
                "cannot merge single cell {rect}"
            )));
        }
        if let Some(existing) = self.intersecting(&rect).first() {
            return Err(RenderError::InvalidData(format!(
                "merge {rect} overlaps existing merge {existing}"
            )));
        }
        self.regions.insert(rect);
        Ok(())
    }

    /// Regions sharing at least one cell with `rect`
    pub fn intersecting(&self, rect: &Rect) -> Vec<Rect> {
        self.regions
            .iter()
            .filter(|r| r.intersects(rect))
            .copied()
            .collect()
    }

    /// Remove and return every region intersecting `rect`
    pub fn remove_intersecting(&mut self, rect: &Rect) -> Vec<Rect> {
        let hits = self.intersecting(rect);
        for hit in &hits {
            self.regions.remove(hit);
        }
        hits
    }

    /// The region whose top-left cell is `(row, col)`
    pub fn anchored_at(&self, row: u32, col: u16) -> Option<Rect> {
        self.regions
            .iter()
            .find(|r| r.first_row == row && r.first_col == col)
            .copied()
    }

    pub fn contains(&self, rect: &Rect) -> bool {
        self.regions.contains(rect)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rect> {
        self.regions.iter()
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

// ============================================================================
// Cells
// ============================================================================

/// Typed cell content
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum CellValue {
    String(String),
    Number(f64),
    Bool(bool),
    /// Formula text, with or without the leading `=`
    Formula(String),
    Blank,
}

impl CellValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::String(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::String(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<u32> for CellValue {
    fn from(n: u32) -> Self {
        CellValue::Number(f64::from(n))
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub value: CellValue,
    pub style: Option<StyleId>,
}

/// Cell note
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub text: String,
    pub author: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hyperlink {
    pub url: String,
    /// Display text; the cell value is shown when absent
    pub text: Option<String>,
    pub tip: Option<String>,
}

/// Where an image sits: top-left cell, pixel offset inside it, and size
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImageAnchor {
    pub row: u32,
    pub col: u16,
    pub x_offset: u32,
    pub y_offset: u32,
    pub width: f64,
    pub height: f64,
}

/// Embedded picture (PNG/JPEG bytes)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub bytes: Vec<u8>,
    pub anchor: ImageAnchor,
}

/// Serialize maps with tuple keys as `[key, value]` pairs
mod entries {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::BTreeMap;

    pub fn serialize<S, K, V>(map: &BTreeMap<K, V>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        K: Serialize,
        V: Serialize,
    {
        serializer.collect_seq(map.iter())
    }

    pub fn deserialize<'de, D, K, V>(deserializer: D) -> Result<BTreeMap<K, V>, D::Error>
    where
        D: Deserializer<'de>,
        K: Deserialize<'de> + Ord,
        V: Deserialize<'de>,
    {
        let pairs: Vec<(K, V)> = Vec::deserialize(deserializer)?;
        Ok(pairs.into_iter().collect())
    }
}

// ============================================================================
// Sheet
// ============================================================================

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Sheet {
    pub name: String,
    /// Employee the sheet belongs to
    pub owner: Option<EmployeeId>,
    /// Month the sheet covers (timesheets only)
    pub month: Option<u32>,
    #[serde(with = "entries")]
    cells: BTreeMap<(u32, u16), Cell>,
    merges: MergeIndex,
    pub column_widths: BTreeMap<u16, f64>,
    pub row_heights: BTreeMap<u32, f64>,
    #[serde(with = "entries")]
    comments: BTreeMap<(u32, u16), Comment>,
    #[serde(with = "entries")]
    hyperlinks: BTreeMap<(u32, u16), Hyperlink>,
    pub images: Vec<Image>,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set the owning employee
    pub fn owned_by(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    /// Set the month covered
    pub fn for_month(mut self, month: u32) -> Self {
        self.month = Some(month);
        self
    }

    pub fn is_owned_by(&self, owner: &str) -> bool {
        self.owner.as_deref() == Some(owner)
    }

    pub fn cell(&self, row: u32, col: u16) -> Option<&Cell> {
        self.cells.get(&(row, col))
    }

    pub fn value(&self, row: u32, col: u16) -> Option<&CellValue> {
        self.cell(row, col).map(|c| &c.value)
    }

    /// String content of a cell
    pub fn text(&self, row: u32, col: u16) -> Option<&str> {
        self.value(row, col).and_then(CellValue::as_str)
    }

    pub fn style_at(&self, row: u32, col: u16) -> Option<StyleId> {
        self.cell(row, col).and_then(|c| c.style)
    }

    /// Write a value and style, replacing whatever was there
    pub fn write(&mut self, row: u32, col: u16, value: impl Into<CellValue>, style: Option<StyleId>) {
        self.cells.insert(
            (row, col),
            Cell {
                value: value.into(),
                style,
            },
        );
    }

    /// Change a cell's style, creating a blank cell if needed
    pub fn restyle(&mut self, row: u32, col: u16, style: StyleId) {
        self.cells
            .entry((row, col))
            .or_insert(Cell {
                value: CellValue::Blank,
                style: None,
            })
            .style = Some(style);
    }

    /// Rewrite every cell's style id through `f`
    pub fn remap_styles(&mut self, mut f: impl FnMut(StyleId) -> StyleId) {
        for cell in self.cells.values_mut() {
            cell.style = cell.style.map(&mut f);
        }
    }

    /// Fill every cell of `rect` with blank content in `style`
    pub fn fill_blank(&mut self, rect: Rect, style: StyleId) {
        for (row, col) in rect.cells() {
            self.restyle(row, col, style);
        }
    }

    pub fn cells(&self) -> impl Iterator<Item = ((u32, u16), &Cell)> {
        self.cells.iter().map(|(k, v)| (*k, v))
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn merge(&mut self, rect: Rect) -> Result<(), RenderError> {
        self.merges.insert(rect)
    }

    pub fn merges(&self) -> &MergeIndex {
        &self.merges
    }

    pub fn set_column_width(&mut self, col: u16, width: f64) {
        self.column_widths.insert(col, width);
    }

    pub fn set_row_height(&mut self, row: u32, height: f64) {
        self.row_heights.insert(row, height);
    }

    pub fn add_comment(&mut self, row: u32, col: u16, comment: Comment) {
        self.comments.insert((row, col), comment);
    }

    pub fn comments(&self) -> impl Iterator<Item = ((u32, u16), &Comment)> {
        self.comments.iter().map(|(k, v)| (*k, v))
    }

    pub fn add_hyperlink(&mut self, row: u32, col: u16, link: Hyperlink) {
        self.hyperlinks.insert((row, col), link);
    }

    pub fn hyperlinks(&self) -> impl Iterator<Item = ((u32, u16), &Hyperlink)> {
        self.hyperlinks.iter().map(|(k, v)| (*k, v))
    }

    pub fn add_image(&mut self, image: Image) {
        self.images.push(image);
    }

    /// Clear a rectangle: drop every merge touching it, then every cell,
    /// comment, hyperlink and image anchored strictly inside it.
    ///
    /// Returns the merges that were removed. Cells outside `rect` are untouched,
    /// including the outside parts of a removed merge.
    pub fn clear_region(&mut self, rect: Rect) -> Vec<Rect> {
        let removed = self.merges.remove_intersecting(&rect);
        self.cells.retain(|&(r, c), _| !rect.contains(r, c));
        self.comments.retain(|&(r, c), _| !rect.contains(r, c));
        self.hyperlinks.retain(|&(r, c), _| !rect.contains(r, c));
        self.images
            .retain(|img| !rect.contains(img.anchor.row, img.anchor.col));
        removed
    }

    /// Draw an edge around the outside of `rect`, keeping each cell's other
    /// style properties
    pub fn outline(&mut self, styles: &mut StyleTable, rect: Rect, edge: Edge) {
        for col in rect.first_col..=rect.last_col {
            self.set_edge(styles, rect.first_row, col, Side::Top, edge);
            self.set_edge(styles, rect.last_row, col, Side::Bottom, edge);
        }
        for row in rect.first_row..=rect.last_row {
            self.set_edge(styles, row, rect.first_col, Side::Left, edge);
            self.set_edge(styles, row, rect.last_col, Side::Right, edge);
        }
    }

    fn set_edge(&mut self, styles: &mut StyleTable, row: u32, col: u16, side: Side, edge: Edge) {
        let id = styles.with_edge(self.style_at(row, col), side, edge);
        self.restyle(row, col, id);
    }

    /// Add a solid fill to every cell of `rect`, keeping other properties
    pub fn shade(&mut self, styles: &mut StyleTable, rect: Rect, color: crate::style::Rgb) {
        for (row, col) in rect.cells() {
            let id = styles.with_fill(self.style_at(row, col), color);
            self.restyle(row, col, id);
        }
    }
}

// ============================================================================
// Workbook
// ============================================================================

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Workbook {
    sheets: Vec<Sheet>,
    pub styles: StyleTable,
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn sheet_mut(&mut self, name: &str) -> Option<&mut Sheet> {
        self.sheets.iter_mut().find(|s| s.name == name)
    }

    /// Sheets belonging to an employee, in workbook order
    pub fn sheets_owned_by<'a>(&'a self, owner: &'a str) -> impl Iterator<Item = &'a Sheet> + 'a {
        self.sheets.iter().filter(move |s| s.is_owned_by(owner))
    }

    /// Attendance sheet of an employee
    pub fn sheet_by_owner<'a>(&'a self, owner: &'a str) -> Option<&'a Sheet> {
        self.sheets_owned_by(owner).next()
    }

    /// Timesheet of an employee for one month
    pub fn sheet_for_month(&self, owner: &str, month: u32) -> Option<&Sheet> {
        self.sheets
            .iter()
            .find(|s| s.is_owned_by(owner) && s.month == Some(month))
    }

    pub fn len(&self) -> usize {
        self.sheets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }

    /// Append a sheet, renaming it if its name is taken
    pub fn push_sheet(&mut self, mut sheet: Sheet) -> &mut Sheet {
        sheet.name = self.unique_name(&sheet.name);
        self.sheets.push(sheet);
        let last = self.sheets.len() - 1;
        &mut self.sheets[last]
    }

    pub fn remove_sheet(&mut self, name: &str) -> Option<Sheet> {
        let pos = self.sheets.iter().position(|s| s.name == name)?;
        Some(self.sheets.remove(pos))
    }

    /// The employee's sheet, created with a sanitized first-name key when
    /// absent. Lookup is by owner id, so renaming the employee keeps the sheet.
    pub fn employee_sheet_or_insert(&mut self, employee: &Employee) -> &mut Sheet {
        let pos = self.employee_sheet_position(employee);
        &mut self.sheets[pos]
    }

    /// Run `f` on the employee's sheet (see [`Self::employee_sheet_or_insert`])
    /// together with the workbook's style table
    pub fn with_employee_sheet<R>(
        &mut self,
        employee: &Employee,
        f: impl FnOnce(&mut Sheet, &mut StyleTable) -> R,
    ) -> R {
        let pos = self.employee_sheet_position(employee);
        f(&mut self.sheets[pos], &mut self.styles)
    }

    fn employee_sheet_position(&mut self, employee: &Employee) -> usize {
        if let Some(pos) = self
            .sheets
            .iter()
            .position(|s| s.is_owned_by(&employee.employee_id))
        {
            return pos;
        }
        let name = sanitize_sheet_name(employee.first_name());
        self.push_sheet(Sheet::new(name).owned_by(&employee.employee_id));
        self.sheets.len() - 1
    }

    /// Put `sheet` in place of the sheet with the same owner and month,
    /// or append it when there is none
    pub fn replace_month_sheet(&mut self, mut sheet: Sheet) -> &mut Sheet {
        let existing = self
            .sheets
            .iter()
            .position(|s| s.owner == sheet.owner && s.month == sheet.month);

        match existing {
            Some(pos) => {
                let old = self.sheets.remove(pos);
                sheet.name = if old.name == sheet.name {
                    old.name
                } else {
                    self.unique_name(&sheet.name)
                };
                self.sheets.insert(pos, sheet);
                &mut self.sheets[pos]
            }
            None => self.push_sheet(sheet),
        }
    }

    /// `base`, or `base (2)`, `base (3)`... if taken. Names compare
    /// case-insensitively, as spreadsheets do.
    fn unique_name(&self, base: &str) -> String {
        let taken = |name: &str| {
            self.sheets
                .iter()
                .any(|s| s.name.to_lowercase() == name.to_lowercase())
        };
        if !taken(base) {
            return base.to_string();
        }

        (2..)
            .map(|n| {
                let suffix = format!(" ({n})");
                let room = MAX_SHEET_NAME.saturating_sub(suffix.chars().count());
                let stem: String = base.chars().take(room).collect();
                format!("{stem}{suffix}")
            })
            .find(|candidate| !taken(candidate))
            .unwrap_or_else(|| base.to_string())
    }
}

/// Strip characters spreadsheets forbid in sheet names (`[ ] : * ? / \`),
/// trim surrounding apostrophes and whitespace, cap at 31 characters.
/// Falls back to "Employee" when nothing is left.
pub fn sanitize_sheet_name(raw: &str) -> String {
    static FORBIDDEN: OnceLock<Regex> = OnceLock::new();
    let re = FORBIDDEN.get_or_init(|| Regex::new(r"[\[\]:*?/\\]").expect("valid regex"));

    let cleaned = re.replace_all(raw, "");
    let capped: String = cleaned.trim().chars().take(MAX_SHEET_NAME).collect();
    let trimmed = capped.trim().trim_matches('\'').trim();
    if trimmed.is_empty() {
        return "Employee".to_string();
    }
    trimmed.to_string()
}
