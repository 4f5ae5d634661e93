//! Cell styles.
//!
//! Styles are plain values interned into a per-workbook [`StyleTable`]; cells
//! refer to them by [`StyleId`]. Interning the same value twice returns the same
//! id, so rewriting a block produces identical ids. `rust_xlsxwriter::Format`s are
//! only built when the workbook is serialized.

use serde::{Deserialize, Serialize};

/// Index into a [`StyleTable`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StyleId(pub u32);

/// 24-bit RGB color
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rgb(pub u32);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0x00_00_00);
    pub const WHITE: Rgb = Rgb(0xFF_FF_FF);
    /// Spreadsheet "Grey 25%"
    pub const GREY_25: Rgb = Rgb(0xC0_C0_C0);
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BorderLine {
    #[default]
    None,
    Thin,
    Medium,
    Dashed,
    Thick,
    Double,
}

/// One side of a cell border
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub line: BorderLine,
    pub color: Option<Rgb>,
}

impl Edge {
    pub fn new(line: BorderLine) -> Self {
        Self { line, color: None }
    }

    pub fn color(mut self, color: Rgb) -> Self {
        self.color = Some(color);
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Top,
    Bottom,
    Left,
    Right,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Borders {
    pub top: Edge,
    pub bottom: Edge,
    pub left: Edge,
    pub right: Edge,
}

impl Borders {
    /// Same edge on all four sides
    pub fn all(edge: Edge) -> Self {
        Self {
            top: edge,
            bottom: edge,
            left: edge,
            right: edge,
        }
    }

    pub fn get(&self, side: Side) -> Edge {
        match side {
            Side::Top => self.top,
            Side::Bottom => self.bottom,
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }

    pub fn set(&mut self, side: Side, edge: Edge) {
        match side {
            Side::Top => self.top = edge,
            Side::Bottom => self.bottom = edge,
            Side::Left => self.left = edge,
            Side::Right => self.right = edge,
        }
    }
}

/// Font definition; `None` fields fall back to the workbook default
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Font {
    pub name: Option<String>,
    /// Points
    pub size: Option<u16>,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikethrough: bool,
    pub color: Option<Rgb>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HAlign {
    #[default]
    General,
    Left,
    Center,
    Right,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VAlign {
    #[default]
    Bottom,
    Center,
    Top,
}

/// Complete, self-contained cell style
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellStyle {
    pub font: Font,
    /// Solid fill color
    pub fill: Option<Rgb>,
    pub borders: Borders,
    pub h_align: HAlign,
    pub v_align: VAlign,
    pub wrap: bool,
}

impl CellStyle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bold(mut self) -> Self {
        self.font.bold = true;
        self
    }

    pub fn italic(mut self) -> Self {
        self.font.italic = true;
        self
    }

    pub fn underline(mut self) -> Self {
        self.font.underline = true;
        self
    }

    pub fn size(mut self, points: u16) -> Self {
        self.font.size = Some(points);
        self
    }

    pub fn font_color(mut self, color: Rgb) -> Self {
        self.font.color = Some(color);
        self
    }

    pub fn fill(mut self, color: Rgb) -> Self {
        self.fill = Some(color);
        self
    }

    pub fn borders(mut self, edge: Edge) -> Self {
        self.borders = Borders::all(edge);
        self
    }

    pub fn align(mut self, align: HAlign) -> Self {
        self.h_align = align;
        self
    }

    /// Horizontally and vertically centred
    pub fn centered(mut self) -> Self {
        self.h_align = HAlign::Center;
        self.v_align = VAlign::Center;
        self
    }

    pub fn wrap(mut self) -> Self {
        self.wrap = true;
        self
    }
}

// ============================================================================
// Named roles
// ============================================================================

/// Named styles used by the two report layouts
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    // Attendance
    MonthHeader,
    BlockLabel,
    BlockValue,
    DayLabel,
    DayStatus,

    // Timesheet
    Title,
    InfoLabel,
    InfoValue,
    PeriodHeader,
    PeriodValue,
    ClientLabel,
    TableHeader,
    WorkRow,
    OffRow,
    Plain,
}

impl Role {
    pub fn style(self) -> CellStyle {
        let thin = Edge::new(BorderLine::Thin);
        let double = Edge::new(BorderLine::Double);
        let dashed = Edge::new(BorderLine::Dashed).color(Rgb::GREY_25);

        match self {
            Role::MonthHeader => CellStyle::new()
                .bold()
                .size(12)
                .centered()
                .fill(Rgb::GREY_25)
                .borders(Edge::new(BorderLine::Thick)),
            Role::BlockLabel | Role::BlockValue | Role::DayLabel => {
                CellStyle::new().bold().centered().borders(thin)
            }
            Role::DayStatus => CellStyle::new().centered().borders(thin),

            Role::Title => CellStyle::new()
                .bold()
                .underline()
                .size(16)
                .centered()
                .borders(double),
            Role::InfoLabel => CellStyle::new().bold().italic().align(HAlign::Right),
            Role::InfoValue => CellStyle::new().align(HAlign::Left),
            Role::PeriodHeader => CellStyle::new()
                .bold()
                .font_color(Rgb::BLACK)
                .fill(Rgb::GREY_25)
                .borders(double)
                .centered(),
            Role::PeriodValue => CellStyle::new().borders(double).centered(),
            Role::ClientLabel => CellStyle::new()
                .bold()
                .font_color(Rgb::WHITE)
                .fill(Rgb::GREY_25)
                .borders(double)
                .centered(),
            Role::TableHeader => CellStyle::new().bold().centered(),
            Role::WorkRow => CellStyle::new().borders(dashed).centered(),
            Role::OffRow => CellStyle::new()
                .borders(dashed)
                .fill(Rgb::GREY_25)
                .centered(),
            Role::Plain => CellStyle::new(),
        }
    }
}

// ============================================================================
// Style table
// ============================================================================

/// Per-workbook table of interned styles
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StyleTable {
    styles: Vec<CellStyle>,
}

impl StyleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id of `style`, adding it when not yet present
    pub fn intern(&mut self, style: &CellStyle) -> StyleId {
        if let Some(pos) = self.styles.iter().position(|s| s == style) {
            return StyleId(pos as u32);
        }
        self.styles.push(style.clone());
        StyleId((self.styles.len() - 1) as u32)
    }

    pub fn role(&mut self, role: Role) -> StyleId {
        self.intern(&role.style())
    }

    pub fn get(&self, id: StyleId) -> Option<&CellStyle> {
        self.styles.get(id.0 as usize)
    }

    /// The style for `id`, or the default style when `id` is `None` or unknown
    pub fn resolve(&self, id: Option<StyleId>) -> CellStyle {
        id.and_then(|id| self.get(id)).cloned().unwrap_or_default()
    }

    /// `base` with one border side replaced
    pub fn with_edge(&mut self, base: Option<StyleId>, side: Side, edge: Edge) -> StyleId {
        let mut style = self.resolve(base);
        style.borders.set(side, edge);
        self.intern(&style)
    }

    /// `base` with a solid fill
    pub fn with_fill(&mut self, base: Option<StyleId>, color: Rgb) -> StyleId {
        let mut style = self.resolve(base);
        style.fill = Some(color);
        self.intern(&style)
    }

    pub fn iter(&self) -> impl Iterator<Item = (StyleId, &CellStyle)> {
        self.styles
            .iter()
            .enumerate()
            .map(|(i, s)| (StyleId(i as u32), s))
    }

    pub fn len(&self) -> usize {
        self.styles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }
}
