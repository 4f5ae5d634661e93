//! Copy one employee's sheets out of a container.

use std::collections::HashMap;

use rollcall_render::{ExcelRenderer, StyleId, Workbook};
use tracing::debug;

use crate::StoreError;

/// Deep-copy every sheet owned by `employee_id` into a new workbook.
///
/// Styles are re-interned into the new workbook's own table, so the result
/// shares nothing with `source`. No matching sheet gives an empty workbook.
pub fn extract(source: &Workbook, employee_id: &str) -> Workbook {
    let mut out = Workbook::new();
    let mut remapped: HashMap<StyleId, StyleId> = HashMap::new();

    for sheet in source.sheets_owned_by(employee_id) {
        let mut copy = sheet.clone();
        copy.remap_styles(|id| {
            *remapped
                .entry(id)
                .or_insert_with(|| out.styles.intern(&source.styles.resolve(Some(id))))
        });
        out.push_sheet(copy);
    }

    debug!(
        employee = employee_id,
        sheets = out.len(),
        styles = out.styles.len(),
        "extracted sheets"
    );
    out
}

/// [`extract`], rendered as XLSX bytes
pub fn extract_bytes(source: &Workbook, employee_id: &str) -> Result<Vec<u8>, StoreError> {
    let workbook = extract(source, employee_id);
    Ok(ExcelRenderer::new().render(&workbook)?)
}
