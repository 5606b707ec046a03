use std::sync::LazyLock;

use regex::Regex;

use super::record::{DataRecord, FieldKey};

static PRICE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[￥¥]?[,.]*[0-9][,.0-9]*(%|元)?").unwrap());

const ID_BRACKETS: [char; 2] = ['（', '）'];

/// First currency/number token with symbols, "元" and separators stripped.
/// Values with no digits come back unchanged.
pub fn normalize_price(raw: &str) -> String {
    match PRICE_RE.find(raw) {
        Some(m) => m.as_str().replace(['￥', '¥', '元', ','], ""),
        None => raw.to_string(),
    }
}

/// Cut an identifier at its first full-width bracket, unless the bracket is
/// the first character.
pub fn truncate_identifier(raw: &str) -> String {
    match raw.find(ID_BRACKETS) {
        Some(idx) if idx > 0 => raw[..idx].to_string(),
        _ => raw.to_string(),
    }
}

/// Clean price and identifier, and fall back to the listing title for an
/// empty project name.
pub fn normalize(record: &mut DataRecord, title: &str) {
    let name = record.fields.entry(FieldKey::Xmmc).or_default();
    if name.is_empty() {
        *name = title.to_string();
    }
    if let Some(price) = record.fields.get_mut(&FieldKey::Zbj) {
        *price = normalize_price(price);
    }
    if let Some(id) = record.fields.get_mut(&FieldKey::Xmbh) {
        *id = truncate_identifier(id);
    }
}
