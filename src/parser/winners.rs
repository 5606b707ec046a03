use super::dom::Row;
use super::fields::{FieldRule, FieldSchema};
use super::lines::squash;
use super::record::{FieldKey, WinnerRow};

/// Spots winner tables: a header row whose last two cells carry the winner
/// and price labels, followed by data rows of the same width.
pub struct WinnerDetector<'a> {
    winner: &'a FieldRule,
    price: &'a FieldRule,
}

impl<'a> WinnerDetector<'a> {
    /// None if the schema has no winner or price rule.
    pub fn from_schema(schema: &'a FieldSchema) -> Option<Self> {
        Some(WinnerDetector {
            winner: schema.rule(FieldKey::Zbr)?,
            price: schema.rule(FieldKey::Zbj)?,
        })
    }

    pub fn is_header(&self, row: &Row) -> bool {
        let k = row.cells.len();
        k >= 2
            && self.winner.is_match(&squash(&row.cells[k - 2]))
            && self.price.is_match(&squash(&row.cells[k - 1]))
    }

    /// Data rows directly after `header` with its cell count, in table order.
    /// The returned length is the number of rows consumed.
    pub fn collect(&self, rows: &[Row], header: usize) -> Vec<WinnerRow> {
        let k = rows[header].cells.len();
        rows[header + 1..]
            .iter()
            .take_while(|r| r.cells.len() == k)
            .map(|r| WinnerRow {
                winner: squash(&r.cells[k - 2]),
                price: squash(&r.cells[k - 1]),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> WinnerDetector<'static> {
        WinnerDetector::from_schema(FieldSchema::builtin()).unwrap()
    }

    #[test]
    fn header_row() {
        let d = detector();
        assert!(d.is_header(&Row::new(["标段", "中标 单位", "中标价(元)"])));
        assert!(d.is_header(&Row::new(["中标人", "投标报价"])));
        assert!(!d.is_header(&Row::new(["中标人公示", "投标报价"])));
        assert!(!d.is_header(&Row::new(["中标价"])));
        assert!(!d.is_header(&Row::new(["标段", "甲公司", "100"])));
    }

    #[test]
    fn collects_until_width_changes() {
        let rows = vec![
            Row::new(["标段", "中标人", "中标价"]),
            Row::new(["一标段", " 甲公司 ", "1,000"]),
            Row::new(["二标段", "乙\n公司", "2,000"]),
            Row::new(["备注", "无"]),
            Row::new(["三标段", "丙公司", "3,000"]),
        ];
        let winners = detector().collect(&rows, 0);
        assert_eq!(
            winners,
            vec![
                WinnerRow { winner: "甲公司".into(), price: "1,000".into() },
                WinnerRow { winner: "乙公司".into(), price: "2,000".into() },
            ]
        );
    }

    #[test]
    fn header_on_last_row() {
        let rows = vec![Row::new(["a", "b", "c"]), Row::new(["序号", "中标人", "报价"])];
        assert!(detector().collect(&rows, 1).is_empty());
    }

    #[test]
    fn schema_without_price_rule() {
        let schema = FieldSchema::new(vec![FieldRule::new(FieldKey::Zbr, "中标人").unwrap()]);
        assert!(WinnerDetector::from_schema(&schema).is_none());
    }
}
