use std::collections::BTreeMap;

use crate::listing::Announcement;

/// Extractable fields, in matching order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FieldKey {
    /// 项目名称
    Xmmc,
    /// 项目编号
    Xmbh,
    /// 发布日期
    Fbrq,
    /// 中标人
    Zbr,
    /// 中标价
    Zbj,
    /// 工期
    Gq,
    /// 项目经理
    Xmjl,
    /// 监管部门
    Jgbm,
}

pub type Fields = BTreeMap<FieldKey, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Content container found, fields extracted.
    Found,
    /// No content container on the page.
    Missing,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Found => "Y",
            Status::Missing => "N",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordMeta {
    pub project_type: String,
    pub region: String,
    pub source_id: String,
    pub info_date: String,
    pub url: String,
}

impl RecordMeta {
    pub fn from_announcement(a: &Announcement) -> Self {
        RecordMeta {
            project_type: a.project_type.clone(),
            region: a.region.clone(),
            source_id: a.info_id.clone(),
            info_date: a.info_date.clone(),
            url: a.url.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DataRecord {
    pub status: Status,
    pub meta: RecordMeta,
    pub fields: Fields,
}

impl DataRecord {
    pub fn found(meta: RecordMeta, fields: Fields) -> Self {
        DataRecord { status: Status::Found, meta, fields }
    }

    pub fn missing(meta: RecordMeta) -> Self {
        DataRecord { status: Status::Missing, meta, fields: Fields::new() }
    }

    pub fn get(&self, key: FieldKey) -> &str {
        self.fields.get(&key).map(String::as_str).unwrap_or("")
    }
}

/// One additional bidder found in a multi-winner table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WinnerRow {
    pub winner: String,
    pub price: String,
}

pub const HEADERS: [&str; 13] = [
    "STATUS",
    "项目类型",
    "地区/城市",
    "名称",
    "编号",
    "发布日期",
    "中标人",
    "中标价/费率",
    "工期",
    "项目经理",
    "监管部门",
    "信息日期",
    "链接",
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputRow {
    pub status: String,
    pub project_type: String,
    pub region: String,
    pub name: String,
    pub number: String,
    pub publish_date: String,
    pub winner: String,
    pub price: String,
    pub duration: String,
    pub manager: String,
    pub oversight: String,
    pub info_date: String,
    pub url: String,
}

impl OutputRow {
    pub fn columns(&self) -> [&str; 13] {
        [
            &self.status,
            &self.project_type,
            &self.region,
            &self.name,
            &self.number,
            &self.publish_date,
            &self.winner,
            &self.price,
            &self.duration,
            &self.manager,
            &self.oversight,
            &self.info_date,
            &self.url,
        ]
    }

    fn from_record(record: &DataRecord, winner: &str, price: &str) -> Self {
        OutputRow {
            status: record.status.as_str().to_string(),
            project_type: record.meta.project_type.clone(),
            region: record.meta.region.clone(),
            name: record.get(FieldKey::Xmmc).to_string(),
            number: record.get(FieldKey::Xmbh).to_string(),
            publish_date: record.get(FieldKey::Fbrq).to_string(),
            winner: winner.to_string(),
            price: price.to_string(),
            duration: record.get(FieldKey::Gq).to_string(),
            manager: record.get(FieldKey::Xmjl).to_string(),
            oversight: record.get(FieldKey::Jgbm).to_string(),
            info_date: record.meta.info_date.clone(),
            url: record.meta.url.clone(),
        }
    }
}

/// One row per winner row, or the record's own winner/price when there are none.
pub fn expand(record: &DataRecord, winners: &[WinnerRow]) -> Vec<OutputRow> {
    if winners.is_empty() {
        return vec![OutputRow::from_record(
            record,
            record.get(FieldKey::Zbr),
            record.get(FieldKey::Zbj),
        )];
    }
    winners
        .iter()
        .map(|w| OutputRow::from_record(record, &w.winner, &w.price))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> DataRecord {
        let meta = RecordMeta {
            project_type: "房建市政".into(),
            region: "南宁市".into(),
            source_id: "abc".into(),
            info_date: "2024-01-04".into(),
            url: "http://example.com/a.html".into(),
        };
        let mut fields = Fields::new();
        fields.insert(FieldKey::Xmmc, "示范工程".into());
        fields.insert(FieldKey::Zbr, "甲公司".into());
        fields.insert(FieldKey::Zbj, "100".into());
        fields.insert(FieldKey::Gq, "90日历天".into());
        DataRecord::found(meta, fields)
    }

    #[test]
    fn single_row_without_winners() {
        let rows = expand(&record(), &[]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].winner, "甲公司");
        assert_eq!(rows[0].price, "100");
        assert_eq!(rows[0].status, "Y");
    }

    #[test]
    fn winners_replace_own_pair() {
        let winners = vec![
            WinnerRow { winner: "乙公司".into(), price: "200".into() },
            WinnerRow { winner: "丙公司".into(), price: "300".into() },
            WinnerRow { winner: "丁公司".into(), price: "400".into() },
        ];
        let rows = expand(&record(), &winners);
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| r.winner != "甲公司"));
        assert_eq!(rows[2].winner, "丁公司");
        for r in &rows {
            let mut shared = r.clone();
            shared.winner.clear();
            shared.price.clear();
            let mut first = rows[0].clone();
            first.winner.clear();
            first.price.clear();
            assert_eq!(shared, first);
        }
    }

    #[test]
    fn missing_record_has_empty_fields() {
        let rows = expand(&DataRecord::missing(RecordMeta::default()), &[]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].status, "N");
        assert!(rows[0].name.is_empty() && rows[0].winner.is_empty() && rows[0].price.is_empty());
    }

    #[test]
    fn column_order_matches_headers() {
        let row = expand(&record(), &[]).remove(0);
        let cols = row.columns();
        assert_eq!(cols.len(), HEADERS.len());
        assert_eq!(cols[0], "Y");
        assert_eq!(cols[3], "示范工程");
        assert_eq!(cols[8], "90日历天");
        assert_eq!(cols[12], "http://example.com/a.html");
    }
}
