pub mod dom;
pub mod fields;
pub mod lines;
pub mod normalize;
pub mod record;
pub mod winners;

use tracing::debug;

use crate::listing::Announcement;
use fields::FieldSchema;
use record::{DataRecord, Fields, OutputRow, RecordMeta};
use winners::WinnerDetector;

/// html → content block → lines → fields → normalized record → output rows.
pub fn process_page(announcement: &Announcement, html: &str, schema: &FieldSchema) -> Vec<OutputRow> {
    let meta = RecordMeta::from_announcement(announcement);
    let Some(block) = dom::content_block(html) else {
        return record::expand(&DataRecord::missing(meta), &[]);
    };

    let detector = WinnerDetector::from_schema(schema);
    let extraction = lines::extract_lines(&block, detector.as_ref());
    let matched = fields::match_fields(Fields::new(), extraction.lines, schema);
    if !matched.remaining.is_empty() {
        debug!("{}: {} lines left unmatched", announcement.info_id, matched.remaining.len());
    }

    let mut record = DataRecord::found(meta, matched.fields);
    normalize::normalize(&mut record, &announcement.title);
    record::expand(&record, &extraction.winners)
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn announcement() -> Announcement {
        Announcement {
            info_id: "ad57b363".into(),
            project_type: "房建市政".into(),
            region: "南宁市".into(),
            title: "某某学校教学楼工程中标结果公示".into(),
            info_date: "2024-01-04".into(),
            url: "http://ggzy.jgswj.gxzf.gov.cn/gxggzy/jyxx/a.html".into(),
        }
    }

    fn run(fixture: &str) -> Vec<OutputRow> {
        let html = std::fs::read_to_string(format!("tests/fixtures/{}.html", fixture)).unwrap();
        process_page(&announcement(), &html, FieldSchema::builtin())
    }

    fn without_winner(row: &OutputRow) -> OutputRow {
        OutputRow { winner: String::new(), price: String::new(), ..row.clone() }
    }

    #[test]
    fn two_column_page() {
        let rows = run("two_column");
        assert_eq!(rows.len(), 1);
        let r = &rows[0];
        assert_eq!(r.status, "Y");
        assert_eq!(r.name, "某某学校教学楼工程");
        assert_eq!(r.number, "GXNN2024-0012");
        assert_eq!(r.winner, "广西某某建设集团有限公司");
        assert_eq!(r.price, "12345678.90");
        assert_eq!(r.duration, "365日历天");
        assert_eq!(r.manager, "王五");
        assert_eq!(r.oversight, "南宁市住房和城乡建设局");
        assert_eq!(r.publish_date, "2024-01-03");
        assert_eq!(r.project_type, "房建市政");
        assert_eq!(r.info_date, "2024-01-04");
    }

    #[test]
    fn vertical_page() {
        let rows = run("vertical");
        assert_eq!(rows.len(), 1);
        let r = &rows[0];
        assert_eq!(r.name, "某某公路养护工程");
        assert_eq!(r.number, "GXJT-2024-08");
        assert_eq!(r.winner, "广西某某路桥有限公司");
        assert_eq!(r.price, "980000");
        assert_eq!(r.duration, "180天");
    }

    #[test]
    fn multi_winner_page() {
        let rows = run("multi_winner");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].winner, "甲建设有限公司");
        assert_eq!(rows[0].price, "1,200,000.00");
        assert_eq!(rows[1].winner, "乙工程有限公司");
        assert_eq!(rows[1].price, "2,300,000.00");
        assert_eq!(without_winner(&rows[0]), without_winner(&rows[1]));
        assert_eq!(rows[0].name, "某某水库除险加固工程");
        assert_eq!(rows[0].manager, "赵六");
    }

    #[test]
    fn plain_page_falls_back_to_title() {
        let rows = run("plain");
        assert_eq!(rows.len(), 1);
        let r = &rows[0];
        assert_eq!(r.name, "某某学校教学楼工程中标结果公示");
        assert_eq!(r.winner, "南宁某某建筑有限公司");
        assert_eq!(r.price, "3.5%");
        assert_eq!(r.manager, "孙七");
    }

    #[test]
    fn no_content_page() {
        let rows = run("no_content");
        assert_eq!(rows.len(), 1);
        let r = &rows[0];
        assert_eq!(r.status, "N");
        assert!(r.name.is_empty());
        assert!(r.number.is_empty() && r.winner.is_empty() && r.price.is_empty());
        assert!(r.duration.is_empty() && r.manager.is_empty() && r.oversight.is_empty());
        assert_eq!(r.region, "南宁市");
        assert_eq!(r.url, "http://ggzy.jgswj.gxzf.gov.cn/gxggzy/jyxx/a.html");
    }

    #[test]
    fn row_count_is_at_least_one() {
        for fixture in ["two_column", "vertical", "multi_winner", "plain", "no_content"] {
            assert!(!run(fixture).is_empty(), "{} produced no rows", fixture);
        }
    }
}
