use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

static CONTENT_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".ewb-details-info").unwrap());
static ROW_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").unwrap());

/// Children of the detail page's content container.
#[derive(Debug, Clone, Default)]
pub struct ContentBlock {
    pub children: Vec<Node>,
}

/// A child element: its flattened text plus every table row beneath it.
#[derive(Debug, Clone, Default)]
pub struct Node {
    pub text: String,
    pub rows: Vec<Row>,
}

#[derive(Debug, Clone, Default)]
pub struct Row {
    pub cells: Vec<String>,
}

impl Row {
    pub fn new<S: Into<String>>(cells: impl IntoIterator<Item = S>) -> Self {
        Row { cells: cells.into_iter().map(Into::into).collect() }
    }

    pub fn cell(&self, idx: usize) -> Option<&str> {
        self.cells.get(idx).map(String::as_str)
    }
}

/// None when the page has no content container.
pub fn content_block(html: &str) -> Option<ContentBlock> {
    let doc = Html::parse_document(html);
    let container = doc.select(&CONTENT_SEL).next()?;
    let children = container
        .children()
        .filter_map(ElementRef::wrap)
        .map(to_node)
        .collect();
    Some(ContentBlock { children })
}

fn to_node(el: ElementRef) -> Node {
    let rows = el
        .select(&ROW_SEL)
        .map(|tr| Row::new(tr.children().filter_map(ElementRef::wrap).map(text_of)))
        .collect();
    Node { text: text_of(el), rows }
}

fn text_of(el: ElementRef) -> String {
    el.text().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_container() {
        assert!(content_block("<html><body><div class=\"other\">x</div></body></html>").is_none());
    }

    #[test]
    fn children_and_rows() {
        let html = r#"<div class="ewb-details-info">
            <p>第一段文字内容</p>
            <table><tr><td>项目名称</td><td>示范工程</td></tr>
                   <tr><td>工期</td><td>90天</td></tr></table>
        </div>"#;
        let block = content_block(html).unwrap();
        assert_eq!(block.children.len(), 2);
        assert_eq!(block.children[0].text, "第一段文字内容");
        assert!(block.children[0].rows.is_empty());
        let rows = &block.children[1].rows;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].cells, vec!["项目名称", "示范工程"]);
        assert_eq!(rows[1].cell(1), Some("90天"));
        assert_eq!(rows[1].cell(2), None);
    }

    #[test]
    fn text_keeps_line_breaks() {
        let html = "<div class=\"ewb-details-info\"><div>\n  一、项目名称：示范\n  二、工期：30天\n</div></div>";
        let block = content_block(html).unwrap();
        assert_eq!(block.children[0].text.split('\n').count(), 4);
    }
}
