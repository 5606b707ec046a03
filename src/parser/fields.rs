use std::sync::LazyLock;

use regex::{Match, Regex};

use super::record::{FieldKey, Fields};

pub const LABEL_SEP: char = '：';

static BUILTIN: LazyLock<FieldSchema> = LazyLock::new(|| {
    FieldSchema::new(vec![
        FieldRule::new(FieldKey::Xmmc, "项目名称").unwrap(),
        FieldRule::new(FieldKey::Xmbh, "(项目|招标|标段)编号").unwrap(),
        FieldRule::new(FieldKey::Fbrq, "发布日期").unwrap(),
        FieldRule::new(FieldKey::Zbr, "中标(人|单位)").unwrap().rejecting("公示"),
        FieldRule::new(FieldKey::Zbj, "中标(价|费率|金额)|报价").unwrap(),
        FieldRule::new(FieldKey::Gq, "交货期|期限|工期").unwrap(),
        FieldRule::new(FieldKey::Xmjl, "项目(经理|总?负责)|联系人").unwrap(),
        FieldRule::new(FieldKey::Jgbm, "(监督|受理)部门").unwrap(),
    ])
});

/// A field key and the label that introduces its value.
#[derive(Debug, Clone)]
pub struct FieldRule {
    pub key: FieldKey,
    label: Regex,
    reject_suffix: Option<&'static str>,
}

impl FieldRule {
    pub fn new(key: FieldKey, label: &str) -> Result<Self, regex::Error> {
        Ok(FieldRule {
            key,
            label: Regex::new(label)?,
            reject_suffix: None,
        })
    }

    /// Ignore label occurrences immediately followed by `suffix`
    /// (e.g. "中标人公示" is a heading, not the winner label).
    pub fn rejecting(mut self, suffix: &'static str) -> Self {
        self.reject_suffix = Some(suffix);
        self
    }

    fn labels<'t>(&'t self, text: &'t str) -> impl Iterator<Item = Match<'t>> + 't {
        self.label.find_iter(text).filter(move |m| match self.reject_suffix {
            Some(suffix) => !text[m.end()..].starts_with(suffix),
            None => true,
        })
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.labels(text).next().is_some()
    }

    /// Value after "label, anything but a colon, colon". None if the line
    /// has no such segment.
    pub fn capture(&self, line: &str) -> Option<String> {
        self.labels(line).find_map(|m| {
            let rest = &line[m.end()..];
            let sep = rest.find(LABEL_SEP)?;
            let value = &rest[sep + LABEL_SEP.len_utf8()..];
            Some(value.replace('\t', "").trim().to_string())
        })
    }
}

/// Ordered field rules. Matching walks them in order.
#[derive(Debug, Clone)]
pub struct FieldSchema {
    rules: Vec<FieldRule>,
}

impl FieldSchema {
    pub fn new(rules: Vec<FieldRule>) -> Self {
        FieldSchema { rules }
    }

    pub fn builtin() -> &'static FieldSchema {
        &BUILTIN
    }

    pub fn rules(&self) -> &[FieldRule] {
        &self.rules
    }

    pub fn rule(&self, key: FieldKey) -> Option<&FieldRule> {
        self.rules.iter().find(|r| r.key == key)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Matched {
    pub fields: Fields,
    pub remaining: Vec<String>,
}

/// Assign each unset field from the first line carrying its label, consuming
/// that line. Fields already present in `fields` are left alone.
pub fn match_fields(mut fields: Fields, mut lines: Vec<String>, schema: &FieldSchema) -> Matched {
    for rule in schema.rules() {
        if fields.contains_key(&rule.key) {
            continue;
        }
        let hit = lines.iter().enumerate().find_map(|(i, line)| {
            let compact = line.replace(' ', "");
            rule.capture(compact.trim()).map(|value| (i, value))
        });
        if let Some((i, value)) = hit {
            fields.insert(rule.key, value);
            lines.remove(i);
        }
    }
    Matched { fields, remaining: lines }
}
