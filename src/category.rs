use crate::error::SourceError;

const KNOWN: &[(&str, &str)] = &[
    ("001001001005", "房建市政"),
    ("001001002005", "水利工程"),
    ("001001003005", "交通工程"),
    ("001001004005", "铁路工程"),
    ("001001005005", "其他工程"),
];

/// A full 12-digit `categorynum` of the award-notice listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    code: String,
}

impl Category {
    /// Accepts the short forms used on the command line:
    /// `1` → `001001001005`, `002` → `001001002005`,
    /// `001001003` → `001001003005`, or a full 12-digit code.
    pub fn parse(input: &str) -> Result<Self, SourceError> {
        let input = input.trim();
        if input.is_empty() || !input.chars().all(|c| c.is_ascii_digit()) {
            return Err(SourceError::UnknownCategory(input.to_string()));
        }
        let code = match input.len() {
            1 => format!("00100100{}005", input),
            3 => format!("001001{}005", input),
            9 => format!("{}005", input),
            12 => input.to_string(),
            _ => return Err(SourceError::UnknownCategory(input.to_string())),
        };
        Ok(Category { code })
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    /// Project-type label, empty for codes outside the known set.
    pub fn label(&self) -> &'static str {
        KNOWN
            .iter()
            .find(|(code, _)| *code == self.code)
            .map(|(_, label)| *label)
            .unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_forms() {
        assert_eq!(Category::parse("1").unwrap().code(), "001001001005");
        assert_eq!(Category::parse("002").unwrap().code(), "001001002005");
        assert_eq!(Category::parse("001001003").unwrap().code(), "001001003005");
        assert_eq!(Category::parse("001001004005").unwrap().code(), "001001004005");
    }

    #[test]
    fn labels() {
        assert_eq!(Category::parse("1").unwrap().label(), "房建市政");
        assert_eq!(Category::parse("5").unwrap().label(), "其他工程");
        assert_eq!(Category::parse("001001009005").unwrap().label(), "");
    }

    #[test]
    fn rejects_other_lengths() {
        assert!(matches!(Category::parse("12"), Err(SourceError::UnknownCategory(_))));
        assert!(Category::parse("abc").is_err());
        assert!(Category::parse("").is_err());
    }
}
