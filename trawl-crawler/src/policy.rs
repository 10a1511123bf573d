use trawl_config::MatchConfig;

/// Decides whether a row title is a hit.
///
/// A title matches when it contains any keyword as a substring. With
/// `case_sensitive` off both sides are lowercased first; there is no other
/// normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchPolicy {
    keywords: Vec<String>,
    case_sensitive: bool,
}

impl MatchPolicy {
    /// Blank keywords are dropped.
    pub fn new<I, S>(keywords: I, case_sensitive: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let keywords = keywords
            .into_iter()
            .map(Into::into)
            .filter(|k: &String| !k.is_empty())
            .map(|k| if case_sensitive { k } else { k.to_lowercase() })
            .collect();
        Self {
            keywords,
            case_sensitive,
        }
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// ```
    /// use trawl_crawler::MatchPolicy;
    ///
    /// let policy = MatchPolicy::new(["约尔"], true);
    /// assert!(policy.is_match("上海约尔玩偶"));
    /// assert!(!policy.is_match("普通娃娃"));
    /// assert!(!policy.is_match(""));
    /// ```
    pub fn is_match(&self, title: &str) -> bool {
        if title.is_empty() {
            return false;
        }
        if self.case_sensitive {
            self.keywords.iter().any(|k| title.contains(k.as_str()))
        } else {
            let title = title.to_lowercase();
            self.keywords.iter().any(|k| title.contains(k.as_str()))
        }
    }
}

impl From<&MatchConfig> for MatchPolicy {
    fn from(cfg: &MatchConfig) -> Self {
        MatchPolicy::new(cfg.keywords.iter().cloned(), cfg.case_sensitive)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn any_keyword_matches() {
        let policy = MatchPolicy::new(["chiikawa", "奇卡瓦"], true);
        assert!(policy.is_match("限定 chiikawa 挂件"));
        assert!(policy.is_match("奇卡瓦 毛绒"));
        assert!(!policy.is_match("吉伊卡哇"));
    }

    #[test]
    fn case_sensitive_by_default_config() {
        let policy = MatchPolicy::from(&MatchConfig {
            keywords: vec!["Chiikawa".into()],
            case_sensitive: true,
        });
        assert!(policy.is_match("Chiikawa plush"));
        assert!(!policy.is_match("chiikawa plush"));
    }

    #[test]
    fn case_insensitive_lowercases_both_sides() {
        let policy = MatchPolicy::new(["ChiiKawa"], false);
        assert!(policy.is_match("CHIIKAWA keychain"));
        assert!(policy.is_match("chiikawa"));
    }

    #[test]
    fn empty_inputs_never_match() {
        assert!(!MatchPolicy::new(Vec::<String>::new(), true).is_match("anything"));
        let blank = MatchPolicy::new([""], true);
        assert!(blank.keywords().is_empty());
        assert!(!blank.is_match("anything"));
        assert!(!MatchPolicy::new(["约尔"], true).is_match(""));
    }
}
