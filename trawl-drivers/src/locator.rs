use std::fmt;

/// One Appium locator strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    AccessibilityId,
    ResourceId,
    XPath,
    ClassName,
}

impl Strategy {
    /// Resolution order used by [`LocatorSpec::candidates`].
    pub const ORDER: [Strategy; 4] = [
        Strategy::AccessibilityId,
        Strategy::ResourceId,
        Strategy::XPath,
        Strategy::ClassName,
    ];

    /// The `using` value sent to the server.
    pub fn as_w3c(&self) -> &'static str {
        match self {
            Strategy::AccessibilityId => "accessibility id",
            Strategy::ResourceId => "id",
            Strategy::XPath => "xpath",
            Strategy::ClassName => "class name",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_w3c())
    }
}

/// A single strategy/value pair, ready to send.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locator {
    pub strategy: Strategy,
    pub value: String,
}

impl Locator {
    pub fn new(strategy: Strategy, value: impl Into<String>) -> Self {
        Self {
            strategy,
            value: value.into(),
        }
    }

    pub fn accessibility_id(value: impl Into<String>) -> Self {
        Self::new(Strategy::AccessibilityId, value)
    }

    pub fn resource_id(value: impl Into<String>) -> Self {
        Self::new(Strategy::ResourceId, value)
    }

    pub fn xpath(value: impl Into<String>) -> Self {
        Self::new(Strategy::XPath, value)
    }

    pub fn class_name(value: impl Into<String>) -> Self {
        Self::new(Strategy::ClassName, value)
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.strategy, self.value)
    }
}

/// Candidate strategies for one logical element. Absent or blank entries
/// are skipped during resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocatorSpec {
    pub accessibility_id: Option<String>,
    pub resource_id: Option<String>,
    pub xpath: Option<String>,
    pub class_name: Option<String>,
}

impl LocatorSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_accessibility_id(mut self, value: impl Into<String>) -> Self {
        self.accessibility_id = Some(value.into());
        self
    }

    pub fn with_resource_id(mut self, value: impl Into<String>) -> Self {
        self.resource_id = Some(value.into());
        self
    }

    pub fn with_xpath(mut self, value: impl Into<String>) -> Self {
        self.xpath = Some(value.into());
        self
    }

    pub fn with_class_name(mut self, value: impl Into<String>) -> Self {
        self.class_name = Some(value.into());
        self
    }

    fn value_for(&self, strategy: Strategy) -> Option<&str> {
        let value = match strategy {
            Strategy::AccessibilityId => &self.accessibility_id,
            Strategy::ResourceId => &self.resource_id,
            Strategy::XPath => &self.xpath,
            Strategy::ClassName => &self.class_name,
        };
        value.as_deref().filter(|v| !v.trim().is_empty())
    }

    /// Configured locators in resolution order.
    ///
    /// ```
    /// use trawl_drivers::{Locator, LocatorSpec};
    ///
    /// let spec = LocatorSpec::new().with_xpath("//x").with_resource_id("r1");
    /// let order: Vec<Locator> = spec.candidates().collect();
    /// assert_eq!(order, vec![Locator::resource_id("r1"), Locator::xpath("//x")]);
    /// ```
    pub fn candidates(&self) -> impl Iterator<Item = Locator> + '_ {
        Strategy::ORDER
            .into_iter()
            .filter_map(|s| self.value_for(s).map(|v| Locator::new(s, v)))
    }

    pub fn is_empty(&self) -> bool {
        self.candidates().next().is_none()
    }
}

impl fmt::Display for LocatorSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.candidates().map(|l| l.to_string()).collect();
        if parts.is_empty() {
            f.write_str("<empty>")
        } else {
            f.write_str(&parts.join(" | "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_values_are_skipped() {
        let spec = LocatorSpec {
            accessibility_id: Some("  ".into()),
            resource_id: None,
            xpath: Some(String::new()),
            class_name: Some("android.widget.TextView".into()),
        };
        let order: Vec<_> = spec.candidates().collect();
        assert_eq!(order, vec![Locator::class_name("android.widget.TextView")]);
        assert!(LocatorSpec::new().is_empty());
    }

    #[test]
    fn display_lists_strategies_in_order() {
        let spec = LocatorSpec::new()
            .with_class_name("c")
            .with_accessibility_id("扫一扫");
        assert_eq!(spec.to_string(), "accessibility id=扫一扫 | class name=c");
    }
}
