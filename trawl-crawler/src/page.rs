//! Recognizing a screen by the elements it carries.

use std::fmt;
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;
use trawl_common::Result;
use trawl_drivers::resolver::ElementResolver;
use trawl_drivers::LocatorSpec;

/// A named screen, present when every identifier resolves to a displayed
/// element. No identifiers means the screen can't be checked and is
/// assumed present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSignature {
    name: String,
    identifiers: Vec<LocatorSpec>,
}

impl PageSignature {
    pub fn new(name: impl Into<String>, identifiers: impl IntoIterator<Item = LocatorSpec>) -> Self {
        Self {
            name: name.into(),
            identifiers: identifiers.into_iter().collect(),
        }
    }

    /// Signature built from resource ids. Blank ids are dropped.
    ///
    /// ```
    /// use trawl_crawler::PageSignature;
    ///
    /// let page = PageSignature::from_resource_ids("detail", ["com.example:id/title", " "]);
    /// assert_eq!(page.identifiers().len(), 1);
    /// ```
    pub fn from_resource_ids<I, S>(name: impl Into<String>, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let identifiers = ids
            .into_iter()
            .map(|id| id.as_ref().trim().to_string())
            .filter(|id| !id.is_empty())
            .map(|id| LocatorSpec::new().with_resource_id(id));
        Self::new(name, identifiers)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn identifiers(&self) -> &[LocatorSpec] {
        &self.identifiers
    }

    /// Whether every identifier resolves right now.
    pub async fn is_current(&self, resolver: &ElementResolver) -> Result<bool> {
        for spec in &self.identifiers {
            if resolver.resolve(spec).await?.is_none() {
                debug!(target: "trawl.page", page = %self.name, %spec, "identifier missing");
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Poll until every identifier is present, sharing one `timeout`
    /// across all of them. `Ok(false)` when the deadline passes first.
    pub async fn wait_for(&self, resolver: &ElementResolver, timeout: Duration) -> Result<bool> {
        let deadline = Instant::now() + timeout;
        for spec in &self.identifiers {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if resolver.wait_until_present(spec, remaining).await?.is_none() {
                debug!(target: "trawl.page", page = %self.name, %spec, ?timeout, "page did not appear");
                return Ok(false);
            }
        }
        Ok(true)
    }
}

impl fmt::Display for PageSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use trawl_drivers::mock::{MockElement, MockSession};
    use trawl_drivers::Locator;

    const TITLE: &str = "com.example:id/detail_title";
    const PRICE: &str = "com.example:id/price_view";

    fn detail() -> PageSignature {
        PageSignature::from_resource_ids("detail", [TITLE, PRICE])
    }

    #[tokio::test]
    async fn current_only_when_every_identifier_is_present() {
        let mock = Arc::new(MockSession::new());
        mock.add_element("title", MockElement::new());
        mock.add_element("price", MockElement::new());
        mock.on_find(Locator::resource_id(TITLE), [Some("title")]);
        mock.on_find(Locator::resource_id(PRICE), [None, Some("price")]);
        let resolver = ElementResolver::new(mock.clone());

        assert!(!detail().is_current(&resolver).await.unwrap());
        assert!(detail().is_current(&resolver).await.unwrap());
    }

    #[tokio::test]
    async fn no_identifiers_is_always_current() {
        let mock = Arc::new(MockSession::new());
        let resolver = ElementResolver::new(mock.clone());
        let page = PageSignature::from_resource_ids("blank", Vec::<String>::new());

        assert!(page.is_current(&resolver).await.unwrap());
        assert!(page.wait_for(&resolver, Duration::ZERO).await.unwrap());
        assert!(mock.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn waits_for_late_identifiers() {
        let mock = Arc::new(MockSession::new());
        mock.add_element("title", MockElement::new());
        mock.add_element("price", MockElement::new());
        mock.on_find(Locator::resource_id(TITLE), [None, Some("title")]);
        mock.on_find(Locator::resource_id(PRICE), [None, None, Some("price")]);
        let resolver = ElementResolver::new(mock.clone());

        assert!(detail().wait_for(&resolver, Duration::from_secs(5)).await.unwrap());
        assert_eq!(mock.lookups().len(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_at_the_deadline() {
        let mock = Arc::new(MockSession::new());
        mock.add_element("title", MockElement::new());
        mock.on_find(Locator::resource_id(TITLE), [Some("title")]);
        let resolver = ElementResolver::new(mock.clone());

        let started = Instant::now();
        assert!(!detail().wait_for(&resolver, Duration::from_secs(2)).await.unwrap());
        assert!(started.elapsed() <= Duration::from_secs(3));
    }
}
