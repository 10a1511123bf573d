use std::fmt;

use async_trait::async_trait;
use serde_json::Value;
use trawl_common::{Result, TrawlError};

use crate::bounds::Bounds;
use crate::gesture::TouchSequence;
use crate::locator::Locator;

/// Server-side reference to a UI element.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementId(String);

impl ElementId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSize {
    pub width: u32,
    pub height: u32,
}

/// The operations the resolver, gesture engine and traversal need from an
/// automation session.
///
/// Lookups that find nothing return `Ok(None)` / an empty `Vec`; every
/// other failure is an `Err`.
#[async_trait]
pub trait MobileSession: Send + Sync {
    async fn find_element(&self, locator: &Locator) -> Result<Option<ElementId>>;

    async fn find_child_elements(
        &self,
        parent: &ElementId,
        locator: &Locator,
    ) -> Result<Vec<ElementId>>;

    async fn is_displayed(&self, element: &ElementId) -> Result<bool>;

    async fn text(&self, element: &ElementId) -> Result<String>;

    async fn attribute(&self, element: &ElementId, name: &str) -> Result<Option<String>>;

    async fn click(&self, element: &ElementId) -> Result<()>;

    /// Native back navigation.
    async fn back(&self) -> Result<()>;

    async fn window_size(&self) -> Result<WindowSize>;

    async fn perform_touch(&self, sequence: &TouchSequence) -> Result<()>;

    /// Run an Appium `mobile:` extension command, e.g. `mobile: scrollGesture`.
    async fn execute_mobile(&self, command: &str, args: Value) -> Result<Value>;

    /// Package of the app currently in the foreground.
    async fn current_package(&self) -> Result<String>;

    /// Read and parse the element's `bounds` attribute.
    async fn bounds(&self, element: &ElementId) -> Result<Bounds> {
        match self.attribute(element, "bounds").await? {
            Some(raw) => raw.parse(),
            None => Err(TrawlError::InvalidBounds(format!(
                "element {element} has no bounds attribute"
            ))),
        }
    }
}
