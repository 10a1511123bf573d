//! Scripted in-memory [`MobileSession`] for tests.
//!
//! Lookups and child snapshots are scripted as sequences: each call consumes
//! the next entry and the last entry repeats forever. Every call is recorded
//! so tests can assert on what the code under test asked the driver to do.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::Value;
use trawl_common::{Result, TrawlError};

use crate::bounds::Bounds;
use crate::gesture::TouchSequence;
use crate::locator::Locator;
use crate::session::{ElementId, MobileSession, WindowSize};

/// A recorded driver call.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    FindElement(Locator),
    FindChildren(ElementId, Locator),
    Displayed(ElementId),
    Text(ElementId),
    Attribute(ElementId, String),
    Click(ElementId),
    Back,
    WindowSize,
    Touch(TouchSequence),
    Mobile(String, Value),
    CurrentPackage,
}

#[derive(Debug, Clone)]
pub struct MockElement {
    pub bounds: Option<Bounds>,
    pub displayed: bool,
    pub text: String,
    fail_click: bool,
    fail_text: bool,
    fail_attribute: bool,
}

impl Default for MockElement {
    fn default() -> Self {
        Self::new()
    }
}

impl MockElement {
    pub fn new() -> Self {
        Self {
            bounds: None,
            displayed: true,
            text: String::new(),
            fail_click: false,
            fail_text: false,
            fail_attribute: false,
        }
    }

    pub fn with_bounds(mut self, bounds: Bounds) -> Self {
        self.bounds = Some(bounds);
        self
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn hidden(mut self) -> Self {
        self.displayed = false;
        self
    }

    pub fn failing_click(mut self) -> Self {
        self.fail_click = true;
        self
    }

    pub fn failing_text(mut self) -> Self {
        self.fail_text = true;
        self
    }

    pub fn failing_attribute(mut self) -> Self {
        self.fail_attribute = true;
        self
    }
}

struct Script<T> {
    queue: VecDeque<T>,
}

impl<T: Clone> Script<T> {
    fn new(items: impl IntoIterator<Item = T>) -> Self {
        Self {
            queue: items.into_iter().collect(),
        }
    }

    fn next(&mut self) -> Option<T> {
        if self.queue.len() > 1 {
            self.queue.pop_front()
        } else {
            self.queue.front().cloned()
        }
    }
}

struct MockState {
    elements: HashMap<ElementId, MockElement>,
    finds: HashMap<Locator, Script<Option<ElementId>>>,
    failing_finds: HashSet<Locator>,
    children: HashMap<(ElementId, Locator), Script<Vec<ElementId>>>,
    failing_children: HashSet<ElementId>,
    scroll_results: Script<bool>,
    window: WindowSize,
    current_package: String,
    fail_back: bool,
    fail_scroll: bool,
    calls: Vec<Call>,
}

pub struct MockSession {
    state: Mutex<MockState>,
}

impl Default for MockSession {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSession {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState {
                elements: HashMap::new(),
                finds: HashMap::new(),
                failing_finds: HashSet::new(),
                children: HashMap::new(),
                failing_children: HashSet::new(),
                scroll_results: Script::new([true]),
                window: WindowSize {
                    width: 1080,
                    height: 2400,
                },
                current_package: String::new(),
                fail_back: false,
                fail_scroll: false,
                calls: Vec::new(),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().expect("mock session state poisoned")
    }

    pub fn with_window(self, width: u32, height: u32) -> Self {
        self.state().window = WindowSize { width, height };
        self
    }

    /// Results for successive `mobile: scrollGesture` calls.
    pub fn with_scroll_results(self, results: impl IntoIterator<Item = bool>) -> Self {
        self.state().scroll_results = Script::new(results);
        self
    }

    pub fn with_current_package(self, package: &str) -> Self {
        self.state().current_package = package.to_string();
        self
    }

    pub fn add_element(&self, id: &str, element: MockElement) {
        self.state().elements.insert(ElementId::new(id), element);
    }

    /// Script what `find_element(locator)` returns on successive calls.
    pub fn on_find<'a>(&self, locator: Locator, results: impl IntoIterator<Item = Option<&'a str>>) {
        let script = Script::new(results.into_iter().map(|r| r.map(ElementId::new)));
        self.state().finds.insert(locator, script);
    }

    pub fn fail_find(&self, locator: Locator) {
        self.state().failing_finds.insert(locator);
    }

    /// Script successive child snapshots of `parent` for `locator`.
    pub fn on_children<'a, S>(&self, parent: &str, locator: Locator, snapshots: S)
    where
        S: IntoIterator<Item = Vec<&'a str>>,
    {
        let script = Script::new(
            snapshots
                .into_iter()
                .map(|ids| ids.into_iter().map(ElementId::new).collect::<Vec<_>>()),
        );
        self.state()
            .children
            .insert((ElementId::new(parent), locator), script);
    }

    pub fn fail_children(&self, parent: &str) {
        self.state().failing_children.insert(ElementId::new(parent));
    }

    pub fn fail_back(&self) {
        self.state().fail_back = true;
    }

    /// Make every later `mobile: scrollGesture` call fail.
    pub fn fail_scroll(&self) {
        self.state().fail_scroll = true;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state().calls.clone()
    }

    /// Locators passed to `find_element`, in call order.
    pub fn lookups(&self) -> Vec<Locator> {
        self.state()
            .calls
            .iter()
            .filter_map(|c| match c {
                Call::FindElement(l) => Some(l.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn current_package_now(&self) -> String {
        self.state().current_package.clone()
    }

    fn element<'s>(state: &'s MockState, id: &ElementId) -> Result<&'s MockElement> {
        state
            .elements
            .get(id)
            .ok_or_else(|| TrawlError::NoSuchElement(format!("stale element {id}")))
    }
}

#[async_trait]
impl MobileSession for MockSession {
    async fn find_element(&self, locator: &Locator) -> Result<Option<ElementId>> {
        let mut state = self.state();
        state.calls.push(Call::FindElement(locator.clone()));
        if state.failing_finds.contains(locator) {
            return Err(TrawlError::Command(format!("find {locator} failed")));
        }
        Ok(state
            .finds
            .get_mut(locator)
            .and_then(|script| script.next())
            .flatten())
    }

    async fn find_child_elements(
        &self,
        parent: &ElementId,
        locator: &Locator,
    ) -> Result<Vec<ElementId>> {
        let mut state = self.state();
        state
            .calls
            .push(Call::FindChildren(parent.clone(), locator.clone()));
        if state.failing_children.contains(parent) {
            return Err(TrawlError::Command(format!("children of {parent} failed")));
        }
        Ok(state
            .children
            .get_mut(&(parent.clone(), locator.clone()))
            .and_then(|script| script.next())
            .unwrap_or_default())
    }

    async fn is_displayed(&self, element: &ElementId) -> Result<bool> {
        let mut state = self.state();
        state.calls.push(Call::Displayed(element.clone()));
        Ok(Self::element(&state, element)?.displayed)
    }

    async fn text(&self, element: &ElementId) -> Result<String> {
        let mut state = self.state();
        state.calls.push(Call::Text(element.clone()));
        let el = Self::element(&state, element)?;
        if el.fail_text {
            return Err(TrawlError::Command(format!("text of {element} failed")));
        }
        Ok(el.text.clone())
    }

    async fn attribute(&self, element: &ElementId, name: &str) -> Result<Option<String>> {
        let mut state = self.state();
        state
            .calls
            .push(Call::Attribute(element.clone(), name.to_string()));
        let el = Self::element(&state, element)?;
        if el.fail_attribute {
            return Err(TrawlError::Command(format!("attribute of {element} failed")));
        }
        Ok(match name {
            "bounds" => el.bounds.map(|b| b.to_string()),
            "displayed" => Some(el.displayed.to_string()),
            "text" => Some(el.text.clone()),
            _ => None,
        })
    }

    async fn click(&self, element: &ElementId) -> Result<()> {
        let mut state = self.state();
        state.calls.push(Call::Click(element.clone()));
        if Self::element(&state, element)?.fail_click {
            return Err(TrawlError::Command(format!("click on {element} failed")));
        }
        Ok(())
    }

    async fn back(&self) -> Result<()> {
        let mut state = self.state();
        state.calls.push(Call::Back);
        if state.fail_back {
            return Err(TrawlError::Command("back failed".into()));
        }
        Ok(())
    }

    async fn window_size(&self) -> Result<WindowSize> {
        let mut state = self.state();
        state.calls.push(Call::WindowSize);
        Ok(state.window)
    }

    async fn perform_touch(&self, sequence: &TouchSequence) -> Result<()> {
        self.state().calls.push(Call::Touch(sequence.clone()));
        Ok(())
    }

    async fn execute_mobile(&self, command: &str, args: Value) -> Result<Value> {
        let mut state = self.state();
        state
            .calls
            .push(Call::Mobile(command.to_string(), args.clone()));
        match command {
            "mobile: scrollGesture" => {
                if state.fail_scroll {
                    return Err(TrawlError::Command("scroll gesture failed".into()));
                }
                let moved = state.scroll_results.next().unwrap_or(true);
                Ok(Value::Bool(moved))
            }
            "mobile: activateApp" => {
                if let Some(app) = args.get("appId").and_then(Value::as_str) {
                    state.current_package = app.to_string();
                }
                Ok(Value::Null)
            }
            _ => Ok(Value::Null),
        }
    }

    async fn current_package(&self) -> Result<String> {
        let mut state = self.state();
        state.calls.push(Call::CurrentPackage);
        Ok(state.current_package.clone())
    }
}
