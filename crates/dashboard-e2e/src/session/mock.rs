//! In-memory [`Session`] for testing wait helpers without a browser.
//!
//! A `MockSession` is a cheap clonable handle onto one shared DOM model, so
//! a test can keep a clone and mutate the page (make an element appear,
//! hide it, detach it) while a helper is polling the other clone.

use super::{ElementHandle, Session, SessionError};
use crate::locator::Locator;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// State of one mocked element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockElement {
    /// Rendered and visible
    pub displayed: bool,
    /// Accepts input
    pub enabled: bool,
    /// Visible text
    pub text: String,
    /// Attributes, including `value` for inputs
    pub attributes: BTreeMap<String, String>,
}

impl Default for MockElement {
    fn default() -> Self {
        Self::new()
    }
}

impl MockElement {
    /// A visible, enabled, empty element
    #[must_use]
    pub fn new() -> Self {
        Self {
            displayed: true,
            enabled: true,
            text: String::new(),
            attributes: BTreeMap::new(),
        }
    }

    /// Present in the DOM but not displayed
    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.displayed = false;
        self
    }

    /// Displayed but not enabled
    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Set the visible text
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Set an attribute
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let _ = self.attributes.insert(name.into(), value.into());
        self
    }
}

#[derive(Debug)]
struct Node {
    id: String,
    element: MockElement,
    blocked_clicks: usize,
}

#[derive(Debug, Default)]
struct Dom {
    nodes: HashMap<Locator, Vec<Node>>,
    invalid: HashSet<Locator>,
    disconnected: Option<String>,
    url: String,
    next_id: u64,
    clicks: HashMap<Locator, usize>,
    find_calls: usize,
}

impl Dom {
    fn new_node(&mut self, element: MockElement) -> Node {
        self.next_id += 1;
        Node {
            id: format!("mock-{}", self.next_id),
            element,
            blocked_clicks: 0,
        }
    }

    fn check_connected(&self) -> Result<(), SessionError> {
        match self.disconnected {
            Some(ref message) => Err(SessionError::Disconnected {
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }

    fn check_locator(&self, locator: &Locator) -> Result<(), SessionError> {
        self.check_connected()?;
        if self.invalid.contains(locator) {
            return Err(SessionError::InvalidSelector {
                locator: locator.to_string(),
                message: "selector rejected by mock session".to_string(),
            });
        }
        Ok(())
    }

    fn node_mut(&mut self, handle: &ElementHandle) -> Result<&mut Node, SessionError> {
        self.check_connected()?;
        self.nodes
            .get_mut(&handle.locator)
            .and_then(|nodes| nodes.iter_mut().find(|n| n.id == handle.id))
            .ok_or_else(|| SessionError::stale(&handle.locator))
    }
}

/// Scriptable in-memory browser session
#[derive(Debug, Clone, Default)]
pub struct MockSession {
    dom: Arc<Mutex<Dom>>,
}

impl MockSession {
    /// Create an empty page
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn dom(&self) -> MutexGuard<'_, Dom> {
        self.dom.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make `locator` match exactly `element`; existing handles go stale
    pub fn insert(&self, locator: Locator, element: MockElement) {
        let mut dom = self.dom();
        let node = dom.new_node(element);
        let _ = dom.nodes.insert(locator, vec![node]);
    }

    /// Add another match for `locator`
    pub fn push(&self, locator: Locator, element: MockElement) {
        let mut dom = self.dom();
        let node = dom.new_node(element);
        dom.nodes.entry(locator).or_default().push(node);
    }

    /// Detach every element matching `locator`
    pub fn remove(&self, locator: &Locator) {
        let _ = self.dom().nodes.remove(locator);
    }

    /// Mutate matching elements in place; existing handles stay valid
    pub fn update(&self, locator: &Locator, f: impl Fn(&mut MockElement)) {
        if let Some(nodes) = self.dom().nodes.get_mut(locator) {
            for node in nodes {
                f(&mut node.element);
            }
        }
    }

    /// Show or hide matching elements
    pub fn set_displayed(&self, locator: &Locator, displayed: bool) {
        self.update(locator, |e| e.displayed = displayed);
    }

    /// Enable or disable matching elements
    pub fn set_enabled(&self, locator: &Locator, enabled: bool) {
        self.update(locator, |e| e.enabled = enabled);
    }

    /// Change the text of matching elements
    pub fn set_text(&self, locator: &Locator, text: &str) {
        self.update(locator, |e| e.text = text.to_string());
    }

    /// Change an attribute of matching elements
    pub fn set_attribute(&self, locator: &Locator, name: &str, value: &str) {
        self.update(locator, |e| {
            let _ = e.attributes.insert(name.to_string(), value.to_string());
        });
    }

    /// Re-render matching elements so handles found earlier go stale
    pub fn rerender(&self, locator: &Locator) {
        let mut dom = self.dom();
        let Some(nodes) = dom.nodes.remove(locator) else {
            return;
        };
        let fresh: Vec<Node> = nodes
            .into_iter()
            .map(|n| dom.new_node(n.element))
            .collect();
        let _ = dom.nodes.insert(locator.clone(), fresh);
    }

    /// The next `count` clicks on `locator` fail as not interactable
    pub fn block_clicks(&self, locator: &Locator, count: usize) {
        if let Some(nodes) = self.dom().nodes.get_mut(locator) {
            for node in nodes {
                node.blocked_clicks = count;
            }
        }
    }

    /// Reject `locator` as an invalid selector
    pub fn mark_invalid(&self, locator: Locator) {
        let _ = self.dom().invalid.insert(locator);
    }

    /// Every subsequent command fails as disconnected
    pub fn disconnect(&self, message: impl Into<String>) {
        self.dom().disconnected = Some(message.into());
    }

    /// Navigate
    pub fn set_url(&self, url: impl Into<String>) {
        self.dom().url = url.into();
    }

    /// Successful clicks recorded for `locator`
    #[must_use]
    pub fn clicks(&self, locator: &Locator) -> usize {
        self.dom().clicks.get(locator).copied().unwrap_or(0)
    }

    /// `value` attribute of the first match
    #[must_use]
    pub fn value(&self, locator: &Locator) -> Option<String> {
        self.dom()
            .nodes
            .get(locator)
            .and_then(|nodes| nodes.first())
            .and_then(|n| n.element.attributes.get("value").cloned())
    }

    /// Whether anything matches `locator`
    #[must_use]
    pub fn contains(&self, locator: &Locator) -> bool {
        self.dom()
            .nodes
            .get(locator)
            .is_some_and(|nodes| !nodes.is_empty())
    }

    /// Number of `find_element`/`find_elements` calls served
    #[must_use]
    pub fn find_calls(&self) -> usize {
        self.dom().find_calls
    }
}

#[async_trait]
impl Session for MockSession {
    async fn find_element(&self, locator: &Locator) -> Result<ElementHandle, SessionError> {
        let mut dom = self.dom();
        dom.check_locator(locator)?;
        dom.find_calls += 1;
        dom.nodes
            .get(locator)
            .and_then(|nodes| nodes.first())
            .map(|n| ElementHandle::new(n.id.clone(), locator.clone()))
            .ok_or_else(|| SessionError::no_such_element(locator))
    }

    async fn find_elements(&self, locator: &Locator) -> Result<Vec<ElementHandle>, SessionError> {
        let mut dom = self.dom();
        dom.check_locator(locator)?;
        dom.find_calls += 1;
        Ok(dom
            .nodes
            .get(locator)
            .map(|nodes| {
                nodes
                    .iter()
                    .map(|n| ElementHandle::new(n.id.clone(), locator.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn is_displayed(&self, element: &ElementHandle) -> Result<bool, SessionError> {
        Ok(self.dom().node_mut(element)?.element.displayed)
    }

    async fn is_enabled(&self, element: &ElementHandle) -> Result<bool, SessionError> {
        Ok(self.dom().node_mut(element)?.element.enabled)
    }

    async fn click(&self, element: &ElementHandle) -> Result<(), SessionError> {
        let mut dom = self.dom();
        let node = dom.node_mut(element)?;
        if node.blocked_clicks > 0 {
            node.blocked_clicks -= 1;
            return Err(SessionError::not_interactable(&element.locator));
        }
        if !node.element.displayed || !node.element.enabled {
            return Err(SessionError::not_interactable(&element.locator));
        }
        *dom.clicks.entry(element.locator.clone()).or_insert(0) += 1;
        Ok(())
    }

    async fn text(&self, element: &ElementHandle) -> Result<String, SessionError> {
        let mut dom = self.dom();
        let node = dom.node_mut(element)?;
        // WebDriver reports no text for hidden elements
        Ok(if node.element.displayed {
            node.element.text.clone()
        } else {
            String::new()
        })
    }

    async fn attribute(
        &self,
        element: &ElementHandle,
        name: &str,
    ) -> Result<Option<String>, SessionError> {
        Ok(self
            .dom()
            .node_mut(element)?
            .element
            .attributes
            .get(name)
            .cloned())
    }

    async fn send_keys(&self, element: &ElementHandle, keys: &str) -> Result<(), SessionError> {
        let mut dom = self.dom();
        let node = dom.node_mut(element)?;
        if !node.element.displayed || !node.element.enabled {
            return Err(SessionError::not_interactable(&element.locator));
        }
        node.element
            .attributes
            .entry("value".to_string())
            .or_default()
            .push_str(keys);
        Ok(())
    }

    async fn clear(&self, element: &ElementHandle) -> Result<(), SessionError> {
        let mut dom = self.dom();
        let node = dom.node_mut(element)?;
        if !node.element.enabled {
            return Err(SessionError::not_interactable(&element.locator));
        }
        let _ = node
            .element
            .attributes
            .insert("value".to_string(), String::new());
        Ok(())
    }

    async fn current_url(&self) -> Result<String, SessionError> {
        let dom = self.dom();
        dom.check_connected()?;
        Ok(dom.url.clone())
    }
}
