//! The presentation surface the resolver writes to.
//!
//! A [`Document`] stands in for the page: attributes on the root element,
//! the `theme-color` meta tag, and child elements that may mark themselves
//! as theme toggles with [`TOGGLE_ATTR`].

use std::collections::BTreeMap;

use crate::theme::{EffectiveTheme, Preference};

/// Presentation attribute on the root element.
pub const THEME_ATTR: &str = "data-theme";
/// Marker attribute for elements that act as theme toggles.
pub const TOGGLE_ATTR: &str = "data-theme-toggle";
/// Preference mirrored onto each wired toggle.
pub const TOGGLE_STATE_ATTR: &str = "data-theme-state";

pub type Attributes = BTreeMap<String, String>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    pub id: String,
    pub attributes: Attributes,
}

impl Element {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            attributes: Attributes::new(),
        }
    }

    #[must_use]
    pub fn with_attr(mut self, name: &str, value: &str) -> Self {
        self.attributes.insert(name.to_string(), value.to_string());
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn is_toggle(&self) -> bool {
        self.attributes.contains_key(TOGGLE_ATTR)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Document {
    root: Attributes,
    theme_color: Option<String>,
    elements: Vec<Element>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a child element, returning the document for chaining.
    #[must_use]
    pub fn with_element(mut self, element: Element) -> Self {
        self.elements.push(element);
        self
    }

    pub fn root_attr(&self, name: &str) -> Option<&str> {
        self.root.get(name).map(String::as_str)
    }

    /// Value of the root `data-theme` attribute, if one was applied.
    pub fn theme(&self) -> Option<&str> {
        self.root_attr(THEME_ATTR)
    }

    pub fn theme_color(&self) -> Option<&str> {
        self.theme_color.as_deref()
    }

    pub fn element(&self, id: &str) -> Option<&Element> {
        self.elements.iter().find(|e| e.id == id)
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub(crate) fn toggle_ids(&self) -> Vec<String> {
        self.elements
            .iter()
            .filter(|e| e.is_toggle())
            .map(|e| e.id.clone())
            .collect()
    }

    pub(crate) fn set_root_theme(&mut self, theme: EffectiveTheme) {
        self.root
            .insert(THEME_ATTR.to_string(), theme.as_str().to_string());
    }

    pub(crate) fn set_theme_color(&mut self, color: &str) {
        self.theme_color = Some(color.to_string());
    }

    /// Writes state and ARIA attributes onto a toggle element.
    pub(crate) fn sync_toggle(&mut self, id: &str, preference: Preference, effective: EffectiveTheme) {
        let Some(element) = self.elements.iter_mut().find(|e| e.id == id) else {
            return;
        };
        let attrs = &mut element.attributes;
        attrs.insert(TOGGLE_STATE_ATTR.to_string(), preference.as_str().to_string());
        attrs.insert("aria-pressed".to_string(), effective.is_dark().to_string());
        attrs.insert(
            "aria-label".to_string(),
            format!("Theme: {preference}. Switch to {}", preference.next()),
        );
    }
}
