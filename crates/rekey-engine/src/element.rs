//! Page elements as reported by the extraction script.

use serde::Deserialize;

/// Attributes that lead the canonical string, in this order, when present.
const PRIORITY_ATTRS: [&str; 4] = ["type", "id", "name", "class"];

/// One element extracted from the live page.
///
/// The extraction script reports every attribute so the recognizer can
/// build the canonical string natively; `selector` is a unique CSS path
/// usable for later clicks and fills.
#[derive(Debug, Clone, Deserialize)]
pub struct PageElement {
    /// Position in the extraction result (document order).
    pub index: usize,
    /// Lowercase tag name.
    pub tag: String,
    /// All attributes as (name, value) pairs, document order.
    pub attributes: Vec<(String, String)>,
    /// Visible text, trimmed, capped by the script.
    #[serde(default)]
    pub text: String,
    /// Unique CSS selector for this element.
    pub selector: String,
    /// Selector of the owning `<form>`, if any.
    #[serde(default)]
    pub form: Option<String>,
    /// Whether the element is currently rendered and visible.
    pub visible: bool,
}

impl PageElement {
    /// Look up an attribute value by name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// The canonical string the recognizer matches against: values of
    /// `type`, `id`, `name`, `class` in that order (present ones only),
    /// then the values of all remaining attributes sorted by attribute
    /// name, joined by `|`.
    pub fn canonical(&self) -> String {
        let mut parts: Vec<&str> = Vec::with_capacity(self.attributes.len());
        for key in PRIORITY_ATTRS {
            if let Some(v) = self.attr(key) {
                parts.push(v);
            }
        }
        let mut rest: Vec<(&str, &str)> = self
            .attributes
            .iter()
            .filter(|(k, _)| !PRIORITY_ATTRS.contains(&k.as_str()))
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        rest.sort_by_key(|(k, _)| *k);
        parts.extend(rest.iter().map(|(_, v)| *v));
        parts.join("|")
    }

    /// Whether this element is a text-bearing form input (not a button).
    /// Used to score competing form recognizers.
    pub fn is_non_button_input(&self) -> bool {
        match self.tag.as_str() {
            "input" => !matches!(
                self.attr("type").unwrap_or("text"),
                "button" | "submit" | "reset" | "image"
            ),
            "textarea" | "select" => true,
            _ => false,
        }
    }

    /// Whether this element can be clicked as a navigation link.
    pub fn is_link(&self) -> bool {
        self.tag == "a"
            || self.attr("role") == Some("link")
            || self.attr("role") == Some("menuitem")
            || (self.tag == "button" && self.attr("type") != Some("submit"))
    }
}
