//! Compound selectors: one element matched by tag, id and attributes.
//!
//! Descendant and child combinators are expressed by the lookup method
//! used ([`Document::query_within`](crate::Document::query_within) versus
//! [`Document::query_child`](crate::Document::query_child)).

use crate::node::ElementData;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selector {
    tag: Option<String>,
    id: Option<String>,
    id_contains: Option<String>,
    attrs: Vec<(String, String)>,
}

impl Selector {
    /// Matches any element.
    pub fn any() -> Self {
        Self::default()
    }

    pub fn tag(tag: impl Into<String>) -> Self {
        Self {
            tag: Some(tag.into()),
            ..Default::default()
        }
    }

    pub fn id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Default::default()
        }
    }

    /// `[id*=fragment]`
    pub fn id_contains(fragment: impl Into<String>) -> Self {
        Self {
            id_contains: Some(fragment.into()),
            ..Default::default()
        }
    }

    /// `[name=value]`
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((name.into(), value.into()));
        self
    }

    pub(crate) fn matches(&self, el: &ElementData) -> bool {
        if let Some(tag) = &self.tag {
            if !el.tag.eq_ignore_ascii_case(tag) {
                return false;
            }
        }

        let id = el.attrs.get("id");
        if let Some(wanted) = &self.id {
            if id != Some(wanted) {
                return false;
            }
        }
        if let Some(fragment) = &self.id_contains {
            if !id.is_some_and(|id| id.contains(fragment.as_str())) {
                return false;
            }
        }

        self.attrs
            .iter()
            .all(|(name, value)| el.attrs.get(name) == Some(value))
    }
}
