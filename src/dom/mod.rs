//! Page document backed by a kuchiki tree.
//!
//! kuchiki nodes are reference counted with interior mutability, so every
//! mutation here goes through `&self` and stays on the event-loop thread.

mod form;

use kuchiki::traits::*;
use kuchiki::{parse_html, NodeRef, Selectors};
use thiserror::Error;

use crate::request::AttachMode;

pub use form::{form_data, serialize_form, set_checked};

#[derive(Debug, Error)]
pub enum DomError {
    #[error("invalid selector: {0}")]
    InvalidSelector(String),
}

pub struct Document {
    root: NodeRef,
}

impl Document {
    pub fn parse(html: &str) -> Self {
        Self {
            root: parse_html().one(html),
        }
    }

    pub fn query(&self, selector: &str) -> Result<Option<NodeRef>, DomError> {
        Ok(self.query_all(selector)?.into_iter().next())
    }

    pub fn query_all(&self, selector: &str) -> Result<Vec<NodeRef>, DomError> {
        let matches = self
            .root
            .select(selector)
            .map_err(|_| DomError::InvalidSelector(selector.to_string()))?;
        Ok(matches.map(|element| element.as_node().clone()).collect())
    }

    /// `content` of `<meta name="...">`, if present.
    pub fn meta_content(&self, name: &str) -> Option<String> {
        let selector = format!("meta[name=\"{name}\"]");
        self.root
            .select(&selector)
            .ok()?
            .find_map(|meta| {
                let content = meta.attributes.borrow().get("content").map(str::to_string);
                content
            })
    }

    pub fn body(&self) -> Option<NodeRef> {
        self.query("body").ok().flatten()
    }

    /// Inner HTML of the first element matching `selector`.
    pub fn inner_html(&self, selector: &str) -> Option<String> {
        self.query(selector).ok().flatten().map(|node| inner_html(&node))
    }

    pub fn text(&self, selector: &str) -> Option<String> {
        self.query(selector)
            .ok()
            .flatten()
            .map(|node| node.text_contents())
    }

    pub fn to_html(&self) -> String {
        self.root.to_string()
    }
}

pub fn compile(selector: &str) -> Result<Selectors, DomError> {
    Selectors::compile(selector).map_err(|_| DomError::InvalidSelector(selector.to_string()))
}

/// Closest inclusive ancestor of `node` matching `selectors`.
pub fn closest(node: &NodeRef, selectors: &Selectors) -> Option<NodeRef> {
    node.inclusive_ancestors().find(|candidate| {
        candidate
            .clone()
            .into_element_ref()
            .is_some_and(|element| selectors.matches(&element))
    })
}

pub fn attr(node: &NodeRef, name: &str) -> Option<String> {
    node.as_element()
        .and_then(|element| element.attributes.borrow().get(name).map(str::to_string))
}

/// Attribute value, treating a missing or empty attribute as absent.
pub fn non_empty_attr(node: &NodeRef, name: &str) -> Option<String> {
    attr(node, name).filter(|value| !value.is_empty())
}

pub fn has_attr(node: &NodeRef, name: &str) -> bool {
    node.as_element()
        .is_some_and(|element| element.attributes.borrow().contains(name))
}

pub fn set_attr(node: &NodeRef, name: &str, value: &str) {
    if let Some(element) = node.as_element() {
        element
            .attributes
            .borrow_mut()
            .insert(name, value.to_string());
    }
}

pub fn remove_attr(node: &NodeRef, name: &str) {
    if let Some(element) = node.as_element() {
        element.attributes.borrow_mut().remove(name);
    }
}

pub fn tag_name(node: &NodeRef) -> Option<String> {
    node.as_element()
        .map(|element| element.name.local.to_ascii_lowercase().to_string())
}

pub fn inner_html(node: &NodeRef) -> String {
    node.children().map(|child| child.to_string()).collect()
}

/// Parse markup as body content and return the top-level nodes, detached.
pub fn parse_fragment(markup: &str) -> Vec<NodeRef> {
    let document = parse_html().one(format!(
        "<!DOCTYPE html><html><head></head><body>{markup}</body></html>"
    ));
    let Ok(body) = document.select_first("body") else {
        return Vec::new();
    };
    detach_children(body.as_node())
}

/// Parse markup the way it would be parsed as the content of `context`, so
/// `<tr>` inside a `<tbody>` or `<option>` inside a `<select>` survive.
pub fn parse_fragment_in(context: &NodeRef, markup: &str) -> Vec<NodeRef> {
    let Some(element) = context.as_element() else {
        return parse_fragment(markup);
    };
    let document = kuchiki::parse_fragment(element.name.clone(), Vec::new()).one(markup);
    // The fragment parser hangs everything off a synthetic <html> root.
    let root = document
        .children()
        .find(|child| tag_name(child).as_deref() == Some("html"))
        .unwrap_or(document);
    detach_children(&root)
}

fn detach_children(parent: &NodeRef) -> Vec<NodeRef> {
    let nodes: Vec<NodeRef> = parent.children().collect();
    for node in &nodes {
        node.detach();
    }
    nodes
}

pub fn clear_children(node: &NodeRef) {
    let children: Vec<NodeRef> = node.children().collect();
    for child in children {
        child.detach();
    }
}

/// Merge `markup` into `target` according to `mode`.
pub fn merge_markup(target: &NodeRef, markup: &str, mode: AttachMode) {
    let nodes = parse_fragment_in(target, markup);
    match mode {
        AttachMode::Replace => {
            clear_children(target);
            for node in nodes {
                target.append(node);
            }
        }
        AttachMode::Append => {
            for node in nodes {
                target.append(node);
            }
        }
        AttachMode::Prepend => {
            for node in nodes.into_iter().rev() {
                target.prepend(node);
            }
        }
    }
}
