use kuchiki::NodeRef;

use super::{attr, has_attr, remove_attr, set_attr, tag_name};
use crate::request::{FormData, FormField};

const UNSUBMITTABLE_INPUTS: &[&str] = &["submit", "button", "reset", "image", "file"];

/// Serialize the successful controls of `form` as an ordered field list.
pub fn serialize_form(form: &NodeRef) -> Vec<FormField> {
    let Ok(controls) = form.select("input, select, textarea") else {
        return Vec::new();
    };

    let mut fields = Vec::new();
    for control in controls {
        let node = control.as_node();
        let Some(name) = attr(node, "name").filter(|name| !name.is_empty()) else {
            continue;
        };
        if is_disabled(node) {
            continue;
        }

        match tag_name(node).as_deref() {
            Some("input") => {
                if let Some(value) = input_value(node) {
                    fields.push(FormField::new(name, normalize_newlines(&value)));
                }
            }
            Some("textarea") => {
                fields.push(FormField::new(name, normalize_newlines(&node.text_contents())));
            }
            Some("select") => {
                for value in selected_values(node) {
                    fields.push(FormField::new(name.clone(), normalize_newlines(&value)));
                }
            }
            _ => {}
        }
    }
    fields
}

/// Snapshot of the form as it would be submitted.
pub fn form_data(form: &NodeRef) -> FormData {
    FormData::new(serialize_form(form))
}

pub fn set_checked(node: &NodeRef, checked: bool) {
    if checked {
        set_attr(node, "checked", "checked");
    } else {
        remove_attr(node, "checked");
    }
}

fn is_disabled(node: &NodeRef) -> bool {
    if has_attr(node, "disabled") {
        return true;
    }
    node.ancestors().any(|ancestor| {
        tag_name(&ancestor).as_deref() == Some("fieldset") && has_attr(&ancestor, "disabled")
    })
}

fn input_value(node: &NodeRef) -> Option<String> {
    let kind = attr(node, "type")
        .map(|kind| kind.trim().to_ascii_lowercase())
        .unwrap_or_else(|| "text".to_string());

    if UNSUBMITTABLE_INPUTS.contains(&kind.as_str()) {
        return None;
    }
    if kind == "checkbox" || kind == "radio" {
        if !has_attr(node, "checked") {
            return None;
        }
        return Some(attr(node, "value").unwrap_or_else(|| "on".to_string()));
    }
    Some(attr(node, "value").unwrap_or_default())
}

fn selected_values(select: &NodeRef) -> Vec<String> {
    let Ok(options) = select.select("option") else {
        return Vec::new();
    };
    let options: Vec<NodeRef> = options
        .map(|option| option.as_node().clone())
        .filter(|option| !has_attr(option, "disabled"))
        .collect();

    let selected: Vec<&NodeRef> = options
        .iter()
        .filter(|option| has_attr(option, "selected"))
        .collect();

    if has_attr(select, "multiple") {
        return selected.into_iter().map(option_value).collect();
    }

    // A single-select submits its last selected option, or the first one.
    selected
        .last()
        .copied()
        .or_else(|| options.first())
        .map(option_value)
        .into_iter()
        .collect()
}

fn option_value(option: &NodeRef) -> String {
    attr(option, "value").unwrap_or_else(|| {
        option
            .text_contents()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    })
}

fn normalize_newlines(value: &str) -> String {
    value.replace("\r\n", "\n").replace('\n', "\r\n")
}
