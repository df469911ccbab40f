//! Interaction handlers: turn one page event into one request descriptor,
//! plus the history write when the interaction qualifies.

use kuchiki::NodeRef;
use tracing::{debug, warn};

use crate::dom::{self, attr, non_empty_attr};
use crate::history::HistoryError;
use crate::normalize::{absolute, normalize};
use crate::page::Page;
use crate::request::{AttachMode, Method, Payload, RequestDescriptor};

pub const ANCHOR_SELECTOR: &str = "a[data-ajax=true], [data-ajax-links] a";
pub const FORM_SELECTOR: &str = "form[data-ajax=true]";
pub const SELECT_ALL_SELECTOR: &str = ".selectAll";

/// Descriptor for a click on an ajax-enabled anchor.
pub fn anchor_descriptor(anchor: &NodeRef, default_destination: &str) -> RequestDescriptor {
    let url = non_empty_attr(anchor, "data-href")
        .or_else(|| non_empty_attr(anchor, "href"))
        .unwrap_or_default();
    let destination =
        non_empty_attr(anchor, "data-dst").unwrap_or_else(|| default_destination.to_string());
    let attach = attr(anchor, "data-attach")
        .map(|mode| AttachMode::parse(&mode))
        .unwrap_or_default();
    let title = non_empty_attr(anchor, "title").unwrap_or_else(|| url.clone());

    RequestDescriptor::get(url)
        .with_destination(destination)
        .with_attach(attach)
        .temporary(is_temporary(anchor))
        .with_title(title)
}

/// Descriptor for submitting an ajax-enabled form. The payload is the live
/// form data; history gets the serialized field list instead.
pub fn form_descriptor(form: &NodeRef, default_destination: &str) -> RequestDescriptor {
    let url = non_empty_attr(form, "action").unwrap_or_default();
    let method = non_empty_attr(form, "method")
        .map(|method| Method::parse(&method))
        .unwrap_or_default();
    let destination =
        non_empty_attr(form, "data-dst").unwrap_or_else(|| default_destination.to_string());
    let attach = attr(form, "data-attach")
        .map(|mode| AttachMode::parse(&mode))
        .unwrap_or_default();
    let title = non_empty_attr(form, "title").unwrap_or_else(|| url.clone());

    RequestDescriptor::get(url)
        .with_method(method)
        .with_destination(destination)
        .with_payload(Payload::FormData(dom::form_data(form)))
        .with_attach(attach)
        .temporary(is_temporary(form))
        .with_title(title)
}

/// Descriptor for a page opened with an address fragment.
pub fn fragment_descriptor(
    fragment: &str,
    base_url: &str,
    default_destination: &str,
) -> RequestDescriptor {
    RequestDescriptor::get(absolute(fragment, base_url)).with_destination(default_destination)
}

/// `data-temp` with a non-empty value keeps the interaction out of history.
fn is_temporary(node: &NodeRef) -> bool {
    non_empty_attr(node, "data-temp").is_some()
}

/// Visible address recorded for a descriptor: `base#path`.
pub fn history_address(url: &str, base_url: &str) -> String {
    format!("{base_url}#{}", normalize(url, base_url))
}

/// Push a history entry carrying the replayable form of `descriptor`.
pub(crate) fn record(page: &Page, descriptor: &RequestDescriptor) -> Result<(), HistoryError> {
    let recorded = descriptor.for_history();
    let address = history_address(&descriptor.url, page.base_url());
    let href = page.window().resolve_address(&address);

    page.history_mut()
        .push_state(&recorded, recorded.title_or_url(), &href)?;
    page.window_mut().set_address(&href);
    debug!(target = "navigate", address = %href, "history entry pushed");
    Ok(())
}

/// Decode a history state back into the descriptor it was recorded from.
pub(crate) fn replayable(state: Option<serde_json::Value>) -> Option<RequestDescriptor> {
    let state = state?;
    match serde_json::from_value(state) {
        Ok(descriptor) => Some(descriptor),
        Err(err) => {
            warn!(target = "navigate", error = %err, "history state is not a request, ignoring");
            None
        }
    }
}

/// Check or uncheck every checkbox in the toggle's table.
pub(crate) fn toggle_select_all(toggle: &NodeRef) -> usize {
    let checked = dom::has_attr(toggle, "checked") && !dom::has_attr(toggle, "disabled");
    let Ok(tables) = dom::compile("table") else {
        return 0;
    };
    let Some(table) = dom::closest(toggle, &tables) else {
        return 0;
    };
    let Ok(boxes) = table.select("input[type=checkbox]") else {
        return 0;
    };

    let mut count = 0;
    for checkbox in boxes {
        dom::set_checked(checkbox.as_node(), checked);
        count += 1;
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;
    use crate::request::FormField;

    fn node(doc: &Document, selector: &str) -> NodeRef {
        doc.query(selector).unwrap().unwrap()
    }

    #[test]
    fn anchor_prefers_data_href() {
        let doc = Document::parse(
            r#"<a id="a" data-ajax="true" href="/plain" data-href="/override">x</a>"#,
        );
        let descriptor = anchor_descriptor(&node(&doc, "#a"), "#content");
        assert_eq!(descriptor.url, "/override");
        assert_eq!(descriptor.method, Method::Get);
        assert_eq!(descriptor.destination, "#content");
        assert_eq!(descriptor.title.as_deref(), Some("/override"));
        assert!(!descriptor.temporary);
    }

    #[test]
    fn anchor_destination_override() {
        let doc = Document::parse(
            r##"<a id="a" href="/x" data-dst="#panel" data-attach="append" title="X">x</a>"##,
        );
        let descriptor = anchor_descriptor(&node(&doc, "#a"), "#content");
        assert_eq!(descriptor.destination, "#panel");
        assert_eq!(descriptor.attach, AttachMode::Append);
        assert_eq!(descriptor.title.as_deref(), Some("X"));
    }

    #[test]
    fn empty_temp_marker_still_records() {
        let doc = Document::parse(
            r#"<a id="t" href="/x" data-temp="1">x</a><a id="e" href="/x" data-temp="">x</a>"#,
        );
        assert!(anchor_descriptor(&node(&doc, "#t"), "#content").temporary);
        assert!(!anchor_descriptor(&node(&doc, "#e"), "#content").temporary);
    }

    #[test]
    fn form_reads_action_method_and_fields() {
        let doc = Document::parse(
            r##"<form id="f" action="/search" method="get" data-dst="#results">
                <input name="q" value="x">
            </form>"##,
        );
        let descriptor = form_descriptor(&node(&doc, "#f"), "#content");
        assert_eq!(descriptor.url, "/search");
        assert_eq!(descriptor.method, Method::Get);
        assert_eq!(descriptor.destination, "#results");
        match descriptor.payload {
            Some(Payload::FormData(data)) => assert_eq!(data.get("q"), Some("x")),
            other => panic!("expected live form data, got {other:?}"),
        }
    }

    #[test]
    fn form_defaults_to_get_and_empty_action() {
        let doc = Document::parse(r#"<form id="f"></form>"#);
        let descriptor = form_descriptor(&node(&doc, "#f"), "#content");
        assert_eq!(descriptor.url, "");
        assert_eq!(descriptor.method, Method::Get);
        assert_eq!(
            descriptor.for_history().payload,
            Some(Payload::Fields(Vec::<FormField>::new()))
        );
    }

    #[test]
    fn fragment_is_made_absolute() {
        let descriptor = fragment_descriptor("users/1", "/app/", "#content");
        assert_eq!(descriptor.url, "/app/users/1");
        let descriptor = fragment_descriptor("/app/users/1", "/app/", "#content");
        assert_eq!(descriptor.url, "/app/users/1");
    }

    #[test]
    fn history_address_uses_normalized_path() {
        assert_eq!(history_address("/app/users", "/app/"), "/app/#users");
        assert_eq!(history_address("users", ""), "#users");
    }

    #[test]
    fn replayable_ignores_foreign_state() {
        assert!(replayable(None).is_none());
        assert!(replayable(Some(serde_json::json!({"scroll": 10}))).is_none());
        assert_eq!(
            replayable(Some(serde_json::json!({"url": "users"}))),
            Some(RequestDescriptor::get("users"))
        );
    }

    #[test]
    fn select_all_follows_toggle() {
        let doc = Document::parse(
            r#"<table>
                <tr><th><input id="all" class="selectAll" type="checkbox" checked></th></tr>
                <tr><td><input id="one" type="checkbox"></td></tr>
                <tr><td><input id="two" type="checkbox"></td></tr>
            </table>
            <input id="outside" type="checkbox">"#,
        );
        assert_eq!(toggle_select_all(&node(&doc, "#all")), 3);
        assert!(dom::has_attr(&node(&doc, "#one"), "checked"));
        assert!(dom::has_attr(&node(&doc, "#two"), "checked"));
        assert!(!dom::has_attr(&node(&doc, "#outside"), "checked"));

        dom::set_checked(&node(&doc, "#all"), false);
        toggle_select_all(&node(&doc, "#all"));
        assert!(!dom::has_attr(&node(&doc, "#one"), "checked"));
    }
}
