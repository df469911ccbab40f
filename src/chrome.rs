/// Page chrome injected by the navigator
/// This module builds the markup the navigator adds to the host page.
///
/// - A floating reload button appended to `<body>` at start-up
/// - An inline, dismissible error banner rendered into a failed destination
use html_escape::encode_text;

pub const RELOAD_BUTTON_ID: &str = "navigate-reload";
pub const BANNER_ID_ATTR: &str = "data-banner-id";
pub const BANNER_SELECTOR: &str = ".alert";
pub const DISMISS_SELECTOR: &str = "[data-dismiss=alert]";

pub fn reload_button_markup() -> String {
    format!(
        r#"<button id="{RELOAD_BUTTON_ID}" class="btn btn-primary" style="position: fixed; z-index: 1040; top: 100px; right: 10px"><i class="fa fa-refresh"></i></button>"#
    )
}

/// Error banner carrying the thrown error text. `banner_id` ties the node to
/// its expiry timer.
pub fn error_banner_markup(banner_id: u64, thrown: &str) -> String {
    format!(
        r#"<div class="alert alert-warning alert-dismissible" role="alert" style="margin-top: 50px" {BANNER_ID_ATTR}="{banner_id}"><button type="button" class="close" data-dismiss="alert" aria-label="Close"><span aria-hidden="true">&times;</span></button><strong>An Error Occurred! </strong> {thrown}</div>"#,
        thrown = encode_text(thrown),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{attr, parse_fragment};

    #[test]
    fn banner_escapes_error_text() {
        let markup = error_banner_markup(7, "<script>boom</script>");
        assert!(markup.contains("&lt;script&gt;boom&lt;/script&gt;"));
        assert!(!markup.contains("<script>"));
    }

    #[test]
    fn banner_parses_into_single_alert() {
        let nodes = parse_fragment(&error_banner_markup(3, "Internal Server Error"));
        assert_eq!(nodes.len(), 1);
        assert_eq!(attr(&nodes[0], BANNER_ID_ATTR).as_deref(), Some("3"));
        assert!(nodes[0].text_contents().contains("Internal Server Error"));
    }

    #[test]
    fn reload_button_has_stable_id() {
        let nodes = parse_fragment(&reload_button_markup());
        assert_eq!(attr(&nodes[0], "id").as_deref(), Some(RELOAD_BUTTON_ID));
    }
}
