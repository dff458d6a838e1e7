//! Deep-link fragments for launching a single application.
//!
//! A URL carrying `#app=<name>` boots the shell directly into that app,
//! forced fullscreen. The fragment may carry further comma-separated
//! parts after the name.

/// Fragment that deep-links into one application.
pub fn format_app_fragment(app_name: &str) -> String {
    format!("#app={app_name}")
}

/// Extract the app name from a URL fragment, if one is present.
///
/// Accepts the fragment with or without its leading `#`; the name runs
/// until the next `,` or the end of the fragment.
pub fn parse_app_fragment(fragment: &str) -> Option<&str> {
    let fragment = fragment.strip_prefix('#').unwrap_or(fragment);
    let rest = fragment.split_once("app=")?.1;
    let name = rest.split(',').next().unwrap_or(rest);
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}
