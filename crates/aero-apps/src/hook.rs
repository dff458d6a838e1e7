//! System hooks: extension points apps plug into at install time.
//!
//! Each hook keeps a per-app enabled flag persisted in the `systemHook`
//! collection under `hook_status_<hookName>`, so a user's choice to mute an
//! app's handlers survives reloads.

use std::collections::HashMap;

use aero_store::Collection;
use serde::{Deserialize, Serialize};

/// One result row from a global-search handler.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl SearchResult {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

/// Handler registered by an app: keyword in, result rows out.
pub type GlobalSearchHandler = Box<dyn FnMut(&str) -> Vec<SearchResult>>;

type EnabledCallback = Box<dyn FnMut(&str)>;

/// One named hook with per-app handlers and persisted enabled flags.
pub struct SystemHook<F> {
    hook_name: String,
    store: Collection,
    status: HashMap<String, bool>,
    handlers: Vec<(String, F)>,
    enabled_subscribers: Vec<EnabledCallback>,
}

impl<F> SystemHook<F> {
    /// Build the hook and replay its persisted enabled flags.
    pub fn new(hook_name: impl Into<String>, store: Collection) -> Self {
        let hook_name = hook_name.into();
        let status = store
            .get::<HashMap<String, bool>>(&format!("hook_status_{hook_name}"))
            .unwrap_or_default()
            .unwrap_or_default();
        Self {
            hook_name,
            store,
            status,
            handlers: Vec::new(),
            enabled_subscribers: Vec::new(),
        }
    }

    pub fn hook_name(&self) -> &str {
        &self.hook_name
    }

    /// Enable or mute one app's handlers; the flag is persisted.
    pub fn set_enabled(&mut self, app_name: &str, enabled: bool) {
        self.status.insert(app_name.to_string(), enabled);
        let key = format!("hook_status_{}", self.hook_name);
        if let Err(err) = self.store.set(&key, &self.status) {
            tracing::warn!(hook = %self.hook_name, %err, "failed to persist hook status");
        }
        let mut cbs = std::mem::take(&mut self.enabled_subscribers);
        for cb in cbs.iter_mut() {
            cb(app_name);
        }
        cbs.append(&mut self.enabled_subscribers);
        self.enabled_subscribers = cbs;
    }

    pub fn is_enabled(&self, app_name: &str) -> bool {
        self.status.get(app_name).copied().unwrap_or(false)
    }

    pub fn on_enabled_change(&mut self, cb: impl FnMut(&str) + 'static) {
        self.enabled_subscribers.push(Box::new(cb));
    }

    /// Register a handler on behalf of an app.
    pub fn register(&mut self, app_name: impl Into<String>, handler: F) {
        self.handlers.push((app_name.into(), handler));
    }

    /// Drop every handler an app registered.
    pub fn unregister_app(&mut self, app_name: &str) {
        self.handlers.retain(|(name, _)| name != app_name);
    }

    /// Apps with at least one handler, first-registration order.
    pub fn registered_apps(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for (name, _) in &self.handlers {
            if !names.contains(&name.as_str()) {
                names.push(name.as_str());
            }
        }
        names
    }
}

impl SystemHook<GlobalSearchHandler> {
    /// Poll every enabled app's handlers for a keyword.
    pub fn search(&mut self, keyword: &str) -> Vec<SearchResult> {
        let mut results = Vec::new();
        let status = &self.status;
        for (_, handler) in self
            .handlers
            .iter_mut()
            .filter(|(app, _)| status.get(app.as_str()).copied().unwrap_or(false))
        {
            results.extend(handler(keyword));
        }
        results
    }
}

/// The hook surface handed to `installed`.
pub struct SystemHooks {
    pub global_search: SystemHook<GlobalSearchHandler>,
}

impl SystemHooks {
    pub fn new(store: Collection) -> Self {
        Self {
            global_search: SystemHook::new("globalSearch", store),
        }
    }
}
