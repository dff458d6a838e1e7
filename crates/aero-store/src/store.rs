//! Store and collection handles.
//!
//! A `Store` wraps one backend plus the change-subscription table. Handles
//! are `Rc` clones; `Collection` is a named view used by each component
//! (`processManager`, `appManager`, `systemHook`, per-app namespaces).

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::backend::StorageBackend;
use crate::error::StoreError;

/// Identifies one subscription for later removal.
pub type SubscriptionId = u64;

type ChangeCallback = Box<dyn FnMut(&Value)>;

struct StoreInner {
    backend: Box<dyn StorageBackend>,
    subscribers: HashMap<(String, String), Vec<(SubscriptionId, ChangeCallback)>>,
    next_subscription: SubscriptionId,
    /// Ids unsubscribed while their list was out for dispatch
    dead: Vec<SubscriptionId>,
    dispatch_depth: u32,
}

/// Shared handle to the key-value store.
#[derive(Clone)]
pub struct Store {
    inner: Rc<RefCell<StoreInner>>,
}

impl Store {
    /// Create a store over the given backend.
    pub fn new(backend: Box<dyn StorageBackend>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(StoreInner {
                backend,
                subscribers: HashMap::new(),
                next_subscription: 1,
                dead: Vec::new(),
                dispatch_depth: 0,
            })),
        }
    }

    /// Get a named collection handle.
    pub fn collection(&self, name: &str) -> Collection {
        Collection {
            store: self.clone(),
            name: name.to_string(),
        }
    }

    /// List known collection names.
    pub fn collections(&self) -> Result<Vec<String>, StoreError> {
        self.inner.borrow().backend.collections()
    }

    /// Ingest a change made by another browsing context.
    ///
    /// The other context already persisted the value; this records it in
    /// the local backend view and notifies subscribers, so both tabs
    /// converge on last-writer-wins.
    pub fn apply_external(
        &self,
        collection: &str,
        key: &str,
        raw: &str,
    ) -> Result<(), StoreError> {
        let value: Value =
            serde_json::from_str(raw).map_err(|e| StoreError::codec(key, e))?;
        self.inner
            .borrow_mut()
            .backend
            .set(collection, key, raw.to_string())?;
        self.notify(collection, key, &value);
        Ok(())
    }

    fn set_raw(&self, collection: &str, key: &str, raw: String, value: &Value) -> Result<(), StoreError> {
        self.inner
            .borrow_mut()
            .backend
            .set(collection, key, raw)?;
        self.notify(collection, key, value);
        Ok(())
    }

    /// Invoke subscribers for `(collection, key)`.
    ///
    /// Callbacks are moved out of the table for the duration of the call so
    /// a callback may use the store (even subscribe) without re-entering
    /// the interior borrow.
    fn notify(&self, collection: &str, key: &str, value: &Value) {
        let slot = (collection.to_string(), key.to_string());
        let mut callbacks = {
            let mut inner = self.inner.borrow_mut();
            match inner.subscribers.remove(&slot) {
                Some(cbs) => {
                    inner.dispatch_depth += 1;
                    cbs
                }
                None => return,
            }
        };
        for (_, cb) in callbacks.iter_mut() {
            cb(value);
        }
        let mut inner = self.inner.borrow_mut();
        inner.dispatch_depth -= 1;
        // An unsubscribe that targeted the in-flight list landed in `dead`;
        // apply it here instead of losing it on the merge.
        let dead = std::mem::take(&mut inner.dead);
        for id in dead {
            let before = callbacks.len();
            callbacks.retain(|(sid, _)| *sid != id);
            if callbacks.len() == before && inner.dispatch_depth > 0 {
                inner.dead.push(id);
            }
        }
        // Merge back, keeping subscriptions added while we were out.
        match inner.subscribers.get_mut(&slot) {
            Some(added) => {
                callbacks.append(added);
                *added = callbacks;
            }
            None => {
                inner.subscribers.insert(slot, callbacks);
            }
        }
    }

    fn subscribe(
        &self,
        collection: &str,
        key: &str,
        cb: ChangeCallback,
    ) -> SubscriptionId {
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_subscription;
        inner.next_subscription += 1;
        inner
            .subscribers
            .entry((collection.to_string(), key.to_string()))
            .or_default()
            .push((id, cb));
        id
    }

    /// Remove a subscription. Unknown ids are ignored.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        let mut inner = self.inner.borrow_mut();
        let mut found = false;
        for cbs in inner.subscribers.values_mut() {
            let before = cbs.len();
            cbs.retain(|(sid, _)| *sid != id);
            found |= cbs.len() != before;
        }
        if !found && inner.dispatch_depth > 0 {
            inner.dead.push(id);
        }
    }
}

/// Namespaced view over the store.
#[derive(Clone)]
pub struct Collection {
    store: Store,
    name: String,
}

impl Collection {
    /// Collection name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Write a value, then notify subscribers of the key.
    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let json = serde_json::to_value(value).map_err(|e| StoreError::codec(key, e))?;
        let raw = json.to_string();
        self.store.set_raw(&self.name, key, raw, &json)
    }

    /// Read a typed value. Missing keys are `Ok(None)`.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        match self.store.inner.borrow().backend.get(&self.name, key)? {
            Some(raw) => {
                let v = serde_json::from_str(&raw).map_err(|e| StoreError::codec(key, e))?;
                Ok(Some(v))
            }
            None => Ok(None),
        }
    }

    /// Check for a key without decoding its value.
    pub fn has(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self
            .store
            .inner
            .borrow()
            .backend
            .get(&self.name, key)?
            .is_some())
    }

    /// Keys of this collection.
    pub fn keys(&self) -> Result<Vec<String>, StoreError> {
        self.store.inner.borrow().backend.keys(&self.name)
    }

    /// Remove a key.
    pub fn remove(&self, key: &str) -> Result<bool, StoreError> {
        self.store.inner.borrow_mut().backend.remove(&self.name, key)
    }

    /// Drop the whole collection.
    pub fn remove_all(&self) -> Result<bool, StoreError> {
        self.store
            .inner
            .borrow_mut()
            .backend
            .remove_collection(&self.name)
    }

    /// Subscribe to changes of one key.
    pub fn subscribe(&self, key: &str, cb: impl FnMut(&Value) + 'static) -> SubscriptionId {
        self.store.subscribe(&self.name, key, Box::new(cb))
    }

    /// Remove a subscription made on this store.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.store.unsubscribe(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use serde::Deserialize;

    fn store() -> Store {
        Store::new(Box::new(MemoryBackend::new()))
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Prefs {
        theme: String,
        scale: f32,
    }

    #[test]
    fn test_typed_roundtrip() {
        let store = store();
        let prefs = store.collection("settings");

        prefs
            .set(
                "prefs",
                &Prefs {
                    theme: "dark".to_string(),
                    scale: 1.5,
                },
            )
            .unwrap();

        let read: Prefs = prefs.get("prefs").unwrap().unwrap();
        assert_eq!(read.theme, "dark");
        assert!((read.scale - 1.5).abs() < 0.001);
    }

    #[test]
    fn test_missing_key_is_none() {
        let store = store();
        let c = store.collection("settings");
        let v: Option<String> = c.get("nope").unwrap();
        assert!(v.is_none());
        assert!(!c.has("nope").unwrap());
    }

    #[test]
    fn test_subscribe_fires_on_set() {
        let store = store();
        let c = store.collection("processManager");

        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_cb = seen.clone();
        c.subscribe("cacheProcessState", move |v| {
            seen_cb.borrow_mut().push(v.clone());
        });

        c.set("cacheProcessState", &serde_json::json!({"files": {"isRunning": true}}))
            .unwrap();
        c.set("otherKey", &1).unwrap();

        let seen = seen.borrow();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0]["files"]["isRunning"], Value::Bool(true));
    }

    #[test]
    fn test_unsubscribe_stops_notifications() {
        let store = store();
        let c = store.collection("a");

        let count = Rc::new(RefCell::new(0));
        let count_cb = count.clone();
        let id = c.subscribe("k", move |_| {
            *count_cb.borrow_mut() += 1;
        });

        c.set("k", &1).unwrap();
        c.unsubscribe(id);
        c.set("k", &2).unwrap();

        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn test_unsubscribe_inside_own_callback_sticks() {
        let store = store();
        let c = store.collection("a");

        let count = Rc::new(RefCell::new(0));
        let count_cb = count.clone();
        let slot: Rc<RefCell<Option<SubscriptionId>>> = Rc::new(RefCell::new(None));
        let slot_cb = slot.clone();
        let unsub = c.clone();
        let id = c.subscribe("k", move |_| {
            *count_cb.borrow_mut() += 1;
            if let Some(id) = slot_cb.borrow_mut().take() {
                unsub.unsubscribe(id);
            }
        });
        *slot.borrow_mut() = Some(id);

        c.set("k", &1).unwrap();
        c.set("k", &2).unwrap();
        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn test_callback_may_use_store() {
        let store = store();
        let c = store.collection("a");
        let mirror = store.collection("b");

        let m = mirror.clone();
        c.subscribe("k", move |v| {
            m.set("copy", v).unwrap();
        });

        c.set("k", &42).unwrap();
        let copied: i32 = mirror.get("copy").unwrap().unwrap();
        assert_eq!(copied, 42);
    }

    #[test]
    fn test_apply_external_notifies() {
        let store = store();
        let c = store.collection("processManager");

        let seen = Rc::new(RefCell::new(None));
        let seen_cb = seen.clone();
        c.subscribe("cacheProcessState", move |v| {
            *seen_cb.borrow_mut() = Some(v.clone());
        });

        store
            .apply_external("processManager", "cacheProcessState", r#"{"x": 1}"#)
            .unwrap();

        assert_eq!(seen.borrow().as_ref().unwrap()["x"], Value::from(1));
        // The external value is now readable locally too.
        let v: Value = c.get("cacheProcessState").unwrap().unwrap();
        assert_eq!(v["x"], Value::from(1));
    }

    #[test]
    fn test_writes_serialize_per_key() {
        let store = store();
        let c = store.collection("a");
        for i in 0..10 {
            c.set("k", &i).unwrap();
        }
        let last: i32 = c.get("k").unwrap().unwrap();
        assert_eq!(last, 9);
    }
}
