//! Subscription registry: message tags to ordered handler lists.

use std::collections::HashMap;

/// Token identifying one registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Return the raw value.
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sub#{}", self.0)
    }
}

#[derive(Debug, Clone)]
struct Subscription<H> {
    id: SubscriptionId,
    handler: H,
}

/// Maps message tags to ordered handler lists.
///
/// Handlers for a tag run in insertion order. Registering the same handler
/// twice creates two subscriptions. `H` is the handler type; the scripting
/// context uses reference-counted closures compared by identity.
#[derive(Debug, Clone)]
pub struct MessageDispatcher<H> {
    handlers: HashMap<String, Vec<Subscription<H>>>,
    last_id: u64,
}

impl<H> MessageDispatcher<H> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
            last_id: 0,
        }
    }

    /// Append `handler` to the list for `kind`.
    pub fn subscribe(&mut self, kind: impl Into<String>, handler: H) -> SubscriptionId {
        self.last_id += 1;
        let id = SubscriptionId(self.last_id);
        let kind = kind.into();
        tracing::debug!(message_type = %kind, subscription = %id, "handler subscribed");
        self.handlers
            .entry(kind)
            .or_default()
            .push(Subscription { id, handler });
        id
    }

    /// Remove every occurrence of `handler` from `kind`'s list.
    ///
    /// Returns how many registrations were removed; zero when nothing matched.
    pub fn unsubscribe(&mut self, kind: &str, handler: &H) -> usize
    where
        H: PartialEq,
    {
        let Some(list) = self.handlers.get_mut(kind) else {
            return 0;
        };
        let before = list.len();
        list.retain(|s| s.handler != *handler);
        let removed = before - list.len();
        if list.is_empty() {
            self.handlers.remove(kind);
        }
        if removed > 0 {
            tracing::debug!(message_type = %kind, removed, "handler unsubscribed");
        }
        removed
    }

    /// Remove one registration by its token. Returns `true` if it existed.
    pub fn unsubscribe_id(&mut self, id: SubscriptionId) -> bool {
        let found = self.handlers.iter_mut().find_map(|(kind, list)| {
            let pos = list.iter().position(|s| s.id == id)?;
            list.remove(pos);
            Some((kind.clone(), list.is_empty()))
        });
        match found {
            Some((kind, now_empty)) => {
                if now_empty {
                    self.handlers.remove(&kind);
                }
                tracing::debug!(message_type = %kind, subscription = %id, "handler unsubscribed");
                true
            }
            None => false,
        }
    }

    /// Drop every registration for every tag.
    pub fn clear_all(&mut self) {
        self.handlers.clear();
    }

    /// Number of registrations for `kind`.
    pub fn subscription_count(&self, kind: &str) -> usize {
        self.handlers.get(kind).map_or(0, Vec::len)
    }

    /// Total number of registrations.
    pub fn len(&self) -> usize {
        self.handlers.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Copy of the current handler list for `kind`.
    ///
    /// Dispatch iterates this copy, so handlers added or removed while a
    /// message is being delivered only affect later deliveries.
    pub fn snapshot(&self, kind: &str) -> Vec<H>
    where
        H: Clone,
    {
        self.handlers
            .get(kind)
            .map(|list| list.iter().map(|s| s.handler.clone()).collect())
            .unwrap_or_default()
    }
}

impl<H> Default for MessageDispatcher<H> {
    fn default() -> Self {
        Self::new()
    }
}
