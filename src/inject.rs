//! Host injection channel.
//!
//! A host that already has the headlines (for example a native screensaver
//! shell) pushes them in through [`InjectionRegistry::set_items`] instead of
//! letting the ticker fetch them.  The registry keeps the latest batch and a
//! list of subscribers, one per mounted ticker.
//!
//! ## Guarantees
//!
//! * Every batch replaces the previous one whole.
//! * Subscribers are called in registration order, and all of them have run
//!   before `set_items` returns.
//! * Handlers run outside the registry lock, so a handler may subscribe or
//!   unsubscribe without deadlocking.
//!
//! The process-wide registry lives behind [`InjectionRegistry::global`].
//! Tests build their own with [`InjectionRegistry::new`] so they cannot see
//! each other's batches.

use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::source::{parse_timestamp, NewsItem};

#[derive(Debug, Error)]
pub enum InjectError {
    #[error("invalid injected items: {0}")]
    Json(#[from] serde_json::Error),
}

/// An item as the host sends it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InjectedItem {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub link: String,
    /// ISO-like date string.
    #[serde(default)]
    pub pub_date: String,
    #[serde(alias = "feedId")]
    pub source_id: String,
}

impl InjectedItem {
    /// Host items are already normalised; only the date needs parsing.
    pub fn to_news_item(&self, now: DateTime<Utc>) -> NewsItem {
        NewsItem {
            id: self.id.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            link: self.link.clone(),
            published_at: parse_timestamp(Some(self.pub_date.as_str()), now),
            source_id: self.source_id.clone(),
        }
    }
}

type Handler = Arc<dyn Fn(&[InjectedItem]) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

struct Subscriber {
    id: SubscriberId,
    consumer: String,
    handler: Handler,
}

#[derive(Default)]
struct Inner {
    items: Vec<InjectedItem>,
    subscribers: Vec<Subscriber>,
    next_id: u64,
}

#[derive(Default)]
pub struct InjectionRegistry {
    inner: Mutex<Inner>,
}

static GLOBAL: OnceLock<Arc<InjectionRegistry>> = OnceLock::new();

impl InjectionRegistry {
    /// A fresh, isolated registry.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// The process-wide registry, created on first use.
    pub fn global() -> Arc<Self> {
        Arc::clone(GLOBAL.get_or_init(Self::new))
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register `handler` for `consumer`.  Dropping the returned
    /// [`Subscription`] unregisters it.
    pub fn subscribe<F>(self: &Arc<Self>, consumer: impl Into<String>, handler: F) -> Subscription
    where
        F: Fn(&[InjectedItem]) + Send + Sync + 'static,
    {
        let consumer = consumer.into();
        let mut inner = self.lock();
        let id = SubscriberId(inner.next_id);
        inner.next_id += 1;
        tracing::debug!(consumer = %consumer, "injection subscriber registered");
        inner.subscribers.push(Subscriber {
            id,
            consumer,
            handler: Arc::new(handler),
        });
        Subscription {
            registry: Arc::clone(self),
            id,
        }
    }

    /// Returns whether `id` was still registered.
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        let mut inner = self.lock();
        let before = inner.subscribers.len();
        inner.subscribers.retain(|s| s.id != id);
        inner.subscribers.len() != before
    }

    /// Replace the batch and notify every subscriber before returning.
    pub fn set_items(&self, items: Vec<InjectedItem>) {
        let (batch, handlers) = {
            let mut inner = self.lock();
            inner.items = items;
            let handlers: Vec<Handler> = inner
                .subscribers
                .iter()
                .map(|s| Arc::clone(&s.handler))
                .collect();
            (inner.items.clone(), handlers)
        };

        tracing::info!(
            items = batch.len(),
            subscribers = handlers.len(),
            "received injected items"
        );
        for handler in handlers {
            handler(&batch);
        }
    }

    /// Parse a JSON array of items and [`set_items`](Self::set_items) it.
    /// Returns the number of items delivered.
    pub fn set_items_json(&self, json: &str) -> Result<usize, InjectError> {
        let items: Vec<InjectedItem> = serde_json::from_str(json)?;
        let count = items.len();
        self.set_items(items);
        Ok(count)
    }

    /// The current batch.
    pub fn items(&self) -> Vec<InjectedItem> {
        self.lock().items.clone()
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().subscribers.len()
    }

    /// Consumer ids in registration order.
    pub fn consumers(&self) -> Vec<String> {
        self.lock()
            .subscribers
            .iter()
            .map(|s| s.consumer.clone())
            .collect()
    }

    /// Drop the batch and every subscriber.
    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.items.clear();
        inner.subscribers.clear();
    }
}

/// Keeps a handler registered; unregisters it on drop.
pub struct Subscription {
    registry: Arc<InjectionRegistry>,
    id: SubscriberId,
}

impl Subscription {
    pub fn id(&self) -> SubscriberId {
        self.id
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.registry.unsubscribe(self.id);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
