//! Typed publish/subscribe channel for service push events.

use std::{
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, PoisonError, Weak,
    },
};

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Subscriber<T> {
    id: u64,
    active: Arc<AtomicBool>,
    callback: Callback<T>,
}

impl<T> Clone for Subscriber<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            active: Arc::clone(&self.active),
            callback: Arc::clone(&self.callback),
        }
    }
}

struct ChannelInner<T> {
    next_id: u64,
    subscribers: Vec<Subscriber<T>>,
}

/// Every subscriber registered at publish time receives each event at most once.
/// Callbacks run on the publishing thread, outside the channel lock, so a
/// callback may unsubscribe itself or others.
pub struct EventChannel<T> {
    inner: Arc<Mutex<ChannelInner<T>>>,
}

impl<T: 'static> EventChannel<T> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(ChannelInner {
                next_id: 0,
                subscribers: Vec::new(),
            })),
        }
    }

    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let active = Arc::new(AtomicBool::new(true));
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let id = inner.next_id;
        inner.next_id += 1;
        inner.subscribers.push(Subscriber {
            id,
            active: Arc::clone(&active),
            callback: Arc::new(callback),
        });
        drop(inner);

        let channel: Weak<Mutex<ChannelInner<T>>> = Arc::downgrade(&self.inner);
        Subscription {
            active: Arc::clone(&active),
            release: Some(Box::new(move || {
                active.store(false, Ordering::SeqCst);
                if let Some(channel) = channel.upgrade() {
                    let mut inner = channel.lock().unwrap_or_else(PoisonError::into_inner);
                    inner.subscribers.retain(|subscriber| subscriber.id != id);
                }
            })),
        }
    }

    /// Delivers `event` to current subscribers and returns how many received it.
    pub fn publish(&self, event: &T) -> usize {
        let subscribers = {
            let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            inner.subscribers.clone()
        };

        let mut delivered = 0;
        for subscriber in subscribers {
            if subscriber.active.load(Ordering::SeqCst) {
                (subscriber.callback)(event);
                delivered += 1;
            }
        }
        delivered
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner
            .lock()
            .map(|inner| inner.subscribers.len())
            .unwrap_or_default()
    }
}

impl<T: 'static> Default for EventChannel<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> fmt::Debug for EventChannel<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventChannel")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

/// Disposer returned by [`EventChannel::subscribe`]. The callback is released
/// by [`Subscription::unsubscribe`] or when the handle is dropped.
pub struct Subscription {
    active: Arc<AtomicBool>,
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    pub fn unsubscribe(mut self) {
        self.release_now();
    }

    fn release_now(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release_now();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}
