//! Observable value cell with ordered, synchronous subscribers.

use std::cell::{Cell, RefCell};
use std::fmt::{self, Debug, Formatter};
use std::rc::{Rc, Weak};

use tracing::trace;

/// Identifier handed to each subscriber of a signal.
pub type SubscriberId = u64;

type Callback<T> = Box<dyn Fn(&T)>;

struct Subscriber<T> {
    id: SubscriberId,
    active: Cell<bool>,
    callback: Callback<T>,
}

struct SignalInner<T> {
    value: RefCell<T>,
    subscribers: RefCell<Vec<Rc<Subscriber<T>>>>,
    next_id: Cell<SubscriberId>,
}

/// Shared handle to an observable value.
///
/// Cloning the handle does not copy the value: both handles refer to the same
/// signal, and a write through either notifies the same subscribers.
pub struct Signal<T> {
    inner: Rc<SignalInner<T>>,
}

impl<T: Clone + 'static> Signal<T> {
    /// Create a signal holding `initial`.
    #[must_use]
    pub fn new(initial: T) -> Self {
        Self {
            inner: Rc::new(SignalInner {
                value: RefCell::new(initial),
                subscribers: RefCell::new(Vec::new()),
                next_id: Cell::new(1),
            }),
        }
    }

    /// Current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.inner.value.borrow().clone()
    }

    /// Borrow the current value without cloning it.
    ///
    /// # Panics
    ///
    /// Panics if `f` writes to this same signal.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.value.borrow())
    }

    /// Replace the value and notify every subscriber before returning.
    pub fn set(&self, value: T) {
        drop(self.inner.value.replace(value));
        self.notify();
    }

    /// Mutate the value in place, then notify exactly like [`Signal::set`].
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        {
            let mut value = self.inner.value.borrow_mut();
            f(&mut value);
        }
        self.notify();
    }

    /// Register `callback` for every subsequent write.
    ///
    /// The callback is not invoked for the current value.
    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription<T> {
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id.saturating_add(1));
        self.inner.subscribers.borrow_mut().push(Rc::new(Subscriber {
            id,
            active: Cell::new(true),
            callback: Box::new(callback),
        }));
        Subscription {
            id,
            signal: Rc::downgrade(&self.inner),
        }
    }

    /// Number of currently attached subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.borrow().len()
    }

    /// Whether two handles refer to the same signal.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    fn notify(&self) {
        // Subscribers get a detached copy so they may read or write the signal.
        let current = self.get();
        let round: Vec<Rc<Subscriber<T>>> = self.inner.subscribers.borrow().clone();
        trace!(subscribers = round.len(), "signal notification round");
        for subscriber in round {
            if subscriber.active.get() {
                (subscriber.callback)(&current);
            }
        }
    }
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Clone + Default + 'static> Default for Signal<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Debug> Debug for Signal<T> {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Signal")
            .field("value", &*self.inner.value.borrow())
            .field("subscribers", &self.inner.subscribers.borrow().len())
            .finish()
    }
}

/// Capability to detach a subscriber from its signal.
///
/// Dropping the handle leaves the subscriber attached.
#[must_use = "dropping a subscription keeps the subscriber attached; call `unsubscribe` to detach"]
pub struct Subscription<T> {
    id: SubscriberId,
    signal: Weak<SignalInner<T>>,
}

impl<T> Subscription<T> {
    /// Identifier of the subscriber this handle controls.
    #[must_use]
    pub const fn id(&self) -> SubscriberId {
        self.id
    }

    /// Detach the subscriber.
    ///
    /// Returns `false` when the signal is gone or the subscriber was already
    /// detached. A subscriber detached during a notification round is not
    /// invoked for the rest of that round.
    pub fn unsubscribe(self) -> bool {
        let Some(inner) = self.signal.upgrade() else {
            return false;
        };
        let mut subscribers = inner.subscribers.borrow_mut();
        let Some(position) = subscribers.iter().position(|sub| sub.id == self.id) else {
            return false;
        };
        let removed = subscribers.remove(position);
        removed.active.set(false);
        true
    }
}

impl<T> Debug for Subscription<T> {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Subscription")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder() -> Rc<RefCell<Vec<String>>> {
        Rc::new(RefCell::new(Vec::new()))
    }

    #[test]
    fn get_returns_initial_then_last_written_value() {
        let signal = Signal::new(1);
        assert_eq!(signal.get(), 1);
        signal.set(7);
        signal.set(9);
        assert_eq!(signal.get(), 9);
    }

    #[test]
    fn subscribers_run_in_registration_order_and_complete_before_next() {
        let log = recorder();
        let signal = Signal::new(0_u32);

        let first = Rc::clone(&log);
        let _f1 = signal.subscribe(move |value| {
            first.borrow_mut().push(format!("f1 start {value}"));
            first.borrow_mut().push("f1 end".to_string());
        });
        let second = Rc::clone(&log);
        let _f2 = signal.subscribe(move |value| {
            second.borrow_mut().push(format!("f2 {value}"));
        });

        signal.set(3);

        assert_eq!(
            *log.borrow(),
            vec!["f1 start 3".to_string(), "f1 end".into(), "f2 3".into()]
        );
    }

    #[test]
    fn setting_identical_value_still_notifies() {
        let hits = Rc::new(Cell::new(0));
        let signal = Signal::new("same".to_string());
        let counter = Rc::clone(&hits);
        let _sub = signal.subscribe(move |_| counter.set(counter.get() + 1));

        signal.set("same".to_string());
        signal.set("same".to_string());

        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn notification_happens_before_set_returns() {
        let seen = Rc::new(Cell::new(0));
        let signal = Signal::new(0);
        let observer = Rc::clone(&seen);
        let _sub = signal.subscribe(move |value| observer.set(*value));

        signal.set(42);
        assert_eq!(seen.get(), 42);
    }

    #[test]
    fn update_mutates_in_place_and_notifies() {
        let log = recorder();
        let signal = Signal::new(vec![1, 2]);
        let sink = Rc::clone(&log);
        let _sub = signal.subscribe(move |value: &Vec<i32>| {
            sink.borrow_mut().push(format!("{value:?}"));
        });

        signal.update(|values| values.push(3));

        assert_eq!(signal.get(), vec![1, 2, 3]);
        assert_eq!(*log.borrow(), vec!["[1, 2, 3]".to_string()]);
    }

    #[test]
    fn unsubscribe_detaches_subscriber() {
        let hits = Rc::new(Cell::new(0));
        let signal = Signal::new(0);
        let counter = Rc::clone(&hits);
        let sub = signal.subscribe(move |_| counter.set(counter.get() + 1));

        signal.set(1);
        assert!(sub.unsubscribe());
        signal.set(2);

        assert_eq!(hits.get(), 1);
        assert_eq!(signal.subscriber_count(), 0);
    }

    #[test]
    fn unsubscribe_after_signal_dropped_reports_false() {
        let signal = Signal::new(0);
        let sub = signal.subscribe(|_| {});
        drop(signal);
        assert!(!sub.unsubscribe());
    }

    #[test]
    fn subscriber_detached_mid_round_is_skipped() {
        let hits = Rc::new(Cell::new(0));
        let signal = Signal::new(0);
        let pending: Rc<RefCell<Option<Subscription<i32>>>> = Rc::new(RefCell::new(None));

        let slot = Rc::clone(&pending);
        let _first = signal.subscribe(move |_| {
            if let Some(sub) = slot.borrow_mut().take() {
                let _ = sub.unsubscribe();
            }
        });
        let counter = Rc::clone(&hits);
        let second = signal.subscribe(move |_| counter.set(counter.get() + 1));
        *pending.borrow_mut() = Some(second);

        signal.set(1);
        signal.set(2);

        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn subscriber_may_read_signal_and_write_others() {
        let source = Signal::new(1);
        let mirror = Signal::new(0);

        let reader = source.clone();
        let target = mirror.clone();
        let _sub = source.subscribe(move |_| target.set(reader.get() * 10));

        source.set(4);
        assert_eq!(mirror.get(), 40);
    }

    #[test]
    fn clones_share_identity() {
        let signal = Signal::new(1);
        let alias = signal.clone();
        alias.set(5);

        assert_eq!(signal.get(), 5);
        assert!(signal.ptr_eq(&alias));
        assert!(!signal.ptr_eq(&Signal::new(5)));
    }
}
