//! Derived read/write views over a signal.
//!
//! Settings widgets often present a stored value in another unit (a slider
//! position in `0.0..=1.0` over a speed in milliseconds). A [`Lens`] keeps the
//! signal as the single source of truth and maps reads and writes through a
//! pair of conversion functions.

use std::fmt::{self, Debug, Formatter};
use std::rc::Rc;

use crate::signal::Signal;

/// Bidirectional mapping from a source signal of `T` to a view value `U`.
pub struct Lens<T, U> {
    source: Signal<T>,
    to_view: Rc<dyn Fn(&T) -> U>,
    from_view: Rc<dyn Fn(U) -> T>,
}

impl<T: Clone + 'static, U> Lens<T, U> {
    /// Build a lens over `source`.
    pub fn new(
        source: Signal<T>,
        to_view: impl Fn(&T) -> U + 'static,
        from_view: impl Fn(U) -> T + 'static,
    ) -> Self {
        Self {
            source,
            to_view: Rc::new(to_view),
            from_view: Rc::new(from_view),
        }
    }

    /// Current view value.
    #[must_use]
    pub fn get(&self) -> U {
        self.source.with(|value| (self.to_view)(value))
    }

    /// Map `view` back and write it to the source signal.
    pub fn set(&self, view: U) {
        self.source.set((self.from_view)(view));
    }

    /// Apply `f` to the current view value and write the result back.
    pub fn update(&self, f: impl FnOnce(U) -> U) {
        let next = f(self.get());
        self.set(next);
    }

    /// Underlying signal.
    #[must_use]
    pub const fn source(&self) -> &Signal<T> {
        &self.source
    }
}

impl<T, U> Clone for Lens<T, U> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            to_view: Rc::clone(&self.to_view),
            from_view: Rc::clone(&self.from_view),
        }
    }
}

impl<T: Debug, U> Debug for Lens<T, U> {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Lens")
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn percent_lens(source: Signal<u32>) -> Lens<u32, f64> {
        Lens::new(
            source,
            |value| f64::from(*value) / 100.0,
            |view: f64| (view.clamp(0.0, 1.0) * 100.0).round() as u32,
        )
    }

    #[test]
    fn lens_maps_reads_and_writes() {
        let source = Signal::new(25_u32);
        let lens = percent_lens(source.clone());

        assert!((lens.get() - 0.25).abs() < f64::EPSILON);
        lens.set(0.5);
        assert_eq!(source.get(), 50);
    }

    #[test]
    fn lens_update_applies_function_to_view() {
        let source = Signal::new(40_u32);
        let lens = percent_lens(source.clone());

        lens.update(|view| view + 0.1);
        assert_eq!(source.get(), 50);
    }

    #[test]
    fn lens_writes_notify_source_subscribers() {
        let hits = Rc::new(Cell::new(0));
        let source = Signal::new(0_u32);
        let counter = Rc::clone(&hits);
        let _sub = source.subscribe(move |_| counter.set(counter.get() + 1));

        let lens = percent_lens(source);
        lens.set(2.0);

        assert_eq!(hits.get(), 1);
        assert_eq!(lens.source().get(), 100);
    }
}
