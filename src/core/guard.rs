//! Guard predicates over session state.
//!
//! Guards are pure boolean functions. The segmentation triggers are built
//! from them so each trigger can be evaluated and tested in isolation.

use std::fmt;

/// Pure, named predicate over a subject `T`.
///
/// # Example
///
/// ```rust
/// use mindgate::core::Guard;
///
/// let positive = Guard::new("positive", |x: &f64| *x > 0.0);
///
/// assert!(positive.check(&1.0));
/// assert!(!positive.check(&-1.0));
/// assert_eq!(positive.name(), "positive");
/// ```
pub struct Guard<T> {
    name: &'static str,
    predicate: Box<dyn Fn(&T) -> bool + Send + Sync>,
}

impl<T> Guard<T> {
    /// Create a guard from a pure predicate function.
    ///
    /// The predicate must be deterministic and thread-safe.
    pub fn new<F>(name: &'static str, predicate: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Guard {
            name,
            predicate: Box::new(predicate),
        }
    }

    /// Check if the guard holds for this subject.
    pub fn check(&self, subject: &T) -> bool {
        (self.predicate)(subject)
    }

    /// Name used when logging which guard fired.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl<T> fmt::Debug for Guard<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Guard").field("name", &self.name).finish()
    }
}
