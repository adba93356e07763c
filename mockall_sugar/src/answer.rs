// vim: tw=80
//! Answers that change from one call to the next.

use std::collections::VecDeque;

/// Return values handed out one per call.  The last one repeats forever.
#[derive(Clone, Debug)]
pub struct Consecutive<T> {
    values: VecDeque<T>
}

impl<T: Clone> Consecutive<T> {
    pub fn new<I: IntoIterator<Item = T>>(values: I) -> Self {
        Consecutive {
            values: values.into_iter().collect()
        }
    }

    /// # Panics
    ///
    /// If created from an empty sequence
    pub fn next_value(&mut self) -> T {
        if self.values.len() > 1 {
            if let Some(v) = self.values.pop_front() {
                return v;
            }
        }
        match self.values.front() {
            Some(v) => v.clone(),
            None => panic!("returns_consecutively was given no values")
        }
    }
}
