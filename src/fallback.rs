//! Ordered candidate selection
//!
//! Try each candidate in turn; the first success wins. If every candidate
//! fails, all failures are returned together so the caller can report them.

use std::fmt;

/// Every candidate failed; holds each candidate with the error it produced
#[derive(Debug)]
pub struct AllFailed<C, E> {
    pub failures: Vec<(C, E)>,
}

impl<C: fmt::Debug, E: fmt::Display> fmt::Display for AllFailed<C, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.failures.is_empty() {
            return write!(f, "no candidates to try");
        }
        write!(f, "all {} candidates failed", self.failures.len())?;
        for (candidate, error) in &self.failures {
            write!(f, "; {:?}: {}", candidate, error)?;
        }
        Ok(())
    }
}

impl<C: fmt::Debug, E: fmt::Debug + fmt::Display> std::error::Error for AllFailed<C, E> {}

/// Attempt `candidates` in order, returning the first success with its candidate
pub fn select_first<C, T, E, I, F>(candidates: I, mut attempt: F) -> Result<(C, T), AllFailed<C, E>>
where
    I: IntoIterator<Item = C>,
    F: FnMut(&C) -> Result<T, E>,
{
    let mut failures = Vec::new();

    for candidate in candidates {
        match attempt(&candidate) {
            Ok(value) => return Ok((candidate, value)),
            Err(error) => failures.push((candidate, error)),
        }
    }

    Err(AllFailed { failures })
}
