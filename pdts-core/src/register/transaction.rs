use std::sync::atomic::{AtomicU64, Ordering};

use derive_more::Display;

use super::{RegisterError, RegisterInterface};

/// A single queued register access.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum Request {
    /// Write `value` to `path`.
    #[display("W {path} <- {value:#X}")]
    Write {
        /// The register path.
        path: String,
        /// The value to write.
        value: u32,
    },
    /// Read `path`.
    #[display("R {path}")]
    Read {
        /// The register path.
        path: String,
    },
}

static NEXT_ID: AtomicU64 = AtomicU64::new(0);

/// A handle to a value read by a [`Transaction`].
///
/// The value is available only from the [`Committed`] returned by the commit of the
/// transaction that issued the read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deferred {
    id: u64,
    index: usize,
}

/// An accumulate-then-commit batch of register accesses.
///
/// Writes and reads are executed in the order they were queued.
#[derive(Debug, Clone)]
pub struct Transaction {
    id: u64,
    requests: Vec<Request>,
    reads: usize,
}

impl Default for Transaction {
    fn default() -> Self {
        Self::new()
    }
}

impl Transaction {
    /// Creates an empty [`Transaction`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            requests: Vec::new(),
            reads: 0,
        }
    }

    /// Queues a write.
    pub fn write(&mut self, path: impl Into<String>, value: u32) -> &mut Self {
        self.requests.push(Request::Write {
            path: path.into(),
            value,
        });
        self
    }

    /// Queues a write of `1` followed by a write of `0`.
    pub fn pulse(&mut self, path: impl Into<String>) -> &mut Self {
        let path = path.into();
        self.write(path.clone(), 1).write(path, 0)
    }

    /// Queues a read.
    pub fn read(&mut self, path: impl Into<String>) -> Deferred {
        self.requests.push(Request::Read { path: path.into() });
        self.reads += 1;
        Deferred {
            id: self.id,
            index: self.reads - 1,
        }
    }

    /// Returns the queued requests.
    #[must_use]
    pub fn requests(&self) -> &[Request] {
        &self.requests
    }

    /// Checks if nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    /// Sends all queued requests to `reg` and resolves the pending reads.
    pub fn commit<R: RegisterInterface + ?Sized>(
        self,
        reg: &mut R,
    ) -> Result<Committed, RegisterError> {
        if !reg.is_open() {
            return Err(RegisterError::closed());
        }
        if self.requests.is_empty() {
            return Ok(Committed {
                id: self.id,
                values: Vec::new(),
            });
        }
        tracing::trace!(
            "commit: {}",
            self.requests
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        );
        let values = reg.dispatch(&self.requests)?;
        if values.len() != self.reads {
            return Err(RegisterError::new(format!(
                "Expected {} read values, but {} were returned",
                self.reads,
                values.len()
            )));
        }
        Ok(Committed {
            id: self.id,
            values,
        })
    }
}

/// The resolved values of a committed [`Transaction`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Committed {
    id: u64,
    values: Vec<u32>,
}

impl Committed {
    /// Returns the value of a read queued by the committed transaction.
    ///
    /// A [`Deferred`] issued by another transaction is rejected.
    pub fn get(&self, value: Deferred) -> Result<u32, RegisterError> {
        if value.id != self.id {
            return Err(RegisterError::new(
                "Deferred value belongs to another transaction",
            ));
        }
        self.values
            .get(value.index)
            .copied()
            .ok_or_else(|| RegisterError::new("Deferred value was not read"))
    }
}
