mod error;
mod transaction;

pub use error::RegisterError;
pub use transaction::{Committed, Deferred, Request, Transaction};

/// A trait that provides named, hierarchical access to the master registers.
///
/// Paths are dot-separated names addressing bit-fields within hardware registers, e.g.
/// `master.echo.csr.ctrl.go`. Requests are queued by a [`Transaction`] and handed to
/// [`RegisterInterface::dispatch`] in one batch on commit.
pub trait RegisterInterface: Send {
    /// Opens the interface.
    fn open(&mut self) -> Result<(), RegisterError>;

    /// Closes the interface.
    fn close(&mut self) -> Result<(), RegisterError>;

    /// Executes `requests` in order.
    ///
    /// Returns one value per [`Request::Read`], in the order the reads were queued.
    fn dispatch(&mut self, requests: &[Request]) -> Result<Vec<u32>, RegisterError>;

    /// Checks if the interface is open.
    #[must_use]
    fn is_open(&self) -> bool;
}

impl RegisterInterface for Box<dyn RegisterInterface> {
    fn open(&mut self) -> Result<(), RegisterError> {
        self.as_mut().open()
    }

    fn close(&mut self) -> Result<(), RegisterError> {
        self.as_mut().close()
    }

    fn dispatch(&mut self, requests: &[Request]) -> Result<Vec<u32>, RegisterError> {
        self.as_mut().dispatch(requests)
    }

    fn is_open(&self) -> bool {
        self.as_ref().is_open()
    }
}

/// Writes a single register and commits immediately.
pub fn write<R: RegisterInterface + ?Sized>(
    reg: &mut R,
    path: impl Into<String>,
    value: u32,
) -> Result<(), RegisterError> {
    let mut tx = Transaction::new();
    tx.write(path, value);
    tx.commit(reg).map(|_| ())
}

/// Reads a single register and commits immediately.
pub fn read<R: RegisterInterface + ?Sized>(
    reg: &mut R,
    path: impl Into<String>,
) -> Result<u32, RegisterError> {
    let mut tx = Transaction::new();
    let value = tx.read(path);
    tx.commit(reg)?.get(value)
}

/// Combines the high and low words of a paired 64-bit register.
#[must_use]
pub const fn join_u64(hi: u32, lo: u32) -> u64 {
    ((hi as u64) << 32) | lo as u64
}
