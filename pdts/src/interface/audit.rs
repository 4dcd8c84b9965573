use pdts_core::register::{RegisterError, RegisterInterface, Request};
use pdts_driver::firmware::version::FirmwareVersion;
use pdts_firmware_emulator::{EndpointEmulator, MasterEmulator};

/// Options of [`Audit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditOption {
    /// Firmware version reported by the emulated master.
    pub version: FirmwareVersion,
    /// The number of partitions.
    pub num_partitions: usize,
    /// Attached endpoints.
    pub endpoints: Vec<EndpointEmulator>,
    /// Polls of the done flag before an echo completes.
    pub echo_latency: u32,
    /// Start broken.
    pub broken: bool,
}

impl Default for AuditOption {
    fn default() -> Self {
        Self {
            version: FirmwareVersion::new(5, 3, 0),
            num_partitions: 4,
            endpoints: Vec::new(),
            echo_latency: 1,
            broken: false,
        }
    }
}

/// A [`RegisterInterface`] backed by a [`MasterEmulator`], for testing.
#[derive(Debug)]
pub struct Audit {
    is_open: bool,
    master: MasterEmulator,
    dispatches: usize,
}

impl std::ops::Deref for Audit {
    type Target = MasterEmulator;

    fn deref(&self) -> &Self::Target {
        &self.master
    }
}

impl std::ops::DerefMut for Audit {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.master
    }
}

impl Audit {
    /// Creates a new [`Audit`].
    #[must_use]
    pub fn new(option: AuditOption) -> Self {
        let mut master = MasterEmulator::new(option.version, option.num_partitions)
            .with_endpoints(option.endpoints)
            .with_echo_latency(option.echo_latency);
        if option.broken {
            master.break_down();
        }
        Self {
            is_open: false,
            master,
            dispatches: 0,
        }
    }

    /// The number of batches dispatched so far.
    #[must_use]
    pub const fn dispatches(&self) -> usize {
        self.dispatches
    }
}

impl RegisterInterface for Audit {
    fn open(&mut self) -> Result<(), RegisterError> {
        self.is_open = true;
        Ok(())
    }

    fn close(&mut self) -> Result<(), RegisterError> {
        self.is_open = false;
        Ok(())
    }

    fn dispatch(&mut self, requests: &[Request]) -> Result<Vec<u32>, RegisterError> {
        self.dispatches += 1;
        requests
            .iter()
            .filter_map(|req| match req {
                Request::Write { path, value } => self.master.write(path, *value).err().map(Err),
                Request::Read { path } => Some(self.master.read(path)),
            })
            .map(|r| r.map_err(|e| RegisterError::new(e.to_string())))
            .collect()
    }

    fn is_open(&self) -> bool {
        self.is_open
    }
}
