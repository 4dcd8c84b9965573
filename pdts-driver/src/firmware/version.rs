use bitfield_struct::bitfield;
use derive_more::Display;

#[bitfield(u32)]
struct VersionWord {
    patch: u8,
    minor: u8,
    major: u8,
    #[bits(8)]
    __: u8,
}

/// Firmware generation, selecting the register semantics of lock and echo status.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Generation {
    /// Single ready bit and a single echo delta register.
    V4,
    /// Ready bit plus a 4-bit receiver state, paired 64-bit echo timestamps.
    V5,
}

/// Version of the master firmware.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[display("v{major}.{minor}.{patch}")]
pub struct FirmwareVersion {
    major: u8,
    minor: u8,
    patch: u8,
}

impl FirmwareVersion {
    /// Creates a new [`FirmwareVersion`].
    #[must_use]
    pub const fn new(major: u8, minor: u8, patch: u8) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Decodes the raw `master.global.version` word.
    #[must_use]
    pub const fn from_word(word: u32) -> Self {
        let word = VersionWord::from_bits(word);
        Self::new(word.major(), word.minor(), word.patch())
    }

    /// Encodes into the raw `master.global.version` word.
    #[must_use]
    pub const fn word(&self) -> u32 {
        VersionWord::new()
            .with_major(self.major)
            .with_minor(self.minor)
            .with_patch(self.patch)
            .into_bits()
    }

    /// Major version.
    #[must_use]
    pub const fn major(&self) -> u8 {
        self.major
    }

    /// Minor version.
    #[must_use]
    pub const fn minor(&self) -> u8 {
        self.minor
    }

    /// Patch version.
    #[must_use]
    pub const fn patch(&self) -> u8 {
        self.patch
    }

    /// Returns the register generation of this version, if supported.
    #[must_use]
    pub const fn generation(&self) -> Option<Generation> {
        match self.major {
            4 => Some(Generation::V4),
            5 | 6 => Some(Generation::V5),
            _ => None,
        }
    }
}
