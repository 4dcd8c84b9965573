use getset::CopyGetters;

/// An emulated periodic command generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct GeneratorEmulator {
    /// Enable bit.
    enabled: bool,
    /// Command code.
    command: u8,
    /// Poisson spacing.
    poisson: bool,
    /// Power-of-two divisor.
    divisor: u8,
    /// Prescale.
    prescale: u16,
}

impl GeneratorEmulator {
    pub(crate) fn read(&self, field: &str) -> Option<u32> {
        Some(match field {
            "en" => self.enabled as _,
            "type" => self.command as _,
            "patt" => self.poisson as _,
            "rate_div_d" => self.divisor as _,
            "rate_div_p" => self.prescale as _,
            _ => return None,
        })
    }

    pub(crate) fn write(&mut self, field: &str, value: u32) -> Option<()> {
        match field {
            "en" => self.enabled = value & 0x1 != 0,
            "type" => self.command = value as _,
            "patt" => self.poisson = value & 0x1 != 0,
            "rate_div_d" => self.divisor = (value & 0xF) as _,
            "rate_div_p" => self.prescale = (value & 0x1FF) as _,
            _ => return None,
        }
        Some(())
    }
}
