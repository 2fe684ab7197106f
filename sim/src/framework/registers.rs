use crate::error::RegisterError;
use crate::isa::reg_code::{self, RNONE};

pub const NUM_REGS: usize = 15;

/// The 15 general purpose registers. Register id [`RNONE`] means "no
/// register": writing it does nothing, reading it is an error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RegisterFile {
    state: [u64; NUM_REGS],
}

impl RegisterFile {
    pub fn read(&self, id: u8) -> Result<u64, RegisterError> {
        self.state
            .get(id as usize)
            .copied()
            .ok_or(RegisterError::InvalidId(id))
    }

    pub fn write(&mut self, id: u8, val: u64) -> Result<(), RegisterError> {
        if id == RNONE {
            return Ok(());
        }
        let slot = self
            .state
            .get_mut(id as usize)
            .ok_or(RegisterError::InvalidId(id))?;
        tracing::info!("write register {} = {:#x}", reg_code::name_of(id), val);
        *slot = val;
        Ok(())
    }

    /// (register_code, value) of every register.
    pub fn entries(&self) -> Vec<(u8, u64)> {
        self.state
            .iter()
            .enumerate()
            .map(|(i, &v)| (i as u8, v))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::isa::reg_code::*;

    #[test]
    fn test_rnone_write_is_noop() -> Result<(), RegisterError> {
        let mut rf = RegisterFile::default();
        rf.write(RNONE, 42)?;
        assert!(rf.entries().iter().all(|(_, v)| *v == 0));
        assert_eq!(rf.read(RNONE), Err(RegisterError::InvalidId(RNONE)));
        assert_eq!(rf.write(0x10, 1), Err(RegisterError::InvalidId(0x10)));

        rf.write(R14, 7)?;
        assert_eq!(rf.read(R14)?, 7);
        Ok(())
    }
}
