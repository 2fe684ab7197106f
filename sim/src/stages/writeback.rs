use super::{PipeRegs, Stage};
use crate::framework::RegisterFile;
use crate::isa::{inst_code::HALT, Stat};

/// Write back stage. Commits results to the register file and reports the
/// status of the program.
#[derive(Debug, Clone, Default)]
pub struct WritebackStage {
    stat: Stat,
}

impl WritebackStage {
    /// Status of the instruction that left the pipeline in this cycle.
    pub fn stat(&self) -> Stat {
        self.stat
    }

    /// Returns true when the program stops. A halted or faulted instruction
    /// does not write any register.
    pub fn clock_low(&mut self, regs: &PipeRegs, reg_file: &mut RegisterFile) -> bool {
        let w = &regs.w;
        self.stat = w.stat.output();
        if self.stat.is_abnormal() || w.icode.output() == HALT {
            tracing::debug!("program stops with status {:?}", self.stat);
            return true;
        }

        let writes = [
            (w.dste.output(), w.vale.output()),
            (w.dstm.output(), w.valm.output()),
        ];
        for (dst, val) in writes {
            if let Err(e) = reg_file.write(dst, val) {
                tracing::error!("write back: {e}");
            }
        }
        false
    }
}

impl Stage for WritebackStage {
    /// Write back owns no pipeline register.
    fn clock_high(&self, _regs: &mut PipeRegs) {}
}
