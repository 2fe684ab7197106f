use super::{PipeRegs, Stage};
use crate::framework::{Control, Memory};
use crate::isa::{inst_code::*, Stat};

/// Memory stage. Performs at most one data memory access and feeds the W
/// register.
#[derive(Debug, Clone, Default)]
pub struct MemoryStage {
    stat: Stat,
    valm: u64,
    w_ctrl: Control,
}

impl MemoryStage {
    /// Status of the instruction in memory, [`Stat::Adr`] if its data access
    /// faulted.
    pub fn stat(&self) -> Stat {
        self.stat
    }

    /// Value loaded in this cycle, 0 if nothing was read.
    pub fn valm(&self) -> u64 {
        self.valm
    }

    pub fn w_ctrl(&self) -> Control {
        self.w_ctrl
    }

    pub fn clock_low(&mut self, regs: &mut PipeRegs, mem: &mut Memory) {
        let m = &regs.m;
        let icode = m.icode.output();

        // Select memory address
        let addr = match icode {
            RMMOVQ | PUSHQ | CALL | MRMOVQ => m.vale.output(),
            POPQ | RET => m.vala.output(),
            _ => 0, // Other instructions don't need address
        };
        let mem_read = matches!(icode, MRMOVQ | POPQ | RET);
        let mem_write = matches!(icode, RMMOVQ | PUSHQ | CALL);

        let (valm, dmem_error) = if mem_read {
            match mem.get_long(addr) {
                Ok(v) => (v, false),
                Err(_) => (0, true),
            }
        } else if mem_write {
            let datain = m.vala.output();
            tracing::info!("write memory: addr = {:#x}, datain = {:#x}", addr, datain);
            (0, mem.put_long(addr, datain).is_err())
        } else {
            (0, false)
        };
        if dmem_error {
            tracing::debug!("data memory fault at {:#x}", addr);
        }

        self.valm = valm;
        self.stat = if dmem_error { Stat::Adr } else { m.stat.output() };

        let (vale, dste, dstm) = (m.vale.output(), m.dste.output(), m.dstm.output());
        let w = &mut regs.w;
        w.stat.set_input(self.stat);
        w.icode.set_input(icode);
        w.vale.set_input(vale);
        w.valm.set_input(valm);
        w.dste.set_input(dste);
        w.dstm.set_input(dstm);

        // hold a halted or faulted instruction in W
        self.w_ctrl = Control::from_flags(regs.w.stat.output().is_abnormal(), false);
    }
}

impl Stage for MemoryStage {
    fn clock_high(&self, regs: &mut PipeRegs) {
        regs.w.latch(self.w_ctrl);
    }
}
