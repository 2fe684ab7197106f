//! The five stages of the Y86-64 pipeline.
//!
//! Each stage is a struct holding the signals it computes during the low
//! phase of the clock. Other stages read them through accessors in the same
//! cycle, so the low phase runs the stages in dependency order (see
//! [`PipeSim::step`]). During the high phase each stage latches the pipeline
//! register(s) it owns with the control signal it decided on.
//!
//! [`PipeSim::step`]: crate::framework::PipeSim::step

mod decode;
mod execute;
mod fetch;
mod memory;
mod writeback;

pub use decode::DecodeStage;
pub use execute::ExecuteStage;
pub use fetch::FetchStage;
pub use memory::MemoryStage;
pub use writeback::WritebackStage;

use crate::isa::{inst_code::*, reg_code::RNONE, Stat};

crate::define_stages! {
    /// Fetch stage register. It is never bubbled.
    Fstage f {
        pred_pc: u64 = 0
    }
    /// Decode stage register, holding the fetched instruction.
    Dstage d {
        stat: Stat = Stat::Aok, icode: u8 = NOP, ifun: u8 = 0,
        ra: u8 = RNONE, rb: u8 = RNONE, valc: u64 = 0, valp: u64 = 0
    }
    /// Execute stage register.
    Estage e {
        stat: Stat = Stat::Aok, icode: u8 = NOP, ifun: u8 = 0,
        valc: u64 = 0, vala: u64 = 0, valb: u64 = 0, dste: u8 = RNONE,
        dstm: u8 = RNONE, srca: u8 = RNONE, srcb: u8 = RNONE
    }
    /// Memory Access Stage
    Mstage m {
        stat: Stat = Stat::Aok, icode: u8 = NOP, cnd: bool = false,
        vale: u64 = 0, vala: u64 = 0, dste: u8 = RNONE, dstm: u8 = RNONE
    }
    Wstage w {
        stat: Stat = Stat::Aok, icode: u8 = NOP, vale: u64 = 0,
        valm: u64 = 0, dste: u8 = RNONE, dstm: u8 = RNONE
    }
}

/// High phase of a stage: latch the owned pipeline registers.
///
/// Latching only touches each register's own pending and committed values,
/// so the stages can be clocked in any order.
pub trait Stage {
    fn clock_high(&self, regs: &mut PipeRegs);
}

/// The instruction in execute loads a register that decode reads in this
/// cycle. Decode has to wait one cycle until the loaded value can be
/// forwarded from the memory stage.
pub fn load_use_hazard(e_icode: u8, e_dstm: u8, d_srca: u8, d_srcb: u8) -> bool {
    matches!(e_icode, MRMOVQ | POPQ) && (e_dstm == d_srca || e_dstm == d_srcb)
}

/// A `ret` is passing through decode, execute or memory. Its return address
/// is known once it reaches write back.
pub fn ret_in_flight(d_icode: u8, e_icode: u8, m_icode: u8) -> bool {
    RET == d_icode || RET == e_icode || RET == m_icode
}

/// A conditional jump in execute turned out to be not taken, while fetch
/// predicted it taken.
pub fn mispredicted(e_icode: u8, e_cnd: bool) -> bool {
    e_icode == JX && !e_cnd
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framework::Control;
    use crate::isa::reg_code::*;

    #[test]
    fn test_bubble_resets_register() {
        let mut regs = PipeRegs::default();
        regs.d.icode.set_input(OPQ);
        regs.d.ra.set_input(RAX);
        regs.d.stat.set_input(Stat::Ins);
        regs.d.latch(Control::Normal);
        assert_eq!(regs.d.icode.output(), OPQ);

        regs.d.latch(Control::Bubble);
        assert_eq!(regs.d.icode.output(), NOP);
        assert_eq!(regs.d.ra.output(), RNONE);
        assert_eq!(regs.d.stat.output(), Stat::Aok);
    }

    #[test]
    fn test_load_use() {
        assert!(load_use_hazard(MRMOVQ, RAX, RAX, RNONE));
        assert!(load_use_hazard(POPQ, RBX, RSP, RBX));
        assert!(!load_use_hazard(MRMOVQ, RAX, RCX, RDX));
        assert!(!load_use_hazard(IRMOVQ, RAX, RAX, RNONE));
    }
}
