use super::{MemoryStage, PipeRegs, Stage};
use crate::framework::Control;
use crate::isa::{alu_compute, inst_code::*, op_code::ADD, reg_code::RNONE, ConditionCode};

const NEG_8: u64 = -8i64 as u64;

/// Select input A to ALU
fn alu_a(icode: u8, vala: u64, valc: u64) -> u64 {
    match icode {
        CMOVX | OPQ => vala,
        IRMOVQ | RMMOVQ | MRMOVQ => valc,
        CALL | PUSHQ => NEG_8,
        RET | POPQ => 8,
        _ => 0, // Other instructions don't need ALU
    }
}

/// Select input B to ALU
fn alu_b(icode: u8, valb: u64) -> u64 {
    match icode {
        RMMOVQ | MRMOVQ | OPQ | CALL | PUSHQ | RET | POPQ => valb,
        _ => 0, // CMOVX, IRMOVQ and the others
    }
}

/// Execute stage. Runs the ALU, updates the condition codes and evaluates
/// branch/move conditions, then feeds the M register.
#[derive(Debug, Clone, Default)]
pub struct ExecuteStage {
    dste: u8,
    vale: u64,
    cnd: bool,
    m_ctrl: Control,
}

impl ExecuteStage {
    /// Destination of the ALU result, [`RNONE`] for a conditional move that
    /// is not taken.
    pub fn dste(&self) -> u8 {
        self.dste
    }

    /// ALU result computed in this cycle.
    pub fn vale(&self) -> u64 {
        self.vale
    }

    /// Branch or move condition. Always false for other instructions.
    pub fn cnd(&self) -> bool {
        self.cnd
    }

    pub fn m_ctrl(&self) -> Control {
        self.m_ctrl
    }

    /// Requires memory to have computed its status for this cycle.
    pub fn clock_low(
        &mut self,
        regs: &mut PipeRegs,
        memory: &MemoryStage,
        cc: &mut ConditionCode,
    ) {
        let e = &regs.e;
        let icode = e.icode.output();
        let ifun = e.ifun.output();

        let alua = alu_a(icode, e.vala.output(), e.valc.output());
        let alub = alu_b(icode, e.valb.output());
        let alufun = if icode == OPQ { ifun } else { ADD };
        self.vale = alu_compute(alua, alub, alufun);

        // flags are read before this cycle may overwrite them
        self.cnd = matches!(icode, JX | CMOVX) && cc.test(ifun);

        // Set dstE to RNONE in event of not-taken conditional move
        self.dste = if icode == CMOVX && !self.cnd {
            RNONE
        } else {
            e.dste.output()
        };

        // State changes only during normal operation
        let w_stat = regs.w.stat.output();
        let set_cc = icode == OPQ && !memory.stat().is_abnormal() && !w_stat.is_abnormal();
        if set_cc {
            cc.update(alua, alub, self.vale, alufun);
            tracing::info!(
                "CC: a = {:#x}, b = {:#x}, e = {:#x}, cc: {cc:?}",
                alua,
                alub,
                self.vale
            );
        }

        let (stat, vala, dstm) = (e.stat.output(), e.vala.output(), e.dstm.output());
        let m = &mut regs.m;
        m.stat.set_input(stat);
        m.icode.set_input(icode);
        m.cnd.set_input(self.cnd);
        m.vale.set_input(self.vale);
        m.vala.set_input(vala);
        m.dste.set_input(self.dste);
        m.dstm.set_input(dstm);

        // Start injecting bubbles as soon as exception passes through memory stage
        let bubble = memory.stat().is_abnormal() || w_stat.is_abnormal();
        self.m_ctrl = Control::from_flags(false, bubble);
    }
}

impl Stage for ExecuteStage {
    fn clock_high(&self, regs: &mut PipeRegs) {
        regs.m.latch(self.m_ctrl);
    }
}
