use super::{load_use_hazard, mispredicted, ExecuteStage, MemoryStage, PipeRegs, Stage};
use crate::framework::{Control, RegisterFile};
use crate::isa::{inst_code::*, reg_code, reg_code::*};

/// What register should be used as the A source?
pub fn src_a(icode: u8, ra: u8) -> u8 {
    match icode {
        CMOVX | RMMOVQ | OPQ | PUSHQ => ra,
        POPQ | RET => RSP,
        _ => RNONE, // Don't need register
    }
}

/// What register should be used as the B source?
pub fn src_b(icode: u8, rb: u8) -> u8 {
    match icode {
        OPQ | RMMOVQ | MRMOVQ => rb,
        PUSHQ | POPQ | CALL | RET => RSP,
        _ => RNONE, // Don't need register
    }
}

/// What register should be used as the E destination?
pub fn dst_e(icode: u8, rb: u8) -> u8 {
    match icode {
        CMOVX | IRMOVQ | OPQ => rb,
        PUSHQ | POPQ | CALL | RET => RSP,
        _ => RNONE, // Don't write any register
    }
}

/// What register should be used as the M destination?
pub fn dst_m(icode: u8, ra: u8) -> u8 {
    match icode {
        MRMOVQ | POPQ => ra,
        _ => RNONE, // Don't write any register
    }
}

/// Decode stage. Reads the register file, resolves operands through the
/// forwarding network and feeds the E register.
#[derive(Debug, Clone, Default)]
pub struct DecodeStage {
    srca: u8,
    srcb: u8,
    e_ctrl: Control,
}

impl DecodeStage {
    pub fn srca(&self) -> u8 {
        self.srca
    }

    pub fn srcb(&self) -> u8 {
        self.srcb
    }

    pub fn e_ctrl(&self) -> Control {
        self.e_ctrl
    }

    /// Requires execute and memory to have computed their signals for this
    /// cycle.
    pub fn clock_low(
        &mut self,
        regs: &mut PipeRegs,
        execute: &ExecuteStage,
        memory: &MemoryStage,
        reg_file: &RegisterFile,
    ) {
        let d = &regs.d;
        let icode = d.icode.output();
        let (ra, rb) = (d.ra.output(), d.rb.output());

        self.srca = src_a(icode, ra);
        self.srcb = src_b(icode, rb);
        let dste = dst_e(icode, rb);
        let dstm = dst_m(icode, ra);

        let PipeRegs { m, w, .. } = &*regs;
        // most recently produced value wins
        let forward = |src: u8| -> u64 {
            if src == RNONE {
                0
            } else if src == execute.dste() {
                execute.vale() // Forward valE from execute
            } else if src == m.dstm.output() {
                memory.valm() // Forward valM from memory
            } else if src == m.dste.output() {
                m.vale.output() // Forward valE from memory
            } else if src == w.dstm.output() {
                w.valm.output() // Forward valM from write back
            } else if src == w.dste.output() {
                w.vale.output() // Forward valE from write back
            } else {
                reg_file.read(src).unwrap_or_else(|e| {
                    tracing::warn!("decode {}: {e}", reg_code::name_of(src));
                    0
                })
            }
        };

        let vala = if matches!(icode, CALL | JX) {
            d.valp.output() // Use incremented PC
        } else {
            forward(self.srca)
        };
        let valb = forward(self.srcb);

        let (stat, ifun, valc) = (d.stat.output(), d.ifun.output(), d.valc.output());
        let e_icode = regs.e.icode.output();
        let e_dstm = regs.e.dstm.output();

        let e = &mut regs.e;
        e.stat.set_input(stat);
        e.icode.set_input(icode);
        e.ifun.set_input(ifun);
        e.valc.set_input(valc);
        e.vala.set_input(vala);
        e.valb.set_input(valb);
        e.dste.set_input(dste);
        e.dstm.set_input(dstm);
        e.srca.set_input(self.srca);
        e.srcb.set_input(self.srcb);

        let bubble = mispredicted(e_icode, execute.cnd())
            || load_use_hazard(e_icode, e_dstm, self.srca, self.srcb);
        self.e_ctrl = Control::from_flags(false, bubble);
    }
}

impl Stage for DecodeStage {
    fn clock_high(&self, regs: &mut PipeRegs) {
        regs.e.latch(self.e_ctrl);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_ids_for_all_opcodes() {
        let (ra, rb) = (RDX, RBX);
        for icode in 0..=0xf {
            let expect_srca = match icode {
                CMOVX | RMMOVQ | OPQ | PUSHQ => ra,
                POPQ | RET => RSP,
                _ => RNONE,
            };
            let expect_srcb = match icode {
                OPQ | RMMOVQ | MRMOVQ => rb,
                PUSHQ | POPQ | CALL | RET => RSP,
                _ => RNONE,
            };
            let expect_dste = match icode {
                CMOVX | IRMOVQ | OPQ => rb,
                PUSHQ | POPQ | CALL | RET => RSP,
                _ => RNONE,
            };
            let expect_dstm = if matches!(icode, MRMOVQ | POPQ) { ra } else { RNONE };
            assert_eq!(src_a(icode, ra), expect_srca, "srcA of {icode:#x}");
            assert_eq!(src_b(icode, rb), expect_srcb, "srcB of {icode:#x}");
            assert_eq!(dst_e(icode, rb), expect_dste, "dstE of {icode:#x}");
            assert_eq!(dst_m(icode, ra), expect_dstm, "dstM of {icode:#x}");
        }
    }

    #[test]
    fn test_unlisted_opcodes_use_no_register() {
        for icode in [HALT, NOP, JX, 0xc, 0xd, 0xe, 0xf] {
            assert_eq!(src_a(icode, RAX), RNONE);
            assert_eq!(src_b(icode, RAX), RNONE);
            assert_eq!(dst_e(icode, RAX), RNONE);
            assert_eq!(dst_m(icode, RAX), RNONE);
        }
    }
}
