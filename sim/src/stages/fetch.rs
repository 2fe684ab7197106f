use super::{
    load_use_hazard, mispredicted, ret_in_flight, DecodeStage, ExecuteStage, PipeRegs, Stage,
};
use crate::framework::{Control, Memory};
use crate::isa::{
    inst_code::*, inst_len, is_valid_icode, need_regids, need_valc, reg_code::RNONE, Stat, FNONE,
};

/// An instruction as it is split by the instruction memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchedInst {
    pub stat: Stat,
    pub icode: u8,
    pub ifun: u8,
    pub ra: u8,
    pub rb: u8,
    pub valc: u64,
    pub valp: u64,
}

/// Read and split the instruction at `pc`.
///
/// Fetching outside of memory yields a `nop` with status [`Stat::Adr`]. So
/// does an instruction whose trailing bytes run past the end of memory.
pub fn fetch_inst(mem: &Memory, pc: u64) -> FetchedInst {
    let (mut icode, mut ifun, mut imem_error) = match mem.get_byte(pc) {
        Ok(byte) => (byte >> 4, byte & 0xf, false),
        Err(_) => (NOP, FNONE, true),
    };
    if !imem_error {
        let last = pc.checked_add(inst_len(icode) - 1);
        imem_error = last.map_or(true, |end| mem.get_byte(end).is_err());
    }
    if imem_error {
        icode = NOP;
        ifun = FNONE;
    }

    let stat = if imem_error {
        Stat::Adr
    } else if !is_valid_icode(icode) {
        Stat::Ins
    } else if icode == HALT {
        Stat::Hlt
    } else {
        Stat::Aok
    };

    let (ra, rb) = if need_regids(icode) {
        let byte = mem.get_byte(pc.wrapping_add(1)).unwrap_or(0xff);
        (byte >> 4, byte & 0xf)
    } else {
        (RNONE, RNONE)
    };

    // jumps and calls have no register byte in front of the constant
    let valc = if need_valc(icode) {
        let offset = if matches!(icode, JX | CALL) { 1 } else { 2 };
        mem.get_long(pc.wrapping_add(offset)).unwrap_or(0)
    } else {
        0
    };

    FetchedInst {
        stat,
        icode,
        ifun,
        ra,
        rb,
        valc,
        valp: pc.wrapping_add(inst_len(icode)),
    }
}

/// Fetch stage. It owns the F register and feeds the D register.
#[derive(Debug, Clone, Default)]
pub struct FetchStage {
    pc: u64,
    f_ctrl: Control,
    d_ctrl: Control,
}

impl FetchStage {
    /// The address fetched in the current cycle.
    pub fn pc(&self) -> u64 {
        self.pc
    }

    pub fn f_ctrl(&self) -> Control {
        self.f_ctrl
    }

    pub fn d_ctrl(&self) -> Control {
        self.d_ctrl
    }

    /// What address should instruction be fetched at
    fn select_pc(regs: &PipeRegs) -> u64 {
        let PipeRegs { f, m, w, .. } = regs;
        if m.icode.output() == JX && !m.cnd.output() {
            // Mispredicted branch. Fetch at incremented PC
            m.vala.output()
        } else if w.icode.output() == RET {
            // Completion of RET instruction
            w.valm.output()
        } else {
            f.pred_pc.output()
        }
    }

    /// Requires decode and execute to have computed their signals for this
    /// cycle.
    pub fn clock_low(
        &mut self,
        regs: &mut PipeRegs,
        decode: &DecodeStage,
        execute: &ExecuteStage,
        mem: &Memory,
    ) {
        self.pc = Self::select_pc(regs);
        let inst = fetch_inst(mem, self.pc);
        tracing::trace!(
            "fetch {:#x}: {} {:?}",
            self.pc,
            name_of(inst.icode),
            inst.stat
        );

        // Predict next value of PC
        let pred_pc = if matches!(inst.icode, JX | CALL) {
            inst.valc
        } else {
            inst.valp
        };
        regs.f.pred_pc.set_input(pred_pc);

        let d = &mut regs.d;
        d.stat.set_input(inst.stat);
        d.icode.set_input(inst.icode);
        d.ifun.set_input(inst.ifun);
        d.ra.set_input(inst.ra);
        d.rb.set_input(inst.rb);
        d.valc.set_input(inst.valc);
        d.valp.set_input(inst.valp);

        let e_icode = regs.e.icode.output();
        let load_use = load_use_hazard(
            e_icode,
            regs.e.dstm.output(),
            decode.srca(),
            decode.srcb(),
        );
        let ret = ret_in_flight(regs.d.icode.output(), e_icode, regs.m.icode.output());
        let mispredict = mispredicted(e_icode, execute.cnd());

        // no wrong-path instruction has entered D during a load/use stall
        self.f_ctrl = Control::from_flags(load_use || ret, false);
        self.d_ctrl = Control::from_flags(load_use, !load_use && (mispredict || ret));

        if load_use || ret || mispredict {
            tracing::debug!(load_use, ret, mispredict, "fetch hazard");
        }
    }
}

impl Stage for FetchStage {
    fn clock_high(&self, regs: &mut PipeRegs) {
        regs.f.latch(self.f_ctrl);
        regs.d.latch(self.d_ctrl);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framework::MEM_SIZE;
    use crate::isa::reg_code::*;

    fn mem_with(addr: u64, bytes: &[u8]) -> Memory {
        let mut mem = Memory::default();
        for (i, b) in bytes.iter().enumerate() {
            mem.put_byte(addr + i as u64, *b).unwrap();
        }
        mem
    }

    #[test]
    fn test_fetch_irmovq() {
        // irmovq $0x1234, %rbx
        let mem = mem_with(0x20, &[0x30, 0xf3, 0x34, 0x12, 0, 0, 0, 0, 0, 0]);
        let inst = fetch_inst(&mem, 0x20);
        assert_eq!(inst.stat, Stat::Aok);
        assert_eq!((inst.icode, inst.ra, inst.rb), (IRMOVQ, RNONE, RBX));
        assert_eq!(inst.valc, 0x1234);
        assert_eq!(inst.valp, 0x2a);
    }

    #[test]
    fn test_fetch_jump_constant_offset() {
        // jne 0x0abc
        let mem = mem_with(0, &[0x74, 0xbc, 0x0a, 0, 0, 0, 0, 0, 0]);
        let inst = fetch_inst(&mem, 0);
        assert_eq!((inst.icode, inst.ifun), (JX, 4));
        assert_eq!((inst.ra, inst.rb), (RNONE, RNONE));
        assert_eq!(inst.valc, 0xabc);
        assert_eq!(inst.valp, 9);
    }

    #[test]
    fn test_fetch_faults() {
        let mem = mem_with(0, &[0xc0, 0x00]);
        assert_eq!(fetch_inst(&mem, 0).stat, Stat::Ins);
        assert_eq!(fetch_inst(&mem, 1).stat, Stat::Hlt);

        let inst = fetch_inst(&mem, MEM_SIZE as u64);
        assert_eq!((inst.stat, inst.icode, inst.ifun), (Stat::Adr, NOP, FNONE));

        // irmovq whose constant runs past the end of memory
        let mem = mem_with(MEM_SIZE as u64 - 4, &[0x30, 0xf0]);
        let inst = fetch_inst(&mem, MEM_SIZE as u64 - 4);
        assert_eq!((inst.stat, inst.icode), (Stat::Adr, NOP));
    }
}
