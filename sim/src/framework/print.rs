use super::PipeSim;
use crate::isa::reg_code::{self, *};
use crate::stages::PipeRegs;
use crate::utils::{format_ctrl, format_icode, format_reg_val};

impl PipeSim {
    /// Print the pipeline state after the low phase of a cycle, i.e. the
    /// instructions in each stage and the control signals about to be applied.
    pub fn print_state(&self) {
        let PipeRegs { d, e, m, w, .. } = &self.regs;
        let s = &self.stages;
        println!(
            r#"Cycle {cycle}  pc {pc:#x}
Stat    D {dstat}    E {estat}    M {mstat}    W {wstat}
icode   f {ficode} D {dicode} E {eicode} M {micode} W {wicode}
Control F {fctrl} D {dctrl} E {ectrl} M {mctrl} W -
e_dste {e_dste} D_ra {d_ra} D_rb {d_rb}"#,
            cycle = self.cycle_count,
            pc = s.fetch.pc(),
            dstat = d.stat.output(),
            estat = e.stat.output(),
            mstat = m.stat.output(),
            wstat = w.stat.output(),
            // ficode is the instruction fetched in this cycle
            ficode = format_icode(d.icode.input()),
            dicode = format_icode(d.icode.output()),
            eicode = format_icode(e.icode.output()),
            micode = format_icode(m.icode.output()),
            wicode = format_icode(w.icode.output()),
            fctrl = format_ctrl(s.fetch.f_ctrl()),
            dctrl = format_ctrl(s.fetch.d_ctrl()),
            ectrl = format_ctrl(s.decode.e_ctrl()),
            mctrl = format_ctrl(s.execute.m_ctrl()),
            e_dste = reg_code::name_of(s.execute.dste()),
            d_ra = reg_code::name_of(d.ra.output()),
            d_rb = reg_code::name_of(d.rb.output()),
        );
        println!("{}", self.units.cc);
        println!("{}", self.print_reg());
    }

    pub(crate) fn print_reg(&self) -> String {
        let rf = &self.units.reg_file;
        let val = |r: u8| format_reg_val(rf.read(r).unwrap_or_default());
        format!(
            "ax {rax} bx {rbx} cx {rcx} dx {rdx}\nsi {rsi} di {rdi} sp {rsp} bp {rbp}",
            rax = val(RAX),
            rbx = val(RBX),
            rcx = val(RCX),
            rdx = val(RDX),
            rsi = val(RSI),
            rdi = val(RDI),
            rsp = val(RSP),
            rbp = val(RBP),
        )
    }
}
