//! Instruction Set definition for Y86-64 Architecture

use crate::framework::{Memory, RegisterFile};

macro_rules! define_code {
    {
        @mod $modname:ident;
        @type $typ:ty;
        $( $cname:ident = $cval:expr; )*
    } => {
        pub mod $modname {
            $(pub const $cname : $typ = $cval; )*
            #[allow(unused)]
            pub fn name_of(code: $typ) -> &'static str {
                match code {
                    $($cname => stringify!($cname), )*
                    _ => "no name"
                }
            }
        }
    };
}

define_code! {
    @mod inst_code;
    @type u8;
    HALT = 0x0;
    NOP = 0x1;
    CMOVX = 0x2;
    IRMOVQ = 0x3;
    RMMOVQ = 0x4;
    MRMOVQ = 0x5;
    OPQ = 0x6;
    JX = 0x7;
    CALL = 0x8;
    RET = 0x9;
    PUSHQ = 0xa;
    POPQ = 0xb;
}

/// Function code given to an instruction whose fetch faulted.
pub const FNONE: u8 = 0;

define_code! {
    @mod reg_code;
    @type u8;
    RAX = 0;
    RCX = 1;
    RDX = 2;
    RBX = 3;
    RSP = 4;
    RBP = 5;
    RSI = 6;
    RDI = 7;
    R8 = 8;
    R9 = 9;
    R10 = 0xa;
    R11 = 0xb;
    R12 = 0xc;
    R13 = 0xd;
    R14 = 0xe;
    RNONE = 0xf;
}

define_code! {
    @mod op_code;
    @type u8;
    ADD = 0;
    SUB = 1;
    AND = 2;
    XOR = 3;
}

define_code! {
    @mod cond_fn;
    @type u8;
    YES = 0;
    LE = 1;
    L = 2;
    E = 3;
    NE = 4;
    GE = 5;
    G = 6;
}

/// Whether `icode` is one of the opcodes the processor implements.
pub fn is_valid_icode(icode: u8) -> bool {
    icode <= inst_code::POPQ
}

/// Does the instruction carry a register specifier byte?
pub fn need_regids(icode: u8) -> bool {
    use inst_code::*;
    matches!(
        icode,
        CMOVX | OPQ | PUSHQ | POPQ | IRMOVQ | RMMOVQ | MRMOVQ
    )
}

/// Does the instruction carry an 8-byte constant word?
pub fn need_valc(icode: u8) -> bool {
    use inst_code::*;
    matches!(icode, IRMOVQ | RMMOVQ | MRMOVQ | JX | CALL)
}

/// Length in bytes of an instruction with the given icode.
pub fn inst_len(icode: u8) -> u64 {
    1 + need_regids(icode) as u64 + if need_valc(icode) { 8 } else { 0 }
}

/// Compute `b OP a`. Returns `None` for an unknown function code.
pub fn arithmetic_compute(a: u64, b: u64, op: u8) -> Option<u64> {
    use op_code::*;
    match op {
        ADD => Some(b.wrapping_add(a)),
        SUB => Some(b.wrapping_sub(a)),
        XOR => Some(b ^ a),
        AND => Some(b & a),
        _ => None,
    }
}

/// The ALU. Unknown function codes fall back to addition.
pub fn alu_compute(a: u64, b: u64, op: u8) -> u64 {
    arithmetic_compute(a, b, op).unwrap_or_else(|| b.wrapping_add(a))
}

/// A data structure that simulates the condition codes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ConditionCode {
    pub zf: bool,
    pub sf: bool,
    pub of: bool,
}

impl ConditionCode {
    /// Test if the condition code satisfies the given condition function.
    pub fn test(self, cfn: u8) -> bool {
        let Self { sf, zf, of } = self;
        use cond_fn::*;
        match cfn {
            YES => true,
            E => zf,
            NE => !zf,
            L => sf ^ of,
            LE => zf || (sf ^ of),
            GE => !(sf ^ of),
            G => !zf && !(sf ^ of),
            _ => false,
        }
    }

    /// Recompute the flags from the ALU inputs `a`, `b` and its result `e`.
    /// Logical operations never overflow, so OF is cleared for them.
    pub fn update(&mut self, a: u64, b: u64, e: u64, opfun: u8) {
        const W_1: usize = u64::BITS as usize - 1;
        use op_code::*;
        *self = ConditionCode {
            sf: (e >> W_1 & 1) != 0,
            zf: e == 0,
            of: match opfun {
                // a, b have the same sign and a, e have different sign
                ADD => (!(a ^ b) & (a ^ e)) >> W_1 != 0,
                // (b - a): a, b have different sign and b, e have different sign
                SUB => ((a ^ b) & (b ^ e)) >> W_1 != 0,
                _ => false,
            },
        };
    }
}

impl std::fmt::Display for ConditionCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let flag = |v: bool| crate::utils::format_flag(v);
        write!(
            f,
            "zf {zf}  sf {sf}  of {of}",
            zf = flag(self.zf),
            sf = flag(self.sf),
            of = flag(self.of),
        )
    }
}

/// Status of an instruction as it flows down the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Copy, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Stat {
    /// Indicates that everything is fine. Bubbles also carry this status.
    #[default]
    Aok = 1,
    /// The halt state. Assigned when the instruction fetcher reads the halt
    /// instruction.
    Hlt = 2,
    /// Assigned when the instruction memory or data memory is accessed with
    /// an invalid address.
    Adr = 3,
    /// Assigned when the instruction fetcher reads an invalid instruction
    /// code.
    Ins = 4,
}

impl Stat {
    /// Halt and both faults stop the machine once they reach write back.
    pub fn is_abnormal(self) -> bool {
        matches!(self, Stat::Hlt | Stat::Adr | Stat::Ins)
    }
}

impl std::fmt::Display for Stat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use ansi_term::Colour::{Green, Red};
        let s = match self {
            Stat::Aok => Green.paint("aok"),
            Stat::Hlt => Green.bold().paint("hlt"),
            Stat::Adr => Red.bold().paint("adr"),
            Stat::Ins => Red.bold().paint("ins"),
        };
        write!(f, "{s}")
    }
}

/// Simulation result of the Y86 machine code on the standard ISA.
pub struct StandardResult {
    pub mem: Memory,
    pub cc: ConditionCode,
    pub regs: RegisterFile,
    pub stat: Stat,
    /// Address of the instruction that stopped the machine.
    pub pc: u64,
    pub n_insts: u64,
}

/// Execute Y86 machine code w.r.t. the ISA semantics, one instruction at
/// a time. This function is used to verify the correctness of the pipeline.
///
/// Faults stop the machine the same way the pipeline does: the faulting
/// instruction has no effect and its status is reported in the result.
pub fn simulate(mut mem: Memory, max_insts: u64) -> anyhow::Result<StandardResult> {
    use inst_code::*;
    use reg_code::RSP;

    let mut pc = 0u64;
    let mut cc = ConditionCode::default();
    let mut regs = RegisterFile::default();
    let mut n_insts = 0;

    let stat = loop {
        if n_insts >= max_insts {
            anyhow::bail!("exceed maximum instruction limit {max_insts}");
        }
        n_insts += 1;

        let Ok(byte) = mem.get_byte(pc) else {
            break Stat::Adr;
        };
        let (icode, ifun) = (byte >> 4, byte & 0xf);
        if !is_valid_icode(icode) {
            break Stat::Ins;
        }
        // the whole instruction has to be addressable
        let last = pc.checked_add(inst_len(icode) - 1);
        if last.map_or(true, |end| mem.get_byte(end).is_err()) {
            break Stat::Adr;
        }
        let (ra, rb) = if need_regids(icode) {
            let b = mem.get_byte(pc + 1)?;
            (b >> 4, b & 0xf)
        } else {
            (reg_code::RNONE, reg_code::RNONE)
        };
        let valc = match icode {
            JX | CALL => mem.get_long(pc + 1)?,
            _ if need_valc(icode) => mem.get_long(pc + 2)?,
            _ => 0,
        };
        let valp = pc + inst_len(icode);
        let read = |regs: &RegisterFile, r: u8| regs.read(r).unwrap_or(0);

        match icode {
            HALT => break Stat::Hlt,
            NOP => pc = valp,
            CMOVX => {
                if cc.test(ifun) {
                    regs.write(rb, read(&regs, ra))?;
                }
                pc = valp;
            }
            IRMOVQ => {
                regs.write(rb, valc)?;
                pc = valp;
            }
            RMMOVQ => {
                let addr = read(&regs, rb).wrapping_add(valc);
                if mem.put_long(addr, read(&regs, ra)).is_err() {
                    break Stat::Adr;
                }
                pc = valp;
            }
            MRMOVQ => {
                let addr = read(&regs, rb).wrapping_add(valc);
                let Ok(v) = mem.get_long(addr) else {
                    break Stat::Adr;
                };
                regs.write(ra, v)?;
                pc = valp;
            }
            OPQ => {
                let (va, vb) = (read(&regs, ra), read(&regs, rb));
                let ve = alu_compute(va, vb, ifun);
                cc.update(va, vb, ve, ifun);
                regs.write(rb, ve)?;
                pc = valp;
            }
            JX => pc = if cc.test(ifun) { valc } else { valp },
            CALL => {
                let sp = read(&regs, RSP).wrapping_sub(8);
                if mem.put_long(sp, valp).is_err() {
                    break Stat::Adr;
                }
                regs.write(RSP, sp)?;
                pc = valc;
            }
            RET => {
                let sp = read(&regs, RSP);
                let Ok(v) = mem.get_long(sp) else {
                    break Stat::Adr;
                };
                regs.write(RSP, sp.wrapping_add(8))?;
                pc = v;
            }
            PUSHQ => {
                let va = read(&regs, ra);
                let sp = read(&regs, RSP).wrapping_sub(8);
                if mem.put_long(sp, va).is_err() {
                    break Stat::Adr;
                }
                regs.write(RSP, sp)?;
                pc = valp;
            }
            POPQ => {
                let sp = read(&regs, RSP);
                let Ok(v) = mem.get_long(sp) else {
                    break Stat::Adr;
                };
                regs.write(RSP, sp.wrapping_add(8))?;
                regs.write(ra, v)?;
                pc = valp;
            }
            _ => unreachable!("icode validated above"),
        }
    };

    Ok(StandardResult {
        mem,
        cc,
        regs,
        stat,
        pc,
        n_insts,
    })
}
