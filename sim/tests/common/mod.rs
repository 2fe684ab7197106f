//! A small Y86-64 encoder producing `.yo` text, and helpers running the
//! pipeline on it.
#![allow(dead_code)]

use std::collections::HashMap;

use anyhow::Context;
use y86_pipe::framework::Memory;
use y86_pipe::isa::{cond_fn, inst_code::*, reg_code::RNONE, simulate};
use y86_pipe::{object, utils, PipeSim};

pub const MAX_CYCLES: u64 = 100_000;

struct Line {
    addr: u64,
    bytes: Vec<u8>,
    text: String,
    /// label whose address goes to `bytes[at..at + 8]`
    fixup: Option<(usize, String)>,
}

#[derive(Default)]
pub struct Asm {
    addr: u64,
    lines: Vec<Line>,
    labels: HashMap<String, u64>,
}

fn h2(a: u8, b: u8) -> u8 {
    a << 4 | b
}

impl Asm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raw(&mut self, bytes: &[u8], text: &str) -> &mut Self {
        self.lines.push(Line {
            addr: self.addr,
            bytes: bytes.to_vec(),
            text: text.to_string(),
            fixup: None,
        });
        self.addr += bytes.len() as u64;
        self
    }

    fn with_const(&mut self, head: &[u8], v: u64, text: &str) -> &mut Self {
        let mut bytes = head.to_vec();
        bytes.extend_from_slice(&v.to_le_bytes());
        self.raw(&bytes, text)
    }

    fn with_label(&mut self, head: &[u8], label: &str, text: &str) -> &mut Self {
        self.with_const(head, 0, text);
        if let Some(line) = self.lines.last_mut() {
            line.fixup = Some((head.len(), label.to_string()));
        }
        self
    }

    pub fn label(&mut self, name: &str) -> &mut Self {
        self.labels.insert(name.to_string(), self.addr);
        self.raw(&[], &format!("{name}:"))
    }

    pub fn pos(&mut self, addr: u64) -> &mut Self {
        self.addr = addr;
        self
    }

    pub fn align8(&mut self) -> &mut Self {
        self.addr = (self.addr + 7) & !7;
        self
    }

    pub fn quad(&mut self, v: u64) -> &mut Self {
        self.with_const(&[], v, &format!(".quad {v:#x}"))
    }

    pub fn halt(&mut self) -> &mut Self {
        self.raw(&[h2(HALT, 0)], "halt")
    }

    pub fn nop(&mut self) -> &mut Self {
        self.raw(&[h2(NOP, 0)], "nop")
    }

    pub fn cmov(&mut self, cfn: u8, ra: u8, rb: u8) -> &mut Self {
        self.raw(&[h2(CMOVX, cfn), h2(ra, rb)], "cmovXX")
    }

    pub fn rrmovq(&mut self, ra: u8, rb: u8) -> &mut Self {
        self.cmov(cond_fn::YES, ra, rb)
    }

    pub fn irmovq(&mut self, v: u64, rb: u8) -> &mut Self {
        self.with_const(&[h2(IRMOVQ, 0), h2(RNONE, rb)], v, "irmovq")
    }

    pub fn irmovq_label(&mut self, label: &str, rb: u8) -> &mut Self {
        self.with_label(&[h2(IRMOVQ, 0), h2(RNONE, rb)], label, "irmovq")
    }

    pub fn rmmovq(&mut self, ra: u8, disp: u64, rb: u8) -> &mut Self {
        self.with_const(&[h2(RMMOVQ, 0), h2(ra, rb)], disp, "rmmovq")
    }

    pub fn mrmovq(&mut self, disp: u64, rb: u8, ra: u8) -> &mut Self {
        self.with_const(&[h2(MRMOVQ, 0), h2(ra, rb)], disp, "mrmovq")
    }

    pub fn opq(&mut self, op: u8, ra: u8, rb: u8) -> &mut Self {
        self.raw(&[h2(OPQ, op), h2(ra, rb)], "OPq")
    }

    pub fn jxx(&mut self, cfn: u8, label: &str) -> &mut Self {
        self.with_label(&[h2(JX, cfn)], label, "jXX")
    }

    pub fn jxx_abs(&mut self, cfn: u8, dest: u64) -> &mut Self {
        self.with_const(&[h2(JX, cfn)], dest, "jXX")
    }

    pub fn call(&mut self, label: &str) -> &mut Self {
        self.with_label(&[h2(CALL, 0)], label, "call")
    }

    pub fn ret(&mut self) -> &mut Self {
        self.raw(&[h2(RET, 0)], "ret")
    }

    pub fn pushq(&mut self, ra: u8) -> &mut Self {
        self.raw(&[h2(PUSHQ, 0), h2(ra, RNONE)], "pushq")
    }

    pub fn popq(&mut self, ra: u8) -> &mut Self {
        self.raw(&[h2(POPQ, 0), h2(ra, RNONE)], "popq")
    }

    /// Render in the `.yo` format.
    pub fn yo(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            let mut bytes = line.bytes.clone();
            if let Some((at, label)) = &line.fixup {
                let dest = self.labels[label];
                bytes[*at..*at + 8].copy_from_slice(&dest.to_le_bytes());
            }
            let hex: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
            out += &format!("{:#05x}: {:<20} | {}\n", line.addr, hex, line.text);
        }
        out
    }

    pub fn mem(&self) -> anyhow::Result<Memory> {
        Ok(object::parse(&self.yo())?.init_mem()?)
    }
}

/// Run the program on the pipeline until it stops.
pub fn run_pipe(asm: &Asm) -> anyhow::Result<PipeSim> {
    let mut pipe = PipeSim::new(asm.mem()?, false);
    pipe.run(MAX_CYCLES);
    anyhow::ensure!(pipe.is_terminate(), "pipeline did not stop");
    Ok(pipe)
}

/// Compare the pipeline with the sequential execution of the same program.
pub fn check_with_isa(asm: &Asm) -> anyhow::Result<PipeSim> {
    let init_mem = asm.mem()?;
    let answer = simulate(init_mem.clone(), MAX_CYCLES).context("reference")?;
    let pipe = run_pipe(asm).context("pipeline")?;

    anyhow::ensure!(
        answer.stat == pipe.program_status(),
        "status mismatch: gt = {:?}, sim = {:?}",
        answer.stat,
        pipe.program_status()
    );
    let gt_regs = answer.regs.entries();
    let sim_regs = pipe.registers();
    anyhow::ensure!(
        gt_regs == sim_regs,
        "registers mismatch: gt = {gt_regs:x?}, sim = {sim_regs:x?}"
    );
    anyhow::ensure!(
        answer.cc == pipe.cc(),
        "condition codes mismatch: gt = {:?}, sim = {:?}",
        answer.cc,
        pipe.cc()
    );
    let diff = utils::mem_diff(&answer.mem, pipe.mem());
    anyhow::ensure!(diff.is_empty(), "memory mismatch: {diff:x?}");
    Ok(pipe)
}
