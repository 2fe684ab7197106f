//! The clocking engine of the pipeline simulator and the hardware units the
//! stages share.
mod memory;
mod pipe_reg;
mod print;
mod registers;

pub use memory::{Memory, MEM_SIZE};
pub use pipe_reg::{Control, PipeField};
pub use registers::{RegisterFile, NUM_REGS};

use crate::isa::{ConditionCode, Stat};
use crate::stages::{
    DecodeStage, ExecuteStage, FetchStage, MemoryStage, PipeRegs, Stage, WritebackStage,
};

/// Process-wide state that is not part of a pipeline register. There is one
/// instance of each unit; the stages borrow the ones they need:
///
/// - `mem`: read by fetch, read and written by memory.
/// - `reg_file`: read by decode, written by write back.
/// - `cc`: read and written by execute only.
#[derive(Debug, Clone, Default)]
pub struct Units {
    pub mem: Memory,
    pub reg_file: RegisterFile,
    pub cc: ConditionCode,
}

/// The five stages, each holding the signals it computed in the current
/// cycle.
#[derive(Debug, Clone, Default)]
pub struct Stages {
    pub fetch: FetchStage,
    pub decode: DecodeStage,
    pub execute: ExecuteStage,
    pub memory: MemoryStage,
    pub writeback: WritebackStage,
}

/// Pipeline simulator. A CPU cycle consists of two phases:
///
/// - Clock low: every stage computes its combinational logic from the
///   committed outputs of the pipeline registers and sets the inputs of the
///   register downstream.
/// - Clock high: every stage latches the register(s) it owns with the control
///   signal (normal, stall or bubble) it decided on during the low phase.
pub struct PipeSim {
    pub(crate) regs: PipeRegs,
    pub(crate) stages: Stages,
    pub(crate) units: Units,
    /// See [`PipeSim::is_terminate`].
    pub(crate) terminate: bool,
    /// Whether to print the pipeline state to tty
    pub(crate) tty_out: bool,
    pub(crate) cycle_count: u64,
}

impl PipeSim {
    /// Initialize the simulator with given memory. All pipeline registers
    /// start as bubbles and fetching starts at address 0.
    ///
    /// tty_out: whether to print rich-text information each cycle
    pub fn new(memory: Memory, tty_out: bool) -> Self {
        Self {
            regs: PipeRegs::default(),
            stages: Stages::default(),
            units: Units {
                mem: memory,
                ..Default::default()
            },
            terminate: false,
            tty_out,
            cycle_count: 0,
        }
    }

    /// Low phase. Stages expose values other stages need in the same cycle
    /// (memory's loaded value, execute's ALU result and condition, decode's
    /// source registers), so they run from write back to fetch.
    fn clock_low(&mut self) -> bool {
        let Self {
            regs,
            stages,
            units,
            ..
        } = self;
        let stop = stages.writeback.clock_low(regs, &mut units.reg_file);
        stages.memory.clock_low(regs, &mut units.mem);
        stages.execute.clock_low(regs, &stages.memory, &mut units.cc);
        stages
            .decode
            .clock_low(regs, &stages.execute, &stages.memory, &units.reg_file);
        stages
            .fetch
            .clock_low(regs, &stages.decode, &stages.execute, &units.mem);
        stop
    }

    /// High phase. Each register is latched exactly once.
    fn clock_high(&mut self) {
        let Stages {
            fetch,
            decode,
            execute,
            memory,
            writeback,
        } = &self.stages;
        let stages: [&dyn Stage; 5] = [fetch, decode, execute, memory, writeback];
        for stage in stages {
            stage.clock_high(&mut self.regs);
        }
    }

    /// Simulate one CPU cycle. Does nothing once the simulation terminated.
    pub fn step(&mut self) {
        if self.terminate {
            return;
        }
        tracing::trace!("cycle {}", self.cycle_count);
        self.terminate = self.clock_low();
        if self.tty_out {
            self.print_state();
        }
        self.clock_high();
        self.cycle_count += 1;
    }

    /// Run until the program stops or `max_cycles` cycles have been
    /// simulated. Returns the status of the program.
    pub fn run(&mut self, max_cycles: u64) -> Stat {
        while !self.terminate && self.cycle_count < max_cycles {
            self.step();
        }
        self.program_status()
    }

    /// Whether a halted or faulted instruction reached write back.
    pub fn is_terminate(&self) -> bool {
        self.terminate
    }

    pub fn cycle_count(&self) -> u64 {
        self.cycle_count
    }

    /// Status of the instruction in write back during the last cycle.
    pub fn program_status(&self) -> Stat {
        self.stages.writeback.stat()
    }

    /// The address fetched in the last cycle.
    pub fn program_counter(&self) -> u64 {
        self.stages.fetch.pc()
    }

    pub fn mem(&self) -> &Memory {
        &self.units.mem
    }

    pub fn cc(&self) -> ConditionCode {
        self.units.cc
    }

    pub fn reg_file(&self) -> &RegisterFile {
        &self.units.reg_file
    }

    /// Get the registers and their values
    ///
    /// (register_code, value)
    pub fn registers(&self) -> Vec<(u8, u64)> {
        self.units.reg_file.entries()
    }

    pub fn pipe_regs(&self) -> &PipeRegs {
        &self.regs
    }

    pub fn stages(&self) -> &Stages {
        &self.stages
    }
}
