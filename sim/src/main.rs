use anyhow::{Context, Result};
use binutils::{clap, verbose};
use clap::Parser;
use y86_pipe::{isa::reg_code, load, utils::print_mem_diff, PipeSim};

// Cycle-level simulator of the Y86-64 pipeline
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about,
    long_about = None,
    styles = binutils::get_styles(),
    arg_required_else_help = true,
)]
struct Args {
    /// Path to the input .yo file
    input: String,

    /// Stop the simulation after this many cycles
    #[arg(long, default_value_t = 100000)]
    max_cycles: u64,

    /// Print the state of the pipeline in each cycle
    #[arg(long)]
    trace: bool,

    /// Do not print the memory changed by the program
    #[arg(long)]
    no_mem_diff: bool,

    /// Write logs to this file as JSON lines
    #[arg(long)]
    log_file: Option<String>,

    #[command(flatten)]
    verbose: verbose::Verbosity,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_file = args
        .log_file
        .as_ref()
        .map(|path| {
            std::fs::File::create(path).with_context(|| format!("could not create `{path}`"))
        })
        .transpose()?;
    let log_level = binutils::verbose_level_to_trace(args.verbose.log_level());
    binutils::logging_setup(log_level, log_file.as_ref())?;

    let obj = load(&args.input).with_context(|| format!("could not load `{}`", &args.input))?;
    let init_mem = obj.init_mem()?;

    let mut pipe = PipeSim::new(init_mem.clone(), args.trace);
    let stat = pipe.run(args.max_cycles);
    if !pipe.is_terminate() {
        tracing::warn!("stopped after {} cycles", args.max_cycles);
    }

    println!("Cycles: {}  Status: {}", pipe.cycle_count(), stat);
    println!("{}", pipe.cc());
    for (id, val) in pipe.registers() {
        if val != 0 {
            println!("{:<4} {:#018x}", reg_code::name_of(id), val);
        }
    }
    if !args.no_mem_diff {
        print_mem_diff(&init_mem, pipe.mem());
    }
    Ok(())
}
