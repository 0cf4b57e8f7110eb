//! smpvm command-line interface.
//!
//! This binary provides the entry points for running and inspecting guest images. It performs:
//! 1. **Run:** Load a raw image, boot one or more cores, and run until every core halted.
//! 2. **Disassemble:** Print a raw image as instructions of a chosen instruction set.
//!
//! Logging goes through `tracing`; `RUST_LOG` overrides the level chosen by `--trace`.

use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use smpvm_core::common::PhysAddr;
use smpvm_core::config::Config;
use smpvm_core::core::CoreInitState;
use smpvm_core::core::symbols::SymbolTable;
use smpvm_core::isa::{InstructionSetTable, disasm};
use smpvm_core::sim::{SimError, Simulator, loader};
use smpvm_core::soc::CpuBuilder;

#[derive(Parser, Debug)]
#[command(
    name = "smpvm",
    author,
    version,
    about = "Multi-core 32-bit virtual machine",
    long_about = "Run a raw guest image on a multi-core VM, or disassemble one.\n\nExamples:\n  smpvm run prog.bin --cs 1 --ds 2 --sp 0x8000\n  smpvm run prog.bin --cores 4 --boot 4 --config vm.json --trace\n  smpvm disasm prog.bin"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Load a raw image and run it until every core halted.
    Run {
        /// Raw image (little-endian instruction words).
        image: String,

        /// JSON configuration file.
        #[arg(long)]
        config: Option<String>,

        /// Physical load address of the image (defaults to the start of the code segment).
        #[arg(long, value_parser = parse_u32)]
        load_addr: Option<u32>,

        /// Number of cores (overrides the configuration).
        #[arg(long)]
        cores: Option<usize>,

        /// Number of cores to boot; each gets its own stack below the previous one.
        #[arg(long, default_value_t = 1)]
        boot: usize,

        /// Code segment.
        #[arg(long, default_value = "1", value_parser = parse_u16)]
        cs: u16,

        /// Data segment.
        #[arg(long, default_value = "2", value_parser = parse_u16)]
        ds: u16,

        /// Initial stack pointer of core 0 (DS-relative).
        #[arg(long, default_value = "0x10000", value_parser = parse_u32)]
        sp: u32,

        /// Bytes of stack reserved per booted core.
        #[arg(long, default_value = "0x1000", value_parser = parse_u32)]
        stack_size: u32,

        /// Entry point (CS-relative).
        #[arg(long, default_value = "0", value_parser = parse_u32)]
        ip: u32,

        /// Boot in unprivileged mode.
        #[arg(long)]
        unprivileged: bool,

        /// Stop after this many scheduler rounds.
        #[arg(long)]
        max_steps: Option<u64>,

        /// Trace every executed instruction.
        #[arg(long)]
        trace: bool,

        /// JSON map of symbol names to CS-relative addresses, for backtraces.
        #[arg(long)]
        symbols: Option<String>,
    },

    /// Disassemble a raw image.
    Disasm {
        /// Raw image (little-endian instruction words).
        image: String,

        /// Instruction set id to decode with.
        #[arg(long, default_value_t = 0)]
        set: u8,

        /// Address printed for the first word.
        #[arg(long, default_value = "0", value_parser = parse_u32)]
        base: u32,
    },
}

fn parse_u32(s: &str) -> Result<u32, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(&hex.replace('_', ""), 16),
        None => s.replace('_', "").parse(),
    };
    parsed.map_err(|e| format!("invalid number `{s}`: {e}"))
}

fn parse_u16(s: &str) -> Result<u16, String> {
    let value = parse_u32(s)?;
    u16::try_from(value).map_err(|_| format!("`{s}` does not fit in 16 bits"))
}

fn init_tracing(trace: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if trace { "trace" } else { "warn" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            image,
            config,
            load_addr,
            cores,
            boot,
            cs,
            ds,
            sp,
            stack_size,
            ip,
            unprivileged,
            max_steps,
            trace,
            symbols,
        } => {
            init_tracing(trace);
            let options = RunOptions {
                image,
                config,
                load_addr,
                cores,
                boot,
                init: CoreInitState {
                    cs,
                    ds,
                    sp,
                    ip,
                    privileged: !unprivileged,
                },
                stack_size,
                max_steps,
                trace,
                symbols,
            };
            cmd_run(&options).map(|code| ExitCode::from(code.min(255) as u8))
        }
        Commands::Disasm { image, set, base } => {
            init_tracing(false);
            cmd_disasm(&image, set, base).map(|()| ExitCode::SUCCESS)
        }
    };

    result.unwrap_or_else(|err| {
        eprintln!("[!] {err}");
        ExitCode::FAILURE
    })
}

struct RunOptions {
    image: String,
    config: Option<String>,
    load_addr: Option<u32>,
    cores: Option<usize>,
    boot: usize,
    init: CoreInitState,
    stack_size: u32,
    max_steps: Option<u64>,
    trace: bool,
    symbols: Option<String>,
}

fn read_text(path: &str) -> Result<String, SimError> {
    std::fs::read_to_string(path).map_err(|source| SimError::Io {
        path: path.to_string(),
        source,
    })
}

/// Builds the machine, loads the image, boots `options.boot` cores, and runs.
///
/// Core `i` boots with the common init state and `SP = sp - i * stack_size`.
/// Cores that died on a fault get their fault and backtrace printed.
///
/// # Returns
///
/// The VM exit code.
fn cmd_run(options: &RunOptions) -> Result<u32, SimError> {
    let mut config = match &options.config {
        Some(path) => Config::from_json(&read_text(path)?)?,
        None => Config::default(),
    };
    if let Some(cores) = options.cores {
        config.general.cores = cores;
    }
    config.general.trace_instructions |= options.trace;

    let mut builder = CpuBuilder::new(&config);
    if let Some(path) = &options.symbols {
        let table = SymbolTable::from_json(u32::from(options.init.cs), &read_text(path)?)?;
        builder = builder.symbols(Arc::new(table));
    }
    let mut sim = Simulator::with_cpu(builder.build(), config.scheduler.clone());

    let image = loader::read_image(&options.image)?;
    let load_addr = options
        .load_addr
        .unwrap_or(u32::from(options.init.cs) * 0x1_0000);
    sim.load(PhysAddr::new(load_addr), &image)?;
    println!(
        "[*] {} ({} bytes) at {:#010x}, {} core(s), booting {}",
        options.image,
        image.len(),
        load_addr,
        config.general.cores,
        options.boot
    );

    let states: Vec<CoreInitState> = (0..options.boot)
        .map(|i| CoreInitState {
            sp: options
                .init
                .sp
                .wrapping_sub(options.stack_size.wrapping_mul(i as u32)),
            ..options.init
        })
        .collect();
    sim.boot(&states)?;

    let outcome = sim.run(options.max_steps);
    report(&sim);
    let code = outcome?;
    println!("[*] Exit code {code} after {} rounds", sim.rounds());
    Ok(code)
}

fn report(sim: &Simulator) {
    for core in sim.cpu().cores() {
        let Some(fault) = core.last_fault() else {
            continue;
        };
        let stage = if fault.is_decode_fault() { "decoding" } else { "executing" };
        eprintln!("[!] core {} died {stage}: {fault}", core.id());
        for line in core.regs().dump().lines() {
            eprintln!("    {line}");
        }
        for (depth, entry) in core.backtrace().iter().rev().enumerate() {
            eprintln!("    #{depth} {entry}");
        }
    }
}

fn cmd_disasm(path: &str, set: u8, base: u32) -> Result<(), SimError> {
    let image = loader::read_image(path)?;
    let table = InstructionSetTable::with_defaults();
    for (i, chunk) in image.chunks(4).enumerate() {
        let mut bytes = [0u8; 4];
        bytes[..chunk.len()].copy_from_slice(chunk);
        let raw = u32::from_le_bytes(bytes);
        let addr = base.wrapping_add(4 * i as u32);
        println!(
            "{addr:#010x}:  {raw:08x}  {}",
            disasm::disassemble_word(&table, set, raw)
        );
    }
    Ok(())
}
