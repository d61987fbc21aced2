use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

const COMPILER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "pycc")]
#[command(about = "Minimal JIT compiler: typed scripting subset to x86-64 SSE2 native code")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a JSON-encoded function declaration to assembly.
    Compile {
        #[arg(help = "Input JSON file holding a pycc::ast::FunctionDef")]
        input: PathBuf,

        #[arg(short, long, help = "Write assembly to this file instead of stdout")]
        output: Option<PathBuf>,

        #[arg(long, help = "Print the optimized IR instead of assembly")]
        emit_ir: bool,

        #[arg(long, help = "Skip the optimizer passes")]
        no_optimize: bool,
    },
    /// Compile, assemble, link, map into executable memory, and call.
    Run {
        #[arg(help = "Input JSON file holding a pycc::ast::FunctionDef")]
        input: PathBuf,

        #[arg(long, value_delimiter = ',', help = "Arguments to call the function with")]
        args: Vec<f64>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Compile {
            input,
            output,
            emit_ir,
            no_optimize,
        } => compile_command(&input, output.as_deref(), emit_ir, no_optimize),
        Commands::Run { input, args } => run_command(&input, &args),
    }
}

fn read_function_def(path: &PathBuf) -> Result<pycc::ast::FunctionDef> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse {} as a function declaration", path.display()))
}

fn compile_command(
    input: &PathBuf,
    output: Option<&std::path::Path>,
    emit_ir: bool,
    no_optimize: bool,
) -> Result<()> {
    let func = read_function_def(input)?;

    let text = if emit_ir {
        let (body, _signature) = pycc::frontend::lower_function(&func)
            .context("lowering failed")?;
        let body = if no_optimize { body } else { pycc::ir::optimize(body) };
        pycc::ir::unparse(&body)
    } else {
        let compiled = pycc::compile(&func).context("compilation failed")?;
        compiled.assembly
    };

    match output {
        Some(path) => {
            fs::write(path, &text).with_context(|| format!("failed to write {}", path.display()))?;
            println!("Compiled {} -> {} ({COMPILER_VERSION})", input.display(), path.display());
        }
        None => print!("{text}"),
    }

    Ok(())
}

fn run_command(input: &PathBuf, args: &[f64]) -> Result<()> {
    let func = read_function_def(input)?;
    let compiled = pycc::compile(&func).context("compilation failed")?;

    let work_dir = tempfile::tempdir().context("failed to create a scratch directory")?;
    let binary = pycc::toolchain::assemble_and_link(&compiled.assembly, work_dir.path())
        .context("assemble/link failed")?;

    let function = pycc::jit::JitFunction::load(&binary, compiled.signature)
        .context("failed to map executable memory")?;
    let result = function.call(args).context("call failed")?;

    println!("{result}");
    Ok(())
}
