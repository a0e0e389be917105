use std::{fs, path::PathBuf, process::ExitCode};

use clap::{Parser as ClapParser, Subcommand};
use colored::Colorize;
use marsh::{builtins, repl::Repl, Dump, Scope};

#[derive(ClapParser)]
#[command(name = "marsh", version, about = "Run marsh scripts or start a shell")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Print the token stream to stderr before parsing
    #[arg(long, global = true)]
    tokens: bool,

    /// Print the parsed program to stderr before evaluating
    #[arg(long, global = true)]
    ast: bool,

    /// Log at debug level (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a script file and print its final value
    Run { file: PathBuf },

    /// Start the interactive shell (the default)
    Repl,

    /// Evaluate source given on the command line
    Eval { source: String },
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) if verbose => EnvFilter::new("marsh=debug"),
        Err(_) => return,
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
        .with(filter)
        .init();
}

fn run_source(source: &str, dump: Dump) -> ExitCode {
    let scope = Scope::new();
    if let Err(err) = builtins::setup_scope(&scope) {
        eprint!("{}", err.render(source));
        return ExitCode::FAILURE;
    }

    match marsh::run_with(source, &scope, dump) {
        Ok(value) => {
            println!("{}", value);
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprint!("{}", err.render(source));
            ExitCode::FAILURE
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let dump = Dump {
        tokens: cli.tokens,
        ast: cli.ast,
    };

    match cli.command.unwrap_or(Commands::Repl) {
        Commands::Run { file } => match fs::read_to_string(&file) {
            Ok(source) => run_source(&source, dump),
            Err(err) => {
                eprintln!("{} cannot read {}: {}", "error:".red().bold(), file.display(), err);
                ExitCode::FAILURE
            }
        },
        Commands::Eval { source } => run_source(&source, dump),
        Commands::Repl => match Repl::new(dump).and_then(|mut repl| repl.run()) {
            Ok(()) => ExitCode::SUCCESS,
            Err(err) => {
                eprintln!("{} {}", "error:".red().bold(), err);
                ExitCode::FAILURE
            }
        },
    }
}
