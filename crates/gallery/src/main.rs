mod cli;
mod paths;
mod run;

use anyhow::Result;
use cli::Command;

fn main() -> Result<()> {
    let cli = cli::parse();
    run::initialise_tracing();

    match cli.command {
        Some(Command::List) => run::list(),
        Some(Command::Capture(args)) => run::capture(&cli.run, args),
        Some(Command::Where) => run::print_paths(&cli.run),
        None => run::run(cli.run),
    }
}
