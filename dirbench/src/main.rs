mod analyze;
mod bench;
mod cli;
mod command_error;
mod exit_codes;
mod logging;
mod output;
mod timeline;

use clap::Parser;
use command_error::CommandError;
use exit_codes::ExitCode;
use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() {
    let cli = match cli::Cli::try_parse() {
        Ok(v) => v,
        Err(err) => {
            let _ = err.print();
            std::process::exit(parse_error_code(&err).as_i32());
        }
    };

    logging::init(cli.verbose, cli.quiet);

    let code = run_command(cli.command).await.unwrap_or_else(|err| {
        eprintln!("{err}");
        err.exit_code()
    });

    std::process::exit(code.as_i32());
}

async fn run_command(command: cli::Command) -> Result<ExitCode, CommandError> {
    match command {
        cli::Command::Bench(args) => bench::bench(args).await,
        cli::Command::Analyze(args) => analyze::analyze(args),
        cli::Command::Timeline(args) => timeline::timeline(args),
    }
}

/// Help and version requests exit cleanly; every other parse failure is bad input.
fn parse_error_code(err: &clap::Error) -> ExitCode {
    use clap::error::ErrorKind;
    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::Success,
        _ => ExitCode::InvalidInput,
    }
}
