use clap::Parser;
use lodes_cli::LodesCli;

fn main() {
    let cli = match LodesCli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // Usage errors exit 1 like any other bad input; --help and --version exit 0.
            let code = if err.use_stderr() { 1 } else { 0 };
            let _ = err.print();
            std::process::exit(code);
        }
    };

    lodes_cli::init_tracing(cli.verbose);
    tracing::debug!(version = lodes_core::VERSION, "lodes starting");
    std::process::exit(cli.run());
}
