//! labeler binary - labels pull requests from a GitHub Actions step or a shell

use clap::Parser;
use labeler::cli::{annotate, init_logging, run, Cli};

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        annotate("error", &e);
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
