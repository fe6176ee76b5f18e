//! hyouji CLI
//!
//! Interactive command-line tool for managing GitHub issue labels

use clap::Parser;
use colored::Colorize;

/// hyouji CLI
///
/// All behavior is driven by the interactive menu; the command line carries
/// no flags or subcommands.
#[derive(Parser)]
#[command(
    name = "hyouji",
    version,
    about = "Interactive GitHub issue label manager",
    long_about = "An interactive command-line tool for managing GitHub issue labels \
    in a single repository: create, delete, import and export labels, with \
    credential persistence and Git-remote auto-detection."
)]
struct Cli {}

#[tokio::main]
async fn main() {
    let _cli = Cli::parse();

    if let Err(e) = hyouji::app::run().await {
        eprintln!("{} {}", "✗".red(), e.to_string().red());
        std::process::exit(1);
    }
}
