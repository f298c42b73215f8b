use appswitch::cli::{output, plan, run, Cli, Commands};
use clap::Parser;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match &cli.command {
        Commands::Plan(args) => plan::execute(args),
        Commands::Run(args) => run::execute(args).await,
    };

    if let Err(e) = result {
        output::error(&e.to_string());
        std::process::exit(1);
    }
}
