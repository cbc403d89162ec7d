use clap::Parser;
use kw_cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(error) = kw_cli::run(cli).await {
        eprintln!("keywarden error: {error:#}");
        std::process::exit(kw_cli::exit_code(&error));
    }
}
