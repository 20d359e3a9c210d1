mod encode;
mod reduce;

use clap::{Parser, Subcommand};
use eyre::Result;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "thinline",
    about = "Downsample sensor time series for charting and export"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Reduce a series read from stdin to a bounded number of samples
    Reduce(reduce::Opts),
    /// Transcode a series between encodings without reducing it
    Encode(encode::Opts),
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Command::Reduce(opts) => reduce::reduce(&opts).await,
        Command::Encode(opts) => encode::encode(&opts).await,
    }
}

// Logs go to stderr so stdout only carries samples.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "thinline=info,thinline_cli=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();
}
