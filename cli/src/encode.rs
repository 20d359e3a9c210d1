use clap::Args;
use eyre::Result;
use thinline::{read_input, write_series, Format};
use tokio::io::{BufReader, BufWriter};
use tracing::debug;

#[derive(Args, Debug)]
pub struct Opts {
    /// Output encoding (json, csv)
    #[clap(long, default_value = "json")]
    pub to: Format,

    /// Input encoding (json, csv) [default: detected]
    #[clap(long)]
    pub from: Option<Format>,
}

pub async fn encode(opts: &Opts) -> Result<()> {
    let mut reader = BufReader::new(tokio::io::stdin());
    let Some(input) = read_input(&mut reader, opts.from).await? else {
        return Ok(());
    };
    debug!(samples = input.samples.len(), from = %input.format, to = %opts.to, "transcoding");

    let mut output = BufWriter::new(tokio::io::stdout());
    write_series(&mut output, opts.to, &input.samples).await?;
    Ok(())
}
