use clap::Args;
use eyre::Result;
use thinline::{read_input, reduce_checked, reduce_with_method, write_series, Format, Threshold};
use tokio::io::{BufReader, BufWriter};
use tracing::info;

#[derive(Args, Debug)]
pub struct Opts {
    /// Maximum number of samples to emit [0 or negative: no reduction]
    #[clap(
        long,
        env = "THINLINE_MAX_POINTS",
        default_value_t = Threshold::DEFAULT,
        allow_hyphen_values = true
    )]
    pub threshold: Threshold,

    /// Input encoding (json, csv) [default: detected]
    #[clap(long)]
    pub from: Option<Format>,

    /// Output encoding (json, csv) [default: same as input]
    #[clap(long)]
    pub to: Option<Format>,

    /// Reject input whose timestamps are not strictly ascending
    #[clap(long, default_value = "false")]
    pub check_order: bool,
}

pub async fn reduce(opts: &Opts) -> Result<()> {
    let mut reader = BufReader::new(tokio::io::stdin());
    let Some(input) = read_input(&mut reader, opts.from).await? else {
        info!("empty input, nothing to reduce");
        return Ok(());
    };
    let series = input.samples;
    let reduction = if opts.check_order {
        reduce_checked(&series, opts.threshold)?
    } else {
        reduce_with_method(&series, opts.threshold)
    };
    info!(
        input = series.len(),
        output = reduction.samples.len(),
        threshold = %opts.threshold,
        method = %reduction.method,
        "reduced series"
    );

    let mut output = BufWriter::new(tokio::io::stdout());
    write_series(&mut output, opts.to.unwrap_or(input.format), &reduction.samples).await?;
    Ok(())
}
