use async_trait::async_trait;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::io::{AsyncBufRead, AsyncBufReadExt as _, AsyncWrite, AsyncWriteExt as _};

use crate::{Error, Result, Sample, SampleSeries};

// A Codec reads and writes one Sample at a time. Decoders count lines so
// errors can point at the offending record.
#[async_trait]
pub trait Codec {
    async fn encode<W: AsyncWrite + Unpin + Send>(
        &mut self,
        writer: &mut W,
        sample: &Sample,
    ) -> Result<()>;

    // Decode returns None once the reader is exhausted.
    async fn decode<R: AsyncBufRead + Unpin + Send>(
        &mut self,
        reader: &mut R,
    ) -> Result<Option<Sample>>;
}

// JsonCodec handles newline delimited objects of the form
// {"timestamp":"2024-03-01T12:00:00Z","value":12.5}.
#[derive(Debug, Default)]
pub struct JsonCodec {
    line: u64,
}

impl JsonCodec {
    // Starting_at numbers decoded lines after `line` lines already consumed.
    pub fn starting_at(line: u64) -> Self {
        JsonCodec { line }
    }
}

#[async_trait]
impl Codec for JsonCodec {
    async fn encode<W: AsyncWrite + Unpin + Send>(
        &mut self,
        writer: &mut W,
        sample: &Sample,
    ) -> Result<()> {
        check_encodable(sample)?;
        let mut buf = serde_json::to_vec(sample)?;
        buf.push(b'\n');
        writer.write_all(&buf).await?;
        Ok(())
    }

    async fn decode<R: AsyncBufRead + Unpin + Send>(
        &mut self,
        reader: &mut R,
    ) -> Result<Option<Sample>> {
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf).await? == 0 {
                return Ok(None);
            }
            self.line += 1;
            if buf.iter().all(u8::is_ascii_whitespace) {
                continue;
            }
            return serde_json::from_slice(&buf)
                .map(Some)
                .map_err(|source| Error::Decode {
                    line: self.line,
                    source,
                });
        }
    }
}

// CsvCodec handles `timestamp,value` rows. An empty or "null" value cell is
// an absent reading. A `timestamp,value` header is skipped if it is the first
// non-blank row.
#[derive(Debug, Default)]
pub struct CsvCodec {
    line: u64,
    seen_row: bool,
}

#[derive(Deserialize)]
struct CsvRow {
    #[serde(with = "humantime_serde")]
    timestamp: SystemTime,
    #[serde(default)]
    value: String,
}

impl CsvCodec {
    pub const HEADER: &'static str = "timestamp,value";

    pub fn starting_at(line: u64) -> Self {
        CsvCodec {
            line,
            seen_row: false,
        }
    }

    pub async fn write_header<W: AsyncWrite + Unpin + Send>(writer: &mut W) -> Result<()> {
        writer.write_all(Self::HEADER.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        Ok(())
    }

    fn parse_value(&self, cell: &str) -> Result<Option<f64>> {
        let cell = cell.trim();
        if cell.is_empty() || cell.eq_ignore_ascii_case("null") {
            return Ok(None);
        }
        cell.parse::<f64>()
            .map(Some)
            .map_err(|_| Error::InvalidValue {
                line: self.line,
                value: cell.to_string(),
            })
    }
}

#[async_trait]
impl Codec for CsvCodec {
    async fn encode<W: AsyncWrite + Unpin + Send>(
        &mut self,
        writer: &mut W,
        sample: &Sample,
    ) -> Result<()> {
        check_encodable(sample)?;
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(Vec::new());
        wtr.serialize(sample)?;
        let buf = wtr.into_inner().map_err(|e| Error::Io(e.into_error()))?;
        writer.write_all(&buf).await?;
        Ok(())
    }

    async fn decode<R: AsyncBufRead + Unpin + Send>(
        &mut self,
        reader: &mut R,
    ) -> Result<Option<Sample>> {
        let mut buf = String::new();
        loop {
            buf.clear();
            if reader.read_line(&mut buf).await? == 0 {
                return Ok(None);
            }
            self.line += 1;
            let row = buf.trim();
            if row.is_empty() {
                continue;
            }
            let first_row = !self.seen_row;
            self.seen_row = true;
            if first_row && row.starts_with("timestamp") {
                continue;
            }

            let mut rdr = csv::ReaderBuilder::new()
                .has_headers(false)
                .trim(csv::Trim::All)
                .from_reader(row.as_bytes());
            let Some(record) = rdr.deserialize::<CsvRow>().next() else {
                continue;
            };
            let record = record.map_err(|source| Error::Record {
                line: self.line,
                source,
            })?;
            let value = self.parse_value(&record.value)?;
            return Ok(Some(Sample {
                timestamp: record.timestamp,
                value,
            }));
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Csv,
}

impl Format {
    // Detect consumes leading blank lines and peeks at the first non-blank
    // byte: `{` means JSON, anything else CSV. Returns None on blank input.
    // Use read_input instead to keep decode errors numbered from the start
    // of the input.
    pub async fn detect<R: AsyncBufRead + Unpin + Send>(reader: &mut R) -> Result<Option<Format>> {
        let (first, _) = skip_blank_lines(reader).await?;
        Ok(first.map(Format::from_first_byte))
    }

    fn from_first_byte(b: u8) -> Format {
        if b == b'{' {
            Format::Json
        } else {
            Format::Csv
        }
    }
}

impl FromStr for Format {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Format::Json),
            "csv" => Ok(Format::Csv),
            other => Err(Error::UnknownFormat(other.to_string())),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Format::Json => f.write_str("json"),
            Format::Csv => f.write_str("csv"),
        }
    }
}

/// Reads a whole series in the given format.
pub async fn read_series<R: AsyncBufRead + Unpin + Send>(
    reader: &mut R,
    format: Format,
) -> Result<SampleSeries> {
    match format {
        Format::Json => drain(JsonCodec::default(), reader).await,
        Format::Csv => drain(CsvCodec::default(), reader).await,
    }
}

// Input is a series read by read_input along with the format it was read in.
#[derive(Debug, Clone, PartialEq)]
pub struct Input {
    pub format: Format,
    pub samples: SampleSeries,
}

/// Reads a whole series, detecting its format from the first non-blank byte
/// unless `format` is given. Returns None on blank input. Decode errors carry
/// line numbers counted from the start of the input.
pub async fn read_input<R: AsyncBufRead + Unpin + Send>(
    reader: &mut R,
    format: Option<Format>,
) -> Result<Option<Input>> {
    let (first, skipped) = skip_blank_lines(reader).await?;
    let Some(first) = first else {
        return Ok(None);
    };
    let format = format.unwrap_or_else(|| Format::from_first_byte(first));
    let samples = match format {
        Format::Json => drain(JsonCodec::starting_at(skipped), reader).await?,
        Format::Csv => drain(CsvCodec::starting_at(skipped), reader).await?,
    };
    Ok(Some(Input { format, samples }))
}

/// Writes a whole series in the given format. CSV output starts with a
/// header row.
pub async fn write_series<W: AsyncWrite + Unpin + Send>(
    writer: &mut W,
    format: Format,
    samples: &[Sample],
) -> Result<()> {
    match format {
        Format::Json => {
            let mut codec = JsonCodec::default();
            for sample in samples {
                codec.encode(writer, sample).await?;
            }
        }
        Format::Csv => {
            CsvCodec::write_header(writer).await?;
            let mut codec = CsvCodec::default();
            for sample in samples {
                codec.encode(writer, sample).await?;
            }
        }
    }
    writer.flush().await?;
    Ok(())
}

// RFC 3339 output cannot represent instants before the Unix epoch.
fn check_encodable(sample: &Sample) -> Result<()> {
    match sample.timestamp.duration_since(UNIX_EPOCH) {
        Ok(_) => Ok(()),
        Err(_) => Err(Error::Unencodable {
            timestamp: sample.timestamp,
        }),
    }
}

// Skip_blank_lines consumes whole blank lines only, so the line holding the
// first non-blank byte is left intact. Returns that byte and the number of
// lines consumed.
async fn skip_blank_lines<R: AsyncBufRead + Unpin + Send>(
    reader: &mut R,
) -> Result<(Option<u8>, u64)> {
    let mut lines = 0u64;
    loop {
        let buf = reader.fill_buf().await?;
        if buf.is_empty() {
            return Ok((None, lines));
        }
        match buf.iter().position(|b| !b.is_ascii_whitespace()) {
            Some(i) => {
                let first = buf[i];
                let consumed = buf[..i]
                    .iter()
                    .rposition(|&b| b == b'\n')
                    .map_or(0, |p| p + 1);
                lines += count_newlines(&buf[..consumed]);
                reader.consume(consumed);
                return Ok((Some(first), lines));
            }
            None => {
                let len = buf.len();
                lines += count_newlines(buf);
                reader.consume(len);
            }
        }
    }
}

fn count_newlines(buf: &[u8]) -> u64 {
    buf.iter().filter(|&&b| b == b'\n').count() as u64
}

async fn drain<C, R>(mut codec: C, reader: &mut R) -> Result<SampleSeries>
where
    C: Codec + Send,
    R: AsyncBufRead + Unpin + Send,
{
    let mut samples = Vec::new();
    while let Some(sample) = codec.decode(reader).await? {
        samples.push(sample);
    }
    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, UNIX_EPOCH};
    use tokio::io::BufReader;

    fn at(secs: u64) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(secs)
    }

    #[tokio::test]
    async fn json_decode_skips_blank_lines() {
        let input = b"{\"timestamp\":\"1970-01-01T00:01:00Z\",\"value\":1.5}\n\n{\"timestamp\":\"1970-01-01T00:02:00Z\",\"value\":null}\n" as &[u8];
        let mut reader = BufReader::new(input);
        let series = read_series(&mut reader, Format::Json).await.unwrap();
        assert_eq!(series, vec![Sample::new(at(60), 1.5), Sample::absent(at(120))]);
    }

    #[tokio::test]
    async fn json_decode_error_has_line() {
        let input = b"{\"timestamp\":\"1970-01-01T00:01:00Z\",\"value\":1}\n{\"timestamp\":\"1970-01-01T00:02:00Z\",\"value\":\"high\"}\n" as &[u8];
        let mut reader = BufReader::new(input);
        match read_series(&mut reader, Format::Json).await {
            Err(Error::Decode { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected decode error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn csv_decode() {
        let input = b"timestamp,value\n1970-01-01T00:01:00Z,2.5\n1970-01-01T00:02:00Z,\n1970-01-01T00:03:00Z, null \n1970-01-01T00:04:00Z,NaN\n" as &[u8];
        let mut reader = BufReader::new(input);
        let series = read_series(&mut reader, Format::Csv).await.unwrap();
        assert_eq!(series.len(), 4);
        assert_eq!(series[0], Sample::new(at(60), 2.5));
        assert_eq!(series[1], Sample::absent(at(120)));
        assert_eq!(series[2], Sample::absent(at(180)));
        assert!(series[3].value.unwrap().is_nan());
        assert!(!series[3].is_numeric());
    }

    #[tokio::test]
    async fn csv_rejects_text_value() {
        let input = b"1970-01-01T00:01:00Z,1\n1970-01-01T00:02:00Z,abc\n" as &[u8];
        let mut reader = BufReader::new(input);
        match read_series(&mut reader, Format::Csv).await {
            Err(Error::InvalidValue { line, value }) => {
                assert_eq!(line, 2);
                assert_eq!(value, "abc");
            }
            other => panic!("expected invalid value, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn csv_encode() {
        let mut out = Vec::new();
        let samples = vec![Sample::new(at(60), 2.5), Sample::absent(at(120))];
        write_series(&mut out, Format::Csv, &samples).await.unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "timestamp,value\n1970-01-01T00:01:00Z,2.5\n1970-01-01T00:02:00Z,\n"
        );
    }

    #[tokio::test]
    async fn encode_rejects_times_before_epoch() {
        let samples = [Sample::new(UNIX_EPOCH - Duration::from_secs(60), 1.0)];
        for format in [Format::Json, Format::Csv] {
            let mut out = Vec::new();
            match write_series(&mut out, format, &samples).await {
                Err(Error::Unencodable { timestamp }) => assert_eq!(timestamp, samples[0].timestamp),
                other => panic!("{format}: expected unencodable error, got {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn csv_header_after_blank_line() {
        let input = b"\n\ntimestamp,value\n1970-01-01T00:01:00Z,1\n" as &[u8];
        let mut reader = BufReader::new(input);
        let series = read_series(&mut reader, Format::Csv).await.unwrap();
        assert_eq!(series, vec![Sample::new(at(60), 1.0)]);
    }

    #[tokio::test]
    async fn csv_header_only_skipped_once() {
        let input = b"timestamp,value\ntimestamp,value\n" as &[u8];
        let mut reader = BufReader::new(input);
        match read_series(&mut reader, Format::Csv).await {
            Err(Error::Record { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected record error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn csv_bad_timestamp_has_line() {
        let input = b"timestamp,value\n1970-01-01T00:01:00Z,1\n\nyesterday,2\n" as &[u8];
        let mut reader = BufReader::new(input);
        match read_series(&mut reader, Format::Csv).await {
            Err(Error::Record { line, .. }) => assert_eq!(line, 4),
            other => panic!("expected record error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn read_input_counts_leading_blank_lines() {
        let input = b"\n \n{\"timestamp\":\"1970-01-01T00:01:00Z\",\"value\":1}\n{\"value\":2}\n" as &[u8];
        let mut reader = BufReader::new(input);
        match read_input(&mut reader, None).await {
            Err(Error::Decode { line, .. }) => assert_eq!(line, 4),
            other => panic!("expected decode error, got {:?}", other),
        }

        let input = b"\n\ntimestamp,value\n1970-01-01T00:01:00Z,abc\n" as &[u8];
        let mut reader = BufReader::new(input);
        match read_input(&mut reader, None).await {
            Err(Error::InvalidValue { line, value }) => {
                assert_eq!(line, 4);
                assert_eq!(value, "abc");
            }
            other => panic!("expected invalid value, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn read_input_detects_or_follows_format() {
        let input = b"\n1970-01-01T00:01:00Z,2.5\n" as &[u8];
        let got = read_input(&mut BufReader::new(input), None).await.unwrap().unwrap();
        assert_eq!(got.format, Format::Csv);
        assert_eq!(got.samples, vec![Sample::new(at(60), 2.5)]);

        let input = b"{\"timestamp\":\"1970-01-01T00:01:00Z\",\"value\":2.5}\n" as &[u8];
        let got = read_input(&mut BufReader::new(input), Some(Format::Json))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(got.format, Format::Json);
        assert_eq!(got.samples.len(), 1);

        let blank = b" \n\n" as &[u8];
        assert_eq!(read_input(&mut BufReader::new(blank), None).await.unwrap(), None);
    }

    #[tokio::test]
    async fn json_to_csv_and_back() {
        let samples = vec![
            Sample::new(at(1_700_000_000), -3.0),
            Sample::absent(at(1_700_000_060)),
            Sample::new(at(1_700_000_120), 41.75),
        ];
        let mut csv = Vec::new();
        write_series(&mut csv, Format::Csv, &samples).await.unwrap();
        let mut reader = BufReader::new(csv.as_slice());
        assert_eq!(read_series(&mut reader, Format::Csv).await.unwrap(), samples);
    }

    #[tokio::test]
    async fn detect_format() {
        let mut json = BufReader::new(b"\n  {\"timestamp\":\"1970-01-01T00:00:00Z\"}\n" as &[u8]);
        assert_eq!(Format::detect(&mut json).await.unwrap(), Some(Format::Json));
        let series = read_series(&mut json, Format::Json).await.unwrap();
        assert_eq!(series, vec![Sample::absent(at(0))]);

        let mut csv = BufReader::new(b"timestamp,value\n" as &[u8]);
        assert_eq!(Format::detect(&mut csv).await.unwrap(), Some(Format::Csv));

        let mut empty = BufReader::new(b"  \n" as &[u8]);
        assert_eq!(Format::detect(&mut empty).await.unwrap(), None);
    }

    #[test]
    fn format_from_str() {
        assert_eq!("JSON".parse::<Format>().unwrap(), Format::Json);
        assert_eq!("csv".parse::<Format>().unwrap(), Format::Csv);
        assert!(matches!(
            "xml".parse::<Format>(),
            Err(Error::UnknownFormat(f)) if f == "xml"
        ));
    }
}
