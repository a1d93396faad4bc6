use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colgroup_offsets::{factory, EncodingOptions};
use std::fs;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "offset-inspect")]
#[command(about = "Encode and inspect row-offset records", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode a whitespace or comma separated list of rows into a record
    Encode {
        /// Text file with strictly increasing row numbers
        input: PathBuf,

        /// Record file to write
        output: PathBuf,

        /// JSON file with encoding options
        #[arg(long)]
        options: Option<PathBuf>,
    },
    /// Print a JSON summary of every record in a file
    Inspect {
        /// Record file to read
        input: PathBuf,

        /// Also print the decoded rows
        #[arg(long, default_value_t = false)]
        rows: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Encode { input, output, options } => encode(&input, &output, options.as_deref()),
        Commands::Inspect { input, rows } => inspect(&input, rows),
    }
}

fn load_options(path: Option<&Path>) -> Result<EncodingOptions> {
    let Some(path) = path else {
        return Ok(EncodingOptions::default());
    };
    let json = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    EncodingOptions::from_json(&json).with_context(|| format!("parsing options in {}", path.display()))
}

fn parse_rows(text: &str) -> Result<Vec<u32>> {
    text.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<u32>().with_context(|| format!("invalid row {s:?}")))
        .collect()
}

fn encode(input: &Path, output: &Path, options: Option<&Path>) -> Result<()> {
    let options = load_options(options)?;
    let text = fs::read_to_string(input).with_context(|| format!("reading {}", input.display()))?;
    let rows = parse_rows(&text)?;

    let offsets = factory::create_with(&rows, &options).context("encoding rows")?;

    let file = fs::File::create(output).with_context(|| format!("creating {}", output.display()))?;
    let mut out = BufWriter::new(file);
    offsets.write_to(&mut out)?;
    out.flush()?;

    println!("{}", serde_json::to_string_pretty(&offsets.stats())?);
    Ok(())
}

fn inspect(input: &Path, print_rows: bool) -> Result<()> {
    let len = fs::metadata(input).with_context(|| format!("reading {}", input.display()))?.len();
    let file = fs::File::open(input).with_context(|| format!("opening {}", input.display()))?;
    let mut reader = BufReader::new(file);

    let mut consumed = 0u64;
    let mut index = 0usize;
    while consumed < len {
        let offsets = factory::read_from_with(&mut reader, &EncodingOptions::default().with_verify(true))
            .with_context(|| format!("record {index} at byte {consumed}"))?;
        consumed += offsets.exact_size_on_disk();

        let mut summary = serde_json::to_value(offsets.stats())?;
        if print_rows {
            summary["rows"] = serde_json::to_value(offsets.to_vec())?;
        }
        println!("{}", serde_json::to_string_pretty(&summary)?);
        index += 1;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_mixed_separators() {
        assert_eq!(parse_rows("1, 5\n9 12,").unwrap(), vec![1, 5, 9, 12]);
        assert!(parse_rows("1 x").is_err());
        assert!(parse_rows("").unwrap().is_empty());
    }
}
