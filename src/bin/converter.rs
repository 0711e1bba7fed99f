//! CheBanca! Convert - CLI tool for converting CheBanca! exports to OFX or CSV.

use chebanca_statement::{
    csv_format::CsvStatement, grid::is_workbook_path, ofx_format::OfxStatement, CheBancaParser,
    Error, Format, Grid, ParserSettings, Result, Statement,
};
use clap::Parser;
use env_logger::Env;
use std::fs::File;
use std::io::{self, Write};

#[derive(Parser)]
#[command(name = "chebanca_convert")]
#[command(
    about = "Convert CheBanca! account exports to OFX or CSV statements",
    long_about = None
)]
struct Cli {
    /// Input file path: a workbook (.xlsx, .xls, .ods) or a CSV export
    /// (CSV from stdin if not provided)
    #[arg(short, long)]
    input: Option<String>,

    /// Output file path (or stdout if not provided)
    #[arg(short, long)]
    output: Option<String>,

    /// Output format (ofx, csv)
    #[arg(long = "output-format", default_value = "ofx")]
    output_format: String,

    /// Field delimiter of the input export
    #[arg(long, default_value_t = ',')]
    delimiter: char,

    /// Account identifier written to the statement
    #[arg(long)]
    account: Option<String>,

    /// Bank identifier written to the statement
    #[arg(long = "bank-id")]
    bank_id: Option<String>,

    /// Default currency of the account
    #[arg(long, default_value = "EUR")]
    currency: String,

    /// Log debug details of the import
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let output_format = cli.output_format.parse::<Format>()?;
    let delimiter = u8::try_from(cli.delimiter)
        .map_err(|_| Error::InvalidFormat(format!("delimiter {:?}", cli.delimiter)))?;

    let settings = ParserSettings {
        bank_id: cli.bank_id,
        account_id: cli.account,
        currency: Some(cli.currency),
    };

    // Process based on input file or stdin
    let grid = if let Some(ref input_path) = cli.input {
        log::debug!("Loading {}", input_path);
        if is_workbook_path(input_path) {
            Grid::from_workbook_path(input_path)?
        } else {
            let mut file = File::open(input_path)?;
            Grid::from_csv_read(&mut file, delimiter)?
        }
    } else {
        let mut stdin = io::stdin();
        Grid::from_csv_read(&mut stdin, delimiter)?
    };

    let statement = CheBancaParser::new(grid)?.with_settings(settings).parse()?;
    log::info!("Converted {} transactions", statement.lines.len());

    // Output based on output file or stdout
    if let Some(ref output_path) = cli.output {
        let mut file = File::create(output_path)?;
        write_output(&mut file, statement, output_format)?;
    } else {
        let mut stdout = io::stdout();
        write_output(&mut stdout, statement, output_format)?;
    }

    Ok(())
}

fn write_output<W: Write>(writer: &mut W, statement: Statement, format: Format) -> Result<()> {
    match format {
        Format::Ofx => OfxStatement { statement }.write_to(writer)?,
        Format::Csv => CsvStatement { statement }.write_to(writer)?,
    }
    writer.flush()?;
    Ok(())
}
