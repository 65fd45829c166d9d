use clap::Parser;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use peekable_reader::{CharSource, PeekableReader, Symbol, DEFAULT_CAPACITY};

mod output_writer;
use output_writer::OutputWriter;

/// Dump every character of the input with its byte offset and width
#[derive(Parser)]
struct Args {
    /// Path to the input file (use "-" to read from stdin)
    input: Option<PathBuf>,

    /// Also show the character that follows each one
    #[arg(long)]
    lookahead: bool,

    /// Read buffer size in bytes
    #[arg(long, default_value_t = DEFAULT_CAPACITY)]
    capacity: usize,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let reader = open_input(args.input.as_deref())?;
    let mut char_reader = PeekableReader::with_capacity(args.capacity, reader);

    let stdout = io::stdout();
    let mut output_writer = OutputWriter::new(stdout.lock());

    dump(&mut char_reader, &mut output_writer, args.lookahead)?;
    output_writer.flush()?;
    Ok(())
}

fn open_input(input: Option<&Path>) -> io::Result<Box<dyn Read>> {
    match input {
        Some(path) if path != Path::new("-") => Ok(Box::new(fs::File::open(path)?)),
        _ => Ok(Box::new(io::stdin())),
    }
}

fn dump<S: CharSource, W: io::Write>(
    reader: &mut PeekableReader<S>,
    output: &mut OutputWriter<W>,
    lookahead: bool,
) -> io::Result<()> {
    loop {
        let symbol = reader.read_char()?;
        let next = if lookahead && !symbol.is_eof() {
            Some(reader.peek_char()?)
        } else {
            None
        };
        output.write_symbol(symbol, next)?;
        if symbol == Symbol::Eof {
            return Ok(());
        }
    }
}
