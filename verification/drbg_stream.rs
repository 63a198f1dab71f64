//! # `PractRand` Stream Generator
//!
//! Writes the counter-mode HMAC-SHA256 byte stream to stdout for statistical
//! testing, either raw or as a stream of unbiased draws from `0..n`.
//!
//! ```text
//! drbg_stream --key 000102...1f | RNG_test stdin8
//! drbg_stream --range 26 | ent
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use mbcrypt::{unbiased_small_int, ByteSourceReader, HmacCounterByteSource, MbcryptError};
use std::io::{self, BufWriter, ErrorKind, Write};

#[derive(Parser)]
#[command(name = "drbg_stream")]
#[command(about = "Dump the HMAC-SHA256 counter DRBG stream to stdout")]
struct Args {
    /// Generator key as hex (any length)
    #[arg(long, default_value = "0102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f20")]
    key: String,

    /// Highest counter value whose block may be emitted
    #[arg(long, default_value_t = u32::MAX)]
    max_counter: u32,

    /// Emit one byte per unbiased draw from 0..RANGE instead of raw bytes
    #[arg(long, value_parser = clap::value_parser!(u16).range(1..=256))]
    range: Option<u16>,
}

/// Entry point for the stream generator.
fn main() -> Result<()> {
    let args = Args::parse();
    let key = hex::decode(&args.key).context("Key is not hex")?;
    let source = HmacCounterByteSource::new(&key, args.max_counter);

    let stdout = io::stdout();
    let mut handle = BufWriter::new(stdout.lock());

    let written = match args.range {
        None => io::copy(&mut ByteSourceReader::new(source), &mut handle).map(|_| ()),
        Some(n) => write_draws(source, usize::from(n), &mut handle),
    };

    // A closed pipe is how consumers say they have seen enough
    match written.and_then(|()| handle.flush()) {
        Err(e) if e.kind() != ErrorKind::BrokenPipe => Err(e).context("Failed to write stream"),
        _ => Ok(()),
    }
}

fn write_draws(mut source: HmacCounterByteSource, n: usize, out: &mut impl Write) -> io::Result<()> {
    loop {
        match unbiased_small_int(&mut source, n) {
            Ok(value) => out.write_all(&[value.to_le_bytes()[0]])?,
            Err(MbcryptError::Exhausted) => return Ok(()),
            Err(e) => return Err(io::Error::new(ErrorKind::InvalidInput, e)),
        }
    }
}
