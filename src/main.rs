//! Tachyon CLI.
//!
//! Hashes a single string argument and prints the digest in lowercase hex.

use clap::Parser;
use clap::error::ErrorKind;

#[derive(Parser)]
#[command(name = "tachyon")]
#[command(author = "byt3forg3")]
#[command(version)]
#[command(about = "Compute the Tachyon hash of a string")]
struct Cli {
    /// The string to hash
    input: String,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = err.print();
            return;
        }
        Err(err) => {
            let _ = err.print();
            std::process::exit(1);
        }
    };

    let digest = tachyon::hash(cli.input.as_bytes());
    println!("Tachyon Hash: {}", hex::encode(digest));
}
