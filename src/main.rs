#![warn(clippy::pedantic, clippy::cargo, clippy::nursery)]
use erledigt::cli::cli;
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
  cli()
}
