//! Stations command - lists the supported stations and aliases.

use anyhow::Result;
use colored::Colorize;

use crate::stations::{ALIASES, STATIONS};

pub fn execute() -> Result<()> {
    println!("{}", "Supported stations".bold());
    for (name, code) in STATIONS {
        println!("  {name}  {}", format!("({code})").dimmed());
    }

    println!();
    println!("{}", "Accepted aliases".bold());
    for (alias, canonical) in ALIASES {
        println!("  {alias} {} {canonical}", "→".dimmed());
    }
    Ok(())
}
