use anyhow::{Context, Result, bail};
use std::fs;
use std::path::PathBuf;
use tools::entity_table::render_table;

const DEFAULT_OUT: &str = "crates/html/src/entities/table.rs";

fn main() -> Result<()> {
    let matches = clap::Command::new("gen_entities")
        .about("Regenerate the named character reference table from entities.json")
        .arg(
            clap::Arg::new("input")
                .help("Path to a copy of https://html.spec.whatwg.org/entities.json")
                .required(true)
                .index(1),
        )
        .arg(
            clap::Arg::new("out")
                .help("Table module to write")
                .long("out")
                .short('o')
                .default_value(DEFAULT_OUT),
        )
        .arg(
            clap::Arg::new("check")
                .help("Fail if the table on disk differs instead of writing it")
                .long("check")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    let input = matches
        .get_one::<String>("input")
        .map(PathBuf::from)
        .context("missing input path")?;
    let out = matches
        .get_one::<String>("out")
        .map_or_else(|| PathBuf::from(DEFAULT_OUT), PathBuf::from);

    let json = fs::read_to_string(&input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    let table = render_table(&json)?;

    if matches.get_flag("check") {
        let current = fs::read_to_string(&out)
            .with_context(|| format!("failed to read {}", out.display()))?;
        if current != table {
            bail!("{} is out of date; rerun without --check", out.display());
        }
        println!("{} is up to date", out.display());
        return Ok(());
    }

    fs::write(&out, table).with_context(|| format!("failed to write {}", out.display()))?;
    println!("wrote {}", out.display());
    Ok(())
}
