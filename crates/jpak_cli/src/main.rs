use anyhow::{Context, Result};
use clap::Parser;
use std::io;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

use jpak_core::{
    consts::STDIN_STEM,
    files::{load_dictionary, pack_file, pack_reader, unpack_file, PackPaths},
    LoadedDictionary,
};

/// Packs `FILE` into `<stem>.bj` + `<stem>.dict`, or with -b/-d/-o unpacks
/// a binary and its dictionary back to JSON lines.
#[derive(Parser)]
#[command(name = "jpak", version, about = "Pack flat JSON records into a binary file and key dictionary")]
struct Cli {
    /// JSON records to pack (stdin when omitted)
    #[arg(value_name = "FILE", conflicts_with_all = ["binary", "dict", "output"])]
    input: Option<PathBuf>,

    /// packed binary to decode back to json
    #[arg(short = 'b', value_name = "FILE", requires_all = ["dict", "output"])]
    binary: Option<PathBuf>,

    /// string dictionary
    #[arg(short = 'd', value_name = "FILE", requires_all = ["binary", "output"])]
    dict: Option<PathBuf>,

    /// destination of decoded json
    #[arg(short = 'o', value_name = "FILE", requires_all = ["binary", "dict"])]
    output: Option<PathBuf>,

    /// print the loaded dictionary while unpacking
    #[arg(short = 'g', requires = "binary")]
    debug: bool,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn print_dictionary(path: &Path, dict: &LoadedDictionary) {
    println!("--- {} ---", path.display());
    for (id, name) in dict.entries_by_id() {
        println!("\"{}\": {id}", String::from_utf8_lossy(name));
    }
}

fn pack_cmd(input: Option<&Path>) -> Result<()> {
    let stats = match input {
        Some(path) => {
            let (_, stats) = pack_file(path).with_context(|| format!("pack {}", path.display()))?;
            stats
        }
        None => {
            println!("No input file specified, using stdin");
            let paths = PackPaths::beside(Path::new(STDIN_STEM));
            pack_reader(io::stdin().lock(), &paths).context("pack stdin")?
        }
    };
    info!(records = stats.records, fields = stats.fields, keys = stats.keys, bytes = stats.bytes, "done");
    Ok(())
}

fn unpack_cmd(binary: &Path, dict_path: &Path, output: &Path, debug: bool) -> Result<()> {
    let dict = load_dictionary(dict_path)
        .with_context(|| format!("load dictionary {}", dict_path.display()))?;
    if debug {
        print_dictionary(dict_path, &dict);
    }
    let stats = unpack_file(binary, &dict, output)
        .with_context(|| format!("unpack {}", binary.display()))?;
    info!(records = stats.records, fields = stats.fields, "done");
    Ok(())
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match (&cli.binary, &cli.dict, &cli.output) {
        (Some(bin), Some(dict), Some(out)) => unpack_cmd(bin, dict, out, cli.debug),
        _ => pack_cmd(cli.input.as_deref()),
    }
}
