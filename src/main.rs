//! CLI entry point: `fatmod IMAGE OPTION [ARGS...]`.
//!
//! Argument parsing mirrors the teacher's own `clap` usage (`Command`/`Arg`
//! builder calls, not `#[derive(Parser)]`) even though the shape here —
//! getopts-style single-letter flags, several of them taking positional values
//! of their own — is unlike the teacher's named `--source`/`--target` flags.

use std::io::stdout;
use std::process::ExitCode;

use clap::{Arg, ArgAction, ArgGroup, Command};
use fatmod::{FatError, ImageFile, Volume};

fn cli() -> Command {
    Command::new("fatmod")
        .about("Inspect and mutate a FAT32 filesystem image without mounting it")
        .arg(Arg::new("image").required(true).index(1))
        .arg(Arg::new("list").short('l').action(ArgAction::SetTrue))
        .arg(Arg::new("read").short('r').action(ArgAction::SetTrue))
        .arg(
            Arg::new("ascii")
                .short('a')
                .value_name("NAME")
                .requires("read"),
        )
        .arg(
            Arg::new("binary")
                .short('b')
                .value_name("NAME")
                .requires("read"),
        )
        .arg(Arg::new("create").short('c').value_name("NAME"))
        .arg(Arg::new("delete").short('d').value_name("NAME"))
        .arg(
            Arg::new("write")
                .short('w')
                .value_names(["NAME", "OFFSET", "N", "DATA"])
                .num_args(4),
        )
        .group(
            ArgGroup::new("operation")
                .args(["list", "ascii", "binary", "create", "delete", "write"])
                .required(true),
        )
}

fn main() -> ExitCode {
    env_logger::init();

    let matches = match cli().try_get_matches() {
        Ok(m) => m,
        Err(e) => {
            if e.exit_code() == 0 {
                print!("{e}");
                return ExitCode::SUCCESS;
            }
            eprint!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let image_path = matches.get_one::<String>("image").expect("required");

    let device = match ImageFile::open(image_path) {
        Ok(d) => d,
        Err(e) => {
            log::error!("failed to open {image_path}: {e}");
            println!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let mut volume = match Volume::open(device) {
        Ok(v) => v,
        Err(e) => {
            log::error!("failed to open volume: {e}");
            println!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let result = run(&mut volume, &matches);

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if e.is_fatal() => {
            log::error!("{e}");
            println!("{e}");
            ExitCode::FAILURE
        }
        Err(e) => {
            log::error!("{e}");
            println!("{e}");
            ExitCode::SUCCESS
        }
    }
}

fn run(volume: &mut Volume<ImageFile>, matches: &clap::ArgMatches) -> fatmod::Result<()> {
    if matches.get_flag("list") {
        return list(volume);
    }
    if let Some(name) = matches.get_one::<String>("ascii") {
        return volume.read_ascii(name, &mut stdout());
    }
    if let Some(name) = matches.get_one::<String>("binary") {
        return volume.read_hex(name, &mut stdout());
    }
    if let Some(name) = matches.get_one::<String>("create") {
        volume.create(name)?;
        println!("File created: {name}");
        return Ok(());
    }
    if let Some(name) = matches.get_one::<String>("delete") {
        volume.delete(name)?;
        println!("File deleted: {name}");
        return Ok(());
    }
    if let Some(values) = matches.get_many::<String>("write") {
        let values: Vec<&String> = values.collect();
        let name = values[0];
        let offset = parse_u32(values[1])?;
        let n = parse_u32(values[2])?;
        let data = parse_u32(values[3])? as u8;
        volume.write_pattern(name, offset, n, data)?;
        println!("Data written to file: {name}");
        return Ok(());
    }
    Err(FatError::ArgError)
}

fn list(volume: &mut Volume<ImageFile>) -> fatmod::Result<()> {
    let bpb = volume.bpb();
    println!("Sector Size: {}", bpb.bytes_per_sector);
    println!("Sectors per Cluster: {}", bpb.sectors_per_cluster);
    println!("Reserved Sector Count: {}", bpb.reserved_sector_count);
    println!("Number of FATs: {}", bpb.num_fats);
    println!("Total Sectors: {}", bpb.total_sectors_32);
    println!("Sectors per FAT: {}", bpb.sectors_per_fat_32);
    println!("Root Cluster: {}", bpb.root_cluster);
    for line in volume.list()? {
        println!("{line}");
    }
    Ok(())
}

fn parse_u32(s: &str) -> fatmod::Result<u32> {
    s.parse().map_err(|_| FatError::ArgError)
}
