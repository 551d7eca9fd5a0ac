use rayon::prelude::*;
use scfile::{config, ConvertError, Format, Settings};

use std::{
    env,
    path::{Path, PathBuf},
    process,
};

fn convert_all(sources: &[PathBuf], output: Option<&Path>, format: Format, settings: &Settings) -> usize {
    let results: Vec<(&PathBuf, Result<PathBuf, ConvertError>)> = sources
        .par_iter()
        .map(|source| {
            log::info!("Converting {} to {}", source.display(), format);
            (source, scfile::convert_file(source, output, format, settings))
        })
        .collect();

    let mut failures = 0;
    for (source, result) in results {
        match result {
            Ok(dest) => println!("\t{} -> {}", source.display(), dest.display()),
            Err(err) => {
                eprintln!("Error: {}: {}", source.display(), err);
                failures += 1;
            }
        }
    }
    failures
}

fn main() {
    env_logger::init();

    let args: Vec<_> = env::args().collect();
    let mut options = getopts::Options::new();
    options
        .optopt("o", "output", "output path, single source only", "PATH")
        .optopt("f", "format", "output format: ms3d, obj or ron", "FORMAT")
        .optopt("c", "config", "settings file", "PATH")
        .optflag("h", "help", "print this help menu");

    let matches = match options.parse(&args[1..]) {
        Ok(matches) => matches,
        Err(err) => {
            eprintln!("Error: {}", err);
            process::exit(1);
        }
    };
    if matches.opt_present("h") || matches.free.is_empty() {
        println!("MCSA model converter");
        let brief = format!("Usage: {} [options] <source>...", args[0]);
        println!("{}", options.usage(&brief));
        return;
    }

    let config_path = matches
        .opt_str("c")
        .unwrap_or_else(|| config::DEFAULT_PATH.to_string());
    let settings = match Settings::load_or_default(Path::new(&config_path)) {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("Error: {}", err);
            process::exit(1);
        }
    };
    let format = match matches.opt_str("f").map(|name| name.parse::<Format>()) {
        None => settings.format,
        Some(Ok(format)) => format,
        Some(Err(err)) => {
            eprintln!("Error: {}", err);
            process::exit(1);
        }
    };

    let sources: Vec<PathBuf> = matches.free.iter().map(PathBuf::from).collect();
    let output = matches.opt_str("o").map(PathBuf::from);
    if output.is_some() && sources.len() > 1 {
        eprintln!("Error: --output needs exactly one source");
        process::exit(1);
    }

    if settings.threads != 0 {
        if let Err(err) = rayon::ThreadPoolBuilder::new()
            .num_threads(settings.threads)
            .build_global()
        {
            log::warn!("Unable to configure {} threads: {}", settings.threads, err);
        }
    }

    let failures = convert_all(&sources, output.as_deref(), format, &settings);
    if failures != 0 {
        process::exit(1);
    }
}
