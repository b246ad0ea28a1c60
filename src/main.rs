mod commands;

use clap_verbosity_flag::Verbosity;
use commands::reroot;
use rerooter::io::InternalLabels;
use std::path;
use structopt::StructOpt;

#[macro_use]
extern crate log;

#[derive(Debug, StructOpt)]
#[structopt(about = "reroot a phylogenetic tree on a named outgroup")]
struct Rerooter {
    #[structopt(flatten)]
    common: Common,
    #[structopt(short = "g", long, help = "name of the node to root the tree on")]
    outgroup: String,
    #[structopt(
        short,
        long,
        default_value = "names",
        possible_values = &["names", "support", "ignore"],
        help = "how labels of internal nodes are read and written"
    )]
    labels: InternalLabels,
    #[structopt(flatten)]
    verbose: Verbosity,
}

#[derive(Debug, StructOpt)]
pub struct Common {
    #[structopt(short, long, parse(from_os_str), help = "input tree file, stdin if missing")]
    infile: Option<path::PathBuf>,
    #[structopt(
        short,
        long,
        parse(from_os_str),
        default_value = "rooted_tree.tree",
        help = "output tree file"
    )]
    outfile: path::PathBuf,
}

/// Log level from `-v`/`-q`. Without either flag `RUST_LOG` decides, when it is set.
fn logger(verbosity: Option<log::Level>, rust_log: Option<&str>) -> env_logger::Builder {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(verbosity.map_or(log::LevelFilter::Off, |level| level.to_level_filter()));
    if let (Some(log::Level::Error), Some(filters)) = (verbosity, rust_log) {
        builder.parse_filters(filters);
    }
    builder
}

fn main() {
    let args = Rerooter::from_args();
    let rust_log = std::env::var("RUST_LOG").ok();
    logger(args.verbose.log_level(), rust_log.as_deref()).init();
    info!("starting up");
    debug!("{:?}", args);
    let start = std::time::Instant::now();

    let result = reroot::run(&args.common, &args.outgroup, args.labels);

    debug!("{} milliseconds elapsed", start.elapsed().as_millis());
    let report = reroot::report(&result);
    if report.to_stderr {
        eprintln!("{}", report.message);
    } else {
        println!("{}", report.message);
    }
    std::process::exit(report.exit_code);
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::{Level, LevelFilter};

    #[test]
    fn rust_log_without_flags() {
        assert_eq!(
            logger(Some(Level::Error), Some("info")).build().filter(),
            LevelFilter::Info
        );
        assert_eq!(
            logger(Some(Level::Error), None).build().filter(),
            LevelFilter::Error
        );
    }

    #[test]
    fn flags_win_over_rust_log() {
        assert_eq!(
            logger(Some(Level::Debug), Some("warn")).build().filter(),
            LevelFilter::Debug
        );
        assert_eq!(
            logger(None, Some("trace")).build().filter(),
            LevelFilter::Off
        );
    }
}
