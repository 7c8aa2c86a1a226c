//! Minimal CLI parsing for the daemons
//!
//! Both daemons take the same handful of flags; anything fancier belongs in
//! the config file.

use std::path::PathBuf;

/// Parsed command-line arguments
#[derive(Debug, Default)]
pub struct Args {
    /// Optional config file path
    pub config: Option<PathBuf>,
}

fn print_help(name: &str, version: &str, description: &str) {
    eprintln!("{name} {version} - {description}");
    eprintln!();
    eprintln!("USAGE:");
    eprintln!("    {name} [OPTIONS]");
    eprintln!();
    eprintln!("OPTIONS:");
    eprintln!("    -c, --config PATH   Config file (JSON; defaults apply without one)");
    eprintln!("    -v, --version       Print version");
    eprintln!("    -h, --help          Print this help");
    eprintln!();
    eprintln!("ENVIRONMENT:");
    eprintln!("    THERMOVEIL_LOG         Log level (trace, debug, info, warn, error)");
    eprintln!("    THERMOVEIL_MQTT_HOST   Override broker host");
    eprintln!("    THERMOVEIL_MQTT_PORT   Override broker port");
    eprintln!("    THERMOVEIL_KEY_FILE    Override envelope key file path");
    eprintln!("    THERMOVEIL_MODEL_FILE  Override anomaly model file path");
}

/// Parse `std::env::args`, exiting for `--help`/`--version` or bad usage.
pub fn parse(name: &str, version: &str, description: &str) -> Args {
    let argv: Vec<String> = std::env::args().collect();
    let mut args = Args::default();

    let mut i = 1;
    while i < argv.len() {
        match argv[i].as_str() {
            "-h" | "--help" => {
                print_help(name, version, description);
                std::process::exit(0);
            }
            "-v" | "--version" => {
                println!("{name} {version}");
                std::process::exit(0);
            }
            "-c" | "--config" => {
                i += 1;
                if i >= argv.len() {
                    eprintln!("Error: --config requires a path argument");
                    std::process::exit(1);
                }
                args.config = Some(PathBuf::from(&argv[i]));
            }
            arg => {
                eprintln!("Unknown argument: {arg}");
                print_help(name, version, description);
                std::process::exit(1);
            }
        }
        i += 1;
    }

    args
}
