// build.rs

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

/// Same bound as MAX_JOBS in src/main.rs
const MAX_JOBS: i64 = 64;

fn build_cli() -> Command {
    Command::new("factory-status")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Factory Status Contributors")
        .about("Compare devel projects against a Factory project")
        .arg(
            Arg::new("projects")
                .num_args(0..)
                .value_name("PROJECT")
                .help("Devel projects followed by the Factory project, each PROJECT or https://API_URL/PROJECT"),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("PATH")
                .help("osc configuration file (default: $OSC_CONFIG, ~/.config/osc/oscrc or ~/.oscrc)"),
        )
        .arg(
            Arg::new("api_url")
                .long("api-url")
                .value_name("URL")
                .help("API URL used for bare project names (overrides [general] apiurl)"),
        )
        .arg(
            Arg::new("jobs")
                .short('j')
                .long("jobs")
                .value_name("N")
                .default_value("1")
                .value_parser(clap::value_parser!(u16).range(1..=MAX_JOBS))
                .help("Maximum number of concurrent history requests (1-64)"),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .action(ArgAction::SetTrue)
                .help("Do not draw the progress bar"),
        )
        .arg(
            Arg::new("format")
                .short('f')
                .long("format")
                .value_parser(["text", "json"])
                .default_value("text")
                .help("Report format"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::Count)
                .help("Increase log verbosity (-v info, -vv debug)"),
        )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // Create man directory
    let out_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap());
    let man_dir = out_dir.join("man");
    fs::create_dir_all(&man_dir).expect("Failed to create man directory");

    let cmd = build_cli();
    let man = Man::new(cmd);
    let mut buffer = Vec::new();
    man.render(&mut buffer)
        .expect("Failed to render man page");

    let man_path = man_dir.join("factory-status.1");
    fs::write(&man_path, buffer).expect("Failed to write man page");
}
