// build.rs

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

fn flag(long: &'static str, help: &'static str) -> Arg {
    Arg::new(long)
        .long(long)
        .action(ArgAction::SetTrue)
        .help(help)
}

fn build_cli() -> Command {
    Command::new("devboot")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Devboot Contributors")
        .about("Bootstrap a developer environment through the system package managers")
        .subcommand_required(true)
        .arg(
            Arg::new("home")
                .long("home")
                .value_name("DIR")
                .global(true)
                .help("devboot home directory (default: $DEVBOOT_HOME or ~/.devboot)"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("FILE")
                .global(true)
                .help("Settings file (default: <home>/config.toml)"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::Count)
                .global(true)
                .help("Increase log output (-v info, -vv debug)"),
        )
        .subcommand(
            Command::new("init")
                .about("Create the home directory, seed migrations and a starter catalog"),
        )
        .subcommand(
            Command::new("migrate")
                .about("Apply pending schema migrations")
                .arg(flag("dry-run", "List pending migrations without applying them")),
        )
        .subcommand(
            Command::new("install")
                .about("Install apps from the catalog, dependencies first")
                .arg(Arg::new("names").num_args(0..).help("App names as declared in the catalog"))
                .arg(flag("all", "Install every app in the catalog"))
                .arg(flag("dry-run", "Check state and show what would be installed"))
                .arg(flag(
                    "auto-recover",
                    "Run the top automated recovery once and retry a failed app",
                )),
        )
        .subcommand(
            Command::new("status")
                .about("Show whether catalog apps are installed")
                .arg(Arg::new("names").num_args(0..).help("App names (all when omitted)")),
        )
        .subcommand(
            Command::new("list")
                .about("List apps recorded as installed")
                .arg(flag("json", "Print JSON instead of a table")),
        )
        .subcommand(Command::new("catalog").about("Show the apps declared in the catalog"))
        .subcommand(
            Command::new("forget")
                .about("Remove an app from the installed records (does not uninstall it)")
                .arg(Arg::new("name").required(true).help("App name")),
        )
        .subcommand(
            Command::new("diagnose")
                .about("Suggest recovery options for an error message")
                .arg(Arg::new("error").required(true).help("Error text to analyze"))
                .arg(
                    Arg::new("operation")
                        .long("operation")
                        .default_value("install")
                        .help("What was being attempted"),
                )
                .arg(Arg::new("command").long("command").help("Command that failed"))
                .arg(flag(
                    "execute",
                    "Run the highest ranked automated critical or recommended option",
                )),
        )
        .subcommand(Command::new("info").about("Show paths, settings and database state"))
        .subcommand(
            Command::new("completions")
                .about("Generate shell completion scripts")
                .arg(
                    Arg::new("shell")
                        .required(true)
                        .value_parser(["bash", "elvish", "fish", "powershell", "zsh"])
                        .help("Shell type"),
                ),
        )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let manifest_dir = match env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(e) => {
            println!("cargo:warning=CARGO_MANIFEST_DIR not set: {}", e);
            return;
        }
    };
    let man_dir = manifest_dir.join("man");

    if let Err(e) = fs::create_dir_all(&man_dir) {
        println!("cargo:warning=Failed to create man directory: {}", e);
        return;
    }

    let man = Man::new(build_cli());
    let mut buffer = Vec::new();
    if let Err(e) = man.render(&mut buffer) {
        println!("cargo:warning=Failed to render man page: {}", e);
        return;
    }

    let man_path = man_dir.join("devboot.1");
    if let Err(e) = fs::write(&man_path, buffer) {
        println!("cargo:warning=Failed to write man page: {}", e);
    }
}
