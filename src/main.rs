//! init-keyboard - configure a newly attached keyboard
//!
//! Invoked by the keyboard hotplug handler as:
//!
//!   init-keyboard [OPTIONS] <keyboard-name> <device-node> <xinput-id> <vendor>:<product>
//!
//! Sets the layout of the device with setxkbmap and the session's key
//! repeat rate with xset. Exits 0 if both succeed, 1 otherwise.

use std::ffi::OsString;
use std::io::Write;
use std::path::PathBuf;
use std::process;

use anyhow::Result;
use clap::error::ErrorKind;
use clap::Parser;

use init_keyboard::lock::InvocationLock;
use init_keyboard::{initialize, CommandRunner, Config, DryRunner, KeyboardArgs, SystemRunner};

/// Number of trailing keyboard arguments passed by the hotplug handler
const KEYBOARD_ARGS: usize = 4;

#[derive(Debug, Parser)]
#[command(name = "init-keyboard")]
#[command(author = "RavenLinux Team")]
#[command(version)]
#[command(about = "Apply keyboard layout and repeat rate to a newly attached keyboard", long_about = None)]
struct Cli {
    /// Keyboard display name
    keyboard_name: String,

    /// Device node, e.g. /dev/input/event5
    device_node: String,

    /// xinput device id
    xinput_id: String,

    /// USB vendor:product id, e.g. 1d50:6122
    vendor_product: String,

    /// Read configuration from this file instead of the default locations
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Print the commands instead of running them
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// Don't wait for other running invocations
    #[arg(long)]
    no_lock: bool,

    /// Enable debug output
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = match Cli::try_parse_from(keyboard_argv(std::env::args_os())) {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            process::exit(parse_failure_code(&e));
        }
    };

    init_logging(cli.verbose);

    let result = run(cli);
    if let Err(e) = &result {
        log::error!("{:#}", e);
    }
    process::exit(exit_code(&result));
}

/// Options go first; the last four arguments are always the keyboard
/// description, passed through verbatim even when they start with `-`.
///
/// Inserts `--` ahead of them unless the caller already separated them.
fn keyboard_argv<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut argv: Vec<OsString> = args.into_iter().map(Into::into).collect();
    if argv.len() <= KEYBOARD_ARGS {
        return argv;
    }

    let split = argv.len() - KEYBOARD_ARGS;
    if !argv[1..split].iter().any(|arg| arg == "--") {
        argv.insert(split, OsString::from("--"));
    }
    argv
}

/// Exit status for a command line clap refused.
///
/// The hotplug handler only understands 0 and 1, so usage errors exit 1
/// instead of clap's 2.
fn parse_failure_code(e: &clap::Error) -> i32 {
    match e.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
        _ => 1,
    }
}

fn exit_code(result: &Result<()>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(_) => 1,
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format(|buf, record| {
            writeln!(buf, "[init-keyboard] {}: {}", record.level(), record.args())
        })
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load(),
    };

    let _lock = if config.serialize && !cli.no_lock && !cli.dry_run {
        InvocationLock::acquire_or_warn(&config.lock_path())
    } else {
        None
    };

    let keyboard = KeyboardArgs::new(
        cli.keyboard_name,
        cli.device_node,
        cli.xinput_id,
        cli.vendor_product,
    );

    let runner: Box<dyn CommandRunner> = if cli.dry_run {
        Box::new(DryRunner)
    } else {
        Box::new(SystemRunner)
    };

    initialize(&keyboard, &config, runner.as_ref())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use init_keyboard::error::{InitError, RunError};

    fn parse(args: &[&str]) -> std::result::Result<Cli, clap::Error> {
        Cli::try_parse_from(keyboard_argv(args.iter().copied()))
    }

    #[test]
    fn test_parse_hotplug_arguments() {
        let cli = parse(&["init-keyboard", "UHK60", "/dev/input/event5", "12", "1d50:6122"]).unwrap();
        assert_eq!(cli.keyboard_name, "UHK60");
        assert_eq!(cli.device_node, "/dev/input/event5");
        assert_eq!(cli.xinput_id, "12");
        assert_eq!(cli.vendor_product, "1d50:6122");
        assert!(!cli.dry_run);
    }

    #[test]
    fn test_hyphen_leading_arguments_are_verbatim() {
        let cli = parse(&["init-keyboard", "kbd", "/dev/input/event1", "-5", "046d:c31c"]).unwrap();
        assert_eq!(cli.xinput_id, "-5");

        let cli = parse(&["init-keyboard", "-n", "/dev/input/event1", "7", "046d:c31c"]).unwrap();
        assert_eq!(cli.keyboard_name, "-n");
        assert!(!cli.dry_run);

        let cli = parse(&["init-keyboard", "--verbose", "-v", "--dry-run", "-device"]).unwrap();
        assert_eq!(cli.keyboard_name, "--verbose");
        assert_eq!(cli.device_node, "-v");
        assert_eq!(cli.xinput_id, "--dry-run");
        assert_eq!(cli.vendor_product, "-device");
        assert!(!cli.verbose);
        assert!(!cli.dry_run);
    }

    #[test]
    fn test_options_before_keyboard_arguments() {
        let cli = parse(&[
            "init-keyboard",
            "-n",
            "--no-lock",
            "-c",
            "/tmp/kbd.toml",
            "Generic104",
            "/dev/input/event3",
            "7",
            "046d:c31c",
        ])
        .unwrap();
        assert!(cli.dry_run);
        assert!(cli.no_lock);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/kbd.toml")));
        assert_eq!(cli.keyboard_name, "Generic104");

        // An explicit separator is left alone
        let cli = parse(&["init-keyboard", "-v", "--", "-x", "/dev/input/event3", "7", "046d:c31c"])
            .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.keyboard_name, "-x");
    }

    #[test]
    fn test_missing_arguments_exit_1() {
        let err = parse(&["init-keyboard", "kbd", "/dev/input/event1", "7"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
        assert_eq!(parse_failure_code(&err), 1);

        let err = parse(&["init-keyboard"]).unwrap_err();
        assert_eq!(parse_failure_code(&err), 1);
    }

    #[test]
    fn test_too_many_arguments_exit_1() {
        let err = parse(&["init-keyboard", "a", "b", "c", "d", "e"]).unwrap_err();
        assert_eq!(parse_failure_code(&err), 1);
    }

    #[test]
    fn test_help_and_version_exit_0() {
        let err = parse(&["init-keyboard", "--help"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayHelp);
        assert_eq!(parse_failure_code(&err), 0);

        let err = parse(&["init-keyboard", "--version"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayVersion);
        assert_eq!(parse_failure_code(&err), 0);
    }

    #[test]
    fn test_exit_code() {
        assert_eq!(exit_code(&Ok(())), 0);

        let failed = InitError::ConfigurationFailed(vec![RunError::Status {
            program: "xset".to_string(),
            status: "exit status: 1".to_string(),
        }]);
        assert_eq!(exit_code(&Err(failed.into())), 1);
    }

    #[test]
    fn test_unreadable_explicit_config_exits_1() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.toml");
        let cli = parse(&[
            "init-keyboard",
            "-n",
            "-c",
            missing.to_str().unwrap(),
            "kbd",
            "/dev/input/event1",
            "7",
            "046d:c31c",
        ])
        .unwrap();
        assert_eq!(exit_code(&run(cli)), 1);
    }

    #[test]
    fn test_dry_run_exits_0() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("config.toml");
        std::fs::write(&config, "serialize = false\n").unwrap();
        let cli = parse(&[
            "init-keyboard",
            "--dry-run",
            "--config",
            config.to_str().unwrap(),
            "UHK60",
            "/dev/input/event5",
            "12",
            "1d50:6122",
        ])
        .unwrap();
        assert_eq!(exit_code(&run(cli)), 0);
    }
}
