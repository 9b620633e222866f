//! Tests for command-line argument parsing
//!
//! Note: These tests verify the argument parser configuration by creating
//! a test parser with the same structure as the main application.

use clap::{value_parser, Arg, ArgAction, Command as ClapCommand};

/// Create a command with the same argument structure as the main binary
fn create_test_command() -> ClapCommand {
    ClapCommand::new("face-tracking")
        .version("0.1.0")
        .about("Face tracking head control")
        .arg(
            Arg::new("config")
                .short('C')
                .long("config")
                .value_name("PATH")
                .help("Configuration file path"),
        )
        .arg(
            Arg::new("debug")
                .short('d')
                .long("debug")
                .action(ArgAction::SetTrue)
                .help("Enable debug output"),
        )
        .arg(
            Arg::new("duration")
                .long("duration")
                .value_name("SECONDS")
                .value_parser(value_parser!(f64))
                .help("Stop after this many seconds"),
        )
        .arg(
            Arg::new("print-config")
                .long("print-config")
                .action(ArgAction::SetTrue)
                .help("Print an example configuration and exit"),
        )
        .arg(
            Arg::new("seed")
                .long("seed")
                .value_parser(value_parser!(u64))
                .help("Seed for the simulation"),
        )
        .arg(
            Arg::new("no-idle-motion")
                .long("no-idle-motion")
                .action(ArgAction::SetTrue)
                .help("Keep the head still when nobody is there"),
        )
        .arg(
            Arg::new("width")
                .long("width")
                .value_parser(value_parser!(u32))
                .default_value("640")
                .help("Camera frame width"),
        )
        .arg(
            Arg::new("height")
                .long("height")
                .value_parser(value_parser!(u32))
                .default_value("480")
                .help("Camera frame height"),
        )
}

#[test]
fn test_help_argument() {
    let cmd = create_test_command();
    let result = cmd.try_get_matches_from(vec!["face-tracking", "--help"]);

    assert!(result.is_err());
    assert_eq!(result.unwrap_err().kind(), clap::error::ErrorKind::DisplayHelp);
}

#[test]
fn test_no_arguments() {
    let cmd = create_test_command();
    let matches = cmd.try_get_matches_from(vec!["face-tracking"]).unwrap();

    assert!(!matches.get_flag("debug"));
    assert!(!matches.get_flag("no-idle-motion"));
    assert!(matches.get_one::<f64>("duration").is_none());
    assert_eq!(matches.get_one::<u32>("width"), Some(&640));
    assert_eq!(matches.get_one::<u32>("height"), Some(&480));
}

#[test]
fn test_duration_and_seed() {
    let cmd = create_test_command();
    let matches = cmd
        .try_get_matches_from(vec!["face-tracking", "--duration", "2.5", "--seed", "42"])
        .unwrap();

    assert_eq!(matches.get_one::<f64>("duration"), Some(&2.5));
    assert_eq!(matches.get_one::<u64>("seed"), Some(&42));
}

#[test]
fn test_invalid_numbers_rejected() {
    for args in [
        vec!["face-tracking", "--duration", "soon"],
        vec!["face-tracking", "--seed", "-1"],
        vec!["face-tracking", "--width", "wide"],
    ] {
        let cmd = create_test_command();
        assert!(cmd.try_get_matches_from(args.clone()).is_err(), "Should reject: {:?}", args);
    }
}

#[test]
fn test_config_short_flag() {
    let cmd = create_test_command();
    let matches = cmd
        .try_get_matches_from(vec!["face-tracking", "-C", "tracking.yaml", "-d"])
        .unwrap();

    assert_eq!(
        matches.get_one::<String>("config").map(|s| s.as_str()),
        Some("tracking.yaml")
    );
    assert!(matches.get_flag("debug"));
}
