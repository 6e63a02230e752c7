//! Library integration tests.

use devrig::DevrigError;

#[test]
fn error_types_are_public() {
    let err = DevrigError::PreconditionFailed {
        message: "jq missing".into(),
    };
    assert!(err.to_string().contains("jq missing"));
    assert_eq!(err.exit_code(), 2);
}

#[test]
fn result_type_alias_is_public() {
    fn test_fn() -> devrig::Result<()> {
        Ok(())
    }
    assert!(test_fn().is_ok());
}

#[test]
fn cli_types_are_public() {
    use clap::Parser;
    use devrig::cli::{Cli, Commands};

    let cli = Cli::parse_from(["devrig", "report", "--json"]);

    if let Some(Commands::Report(args)) = cli.command {
        assert!(args.json);
    } else {
        panic!("Expected Report command");
    }
}
