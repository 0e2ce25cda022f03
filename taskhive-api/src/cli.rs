/// Command-line interface
///
/// With no subcommand the binary serves the API. `issue-licenses` mints
/// signup licenses and prints one key per line, for operators handing out
/// accounts.

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "taskhive-api")]
#[command(version, about = "TaskHive API server", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Serve the HTTP API (default)
    Serve,

    /// Mint unused signup licenses and print their keys
    IssueLicenses {
        /// Number of licenses to mint
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..=1000))]
        count: u32,
    },
}

impl Cli {
    /// The subcommand to run, `Serve` when none was given
    pub fn command(&self) -> &Command {
        self.command.as_ref().unwrap_or(&Command::Serve)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_serves() {
        let cli = Cli::try_parse_from(["taskhive-api"]).unwrap();
        assert_eq!(cli.command(), &Command::Serve);
    }

    #[test]
    fn test_issue_licenses_count() {
        let cli = Cli::try_parse_from(["taskhive-api", "issue-licenses", "--count", "3"]).unwrap();
        assert_eq!(cli.command(), &Command::IssueLicenses { count: 3 });

        let cli = Cli::try_parse_from(["taskhive-api", "issue-licenses"]).unwrap();
        assert_eq!(cli.command(), &Command::IssueLicenses { count: 1 });
    }

    #[test]
    fn test_issue_licenses_rejects_zero() {
        assert!(Cli::try_parse_from(["taskhive-api", "issue-licenses", "--count", "0"]).is_err());
    }
}
