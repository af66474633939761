use std::path::PathBuf;

use anyhow::Context;

/// srv, a little directory-serving HTTP server.
#[derive(Debug, clap::Parser)]
#[command(version)]
pub struct Cli {
    /// The port the server should listen on.
    pub port: u16,
    /// The directory to serve (default: $PWD).
    pub directory: Option<PathBuf>,
}

impl Cli {
    /// The directory to serve: the one given on the command line, falling
    /// back to the shell's $PWD.
    pub fn root_dir(&self) -> anyhow::Result<PathBuf> {
        match &self.directory {
            Some(dir) => Ok(dir.clone()),
            None => std::env::var("PWD")
                .map(PathBuf::from)
                .context("PWD is not set, cannot infer directory"),
        }
    }
}

#[cfg(test)]
mod test {
    use clap::{CommandFactory, Parser};
    use rstest::rstest;

    use super::*;

    #[test]
    fn the_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn a_port_alone_is_enough() {
        let cli = Cli::try_parse_from(["srv", "8080"]).unwrap();
        assert_eq!(cli.port, 8080);
        assert_eq!(cli.directory, None);
    }

    #[test]
    fn a_directory_may_be_given() {
        let cli = Cli::try_parse_from(["srv", "8080", "/var/www"]).unwrap();
        assert_eq!(cli.directory, Some(PathBuf::from("/var/www")));
    }

    #[rstest]
    #[case::no_arguments(&["srv"])]
    #[case::too_many_arguments(&["srv", "8080", "/var/www", "extra"])]
    #[case::unparseable_port(&["srv", "eighty"])]
    fn bad_invocations_are_refused(#[case] argv: &[&str]) {
        assert!(Cli::try_parse_from(argv.iter().copied()).is_err());
    }

    #[test]
    fn an_explicit_directory_wins_over_pwd() {
        let cli = Cli::try_parse_from(["srv", "8080", "/var/www"]).unwrap();
        assert_eq!(cli.root_dir().unwrap(), PathBuf::from("/var/www"));
    }

    #[test]
    fn pwd_is_the_fallback() {
        // Process-global state: put it back before asserting anything.
        let saved = std::env::var_os("PWD");
        std::env::set_var("PWD", "/somewhere/else");
        let cli = Cli::try_parse_from(["srv", "8080"]).unwrap();
        let root = cli.root_dir();
        match saved {
            Some(pwd) => std::env::set_var("PWD", pwd),
            None => std::env::remove_var("PWD"),
        }
        assert_eq!(root.unwrap(), PathBuf::from("/somewhere/else"));
    }
}
