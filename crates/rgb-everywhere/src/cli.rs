//! Command line parsing.

use std::path::PathBuf;

use anyhow::{bail, Context};

/// Config file read when `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = "rgbeverywhereconf.json";

/// Usage text for `--help`.
pub const USAGE: &str = "\
Stream the dominant colors of the screen to an RGB lighting controller.

Usage: rgb-everywhere [OPTIONS]

Options:
  -c, --config <PATH>  Configuration file (.json, or YAML otherwise) [default: rgbeverywhereconf.json]
  -v, --verbose        Log every extracted palette
  -h, --help           Print help

Type `exit` or `quit` and press enter to stop.";

/// Parsed command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliArgs {
    /// Config file path
    pub config: PathBuf,
    /// Overrides the config's `verbose` flag when set
    pub verbose: bool,
    /// Print usage and exit
    pub help: bool,
}

impl Default for CliArgs {
    fn default() -> Self {
        Self {
            config: PathBuf::from(DEFAULT_CONFIG_PATH),
            verbose: false,
            help: false,
        }
    }
}

impl CliArgs {
    /// Parse arguments, excluding the program name.
    pub fn parse<I, S>(args: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut parsed = Self::default();
        let mut args = args.into_iter().map(Into::into);

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-h" | "--help" => parsed.help = true,
                "-v" | "--verbose" => parsed.verbose = true,
                "-c" | "--config" => {
                    let path = args
                        .next()
                        .with_context(|| format!("{arg} requires a path"))?;
                    parsed.config = PathBuf::from(path);
                }
                other => match other.strip_prefix("--config=") {
                    Some(path) if !path.is_empty() => parsed.config = PathBuf::from(path),
                    _ => bail!("unrecognized argument '{other}'\n\n{USAGE}"),
                },
            }
        }

        Ok(parsed)
    }

    /// Parse the process arguments.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::parse(std::env::args().skip(1))
    }
}
