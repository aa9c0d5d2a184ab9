use clap::{Arg, ArgAction, ArgMatches, Command};
use log::LevelFilter;
use std::ffi::OsString;
use std::path::PathBuf;

/// Raw command-line flags, before merging with the config file and environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliArgs {
    pub paths: Vec<PathBuf>,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub token_usage: bool,
    pub json: bool,
    pub stream: bool,
    pub recursive: bool,
    pub verbosity: u8,
    pub quiet: bool,
}

impl CliArgs {
    pub fn log_level(&self) -> LevelFilter {
        if self.quiet {
            return LevelFilter::Error;
        }
        match self.verbosity {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }

    fn from_matches(matches: &ArgMatches) -> Self {
        Self {
            paths: matches
                .get_many::<String>("paths")
                .map(|vals| vals.map(PathBuf::from).collect())
                .unwrap_or_default(),
            api_key: matches.get_one::<String>("api-key").cloned(),
            model: matches.get_one::<String>("model").cloned(),
            output_dir: matches.get_one::<String>("output-dir").map(PathBuf::from),
            token_usage: matches.get_flag("token-usage"),
            json: matches.get_flag("json"),
            stream: matches.get_flag("stream"),
            recursive: matches.get_flag("recursive"),
            verbosity: matches.get_count("verbose"),
            quiet: matches.get_flag("quiet"),
        }
    }
}

pub fn command() -> Command {
    Command::new("readcraft")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Generates README files for source code using the Groq chat-completion API")
        .arg(
            Arg::new("paths")
                .value_name("FILES_OR_DIRECTORY")
                .help("One or more input files or directories to generate READMEs for")
                .num_args(1..)
                .required_unless_present("token-usage"),
        )
        .arg(
            Arg::new("api-key")
                .short('a')
                .long("api-key")
                .value_name("KEY")
                .help("API key for Groq (falls back to the config file, then GROQ_API_KEY)")
                .num_args(1),
        )
        .arg(
            Arg::new("model")
                .short('m')
                .long("model")
                .value_name("MODEL")
                .help("Model to use for generation")
                .num_args(1),
        )
        .arg(
            Arg::new("output-dir")
                .short('o')
                .long("output-dir")
                .value_name("DIR")
                .help("Directory for generated README files (prints to stdout when omitted)")
                .num_args(1),
        )
        .arg(
            Arg::new("token-usage")
                .short('t')
                .long("token-usage")
                .help("Print the token usage reported by the API")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("Output results in JSON format")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("stream")
                .short('s')
                .long("stream")
                .help("Stream responses in real time")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("recursive")
                .short('r')
                .long("recursive")
                .help("Descend into subdirectories of directory arguments")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Increase log verbosity (-v debug, -vv trace)")
                .action(ArgAction::Count),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .help("Only log errors")
                .action(ArgAction::SetTrue)
                .conflicts_with("verbose"),
        )
}

pub fn parse_args() -> CliArgs {
    CliArgs::from_matches(&command().get_matches())
}

pub fn try_parse_from<I, T>(args: I) -> Result<CliArgs, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    command()
        .try_get_matches_from(args)
        .map(|matches| CliArgs::from_matches(&matches))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_flag() {
        let args = try_parse_from([
            "readcraft", "-a", "key", "-m", "llama3", "-o", "out", "-t", "--json", "-s", "-r",
            "-vv", "a.py", "src",
        ])
        .unwrap();

        assert_eq!(args.api_key.as_deref(), Some("key"));
        assert_eq!(args.model.as_deref(), Some("llama3"));
        assert_eq!(args.output_dir, Some(PathBuf::from("out")));
        assert!(args.token_usage && args.json && args.stream && args.recursive);
        assert_eq!(args.paths, vec![PathBuf::from("a.py"), PathBuf::from("src")]);
        assert_eq!(args.log_level(), LevelFilter::Trace);
    }

    #[test]
    fn paths_are_required_unless_probing_usage() {
        assert!(try_parse_from(["readcraft"]).is_err());

        let args = try_parse_from(["readcraft", "--token-usage"]).unwrap();
        assert!(args.paths.is_empty());
        assert_eq!(args.log_level(), LevelFilter::Info);
    }

    #[test]
    fn quiet_lowers_log_level() {
        let args = try_parse_from(["readcraft", "-q", "a.py"]).unwrap();
        assert_eq!(args.log_level(), LevelFilter::Error);
        assert!(try_parse_from(["readcraft", "-q", "-v", "a.py"]).is_err());
    }
}
