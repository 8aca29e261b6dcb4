//! Command-line surface of `gaudirun`

use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::ffi::OsString;
use std::path::PathBuf;

/// Application type created when `--application` is not given
pub const DEFAULT_APPLICATION: &str = "Gaudi::Application";

/// Parsed command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    /// Option files, scripts, dumps and `module:function` tokens
    pub sources: Vec<String>,
    /// Stop after configuration
    pub dry_run: bool,
    /// Print the configuration
    pub verbose: bool,
    /// Debug logging
    pub debug: bool,
    /// Print and dump properties equal to their defaults too
    pub all_opts: bool,
    /// Print in options syntax instead of the nested form
    pub old_opts: bool,
    /// Dump target; the extension picks the format
    pub output: Option<PathBuf>,
    /// Deprecated spelling of `output`
    pub pickle_output: Option<PathBuf>,
    /// Statements run before the ConfigurableUser apply
    pub options: Vec<String>,
    /// Statements run after the ConfigurableUser apply
    pub post_options: Vec<String>,
    /// Application type handed to the runtime
    pub application: String,
    /// Re-run from a temporary options file
    pub use_temp_opts: bool,
    /// Leave ConfigurableUsers unapplied
    pub no_conf_user_apply: bool,
    /// Print the algorithm sequence
    pub print_sequence: bool,
    /// Component databases to register
    pub types: Vec<PathBuf>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            sources: Vec::new(),
            dry_run: false,
            verbose: false,
            debug: false,
            all_opts: false,
            old_opts: false,
            output: None,
            pickle_output: None,
            options: Vec::new(),
            post_options: Vec::new(),
            application: DEFAULT_APPLICATION.to_string(),
            use_temp_opts: false,
            no_conf_user_apply: false,
            print_sequence: false,
            types: Vec::new(),
        }
    }
}

fn flag(id: &'static str, help: &'static str) -> Arg {
    Arg::new(id).long(id).action(ArgAction::SetTrue).help(help)
}

/// The `gaudirun` command definition
#[must_use]
pub fn command() -> Command {
    Command::new("gaudirun")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Read job options, apply the configuration and run the application")
        .arg(
            Arg::new("sources")
                .value_name("SOURCE")
                .action(ArgAction::Append)
                .help("options file (.opts, .py, .pkl, .json, .yaml) or module:function"),
        )
        .arg(flag("dry-run", "do not run the application, just parse option files").short('n'))
        .arg(flag("verbose", "print the parsed options").short('v'))
        .arg(flag("debug", "enable some debug print-out"))
        .arg(flag("all-opts", "print all the options, even if equal to the default"))
        .arg(flag("old-opts", "format printed options in old option files style"))
        .arg(
            Arg::new("output")
                .long("output")
                .short('o')
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .help("dump the configuration to a file; the extension selects the format"),
        )
        .arg(
            Arg::new("pickle-output")
                .long("pickle-output")
                .short('p')
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .help("DEPRECATED: use '--output file.pkl' instead"),
        )
        .arg(
            Arg::new("option")
                .long("option")
                .value_name("STATEMENT")
                .action(ArgAction::Append)
                .help("add a single options statement, run before ConfigurableUsers are applied"),
        )
        .arg(
            Arg::new("post-option")
                .long("post-option")
                .value_name("STATEMENT")
                .action(ArgAction::Append)
                .help("options statement run after ConfigurableUsers are applied"),
        )
        .arg(
            Arg::new("application")
                .long("application")
                .value_name("TYPE")
                .default_value(DEFAULT_APPLICATION)
                .help("application type to instantiate"),
        )
        .arg(flag("use-temp-opts", "run from a temporary options file"))
        .arg(flag(
            "no-conf-user-apply",
            "disable the automatic application of ConfigurableUsers",
        ))
        .arg(flag("print-sequence", "print the sequence").alias("printsequence"))
        .arg(
            Arg::new("types")
                .long("types")
                .value_name("FILE")
                .action(ArgAction::Append)
                .value_parser(value_parser!(PathBuf))
                .help("component database (.yaml, .json, .toml) to register"),
        )
}

impl RunOptions {
    /// Parse an argument list, program name first
    ///
    /// # Errors
    /// Returns the clap error for bad usage, `--help` and `--version`.
    pub fn try_parse_from<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let matches = command().try_get_matches_from(args)?;
        Ok(Self::from_matches(&matches))
    }

    fn from_matches(matches: &ArgMatches) -> Self {
        let strings = |id: &str| -> Vec<String> {
            matches
                .get_many::<String>(id)
                .map(|values| values.cloned().collect())
                .unwrap_or_default()
        };
        Self {
            sources: strings("sources"),
            dry_run: matches.get_flag("dry-run"),
            verbose: matches.get_flag("verbose"),
            debug: matches.get_flag("debug"),
            all_opts: matches.get_flag("all-opts"),
            old_opts: matches.get_flag("old-opts"),
            output: matches.get_one::<PathBuf>("output").cloned(),
            pickle_output: matches.get_one::<PathBuf>("pickle-output").cloned(),
            options: strings("option"),
            post_options: strings("post-option"),
            application: matches
                .get_one::<String>("application")
                .cloned()
                .unwrap_or_else(|| DEFAULT_APPLICATION.to_string()),
            use_temp_opts: matches.get_flag("use-temp-opts"),
            no_conf_user_apply: matches.get_flag("no-conf-user-apply"),
            print_sequence: matches.get_flag("print-sequence"),
            types: matches
                .get_many::<PathBuf>("types")
                .map(|values| values.cloned().collect())
                .unwrap_or_default(),
        }
    }

    /// Debug-level logging was asked for with `--verbose` or `--debug`
    #[inline]
    #[must_use]
    pub fn debug_logging(&self) -> bool {
        self.verbose || self.debug
    }

    /// Flags a relaunched driver inherits; sources are not included
    #[must_use]
    pub fn relaunch_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        let flags = [
            (self.dry_run, "--dry-run"),
            (self.verbose, "--verbose"),
            (self.debug, "--debug"),
            (self.all_opts, "--all-opts"),
            (self.old_opts, "--old-opts"),
            (self.print_sequence, "--print-sequence"),
        ];
        for (set, name) in flags {
            if set {
                args.push(name.to_string());
            }
        }
        if let Some(output) = &self.output {
            args.push("--output".to_string());
            args.push(output.display().to_string());
        }
        args.push("--application".to_string());
        args.push(self.application.clone());
        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_sources_and_flags() {
        let opts = RunOptions::try_parse_from([
            "gaudirun",
            "-n",
            "--option",
            "A.X = 1",
            "job.opts",
            "--option",
            "A.Y = 2",
            "extra.py",
            "-o",
            "out.pkl",
        ])
        .unwrap();
        assert_eq!(opts.sources, vec!["job.opts", "extra.py"]);
        assert_eq!(opts.options, vec!["A.X = 1", "A.Y = 2"]);
        assert!(opts.dry_run);
        assert_eq!(opts.output, Some(PathBuf::from("out.pkl")));
        assert_eq!(opts.application, DEFAULT_APPLICATION);
    }

    #[test]
    fn test_defaults() {
        let opts = RunOptions::try_parse_from(["gaudirun"]).unwrap();
        assert_eq!(opts, RunOptions::default());
    }

    #[test]
    fn test_printsequence_alias() {
        let opts = RunOptions::try_parse_from(["gaudirun", "--printsequence"]).unwrap();
        assert!(opts.print_sequence);
    }

    #[test]
    fn test_relaunch_args_keep_flags_only() {
        let opts = RunOptions::try_parse_from([
            "gaudirun",
            "--verbose",
            "--use-temp-opts",
            "--output",
            "x.py",
            "job.opts",
        ])
        .unwrap();
        assert_eq!(
            opts.relaunch_args(),
            vec!["--verbose", "--output", "x.py", "--application", DEFAULT_APPLICATION]
        );
    }

    #[test]
    fn test_debug_logging_flags() {
        let parse = |args: &[&str]| {
            RunOptions::try_parse_from(std::iter::once("gaudirun").chain(args.iter().copied()))
                .unwrap()
                .debug_logging()
        };
        assert!(!parse(&[]));
        assert!(parse(&["-v"]));
        assert!(parse(&["--debug"]));
    }

    #[test]
    fn test_command_is_consistent() {
        command().debug_assert();
    }
}
