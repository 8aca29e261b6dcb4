//! The `gaudirun` pipeline
//!
//! Sources are read in command-line order, then the post-config chain runs
//! (including `--option` statements), ConfigurableUsers are applied,
//! `--post-option` statements run and the catalog is frozen. The frozen
//! catalog is printed, dumped, or handed to the [`Runtime`].

use crate::cli::RunOptions;
use crate::env::{Environment, TempOptsGuard};
use crate::exit::ExitCode;
use crate::runtime::{Runtime, RuntimeError};
use anyhow::{bail, Context};
use gconf_core::{is_function_token, PostConfigAction, Session, APPLICATION_MGR};
use gconf_options::{expand_env, flat_options, DumpInput, OptsDumper, PyDumper};
use gconf_property::Source;
use indexmap::IndexMap;
use std::io::Write;
use std::path::PathBuf;

/// One driver invocation
#[derive(Debug)]
pub struct Driver<R> {
    options: RunOptions,
    environment: Environment,
    runtime: R,
}

impl<R: Runtime> Driver<R> {
    /// Driver for parsed options
    pub fn new(options: RunOptions, environment: Environment, runtime: R) -> Self {
        Self {
            options,
            environment,
            runtime,
        }
    }

    /// The runtime, for inspection after a run
    #[inline]
    pub fn runtime_mut(&mut self) -> &mut R {
        &mut self.runtime
    }

    /// Configure `session` and run the job; printed configuration goes to
    /// `out`
    ///
    /// The transient options file named by the environment is removed on
    /// every path out of this call.
    pub fn run(&mut self, session: &mut Session, out: &mut dyn Write) -> ExitCode {
        let _guard = self.environment.temp_opts.clone().map(TempOptsGuard::new);
        match self.execute(session, out) {
            Ok(code) => code,
            Err(err) => {
                if self.environment.backtrace {
                    tracing::error!("{:?}\n{}", err, std::backtrace::Backtrace::force_capture());
                } else {
                    tracing::error!("{:#}", err);
                }
                ExitCode::for_error(&err)
            }
        }
    }

    fn execute(&mut self, session: &mut Session, out: &mut dyn Write) -> anyhow::Result<ExitCode> {
        let output = self.output_path()?;

        for db in &self.options.types {
            session
                .load_component_db(db)
                .with_context(|| format!("loading component database {}", db.display()))?;
        }
        self.apply_identity(session)?;

        let mut sources = Vec::new();
        if let Some(temp) = self.environment.temp_opts.as_ref().filter(|p| p.is_file()) {
            sources.push(temp.display().to_string());
        }
        sources.extend(self.options.sources.iter().cloned());
        for source in &sources {
            load_source(session, source).with_context(|| format!("processing {source}"))?;
        }

        for statement in &self.options.options {
            session.append_post_config_action(PostConfigAction::Statement(statement.clone()));
        }
        session.run_post_config_actions()?;

        if self.options.no_conf_user_apply {
            tracing::info!("Disabling automatic apply of ConfigurableUser");
        } else {
            session.apply_configurable_users()?;
        }
        for statement in &self.options.post_options {
            tracing::debug!("{}", statement);
            session
                .apply_option(statement, Source::CommandLine)
                .with_context(|| format!("post option '{statement}'"))?;
        }
        session.freeze()?;

        if self.options.use_temp_opts {
            return self.relaunch(session);
        }
        if self.options.verbose {
            self.print_config(session, out)?;
        }
        if let Some(path) = &output {
            session.write_dump(path, self.options.all_opts)?;
            tracing::info!("configuration written to {}", path.display());
        }
        if self.options.print_sequence {
            print_sequences(session, out)?;
        }
        if self.options.dry_run {
            return Ok(ExitCode::Success);
        }
        self.start(session, output.is_some())
    }

    fn output_path(&self) -> anyhow::Result<Option<PathBuf>> {
        match (&self.options.pickle_output, &self.options.output) {
            (Some(_), Some(_)) => bail!("Conflicting options: use only --pickle-output or --output"),
            (Some(pickle), None) => {
                tracing::warn!("--pickle-output is deprecated, use --output instead");
                Ok(Some(pickle.clone()))
            }
            (None, output) => Ok(output.clone()),
        }
    }

    fn apply_identity(&self, session: &mut Session) -> anyhow::Result<()> {
        let overrides = [
            ("AppName", &self.environment.app_name),
            ("AppVersion", &self.environment.app_version),
        ];
        for (key, value) in overrides {
            if let Some(value) = value {
                session.create(APPLICATION_MGR, APPLICATION_MGR)?;
                session.set(APPLICATION_MGR, key, value.as_str())?;
            }
        }
        Ok(())
    }

    fn print_config(&self, session: &Session, out: &mut dyn Write) -> anyhow::Result<()> {
        if self.options.all_opts {
            tracing::info!("Dumping all configurables and properties");
        } else {
            tracing::info!("Dumping all configurables and properties (different from default)");
        }
        let input = DumpInput::new(session.catalog()).with_all(self.options.all_opts);
        let text = if self.options.old_opts {
            OptsDumper::render(&input)
        } else {
            PyDumper::render(&input)
        };
        out.write_all(text.as_bytes())?;
        out.flush()?;
        Ok(())
    }

    fn relaunch(&mut self, session: &Session) -> anyhow::Result<ExitCode> {
        let temp = tempfile::Builder::new()
            .prefix("gaudirun-")
            .suffix(".opts")
            .tempfile()
            .context("creating temporary options file")?
            .into_temp_path();
        session.write_dump(&temp, self.options.all_opts)?;
        let path = temp.keep().context("keeping temporary options file")?;
        let guard = TempOptsGuard::new(&path);
        let status = self.runtime.relaunch(&self.options.relaunch_args(), guard.path())?;
        Ok(ExitCode::from_status(status))
    }

    fn start(&mut self, session: &Session, wrote_output: bool) -> anyhow::Result<ExitCode> {
        let options = runtime_options(session, self.options.print_sequence);
        match self.runtime.run(&self.options.application, &options) {
            Ok(status) => Ok(ExitCode::from_status(status)),
            Err(RuntimeError::Unavailable) if wrote_output => {
                tracing::info!("no runtime available, configuration only written");
                Ok(ExitCode::Success)
            }
            Err(err) => Err(err).with_context(|| format!("starting {}", self.options.application)),
        }
    }
}

fn load_source(session: &mut Session, source: &str) -> anyhow::Result<()> {
    if is_function_token(source) {
        let names = session.run_function(source)?;
        tracing::debug!("{} returned {}", source, names.join(", "));
    } else {
        session.import_options(source)?;
    }
    Ok(())
}

fn print_sequences(session: &Session, out: &mut dyn Write) -> anyhow::Result<()> {
    let Ok(top) = session.value(APPLICATION_MGR, "TopAlg") else {
        return Ok(());
    };
    for entry in top.elements().unwrap_or_default() {
        if let Some(name) = entry.as_str() {
            out.write_all(gconf_flow::print_sequence(session.catalog(), name)?.as_bytes())?;
        }
    }
    Ok(())
}

/// Options map handed to the runtime
///
/// Values are environment-expanded; the runtime is told not to read options
/// itself.
#[must_use]
pub fn runtime_options(session: &Session, print_sequence: bool) -> IndexMap<String, String> {
    let mut options: IndexMap<String, String> = flat_options(session.catalog(), false)
        .into_iter()
        .map(|(key, value)| (key, expand_env(&value)))
        .collect();
    options.insert(format!("{APPLICATION_MGR}.JobOptionsType"), "\"NONE\"".to_string());
    if print_sequence {
        options.insert(format!("{APPLICATION_MGR}.PrintAlgsSequence"), "true".to_string());
    }
    options
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::MockRuntime;
    use gconf_core::builtin_types;
    use gconf_options::SearchPath;
    use gconf_property::Value;
    use gconf_test_utils::fixture_session;
    use pretty_assertions::assert_eq;
    use std::fs;

    fn bare_session() -> Session {
        Session::with_types(builtin_types().unwrap(), SearchPath::new())
    }

    fn driver(options: RunOptions, environment: Environment, runtime: MockRuntime) -> Driver<MockRuntime> {
        Driver::new(options, environment, runtime)
    }

    #[test]
    fn test_temp_opts_dry_run_dump_and_cleanup() {
        let dir = tempfile::tempdir().unwrap();
        let temp = dir.path().join("x.opts");
        fs::write(&temp, "MyAlg.MyOpt = 1;\n").unwrap();
        let output = dir.path().join("out.py");
        let options = RunOptions {
            dry_run: true,
            output: Some(output.clone()),
            ..RunOptions::default()
        };
        let environment = Environment {
            temp_opts: Some(temp.clone()),
            ..Environment::default()
        };

        let mut session = bare_session();
        let code = driver(options, environment, MockRuntime::new()).run(&mut session, &mut Vec::new());

        assert_eq!(code, ExitCode::Success);
        assert_eq!(fs::read_to_string(&output).unwrap(), "{\"MyAlg\": {\"MyOpt\": 1}}\n");
        assert!(!temp.exists());
    }

    #[test]
    fn test_temp_opts_removed_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let temp = dir.path().join("x.opts");
        fs::write(&temp, "MyAlg.MyOpt = ;\n").unwrap();
        let environment = Environment {
            temp_opts: Some(temp.clone()),
            ..Environment::default()
        };

        let mut session = bare_session();
        let code = driver(RunOptions::default(), environment, MockRuntime::new())
            .run(&mut session, &mut Vec::new());

        assert_eq!(code, ExitCode::ConfigurationError);
        assert!(!temp.exists());
    }

    #[test]
    fn test_missing_source_exit_code() {
        let options = RunOptions {
            sources: vec!["/nonexistent/job.opts".to_string()],
            ..RunOptions::default()
        };
        let mut session = bare_session();
        let code = driver(options, Environment::default(), MockRuntime::new())
            .run(&mut session, &mut Vec::new());
        assert_eq!(code.code(), 2);
    }

    #[test]
    fn test_conflicting_outputs() {
        let options = RunOptions {
            output: Some("a.pkl".into()),
            pickle_output: Some("b.pkl".into()),
            ..RunOptions::default()
        };
        let mut session = bare_session();
        let code = driver(options, Environment::default(), MockRuntime::new())
            .run(&mut session, &mut Vec::new());
        assert_eq!(code, ExitCode::ConfigurationError);
    }

    #[test]
    fn test_runtime_receives_flat_options() {
        let options = RunOptions {
            options: vec!["MessageSvc.OutputLevel = 2".to_string()],
            print_sequence: true,
            ..RunOptions::default()
        };
        let environment = Environment {
            app_name: Some("Reco".to_string()),
            ..Environment::default()
        };
        let mut runtime = MockRuntime::new();
        runtime
            .expect_run()
            .withf(|application, options| {
                application == "Gaudi::Application"
                    && options.get("MessageSvc.OutputLevel").map(String::as_str) == Some("2")
                    && options.get("ApplicationMgr.AppName").map(String::as_str) == Some("\"Reco\"")
                    && options.get("ApplicationMgr.JobOptionsType").map(String::as_str) == Some("\"NONE\"")
                    && options.get("ApplicationMgr.PrintAlgsSequence").map(String::as_str) == Some("true")
            })
            .times(1)
            .returning(|_, _| Ok(0));

        let mut session = bare_session();
        let code = driver(options, environment, runtime).run(&mut session, &mut Vec::new());
        assert_eq!(code, ExitCode::Success);
    }

    #[test]
    fn test_runtime_status_propagates() {
        for (status, expected) in [(77, ExitCode::Skipped), (4, ExitCode::Native(4))] {
            let mut runtime = MockRuntime::new();
            runtime.expect_run().returning(move |_, _| Ok(status));
            let mut session = bare_session();
            let code = driver(RunOptions::default(), Environment::default(), runtime)
                .run(&mut session, &mut Vec::new());
            assert_eq!(code, expected);
        }
    }

    #[test]
    fn test_unavailable_runtime() {
        let dir = tempfile::tempdir().unwrap();
        let mut runtime = MockRuntime::new();
        runtime.expect_run().returning(|_, _| Err(RuntimeError::Unavailable));
        let mut session = bare_session();
        let code = driver(RunOptions::default(), Environment::default(), runtime)
            .run(&mut session, &mut Vec::new());
        assert_eq!(code, ExitCode::RuntimeFailure);

        let mut runtime = MockRuntime::new();
        runtime.expect_run().returning(|_, _| Err(RuntimeError::Unavailable));
        let options = RunOptions {
            output: Some(dir.path().join("job.opts")),
            ..RunOptions::default()
        };
        let mut session = bare_session();
        let code = driver(options, Environment::default(), runtime).run(&mut session, &mut Vec::new());
        assert_eq!(code, ExitCode::Success);
    }

    #[test]
    fn test_options_before_and_post_options_after_user_apply() {
        let options = RunOptions {
            sources: vec!["job:setup".to_string()],
            options: vec!["CommonConf.OutputLevel = 5".to_string()],
            post_options: vec!["MessageSvc.OutputLevel = 1".to_string()],
            dry_run: true,
            ..RunOptions::default()
        };
        let mut session = fixture_session();
        session.scripts_mut().register("job:setup", |s, _| {
            Ok(vec![s.create("CommonConf", "CommonConf")?])
        });

        let code = driver(options, Environment::default(), MockRuntime::new())
            .run(&mut session, &mut Vec::new());

        assert_eq!(code, ExitCode::Success);
        assert_eq!(session.applied_users(), &["CommonConf"]);
        assert_eq!(session.value("MessageSvc", "OutputLevel").unwrap(), &Value::Int(1));
        assert!(session.catalog().is_frozen());
    }

    #[test]
    fn test_no_conf_user_apply() {
        let options = RunOptions {
            sources: vec!["job:setup".to_string()],
            no_conf_user_apply: true,
            dry_run: true,
            ..RunOptions::default()
        };
        let mut session = fixture_session();
        session.scripts_mut().register("job:setup", |s, _| {
            Ok(vec![s.create("CommonConf", "CommonConf")?])
        });
        let code = driver(options, Environment::default(), MockRuntime::new())
            .run(&mut session, &mut Vec::new());
        assert_eq!(code, ExitCode::Success);
        assert!(session.applied_users().is_empty());
    }

    #[test]
    fn test_verbose_prints_nested_and_opts_forms() {
        for (old_opts, expected) in [
            (false, "{\"MessageSvc\": {\"OutputLevel\": 2}}\n"),
            (true, "MessageSvc.OutputLevel = 2;\n"),
        ] {
            let options = RunOptions {
                options: vec!["MessageSvc.OutputLevel = 2".to_string()],
                verbose: true,
                old_opts,
                dry_run: true,
                ..RunOptions::default()
            };
            let mut out = Vec::new();
            let mut session = bare_session();
            let code = driver(options, Environment::default(), MockRuntime::new()).run(&mut session, &mut out);
            assert_eq!(code, ExitCode::Success);
            assert_eq!(String::from_utf8(out).unwrap(), expected);
        }
    }

    #[test]
    fn test_use_temp_opts_relaunches_with_dump() {
        let options = RunOptions {
            options: vec!["MessageSvc.OutputLevel = 2".to_string()],
            use_temp_opts: true,
            dry_run: true,
            ..RunOptions::default()
        };
        let mut runtime = MockRuntime::new();
        runtime
            .expect_relaunch()
            .withf(|args, path| {
                args.iter().any(|a| a == "--dry-run")
                    && fs::read_to_string(path)
                        .is_ok_and(|text| text.contains("MessageSvc.OutputLevel = 2;"))
            })
            .times(1)
            .returning(|_, _| Ok(0));

        let mut session = bare_session();
        let mut driver = driver(options, Environment::default(), runtime);
        assert_eq!(driver.run(&mut session, &mut Vec::new()), ExitCode::Success);
    }
}
