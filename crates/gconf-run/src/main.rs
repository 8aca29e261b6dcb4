//! `gaudirun` entry point

use gconf_core::Session;
use gconf_run::logging::{self, OPTS_PREFIX, SCRIPT_PREFIX};
use gconf_run::{Driver, Environment, ExitCode, RunOptions, StandaloneRuntime, TempOptsGuard};

fn main() {
    let options = match RunOptions::try_parse_from(std::env::args_os()) {
        Ok(options) => options,
        Err(err) => err.exit(),
    };
    logging::init(
        if options.old_opts { OPTS_PREFIX } else { SCRIPT_PREFIX },
        options.debug_logging(),
    );

    let environment = Environment::from_env();
    let code = match Session::new() {
        Ok(mut session) => {
            let mut stdout = std::io::stdout();
            Driver::new(options, environment, StandaloneRuntime).run(&mut session, &mut stdout)
        }
        Err(err) => {
            drop(environment.temp_opts.map(TempOptsGuard::new));
            tracing::error!("{}", err);
            ExitCode::ConfigurationError
        }
    };
    std::process::exit(code.code());
}
