//! Log output of the driver
//!
//! Every event becomes one `<prefix><LEVEL>: <message>` line on stdout. The
//! prefix is `# ` so the output can be pasted into scripts, or `// ` when the
//! configuration is printed in options syntax.

use std::fmt;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::EnvFilter;

/// Prefix used with `--old-opts`
pub const OPTS_PREFIX: &str = "// ";
/// Default prefix
pub const SCRIPT_PREFIX: &str = "# ";

/// Event formatter writing prefixed level lines
#[derive(Debug, Clone)]
pub struct PrefixFormat {
    prefix: String,
}

impl PrefixFormat {
    /// Formatter with the given line prefix
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

fn level_name(level: Level) -> &'static str {
    match level {
        Level::ERROR => "ERROR",
        Level::WARN => "WARNING",
        Level::INFO => "INFO",
        Level::DEBUG | Level::TRACE => "DEBUG",
    }
}

impl<S, N> FormatEvent<S, N> for PrefixFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(&self, ctx: &FmtContext<'_, S, N>, mut writer: Writer<'_>, event: &Event<'_>) -> fmt::Result {
        write!(writer, "{}{}: ", self.prefix, level_name(*event.metadata().level()))?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Install the global subscriber
///
/// `RUST_LOG` wins over the level chosen by the flags. Installing twice is
/// a no-op.
pub fn init(prefix: &str, debug: bool) {
    let default = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .event_format(PrefixFormat::new(prefix))
        .with_writer(std::io::stdout)
        .try_init();
    if installed.is_err() {
        tracing::debug!("log subscriber already installed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Buffer(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Buffer {
        fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(bytes);
            Ok(bytes.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn capture(prefix: &str, emit: impl FnOnce()) -> String {
        let buffer = Buffer::default();
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .event_format(PrefixFormat::new(prefix))
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, emit);
        let bytes = buffer.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_prefixed_lines() {
        let out = capture(SCRIPT_PREFIX, || {
            tracing::warn!("Skip already included file x.opts");
            tracing::info!("applying configuration of CommonConf");
        });
        assert_eq!(
            out,
            "# WARNING: Skip already included file x.opts\n# INFO: applying configuration of CommonConf\n"
        );
    }

    #[test]
    fn test_opts_prefix() {
        let out = capture(OPTS_PREFIX, || tracing::error!("bad"));
        assert_eq!(out, "// ERROR: bad\n");
    }
}
