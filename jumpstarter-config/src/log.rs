//! Configures the global default tracing subscriber

use thiserror::Error;
use tracing_subscriber::{filter, util::TryInitError, EnvFilter};

/// A validated tracing filter, parsed from the command line.
///
/// The directives are validated eagerly so an invalid `--log-level` fails
/// argument parsing instead of surfacing at init time.
#[derive(Clone, Debug)]
pub struct LogFilter(String);

/// Configures whether logs are emitted in plaintext (the default) or as
/// JSON-encoded messages
#[derive(Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// The default plaintext format
    #[default]
    Plain,

    /// The JSON-encoded format
    Json,
}

/// Indicates that an invalid log format was specified
#[derive(Debug, Error)]
#[error("invalid log format: {0} must be 'plain' or 'json'")]
pub struct InvalidLogFormat(String);

/// Indicates that logging could not be initialized
#[derive(Debug, Error)]
pub enum LogInitError {
    /// The filter directives did not parse.
    #[error(transparent)]
    Parse(#[from] filter::ParseError),

    /// A global default subscriber was already set.
    #[error(transparent)]
    Init(#[from] TryInitError),
}

// === impl LogFilter ===

impl std::str::FromStr for LogFilter {
    type Err = filter::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EnvFilter::builder().parse(s)?;
        Ok(Self(s.to_string()))
    }
}

impl std::fmt::Display for LogFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// === impl LogFormat ===

impl std::str::FromStr for LogFormat {
    type Err = InvalidLogFormat;

    fn from_str(s: &str) -> Result<Self, InvalidLogFormat> {
        match s {
            "json" => Ok(LogFormat::Json),
            "plain" => Ok(LogFormat::Plain),
            s => Err(InvalidLogFormat(s.to_string())),
        }
    }
}

impl LogFormat {
    /// Attempts to configure the global default tracing subscriber in the
    /// current scope, returning an error if one is already set
    pub fn try_init(self, filter: LogFilter) -> Result<(), LogInitError> {
        use tracing_subscriber::prelude::*;

        let filter = EnvFilter::builder().parse(&filter.0)?;
        let registry = tracing_subscriber::registry().with(filter);

        match self {
            LogFormat::Plain => registry.with(tracing_subscriber::fmt::layer()).try_init()?,

            LogFormat::Json => {
                let event_fmt = tracing_subscriber::fmt::format()
                    // Output JSON logs with the span context as a list; the
                    // current span would only duplicate that information.
                    .json()
                    .with_span_list(true)
                    .with_current_span(false);

                let fmt = tracing_subscriber::fmt::layer()
                    .event_format(event_fmt)
                    .fmt_fields(tracing_subscriber::fmt::format::JsonFields::default());

                registry.with(fmt).try_init()?
            }
        };

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::{LogFilter, LogFormat};

    #[test]
    fn parses_formats() {
        assert!(matches!("plain".parse(), Ok(LogFormat::Plain)));
        assert!(matches!("json".parse(), Ok(LogFormat::Json)));
        assert!("yaml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn validates_filter_directives_eagerly() {
        assert!("jumpstarter_config=info,warn".parse::<LogFilter>().is_ok());
        assert!("not a directive!!".parse::<LogFilter>().is_err());
    }
}
