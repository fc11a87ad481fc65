// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Logging setup for processes embedding the listener.

use std::{fmt, sync::Once};
use tracing::{
    Event, Level, Subscriber,
    field::{Field, Visit},
    level_filters::LevelFilter,
    warn,
};
use tracing_subscriber::{
    Layer,
    filter::Targets,
    fmt::{FmtContext, FormatEvent, FormatFields, format},
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
};

/// Environment variable holding the log filter, in `tracing_subscriber` `Targets` syntax
/// (for example `debug` or `allure_listener=debug,warn`).
pub const LOG_ENV: &str = "ALLURE_LOG";

static INIT_LOGGER: Once = Once::new();

/// Installs a stderr logger filtered by [`LOG_ENV`], defaulting to `info`.
///
/// Only the first call has an effect. If another global subscriber is already installed, that
/// one is kept.
pub fn init_logging() {
    INIT_LOGGER.call_once(|| {
        let level_str = std::env::var(LOG_ENV).unwrap_or_default();
        let (targets, parse_error) = parse_targets(&level_str);

        let layer = tracing_subscriber::fmt::layer()
            .event_format(SimpleFormatter)
            .with_writer(std::io::stderr)
            .with_filter(targets);

        if tracing_subscriber::registry().with(layer).try_init().is_ok()
            && let Some(error) = parse_error
        {
            warn!("ignoring invalid {LOG_ENV} value `{level_str}`: {error}");
        }
    });
}

/// Parses a filter string, falling back to `info` if it is empty or invalid.
fn parse_targets(level_str: &str) -> (Targets, Option<String>) {
    let default = || Targets::new().with_default(LevelFilter::INFO);
    if level_str.is_empty() {
        return (default(), None);
    }
    match level_str.parse::<Targets>() {
        Ok(targets) => (targets, None),
        Err(error) => (default(), Some(error.to_string())),
    }
}

struct SimpleFormatter;

impl<S, N> FormatEvent<S, N> for SimpleFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: format::Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let metadata = event.metadata();
        let level = match *metadata.level() {
            Level::ERROR => "error",
            Level::WARN => "warning",
            Level::INFO => "info",
            Level::DEBUG => "debug",
            Level::TRACE => "trace",
        };
        write!(writer, "{level}: ")?;

        let mut visitor = MessageVisitor {
            writer: &mut writer,
            // Show other fields for debug or trace output.
            show_other: *metadata.level() >= Level::DEBUG,
            error: None,
        };

        event.record(&mut visitor);

        if let Some(error) = visitor.error {
            return Err(error);
        }

        writeln!(writer)
    }
}

static MESSAGE_FIELD: &str = "message";

struct MessageVisitor<'writer, 'a> {
    writer: &'a mut format::Writer<'writer>,
    show_other: bool,
    error: Option<fmt::Error>,
}

impl Visit for MessageVisitor<'_, '_> {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        let res = if field.name() == MESSAGE_FIELD {
            write!(self.writer, "{value:?}")
        } else if self.show_other {
            write!(self.writer, "; {} = {:?}", field.name(), value)
        } else {
            Ok(())
        };
        if let Err(error) = res {
            self.error = Some(error);
        }
    }
}
