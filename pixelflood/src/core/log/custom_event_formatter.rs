// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! # Custom event formatter for tracing
//!
//! [`CustomEventFormatter`] renders one line per event, plain text, so it reads the same
//! on a console, in `journalctl`, and in a log file:
//!
//! ```text
//! <timestamp> <level_sigil>: [span{fields}]... <message> <key>=<value>...
//! 14:03:12.418 D: [connection{peer=[::ffff:10.0.0.7]:51234}] closed bytes_read=81920
//! ```
//!
//! The `message` field is special: it is printed first, without a key. All other fields
//! follow as `key=value` pairs, in the order they were recorded.

use chrono::Local;
use custom_event_formatter_constants::{DEBUG_SIGIL, ERROR_SIGIL, INFO_SIGIL,
                                       LEVEL_SUFFIX, TIMESTAMP_FORMAT, TRACE_SIGIL,
                                       WARN_SIGIL};
use smallvec::SmallVec;
use std::fmt::{self, Write as _};
use tracing::{Event, Level, Subscriber,
              field::{Field, Visit}};
use tracing_subscriber::{fmt::{FmtContext, FormatEvent, FormatFields, FormattedFields,
                               format::Writer},
                         registry::LookupSpan};

/// This is the "marker" struct that is used to register this formatter with the
/// `tracing_subscriber` crate. See [`crate::create_fmt`!].
#[derive(Debug, Default)]
pub struct CustomEventFormatter;

#[rustfmt::skip]
pub mod custom_event_formatter_constants {
    pub const LEVEL_SUFFIX: &str = ":";
    pub const TIMESTAMP_FORMAT: &str = "%H:%M:%S%.3f";

    pub const ERROR_SIGIL: &str = "E";
    pub const WARN_SIGIL: &str = "W";
    pub const INFO_SIGIL: &str = "I";
    pub const DEBUG_SIGIL: &str = "D";
    pub const TRACE_SIGIL: &str = "T";
}

#[must_use]
pub fn get_level_sigil(level: Level) -> &'static str {
    match level {
        Level::ERROR => ERROR_SIGIL,
        Level::WARN => WARN_SIGIL,
        Level::INFO => INFO_SIGIL,
        Level::DEBUG => DEBUG_SIGIL,
        Level::TRACE => TRACE_SIGIL,
    }
}

/// Collects the `message` field separately from the rest.
#[derive(Debug, Default)]
struct VisitEventFields {
    message: String,
    fields: SmallVec<[(&'static str, String); 4]>,
}

impl Visit for VisitEventFields {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            self.fields.push((field.name(), value.to_string()));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            let _unused = write!(self.message, "{value:?}");
        } else {
            self.fields.push((field.name(), format!("{value:?}")));
        }
    }
}

impl<S, N> FormatEvent<S, N> for CustomEventFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut f: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        write!(
            f,
            "{ts} {sigil}{LEVEL_SUFFIX} ",
            ts = Local::now().format(TIMESTAMP_FORMAT),
            sigil = get_level_sigil(*event.metadata().level()),
        )?;

        // Span context, outermost first.
        if let Some(scope) = ctx.event_scope() {
            for span in scope.from_root() {
                write!(f, "[{}", span.name())?;
                let extensions = span.extensions();
                if let Some(fields) = extensions.get::<FormattedFields<N>>()
                    && !fields.is_empty()
                {
                    write!(f, "{{{fields}}}")?;
                }
                write!(f, "] ")?;
            }
        }

        let mut visitor = VisitEventFields::default();
        event.record(&mut visitor);

        write!(f, "{}", visitor.message)?;
        for (key, value) in &visitor.fields {
            write!(f, " {key}={value}")?;
        }
        writeln!(f)
    }
}
