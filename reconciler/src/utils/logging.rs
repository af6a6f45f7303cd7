use std::collections::BTreeMap;
use std::fmt::{self, Debug};
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{json, Value};
use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Id, Record};
use tracing::{Event, Level, Subscriber};
use tracing_error::ErrorLayer;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::layer::Context;
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{fmt as subscriber_fmt, EnvFilter, Layer, Registry};

const JOB_FIELD: &str = "job_id";
const MESSAGE_FIELD: &str = "message";
const DEFAULT_DIRECTIVE: &str = "trace_reconciler=info";

const GREY: &str = "\x1b[90m";
const CYAN: &str = "\x1b[96m";
const GREEN: &str = "\x1b[92m";
const RESET: &str = "\x1b[0m";

/// Output layout, read from `LOG_FORMAT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format {other:?}, expected `pretty` or `json`")),
        }
    }
}

impl LogFormat {
    /// Unset or unrecognised values fall back to [`LogFormat::Pretty`].
    pub fn from_env() -> Self {
        std::env::var("LOG_FORMAT").ok().and_then(|value| value.parse().ok()).unwrap_or_default()
    }
}

/// Typed field values recorded on a span (or an event), keyed by field name.
#[derive(Debug, Clone, Default)]
pub struct SpanFields(BTreeMap<String, Value>);

impl SpanFields {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    fn put(&mut self, field: &Field, value: Value) {
        self.0.insert(field.name().to_owned(), value);
    }
}

impl Visit for SpanFields {
    fn record_debug(&mut self, field: &Field, value: &dyn Debug) {
        self.put(field, Value::String(format!("{value:?}")));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.put(field, Value::from(value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.put(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.put(field, Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.put(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.put(field, Value::from(value));
    }
}

/// Stores span fields in the span extensions so the formatters can attach them to every event inside.
pub struct FieldCollectorLayer;

impl<S> Layer<S> for FieldCollectorLayer
where
    S: Subscriber + for<'lookup> LookupSpan<'lookup>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        if let Some(span) = ctx.span(id) {
            let mut fields = SpanFields::default();
            attrs.record(&mut fields);
            span.extensions_mut().insert(fields);
        }
    }

    fn on_record(&self, id: &Id, values: &Record<'_>, ctx: Context<'_, S>) {
        if let Some(span) = ctx.span(id) {
            let mut extensions = span.extensions_mut();
            match extensions.get_mut::<SpanFields>() {
                Some(fields) => values.record(fields),
                None => {
                    let mut fields = SpanFields::default();
                    values.record(&mut fields);
                    extensions.insert(fields);
                }
            }
        }
    }
}

/// Text form of a field value, without the quotes JSON puts around strings.
fn plain(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// One event with the fields of its enclosing spans merged in, ready for either formatter.
#[derive(Debug, Clone, PartialEq)]
pub struct LogLine {
    pub timestamp: DateTime<Utc>,
    pub level: Level,
    pub target: String,
    pub line: Option<u32>,
    pub message: String,
    pub fields: BTreeMap<String, Value>,
}

impl LogLine {
    fn capture<S, N>(ctx: &FmtContext<'_, S, N>, event: &Event<'_>) -> Self
    where
        S: Subscriber + for<'a> LookupSpan<'a>,
        N: for<'a> FormatFields<'a> + 'static,
    {
        let mut recorded = SpanFields::default();
        event.record(&mut recorded);
        let mut fields = recorded.0;
        let message = fields.remove(MESSAGE_FIELD).map(|value| plain(&value)).unwrap_or_default();

        // Event fields win over span fields, inner spans over outer ones.
        if let Some(scope) = ctx.event_scope() {
            for span in scope {
                if let Some(span_fields) = span.extensions().get::<SpanFields>() {
                    for (name, value) in &span_fields.0 {
                        fields.entry(name.clone()).or_insert_with(|| value.clone());
                    }
                }
            }
        }

        let meta = event.metadata();
        Self {
            timestamp: Utc::now(),
            level: *meta.level(),
            target: meta.target().to_owned(),
            line: meta.line(),
            message,
            fields,
        }
    }

    pub fn job(&self) -> Option<String> {
        self.fields.get(JOB_FIELD).map(plain)
    }

    pub fn to_json(&self) -> Value {
        let mut object = json!({
            "timestamp": self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            "level": self.level.to_string(),
            "target": self.target,
            "message": self.message,
        });
        if let Some(line) = self.line {
            object["line_number"] = Value::from(line);
        }
        if !self.fields.is_empty() {
            object["fields"] = Value::Object(self.fields.clone().into_iter().collect());
        }
        object
    }

    /// `timestamp | LEVEL | job | message (name=value, ...)`, coloured for a terminal.
    pub fn write_pretty(&self, out: &mut impl fmt::Write) -> fmt::Result {
        let level_color = match self.level {
            Level::ERROR => "\x1b[31m",
            Level::WARN => "\x1b[33m",
            Level::INFO => "\x1b[32m",
            Level::DEBUG => "\x1b[34m",
            Level::TRACE => GREY,
        };
        let separator = format!("{GREY}|{RESET}");
        let job = self.job().unwrap_or_else(|| "-".to_owned());

        write!(out, "{CYAN}{}{RESET} {separator} ", self.timestamp.format("%y-%m-%d %H:%M:%S"))?;
        write!(out, "{level_color}{:<5}{RESET} {separator} ", self.level.to_string())?;
        write!(out, "{GREEN}{job:<12}{RESET} {separator} {}", self.message)?;

        let extra: Vec<String> = self
            .fields
            .iter()
            .filter(|(name, _)| name.as_str() != JOB_FIELD)
            .map(|(name, value)| format!("{name}={}", plain(value)))
            .collect();
        if !extra.is_empty() {
            write!(out, " {GREY}({}){RESET}", extra.join(", "))?;
        }
        writeln!(out)
    }
}

/// Column layout for the console.
pub struct PrettyFormatter;

impl<S, N> FormatEvent<S, N> for PrettyFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(&self, ctx: &FmtContext<'_, S, N>, mut writer: Writer<'_>, event: &Event<'_>) -> fmt::Result {
        LogLine::capture(ctx, event).write_pretty(&mut writer)
    }
}

/// One JSON object per line, for log shippers.
pub struct JsonEventFormatter;

impl<S, N> FormatEvent<S, N> for JsonEventFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(&self, ctx: &FmtContext<'_, S, N>, mut writer: Writer<'_>, event: &Event<'_>) -> fmt::Result {
        let encoded = serde_json::to_string(&LogLine::capture(ctx, event).to_json()).map_err(|_| fmt::Error)?;
        writeln!(writer, "{encoded}")
    }
}

/// Install the global subscriber: `RUST_LOG` filtering (default `trace_reconciler=info`), span field
/// collection, the formatter picked by [`LogFormat::from_env`] and an [`ErrorLayer`] for span traces.
/// Panics and reports go through color_eyre.
pub fn init_logging() {
    color_eyre::install().expect("color_eyre can only be installed once");

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));

    let formatter = match LogFormat::from_env() {
        LogFormat::Json => subscriber_fmt::layer().event_format(JsonEventFormatter).boxed(),
        LogFormat::Pretty => subscriber_fmt::layer().event_format(PrettyFormatter).boxed(),
    };

    Registry::default()
        .with(filter)
        .with(FieldCollectorLayer)
        .with(formatter)
        .with(ErrorLayer::default())
        .init();
}
