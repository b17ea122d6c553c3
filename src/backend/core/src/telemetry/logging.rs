//! Structured logging with sensitive value redaction.
//!
//! Backend error bodies are echoed into logs when a relay call fails. They can
//! contain tokens, passwords or personal identifiers, so every such body goes
//! through [`SensitiveFieldRedactor`] first.

use std::sync::OnceLock;

use opentelemetry_otlp::WithExportConfig;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::{LogFormat, TelemetryConfig};

static REDACTOR: OnceLock<SensitiveFieldRedactor> = OnceLock::new();

/// Maximum number of characters of a raw backend body kept in logs and messages.
pub const MAX_LOGGED_BODY_CHARS: usize = 512;

/// A pattern for identifying sensitive data to redact.
#[derive(Debug, Clone)]
pub struct RedactionPattern {
    /// Name of this pattern (for debugging)
    pub name: &'static str,

    /// Field names to match (case-insensitive, substring)
    pub field_names: &'static [&'static str],

    /// Regex matched against values
    pub value_pattern: Option<&'static str>,
}

const DEFAULT_PATTERNS: &[RedactionPattern] = &[
    RedactionPattern {
        name: "tokens",
        field_names: &["token", "bearer", "jwt", "authorization", "cookie"],
        value_pattern: Some(r"eyJ[a-zA-Z0-9_-]+\.[a-zA-Z0-9_-]+\.[a-zA-Z0-9_-]*"),
    },
    RedactionPattern {
        name: "bearer_headers",
        field_names: &[],
        value_pattern: Some(r"(?i)bearer\s+[a-zA-Z0-9._~+/=-]+"),
    },
    RedactionPattern {
        name: "passwords",
        field_names: &["password", "passwd", "secret", "credential"],
        value_pattern: Some(r#"(?i)"(password|secret)"\s*:\s*"[^"]*""#),
    },
    RedactionPattern {
        name: "national_ids",
        field_names: &["ssn", "national_id"],
        value_pattern: Some(r"\b\d{3}-\d{2}-\d{4}\b"),
    },
];

/// Redactor for sensitive fields in log output.
#[derive(Debug, Clone)]
pub struct SensitiveFieldRedactor {
    patterns: Vec<CompiledRedactionPattern>,
    replacement: String,
}

#[derive(Debug, Clone)]
struct CompiledRedactionPattern {
    field_names: &'static [&'static str],
    value_regex: Option<regex::Regex>,
}

impl SensitiveFieldRedactor {
    /// Compile a redactor from a set of patterns. Invalid regexes are skipped.
    pub fn new(patterns: &[RedactionPattern], replacement: impl Into<String>) -> Self {
        let patterns = patterns
            .iter()
            .map(|p| {
                let value_regex = p.value_pattern.and_then(|pat| match regex::Regex::new(pat) {
                    Ok(re) => Some(re),
                    Err(e) => {
                        tracing::warn!(pattern = p.name, error = %e, "Skipping invalid redaction pattern");
                        None
                    }
                });
                CompiledRedactionPattern {
                    field_names: p.field_names,
                    value_regex,
                }
            })
            .collect();

        Self {
            patterns,
            replacement: replacement.into(),
        }
    }

    /// Check if a field name should be redacted outright.
    pub fn should_redact_field(&self, field_name: &str) -> bool {
        let lower = field_name.to_lowercase();
        self.patterns
            .iter()
            .any(|p| p.field_names.iter().any(|f| lower.contains(f)))
    }

    /// Redact every matching substring of a value.
    pub fn redact_value(&self, value: &str) -> String {
        let mut result = value.to_string();
        for pattern in &self.patterns {
            if let Some(regex) = &pattern.value_regex {
                result = regex.replace_all(&result, self.replacement.as_str()).into_owned();
            }
        }
        result
    }

    /// Redact a field value, checking both field name and value patterns.
    pub fn redact(&self, field_name: &str, value: &str) -> String {
        if self.should_redact_field(field_name) {
            return self.replacement.clone();
        }
        self.redact_value(value)
    }

    /// Get the global redactor instance.
    pub fn global() -> &'static SensitiveFieldRedactor {
        REDACTOR.get_or_init(|| SensitiveFieldRedactor::new(DEFAULT_PATTERNS, "[REDACTED]"))
    }
}

/// Redact and truncate a raw body before it is logged.
pub fn sanitize_body(body: &str) -> String {
    let redacted = SensitiveFieldRedactor::global().redact_value(body.trim());
    truncate_chars(&redacted, MAX_LOGGED_BODY_CHARS)
}

/// Truncate on a char boundary, appending an ellipsis when cut.
pub fn truncate_chars(value: &str, max: usize) -> String {
    match value.char_indices().nth(max) {
        Some((idx, _)) => format!("{}…", &value[..idx]),
        None => value.to_string(),
    }
}

/// Initialize the logging subsystem.
///
/// Sets up the `tracing` subscriber with the configured format and filter,
/// plus an OpenTelemetry layer when an OTLP endpoint is configured.
pub fn init_logging(config: &TelemetryConfig) -> anyhow::Result<()> {
    let _ = REDACTOR.set(SensitiveFieldRedactor::new(DEFAULT_PATTERNS, "[REDACTED]"));

    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.log_level)?,
    };

    let otel_layer = match &config.otlp_endpoint {
        Some(endpoint) => {
            let tracer = opentelemetry_otlp::new_pipeline()
                .tracing()
                .with_exporter(
                    opentelemetry_otlp::new_exporter()
                        .tonic()
                        .with_endpoint(endpoint),
                )
                .with_trace_config(
                    opentelemetry_sdk::trace::config().with_resource(
                        opentelemetry_sdk::Resource::new(vec![opentelemetry::KeyValue::new(
                            "service.name",
                            config.service_name.clone(),
                        )]),
                    ),
                )
                .install_batch(opentelemetry_sdk::runtime::Tokio)?;
            Some(tracing_opentelemetry::layer().with_tracer(tracer))
        }
        None => None,
    };

    let fmt_layer = match config.log_format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_target(true)
            .boxed(),
        LogFormat::Pretty => fmt::layer().pretty().with_target(true).boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(false).boxed(),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(otel_layer)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}
