use anyhow::Result;
use opentelemetry::global;
use std::fs::OpenOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Logs go to stderr so stdout carries only the module result.
pub fn init_telemetry() -> Result<()> {
    let exporter_type = std::env::var("OTEL_EXPORTER").unwrap_or_else(|_| "stderr".to_string());

    match exporter_type.as_str() {
        "otlp" => init_otlp()?,
        "file" => init_file()?,
        "json" => init_json()?,
        "stderr" => init_stderr()?,
        _ => {
            eprintln!("Unknown OTEL_EXPORTER: {}, falling back to stderr", exporter_type);
            init_stderr()?;
        }
    }

    Ok(())
}

fn init_otlp() -> Result<()> {
    let service_name = std::env::var("OTEL_SERVICE_NAME").unwrap_or_else(|_| "drift".to_string());

    let tracer = opentelemetry_otlp::new_pipeline()
        .tracing()
        .with_exporter(opentelemetry_otlp::new_exporter().tonic())
        .with_trace_config(opentelemetry_sdk::trace::config().with_resource(
            opentelemetry_sdk::Resource::new(vec![opentelemetry::KeyValue::new(
                "service.name",
                service_name,
            )]),
        ))
        .install_batch(opentelemetry_sdk::runtime::Tokio)?;

    let telemetry = tracing_opentelemetry::layer().with_tracer(tracer);

    tracing_subscriber::registry()
        .with(telemetry)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    Ok(())
}

fn init_stderr() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    Ok(())
}

fn init_json() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    Ok(())
}

fn init_file() -> Result<()> {
    let log_file_path = std::env::var("LOG_FILE").unwrap_or_else(|_| "drift.log".to_string());

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file_path)?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::sync::Arc::new(log_file))
                .with_ansi(false),
        )
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    Ok(())
}

pub fn shutdown_telemetry() {
    global::shutdown_tracer_provider();
}
