use crate::config::tracing::{Format, Tracing};
use crate::error::MigrateResult;
use std::str::FromStr;
use tracing::{Level, Subscriber};
use tracing_subscriber::filter::{Directive, LevelFilter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

/// Install the global tracing subscriber. Fails if a global subscriber was already installed.
pub fn init_tracing(tracing: &Tracing) -> MigrateResult<()> {
    let env_filter = env_filter(tracing)?;

    Registry::default()
        .with(env_filter)
        .with(fmt_layer(&tracing.format))
        .try_init()?;

    Ok(())
}

/// The configured level is the default directive; `RUST_LOG` and the configured trace filters
/// are added on top of it.
fn env_filter(tracing: &Tracing) -> MigrateResult<EnvFilter> {
    let env_filter = EnvFilter::builder()
        .with_default_directive(Level::from_str(&tracing.level)?.into())
        .from_env()?;

    tracing
        .trace_filters
        .iter()
        .try_fold(env_filter, |env_filter, filter| {
            Ok(env_filter.add_directive(filter.parse::<Directive>()?))
        })
}

fn fmt_layer<S>(format: &Format) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    let layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
    match format {
        Format::None => layer
            .without_time()
            .with_target(false)
            .with_level(false)
            .with_filter(LevelFilter::ERROR)
            .boxed(),
        Format::Pretty => layer.pretty().boxed(),
        Format::Compact => layer.compact().boxed(),
        Format::Json => layer.json().boxed(),
    }
}
