//! Fortigate resource-usage collector.

use anyhow::{Context, Result};
use fortipoll_framework::{
    CollectorArgs, CollectorConfig, CollectorRunner, PollLoop, config_reference,
};

use fortipoll_fortigate::{COLLECTOR_NAME, FortigateCollector, FortigateCollectorConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let args = CollectorArgs::parse_with_default("fortigate.json5");

    if args.describe_config {
        print!("{}", config_reference(&FortigateCollector::new()));
        return Ok(());
    }

    let config = FortigateCollectorConfig::load(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    let format = config.serialization;
    let settings = config.fortigate.clone();

    let runner = CollectorRunner::new_with_args(COLLECTOR_NAME, config, Some(&args))
        .await
        .context("starting collector runtime")?
        .with_status_publishing()
        .with_format(format);

    tracing::info!(
        hostname = %settings.hostname,
        vdom = %settings.vdom,
        https = settings.https,
        prefix = %settings.key_prefix,
        interval_secs = settings.poll_interval_secs,
        "Fortigate collector configured"
    );

    let metadata = serde_json::json!({
        "hostname": settings.hostname,
        "vdom": settings.vdom,
        "https": settings.https,
        "poll_interval_secs": settings.poll_interval_secs,
    });

    let poll = PollLoop::new(settings.poll_interval(), settings.tick_timeout());
    let source = settings.hostname.clone();
    let labels = settings.labels();

    runner
        .run_collector(
            FortigateCollector::new(),
            settings,
            source,
            labels,
            poll,
            Some(metadata),
        )
        .await
        .context("collector stopped")
}
