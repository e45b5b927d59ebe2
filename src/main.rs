use std::time::Duration;

use creo_stats::{Collector, Config, ErrorSink};

/// Entry point for the Creo Stats demo.
///
/// Polls container statistics once per second and prints one JSON line per
/// container. Exits with the discovery error once the cgroup tree can no longer be
/// scanned.
///
/// # Examples
///
/// ```bash
/// RUST_LOG=debug CREO_STATS_CGROUP_ROOT=/sys/fs/cgroup cargo run
/// ```
#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let (sink, mut discovery_failed) = ErrorSink::channel();
    let mut collector = Collector::new(Config::from_env());
    collector.init(Some(sink))?;
    let collector = std::sync::Arc::new(collector);

    let mut interval = tokio::time::interval(Duration::from_secs(1));
    loop {
        tokio::select! {
            err = &mut discovery_failed => {
                return match err {
                    Ok(err) => Err(err.into()),
                    Err(_) => Ok(()),
                };
            }
            _ = interval.tick() => {}
        }

        let stats = {
            let collector = std::sync::Arc::clone(&collector);
            tokio::task::spawn_blocking(move || collector.snapshot())
                .await
                .expect("spawn_blocking panicked")?
        };
        log::trace!("read stats of {} containers", stats.len());

        for (container_id, entry) in &stats {
            let line = serde_json::json!({
                "id": container_id,
                "stats": entry,
            });
            println!("{line}");
        }
    }
}
