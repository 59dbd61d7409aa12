use clap::Parser;
use core::time::Duration;
use corral::DispatcherConfig;

/// Runtime configuration for the `corral-demo` binary.
///
/// Values are parsed from CLI arguments or environment variables. The defaults
/// reproduce the classic run: five connections serving ten callers.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "corral-demo",
    version,
    about = "Drive a correlated worker pool with simulated callers"
)]
pub struct CliArgs {
    /// Number of workers (simulated connections) in the pool.
    ///
    /// Environment variable: `WORKER_COUNT`
    #[arg(long, env = "WORKER_COUNT", default_value_t = 5)]
    pub worker_count: usize,

    /// Number of concurrent callers to submit one request each.
    ///
    /// Environment variable: `CALLERS`
    #[arg(long, env = "CALLERS", default_value_t = 10)]
    pub callers: usize,

    /// Simulated per-job latency in milliseconds.
    ///
    /// Environment variable: `LATENCY_MS`
    #[arg(long, env = "LATENCY_MS", default_value_t = 200)]
    pub latency_ms: u64,

    /// Length of generated correlation keys.
    ///
    /// Environment variable: `KEY_LENGTH`
    #[arg(long, env = "KEY_LENGTH", default_value_t = corral::DEFAULT_KEY_LENGTH)]
    pub key_length: usize,

    /// Regenerate colliding keys instead of overwriting the earlier
    /// registration.
    ///
    /// Environment variable: `REJECT_COLLISIONS`
    #[arg(long, env = "REJECT_COLLISIONS", default_value_t = false)]
    pub reject_collisions: bool,

    /// Pause between starting the pool and releasing the callers, in
    /// milliseconds.
    ///
    /// Environment variable: `WARMUP_MS`
    #[arg(long, env = "WARMUP_MS", default_value_t = 0)]
    pub warmup_ms: u64,
}

#[derive(Debug, Clone)]
pub struct DemoConfig {
    pub dispatcher: DispatcherConfig,
    pub callers: usize,
    pub warmup: Duration,
}

impl TryFrom<CliArgs> for DemoConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        let dispatcher = DispatcherConfig::default()
            .with_worker_count(args.worker_count)
            .with_key_length(args.key_length)
            .with_latency(Duration::from_millis(args.latency_ms))
            .with_reject_collisions(args.reject_collisions);
        dispatcher.validate()?;

        Ok(Self {
            dispatcher,
            callers: args.callers,
            warmup: Duration::from_millis(args.warmup_ms),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliArgs {
        CliArgs::parse_from(std::iter::once("corral-demo").chain(args.iter().copied()))
    }

    #[test]
    fn flags_map_onto_dispatcher_config() {
        let config = DemoConfig::try_from(parse(&[
            "--worker-count",
            "3",
            "--callers",
            "7",
            "--latency-ms",
            "15",
            "--key-length",
            "8",
            "--reject-collisions",
        ]))
        .unwrap();

        assert_eq!(config.callers, 7);
        assert_eq!(config.dispatcher.worker_count, 3);
        assert_eq!(config.dispatcher.key_length, 8);
        assert_eq!(config.dispatcher.latency, Duration::from_millis(15));
        assert!(config.dispatcher.reject_collisions);
    }

    #[test]
    fn zero_workers_is_rejected() {
        let err = DemoConfig::try_from(parse(&["--worker-count", "0"])).unwrap_err();
        assert!(err.to_string().contains("worker_count"));
    }

    #[test]
    fn zero_key_length_is_rejected() {
        assert!(DemoConfig::try_from(parse(&["--key-length", "0"])).is_err());
    }

    #[test]
    fn oversized_pool_is_rejected() {
        let too_many = (corral::MAX_WORKERS + 1).to_string();
        let err = DemoConfig::try_from(parse(&["--worker-count", &too_many])).unwrap_err();
        assert!(err.downcast_ref::<corral::Error>().is_some());
    }
}
