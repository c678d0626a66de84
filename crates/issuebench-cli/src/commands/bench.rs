use anyhow::Result;
use issuebench_benchmarks::{all_backends, BenchmarkConfig, BenchmarkRunner};
use std::io::Write;
use tracing::{debug, info, warn};

use crate::args::KeyValueArgs;

const KNOWN_KEYS: &[&str] = &["items", "batch", "rule", "seed"];

/// Apply `items=`, `batch=`, `rule=` and `seed=` over the configured defaults
pub fn resolve(base: &BenchmarkConfig, args: &KeyValueArgs) -> BenchmarkConfig {
    for key in args.unknown_keys(KNOWN_KEYS) {
        debug!(key, "Ignoring unknown bench parameter");
    }

    BenchmarkConfig {
        item_count: args.parse_or("items", base.item_count),
        batch_size: args.parse_or("batch", base.batch_size).max(1),
        search_rule_key: args
            .get("rule")
            .map(str::to_string)
            .unwrap_or_else(|| base.search_rule_key.clone()),
        seed: args.parse_or("seed", base.seed),
        ..base.clone()
    }
}

/// Execute `issuebench bench`
pub fn execute(base: &BenchmarkConfig, params: &[String], out: &mut impl Write) -> Result<()> {
    let config = resolve(base, &KeyValueArgs::parse(params));
    let batch = config.batch_size;

    let report = BenchmarkRunner::new(config).run(all_backends(batch), out)?;
    out.flush()?;

    let failed: Vec<_> = report.failed_backends().map(|b| b.name.as_str()).collect();
    if failed.is_empty() {
        info!(backends = report.backends.len(), "Benchmark complete");
    } else {
        warn!(?failed, "Benchmark complete with failed backends");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_override_config() {
        let base = BenchmarkConfig {
            item_count: 10,
            ..BenchmarkConfig::default()
        };
        let args = KeyValueArgs::parse(["ITEMS=300", "batch=0", "rule=py:S100"]);
        let config = resolve(&base, &args);

        assert_eq!(config.item_count, 300);
        assert_eq!(config.batch_size, 1);
        assert_eq!(config.search_rule_key, "py:S100");
        assert_eq!(config.seed, base.seed);
        assert_eq!(config.rule_keys, base.rule_keys);
    }

    #[test]
    fn test_no_tokens_keeps_config() {
        let base = BenchmarkConfig::default();
        assert_eq!(resolve(&base, &KeyValueArgs::default()), base);
    }
}
