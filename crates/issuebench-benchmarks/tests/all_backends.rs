//! Runs the orchestrator against every registered backend

use issuebench_benchmarks::{all_backends, BenchmarkConfig, BenchmarkRunner};

#[test]
fn every_backend_completes_a_small_run() {
    let config = BenchmarkConfig {
        item_count: 300,
        batch_size: 64,
        ..BenchmarkConfig::default()
    };
    let runner = BenchmarkRunner::new(config);

    let mut out = Vec::new();
    let report = runner.run(all_backends(64), &mut out).unwrap();
    let text = String::from_utf8(out).unwrap();

    assert_eq!(report.backends.len(), 4);
    assert_eq!(text.matches("\nArtifact: ").count(), 4);
    for backend in &report.backends {
        assert!(backend.succeeded(), "{}: {:?}", backend.name, backend.error);
        assert_eq!(backend.write.unwrap().count, 300);
        assert_eq!(backend.read_all.unwrap().count, 300);
        assert!(text.contains(&format!("== {} ==", backend.name)));
    }

    // Same dataset everywhere, so every backend finds the same subset
    let hits: Vec<_> = report
        .backends
        .iter()
        .map(|b| b.search.unwrap().count)
        .collect();
    assert!(hits.windows(2).all(|w| w[0] == w[1]), "{hits:?}");
}
