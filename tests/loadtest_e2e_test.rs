//! End-to-end runs of the load generator against a mock service

use bottle_config::{BottleConfig, RunConfig, WorkloadConfig};
use bottle_http::{HttpIssuer, IssuerConfig};
use bottle_load::{
    Corpus, LoadTest, LoadTestError, PhasePlan, RequestBuilder, ResultSink, Scheduler,
};
use bottle_resilience::DisabledBreaker;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Small phases so a full run takes well under a second
fn tunables(results_dir: &Path) -> BottleConfig {
    let mut config = BottleConfig::default();
    config.workload.warmup_threads = 2;
    config.workload.warmup_requests_per_thread = 5;
    config.workload.requests_per_thread = 50;
    config.workload.drain_timeout = Duration::from_millis(500);
    config.report.results_dir = results_dir.to_path_buf();
    config
}

async fn healthy_sut(delay: Duration) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/sentence"))
        .respond_with(ResponseTemplate::new(201).set_delay(delay))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/poem(/(Love|Death|Nature|Beauty))?$"))
        .respond_with(ResponseTemplate::new(200).set_delay(delay))
        .mount(&server)
        .await;
    server
}

fn data_rows(csv: &Path) -> Vec<String> {
    std::fs::read_to_string(csv)
        .unwrap()
        .lines()
        .skip(1)
        .map(str::to_string)
        .collect()
}

#[tokio::test]
async fn test_single_worker_run_records_every_request() {
    let _ = bottle_logging::init_simple_tracing("warn");
    let server = healthy_sut(Duration::from_millis(10)).await;
    let results = TempDir::new().unwrap();

    let run = RunConfig::new(1, 1, 0, server.uri(), false, 30).unwrap();
    let summary = LoadTest::new(run, tunables(results.path()))
        .with_corpus(Corpus::from_lines(["a"]).unwrap())
        .run()
        .await
        .unwrap();

    let report = &summary.report;
    assert_eq!(report.results.success_count(), 100);
    assert_eq!(report.results.failures, 0);
    assert_eq!(report.results.skipped, 0);
    assert_eq!(report.post.unwrap().count, 50);
    assert_eq!(report.get.unwrap().count, 50);
    assert!(report.overall.unwrap().median >= 10);
    assert!(report.breaker.is_none());
    assert_eq!(
        report.results.throughput.values().sum::<u64>(),
        report.results.success_count() as u64
    );

    assert_eq!(
        summary.csv.response_times,
        results.path().join("response_time_size-1_1_groups.csv")
    );
    let rows = data_rows(&summary.csv.response_times);
    assert_eq!(rows.len(), 100);
    for row in &rows {
        let fields: Vec<&str> = row.split(',').collect();
        assert_eq!(fields.len(), 4);
        assert!(fields[1] == "POST" || fields[1] == "GET");
        assert!(fields[2].parse::<i64>().unwrap() >= 0);
        let status: u16 = fields[3].parse().unwrap();
        assert!((200..300).contains(&status));
    }

    let buckets = data_rows(&summary.csv.throughput);
    let total: u64 = buckets
        .iter()
        .map(|row| row.split(',').nth(1).unwrap().parse::<u64>().unwrap())
        .sum();
    assert_eq!(total, 100);

    // Every POST carried the single corpus line
    let requests = server.received_requests().await.unwrap();
    let posts: Vec<_> = requests
        .iter()
        .filter(|r| r.method.as_str() == "POST")
        .collect();
    assert_eq!(posts.len(), 10 + 50);
    for post in posts {
        let body: serde_json::Value = serde_json::from_slice(&post.body).unwrap();
        assert_eq!(body["content"], "a");
    }
}

#[tokio::test]
async fn test_several_groups_without_breaker_issue_the_maximum() {
    let server = healthy_sut(Duration::ZERO).await;
    let results = TempDir::new().unwrap();

    let run = RunConfig::new(3, 2, 0, server.uri(), false, 30).unwrap();
    let max = run.max_main_phase_requests(50) as u64;
    let summary = LoadTest::new(run, tunables(results.path()))
        .with_corpus(Corpus::from_lines(["x", "y"]).unwrap())
        .quiet()
        .run()
        .await
        .unwrap();

    assert_eq!(summary.main.workers_started, 6);
    assert_eq!(summary.report.results.attempts(), max);
    assert_eq!(
        summary.csv.throughput,
        results.path().join("throughput_size-3_2_groups.csv")
    );
}

#[tokio::test]
async fn test_warmup_shortfall_aborts_before_main_phase() {
    let server = MockServer::start().await;
    Mock::given(wiremock::matchers::any())
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let results = TempDir::new().unwrap();

    let run = RunConfig::new(1, 1, 0, server.uri(), false, 30).unwrap();
    let err = LoadTest::new(run, tunables(results.path()))
        .with_corpus(Corpus::from_lines(["a"]).unwrap())
        .run()
        .await
        .unwrap_err();

    match &err {
        LoadTestError::WarmupShortfall {
            succeeded,
            required,
        } => {
            assert_eq!(*succeeded, 0);
            assert_eq!(*required, 10);
        }
        other => panic!("expected warmup shortfall, got {:?}", other),
    }
    assert_eq!(err.exit_code(), 1);

    // Only warmup traffic reached the service
    assert_eq!(server.received_requests().await.unwrap().len(), 20);
    assert_eq!(std::fs::read_dir(results.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_zero_thread_groups_reports_nothing() {
    let server = healthy_sut(Duration::ZERO).await;
    let results = TempDir::new().unwrap();

    let run = RunConfig::new(5, 0, 1, server.uri(), false, 30).unwrap();
    let summary = LoadTest::new(run, tunables(results.path()))
        .with_corpus(Corpus::from_lines(["a"]).unwrap())
        .quiet()
        .run()
        .await
        .unwrap();

    assert_eq!(summary.main.workers_started, 0);
    assert!(summary.report.overall.is_none());
    assert!(data_rows(&summary.csv.response_times).is_empty());
    assert!(data_rows(&summary.csv.throughput).is_empty());
}

#[tokio::test]
async fn test_deadline_returns_partial_results() {
    let server = healthy_sut(Duration::from_millis(20)).await;
    let results = TempDir::new().unwrap();

    let mut run = RunConfig::new(2, 1, 0, server.uri(), false, 1).unwrap();
    run.executor_timeout = Duration::from_millis(500);
    let mut config = tunables(results.path());
    config.workload.requests_per_thread = 100_000;

    let started = Instant::now();
    let summary = LoadTest::new(run, config)
        .with_corpus(Corpus::from_lines(["a"]).unwrap())
        .quiet()
        .run()
        .await
        .unwrap();

    assert!(summary.main.timed_out);
    assert!(summary.report.timed_out);
    assert!(started.elapsed() < Duration::from_secs(10));

    let rows = data_rows(&summary.csv.response_times);
    assert!(!rows.is_empty());
    assert!(rows.len() < 2 * 100_000 * 2);
}

#[tokio::test]
async fn test_breaker_metrics_reported_when_enabled() {
    let server = healthy_sut(Duration::ZERO).await;
    let results = TempDir::new().unwrap();

    let run = RunConfig::new(1, 1, 0, server.uri(), true, 30).unwrap();
    let summary = LoadTest::new(run, tunables(results.path()))
        .with_corpus(Corpus::from_lines(["a"]).unwrap())
        .quiet()
        .run()
        .await
        .unwrap();

    let metrics = summary.report.breaker.expect("breaker metrics");
    assert_eq!(metrics.trips, 0);
    // Warmup successes feed the same breaker
    assert_eq!(metrics.total_successes, 20 + 100);
}

#[tokio::test]
async fn test_missing_corpus_is_fatal() {
    let results = TempDir::new().unwrap();
    let mut config = tunables(results.path());
    config.corpus.path = results.path().join("sonnets.txt");

    let run = RunConfig::new(1, 1, 0, "http://127.0.0.1:9", false, 30).unwrap();
    let err = LoadTest::new(run, config).run().await.unwrap_err();

    assert!(matches!(err, LoadTestError::CorpusUnavailable { .. }));
    assert_eq!(err.exit_code(), 2);
}

#[tokio::test]
async fn test_corpus_loaded_from_configured_path() {
    let server = healthy_sut(Duration::ZERO).await;
    let results = TempDir::new().unwrap();
    let corpus_path = results.path().join("lines.txt");
    std::fs::write(&corpus_path, "From fairest creatures\nwe desire increase\n").unwrap();

    let mut config = tunables(results.path());
    config.corpus.path = corpus_path;
    config.workload.requests_per_thread = 5;

    let run = RunConfig::new(1, 1, 0, server.uri(), false, 30).unwrap();
    let summary = LoadTest::new(run, config).quiet().run().await.unwrap();
    assert_eq!(summary.report.results.success_count(), 10);
}

#[tokio::test]
async fn test_warmup_twice_yields_equal_success_totals() {
    let server = healthy_sut(Duration::ZERO).await;
    let workload = WorkloadConfig::default();
    let plan = PhasePlan::warmup(&workload);

    let issuer = HttpIssuer::new(&IssuerConfig::default(), Arc::new(DisabledBreaker)).unwrap();
    let builder = RequestBuilder::new(&server.uri(), Corpus::from_lines(["a", "b"]).unwrap());
    let scheduler = Scheduler::new(issuer, builder, workload.drain_timeout);

    let mut totals = Vec::new();
    for _ in 0..2 {
        let sink = Arc::new(ResultSink::starting_now());
        let phase = scheduler.run_phase(&plan, Arc::clone(&sink)).await;
        assert!(!phase.timed_out);
        totals.push(sink.freeze().success_count());
    }

    assert_eq!(totals[0], totals[1]);
    assert!(totals[0] >= workload.warmup_success_floor());
    assert_eq!(totals[0], plan.max_requests());
}
