//! Main phase against a failing service
//!
//! A full run would stop at warmup, so this drives the main phase through the
//! scheduler directly and reports on what it captured.

use bottle_config::{RunConfig, WorkloadConfig};
use bottle_http::{HttpIssuer, IssuerConfig};
use bottle_load::{Corpus, PhasePlan, Report, RequestBuilder, ResultSink, Scheduler};
use bottle_resilience::DisabledBreaker;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::any;
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_all_server_errors_fill_failure_tally() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let run = RunConfig::new(5, 2, 0, server.uri(), false, 30).unwrap();
    let workload = WorkloadConfig {
        requests_per_thread: 20,
        ..WorkloadConfig::default()
    };

    let issuer = HttpIssuer::new(&IssuerConfig::default(), Arc::new(DisabledBreaker)).unwrap();
    let builder = RequestBuilder::new(&run.base_url, Corpus::from_lines(["a"]).unwrap());
    let scheduler = Scheduler::new(issuer, builder, Duration::from_secs(1));

    let sink = Arc::new(ResultSink::starting_now());
    let plan = PhasePlan::main(&run, &workload);
    let phase = scheduler.run_phase(&plan, Arc::clone(&sink)).await;
    assert!(!phase.timed_out);

    let report = Report::build(
        run.thread_group_size,
        run.num_thread_groups,
        sink.freeze(),
        &phase,
        None,
    );
    assert_eq!(report.results.success_count(), 0);
    assert_eq!(report.results.failures, 5 * 2 * 20 * 2);
    assert_eq!(report.results.failures, plan.max_requests() as u64);

    let mut out = Vec::new();
    report.render(&mut out).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("No POST requests were made."));
    assert!(text.contains("No GET requests were made."));
    assert!(text.contains("Failed requests: 400"));
}
