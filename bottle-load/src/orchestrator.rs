//! End-to-end run: corpus, warmup, main phase, report

use crate::corpus::Corpus;
use crate::error::{LoadTestError, LoadTestResult};
use crate::report::{CsvPaths, Report};
use crate::request::RequestBuilder;
use crate::scheduler::{PhasePlan, PhaseSummary, Scheduler};
use crate::sink::ResultSink;
use bottle_config::{BottleConfig, RunConfig};
use bottle_http::{HttpIssuer, IssuerConfig};
use bottle_resilience::{CircuitBreaker, CircuitBreakerConfig, DisabledBreaker, IssueGate};
use std::sync::Arc;
use tracing::{error, info};

/// Outputs of a completed run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub warmup: PhaseSummary,
    pub main: PhaseSummary,
    pub report: Report,
    pub csv: CsvPaths,
}

/// A configured load test, ready to run once
pub struct LoadTest {
    run: RunConfig,
    config: BottleConfig,
    corpus: Option<Corpus>,
    print_report: bool,
}

impl LoadTest {
    pub fn new(run: RunConfig, config: BottleConfig) -> Self {
        Self {
            run,
            config,
            corpus: None,
            print_report: true,
        }
    }

    /// Use an already loaded corpus instead of reading `corpus.path`
    pub fn with_corpus(mut self, corpus: Corpus) -> Self {
        self.corpus = Some(corpus);
        self
    }

    /// Skip the stdout summary; CSVs are still written
    pub fn quiet(mut self) -> Self {
        self.print_report = false;
        self
    }

    pub async fn run(self) -> LoadTestResult<RunSummary> {
        let corpus = match self.corpus {
            Some(corpus) => corpus,
            None => Corpus::from_config(&self.config.corpus)?,
        };

        let breaker = self
            .run
            .use_circuit_breaker
            .then(|| CircuitBreaker::new(CircuitBreakerConfig::from(&self.config.breaker)));
        let gate: Arc<dyn IssueGate> = match &breaker {
            Some(breaker) => Arc::new(breaker.clone()),
            None => Arc::new(DisabledBreaker),
        };

        let issuer = HttpIssuer::new(&IssuerConfig::from(&self.config.http), gate)?;
        let builder = RequestBuilder::new(&self.run.base_url, corpus);
        let scheduler = Scheduler::new(issuer, builder, self.config.workload.drain_timeout);

        let warmup_sink = Arc::new(ResultSink::starting_now());
        let warmup = scheduler
            .run_phase(
                &PhasePlan::warmup(&self.config.workload),
                Arc::clone(&warmup_sink),
            )
            .await;

        let succeeded = warmup_sink.success_count();
        let required = self.config.workload.warmup_success_floor();
        if succeeded < required {
            error!(
                "Warmup produced {} successful requests, {} required; aborting",
                succeeded, required
            );
            return Err(LoadTestError::WarmupShortfall {
                succeeded,
                required,
            });
        }
        info!("Initialization phase complete. Starting load test...");

        let main_sink = Arc::new(ResultSink::starting_now());
        let main = scheduler
            .run_phase(
                &PhasePlan::main(&self.run, &self.config.workload),
                Arc::clone(&main_sink),
            )
            .await;
        drop(scheduler);

        let report = Report::build(
            self.run.thread_group_size,
            self.run.num_thread_groups,
            main_sink.freeze(),
            &main,
            breaker.as_ref().map(CircuitBreaker::metrics),
        );

        let results_dir = Report::resolve_results_dir(&self.config.report.results_dir);
        let csv = report.write_csvs(&results_dir)?;
        if self.print_report {
            report.print()?;
        }

        Ok(RunSummary {
            warmup,
            main,
            report,
            csv,
        })
    }
}
