//! Sequencing of a full harness run.

use linecheck_core::catalog;

use crate::config::{HarnessConfig, LeakDetector, absolute};
use crate::errors::{HarnessError, HarnessResult};
use crate::execution::ExecutionHarness;
use crate::fixtures::FixtureStore;
use crate::hardcore::HardcoreSuite;
use crate::matrix::BuildMatrix;
use crate::report::{ConfigurationReport, ResultReporter, RunReport};
use crate::template;

/// Run every stage for `config`, reporting as it goes.
///
/// Returns `Err` only for conditions that make the rest of the run meaningless; everything the library under test
/// does is in the returned report. The reporter's `on_run_complete` is called whenever the build stage was reached.
#[tracing::instrument(skip_all, fields(variant = %config.variant, buffers = config.buffer_sizes.len()))]
pub fn run_harness(config: &HarnessConfig, reporter: &mut dyn ResultReporter) -> HarnessResult<RunReport> {
    config.validate()?;
    let leak_detector = config.leak_detector.as_ref().map(LeakDetector::resolved).transpose()?;
    if let Some(detector) = &leak_detector {
        detector.probe()?;
    }
    reporter.on_run_start(config);

    let mut report = RunReport::new(config);

    // Artifacts run from the fixture directory, so it must not depend on our own working directory.
    let fixtures_dir = config.fixtures_dir();
    let fixtures_dir = absolute(&fixtures_dir).map_err(|source| HarnessError::Fixture {
        path: fixtures_dir.clone(),
        source,
    })?;
    let store = FixtureStore::new(fixtures_dir);
    let manifest = store.generate(config.variant, config.stress_descriptors, config.seed)?;
    reporter.on_fixtures_ready(&manifest);

    let template_path = template::write_template(&config.build_dir())?;
    let matrix = BuildMatrix::new(config, &template_path)?;
    let harness = ExecutionHarness::new(&manifest.dir, leak_detector)
        .with_expected_total(catalog::expected_total(config.variant, config.stress_descriptors));

    for configuration in matrix.configurations() {
        reporter.on_configuration_start(&configuration);
        let build = matrix.build(&configuration);
        let execution = build.artifact().map(|artifact| harness.run_verification(artifact));
        let configuration_report = ConfigurationReport::new(build, execution);
        reporter.on_configuration_complete(&configuration_report);
        report.push_configuration(configuration_report);
    }

    if config.run_hardcore {
        match report.last_artifact() {
            Some(artifact) => {
                reporter.on_hardcore_start(&artifact);
                let suite = HardcoreSuite::new(config.variant, config.robustness, &manifest);
                for outcome in suite.run(&artifact, |outcome| reporter.on_hardcore_complete(outcome)) {
                    report.push_hardcore(outcome);
                }
            }
            None => {
                let reason = "no configuration compiled".to_string();
                tracing::warn!("{reason}, skipping hardcore suite");
                reporter.on_hardcore_skipped(&reason);
                report.hardcore_skipped = Some(reason);
            }
        }
    } else {
        report.hardcore_skipped = Some("disabled".to_string());
    }

    report.fixtures = Some(manifest);
    reporter.on_run_complete(&report);

    if let Some(path) = &config.json_report {
        report.write_json(path)?;
    }
    Ok(report)
}
