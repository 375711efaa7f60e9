/// Detector Overhead Benchmarks
///
/// Measures the cost of judging one new sample against a full window, per
/// method, plus the end-to-end cost of ingesting a sample into a session.
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use spikewatch::generators::{GeneratorKind, GeneratorSettings, SignalGenerator};
use spikewatch::session::{Session, SessionConfig};
use spikewatch::{dispatch, DetectionMethod, ParamBag, SampleWindow};
use std::time::{Duration, SystemTime};

fn full_window(capacity: usize) -> SampleWindow {
    let generator = SignalGenerator::new(GeneratorSettings::new(GeneratorKind::StockPrice), Some(7))
        .expect("default generator settings are valid");
    let mut window = SampleWindow::new(capacity);
    for value in generator.take(capacity) {
        window.push(value);
    }
    window
}

/// Benchmark each detector on the default 200-sample window
fn bench_detectors(c: &mut Criterion) {
    let mut group = c.benchmark_group("detectors");
    group.measurement_time(Duration::from_secs(5));
    group.throughput(Throughput::Elements(1));

    let mut window = full_window(200);
    let samples = window.as_slice().to_vec();
    let params = ParamBag::new();

    for method in DetectionMethod::ALL {
        group.bench_function(method.slug(), |b| {
            b.iter(|| dispatch(black_box(&samples), method.name(), &params));
        });
    }

    group.finish();
}

/// Benchmark Grubbs' test across window sizes (critical value dominates)
fn bench_grubbs_window_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("grubbs_window_sizes");
    group.measurement_time(Duration::from_secs(5));

    for size in [20usize, 50, 200, 1000].iter() {
        let samples = full_window(*size).snapshot();
        group.bench_with_input(BenchmarkId::from_parameter(size), &samples, |b, samples| {
            b.iter(|| spikewatch::detectors::grubbs_test(black_box(samples), 0.05));
        });
    }

    group.finish();
}

/// Benchmark a full ingest cycle: push, view, detect, score, record
fn bench_session_ingest(c: &mut Criterion) {
    let mut group = c.benchmark_group("session_ingest");
    group.measurement_time(Duration::from_secs(5));
    group.throughput(Throughput::Elements(1));

    for method in [DetectionMethod::ZScore, DetectionMethod::GrubbsTest] {
        group.bench_function(method.slug(), |b| {
            let mut session = Session::new(SessionConfig {
                params: method.default_params(),
                ..SessionConfig::default()
            });
            let mut generator =
                SignalGenerator::new(GeneratorSettings::new(GeneratorKind::Temperature), Some(3))
                    .expect("default generator settings are valid");
            let now = SystemTime::now();
            b.iter(|| session.ingest(black_box(generator.next_value()), now));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_detectors,
    bench_grubbs_window_sizes,
    bench_session_ingest
);
criterion_main!(benches);
