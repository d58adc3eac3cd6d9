use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

use sparsemul::memory::BitWordMemory;
use sparsemul::sampling::{DENSE_DOMAIN, VectorSampler};
use sparsemul::{Config, DummyInsertion, Multiplier, ParameterSet, golden, hqc1, hqc3, hqc5};

/// Deterministic dense operand and an evenly spread sparse support
fn bench_operands<P: ParameterSet>() -> (BitWordMemory, Vec<u32>) {
    let n = P::HQC_N;
    let dense = VectorSampler::new(&[0x42u8; 32], DENSE_DOMAIN).dense(n as usize);
    let step = n / P::HQC_OMEGA;
    let sparse = (0..P::HQC_OMEGA).map(|i| i * step).collect();
    (dense, sparse)
}

fn bench_multiply<P: ParameterSet>(c: &mut Criterion, name: &str) {
    let (dense, sparse) = bench_operands::<P>();
    let mut multiplier = Multiplier::<P>::new(Config::for_params::<P>()).unwrap();

    c.bench_with_input(
        BenchmarkId::new("multiply", name),
        &(&dense, &sparse),
        |b, (dense, sparse)| {
            b.iter(|| multiplier.multiply(dense, sparse).unwrap());
        },
    );
}

fn bench_golden<P: ParameterSet>(c: &mut Criterion, name: &str) {
    let (dense, sparse) = bench_operands::<P>();

    c.bench_with_input(
        BenchmarkId::new("golden", name),
        &(&dense, &sparse),
        |b, (dense, sparse)| {
            b.iter(|| golden::cyclic_product(dense, sparse).unwrap());
        },
    );
}

fn bench_dummy_insertion<P: ParameterSet>(c: &mut Criterion, name: &str) {
    let (_, sparse) = bench_operands::<P>();
    let insertion = DummyInsertion::from(&Config::for_params::<P>());

    c.bench_with_input(BenchmarkId::new("dummy_insertion", name), &sparse, |b, sparse| {
        b.iter(|| insertion.process(sparse).unwrap());
    });
}

fn polymult_benchmarks(c: &mut Criterion) {
    bench_dummy_insertion::<hqc1::Hqc1Params>(c, "hqc1");
    bench_multiply::<hqc1::Hqc1Params>(c, "hqc1");
    bench_golden::<hqc1::Hqc1Params>(c, "hqc1");

    bench_dummy_insertion::<hqc3::Hqc3Params>(c, "hqc3");
    bench_multiply::<hqc3::Hqc3Params>(c, "hqc3");
    bench_golden::<hqc3::Hqc3Params>(c, "hqc3");

    bench_dummy_insertion::<hqc5::Hqc5Params>(c, "hqc5");
    bench_multiply::<hqc5::Hqc5Params>(c, "hqc5");
    bench_golden::<hqc5::Hqc5Params>(c, "hqc5");
}

criterion_group!(benches, polymult_benchmarks);
criterion_main!(benches);
