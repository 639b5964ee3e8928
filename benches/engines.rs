//! Times the three engines against the programs in `sample_code/`.

use bfi::{execute_to_vec, Config, Engine, Program};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

const SAMPLES: &[(&str, &str, &[u8])] = &[
    ("hello", include_str!("../sample_code/hello.bf"), b""),
    (
        "echo_line",
        include_str!("../sample_code/echo_line.bf"),
        b"179424691\n",
    ),
    ("nested", include_str!("../sample_code/nested.bf"), b""),
];

fn bench_engines(c: &mut Criterion) {
    for &(name, source, input) in SAMPLES {
        let program = Program::from(source);
        let mut group = c.benchmark_group(name);

        for &engine in &Engine::ALL {
            group.bench_with_input(
                BenchmarkId::from_parameter(engine),
                &program,
                |b, program| {
                    b.iter(|| {
                        execute_to_vec(engine, Config::default(), black_box(program), input)
                            .expect("sample programs run cleanly")
                    })
                },
            );
        }
        group.finish();
    }
}

criterion_group!(benches, bench_engines);
criterion_main!(benches);
