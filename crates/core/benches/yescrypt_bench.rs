//! Benchmark for the yescrypt algorithm

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use yescrypt_core::{Params, SboxMode, Yescrypt};

fn bench_yenten(c: &mut Criterion) {
    let mut hasher = Yescrypt::new(Params::yenten()).unwrap();
    let header = [0x5au8; 80];

    c.bench_function("yenten_single", |b| {
        b.iter(|| hasher.compute(black_box(&header), black_box(&header)))
    });
}

fn bench_yenten_varying_nonce(c: &mut Criterion) {
    let mut hasher = Yescrypt::new(Params::yenten()).unwrap();

    c.bench_function("yenten_varying", |b| {
        let mut header = [0u8; 80];
        let mut nonce: u32 = 0;
        b.iter(|| {
            header[76..].copy_from_slice(&nonce.to_le_bytes());
            nonce = nonce.wrapping_add(1);
            hasher.compute(black_box(&header), black_box(&header))
        })
    });
}

fn bench_modes(c: &mut Criterion) {
    let mut group = c.benchmark_group("modes_n1024_r8");
    let configs = [
        ("classic", Params::classic(1024, 8, 1).unwrap()),
        (
            "read_write",
            Params::builder()
                .n(1024)
                .r(8)
                .sboxes(SboxMode::Disabled)
                .build()
                .unwrap(),
        ),
        ("pwxform", Params::builder().n(1024).r(8).build().unwrap()),
        (
            "pwxform_write_back",
            Params::builder()
                .n(1024)
                .r(8)
                .sboxes(SboxMode::WriteBack)
                .build()
                .unwrap(),
        ),
    ];

    for (name, params) in configs {
        let mut hasher = Yescrypt::new(params).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(name), &params, |b, _| {
            b.iter(|| hasher.compute(black_box(b"password"), black_box(b"salt")))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_yenten, bench_yenten_varying_nonce, bench_modes);
criterion_main!(benches);
