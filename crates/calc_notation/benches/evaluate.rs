use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn bench_evaluate(c: &mut Criterion) {
    c.bench_function("derivative", |b| {
        b.iter(|| calc_notation::evaluate(black_box("d/dx(x^2)")))
    });
    c.bench_function("nested_ftc", |b| {
        b.iter(|| calc_notation::evaluate(black_box("∫(d/dx(x^2)) dx")))
    });
    c.bench_function("limit_lhopital", |b| {
        b.iter(|| calc_notation::evaluate(black_box("lim_{x->0}(sin(x)/x)")))
    });
    c.bench_function("definite_integral", |b| {
        b.iter(|| calc_notation::evaluate(black_box("∫_0^1 x^2 dx")))
    });
}

criterion_group!(benches, bench_evaluate);
criterion_main!(benches);
