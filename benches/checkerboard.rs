use criterion::{black_box, criterion_group, criterion_main, Criterion};

use polyclip::{
    binary_op_with,
    generators::{checkerboard, slanted_checkerboard, slanties},
    BinaryOp, Options,
};

fn xor(c: &mut Criterion) {
    let (even, odd) = checkerboard(10);
    let opts = Options::default();
    c.bench_function("checkerboard xor", |b| {
        b.iter(|| black_box(binary_op_with(&even, &odd, BinaryOp::Xor, &opts).unwrap()))
    });
}

fn slanted(c: &mut Criterion) {
    let (even, odd) = slanted_checkerboard(10);
    let opts = Options::default();
    c.bench_function("slanted checkerboard xor", |b| {
        b.iter(|| black_box(binary_op_with(&even, &odd, BinaryOp::Xor, &opts).unwrap()))
    });
}

fn crossings(c: &mut Criterion) {
    let (even, odd) = slanties(20);
    let opts = Options::default();
    c.bench_function("slanties union", |b| {
        b.iter(|| black_box(binary_op_with(&even, &odd, BinaryOp::Union, &opts).unwrap()))
    });
}

criterion_group!(benches, xor, slanted, crossings);
criterion_main!(benches);
