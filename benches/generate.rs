use criterion::{black_box, criterion_group, criterion_main, Criterion};
use uuid::Uuid;

use uuid_ninja::ident::{self, HashVersion, LetterCase};
use uuid_ninja::negotiate::{select_encoding, Encoding};

fn bench_namespace_hash(c: &mut Criterion) {
    let namespace = Uuid::NAMESPACE_DNS;
    c.bench_function("hash_v3_short_name", |b| {
        b.iter(|| ident::hash(HashVersion::V3, black_box(&namespace), black_box(b"example.org")));
    });
    c.bench_function("hash_v5_short_name", |b| {
        b.iter(|| ident::hash(HashVersion::V5, black_box(&namespace), black_box(b"example.org")));
    });
    c.bench_function("hash_str_v5_with_validation", |b| {
        b.iter(|| {
            ident::hash_str(
                HashVersion::V5,
                black_box("6ba7b810-9dad-11d1-80b4-00c04fd430c8"),
                black_box(b"example.org"),
            )
        });
    });
}

fn bench_random(c: &mut Criterion) {
    c.bench_function("v4_os_rng", |b| {
        b.iter(|| black_box(ident::v4()));
    });
}

fn bench_v7_pack(c: &mut Criterion) {
    let mut seq = 5000_u64;
    c.bench_function("v7_pack", |b| {
        b.iter(|| {
            seq += 1;
            ident::pack_v7(black_box(1_700_000_000_000), black_box(seq), black_box(0x2a5))
        });
    });
}

fn bench_render(c: &mut Criterion) {
    let id = Uuid::NAMESPACE_URL;
    c.bench_function("render_upper", |b| {
        b.iter(|| LetterCase::Upper.render(black_box(&id)));
    });
}

fn bench_negotiation(c: &mut Criterion) {
    let accepts = [
        Some("text/plain"),
        Some("application/json; charset=utf-8"),
        Some("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
        None,
    ];
    c.bench_function("select_encoding_mixed", |b| {
        b.iter(|| {
            for accept in accepts {
                black_box(select_encoding(black_box(accept), Encoding::Json));
            }
        });
    });
}

criterion_group!(
    benches,
    bench_namespace_hash,
    bench_random,
    bench_v7_pack,
    bench_render,
    bench_negotiation
);
criterion_main!(benches);
