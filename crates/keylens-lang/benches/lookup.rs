//! Member resolution benchmarks.
//!
//! - Chain depth: nested `Lens` accesses, one dynamic member call per level
//! - Hierarchy depth: a dynamic member subscript inherited through many classes

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use keylens_lang::{compile, compile_with, CompileOptions, ReadPreference};
use std::hint::black_box;

const LENS: &str = "
struct Leaf {
    var value: Int
}

@dynamicMemberLookup
struct Lens<T> {
    var obj: T
    subscript<U>(dynamicMember member: KeyPath<T, U>) -> Lens<U> { get }
    subscript<U>(dynamicMember member: WritableKeyPath<T, U>) -> Lens<U> { get set }
    subscript(dynamicMember member: String) -> Lens<Int> { get }
}
";

/// `depth` nested structs `N0 { var next: N1 }` ... ending in `Leaf`, and a
/// read and a write of `lens.next.next...value` through all of them.
fn nested_source(depth: usize) -> String {
    let mut src = String::from(LENS);
    for i in 0..depth {
        let next = if i + 1 == depth { "Leaf".to_string() } else { format!("N{}", i + 1) };
        src.push_str(&format!("struct N{i} {{ var next: {next} }}\n"));
    }
    src.push_str("var lens: Lens<N0>\nlet v: Lens<Int>\n_ = lens");
    for _ in 0..depth {
        src.push_str(".next");
    }
    src.push_str(".value\nlens");
    for _ in 0..depth {
        src.push_str(".next");
    }
    src.push_str(".value = v\n");
    src
}

/// `depth` classes each inheriting the one before, the root carrying the
/// dynamic member subscript.
fn hierarchy_source(depth: usize) -> String {
    let mut src = String::from(
        "struct P { var x: Int }\n@dynamicMemberLookup\nclass K0<T> { subscript<U>(dynamicMember member: KeyPath<T, U>) -> U { get } }\n",
    );
    for i in 1..=depth {
        src.push_str(&format!("class K{i}<T>: K{}<T> {{}}\n", i - 1));
    }
    src.push_str(&format!("let k: K{depth}<P>\n"));
    for _ in 0..32 {
        src.push_str("_ = k.x\n");
    }
    src
}

fn chain_depth_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("lookup/chain_depth");

    for depth in [1, 4, 16] {
        let src = nested_source(depth);
        group.throughput(Throughput::Bytes(src.len() as u64));
        group.bench_function(format!("depth_{depth}"), |b| {
            b.iter(|| {
                let result = compile(black_box(&src));
                black_box(result.is_ok())
            });
        });
    }

    group.finish();
}

fn preference_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("lookup/preference");
    let src = nested_source(8);

    for (name, preference) in [
        ("read_only_first", ReadPreference::ReadOnlyFirst),
        ("most_specific", ReadPreference::MostSpecific),
    ] {
        let options = CompileOptions::new().read_preference(preference);
        group.bench_function(name, |b| {
            b.iter(|| black_box(compile_with(black_box(&src), &options).is_ok()));
        });
    }

    group.finish();
}

fn hierarchy_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("lookup/hierarchy_depth");

    for depth in [1, 8, 32] {
        let src = hierarchy_source(depth);
        group.bench_function(format!("depth_{depth}"), |b| {
            b.iter(|| {
                let program = compile(black_box(&src));
                black_box(program.map(|p| p.items().len()).unwrap_or_default())
            });
        });
    }

    group.finish();
}

criterion_group!(benches, chain_depth_benchmarks, preference_benchmarks, hierarchy_benchmarks);
criterion_main!(benches);
