//! Standin substitution benchmarks.
//!
//! Measures the cost of substituting deeply nested declared types and wide
//! unions against matching argument types.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use standin::{
    Atomic, ClassMetadataStore, KeyedCombiner, Oracles, StandinOptions, TemplateResult, Union,
    replace_inferred, substitute,
};

fn template(name: &str) -> Union {
    Union::new(Atomic::template_param(name, None, Union::mixed()))
}

fn nested_arrays(depth: usize, innermost: Union) -> Union {
    (0..depth).fold(innermost, |inner, _| {
        Union::new(Atomic::array(Union::string(), inner))
    })
}

fn wide_union(width: usize) -> Union {
    let mut union = template("T");
    for i in 0..width {
        union.add_atomic(Atomic::named_object(format!("Model{i}")));
    }
    union
}

fn bench_nested_substitution(c: &mut Criterion) {
    let classes = ClassMetadataStore::new();
    let oracles = Oracles::new(&KeyedCombiner, &classes);
    let mut group = c.benchmark_group("standin_nested");

    for depth in [1usize, 8, 32] {
        let declared = nested_arrays(depth, template("T"));
        let argument = nested_arrays(depth, Union::int());

        group.bench_with_input(BenchmarkId::new("substitute", depth), &depth, |b, _| {
            b.iter(|| {
                let mut result = TemplateResult::new();
                result.add_template_type("T", None, Union::mixed());
                let standin = substitute(
                    black_box(&declared),
                    &mut result,
                    oracles,
                    Some(black_box(&argument)),
                    None,
                    StandinOptions::standin(),
                    0,
                )
                .expect("substitution failed");
                black_box(standin.len());
            });
        });

        group.bench_with_input(BenchmarkId::new("replace_inferred", depth), &depth, |b, _| {
            let mut result = TemplateResult::new();
            result.add_template_type("T", None, Union::mixed());
            substitute(
                &declared,
                &mut result,
                oracles,
                Some(&argument),
                None,
                StandinOptions::standin(),
                0,
            )
            .expect("substitution failed");

            b.iter(|| {
                let replaced = replace_inferred(black_box(&declared), &result, &KeyedCombiner)
                    .expect("replacement failed");
                black_box(replaced.len());
            });
        });
    }

    group.finish();
}

fn bench_untouched_union(c: &mut Criterion) {
    let classes = ClassMetadataStore::new();
    let oracles = Oracles::new(&KeyedCombiner, &classes);
    let mut group = c.benchmark_group("standin_wide");

    for width in [4usize, 64] {
        let declared = wide_union(width);

        group.bench_with_input(BenchmarkId::new("no_template_types", width), &width, |b, _| {
            b.iter(|| {
                let mut result = TemplateResult::new();
                let standin = substitute(
                    black_box(&declared),
                    &mut result,
                    oracles,
                    None,
                    None,
                    StandinOptions::standin(),
                    0,
                )
                .expect("substitution failed");
                black_box(standin.len());
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_nested_substitution, bench_untouched_union);
criterion_main!(benches);
