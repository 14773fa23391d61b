use criterion::{black_box, criterion_group, criterion_main, Criterion};

use molgraph::{
    structure_key, BondOrder, Element, ExactMatcher, MatchFlags, Molecule, SearchStatus,
    SubstructureMatcher,
};

fn ring(n: usize) -> Molecule {
    let mut mol = Molecule::new();
    let vs: Vec<_> = (0..n).map(|_| mol.add_element(Element::C)).collect();
    for i in 0..n {
        mol.add_bond(vs[i], vs[(i + 1) % n], BondOrder::Single);
    }
    mol
}

/// Carbocycle with an oxygen on every third position. The substituents break
/// the rotational symmetry so exact matching cannot finish on the first
/// candidate chain it tries.
fn substituted_ring(n: usize) -> Molecule {
    let mut mol = Molecule::new();
    let vs: Vec<_> = (0..n).map(|_| mol.add_element(Element::C)).collect();
    for i in 0..n {
        mol.add_bond(vs[i], vs[(i + 1) % n], BondOrder::Single);
    }
    for i in (0..n).step_by(3) {
        let o = mol.add_element(Element::O);
        mol.add_bond(vs[i], o, BondOrder::Single);
    }
    mol
}

fn chain(n: usize) -> Molecule {
    let mut mol = Molecule::new();
    let vs: Vec<_> = (0..n).map(|_| mol.add_element(Element::C)).collect();
    for w in vs.windows(2) {
        mol.add_bond(w[0], w[1], BondOrder::Single);
    }
    mol
}

fn bench_exact(c: &mut Criterion) {
    let small = substituted_ring(8);
    let medium = substituted_ring(24);
    let large = substituted_ring(60);

    let mut group = c.benchmark_group("exact");

    group.bench_function("ring8", |b| {
        b.iter(|| {
            let mut m = ExactMatcher::new(black_box(&small), black_box(&small), MatchFlags::ALL)
                .unwrap();
            black_box(m.find())
        })
    });
    group.bench_function("ring24", |b| {
        b.iter(|| {
            let mut m = ExactMatcher::new(black_box(&medium), black_box(&medium), MatchFlags::ALL)
                .unwrap();
            black_box(m.find())
        })
    });
    group.bench_function("ring60", |b| {
        b.iter(|| {
            let mut m = ExactMatcher::new(black_box(&large), black_box(&large), MatchFlags::ALL)
                .unwrap();
            black_box(m.find())
        })
    });

    group.finish();
}

fn bench_substructure(c: &mut Criterion) {
    let needle = chain(4);
    let medium = ring(24);
    let large = ring(60);

    let mut group = c.benchmark_group("substructure");

    group.bench_function("first/ring24", |b| {
        b.iter(|| {
            let mut m =
                SubstructureMatcher::new(black_box(&needle), black_box(&medium), MatchFlags::ALL)
                    .unwrap();
            black_box(m.find())
        })
    });
    group.bench_function("all/ring24", |b| {
        b.iter(|| {
            let mut m =
                SubstructureMatcher::new(black_box(&needle), black_box(&medium), MatchFlags::ALL)
                    .unwrap();
            let mut hits = 0u32;
            while m.find_next() == SearchStatus::Found {
                hits += 1;
            }
            black_box(hits)
        })
    });
    group.bench_function("all/ring60", |b| {
        b.iter(|| {
            let mut m =
                SubstructureMatcher::new(black_box(&needle), black_box(&large), MatchFlags::ALL)
                    .unwrap();
            let mut hits = 0u32;
            while m.find_next() == SearchStatus::Found {
                hits += 1;
            }
            black_box(hits)
        })
    });

    group.finish();
}

fn bench_structure_key(c: &mut Criterion) {
    let small = chain(8);
    let medium = substituted_ring(24);
    let large = substituted_ring(120);

    let mut group = c.benchmark_group("structure_key");

    group.bench_function("chain8", |b| {
        b.iter(|| black_box(structure_key(black_box(&small))))
    });
    group.bench_function("ring24", |b| {
        b.iter(|| black_box(structure_key(black_box(&medium))))
    });
    group.bench_function("ring120", |b| {
        b.iter(|| black_box(structure_key(black_box(&large))))
    });

    group.finish();
}

criterion_group!(benches, bench_exact, bench_substructure, bench_structure_key);
criterion_main!(benches);
