use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use edgelink_core::LinkerConfig;
use edgelink_files::{FilePath, FileRecord, Origin};
use edgelink_linker::{Linker, ModuleRewriter, PatchApplier};
use std::fmt::Write;
use std::hint::black_box;

/// Builds a module with `imports` import lines and a body of comparable size.
fn module_source(imports: usize) -> String {
    let mut src = String::new();
    for i in 0..imports {
        let _ = writeln!(src, "import {{ helper{i} as h{i} }} from '../_libs/lib_{i}.mjs';");
    }
    for i in 0..imports {
        let _ = writeln!(
            src,
            "const value{i} = h{i}(`template ${{{i}}}`) /* call */ + 'str{i}'; // trailing"
        );
    }
    src.push_str("export default () => value0;\n");
    src
}

/// Benchmark rewriting a single module by import count
fn bench_rewrite(c: &mut Criterion) {
    let mut group = c.benchmark_group("rewrite");
    let rewriter = ModuleRewriter::new(&LinkerConfig::default());
    let path = FilePath::new("chunks/_routes/page.mjs").unwrap();

    for imports in [10, 100, 1000] {
        let src = module_source(imports);
        group.throughput(Throughput::Bytes(src.len() as u64));
        group.bench_with_input(BenchmarkId::new("imports", imports), &src, |b, src| {
            b.iter(|| rewriter.rewrite_source(black_box(&path), black_box(src)).unwrap());
        });
    }

    group.finish();
}

/// Benchmark the structural patches over large concatenated text
fn bench_patches(c: &mut Criterion) {
    let mut group = c.benchmark_group("patches");
    let applier = PatchApplier::with_defaults().unwrap();

    for modules in [10, 100] {
        let text = (0..modules).map(|_| module_source(20)).collect::<Vec<_>>().join("\n");
        group.bench_with_input(BenchmarkId::new("apply", modules), &text, |b, text| {
            b.iter(|| applier.apply(black_box(text)));
        });
    }

    group.finish();
}

/// Benchmark a full in-memory link
fn bench_link(c: &mut Criterion) {
    let mut group = c.benchmark_group("link");
    let linker = Linker::new(LinkerConfig::default()).unwrap();

    for count in [10, 100] {
        let mut records: Vec<FileRecord> = (0..count)
            .map(|i| {
                FileRecord::new(
                    FilePath::new(format!("chunks/_routes/page_{i}.mjs")).unwrap(),
                    module_source(5),
                    Origin::Server,
                )
            })
            .collect();
        records.push(FileRecord::new(
            FilePath::new("index.mjs").unwrap(),
            "export default {};",
            Origin::Server,
        ));
        records.push(FileRecord::new(
            FilePath::new("public/index.html").unwrap(),
            "<html></html>",
            Origin::Public,
        ));

        group.bench_with_input(BenchmarkId::new("modules", count), &records, |b, records| {
            b.iter(|| linker.link_records(black_box(records.clone())).unwrap());
        });
    }

    group.finish();
}

criterion_group!(benches, bench_rewrite, bench_patches, bench_link);
criterion_main!(benches);
