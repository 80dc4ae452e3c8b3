//! Performance benchmarks for IR lowering.
//!
//! Units are generated synthetically so the suite measures the lowering pass
//! alone:
//! - Straight-line: temporaries, copies and arithmetic
//! - Branchy: many forward branches converging on join points
//! - Loops: nested `for` loops
//! - Concatenation: many small units appended into one
//!
//! ## Profiling with Puffin
//!
//! ```bash
//! cargo bench --features profile-with-puffin -- --profile-time 5
//! ```

use bcir::prelude::*;
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;

#[cfg(feature = "profile-with-puffin")]
static FRAME_VIEW: std::sync::OnceLock<puffin::GlobalFrameView> = std::sync::OnceLock::new();

/// Initialize puffin profiler.
#[cfg(feature = "profile-with-puffin")]
fn setup_profiler() {
    puffin::set_scopes_on(true);
    FRAME_VIEW.get_or_init(puffin::GlobalFrameView::default);
}

#[cfg(not(feature = "profile-with-puffin"))]
fn setup_profiler() {}

/// Call at the end of each benchmark iteration to flush profiling data.
#[cfg(feature = "profile-with-puffin")]
fn end_profiling_frame() {
    puffin::GlobalProfiler::lock().new_frame();
}

#[cfg(not(feature = "profile-with-puffin"))]
fn end_profiling_frame() {}

/// Print how many frames the profiler recorded.
#[cfg(feature = "profile-with-puffin")]
fn print_profiling_stats() {
    let Some(frame_view) = FRAME_VIEW.get() else {
        println!("Profiler not initialized");
        return;
    };
    let view = frame_view.lock();
    let frames = view.recent_frames().count();
    println!("\n=== Profiling: {} lowering frames recorded ===\n", frames);
}

#[cfg(not(feature = "profile-with-puffin"))]
fn print_profiling_stats() {}

const LOC: LocOffset = LocOffset::UNKNOWN;

/// `n` statements of `tmp = param0 + i; param1 = tmp`.
fn straight_line(n: usize) -> BcIr {
    let mut ir = BcIr::new();
    for i in 0..n {
        let tmp = ir.allocate("tmp");
        ir.add(BcIrInstr::op(
            LOC,
            Opcode::Plus,
            vec![
                BcIrOperand::In(Local::new(0).into()),
                BcIrOperand::Const(Value::Int(i as i64)),
                BcIrOperand::Out(tmp.into()),
            ],
        ));
        ir.add(BcIrInstr::cp(LOC, tmp, Local::new(1)));
        ir.release(tmp);
    }
    ir.add(BcIrInstr::ret(LOC, Local::new(1)));
    ir
}

/// `n` if/else chains, each joining three branches.
fn branchy(n: usize) -> BcIr {
    let mut ir = BcIr::new();
    for i in 0..n {
        let else_ = ir.branch_if_slot(LOC, Value::Bool(i % 2 == 0), JumpCond::IfFalse);
        ir.add(BcIrInstr::cp(LOC, Value::Int(1), Local::new(0)));
        let end = ir.branch(LOC);
        ir.place_label(else_);
        let skip = ir.branch_if(LOC, Local::new(0).into(), JumpCond::IfTrue);
        ir.add(BcIrInstr::cp(LOC, Value::Int(2), Local::new(0)));
        ir.place_labels([end, skip]);
    }
    ir.add(BcIrInstr::ret(LOC, Local::new(0)));
    ir
}

/// `n` sequential loops, each with one nested loop.
fn loops(n: usize) -> BcIr {
    let mut ir = BcIr::new();
    for _ in 0..n {
        let outer = ir.allocate("outer");
        let inner = ir.allocate("inner");
        ir.for_init(LOC, Local::new(0), outer.into());
        ir.for_init(LOC, outer, inner.into());
        ir.add(BcIrInstr::op(
            LOC,
            Opcode::Plus,
            vec![
                BcIrOperand::In(Local::new(1).into()),
                BcIrOperand::In(inner.into()),
                BcIrOperand::Out(Local::new(1).into()),
            ],
        ));
        ir.for_close(LOC);
        ir.for_close(LOC);
        ir.release(inner);
        ir.release(outer);
    }
    ir.add(BcIrInstr::ret(LOC, Local::new(1)));
    ir
}

/// Benchmark lowering across unit sizes.
fn lowering_benchmarks(c: &mut Criterion) {
    setup_profiler();

    let shapes: [(&str, fn(usize) -> BcIr); 3] = [
        ("straight_line", straight_line),
        ("branchy", branchy),
        ("loops", loops),
    ];

    for (name, build) in shapes {
        let mut group = c.benchmark_group(format!("write/{name}"));
        for size in [10, 100, 1000] {
            let ir = build(size);
            group.throughput(Throughput::Elements(ir.len() as u64));
            group.bench_with_input(BenchmarkId::from_parameter(size), &ir, |b, ir| {
                b.iter(|| {
                    let code = ir.write(black_box(WriteOptions::new(2))).unwrap();
                    end_profiling_frame();
                    black_box(code.len())
                });
            });
        }
        group.finish();
    }

    print_profiling_stats();
}

/// Benchmark building and lowering many small units appended together.
fn concatenation_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("append");

    group.bench_function("append_100_units", |b| {
        b.iter(|| {
            let mut ir = BcIr::new();
            for _ in 0..100 {
                ir.append(branchy(4));
            }
            black_box(ir.write(WriteOptions::new(2)).unwrap().len())
        });
    });

    group.finish();
}

/// Benchmark the shape recognizers.
fn recognizer_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("recognize");

    let mut type_check = BcIr::new();
    let result = type_check.allocate("result");
    type_check.add(BcIrInstr::type_is(LOC, Local::new(0), "string", result));
    type_check.add(BcIrInstr::ret(LOC, result));

    group.bench_function("type_check_hit", |b| {
        b.iter(|| black_box(type_check.returns_type_check_of_param0()));
    });

    let large = straight_line(1000);
    group.bench_function("large_miss", |b| {
        b.iter(|| {
            black_box(large.returns_constant());
            black_box(large.returns_type_check_of_param0())
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    lowering_benchmarks,
    concatenation_benchmarks,
    recognizer_benchmarks
);

criterion_main!(benches);
