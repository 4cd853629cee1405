//! Exact end-to-end bounds through the real HiGHS backend.
//!
//! Run with `cargo test --features highs`.

#![cfg(feature = "highs")]

mod common;

use common::adds;
use timebound_engine::{
    BasicBlock, EngineConfig, Function, FunctionLoops, ModuleLoops, NaturalLoop, Program,
    WcetEngine,
};

fn run(program: &Program, loops: &ModuleLoops, config: EngineConfig) -> u64 {
    WcetEngine::new(config).run(program, loops).unwrap().wcet
}

fn single_loop(trip_count: u32) -> (Program, ModuleLoops) {
    let program = Program::new(vec![Function::new(
        "main",
        vec![
            BasicBlock::new("h")
                .with_instrs(adds(1))
                .with_successors(vec!["b"])
                .returning(),
            BasicBlock::new("b")
                .with_instrs(adds(4))
                .with_successors(vec!["h"]),
        ],
    )]);
    let mut loops = ModuleLoops::default();
    loops.insert(
        "main",
        FunctionLoops::new(vec![
            NaturalLoop::new("h", vec!["b"]).with_trip_count(trip_count)
        ]),
    );
    (program, loops)
}

#[test]
fn straight_line_is_eight_cycles() {
    let program = Program::new(vec![Function::new(
        "main",
        vec![
            BasicBlock::new("a").with_instrs(adds(3)).with_successors(vec!["b"]),
            BasicBlock::new("b").with_instrs(adds(5)).returning(),
        ],
    )]);
    assert_eq!(run(&program, &ModuleLoops::default(), EngineConfig::default()), 8);
}

#[test]
fn diamond_is_thirteen_cycles() {
    let program = Program::new(vec![Function::new(
        "main",
        vec![
            BasicBlock::new("a")
                .with_instrs(adds(2))
                .with_successors(vec!["b", "c"]),
            BasicBlock::new("b")
                .with_instrs(adds(10))
                .with_successors(vec!["d"]),
            BasicBlock::new("c")
                .with_instrs(adds(4))
                .with_successors(vec!["d"]),
            BasicBlock::new("d").with_instrs(adds(1)).returning(),
        ],
    )]);
    let report = WcetEngine::new(EngineConfig::default())
        .run(&program, &ModuleLoops::default())
        .unwrap();
    assert_eq!(report.wcet, 13);
    // a=2, b=3, c=4, d=5: the cheap arm is not taken
    assert_eq!(report.count(3), 1);
    assert_eq!(report.count(4), 0);
    assert_eq!(report.count(5), 1);
}

#[test]
fn single_loop_is_twentyone_cycles() {
    let (program, loops) = single_loop(5);
    let report = WcetEngine::new(EngineConfig::default())
        .run(&program, &loops)
        .unwrap();
    assert_eq!(report.wcet, 21);
    // Entry=0, Exit=1, h=2, b=3
    assert_eq!(report.count(2), 5);
    assert_eq!(report.count(3), 4);
    assert_eq!(report.flow(3, 2), 4);
    assert_eq!(report.flow(2, 1), 1);
}

#[test]
fn nested_loops_hit_the_flow_optimum() {
    let program = Program::new(vec![Function::new(
        "main",
        vec![
            BasicBlock::new("o")
                .with_instrs(adds(1))
                .with_successors(vec!["i"])
                .returning(),
            BasicBlock::new("i")
                .with_instrs(adds(1))
                .with_successors(vec!["b", "o"]),
            BasicBlock::new("b")
                .with_instrs(adds(2))
                .with_successors(vec!["i"]),
        ],
    )]);
    let mut loops = ModuleLoops::default();
    loops.insert(
        "main",
        FunctionLoops::new(vec![
            NaturalLoop::new("o", vec!["i"]).with_trip_count(3),
            NaturalLoop::new("i", vec!["b"])
                .with_trip_count(4)
                .with_parent("o"),
        ]),
    );
    let report = WcetEngine::new(EngineConfig::default())
        .run(&program, &loops)
        .unwrap();
    assert_eq!(report.wcet, 23);
    // Entry=0, Exit=1, o=2, i=3, b=4
    assert_eq!(report.count(2), 3);
    assert_eq!(report.count(3), 8);
    assert_eq!(report.count(4), 6);
}

#[test]
fn monotone_in_loop_bounds() {
    let mut previous = 0;
    for trip_count in [1, 2, 5, 16] {
        let (program, loops) = single_loop(trip_count);
        let wcet = run(&program, &loops, EngineConfig::default());
        assert!(wcet >= previous, "bound {trip_count} decreased the WCET");
        previous = wcet;
    }
}

#[test]
fn auto_matches_named_backend() {
    let (program, loops) = single_loop(5);
    let auto = run(&program, &loops, EngineConfig::default());
    let named = run(
        &program,
        &loops,
        EngineConfig::new().with_solver_name("highs").unwrap(),
    );
    assert_eq!(auto, named);
}

#[test]
fn lp_relaxation_is_an_upper_bound() {
    let (program, loops) = single_loop(5);
    let integral = run(&program, &loops, EngineConfig::default());
    let relaxed = run(&program, &loops, EngineConfig::new().with_lp_relaxation());
    assert!(relaxed >= integral);
}
