//! Interpreter throughput on the storage loop and hashing fixtures.
//!
//! ```bash
//! cargo bench --package keel-vm --bench interpreter
//! ```

use bytes::Bytes;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use keel_primitives::Address;
use keel_vm::{Env, InMemoryBackend, Params, Schedule, Vm};

fn run(c: &mut Criterion, name: &str, bytecode: &str, gas: u64) {
    let code = Bytes::from(hex::decode(bytecode).expect("valid hex"));
    let schedule = Schedule::frontier();
    let env = Env::default();
    let backend = InMemoryBackend::new();
    let address = Address::from_low_bytes(&[0xea, 0x0e, 0x9a]);

    c.bench_function(name, |b| {
        b.iter(|| {
            let mut vm = Vm::new(&schedule, &env);
            let params = Params::new(address, address, gas, code.clone(), Bytes::new());
            black_box(vm.execute(params, &backend).expect("top-level call"))
        })
    });
}

fn bench_jumps_loop(c: &mut Criterion) {
    run(
        c,
        "vm/jumps_loop",
        "600160015560066000555b60016000540380806000551560245760015402600155600a565b",
        150_000,
    );
}

fn bench_sha3(c: &mut Criterion) {
    // SHA3 over 1 KiB of memory, 64 times
    let body = "61040060002050".repeat(64);
    run(c, "vm/sha3_1k", &body, 10_000_000);
}

fn bench_arithmetic(c: &mut Criterion) {
    let body = "65012365124623626543219002600055".repeat(16);
    run(c, "vm/arithmetic", &body, 10_000_000);
}

criterion_group!(benches, bench_jumps_loop, bench_sha3, bench_arithmetic);
criterion_main!(benches);
