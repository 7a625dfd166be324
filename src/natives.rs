//! Native function registration. Shape grounded on
//! `hinton-lang-Hinton/src/natives.rs`'s registration-table pattern, trimmed
//! to the single `clock()` native the bytecode contract names — no iterator,
//! assertion, or I/O natives, since this language doesn't expose those
//! surfaces.

use std::sync::OnceLock;
use std::time::Instant;

use crate::object::{fnv1a_hash, Heap, NativeFn, NativeObj, Object, StringObj};
use crate::table::Table;
use crate::value::Value;

/// Stamped the first time a native table is registered. `NativeFn` is a bare
/// function pointer — it can't close over a per-`Vm` `Instant` — so `clock`
/// measures elapsed time from this process-wide mark instead.
static PROCESS_START: OnceLock<Instant> = OnceLock::new();

/// Registers every native the VM boots with. Each one is interned into
/// `globals` under its name, the same binding path `OP_DEFINE_GLOBAL` writes
/// to, so user code resolves `clock` exactly like any other global.
pub fn register_natives(heap: &mut Heap, intern: &mut Table, globals: &mut Table) {
    PROCESS_START.get_or_init(Instant::now);
    define_native(heap, intern, globals, "clock", 0, clock);
}

fn define_native(
    heap: &mut Heap,
    intern: &mut Table,
    globals: &mut Table,
    name: &'static str,
    arity: u8,
    func: NativeFn,
) {
    let hash = fnv1a_hash(name.as_bytes());
    let name_ref = match intern.find_string(heap, name.as_bytes(), hash) {
        Some(r) => r,
        None => {
            let r = heap.alloc(Object::Str(StringObj { bytes: name.into(), hash }));
            intern.set(r, hash, Value::Nil);
            r
        }
    };

    let native_ref = heap.alloc(Object::Native(NativeObj { name, arity, func }));
    globals.set(name_ref, hash, Value::Object(native_ref));
}

/// Seconds elapsed since the native table was registered, matching the
/// bytecode contract's "seconds since process start" semantics for
/// `clock()`.
fn clock(_args: &[Value]) -> Value {
    let start = *PROCESS_START.get_or_init(Instant::now);
    Value::Number(start.elapsed().as_secs_f64())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_returns_a_nonnegative_number() {
        let result = clock(&[]);
        assert!(result.as_number().unwrap() >= 0.0);
    }

    #[test]
    fn register_natives_binds_clock_as_a_global() {
        let mut heap = Heap::new();
        let mut intern = Table::new();
        let mut globals = Table::new();
        register_natives(&mut heap, &mut intern, &mut globals);

        let hash = fnv1a_hash(b"clock");
        let name_ref = intern.find_string(&heap, b"clock", hash).unwrap();
        assert!(globals.get(name_ref, hash).is_some());
    }
}
