// Copyright 2023 Basalt Foundation. All rights reserved.
// Basalt is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

//! VM selection and interpreter instance lifetime. Interpreters are opaque
//! engines registered into the [`VmFactory`]; each call constructs,
//! executes and tears down its own [`VmInstance`] so no interpreter state
//! leaks between unrelated calls.

mod gas_injector;
mod host_context;

pub use gas_injector::{GasInjector, InjectError};
pub use host_context::{DelegateHostContext, Host, HostContext};

use basalt_vm_types::{
    HostInterface, Interpreter, InterpreterMessage, Revision, VmExecResult,
};
use std::{collections::HashMap, sync::Arc};

/// Magic preamble of a WASM module: `\0asm` followed by version 1.
pub const WASM_PREAMBLE: &[u8; 8] = b"\0asm\x01\x00\x00\x00";

pub fn has_wasm_preamble(code: &[u8]) -> bool {
    code.len() >= WASM_PREAMBLE.len() && code[..8] == WASM_PREAMBLE[..]
}

/// Which interpreter family a code buffer runs under.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VmKind {
    Evm,
    Wasm,
}

impl VmKind {
    /// Pure function of the bytecode's preamble bytes.
    pub fn select(code: &[u8]) -> VmKind {
        if has_wasm_preamble(code) {
            VmKind::Wasm
        } else {
            VmKind::Evm
        }
    }
}

type EngineBuilder = Arc<dyn Fn() -> Box<dyn Interpreter> + Send + Sync>;

/// Registry of interpreter constructors, fixed before a block executes.
#[derive(Clone, Default)]
pub struct VmFactory {
    engines: HashMap<VmKind, EngineBuilder>,
}

impl VmFactory {
    pub fn new() -> VmFactory { VmFactory::default() }

    pub fn register<F>(&mut self, kind: VmKind, builder: F)
    where F: Fn() -> Box<dyn Interpreter> + Send + Sync + 'static {
        self.engines.insert(kind, Arc::new(builder));
    }

    /// Builds a fresh instance for one call, or `None` when no engine is
    /// registered for the kind.
    pub fn create(&self, kind: VmKind) -> Option<VmInstance> {
        let builder = self.engines.get(&kind)?;
        Some(VmInstance {
            kind,
            interpreter: builder(),
        })
    }
}

/// One interpreter bound to one call. Never reused.
pub struct VmInstance {
    kind: VmKind,
    interpreter: Box<dyn Interpreter>,
}

impl VmInstance {
    pub fn kind(&self) -> VmKind { self.kind }

    pub fn execute(
        &mut self, host: &mut dyn HostInterface, revision: Revision,
        message: &InterpreterMessage, code: &[u8],
    ) -> VmExecResult {
        self.interpreter.execute(host, revision, message, code)
    }
}

#[cfg(test)]
mod tests {
    use super::{has_wasm_preamble, VmFactory, VmKind, WASM_PREAMBLE};
    use basalt_vm_types::{
        vm_status, HostInterface, Interpreter, InterpreterMessage, Revision,
        VmExecResult,
    };
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    struct CountingVm;

    impl Interpreter for CountingVm {
        fn execute(
            &mut self, _host: &mut dyn HostInterface, _revision: Revision,
            _message: &InterpreterMessage, _code: &[u8],
        ) -> VmExecResult {
            VmExecResult::failure(vm_status::FAILURE, 0)
        }
    }

    #[test]
    fn selection_is_a_pure_function_of_the_preamble() {
        let mut wasm = WASM_PREAMBLE.to_vec();
        wasm.extend_from_slice(&[1, 2, 3]);
        assert_eq!(VmKind::select(&wasm), VmKind::Wasm);
        assert_eq!(VmKind::select(&wasm), VmKind::Wasm);
        assert_eq!(VmKind::select(&[0x60, 0x60]), VmKind::Evm);
        assert_eq!(VmKind::select(&[]), VmKind::Evm);
        // version mismatch is not WASM
        assert_eq!(VmKind::select(b"\0asm\x02\x00\x00\x00"), VmKind::Evm);
        assert!(!has_wasm_preamble(b"\0asm"));
    }

    #[test]
    fn factory_builds_a_fresh_instance_per_call() {
        let built = Arc::new(AtomicUsize::new(0));
        let mut factory = VmFactory::new();
        let counter = built.clone();
        factory.register(VmKind::Evm, move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Box::new(CountingVm)
        });

        assert!(factory.create(VmKind::Wasm).is_none());
        let a = factory.create(VmKind::Evm).unwrap();
        let b = factory.create(VmKind::Evm).unwrap();
        assert_eq!(a.kind(), VmKind::Evm);
        assert_eq!(b.kind(), VmKind::Evm);
        assert_eq!(built.load(Ordering::SeqCst), 2);
    }
}
