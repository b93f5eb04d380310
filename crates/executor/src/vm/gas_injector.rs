// Copyright 2023 Basalt Foundation. All rights reserved.
// Basalt is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

use std::fmt;
use wasm_instrument::{
    gas_metering::{self, host_function, ConstantCostRules},
    parity_wasm::{
        self,
        elements::{Instruction, Module},
    },
};

/// Import module name of the metering host function.
pub const GAS_IMPORT_MODULE: &str = "basalt";
/// Import field name of the metering host function.
pub const GAS_IMPORT_FIELD: &str = "useGas";

/// Why a module was rejected by the metering pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InjectError {
    /// The buffer is not a well-formed WASM module.
    InvalidFormat,
    /// The module uses an opcode the deterministic subset forbids.
    ForbiddenOpcode,
}

impl fmt::Display for InjectError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            InjectError::InvalidFormat => {
                write!(f, "wasm bytecode is malformed")
            }
            InjectError::ForbiddenOpcode => {
                write!(f, "wasm bytecode uses a forbidden opcode")
            }
        }
    }
}

/// Rewrites WASM bytecode to charge gas through an imported host function
/// before any of it runs. Code that fails this pass must never be executed
/// or stored; callers treat a rejection exactly like invalid bytecode.
#[derive(Clone, Copy, Debug, Default)]
pub struct GasInjector;

impl GasInjector {
    pub fn inject(&self, code: &[u8]) -> Result<Vec<u8>, InjectError> {
        let module: Module = parity_wasm::deserialize_buffer(code)
            .map_err(|_| InjectError::InvalidFormat)?;

        reject_nondeterministic_opcodes(&module)?;

        let backend =
            host_function::Injector::new(GAS_IMPORT_MODULE, GAS_IMPORT_FIELD);
        let rules = ConstantCostRules::new(1, 0, 1);
        let metered = gas_metering::inject(module, backend, &rules)
            .map_err(|_| InjectError::ForbiddenOpcode)?;

        parity_wasm::serialize(metered)
            .map_err(|_| InjectError::InvalidFormat)
    }
}

/// Floating point is not deterministic across hosts, so any float opcode
/// disqualifies the module.
fn reject_nondeterministic_opcodes(
    module: &Module,
) -> Result<(), InjectError> {
    let bodies = match module.code_section() {
        Some(section) => section.bodies(),
        None => return Ok(()),
    };
    for body in bodies {
        for instruction in body.code().elements() {
            if is_float_instruction(instruction) {
                warn!("reject wasm module: {} is forbidden", instruction);
                return Err(InjectError::ForbiddenOpcode);
            }
        }
    }
    Ok(())
}

fn is_float_instruction(instruction: &Instruction) -> bool {
    // the canonical text of every float opcode starts with its value type
    let text = instruction.to_string();
    text.starts_with("f32") || text.starts_with("f64")
}

#[cfg(test)]
mod tests {
    use super::{GasInjector, InjectError, GAS_IMPORT_FIELD};
    use crate::vm::has_wasm_preamble;

    /// `(module)`: just the magic and the version.
    const EMPTY_MODULE: &[u8] = &[
        0x00, 0x61, 0x73, 0x6d, 0x01, 0x00, 0x00, 0x00,
    ];

    /// One empty function: `(module (func))`.
    const ONE_FUNC_MODULE: &[u8] = &[
        0x00, 0x61, 0x73, 0x6d, 0x01, 0x00, 0x00, 0x00, // preamble
        0x01, 0x04, 0x01, 0x60, 0x00, 0x00, // type: () -> ()
        0x03, 0x02, 0x01, 0x00, // function section
        0x0a, 0x04, 0x01, 0x02, 0x00, 0x0b, // code: empty body
    ];

    /// `(module (func (drop (f32.const 0))))`.
    const FLOAT_MODULE: &[u8] = &[
        0x00, 0x61, 0x73, 0x6d, 0x01, 0x00, 0x00, 0x00, // preamble
        0x01, 0x04, 0x01, 0x60, 0x00, 0x00, // type: () -> ()
        0x03, 0x02, 0x01, 0x00, // function section
        0x0a, 0x0a, 0x01, 0x08, 0x00, // code section, no locals
        0x43, 0x00, 0x00, 0x00, 0x00, // f32.const 0
        0x1a, 0x0b, // drop, end
    ];

    #[test]
    fn injects_metering_into_a_plain_module() {
        let metered = GasInjector.inject(ONE_FUNC_MODULE).unwrap();
        assert!(has_wasm_preamble(&metered));
        assert_ne!(metered, ONE_FUNC_MODULE);
        // the import name must appear in the rewritten module
        let needle = GAS_IMPORT_FIELD.as_bytes();
        assert!(metered
            .windows(needle.len())
            .any(|window| window == needle));
    }

    #[test]
    fn accepts_a_module_without_code() {
        GasInjector.inject(EMPTY_MODULE).unwrap();
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(
            GasInjector.inject(b"\0asm\x01\x00\x00\x00garbage"),
            Err(InjectError::InvalidFormat)
        );
        assert_eq!(
            GasInjector.inject(b"not wasm at all"),
            Err(InjectError::InvalidFormat)
        );
    }

    #[test]
    fn rejects_float_opcodes() {
        assert_eq!(
            GasInjector.inject(FLOAT_MODULE),
            Err(InjectError::ForbiddenOpcode)
        );
    }
}
