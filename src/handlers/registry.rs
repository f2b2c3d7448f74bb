use crate::config::types::Protocol;
use crate::errors::{Direction, ErrorContext, ModbusError, Phase};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFlavor {
    Bit,
    Register,
}

#[derive(Debug, Clone, Copy)]
pub struct FunctionMetadata {
    pub function_code: u8,
    pub name: &'static str,
    pub direction: Direction,
    pub flavor: DataFlavor,
    pub max_quantity: u16,
}

/// Per-function-code metadata, used for registry lookups and for rejecting
/// unsupported codes / direction mismatches without reflection.
pub const FUNCTION_TABLE: &[FunctionMetadata] = &[
    FunctionMetadata {
        function_code: 0x01,
        name: "Read Coils",
        direction: Direction::Read,
        flavor: DataFlavor::Bit,
        max_quantity: 2000,
    },
    FunctionMetadata {
        function_code: 0x02,
        name: "Read Discrete Inputs",
        direction: Direction::Read,
        flavor: DataFlavor::Bit,
        max_quantity: 2000,
    },
    FunctionMetadata {
        function_code: 0x03,
        name: "Read Holding Registers",
        direction: Direction::Read,
        flavor: DataFlavor::Register,
        max_quantity: 125,
    },
    FunctionMetadata {
        function_code: 0x04,
        name: "Read Input Registers",
        direction: Direction::Read,
        flavor: DataFlavor::Register,
        max_quantity: 125,
    },
    FunctionMetadata {
        function_code: 0x05,
        name: "Write Single Coil",
        direction: Direction::Write,
        flavor: DataFlavor::Bit,
        max_quantity: 1,
    },
    FunctionMetadata {
        function_code: 0x06,
        name: "Write Single Register",
        direction: Direction::Write,
        flavor: DataFlavor::Register,
        max_quantity: 1,
    },
    FunctionMetadata {
        function_code: 0x0F,
        name: "Write Multiple Coils",
        direction: Direction::Write,
        flavor: DataFlavor::Bit,
        max_quantity: 1968,
    },
    FunctionMetadata {
        function_code: 0x10,
        name: "Write Multiple Registers",
        direction: Direction::Write,
        flavor: DataFlavor::Register,
        max_quantity: 123,
    },
];

pub fn lookup(function_code: u8) -> Option<&'static FunctionMetadata> {
    FUNCTION_TABLE
        .iter()
        .find(|meta| meta.function_code == function_code)
}

/// Looks up `function_code`, failing with `UnsupportedFunctionCode` if it is
/// not one of FC 1/2/3/4/5/6/15/16, or `WrongDirection` if the caller used
/// the wrong read/write entry point for it.
pub fn require(
    function_code: u8,
    direction: Direction,
    unit_id: u8,
    protocol: Protocol,
) -> Result<&'static FunctionMetadata, ModbusError> {
    let meta = lookup(function_code).ok_or_else(|| ModbusError::UnsupportedFunctionCode {
        function_code,
        context: ErrorContext::new(unit_id, protocol, Phase::Validate)
            .with_function_code(function_code),
    })?;
    if meta.direction != direction {
        return Err(ModbusError::WrongDirection {
            function_code,
            direction: meta.direction,
            context: ErrorContext::new(unit_id, protocol, Phase::Validate)
                .with_function_code(function_code),
        });
    }
    Ok(meta)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn looks_up_every_supported_function_code() {
        for fc in [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x0F, 0x10] {
            assert!(lookup(fc).is_some());
        }
    }

    #[test]
    fn rejects_unknown_function_code() {
        let err = require(0x07, Direction::Read, 1, Protocol::Rtu).unwrap_err();
        assert!(matches!(err, ModbusError::UnsupportedFunctionCode { .. }));
    }

    #[test]
    fn rejects_direction_mismatch() {
        let err = require(0x05, Direction::Read, 1, Protocol::Rtu).unwrap_err();
        assert!(matches!(err, ModbusError::WrongDirection { .. }));
    }
}
