use crate::config::types::Protocol;
use crate::errors::{ErrorContext, ModbusError, Phase};

use super::registry::FunctionMetadata;
use super::request::Request;

fn invalid_argument(
    details: impl Into<String>,
    unit_id: u8,
    protocol: Protocol,
    function_code: u8,
    address: u16,
) -> ModbusError {
    ModbusError::InvalidArgument {
        details: details.into(),
        context: ErrorContext::new(unit_id, protocol, Phase::Validate)
            .with_function_code(function_code)
            .with_address(address),
    }
}

/// Validates `request` against the per-FC bounds from the registry entry.
/// Called before any byte is written to the transport.
pub fn validate_request(
    request: &Request,
    meta: &FunctionMetadata,
    unit_id: u8,
    protocol: Protocol,
) -> Result<(), ModbusError> {
    let fc = meta.function_code;
    let address = request.address();

    match request {
        Request::ReadCoils { quantity, .. }
        | Request::ReadDiscreteInputs { quantity, .. }
        | Request::ReadHoldingRegisters { quantity, .. }
        | Request::ReadInputRegisters { quantity, .. } => {
            if *quantity == 0 || *quantity > meta.max_quantity {
                return Err(invalid_argument(
                    format!(
                        "quantity {quantity} out of range for {} (max {})",
                        meta.name, meta.max_quantity
                    ),
                    unit_id,
                    protocol,
                    fc,
                    address,
                ));
            }
        }
        Request::WriteSingleCoil { .. } => {}
        Request::WriteSingleRegister { value, .. } => {
            // value is a u16, always in range; kept for symmetry with the
            // other write validators and to make the invariant explicit.
            let _ = value;
        }
        Request::WriteMultipleCoils { values, .. } => {
            if values.is_empty() || values.len() as u16 > meta.max_quantity {
                return Err(invalid_argument(
                    format!(
                        "coil array length {} out of range (1..={})",
                        values.len(),
                        meta.max_quantity
                    ),
                    unit_id,
                    protocol,
                    fc,
                    address,
                ));
            }
        }
        Request::WriteMultipleRegisters { values, .. } => {
            if values.is_empty() || values.len() as u16 > meta.max_quantity {
                return Err(invalid_argument(
                    format!(
                        "register array length {} out of range (1..={})",
                        values.len(),
                        meta.max_quantity
                    ),
                    unit_id,
                    protocol,
                    fc,
                    address,
                ));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::registry;

    #[test]
    fn rejects_oversize_read_quantity() {
        let meta = registry::lookup(0x03).unwrap();
        let request = Request::ReadHoldingRegisters {
            address: 0,
            quantity: 126,
        };
        assert!(validate_request(&request, meta, 1, Protocol::Rtu).is_err());
    }

    #[test]
    fn rejects_empty_write_multiple_coils() {
        let meta = registry::lookup(0x0F).unwrap();
        let request = Request::WriteMultipleCoils {
            address: 0,
            values: vec![],
        };
        assert!(validate_request(&request, meta, 1, Protocol::Rtu).is_err());
    }

    #[test]
    fn accepts_a_well_formed_register_read() {
        let meta = registry::lookup(0x03).unwrap();
        let request = Request::ReadHoldingRegisters {
            address: 0,
            quantity: 10,
        };
        assert!(validate_request(&request, meta, 1, Protocol::Rtu).is_ok());
    }
}
