use crate::codec::Pdu;
use crate::config::types::Protocol;
use crate::errors::{Direction, ModbusError};

use super::registry::{self};
use super::request::Request;
use super::validate::validate_request;
use super::{bits, registers};

/// Validates and encodes `request` into a protocol-independent PDU, failing
/// before any byte is written if the function code is unsupported, used in
/// the wrong direction, or the parameters are out of range.
pub fn build_request(unit_id: u8, request: &Request, protocol: Protocol) -> Result<Pdu, ModbusError> {
    let fc = request.function_code();
    let meta = registry::require(fc, expected_direction(request), unit_id, protocol)?;
    validate_request(request, meta, unit_id, protocol)?;

    let payload = match request {
        Request::ReadCoils { address, quantity }
        | Request::ReadDiscreteInputs { address, quantity }
        | Request::ReadHoldingRegisters { address, quantity }
        | Request::ReadInputRegisters { address, quantity } => {
            let mut payload = address.to_be_bytes().to_vec();
            payload.extend_from_slice(&quantity.to_be_bytes());
            payload
        }
        Request::WriteSingleCoil { address, value } => {
            let mut payload = address.to_be_bytes().to_vec();
            payload.extend_from_slice(if *value { &[0xFF, 0x00] } else { &[0x00, 0x00] });
            payload
        }
        Request::WriteSingleRegister { address, value } => {
            let mut payload = address.to_be_bytes().to_vec();
            payload.extend_from_slice(&value.to_be_bytes());
            payload
        }
        Request::WriteMultipleCoils { address, values } => {
            let packed = bits::pack_bits(values);
            let mut payload = address.to_be_bytes().to_vec();
            payload.extend_from_slice(&(values.len() as u16).to_be_bytes());
            payload.push(packed.len() as u8);
            payload.extend_from_slice(&packed);
            payload
        }
        Request::WriteMultipleRegisters { address, values } => {
            let packed = registers::pack_registers(values);
            let mut payload = address.to_be_bytes().to_vec();
            payload.extend_from_slice(&(values.len() as u16).to_be_bytes());
            payload.push(packed.len() as u8);
            payload.extend_from_slice(&packed);
            payload
        }
    };

    Ok(Pdu::new(unit_id, fc, payload))
}

fn expected_direction(request: &Request) -> Direction {
    match request {
        Request::ReadCoils { .. }
        | Request::ReadDiscreteInputs { .. }
        | Request::ReadHoldingRegisters { .. }
        | Request::ReadInputRegisters { .. } => Direction::Read,
        Request::WriteSingleCoil { .. }
        | Request::WriteSingleRegister { .. }
        | Request::WriteMultipleCoils { .. }
        | Request::WriteMultipleRegisters { .. } => Direction::Write,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_read_holding_registers_payload() {
        let request = Request::ReadHoldingRegisters {
            address: 0,
            quantity: 10,
        };
        let pdu = build_request(1, &request, Protocol::Rtu).expect("builds");
        assert_eq!(pdu.function_code, 0x03);
        assert_eq!(pdu.payload, vec![0x00, 0x00, 0x00, 0x0A]);
    }

    #[test]
    fn builds_write_single_coil_on_as_0xff00() {
        let request = Request::WriteSingleCoil {
            address: 5,
            value: true,
        };
        let pdu = build_request(1, &request, Protocol::Rtu).expect("builds");
        assert_eq!(pdu.payload, vec![0x00, 0x05, 0xFF, 0x00]);
    }

    #[test]
    fn builds_write_multiple_coils_with_byte_count() {
        let request = Request::WriteMultipleCoils {
            address: 0,
            values: vec![true, false, true],
        };
        let pdu = build_request(1, &request, Protocol::Rtu).expect("builds");
        assert_eq!(pdu.payload, vec![0x00, 0x00, 0x00, 0x03, 0x01, 0b0000_0101]);
    }
}
