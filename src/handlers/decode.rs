use crate::codec::DecodedFrame;
use crate::config::types::Protocol;
use crate::errors::{ErrorContext, ExceptionCode, ModbusError, Phase};

use super::registry::{self, DataFlavor};
use super::request::Request;
use super::response::{ResponseData, ResponseEnvelope};
use super::{bits, registers};

/// Decodes a matching `DecodedFrame` into a typed response, cross-checking
/// write confirmations' echoed address/value/quantity against the original
/// request.
pub fn decode_response(
    unit_id: u8,
    request: &Request,
    protocol: Protocol,
    frame: DecodedFrame,
    timestamp_ms: u64,
) -> Result<ResponseEnvelope, ModbusError> {
    let fc = request.function_code();
    let meta = registry::lookup(fc).expect("function code already validated by build_request");

    match frame {
        DecodedFrame::Exception {
            exception_code, ..
        } => Err(ModbusError::ModbusException {
            code: ExceptionCode::from_wire(exception_code),
            context: ErrorContext::new(unit_id, protocol, Phase::Receive).with_function_code(fc),
        }),
        DecodedFrame::Response { payload, .. } => {
            decode_payload(unit_id, request, protocol, meta.flavor, &payload, timestamp_ms)
        }
    }
}

fn decode_payload(
    unit_id: u8,
    request: &Request,
    protocol: Protocol,
    flavor: DataFlavor,
    payload: &[u8],
    timestamp_ms: u64,
) -> Result<ResponseEnvelope, ModbusError> {
    let fc = request.function_code();
    let address = request.address();

    let frame_error = |details: String| ModbusError::FrameError {
        details,
        context: ErrorContext::new(unit_id, protocol, Phase::Parse).with_function_code(fc),
    };

    let echo_mismatch = || ModbusError::EchoMismatch {
        context: ErrorContext::new(unit_id, protocol, Phase::Validate)
            .with_function_code(fc)
            .with_address(address),
    };

    let data = match request {
        Request::ReadCoils { quantity, .. } | Request::ReadDiscreteInputs { quantity, .. } => {
            let quantity = *quantity as usize;
            let byte_count = *payload
                .first()
                .ok_or_else(|| frame_error("read response missing byte count".into()))?
                as usize;
            let bytes = payload.get(1..).unwrap_or_default();
            if bytes.len() < byte_count || byte_count < quantity.div_ceil(8) {
                return Err(frame_error(format!(
                    "byte count {byte_count} does not cover {quantity} bits"
                )));
            }
            ResponseData::Bits(bits::unpack_bits(bytes, quantity))
        }
        Request::ReadHoldingRegisters { quantity, .. } | Request::ReadInputRegisters { quantity, .. } => {
            let quantity = *quantity as usize;
            let byte_count = *payload
                .first()
                .ok_or_else(|| frame_error("read response missing byte count".into()))?
                as usize;
            if byte_count != quantity * 2 {
                return Err(frame_error(format!(
                    "byte count {byte_count} does not match {quantity} registers"
                )));
            }
            let bytes = payload.get(1..1 + byte_count).unwrap_or_default();
            if bytes.len() != byte_count {
                return Err(frame_error("register response truncated".into()));
            }
            ResponseData::Registers(registers::unpack_registers(bytes))
        }
        Request::WriteSingleCoil { value, .. } => {
            if payload.len() != 4 {
                return Err(frame_error("write confirmation has unexpected length".into()));
            }
            let echoed_address = u16::from_be_bytes([payload[0], payload[1]]);
            let echoed_value = u16::from_be_bytes([payload[2], payload[3]]);
            let expected_value: u16 = if *value { 0xFF00 } else { 0x0000 };
            if echoed_address != address || echoed_value != expected_value {
                return Err(echo_mismatch());
            }
            ResponseData::Empty
        }
        Request::WriteSingleRegister { value, .. } => {
            if payload.len() != 4 {
                return Err(frame_error("write confirmation has unexpected length".into()));
            }
            let echoed_address = u16::from_be_bytes([payload[0], payload[1]]);
            let echoed_value = u16::from_be_bytes([payload[2], payload[3]]);
            if echoed_address != address || echoed_value != *value {
                return Err(echo_mismatch());
            }
            ResponseData::Empty
        }
        Request::WriteMultipleCoils { values, .. } => {
            if payload.len() != 4 {
                return Err(frame_error("write confirmation has unexpected length".into()));
            }
            let echoed_address = u16::from_be_bytes([payload[0], payload[1]]);
            let echoed_quantity = u16::from_be_bytes([payload[2], payload[3]]);
            if echoed_address != address || echoed_quantity as usize != values.len() {
                return Err(echo_mismatch());
            }
            ResponseData::Empty
        }
        Request::WriteMultipleRegisters { values, .. } => {
            if payload.len() != 4 {
                return Err(frame_error("write confirmation has unexpected length".into()));
            }
            let echoed_address = u16::from_be_bytes([payload[0], payload[1]]);
            let echoed_quantity = u16::from_be_bytes([payload[2], payload[3]]);
            if echoed_address != address || echoed_quantity as usize != values.len() {
                return Err(echo_mismatch());
            }
            ResponseData::Empty
        }
    };

    Ok(ResponseEnvelope {
        unit_id,
        function_code: fc,
        function_name: registry::lookup(fc).expect("validated above").name,
        data,
        start_address: address,
        timestamp_ms,
    })
}
