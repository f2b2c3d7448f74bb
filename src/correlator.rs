use std::time::Duration;

use tokio::sync::broadcast;
use tracing::{trace, warn};

use crate::codec::{AsciiDecoder, DecodedFrame, RtuDecoder};
use crate::config::types::Protocol;
use crate::errors::{ErrorContext, ModbusError, Phase};
use crate::transport::{Transport, TransportEvent};

/// Writes `request_frame` and waits for the first inbound frame matching
/// `(unit_id, function_code)`, or fails with `Timeout`/`TransportError`.
///
/// Subscribes to the transport's event stream before writing, so no inbound
/// bytes can be missed between the write and the first `recv`. Cancellation
/// (stopping a scheduler mid-wait) is expressed by simply dropping this
/// future — dropping the underlying `broadcast::Receiver` is the
/// unsubscribe, so cleanup never needs a second code path.
pub async fn send_and_await(
    transport: &dyn Transport,
    request_frame: Vec<u8>,
    unit_id: u8,
    function_code: u8,
    protocol: Protocol,
    deadline: Duration,
) -> Result<DecodedFrame, ModbusError> {
    let mut events = transport.subscribe();

    transport
        .post_message(request_frame)
        .map_err(|err| match err {
            ModbusError::TransportSendError { details, context } => {
                ModbusError::TransportSendError { details, context }
            }
            other => other,
        })?;

    let wait = wait_for_frame(&mut events, unit_id, function_code, protocol);

    match tokio::time::timeout(deadline, wait).await {
        Ok(result) => result,
        Err(_elapsed) => Err(ModbusError::Timeout {
            elapsed: deadline,
            context: ErrorContext::new(unit_id, protocol, Phase::Receive)
                .with_function_code(function_code)
                .with_timeout(deadline),
        }),
    }
}

async fn wait_for_frame(
    events: &mut broadcast::Receiver<TransportEvent>,
    unit_id: u8,
    function_code: u8,
    protocol: Protocol,
) -> Result<DecodedFrame, ModbusError> {
    let mut rtu_decoder = RtuDecoder::new(unit_id, function_code);
    let mut ascii_decoder = AsciiDecoder::new(unit_id, function_code);

    loop {
        match events.recv().await {
            Ok(TransportEvent::Message(bytes)) => {
                trace!(len = bytes.len(), "correlator: received bytes");
                let decoded = match protocol {
                    Protocol::Rtu => {
                        rtu_decoder.feed(&bytes);
                        rtu_decoder.try_extract()
                    }
                    Protocol::Ascii => {
                        ascii_decoder.feed(&bytes);
                        ascii_decoder.try_extract()
                    }
                };
                if let Some(frame) = decoded {
                    return Ok(frame);
                }
            }
            Ok(TransportEvent::Error(message)) => {
                return Err(ModbusError::TransportError {
                    details: message,
                    context: ErrorContext::new(unit_id, protocol, Phase::Receive)
                        .with_function_code(function_code),
                    source: None,
                });
            }
            Ok(_) => continue,
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped, "correlator: lagged behind transport event stream");
                continue;
            }
            Err(broadcast::error::RecvError::Closed) => {
                return Err(ModbusError::TransportError {
                    details: "transport event stream closed".to_string(),
                    context: ErrorContext::new(unit_id, protocol, Phase::Receive)
                        .with_function_code(function_code),
                    source: None,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Pdu;
    use crate::transport::MockTransport;

    #[tokio::test]
    async fn resolves_with_the_matching_response() {
        let transport = MockTransport::new();
        transport.connect().await.unwrap();

        let request = Pdu::new(1, 0x03, vec![0x00, 0x00, 0x00, 0x02]).encode_rtu();
        let response = Pdu::new(1, 0x03, vec![0x04, 0x00, 0x01, 0x00, 0x02]).encode_rtu();
        transport.program_response(request.clone(), response, None);

        let decoded = send_and_await(
            &transport,
            request,
            1,
            0x03,
            Protocol::Rtu,
            Duration::from_millis(500),
        )
        .await
        .expect("resolves");

        assert_eq!(
            decoded,
            DecodedFrame::Response {
                unit_id: 1,
                function_code: 0x03,
                payload: vec![0x04, 0x00, 0x01, 0x00, 0x02],
            }
        );
    }

    #[tokio::test]
    async fn times_out_when_no_reply_arrives() {
        let transport = MockTransport::new();
        transport.connect().await.unwrap();
        let request = Pdu::new(1, 0x03, vec![0x00, 0x00, 0x00, 0x02]).encode_rtu();

        let err = send_and_await(
            &transport,
            request,
            1,
            0x03,
            Protocol::Rtu,
            Duration::from_millis(20),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ModbusError::Timeout { .. }));
    }
}
