use std::sync::Arc;

use crate::config::types::{Priority, Protocol};
use crate::config::ClientConfig;
use crate::errors::ModbusError;
use crate::handlers::{Request, ResponseData, ResponseEnvelope};
use crate::scheduler::{Scheduler, SchedulerStats};
use crate::transport::{SerialTransport, Transport};

/// Top-level entry point: owns a transport and the scheduler dispatching
/// onto it, and exposes one typed method per Modbus function code.
pub struct ModbusClient {
    transport: Arc<dyn Transport>,
    scheduler: Arc<Scheduler>,
}

impl ModbusClient {
    /// Builds a client over a real serial transport configured from
    /// `config`.
    pub fn new_serial(config: ClientConfig) -> Self {
        let transport: Arc<dyn Transport> = Arc::new(SerialTransport::new(config.serial.clone()));
        Self::with_transport(transport, config.protocol, config.scheduler)
    }

    /// Builds a client over an arbitrary transport (real or mock).
    pub fn with_transport(
        transport: Arc<dyn Transport>,
        protocol: Protocol,
        scheduler_config: crate::config::SchedulerConfig,
    ) -> Self {
        let scheduler = Arc::new(Scheduler::new(transport.clone(), protocol, scheduler_config));
        Self { transport, scheduler }
    }

    pub async fn connect(&self) -> Result<(), ModbusError> {
        self.transport.connect().await
    }

    pub async fn disconnect(&self) -> Result<(), ModbusError> {
        self.transport.disconnect().await
    }

    pub async fn start(&self) {
        self.scheduler.start().await
    }

    pub async fn stop(&self) {
        self.scheduler.stop().await
    }

    pub async fn stats(&self) -> SchedulerStats {
        self.scheduler.stats().await
    }

    pub async fn read_coils(
        &self,
        unit_id: u8,
        address: u16,
        quantity: u16,
        priority: Priority,
    ) -> Result<Vec<bool>, ModbusError> {
        match self
            .execute(unit_id, Request::ReadCoils { address, quantity }, priority)
            .await?
            .data
        {
            ResponseData::Bits(bits) => Ok(bits),
            _ => unreachable!("read coils always decodes to bit data"),
        }
    }

    pub async fn read_discrete_inputs(
        &self,
        unit_id: u8,
        address: u16,
        quantity: u16,
        priority: Priority,
    ) -> Result<Vec<bool>, ModbusError> {
        match self
            .execute(unit_id, Request::ReadDiscreteInputs { address, quantity }, priority)
            .await?
            .data
        {
            ResponseData::Bits(bits) => Ok(bits),
            _ => unreachable!("read discrete inputs always decodes to bit data"),
        }
    }

    pub async fn read_holding_registers(
        &self,
        unit_id: u8,
        address: u16,
        quantity: u16,
        priority: Priority,
    ) -> Result<Vec<u16>, ModbusError> {
        match self
            .execute(unit_id, Request::ReadHoldingRegisters { address, quantity }, priority)
            .await?
            .data
        {
            ResponseData::Registers(registers) => Ok(registers),
            _ => unreachable!("read holding registers always decodes to register data"),
        }
    }

    pub async fn read_input_registers(
        &self,
        unit_id: u8,
        address: u16,
        quantity: u16,
        priority: Priority,
    ) -> Result<Vec<u16>, ModbusError> {
        match self
            .execute(unit_id, Request::ReadInputRegisters { address, quantity }, priority)
            .await?
            .data
        {
            ResponseData::Registers(registers) => Ok(registers),
            _ => unreachable!("read input registers always decodes to register data"),
        }
    }

    pub async fn write_single_coil(
        &self,
        unit_id: u8,
        address: u16,
        value: bool,
        priority: Priority,
    ) -> Result<(), ModbusError> {
        self.execute(unit_id, Request::WriteSingleCoil { address, value }, priority)
            .await?;
        Ok(())
    }

    pub async fn write_single_register(
        &self,
        unit_id: u8,
        address: u16,
        value: u16,
        priority: Priority,
    ) -> Result<(), ModbusError> {
        self.execute(unit_id, Request::WriteSingleRegister { address, value }, priority)
            .await?;
        Ok(())
    }

    pub async fn write_multiple_coils(
        &self,
        unit_id: u8,
        address: u16,
        values: Vec<bool>,
        priority: Priority,
    ) -> Result<(), ModbusError> {
        self.execute(unit_id, Request::WriteMultipleCoils { address, values }, priority)
            .await?;
        Ok(())
    }

    pub async fn write_multiple_registers(
        &self,
        unit_id: u8,
        address: u16,
        values: Vec<u16>,
        priority: Priority,
    ) -> Result<(), ModbusError> {
        self.execute(unit_id, Request::WriteMultipleRegisters { address, values }, priority)
            .await?;
        Ok(())
    }

    /// Submits an arbitrary typed request and awaits its resolution.
    pub async fn execute(
        &self,
        unit_id: u8,
        request: Request,
        priority: Priority,
    ) -> Result<ResponseEnvelope, ModbusError> {
        let rx = self.scheduler.schedule(unit_id, request, priority).await?;
        rx.await.unwrap_or(Err(ModbusError::SchedulerStopped))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SchedulerConfig;
    use crate::codec::Pdu;
    use crate::transport::MockTransport;
    use std::time::Duration;

    async fn client_with_mock() -> (ModbusClient, Arc<MockTransport>) {
        let transport = Arc::new(MockTransport::new());
        let mut config = SchedulerConfig::default();
        config.request_interval = Duration::from_millis(5);
        let client = ModbusClient::with_transport(transport.clone(), Protocol::Rtu, config);
        (client, transport)
    }

    #[tokio::test]
    async fn reads_holding_registers_end_to_end() {
        let (client, transport) = client_with_mock().await;
        client.connect().await.unwrap();
        client.start().await;

        let request = Pdu::new(1, 0x03, vec![0x00, 0x00, 0x00, 0x02]).encode_rtu();
        let response = Pdu::new(1, 0x03, vec![0x04, 0x00, 0x01, 0x00, 0x02]).encode_rtu();
        transport.program_response(request, response, None);

        let registers = client
            .read_holding_registers(1, 0, 2, Priority::Normal)
            .await
            .expect("reads");
        assert_eq!(registers, vec![1, 2]);
        client.stop().await;
    }

    #[tokio::test]
    async fn write_single_coil_resolves_on_matching_echo() {
        let (client, transport) = client_with_mock().await;
        client.connect().await.unwrap();
        client.start().await;

        let request = Pdu::new(1, 0x05, vec![0x00, 0x0A, 0xFF, 0x00]).encode_rtu();
        let response = request.clone();
        transport.program_response(request, response, None);

        client
            .write_single_coil(1, 10, true, Priority::Normal)
            .await
            .expect("writes");
        client.stop().await;
    }
}
