/// Decoded response payload: bit sequence for FC 1/2, register sequence for
/// FC 3/4, empty for write confirmations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseData {
    Bits(Vec<bool>),
    Registers(Vec<u16>),
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseEnvelope {
    pub unit_id: u8,
    pub function_code: u8,
    pub function_name: &'static str,
    pub data: ResponseData,
    pub start_address: u16,
    pub timestamp_ms: u64,
}
