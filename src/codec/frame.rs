/// A fully extracted, checksum-verified frame, with the unit id and
/// checksum bytes already stripped away.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedFrame {
    Response {
        unit_id: u8,
        function_code: u8,
        payload: Vec<u8>,
    },
    Exception {
        unit_id: u8,
        function_code: u8,
        exception_code: u8,
    },
}

impl DecodedFrame {
    pub fn unit_id(&self) -> u8 {
        match self {
            Self::Response { unit_id, .. } | Self::Exception { unit_id, .. } => *unit_id,
        }
    }

    pub fn function_code(&self) -> u8 {
        match self {
            Self::Response { function_code, .. } | Self::Exception { function_code, .. } => {
                *function_code
            }
        }
    }
}
