use serde::{Deserialize, Serialize};

/// Wire framing used on the serial link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// Binary framing with a CRC-16 checksum.
    Rtu,
    /// `:`-delimited hex framing with an LRC checksum.
    Ascii,
}

impl Default for Protocol {
    fn default() -> Self {
        Self::Rtu
    }
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rtu => write!(f, "rtu"),
            Self::Ascii => write!(f, "ascii"),
        }
    }
}
