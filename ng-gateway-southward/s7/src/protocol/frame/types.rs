use serde_repr::{Deserialize_repr, Serialize_repr};

/// S7 memory areas addressable by a ReadVar/WriteVar item.
///
/// Discriminants are the area codes used on the wire.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize_repr, Deserialize_repr)]
pub enum S7Area {
    /// Direct peripheral access
    Peripheral = 0x80,
    /// Inputs
    Inputs = 0x81,
    /// Outputs
    Outputs = 0x82,
    /// Merkers
    Flags = 0x83,
    /// Data Blocks (DB)
    DataBlocks = 0x84,
    /// Instance data blocks
    InstanceDataBlocks = 0x85,
    /// Local data
    LocalData = 0x86,
    /// Counters
    S7Counters = 0x1C,
    /// Timers
    S7Timers = 0x1D,
}

impl S7Area {
    /// Canonical textual prefix of this area, `None` for areas that have no
    /// address syntax. The DB prefix is completed with its number by the caller.
    #[inline]
    pub fn prefix(self) -> Option<&'static str> {
        match self {
            S7Area::Inputs => Some("I"),
            S7Area::Outputs => Some("Q"),
            S7Area::Flags => Some("M"),
            S7Area::DataBlocks => Some("DB"),
            S7Area::S7Timers => Some("T"),
            S7Area::S7Counters => Some("C"),
            S7Area::Peripheral | S7Area::InstanceDataBlocks | S7Area::LocalData => None,
        }
    }
}

/// Parameter variable type of a request item (transport size code in the VarSpec).
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize_repr, Deserialize_repr)]
pub enum VariableType {
    Bit = 0x01,
    Byte = 0x02,
    Char = 0x03,
    Word = 0x04,
    Int = 0x05,
    DWord = 0x06,
    DInt = 0x07,
    Real = 0x08,
    Counter = 0x1C,
    Timer = 0x1D,
}

impl VariableType {
    #[inline]
    pub fn is_bit(self) -> bool {
        matches!(self, VariableType::Bit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_only_for_addressable_areas() {
        assert_eq!(S7Area::Flags.prefix(), Some("M"));
        assert_eq!(S7Area::DataBlocks.prefix(), Some("DB"));
        assert!(S7Area::LocalData.prefix().is_none());
        assert!(S7Area::Peripheral.prefix().is_none());
    }

    #[test]
    fn test_wire_codes() {
        assert_eq!(S7Area::DataBlocks as u8, 0x84);
        assert_eq!(S7Area::S7Timers as u8, 0x1D);
        assert_eq!(VariableType::Word as u8, 0x04);
        assert!(VariableType::Bit.is_bit());
        assert!(!VariableType::Byte.is_bit());
    }
}
