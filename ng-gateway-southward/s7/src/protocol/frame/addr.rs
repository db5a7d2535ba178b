use super::{
    super::error::{Error, Result},
    types::{S7Area, VariableType},
};
use serde::{Deserialize, Serialize};

/// How the `V` area letter is interpreted.
///
/// S7-200 (Smart) PLCs expose their V memory as data block 1, so `V100` is the same
/// location as `DB1.100`. Families without V memory can reject the letter instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum VAreaPolicy {
    /// Resolve `V` addresses inside the given data block
    Alias { db_number: u16 },
    /// Treat `V` as an unknown area
    Reject,
}

impl Default for VAreaPolicy {
    fn default() -> Self {
        VAreaPolicy::Alias { db_number: 1 }
    }
}

/// Resolved S7 request descriptor.
///
/// Fields are validated once at construction and never change afterwards; use
/// [`RequestItem::slice`] to derive the sub-request of a planned chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestItem {
    area: S7Area,
    /// Data block number when `area == DataBlocks`, else 0
    db_number: u16,
    byte_address: u32,
    /// Bit index 0..=7, only kept for `VariableType::Bit`
    bit_address: u8,
    variable_type: VariableType,
    /// Bytes requested, or bits for `VariableType::Bit`
    count: u32,
}

impl RequestItem {
    pub fn new(
        area: S7Area,
        db_number: u16,
        byte_address: u32,
        bit_address: u8,
        variable_type: VariableType,
        count: u32,
    ) -> Result<Self> {
        if bit_address > 7 {
            return Err(Error::BitIndexOutOfRange {
                address: format!("{area:?}{byte_address}.{bit_address}"),
                bit: bit_address as u32,
            });
        }
        if count == 0 {
            return Err(Error::AddressFormat {
                address: format!("{area:?}{byte_address}"),
                reason: "count must be positive",
            });
        }
        Ok(Self {
            area,
            db_number: if matches!(area, S7Area::DataBlocks) {
                db_number
            } else {
                0
            },
            byte_address,
            bit_address: if variable_type.is_bit() {
                bit_address
            } else {
                0
            },
            variable_type,
            count,
        })
    }

    #[inline]
    pub fn area(&self) -> S7Area {
        self.area
    }

    #[inline]
    pub fn db_number(&self) -> u16 {
        self.db_number
    }

    #[inline]
    pub fn byte_address(&self) -> u32 {
        self.byte_address
    }

    #[inline]
    pub fn bit_address(&self) -> u8 {
        self.bit_address
    }

    #[inline]
    pub fn variable_type(&self) -> VariableType {
        self.variable_type
    }

    #[inline]
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Sub-request covering `len` units starting `offset` units into this item.
    ///
    /// Byte-addressed items move their byte address; bit items move the absolute
    /// bit position (`byte * 8 + bit`), so a chunk may start in a later byte.
    pub fn slice(&self, offset: usize, len: usize) -> Result<RequestItem> {
        let end = offset.checked_add(len).ok_or(Error::PlanMismatch {
            context: "sub-request range overflows",
        })?;
        if len == 0 || end > self.count as usize {
            return Err(Error::PlanMismatch {
                context: "sub-request range outside item",
            });
        }
        let offset = u32::try_from(offset).map_err(|_| Error::PlanMismatch {
            context: "sub-request offset overflows",
        })?;
        let overflow = || Error::PlanMismatch {
            context: "sub-request address overflows",
        };

        let (byte_address, bit_address) = if self.variable_type.is_bit() {
            let abs = self
                .byte_address
                .checked_mul(8)
                .and_then(|b| b.checked_add(self.bit_address as u32))
                .and_then(|b| b.checked_add(offset))
                .ok_or_else(overflow)?;
            (abs / 8, (abs % 8) as u8)
        } else {
            let byte = self.byte_address.checked_add(offset).ok_or_else(overflow)?;
            (byte, 0)
        };

        Ok(RequestItem {
            byte_address,
            bit_address,
            count: len as u32,
            ..*self
        })
    }
}

/// Address string parser.
///
/// Accepted forms include `DB1.0.1`, `DB1.1`, `DB100.DBX0.0`, `DB100.DBB5`,
/// `DB100.DBW6`, `M1.1`, `MB1`, `MW1`, `MD1`, `V1.1`, `VB100`, `VW100`, `I0.1`,
/// `IB1`, `Q0.1`, `QW1`, `T5` and `C3`. Only the first letter selects the area;
/// any size letters are ignored and the digits of each dot segment are used.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AddressResolver {
    v_area: VAreaPolicy,
}

impl AddressResolver {
    pub fn new(v_area: VAreaPolicy) -> Self {
        Self { v_area }
    }

    #[inline]
    pub fn v_area(&self) -> VAreaPolicy {
        self.v_area
    }

    /// Parse `address` into a [`RequestItem`] of `count` units of `variable_type`.
    ///
    /// The bit segment is only read for `VariableType::Bit`; for every other type
    /// the bit index is 0 regardless of the input.
    pub fn resolve(
        &self,
        address: &str,
        count: u32,
        variable_type: VariableType,
    ) -> Result<RequestItem> {
        let s = address.trim().to_uppercase();
        if s.is_empty() {
            return Err(Error::address_format(address, "address is empty"));
        }
        if count == 0 {
            return Err(Error::address_format(address, "count must be positive"));
        }

        let mut segments: Vec<&str> = s.split('.').collect();
        // "M1." and "DB1.2." address the same item as without the trailing dots
        while segments.len() > 1 && segments.last() == Some(&"") {
            segments.pop();
        }
        let head = segments[0];
        let letter = head
            .chars()
            .next()
            .ok_or_else(|| Error::address_format(address, "missing area prefix"))?;

        let bit_at = |idx: usize| -> Result<u32> {
            if !variable_type.is_bit() {
                return Ok(0);
            }
            match segments.get(idx) {
                Some(seg) => extract_number(address, seg),
                None => Ok(0),
            }
        };

        let (area, db_number, byte_address, bit) = match letter {
            'D' => {
                let db = extract_number(address, head)?;
                let db = u16::try_from(db)
                    .map_err(|_| Error::address_format(address, "db number out of range"))?;
                let byte = match segments.get(1) {
                    Some(seg) => extract_number(address, seg)?,
                    None => 0,
                };
                (S7Area::DataBlocks, db, byte, bit_at(2)?)
            }
            'V' => match self.v_area {
                VAreaPolicy::Alias { db_number } => {
                    tracing::trace!(address, db_number, "resolving V area as data block");
                    (
                        S7Area::DataBlocks,
                        db_number,
                        extract_number(address, head)?,
                        bit_at(1)?,
                    )
                }
                VAreaPolicy::Reject => {
                    return Err(Error::UnknownArea {
                        area: letter.to_string(),
                    })
                }
            },
            other => {
                let area = match other {
                    'I' => S7Area::Inputs,
                    'Q' => S7Area::Outputs,
                    'M' => S7Area::Flags,
                    'T' => S7Area::S7Timers,
                    'C' => S7Area::S7Counters,
                    _ => {
                        return Err(Error::UnknownArea {
                            area: other.to_string(),
                        })
                    }
                };
                (area, 0, extract_number(address, head)?, bit_at(1)?)
            }
        };

        if bit > 7 {
            return Err(Error::BitIndexOutOfRange {
                address: address.to_string(),
                bit,
            });
        }

        RequestItem::new(
            area,
            db_number,
            byte_address,
            bit as u8,
            variable_type,
            count,
        )
    }

    #[inline]
    pub fn parse_byte(&self, address: &str, count: u32) -> Result<RequestItem> {
        self.resolve(address, count, VariableType::Byte)
    }

    #[inline]
    pub fn parse_bit(&self, address: &str) -> Result<RequestItem> {
        self.resolve(address, 1, VariableType::Bit)
    }
}

/// Resolve with the default `V` policy (alias of DB1).
pub fn resolve(address: &str, count: u32, variable_type: VariableType) -> Result<RequestItem> {
    AddressResolver::default().resolve(address, count, variable_type)
}

pub fn parse_byte(address: &str, count: u32) -> Result<RequestItem> {
    AddressResolver::default().parse_byte(address, count)
}

pub fn parse_bit(address: &str) -> Result<RequestItem> {
    AddressResolver::default().parse_bit(address)
}

/// Render the area of `item` back to its address prefix: `DB<n>` for data
/// blocks, else the bare area letter.
pub fn format_area(item: &RequestItem) -> Result<String> {
    match item.area() {
        S7Area::DataBlocks => Ok(format!("DB{}", item.db_number())),
        area => area
            .prefix()
            .map(str::to_string)
            .ok_or_else(|| Error::UnknownArea {
                area: format!("{area:?}"),
            }),
    }
}

// Keep only the digits of a segment, e.g. "DBX12" -> 12
#[inline]
fn extract_number(address: &str, segment: &str) -> Result<u32> {
    let digits: String = segment.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return Err(Error::address_format(address, "segment has no digits"));
    }
    digits
        .parse::<u32>()
        .map_err(|_| Error::address_format(address, "numeric segment out of range"))
}
