//! Siemens S7 request core: address resolution and PDU request planning.
//!
//! Addresses such as `DB100.DBX0.0`, `M1.1` or `VW100` are resolved into
//! [`RequestItem`]s, whose sizes are then packed into groups that each fit one
//! negotiated S7 PDU. Everything here is pure and synchronous; building and
//! sending telegrams is left to the session layer.

pub mod protocol;
pub mod settings;

pub use protocol::{
    frame::{
        format_area, parse_bit, parse_byte, resolve, AddressResolver, RequestItem, S7Area,
        VAreaPolicy, VariableType,
    },
    planner::{
        pack_for_read, pack_for_write, PduBudget, PlannerConfig, ReadPlan, RequestChunk,
        RequestGroup, S7Planner, WritePlan,
    },
    S7Error, S7Result,
};
pub use settings::S7Settings;
