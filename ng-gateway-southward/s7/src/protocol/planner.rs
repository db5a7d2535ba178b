use super::{
    error::{Error, Result},
    frame::RequestItem,
};
use bytes::{Bytes, BytesMut};
use serde::{Deserialize, Serialize};
use std::mem::take;

// Shared S7 protocol constants used by the PDU budgets
const S7_REQ_HEADER_JOB: usize = 10; // S7 Job header length (no error code)
const S7_RESP_HEADER_ACK_DATA: usize = 12; // S7 AckData header length (includes error code)
const S7_REQ_PARAM_BASE: usize = 2; // function + item_count
const S7_RESP_PARAM_BASE: usize = 2; // function + item_count
const S7_VAR_SPEC_LEN: usize = 12; // per item VarSpec length in ReadVar/WriteVar param
const S7_DATA_ITEM_HEADER: usize = 4; // rc/reserved(1) + transport size(1) + length(2)
const S7_DATA_ITEM_PAD: usize = 1; // fill byte after odd-length data

/// One contiguous slice of one original request after splitting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestChunk {
    /// Index of the original request this chunk was cut from
    pub tag_index: usize,
    /// Total size of the original request
    pub original_size: usize,
    /// Offset of this chunk within the original request
    pub offset: usize,
    /// Bytes carried by this chunk
    pub chunk_size: usize,
    /// Fixed per-item protocol overhead charged against the budget
    pub overhead_size: usize,
    /// Read-only closure margin, 0 for writes
    pub margin: usize,
}

impl RequestChunk {
    /// Bytes this chunk consumes from the PDU budget.
    #[inline]
    pub fn total_length(&self) -> usize {
        self.chunk_size + self.overhead_size
    }

    /// True when this chunk does not cover its whole original request.
    #[inline]
    pub fn is_partial(&self) -> bool {
        self.chunk_size < self.original_size
    }
}

/// Ordered chunks destined for one PDU. Never empty when produced by the planner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestGroup {
    chunks: Vec<RequestChunk>,
}

impl RequestGroup {
    #[inline]
    pub fn chunks(&self) -> &[RequestChunk] {
        &self.chunks
    }

    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, RequestChunk> {
        self.chunks.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Sum of `chunk_size + overhead_size` over the group.
    pub fn total_length(&self) -> usize {
        self.chunks.iter().map(RequestChunk::total_length).sum()
    }

    /// Payload bytes only, without per-item overhead.
    pub fn payload_length(&self) -> usize {
        self.chunks.iter().map(|c| c.chunk_size).sum()
    }
}

impl<'a> IntoIterator for &'a RequestGroup {
    type Item = &'a RequestChunk;
    type IntoIter = std::slice::Iter<'a, RequestChunk>;

    fn into_iter(self) -> Self::IntoIter {
        self.chunks.iter()
    }
}

#[derive(Debug, Clone, Copy)]
enum PackMode {
    Read,
    Write,
}

impl PackMode {
    fn as_str(self) -> &'static str {
        match self {
            PackMode::Read => "read",
            PackMode::Write => "write",
        }
    }
}

/// Pack write requests of the given sizes into PDU groups.
///
/// Example with `target_size = 226`, `overhead_size = 5`:
/// ```text
/// 1,50,65,200,   322,    99,500,        44
/// |1,50,65,90|110,106|216|99,117|221|162,44|
/// ```
pub fn pack_for_write(
    sizes: &[usize],
    target_size: usize,
    overhead_size: usize,
) -> Result<Vec<RequestGroup>> {
    if target_size <= overhead_size {
        return Err(Error::BudgetTooSmall {
            target_size,
            overhead_size,
            margin: 0,
        });
    }
    Ok(pack(
        PackMode::Write,
        sizes,
        target_size,
        overhead_size,
        0,
        overhead_size,
    ))
}

/// Pack read requests of the given sizes into PDU groups.
///
/// Identical to [`pack_for_write`] except that a group is closed as soon as
/// fewer than `margin` bytes are left, since the response framing of a read
/// depends on how many items it carries.
pub fn pack_for_read(
    sizes: &[usize],
    target_size: usize,
    overhead_size: usize,
    margin: usize,
) -> Result<Vec<RequestGroup>> {
    if target_size <= overhead_size || target_size <= margin {
        return Err(Error::BudgetTooSmall {
            target_size,
            overhead_size,
            margin,
        });
    }
    Ok(pack(
        PackMode::Read,
        sizes,
        target_size,
        overhead_size,
        margin,
        margin,
    ))
}

/// Sequential packing shared by reads and writes.
///
/// Callers guarantee `target_size > overhead_size` and `target_size > reserve`.
fn pack(
    mode: PackMode,
    sizes: &[usize],
    target_size: usize,
    overhead_size: usize,
    margin: usize,
    reserve: usize,
) -> Vec<RequestGroup> {
    let mut groups: Vec<RequestGroup> = Vec::new();
    let mut current: Vec<RequestChunk> = Vec::new();
    let mut sum = 0usize;
    let mut chunk_count = 0usize;

    for (tag_index, &original_size) in sizes.iter().enumerate() {
        let mut number = original_size;
        let mut offset = 0usize;
        while number > 0 {
            // Open group cannot take a single payload byte. Only reachable when
            // reserve < overhead_size, i.e. reads with a small margin.
            // `sum <= target_size` holds here, so the subtractions below cannot wrap.
            if overhead_size >= target_size - sum {
                tracing::trace!(group = groups.len(), used = sum, "closing full PDU group");
                groups.push(RequestGroup {
                    chunks: take(&mut current),
                });
                sum = 0;
            }

            let chunk_size = number.min(target_size - sum - overhead_size);
            current.push(RequestChunk {
                tag_index,
                original_size,
                offset,
                chunk_size,
                overhead_size,
                margin,
            });
            chunk_count += 1;

            sum += chunk_size + overhead_size;
            number -= chunk_size;
            offset += chunk_size;

            if sum.saturating_add(reserve) >= target_size {
                tracing::trace!(group = groups.len(), used = sum, "closing PDU group");
                groups.push(RequestGroup {
                    chunks: take(&mut current),
                });
                sum = 0;
            }
        }
    }

    if !current.is_empty() {
        groups.push(RequestGroup { chunks: current });
    }

    tracing::debug!(
        mode = mode.as_str(),
        tags = sizes.len(),
        groups = groups.len(),
        chunks = chunk_count,
        target_size,
        overhead_size,
        reserve,
        "packed S7 requests"
    );
    groups
}

/// Packing parameters for one direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PduBudget {
    /// Bytes available for items (chunk data plus per-item overhead)
    pub target_size: usize,
    /// Per-item overhead charged against `target_size`
    pub overhead_size: usize,
    /// Bytes reserved at read group closure, 0 for writes
    pub margin: usize,
}

impl PduBudget {
    /// Budget of a ReadVar exchange under the negotiated PDU length.
    ///
    /// The response is the limiting side: AckData header and parameter take
    /// 14 bytes, each item 4 header bytes plus a possible fill byte. One VarSpec
    /// worth of bytes is kept as closure margin.
    pub fn read(pdu_len: u16) -> Result<Self> {
        let budget = Self {
            target_size: (pdu_len as usize)
                .saturating_sub(S7_RESP_HEADER_ACK_DATA + S7_RESP_PARAM_BASE),
            overhead_size: S7_DATA_ITEM_HEADER + S7_DATA_ITEM_PAD,
            margin: S7_VAR_SPEC_LEN,
        };
        budget.check_read()?;
        Ok(budget)
    }

    /// Budget of a WriteVar request under the negotiated PDU length.
    ///
    /// Job header and parameter take 12 bytes; each item costs its VarSpec,
    /// its data item header and a possible fill byte.
    pub fn write(pdu_len: u16) -> Result<Self> {
        let budget = Self {
            target_size: (pdu_len as usize).saturating_sub(S7_REQ_HEADER_JOB + S7_REQ_PARAM_BASE),
            overhead_size: S7_VAR_SPEC_LEN + S7_DATA_ITEM_HEADER + S7_DATA_ITEM_PAD,
            margin: 0,
        };
        budget.check_write()?;
        Ok(budget)
    }

    fn check_read(&self) -> Result<()> {
        if self.target_size <= self.overhead_size || self.target_size <= self.margin {
            return Err(self.too_small());
        }
        Ok(())
    }

    fn check_write(&self) -> Result<()> {
        if self.target_size <= self.overhead_size {
            return Err(self.too_small());
        }
        Ok(())
    }

    fn too_small(&self) -> Error {
        Error::BudgetTooSmall {
            target_size: self.target_size,
            overhead_size: self.overhead_size,
            margin: self.margin,
        }
    }
}

/// Planner configuration.
///
/// Budgets are derived from the negotiated PDU length unless overridden.
#[derive(Debug, Clone, Copy)]
pub struct PlannerConfig {
    /// Negotiated S7 PDU length (header + param_len + payload_len).
    pub s7_pdu_len: u16,
    /// Optional: explicit read budget instead of the one derived from `s7_pdu_len`.
    pub read_budget: Option<PduBudget>,
    /// Optional: explicit write budget instead of the one derived from `s7_pdu_len`.
    pub write_budget: Option<PduBudget>,
}

impl PlannerConfig {
    pub fn new(s7_pdu_len: u16) -> Self {
        Self {
            s7_pdu_len,
            read_budget: None,
            write_budget: None,
        }
    }

    #[inline]
    pub fn with_read_budget(mut self, budget: Option<PduBudget>) -> Self {
        self.read_budget = budget;
        self
    }

    #[inline]
    pub fn with_write_budget(mut self, budget: Option<PduBudget>) -> Self {
        self.write_budget = budget;
        self
    }

    pub fn read_budget(&self) -> Result<PduBudget> {
        match self.read_budget {
            Some(b) => {
                b.check_read()?;
                Ok(b)
            }
            None => PduBudget::read(self.s7_pdu_len),
        }
    }

    pub fn write_budget(&self) -> Result<PduBudget> {
        match self.write_budget {
            Some(b) => {
                b.check_write()?;
                Ok(b)
            }
            None => PduBudget::write(self.s7_pdu_len),
        }
    }
}

/// Read requests packed into PDU groups.
#[derive(Debug, Clone)]
pub struct ReadPlan {
    groups: Vec<RequestGroup>,
    items: Vec<RequestItem>,
}

/// Write requests packed into PDU groups.
#[derive(Debug, Clone)]
pub struct WritePlan {
    groups: Vec<RequestGroup>,
    items: Vec<RequestItem>,
}

/// Planner entrypoints over resolved request items.
pub struct S7Planner;

impl S7Planner {
    /// Plan read requests, one tag per item, sized by `count`.
    pub fn plan_read(config: &PlannerConfig, items: &[RequestItem]) -> Result<ReadPlan> {
        let budget = config.read_budget()?;
        let groups = pack_for_read(
            &item_sizes(items),
            budget.target_size,
            budget.overhead_size,
            budget.margin,
        )?;
        Ok(ReadPlan {
            groups,
            items: items.to_vec(),
        })
    }

    /// Plan write requests, one tag per item, sized by `count`.
    pub fn plan_write(config: &PlannerConfig, items: &[RequestItem]) -> Result<WritePlan> {
        let budget = config.write_budget()?;
        let groups = pack_for_write(
            &item_sizes(items),
            budget.target_size,
            budget.overhead_size,
        )?;
        Ok(WritePlan {
            groups,
            items: items.to_vec(),
        })
    }
}

#[inline]
fn item_sizes(items: &[RequestItem]) -> Vec<usize> {
    items.iter().map(|it| it.count() as usize).collect()
}

/// Sub-requests per group, in chunk order.
fn chunk_requests(
    groups: &[RequestGroup],
    items: &[RequestItem],
) -> Result<Vec<Vec<RequestItem>>> {
    groups
        .iter()
        .map(|g| {
            g.iter()
                .map(|c| {
                    let item = items.get(c.tag_index).ok_or(Error::PlanMismatch {
                        context: "chunk refers to unknown item",
                    })?;
                    item.slice(c.offset, c.chunk_size)
                })
                .collect::<Result<Vec<_>>>()
        })
        .collect()
}

impl ReadPlan {
    #[inline]
    pub fn groups(&self) -> &[RequestGroup] {
        &self.groups
    }

    #[inline]
    pub fn items(&self) -> &[RequestItem] {
        &self.items
    }

    /// ReadVar items of every telegram, one inner vector per group.
    pub fn requests(&self) -> Result<Vec<Vec<RequestItem>>> {
        chunk_requests(&self.groups, &self.items)
    }

    /// Reassemble per-item data from the responses of every group.
    ///
    /// `responses[g][k]` is the data returned for chunk `k` of group `g`. The
    /// result has one buffer of `count` bytes per original item, in input order.
    pub fn merge(&self, responses: &[Vec<Bytes>]) -> Result<Vec<Bytes>> {
        if responses.len() != self.groups.len() {
            return Err(Error::PlanMismatch {
                context: "response count differs from group count",
            });
        }

        let mut merged: Vec<BytesMut> = self
            .items
            .iter()
            .map(|it| {
                let mut buf = BytesMut::with_capacity(it.count() as usize);
                buf.resize(it.count() as usize, 0);
                buf
            })
            .collect();

        for (group, data_items) in self.groups.iter().zip(responses) {
            if group.len() != data_items.len() {
                return Err(Error::PlanMismatch {
                    context: "response item count differs from chunk count",
                });
            }
            for (chunk, data) in group.iter().zip(data_items) {
                if data.len() < chunk.chunk_size {
                    return Err(Error::InsufficientData {
                        needed: chunk.chunk_size,
                        available: data.len(),
                    });
                }
                let buf = merged.get_mut(chunk.tag_index).ok_or(Error::PlanMismatch {
                    context: "chunk refers to unknown item",
                })?;
                buf[chunk.offset..chunk.offset + chunk.chunk_size]
                    .copy_from_slice(&data[..chunk.chunk_size]);
            }
        }

        Ok(merged.into_iter().map(BytesMut::freeze).collect())
    }
}

impl WritePlan {
    #[inline]
    pub fn groups(&self) -> &[RequestGroup] {
        &self.groups
    }

    #[inline]
    pub fn items(&self) -> &[RequestItem] {
        &self.items
    }

    /// WriteVar items of every telegram, one inner vector per group.
    pub fn requests(&self) -> Result<Vec<Vec<RequestItem>>> {
        chunk_requests(&self.groups, &self.items)
    }

    /// Cut per-item payloads into per-chunk payloads without copying.
    ///
    /// `data[i]` must hold exactly `count` bytes of item `i`.
    pub fn split(&self, data: &[Bytes]) -> Result<Vec<Vec<Bytes>>> {
        if data.len() != self.items.len() {
            return Err(Error::PlanMismatch {
                context: "payload count differs from item count",
            });
        }
        if self
            .items
            .iter()
            .zip(data)
            .any(|(it, d)| d.len() != it.count() as usize)
        {
            return Err(Error::PlanMismatch {
                context: "payload length differs from item count",
            });
        }

        Ok(self
            .groups
            .iter()
            .map(|g| {
                g.iter()
                    .map(|c| data[c.tag_index].slice(c.offset..c.offset + c.chunk_size))
                    .collect::<Vec<_>>()
            })
            .collect())
    }
}
