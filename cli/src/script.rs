//! JSON-lines call scripts.
//!
//! One call per line:
//!
//! ```json
//! {"caller":"0x…","block":1000,"op":{"pin":{"id":"0x…","tier":3,"fingerprint":"0x…"}}}
//! {"caller":"0x…","block":1128,"op":"advance_epoch"}
//! {"caller":"0x…","block":1128,"value":1,"op":{"stake":{"anchor":"0x…"}}}
//! ```
//!
//! Blank lines and lines starting with `#` are skipped.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use anchorage_core::{Call, Payout, Registry, ValueSink};
use anchorage_types::{
    AccountId, Amount, AnchorId, BlockHeight, Event, Fingerprint, LinkId, RecallHash,
    RegistryError, Tag,
};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScriptLine {
    pub caller: AccountId,
    pub block: u64,
    #[serde(default)]
    pub value: Amount,
    pub op: Op,
}

impl ScriptLine {
    pub fn call(&self) -> Call {
        Call::new(self.caller, BlockHeight::new(self.block)).with_value(self.value)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub enum Op {
    Pin {
        id: AnchorId,
        tier: u8,
        fingerprint: Fingerprint,
        #[serde(default)]
        tags: Vec<Tag>,
    },
    PinBatch {
        ids: Vec<AnchorId>,
        tiers: Vec<u8>,
        fingerprints: Vec<Fingerprint>,
    },
    UpdateContent {
        id: AnchorId,
        fingerprint: Fingerprint,
    },
    Deprecate {
        id: AnchorId,
    },
    StoreRecall {
        id: AnchorId,
        recall: RecallHash,
    },
    ForgeLink {
        id: LinkId,
        from: AnchorId,
        to: AnchorId,
        kind: u8,
        strength: u8,
        fingerprint: Fingerprint,
    },
    ForgeBatch {
        ids: Vec<LinkId>,
        froms: Vec<AnchorId>,
        tos: Vec<AnchorId>,
        kinds: Vec<u8>,
        fingerprints: Vec<Fingerprint>,
    },
    AdvanceEpoch,
    Stake {
        anchor: AnchorId,
    },
    Release {
        anchor: AnchorId,
    },
    Deposit,
    Withdraw {
        to: AccountId,
        amount: Amount,
    },
    SweepFees,
    Pause,
    Unpause,
}

impl Op {
    pub const fn name(&self) -> &'static str {
        match self {
            Op::Pin { .. } => "pin",
            Op::PinBatch { .. } => "pin_batch",
            Op::UpdateContent { .. } => "update_content",
            Op::Deprecate { .. } => "deprecate",
            Op::StoreRecall { .. } => "store_recall",
            Op::ForgeLink { .. } => "forge_link",
            Op::ForgeBatch { .. } => "forge_batch",
            Op::AdvanceEpoch => "advance_epoch",
            Op::Stake { .. } => "stake",
            Op::Release { .. } => "release",
            Op::Deposit => "deposit",
            Op::Withdraw { .. } => "withdraw",
            Op::SweepFees => "sweep_fees",
            Op::Pause => "pause",
            Op::Unpause => "unpause",
        }
    }

    /// Run against `registry`. Return values are dropped; the event log carries them.
    pub fn apply<S: ValueSink>(
        &self,
        registry: &mut Registry,
        call: &Call,
        sink: &mut S,
    ) -> Result<(), RegistryError> {
        match self {
            Op::Pin {
                id,
                tier,
                fingerprint,
                tags,
            } => registry
                .pin(call, *id, *tier, *fingerprint, tags)
                .map(drop),
            Op::PinBatch {
                ids,
                tiers,
                fingerprints,
            } => registry.pin_batch(call, ids, tiers, fingerprints).map(drop),
            Op::UpdateContent { id, fingerprint } => {
                registry.update_content(call, *id, *fingerprint).map(drop)
            }
            Op::Deprecate { id } => registry.deprecate(call, *id).map(drop),
            Op::StoreRecall { id, recall } => registry.store_recall(call, *id, *recall),
            Op::ForgeLink {
                id,
                from,
                to,
                kind,
                strength,
                fingerprint,
            } => registry
                .forge_link(call, *id, *from, *to, *kind, *strength, *fingerprint)
                .map(drop),
            Op::ForgeBatch {
                ids,
                froms,
                tos,
                kinds,
                fingerprints,
            } => registry
                .forge_batch(call, ids, froms, tos, kinds, fingerprints)
                .map(drop),
            Op::AdvanceEpoch => registry.advance_epoch(call).map(drop),
            Op::Stake { anchor } => registry.stake(call, *anchor).map(drop),
            Op::Release { anchor } => registry.release(call, *anchor, sink).map(drop),
            Op::Deposit => registry.deposit(call).map(drop),
            Op::Withdraw { to, amount } => registry.withdraw(call, *to, *amount, sink).map(drop),
            Op::SweepFees => registry.sweep_fees(call, sink).map(drop),
            Op::Pause => registry.pause(call),
            Op::Unpause => registry.unpause(call),
        }
    }
}

/// Numbered script lines, comments and blanks removed. Numbers are 1-based.
pub fn parse(raw: &str) -> Result<Vec<(usize, ScriptLine)>> {
    raw.lines()
        .enumerate()
        .map(|(index, line)| (index + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .map(|(number, line)| {
            serde_json::from_str(line)
                .with_context(|| format!("invalid script line {number}"))
                .map(|parsed| (number, parsed))
        })
        .collect()
}

/// Printed once per script line.
#[derive(Debug, Serialize)]
pub struct Outcome<'a> {
    pub line: usize,
    pub op: &'static str,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub events: &'a [Event],
}

/// Printed once per delivered transfer, after all outcomes.
#[derive(Debug, Serialize)]
pub struct PayoutLine {
    pub payout: Payout,
}
