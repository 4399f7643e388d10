use std::collections::HashMap;
use std::mem;

use crate::AssetId;

/// Identifies one fetch issued by a coordinator or batch loader.
///
/// Tokens increase monotonically per consumer and are never reused, so a completion carrying
/// an old token can always be told apart from the current request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RequestToken(u64);

impl RequestToken {
    pub fn get(self) -> u64 {
        self.0
    }
}

/// Which resolution a fetch is for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Stage {
    Single,
    Low,
    High,
}

/// A fetch the caller should perform and report back through `complete(token, result)`.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FetchRequest {
    pub token: RequestToken,
    /// What to resolve. For a low-resolution stage this is the low-resolution identifier.
    pub id: AssetId,
    pub stage: Stage,
}

/// Token bookkeeping shared by the coordinator and the batch loader.
#[derive(Debug, Default)]
pub(crate) struct Outbox {
    last: u64,
    queued: Vec<FetchRequest>,
    /// Outstanding token -> identifier of the record (or batch entry) that owns it.
    in_flight: HashMap<RequestToken, AssetId>,
}

impl Outbox {
    pub(crate) fn issue(&mut self, owner: &AssetId, fetch: &AssetId, stage: Stage) -> RequestToken {
        self.last = self.last.wrapping_add(1);
        let token = RequestToken(self.last);
        atrace!(token = token.0, id = fetch.as_str(), ?stage, "fetch issued");
        self.in_flight.insert(token, owner.clone());
        self.queued.push(FetchRequest {
            token,
            id: fetch.clone(),
            stage,
        });
        token
    }

    /// Retires `token`, returning its owner if it was still outstanding.
    pub(crate) fn settle(&mut self, token: RequestToken) -> Option<AssetId> {
        self.in_flight.remove(&token)
    }

    /// Makes `token` stale, including a request the caller has not taken yet.
    pub(crate) fn forget(&mut self, token: RequestToken) {
        if self.in_flight.remove(&token).is_some() {
            self.queued.retain(|r| r.token != token);
        }
    }

    pub(crate) fn drain(&mut self) -> Vec<FetchRequest> {
        mem::take(&mut self.queued)
    }

    pub(crate) fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Drops every outstanding token. Numbering continues, so older tokens stay stale.
    pub(crate) fn clear(&mut self) {
        self.queued.clear();
        self.in_flight.clear();
    }
}
