//! Tracks the single outstanding randomness request.

use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::clock::UnixTimestamp;

use crate::error::RaffleError;

/// Identifier issued by the oracle for a draw request
pub type RequestId = u64;

#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingRequest {
    pub request_id: RequestId,
    /// Round number the request draws for
    pub round: u64,
    pub requested_at: UnixTimestamp,
}

#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RequestTracker {
    pending: Option<PendingRequest>,
}

impl RequestTracker {
    pub fn pending(&self) -> Option<&PendingRequest> {
        self.pending.as_ref()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Record a freshly issued request. At most one may be outstanding.
    pub fn begin(
        &mut self,
        request_id: RequestId,
        round: u64,
        requested_at: UnixTimestamp,
    ) -> Result<(), RaffleError> {
        if self.pending.is_some() {
            return Err(RaffleError::RequestInFlight);
        }
        self.pending = Some(PendingRequest {
            request_id,
            round,
            requested_at,
        });
        Ok(())
    }

    /// Consume the pending request if `request_id` matches it
    pub fn consume(&mut self, request_id: RequestId) -> Result<PendingRequest, RaffleError> {
        match self.pending {
            Some(pending) if pending.request_id == request_id => {
                self.pending = None;
                Ok(pending)
            }
            _ => Err(RaffleError::UnknownRequest),
        }
    }
}
