//! Round tally

use super::round::Vote;
use crate::core::ids::TicketId;
use std::collections::BTreeMap;

/// Sum allocation counts per ticket
///
/// Tickets without votes are absent from the map; callers treat them as 0.
pub fn tally_by_ticket(votes: &[Vote]) -> BTreeMap<TicketId, u32> {
    let mut tally = BTreeMap::new();
    for vote in votes {
        *tally.entry(vote.ticket_id.clone()).or_insert(0) += vote.count;
    }
    tally
}
