//! Continuation decision rule

use super::ballot::{Choice, ContinuationBallot};
use crate::core::error::DomainError;
use crate::ticket::entities::Ticket;
use crate::ticket::space::Space;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of a continuation poll
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Continue,
    Archive,
}

/// How a poll was closed
///
/// The label is written into `archived_by` when the decision archives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClosedBy {
    /// Every frozen participant voted
    MajorityVote,
    /// Someone ended the vote early
    ForcedVoteEnd,
}

impl ClosedBy {
    pub fn label(&self) -> &'static str {
        match self {
            ClosedBy::MajorityVote => "Majority Vote",
            ClosedBy::ForcedVoteEnd => "Forced Vote End",
        }
    }
}

impl std::fmt::Display for ClosedBy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Ballot counts of a poll
///
/// # Example
///
/// ```
/// use leancup_domain::{ContinuationTally, Decision};
///
/// let tie = ContinuationTally { continue_count: 3, archive_count: 3 };
/// assert_eq!(tie.decision(), Decision::Archive);
///
/// let ahead = ContinuationTally { continue_count: 4, archive_count: 3 };
/// assert_eq!(ahead.decision(), Decision::Continue);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContinuationTally {
    pub continue_count: usize,
    pub archive_count: usize,
}

impl ContinuationTally {
    pub fn from_ballots(ballots: &[ContinuationBallot]) -> Self {
        let continue_count = ballots
            .iter()
            .filter(|b| b.choice == Choice::Continue)
            .count();
        Self {
            continue_count,
            archive_count: ballots.len() - continue_count,
        }
    }

    /// Continue only on a strict majority; ties and empty polls archive
    pub fn decision(&self) -> Decision {
        if self.continue_count > self.archive_count {
            Decision::Continue
        } else {
            Decision::Archive
        }
    }
}

impl Decision {
    /// Apply this decision to the ticket under discussion
    ///
    /// Continue restarts the timer and keeps the accumulated time. Archive
    /// moves the ticket to `ARCHIVE` labelled with how the poll closed, which
    /// freezes the timer.
    pub fn apply(
        &self,
        ticket: &mut Ticket,
        closed_by: ClosedBy,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        match self {
            Decision::Continue => ticket.start_timer(now),
            Decision::Archive => {
                if ticket.space != Space::Doing {
                    return Err(DomainError::NotInDoing {
                        action: "archive it by vote",
                    });
                }
                ticket.archive_by_decision(closed_by.label(), now)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ids::{PollId, SessionId, TicketId, UserId};
    use crate::core::text::Description;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap()
    }

    fn ballots(continues: usize, archives: usize) -> Vec<ContinuationBallot> {
        let choices = std::iter::repeat_n(Choice::Continue, continues)
            .chain(std::iter::repeat_n(Choice::Archive, archives));
        choices
            .enumerate()
            .map(|(i, choice)| {
                ContinuationBallot::new(
                    PollId::new("p"),
                    TicketId::new("t"),
                    UserId::new(format!("u{}", i)),
                    choice,
                    t0(),
                )
            })
            .collect()
    }

    fn doing_ticket() -> Ticket {
        let mut ticket = Ticket::new(
            SessionId::new("s"),
            UserId::new("ana"),
            Description::try_new("Flaky CI", 1000).unwrap(),
            t0(),
        );
        ticket.move_to(Space::Doing, None, t0()).unwrap();
        ticket.start_timer(t0()).unwrap();
        ticket
    }

    #[test]
    fn test_tie_archives() {
        let tally = ContinuationTally::from_ballots(&ballots(3, 3));
        assert_eq!(tally.continue_count, 3);
        assert_eq!(tally.archive_count, 3);
        assert_eq!(tally.decision(), Decision::Archive);
    }

    #[test]
    fn test_strict_majority_continues() {
        let tally = ContinuationTally::from_ballots(&ballots(4, 3));
        assert_eq!(tally.decision(), Decision::Continue);
    }

    #[test]
    fn test_no_ballots_archives() {
        assert_eq!(ContinuationTally::default().decision(), Decision::Archive);
    }

    #[test]
    fn test_apply_continue_restarts_timer() {
        let mut ticket = doing_ticket();
        ticket.timer.pause(t0() + Duration::minutes(9)).unwrap();

        let later = t0() + Duration::minutes(10);
        Decision::Continue
            .apply(&mut ticket, ClosedBy::MajorityVote, later)
            .unwrap();

        assert_eq!(ticket.space, Space::Doing);
        assert!(ticket.timer.is_running());
        assert_eq!(ticket.timer.started_at, Some(later));
        assert_eq!(ticket.timer.total_ms, 9 * 60 * 1000);
    }

    #[test]
    fn test_apply_archive_labels_and_freezes() {
        let mut ticket = doing_ticket();
        let later = t0() + Duration::seconds(90);
        Decision::Archive
            .apply(&mut ticket, ClosedBy::ForcedVoteEnd, later)
            .unwrap();

        assert_eq!(ticket.space, Space::Archive);
        assert_eq!(ticket.archived_by.as_deref(), Some("Forced Vote End"));
        assert_eq!(ticket.archived_at, Some(later));
        assert_eq!(ticket.timer.total_ms, 90_000);
        assert!(ticket.timer.started_at.is_none());
    }

    #[test]
    fn test_apply_requires_doing() {
        let mut ticket = doing_ticket();
        ticket.move_to(Space::Todo, None, t0()).unwrap();
        assert!(matches!(
            Decision::Archive.apply(&mut ticket, ClosedBy::MajorityVote, t0()),
            Err(DomainError::NotInDoing { .. })
        ));
    }
}
