//! Simulated Lean Coffee session for `leancup demo`
//!
//! Every participant acts concurrently at each stage, so the output shows the
//! coordinator resolving real races: one winner for DOING, one tally per
//! round, one decision per continuation poll.

use crate::wiring::Services;
use anyhow::{Result, bail};
use futures::future::join_all;
use leancup_application::{CoreError, SessionEvent};
use leancup_domain::{Choice, Space, TicketId, UserId, quadratic_cost};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;
use tokio::sync::broadcast::error::TryRecvError;
use tracing::info;

const TOPICS: &[&str] = &[
    "Flaky integration tests",
    "On-call handover",
    "Release cadence",
    "Code review turnaround",
    "Documentation debt",
    "Pairing rotation",
    "Dependency upgrades",
    "Meeting-free mornings",
];

/// Random allocation of one participant's points
fn plan_votes(rng: &mut StdRng, tickets: &[TicketId], budget: u64) -> Vec<(TicketId, u32)> {
    let mut order = tickets.to_vec();
    order.shuffle(rng);

    let mut remaining = budget;
    let mut plan = Vec::new();
    for ticket in order {
        let affordable = (0..=3u32)
            .take_while(|c| quadratic_cost(*c) <= remaining)
            .last()
            .unwrap_or(0);
        let count = rng.gen_range(0..=affordable);
        if count > 0 {
            remaining -= quadratic_cost(count);
            plan.push((ticket, count));
        }
    }
    plan
}

pub async fn run(services: &Services, participants: usize, seed: Option<u64>) -> Result<()> {
    if participants < 2 {
        bail!("the demo needs at least 2 participants");
    }
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let coordinator = &services.coordinator;
    let mut events = services.notifier.subscribe();

    // Session and members
    let session = coordinator.sessions.create("Demo session").await?;
    let session_id = &session.id;
    println!("Session {} created", session.short_code);

    let names: Vec<String> = (1..=participants)
        .map(|i| format!("participant-{}", i))
        .collect();
    let joins = names
        .iter()
        .map(|name| coordinator.sessions.join(session_id, name));
    let users: Vec<UserId> = join_all(joins)
        .await
        .into_iter()
        .map(|r| r.map(|outcome| outcome.user.id))
        .collect::<Result<_, CoreError>>()?;
    println!("{} participants joined", users.len());

    // Everyone proposes a topic and shares it
    let proposals = users.iter().enumerate().map(|(i, user)| async move {
        let ticket = coordinator
            .tickets
            .create(session_id, user, TOPICS[i % TOPICS.len()])
            .await?;
        coordinator
            .tickets
            .move_to_space(&ticket.id, Space::Todo, user, None)
            .await
    });
    let tickets: Vec<TicketId> = join_all(proposals)
        .await
        .into_iter()
        .map(|r| r.map(|ticket| ticket.id))
        .collect::<Result<_, CoreError>>()?;

    // Quadratic voting
    let round = coordinator.voting.start_round(session_id).await?;
    let budget = coordinator
        .voting
        .active_round(session_id)
        .await?
        .map(|view| view.budget)
        .unwrap_or(0);
    println!("Voting round started, {} points each", budget);

    let plans: Vec<Vec<(TicketId, u32)>> = users
        .iter()
        .map(|_| plan_votes(&mut rng, &tickets, budget))
        .collect();
    let ballots = users.iter().zip(&plans).map(|(user, plan)| {
        let round_id = &round.id;
        async move {
            for (ticket, count) in plan {
                coordinator
                    .voting
                    .cast_vote(round_id, ticket, user, *count)
                    .await?;
            }
            coordinator.voting.mark_done(round_id, user).await
        }
    });
    let closers = join_all(ballots)
        .await
        .into_iter()
        .collect::<Result<Vec<_>, CoreError>>()?
        .iter()
        .filter(|outcome| outcome.closed)
        .count();
    info!(closers, "Voting finished");

    let ranked = coordinator.tickets.list_visible(session_id, &users[0]).await?;
    println!("Ranking:");
    for ticket in &ranked {
        println!("  {:>3}  {}", ticket.vote_count, ticket.description.as_str());
    }

    // Everyone pushes their own topic into DOING at once
    let moves = users
        .iter()
        .zip(&tickets)
        .map(|(user, ticket)| coordinator.tickets.move_to_space(ticket, Space::Doing, user, None));
    let results = join_all(moves).await;
    let Some(discussed) = results.iter().find_map(|r| r.as_ref().ok()) else {
        bail!("no ticket reached DOING");
    };
    let conflicts = results
        .iter()
        .filter(|r| matches!(r, Err(CoreError::Conflict(_))))
        .count();
    println!(
        "Discussing \"{}\" ({} competing moves rejected)",
        discussed.description.as_str(),
        conflicts
    );
    coordinator.timer.start(&discussed.id).await?;

    // Time box over: continuation vote
    let choices: Vec<Choice> = users
        .iter()
        .map(|_| {
            if rng.gen_bool(0.5) {
                Choice::Continue
            } else {
                Choice::Archive
            }
        })
        .collect();
    let casts = users
        .iter()
        .zip(&choices)
        .map(|(user, choice)| coordinator.continuation.cast(&discussed.id, user, *choice));
    let decided = join_all(casts)
        .await
        .into_iter()
        .find_map(|r| r.ok().and_then(|outcome| outcome.decision));
    let outcome = match decided {
        Some(outcome) => outcome,
        None => coordinator.continuation.force_end(&discussed.id).await?,
    };
    println!(
        "Continuation vote: {} continue, {} archive -> {:?}",
        outcome.continue_count, outcome.archive_count, outcome.decision
    );

    // What an observer on the push channel saw
    let mut seen: BTreeMap<&'static str, usize> = BTreeMap::new();
    let mut skipped = 0;
    loop {
        match events.try_recv() {
            Ok(event) => *seen.entry(SessionEvent::event_type(&event)).or_default() += 1,
            Err(TryRecvError::Lagged(n)) => skipped += n,
            Err(_) => break,
        }
    }
    println!("Events:");
    for (event_type, count) in &seen {
        println!("  {:<20} {}", event_type, count);
    }
    if skipped > 0 {
        println!("  ({} events dropped by the lagging observer)", skipped);
    }

    Ok(())
}
