//! Initial bracket construction for every format.
//!
//! The builder produces round-1 matchups (or, for round robin, the full
//! schedule) from an ordered roster. Byes are placeholder opponents: a
//! round-1 matchup holding exactly one real player records an immediate
//! auto-win and is pre-propagated into round 2.

use rand::{rng, seq::SliceRandom};
use uuid::Uuid;

use crate::{
    dao::models::{BracketSlot, MatchupEntity, PairingMode, SlotKind},
    services::{round_robin, slots},
};

/// One roster entry handed to the builder by the registration layer.
#[derive(Debug, Clone)]
pub struct RosterEntry {
    /// Player identifier.
    pub player_id: Uuid,
    /// Display name shown in bracket slots.
    pub name: String,
    /// Account origin carried into the slots.
    pub kind: SlotKind,
}

impl RosterEntry {
    fn slot(&self) -> BracketSlot {
        BracketSlot::player(self.player_id, self.name.clone(), self.kind)
    }
}

/// Apply the pairing mode to the roster order. `Ranked` keeps the given
/// order, `Random` shuffles uniformly, `Seeded` shuffles within consecutive
/// seed groups so top seeds cannot meet bottom seeds early.
pub fn order_roster(
    mut roster: Vec<RosterEntry>,
    mode: PairingMode,
    default_group_size: u32,
) -> Vec<RosterEntry> {
    match mode {
        PairingMode::Ranked => roster,
        PairingMode::Random => {
            roster.shuffle(&mut rng());
            roster
        }
        PairingMode::Seeded { group_size } => {
            let size = if group_size == 0 {
                default_group_size
            } else {
                group_size
            }
            .max(1) as usize;
            let mut generator = rng();
            for group in roster.chunks_mut(size) {
                group.shuffle(&mut generator);
            }
            roster
        }
    }
}

/// Build the round-1 matchups of a single-elimination bracket. The roster
/// is padded with placeholders to the next power-of-two slot count; a
/// matchup with exactly one real player gets an immediate bye auto-win.
pub fn elimination_round_one(tournament_id: Uuid, roster: &[RosterEntry]) -> Vec<MatchupEntity> {
    let slot_count = slots::bracket_slots(roster.len());
    let match_count = slot_count / 2;

    (1..=match_count as u32)
        .map(|match_number| {
            let base = (match_number as usize - 1) * 2;
            let first = roster.get(base);
            let second = roster.get(base + 1);

            let mut matchup = MatchupEntity::new(
                tournament_id,
                1,
                match_number,
                [
                    first.map_or_else(BracketSlot::placeholder, RosterEntry::slot),
                    second.map_or_else(BracketSlot::placeholder, RosterEntry::slot),
                ],
            );

            if let (Some(entry), None) | (None, Some(entry)) = (first, second) {
                matchup.winner = Some(entry.player_id);
            }

            matchup
        })
        .collect()
}

/// Pre-propagate round-1 bye auto-wins into round 2, creating each
/// destination with the bye winner in its computed slot and a placeholder
/// in the other. Shares the slot addressing with the live propagator.
pub fn pre_propagate_byes(matches: &mut Vec<MatchupEntity>) {
    let byes: Vec<(u32, Uuid, BracketSlot)> = matches
        .iter()
        .filter(|matchup| matchup.round == 1)
        .filter_map(|matchup| {
            let winner = matchup.winner?;
            let slot = matchup
                .slots
                .iter()
                .find(|slot| slot.player_id == Some(winner))?
                .clone();
            Some((matchup.match_number, winner, slot))
        })
        .collect();

    for (match_number, _winner, slot) in byes {
        let destination_number = slots::destination_match(match_number);
        let slot_index = slots::destination_slot(match_number);

        if let Some(existing) = matches
            .iter_mut()
            .find(|candidate| candidate.round == 2 && candidate.match_number == destination_number)
        {
            existing.slots[slot_index] = slot;
            continue;
        }

        let tournament_id = matches
            .first()
            .map(|matchup| matchup.tournament_id)
            .unwrap_or_default();
        let mut created_slots = [BracketSlot::placeholder(), BracketSlot::placeholder()];
        created_slots[slot_index] = slot;
        matches.push(MatchupEntity::new(
            tournament_id,
            2,
            destination_number,
            created_slots,
        ));
    }
}

/// Build a Swiss round from computed pairings. The odd player out, if any,
/// receives a matchup against a placeholder with the win already recorded.
pub fn swiss_round(
    tournament_id: Uuid,
    round: u32,
    pairs: &[(Uuid, Uuid)],
    bye: Option<Uuid>,
    roster: &[RosterEntry],
) -> Vec<MatchupEntity> {
    let slot_for = |player_id: Uuid| -> BracketSlot {
        roster
            .iter()
            .find(|entry| entry.player_id == player_id)
            .map_or_else(BracketSlot::placeholder, RosterEntry::slot)
    };

    let mut matches: Vec<MatchupEntity> = pairs
        .iter()
        .enumerate()
        .map(|(index, &(first, second))| {
            MatchupEntity::new(
                tournament_id,
                round,
                index as u32 + 1,
                [slot_for(first), slot_for(second)],
            )
        })
        .collect();

    if let Some(player_id) = bye {
        let mut matchup = MatchupEntity::new(
            tournament_id,
            round,
            matches.len() as u32 + 1,
            [slot_for(player_id), BracketSlot::placeholder()],
        );
        matchup.winner = Some(player_id);
        matches.push(matchup);
    }

    matches
}

/// Materialize the complete round robin schedule into matchups.
pub fn robin_matches(tournament_id: Uuid, roster: &[RosterEntry], legs: u8) -> Vec<MatchupEntity> {
    round_robin::schedule(roster.len(), legs)
        .into_iter()
        .enumerate()
        .flat_map(|(round_index, pairs)| {
            let round = round_index as u32 + 1;
            pairs
                .into_iter()
                .enumerate()
                .map(move |(match_index, (home, away))| {
                    (round, match_index as u32 + 1, home, away)
                })
                .collect::<Vec<_>>()
        })
        .map(|(round, match_number, home, away)| {
            MatchupEntity::new(
                tournament_id,
                round,
                match_number,
                [roster[home].slot(), roster[away].slot()],
            )
        })
        .collect()
}
