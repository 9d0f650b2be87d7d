//! Swiss standings and pairing computed from the persisted match history.

use std::collections::HashSet;

use uuid::Uuid;

use crate::dao::models::MatchupEntity;

/// Running record of one player across all finalized matchups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerRecord {
    /// The player the record belongs to.
    pub player_id: Uuid,
    /// Display name as last seen in a bracket slot.
    pub name: String,
    /// Matchups won, byes included.
    pub wins: u32,
    /// Matchups lost.
    pub losses: u32,
    /// Matchups force-settled or reported as ties.
    pub ties: u32,
}

/// Outcome of pairing one round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundPairing {
    /// Opponent pairs in pairing order.
    pub pairs: Vec<(Uuid, Uuid)>,
    /// Odd player out receiving a bye, if any.
    pub bye: Option<Uuid>,
}

/// Normalized key for an unordered player pair.
pub fn pair_key(a: Uuid, b: Uuid) -> (Uuid, Uuid) {
    if a <= b { (a, b) } else { (b, a) }
}

/// Unordered pairs of players that have already faced each other.
pub fn faced_pairs(matchups: &[MatchupEntity]) -> HashSet<(Uuid, Uuid)> {
    matchups
        .iter()
        .filter_map(|matchup| match matchup.slots {
            [ref first, ref second] => match (first.player_id, second.player_id) {
                (Some(a), Some(b)) => Some(pair_key(a, b)),
                _ => None,
            },
        })
        .collect()
}

/// Compute every player's record by scanning all finalized matchups, then
/// rank: wins descending, losses ascending, ties descending. The sort is
/// stable, so equal records keep their first-appearance order.
pub fn standings(matchups: &[MatchupEntity]) -> Vec<PlayerRecord> {
    let mut records: Vec<PlayerRecord> = Vec::new();

    fn record_of(player_id: Uuid, name: &str, records: &mut Vec<PlayerRecord>) -> usize {
        if let Some(index) = records
            .iter()
            .position(|record| record.player_id == player_id)
        {
            return index;
        }
        records.push(PlayerRecord {
            player_id,
            name: name.to_owned(),
            wins: 0,
            losses: 0,
            ties: 0,
        });
        records.len() - 1
    }

    for matchup in matchups {
        // Register participants in appearance order even before any result.
        for slot in &matchup.slots {
            if let Some(player_id) = slot.player_id {
                record_of(player_id, &slot.name, &mut records);
            }
        }

        if matchup.is_tie {
            for slot in &matchup.slots {
                if let Some(player_id) = slot.player_id {
                    let index = record_of(player_id, &slot.name, &mut records);
                    records[index].ties += 1;
                }
            }
        } else if let Some(winner) = matchup.winner {
            for slot in &matchup.slots {
                let Some(player_id) = slot.player_id else {
                    // Placeholder side of a bye; nobody records a loss.
                    continue;
                };
                let index = record_of(player_id, &slot.name, &mut records);
                if player_id == winner {
                    records[index].wins += 1;
                } else {
                    records[index].losses += 1;
                }
            }
        }
    }

    records.sort_by(|a, b| {
        b.wins
            .cmp(&a.wins)
            .then(a.losses.cmp(&b.losses))
            .then(b.ties.cmp(&a.ties))
    });

    records
}

/// Greedily pair ranked players top-down, skipping opponents already faced.
/// A repeat pairing is produced only when every remaining candidate has
/// been faced before; with an odd roster the last unpaired player gets the
/// bye.
pub fn pair_round(ranked: &[Uuid], faced: &HashSet<(Uuid, Uuid)>) -> RoundPairing {
    let mut paired = vec![false; ranked.len()];
    let mut pairs = Vec::with_capacity(ranked.len() / 2);
    let mut bye = None;

    for index in 0..ranked.len() {
        if paired[index] {
            continue;
        }

        let player = ranked[index];
        let fresh = (index + 1..ranked.len())
            .find(|&candidate| !paired[candidate] && !faced.contains(&pair_key(player, ranked[candidate])));
        let opponent = fresh.or_else(|| {
            // Last resort: allow a rematch rather than leaving two players
            // unpaired.
            (index + 1..ranked.len()).find(|&candidate| !paired[candidate])
        });

        match opponent {
            Some(candidate) => {
                paired[index] = true;
                paired[candidate] = true;
                pairs.push((player, ranked[candidate]));
            }
            None => {
                paired[index] = true;
                bye = Some(player);
            }
        }
    }

    RoundPairing { pairs, bye }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::models::{BracketSlot, SlotKind};

    fn players(count: usize) -> Vec<Uuid> {
        (0..count).map(|_| Uuid::new_v4()).collect()
    }

    fn slot(player: Uuid, name: &str) -> BracketSlot {
        BracketSlot::player(player, name.into(), SlotKind::LoggedIn)
    }

    fn decided(tournament: Uuid, round: u32, number: u32, winner: Uuid, loser: Uuid) -> MatchupEntity {
        let mut matchup = MatchupEntity::new(
            tournament,
            round,
            number,
            [slot(winner, "w"), slot(loser, "l")],
        );
        matchup.winner = Some(winner);
        matchup
    }

    fn bye_win(tournament: Uuid, round: u32, number: u32, winner: Uuid) -> MatchupEntity {
        let mut matchup = MatchupEntity::new(
            tournament,
            round,
            number,
            [slot(winner, "w"), BracketSlot::placeholder()],
        );
        matchup.winner = Some(winner);
        matchup
    }

    #[test]
    fn standings_rank_by_wins_then_losses_then_ties() {
        let tournament = Uuid::new_v4();
        let ids = players(4);
        let [a, b, c, d] = [ids[0], ids[1], ids[2], ids[3]];

        let mut tied = MatchupEntity::new(tournament, 2, 1, [slot(b, "b"), slot(d, "d")]);
        tied.is_tie = true;

        let history = vec![
            decided(tournament, 1, 1, a, b),
            decided(tournament, 1, 2, c, d),
            decided(tournament, 2, 2, a, c),
            tied,
        ];

        let table = standings(&history);
        assert_eq!(table[0].player_id, a);
        assert_eq!((table[0].wins, table[0].losses, table[0].ties), (2, 0, 0));
        // c: 1 win 1 loss; b and d: 0 wins, 1 loss, 1 tie.
        assert_eq!(table[1].player_id, c);
        assert_eq!(table[2].player_id, b);
        assert_eq!(table[3].player_id, d);
    }

    #[test]
    fn standings_count_byes_as_wins_without_a_loser() {
        let tournament = Uuid::new_v4();
        let ids = players(1);
        let table = standings(&[bye_win(tournament, 1, 1, ids[0])]);
        assert_eq!(table.len(), 1);
        assert_eq!((table[0].wins, table[0].losses), (1, 0));
    }

    #[test]
    fn equal_records_keep_appearance_order() {
        let tournament = Uuid::new_v4();
        let ids = players(4);
        let [a, b, c, d] = [ids[0], ids[1], ids[2], ids[3]];
        let history = vec![
            decided(tournament, 1, 1, a, b),
            decided(tournament, 1, 2, c, d),
        ];

        let table = standings(&history);
        // Both winners 1-0, both losers 0-1, in bracket order.
        assert_eq!(table[0].player_id, a);
        assert_eq!(table[1].player_id, c);
        assert_eq!(table[2].player_id, b);
        assert_eq!(table[3].player_id, d);
    }

    #[test]
    fn pairing_avoids_rematches_when_possible() {
        let tournament = Uuid::new_v4();
        let ids = players(4);
        let [a, b, c, d] = [ids[0], ids[1], ids[2], ids[3]];
        let history = vec![
            decided(tournament, 1, 1, a, b),
            decided(tournament, 1, 2, c, d),
        ];

        let faced = faced_pairs(&history);
        let ranked: Vec<Uuid> = standings(&history)
            .into_iter()
            .map(|record| record.player_id)
            .collect();
        let pairing = pair_round(&ranked, &faced);

        assert_eq!(pairing.pairs.len(), 2);
        assert!(pairing.bye.is_none());
        for &(x, y) in &pairing.pairs {
            assert!(!faced.contains(&pair_key(x, y)), "rematch {x}/{y}");
        }
        assert_eq!(pairing.pairs[0], (a, c));
        assert_eq!(pairing.pairs[1], (b, d));
    }

    #[test]
    fn forced_rematch_is_the_last_resort() {
        let ids = players(2);
        let faced = HashSet::from([pair_key(ids[0], ids[1])]);
        let pairing = pair_round(&ids, &faced);
        assert_eq!(pairing.pairs, vec![(ids[0], ids[1])]);
        assert!(pairing.bye.is_none());
    }

    #[test]
    fn odd_player_out_gets_the_bye() {
        let ids = players(5);
        let pairing = pair_round(&ids, &HashSet::new());
        assert_eq!(pairing.pairs.len(), 2);
        assert_eq!(pairing.bye, Some(ids[4]));
    }

    #[test]
    fn partial_rematch_pressure_still_finds_fresh_opponents() {
        let ids = players(4);
        let [a, b, c, d] = [ids[0], ids[1], ids[2], ids[3]];
        // a has faced b and c; only d is fresh for a.
        let faced = HashSet::from([pair_key(a, b), pair_key(a, c)]);
        let pairing = pair_round(&ids, &faced);
        assert_eq!(pairing.pairs[0], (a, d));
        assert_eq!(pairing.pairs[1], (b, c));
    }
}
