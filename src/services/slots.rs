//! Bracket position arithmetic shared by the bracket builder, the
//! elimination propagator, and result reversal.

use crate::dao::models::MatchupEntity;

/// Match number in the next round that the winner of `match_number` feeds.
pub fn destination_match(match_number: u32) -> u32 {
    match_number.div_ceil(2)
}

/// Slot index the winner of `match_number` occupies in its destination:
/// odd match numbers feed the first slot, even the second.
pub fn destination_slot(match_number: u32) -> usize {
    1 - (match_number as usize % 2)
}

/// Number of slots in the round-1 bracket for the given roster size.
pub fn bracket_slots(player_count: usize) -> usize {
    player_count.next_power_of_two().max(2)
}

/// Total rounds of a single-elimination bracket whose first round has
/// `round_one_matches` matchups (a power of two).
pub fn natural_round_count(round_one_matches: usize) -> u32 {
    round_one_matches.max(1).trailing_zeros() + 1
}

/// Find the matchup the winner of `source` advances into, within an
/// already-loaded match list.
pub fn downstream_of<'a>(
    matches: &'a [MatchupEntity],
    source: &MatchupEntity,
) -> Option<&'a MatchupEntity> {
    let round = source.round + 1;
    let number = destination_match(source.match_number);
    matches
        .iter()
        .find(|candidate| candidate.round == round && candidate.match_number == number)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn odd_matches_feed_first_slot_even_feed_second() {
        assert_eq!(destination_slot(1), 0);
        assert_eq!(destination_slot(2), 1);
        assert_eq!(destination_slot(3), 0);
        assert_eq!(destination_slot(4), 1);
    }

    #[test]
    fn adjacent_matches_share_a_destination() {
        assert_eq!(destination_match(1), 1);
        assert_eq!(destination_match(2), 1);
        assert_eq!(destination_match(3), 2);
        assert_eq!(destination_match(4), 2);
        assert_eq!(destination_match(7), 4);
    }

    #[test]
    fn bracket_is_padded_to_the_next_power_of_two() {
        assert_eq!(bracket_slots(2), 2);
        assert_eq!(bracket_slots(3), 4);
        assert_eq!(bracket_slots(5), 8);
        assert_eq!(bracket_slots(8), 8);
        assert_eq!(bracket_slots(9), 16);
    }

    #[test]
    fn round_count_follows_bracket_height() {
        assert_eq!(natural_round_count(1), 1);
        assert_eq!(natural_round_count(2), 2);
        assert_eq!(natural_round_count(4), 3);
        assert_eq!(natural_round_count(8), 4);
    }
}
