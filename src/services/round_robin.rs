//! Round robin schedule generation.
//!
//! Unlike Swiss pairing, the whole schedule is computed once when the
//! tournament starts: `legs * (N - 1)` rounds of `⌊N/2⌋` matches using the
//! standard circle rotation (first participant fixed, the rest rotating).

/// Opponent pairs per round, as indexes into the ordered roster.
pub type RobinRound = Vec<(usize, usize)>;

/// Generate the complete schedule for `player_count` participants meeting
/// `legs` times each. Odd rosters get a rotating ghost seat; the player
/// drawn against the ghost simply sits the round out, so no participant
/// idles more than once per rotation.
pub fn schedule(player_count: usize, legs: u8) -> Vec<RobinRound> {
    let mut rounds = Vec::new();
    if player_count < 2 || legs == 0 {
        return rounds;
    }

    let ghost = player_count;
    let seats = if player_count % 2 == 0 {
        player_count
    } else {
        player_count + 1
    };

    let mut ring: Vec<usize> = (0..seats).collect();
    let mut first_leg: Vec<RobinRound> = Vec::with_capacity(seats - 1);

    for _ in 0..seats - 1 {
        let mut pairs = Vec::with_capacity(seats / 2);
        for seat in 0..seats / 2 {
            let home = ring[seat];
            let away = ring[seats - 1 - seat];
            if home != ghost && away != ghost {
                pairs.push((home, away));
            }
        }
        first_leg.push(pairs);

        // Rotate every seat but the first.
        let last = ring.remove(seats - 1);
        ring.insert(1, last);
    }

    rounds.extend(first_leg.iter().cloned());
    for _ in 1..legs {
        // Return legs mirror the first one with home/away swapped.
        rounds.extend(
            first_leg
                .iter()
                .map(|pairs| pairs.iter().map(|&(home, away)| (away, home)).collect()),
        );
    }

    rounds
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn pair_counts(rounds: &[RobinRound]) -> HashMap<(usize, usize), usize> {
        let mut counts = HashMap::new();
        for round in rounds {
            for &(home, away) in round {
                let key = (home.min(away), home.max(away));
                *counts.entry(key).or_insert(0) += 1;
            }
        }
        counts
    }

    fn assert_conservation(player_count: usize, legs: u8) {
        let rounds = schedule(player_count, legs);
        let rounds_per_leg = if player_count % 2 == 0 {
            player_count - 1
        } else {
            player_count
        };
        let expected_rounds = rounds_per_leg * legs as usize;
        assert_eq!(rounds.len(), expected_rounds);

        // Every unordered pair meets exactly `legs` times.
        let counts = pair_counts(&rounds);
        assert_eq!(
            counts.len(),
            player_count * (player_count - 1) / 2,
            "every pair must be scheduled"
        );
        assert!(counts.values().all(|&count| count == legs as usize));

        // No player appears twice within one round.
        for round in &rounds {
            let mut seen = Vec::new();
            for &(home, away) in round {
                assert_ne!(home, away);
                assert!(!seen.contains(&home));
                assert!(!seen.contains(&away));
                seen.push(home);
                seen.push(away);
            }
        }
    }

    #[test]
    fn even_roster_single_leg() {
        assert_conservation(4, 1);
        assert_conservation(6, 1);
        assert_conservation(8, 1);
    }

    #[test]
    fn even_roster_double_leg() {
        assert_conservation(4, 2);
        assert_conservation(6, 2);
    }

    #[test]
    fn odd_roster_rotating_bye() {
        assert_conservation(5, 1);
        assert_conservation(5, 2);
        assert_conservation(7, 1);

        // With an odd roster, each player sits out exactly once per rotation.
        let rounds = schedule(5, 1);
        let mut idle_counts = vec![0usize; 5];
        for round in &rounds {
            let mut playing = vec![false; 5];
            for &(home, away) in round {
                playing[home] = true;
                playing[away] = true;
            }
            for (player, active) in playing.iter().enumerate() {
                if !active {
                    idle_counts[player] += 1;
                }
            }
        }
        assert!(idle_counts.iter().all(|&count| count == 1));
    }

    #[test]
    fn return_leg_swaps_home_and_away() {
        let rounds = schedule(4, 2);
        let half = rounds.len() / 2;
        for (first, second) in rounds[..half].iter().zip(&rounds[half..]) {
            let swapped: RobinRound = second.iter().map(|&(home, away)| (away, home)).collect();
            assert_eq!(first, &swapped);
        }
    }

    #[test]
    fn degenerate_rosters_produce_no_rounds() {
        assert!(schedule(0, 2).is_empty());
        assert!(schedule(1, 2).is_empty());
        assert!(schedule(4, 0).is_empty());
    }
}
