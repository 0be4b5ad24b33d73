//! Lineup eligibility and optimal lineup search

use crate::models::PlayerScore;

/// Above this many slots the exact search gets too large and the greedy pass is used
const MAX_EXACT_SLOTS: usize = 16;

/// Whether a player at `position` may be started in `slot`
pub fn slot_accepts(slot: &str, position: &str) -> bool {
    let slot = slot.trim().to_ascii_uppercase();
    let position = position.trim().to_ascii_uppercase();

    let accepted: &[&str] = match slot.as_str() {
        "DEF" | "DST" => &["DEF", "DST"],
        "FLEX" => &["RB", "WR", "TE"],
        "WRRB_FLEX" => &["RB", "WR"],
        "REC_FLEX" => &["WR", "TE"],
        "SUPER_FLEX" => &["QB", "RB", "WR", "TE"],
        "IDP_FLEX" => &["DL", "LB", "DB"],
        _ => return slot == position,
    };
    accepted.contains(&position.as_str())
}

fn eligible(slot: &str, player: &PlayerScore, own_slot: Option<&str>) -> bool {
    own_slot.map_or(false, |own| own.eq_ignore_ascii_case(slot))
        || slot_accepts(slot, &player.position)
}

/// Best achievable starter total from `starters` plus `bench`.
///
/// The slots to fill are the starters' slots (or positions when no slot was
/// declared). Each player fills at most one slot. Returns `None` when there
/// are no starters.
pub fn optimal_points(starters: &[PlayerScore], bench: &[PlayerScore]) -> Option<f64> {
    if starters.is_empty() {
        return None;
    }

    let slots: Vec<String> = starters
        .iter()
        .map(|p| p.slot_or_position().to_ascii_uppercase())
        .collect();

    // Starters carry their own slot so they always fit where they were started
    let pool: Vec<(&PlayerScore, Option<&str>)> = starters
        .iter()
        .map(|p| (p, Some(p.slot_or_position())))
        .chain(bench.iter().map(|p| (p, None)))
        .collect();

    let best = if slots.len() <= MAX_EXACT_SLOTS {
        exact_optimum(&slots, &pool)
    } else {
        greedy_optimum(&slots, &pool)
    };

    Some(round2(best))
}

/// Bitmask DP over filled slots, one player at a time
fn exact_optimum(slots: &[String], pool: &[(&PlayerScore, Option<&str>)]) -> f64 {
    let full = (1usize << slots.len()) - 1;
    let mut best = vec![f64::NEG_INFINITY; full + 1];
    best[0] = 0.0;

    for (player, own_slot) in pool {
        let fits: Vec<usize> = slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| eligible(slot, player, *own_slot))
            .map(|(i, _)| i)
            .collect();
        if fits.is_empty() {
            continue;
        }

        let previous = best.clone();
        for (mask, &value) in previous.iter().enumerate() {
            if value == f64::NEG_INFINITY {
                continue;
            }
            for &slot in &fits {
                let bit = 1 << slot;
                if mask & bit == 0 {
                    let candidate = value + player.points;
                    if candidate > best[mask | bit] {
                        best[mask | bit] = candidate;
                    }
                }
            }
        }
    }

    // Every starter fits its own slot, so the full mask is always reachable
    best[full]
}

/// Fill the most restrictive slots first with the best remaining player
fn greedy_optimum(slots: &[String], pool: &[(&PlayerScore, Option<&str>)]) -> f64 {
    let mut order: Vec<(usize, usize)> = slots
        .iter()
        .enumerate()
        .map(|(i, slot)| (pool.iter().filter(|(p, own)| eligible(slot, p, *own)).count(), i))
        .collect();
    order.sort();

    let mut used = vec![false; pool.len()];
    let mut total = 0.0;
    for (_, slot_index) in order {
        let slot = &slots[slot_index];
        let pick = pool
            .iter()
            .enumerate()
            .filter(|(i, (p, own))| !used[*i] && eligible(slot, p, *own))
            .max_by(|a, b| a.1 .0.points.total_cmp(&b.1 .0.points));
        if let Some((i, (player, _))) = pick {
            used[i] = true;
            total += player.points;
        }
    }
    total
}

/// Worst start/sit call: the bench player who would have outscored an
/// eligible starter by the most points
pub fn biggest_mistake<'a>(
    starters: &'a [PlayerScore],
    bench: &'a [PlayerScore],
) -> Option<(&'a PlayerScore, &'a PlayerScore)> {
    let mut worst: Option<(&PlayerScore, &PlayerScore, f64)> = None;

    for starter in starters {
        for benched in bench {
            if !slot_accepts(starter.slot_or_position(), &benched.position) {
                continue;
            }
            let gap = benched.points - starter.points;
            if gap <= 0.0 {
                continue;
            }
            let replace = match worst {
                None => true,
                Some((s, b, best_gap)) => gap
                    .total_cmp(&best_gap)
                    .then_with(|| s.player.cmp(&starter.player))
                    .then_with(|| b.player.cmp(&benched.player))
                    .is_gt(),
            };
            if replace {
                worst = Some((starter, benched, gap));
            }
        }
    }

    worst.map(|(s, b, _)| (s, b))
}

/// Render a start/sit mistake for the newsletter
pub fn describe_mistake(starter: &PlayerScore, benched: &PlayerScore) -> String {
    format!(
        "Started {} ({:.2}) over {} ({:.2})",
        starter.player, starter.points, benched.player, benched.points
    )
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(name: &str, position: &str, slot: Option<&str>, points: f64) -> PlayerScore {
        PlayerScore {
            player: name.to_string(),
            position: position.to_string(),
            slot: slot.map(str::to_string),
            points,
        }
    }

    #[test]
    fn test_slot_eligibility() {
        assert!(slot_accepts("FLEX", "te"));
        assert!(!slot_accepts("FLEX", "QB"));
        assert!(slot_accepts("SUPER_FLEX", "QB"));
        assert!(slot_accepts("DEF", "DST"));
        assert!(slot_accepts("REC_FLEX", "WR"));
        assert!(!slot_accepts("WRRB_FLEX", "TE"));
        assert!(slot_accepts("IDP_FLEX", "LB"));
        assert!(slot_accepts("K", "K"));
        assert!(!slot_accepts("RB", "WR"));
    }

    #[test]
    fn test_optimal_uses_bench_in_flex() {
        let starters = vec![
            player("QB One", "QB", Some("QB"), 20.0),
            player("RB One", "RB", Some("RB"), 10.0),
            player("WR Flex", "WR", Some("FLEX"), 4.0),
        ];
        let bench = vec![
            player("TE Bench", "TE", None, 12.0),
            player("QB Bench", "QB", None, 30.0),
        ];

        // QB Bench can only replace QB One; TE Bench fits FLEX
        assert_eq!(optimal_points(&starters, &bench), Some(52.0));
    }

    #[test]
    fn test_optimal_reassigns_across_slots() {
        // Best lineup moves the starting RB to FLEX so the bench RB can take RB
        let starters = vec![
            player("RB A", "RB", Some("RB"), 15.0),
            player("WR A", "WR", Some("FLEX"), 2.0),
        ];
        let bench = vec![player("RB B", "RB", None, 9.0)];

        assert_eq!(optimal_points(&starters, &bench), Some(24.0));
    }

    #[test]
    fn test_optimal_without_bench_is_actual() {
        let starters = vec![player("QB One", "QB", None, 18.4), player("K", "K", None, -1.0)];
        assert_eq!(optimal_points(&starters, &[]), Some(17.4));
        assert_eq!(optimal_points(&[], &starters), None);
    }

    #[test]
    fn test_greedy_fallback_for_large_lineups() {
        let starters: Vec<PlayerScore> =
            (0..18).map(|i| player(&format!("WR {i}"), "WR", Some("WR"), 5.0)).collect();
        let bench = vec![player("WR Bench", "WR", None, 11.0)];

        assert_eq!(optimal_points(&starters, &bench), Some(17.0 * 5.0 + 11.0));
    }

    #[test]
    fn test_biggest_mistake_respects_eligibility() {
        let starters = vec![
            player("QB One", "QB", Some("QB"), 10.0),
            player("WR One", "WR", Some("FLEX"), 3.0),
        ];
        let bench = vec![player("QB Two", "QB", None, 25.0), player("TE Two", "TE", None, 8.0)];

        let (starter, benched) = biggest_mistake(&starters, &bench).unwrap();
        assert_eq!(starter.player, "QB One");
        assert_eq!(benched.player, "QB Two");
        assert_eq!(
            describe_mistake(starter, benched),
            "Started QB One (10.00) over QB Two (25.00)"
        );

        let no_gain = vec![player("QB Three", "QB", None, 1.0)];
        assert!(biggest_mistake(&starters, &no_gain).is_none());
    }
}
