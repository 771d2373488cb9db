use std::collections::{HashMap, HashSet};

use crate::eval::HandEvaluation;

pub type SeatId = usize;

/// One layer of the pot: main pot or a side pot. `eligible` is the subset of
/// contributors to this layer that reached showdown without folding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SidePot {
    pub amount: u64,
    pub eligible: Vec<SeatId>,
}

/// Builds main + side pots from a per-seat contribution ledger.
///
/// `contributions` is every seat's `total_bet_this_hand` (folded seats
/// included — their money is still in the pot). `showdown_eligible` is the
/// set of seats that reached showdown without folding (or went all-in
/// earlier and were never forced to fold). Folded seats never appear in a
/// pot's `eligible` list and therefore can never collect.
pub fn compute_side_pots(
    contributions: &[(SeatId, u64)],
    showdown_eligible: &HashSet<SeatId>,
) -> Vec<SidePot> {
    let mut levels: Vec<u64> = contributions
        .iter()
        .map(|&(_, amount)| amount)
        .filter(|&amount| amount > 0)
        .collect();
    levels.sort_unstable();
    levels.dedup();

    let mut pots = Vec::with_capacity(levels.len());
    let mut previous_level = 0u64;
    for level in levels {
        let contributors: Vec<SeatId> = contributions
            .iter()
            .filter(|&&(_, amount)| amount >= level)
            .map(|&(seat, _)| seat)
            .collect();
        let amount = (level - previous_level) * contributors.len() as u64;
        let eligible: Vec<SeatId> = contributors
            .into_iter()
            .filter(|seat| showdown_eligible.contains(seat))
            .collect();
        pots.push(SidePot { amount, eligible });
        previous_level = level;
    }
    pots
}

/// Distributes every pot to its best eligible hand(s), splitting ties as
/// evenly as possible and awarding any indivisible remainder to the winner
/// seated earliest clockwise from the dealer.
///
/// `seat_order` lists every seat index in table (clockwise) order; it is
/// used only to resolve remainder ties, not to decide eligibility.
pub fn distribute(
    pots: &[SidePot],
    evaluations: &HashMap<SeatId, HandEvaluation>,
    dealer_seat: SeatId,
    seat_order: &[SeatId],
) -> HashMap<SeatId, u64> {
    let mut payouts: HashMap<SeatId, u64> = HashMap::new();
    for pot in pots {
        if pot.amount == 0 || pot.eligible.is_empty() {
            continue;
        }
        let Some(best_eval) = pot
            .eligible
            .iter()
            .filter_map(|seat| evaluations.get(seat))
            .max()
            .copied()
        else {
            continue;
        };
        let winners: Vec<SeatId> = pot
            .eligible
            .iter()
            .copied()
            .filter(|seat| evaluations.get(seat) == Some(&best_eval))
            .collect();

        let share = pot.amount / winners.len() as u64;
        let remainder = pot.amount - share * winners.len() as u64;
        for &winner in &winners {
            *payouts.entry(winner).or_insert(0) += share;
        }
        if remainder > 0 {
            let ordered = clockwise_from_dealer(&winners, dealer_seat, seat_order);
            for winner in ordered.into_iter().take(remainder as usize) {
                *payouts.entry(winner).or_insert(0) += 1;
            }
        }
    }
    payouts
}

/// The whole pot goes to a single seat when everyone else has folded
/// mid-hand (`spec.md` §4.3 single-winner fast path).
pub fn single_winner_payout(winner: SeatId, pot_total: u64) -> HashMap<SeatId, u64> {
    let mut payouts = HashMap::new();
    payouts.insert(winner, pot_total);
    payouts
}

/// Orders `winners` starting from the seat immediately clockwise of the
/// dealer, wrapping around `seat_order`.
fn clockwise_from_dealer(winners: &[SeatId], dealer_seat: SeatId, seat_order: &[SeatId]) -> Vec<SeatId> {
    let n = seat_order.len();
    if n == 0 {
        return Vec::new();
    }
    let dealer_pos = seat_order.iter().position(|&s| s == dealer_seat).unwrap_or(0);
    let mut ordered = Vec::with_capacity(winners.len());
    for step in 1..=n {
        let seat = seat_order[(dealer_pos + step) % n];
        if winners.contains(&seat) {
            ordered.push(seat);
        }
    }
    ordered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::{evaluate_five, HandEvaluation};
    use crate::card::Card;

    fn eval(specs: &[&str]) -> HandEvaluation {
        let cards: Vec<Card> = specs.iter().map(|s| Card::parse(s).unwrap()).collect();
        evaluate_five(&cards)
    }

    #[test]
    fn no_all_in_single_pot_covers_everyone() {
        let contributions = vec![(0, 6), (1, 6), (2, 6)];
        let eligible: HashSet<_> = [0, 1, 2].into_iter().collect();
        let pots = compute_side_pots(&contributions, &eligible);
        assert_eq!(pots.len(), 1);
        assert_eq!(pots[0].amount, 18);
        assert_eq!(pots[0].eligible.len(), 3);
    }

    #[test]
    fn side_pot_all_in_scenario_from_spec() {
        // S1 all-in 50, S2 and S3 contribute 250 each.
        let contributions = vec![(0, 50), (1, 250), (2, 250)];
        let eligible: HashSet<_> = [0, 1, 2].into_iter().collect();
        let pots = compute_side_pots(&contributions, &eligible);
        assert_eq!(pots.len(), 2);
        assert_eq!(pots[0].amount, 150); // 50 * 3
        assert_eq!(pots[0].eligible.len(), 3);
        assert_eq!(pots[1].amount, 400); // 200 * 2
        assert_eq!(pots[1].eligible, vec![1, 2]);
    }

    #[test]
    fn folded_seat_still_funds_pot_but_never_collects() {
        let contributions = vec![(0, 10), (1, 10), (2, 10)];
        // seat 2 folded: not showdown-eligible.
        let eligible: HashSet<_> = [0, 1].into_iter().collect();
        let pots = compute_side_pots(&contributions, &eligible);
        assert_eq!(pots.len(), 1);
        assert_eq!(pots[0].amount, 30);
        assert_eq!(pots[0].eligible, vec![0, 1]);

        let mut evaluations = HashMap::new();
        evaluations.insert(0, eval(&["AH", "AD", "KC", "QS", "JH"]));
        evaluations.insert(1, eval(&["2H", "3D", "4C", "5S", "7H"]));
        let payouts = distribute(&pots, &evaluations, 0, &[0, 1, 2]);
        assert_eq!(payouts.get(&2), None);
        assert_eq!(payouts[&0], 30);
    }

    #[test]
    fn split_pot_remainder_goes_clockwise_from_dealer() {
        let contributions = vec![(0, 7), (1, 0), (2, 7)];
        let eligible: HashSet<_> = [0, 2].into_iter().collect();
        let pots = compute_side_pots(&contributions, &eligible);
        assert_eq!(pots[0].amount, 14);

        let tied = eval(&["AH", "AD", "KC", "QS", "JH"]);
        let mut evaluations = HashMap::new();
        evaluations.insert(0, tied);
        evaluations.insert(2, tied);

        // Dealer is seat 1; clockwise order is [0,1,2]; the seat right after
        // the dealer among the tied winners is seat 2.
        let payouts = distribute(&pots, &evaluations, 1, &[0, 1, 2]);
        assert_eq!(payouts[&0], 6);
        assert_eq!(payouts[&2], 8);
        assert_eq!(payouts.values().sum::<u64>(), 14);
    }

    #[test]
    fn payouts_never_exceed_pot_total() {
        let contributions = vec![(0, 50), (1, 250), (2, 250)];
        let eligible: HashSet<_> = [0, 1, 2].into_iter().collect();
        let pots = compute_side_pots(&contributions, &eligible);
        let total: u64 = pots.iter().map(|p| p.amount).sum();
        assert_eq!(total, 550);

        let mut evaluations = HashMap::new();
        evaluations.insert(0, eval(&["2H", "3D", "4C", "5S", "7H"]));
        evaluations.insert(1, eval(&["8H", "8D", "8C", "2S", "3H"]));
        evaluations.insert(2, eval(&["AH", "AD", "AC", "2S", "3H"]));
        let payouts = distribute(&pots, &evaluations, 0, &[0, 1, 2]);
        assert_eq!(payouts.values().sum::<u64>(), total);
        assert_eq!(payouts[&2], 350); // best hand wins main pot + side pot
    }
}
