use itertools::Itertools;

use crate::card::Card;

/// Hand categories, weakest to strongest. Declaration order doubles as the
/// derived `Ord` order, so `HandCategory::StraightFlush > HandCategory::HighCard`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HandCategory {
    HighCard,
    OnePair,
    TwoPair,
    ThreeOfAKind,
    Straight,
    Flush,
    FullHouse,
    FourOfAKind,
    StraightFlush,
}

/// A total-ordered evaluation of a best five-card hand: category then
/// descending kickers. `eval(a) == eval(b)` iff the hands are exactly
/// category-and-kicker equivalent, which is the split-pot condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HandEvaluation {
    pub category: HandCategory,
    /// Descending-priority rank values (2..=14); unused trailing slots are 0.
    pub kickers: [u8; 5],
}

/// Evaluates the best five-card hand out of 5, 6, or 7 cards, returning the
/// evaluation and the exact five cards that make it up (for broadcast UI).
pub fn evaluate_best(cards: &[Card]) -> (HandEvaluation, Vec<Card>) {
    assert!(cards.len() >= 5, "need at least 5 cards to evaluate");
    cards
        .iter()
        .copied()
        .combinations(5)
        .map(|five| {
            let eval = evaluate_five(&five);
            (eval, five)
        })
        .max_by_key(|(eval, _)| *eval)
        .expect("combinations(5) is non-empty for len >= 5")
}

/// Evaluates exactly five cards.
pub fn evaluate_five(cards: &[Card]) -> HandEvaluation {
    assert_eq!(cards.len(), 5, "evaluate_five requires exactly 5 cards");

    let mut rank_counts = [0u8; 15]; // index by Rank::value(), 2..=14
    for c in cards {
        rank_counts[c.rank.value() as usize] += 1;
    }

    let is_flush = cards.iter().all(|c| c.suit == cards[0].suit);
    let (is_straight, straight_high) = straight_high_card(cards);

    if is_flush && is_straight {
        return HandEvaluation {
            category: HandCategory::StraightFlush,
            kickers: [straight_high, 0, 0, 0, 0],
        };
    }

    if let Some(quad) = value_with_count(&rank_counts, 4) {
        let kicker = highest_excluding(&rank_counts, &[quad]);
        return HandEvaluation {
            category: HandCategory::FourOfAKind,
            kickers: [quad, kicker, 0, 0, 0],
        };
    }

    if let Some(trip) = value_with_count(&rank_counts, 3) {
        if let Some(pair) = highest_with_min_count_excluding(&rank_counts, 2, &[trip]) {
            return HandEvaluation {
                category: HandCategory::FullHouse,
                kickers: [trip, pair, 0, 0, 0],
            };
        }
    }

    if is_flush {
        return HandEvaluation {
            category: HandCategory::Flush,
            kickers: descending_kickers(cards, &[], 5),
        };
    }

    if is_straight {
        return HandEvaluation {
            category: HandCategory::Straight,
            kickers: [straight_high, 0, 0, 0, 0],
        };
    }

    if let Some(trip) = value_with_count(&rank_counts, 3) {
        let kickers = descending_values_excluding(&rank_counts, &[trip], 2);
        return HandEvaluation {
            category: HandCategory::ThreeOfAKind,
            kickers: [trip, kickers[0], kickers[1], 0, 0],
        };
    }

    let pairs = values_with_count(&rank_counts, 2);
    if pairs.len() >= 2 {
        let high_pair = pairs[0];
        let low_pair = pairs[1];
        let kicker = highest_excluding(&rank_counts, &[high_pair, low_pair]);
        return HandEvaluation {
            category: HandCategory::TwoPair,
            kickers: [high_pair, low_pair, kicker, 0, 0],
        };
    }

    if let Some(pair) = pairs.first().copied() {
        let kickers = descending_values_excluding(&rank_counts, &[pair], 3);
        return HandEvaluation {
            category: HandCategory::OnePair,
            kickers: [pair, kickers[0], kickers[1], kickers[2], 0],
        };
    }

    HandEvaluation {
        category: HandCategory::HighCard,
        kickers: descending_kickers(cards, &[], 5),
    }
}

/// Returns `(is_straight, high_card_value)`. The wheel (A-5-4-3-2) reports a
/// high card of 5; there is no wrap-around straight such as Q-K-A-2-3.
fn straight_high_card(cards: &[Card]) -> (bool, u8) {
    let mut values: Vec<u8> = cards.iter().map(|c| c.rank.value()).collect();
    values.sort_unstable();
    values.dedup();
    if values.len() < 5 {
        return (false, 0);
    }

    // Wheel: A,2,3,4,5 present as values {14,2,3,4,5}.
    if values == [2, 3, 4, 5, 14] {
        return (true, 5);
    }

    for window in values.windows(5) {
        if window[4] - window[0] == 4 {
            return (true, window[4]);
        }
    }
    (false, 0)
}

fn value_with_count(counts: &[u8; 15], n: u8) -> Option<u8> {
    (2..=14).rev().find(|&v| counts[v as usize] == n)
}

fn values_with_count(counts: &[u8; 15], n: u8) -> Vec<u8> {
    (2..=14).rev().filter(|&v| counts[v as usize] == n).collect()
}

fn highest_with_min_count_excluding(counts: &[u8; 15], min_count: u8, exclude: &[u8]) -> Option<u8> {
    (2..=14)
        .rev()
        .find(|&v| counts[v as usize] >= min_count && !exclude.contains(&v))
}

fn highest_excluding(counts: &[u8; 15], exclude: &[u8]) -> u8 {
    (2..=14)
        .rev()
        .find(|&v| counts[v as usize] > 0 && !exclude.contains(&v))
        .unwrap_or(0)
}

fn descending_values_excluding(counts: &[u8; 15], exclude: &[u8], take: usize) -> Vec<u8> {
    let mut out: Vec<u8> = Vec::new();
    for v in (2..=14).rev() {
        if exclude.contains(&v) {
            continue;
        }
        for _ in 0..counts[v as usize] {
            out.push(v);
            if out.len() == take {
                return out;
            }
        }
    }
    while out.len() < take {
        out.push(0);
    }
    out
}

fn descending_kickers(cards: &[Card], exclude: &[u8], take: usize) -> [u8; 5] {
    let mut values: Vec<u8> = cards
        .iter()
        .map(|c| c.rank.value())
        .filter(|v| !exclude.contains(v))
        .collect();
    values.sort_unstable_by(|a, b| b.cmp(a));
    values.truncate(take);
    while values.len() < 5 {
        values.push(0);
    }
    [values[0], values[1], values[2], values[3], values[4]]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cards(specs: &[&str]) -> Vec<Card> {
        specs.iter().map(|s| Card::parse(s).unwrap()).collect()
    }

    #[test]
    fn royal_flush_beats_everything() {
        let hand = cards(&["AH", "KH", "QH", "JH", "TH"]);
        let eval = evaluate_five(&hand);
        assert_eq!(eval.category, HandCategory::StraightFlush);
        assert_eq!(eval.kickers[0], 14);
    }

    #[test]
    fn wheel_straight_is_five_high_and_loses_to_six_high() {
        let wheel = evaluate_five(&cards(&["AH", "2D", "3C", "4S", "5H"]));
        assert_eq!(wheel.category, HandCategory::Straight);
        assert_eq!(wheel.kickers[0], 5);

        let six_high = evaluate_five(&cards(&["6H", "2D", "3C", "4S", "5H"]));
        assert_eq!(six_high.category, HandCategory::Straight);
        assert!(six_high > wheel);
    }

    #[test]
    fn four_of_a_kind_kicker() {
        let eval = evaluate_five(&cards(&["AH", "AD", "AC", "AS", "KH"]));
        assert_eq!(eval.category, HandCategory::FourOfAKind);
        assert_eq!(eval.kickers[0], 14);
        assert_eq!(eval.kickers[1], 13);
    }

    #[test]
    fn full_house_uses_trip_then_pair() {
        let eval = evaluate_five(&cards(&["KH", "KD", "KC", "QS", "QH"]));
        assert_eq!(eval.category, HandCategory::FullHouse);
        assert_eq!(eval.kickers[0], 13);
        assert_eq!(eval.kickers[1], 12);
    }

    #[test]
    fn flush_beats_straight() {
        let flush = evaluate_five(&cards(&["2H", "5H", "9H", "JH", "KH"]));
        let straight = evaluate_five(&cards(&["2H", "3D", "4C", "5S", "6H"]));
        assert!(flush > straight);
    }

    #[test]
    fn evaluate_best_picks_best_five_of_seven() {
        let seven = cards(&["AH", "AD", "AC", "KH", "KD", "2C", "3S"]);
        let (eval, five) = evaluate_best(&seven);
        assert_eq!(eval.category, HandCategory::FullHouse);
        assert_eq!(five.len(), 5);
    }

    #[test]
    fn split_pot_equivalence() {
        let a = evaluate_five(&cards(&["AH", "AD", "KC", "QS", "JH"]));
        let b = evaluate_five(&cards(&["AS", "AC", "KD", "QH", "JD"]));
        assert_eq!(a, b);
    }

    #[test]
    fn board_play_ignores_hole_card_rank_past_fifth() {
        // Both players' best hand is the board straight; hole cards below the
        // straight's bottom rank must not act as extra kickers.
        let board = cards(&["TH", "JD", "QC", "KS", "AH"]);
        let mut p1 = board.clone();
        p1.extend(cards(&["2C", "3D"]));
        let mut p2 = board.clone();
        p2.extend(cards(&["4S", "5H"]));
        let (eval1, _) = evaluate_best(&p1);
        let (eval2, _) = evaluate_best(&p2);
        assert_eq!(eval1, eval2);
    }
}
