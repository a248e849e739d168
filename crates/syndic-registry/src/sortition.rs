use crate::committee::TicketSubmission;
use syndic_types::{AccountId, Digest};

const SCORE_TAG: &[u8] = b"syndic.sortition.score";

/// Sortition score for one ticket. Deterministic in (seed, operator,
/// ticket number); higher digests win.
pub fn ticket_score(seed: &Digest, operator: &AccountId, ticket_number: u64) -> Digest {
    Digest::of_parts(&[
        SCORE_TAG,
        seed.as_bytes(),
        operator.as_bytes(),
        &ticket_number.to_le_bytes(),
    ])
}

/// Rank submissions by descending score and keep the top `n`. Score ties
/// break toward the lowest operator id.
pub fn select_top(submissions: &[TicketSubmission], n: usize) -> Vec<TicketSubmission> {
    let mut ranked: Vec<TicketSubmission> = submissions.to_vec();
    ranked.sort_by(|a, b| b.score.cmp(&a.score).then(a.operator.cmp(&b.operator)));
    ranked.truncate(n);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn op(byte: u8) -> AccountId {
        AccountId::from_bytes([byte; 32])
    }

    fn submission(byte: u8, ticket_number: u64, seed: &Digest) -> TicketSubmission {
        let operator = op(byte);
        TicketSubmission {
            operator,
            ticket_number,
            score: ticket_score(seed, &operator, ticket_number),
        }
    }

    #[test]
    fn test_score_is_deterministic() {
        let seed = Digest::of(b"job-seed");
        let a = ticket_score(&seed, &op(1), 42);
        let b = ticket_score(&seed, &op(1), 42);
        assert_eq!(a, b);

        // Any input change moves the score
        assert_ne!(a, ticket_score(&seed, &op(1), 43));
        assert_ne!(a, ticket_score(&seed, &op(2), 42));
        assert_ne!(a, ticket_score(&Digest::of(b"other-seed"), &op(1), 42));
    }

    #[test]
    fn test_select_top_orders_by_score_descending() {
        let seed = Digest::of(b"seed");
        let submissions: Vec<TicketSubmission> =
            (1..=6).map(|b| submission(b, u64::from(b), &seed)).collect();

        let selected = select_top(&submissions, 3);
        assert_eq!(selected.len(), 3);
        assert!(selected[0].score >= selected[1].score);
        assert!(selected[1].score >= selected[2].score);

        // The winners really are the global top three
        let mut all_scores: Vec<Digest> = submissions.iter().map(|s| s.score).collect();
        all_scores.sort();
        all_scores.reverse();
        let selected_scores: Vec<Digest> = selected.iter().map(|s| s.score).collect();
        assert_eq!(selected_scores, all_scores[..3].to_vec());
    }

    #[test]
    fn test_select_top_breaks_ties_by_lowest_operator() {
        let seed = Digest::of(b"seed");
        let shared = ticket_score(&seed, &op(1), 7);
        let submissions = vec![
            TicketSubmission {
                operator: op(9),
                ticket_number: 1,
                score: shared,
            },
            TicketSubmission {
                operator: op(2),
                ticket_number: 2,
                score: shared,
            },
            TicketSubmission {
                operator: op(5),
                ticket_number: 3,
                score: shared,
            },
        ];

        let selected = select_top(&submissions, 2);
        assert_eq!(selected[0].operator, op(2));
        assert_eq!(selected[1].operator, op(5));
    }

    #[test]
    fn test_select_top_with_fewer_submissions_than_n() {
        let seed = Digest::of(b"seed");
        let submissions = vec![submission(1, 1, &seed)];
        assert_eq!(select_top(&submissions, 5).len(), 1);
        assert!(select_top(&[], 5).is_empty());
    }
}
