use crate::models::MemoryReview;
use chrono::{DateTime, Duration, Utc};

/// Review intervals in days, indexed by stage.
pub const STAGES: [i64; 5] = [1, 3, 7, 14, 30];

/// A spaced-repetition policy: how a stage moves on an answer and how long
/// each stage waits before the next review.
pub trait ReviewSchedule: Send + Sync {
    fn next_stage(&self, current: u8, correct: bool) -> u8;

    fn interval(&self, stage: u8) -> Duration;
}

/// Fixed stage table. A correct answer climbs one stage (capped at the last),
/// any miss drops back to stage 0.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedStages;

impl FixedStages {
    pub fn max_stage(&self) -> u8 {
        (STAGES.len() - 1) as u8
    }
}

impl ReviewSchedule for FixedStages {
    fn next_stage(&self, current: u8, correct: bool) -> u8 {
        if correct {
            current.saturating_add(1).min(self.max_stage())
        } else {
            0
        }
    }

    fn interval(&self, stage: u8) -> Duration {
        let idx = (stage as usize).min(STAGES.len() - 1);
        Duration::days(STAGES[idx])
    }
}

/// Applies one answer to the (user, question) review row.
///
/// With no prior row the stage starts from 0 before the answer is applied,
/// so a first correct answer lands on stage 1 and a first miss on stage 0.
pub fn apply_answer(
    schedule: &dyn ReviewSchedule,
    current: Option<&MemoryReview>,
    user_id: &str,
    question_id: &str,
    correct: bool,
    now: DateTime<Utc>,
) -> MemoryReview {
    let mut review = match current {
        Some(r) => r.clone(),
        None => MemoryReview {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            question_id: question_id.to_string(),
            stage: 0,
            next_review_at: now,
            last_reviewed_at: now,
            created_at: now,
            updated_at: now,
        },
    };

    review.stage = schedule.next_stage(review.stage, correct);
    review.next_review_at = now + schedule.interval(review.stage);
    review.last_reviewed_at = now;
    review.updated_at = now;

    review
}

pub fn is_due(review: &MemoryReview, now: DateTime<Utc>) -> bool {
    review.next_review_at <= now
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 9, 1, 8, 0, 0).unwrap()
    }

    #[test]
    fn test_correct_answers_climb_and_cap() {
        let s = FixedStages;
        let mut stage = 0;
        let mut seen = vec![];
        for _ in 0..7 {
            let next = s.next_stage(stage, true);
            assert!(next >= stage);
            stage = next;
            seen.push(stage);
        }
        assert_eq!(seen, vec![1, 2, 3, 4, 4, 4, 4]);
    }

    #[test]
    fn test_miss_resets_from_any_stage() {
        let s = FixedStages;
        for stage in 0..=4 {
            assert_eq!(s.next_stage(stage, false), 0);
        }
    }

    #[test]
    fn test_interval_table() {
        let s = FixedStages;
        let days: Vec<i64> = (0..5).map(|st| s.interval(st).num_days()).collect();
        assert_eq!(days, STAGES.to_vec());
        // Out-of-range stages clamp to the longest interval.
        assert_eq!(s.interval(9).num_days(), 30);
    }

    #[test]
    fn test_mixed_sequence() {
        let s = FixedStages;
        let mut review: Option<MemoryReview> = None;
        let mut stages = vec![];
        let answers = [true, true, false, true];
        let mut now = t0();

        for correct in answers {
            let next = apply_answer(&s, review.as_ref(), "u1", "q1", correct, now);
            stages.push(next.stage);
            assert_eq!(next.next_review_at, now + Duration::days(STAGES[next.stage as usize]));
            review = Some(next);
            now += Duration::hours(1);
        }

        assert_eq!(stages, vec![1, 2, 0, 1]);
        let last = review.unwrap();
        assert_eq!(last.next_review_at, t0() + Duration::hours(3) + Duration::days(3));
        assert_eq!(last.created_at, t0());
    }

    #[test]
    fn test_is_due_boundary() {
        let s = FixedStages;
        let review = apply_answer(&s, None, "u1", "q1", false, t0());
        assert!(!is_due(&review, t0()));
        assert!(is_due(&review, t0() + Duration::days(1)));
        assert!(is_due(&review, t0() + Duration::days(2)));
    }
}
