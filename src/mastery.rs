use crate::models::{Attempt, MasteryStat};
use std::collections::BTreeMap;

/// Folds attempts into per-knowledge-point counts, optionally restricted to
/// one subject.
pub fn by_knowledge_point(attempts: &[Attempt], subject: Option<&str>) -> BTreeMap<String, MasteryStat> {
    fold(attempts, subject, |a| &a.knowledge_point_id)
}

pub fn by_question(attempts: &[Attempt], subject: Option<&str>) -> BTreeMap<String, MasteryStat> {
    fold(attempts, subject, |a| &a.question_id)
}

fn fold<F>(attempts: &[Attempt], subject: Option<&str>, key: F) -> BTreeMap<String, MasteryStat>
where
    F: Fn(&Attempt) -> &String,
{
    let mut stats: BTreeMap<String, MasteryStat> = BTreeMap::new();

    for attempt in attempts {
        if let Some(s) = subject {
            if attempt.subject != s {
                continue;
            }
        }
        stats.entry(key(attempt).clone()).or_default().record(attempt.correct);
    }

    stats
}

/// Ratio for a knowledge point, 0 when it never appears in `stats`.
pub fn ratio_of(stats: &BTreeMap<String, MasteryStat>, id: &str) -> f64 {
    stats.get(id).map(MasteryStat::ratio).unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn attempt(kp: &str, q: &str, subject: &str, correct: bool) -> Attempt {
        Attempt {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: "u1".into(),
            question_id: q.into(),
            subject: subject.into(),
            knowledge_point_id: kp.into(),
            correct,
            answer: String::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_fold_by_knowledge_point() {
        let attempts = vec![
            attempt("kp1", "q1", "math", true),
            attempt("kp1", "q2", "math", false),
            attempt("kp2", "q3", "math", true),
            attempt("kp9", "q9", "english", false),
        ];

        let stats = by_knowledge_point(&attempts, Some("math"));
        assert_eq!(stats.len(), 2);
        assert_eq!(stats["kp1"], MasteryStat { correct: 1, total: 2 });
        assert_eq!(ratio_of(&stats, "kp2"), 1.0);
        assert_eq!(ratio_of(&stats, "kp9"), 0.0);

        let all = by_knowledge_point(&attempts, None);
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn test_fold_by_question() {
        let attempts = vec![
            attempt("kp1", "q1", "math", true),
            attempt("kp1", "q1", "math", true),
            attempt("kp1", "q2", "math", false),
        ];
        let stats = by_question(&attempts, None);
        assert_eq!(stats["q1"], MasteryStat { correct: 2, total: 2 });
        assert_eq!(stats["q2"].ratio(), 0.0);
    }

    #[test]
    fn test_empty_ledger() {
        let stats = by_knowledge_point(&[], Some("math"));
        assert!(stats.is_empty());
        assert_eq!(ratio_of(&stats, "anything"), 0.0);
    }
}
