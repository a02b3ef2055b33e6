use crate::models::Question;
use rand::seq::SliceRandom;
use rand::Rng;

pub const DEFAULT_COUNT: usize = 10;

/// Picks up to `count` questions spread across knowledge points.
///
/// Each knowledge point's questions are shuffled on their own, then one
/// question is taken from every group per pass. Groups keep the order in which
/// their knowledge point first shows up in `questions`.
pub fn sample_balanced<R: Rng + ?Sized>(questions: Vec<Question>, count: usize, rng: &mut R) -> Vec<Question> {
    let mut groups: Vec<(String, Vec<Question>)> = Vec::new();

    for q in questions {
        match groups.iter_mut().find(|(kp, _)| *kp == q.knowledge_point_id) {
            Some((_, group)) => group.push(q),
            None => groups.push((q.knowledge_point_id.clone(), vec![q])),
        }
    }

    // Reverse after shuffling so `pop` draws in shuffled order.
    let mut queues: Vec<Vec<Question>> = groups
        .into_iter()
        .map(|(_, mut group)| {
            group.shuffle(rng);
            group.reverse();
            group
        })
        .collect();

    let available: usize = queues.iter().map(Vec::len).sum();
    let mut picked = Vec::with_capacity(count.min(available));
    while picked.len() < count {
        let mut took_any = false;
        for queue in queues.iter_mut() {
            if picked.len() >= count {
                break;
            }
            if let Some(q) = queue.pop() {
                picked.push(q);
                took_any = true;
            }
        }
        if !took_any {
            break;
        }
    }

    picked
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn question(kp: &str, n: usize) -> Question {
        Question {
            id: format!("{}-q{}", kp, n),
            subject: "math".into(),
            grade: 4,
            knowledge_point_id: kp.into(),
            stem: format!("stem {}", n),
            options: vec![],
            answer: "1".into(),
            explanation: String::new(),
            difficulty: "easy".into(),
        }
    }

    fn catalog(kps: &[(&str, usize)]) -> Vec<Question> {
        kps.iter()
            .flat_map(|(kp, n)| (0..*n).map(move |i| question(kp, i)))
            .collect()
    }

    #[test]
    fn test_breadth_before_depth() {
        let mut rng = StdRng::seed_from_u64(7);
        let qs = catalog(&[("a", 3), ("b", 3), ("c", 4), ("d", 3)]);
        let picked = sample_balanced(qs, 10, &mut rng);

        assert_eq!(picked.len(), 10);

        // Every knowledge point shows up once before any shows up twice.
        let first_four: HashSet<&str> = picked[..4].iter().map(|q| q.knowledge_point_id.as_str()).collect();
        assert_eq!(first_four.len(), 4);
        let next_four: HashSet<&str> = picked[4..8].iter().map(|q| q.knowledge_point_id.as_str()).collect();
        assert_eq!(next_four.len(), 4);

        let ids: HashSet<&str> = picked.iter().map(|q| q.id.as_str()).collect();
        assert_eq!(ids.len(), 10);
    }

    #[test]
    fn test_fewer_than_count_returns_all() {
        let mut rng = StdRng::seed_from_u64(1);
        let qs = catalog(&[("a", 2), ("b", 1)]);
        let picked = sample_balanced(qs, 10, &mut rng);
        assert_eq!(picked.len(), 3);
    }

    #[test]
    fn test_unbounded_count_returns_everything() {
        let mut rng = StdRng::seed_from_u64(1);
        let picked = sample_balanced(catalog(&[("a", 2), ("b", 3)]), usize::MAX, &mut rng);
        assert_eq!(picked.len(), 5);
        assert!(sample_balanced(Vec::new(), usize::MAX, &mut rng).is_empty());
    }

    #[test]
    fn test_uneven_groups_drain() {
        let mut rng = StdRng::seed_from_u64(3);
        let qs = catalog(&[("a", 1), ("b", 5)]);
        let picked = sample_balanced(qs, 4, &mut rng);
        let kps: Vec<&str> = picked.iter().map(|q| q.knowledge_point_id.as_str()).collect();
        assert_eq!(kps, vec!["a", "b", "b", "b"]);
    }

    #[test]
    fn test_empty_input() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(sample_balanced(Vec::new(), DEFAULT_COUNT, &mut rng).is_empty());
        assert!(sample_balanced(catalog(&[("a", 3)]), 0, &mut rng).is_empty());
    }
}
