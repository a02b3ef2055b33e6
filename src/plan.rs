use crate::mastery::ratio_of;
use crate::models::{KnowledgePoint, MasteryStat, StudyPlan, StudyPlanItem};
use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;

pub const PLAN_SIZE: usize = 5;
pub const TARGET_COUNT: i64 = 5;

/// Builds a weakest-first plan. Ties on ratio fall back to knowledge point id.
/// Item `i` is due `i` days after `now`.
pub fn build_plan(
    user_id: &str,
    subject: &str,
    knowledge_points: &[KnowledgePoint],
    stats: &BTreeMap<String, MasteryStat>,
    now: DateTime<Utc>,
) -> StudyPlan {
    let mut ranked: Vec<(f64, &KnowledgePoint)> = knowledge_points
        .iter()
        .map(|kp| (ratio_of(stats, &kp.id), kp))
        .collect();

    ranked.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.id.cmp(&b.1.id)));

    let items = ranked
        .into_iter()
        .take(PLAN_SIZE)
        .enumerate()
        .map(|(i, (_, kp))| StudyPlanItem {
            knowledge_point_id: kp.id.clone(),
            target_count: TARGET_COUNT,
            due_date: now + Duration::days(i as i64),
        })
        .collect();

    StudyPlan {
        user_id: user_id.to_string(),
        subject: subject.to_string(),
        created_at: now,
        items,
    }
}
