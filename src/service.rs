use crate::db::Db;
use crate::diagnostic;
use crate::feedback::{Feedback, FeedbackGenerator};
use crate::mastery;
use crate::models::{Attempt, KnowledgePoint, MasteryStat, MemoryReview, NewAttempt, Question, StudyPlan};
use crate::plan;
use crate::srs::{FixedStages, ReviewSchedule};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitOutcome {
    pub attempt: Attempt,
    pub review: MemoryReview,
    pub feedback: Feedback,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MasteryEntry {
    pub id: String,
    pub correct: u32,
    pub total: u32,
    pub ratio: f64,
}

impl MasteryEntry {
    fn new(id: String, stat: MasteryStat) -> Self {
        Self {
            id,
            correct: stat.correct,
            total: stat.total,
            ratio: stat.ratio(),
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum SubmitError {
    #[error("userId and questionId are required")]
    MissingIds,
    #[error("question {0} is not in the catalog; subject, knowledgePointId and correct are required")]
    UnknownQuestion(String),
}

#[derive(Debug, Clone, Default)]
pub struct PracticeQuery {
    pub subject: String,
    pub grade: Option<i64>,
    pub user_id: Option<String>,
    pub review_mode: bool,
    pub limit: Option<usize>,
}

/// Request-scoped entry point over the repository and the scheduling rules.
#[derive(Clone)]
pub struct Tutor {
    pub db: Db,
    schedule: Arc<dyn ReviewSchedule>,
}

impl Tutor {
    pub fn new(db: Db) -> Self {
        Self::with_schedule(db, Arc::new(FixedStages))
    }

    pub fn with_schedule(db: Db, schedule: Arc<dyn ReviewSchedule>) -> Self {
        Self { db, schedule }
    }

    /// Records the answer in the ledger and moves the question's review stage.
    pub async fn submit_attempt(&self, input: NewAttempt, now: DateTime<Utc>) -> anyhow::Result<SubmitOutcome> {
        let user_id = input.user_id.trim();
        let question_id = input.question_id.trim();
        if user_id.is_empty() || question_id.is_empty() {
            return Err(SubmitError::MissingIds.into());
        }

        let question = self.db.get_question(question_id).await?;

        let (subject, knowledge_point_id, correct) = match &question {
            Some(q) => (
                input.subject.clone().unwrap_or_else(|| q.subject.clone()),
                input.knowledge_point_id.clone().unwrap_or_else(|| q.knowledge_point_id.clone()),
                input.correct.unwrap_or_else(|| FeedbackGenerator::grade(q, &input.answer)),
            ),
            None => match (input.subject.clone(), input.knowledge_point_id.clone(), input.correct) {
                (Some(s), Some(kp), Some(c)) => (s, kp, c),
                _ => return Err(SubmitError::UnknownQuestion(question_id.to_string()).into()),
            },
        };

        let attempt = Attempt {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            question_id: question_id.to_string(),
            subject,
            knowledge_point_id,
            correct,
            answer: input.answer,
            created_at: now,
        };
        let review = self
            .db
            .record_attempt(Arc::clone(&self.schedule), attempt.clone())
            .await?;

        log::info!(
            "Attempt {} by {} on {}: correct={}, stage={}",
            attempt.id, user_id, question_id, correct, review.stage
        );

        let feedback = FeedbackGenerator::generate(question.as_ref(), &attempt.answer, correct);

        Ok(SubmitOutcome { attempt, review, feedback })
    }

    pub async fn attempts(&self, user_id: &str) -> anyhow::Result<Vec<Attempt>> {
        self.db.attempts_by_user(user_id).await
    }

    /// Per-knowledge-point stats. With a subject, every catalog knowledge point
    /// of that subject is listed, unattempted ones at ratio 0.
    pub async fn mastery(&self, user_id: &str, subject: Option<&str>) -> anyhow::Result<Vec<MasteryEntry>> {
        let attempts = self.db.attempts_by_user(user_id).await?;
        let mut stats = mastery::by_knowledge_point(&attempts, subject);

        if let Some(s) = subject {
            for kp in self.db.knowledge_points(s, None).await? {
                stats.entry(kp.id).or_default();
            }
        }

        Ok(into_entries(stats))
    }

    pub async fn question_mastery(&self, user_id: &str, subject: Option<&str>) -> anyhow::Result<Vec<MasteryEntry>> {
        let attempts = self.db.attempts_by_user(user_id).await?;
        Ok(into_entries(mastery::by_question(&attempts, subject)))
    }

    /// Rebuilds the plan for (user, subject) and replaces the stored one.
    pub async fn generate_study_plan(&self, user_id: &str, subject: &str, now: DateTime<Utc>) -> anyhow::Result<StudyPlan> {
        let kps = self.db.knowledge_points(subject, None).await?;
        let attempts = self.db.attempts_by_user(user_id).await?;
        let stats = mastery::by_knowledge_point(&attempts, Some(subject));

        let plan = plan::build_plan(user_id, subject, &kps, &stats, now);
        self.db.replace_study_plan(&plan).await?;

        log::info!(
            "Study plan for {} / {}: {} items from {} knowledge points",
            user_id,
            subject,
            plan.items.len(),
            kps.len()
        );
        Ok(plan)
    }

    pub async fn study_plan(&self, user_id: &str, subject: &str) -> anyhow::Result<Option<StudyPlan>> {
        self.db.get_study_plan(user_id, subject).await
    }

    pub async fn review(&self, user_id: &str, question_id: &str) -> anyhow::Result<Option<MemoryReview>> {
        self.db.get_memory_review(user_id, question_id).await
    }

    pub async fn due_review_question_ids(&self, user_id: &str, now: DateTime<Utc>) -> anyhow::Result<Vec<String>> {
        self.db.due_review_question_ids(user_id, now).await
    }

    pub async fn diagnostic_questions(&self, subject: &str, grade: i64, count: usize) -> anyhow::Result<Vec<Question>> {
        let pool = self.db.questions(subject, Some(grade)).await?;
        log::debug!("Diagnostic for {} grade {}: {} candidates", subject, grade, pool.len());

        let mut rng = rand::thread_rng();
        Ok(diagnostic::sample_balanced(pool, count, &mut rng))
    }

    /// Practice feed. In review mode only due questions are returned, most
    /// overdue first.
    pub async fn practice_questions(&self, query: &PracticeQuery, now: DateTime<Utc>) -> anyhow::Result<Vec<Question>> {
        let questions = self.db.questions(&query.subject, query.grade).await?;

        let mut feed = if query.review_mode {
            let Some(user_id) = query.user_id.as_deref() else {
                return Ok(Vec::new());
            };
            let due = self.db.due_review_question_ids(user_id, now).await?;
            let mut by_id: HashMap<String, Question> =
                questions.into_iter().map(|q| (q.id.clone(), q)).collect();
            due.into_iter().filter_map(|id| by_id.remove(&id)).collect()
        } else {
            questions
        };

        if let Some(limit) = query.limit {
            feed.truncate(limit);
        }
        Ok(feed)
    }

    pub async fn add_knowledge_point(&self, kp: &KnowledgePoint) -> anyhow::Result<()> {
        self.db.add_knowledge_point(kp).await
    }

    pub async fn add_question(&self, q: &Question) -> anyhow::Result<()> {
        self.db.add_question(q).await
    }

    pub async fn knowledge_points(&self, subject: &str, grade: Option<i64>) -> anyhow::Result<Vec<KnowledgePoint>> {
        self.db.knowledge_points(subject, grade).await
    }

    pub async fn questions(&self, subject: &str, grade: Option<i64>) -> anyhow::Result<Vec<Question>> {
        self.db.questions(subject, grade).await
    }
}

fn into_entries(stats: BTreeMap<String, MasteryStat>) -> Vec<MasteryEntry> {
    stats
        .into_iter()
        .map(|(id, stat)| MasteryEntry::new(id, stat))
        .collect()
}
