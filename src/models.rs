use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::Row;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgePoint {
    pub id: String,
    pub subject: String,
    pub grade: i64,
    pub title: String,
    pub chapter: String,
    pub unit: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    pub subject: String,
    pub grade: i64,
    pub knowledge_point_id: String,
    pub stem: String,
    #[serde(default)]
    pub options: Vec<String>,
    pub answer: String,
    #[serde(default)]
    pub explanation: String,
    #[serde(default = "default_difficulty")]
    pub difficulty: String,
}

fn default_difficulty() -> String {
    "medium".to_string()
}

/// One answer submission. Immutable once stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Attempt {
    pub id: String,
    pub user_id: String,
    pub question_id: String,
    pub subject: String,
    pub knowledge_point_id: String,
    pub correct: bool,
    pub answer: String,
    pub created_at: DateTime<Utc>,
}

/// The correctness signal as it arrives from a client.
///
/// `correct` may be omitted when the question is in the catalog; it is then
/// graded against the stored answer.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAttempt {
    pub user_id: String,
    pub question_id: String,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub knowledge_point_id: Option<String>,
    #[serde(default)]
    pub correct: Option<bool>,
    #[serde(default)]
    pub answer: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StudyPlanItem {
    pub knowledge_point_id: String,
    pub target_count: i64,
    pub due_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StudyPlan {
    pub user_id: String,
    pub subject: String,
    pub created_at: DateTime<Utc>,
    pub items: Vec<StudyPlanItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MemoryReview {
    pub id: String,
    pub user_id: String,
    pub question_id: String,
    pub stage: u8,
    pub next_review_at: DateTime<Utc>,
    pub last_reviewed_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MasteryStat {
    pub correct: u32,
    pub total: u32,
}

impl MasteryStat {
    pub fn record(&mut self, correct: bool) {
        self.total += 1;
        if correct {
            self.correct += 1;
        }
    }

    /// Unattempted counts as fully unmastered.
    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.correct as f64 / self.total as f64
        }
    }
}

impl<'r> sqlx::FromRow<'r, sqlx::sqlite::SqliteRow> for Attempt {
    fn from_row(row: &'r sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Attempt {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            question_id: row.try_get("question_id")?,
            subject: row.try_get("subject")?,
            knowledge_point_id: row.try_get("knowledge_point_id")?,
            correct: row.try_get("correct")?,
            answer: row.try_get("answer")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl<'r> sqlx::FromRow<'r, sqlx::sqlite::SqliteRow> for KnowledgePoint {
    fn from_row(row: &'r sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(KnowledgePoint {
            id: row.try_get("id")?,
            subject: row.try_get("subject")?,
            grade: row.try_get("grade")?,
            title: row.try_get("title")?,
            chapter: row.try_get("chapter").unwrap_or_default(),
            unit: row.try_get("unit").unwrap_or_default(),
        })
    }
}

impl<'r> sqlx::FromRow<'r, sqlx::sqlite::SqliteRow> for Question {
    fn from_row(row: &'r sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        // Options are stored as a JSON array in a TEXT column.
        let options_json: String = row.try_get("options").unwrap_or_default();
        let options: Vec<String> = serde_json::from_str(&options_json).unwrap_or_default();

        Ok(Question {
            id: row.try_get("id")?,
            subject: row.try_get("subject")?,
            grade: row.try_get("grade")?,
            knowledge_point_id: row.try_get("knowledge_point_id")?,
            stem: row.try_get("stem")?,
            options,
            answer: row.try_get("answer")?,
            explanation: row.try_get("explanation").unwrap_or_default(),
            difficulty: row.try_get("difficulty").unwrap_or_else(|_| default_difficulty()),
        })
    }
}

impl<'r> sqlx::FromRow<'r, sqlx::sqlite::SqliteRow> for MemoryReview {
    fn from_row(row: &'r sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        let stage: i64 = row.try_get("stage").unwrap_or(0);

        Ok(MemoryReview {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            question_id: row.try_get("question_id")?,
            stage: u8::try_from(stage).unwrap_or(0),
            next_review_at: row.try_get("next_review_at")?,
            last_reviewed_at: row.try_get("last_reviewed_at")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}
