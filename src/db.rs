use sqlx::{sqlite::{SqliteConnection, SqlitePool, SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous}, Pool, Sqlite, ConnectOptions, Row};
use chrono::{DateTime, Utc};
use crate::data::{KNOWLEDGE_POINT_DATA, QUESTION_DATA};
use crate::models::{Attempt, KnowledgePoint, MemoryReview, Question, StudyPlan, StudyPlanItem};
use crate::srs::{self, ReviewSchedule};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct Db {
    pool: Pool<Sqlite>,
}

impl Db {
    pub async fn new(url: &str) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(30))
            .log_statements(log::LevelFilter::Trace);

        let pool = SqlitePool::connect_with(options).await?;

        let db = Db { pool };
        db.migrate().await?;

        Ok(db)
    }

    /// Single-connection in-memory database. Every pooled connection to
    /// `:memory:` would get its own empty database, so the pool is pinned to one.
    pub async fn in_memory() -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?
            .log_statements(log::LevelFilter::Trace);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let db = Db { pool };
        db.migrate().await?;

        Ok(db)
    }

    async fn migrate(&self) -> anyhow::Result<()> {
        let statements = [
            r#"
            CREATE TABLE IF NOT EXISTS attempts (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                question_id TEXT NOT NULL,
                subject TEXT NOT NULL,
                knowledge_point_id TEXT NOT NULL,
                correct BOOLEAN NOT NULL,
                answer TEXT NOT NULL DEFAULT '',
                created_at DATETIME NOT NULL
            )
            "#,
            "CREATE INDEX IF NOT EXISTS idx_attempts_user ON attempts (user_id)",
            r#"
            CREATE TABLE IF NOT EXISTS knowledge_points (
                id TEXT PRIMARY KEY,
                subject TEXT NOT NULL,
                grade INTEGER NOT NULL,
                title TEXT NOT NULL,
                chapter TEXT NOT NULL DEFAULT '',
                unit TEXT NOT NULL DEFAULT ''
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS questions (
                id TEXT PRIMARY KEY,
                subject TEXT NOT NULL,
                grade INTEGER NOT NULL,
                knowledge_point_id TEXT NOT NULL,
                stem TEXT NOT NULL,
                options TEXT NOT NULL DEFAULT '[]',
                answer TEXT NOT NULL,
                explanation TEXT NOT NULL DEFAULT '',
                difficulty TEXT NOT NULL DEFAULT 'medium'
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS study_plans (
                user_id TEXT NOT NULL,
                subject TEXT NOT NULL,
                created_at DATETIME NOT NULL,
                PRIMARY KEY (user_id, subject)
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS study_plan_items (
                user_id TEXT NOT NULL,
                subject TEXT NOT NULL,
                position INTEGER NOT NULL,
                knowledge_point_id TEXT NOT NULL,
                target_count INTEGER NOT NULL,
                due_date DATETIME NOT NULL,
                PRIMARY KEY (user_id, subject, position)
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS memory_reviews (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                question_id TEXT NOT NULL,
                stage INTEGER NOT NULL DEFAULT 0,
                next_review_at DATETIME NOT NULL,
                last_reviewed_at DATETIME NOT NULL,
                created_at DATETIME NOT NULL,
                updated_at DATETIME NOT NULL,
                UNIQUE (user_id, question_id)
            )
            "#,
        ];

        for sql in statements {
            sqlx::query(sql).execute(&self.pool).await?;
        }

        Ok(())
    }

    /// Loads the built-in sample catalog when no knowledge points exist yet.
    pub async fn seed_catalog_if_empty(&self) -> anyhow::Result<bool> {
        let count: i64 = sqlx::query_scalar("SELECT count(*) FROM knowledge_points")
            .fetch_one(&self.pool)
            .await?;

        if count > 0 {
            return Ok(false);
        }

        for kp in KNOWLEDGE_POINT_DATA {
            self.add_knowledge_point(&KnowledgePoint {
                id: kp.id.to_string(),
                subject: kp.subject.to_string(),
                grade: kp.grade,
                title: kp.title.to_string(),
                chapter: kp.chapter.to_string(),
                unit: kp.unit.to_string(),
            })
            .await?;
        }

        for q in QUESTION_DATA {
            let Some(kp) = KNOWLEDGE_POINT_DATA.iter().find(|kp| kp.id == q.knowledge_point_id) else {
                log::warn!("Seed question {} points at unknown knowledge point {}", q.id, q.knowledge_point_id);
                continue;
            };
            self.add_question(&Question {
                id: q.id.to_string(),
                subject: kp.subject.to_string(),
                grade: kp.grade,
                knowledge_point_id: q.knowledge_point_id.to_string(),
                stem: q.stem.to_string(),
                options: q.options.iter().map(|o| o.to_string()).collect(),
                answer: q.answer.to_string(),
                explanation: q.explanation.to_string(),
                difficulty: q.difficulty.to_string(),
            })
            .await?;
        }

        log::info!(
            "Seeded catalog with {} knowledge points and {} questions",
            KNOWLEDGE_POINT_DATA.len(),
            QUESTION_DATA.len()
        );
        Ok(true)
    }

    // --- Attempt ledger ---

    pub async fn add_attempt(&self, attempt: &Attempt) -> anyhow::Result<()> {
        let mut conn = self.pool.acquire().await?;
        insert_attempt(&mut conn, attempt).await
    }

    /// All attempts of a user in insertion order.
    pub async fn attempts_by_user(&self, user_id: &str) -> anyhow::Result<Vec<Attempt>> {
        let attempts = sqlx::query_as::<_, Attempt>(
            "SELECT * FROM attempts WHERE user_id = ? ORDER BY rowid ASC"
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(attempts)
    }

    // --- Catalog ---

    pub async fn add_knowledge_point(&self, kp: &KnowledgePoint) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO knowledge_points (id, subject, grade, title, chapter, unit)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                subject = excluded.subject,
                grade = excluded.grade,
                title = excluded.title,
                chapter = excluded.chapter,
                unit = excluded.unit
            "#
        )
        .bind(&kp.id)
        .bind(&kp.subject)
        .bind(kp.grade)
        .bind(&kp.title)
        .bind(&kp.chapter)
        .bind(&kp.unit)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Knowledge points of a subject in catalog order.
    pub async fn knowledge_points(&self, subject: &str, grade: Option<i64>) -> anyhow::Result<Vec<KnowledgePoint>> {
        let kps = sqlx::query_as::<_, KnowledgePoint>(
            r#"
            SELECT * FROM knowledge_points
            WHERE subject = ? AND (? IS NULL OR grade = ?)
            ORDER BY rowid ASC
            "#
        )
        .bind(subject)
        .bind(grade)
        .bind(grade)
        .fetch_all(&self.pool)
        .await?;

        Ok(kps)
    }

    pub async fn add_question(&self, q: &Question) -> anyhow::Result<()> {
        let options = serde_json::to_string(&q.options)?;

        sqlx::query(
            r#"
            INSERT INTO questions (id, subject, grade, knowledge_point_id, stem, options, answer, explanation, difficulty)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                subject = excluded.subject,
                grade = excluded.grade,
                knowledge_point_id = excluded.knowledge_point_id,
                stem = excluded.stem,
                options = excluded.options,
                answer = excluded.answer,
                explanation = excluded.explanation,
                difficulty = excluded.difficulty
            "#
        )
        .bind(&q.id)
        .bind(&q.subject)
        .bind(q.grade)
        .bind(&q.knowledge_point_id)
        .bind(&q.stem)
        .bind(options)
        .bind(&q.answer)
        .bind(&q.explanation)
        .bind(&q.difficulty)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_question(&self, id: &str) -> anyhow::Result<Option<Question>> {
        let q = sqlx::query_as::<_, Question>("SELECT * FROM questions WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(q)
    }

    pub async fn questions(&self, subject: &str, grade: Option<i64>) -> anyhow::Result<Vec<Question>> {
        let qs = sqlx::query_as::<_, Question>(
            r#"
            SELECT * FROM questions
            WHERE subject = ? AND (? IS NULL OR grade = ?)
            ORDER BY rowid ASC
            "#
        )
        .bind(subject)
        .bind(grade)
        .bind(grade)
        .fetch_all(&self.pool)
        .await?;

        Ok(qs)
    }

    // --- Study plans ---

    /// Drops the previous plan for (user, subject) and stores `plan`, in one
    /// transaction.
    pub async fn replace_study_plan(&self, plan: &StudyPlan) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM study_plan_items WHERE user_id = ? AND subject = ?")
            .bind(&plan.user_id)
            .bind(&plan.subject)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM study_plans WHERE user_id = ? AND subject = ?")
            .bind(&plan.user_id)
            .bind(&plan.subject)
            .execute(&mut *tx)
            .await?;

        sqlx::query("INSERT INTO study_plans (user_id, subject, created_at) VALUES (?, ?, ?)")
            .bind(&plan.user_id)
            .bind(&plan.subject)
            .bind(plan.created_at)
            .execute(&mut *tx)
            .await?;

        for (position, item) in plan.items.iter().enumerate() {
            sqlx::query(
                "INSERT INTO study_plan_items (user_id, subject, position, knowledge_point_id, target_count, due_date) VALUES (?, ?, ?, ?, ?, ?)"
            )
            .bind(&plan.user_id)
            .bind(&plan.subject)
            .bind(position as i64)
            .bind(&item.knowledge_point_id)
            .bind(item.target_count)
            .bind(item.due_date)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    pub async fn get_study_plan(&self, user_id: &str, subject: &str) -> anyhow::Result<Option<StudyPlan>> {
        let header = sqlx::query("SELECT created_at FROM study_plans WHERE user_id = ? AND subject = ?")
            .bind(user_id)
            .bind(subject)
            .fetch_optional(&self.pool)
            .await?;

        let Some(header) = header else {
            return Ok(None);
        };
        let created_at: DateTime<Utc> = header.try_get("created_at")?;

        let rows = sqlx::query(
            "SELECT knowledge_point_id, target_count, due_date FROM study_plan_items WHERE user_id = ? AND subject = ? ORDER BY position ASC"
        )
        .bind(user_id)
        .bind(subject)
        .fetch_all(&self.pool)
        .await?;

        let mut items = Vec::with_capacity(rows.len());
        for row in rows {
            items.push(StudyPlanItem {
                knowledge_point_id: row.try_get("knowledge_point_id")?,
                target_count: row.try_get("target_count")?,
                due_date: row.try_get("due_date")?,
            });
        }

        Ok(Some(StudyPlan {
            user_id: user_id.to_string(),
            subject: subject.to_string(),
            created_at,
            items,
        }))
    }

    // --- Memory reviews ---

    pub async fn get_memory_review(&self, user_id: &str, question_id: &str) -> anyhow::Result<Option<MemoryReview>> {
        let review = sqlx::query_as::<_, MemoryReview>(
            "SELECT * FROM memory_reviews WHERE user_id = ? AND question_id = ?"
        )
        .bind(user_id)
        .bind(question_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(review)
    }

    /// Appends the attempt to the ledger and advances its (user, question)
    /// review row in one `BEGIN IMMEDIATE` transaction, so concurrent writers
    /// queue on the write lock instead of failing a read-to-write upgrade.
    /// Concurrent answers on the same pair are last write wins.
    ///
    /// Runs on its own task: a dropped request must not hand a connection back
    /// to the pool with the transaction still open.
    pub async fn record_attempt(
        &self,
        schedule: Arc<dyn ReviewSchedule>,
        attempt: Attempt,
    ) -> anyhow::Result<MemoryReview> {
        let pool = self.pool.clone();
        tokio::spawn(write_attempt(pool, schedule, attempt)).await?
    }

    pub async fn reviews_by_user(&self, user_id: &str) -> anyhow::Result<Vec<MemoryReview>> {
        let reviews = sqlx::query_as::<_, MemoryReview>(
            "SELECT * FROM memory_reviews WHERE user_id = ?"
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(reviews)
    }

    /// Question ids whose review is due at `now`, most overdue first.
    ///
    /// Filtered after loading: timestamps are stored as text, which does not
    /// compare reliably across fractional-second widths.
    pub async fn due_review_question_ids(&self, user_id: &str, now: DateTime<Utc>) -> anyhow::Result<Vec<String>> {
        let mut due: Vec<MemoryReview> = self
            .reviews_by_user(user_id)
            .await?
            .into_iter()
            .filter(|r| srs::is_due(r, now))
            .collect();

        due.sort_by(|a, b| {
            a.next_review_at
                .cmp(&b.next_review_at)
                .then_with(|| a.question_id.cmp(&b.question_id))
        });

        Ok(due.into_iter().map(|r| r.question_id).collect())
    }
}

async fn write_attempt(
    pool: Pool<Sqlite>,
    schedule: Arc<dyn ReviewSchedule>,
    attempt: Attempt,
) -> anyhow::Result<MemoryReview> {
    let mut conn = pool.acquire().await?;
    sqlx::query("BEGIN IMMEDIATE").execute(&mut *conn).await?;

    match apply_attempt(&mut conn, schedule.as_ref(), &attempt).await {
        Ok(review) => {
            sqlx::query("COMMIT").execute(&mut *conn).await?;
            log::debug!(
                "Review {}/{} -> stage {}, next at {}",
                attempt.user_id, attempt.question_id, review.stage, review.next_review_at
            );
            Ok(review)
        }
        Err(e) => {
            if let Err(rollback) = sqlx::query("ROLLBACK").execute(&mut *conn).await {
                log::warn!("Rollback after failed attempt {} also failed: {}", attempt.id, rollback);
            }
            Err(e)
        }
    }
}

async fn apply_attempt(
    conn: &mut SqliteConnection,
    schedule: &dyn ReviewSchedule,
    attempt: &Attempt,
) -> anyhow::Result<MemoryReview> {
    insert_attempt(conn, attempt).await?;

    let current = sqlx::query_as::<_, MemoryReview>(
        "SELECT * FROM memory_reviews WHERE user_id = ? AND question_id = ?"
    )
    .bind(&attempt.user_id)
    .bind(&attempt.question_id)
    .fetch_optional(&mut *conn)
    .await?;

    let review = srs::apply_answer(
        schedule,
        current.as_ref(),
        &attempt.user_id,
        &attempt.question_id,
        attempt.correct,
        attempt.created_at,
    );

    sqlx::query(
        r#"
        INSERT INTO memory_reviews (id, user_id, question_id, stage, next_review_at, last_reviewed_at, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(user_id, question_id) DO UPDATE SET
            stage = excluded.stage,
            next_review_at = excluded.next_review_at,
            last_reviewed_at = excluded.last_reviewed_at,
            updated_at = excluded.updated_at
        "#
    )
    .bind(&review.id)
    .bind(&review.user_id)
    .bind(&review.question_id)
    .bind(review.stage as i64)
    .bind(review.next_review_at)
    .bind(review.last_reviewed_at)
    .bind(review.created_at)
    .bind(review.updated_at)
    .execute(&mut *conn)
    .await?;

    Ok(review)
}

async fn insert_attempt(conn: &mut SqliteConnection, attempt: &Attempt) -> anyhow::Result<()> {
    sqlx::query(
        "INSERT INTO attempts (id, user_id, question_id, subject, knowledge_point_id, correct, answer, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)"
    )
    .bind(&attempt.id)
    .bind(&attempt.user_id)
    .bind(&attempt.question_id)
    .bind(&attempt.subject)
    .bind(&attempt.knowledge_point_id)
    .bind(attempt.correct)
    .bind(&attempt.answer)
    .bind(attempt.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::srs::FixedStages;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 9, 1, 8, 0, 0).unwrap()
    }

    fn attempt(user: &str, q: &str, correct: bool, at: DateTime<Utc>) -> Attempt {
        Attempt {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user.into(),
            question_id: q.into(),
            subject: "math".into(),
            knowledge_point_id: "math-4-mul".into(),
            correct,
            answer: "x".into(),
            created_at: at,
        }
    }

    #[tokio::test]
    async fn test_ledger_insertion_order() {
        let db = Db::in_memory().await.unwrap();
        db.add_attempt(&attempt("u1", "q2", true, t0())).await.unwrap();
        db.add_attempt(&attempt("u2", "q1", false, t0())).await.unwrap();
        db.add_attempt(&attempt("u1", "q1", false, t0() - Duration::days(1))).await.unwrap();

        let list = db.attempts_by_user("u1").await.unwrap();
        let qs: Vec<&str> = list.iter().map(|a| a.question_id.as_str()).collect();
        assert_eq!(qs, vec!["q2", "q1"]);
        assert!(list[0].correct);
        assert_eq!(list[0].created_at, t0());

        assert!(db.attempts_by_user("nobody").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_seed_catalog_once() {
        let db = Db::in_memory().await.unwrap();
        assert!(db.seed_catalog_if_empty().await.unwrap());
        assert!(!db.seed_catalog_if_empty().await.unwrap());

        let kps = db.knowledge_points("math", Some(4)).await.unwrap();
        assert_eq!(kps.len(), 6);
        assert_eq!(kps[0].id, "math-4-mul");

        let q = db.get_question("q-mul-1").await.unwrap().unwrap();
        assert_eq!(q.options.len(), 4);
        assert_eq!(q.subject, "math");

        assert!(db.knowledge_points("math", Some(9)).await.unwrap().is_empty());
        assert_eq!(db.questions("english", None).await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_replace_study_plan() {
        let db = Db::in_memory().await.unwrap();
        let first = StudyPlan {
            user_id: "u1".into(),
            subject: "math".into(),
            created_at: t0(),
            items: (0..3)
                .map(|i| StudyPlanItem {
                    knowledge_point_id: format!("old-{}", i),
                    target_count: 5,
                    due_date: t0() + Duration::days(i),
                })
                .collect(),
        };
        db.replace_study_plan(&first).await.unwrap();

        let second = StudyPlan {
            created_at: t0() + Duration::days(1),
            items: vec![StudyPlanItem {
                knowledge_point_id: "new-0".into(),
                target_count: 5,
                due_date: t0() + Duration::days(1),
            }],
            ..first.clone()
        };
        db.replace_study_plan(&second).await.unwrap();

        let stored = db.get_study_plan("u1", "math").await.unwrap().unwrap();
        assert_eq!(stored, second);
        assert!(db.get_study_plan("u1", "english").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_record_attempt_upserts_one_review_row() {
        let db = Db::in_memory().await.unwrap();
        let s: Arc<dyn ReviewSchedule> = Arc::new(FixedStages);

        let r1 = db.record_attempt(s.clone(), attempt("u1", "q1", true, t0())).await.unwrap();
        let r2 = db
            .record_attempt(s.clone(), attempt("u1", "q1", true, t0() + Duration::hours(1)))
            .await
            .unwrap();
        assert_eq!(r1.id, r2.id);
        assert_eq!(r2.stage, 2);
        assert_eq!(r2.created_at, t0());

        let stored = db.get_memory_review("u1", "q1").await.unwrap().unwrap();
        assert_eq!(stored, r2);
        assert_eq!(db.reviews_by_user("u1").await.unwrap().len(), 1);
        assert_eq!(db.attempts_by_user("u1").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_due_ids_ordered_and_filtered() {
        let db = Db::in_memory().await.unwrap();
        let s: Arc<dyn ReviewSchedule> = Arc::new(FixedStages);

        // q-late: stage 0 at t0, due t0+1d. q-early: stage 0 at t0-1d, due t0.
        db.record_attempt(s.clone(), attempt("u1", "q-late", false, t0())).await.unwrap();
        db.record_attempt(s.clone(), attempt("u1", "q-early", false, t0() - Duration::days(1))).await.unwrap();
        // q-future: stage 1, due t0+3d.
        db.record_attempt(s.clone(), attempt("u1", "q-future", true, t0())).await.unwrap();

        let due = db.due_review_question_ids("u1", t0() + Duration::days(1)).await.unwrap();
        assert_eq!(due, vec!["q-early".to_string(), "q-late".to_string()]);

        let due_now = db.due_review_question_ids("u1", t0()).await.unwrap();
        assert_eq!(due_now, vec!["q-early".to_string()]);

        assert!(db.due_review_question_ids("u2", t0()).await.unwrap().is_empty());
    }
}
