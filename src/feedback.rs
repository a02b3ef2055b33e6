use crate::models::Question;
use serde::Serialize;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    pub correct: bool,
    pub message: String,
    pub explanation: Option<String>,
}

pub struct FeedbackGenerator;

impl FeedbackGenerator {
    /// Compares a free-form or option answer against the stored one.
    ///
    /// Choice questions accept either the option letter ("B") or the option
    /// text itself.
    pub fn grade(question: &Question, user_answer: &str) -> bool {
        let given = user_answer.trim();
        let expected = question.answer.trim();

        if given.eq_ignore_ascii_case(expected) {
            return true;
        }

        if question.options.is_empty() {
            return false;
        }

        let letter_of = |text: &str| {
            question
                .options
                .iter()
                .position(|o| o.trim().eq_ignore_ascii_case(text))
                .and_then(|i| char::from_u32('A' as u32 + i as u32))
        };

        match letter_of(given) {
            Some(letter) => expected.eq_ignore_ascii_case(&letter.to_string()),
            None => false,
        }
    }

    pub fn generate(question: Option<&Question>, user_answer: &str, correct: bool) -> Feedback {
        let trimmed = user_answer.trim();

        if correct {
            return Feedback {
                correct,
                message: "回答正确！".to_string(),
                explanation: question.and_then(|q| non_empty(&q.explanation)),
            };
        }

        let message = match question {
            Some(q) => format!(
                "正确答案是 {}。 你输入了: '{}'。 请继续加油！",
                q.answer.trim(),
                trimmed
            ),
            None => format!("你输入了: '{}'。 请继续加油！", trimmed),
        };

        Feedback {
            correct,
            message,
            explanation: question.and_then(|q| non_empty(&q.explanation)),
        }
    }
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn choice() -> Question {
        Question {
            id: "q1".into(),
            subject: "math".into(),
            grade: 3,
            knowledge_point_id: "kp1".into(),
            stem: "3 × 4 = ?".into(),
            options: vec!["7".into(), "12".into(), "34".into()],
            answer: "B".into(),
            explanation: "3 个 4 相加等于 12。".into(),
            difficulty: "easy".into(),
        }
    }

    #[test]
    fn test_grade_letter_and_text() {
        let q = choice();
        assert!(FeedbackGenerator::grade(&q, "B"));
        assert!(FeedbackGenerator::grade(&q, " b "));
        assert!(FeedbackGenerator::grade(&q, "12"));
        assert!(!FeedbackGenerator::grade(&q, "A"));
        assert!(!FeedbackGenerator::grade(&q, "34"));
    }

    #[test]
    fn test_grade_free_form() {
        let mut q = choice();
        q.options.clear();
        q.answer = "Twelve".into();
        assert!(FeedbackGenerator::grade(&q, "twelve"));
        assert!(!FeedbackGenerator::grade(&q, "eleven"));
    }

    #[test]
    fn test_incorrect_message_mentions_answer() {
        let q = choice();
        let fb = FeedbackGenerator::generate(Some(&q), "A", false);
        assert!(!fb.correct);
        assert!(fb.message.contains("B"));
        assert!(fb.message.contains("'A'"));
        assert_eq!(fb.explanation.as_deref(), Some("3 个 4 相加等于 12。"));
    }

    #[test]
    fn test_unknown_question() {
        let fb = FeedbackGenerator::generate(None, "42", true);
        assert!(fb.correct);
        assert!(fb.explanation.is_none());
    }
}
