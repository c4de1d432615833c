/// Daily quests
///
/// Two goals are drawn once per calendar day from a weighted pool of six
/// archetypes. Their progress is never trusted from storage: it is re-derived
/// from the current progress snapshot every time quests are evaluated.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::domain::{looks_like_day_key, Curriculum, ProgressSnapshot};

/// Quests drawn per day
pub const QUESTS_PER_DAY: usize = 2;

/// Daily goal archetype
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuestKind {
    #[serde(rename = "complete_review")]
    CompleteReview,
    #[serde(rename = "complete_unit")]
    CompleteUnit,
    #[serde(rename = "do_2_lessons")]
    DoTwoLessons,
    #[serde(rename = "do_1_lesson")]
    DoOneLesson,
    #[serde(rename = "get_20xp")]
    GetTwentyXp,
    #[serde(rename = "get_10xp")]
    GetTenXp,
}

impl QuestKind {
    pub const ALL: [QuestKind; 6] = [
        QuestKind::CompleteReview,
        QuestKind::CompleteUnit,
        QuestKind::DoTwoLessons,
        QuestKind::DoOneLesson,
        QuestKind::GetTwentyXp,
        QuestKind::GetTenXp,
    ];

    /// Relative draw weight; higher is more likely
    pub fn weight(self) -> u32 {
        match self {
            QuestKind::CompleteReview => 10,
            QuestKind::CompleteUnit => 10,
            QuestKind::DoTwoLessons => 20,
            QuestKind::DoOneLesson => 40,
            QuestKind::GetTwentyXp => 5,
            QuestKind::GetTenXp => 15,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            QuestKind::CompleteReview => "Complete a Review",
            QuestKind::CompleteUnit => "Complete a Unit",
            QuestKind::DoTwoLessons => "Do 2 Lessons",
            QuestKind::DoOneLesson => "Do 1 Lesson",
            QuestKind::GetTwentyXp => "Get 20XP",
            QuestKind::GetTenXp => "Get 10XP",
        }
    }

    pub fn target(self) -> u32 {
        match self {
            QuestKind::DoTwoLessons => 2,
            QuestKind::DoOneLesson => 1,
            QuestKind::GetTwentyXp => 20,
            QuestKind::GetTenXp => 10,
            QuestKind::CompleteReview | QuestKind::CompleteUnit => 1,
        }
    }

    /// Live progress toward this goal
    pub fn measure(self, snapshot: &ProgressSnapshot, curriculum: &Curriculum) -> u32 {
        match self {
            QuestKind::CompleteReview => snapshot.reviews_completed(),
            QuestKind::CompleteUnit => {
                curriculum.units_completed(&snapshot.lesson_set(), &snapshot.item_set())
            }
            QuestKind::DoTwoLessons | QuestKind::DoOneLesson => {
                snapshot.lessons_completed_on(snapshot.today)
            }
            QuestKind::GetTwentyXp | QuestKind::GetTenXp => snapshot.xp_today,
        }
    }
}

/// One daily goal as persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quest {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: QuestKind,
    pub label: String,
    #[serde(default, deserialize_with = "deserialize_progress")]
    pub progress: u32,
    #[serde(default)]
    pub target: u32,
    #[serde(default)]
    pub completed: bool,
}

impl Quest {
    pub fn new(id: String, kind: QuestKind) -> Self {
        Self {
            id,
            kind,
            label: kind.label().to_string(),
            progress: 0,
            target: kind.target(),
            completed: false,
        }
    }

    /// Recompute progress from the snapshot; a claimed quest stays claimed
    pub fn evaluate(&self, snapshot: &ProgressSnapshot, curriculum: &Curriculum) -> Self {
        if self.completed {
            return self.clone();
        }
        let progress = self.kind.measure(snapshot, curriculum);
        Self {
            progress,
            completed: progress >= self.target,
            ..self.clone()
        }
    }
}

/// Accept numbers and numeric strings; date-shaped or other text is corrupt and reads as 0
fn deserialize_progress<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite() && *f >= 0.0).map(|f| f as u64))
            .map(|n| n.min(u32::MAX as u64) as u32)
            .unwrap_or(0),
        Value::String(s) if looks_like_day_key(&s) => {
            tracing::warn!("Quest progress held a date ({}), resetting to 0", s);
            0
        }
        Value::String(s) => {
            let digits: String = s.trim().chars().take_while(|c| c.is_ascii_digit()).collect();
            digits.parse().unwrap_or(0)
        }
        _ => 0,
    })
}

/// Decode a persisted quest list
///
/// Returns `None` when the record is unreadable or does not hold exactly
/// `QUESTS_PER_DAY` quests, in which case the caller regenerates the day's
/// quests. Missing targets are restored from the archetype.
pub fn parse_stored_quests(raw: &str) -> Option<Vec<Quest>> {
    match serde_json::from_str::<Vec<Quest>>(raw) {
        Ok(quests) if quests.len() != QUESTS_PER_DAY => {
            tracing::warn!("Discarding daily quests with {} entries", quests.len());
            None
        }
        Ok(mut quests) => {
            for quest in quests.iter_mut() {
                if quest.target == 0 {
                    quest.target = quest.kind.target();
                }
            }
            Some(quests)
        }
        Err(e) => {
            tracing::warn!("Discarding unreadable daily quests: {}", e);
            None
        }
    }
}

/// Draw the day's quests
///
/// The pool holds each archetype `weight` times and is shuffled before drawing.
/// Once an archetype is drawn all of its remaining slots leave the pool, so the
/// two quests always have different types.
pub fn generate_daily_quests<R: Rng + ?Sized>(rng: &mut R, now_millis: i64) -> Vec<Quest> {
    let mut pool: Vec<QuestKind> = QuestKind::ALL
        .iter()
        .flat_map(|kind| std::iter::repeat(*kind).take(kind.weight() as usize))
        .collect();
    pool.shuffle(rng);

    let mut selected = Vec::with_capacity(QUESTS_PER_DAY);
    while selected.len() < QUESTS_PER_DAY && !pool.is_empty() {
        let index = rng.gen_range(0..pool.len());
        let kind = pool.remove(index);
        pool.retain(|k| *k != kind);
        selected.push(kind);
    }

    selected
        .into_iter()
        .enumerate()
        .map(|(index, kind)| Quest::new(format!("quest_{}_{}", now_millis, index), kind))
        .collect()
}

/// Re-derive every quest from the snapshot
pub fn evaluate_quests(
    quests: &[Quest],
    snapshot: &ProgressSnapshot,
    curriculum: &Curriculum,
) -> Vec<Quest> {
    quests
        .iter()
        .map(|quest| quest.evaluate(snapshot, curriculum))
        .collect()
}

/// Quests still shown to the learner; completed ones vanish
pub fn active_quests(quests: &[Quest]) -> Vec<Quest> {
    quests.iter().filter(|q| !q.completed).cloned().collect()
}
