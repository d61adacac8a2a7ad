//! Keyword-weighted memory prioritization.
//!
//! Each priority category owns a fixed keyword list. A memory scores
//! `hits(category) * weight(category)` summed over all categories, where
//! `hits` counts the category keywords that occur as substrings of the
//! memory. Only the weights vary per call.

use std::collections::HashSet;

use mneme_types::memory::{PriorityCategory, PriorityWeights};

/// Minimum Jaccard similarity for [`MemoryRanker::select_relevant`].
pub const RELEVANCE_THRESHOLD: f64 = 0.3;

const PERSONAL_KEYWORDS: &[&str] = &[
    "이름", "나이", "가족", "부모님", "엄마", "아빠", "동생", "생일", "결혼", "나는", "저는", "내가",
    "제가",
];

const EMOTION_KEYWORDS: &[&str] = &[
    "행복", "기뻐", "기쁘", "슬퍼", "슬프", "화나", "우울", "걱정", "불안", "외로", "스트레스",
    "힘들", "좋아", "싫어",
];

const WORK_KEYWORDS: &[&str] = &[
    "회사", "직장", "업무", "회의", "프로젝트", "상사", "동료", "출근", "퇴근", "야근", "면접",
    "취업", "바빠",
];

const HOBBY_KEYWORDS: &[&str] = &[
    "취미", "게임", "운동", "영화", "음악", "노래", "여행", "독서", "요리", "그림", "산책",
];

/// Keyword list bound to `category`.
pub fn category_keywords(category: PriorityCategory) -> &'static [&'static str] {
    match category {
        PriorityCategory::Personal => PERSONAL_KEYWORDS,
        PriorityCategory::Emotion => EMOTION_KEYWORDS,
        PriorityCategory::Work => WORK_KEYWORDS,
        PriorityCategory::Hobby => HOBBY_KEYWORDS,
    }
}

/// Stateless ranking over memory strings.
pub struct MemoryRanker;

impl MemoryRanker {
    /// Weighted keyword score for one memory. Matching is case-sensitive.
    ///
    /// Arithmetic saturates, so extreme weights clamp instead of wrapping.
    pub fn score(memory: &str, weights: &PriorityWeights) -> i64 {
        PriorityCategory::ALL
            .iter()
            .map(|&category| {
                let hits = category_keywords(category)
                    .iter()
                    .filter(|keyword| memory.contains(*keyword))
                    .count() as i64;
                hits.saturating_mul(weights.weight(category))
            })
            .fold(0i64, i64::saturating_add)
    }

    /// Reorder `memories` by descending score. Equal scores keep input order.
    pub fn prioritize(memories: &[String], weights: &PriorityWeights) -> Vec<String> {
        let mut scored: Vec<(i64, &String)> = memories
            .iter()
            .map(|memory| (Self::score(memory, weights), memory))
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored.into_iter().map(|(_, memory)| memory.clone()).collect()
    }

    /// Jaccard similarity of the lowercase whitespace-separated word sets.
    pub fn relevance(context: &str, memory: &str) -> f64 {
        let context = context.to_lowercase();
        let memory = memory.to_lowercase();
        let context_words: HashSet<&str> = context.split_whitespace().collect();
        let memory_words: HashSet<&str> = memory.split_whitespace().collect();

        if context_words.is_empty() || memory_words.is_empty() {
            return 0.0;
        }

        let shared = context_words.intersection(&memory_words).count();
        let union = context_words.union(&memory_words).count();
        shared as f64 / union as f64
    }

    /// Memories whose relevance to `context` exceeds the threshold,
    /// most relevant first, at most `limit` of them.
    pub fn select_relevant(memories: &[String], context: &str, limit: usize) -> Vec<String> {
        let mut scored: Vec<(f64, &String)> = memories
            .iter()
            .map(|memory| (Self::relevance(context, memory), memory))
            .filter(|(score, _)| *score > RELEVANCE_THRESHOLD)
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        scored
            .into_iter()
            .take(limit)
            .map(|(_, memory)| memory.clone())
            .collect()
    }
}
