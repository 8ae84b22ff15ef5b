/// Scores review texts on a `-1.0..=1.0` scale.
pub trait SentimentModel: Send + Sync {
    fn score(&self, texts: &[String]) -> f64;

    /// Review texts used when a supplier exposes none for a product.
    fn fallback_reviews(&self, rating: f64) -> Vec<String>;
}

const POSITIVE_WORDS: &[&str] = &[
    "great", "excellent", "amazing", "perfect", "love", "best", "awesome", "fantastic",
    "wonderful", "recommend", "quality", "fast", "helpful", "beautiful", "nice", "good",
    "satisfied", "ممتاز", "رائع", "جيد", "مقبول", "حب", "أنصح", "جودة",
];

const NEGATIVE_WORDS: &[&str] = &[
    "bad", "terrible", "awful", "horrible", "worst", "hate", "broken", "defective", "waste",
    "fake", "disappointed", "poor", "cheap", "scam", "fraud", "return", "refund", "سيء", "رديء",
    "سيخة", "تالف", "خيبة", "ندم",
];

const POSITIVE_REVIEWS: &[&str] = &[
    "Great product! Exactly as described.",
    "Amazing quality, fast shipping.",
    "Highly recommend to everyone.",
    "Best purchase I made this year.",
    "Perfect fit, excellent material.",
    "Worth every penny!",
];

const NEUTRAL_REVIEWS: &[&str] = &[
    "It's okay, not great but not bad.",
    "Average quality for the price.",
    "Does the job, nothing special.",
    "Decent product, expected more though.",
];

const NEGATIVE_REVIEWS: &[&str] = &[
    "Quality could be better.",
    "Took longer than expected to arrive.",
    "Not as shown in the picture.",
    "Had to return it, didn't fit.",
];

/// Word-list sentiment. Each text scores `(positive hits - negative hits) / 5`
/// clamped to `[-1, 1]`; the result is the mean over non-empty texts.
#[derive(Clone, Copy, Debug, Default)]
pub struct KeywordSentiment;

impl KeywordSentiment {
    fn score_text(text: &str) -> f64 {
        let lower = text.to_lowercase();
        let positive = POSITIVE_WORDS.iter().filter(|word| lower.contains(*word)).count() as f64;
        let negative = NEGATIVE_WORDS.iter().filter(|word| lower.contains(*word)).count() as f64;
        ((positive - negative) / 5.0).clamp(-1.0, 1.0)
    }
}

impl SentimentModel for KeywordSentiment {
    fn score(&self, texts: &[String]) -> f64 {
        let scores: Vec<f64> = texts
            .iter()
            .filter(|text| !text.is_empty())
            .map(|text| Self::score_text(text))
            .collect();
        if scores.is_empty() {
            return 0.0;
        }
        scores.iter().sum::<f64>() / scores.len() as f64
    }

    fn fallback_reviews(&self, rating: f64) -> Vec<String> {
        let picked: Vec<&str> = if rating >= 4.5 {
            POSITIVE_REVIEWS[..3].to_vec()
        } else if rating >= 3.5 {
            vec![POSITIVE_REVIEWS[0], NEUTRAL_REVIEWS[0], NEUTRAL_REVIEWS[1]]
        } else {
            vec![NEUTRAL_REVIEWS[0], NEGATIVE_REVIEWS[0], NEGATIVE_REVIEWS[1]]
        };
        picked.into_iter().map(str::to_string).collect()
    }
}
