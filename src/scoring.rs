//! Answer scoring and guess matching.
//!
//! Everything in here is pure: callers pass the timestamps and the track metadata, and get a
//! deterministic [`Evaluation`] back. The round service is the only place that feeds server time
//! into these helpers.

use std::time::SystemTime;

use serde::Deserialize;

/// Tunable parameters of the scoring rules.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ScoringRules {
    /// Score awarded to a correct answer given instantly.
    pub max_score: u32,
    /// Answer window in seconds; correct answers given after it score zero.
    pub max_answer_secs: f64,
    /// Minimum normalized similarity for a fuzzy match to count as correct.
    pub similarity_threshold: f64,
}

impl Default for ScoringRules {
    fn default() -> Self {
        Self {
            max_score: 1000,
            max_answer_secs: 30.0,
            similarity_threshold: 0.85,
        }
    }
}

impl ScoringRules {
    /// Check that the rules can produce meaningful scores.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.max_answer_secs.is_finite() && self.max_answer_secs > 0.0) {
            return Err(format!(
                "max_answer_secs must be a positive number (got {})",
                self.max_answer_secs
            ));
        }
        if !(self.similarity_threshold > 0.0 && self.similarity_threshold <= 1.0) {
            return Err(format!(
                "similarity_threshold must be within (0, 1] (got {})",
                self.similarity_threshold
            ));
        }
        Ok(())
    }
}

/// Which piece of track metadata a guess matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchTarget {
    /// The track title.
    Track,
    /// The main artist name.
    Artist,
}

/// How a guess matched its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    /// Normalized strings are identical.
    Exact,
    /// Normalized strings are close enough according to the similarity threshold.
    Fuzzy,
}

/// Outcome of comparing a guess against the track metadata.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    /// The guess names the track or its artist.
    Correct {
        /// Matched metadata field.
        target: MatchTarget,
        /// Exact or fuzzy match.
        kind: MatchKind,
        /// Similarity with the matched field.
        similarity: f64,
    },
    /// The guess is not close enough to anything.
    Incorrect {
        /// Best similarity reached against any field.
        best_similarity: f64,
    },
}

impl Verdict {
    /// Whether the guess counts as correct.
    pub fn is_correct(&self) -> bool {
        matches!(self, Verdict::Correct { .. })
    }
}

/// Score, correctness and timing of a single submitted answer.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    /// Points earned; zero for incorrect answers.
    pub score: u32,
    /// Seconds elapsed between the round start and the answer, never negative.
    pub time_taken: f64,
    /// Matching details.
    pub verdict: Verdict,
}

impl Evaluation {
    /// Whether the answer was judged correct.
    pub fn is_correct(&self) -> bool {
        self.verdict.is_correct()
    }
}

/// Time-decayed score: `round(max_score * max(0, 1 - elapsed / max_answer_secs))`.
///
/// Negative or non-finite elapsed values are treated as an instant answer and a late answer, respectively.
pub fn score_for_elapsed(elapsed_secs: f64, rules: &ScoringRules) -> u32 {
    if elapsed_secs.is_nan() || elapsed_secs == f64::INFINITY {
        return 0;
    }
    let elapsed = elapsed_secs.max(0.0);
    if elapsed >= rules.max_answer_secs {
        return 0;
    }

    let ratio = (1.0 - elapsed / rules.max_answer_secs).clamp(0.0, 1.0);
    let score = (f64::from(rules.max_score) * ratio).round();
    (score as u32).min(rules.max_score)
}

/// Seconds between `start` and `end`, negative when `end` precedes `start`.
pub fn elapsed_secs(start: SystemTime, end: SystemTime) -> f64 {
    match end.duration_since(start) {
        Ok(elapsed) => elapsed.as_secs_f64(),
        Err(err) => -err.duration().as_secs_f64(),
    }
}

/// Compare a guess against the track title and artist name.
pub fn judge_answer(
    guess: &str,
    track_name: &str,
    artist_name: &str,
    rules: &ScoringRules,
) -> Verdict {
    let guess = normalize(guess);
    if guess.is_empty() {
        return Verdict::Incorrect {
            best_similarity: 0.0,
        };
    }

    let candidates = [
        (MatchTarget::Track, normalize(track_name)),
        (MatchTarget::Artist, normalize(artist_name)),
    ];

    if let Some((target, _)) = candidates
        .iter()
        .find(|(_, candidate)| !candidate.is_empty() && *candidate == guess)
    {
        return Verdict::Correct {
            target: *target,
            kind: MatchKind::Exact,
            similarity: 1.0,
        };
    }

    let (best_target, best_similarity) = candidates
        .iter()
        .filter(|(_, candidate)| !candidate.is_empty())
        .map(|(target, candidate)| (*target, normalized_similarity(&guess, candidate)))
        .fold((MatchTarget::Track, 0.0_f64), |best, current| {
            if current.1 > best.1 { current } else { best }
        });

    if best_similarity >= rules.similarity_threshold {
        Verdict::Correct {
            target: best_target,
            kind: MatchKind::Fuzzy,
            similarity: best_similarity,
        }
    } else {
        Verdict::Incorrect { best_similarity }
    }
}

/// Judge and score an answer given at `answered_at` for a round started at `start_time`.
pub fn evaluate(
    guess: &str,
    start_time: SystemTime,
    answered_at: SystemTime,
    track_name: &str,
    artist_name: &str,
    rules: &ScoringRules,
) -> Evaluation {
    // Clock skew between the round start and the answer never yields a negative duration.
    let time_taken = elapsed_secs(start_time, answered_at).max(0.0);
    let verdict = judge_answer(guess, track_name, artist_name, rules);
    let score = if verdict.is_correct() {
        score_for_elapsed(time_taken, rules)
    } else {
        0
    };

    Evaluation {
        score,
        time_taken,
        verdict,
    }
}

/// Similarity in `[0, 1]` of two free-text values after normalization.
pub fn similarity(a: &str, b: &str) -> f64 {
    normalized_similarity(&normalize(a), &normalize(b))
}

fn normalized_similarity(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }
    let longest = a.chars().count().max(b.chars().count());
    if longest == 0 {
        return 1.0;
    }
    1.0 - levenshtein(a, b) as f64 / longest as f64
}

/// Levenshtein edit distance over Unicode scalar values.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != cb);
            let insertion = current[j] + 1;
            let deletion = previous[j + 1] + 1;
            current[j + 1] = substitution.min(insertion).min(deletion);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b.len()]
}

/// Canonical form used for comparisons.
///
/// Lowercases, folds common Latin diacritics, drops bracketed qualifiers such as
/// `(Remastered 2011)` and trailing `- Live` style suffixes, turns `&` into `and`, removes
/// apostrophes and maps the remaining punctuation to single spaces.
pub fn normalize(text: &str) -> String {
    let stripped = strip_qualifiers(text);
    let source = if stripped.trim().is_empty() {
        text
    } else {
        stripped.as_str()
    };

    let mut folded = String::with_capacity(source.len());
    for c in source.chars().flat_map(char::to_lowercase) {
        match c {
            '\'' | '’' | '`' => {}
            '&' => folded.push_str(" and "),
            c if c.is_alphanumeric() => push_folded(&mut folded, c),
            _ => folded.push(' '),
        }
    }

    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Remove `(...)`/`[...]` groups and anything after a spaced dash.
fn strip_qualifiers(text: &str) -> String {
    let head = text.split(" - ").next().unwrap_or(text);

    let mut depth = 0usize;
    let mut out = String::with_capacity(head.len());
    for c in head.chars() {
        match c {
            '(' | '[' => depth += 1,
            ')' | ']' => depth = depth.saturating_sub(1),
            _ if depth == 0 => out.push(c),
            _ => {}
        }
    }
    out
}

fn push_folded(out: &mut String, c: char) {
    let folded = match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => "a",
        'æ' => "ae",
        'ç' => "c",
        'è' | 'é' | 'ê' | 'ë' => "e",
        'ì' | 'í' | 'î' | 'ï' => "i",
        'ñ' => "n",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' => "o",
        'œ' => "oe",
        'ù' | 'ú' | 'û' | 'ü' => "u",
        'ý' | 'ÿ' => "y",
        'ß' => "ss",
        other => {
            out.push(other);
            return;
        }
    };
    out.push_str(folded);
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, UNIX_EPOCH};

    use super::*;

    fn rules() -> ScoringRules {
        ScoringRules::default()
    }

    #[test]
    fn instant_answer_scores_max() {
        assert_eq!(score_for_elapsed(0.0, &rules()), 1000);
        assert_eq!(score_for_elapsed(-5.0, &rules()), 1000);
    }

    #[test]
    fn score_decays_linearly() {
        assert_eq!(score_for_elapsed(15.0, &rules()), 500);
        assert_eq!(score_for_elapsed(1.0, &rules()), 967);
        assert_eq!(score_for_elapsed(29.99, &rules()), 0);
    }

    #[test]
    fn score_is_zero_after_answer_window() {
        assert_eq!(score_for_elapsed(30.0, &rules()), 0);
        assert_eq!(score_for_elapsed(30.5, &rules()), 0);
        assert_eq!(score_for_elapsed(3600.0, &rules()), 0);
        assert_eq!(score_for_elapsed(f64::INFINITY, &rules()), 0);
        assert_eq!(score_for_elapsed(f64::NAN, &rules()), 0);
    }

    #[test]
    fn score_is_monotonic_and_clamped() {
        let rules = rules();
        let mut previous = u32::MAX;
        for tenth in 0..400 {
            let score = score_for_elapsed(f64::from(tenth) / 10.0, &rules);
            assert!(score <= rules.max_score);
            assert!(score <= previous, "score increased at {tenth} tenths");
            previous = score;
        }
    }

    #[test]
    fn levenshtein_counts_edits() {
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("abc", ""), 3);
        assert_eq!(levenshtein("né", "ne"), 1);
    }

    #[test]
    fn similarity_is_symmetric_and_reflexive() {
        let pairs = [
            ("Bohemian Rhapsody", "bohemian rapsody"),
            ("Queen", "Quinn"),
            ("", "abc"),
            ("Beyoncé", "beyonce"),
        ];
        for (a, b) in pairs {
            assert_eq!(similarity(a, b), similarity(b, a));
            assert_eq!(similarity(a, a), 1.0);
        }
        assert_eq!(similarity("Beyoncé", "BEYONCE"), 1.0);
        assert_eq!(similarity("", ""), 1.0);
    }

    #[test]
    fn normalize_strips_qualifiers_and_punctuation() {
        assert_eq!(
            normalize("Don't Stop Me Now - Remastered 2011"),
            "dont stop me now"
        );
        assert_eq!(normalize("Song (feat. Someone) [Live]"), "song");
        assert_eq!(normalize("Simon & Garfunkel"), "simon and garfunkel");
        assert_eq!(normalize("  AC/DC  "), "ac dc");
        assert_eq!(normalize("(Intro)"), "intro");
    }

    #[test]
    fn exact_match_on_track_or_artist() {
        let verdict = judge_answer("bohemian rhapsody", "Bohemian Rhapsody", "Queen", &rules());
        assert_eq!(
            verdict,
            Verdict::Correct {
                target: MatchTarget::Track,
                kind: MatchKind::Exact,
                similarity: 1.0,
            }
        );

        let verdict = judge_answer("QUEEN", "Bohemian Rhapsody", "Queen", &rules());
        assert!(matches!(
            verdict,
            Verdict::Correct {
                target: MatchTarget::Artist,
                kind: MatchKind::Exact,
                ..
            }
        ));
    }

    #[test]
    fn fuzzy_match_above_threshold() {
        let verdict = judge_answer("bohemian rapsody", "Bohemian Rhapsody", "Queen", &rules());
        match verdict {
            Verdict::Correct {
                target: MatchTarget::Track,
                kind: MatchKind::Fuzzy,
                similarity,
            } => assert!(similarity >= 0.85),
            other => panic!("expected fuzzy track match, got {other:?}"),
        }
    }

    #[test]
    fn unrelated_or_empty_guess_is_incorrect() {
        assert!(!judge_answer("yesterday", "Bohemian Rhapsody", "Queen", &rules()).is_correct());
        assert!(!judge_answer("   ", "Bohemian Rhapsody", "Queen", &rules()).is_correct());
        assert!(!judge_answer("?!", "Bohemian Rhapsody", "Queen", &rules()).is_correct());
    }

    #[test]
    fn evaluate_zeroes_incorrect_answers() {
        let start = UNIX_EPOCH + Duration::from_secs(100);
        let answered = start + Duration::from_secs(10);

        let correct = evaluate("Queen", start, answered, "Bohemian Rhapsody", "Queen", &rules());
        assert_eq!(correct.score, 667);
        assert!(correct.is_correct());
        assert_eq!(correct.time_taken, 10.0);

        let wrong = evaluate("Abba", start, answered, "Bohemian Rhapsody", "Queen", &rules());
        assert_eq!(wrong.score, 0);
        assert!(!wrong.is_correct());
    }

    #[test]
    fn answer_before_start_counts_as_instant() {
        let start = UNIX_EPOCH + Duration::from_secs(100);
        let answered = start - Duration::from_secs(2);
        let evaluation = evaluate("Queen", start, answered, "Bohemian Rhapsody", "Queen", &rules());
        assert_eq!(evaluation.time_taken, 0.0);
        assert_eq!(evaluation.score, 1000);
    }

    #[test]
    fn rules_validation_rejects_nonsense() {
        assert!(rules().validate().is_ok());
        let mut broken = rules();
        broken.max_answer_secs = 0.0;
        assert!(broken.validate().is_err());
        let mut broken = rules();
        broken.similarity_threshold = 1.5;
        assert!(broken.validate().is_err());
    }
}
