//! Built-in seed catalog
//!
//! A small catalog shipped with the application so the quizzes screen always
//! has something to show when the content store is unreachable or returns
//! nothing for the active language.

use super::model::{Level, QuizCatalog, QuizQuestion, QuizTopic, QuizTrack};

const BASICS: &str = "EB-5 Basics";
const CAPITAL: &str = "Investment & Capital";
const PROCESS: &str = "Immigration Process";

const FOUNDATIONS_TRACK: &str = "track-foundations";

/// Language the bundled seed content is written in
pub const SEED_LANGUAGE: &str = "en";

/// Build the seed catalog for `language`.
///
/// Only English seed content is bundled, so the catalog always reports
/// [`SEED_LANGUAGE`] even when another language was requested.
pub fn seed_catalog(language: &str) -> QuizCatalog {
    if language != SEED_LANGUAGE {
        tracing::debug!("No {} seed catalog bundled, using {}", language, SEED_LANGUAGE);
    }
    QuizCatalog {
        language: SEED_LANGUAGE.to_string(),
        quizzes: vec![
            what_is_eb5(),
            investment_amounts(),
            job_creation(),
            regional_centers(),
            conditional_residence(),
        ],
        tracks: vec![QuizTrack {
            id: FOUNDATIONS_TRACK.into(),
            title: "EB-5 Foundations".into(),
            description: "Core concepts every prospective EB-5 investor should know".into(),
            quiz_ids: vec![
                "seed-what-is-eb5".into(),
                "seed-investment-amounts".into(),
                "seed-job-creation".into(),
            ],
            estimated_minutes: 0,
            goal_tag: "learn-basics".into(),
            category: BASICS.into(),
        }],
    }
}

#[allow(clippy::too_many_arguments)]
fn topic(
    id: &str,
    title: &str,
    summary: &str,
    category: &str,
    level: Level,
    duration_minutes: u32,
    goal_tags: &[&str],
    questions: Vec<QuizQuestion>,
) -> QuizTopic {
    QuizTopic {
        id: id.into(),
        title: title.into(),
        summary: Some(summary.into()),
        category: category.into(),
        subcategory: String::new(),
        track_ids: Vec::new(),
        goal_tags: goal_tags.iter().map(|s| s.to_string()).collect(),
        format: "Quiz".into(),
        level,
        duration_minutes,
        questions,
        tags: Vec::new(),
    }
}

fn what_is_eb5() -> QuizTopic {
    let mut quiz = topic(
        "seed-what-is-eb5",
        "What is EB-5?",
        "The purpose of the EB-5 Immigrant Investor Program and who it is for.",
        BASICS,
        Level::Low,
        3,
        &["learn-basics"],
        vec![
            QuizQuestion::new(
                "What does an approved EB-5 investment ultimately lead to?",
                ["A tourist visa", "A green card", "A work permit only", "Citizenship at once"],
                1,
            ),
            QuizQuestion::new(
                "Which agency adjudicates EB-5 petitions?",
                ["USCIS", "IRS", "SEC", "Department of Labor"],
                0,
            ),
        ],
    );
    quiz.track_ids = vec![FOUNDATIONS_TRACK.into()];
    quiz
}

fn investment_amounts() -> QuizTopic {
    let mut quiz = topic(
        "seed-investment-amounts",
        "Investment amounts",
        "Standard and targeted employment area thresholds.",
        CAPITAL,
        Level::Low,
        5,
        &["learn-basics", "plan-investment"],
        vec![
            QuizQuestion::new(
                "What is the minimum investment in a targeted employment area?",
                ["$500,000", "$800,000", "$1,050,000", "$1,800,000"],
                1,
            ),
            QuizQuestion::new(
                "What is the standard minimum investment outside a TEA?",
                ["$800,000", "$900,000", "$1,050,000", "$2,000,000"],
                2,
            ),
            QuizQuestion::new(
                "Must the invested capital be placed at risk?",
                ["Yes", "No"],
                0,
            ),
        ],
    );
    quiz.track_ids = vec![FOUNDATIONS_TRACK.into()];
    quiz
}

fn job_creation() -> QuizTopic {
    let mut quiz = topic(
        "seed-job-creation",
        "Job creation",
        "How many jobs an investment must create and how they are counted.",
        BASICS,
        Level::Medium,
        6,
        &["learn-basics", "evaluate-projects"],
        vec![
            QuizQuestion::new(
                "How many full-time jobs must each investment create?",
                ["5", "10", "15", "20"],
                1,
            ),
            QuizQuestion::new(
                "Can regional center projects count indirect jobs?",
                ["Yes", "No"],
                0,
            ),
        ],
    );
    quiz.track_ids = vec![FOUNDATIONS_TRACK.into()];
    quiz.tags = vec!["jobs".into()];
    quiz
}

fn regional_centers() -> QuizTopic {
    let mut quiz = topic(
        "seed-regional-centers",
        "Regional centers",
        "What a regional center does and how it differs from a direct investment.",
        CAPITAL,
        Level::Medium,
        8,
        &["evaluate-projects"],
        vec![
            QuizQuestion::new(
                "Who designates a regional center?",
                ["USCIS", "The state governor", "The investor", "A local bank"],
                0,
            ),
            QuizQuestion::new(
                "In a direct investment, which jobs may be counted?",
                ["Only direct jobs", "Direct and indirect jobs", "Only induced jobs"],
                0,
            ),
        ],
    );
    quiz.subcategory = "Project structures".into();
    quiz
}

fn conditional_residence() -> QuizTopic {
    let mut quiz = topic(
        "seed-conditional-residence",
        "From I-526E to I-829",
        "Conditional residence and removing conditions.",
        PROCESS,
        Level::High,
        12,
        &["plan-timeline"],
        vec![
            QuizQuestion::new(
                "How long is conditional permanent residence?",
                ["6 months", "1 year", "2 years", "5 years"],
                2,
            ),
            QuizQuestion::new(
                "Which petition removes the conditions on residence?",
                ["I-526E", "I-829", "I-485", "I-130"],
                1,
            ),
            QuizQuestion::new(
                "Which petition does a regional center investor file first?",
                ["I-526E", "I-829", "N-400"],
                0,
            ),
        ],
    );
    quiz.tags = vec!["timeline".into()];
    quiz
}
