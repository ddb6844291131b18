use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use eb5_guide::catalog::blocks::body_text;
use eb5_guide::catalog::{Level, seed_catalog};
use eb5_guide::prefs::{AttemptInput, PreferencesWriteQueue, now_millis};
use eb5_guide::quizzes::{
    ChipGroup, DurationRange, NoopTelemetry, QuizUi, QuizzesTab, QuizzesTelemetry, SortOrder,
    TracingTelemetry,
};
use eb5_guide::{
    AppContext, BundledContentStore, Config, ContentStore, PreferencesStore, QuizzesAggregator,
    QuizzesHandle, QuizzesIntent,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const WRAP_WIDTH: usize = 78;

#[derive(Parser)]
#[command(name = "eb5-guide")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Content language (defaults to the configured one)
    #[arg(long, global = true)]
    lang: Option<String>,

    /// Directory holding bundled content
    #[arg(long, global = true)]
    content_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse quizzes grouped by category
    Quizzes {
        /// Only quizzes tagged with this goal
        #[arg(long)]
        goal: Option<String>,
        /// Duration bucket: short, medium or long
        #[arg(long)]
        duration: Option<String>,
        /// Level: L, M or H
        #[arg(long)]
        level: Option<String>,
        /// Sort order: recommended, shortest or title
        #[arg(long)]
        sort: Option<String>,
    },
    /// Show learning tracks and their progress
    Tracks,
    /// Show completion per category and overall
    Progress,
    /// Show past attempts, newest first
    History,
    /// List bookmarked quizzes
    Saved,
    /// Bookmark a quiz
    Save {
        /// Quiz id
        id: String,
    },
    /// Remove a quiz bookmark
    Unsave {
        /// Quiz id
        id: String,
    },
    /// Mark a quiz as started
    Start {
        /// Quiz id
        id: String,
    },
    /// Record a finished attempt
    Finish {
        /// Quiz id
        id: String,
        /// Number of correct answers
        #[arg(long)]
        score: u32,
        /// Track the attempt was taken from
        #[arg(long)]
        track: Option<String>,
    },
    /// List articles
    Articles,
    /// List investment projects
    Projects,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "eb5_guide=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let cli = Cli::parse();

    let mut config = Config::load()?;
    if let Some(lang) = cli.lang {
        config.language = lang;
    }
    if let Some(dir) = cli.content_dir {
        config.content_dir = Some(dir);
    }

    let content = BundledContentStore::new(config.content_dir()?);
    let command = cli.command.unwrap_or(Commands::Quizzes {
        goal: None,
        duration: None,
        level: None,
        sort: None,
    });

    let prefs_path = Config::preferences_path()?;
    let prefs = PreferencesStore::open(&prefs_path)
        .with_context(|| format!("Failed to open preferences at {:?}", prefs_path))?;

    let writes = PreferencesWriteQueue::spawn(prefs.clone());
    let mut screen = open_screen(&config, &content, &prefs, &writes)?;
    let result = run_command(command, &screen, &prefs, &content, &config.language).await;
    screen.shutdown().await;
    writes.flushed().await.context("Failed to save preferences")?;
    result
}

fn open_screen(
    config: &Config,
    content: &dyn ContentStore,
    prefs: &PreferencesStore,
    writes: &PreferencesWriteQueue,
) -> Result<QuizzesHandle> {
    let context = AppContext::from_config(config);
    let telemetry: Arc<dyn QuizzesTelemetry> = if context.log_telemetry {
        Arc::new(TracingTelemetry)
    } else {
        Arc::new(NoopTelemetry)
    };

    let aggregator = QuizzesAggregator::new(
        context,
        seed_catalog(&config.language),
        Arc::new(writes.clone()),
        telemetry,
    );
    let mut screen = QuizzesHandle::spawn(aggregator);
    screen.observe_preferences(prefs);
    screen.send(QuizzesIntent::CatalogLoaded(content.quiz_catalog_or_empty(&config.language)))?;
    Ok(screen)
}

async fn run_command(
    command: Commands,
    screen: &QuizzesHandle,
    prefs: &PreferencesStore,
    content: &dyn ContentStore,
    language: &str,
) -> Result<()> {
    match command {
        Commands::Quizzes { goal, duration, level, sort } => {
            if let Some(goal) = goal {
                toggle_chip(screen, ChipGroup::Goal, goal)?;
            }
            if let Some(duration) = duration {
                if DurationRange::from_chip_id(&duration).is_none() {
                    bail!("Unknown duration '{}', expected short, medium or long", duration);
                }
                toggle_chip(screen, ChipGroup::Duration, duration)?;
            }
            if let Some(level) = level {
                level.parse::<Level>()?;
                toggle_chip(screen, ChipGroup::Level, level)?;
            }
            if let Some(sort) = sort {
                if SortOrder::from_chip_id(&sort).is_none() {
                    bail!("Unknown sort '{}', expected recommended, shortest or title", sort);
                }
                toggle_chip(screen, ChipGroup::Sort, sort)?;
            }

            let state = screen.current().await?;
            if state.using_seed_catalog {
                println!("(Showing built-in quizzes; no content found for '{}')\n", language);
            }
            if let Some(quiz) = &state.continue_quiz {
                println!("Continue: {} [{}]\n", quiz.quiz.title, quiz.id());
            }
            if state.filters_fell_back {
                println!("No quizzes match these filters; showing all quizzes.\n");
            }
            for group in &state.groups {
                println!("{}", group.category);
                for quiz in &group.quizzes {
                    print_quiz(quiz);
                }
                println!();
            }
        }
        Commands::Tracks => {
            screen.send(QuizzesIntent::SelectTab(QuizzesTab::Tracks))?;
            let state = screen.current().await?;
            if state.tracks.is_empty() {
                println!("No tracks available.");
            }
            for track in &state.tracks {
                println!(
                    "{} [{}]  {}/{} complete, ~{} min",
                    track.track.title,
                    track.id(),
                    track.completed,
                    track.total,
                    track.duration_minutes
                );
                if !track.track.description.is_empty() {
                    println!("{}", indented(&track.track.description));
                }
                if track.certificate_available {
                    println!("    Certificate available");
                } else if let Some(next) = track.next_quiz() {
                    println!("    Next: {} [{}]", next.quiz.title, next.id());
                }
            }
        }
        Commands::Progress => {
            let state = screen.current().await?;
            for row in &state.categories {
                println!("{:<24} {}/{}", row.category, row.completed, row.total);
            }
            println!(
                "{:<24} {}/{} ({}%)",
                "Overall",
                state.overall.completed,
                state.overall.total,
                state.overall.percent()
            );
        }
        Commands::History => {
            screen.send(QuizzesIntent::SelectTab(QuizzesTab::History))?;
            let state = screen.current().await?;
            if state.history.is_empty() {
                println!("No attempts yet.");
            }
            let now = now_millis();
            for attempt in &state.history {
                println!(
                    "{:>3}/{:<3} {}  ({}, {})  {}{}",
                    attempt.record.score,
                    attempt.record.total_questions,
                    attempt.quiz_title,
                    attempt.category,
                    attempt.record.level.label(),
                    ago(attempt.record.completed_at, now),
                    if attempt.is_perfect() { "  perfect" } else { "" }
                );
            }
        }
        Commands::Saved => {
            screen.send(QuizzesIntent::SelectTab(QuizzesTab::Saved))?;
            let state = screen.current().await?;
            if state.saved.is_empty() {
                println!("No saved quizzes.");
            }
            for quiz in &state.saved {
                print_quiz(quiz);
            }
        }
        Commands::Save { id } => {
            require_quiz(screen, &id).await?;
            screen.send(QuizzesIntent::ToggleSaved { quiz_id: id.clone(), saved: true })?;
            screen.current().await?;
            println!("Saved {}", id);
        }
        Commands::Unsave { id } => {
            require_quiz(screen, &id).await?;
            screen.send(QuizzesIntent::ToggleSaved { quiz_id: id.clone(), saved: false })?;
            screen.current().await?;
            println!("Removed {} from saved quizzes", id);
        }
        Commands::Start { id } => {
            let quiz = require_quiz(screen, &id).await?;
            if quiz.in_progress {
                screen.send(QuizzesIntent::ResumeClicked { quiz_id: id.clone() })?;
            } else {
                screen.send(QuizzesIntent::PrimaryCtaClicked { quiz_id: id.clone(), cta: quiz.cta() })?;
            }
            prefs.mark_quiz_started(&id, now_millis()).context("Failed to mark quiz as started")?;
            println!("Started {} ({} questions)", quiz.quiz.title, quiz.question_count());
        }
        Commands::Finish { id, score, track } => {
            let quiz = require_quiz(screen, &id).await?;
            let total = quiz.question_count() as u32;
            if score > total {
                bail!("Score {} is higher than the {} questions in {}", score, total, id);
            }
            prefs
                .record_quiz_attempt(AttemptInput {
                    quiz_id: id.clone(),
                    track_id: track,
                    score,
                    total_questions: total,
                    level: quiz.quiz.level,
                    duration_minutes: quiz.quiz.duration_minutes,
                    completed_at: now_millis(),
                })
                .context("Failed to record attempt")?;

            let state = screen.current().await?;
            if let Some(updated) = state.quiz(&id) {
                println!(
                    "Recorded {}/{} on {} (best {}){}",
                    score,
                    total,
                    updated.quiz.title,
                    updated.best_score.unwrap_or(score),
                    if updated.passed { ", passed" } else { "" }
                );
            }
        }
        Commands::Articles => list_articles(content, language)?,
        Commands::Projects => list_projects(content, language)?,
    }

    Ok(())
}

fn toggle_chip(screen: &QuizzesHandle, group: ChipGroup, chip_id: String) -> Result<()> {
    screen.send(QuizzesIntent::ToggleFilterChip { group, chip_id })?;
    Ok(())
}

async fn require_quiz(screen: &QuizzesHandle, id: &str) -> Result<QuizUi> {
    let state = screen.current().await?;
    state.quiz(id).cloned().with_context(|| format!("No quiz with id '{}'", id))
}

fn print_quiz(quiz: &QuizUi) {
    let best = match quiz.best_score {
        Some(best) => format!(", best {}/{}", best, quiz.question_count()),
        None => String::new(),
    };
    println!(
        "  {}{} [{}]  {}, {} min, {} questions{}  -> {}",
        if quiz.is_saved { "* " } else { "" },
        quiz.quiz.title,
        quiz.id(),
        quiz.quiz.level.label(),
        quiz.quiz.duration_minutes,
        quiz.question_count(),
        best,
        quiz.cta()
    );
    if let Some(summary) = &quiz.quiz.summary {
        println!("{}", indented(summary));
    }
}

fn list_articles(content: &dyn ContentStore, language: &str) -> Result<()> {
    let articles = content.articles(language).context("Failed to load articles")?;
    if articles.is_empty() {
        println!("No articles.");
    }
    for article in &articles {
        println!("{} ({} min read)", article.title, article.reading_time_minutes());
        let teaser = article.summary.clone().unwrap_or_else(|| body_text(&article.blocks));
        if !teaser.is_empty() {
            println!("{}", indented(&teaser));
        }
    }
    Ok(())
}

fn list_projects(content: &dyn ContentStore, language: &str) -> Result<()> {
    let projects = content.projects(language).context("Failed to load projects")?;
    if projects.is_empty() {
        println!("No projects.");
    }
    for project in &projects {
        let minimum = match project.minimum_investment {
            Some(amount) => format!("from ${}", amount),
            None => "minimum not listed".to_string(),
        };
        println!(
            "{} - {} ({}, {}){}",
            project.name,
            project.location,
            project.category,
            minimum,
            if project.targeted_employment_area { " TEA" } else { "" }
        );
        let body = body_text(&project.blocks);
        if !body.is_empty() {
            println!("{}", indented(&body));
        }
    }
    Ok(())
}

fn indented(text: &str) -> String {
    let options = textwrap::Options::new(WRAP_WIDTH).initial_indent("    ").subsequent_indent("    ");
    textwrap::fill(text, options)
}

fn ago(at: i64, now: i64) -> String {
    let minutes = now.saturating_sub(at).max(0) / 60_000;
    match minutes {
        0 => "just now".to_string(),
        1..=59 => format!("{}m ago", minutes),
        60..=1439 => format!("{}h ago", minutes / 60),
        _ => format!("{}d ago", minutes / 1440),
    }
}
