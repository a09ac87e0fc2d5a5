//! Question decks: data model, TOML parsing, and validation.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::tracker::DrillItem;

/// A single flashcard question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Unique identifier within the deck.
    pub id: String,
    /// Text shown to the learner.
    pub prompt: String,
    /// The expected answer.
    pub answer: String,
    /// Multiple-choice options. Empty for free-text questions.
    #[serde(default)]
    pub choices: Vec<String>,
    /// Shown after a wrong answer.
    #[serde(default)]
    pub explanation: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Question {
    /// Whether `response` answers this question.
    ///
    /// Comparison ignores surrounding whitespace and case. For
    /// multiple-choice questions a 1-based choice number is accepted too.
    pub fn is_correct(&self, response: &str) -> bool {
        let response = response.trim();
        if !self.choices.is_empty() {
            if let Ok(n) = response.parse::<usize>() {
                if let Some(choice) = n.checked_sub(1).and_then(|i| self.choices.get(i)) {
                    return answers_match(choice, &self.answer);
                }
            }
        }
        answers_match(response, &self.answer)
    }
}

impl DrillItem for Question {
    fn item_id(&self) -> &str {
        &self.id
    }
}

fn answers_match(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

/// A collection of questions drilled together. The deck id doubles as the
/// storage namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deck {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub questions: Vec<Question>,
}

impl Deck {
    pub fn question(&self, id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }

    /// Keep only questions carrying at least one of `tags`.
    pub fn retain_tags(&mut self, tags: &[&str]) {
        self.questions
            .retain(|q| q.tags.iter().any(|t| tags.contains(&t.as_str())));
    }
}

/// Intermediate TOML structure for deck files.
#[derive(Debug, Deserialize)]
struct TomlDeckFile {
    deck: TomlDeckHeader,
    #[serde(default)]
    questions: Vec<Question>,
}

#[derive(Debug, Deserialize)]
struct TomlDeckHeader {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
}

/// Parse a single TOML deck file.
pub fn parse_deck(path: &Path) -> Result<Deck> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read deck file: {}", path.display()))?;

    parse_deck_str(&content, path)
}

/// Parse deck TOML text. `source_path` is only used in error messages.
pub fn parse_deck_str(content: &str, source_path: &Path) -> Result<Deck> {
    let parsed: TomlDeckFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    anyhow::ensure!(
        !parsed.deck.id.trim().is_empty(),
        "deck id is empty: {}",
        source_path.display()
    );

    Ok(Deck {
        id: parsed.deck.id,
        name: parsed.deck.name,
        description: parsed.deck.description,
        questions: parsed.questions,
    })
}

/// Recursively load every `.toml` deck under `dir`. Files that fail to parse
/// are skipped with a warning.
pub fn load_deck_directory(dir: &Path) -> Result<Vec<Deck>> {
    let mut decks = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut paths: Vec<_> = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<_>>()?;
    paths.sort();

    for path in paths {
        if path.is_dir() {
            decks.extend(load_deck_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_deck(&path) {
                Ok(deck) => decks.push(deck),
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", path.display(), e);
                }
            }
        }
    }

    Ok(decks)
}

/// A warning from deck validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The question ID (if applicable).
    pub question_id: Option<String>,
    pub message: String,
}

/// Validate a deck for common issues.
pub fn validate_deck(deck: &Deck) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if deck.questions.is_empty() {
        warnings.push(ValidationWarning {
            question_id: None,
            message: "deck has no questions".into(),
        });
    }

    let mut seen_ids = HashSet::new();
    for q in &deck.questions {
        if !seen_ids.insert(&q.id) {
            warnings.push(ValidationWarning {
                question_id: Some(q.id.clone()),
                message: format!("duplicate question ID: {}", q.id),
            });
        }
    }

    for q in &deck.questions {
        let mut warn = |message: &str| {
            warnings.push(ValidationWarning {
                question_id: Some(q.id.clone()),
                message: message.into(),
            })
        };
        if q.prompt.trim().is_empty() {
            warn("prompt is empty");
        }
        if q.answer.trim().is_empty() {
            warn("answer is empty");
        } else if !q.choices.is_empty() && !q.choices.iter().any(|c| answers_match(c, &q.answer))
        {
            warn("answer is not one of the choices");
        }
    }

    warnings
}
