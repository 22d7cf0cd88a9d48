//! Emotion tokenizer: splits dialogue text into text runs and emotion markers.

use crate::error::ConfigError;
use crate::types::{DialogueInput, EmotionKind, Token};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// `[` + keyword + `]`, keyword starting with a letter
static MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[[A-Za-z][A-Za-z0-9_-]*\]").expect("marker pattern should compile")
});

/// Marker keywords recognized as emotion events.
///
/// Keys are lowercase; lookup is case-insensitive.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Vocabulary(BTreeMap<String, EmotionKind>);

impl Default for Vocabulary {
    fn default() -> Self {
        Self(
            EmotionKind::ALL
                .into_iter()
                .map(|kind| (kind.keyword().to_string(), kind))
                .collect(),
        )
    }
}

impl Vocabulary {
    /// Empty vocabulary; every marker is unknown.
    pub fn empty() -> Self {
        Self(BTreeMap::new())
    }

    /// Add or replace a keyword.
    pub fn with(mut self, keyword: impl Into<String>, kind: EmotionKind) -> Self {
        self.0.insert(keyword.into().to_ascii_lowercase(), kind);
        self
    }

    pub fn lookup(&self, keyword: &str) -> Option<EmotionKind> {
        self.0.get(&keyword.to_ascii_lowercase()).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, EmotionKind)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let valid = |k: &str| {
            let mut chars = k.chars();
            chars.next().is_some_and(|c| c.is_ascii_lowercase())
                && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
        };

        match self.0.keys().find(|k| !valid(k)) {
            Some(k) => Err(ConfigError::InvalidMarkerKeyword(k.clone())),
            None => Ok(()),
        }
    }
}

/// What to do with a well-formed marker whose keyword is not in the vocabulary.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownMarkerPolicy {
    /// Keep the bracket text as its own text token
    #[default]
    Literal,
    /// Treat it as a neutral emotion event
    Neutral,
}

/// Dialogue together with its token sequence.
#[derive(Clone, Debug, PartialEq)]
pub struct TokenizedDialogue {
    pub input: DialogueInput,
    pub tokens: Vec<Token>,
}

/// Emotion marker tokenizer.
#[derive(Clone, Debug, Default)]
pub struct Tokenizer {
    vocabulary: Vocabulary,
    unknown: UnknownMarkerPolicy,
}

impl Tokenizer {
    pub fn new(vocabulary: Vocabulary, unknown: UnknownMarkerPolicy) -> Self {
        Self {
            vocabulary,
            unknown,
        }
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// Split raw text into ordered text and event tokens.
    ///
    /// Total: never fails. Adjacent text tokens are not merged so marker
    /// positions stay traceable; an unknown marker kept as literal text is
    /// its own token.
    pub fn tokenize(&self, raw_text: &str) -> Vec<Token> {
        let mut tokens = Vec::new();
        let mut cursor = 0;

        for m in MARKER.find_iter(raw_text) {
            if m.start() > cursor {
                tokens.push(Token::text(&raw_text[cursor..m.start()]));
            }
            cursor = m.end();

            let keyword = &m.as_str()[1..m.as_str().len() - 1];

            let token = match (self.vocabulary.lookup(keyword), self.unknown) {
                (Some(kind), _) => Token::event(kind, keyword),
                (None, UnknownMarkerPolicy::Neutral) => {
                    tracing::debug!(marker = m.as_str(), "unknown marker treated as neutral");
                    Token::event(EmotionKind::Neutral, keyword)
                }
                (None, UnknownMarkerPolicy::Literal) => {
                    tracing::debug!(marker = m.as_str(), "unknown marker kept as text");
                    Token::text(m.as_str())
                }
            };

            tokens.push(token);
        }

        if cursor < raw_text.len() {
            tokens.push(Token::text(&raw_text[cursor..]));
        }

        tokens
    }

    /// Tokenize every dialogue of a conversation.
    pub fn tokenize_all(&self, dialogues: &[DialogueInput]) -> Vec<TokenizedDialogue> {
        dialogues
            .iter()
            .map(|input| TokenizedDialogue {
                tokens: self.tokenize(&input.raw_text),
                input: input.clone(),
            })
            .collect()
    }
}

/// Tokenize with the default vocabulary and literal handling of unknown markers.
pub fn tokenize(raw_text: &str) -> Vec<Token> {
    Tokenizer::default().tokenize(raw_text)
}

/// Concatenate the text tokens, dropping events.
pub fn plain_text(tokens: &[Token]) -> String {
    tokens.iter().filter_map(Token::as_text).collect()
}
