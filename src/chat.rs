//! Natural-language questions over the journal
//!
//! The raw stream files are handed to an [`AnswerEngine`] as a read-only
//! corpus. Conversation state lives in a [`ChatSession`] value owned by the
//! caller and threaded through each `ask`.

use crate::error::JournalError;
use crate::schema::codec::RowParser;
use crate::store::JournalStore;
use crate::types::StreamKind;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use tracing::debug;
use uuid::Uuid;

/// One stream file as raw text records
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Document {
    pub stream: StreamKind,
    pub path: PathBuf,
    pub header: String,
    /// Data records exactly as they appear in the file
    pub records: Vec<String>,
}

impl Document {
    /// Split file text into its header and raw data records
    pub fn from_text(stream: StreamKind, path: PathBuf, text: &str) -> Self {
        let mut raw = RowParser::new(text).map(|record| match record {
            Ok(row) => row.raw,
            Err(e) => e.raw,
        });
        let header = raw.next().unwrap_or_default();
        Self {
            stream,
            path,
            header,
            records: raw.collect(),
        }
    }
}

/// The documents an answer engine may consult
#[derive(Debug, Clone, Default, Serialize)]
pub struct Corpus {
    documents: Vec<Document>,
}

/// A single record offered to an answer engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Passage<'a> {
    pub stream: StreamKind,
    pub header: &'a str,
    pub text: &'a str,
}

impl Corpus {
    /// Read every existing stream file; nothing is written
    pub fn from_store(store: &JournalStore) -> Result<Self, JournalError> {
        let mut documents = Vec::new();
        for stream in StreamKind::ALL {
            let path = store.path_for(stream);
            if !path.is_file() {
                continue;
            }
            let bytes = fs::read(&path)?;
            let text = String::from_utf8_lossy(&bytes);
            documents.push(Document::from_text(stream, path, &text));
        }
        debug!(documents = documents.len(), "built chat corpus");
        Ok(Self { documents })
    }

    pub fn from_documents(documents: Vec<Document>) -> Self {
        Self { documents }
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn is_empty(&self) -> bool {
        self.documents.iter().all(|d| d.records.is_empty())
    }

    /// Every record in stream order, then file order
    pub fn passages(&self) -> impl Iterator<Item = Passage<'_>> {
        self.documents.iter().flat_map(|doc| {
            doc.records.iter().map(move |text| Passage {
                stream: doc.stream,
                header: &doc.header,
                text,
            })
        })
    }
}

/// One question and its answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatTurn {
    pub asked_at: DateTime<Utc>,
    pub question: String,
    pub answer: String,
}

/// Something that can answer questions against a corpus
pub trait AnswerEngine {
    fn answer(
        &self,
        corpus: &Corpus,
        history: &[ChatTurn],
        question: &str,
    ) -> Result<String, JournalError>;
}

/// Conversation state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatSession {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    history: Vec<ChatTurn>,
}

/// A finished conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transcript {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub turns: Vec<ChatTurn>,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatSession {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            history: Vec::new(),
        }
    }

    pub fn history(&self) -> &[ChatTurn] {
        &self.history
    }

    /// Ask one question. The returned session carries the new turn on
    /// success and is unchanged on failure.
    pub fn ask(
        mut self,
        engine: &dyn AnswerEngine,
        corpus: &Corpus,
        question: &str,
    ) -> (Self, Result<String, JournalError>) {
        let question = question.trim();
        if question.is_empty() {
            return (self, Err(JournalError::Chat("question is empty".to_string())));
        }

        match engine.answer(corpus, &self.history, question) {
            Ok(answer) => {
                self.history.push(ChatTurn {
                    asked_at: Utc::now(),
                    question: question.to_string(),
                    answer: answer.clone(),
                });
                (self, Ok(answer))
            }
            Err(e) => (self, Err(e)),
        }
    }

    pub fn end(self) -> Transcript {
        Transcript {
            id: self.id,
            started_at: self.started_at,
            ended_at: Utc::now(),
            turns: self.history,
        }
    }
}

const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "any", "are", "at", "did", "do", "does", "for", "have", "how", "i", "in",
    "is", "it", "me", "my", "of", "on", "or", "the", "to", "was", "what", "when", "which", "with",
];

fn terms(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .filter(|t| !STOP_WORDS.contains(&t.as_str()))
        .collect()
}

/// Offline engine: ranks records by how many question terms they contain
#[derive(Debug, Clone)]
pub struct KeywordEngine {
    pub max_passages: usize,
}

impl Default for KeywordEngine {
    fn default() -> Self {
        Self { max_passages: 3 }
    }
}

impl AnswerEngine for KeywordEngine {
    fn answer(
        &self,
        corpus: &Corpus,
        _history: &[ChatTurn],
        question: &str,
    ) -> Result<String, JournalError> {
        if corpus.is_empty() {
            return Ok("The journal has no entries yet.".to_string());
        }

        let wanted = terms(question);
        let mut scored: Vec<(usize, Passage<'_>)> = corpus
            .passages()
            .map(|p| {
                let mut found = terms(p.text);
                found.insert(p.stream.as_str().to_string());
                (wanted.intersection(&found).count(), p)
            })
            .filter(|(score, _)| *score > 0)
            .collect();
        // stable: equal scores stay in corpus order
        scored.sort_by(|a, b| b.0.cmp(&a.0));

        if scored.is_empty() {
            return Ok("I could not find anything in the journal about that.".to_string());
        }

        let mut out = String::from("Here is what the journal shows:\n");
        for (_, passage) in scored.iter().take(self.max_passages) {
            out.push_str(&format!("- [{}] {}\n", passage.stream, passage.text));
        }
        Ok(out)
    }
}
