//! Subject help
//!
//! The host may plug in a remote assistant. Whatever happens to it, the
//! learner still gets an answer: failures fall back to canned replies.

use log::warn;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HelpError {
    #[error("help service unavailable")]
    Unavailable,
    #[error("help service error: {0}")]
    Service(String),
}

/// Remote question answering
pub trait HelpSource {
    fn ask(&self, subject: &str, question: &str) -> Result<String, HelpError>;
}

/// Source used when nothing is configured
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHelpSource;

impl HelpSource for NoHelpSource {
    fn ask(&self, _subject: &str, _question: &str) -> Result<String, HelpError> {
        Err(HelpError::Unavailable)
    }
}

pub struct HelpDesk {
    source: Box<dyn HelpSource>,
}

impl Default for HelpDesk {
    fn default() -> Self {
        Self::new(NoHelpSource)
    }
}

impl HelpDesk {
    pub fn new(source: impl HelpSource + 'static) -> Self {
        Self {
            source: Box::new(source),
        }
    }

    /// Answer a question about a subject. Never fails.
    pub fn ask_help(&self, subject: &str, question: &str) -> String {
        match self.source.ask(subject, question) {
            Ok(answer) if !answer.trim().is_empty() => answer,
            Ok(_) => {
                warn!("Empty answer for {subject}, using fallback");
                canned_answer(question).to_string()
            }
            Err(HelpError::Unavailable) => canned_answer(question).to_string(),
            Err(e) => {
                warn!("{e}, using fallback");
                canned_answer(question).to_string()
            }
        }
    }
}

/// Offline reply chosen by keyword
pub fn canned_answer(question: &str) -> &'static str {
    let question = question.to_lowercase();
    if question.contains("help") {
        "I'm here to help! What specific question do you have about space exploration?"
    } else if question.contains("gravity") {
        "Gravity is a fundamental force that attracts objects with mass toward each other. \
         In space, understanding gravitational effects is crucial for navigation and \
         orbital mechanics."
    } else {
        "I'm Icarus, your AI assistant. I can help you understand space concepts and assist \
         with your mission. What would you like to know?"
    }
}
