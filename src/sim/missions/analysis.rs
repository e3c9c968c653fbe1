//! Planetary analysis
//!
//! A short multiple-choice assessment. Answers can be changed freely until
//! submission; submitting with gaps is refused.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::sim::state::{Failure, Rejection, SimRng, TickEvent, Verdict};
use crate::sim::tick::{Mission, Step};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Question id -> correct option
    pub answer_key: BTreeMap<String, String>,
    pub pass_mark: u32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        let answer_key = [
            ("atmosphere", "b"),
            ("temperature", "c"),
            ("water", "b"),
            ("life", "b"),
        ]
        .into_iter()
        .map(|(q, a)| (q.to_string(), a.to_string()))
        .collect();
        Self {
            answer_key,
            pass_mark: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnalysisControl {
    Answer { question: String, option: String },
    Submit,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisState {
    pub answers: BTreeMap<String, String>,
    /// Filled in on submission
    pub correct: Option<u32>,
}

#[derive(Debug, Clone, Default)]
pub struct PlanetaryAnalysis {
    pub config: AnalysisConfig,
}

impl PlanetaryAnalysis {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    fn grade(&self, answers: &BTreeMap<String, String>) -> u32 {
        self.config
            .answer_key
            .iter()
            .filter(|(question, correct)| answers.get(*question) == Some(*correct))
            .count() as u32
    }
}

impl Mission for PlanetaryAnalysis {
    type State = AnalysisState;
    type Control = AnalysisControl;

    fn name(&self) -> &'static str {
        "planetary-analysis"
    }

    fn initial_state(&self, _rng: &mut SimRng) -> AnalysisState {
        AnalysisState::default()
    }

    fn step(
        &self,
        state: &AnalysisState,
        control: Option<&AnalysisControl>,
        _dt: f32,
        _rng: &mut SimRng,
    ) -> Step<AnalysisState> {
        let mut next = state.clone();

        match control {
            None => Step::new(next),
            Some(AnalysisControl::Answer { question, option }) => {
                if !self.config.answer_key.contains_key(question) {
                    return Step::new(next)
                        .with_events(vec![TickEvent::ControlRejected(Rejection::NotApplicable)]);
                }
                next.answers.insert(question.clone(), option.clone());
                Step::new(next).with_events(vec![TickEvent::ControlApplied])
            }
            Some(AnalysisControl::Submit) => {
                let required = self.config.answer_key.len();
                let answered = self
                    .config
                    .answer_key
                    .keys()
                    .filter(|q| next.answers.contains_key(*q))
                    .count();
                if answered < required {
                    return Step::new(next).with_events(vec![TickEvent::ControlRejected(
                        Rejection::Incomplete { answered, required },
                    )]);
                }

                let correct = self.grade(&next.answers);
                next.correct = Some(correct);
                let verdict = if correct >= self.config.pass_mark {
                    Verdict::Succeed
                } else {
                    Verdict::Fail(Failure::AnalysisBelowPassMark {
                        correct,
                        total: required as u32,
                        required: self.config.pass_mark,
                    })
                };
                Step::new(next)
                    .with_verdict(verdict)
                    .with_events(vec![TickEvent::ControlApplied])
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::Outcome;
    use crate::sim::tick::Episode;

    fn answer(question: &str, option: &str) -> AnalysisControl {
        AnalysisControl::Answer {
            question: question.into(),
            option: option.into(),
        }
    }

    fn submit_answers(answers: &[(&str, &str)]) -> Episode<PlanetaryAnalysis> {
        let mut episode = Episode::new(PlanetaryAnalysis::default(), 1);
        for (q, a) in answers {
            episode.tick(Some(&answer(q, a)), 1.0);
        }
        episode.tick(Some(&AnalysisControl::Submit), 1.0);
        episode
    }

    #[test]
    fn test_three_correct_passes() {
        let episode = submit_answers(&[
            ("atmosphere", "b"),
            ("temperature", "c"),
            ("water", "b"),
            ("life", "a"),
        ]);
        assert_eq!(episode.outcome(), &Outcome::Succeeded);
        assert_eq!(episode.state().correct, Some(3));
    }

    #[test]
    fn test_two_correct_fails_with_score() {
        let episode = submit_answers(&[
            ("atmosphere", "b"),
            ("temperature", "a"),
            ("water", "b"),
            ("life", "a"),
        ]);
        let failure = episode.outcome().failure().cloned();
        assert_eq!(
            failure,
            Some(Failure::AnalysisBelowPassMark {
                correct: 2,
                total: 4,
                required: 3
            })
        );
        assert!(failure.is_some_and(|f| f.to_string().contains("2 out of 4")));
    }

    #[test]
    fn test_incomplete_submission_rejected() {
        let episode = submit_answers(&[("atmosphere", "b"), ("water", "b")]);
        assert_eq!(episode.outcome(), &Outcome::Running);
        assert_eq!(
            episode.last_events(),
            &[TickEvent::ControlRejected(Rejection::Incomplete {
                answered: 2,
                required: 4
            })]
        );
    }

    #[test]
    fn test_answers_can_change_before_submit() {
        let episode = submit_answers(&[
            ("atmosphere", "a"),
            ("atmosphere", "b"),
            ("temperature", "c"),
            ("water", "b"),
            ("life", "b"),
        ]);
        assert_eq!(episode.state().correct, Some(4));
    }

    #[test]
    fn test_unknown_question_rejected() {
        let mut episode = Episode::new(PlanetaryAnalysis::default(), 1);
        episode.tick(Some(&answer("gravity", "a")), 1.0);
        assert!(episode.state().answers.is_empty());
        assert_eq!(
            episode.last_events(),
            &[TickEvent::ControlRejected(Rejection::NotApplicable)]
        );
    }
}
