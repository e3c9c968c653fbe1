//! Landing programs
//!
//! A tiny rule language for learner-written landing logic. Only `altitude`
//! and `velocity` are in scope, so a program can read telemetry and pick a
//! command but can never reach anything else in the host.
//!
//! ```text
//! # brake late, then lower the gear
//! if altitude < 200 and velocity > 4 -> FIRE_THRUSTERS
//! if altitude < 100 and velocity > 1 -> DEPLOY_LANDING_GEAR
//! else -> MONITOR
//! ```
//!
//! Rules are tried top to bottom. `and` binds tighter than `or`. Command
//! names are checked when a rule fires, so a typo only fails the landing if
//! that rule is actually reached.

use std::str::FromStr;

use thiserror::Error;

use super::missions::landing::{Command, ControlError, Controller};

/// Compile-time problems, with 1-based line numbers
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProgramError {
    #[error("line {line}: unexpected character '{found}'")]
    UnexpectedChar { line: usize, found: char },
    #[error("line {line}: expected {expected}, found {found}")]
    Expected {
        line: usize,
        expected: &'static str,
        found: String,
    },
    #[error("line {line}: unknown variable '{name}' (use altitude or velocity)")]
    UnknownVariable { line: usize, name: String },
    #[error("line {line}: invalid number '{text}'")]
    InvalidNumber { line: usize, text: String },
    #[error("line {line}: rule can never run because it follows 'else'")]
    Unreachable { line: usize },
    #[error("program has no rules")]
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variable {
    Altitude,
    Velocity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

impl Comparison {
    fn holds(self, left: f32, right: f32) -> bool {
        match self {
            Comparison::Lt => left < right,
            Comparison::Le => left <= right,
            Comparison::Gt => left > right,
            Comparison::Ge => left >= right,
            Comparison::Eq => left == right,
            Comparison::Ne => left != right,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Condition {
    variable: Variable,
    comparison: Comparison,
    value: f32,
}

impl Condition {
    fn holds(&self, altitude: f32, velocity: f32) -> bool {
        let left = match self.variable {
            Variable::Altitude => altitude,
            Variable::Velocity => velocity,
        };
        self.comparison.holds(left, self.value)
    }
}

/// Disjunction of conjunctions
#[derive(Debug, Clone, PartialEq)]
struct Guard {
    any_of: Vec<Vec<Condition>>,
}

impl Guard {
    fn holds(&self, altitude: f32, velocity: f32) -> bool {
        self.any_of
            .iter()
            .any(|all| all.iter().all(|c| c.holds(altitude, velocity)))
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Rule {
    /// `None` for the `else` rule
    guard: Option<Guard>,
    command: String,
}

/// A compiled landing program
#[derive(Debug, Clone, PartialEq)]
pub struct LandingProgram {
    rules: Vec<Rule>,
}

impl LandingProgram {
    pub fn compile(source: &str) -> Result<Self, ProgramError> {
        let mut rules = Vec::new();
        let mut saw_else = false;

        for (index, raw) in source.lines().enumerate() {
            let line = index + 1;
            let text = raw.split('#').next().unwrap_or_default().trim();
            if text.is_empty() {
                continue;
            }
            if saw_else {
                return Err(ProgramError::Unreachable { line });
            }
            let rule = Parser::new(line, tokenize(line, text)?).rule()?;
            saw_else = rule.guard.is_none();
            rules.push(rule);
        }

        if rules.is_empty() {
            return Err(ProgramError::Empty);
        }
        Ok(Self { rules })
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Pick the command for the current telemetry
    pub fn evaluate(&self, altitude: f32, velocity: f32) -> Result<Command, ControlError> {
        let rule = self
            .rules
            .iter()
            .find(|rule| {
                rule.guard
                    .as_ref()
                    .is_none_or(|guard| guard.holds(altitude, velocity))
            })
            .ok_or(ControlError::NoRuleMatched { altitude, velocity })?;
        rule.command.parse()
    }
}

impl FromStr for LandingProgram {
    type Err = ProgramError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::compile(s)
    }
}

impl Controller for LandingProgram {
    fn command(&self, altitude: f32, velocity: f32) -> Result<Command, ControlError> {
        self.evaluate(altitude, velocity)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Word(String),
    Number(String),
    Compare(Comparison),
    Arrow,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Word(w) => format!("'{w}'"),
            Token::Number(n) => format!("'{n}'"),
            Token::Compare(_) => "a comparison".to_string(),
            Token::Arrow => "'->'".to_string(),
        }
    }
}

/// A digit, a decimal point or a minus sign directly followed by either
fn starts_number(c: char, next: Option<char>) -> bool {
    c.is_ascii_digit()
        || c == '.'
        || (c == '-' && next.is_some_and(|n| n.is_ascii_digit() || n == '.'))
}

fn tokenize(line: usize, text: &str) -> Result<Vec<Token>, ProgramError> {
    let chars: Vec<char> = text.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();
        match c {
            c if c.is_whitespace() => i += 1,
            c if c.is_ascii_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                tokens.push(Token::Word(chars[start..i].iter().collect()));
            }
            c if starts_number(c, next) => {
                let start = i;
                i += 1;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                tokens.push(Token::Number(chars[start..i].iter().collect()));
            }
            '-' if next == Some('>') => {
                tokens.push(Token::Arrow);
                i += 2;
            }
            '<' | '>' | '=' | '!' => {
                let (comparison, width) = match (c, next) {
                    ('<', Some('=')) => (Comparison::Le, 2),
                    ('>', Some('=')) => (Comparison::Ge, 2),
                    ('=', Some('=')) => (Comparison::Eq, 2),
                    ('!', Some('=')) => (Comparison::Ne, 2),
                    ('<', _) => (Comparison::Lt, 1),
                    ('>', _) => (Comparison::Gt, 1),
                    _ => return Err(ProgramError::UnexpectedChar { line, found: c }),
                };
                tokens.push(Token::Compare(comparison));
                i += width;
            }
            '&' if next == Some('&') => {
                tokens.push(Token::Word("and".to_string()));
                i += 2;
            }
            '|' if next == Some('|') => {
                tokens.push(Token::Word("or".to_string()));
                i += 2;
            }
            other => return Err(ProgramError::UnexpectedChar { line, found: other }),
        }
    }

    Ok(tokens)
}

struct Parser {
    line: usize,
    tokens: std::iter::Peekable<std::vec::IntoIter<Token>>,
}

impl Parser {
    fn new(line: usize, tokens: Vec<Token>) -> Self {
        Self {
            line,
            tokens: tokens.into_iter().peekable(),
        }
    }

    fn expected(&self, expected: &'static str, found: Option<&Token>) -> ProgramError {
        ProgramError::Expected {
            line: self.line,
            expected,
            found: found.map_or_else(|| "end of line".to_string(), Token::describe),
        }
    }

    fn keyword(&mut self, word: &str) -> bool {
        if matches!(self.tokens.peek(), Some(Token::Word(w)) if w == word) {
            self.tokens.next();
            true
        } else {
            false
        }
    }

    fn rule(mut self) -> Result<Rule, ProgramError> {
        let guard = if self.keyword("if") {
            Some(self.guard()?)
        } else if self.keyword("else") {
            None
        } else {
            let found = self.tokens.next();
            return Err(self.expected("'if' or 'else'", found.as_ref()));
        };

        match self.tokens.next() {
            Some(Token::Arrow) => {}
            other => return Err(self.expected("'->'", other.as_ref())),
        }
        let command = match self.tokens.next() {
            Some(Token::Word(command)) => command,
            other => return Err(self.expected("a command", other.as_ref())),
        };
        if let Some(extra) = self.tokens.next() {
            return Err(self.expected("end of line", Some(&extra)));
        }

        Ok(Rule { guard, command })
    }

    fn guard(&mut self) -> Result<Guard, ProgramError> {
        let mut any_of = vec![self.conjunction()?];
        while self.keyword("or") {
            any_of.push(self.conjunction()?);
        }
        Ok(Guard { any_of })
    }

    fn conjunction(&mut self) -> Result<Vec<Condition>, ProgramError> {
        let mut all = vec![self.condition()?];
        while self.keyword("and") {
            all.push(self.condition()?);
        }
        Ok(all)
    }

    fn condition(&mut self) -> Result<Condition, ProgramError> {
        let variable = match self.tokens.next() {
            Some(Token::Word(name)) if name == "altitude" => Variable::Altitude,
            Some(Token::Word(name)) if name == "velocity" => Variable::Velocity,
            Some(Token::Word(name)) => {
                return Err(ProgramError::UnknownVariable {
                    line: self.line,
                    name,
                });
            }
            other => return Err(self.expected("altitude or velocity", other.as_ref())),
        };
        let comparison = match self.tokens.next() {
            Some(Token::Compare(comparison)) => comparison,
            other => return Err(self.expected("a comparison", other.as_ref())),
        };
        let value = match self.tokens.next() {
            Some(Token::Number(text)) => match text.parse::<f32>() {
                Ok(value) => value,
                Err(_) => {
                    return Err(ProgramError::InvalidNumber {
                        line: self.line,
                        text,
                    });
                }
            },
            other => return Err(self.expected("a number", other.as_ref())),
        };
        Ok(Condition {
            variable,
            comparison,
            value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::missions::landing::LandingControl;
    use crate::sim::state::{Failure, Outcome};
    use crate::sim::tick::Episode;

    const BRAKING: &str = "
        # brake late, then lower the gear
        if altitude < 200 and velocity > 4 -> FIRE_THRUSTERS
        if altitude < 100 and velocity > 1 -> DEPLOY_LANDING_GEAR
        else -> MONITOR
    ";

    fn fly(program: LandingProgram) -> Episode<LandingControl> {
        let mut episode = Episode::new(LandingControl::with_controller(program), 1);
        for _ in 0..10_000 {
            if episode.tick_default(None).is_some() {
                break;
            }
        }
        episode
    }

    #[test]
    fn test_compile_and_evaluate() {
        let program = LandingProgram::compile(BRAKING).unwrap();
        assert_eq!(program.rule_count(), 3);
        assert_eq!(program.evaluate(150.0, 10.0), Ok(Command::FireThrusters));
        assert_eq!(program.evaluate(50.0, 3.0), Ok(Command::DeployLandingGear));
        assert_eq!(program.evaluate(500.0, 30.0), Ok(Command::Monitor));
    }

    #[test]
    fn test_and_binds_tighter_than_or() {
        let source = "if altitude > 900 or altitude < 100 and velocity > 5 -> FIRE_THRUSTERS\n\
                      else -> MONITOR";
        let program: LandingProgram = source.parse().unwrap();
        assert_eq!(program.evaluate(950.0, 0.0), Ok(Command::FireThrusters));
        assert_eq!(program.evaluate(50.0, 10.0), Ok(Command::FireThrusters));
        assert_eq!(program.evaluate(50.0, 1.0), Ok(Command::Monitor));
        assert_eq!(program.evaluate(500.0, 10.0), Ok(Command::Monitor));
    }

    #[test]
    fn test_symbol_operators() {
        let source = "if altitude<=100&&velocity!=0 -> DEPLOY_LANDING_GEAR\nelse -> MONITOR";
        let program = LandingProgram::compile(source).unwrap();
        assert_eq!(program.evaluate(100.0, 2.0), Ok(Command::DeployLandingGear));
        assert_eq!(program.evaluate(100.0, 0.0), Ok(Command::Monitor));
    }

    #[test]
    fn test_parse_errors_carry_line_numbers() {
        assert_eq!(
            LandingProgram::compile("if altitude < 10 -> MONITOR\nif fuel < 5 -> MONITOR"),
            Err(ProgramError::UnknownVariable {
                line: 2,
                name: "fuel".into()
            })
        );
        assert!(matches!(
            LandingProgram::compile("if altitude < -> MONITOR"),
            Err(ProgramError::Expected { line: 1, expected: "a number", .. })
        ));
        assert!(matches!(
            LandingProgram::compile("if altitude < 1.2.3 -> MONITOR"),
            Err(ProgramError::InvalidNumber { line: 1, .. })
        ));
        assert_eq!(
            LandingProgram::compile("else -> MONITOR\nif altitude < 5 -> MONITOR"),
            Err(ProgramError::Unreachable { line: 2 })
        );
        assert_eq!(
            LandingProgram::compile("if altitude @ 5 -> MONITOR"),
            Err(ProgramError::UnexpectedChar { line: 1, found: '@' })
        );
        assert_eq!(LandingProgram::compile("  # only a comment"), Err(ProgramError::Empty));
    }

    #[test]
    fn test_program_lands() {
        let episode = fly(LandingProgram::compile(BRAKING).unwrap());
        assert_eq!(episode.outcome(), &Outcome::Succeeded);
    }

    #[test]
    fn test_unknown_command_fails_when_reached() {
        let program = LandingProgram::compile(
            "if altitude < 300 -> LAUNCH_ROCKET\nelse -> MONITOR",
        )
        .unwrap();
        let episode = fly(program);
        assert_eq!(
            episode.outcome(),
            &Outcome::Failed(Failure::ControlError(ControlError::UnknownCommand(
                "LAUNCH_ROCKET".into()
            )))
        );
        assert!(episode.state().altitude < 300.0);
    }

    #[test]
    fn test_no_matching_rule_fails() {
        let program = LandingProgram::compile("if altitude > 400 -> MONITOR").unwrap();
        let episode = fly(program);
        assert!(matches!(
            episode.outcome(),
            Outcome::Failed(Failure::ControlError(ControlError::NoRuleMatched { .. }))
        ));
    }
}
