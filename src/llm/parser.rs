//! Recover plan JSON from raw model output
//!
//! Model output is usually "almost JSON": prose around the object, or an
//! object cut off at the timeout. Recovery runs in order:
//!
//! 1. Strict parse of the whole text.
//! 2. Scan from each `{` for an object whose top-level `"acciones"` is an
//!    array, tracking open containers with the lexer. The first candidate
//!    that scans cleanly wins.
//! 3. A truncated candidate is cut back to its last complete value and the
//!    open containers are closed in nesting order. The candidate counts as
//!    truncated when input ends inside it, or when the model carries on in
//!    prose on a new line without closing it.
//! 4. A missing `"explicacion"` is spliced in with the default text.
//! 5. Strict parse of the healed text.
//!
//! Recovery never bypasses validation; the result still has to pass the
//! plan validator.

use crate::command::plan::DEFAULT_EXPLANATION;
use crate::llm::lexer::{Lexer, Token, TokenKind};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    #[error("no plan object found in model output")]
    NoPlanObject,

    #[error("plan object could not be repaired: {reason}")]
    Unrepairable { reason: String },
}

/// A recovered object and what was done to get it
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub value: serde_json::Value,
    /// Closing characters appended to a truncated object
    pub appended: String,
    /// The default explanation had to be spliced in
    pub default_explanation: bool,
    /// The whole input parsed as-is
    pub verbatim: bool,
}

/// Recover the plan object, discarding repair details
pub fn extract_plan_json(raw: &str) -> Result<serde_json::Value, ExtractError> {
    extract(raw).map(|e| e.value)
}

/// Recover the plan object from raw model output
pub fn extract(raw: &str) -> Result<Extraction, ExtractError> {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(raw) {
        return Ok(Extraction {
            value,
            appended: String::new(),
            default_explanation: false,
            verbatim: true,
        });
    }

    if !raw.contains("\"acciones\"") {
        return Err(ExtractError::NoPlanObject);
    }

    let mut last_failure: Option<String> = None;
    for (start, _) in raw.match_indices('{') {
        match scan_candidate(raw, start) {
            Ok(candidate) => return heal(raw, start, candidate),
            Err(CandidateError::NotAPlan) => {}
            Err(e) => last_failure = Some(e.to_string()),
        }
    }

    match last_failure {
        Some(reason) => Err(ExtractError::Unrepairable { reason }),
        None => Err(ExtractError::NoPlanObject),
    }
}

fn heal(raw: &str, start: usize, candidate: Candidate) -> Result<Extraction, ExtractError> {
    let mut text = String::with_capacity(candidate.end - start + candidate.closers.len() + 48);
    text.push_str(&raw[start..candidate.end]);
    text.push_str(&candidate.closers);

    let default_explanation = !candidate.has_explanation;
    if default_explanation {
        // The root object's closing brace is always the last character
        let at = text.len() - 1;
        text.insert_str(
            at,
            &format!(", \"explicacion\": {}", serde_json::Value::from(DEFAULT_EXPLANATION)),
        );
    }

    if !candidate.closers.is_empty() {
        tracing::debug!("Healed truncated plan by appending '{}'", candidate.closers);
    }
    if default_explanation {
        tracing::debug!("Plan had no explicacion; using default");
    }

    let value = serde_json::from_str(&text).map_err(|e| ExtractError::Unrepairable {
        reason: e.to_string(),
    })?;
    Ok(Extraction {
        value,
        appended: candidate.closers,
        default_explanation,
        verbatim: false,
    })
}

#[derive(Debug, Error)]
enum CandidateError {
    #[error("object has no 'acciones' array")]
    NotAPlan,
    #[error("'acciones' is not an array")]
    ActionsNotArray,
    #[error("unexpected '{text}' at byte {offset}")]
    Syntax { offset: usize, text: String },
}

/// Where a usable candidate ends and how to close it
#[derive(Debug)]
struct Candidate {
    end: usize,
    closers: String,
    has_explanation: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Container {
    Object,
    Array,
}

impl Container {
    fn closer(self) -> char {
        match self {
            Container::Object => '}',
            Container::Array => ']',
        }
    }
}

/// What the current container accepts next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expect {
    KeyOrEnd,
    Key,
    Colon,
    Value,
    ValueOrEnd,
    CommaOrEnd,
}

#[derive(Debug, Clone, Copy)]
struct Frame {
    container: Container,
    expect: Expect,
}

/// A prefix that becomes valid JSON once `closers` is appended
#[derive(Debug, Clone)]
struct Checkpoint {
    end: usize,
    closers: String,
    has_explanation: bool,
    has_actions: bool,
}

enum Step {
    Continue,
    /// The root object closed at this byte offset
    Closed(usize),
}

struct Scanner<'a> {
    src: &'a str,
    frames: Vec<Frame>,
    /// Key whose value is being read in the root object
    root_key: Option<String>,
    has_explanation: bool,
    has_actions: bool,
    checkpoint: Option<Checkpoint>,
}

fn scan_candidate(src: &str, start: usize) -> Result<Candidate, CandidateError> {
    let mut tokens = Lexer::starting_at(src, start);
    let mut scanner = Scanner {
        src,
        frames: Vec::new(),
        root_key: None,
        has_explanation: false,
        has_actions: false,
        checkpoint: None,
    };

    // The first token is the `{` at `start`
    if let Some(open) = tokens.next() {
        scanner.open(Container::Object, open.end);
    }

    for token in tokens {
        match scanner.step(token) {
            Ok(Step::Continue) => {}
            Ok(Step::Closed(end)) => {
                if !scanner.has_actions {
                    return Err(CandidateError::NotAPlan);
                }
                return Ok(Candidate {
                    end,
                    closers: String::new(),
                    has_explanation: scanner.has_explanation,
                });
            }
            Err(e @ CandidateError::Syntax { .. }) => {
                if !scanner.left_open_before(token) {
                    return Err(e);
                }
                tracing::debug!("Plan object left open before byte {}", token.start);
                break;
            }
            Err(e) => return Err(e),
        }
    }

    // The object never closed
    match scanner.checkpoint {
        Some(cp) if cp.has_actions => Ok(Candidate {
            end: cp.end,
            closers: cp.closers,
            has_explanation: cp.has_explanation,
        }),
        _ => Err(CandidateError::NotAPlan),
    }
}

/// Tokens that may simply have been interrupted by the end of input
fn is_cut_short(token: Token) -> bool {
    matches!(
        token.kind,
        TokenKind::Str { terminated: false } | TokenKind::Literal
    )
}

impl<'a> Scanner<'a> {
    /// Whether `token` lies past the end of an object that was never closed
    ///
    /// Either the input stops inside `token`, or the model moved on to a new
    /// line after the last complete value of a plan.
    fn left_open_before(&self, token: Token) -> bool {
        if is_cut_short(token) && self.src[token.end..].trim().is_empty() {
            return true;
        }
        match &self.checkpoint {
            Some(cp) if cp.has_actions => self.src[cp.end..token.start].contains('\n'),
            _ => false,
        }
    }

    fn syntax(&self, token: Token) -> CandidateError {
        CandidateError::Syntax {
            offset: token.start,
            text: token.text(self.src).chars().take(20).collect(),
        }
    }

    fn save_checkpoint(&mut self, end: usize) {
        self.checkpoint = Some(Checkpoint {
            end,
            closers: self.frames.iter().rev().map(|f| f.container.closer()).collect(),
            has_explanation: self.has_explanation,
            has_actions: self.has_actions,
        });
    }

    fn open(&mut self, container: Container, end: usize) {
        let expect = match container {
            Container::Object => Expect::KeyOrEnd,
            Container::Array => Expect::ValueOrEnd,
        };
        self.frames.push(Frame { container, expect });
        self.save_checkpoint(end);
    }

    /// A value finished in the current container
    fn value_done(&mut self, end: usize) {
        if self.frames.len() == 1 {
            if self.root_key.as_deref() == Some("explicacion") {
                self.has_explanation = true;
            }
            self.root_key = None;
        }
        if let Some(frame) = self.frames.last_mut() {
            frame.expect = Expect::CommaOrEnd;
        }
        self.save_checkpoint(end);
    }

    fn close(&mut self, token: Token) -> Step {
        self.frames.pop();
        if self.frames.is_empty() {
            return Step::Closed(token.end);
        }
        self.value_done(token.end);
        Step::Continue
    }

    fn begin_value(&mut self, token: Token) -> Result<Step, CandidateError> {
        if self.frames.len() == 1 && self.root_key.as_deref() == Some("acciones") {
            if token.kind != TokenKind::LBracket {
                return Err(CandidateError::ActionsNotArray);
            }
            self.has_actions = true;
        }

        if let Some(frame) = self.frames.last_mut() {
            frame.expect = Expect::CommaOrEnd;
        }

        match token.kind {
            TokenKind::LBrace => self.open(Container::Object, token.end),
            TokenKind::LBracket => self.open(Container::Array, token.end),
            TokenKind::Str { terminated: true } => {
                if serde_json::from_str::<String>(token.text(self.src)).is_err() {
                    return Err(self.syntax(token));
                }
                self.value_done(token.end);
            }
            TokenKind::Literal => {
                match serde_json::from_str::<serde_json::Value>(token.text(self.src)) {
                    Ok(v) if !v.is_object() && !v.is_array() => self.value_done(token.end),
                    _ => return Err(self.syntax(token)),
                }
            }
            _ => return Err(self.syntax(token)),
        }
        Ok(Step::Continue)
    }

    fn step(&mut self, token: Token) -> Result<Step, CandidateError> {
        let frame = match self.frames.last() {
            Some(frame) => *frame,
            None => return Err(self.syntax(token)),
        };

        use Container::*;
        use Expect::*;
        match (frame.container, frame.expect, token.kind) {
            (Object, KeyOrEnd | Key, TokenKind::Str { terminated: true }) => {
                let key: String = serde_json::from_str(token.text(self.src))
                    .map_err(|_| self.syntax(token))?;
                if self.frames.len() == 1 {
                    self.root_key = Some(key);
                }
                self.set_expect(Colon);
                Ok(Step::Continue)
            }
            (Object, KeyOrEnd, TokenKind::RBrace) => Ok(self.close(token)),
            (Object, Colon, TokenKind::Colon) => {
                self.set_expect(Value);
                Ok(Step::Continue)
            }
            (Object, Value, _) => self.begin_value(token),
            (Object, CommaOrEnd, TokenKind::Comma) => {
                self.set_expect(Key);
                Ok(Step::Continue)
            }
            (Object, CommaOrEnd, TokenKind::RBrace) => Ok(self.close(token)),
            (Array, ValueOrEnd, TokenKind::RBracket) => Ok(self.close(token)),
            (Array, ValueOrEnd | Value, _) => self.begin_value(token),
            (Array, CommaOrEnd, TokenKind::Comma) => {
                self.set_expect(Value);
                Ok(Step::Continue)
            }
            (Array, CommaOrEnd, TokenKind::RBracket) => Ok(self.close(token)),
            _ => Err(self.syntax(token)),
        }
    }

    fn set_expect(&mut self, expect: Expect) {
        if let Some(frame) = self.frames.last_mut() {
            frame.expect = expect;
        }
    }
}
