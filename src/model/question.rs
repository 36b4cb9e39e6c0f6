//! Named pattern sets used by the legacy, name-string driven search.
//!
//! A question declaration line looks like
//! ```text
//! QS C-Vowel { "-a+","-i+","-u+" }
//! ```
//! and is parsed by [Question::parse_declaration].

use crate::parser::ParsingErrorType;

/// Index of a question in the question list of a model type.
pub type QuestionIndex = usize;

// =#========================================================================#=
// QUESTION
// =#========================================================================$=
/// A named, ordered, non-empty list of string patterns.
///
/// A unit name matches the question if any pattern occurs in it as a substring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    name: String,
    patterns: Vec<String>,
}

impl Question {
    /// Creates a question from a name and its patterns.
    pub fn new<S: Into<String>>(name: S, patterns: Vec<String>) -> Self {
        Question {
            name: name.into(),
            patterns,
        }
    }

    /// Parses a single question declaration line.
    ///
    /// Tokens are separated by whitespace:
    /// - a token containing a comma is a list of `"..."` patterns,
    ///   each appended individually,
    /// - a token containing a quote is a single `"..."` pattern,
    /// - any other token longer than one character is the name
    ///   (so the leading `QS` keyword is replaced by the actual name),
    /// - single characters such as `{` and `}` are ignored.
    ///
    /// # Errors
    /// [ParsingErrorType::InvalidQuestion] if a pattern is not quoted,
    /// or if the line yields no name or no pattern.
    ///
    /// # Example
    /// ```
    /// use htstree::model::Question;
    ///
    /// let q = Question::parse_declaration(r#"QS Q-gender { "male","m_" }"#).unwrap();
    /// assert_eq!(q.name(), "Q-gender");
    /// assert_eq!(q.patterns(), &["male".to_string(), "m_".to_string()]);
    /// ```
    pub fn parse_declaration(line: &str) -> Result<Question, ParsingErrorType> {
        let mut name = None;
        let mut patterns = Vec::new();

        for token in line.split_whitespace() {
            if token.len() <= 1 {
                continue;
            }

            if token.find(',').is_some_and(|i| i > 0) {
                for piece in token.split(',').filter(|p| !p.is_empty()) {
                    patterns.push(unquote(piece)?.to_string());
                }
            } else if token.contains('"') {
                patterns.push(unquote(token)?.to_string());
            } else {
                name = Some(token);
            }
        }

        let name = name.ok_or_else(|| {
            ParsingErrorType::InvalidQuestion(format!("no question name in `{}`", line.trim()))
        })?;
        if patterns.is_empty() {
            return Err(ParsingErrorType::InvalidQuestion(format!(
                "question `{name}` has no patterns"
            )));
        }

        Ok(Question::new(name, patterns))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Patterns in declaration order.
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn num_patterns(&self) -> usize {
        self.patterns.len()
    }

    /// Returns whether any pattern occurs in `unit_name`.
    pub fn matches(&self, unit_name: &str) -> bool {
        self.patterns.iter().any(|p| unit_name.contains(p.as_str()))
    }
}

/// Returns the text between the first and the last double quote of `piece`.
fn unquote(piece: &str) -> Result<&str, ParsingErrorType> {
    match (piece.find('"'), piece.rfind('"')) {
        (Some(start), Some(end)) if end > start => Ok(&piece[start + 1..end]),
        _ => Err(ParsingErrorType::InvalidQuestion(format!(
            "pattern `{piece}` is not enclosed in double quotes"
        ))),
    }
}

/// Finds the index of the question called `name`.
pub fn find_question(questions: &[Question], name: &str) -> Option<QuestionIndex> {
    questions.iter().position(|q| q.name == name)
}
