use lazy_static::lazy_static;
use regex::Regex;

use crate::config::{SearchConfig, UnknownFieldPolicy};
use crate::error::{Result, SearchError};

lazy_static! {
    static ref PHRASE_RE: Regex = Regex::new(r#""([^"]*)""#).expect("valid regex");
    static ref PROX_RE: Regex =
        Regex::new(r"#(\d+)\(([^,()]+),([^,()]+)\)").expect("valid regex");
    static ref PROX_OPEN_RE: Regex = Regex::new(r"#\d+\(").expect("valid regex");
}

/// Sub-expressions of a query, in appearance order.
#[derive(Debug, Clone, PartialEq)]
pub enum Atom {
    /// A bare or field-qualified term. `field: None` searches every
    /// configured field.
    Term { field: Option<String>, text: String },
    /// Unary negation of the following atom.
    Not(Box<Atom>),
    /// Quoted phrase, optionally field-qualified.
    Phrase { field: Option<String>, text: String },
    /// `#N(left,right)`: both terms within `distance` positions, either
    /// order.
    Proximity {
        distance: u32,
        left: String,
        right: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolOp {
    And,
    Or,
}

/// Flat parse result: atoms and the operators between them. Well-formed
/// input has `operators.len() == atoms.len() - 1`; the evaluator folds
/// strictly left to right and treats a missing operator as AND.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParsedQuery {
    pub atoms: Vec<Atom>,
    pub operators: Vec<BoolOp>,
}

/// Splits a query string into boolean clauses, field qualifiers, quoted
/// phrases, and proximity constructs. No parentheses, no precedence.
pub struct QueryParser {
    config: SearchConfig,
    field_phrase_re: Regex,
}

// Phrase and proximity constructs are lifted out first and replaced by
// placeholder tokens so their embedded spaces and commas cannot confuse the
// whitespace split. \u{1} cannot survive tokenization, so a placeholder
// never collides with query text.
const PLACEHOLDER: char = '\u{1}';

impl QueryParser {
    pub fn new(config: SearchConfig) -> Self {
        let fields = config
            .fields
            .iter()
            .map(|f| regex::escape(f))
            .collect::<Vec<_>>()
            .join("|");
        let field_phrase_re = Regex::new(&format!(r#"(?i)\b({fields}):\s*"([^"]*)""#))
            .expect("field names escape to a valid pattern");
        QueryParser {
            config,
            field_phrase_re,
        }
    }

    pub fn parse(&self, query: &str) -> Result<ParsedQuery> {
        let mut placeholders: Vec<Atom> = Vec::new();
        let mut text = query.to_string();

        // Field-qualified phrases go first so the qualifier stays attached
        // to its phrase rather than being read as a stray term.
        while let Some(caps) = self.field_phrase_re.captures(&text) {
            let whole = caps.get(0).expect("group 0 always present");
            let atom = Atom::Phrase {
                field: Some(caps[1].to_lowercase()),
                text: caps[2].to_string(),
            };
            let range = whole.range();
            text.replace_range(range, &placeholder_token(placeholders.len()));
            placeholders.push(atom);
        }

        while let Some(caps) = PHRASE_RE.captures(&text) {
            let whole = caps.get(0).expect("group 0 always present");
            let atom = Atom::Phrase {
                field: None,
                text: caps[1].to_string(),
            };
            let range = whole.range();
            text.replace_range(range, &placeholder_token(placeholders.len()));
            placeholders.push(atom);
        }
        if text.contains('"') {
            return Err(SearchError::QuerySyntax("unterminated phrase".into()));
        }

        while let Some(caps) = PROX_RE.captures(&text) {
            let whole = caps.get(0).expect("group 0 always present");
            let distance = caps[1]
                .parse::<u32>()
                .map_err(|_| SearchError::QuerySyntax("proximity distance out of range".into()))?;
            let left = caps[2].trim().to_string();
            let right = caps[3].trim().to_string();
            if left.is_empty() || right.is_empty() {
                return Err(SearchError::QuerySyntax("empty proximity term".into()));
            }
            let range = whole.range();
            text.replace_range(range, &placeholder_token(placeholders.len()));
            placeholders.push(Atom::Proximity {
                distance,
                left,
                right,
            });
        }
        if PROX_OPEN_RE.is_match(&text) {
            return Err(SearchError::QuerySyntax(
                "unterminated proximity construct".into(),
            ));
        }

        let mut atoms = Vec::new();
        let mut operators = Vec::new();
        let mut tokens = text.split_whitespace();
        while let Some(token) = tokens.next() {
            match token {
                "AND" => operators.push(BoolOp::And),
                "OR" => operators.push(BoolOp::Or),
                "NOT" => {
                    let next = tokens.next().ok_or_else(|| {
                        SearchError::QuerySyntax("NOT must be followed by a term".into())
                    })?;
                    let inner = self.token_atom(next, &placeholders)?;
                    atoms.push(Atom::Not(Box::new(inner)));
                }
                _ => atoms.push(self.token_atom(token, &placeholders)?),
            }
        }

        Ok(ParsedQuery { atoms, operators })
    }

    fn token_atom(&self, token: &str, placeholders: &[Atom]) -> Result<Atom> {
        if let Some(atom) = resolve_placeholder(token, placeholders) {
            return Ok(atom.clone());
        }
        if let Some((field, term)) = token.split_once(':') {
            let field = field.to_lowercase();
            let field = if self.config.is_field(&field) {
                field
            } else {
                match self.config.unknown_field {
                    UnknownFieldPolicy::Reject => return Err(SearchError::UnknownField(field)),
                    UnknownFieldPolicy::DefaultField => self.config.default_field.clone(),
                }
            };
            // an unknown qualifier can be left in front of an extracted
            // phrase; reattach it under the resolved field
            if let Some(Atom::Phrase { field: None, text }) = resolve_placeholder(term, placeholders)
            {
                return Ok(Atom::Phrase {
                    field: Some(field),
                    text: text.clone(),
                });
            }
            return Ok(Atom::Term {
                field: Some(field),
                text: term.to_string(),
            });
        }
        Ok(Atom::Term {
            field: None,
            text: token.to_string(),
        })
    }
}

fn placeholder_token(slot: usize) -> String {
    format!("{PLACEHOLDER}{slot}")
}

fn resolve_placeholder<'p>(token: &str, placeholders: &'p [Atom]) -> Option<&'p Atom> {
    let rest = token.strip_prefix(PLACEHOLDER)?;
    let slot = rest.parse::<usize>().ok()?;
    placeholders.get(slot)
}
