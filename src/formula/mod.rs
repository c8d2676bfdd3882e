//! Propositional formulas over named atomic propositions
//!
//! Labels reach the automaton layer as formulas produced by an external
//! translator (or parsed from text); [`Formula::to_bdd`] grounds them in a
//! [`BddDict`](crate::dict::BddDict), registering every atomic proposition on
//! behalf of the translating client.
//!
//! The textual notation is the one the reachable-graph dumps use: `*` for
//! AND, `+` for OR, `~` for NOT, `0`/`1` for the constants. [`Formula`]
//! prints itself in that notation and [`Formula::parse`] reads it back, so
//! labels survive a dump/load cycle unchanged.

use std::fmt;
use std::ops::{Add, Mul, Not};
use std::sync::Arc;

use lalrpop_util::{lalrpop_mod, ParseError};

use crate::bdd::Bdd;
use crate::dict::{BddDict, ClientId};
use crate::save::RawRecord;

lalrpop_mod!(grammar, "/formula/grammar.rs");

/// Inner representation of a propositional formula
#[derive(Debug, Clone, PartialEq, Eq)]
enum FormulaInner {
    /// A named atomic proposition
    Ap(Arc<str>),
    /// Logical AND of two formulas
    And(Formula, Formula),
    /// Logical OR of two formulas
    Or(Formula, Formula),
    /// Logical NOT of a formula
    Not(Formula),
    /// A constant value (true or false)
    Constant(bool),
}

/// A propositional formula that can be manipulated programmatically
///
/// Uses `Arc` internally for efficient cloning. Formulas compare by
/// structure; for semantic equality, translate to [`Bdd`] first.
#[derive(Clone, PartialEq, Eq)]
pub struct Formula {
    inner: Arc<FormulaInner>,
}

impl Formula {
    /// Create an atomic proposition with the given name
    pub fn ap(name: &str) -> Self {
        Formula {
            inner: Arc::new(FormulaInner::Ap(Arc::from(name))),
        }
    }

    /// Create a constant formula (true or false)
    pub fn constant(value: bool) -> Self {
        Formula {
            inner: Arc::new(FormulaInner::Constant(value)),
        }
    }

    /// Logical AND: the conjunction of this formula and another
    pub fn and(&self, other: &Formula) -> Formula {
        Formula {
            inner: Arc::new(FormulaInner::And(self.clone(), other.clone())),
        }
    }

    /// Logical OR: the disjunction of this formula and another
    pub fn or(&self, other: &Formula) -> Formula {
        Formula {
            inner: Arc::new(FormulaInner::Or(self.clone(), other.clone())),
        }
    }

    /// Logical NOT: the negation of this formula
    pub fn not(&self) -> Formula {
        Formula {
            inner: Arc::new(FormulaInner::Not(self.clone())),
        }
    }

    /// Parse a formula from a string
    ///
    /// Supports standard boolean operators:
    /// - `+` or `|` for OR
    /// - `*` or `&` for AND
    /// - `~` or `!` for NOT
    /// - Parentheses for grouping
    /// - Constants: `0`, `1`
    pub fn parse(input: &str) -> Result<Self, ParseFormulaError> {
        grammar::ExprParser::new()
            .parse(input)
            .map_err(|e| ParseFormulaError::new(&e, input))
    }

    /// Translate this formula into the BDD algebra
    ///
    /// Atomic propositions are registered in `dict` on behalf of `client`, so
    /// the variables stay alive until the client unregisters.
    pub fn to_bdd(&self, dict: &mut BddDict, client: ClientId) -> Bdd {
        match self.inner.as_ref() {
            FormulaInner::Ap(name) => {
                let var = dict.register_proposition(name, client);
                dict.ithvar(var)
            }
            FormulaInner::And(left, right) => {
                left.to_bdd(dict, client).and(&right.to_bdd(dict, client))
            }
            FormulaInner::Or(left, right) => {
                left.to_bdd(dict, client).or(&right.to_bdd(dict, client))
            }
            FormulaInner::Not(inner) => inner.to_bdd(dict, client).not(),
            FormulaInner::Constant(true) => dict.bdd_true(),
            FormulaInner::Constant(false) => dict.bdd_false(),
        }
    }

    /// Binding strength of the topmost connective.
    /// 0 = OR (loosest), 1 = AND, 2 = NOT, 3 = atoms and constants.
    fn precedence(&self) -> u8 {
        match self.inner.as_ref() {
            FormulaInner::Or(..) => 0,
            FormulaInner::And(..) => 1,
            FormulaInner::Not(_) => 2,
            FormulaInner::Ap(_) | FormulaInner::Constant(_) => 3,
        }
    }

    /// Print `self` as an operand of a connective with strength `min`,
    /// parenthesising only when `self` binds looser than its surroundings
    fn write_prec(&self, f: &mut fmt::Formatter<'_>, min: u8) -> fmt::Result {
        if self.precedence() < min {
            write!(f, "(")?;
            self.write_prec(f, 0)?;
            return write!(f, ")");
        }
        match self.inner.as_ref() {
            FormulaInner::Ap(name) => write!(f, "{}", name),
            FormulaInner::Constant(value) => f.write_str(if *value { "1" } else { "0" }),
            FormulaInner::And(left, right) => {
                left.write_prec(f, 1)?;
                f.write_str(" * ")?;
                right.write_prec(f, 1)
            }
            FormulaInner::Or(left, right) => {
                left.write_prec(f, 0)?;
                f.write_str(" + ")?;
                right.write_prec(f, 0)
            }
            FormulaInner::Not(inner) => {
                f.write_str("~")?;
                inner.write_prec(f, 2)
            }
        }
    }
}

/// Parse a reachable-graph dump (see [`crate::save`]) into its raw records
pub(crate) fn parse_dump(input: &str) -> Result<Vec<RawRecord>, ParseFormulaError> {
    grammar::DumpParser::new()
        .parse(input)
        .map_err(|e| ParseFormulaError::new(&e, input))
}

/// Byte offset of the token a parse error points at, when it points at one
fn token_offset<T, E>(error: &ParseError<usize, T, E>) -> Option<usize> {
    match error {
        ParseError::InvalidToken { location } => Some(*location),
        ParseError::UnrecognizedEof { location, .. } => Some(*location),
        ParseError::UnrecognizedToken { token, .. } => Some(token.0),
        ParseError::ExtraToken { token } => Some(token.0),
        ParseError::User { .. } => None,
    }
}

/// Rejection of a formula or dump text by the parser
///
/// Carries the rejected input and, where the parser could pin one down, the
/// byte offset of the offending token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFormulaError {
    message: String,
    position: Option<usize>,
    input: String,
}

impl ParseFormulaError {
    fn new<T: fmt::Display, E: fmt::Display>(
        error: &ParseError<usize, T, E>,
        input: &str,
    ) -> Self {
        ParseFormulaError {
            message: error.to_string(),
            position: token_offset(error),
            input: input.to_string(),
        }
    }

    /// Byte offset of the offending token, if known
    pub fn position(&self) -> Option<usize> {
        self.position
    }

    /// The input text that was rejected
    pub fn input(&self) -> &str {
        &self.input
    }
}

impl fmt::Display for ParseFormulaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.position {
            Some(pos) => write!(
                f,
                "syntax error at offset {} in {:?}: {}",
                pos, self.input, self.message
            ),
            None => write!(f, "syntax error in {:?}: {}", self.input, self.message),
        }
    }
}

impl std::error::Error for ParseFormulaError {}

/// Prints the dump notation with minimal parentheses
///
/// # Examples
///
/// ```
/// use omega_check::Formula;
///
/// let a = Formula::ap("a");
/// let b = Formula::ap("b");
/// let c = Formula::ap("c");
/// assert_eq!(a.and(&b).or(&c).to_string(), "a * b + c");
/// assert_eq!(a.or(&b).and(&c).to_string(), "(a + b) * c");
/// ```
impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_prec(f, 0)
    }
}

impl fmt::Debug for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Logical AND operator for references: `&a * &b`
impl Mul for &Formula {
    type Output = Formula;

    fn mul(self, rhs: &Formula) -> Formula {
        self.and(rhs)
    }
}

/// Logical AND operator: `a * b` (delegates to reference version)
impl Mul for Formula {
    type Output = Formula;

    fn mul(self, rhs: Formula) -> Formula {
        self.and(&rhs)
    }
}

/// Logical OR operator for references: `&a + &b`
impl Add for &Formula {
    type Output = Formula;

    fn add(self, rhs: &Formula) -> Formula {
        self.or(rhs)
    }
}

/// Logical OR operator: `a + b` (delegates to reference version)
impl Add for Formula {
    type Output = Formula;

    fn add(self, rhs: Formula) -> Formula {
        self.or(&rhs)
    }
}

/// Logical NOT operator for references: `!&a`
impl Not for &Formula {
    type Output = Formula;

    fn not(self) -> Formula {
        Formula::not(self)
    }
}

/// Logical NOT operator: `!a` (delegates to reference version)
impl Not for Formula {
    type Output = Formula;

    fn not(self) -> Formula {
        Formula::not(&self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ap_creation() {
        let a = Formula::ap("a");
        let b = Formula::ap("b");
        let a2 = Formula::ap("a");

        // Formulas are compared by structure
        assert_eq!(a, a2);
        assert_ne!(a, b);
    }

    #[test]
    fn test_display_minimal_parentheses() {
        let a = Formula::ap("a");
        let b = Formula::ap("b");
        let c = Formula::ap("c");

        assert_eq!(a.clone().and(&b).or(&c).to_string(), "a * b + c");
        assert_eq!(a.clone().or(&b).and(&c).to_string(), "(a + b) * c");
        assert_eq!(a.clone().and(&b).not().to_string(), "~(a * b)");
        assert_eq!(a.clone().not().and(&b).to_string(), "~a * b");
        assert_eq!(a.clone().not().not().to_string(), "~~a");
        assert_eq!(a.or(&b.clone().and(&c)).to_string(), "a + b * c");
    }

    #[test]
    fn test_parse_round_trip() {
        for text in ["a * b + c", "(a + b) * ~c", "1", "0", "~(a + ~b)"] {
            let parsed = Formula::parse(text).unwrap();
            assert_eq!(parsed.to_string(), text);
        }
    }

    #[test]
    fn test_parse_alternate_operators() {
        let plain = Formula::parse("a * b + ~c").unwrap();
        let alt = Formula::parse("a & b | !c").unwrap();
        assert_eq!(plain, alt);
    }

    #[test]
    fn test_parse_error_reports_input_and_offset() {
        let err = Formula::parse("a * b +").unwrap_err();
        assert_eq!(err.input(), "a * b +");
        // The parser stops at the end of the truncated input.
        assert_eq!(err.position(), Some(7));
        assert!(err.to_string().contains("a * b +"));
    }

    #[test]
    fn test_parse_error_points_at_bad_token() {
        let err = Formula::parse("a ? b").unwrap_err();
        assert_eq!(err.position(), Some(2));
    }

    #[test]
    fn test_operator_overloading() {
        let a = Formula::ap("a");
        let b = Formula::ap("b");

        assert_eq!(&a * &b, a.and(&b));
        assert_eq!(&a + &b, a.or(&b));
        assert_eq!(!&a, a.not());
    }

    #[test]
    fn test_to_bdd() {
        let mut dict = BddDict::new();
        let client = dict.new_client();

        let f = Formula::parse("a * ~b + b * ~a").unwrap();
        let g = Formula::parse("~(a * b + ~a * ~b)").unwrap();
        // Structurally different, semantically equal (xor).
        assert_ne!(f, g);
        let fb = f.to_bdd(&mut dict, client);
        let gb = g.to_bdd(&mut dict, client);
        assert_eq!(fb, gb);

        assert!(Formula::constant(true).to_bdd(&mut dict, client).is_true());
        assert!(Formula::constant(false).to_bdd(&mut dict, client).is_false());
    }
}
