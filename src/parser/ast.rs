use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::mem;
use std::str::FromStr;

use crate::error::Error;

/// A parsed s-expression
///
/// Lists are right-nested chains of [`Expression::Cons`] ending in [`Expression::Nil`].
/// Dropping, cloning, comparing, rendering and serializing walk the `cdr` spine in a loop,
/// so long flat lists never recurse once per element.
#[derive(Default)]
pub enum Expression {
    /// The empty list, read from `()` or `NIL` in any letter case
    #[default]
    Nil,

    /// Bare symbol or word, case as written
    Atom(String),

    /// Double-quoted string literal, escapes already decoded
    StringAtom(String),

    /// Pair of two expressions
    Cons {
        /// First element
        car: Box<Expression>,
        /// Rest of the list, or any expression for a dotted pair
        cdr: Box<Expression>,
    },
}

impl Expression {
    /// Creates an atom
    pub fn atom(name: impl Into<String>) -> Self {
        Expression::Atom(name.into())
    }

    /// Creates a string atom
    pub fn string(value: impl Into<String>) -> Self {
        Expression::StringAtom(value.into())
    }

    /// Creates a cons cell
    pub fn cons(car: Expression, cdr: Expression) -> Self {
        Expression::Cons {
            car: Box::new(car),
            cdr: Box::new(cdr),
        }
    }

    /// Builds a proper list from its elements
    pub fn list<I>(items: I) -> Self
    where
        I: IntoIterator<Item = Expression>,
        I::IntoIter: DoubleEndedIterator,
    {
        Self::list_with_tail(items, Expression::Nil)
    }

    /// Builds a list whose last `cdr` is `tail` instead of `Nil`
    pub fn list_with_tail<I>(items: I, tail: Expression) -> Self
    where
        I: IntoIterator<Item = Expression>,
        I::IntoIter: DoubleEndedIterator,
    {
        items
            .into_iter()
            .rev()
            .fold(tail, |cdr, car| Expression::cons(car, cdr))
    }

    /// Wraps `expr` as `(NAME expr)`, the expansion of a reader macro
    pub fn quoted(name: &str, expr: Expression) -> Self {
        Expression::list([Expression::atom(name), expr])
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Expression::Nil)
    }

    pub fn is_atom(&self) -> bool {
        matches!(self, Expression::Atom(_))
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Expression::StringAtom(_))
    }

    pub fn is_cons(&self) -> bool {
        matches!(self, Expression::Cons { .. })
    }

    /// True for `Nil` and cons cells, proper or not
    pub fn is_list(&self) -> bool {
        self.is_nil() || self.is_cons()
    }

    /// Symbol name, if this is an atom
    pub fn as_atom(&self) -> Option<&str> {
        match self {
            Expression::Atom(name) => Some(name),
            _ => None,
        }
    }

    /// String contents, if this is a string atom
    pub fn as_string(&self) -> Option<&str> {
        match self {
            Expression::StringAtom(value) => Some(value),
            _ => None,
        }
    }

    /// `(car, cdr)`, if this is a cons cell
    pub fn as_cons(&self) -> Option<(&Expression, &Expression)> {
        match self {
            Expression::Cons { car, cdr } => Some((car, cdr)),
            _ => None,
        }
    }

    pub fn car(&self) -> Option<&Expression> {
        self.as_cons().map(|(car, _)| car)
    }

    pub fn cdr(&self) -> Option<&Expression> {
        self.as_cons().map(|(_, cdr)| cdr)
    }

    /// Iterates over the elements of a list
    ///
    /// Stops at the first `cdr` that is not a cons cell; [`ListIter::tail`] then tells
    /// whether the list was proper.
    pub fn iter(&self) -> ListIter<'_> {
        ListIter { rest: self }
    }

    /// True for `Nil` and cons chains ending in `Nil`
    pub fn is_proper_list(&self) -> bool {
        self.list_len().is_some()
    }

    /// Number of elements of a proper list, `None` for anything else
    pub fn list_len(&self) -> Option<usize> {
        let mut iter = self.iter();
        let len = iter.by_ref().count();
        iter.tail().is_nil().then_some(len)
    }
}

/// Iterator over the `car`s of a cons chain
#[derive(Debug, Clone)]
pub struct ListIter<'a> {
    rest: &'a Expression,
}

impl<'a> ListIter<'a> {
    /// What is left of the chain: `Nil` once a proper list is exhausted
    pub fn tail(&self) -> &'a Expression {
        self.rest
    }
}

impl<'a> Iterator for ListIter<'a> {
    type Item = &'a Expression;

    fn next(&mut self) -> Option<&'a Expression> {
        let (car, cdr) = self.rest.as_cons()?;
        self.rest = cdr;
        Some(car)
    }
}

impl<'a> IntoIterator for &'a Expression {
    type Item = &'a Expression;
    type IntoIter = ListIter<'a>;

    fn into_iter(self) -> ListIter<'a> {
        self.iter()
    }
}

impl Drop for Expression {
    fn drop(&mut self) {
        let mut pending = Vec::new();
        if let Expression::Cons { car, cdr } = self {
            pending.push(mem::take(car.as_mut()));
            pending.push(mem::take(cdr.as_mut()));
        }

        while let Some(mut expr) = pending.pop() {
            if let Expression::Cons { car, cdr } = &mut expr {
                pending.push(mem::take(car.as_mut()));
                pending.push(mem::take(cdr.as_mut()));
            }
            // `expr` now holds only Nil children and drops without recursing
        }
    }
}

impl Clone for Expression {
    fn clone(&self) -> Self {
        match self {
            Expression::Nil => Expression::Nil,
            Expression::Atom(name) => Expression::Atom(name.clone()),
            Expression::StringAtom(value) => Expression::StringAtom(value.clone()),
            Expression::Cons { .. } => {
                let mut iter = self.iter();
                let items: Vec<Expression> = iter.by_ref().cloned().collect();
                Expression::list_with_tail(items, iter.tail().clone())
            }
        }
    }
}

impl PartialEq for Expression {
    fn eq(&self, other: &Self) -> bool {
        let (mut left, mut right) = (self, other);
        loop {
            match (left, right) {
                (
                    Expression::Cons { car: lcar, cdr: lcdr },
                    Expression::Cons { car: rcar, cdr: rcdr },
                ) => {
                    if lcar != rcar {
                        return false;
                    }
                    left = lcdr;
                    right = rcdr;
                }
                (Expression::Nil, Expression::Nil) => return true,
                (Expression::Atom(l), Expression::Atom(r)) => return l == r,
                (Expression::StringAtom(l), Expression::StringAtom(r)) => return l == r,
                _ => return false,
            }
        }
    }
}

impl Eq for Expression {}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Expression::Nil => write!(f, "()"),
            Expression::Atom(name) => write!(f, "{}", name),
            Expression::StringAtom(value) => write_string(f, value),
            Expression::Cons { .. } => {
                write!(f, "(")?;
                let mut iter = self.iter();
                if let Some(first) = iter.next() {
                    write!(f, "{}", first)?;
                }
                for item in iter.by_ref() {
                    write!(f, " {}", item)?;
                }
                if !iter.tail().is_nil() {
                    write!(f, " . {}", iter.tail())?;
                }
                write!(f, ")")
            }
        }
    }
}

impl fmt::Debug for Expression {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Expression::Nil => write!(f, "Nil"),
            Expression::Atom(name) => f.debug_tuple("Atom").field(name).finish(),
            Expression::StringAtom(value) => f.debug_tuple("StringAtom").field(value).finish(),
            Expression::Cons { .. } => {
                let mut iter = self.iter();
                let mut list = f.debug_list();
                list.entries(iter.by_ref());
                if !iter.tail().is_nil() {
                    list.entry(&DottedTail(iter.tail()));
                }
                list.finish()
            }
        }
    }
}

/// Improper list tail in `Debug` output
struct DottedTail<'a>(&'a Expression);

impl fmt::Debug for DottedTail<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, ". ")?;
        fmt::Debug::fmt(self.0, f)
    }
}

/// Borrowed serde shape of an expression
///
/// A cons chain is written once as its elements plus the non-`Nil` tail, if any.
#[derive(Serialize)]
#[serde(rename = "Expression")]
enum ExpressionRef<'a> {
    Nil,
    Atom(&'a str),
    StringAtom(&'a str),
    List {
        items: ListItems<'a>,
        #[serde(skip_serializing_if = "Option::is_none")]
        tail: Option<&'a Expression>,
    },
}

/// Owned serde shape of an expression, see [`ExpressionRef`]
#[derive(Deserialize)]
#[serde(rename = "Expression")]
enum ExpressionRepr {
    Nil,
    Atom(String),
    StringAtom(String),
    List {
        items: Vec<Expression>,
        #[serde(default)]
        tail: Option<Expression>,
    },
}

struct ListItems<'a>(ListIter<'a>);

impl Serialize for ListItems<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0.clone())
    }
}

impl Serialize for Expression {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let view = match self {
            Expression::Nil => ExpressionRef::Nil,
            Expression::Atom(name) => ExpressionRef::Atom(name),
            Expression::StringAtom(value) => ExpressionRef::StringAtom(value),
            Expression::Cons { .. } => {
                let mut iter = self.iter();
                let items = ListItems(iter.clone());
                for _ in iter.by_ref() {}
                let tail = iter.tail();
                ExpressionRef::List {
                    items,
                    tail: (!tail.is_nil()).then_some(tail),
                }
            }
        };
        view.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Expression {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match ExpressionRepr::deserialize(deserializer)? {
            ExpressionRepr::Nil => Expression::Nil,
            ExpressionRepr::Atom(name) => Expression::Atom(name),
            ExpressionRepr::StringAtom(value) => Expression::StringAtom(value),
            ExpressionRepr::List { items, tail } => {
                Expression::list_with_tail(items, tail.unwrap_or_default())
            }
        })
    }
}

impl FromStr for Expression {
    type Err = Error;

    /// Parses exactly one expression, rejecting trailing tokens
    fn from_str(source: &str) -> Result<Self, Error> {
        crate::parse_str(source)
    }
}

fn write_string(f: &mut fmt::Formatter, value: &str) -> fmt::Result {
    write!(f, "\"")?;
    for c in value.chars() {
        match c {
            '"' => write!(f, "\\\"")?,
            '\\' => write!(f, "\\\\")?,
            '\n' => write!(f, "\\n")?,
            '\r' => write!(f, "\\r")?,
            '\t' => write!(f, "\\t")?,
            c => write!(f, "{}", c)?,
        }
    }
    write!(f, "\"")
}
