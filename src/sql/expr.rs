//! Expressions - immutable token sequences forming a piece of SQL.
//!
//! An [`Expression`] keeps identifiers, literals and model references as
//! typed tokens, so nothing is quoted or concatenated until it is rendered for
//! a concrete dialect. Equality and hashing are structural, which lets the
//! graph layer recognise identical sub-expressions.
//!
//! Expressions built by repeated [`Expression::construct`] can nest thousands
//! of levels deep. Rendering, identity, equality and drop all walk the tree
//! with an explicit stack; nothing here recurses per nesting level.

use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::{Serialize, Serializer};

use super::convert::{ConversionRegistry, TypedValue};
use super::dialect::{Dialect, SqlDialect};
use super::token::{RenderContext, Token, TokenStream};
use crate::error::{ModelError, ModelResult};
use crate::model::ModelNode;
use crate::template::{scan, Fragment};

// =============================================================================
// Literals
// =============================================================================

/// Literal values. Always rendered through the dialect's literal formatter.
#[derive(Debug, Clone)]
pub enum Literal {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    /// `YYYY-MM-DD`
    Date(String),
    /// `YYYY-MM-DD HH:MM:SS[.ffffff]`
    Timestamp(String),
    /// Serialized JSON document
    Json(String),
    Array(Vec<Literal>),
    Cast {
        value: Box<Literal>,
        type_name: String,
    },
}

impl Literal {
    /// Render this literal for a dialect.
    pub fn to_sql(&self, dialect: Dialect) -> ModelResult<String> {
        enum Step<'a> {
            Visit(&'a Literal),
            Array { len: usize, nested: bool },
            Cast(&'a str),
        }

        let mut steps = vec![Step::Visit(self)];
        let mut values: Vec<String> = Vec::new();
        while let Some(step) = steps.pop() {
            match step {
                Step::Visit(literal) => match literal {
                    Literal::Null => values.push(dialect.format_null().to_string()),
                    Literal::Bool(b) => values.push(dialect.format_bool(*b).to_string()),
                    Literal::Int(n) => values.push(dialect.format_int(*n)),
                    Literal::Float(f) => values.push(dialect.format_float(*f)?),
                    Literal::String(s) => values.push(dialect.quote_string(s)),
                    Literal::Date(d) => values.push(dialect.format_date_literal(d)),
                    Literal::Timestamp(ts) => values.push(dialect.format_timestamp_literal(ts)),
                    Literal::Json(json) => values.push(dialect.format_json_literal(json)),
                    Literal::Array(items) => {
                        let nested = items.iter().any(|item| matches!(item, Literal::Array(_)));
                        steps.push(Step::Array {
                            len: items.len(),
                            nested,
                        });
                        steps.extend(items.iter().rev().map(Step::Visit));
                    }
                    Literal::Cast { value, type_name } => {
                        steps.push(Step::Cast(type_name));
                        steps.push(Step::Visit(value.as_ref()));
                    }
                },
                Step::Array { len, nested } => {
                    let elements = values.split_off(values.len().saturating_sub(len));
                    values.push(dialect.format_array_literal(&elements, nested)?);
                }
                Step::Cast(type_name) => {
                    let value = values.pop().unwrap_or_default();
                    values.push(dialect.format_cast(&value, type_name));
                }
            }
        }
        Ok(values.pop().unwrap_or_default())
    }
}

// Floats compare by bit pattern so that literals can be hashed and NaN equals
// itself.
impl PartialEq for Literal {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Literal::Null, Literal::Null) => true,
            (Literal::Bool(a), Literal::Bool(b)) => a == b,
            (Literal::Int(a), Literal::Int(b)) => a == b,
            (Literal::Float(a), Literal::Float(b)) => a.to_bits() == b.to_bits(),
            (Literal::String(a), Literal::String(b))
            | (Literal::Date(a), Literal::Date(b))
            | (Literal::Timestamp(a), Literal::Timestamp(b))
            | (Literal::Json(a), Literal::Json(b)) => a == b,
            (Literal::Array(a), Literal::Array(b)) => a == b,
            (
                Literal::Cast {
                    value: a,
                    type_name: ta,
                },
                Literal::Cast {
                    value: b,
                    type_name: tb,
                },
            ) => a == b && ta == tb,
            _ => false,
        }
    }
}

impl Eq for Literal {}

impl Hash for Literal {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Literal::Null => {}
            Literal::Bool(b) => b.hash(state),
            Literal::Int(n) => n.hash(state),
            Literal::Float(f) => f.to_bits().hash(state),
            Literal::String(s)
            | Literal::Date(s)
            | Literal::Timestamp(s)
            | Literal::Json(s) => s.hash(state),
            Literal::Array(items) => items.hash(state),
            Literal::Cast { value, type_name } => {
                value.hash(state);
                type_name.hash(state);
            }
        }
    }
}

impl Serialize for Literal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut atoms = Vec::new();
        push_literal_atoms(self, &mut atoms);
        serializer.collect_seq(atoms)
    }
}

// =============================================================================
// Structural encoding
// =============================================================================

/// One entry of the flat, pre-order encoding of an expression. Compound
/// entries carry the number of children that follow them, so the encoding
/// is unambiguous without nesting. Floats are encoded by bit pattern.
#[derive(Debug, PartialEq, Eq, Hash, Serialize)]
enum Atom<'a> {
    Syntax(&'static str),
    Identifier(&'a str),
    StringLiteral(&'a str),
    Column {
        name: &'a str,
        table: Option<&'a str>,
    },
    SubExpression(usize),
    Model(&'a str),
    Raw(&'a str),
    Null,
    Bool(bool),
    Int(i64),
    Float(u64),
    String(&'a str),
    Date(&'a str),
    Timestamp(&'a str),
    Json(&'a str),
    Array(usize),
    Cast(&'a str),
}

fn push_literal_atoms<'a>(literal: &'a Literal, out: &mut Vec<Atom<'a>>) {
    let mut stack = vec![literal];
    while let Some(literal) = stack.pop() {
        out.push(match literal {
            Literal::Null => Atom::Null,
            Literal::Bool(b) => Atom::Bool(*b),
            Literal::Int(n) => Atom::Int(*n),
            Literal::Float(f) => Atom::Float(f.to_bits()),
            Literal::String(s) => Atom::String(s),
            Literal::Date(d) => Atom::Date(d),
            Literal::Timestamp(ts) => Atom::Timestamp(ts),
            Literal::Json(json) => Atom::Json(json),
            Literal::Array(items) => {
                stack.extend(items.iter().rev());
                Atom::Array(items.len())
            }
            Literal::Cast { value, type_name } => {
                stack.push(value.as_ref());
                Atom::Cast(type_name)
            }
        });
    }
}

// =============================================================================
// Expression
// =============================================================================

/// An immutable, ordered sequence of tokens. Clones share the tokens.
#[derive(Debug, Clone, Default)]
pub struct Expression {
    tokens: Arc<Vec<Token>>,
}

/// An argument to [`Expression::construct`].
#[derive(Debug, Clone)]
pub enum ExprArg {
    /// Raw SQL text
    Raw(String),
    /// Inlined as a sub-expression
    Expression(Expression),
    /// Rendered through the dialect's literal formatter
    Literal(Literal),
    /// Converted through a [`ConversionRegistry`]
    Value(TypedValue),
}

impl From<&str> for ExprArg {
    fn from(s: &str) -> Self {
        ExprArg::Raw(s.to_string())
    }
}

impl From<String> for ExprArg {
    fn from(s: String) -> Self {
        ExprArg::Raw(s)
    }
}

impl From<Expression> for ExprArg {
    fn from(expr: Expression) -> Self {
        ExprArg::Expression(expr)
    }
}

impl From<Literal> for ExprArg {
    fn from(literal: Literal) -> Self {
        ExprArg::Literal(literal)
    }
}

impl From<TypedValue> for ExprArg {
    fn from(value: TypedValue) -> Self {
        ExprArg::Value(value)
    }
}

impl From<i64> for ExprArg {
    fn from(n: i64) -> Self {
        ExprArg::Literal(Literal::Int(n))
    }
}

impl From<f64> for ExprArg {
    fn from(f: f64) -> Self {
        ExprArg::Literal(Literal::Float(f))
    }
}

impl From<bool> for ExprArg {
    fn from(b: bool) -> Self {
        ExprArg::Literal(Literal::Bool(b))
    }
}

impl Expression {
    /// Create an expression from raw tokens.
    pub fn from_tokens(tokens: impl IntoIterator<Item = Token>) -> Self {
        Self {
            tokens: Arc::new(tokens.into_iter().collect()),
        }
    }

    /// Build an expression from a format-like template with one `{}` per
    /// argument. `{{` and `}}` stand for literal braces.
    ///
    /// ```ignore
    /// let expr = Expression::construct("{} + {}", vec![col("a").into(), 1.into()])?;
    /// ```
    pub fn construct(template: &str, args: Vec<ExprArg>) -> ModelResult<Self> {
        Self::construct_with(template, args, &ConversionRegistry::new())
    }

    /// Like [`Expression::construct`], converting [`ExprArg::Value`] arguments
    /// with the given registry.
    pub fn construct_with(
        template: &str,
        args: Vec<ExprArg>,
        registry: &ConversionRegistry,
    ) -> ModelResult<Self> {
        let fragments = scan(template)?;

        let expected = fragments
            .iter()
            .filter(|f| matches!(f, Fragment::Field(_)))
            .count();
        if expected != args.len() {
            return Err(ModelError::TemplateArity {
                template: template.to_string(),
                expected,
                actual: args.len(),
            });
        }

        let mut args = args.into_iter();
        let mut tokens = Vec::with_capacity(fragments.len());
        for fragment in fragments {
            match fragment {
                Fragment::Literal(text) => tokens.push(Token::Raw(text)),
                Fragment::Field(name) if !name.is_empty() => {
                    return Err(ModelError::malformed(
                        template,
                        format!("named placeholder '{{{}}}' in expression template", name),
                    ))
                }
                Fragment::Field(_) => {
                    // Counted above, so an argument is always available.
                    let Some(arg) = args.next() else { break };
                    tokens.push(match arg {
                        ExprArg::Raw(sql) => Token::Raw(sql),
                        ExprArg::Expression(expr) => Token::SubExpression(expr),
                        ExprArg::Literal(literal) => Token::Literal(literal),
                        ExprArg::Value(value) => Token::SubExpression(registry.convert(&value)?),
                    });
                }
            }
        }

        Ok(Self {
            tokens: Arc::new(tokens),
        })
    }

    /// Raw SQL text. See the warning on [`Token::Raw`].
    pub fn raw(sql: &str) -> Self {
        Self::from_tokens([Token::Raw(sql.to_string())])
    }

    /// A quoted identifier.
    pub fn identifier(name: &str) -> Self {
        Self::from_tokens([Token::Identifier(name.to_string())])
    }

    /// A quoted, escaped string literal.
    pub fn string_literal(value: &str) -> Self {
        Self::from_tokens([Token::StringLiteral(value.to_string())])
    }

    /// A typed literal.
    pub fn literal(literal: Literal) -> Self {
        Self::from_tokens([Token::Literal(literal)])
    }

    /// An unqualified column; picks up the render-time table qualifier.
    pub fn column_reference(name: &str) -> Self {
        Self::from_tokens([Token::ColumnReference {
            name: name.to_string(),
            table: None,
        }])
    }

    /// A column qualified with an explicit table.
    pub fn qualified_column(table: &str, name: &str) -> Self {
        Self::from_tokens([Token::ColumnReference {
            name: name.to_string(),
            table: Some(table.to_string()),
        }])
    }

    /// A reference to another model, rendered as its alias or subquery.
    pub fn model_reference(node: Arc<ModelNode>) -> Self {
        Self::from_tokens([Token::ModelReference(node)])
    }

    /// `<model>.<column>` where the model part is resolved at generation time.
    pub fn model_column(node: Arc<ModelNode>, column: &str) -> Self {
        Self::from_tokens([
            Token::ModelReference(node),
            Token::Raw(".".into()),
            Token::Identifier(column.to_string()),
        ])
    }

    /// Join expressions with a raw separator.
    pub fn join(exprs: impl IntoIterator<Item = Expression>, separator: &str) -> Self {
        let mut tokens = Vec::new();
        for (i, expr) in exprs.into_iter().enumerate() {
            if i > 0 {
                tokens.push(Token::Raw(separator.to_string()));
            }
            tokens.push(Token::SubExpression(expr));
        }
        Self {
            tokens: Arc::new(tokens),
        }
    }

    pub fn tokens(&self) -> &[Token] {
        self.tokens.as_slice()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Every model referenced anywhere in this expression, in order of
    /// appearance, without duplicates.
    pub fn model_references(&self) -> Vec<Arc<ModelNode>> {
        let mut found: Vec<Arc<ModelNode>> = Vec::new();
        let mut stack: Vec<std::slice::Iter<'_, Token>> = vec![self.tokens.iter()];

        while let Some(iter) = stack.last_mut() {
            match iter.next() {
                Some(Token::ModelReference(node)) => {
                    if !found.iter().any(|n| n.id() == node.id()) {
                        found.push(node.clone());
                    }
                }
                Some(Token::SubExpression(expr)) => stack.push(expr.tokens.iter()),
                Some(_) => {}
                None => {
                    stack.pop();
                }
            }
        }

        found
    }

    /// Render with the given context.
    pub fn render(&self, ctx: &RenderContext<'_>) -> ModelResult<String> {
        let mut out = String::new();
        self.render_into(ctx, &mut out)?;
        Ok(out)
    }

    pub(crate) fn render_into(&self, ctx: &RenderContext<'_>, out: &mut String) -> ModelResult<()> {
        let mut stack: Vec<std::slice::Iter<'_, Token>> = vec![self.tokens.iter()];
        while let Some(iter) = stack.last_mut() {
            match iter.next() {
                Some(Token::SubExpression(expr)) => stack.push(expr.tokens.iter()),
                Some(token) => token.render(ctx, out)?,
                None => {
                    stack.pop();
                }
            }
        }
        Ok(())
    }

    /// Render for a dialect, prefixing unqualified column references with
    /// `table_qualifier` when given.
    ///
    /// Expressions that reference other models can only be rendered as part
    /// of a generation pass and fail here with `UnresolvedReference`.
    pub fn to_sql(&self, dialect: Dialect, table_qualifier: Option<&str>) -> ModelResult<String> {
        self.render(&RenderContext::new(dialect).with_qualifier(table_qualifier))
    }

    pub fn to_tokens(&self) -> TokenStream {
        let mut ts = TokenStream::new();
        ts.extend(self.tokens.iter().cloned());
        ts
    }

    /// The flat structural encoding behind equality, hashing and identity.
    fn atoms(&self) -> Vec<Atom<'_>> {
        let mut atoms = Vec::with_capacity(self.tokens.len());
        let mut stack: Vec<std::slice::Iter<'_, Token>> = vec![self.tokens.iter()];

        while let Some(iter) = stack.last_mut() {
            let Some(token) = iter.next() else {
                stack.pop();
                continue;
            };
            let atom = match token {
                Token::With => Atom::Syntax("WITH"),
                Token::As => Atom::Syntax("AS"),
                Token::Comma => Atom::Syntax(","),
                Token::LParen => Atom::Syntax("("),
                Token::RParen => Atom::Syntax(")"),
                Token::Space => Atom::Syntax(" "),
                Token::Identifier(name) => Atom::Identifier(name),
                Token::StringLiteral(value) => Atom::StringLiteral(value),
                Token::Literal(literal) => {
                    push_literal_atoms(literal, &mut atoms);
                    continue;
                }
                Token::ColumnReference { name, table } => Atom::Column {
                    name,
                    table: table.as_deref(),
                },
                Token::SubExpression(expr) => {
                    stack.push(expr.tokens.iter());
                    Atom::SubExpression(expr.tokens.len())
                }
                Token::ModelReference(node) => Atom::Model(node.id().as_str()),
                Token::Raw(sql) => Atom::Raw(sql),
            };
            atoms.push(atom);
        }

        atoms
    }
}

impl PartialEq for Expression {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.tokens, &other.tokens) || self.atoms() == other.atoms()
    }
}

impl Eq for Expression {}

impl Hash for Expression {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.atoms().hash(state);
    }
}

impl Serialize for Expression {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.atoms())
    }
}

// Unlinks nested sub-expressions one level at a time.
impl Drop for Expression {
    fn drop(&mut self) {
        let Some(tokens) = Arc::get_mut(&mut self.tokens) else {
            return;
        };
        let mut pending = std::mem::take(tokens);
        while let Some(token) = pending.pop() {
            if let Token::SubExpression(mut expr) = token {
                if let Some(inner) = Arc::get_mut(&mut expr.tokens) {
                    pending.append(inner);
                }
            }
        }
    }
}

impl From<TokenStream> for Expression {
    fn from(ts: TokenStream) -> Self {
        Self::from_tokens(ts.into_tokens())
    }
}

impl From<Literal> for Expression {
    fn from(literal: Literal) -> Self {
        Expression::literal(literal)
    }
}

// =============================================================================
// Builder Functions
// =============================================================================

/// Create an unqualified column reference.
pub fn col(name: &str) -> Expression {
    Expression::column_reference(name)
}

/// Create a table-qualified column reference.
pub fn table_col(table: &str, column: &str) -> Expression {
    Expression::qualified_column(table, column)
}

/// Create a quoted identifier.
pub fn ident(name: &str) -> Expression {
    Expression::identifier(name)
}

pub fn lit_int(n: i64) -> Expression {
    Expression::literal(Literal::Int(n))
}

pub fn lit_float(f: f64) -> Expression {
    Expression::literal(Literal::Float(f))
}

pub fn lit_str(s: &str) -> Expression {
    Expression::string_literal(s)
}

pub fn lit_bool(b: bool) -> Expression {
    Expression::literal(Literal::Bool(b))
}

pub fn lit_null() -> Expression {
    Expression::literal(Literal::Null)
}

pub fn lit_date(date: &str) -> Expression {
    Expression::literal(Literal::Date(date.to_string()))
}

pub fn lit_timestamp(timestamp: &str) -> Expression {
    Expression::literal(Literal::Timestamp(timestamp.to_string()))
}

pub fn lit_array(items: Vec<Literal>) -> Expression {
    Expression::literal(Literal::Array(items))
}

/// Create a raw SQL expression.
///
/// # Security Warning
///
/// **Never pass user input to this function.** The SQL is emitted verbatim.
pub fn raw_sql(sql: &str) -> Expression {
    Expression::raw(sql)
}

/// Reference a column of another model.
pub fn model_column(node: Arc<ModelNode>, column: &str) -> Expression {
    Expression::model_column(node, column)
}
