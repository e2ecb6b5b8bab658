//! SQL Tokens - the atomic units of SQL output.
//!
//! Tokens are dialect-agnostic representations that serialize
//! to dialect-specific strings. Quoting and literal formatting happen only
//! when a token is rendered.

use std::sync::Arc;

use serde::{Serialize, Serializer};

use super::dialect::{Dialect, SqlDialect};
use super::expr::{Expression, Literal};
use crate::error::{ModelError, ModelResult};
use crate::model::ModelNode;

/// SQL Token - every element an expression or generated statement is made of.
///
/// Adding a new variant here will cause compile errors everywhere
/// it needs to be handled (exhaustive matching).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum Token {
    // === Keywords / Punctuation used by the generator ===
    With,
    As,
    Comma,
    LParen,
    RParen,
    Space,

    // === Dynamic Content ===
    /// Identifier (table, column, alias), quoted per dialect
    Identifier(String),
    /// String value, quoted and escaped per dialect
    StringLiteral(String),
    /// Typed literal formatted per dialect
    Literal(Literal),
    /// Column, prefixed with its table or the render qualifier
    ColumnReference {
        name: String,
        table: Option<String>,
    },
    /// Nested expression, inlined without parentheses
    SubExpression(Expression),
    /// Reference to another model; becomes its CTE alias or subquery
    ModelReference(#[serde(serialize_with = "serialize_model_ref")] Arc<ModelNode>),

    // === Escape Hatch ===
    /// Raw SQL passed directly to output without escaping.
    ///
    /// # Security Warning
    ///
    /// **Never pass user input to this variant.** Raw SQL is not sanitized.
    /// For user-provided values, use `Token::StringLiteral` or
    /// `Token::Literal`, which are escaped for the target dialect.
    Raw(String),
}

fn serialize_model_ref<S: Serializer>(node: &Arc<ModelNode>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(node.id().as_str())
}

/// Resolves a model reference to the SQL text that stands in for it.
pub type ModelResolver<'a> = &'a dyn Fn(&ModelNode) -> ModelResult<String>;

/// Everything a token needs to render itself.
#[derive(Clone, Copy)]
pub struct RenderContext<'a> {
    pub dialect: Dialect,
    pub table_qualifier: Option<&'a str>,
    resolver: Option<ModelResolver<'a>>,
}

impl<'a> RenderContext<'a> {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            table_qualifier: None,
            resolver: None,
        }
    }

    pub fn with_qualifier(mut self, qualifier: Option<&'a str>) -> Self {
        self.table_qualifier = qualifier;
        self
    }

    pub fn with_resolver(mut self, resolver: ModelResolver<'a>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    fn quoted_identifier(&self, ident: &str) -> ModelResult<String> {
        self.dialect.validate_identifier(ident)?;
        Ok(self.dialect.quote_identifier(ident))
    }
}

impl std::fmt::Debug for RenderContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderContext")
            .field("dialect", &self.dialect)
            .field("table_qualifier", &self.table_qualifier)
            .field("resolver", &self.resolver.is_some())
            .finish()
    }
}

impl Token {
    /// Render this token for the given context, appending to `out`.
    pub fn render(&self, ctx: &RenderContext<'_>, out: &mut String) -> ModelResult<()> {
        match self {
            Token::With => out.push_str("WITH"),
            Token::As => out.push_str("AS"),
            Token::Comma => out.push(','),
            Token::LParen => out.push('('),
            Token::RParen => out.push(')'),
            Token::Space => out.push(' '),

            Token::Identifier(name) => out.push_str(&ctx.quoted_identifier(name)?),
            Token::StringLiteral(value) => out.push_str(&ctx.dialect.quote_string(value)),
            Token::Literal(literal) => out.push_str(&literal.to_sql(ctx.dialect)?),
            Token::ColumnReference { name, table } => {
                if let Some(table) = table.as_deref().or(ctx.table_qualifier) {
                    out.push_str(&ctx.quoted_identifier(table)?);
                    out.push('.');
                }
                out.push_str(&ctx.quoted_identifier(name)?);
            }
            Token::SubExpression(expr) => expr.render_into(ctx, out)?,
            Token::ModelReference(node) => match ctx.resolver {
                Some(resolve) => out.push_str(&resolve(node.as_ref())?),
                None => {
                    return Err(ModelError::UnresolvedReference {
                        model: node.name().to_string(),
                        placeholder: node.name().to_string(),
                    })
                }
            },

            Token::Raw(s) => out.push_str(s),
        }
        Ok(())
    }

    /// Serialize this token to a string for the given dialect.
    pub fn serialize(&self, dialect: Dialect) -> ModelResult<String> {
        let mut out = String::new();
        self.render(&RenderContext::new(dialect), &mut out)?;
        Ok(out)
    }
}

/// A stream of tokens that can be serialized to SQL.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenStream {
    tokens: Vec<Token>,
}

impl TokenStream {
    /// Create an empty token stream.
    pub fn new() -> Self {
        Self { tokens: vec![] }
    }

    /// Push a single token.
    pub fn push(&mut self, token: Token) -> &mut Self {
        self.tokens.push(token);
        self
    }

    /// Extend with multiple tokens.
    pub fn extend(&mut self, tokens: impl IntoIterator<Item = Token>) -> &mut Self {
        self.tokens.extend(tokens);
        self
    }

    /// Append another token stream.
    pub fn append(&mut self, other: &TokenStream) -> &mut Self {
        self.tokens.extend(other.tokens.iter().cloned());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn into_tokens(self) -> Vec<Token> {
        self.tokens
    }

    /// Render all tokens with the given context.
    pub fn render(&self, ctx: &RenderContext<'_>) -> ModelResult<String> {
        let mut out = String::new();
        for token in &self.tokens {
            token.render(ctx, &mut out)?;
        }
        Ok(out)
    }

    /// Serialize all tokens to a SQL string.
    pub fn serialize(&self, dialect: Dialect) -> ModelResult<String> {
        self.render(&RenderContext::new(dialect))
    }

    // Convenience methods for common tokens
    pub fn space(&mut self) -> &mut Self {
        self.push(Token::Space)
    }
    pub fn comma(&mut self) -> &mut Self {
        self.push(Token::Comma)
    }
    pub fn lparen(&mut self) -> &mut Self {
        self.push(Token::LParen)
    }
    pub fn rparen(&mut self) -> &mut Self {
        self.push(Token::RParen)
    }
    pub fn raw(&mut self, sql: impl Into<String>) -> &mut Self {
        self.push(Token::Raw(sql.into()))
    }
}
