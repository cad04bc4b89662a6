//! Compiler from query tokens to the native match tree.

use bson::{doc, Document};
use ormbridge_proto::{Connective, QueryExpression, QueryToken, Statement};
use tracing::trace;

use crate::clause;
use crate::error::{CompileError, CompileErrorKind, TokenPath};
use crate::native::NativeQuery;
use crate::validate::validate_sequence;

/// How date-typed bounds are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateSerialization {
    /// The store's native datetime.
    #[default]
    Native,
    /// `YYYY-MM-DDTHH:MM:SS.mmmZ` strings.
    IsoString,
}

/// Compiler settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CompileOptions {
    /// Rendering of date-typed bounds.
    pub date_serialization: DateSerialization,
}

impl CompileOptions {
    /// Set the date rendering.
    pub fn with_date_serialization(mut self, date_serialization: DateSerialization) -> Self {
        self.date_serialization = date_serialization;
        self
    }
}

/// Compiler for query token sequences.
///
/// Compilation is pure: the same tokens always produce the same tree.
#[derive(Debug, Clone, Copy, Default)]
pub struct Compiler {
    options: CompileOptions,
}

impl Compiler {
    /// Create a compiler with the given options.
    pub fn new(options: CompileOptions) -> Self {
        Self { options }
    }

    /// The options in force.
    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    /// Compile a token sequence to a match tree.
    pub fn compile(&self, tokens: &[QueryToken]) -> Result<NativeQuery, CompileError> {
        let tree = self.compile_sequence(tokens, &TokenPath::root())?;
        trace!(tree = ?tree, "compiled query");
        Ok(tree)
    }

    /// Compile an expression into an aggregation pipeline of one `$match` stage.
    ///
    /// An empty expression yields `[{"$match": {}}]`.
    pub fn to_pipeline(&self, expression: &QueryExpression) -> Result<Vec<Document>, CompileError> {
        let tree = self.compile(&expression.query)?;
        Ok(vec![doc! { "$match": tree.to_document() }])
    }

    fn compile_sequence(
        &self,
        tokens: &[QueryToken],
        path: &TokenPath,
    ) -> Result<NativeQuery, CompileError> {
        if tokens.is_empty() {
            return Ok(NativeQuery::MatchAll);
        }

        validate_sequence(tokens, path)?;

        // No connectives at all: everything is AND'd together
        if tokens.iter().all(|t| !t.is_connective()) {
            let children = tokens
                .iter()
                .enumerate()
                .map(|(i, t)| self.compile_token(t, &path.child(i)))
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(NativeQuery::And(children));
        }

        // Validation guarantees statement/connective alternation, so the chain
        // splits into overlapping (left, connective, right) triples at even
        // offsets. Folding them from the right nests each connective under
        // the one before it.
        let mut acc: Option<NativeQuery> = None;
        for start in (0..tokens.len() - 2).step_by(2).rev() {
            let connective = tokens[start + 1].as_connective().ok_or_else(|| {
                CompileError::new(
                    "expected AND or OR between statements",
                    path.child(start + 1),
                    CompileErrorKind::UnhandledToken,
                )
            })?;
            let left = self.compile_token(&tokens[start], &path.child(start))?;
            let right = match acc.take() {
                Some(previous) => previous,
                None => self.compile_token(&tokens[start + 2], &path.child(start + 2))?,
            };
            acc = Some(combine(connective, left, right));
        }

        acc.ok_or_else(|| {
            CompileError::new(
                "query chain produced no clauses",
                path.clone(),
                CompileErrorKind::UnhandledToken,
            )
        })
    }

    fn compile_token(&self, token: &QueryToken, path: &TokenPath) -> Result<NativeQuery, CompileError> {
        match token {
            QueryToken::Group(inner) => self.compile_sequence(inner, path),
            QueryToken::Statement(Statement::Property(p)) => clause::property_clause(p, path),
            QueryToken::Statement(Statement::DatesBefore(d)) => Ok(clause::dates_before_clause(
                d,
                self.options.date_serialization,
            )),
            QueryToken::Statement(Statement::DatesAfter(d)) => Ok(clause::dates_after_clause(
                d,
                self.options.date_serialization,
            )),
            QueryToken::Connective(c) => Err(CompileError::new(
                format!("unexpected connective {}", c),
                path.clone(),
                CompileErrorKind::UnhandledToken,
            )),
        }
    }
}

fn combine(connective: Connective, left: NativeQuery, right: NativeQuery) -> NativeQuery {
    match connective {
        Connective::And => NativeQuery::And(vec![left, right]),
        Connective::Or => NativeQuery::Or(vec![left, right]),
    }
}

/// Compile a token sequence with default options.
pub fn compile(tokens: &[QueryToken]) -> Result<NativeQuery, CompileError> {
    Compiler::default().compile(tokens)
}

/// Compile an expression to a pipeline with default options.
pub fn to_pipeline(expression: &QueryExpression) -> Result<Vec<Document>, CompileError> {
    Compiler::default().to_pipeline(expression)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MalformedRule;
    use bson::Bson;
    use chrono::{TimeZone, Utc};
    use ormbridge_proto::{
        DateBoundOptions, PropertyOptions, PropertyQuery, QueryBuilder, ValueType,
    };
    use pretty_assertions::assert_eq;

    fn exact(key: &str, value: &str) -> QueryToken {
        PropertyQuery::new(key, value).case_sensitive(true).into()
    }

    fn and() -> QueryToken {
        Connective::And.into()
    }

    fn or() -> QueryToken {
        Connective::Or.into()
    }

    #[test]
    fn test_empty_is_match_all() {
        assert_eq!(compile(&[]).unwrap(), NativeQuery::MatchAll);
        assert_eq!(
            to_pipeline(&QueryExpression::all()).unwrap(),
            vec![doc! { "$match": {} }]
        );
    }

    #[test]
    fn test_implicit_and() {
        let tree = compile(&[exact("a", "1"), exact("b", "2"), exact("c", "3")]).unwrap();
        assert_eq!(
            tree.to_document(),
            doc! { "$and": [ { "a": "1" }, { "b": "2" }, { "c": "3" } ] }
        );
    }

    #[test]
    fn test_single_statement_keeps_and_wrapper() {
        let tree = compile(&[exact("a", "1")]).unwrap();
        assert_eq!(tree.to_document(), doc! { "$and": [ { "a": "1" } ] });
    }

    #[test]
    fn test_simple_or() {
        let tree = compile(&[exact("a", "1"), or(), exact("b", "2")]).unwrap();
        assert_eq!(
            tree.to_document(),
            doc! { "$or": [ { "a": "1" }, { "b": "2" } ] }
        );
    }

    #[test]
    fn test_right_fold_grouping() {
        let tokens = [
            exact("a", "A"),
            or(),
            exact("b", "B"),
            and(),
            exact("c", "C"),
            or(),
            exact("d", "D"),
        ];
        let tree = compile(&tokens).unwrap();
        assert_eq!(
            tree.to_document(),
            doc! {
                "$or": [
                    { "a": "A" },
                    { "$and": [
                        { "b": "B" },
                        { "$or": [ { "c": "C" }, { "d": "D" } ] },
                    ] },
                ]
            }
        );
    }

    #[test]
    fn test_mixed_chain_from_builder() {
        let expr = QueryBuilder::new()
            .property("test", "value1", PropertyOptions::default())
            .or()
            .property("test", "value2", PropertyOptions::default())
            .and()
            .property("prop2", 2, PropertyOptions::default())
            .and()
            .property("prop3", 3, PropertyOptions::default())
            .or()
            .property("prop4", 4, PropertyOptions::default())
            .compile();

        let pipeline = to_pipeline(&expr).unwrap();
        let ci = |p: &str| doc! { "$regex": p, "$options": "i" };
        assert_eq!(
            pipeline,
            vec![doc! {
                "$match": {
                    "$or": [
                        { "test": ci("^value1$") },
                        { "$and": [
                            { "test": ci("^value2$") },
                            { "$and": [
                                { "prop2": ci("^2$") },
                                { "$or": [
                                    { "prop3": ci("^3$") },
                                    { "prop4": ci("^4$") },
                                ] },
                            ] },
                        ] },
                    ]
                }
            }]
        );
    }

    #[test]
    fn test_groups_compile_recursively() {
        let tokens = [
            exact("a", "1"),
            and(),
            QueryToken::Group(vec![exact("b", "2"), or(), exact("c", "3")]),
        ];
        let tree = compile(&tokens).unwrap();
        assert_eq!(
            tree.to_document(),
            doc! { "$and": [ { "a": "1" }, { "$or": [ { "b": "2" }, { "c": "3" } ] } ] }
        );
    }

    #[test]
    fn test_group_errors_carry_nested_path() {
        let tokens = [
            exact("a", "1"),
            and(),
            QueryToken::Group(vec![exact("b", "2"), or()]),
        ];
        let err = compile(&tokens).unwrap_err();
        assert_eq!(err.malformed_rule(), Some(MalformedRule::TrailingConnective));
        assert_eq!(err.path.indices(), &[2, 1]);
    }

    #[test]
    fn test_malformed_sequences_rejected() {
        let cases: Vec<(Vec<QueryToken>, MalformedRule)> = vec![
            (vec![and(), exact("a", "1")], MalformedRule::LeadingConnective),
            (vec![exact("a", "1"), and()], MalformedRule::TrailingConnective),
            (
                vec![exact("a", "1"), and(), or(), exact("b", "2")],
                MalformedRule::AdjacentConnectives,
            ),
            (
                vec![exact("a", "1"), exact("b", "2"), and(), exact("c", "3")],
                MalformedRule::ConnectiveCount,
            ),
        ];
        for (tokens, expected) in cases {
            let err = compile(&tokens).unwrap_err();
            assert!(err.is_malformed());
            assert_eq!(err.malformed_rule(), Some(expected), "tokens: {:?}", tokens);
        }
    }

    #[test]
    fn test_compilation_is_idempotent() {
        let expr = QueryBuilder::new()
            .property("name", "x", PropertyOptions::default().includes())
            .or()
            .group(|b| {
                b.property("age", 3, PropertyOptions::number().gt())
                    .and()
                    .dates_after("born", "2020-01-01", DateBoundOptions::inclusive())
            })
            .compile();
        let compiler = Compiler::default();
        assert_eq!(
            compiler.compile(&expr.query).unwrap(),
            compiler.compile(&expr.query).unwrap()
        );
    }

    #[test]
    fn test_date_serialization_option() {
        let dt = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let expr = QueryBuilder::new()
            .dates_after("my-key", dt, DateBoundOptions::default())
            .compile();

        let native = Compiler::default().compile(&expr.query).unwrap();
        assert_eq!(
            native.to_document(),
            doc! { "$and": [ { "my-key": { "$gt": Bson::DateTime(bson::DateTime::from_millis(dt.timestamp_millis())) } } ] }
        );

        let iso = Compiler::new(
            CompileOptions::default().with_date_serialization(DateSerialization::IsoString),
        )
        .compile(&expr.query)
        .unwrap();
        assert_eq!(
            iso.to_document(),
            doc! { "$and": [ { "my-key": { "$gt": "2020-01-01T00:00:00.000Z" } } ] }
        );
    }

    #[test]
    fn test_string_typed_date_bounds() {
        let expr = QueryBuilder::new()
            .dates_before(
                "my-key",
                "2020-01-01",
                DateBoundOptions::inclusive().with_value_type(ValueType::String),
            )
            .compile();
        assert_eq!(
            to_pipeline(&expr).unwrap(),
            vec![doc! { "$match": { "$and": [ { "my-key": { "$lte": "2020-01-01" } } ] } }]
        );
    }

    #[test]
    fn test_symbol_error_surfaces_from_nested_token() {
        let tokens = [
            exact("a", "1"),
            or(),
            PropertyQuery::new("name", "x")
                .with_symbol(ormbridge_proto::EqualitySymbol::Lt)
                .into(),
        ];
        let err = compile(&tokens).unwrap_err();
        assert_eq!(err.kind, CompileErrorKind::SymbolUnhandled);
        assert_eq!(err.path.indices(), &[2]);
    }
}
