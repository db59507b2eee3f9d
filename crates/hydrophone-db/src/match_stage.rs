//! SQL translation of the query match stage.
//!
//! Documents live in a JSONB `body` column whose layout mirrors the document
//! paths of the match stage, so each clause becomes one predicate on
//! `body`:
//!
//! - `$in` with literal values: `body #>> '{a,b}' = ANY($n::text[])`
//! - `$in` with the match-all sentinel: `body #>> '{a,b}' ~ $n` bound to `.*`
//! - `$gte`/`$lte`: `(body ->> 'recordTimestamp')::bigint BETWEEN $n AND $m`
//!
//! Every value is bound as a parameter.

use hydrophone_core::defaults::MATCH_ALL_PATTERN;
use hydrophone_core::{Clause, FieldPath, InFilter, Pipeline};

/// Type-safe parameter binding for SQL queries.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryParam {
    /// 64-bit integer parameter.
    BigInt(i64),
    /// String parameter.
    String(String),
    /// Array of strings (for `= ANY`).
    StringArray(Vec<String>),
}

/// JSONB text extraction for a document path, e.g. `body #>> '{studySite,city}'`.
pub fn text_expr(path: FieldPath) -> String {
    format!("body #>> '{{{}}}'", path.segments().join(","))
}

/// Generates the WHERE clause fragment for a pipeline's match stage.
///
/// # Example
///
/// ```rust,ignore
/// use hydrophone_core::{build_pipeline, QueryTransaction};
/// use hydrophone_db::match_stage::MatchStageQueryBuilder;
///
/// let pipeline = build_pipeline(&QueryTransaction::default());
/// let (sql, params) = MatchStageQueryBuilder::new(&pipeline, 0).build();
/// // sql: "body #>> '{publisherName,lastName}' ~ $1 AND ... AND
/// //       (body ->> 'recordTimestamp')::bigint BETWEEN $11 AND $12"
/// ```
pub struct MatchStageQueryBuilder<'a> {
    pipeline: &'a Pipeline,
    param_offset: usize,
}

impl<'a> MatchStageQueryBuilder<'a> {
    /// `param_offset` is the number of parameters already in the query.
    pub fn new(pipeline: &'a Pipeline, param_offset: usize) -> Self {
        Self {
            pipeline,
            param_offset,
        }
    }

    /// SQL fragment joined with `AND`, plus its parameters in order.
    ///
    /// A pipeline with no clauses yields `("TRUE", [])`.
    pub fn build(&self) -> (String, Vec<QueryParam>) {
        let mut clauses = Vec::with_capacity(self.pipeline.clauses().len());
        let mut params = Vec::new();
        let mut param_idx = self.param_offset;

        for clause in self.pipeline.clauses() {
            match clause {
                Clause::In {
                    path,
                    filter: InFilter::MatchAll,
                } => {
                    param_idx += 1;
                    clauses.push(format!("{} ~ ${}", text_expr(*path), param_idx));
                    params.push(QueryParam::String(MATCH_ALL_PATTERN.to_string()));
                }
                Clause::In {
                    path,
                    filter: InFilter::Values(values),
                } => {
                    param_idx += 1;
                    clauses.push(format!("{} = ANY(${}::text[])", text_expr(*path), param_idx));
                    params.push(QueryParam::StringArray(values.clone()));
                }
                Clause::Range { path, gte, lte } => {
                    let key = path.segments().join(",");
                    clauses.push(format!(
                        "(body #>> '{{{}}}')::bigint BETWEEN ${} AND ${}",
                        key,
                        param_idx + 1,
                        param_idx + 2
                    ));
                    param_idx += 2;
                    params.push(QueryParam::BigInt(*gte));
                    params.push(QueryParam::BigInt(*lte));
                }
            }
        }

        let sql = if clauses.is_empty() {
            "TRUE".to_string()
        } else {
            clauses.join(" AND ")
        };
        (sql, params)
    }
}
