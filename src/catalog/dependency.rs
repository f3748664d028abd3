//! Recover the tables a view reads from its SQL definition
use crate::constants::DEFAULT_SCHEMA;
use anyhow::{Context, Result};
use itertools::Itertools;
use serde::Serialize;
use sqlparser::dialect::RedshiftSqlDialect;
use sqlparser::keywords::Keyword;
use sqlparser::tokenizer::{Token, Tokenizer, Word};
use std::collections::HashSet;
use tracing::{error, warn};

/// A table referenced by a view definition
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Dependency {
    pub name: String,
    pub schema: String,
}

impl Dependency {
    pub fn new(name: &str, schema: &str) -> Self {
        Self {
            name: name.to_string(),
            schema: schema.to_string(),
        }
    }

    /// `schema.name`, the identity used to link objects in the lineage graph
    pub fn uid(&self) -> String {
        format!("{}.{}", self.schema, self.name)
    }
}

/// Words that can follow FROM without naming a relation
const NOT_A_RELATION: &[Keyword] = &[
    Keyword::SELECT,
    Keyword::WITH,
    Keyword::LATERAL,
    Keyword::VALUES,
    Keyword::UNNEST,
];

/// Functions whose argument syntax contains a FROM keyword
const FROM_IN_ARGUMENTS: &[Keyword] = &[
    Keyword::EXTRACT,
    Keyword::TRIM,
    Keyword::SUBSTRING,
    Keyword::OVERLAY,
    Keyword::POSITION,
];

/// Words that end a function argument list when scanning back from a FROM
const ARGUMENT_BOUNDARIES: &[Keyword] = &[
    Keyword::SELECT,
    Keyword::FROM,
    Keyword::WHERE,
    Keyword::ON,
    Keyword::JOIN,
    Keyword::AND,
    Keyword::OR,
    Keyword::WHEN,
    Keyword::THEN,
    Keyword::ELSE,
];

/// How far back from a FROM to look for the function that owns it
const ARGUMENT_LOOKBACK: usize = 8;

/// Words that start the next clause after a relation, so never an alias
const CLAUSE_KEYWORDS: &[Keyword] = &[
    Keyword::SELECT,
    Keyword::FROM,
    Keyword::WITH,
    Keyword::WHERE,
    Keyword::JOIN,
    Keyword::INNER,
    Keyword::LEFT,
    Keyword::RIGHT,
    Keyword::FULL,
    Keyword::CROSS,
    Keyword::NATURAL,
    Keyword::OUTER,
    Keyword::ON,
    Keyword::USING,
    Keyword::GROUP,
    Keyword::ORDER,
    Keyword::HAVING,
    Keyword::QUALIFY,
    Keyword::WINDOW,
    Keyword::UNION,
    Keyword::EXCEPT,
    Keyword::INTERSECT,
    Keyword::MINUS,
    Keyword::LIMIT,
    Keyword::OFFSET,
    Keyword::FETCH,
    Keyword::PIVOT,
    Keyword::UNPIVOT,
    Keyword::AND,
    Keyword::OR,
    Keyword::END,
];

/// Extract the tables a view definition reads from.
///
/// Parentheses are removed before scanning so that identifiers wrapped in
/// function-call-like syntax still surface as plain references. Unqualified
/// names resolve to `public`. Extraction is best effort: an identifier with
/// more than one dot is skipped with a warning, and a definition that cannot
/// be tokenized yields no dependencies and an error log instead of a failure.
pub fn extract_dependencies(definition: Option<&str>) -> Vec<Dependency> {
    let Some(definition) = definition.filter(|d| !d.trim().is_empty()) else {
        return Vec::new();
    };

    let stripped: String = definition
        .chars()
        .filter(|c| !matches!(c, '(' | ')'))
        .collect();

    match referenced_tables(&stripped) {
        Ok(tables) => tables.iter().filter_map(|t| parse_identifier(t)).collect(),
        Err(e) => {
            error!(
                definition = definition,
                "Couldn't parse dependencies from view definition: {:#}", e
            );
            Vec::new()
        }
    }
}

fn parse_identifier(identifier: &str) -> Option<Dependency> {
    match identifier.split('.').collect::<Vec<_>>().as_slice() {
        [name] => Some(Dependency::new(name, DEFAULT_SCHEMA)),
        [schema, name] => Some(Dependency::new(name, schema)),
        _ => {
            warn!(
                "Couldn't parse schema and name from {}. Must be in format <schema>.<table> or <table>.",
                identifier
            );
            None
        }
    }
}

/// Names following FROM / JOIN, in first-seen order, without CTE names.
pub fn referenced_tables(sql: &str) -> Result<Vec<String>> {
    let tokens: Vec<Token> = Tokenizer::new(&RedshiftSqlDialect {}, sql)
        .tokenize()
        .context("Failed to tokenize view definition")?
        .into_iter()
        .filter(|t| !matches!(t, Token::Whitespace(_)))
        .collect();

    let mut ctes: HashSet<String> = HashSet::new();
    let mut tables: Vec<String> = Vec::new();
    let mut i = 0;

    while i < tokens.len() {
        let Token::Word(word) = &tokens[i] else {
            i += 1;
            continue;
        };

        if let Some(as_at) = cte_definition(&tokens, i) {
            ctes.insert(word.value.to_lowercase());
            i = as_at;
            continue;
        }

        let keyword = word.keyword;
        let starts_relation = match keyword {
            Keyword::JOIN => true,
            Keyword::FROM => !is_argument_from(&tokens, i),
            _ => false,
        };
        i += 1;
        if !starts_relation {
            continue;
        }

        // FROM a x, b y, ... lists several relations; a CTE list can follow the last one
        while cte_definition(&tokens, i).is_none() {
            let Some((name, next)) = read_object_name(&tokens, i) else {
                break;
            };
            tables.push(name);
            i = skip_alias(&tokens, next);

            if keyword == Keyword::FROM && matches!(tokens.get(i), Some(Token::Comma)) {
                i += 1;
            } else {
                break;
            }
        }
    }

    Ok(tables
        .into_iter()
        .filter(|t| !ctes.contains(&t.to_lowercase()))
        .unique()
        .collect())
}

// `WITH name AS SELECT` or `, name a, b AS SELECT` once parentheses are gone.
// Returns the index of the AS keyword.
fn cte_definition(tokens: &[Token], i: usize) -> Option<usize> {
    let introduced = i > 0
        && match &tokens[i - 1] {
            Token::Comma => true,
            Token::Word(w) => matches!(w.keyword, Keyword::WITH | Keyword::RECURSIVE),
            _ => false,
        };
    if !introduced {
        return None;
    }

    let mut as_at = i + 1;
    if matches!(tokens.get(as_at), Some(Token::Word(w)) if !is_as(w)) {
        as_at += 1;
        while let (Some(Token::Comma), Some(Token::Word(w))) =
            (tokens.get(as_at), tokens.get(as_at + 1))
        {
            if is_as(w) {
                break;
            }
            as_at += 2;
        }
    }

    let defines_query = matches!(tokens.get(as_at), Some(Token::Word(w)) if is_as(w))
        && matches!(
            tokens.get(as_at + 1),
            Some(Token::Word(w)) if matches!(w.keyword, Keyword::SELECT | Keyword::WITH)
        );
    defines_query.then_some(as_at)
}

fn is_as(word: &Word) -> bool {
    word.quote_style.is_none() && word.keyword == Keyword::AS
}

// EXTRACT(year FROM ts), TRIM(BOTH 'x' FROM s), SUBSTRING(s FROM 2), a IS NOT DISTINCT FROM b
fn is_argument_from(tokens: &[Token], i: usize) -> bool {
    let keyword_at = |at: usize| match tokens.get(at) {
        Some(Token::Word(w)) if w.quote_style.is_none() => Some(w.keyword),
        _ => None,
    };

    if i >= 2
        && keyword_at(i - 1) == Some(Keyword::DISTINCT)
        && matches!(keyword_at(i - 2), Some(Keyword::IS | Keyword::NOT))
    {
        return true;
    }

    // The owning function sits at least one argument token before the FROM
    for at in (i.saturating_sub(ARGUMENT_LOOKBACK)..i.saturating_sub(1)).rev() {
        if matches!(tokens[at], Token::Comma) {
            return false;
        }
        let Some(keyword) = keyword_at(at) else {
            continue;
        };
        if FROM_IN_ARGUMENTS.contains(&keyword) {
            // `t.position` is a column, not the function
            return at == 0 || !matches!(tokens[at - 1], Token::Period);
        }
        if ARGUMENT_BOUNDARIES.contains(&keyword) {
            return false;
        }
    }

    false
}

fn read_object_name(tokens: &[Token], start: usize) -> Option<(String, usize)> {
    let first = match tokens.get(start) {
        Some(Token::Word(w)) => w,
        _ => return None,
    };
    if first.quote_style.is_none() && NOT_A_RELATION.contains(&first.keyword) {
        return None;
    }

    let mut parts = vec![first.value.clone()];
    let mut next = start + 1;
    while let (Some(Token::Period), Some(Token::Word(part))) =
        (tokens.get(next), tokens.get(next + 1))
    {
        parts.push(part.value.clone());
        next += 2;
    }

    Some((parts.join("."), next))
}

// `t x`, `t AS x`, and keyword aliases such as `t source`
fn skip_alias(tokens: &[Token], i: usize) -> usize {
    match tokens.get(i) {
        Some(Token::Word(w)) if is_as(w) => match tokens.get(i + 1) {
            Some(Token::Word(_)) => i + 2,
            _ => i + 1,
        },
        Some(Token::Word(w))
            if w.quote_style.is_some() || !CLAUSE_KEYWORDS.contains(&w.keyword) =>
        {
            i + 1
        }
        _ => i,
    }
}
