//! Query Classification
//!
//! A pure, case-insensitive classifier mapping raw query text to
//! [`Classification`]. It runs before any node selection: a `Blocked`
//! result short-circuits the whole pipeline and the query never reaches
//! a database node.
//!
//! The blocklist is an explicit denylist of destructive statement shapes,
//! not a SQL parser and not an injection defense:
//!
//! - `DROP TABLE` anywhere in the text
//! - `DROP DATABASE` anywhere in the text
//! - the `TRUNCATE` keyword anywhere in the text
//! - `DELETE FROM <identifier>` with no `WHERE` clause before the end of
//!   the text (an optional trailing `;` is allowed)
//!
//! Any query that passes the denylist is `Read` when its leading keyword
//! is `SELECT` and `Write` otherwise.

/// Outcome of classifying a query's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Matches the destructive-statement denylist; must never execute.
    Blocked,
    /// Leading keyword is `SELECT`; eligible for replica routing.
    Read,
    /// Everything else; always routed to the primary.
    Write,
}

/// Classifies a query by its text alone.
///
/// The requested routing strategy never influences classification.
pub fn classify(query: &str) -> Classification {
    let tokens: Vec<String> = query
        .split_whitespace()
        .map(|t| t.to_ascii_uppercase())
        .collect();

    if is_blocked(&tokens) {
        return Classification::Blocked;
    }

    match tokens.first() {
        Some(first) if keyword(first) == "SELECT" => Classification::Read,
        _ => Classification::Write,
    }
}

fn is_blocked(tokens: &[String]) -> bool {
    for (i, tok) in tokens.iter().enumerate() {
        let word = keyword(tok);
        if word == "TRUNCATE" {
            return true;
        }
        if word == "DROP" {
            if let Some(next) = tokens.get(i + 1) {
                let next = keyword(next);
                if next == "TABLE" || next == "DATABASE" {
                    return true;
                }
            }
        }
        if word == "DELETE" && is_delete_without_where(&tokens[i..]) {
            return true;
        }
    }
    false
}

/// Matches `DELETE FROM <identifier>` followed by nothing but an optional
/// statement terminator. A `WHERE` clause (or anything else) after the
/// table name makes the statement acceptable.
fn is_delete_without_where(tokens: &[String]) -> bool {
    if tokens.len() < 3 || keyword(&tokens[0]) != "DELETE" || keyword(&tokens[1]) != "FROM" {
        return false;
    }

    let table = tokens[2].trim_end_matches(';');
    let is_identifier = !table.is_empty()
        && table
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !is_identifier {
        return false;
    }

    match &tokens[3..] {
        [] => true,
        [term] => term == ";",
        _ => false,
    }
}

/// Strips punctuation glued onto a token so `TRUNCATE;` or `(SELECT`
/// still match their keyword.
fn keyword(token: &str) -> &str {
    token.trim_matches(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_is_read() {
        assert_eq!(classify("SELECT * FROM actor LIMIT 1"), Classification::Read);
        assert_eq!(classify("select 1"), Classification::Read);
        assert_eq!(classify("  SeLeCt now()  "), Classification::Read);
    }

    #[test]
    fn test_non_select_is_write() {
        assert_eq!(
            classify("UPDATE actor SET last_update = NOW() WHERE actor_id = 1"),
            Classification::Write
        );
        assert_eq!(
            classify("INSERT INTO actor (first_name) VALUES ('A')"),
            Classification::Write
        );
        assert_eq!(classify("SHOW TABLES"), Classification::Write);
    }

    #[test]
    fn test_drop_table_blocked() {
        assert_eq!(classify("DROP TABLE actor"), Classification::Blocked);
        assert_eq!(classify("drop   table actor"), Classification::Blocked);
        // even buried mid-query
        assert_eq!(
            classify("SELECT 1; DROP TABLE actor"),
            Classification::Blocked
        );
    }

    #[test]
    fn test_drop_database_blocked() {
        assert_eq!(classify("DROP DATABASE sakila"), Classification::Blocked);
        assert_eq!(classify("Drop Database sakila;"), Classification::Blocked);
    }

    #[test]
    fn test_truncate_blocked() {
        assert_eq!(classify("TRUNCATE actor"), Classification::Blocked);
        assert_eq!(classify("TRUNCATE TABLE actor"), Classification::Blocked);
        assert_eq!(classify("truncate actor;"), Classification::Blocked);
    }

    #[test]
    fn test_delete_without_where_blocked() {
        assert_eq!(classify("DELETE FROM actor"), Classification::Blocked);
        assert_eq!(classify("DELETE FROM actor;"), Classification::Blocked);
        assert_eq!(classify("delete from actor ;"), Classification::Blocked);
    }

    #[test]
    fn test_delete_with_where_allowed() {
        assert_eq!(
            classify("DELETE FROM actor WHERE actor_id = 1"),
            Classification::Write
        );
    }

    #[test]
    fn test_drop_without_table_or_database_allowed() {
        // DROP INDEX is not on the denylist
        assert_eq!(classify("DROP INDEX idx ON actor"), Classification::Write);
    }

    #[test]
    fn test_empty_query_is_write() {
        // empty text never matches the denylist; the gate rejects it
        // before classification matters
        assert_eq!(classify(""), Classification::Write);
        assert_eq!(classify("   "), Classification::Write);
    }
}
