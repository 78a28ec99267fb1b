//! RDBMS dialects: pagination clauses and placeholder styles.

use std::borrow::Cow;
use std::fmt::{self, Write as _};
use std::num::NonZeroU32;
use std::str::FromStr;

use crate::error::AuthError;

/// One page of a result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pageable {
    offset: u64,
    size: NonZeroU32,
}

impl Pageable {
    /// Page starting at row `offset` (0-based) holding at most `size` rows.
    pub fn new(offset: u64, size: u32) -> Result<Self, AuthError> {
        let size = NonZeroU32::new(size)
            .ok_or_else(|| AuthError::config("page size must be positive"))?;
        Ok(Self { offset, size })
    }

    #[inline]
    pub fn offset(&self) -> u64 {
        self.offset
    }

    #[inline]
    pub fn size(&self) -> u32 {
        self.size.get()
    }

    /// The page immediately following this one.
    #[inline]
    pub fn next(&self) -> Self {
        Self {
            offset: self.offset.saturating_add(u64::from(self.size.get())),
            size: self.size,
        }
    }
}

/// Database product, selecting pagination syntax and placeholder style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rdbms {
    /// PostgreSQL.
    PostgreSQL,
    /// MySQL/MariaDB.
    MySQL,
    /// SQLite.
    SQLite,
    /// Oracle 12c and later.
    Oracle,
    /// Microsoft SQL Server 2012 and later.
    SqlServer,
    /// IBM Db2.
    Db2,
}

impl Rdbms {
    /// Detect the dialect from a connection URL.
    pub fn from_url(url: &str) -> Option<Self> {
        if url.starts_with("postgres://") || url.starts_with("postgresql://") {
            Some(Self::PostgreSQL)
        } else if url.starts_with("mysql://") || url.starts_with("mariadb://") {
            Some(Self::MySQL)
        } else if url.starts_with("sqlite:") {
            Some(Self::SQLite)
        } else {
            None
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::PostgreSQL => "PostgreSQL",
            Self::MySQL => "MySQL",
            Self::SQLite => "SQLite",
            Self::Oracle => "Oracle",
            Self::SqlServer => "SQLServer",
            Self::Db2 => "DB2",
        }
    }

    /// Whether statements take `$1, $2, ...` instead of `?`.
    #[inline]
    pub fn numbered_placeholders(self) -> bool {
        matches!(self, Self::PostgreSQL)
    }

    /// Append this dialect's limit/offset clause to `query`.
    ///
    /// Trailing whitespace and a trailing `;` are dropped; the rest of the
    /// query is kept verbatim. A query ending in a `--` comment gets the
    /// clause on a new line. Ordering is up to the query itself, except on
    /// SQL Server where `ORDER BY (SELECT NULL)` is added when the query has
    /// none, since OFFSET requires one there.
    pub fn paginate(self, query: &str, page: Pageable) -> String {
        let base = query.trim_end().trim_end_matches(';').trim_end();
        let sep = if ends_in_line_comment(base) { "\n" } else { " " };
        let (offset, size) = (page.offset(), page.size());
        match self {
            Self::PostgreSQL | Self::SQLite => format!("{base}{sep}LIMIT {size} OFFSET {offset}"),
            Self::MySQL => format!("{base}{sep}LIMIT {offset}, {size}"),
            Self::Oracle => format!("{base}{sep}OFFSET {offset} ROWS FETCH NEXT {size} ROWS ONLY"),
            Self::SqlServer => {
                let order = if has_order_by(base) {
                    ""
                } else {
                    "ORDER BY (SELECT NULL) "
                };
                format!("{base}{sep}{order}OFFSET {offset} ROWS FETCH NEXT {size} ROWS ONLY")
            }
            Self::Db2 => format!("{base}{sep}OFFSET {offset} ROWS FETCH FIRST {size} ROWS ONLY"),
        }
    }

    /// Rewrite `?` placeholders into this dialect's style.
    pub fn placeholders<'a>(self, query: &'a str) -> Cow<'a, str> {
        if self.numbered_placeholders() && count_placeholders(query) > 0 {
            Cow::Owned(number_placeholders(query))
        } else {
            Cow::Borrowed(query)
        }
    }
}

impl FromStr for Rdbms {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "postgresql" | "postgres" | "pg" => Ok(Self::PostgreSQL),
            "mysql" | "mariadb" => Ok(Self::MySQL),
            "sqlite" => Ok(Self::SQLite),
            "oracle" => Ok(Self::Oracle),
            "sqlserver" | "mssql" => Ok(Self::SqlServer),
            "db2" => Ok(Self::Db2),
            _ => Err(AuthError::config(format!("unsupported RDBMS dialect '{s}'"))),
        }
    }
}

impl fmt::Display for Rdbms {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Whether `query` has an ORDER BY of its own, ignoring literals,
/// comments and anything inside parentheses.
fn has_order_by(query: &str) -> bool {
    let mut top_level = String::with_capacity(query.len());
    let mut depth = 0usize;
    scan_sql(query, |c, lexeme| {
        let code = matches!(lexeme, Lexeme::Code);
        if code {
            match c {
                '(' => depth += 1,
                ')' => depth = depth.saturating_sub(1),
                _ => {}
            }
        }
        let keep = code && depth == 0 && c != '(' && c != ')';
        top_level.push(if keep { c.to_ascii_lowercase() } else { ' ' });
    });
    let words: Vec<&str> = top_level
        .split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .filter(|w| !w.is_empty())
        .collect();
    words.windows(2).any(|w| w == ["order", "by"])
}

/// Whether the last char of `query` sits inside a `--` comment.
fn ends_in_line_comment(query: &str) -> bool {
    let mut last = Lexeme::Code;
    scan_sql(query, |_, lexeme| last = lexeme);
    matches!(last, Lexeme::LineComment)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lexeme {
    Code,
    Quoted(char),
    LineComment,
    BlockComment,
}

/// Feed every char of `query` to `on_char` with the lexeme it belongs to.
/// Opening and closing delimiters belong to their literal or comment.
fn scan_sql(query: &str, mut on_char: impl FnMut(char, Lexeme)) {
    let mut state = Lexeme::Code;
    let mut chars = query.chars().peekable();
    while let Some(c) = chars.next() {
        match state {
            Lexeme::Code => match c {
                '\'' | '"' | '`' => {
                    state = Lexeme::Quoted(c);
                    on_char(c, state);
                }
                '-' if chars.peek() == Some(&'-') => {
                    state = Lexeme::LineComment;
                    on_char(c, state);
                }
                '/' if chars.peek() == Some(&'*') => {
                    state = Lexeme::BlockComment;
                    on_char(c, state);
                    if let Some(star) = chars.next() {
                        on_char(star, state);
                    }
                }
                _ => on_char(c, Lexeme::Code),
            },
            Lexeme::Quoted(q) => {
                on_char(c, state);
                if c == q {
                    state = Lexeme::Code;
                }
            }
            Lexeme::LineComment => {
                on_char(c, state);
                if c == '\n' {
                    state = Lexeme::Code;
                }
            }
            Lexeme::BlockComment => {
                on_char(c, state);
                if c == '*' && chars.peek() == Some(&'/') {
                    if let Some(slash) = chars.next() {
                        on_char(slash, state);
                    }
                    state = Lexeme::Code;
                }
            }
        }
    }
}

/// Number of `?` placeholders outside quoted literals, identifiers and
/// comments.
pub fn count_placeholders(query: &str) -> usize {
    let mut count = 0;
    scan_sql(query, |c, lexeme| {
        if c == '?' && lexeme == Lexeme::Code {
            count += 1;
        }
    });
    count
}

/// Rewrite `?` placeholders as `$1, $2, ...`.
pub fn number_placeholders(query: &str) -> String {
    let mut out = String::with_capacity(query.len() + 8);
    let mut n = 0usize;
    scan_sql(query, |c, lexeme| {
        if c == '?' && lexeme == Lexeme::Code {
            n += 1;
            let _ = write!(out, "${n}");
        } else {
            out.push(c);
        }
    });
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "SELECT id, username FROM users ORDER BY id";

    fn page(offset: u64, size: u32) -> Pageable {
        Pageable::new(offset, size).unwrap()
    }

    #[test]
    fn clauses_per_dialect() {
        let p = page(40, 20);
        assert_eq!(
            Rdbms::PostgreSQL.paginate(BASE, p),
            format!("{BASE} LIMIT 20 OFFSET 40")
        );
        assert_eq!(Rdbms::SQLite.paginate(BASE, p), format!("{BASE} LIMIT 20 OFFSET 40"));
        assert_eq!(Rdbms::MySQL.paginate(BASE, p), format!("{BASE} LIMIT 40, 20"));
        assert_eq!(
            Rdbms::Oracle.paginate(BASE, p),
            format!("{BASE} OFFSET 40 ROWS FETCH NEXT 20 ROWS ONLY")
        );
        assert_eq!(
            Rdbms::SqlServer.paginate(BASE, p),
            format!("{BASE} OFFSET 40 ROWS FETCH NEXT 20 ROWS ONLY")
        );
        assert_eq!(
            Rdbms::Db2.paginate(BASE, p),
            format!("{BASE} OFFSET 40 ROWS FETCH FIRST 20 ROWS ONLY")
        );
    }

    #[test]
    fn dialects_differ_only_in_clause() {
        let p = page(0, 20);
        let pg = Rdbms::PostgreSQL.paginate(BASE, p);
        let my = Rdbms::MySQL.paginate(BASE, p);
        assert_ne!(pg, my);
        assert_eq!(pg.strip_prefix(BASE), Some(" LIMIT 20 OFFSET 0"));
        assert_eq!(my.strip_prefix(BASE), Some(" LIMIT 0, 20"));
    }

    #[test]
    fn trailing_semicolon_and_whitespace_dropped() {
        let q = "SELECT * FROM users ORDER BY id ; \n";
        assert_eq!(
            Rdbms::PostgreSQL.paginate(q, page(0, 5)),
            "SELECT * FROM users ORDER BY id LIMIT 5 OFFSET 0"
        );
    }

    #[test]
    fn sql_server_gets_order_by_when_missing() {
        assert_eq!(
            Rdbms::SqlServer.paginate("SELECT * FROM users", page(10, 5)),
            "SELECT * FROM users ORDER BY (SELECT NULL) OFFSET 10 ROWS FETCH NEXT 5 ROWS ONLY"
        );
        assert_eq!(
            Rdbms::SqlServer.paginate("SELECT * FROM users order\n by name", page(0, 5)),
            "SELECT * FROM users order\n by name OFFSET 0 ROWS FETCH NEXT 5 ROWS ONLY"
        );
    }

    #[test]
    fn sql_server_order_by_detection() {
        let p = page(0, 5);
        let suffix = " OFFSET 0 ROWS FETCH NEXT 5 ROWS ONLY";
        for q in [
            "SELECT * FROM users ORDER BY(id)",
            "SELECT * FROM users ORDER\tBY name",
        ] {
            assert_eq!(Rdbms::SqlServer.paginate(q, p), format!("{q}{suffix}"));
        }
        for q in [
            "SELECT * FROM (SELECT TOP 10 * FROM users ORDER BY id) u",
            "SELECT * FROM users WHERE note = 'order by'",
            "SELECT * FROM users /* order by id */",
            "SELECT reorder, by_name FROM users",
        ] {
            assert_eq!(
                Rdbms::SqlServer.paginate(q, p),
                format!("{q} ORDER BY (SELECT NULL){suffix}"),
                "{q}"
            );
        }
    }

    #[test]
    fn trailing_line_comment_gets_new_line() {
        let p = page(10, 5);
        assert_eq!(
            Rdbms::SqlServer.paginate("SELECT * FROM users -- order by id", p),
            "SELECT * FROM users -- order by id\nORDER BY (SELECT NULL) OFFSET 10 ROWS FETCH NEXT 5 ROWS ONLY"
        );
        assert_eq!(
            Rdbms::PostgreSQL.paginate("SELECT * FROM users ORDER BY id -- newest last", p),
            "SELECT * FROM users ORDER BY id -- newest last\nLIMIT 5 OFFSET 10"
        );
        assert_eq!(
            Rdbms::MySQL.paginate("SELECT * FROM users /* all */", p),
            "SELECT * FROM users /* all */ LIMIT 10, 5"
        );
    }

    #[test]
    fn zero_page_size_rejected() {
        assert!(matches!(Pageable::new(0, 0), Err(AuthError::Config(_))));
    }

    #[test]
    fn next_page() {
        let p = page(0, 20).next();
        assert_eq!((p.offset(), p.size()), (20, 20));
    }

    #[test]
    fn dialect_names() {
        assert_eq!("PostgreSQL".parse::<Rdbms>().unwrap(), Rdbms::PostgreSQL);
        assert_eq!("postgres".parse::<Rdbms>().unwrap(), Rdbms::PostgreSQL);
        assert_eq!("MariaDB".parse::<Rdbms>().unwrap(), Rdbms::MySQL);
        assert_eq!("SQL_SERVER".parse::<Rdbms>().unwrap(), Rdbms::SqlServer);
        assert_eq!("MSSQL".parse::<Rdbms>().unwrap(), Rdbms::SqlServer);
        assert_eq!("db2".parse::<Rdbms>().unwrap(), Rdbms::Db2);
        assert!(matches!("informix".parse::<Rdbms>(), Err(AuthError::Config(_))));
        for rdbms in [
            Rdbms::PostgreSQL,
            Rdbms::MySQL,
            Rdbms::SQLite,
            Rdbms::Oracle,
            Rdbms::SqlServer,
            Rdbms::Db2,
        ] {
            assert_eq!(rdbms.name().parse::<Rdbms>().unwrap(), rdbms);
        }
    }

    #[test]
    fn url_detection() {
        assert_eq!(Rdbms::from_url("postgres://localhost/db"), Some(Rdbms::PostgreSQL));
        assert_eq!(Rdbms::from_url("postgresql://localhost/db"), Some(Rdbms::PostgreSQL));
        assert_eq!(Rdbms::from_url("mysql://localhost/db"), Some(Rdbms::MySQL));
        assert_eq!(Rdbms::from_url("mariadb://localhost/db"), Some(Rdbms::MySQL));
        assert_eq!(Rdbms::from_url("sqlite::memory:"), Some(Rdbms::SQLite));
        assert_eq!(Rdbms::from_url("oracle://localhost"), None);
    }

    #[test]
    fn placeholder_rewrite_skips_literals() {
        let q = "SELECT * FROM users WHERE name = ? AND note <> 'why?' AND \"col?\" = ?";
        assert_eq!(count_placeholders(q), 2);
        assert_eq!(
            number_placeholders(q),
            "SELECT * FROM users WHERE name = $1 AND note <> 'why?' AND \"col?\" = $2"
        );
    }

    #[test]
    fn placeholder_rewrite_skips_comments() {
        let q = "SELECT hash FROM users -- which user?\nWHERE username = ? /* or id? */ AND 1 = 1";
        assert_eq!(count_placeholders(q), 1);
        assert_eq!(
            number_placeholders(q),
            "SELECT hash FROM users -- which user?\nWHERE username = $1 /* or id? */ AND 1 = 1"
        );
        // A lone '-' or '/' is still code.
        assert_eq!(count_placeholders("SELECT ? - 1, ? / 2"), 2);
    }

    #[test]
    fn placeholders_only_rewritten_for_postgres() {
        let q = "SELECT 1 FROM users WHERE id = ?";
        assert_eq!(Rdbms::PostgreSQL.placeholders(q), "SELECT 1 FROM users WHERE id = $1");
        assert_eq!(Rdbms::MySQL.placeholders(q), q);
        assert_eq!(Rdbms::SQLite.placeholders(q), q);
        let numbered = "SELECT 1 FROM users WHERE id = $1";
        assert!(matches!(Rdbms::PostgreSQL.placeholders(numbered), Cow::Borrowed(_)));
    }
}
