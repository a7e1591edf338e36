//! Clause descriptors staged by the query builder.

use std::fmt;

/// Boolean connective of a WHERE condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Boolean {
    /// `AND`
    #[default]
    And,
    /// `OR`
    Or,
}

impl Boolean {
    /// Returns the SQL keyword.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }
}

impl fmt::Display for Boolean {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One staged WHERE condition.
///
/// Values are not stored here; they live in the builder's binding list in
/// the same order the placeholders are rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WhereClause {
    /// `column op ?`
    Basic {
        column: String,
        operator: String,
        boolean: Boolean,
    },
    /// `column IN (?, ...)` with `count` placeholders.
    In {
        column: String,
        count: usize,
        boolean: Boolean,
    },
    /// `column NOT IN (?, ...)` with `count` placeholders.
    NotIn {
        column: String,
        count: usize,
        boolean: Boolean,
    },
    /// `column IS NULL`
    Null { column: String, boolean: Boolean },
    /// `column IS NOT NULL`
    NotNull { column: String, boolean: Boolean },
}

impl WhereClause {
    /// Returns the connective used when this is not the first condition.
    #[must_use]
    pub const fn boolean(&self) -> Boolean {
        match self {
            Self::Basic { boolean, .. }
            | Self::In { boolean, .. }
            | Self::NotIn { boolean, .. }
            | Self::Null { boolean, .. }
            | Self::NotNull { boolean, .. } => *boolean,
        }
    }

    /// Renders the predicate without its connective.
    #[must_use]
    pub fn to_sql(&self) -> String {
        match self {
            Self::Basic {
                column, operator, ..
            } => format!("{column} {operator} ?"),
            // An empty list matches nothing for IN and everything for NOT IN.
            Self::In { count: 0, .. } => String::from("0 = 1"),
            Self::NotIn { count: 0, .. } => String::from("1 = 1"),
            Self::In { column, count, .. } => format!("{column} IN ({})", placeholders(*count)),
            Self::NotIn { column, count, .. } => {
                format!("{column} NOT IN ({})", placeholders(*count))
            }
            Self::Null { column, .. } => format!("{column} IS NULL"),
            Self::NotNull { column, .. } => format!("{column} IS NOT NULL"),
        }
    }
}

/// Join type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    /// `INNER JOIN`
    Inner,
    /// `LEFT JOIN`
    Left,
    /// `RIGHT JOIN`
    Right,
}

impl JoinKind {
    /// Returns the SQL keyword preceding `JOIN`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Inner => "INNER",
            Self::Left => "LEFT",
            Self::Right => "RIGHT",
        }
    }
}

/// A staged join. Identifiers are rendered as given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Join {
    pub kind: JoinKind,
    pub table: String,
    pub first: String,
    pub operator: String,
    pub second: String,
}

impl Join {
    /// Renders `{TYPE} JOIN table ON first op second`.
    #[must_use]
    pub fn to_sql(&self) -> String {
        format!(
            "{} JOIN {} ON {} {} {}",
            self.kind.as_str(),
            self.table,
            self.first,
            self.operator,
            self.second
        )
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderDirection {
    /// Ascending.
    #[default]
    Asc,
    /// Descending.
    Desc,
}

impl OrderDirection {
    /// Parses a direction: `desc` in any case is descending, anything else
    /// is ascending.
    #[must_use]
    pub fn parse(direction: &str) -> Self {
        if direction.trim().eq_ignore_ascii_case("desc") {
            Self::Desc
        } else {
            Self::Asc
        }
    }

    /// Returns the SQL keyword.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Returns `?, ?, ...` with `count` placeholders.
pub(crate) fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_direction_parse() {
        assert_eq!(OrderDirection::parse("DESC"), OrderDirection::Desc);
        assert_eq!(OrderDirection::parse("desc"), OrderDirection::Desc);
        assert_eq!(OrderDirection::parse("descending"), OrderDirection::Asc);
        assert_eq!(OrderDirection::parse(""), OrderDirection::Asc);
    }

    #[test]
    fn test_empty_in_lists() {
        let clause = WhereClause::In {
            column: "id".into(),
            count: 0,
            boolean: Boolean::And,
        };
        assert_eq!(clause.to_sql(), "0 = 1");
        let clause = WhereClause::NotIn {
            column: "id".into(),
            count: 0,
            boolean: Boolean::And,
        };
        assert_eq!(clause.to_sql(), "1 = 1");
    }

    #[test]
    fn test_join_is_rendered_raw() {
        let join = Join {
            kind: JoinKind::Left,
            table: "posts".into(),
            first: "users.id".into(),
            operator: "=".into(),
            second: "posts.user_id".into(),
        };
        assert_eq!(
            join.to_sql(),
            "LEFT JOIN posts ON users.id = posts.user_id"
        );
    }
}
