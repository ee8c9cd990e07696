//! Reserved SQL keywords shared by the colorizer and the keyword-case rule.

/// Upper-case reserved keywords, sorted.
pub const RESERVED: &[&str] = &[
    "ALL", "ALTER", "AND", "AS", "ASC", "BETWEEN", "BY", "CASE", "CREATE", "CROSS", "DELETE",
    "DESC", "DISTINCT", "DROP", "ELSE", "END", "EXCEPT", "EXISTS", "FROM", "FULL", "GROUP",
    "HAVING", "IN", "INNER", "INSERT", "INTERSECT", "INTO", "IS", "JOIN", "LEFT", "LIKE", "LIMIT",
    "NOT", "NULL", "OFFSET", "ON", "OR", "ORDER", "OUTER", "RIGHT", "SELECT", "SET", "TABLE",
    "THEN", "UNION", "UPDATE", "VALUES", "WHEN", "WHERE", "WITH",
];

/// Returns `true` if `word` is a reserved keyword, in any case.
pub fn is_reserved(word: &str) -> bool {
    RESERVED
        .binary_search_by(|probe| cmp_ignore_ascii_case(probe, word))
        .is_ok()
}

fn cmp_ignore_ascii_case(a: &str, b: &str) -> std::cmp::Ordering {
    a.bytes()
        .map(|c| c.to_ascii_uppercase())
        .cmp(b.bytes().map(|c| c.to_ascii_uppercase()))
}
