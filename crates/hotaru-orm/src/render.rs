//! SQL statement templates and the placeholder renderer.
//!
//! Every statement hotaru produces is one of four fixed templates with named
//! slot tokens. Clause builders compute the text for each slot; [`render`]
//! substitutes them in a single linear pass. Slots that a statement does not
//! use are replaced with an empty string, and every template stays valid SQL
//! under an empty substitution at any slot.
//!
//! This is deliberately not a template engine: each token is unique, cannot
//! occur in legitimate SQL, and replacement text is never re-scanned, so
//! plain whole-token substitution is both correct and sufficient.

/// Statement operator keyword slot (`INSERT`, `INSERT IGNORE`, `REPLACE`).
pub const KW_OPERATOR: &str = "{{HOTARU_OPERATOR}}";
/// Target table slot, including an optional alias.
pub const KW_TABLE: &str = "{{HOTARU_TABLE}}";
/// Field list slot (SELECT projection, INSERT columns, UPDATE assignments).
pub const KW_FIELDS: &str = "{{HOTARU_FIELDS}}";
/// INSERT value list slot.
pub const KW_VALUES: &str = "{{HOTARU_VALUES}}";
/// `ON DUPLICATE KEY UPDATE ...` slot.
pub const KW_DUPLICATE_KEY: &str = "{{HOTARU_DUPLICATE_KEY}}";
/// Join clause slot.
pub const KW_JOIN: &str = "{{HOTARU_JOIN}}";
/// Where clause slot.
pub const KW_WHERE: &str = "{{HOTARU_WHERE}}";
/// Group-by clause slot.
pub const KW_GROUP_BY: &str = "{{HOTARU_GROUP_BY}}";
/// Having clause slot.
pub const KW_HAVING: &str = "{{HOTARU_HAVING}}";
/// Order-by clause slot.
pub const KW_ORDER_BY: &str = "{{HOTARU_ORDER_BY}}";
/// Limit clause slot.
pub const KW_LIMIT: &str = "{{HOTARU_LIMIT}}";
/// Offset clause slot.
pub const KW_OFFSET: &str = "{{HOTARU_OFFSET}}";
/// `DISTINCT` keyword slot.
pub const KW_DISTINCT: &str = "{{HOTARU_DISTINCT}}";
/// `FOR UPDATE` locking clause slot.
pub const KW_FOR_UPDATE: &str = "{{HOTARU_FOR_UPDATE}}";

/// Template for single-row INSERT statements (also REPLACE / INSERT IGNORE).
pub const INSERT_TEMPLATE: &str =
    "{{HOTARU_OPERATOR}} INTO {{HOTARU_TABLE}} ({{HOTARU_FIELDS}}) VALUES ({{HOTARU_VALUES}}) {{HOTARU_DUPLICATE_KEY}}";

/// Template for DELETE statements.
pub const DELETE_TEMPLATE: &str = "DELETE FROM {{HOTARU_TABLE}} {{HOTARU_WHERE}}";

/// Template for UPDATE statements.
pub const UPDATE_TEMPLATE: &str =
    "UPDATE {{HOTARU_TABLE}} SET {{HOTARU_FIELDS}} {{HOTARU_WHERE}}";

/// Template for SELECT statements.
pub const SELECT_TEMPLATE: &str =
    "SELECT {{HOTARU_DISTINCT}} {{HOTARU_FIELDS}} FROM {{HOTARU_TABLE}} {{HOTARU_JOIN}} {{HOTARU_WHERE}} {{HOTARU_GROUP_BY}} {{HOTARU_HAVING}} {{HOTARU_ORDER_BY}} {{HOTARU_LIMIT}} {{HOTARU_OFFSET}} {{HOTARU_FOR_UPDATE}}";

/// Substitutes every `(token, text)` pair into the template, whole-token,
/// exactly once per token occurrence, then normalizes the whitespace left
/// behind by empty slots.
///
/// The template is scanned left to right in a single pass; substituted text
/// is never re-scanned, so a replacement that happens to contain a token
/// stays literal. Rendering is pure: the same template and substitutions
/// always produce byte-identical output.
pub fn render(template: &str, substitutions: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while !rest.is_empty() {
        let next = substitutions
            .iter()
            .filter_map(|(token, text)| rest.find(token).map(|at| (at, *token, *text)))
            .min_by_key(|(at, _, _)| *at);
        match next {
            Some((at, token, text)) => {
                out.push_str(&rest[..at]);
                out.push_str(text);
                rest = &rest[at + token.len()..];
            }
            None => {
                out.push_str(rest);
                break;
            }
        }
    }
    squeeze(&out)
}

/// Collapses runs of spaces into one and trims the ends. Empty slot
/// substitutions leave double spaces behind; bound values never contain
/// literal text, so whitespace inside the statement is never significant.
fn squeeze(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut last_space = false;
    for ch in sql.chars() {
        if ch == ' ' {
            if !last_space {
                out.push(' ');
            }
            last_space = true;
        } else {
            out.push(ch);
            last_space = false;
        }
    }
    out.trim().to_string()
}
