//! Scope and text filters over the `notes` table.

use crate::model::folder::FolderId;
use rusqlite::types::Value;

/// Ordering shared by every note listing. `id` breaks exact ties.
pub const NOTE_ORDER_BY: &str = "pinned DESC, updated_at DESC, id DESC";

/// Ordering for folder listings.
pub const FOLDER_ORDER_BY: &str = "name ASC";

/// Subset of notes a listing is restricted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteScope {
    /// Every note.
    All,
    /// Notes flagged as favorite.
    Favorites,
    /// Notes filed under one folder.
    Folder(FolderId),
}

/// A WHERE fragment plus the values bound to its `?` placeholders, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlFilter {
    pub clause: String,
    pub args: Vec<Value>,
}

impl SqlFilter {
    fn new(clause: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            clause: clause.into(),
            args,
        }
    }

    /// Conjunction `(self) AND (other)`; `self`'s arguments come first.
    pub fn and(self, other: SqlFilter) -> SqlFilter {
        let mut args = self.args;
        args.extend(other.args);
        SqlFilter {
            clause: format!("({}) AND ({})", self.clause, other.clause),
            args,
        }
    }
}

/// Builds the scope predicate. [`NoteScope::All`] has none.
pub fn scope_filter(scope: NoteScope) -> Option<SqlFilter> {
    match scope {
        NoteScope::All => None,
        NoteScope::Favorites => Some(SqlFilter::new("favorite = ?", vec![Value::Integer(1)])),
        NoteScope::Folder(folder_id) => Some(SqlFilter::new(
            "folder_id = ?",
            vec![Value::Integer(folder_id)],
        )),
    }
}

/// Builds a case-insensitive substring match over title or content.
///
/// Returns `None` for absent or blank input. The term is trimmed and LIKE
/// metacharacters are escaped so it matches literally.
///
/// # Limitations
/// - Case folding is ASCII only (SQLite `LIKE`); `über` does not match `Über`.
pub fn text_filter(query: Option<&str>) -> Option<SqlFilter> {
    let term = query.map(str::trim).filter(|value| !value.is_empty())?;
    let pattern = format!("%{}%", escape_like(term));
    Some(SqlFilter::new(
        "(title LIKE ? ESCAPE '\\' OR content LIKE ? ESCAPE '\\')",
        vec![Value::Text(pattern.clone()), Value::Text(pattern)],
    ))
}

/// Combines scope and text filters.
///
/// With both present the result is `(scope) AND (text)` with scope arguments
/// first; with one present it is returned alone.
pub fn build_note_filter(scope: NoteScope, query: Option<&str>) -> Option<SqlFilter> {
    match (scope_filter(scope), text_filter(query)) {
        (Some(scope), Some(text)) => Some(scope.and(text)),
        (Some(scope), None) => Some(scope),
        (None, Some(text)) => Some(text),
        (None, None) => None,
    }
}

fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for ch in term.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::{build_note_filter, escape_like, scope_filter, text_filter, NoteScope};
    use rusqlite::types::Value;

    #[test]
    fn blank_query_produces_no_filter() {
        assert_eq!(text_filter(None), None);
        assert_eq!(text_filter(Some("   ")), None);
        assert_eq!(build_note_filter(NoteScope::All, Some("\t")), None);
    }

    #[test]
    fn text_filter_wraps_trimmed_term_and_binds_it_twice() {
        let filter = text_filter(Some("  milk ")).unwrap();
        assert!(filter.clause.contains("title LIKE ?"));
        assert!(filter.clause.contains("content LIKE ?"));
        assert!(filter.clause.starts_with('(') && filter.clause.ends_with(')'));
        assert_eq!(
            filter.args,
            vec![
                Value::Text("%milk%".to_string()),
                Value::Text("%milk%".to_string())
            ]
        );
    }

    #[test]
    fn scope_only_filter_is_returned_unwrapped() {
        let filter = build_note_filter(NoteScope::Folder(4), None).unwrap();
        assert_eq!(filter.clause, "folder_id = ?");
        assert_eq!(filter.args, vec![Value::Integer(4)]);
        assert_eq!(scope_filter(NoteScope::All), None);
    }

    #[test]
    fn combined_filter_puts_scope_arguments_before_text_arguments() {
        let filter = build_note_filter(NoteScope::Favorites, Some("x")).unwrap();
        assert!(filter.clause.starts_with("(favorite = ?) AND ("));
        assert_eq!(
            filter.args,
            vec![
                Value::Integer(1),
                Value::Text("%x%".to_string()),
                Value::Text("%x%".to_string())
            ]
        );

        let in_folder = build_note_filter(NoteScope::Folder(9), Some("y")).unwrap();
        assert_eq!(in_folder.args[0], Value::Integer(9));
        assert_eq!(in_folder.clause.matches('?').count(), in_folder.args.len());
    }

    #[test]
    fn like_metacharacters_are_escaped() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        let filter = text_filter(Some("a%b")).unwrap();
        assert_eq!(filter.args[0], Value::Text("%a\\%b%".to_string()));
    }
}
