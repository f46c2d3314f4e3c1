// Data access for the four tracked entities plus their JSON handlers.
// Every function takes the pool directly; there is no repository object.

pub mod companies;
pub mod contacts;
pub mod handlers;
pub mod interviews;
pub mod roles;

use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_sql(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Whitelist of sortable columns for one list endpoint. User input only ever
/// selects among these strings, so the chosen column can be spliced into SQL.
pub struct SortSpec {
    /// `(query key, SQL expression)`
    pub columns: &'static [(&'static str, &'static str)],
    pub default_key: &'static str,
    pub default_order: SortOrder,
}

impl SortSpec {
    pub fn resolve(&self, key: Option<&str>, order: Option<&str>) -> (&'static str, SortOrder) {
        let lookup = |k: &str| self.columns.iter().find(|(name, _)| *name == k).map(|(_, col)| *col);
        let column = key
            .and_then(lookup)
            .or_else(|| lookup(self.default_key))
            .unwrap_or(self.columns[0].1);
        let order = match order {
            Some("asc") => SortOrder::Asc,
            Some("desc") => SortOrder::Desc,
            _ => self.default_order,
        };
        (column, order)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub sort: Option<String>,
    pub order: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const INTERVIEW_SORTS: SortSpec = SortSpec {
        columns: &[("date", "i.date"), ("company_name", "c.name")],
        default_key: "date",
        default_order: SortOrder::Desc,
    };

    #[test]
    fn test_resolve_known_key() {
        assert_eq!(
            INTERVIEW_SORTS.resolve(Some("company_name"), Some("asc")),
            ("c.name", SortOrder::Asc)
        );
    }

    #[test]
    fn test_resolve_falls_back_to_defaults() {
        assert_eq!(INTERVIEW_SORTS.resolve(Some("salary"), Some("sideways")), ("i.date", SortOrder::Desc));
        assert_eq!(INTERVIEW_SORTS.resolve(None, None), ("i.date", SortOrder::Desc));
    }
}
