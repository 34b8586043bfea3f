//! Query translation and dialect generation.
//!
//! Converts an abstract `RecallQuery` into backend-specific syntax:
//! - PostgREST parameter lists (Supabase)
//! - the upstream Opendatasoft explore API (future)

use rappelscope_model::RecallQuery;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Page size must be non-zero")]
    EmptyPage,
}

/// Trait for translating queries to backend-specific syntax.
pub trait QueryDialect {
    /// The output type (usually a parameter list or a query string)
    type Output;

    /// Translate a RecallQuery to this dialect
    fn translate(&self, query: &RecallQuery) -> Result<Self::Output, QueryError>;
}

/// PostgREST parameter-list generator for the `rappel` table.
#[derive(Debug, Default)]
pub struct PostgrestDialect;

/// Strip characters that would change PostgREST pattern or list syntax.
///
/// `or=` filter lists give no way to escape, so `%`, `*` and the list
/// separators are removed from user text rather than quoted.
fn sanitize(text: &str) -> String {
    text.chars()
        .filter(|c| !matches!(c, '%' | '*' | ',' | '(' | ')'))
        .collect()
}

impl QueryDialect for PostgrestDialect {
    type Output = Vec<(String, String)>;

    fn translate(&self, query: &RecallQuery) -> Result<Self::Output, QueryError> {
        if query.limit == 0 {
            return Err(QueryError::EmptyPage);
        }

        let mut params = vec![("select".to_string(), "*".to_string())];

        // Exact category filter
        if let Some(category) = &query.category {
            params.push(("categorie_produit".to_string(), format!("eq.{}", category)));
        }

        // Text search against brand, model/title and reason
        if let Some(text) = &query.search_text {
            let pattern = sanitize(text.trim());
            if !pattern.is_empty() {
                params.push((
                    "or".to_string(),
                    format!(
                        "(marque_produit.ilike.*{p}*,modeles_ou_references.ilike.*{p}*,motif_rappel.ilike.*{p}*)",
                        p = pattern
                    ),
                ));
            }
        }

        // Newest first, then page
        params.push(("order".to_string(), "date_publication.desc".to_string()));
        params.push(("limit".to_string(), query.limit.to_string()));
        if query.offset > 0 {
            params.push(("offset".to_string(), query.offset.to_string()));
        }

        Ok(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn param<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
        params.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_postgrest_basic() {
        let dialect = PostgrestDialect;
        let params = dialect.translate(&RecallQuery::new()).unwrap();
        assert_eq!(param(&params, "select"), Some("*"));
        assert_eq!(param(&params, "order"), Some("date_publication.desc"));
        assert_eq!(param(&params, "limit"), Some("50"));
        assert_eq!(param(&params, "offset"), None);
    }

    #[test]
    fn test_postgrest_category_filter() {
        let dialect = PostgrestDialect;
        let query = RecallQuery::new().with_category("Produits laitiers");
        let params = dialect.translate(&query).unwrap();
        assert_eq!(param(&params, "categorie_produit"), Some("eq.Produits laitiers"));
    }

    #[test]
    fn test_postgrest_search_covers_brand_model_reason() {
        let dialect = PostgrestDialect;
        let query = RecallQuery::new().with_search("chocolat");
        let params = dialect.translate(&query).unwrap();
        let or = param(&params, "or").unwrap();
        assert!(or.contains("marque_produit.ilike.*chocolat*"));
        assert!(or.contains("modeles_ou_references.ilike.*chocolat*"));
        assert!(or.contains("motif_rappel.ilike.*chocolat*"));
    }

    #[test]
    fn test_postgrest_search_sanitizes_wildcards() {
        let dialect = PostgrestDialect;
        let query = RecallQuery::new().with_search("choc%o*lat,(x)");
        let params = dialect.translate(&query).unwrap();
        let or = param(&params, "or").unwrap();
        assert!(or.contains("*chocolatx*"));
    }

    #[test]
    fn test_postgrest_pagination() {
        let dialect = PostgrestDialect;
        let query = RecallQuery::new().with_limit(20).with_offset(40);
        let params = dialect.translate(&query).unwrap();
        assert_eq!(param(&params, "limit"), Some("20"));
        assert_eq!(param(&params, "offset"), Some("40"));
    }

    #[test]
    fn test_zero_limit_rejected() {
        let dialect = PostgrestDialect;
        let query = RecallQuery::new().with_limit(0);
        assert!(matches!(dialect.translate(&query), Err(QueryError::EmptyPage)));
    }
}
