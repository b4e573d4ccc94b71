//! Column-alias resolution for source feeds.
//!
//! Upstream feeds rename physical columns between revisions. Each logical
//! field therefore carries an ordered alias list; resolution walks the list
//! and takes the first header that matches. Headers are compared after
//! trimming and lowercasing, the same normalization the feeds themselves
//! survive.
//!
//! A required field with no matching alias is a fatal
//! [`CurtailError::MissingColumn`]: the whole run aborts before anything is
//! aggregated or persisted.

use curtail_core::{CurtailError, CurtailResult};

/// Ordered alias table for one source variant, one entry per logical field.
///
/// An empty alias list means the source has no such column at all; empty
/// lists are only valid for optional fields.
#[derive(Debug, Clone, Copy)]
pub struct SourceSchema {
    pub timestamp: &'static [&'static str],
    pub entity: &'static [&'static str],
    pub generation: &'static [&'static str],
    pub reference: &'static [&'static str],
    pub availability: &'static [&'static str],
    pub restriction: &'static [&'static str],
    pub limited: &'static [&'static str],
}

/// Column indices after alias resolution against one header row.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedColumns {
    pub timestamp: usize,
    pub entity: usize,
    pub generation: usize,
    pub reference: usize,
    pub availability: Option<usize>,
    pub restriction: Option<usize>,
    pub limited: Option<usize>,
}

fn normalize(header: &str) -> String {
    header.trim().to_lowercase()
}

fn find(headers: &[String], aliases: &[&str]) -> Option<usize> {
    aliases
        .iter()
        .find_map(|alias| headers.iter().position(|h| h == alias))
}

fn find_required(
    headers: &[String],
    field: &str,
    aliases: &[&str],
) -> CurtailResult<usize> {
    find(headers, aliases).ok_or_else(|| CurtailError::MissingColumn {
        field: field.to_string(),
        tried: aliases.iter().map(|a| a.to_string()).collect(),
    })
}

impl SourceSchema {
    /// Resolve this schema against a header row.
    ///
    /// `timestamp`, `entity`, `generation` and `reference` are required;
    /// the rest resolve to `None` when absent.
    pub fn resolve(&self, raw_headers: &[String]) -> CurtailResult<ResolvedColumns> {
        let headers: Vec<String> = raw_headers.iter().map(|h| normalize(h)).collect();
        Ok(ResolvedColumns {
            timestamp: find_required(&headers, "timestamp", self.timestamp)?,
            entity: find_required(&headers, "entity", self.entity)?,
            generation: find_required(&headers, "generation_actual", self.generation)?,
            reference: find_required(&headers, "generation_reference", self.reference)?,
            availability: find(&headers, self.availability),
            restriction: find(&headers, self.restriction),
            limited: find(&headers, self.limited),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEMA: SourceSchema = SourceSchema {
        timestamp: &["din_instante", "instante", "datahora"],
        entity: &["nom_usina"],
        generation: &["val_geracao"],
        reference: &["val_geracaoreferencia", "val_geracaoreferenciafinal"],
        availability: &["val_disponibilidade"],
        restriction: &["cod_razaorestricao"],
        limited: &[],
    };

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn resolves_first_matching_alias_in_order() {
        let cols = SCHEMA
            .resolve(&headers(&[
                "instante",
                "nom_usina",
                "val_geracao",
                "val_geracaoreferenciafinal",
            ]))
            .unwrap();
        assert_eq!(cols.timestamp, 0);
        assert_eq!(cols.reference, 3);
        assert_eq!(cols.availability, None);
        assert_eq!(cols.restriction, None);
    }

    #[test]
    fn normalizes_header_case_and_whitespace() {
        let cols = SCHEMA
            .resolve(&headers(&[
                " DIN_INSTANTE ",
                "NOM_USINA",
                "val_geracao",
                "VAL_GERACAOREFERENCIA",
            ]))
            .unwrap();
        assert_eq!(cols.timestamp, 0);
        assert_eq!(cols.entity, 1);
    }

    #[test]
    fn missing_required_column_is_fatal_and_names_aliases() {
        let err = SCHEMA
            .resolve(&headers(&["din_instante", "nom_usina", "val_geracao"]))
            .unwrap_err();
        match err {
            curtail_core::CurtailError::MissingColumn { field, tried } => {
                assert_eq!(field, "generation_reference");
                assert!(tried.contains(&"val_geracaoreferencia".to_string()));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn optional_columns_resolve_when_present() {
        let cols = SCHEMA
            .resolve(&headers(&[
                "din_instante",
                "nom_usina",
                "val_geracao",
                "val_geracaoreferencia",
                "val_disponibilidade",
                "cod_razaorestricao",
            ]))
            .unwrap();
        assert_eq!(cols.availability, Some(4));
        assert_eq!(cols.restriction, Some(5));
    }
}
