//! Static descriptors for the supported source feeds.
//!
//! Each feed revision ships its own column names, cadence and curtailment
//! formula. All of that is pinned here as explicit configuration; nothing
//! downstream infers a formula from which optional column happens to be
//! present in a given file.

use std::fmt;
use std::str::FromStr;

use curtail_core::CurtailError;

use crate::schema::SourceSchema;

/// Which dataset family a run operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Wind,
    Solar,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Wind => "wind",
            SourceKind::Solar => "solar",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = CurtailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "wind" => Ok(SourceKind::Wind),
            "solar" => Ok(SourceKind::Solar),
            other => Err(CurtailError::Config(format!(
                "unknown source '{other}'; use wind or solar"
            ))),
        }
    }
}

/// How effective capacity is derived for an interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurtailVariant {
    /// Capacity = min(availability, reference); reference alone when the
    /// availability cell is missing.
    MinAvailabilityReference,
    /// Capacity = reference.
    ReferenceOnly,
}

/// What qualifies an interval as restricted.
#[derive(Debug, Clone, Copy)]
pub enum RestrictionPolicy {
    /// Restricted when the restriction code is one of the accepted codes.
    Codes(&'static [&'static str]),
    /// Restricted when an explicit limited-generation value is present.
    LimitedMarker,
}

/// Full static configuration for one source feed.
#[derive(Debug, Clone, Copy)]
pub struct SourceSpec {
    pub kind: SourceKind,
    /// Upstream dataset slug, also the cache subdirectory name.
    pub dataset: &'static str,
    /// Monthly raw file prefix; files are `<prefix>_<YYYY>_<MM>.csv`.
    pub file_prefix: &'static str,
    pub base_url: &'static str,
    pub schema: SourceSchema,
    pub variant: CurtailVariant,
    pub restriction: RestrictionPolicy,
    /// Fixed cadence in hours; `None` means the normalizer estimates the
    /// interval length per entity.
    pub fixed_interval_hours: Option<f64>,
    /// File name of the persisted monthly history inside the data directory.
    pub monthly_file: &'static str,
}

/// Wind constrained-off feed: 30-minute cadence, restriction reason codes,
/// capacity limited by declared availability.
pub static WIND: SourceSpec = SourceSpec {
    kind: SourceKind::Wind,
    dataset: "restricao_coff_eolica",
    file_prefix: "RESTRICAO_COFF_EOLICA",
    base_url: "https://ons-aws-prod-opendata.s3.amazonaws.com/dataset/restricao_coff_eolica_tm",
    schema: SourceSchema {
        timestamp: &["din_instante", "instante", "datahora", "data_hora", "datetime"],
        entity: &["nom_usina", "nom_conjuntousina", "nom_conjunto"],
        generation: &["val_geracao", "val_geracaoverificada"],
        reference: &["val_geracaoreferencia", "val_geracaoreferenciafinal"],
        availability: &["val_disponibilidade"],
        restriction: &["cod_razaorestricao"],
        limited: &[],
    },
    variant: CurtailVariant::MinAvailabilityReference,
    restriction: RestrictionPolicy::Codes(&["CNF", "ENE", "REL"]),
    fixed_interval_hours: Some(0.5),
    monthly_file: "curtailment_wind_monthly.csv",
};

/// Solar constrained-off feed: no restriction codes, restriction marked by an
/// explicit limited-generation column, cadence estimated from the data.
pub static SOLAR: SourceSpec = SourceSpec {
    kind: SourceKind::Solar,
    dataset: "restricao_coff_fotovoltaica",
    file_prefix: "RESTRICAO_COFF_FOTOVOLTAICA",
    base_url:
        "https://ons-aws-prod-opendata.s3.amazonaws.com/dataset/restricao_coff_fotovoltaica_tm",
    schema: SourceSchema {
        timestamp: &["din_instante", "instante", "datahora", "data_hora", "datetime"],
        entity: &["nom_usina", "nom_conjuntousina", "nom_conjunto"],
        generation: &["val_geracao", "val_geracaoverificada"],
        reference: &["val_geracaoreferencia", "val_geracaoreferenciafinal"],
        availability: &["val_disponibilidade"],
        restriction: &[],
        limited: &["val_geracaolimitada"],
    },
    variant: CurtailVariant::ReferenceOnly,
    restriction: RestrictionPolicy::LimitedMarker,
    fixed_interval_hours: None,
    monthly_file: "curtailment_solar_monthly.csv",
};

impl SourceSpec {
    pub fn get(kind: SourceKind) -> &'static SourceSpec {
        match kind {
            SourceKind::Wind => &WIND,
            SourceKind::Solar => &SOLAR,
        }
    }

    /// Raw file name for one month of this feed.
    pub fn raw_file_name(&self, period: curtail_core::Period) -> String {
        format!(
            "{}_{:04}_{:02}.csv",
            self.file_prefix,
            period.year(),
            period.month()
        )
    }

    /// Download URL for one month of this feed.
    pub fn month_url(&self, period: curtail_core::Period) -> String {
        format!("{}/{}", self.base_url, self.raw_file_name(period))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_kind_round_trips() {
        assert_eq!("wind".parse::<SourceKind>().unwrap(), SourceKind::Wind);
        assert_eq!("SOLAR".parse::<SourceKind>().unwrap(), SourceKind::Solar);
        assert!("hydro".parse::<SourceKind>().is_err());
    }

    #[test]
    fn month_url_uses_underscore_file_names() {
        let period = "2025-03".parse().unwrap();
        let url = WIND.month_url(period);
        assert!(url.ends_with("/RESTRICAO_COFF_EOLICA_2025_03.csv"));
    }

    #[test]
    fn variants_are_pinned_per_source() {
        assert_eq!(WIND.variant, CurtailVariant::MinAvailabilityReference);
        assert_eq!(SOLAR.variant, CurtailVariant::ReferenceOnly);
        assert!(SOLAR.fixed_interval_hours.is_none());
    }
}
