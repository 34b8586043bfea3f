//! Core domain model for rappelscope recall analysis.
//!
//! This crate defines the fundamental types used throughout the system:
//! - `RawRecallRecord`: One row of the RappelConso open dataset, vendor field names
//! - `Recall`: The normalized canonical recall entity
//! - `RiskLevel`: Derived severity tier (critical/high/medium/low)
//! - `RecallQuery` / `StatsFilter`: Query and filter parameters
//! - `CompressedRecall`: Reduced shape persisted by the historical cache

use serde::{Deserialize, Serialize};

/// Derived severity tier for a recall.
///
/// Never supplied by the upstream dataset; always inferred from the
/// free-text risk and reason fields by `rappelscope-normalize`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    /// Life-threatening hazard (death, major pathogens)
    Critical,
    /// Serious injury potential (choking, allergens, burns)
    High,
    /// Quality defect or contamination warning
    Medium,
    /// Informational recall
    Low,
}

impl Default for RiskLevel {
    fn default() -> Self {
        Self::Low
    }
}

impl From<&str> for RiskLevel {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "critical" => Self::Critical,
            "high" => Self::High,
            "medium" => Self::Medium,
            _ => Self::Low,
        }
    }
}

impl RiskLevel {
    /// All tiers in descending severity order, for zero-filled iteration.
    pub const ALL: [RiskLevel; 4] = [Self::Critical, Self::High, Self::Medium, Self::Low];

    /// Wire/filter identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }

    /// French display label, as shown on the dashboard.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Critical => "Danger critique",
            Self::High => "Risque élevé",
            Self::Medium => "Attention",
            Self::Low => "Information",
        }
    }
}

/// One raw row of the RappelConso dataset (`rappelconso-v2-gtin-espaces`).
///
/// Field names are the vendor names, kept verbatim so the struct
/// deserializes straight from the open-data API or the PostgREST store.
/// Population is sparse and inconsistent; every field except `id` may be
/// absent. Treated as read-only input by the normalizer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawRecallRecord {
    /// Numeric row id, the identity fallback when `numero_fiche` is missing
    pub id: i64,
    /// Business record number, the stable external identifier
    pub numero_fiche: Option<String>,
    pub numero_version: Option<i64>,
    pub nature_juridique_rappel: Option<String>,
    pub marque_produit: Option<String>,
    pub modeles_ou_references: Option<String>,
    pub categorie_produit: Option<String>,
    pub sous_categorie_produit: Option<String>,
    pub conditionnements: Option<String>,
    pub motif_rappel: Option<String>,
    pub risques_encourus: Option<String>,
    /// Publication date (ISO format); the canonical recall date
    pub date_publication: Option<String>,
    pub date_debut_commercialisation: Option<String>,
    /// Vendor typo (`date_date_`) preserved; it is the wire name
    pub date_date_fin_commercialisation: Option<String>,
    pub temperature_conservation: Option<String>,
    pub marque_salubrite: Option<String>,
    pub informations_complementaires: Option<String>,
    pub zone_geographique_de_vente: Option<String>,
    /// `¤`-delimited distributor list, kept packed
    pub distributeurs: Option<String>,
    /// `$`-delimited packed identification; segment 1 is the batch number
    pub identification_produits: Option<String>,
    /// `|`-delimited image URL list
    pub liens_vers_les_images: Option<String>,
    pub libelle: Option<String>,
    pub preconisations_sanitaires: Option<String>,
    pub description_complementaire_risque: Option<String>,
    /// `|`-delimited consumer action list
    pub conduites_a_tenir_par_le_consommateur: Option<String>,
    pub numero_contact: Option<String>,
    pub modalites_de_compensation: Option<String>,
    pub date_de_fin_de_la_procedure_de_rappel: Option<String>,
    pub informations_complementaires_publiques: Option<String>,
    pub lien_vers_la_liste_des_produits: Option<String>,
    pub lien_vers_la_liste_des_distributeurs: Option<String>,
    pub lien_vers_affichette_pdf: Option<String>,
    pub lien_vers_la_fiche_rappel: Option<String>,
    pub rappel_guid: Option<String>,
}

/// A normalized recall notice.
///
/// This is the canonical representation consumed by all downstream
/// systems. Produced once per raw record by `rappelscope-normalize` and
/// never mutated afterwards; freshness means re-fetch and re-normalize.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recall {
    /// Stable external identifier (`numero_fiche`, or the numeric row id)
    pub id: String,

    /// Business record number
    pub record_number: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_version: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legal_nature: Option<String>,

    /// Product title; "Produit sans nom" when the source has none
    pub title: String,

    /// Brand; "Marque inconnue" when the source has none
    pub brand: String,

    /// Category; "Non catégorisé" when the source has none.
    /// These literals are group-by keys downstream, never localize them.
    pub category: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_category: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub packaging: Option<String>,

    /// Derived severity tier
    pub risk_level: RiskLevel,

    /// Recall reason; "Motif non précisé" when the source has none
    pub reason: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risks: Option<String>,

    /// Batch number extracted from the packed identification field
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_number: Option<String>,

    /// Publication date (ISO format)
    pub recall_date: String,

    /// First URL of the packed image list
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commercialisation_start: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commercialisation_end: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature_conservation: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sanitary_mark: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_info: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geographic_zone: Option<String>,

    /// Distributor list, kept `¤`-packed; split at presentation time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distributors: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_recommendations: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_description: Option<String>,

    /// Consumer action list, kept `|`-packed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consumer_actions: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_number: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compensation_method: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub procedure_end_date: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_additional_info: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_list_link: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distributors_list_link: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster_pdf_link: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recall_page_link: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guid: Option<String>,
}

impl Recall {
    /// Create a minimal record for testing.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            record_number: id.clone(),
            id,
            record_version: None,
            legal_nature: None,
            title: title.into(),
            brand: "Marque inconnue".to_string(),
            category: "Non catégorisé".to_string(),
            sub_category: None,
            packaging: None,
            risk_level: RiskLevel::Low,
            reason: "Motif non précisé".to_string(),
            risks: None,
            batch_number: None,
            recall_date: String::new(),
            image: None,
            commercialisation_start: None,
            commercialisation_end: None,
            temperature_conservation: None,
            sanitary_mark: None,
            additional_info: None,
            geographic_zone: None,
            distributors: None,
            health_recommendations: None,
            risk_description: None,
            consumer_actions: None,
            contact_number: None,
            compensation_method: None,
            procedure_end_date: None,
            public_additional_info: None,
            product_list_link: None,
            distributors_list_link: None,
            poster_pdf_link: None,
            recall_page_link: None,
            guid: None,
        }
    }

    /// Split the packed distributor field for display.
    pub fn distributor_list(&self) -> Vec<&str> {
        self.distributors
            .as_deref()
            .map(|d| d.split('¤').map(str::trim).filter(|s| !s.is_empty()).collect())
            .unwrap_or_default()
    }

    /// Split the packed consumer-action field for display.
    pub fn consumer_action_list(&self) -> Vec<&str> {
        self.consumer_actions
            .as_deref()
            .map(|a| a.split('|').map(str::trim).filter(|s| !s.is_empty()).collect())
            .unwrap_or_default()
    }
}

/// Reduced recall shape persisted by the compressed historical cache.
///
/// Long text is clipped and low-value fields (image, links, full text)
/// are dropped to bound storage size. Reconstruction must yield a valid
/// `Recall` with the dropped fields absent, never an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressedRecall {
    pub id: String,
    pub title: String,
    pub brand: String,
    pub category: String,
    pub risk_level: RiskLevel,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_number: Option<String>,
    pub recall_date: String,
}

fn clip(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

impl From<&Recall> for CompressedRecall {
    fn from(recall: &Recall) -> Self {
        Self {
            id: recall.id.clone(),
            title: clip(&recall.title, 100),
            brand: clip(&recall.brand, 50),
            category: recall.category.clone(),
            risk_level: recall.risk_level,
            reason: clip(&recall.reason, 100),
            batch_number: recall.batch_number.clone(),
            recall_date: recall.recall_date.clone(),
        }
    }
}

impl CompressedRecall {
    /// Rebuild a full `Recall`, the dropped fields defaulting to absent.
    pub fn into_recall(self) -> Recall {
        Recall {
            record_number: self.id.clone(),
            id: self.id,
            title: self.title,
            brand: self.brand,
            category: self.category,
            risk_level: self.risk_level,
            reason: self.reason,
            batch_number: self.batch_number,
            recall_date: self.recall_date,
            ..Recall::new("", "")
        }
    }
}

/// Query parameters for the recall store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecallQuery {
    /// Exact category filter
    #[serde(default)]
    pub category: Option<String>,

    /// Free-text search against brand, model/title and reason
    #[serde(default)]
    pub search_text: Option<String>,

    /// Maximum rows to return
    #[serde(default = "default_limit")]
    pub limit: usize,

    /// Pagination offset
    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize {
    50
}

impl Default for RecallQuery {
    fn default() -> Self {
        Self {
            category: None,
            search_text: None,
            limit: default_limit(),
            offset: 0,
        }
    }
}

impl RecallQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_search(mut self, text: impl Into<String>) -> Self {
        self.search_text = Some(text.into());
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }
}

/// Dashboard filter predicates; absent means no constraint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatsFilter {
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub risk_level: Option<RiskLevel>,
}

impl StatsFilter {
    pub fn is_unfiltered(&self) -> bool {
        self.year.is_none() && self.category.is_none() && self.risk_level.is_none()
    }
}
