//! Normalization of raw RappelConso rows into canonical recalls.
//!
//! Provides pure, total functions; malformed or sparse input degrades to
//! defaults, never to an error:
//! - Risk classification (ordered keyword decision table)
//! - Packed-field parsers (`$` identification, `|` image list)
//! - `normalize`: raw row → `Recall`

use rappelscope_model::{RawRecallRecord, Recall, RiskLevel};

/// Ordered severity decision table; first containment match wins.
///
/// Best-effort heuristic over free text. The vocabulary mirrors what the
/// dashboard has always used and is known to be incomplete (no mercury,
/// lead or glass-fragment terms); extend here, the matcher stays unchanged.
const RISK_RULES: &[(RiskLevel, &[&str])] = &[
    (
        RiskLevel::Critical,
        &["décès", "salmonelle", "listeria", "e.coli", "botulisme", "danger grave"],
    ),
    (
        RiskLevel::High,
        &["étouffement", "allergène", "blessure", "brûlure", "intoxication"],
    ),
    (RiskLevel::Medium, &["attention", "défaut", "contamination"]),
];

/// Classify a recall's severity from its free-text risk and reason fields.
///
/// Total: every input maps to a tier, `Low` when nothing matches.
pub fn classify_risk(risks: &str, reason: &str) -> RiskLevel {
    let text = format!("{} {}", risks, reason).to_lowercase();

    for (level, keywords) in RISK_RULES {
        if keywords.iter().any(|kw| text.contains(kw)) {
            return *level;
        }
    }

    RiskLevel::Low
}

/// Extract the batch number from the `$`-packed identification field.
///
/// Segment index 1 is the batch number; short or malformed input yields
/// `None`, never an empty string.
pub fn extract_batch_number(identification: Option<&str>) -> Option<String> {
    let identification = identification?;
    let mut parts = identification.split('$');
    parts.next()?;
    match parts.next() {
        Some(batch) if !batch.is_empty() => Some(batch.to_string()),
        _ => None,
    }
}

/// Extract the representative image from the `|`-packed URL list.
pub fn extract_first_image(images: Option<&str>) -> Option<String> {
    let first = images?.split('|').next()?;
    if first.is_empty() {
        None
    } else {
        Some(first.to_string())
    }
}

fn or_fallback(value: Option<String>, fallback: &str) -> String {
    match value {
        Some(v) if !v.is_empty() => v,
        _ => fallback.to_string(),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Map one raw upstream row into the canonical recall entity.
///
/// Pure and total: no I/O, never fails. Identity prefers the business
/// record number and falls back to the numeric row id; the fallback
/// literals for title/brand/category/reason are group-by keys downstream
/// and must not change.
pub fn normalize(record: &RawRecallRecord) -> Recall {
    let risk_level = classify_risk(
        record.risques_encourus.as_deref().unwrap_or(""),
        record.motif_rappel.as_deref().unwrap_or(""),
    );

    let id = match &record.numero_fiche {
        Some(fiche) if !fiche.is_empty() => fiche.clone(),
        _ => record.id.to_string(),
    };

    let title = or_fallback(
        non_empty(record.libelle.clone()).or_else(|| record.modeles_ou_references.clone()),
        "Produit sans nom",
    );

    Recall {
        record_number: id.clone(),
        id,
        record_version: record.numero_version,
        legal_nature: record.nature_juridique_rappel.clone(),
        title,
        brand: or_fallback(record.marque_produit.clone(), "Marque inconnue"),
        category: or_fallback(record.categorie_produit.clone(), "Non catégorisé"),
        sub_category: record.sous_categorie_produit.clone(),
        packaging: record.conditionnements.clone(),
        risk_level,
        reason: or_fallback(record.motif_rappel.clone(), "Motif non précisé"),
        risks: record.risques_encourus.clone(),
        batch_number: extract_batch_number(record.identification_produits.as_deref()),
        recall_date: record.date_publication.clone().unwrap_or_default(),
        image: extract_first_image(record.liens_vers_les_images.as_deref()),
        commercialisation_start: record.date_debut_commercialisation.clone(),
        commercialisation_end: record.date_date_fin_commercialisation.clone(),
        temperature_conservation: record.temperature_conservation.clone(),
        sanitary_mark: record.marque_salubrite.clone(),
        additional_info: record.informations_complementaires.clone(),
        geographic_zone: record.zone_geographique_de_vente.clone(),
        distributors: record.distributeurs.clone(),
        health_recommendations: record.preconisations_sanitaires.clone(),
        risk_description: record.description_complementaire_risque.clone(),
        consumer_actions: record.conduites_a_tenir_par_le_consommateur.clone(),
        contact_number: record.numero_contact.clone(),
        compensation_method: record.modalites_de_compensation.clone(),
        procedure_end_date: record.date_de_fin_de_la_procedure_de_rappel.clone(),
        public_additional_info: record.informations_complementaires_publiques.clone(),
        product_list_link: record.lien_vers_la_liste_des_produits.clone(),
        distributors_list_link: record.lien_vers_la_liste_des_distributeurs.clone(),
        poster_pdf_link: record.lien_vers_affichette_pdf.clone(),
        recall_page_link: record.lien_vers_la_fiche_rappel.clone(),
        guid: record.rappel_guid.clone(),
    }
}

/// Normalize a whole batch, in input order.
pub fn normalize_all(records: &[RawRecallRecord]) -> Vec<Recall> {
    records.iter().map(normalize).collect()
}
