//! Résolution d'une référence parapluie en collection de parcelles

use std::collections::HashSet;

use tracing::{info, warn};

use super::{Catastro, Lookup, ParcelQuery};
use crate::parser::records::{umbrella_references, DnpResult, ReferenceMatch};
use crate::parser::Operation;
use crate::types::{Parcel, ParcelCollection};
use crate::CatastroError;

/// Longueur d'une référence parapluie (parcelle sans le bien)
const UMBRELLA_LEN: usize = 14;

impl Catastro {
    /// Résout tous les biens d'une recherche.
    ///
    /// Le compteur `cudnp` donne la cardinalité: les N premières références de
    /// la liste parapluie sont résolues une à une, dans l'ordre de la réponse.
    /// Le premier échec interrompt la construction.
    pub fn parcel_collection(&self, query: &ParcelQuery) -> Result<ParcelCollection, CatastroError> {
        let srs = query.reference_system()?;
        let lookup = query.lookup()?;

        let (operation, result) = self.lookup_result(&lookup)?;

        // Référence à bien unique: la fiche DNPRC est déjà chargée
        if let Lookup::Reference(reference) = &lookup {
            if let ReferenceMatch::Direct(_) = ReferenceMatch::from_result(operation, &result)? {
                let parcel = self.parcel_from_result(reference, &result, srs)?;
                return collect(operation, reference.clone(), vec![parcel]);
            }
        }

        let references = collection_references(operation, &result)?;
        let umbrella = match &lookup {
            Lookup::Reference(reference) => reference.clone(),
            _ => references
                .first()
                .map(|reference| reference.chars().take(UMBRELLA_LEN).collect())
                .unwrap_or_default(),
        };

        let mut seen = HashSet::new();
        let mut parcels = Vec::with_capacity(references.len());
        for reference in &references {
            if !seen.insert(reference.as_str()) {
                warn!(%reference, umbrella = %umbrella, "Duplicate reference skipped");
                continue;
            }
            parcels.push(self.parcel_by_reference(reference, srs)?);
        }

        collect(operation, umbrella, parcels)
    }
}

/// Construit la collection; les références canoniques en double sont écartées
fn collect(
    operation: Operation,
    umbrella: String,
    parcels: Vec<Parcel>,
) -> Result<ParcelCollection, CatastroError> {
    let collection = ParcelCollection::new(umbrella, parcels).ok_or_else(|| {
        CatastroError::malformed(operation.to_string(), "lookup matched no property")
    })?;
    info!(
        reference = collection.reference(),
        parcels = collection.len(),
        "Parcel collection resolved"
    );

    Ok(collection)
}

/// Références à résoudre: `cudnp` entrées de la liste parapluie, ou le bien unique
fn collection_references(
    operation: Operation,
    result: &DnpResult,
) -> Result<Vec<String>, CatastroError> {
    match ReferenceMatch::from_result(operation, result)? {
        ReferenceMatch::Umbrella(_) => umbrella_references(operation, result, result.control.cudnp),
        ReferenceMatch::Direct(reference) => Ok(vec![reference]),
    }
}
