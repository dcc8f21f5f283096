//! Résolution d'une parcelle unique par sa référence cadastrale

use tracing::{info, warn};

use super::{Catastro, Lookup};
use crate::parser::records::{descriptive_record, DnpResult};
use crate::parser::Operation;
use crate::srs::ReferenceSystem;
use crate::types::Parcel;
use crate::CatastroError;

impl Catastro {
    /// Résout une parcelle à partir d'une référence complète.
    ///
    /// 1. `Consulta_DNPRC` (réponse vide, non-JSON, erreur métier)
    /// 2. compteur `cudnp` > 1: `AmbiguousIdentifier`
    /// 3. projection typée selon l'usage (urbain/rustique)
    /// 4. croquis, sans échec possible
    /// 5. géométrie WFS dans `srs`
    pub fn parcel_by_reference(
        &self,
        reference: &str,
        srs: ReferenceSystem,
    ) -> Result<Parcel, CatastroError> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(CatastroError::InsufficientInput);
        }

        let result = self.consult(Operation::Dnprc, &[("RefCat", reference)])?;
        self.parcel_from_result(reference, &result, srs)
    }

    /// Étapes 2 à 5 sur une réponse `Consulta_DNPRC` déjà classée
    pub(super) fn parcel_from_result(
        &self,
        reference: &str,
        result: &DnpResult,
        srs: ReferenceSystem,
    ) -> Result<Parcel, CatastroError> {
        if result.control.cudnp > 1 {
            return Err(CatastroError::AmbiguousIdentifier {
                lookup: Lookup::Reference(reference.to_string()).to_string(),
                count: result.control.cudnp,
            });
        }

        // La référence canonique est celle du service
        let record = descriptive_record(Operation::Dnprc, result)?;
        let sketch_url = self.sketch_url(&record.reference);
        let geometry = self.parcel_geometry(&record.reference, srs)?;

        let parcel = Parcel::assemble(record, geometry, sketch_url, srs);
        info!(
            reference = parcel.reference(),
            land_use = ?parcel.land_use(),
            surface = parcel.surface(),
            srs = %srs,
            "Parcel resolved"
        );

        Ok(parcel)
    }

    /// URL finale du croquis (après redirection), `None` en cas d'échec
    fn sketch_url(&self, reference: &str) -> Option<String> {
        match self
            .transport
            .get(&self.endpoints.croquis, &[("refcat", reference)])
        {
            Ok(response) if response.is_success() => Some(response.url),
            Ok(response) => {
                warn!(reference, status = response.status, "Sketch URL unavailable");
                None
            }
            Err(e) => {
                warn!(reference, error = %e, "Sketch URL unavailable");
                None
            }
        }
    }
}
