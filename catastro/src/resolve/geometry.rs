//! Géométrie d'une parcelle via le WFS INSPIRE (`GetParcel`)

use super::Catastro;
use crate::parser::wfs;
use crate::srs::ReferenceSystem;
use crate::types::ParcelGeometry;
use crate::CatastroError;

impl Catastro {
    /// Centroïde, anneau extérieur et surface dans `srs`.
    ///
    /// Aucune classification d'erreur métier ici: une réponse vide ou
    /// inexploitable est une `MalformedUpstreamResponse`.
    pub fn parcel_geometry(
        &self,
        reference: &str,
        srs: ReferenceSystem,
    ) -> Result<ParcelGeometry, CatastroError> {
        let srsname = srs.to_string();
        let response = self.transport.get(
            &self.endpoints.geografia,
            &[
                ("service", "wfs"),
                ("version", "2"),
                ("request", "getfeature"),
                ("STOREDQUERIE_ID", "GetParcel"),
                ("refcat", reference),
                ("srsname", srsname.as_str()),
            ],
        )?;

        wfs::parse_parcel(&response.body, srs)
    }
}
