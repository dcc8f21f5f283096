//! Nombre de niveaux via le WFS INSPIRE des bâtiments

use tracing::debug;

use super::Catastro;
use crate::parser::buildings::parse_building_parts;
use crate::types::{FloorCount, LandUse, Parcel};
use crate::CatastroError;

impl Catastro {
    /// Niveaux hors sol et en sous-sol d'une parcelle urbaine (`None` si rustique)
    pub fn floor_count(&self, parcel: &Parcel) -> Result<Option<FloorCount>, CatastroError> {
        if parcel.land_use() == LandUse::Rustic {
            return Ok(None);
        }

        let response = self.transport.get(
            &self.endpoints.edificios,
            &[
                ("service", "WFS"),
                ("version", "2.0.0"),
                ("request", "GetFeature"),
                ("STOREDQUERIE_ID", "GetBuildingPartByParcel"),
                ("REFCAT", parcel.reference()),
                ("srsname", "EPSG:4326"),
            ],
        )?;

        if !response.is_success() {
            return Err(CatastroError::HttpStatus {
                status: response.status,
                url: response.url,
            });
        }

        let parts = parse_building_parts(&response.body)?;
        debug!(reference = parcel.reference(), parts = parts.len(), "Building parts");

        Ok(Some(FloorCount::from_parts(parts)))
    }
}
