//! Résolution des voies (collaborateur de la recherche par adresse)

use tracing::debug;

use crate::catalog::catastro_province_name;
use crate::parser::envelope::{self, first_fault};
use crate::parser::records::{decode_result, CallejeroResult};
use crate::parser::Operation;
use crate::transport::Transport;
use crate::CatastroError;

/// Voie recherchée
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreetQuery {
    pub province: String,
    pub municipality: String,
    pub street_type: String,
    pub street: String,
}

/// Voie normalisée par le callejero
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Street {
    pub province: String,
    pub municipality: String,
    /// Sigle (CL, AV, ...)
    pub street_type: String,
    pub street: String,
    pub code: Option<String>,
}

/// Résout une voie ou signale qu'elle n'existe pas (`Ok(None)`)
pub trait StreetResolver: Send + Sync {
    fn resolve(&self, query: &StreetQuery) -> Result<Option<Street>, CatastroError>;
}

/// Résolution via `ObtenerCallejero`
pub struct CallejeroStreets<T: Transport> {
    transport: T,
    endpoint: String,
}

impl<T: Transport> CallejeroStreets<T> {
    /// `endpoint` est l'URL du service JSON du callejero
    pub fn new(transport: T, endpoint: impl Into<String>) -> Self {
        Self {
            transport,
            endpoint: endpoint.into(),
        }
    }
}

impl<T: Transport> StreetResolver for CallejeroStreets<T> {
    fn resolve(&self, query: &StreetQuery) -> Result<Option<Street>, CatastroError> {
        let province = catastro_province_name(&query.province);
        let municipality = query.municipality.trim().to_uppercase();
        let street_type = query.street_type.trim().to_uppercase();
        let street = query.street.trim().to_uppercase();

        let operation = Operation::Callejero;
        let url = format!("{}/{}", self.endpoint.trim_end_matches('/'), operation.path());
        let response = self.transport.get(
            &url,
            &[
                ("Provincia", province.as_str()),
                ("Municipio", municipality.as_str()),
                ("TipoVia", street_type.as_str()),
                ("NomVia", street.as_str()),
            ],
        )?;

        let value = envelope::decode(operation, &response)?;
        if let Some(fault) = first_fault(&value) {
            debug!(code = ?fault.code, description = %fault.description, "Street lookup rejected");
            return Ok(None);
        }

        let result: CallejeroResult = decode_result(operation, value)?;
        let found = result
            .callejero
            .and_then(|callejero| callejero.calle.into_iter().next())
            .map(|entry| Street {
                province: province.clone(),
                municipality: municipality.clone(),
                street_type: entry.dir.tv,
                street: entry.dir.nv,
                code: entry.dir.cv,
            });

        Ok(found)
    }
}
