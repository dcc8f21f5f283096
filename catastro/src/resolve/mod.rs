//! Résolution des parcelles
//!
//! `Catastro` regroupe les collaborateurs (transport, résolution des voies)
//! et les URLs des services. Chaque construction est une passe synchrone qui
//! renvoie une entité complète et immuable, ou une erreur classée.
//!
//! - `lookup`: sélection de la stratégie (référence, polygone, adresse)
//! - `parcel`: résolution d'une parcelle unique
//! - `geometry`: géométrie via le WFS INSPIRE
//! - `collection`: résolution d'une référence parapluie
//! - `buildings`, `valuation`: consultations auxiliaires sur une parcelle résolue

mod buildings;
mod collection;
mod geometry;
pub mod lookup;
mod parcel;
mod valuation;

use tracing::debug;

use crate::config::{CatastroConfig, Endpoints};
use crate::parser::envelope::{self, check_errors};
use crate::parser::records::{decode_result, DnpResult};
use crate::parser::Operation;
use crate::street::{CallejeroStreets, StreetResolver};
use crate::transport::{HttpResponse, HttpTransport, Transport};
use crate::CatastroError;

pub use lookup::{Lookup, ParcelQuery};

/// Client des services du Catastro
pub struct Catastro {
    transport: Box<dyn Transport>,
    streets: Box<dyn StreetResolver>,
    endpoints: Endpoints,
}

impl Catastro {
    /// Client HTTP par défaut, les voies étant résolues par le callejero
    pub fn new(config: CatastroConfig) -> Result<Self, CatastroError> {
        let transport = HttpTransport::new(&config)?;
        let streets = CallejeroStreets::new(transport.clone(), config.endpoints.callejero.clone());

        Ok(Self::with_collaborators(
            Box::new(transport),
            Box::new(streets),
            config.endpoints,
        ))
    }

    /// Configuration lue dans les variables `CATASTRO_*`
    pub fn from_env() -> Result<Self, CatastroError> {
        Self::new(CatastroConfig::from_env())
    }

    pub fn with_collaborators(
        transport: Box<dyn Transport>,
        streets: Box<dyn StreetResolver>,
        endpoints: Endpoints,
    ) -> Self {
        Self {
            transport,
            streets,
            endpoints,
        }
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Appel brut d'une opération du callejero
    fn fetch(
        &self,
        operation: Operation,
        params: &[(&str, &str)],
    ) -> Result<HttpResponse, CatastroError> {
        let url = format!(
            "{}/{}",
            self.endpoints.callejero.trim_end_matches('/'),
            operation.path()
        );
        debug!(%operation, "Consulting callejero");
        self.transport.get(&url, params)
    }

    /// Vérification ordonnée: corps vide, puis non-JSON, puis erreur métier,
    /// puis projection typée
    fn consult(
        &self,
        operation: Operation,
        params: &[(&str, &str)],
    ) -> Result<DnpResult, CatastroError> {
        let response = self.fetch(operation, params)?;
        let value = envelope::decode(operation, &response)?;
        check_errors(&value)?;
        decode_result(operation, value)
    }
}
