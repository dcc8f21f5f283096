//! Sélection de la stratégie de recherche
//!
//! Priorité: référence cadastrale, puis province/municipalité/polygone/parcelle,
//! puis adresse. Une valeur vide ou blanche compte comme absente.

use std::fmt;

use tracing::{debug, warn};

use super::Catastro;
use crate::parser::envelope::{self, first_fault, HOUSE_NUMBER_NOT_FOUND};
use crate::parser::records::{decode_result, valid_house_numbers, DnpResult, ReferenceMatch};
use crate::parser::Operation;
use crate::srs::ReferenceSystem;
use crate::street::StreetQuery;
use crate::types::Parcel;
use crate::CatastroError;

/// Arguments d'une recherche: un des trois groupes, plus le système de référence
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParcelQuery {
    pub reference: Option<String>,
    pub province: Option<String>,
    pub municipality: Option<String>,
    pub polygon: Option<String>,
    pub parcel: Option<String>,
    pub street_type: Option<String>,
    pub street: Option<String>,
    pub number: Option<String>,
    /// `EPSG:4326` si absent
    pub reference_system: Option<String>,
}

impl ParcelQuery {
    pub fn by_reference(reference: impl Into<String>) -> Self {
        Self {
            reference: Some(reference.into()),
            ..Self::default()
        }
    }

    pub fn by_polygon(
        province: impl Into<String>,
        municipality: impl Into<String>,
        polygon: impl Into<String>,
        parcel: impl Into<String>,
    ) -> Self {
        Self {
            province: Some(province.into()),
            municipality: Some(municipality.into()),
            polygon: Some(polygon.into()),
            parcel: Some(parcel.into()),
            ..Self::default()
        }
    }

    pub fn by_address(
        province: impl Into<String>,
        municipality: impl Into<String>,
        street_type: impl Into<String>,
        street: impl Into<String>,
        number: impl Into<String>,
    ) -> Self {
        Self {
            province: Some(province.into()),
            municipality: Some(municipality.into()),
            street_type: Some(street_type.into()),
            street: Some(street.into()),
            number: Some(number.into()),
            ..Self::default()
        }
    }

    pub fn with_reference_system(mut self, srs: impl Into<String>) -> Self {
        self.reference_system = Some(srs.into());
        self
    }

    /// Système demandé, validé contre la table des systèmes supportés
    pub fn reference_system(&self) -> Result<ReferenceSystem, CatastroError> {
        match filled(&self.reference_system) {
            Some(srs) => srs.parse(),
            None => Ok(ReferenceSystem::default()),
        }
    }

    /// Premier groupe d'arguments complet, dans l'ordre de priorité
    pub fn lookup(&self) -> Result<Lookup, CatastroError> {
        if let Some(reference) = filled(&self.reference) {
            return Ok(Lookup::Reference(reference.to_string()));
        }

        let province = filled(&self.province);
        let municipality = filled(&self.municipality);

        if let (Some(province), Some(municipality), Some(polygon), Some(parcel)) = (
            province,
            municipality,
            filled(&self.polygon),
            filled(&self.parcel),
        ) {
            return Ok(Lookup::Polygon {
                province: province.to_string(),
                municipality: municipality.to_string(),
                polygon: polygon.to_string(),
                parcel: parcel.to_string(),
            });
        }

        if let (Some(province), Some(municipality), Some(street_type), Some(street), Some(number)) = (
            province,
            municipality,
            filled(&self.street_type),
            filled(&self.street),
            filled(&self.number),
        ) {
            return Ok(Lookup::Address {
                street: StreetQuery {
                    province: province.to_string(),
                    municipality: municipality.to_string(),
                    street_type: street_type.to_string(),
                    street: street.to_string(),
                },
                number: number.to_string(),
            });
        }

        Err(CatastroError::InsufficientInput)
    }
}

fn filled(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Stratégie retenue pour une recherche
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Reference(String),
    Polygon {
        province: String,
        municipality: String,
        polygon: String,
        parcel: String,
    },
    Address {
        street: StreetQuery,
        number: String,
    },
}

impl fmt::Display for Lookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lookup::Reference(reference) => write!(f, "reference {}", reference),
            Lookup::Polygon {
                province,
                municipality,
                polygon,
                parcel,
            } => write!(
                f,
                "polygon {} parcel {} ({}, {})",
                polygon, parcel, municipality, province
            ),
            Lookup::Address { street, number } => write!(
                f,
                "address {} {} {} ({}, {})",
                street.street_type, street.street, number, street.municipality, street.province
            ),
        }
    }
}

impl Catastro {
    /// Résout une parcelle unique.
    ///
    /// Échoue avec `AmbiguousIdentifier` si la recherche couvre plusieurs biens;
    /// utiliser alors [`Catastro::parcel_collection`].
    pub fn parcel(&self, query: &ParcelQuery) -> Result<Parcel, CatastroError> {
        let srs = query.reference_system()?;

        match query.lookup()? {
            Lookup::Reference(reference) => self.parcel_by_reference(&reference, srs),
            lookup => {
                let (operation, result) = self.lookup_result(&lookup)?;
                if result.control.cudnp > 1 {
                    return Err(CatastroError::AmbiguousIdentifier {
                        lookup: lookup.to_string(),
                        count: result.control.cudnp,
                    });
                }

                let reference = match ReferenceMatch::from_result(operation, &result)? {
                    ReferenceMatch::Umbrella(references) => references
                        .into_iter()
                        .next()
                        .ok_or_else(|| CatastroError::malformed(operation.to_string(), "empty lrcdnp.rcdnp"))?,
                    ReferenceMatch::Direct(reference) => reference,
                };
                debug!(%lookup, %reference, "Lookup resolved");

                self.parcel_by_reference(&reference, srs)
            }
        }
    }

    /// Consultation correspondant à la stratégie, erreurs métier déjà classées
    pub(super) fn lookup_result(
        &self,
        lookup: &Lookup,
    ) -> Result<(Operation, DnpResult), CatastroError> {
        match lookup {
            Lookup::Reference(reference) => {
                let operation = Operation::Dnprc;
                let result = self.consult(operation, &[("RefCat", reference.as_str())])?;
                Ok((operation, result))
            }
            Lookup::Polygon {
                province,
                municipality,
                polygon,
                parcel,
            } => {
                let operation = Operation::Dnppp;
                let province = crate::catalog::catastro_province_name(province);
                let result = self.consult(
                    operation,
                    &[
                        ("Provincia", province.as_str()),
                        ("Municipio", municipality.as_str()),
                        ("Poligono", polygon.as_str()),
                        ("Parcela", parcel.as_str()),
                    ],
                )?;
                Ok((operation, result))
            }
            Lookup::Address { street, number } => {
                Ok((Operation::Dnploc, self.address_result(street, number)?))
            }
        }
    }

    /// Recherche par adresse: voie via le collaborateur, puis `Consulta_DNPLOC`.
    ///
    /// Le code d'erreur 43 devient `HouseNumberNotFound` avec les numéros
    /// valides rapportés par le service.
    fn address_result(
        &self,
        query: &StreetQuery,
        number: &str,
    ) -> Result<DnpResult, CatastroError> {
        let street = self
            .streets
            .resolve(query)?
            .ok_or_else(|| CatastroError::StreetNotFound {
                province: query.province.clone(),
                municipality: query.municipality.clone(),
                street_type: query.street_type.clone(),
                street: query.street.clone(),
            })?;

        let operation = Operation::Dnploc;
        let response = self.fetch(
            operation,
            &[
                ("Provincia", street.province.as_str()),
                ("Municipio", street.municipality.as_str()),
                ("Sigla", street.street_type.as_str()),
                ("Calle", street.street.as_str()),
                ("Numero", number),
            ],
        )?;

        if !response.is_success() {
            return Err(CatastroError::empty(operation.to_string()));
        }
        let value = envelope::decode(operation, &response)?;

        if let Some(fault) = first_fault(&value) {
            if fault.code.as_deref() == Some(HOUSE_NUMBER_NOT_FOUND) {
                let valid = valid_house_numbers(operation, &value).unwrap_or_else(|e| {
                    warn!(error = %e, "Valid house numbers unreadable");
                    Vec::new()
                });
                return Err(CatastroError::HouseNumberNotFound {
                    number: number.to_string(),
                    valid,
                });
            }
            return Err(fault.into());
        }

        decode_result(operation, value)
    }
}
