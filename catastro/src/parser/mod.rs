//! Décodage des réponses des services du Catastro
//!
//! - `envelope`: décodage JSON et classification des erreurs métier
//! - `records`: projections typées des réponses du callejero
//! - `wfs`: géométrie des parcelles (GML INSPIRE)
//! - `buildings`: parties de bâtiment (GML INSPIRE)

pub mod buildings;
pub mod envelope;
pub mod records;
pub mod wfs;

use std::fmt;

/// Opérations du callejero, chacune avec sa clé de résultat
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Consultation par référence cadastrale
    Dnprc,
    /// Consultation par province/municipalité/polygone/parcelle
    Dnppp,
    /// Consultation par adresse
    Dnploc,
    /// Recherche de voies
    Callejero,
}

impl Operation {
    /// Chemin relatif à l'endpoint du callejero
    pub fn path(&self) -> &'static str {
        match self {
            Operation::Dnprc => "Consulta_DNPRC",
            Operation::Dnppp => "Consulta_DNPPP",
            Operation::Dnploc => "Consulta_DNPLOC",
            Operation::Callejero => "ObtenerCallejero",
        }
    }

    /// Clé unique de l'enveloppe JSON
    pub fn result_key(&self) -> &'static str {
        match self {
            Operation::Dnprc => "consulta_dnprcResult",
            Operation::Dnppp => "consulta_dnpppResult",
            Operation::Dnploc => "consulta_dnplocResult",
            Operation::Callejero => "consulta_callejeroResult",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}
