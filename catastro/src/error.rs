//! Types d'erreurs pour le crate catastro

use thiserror::Error;

/// Erreurs pouvant survenir lors de la résolution d'une parcelle
#[derive(Debug, Error)]
pub enum CatastroError {
    /// Aucun groupe d'arguments complet (référence, polygone/parcelle, adresse)
    #[error(
        "Insufficient input: provide a cadastral reference, a province/municipality/polygon/parcel \
         group, or a province/municipality/street type/street/number group"
    )]
    InsufficientInput,

    /// Système de référence hors de la table supportée
    #[error("Unsupported reference system {requested}. Supported systems: {supported}")]
    UnsupportedReferenceSystem { requested: String, supported: String },

    /// Réponse de longueur nulle
    #[error("Empty response from {operation}")]
    EmptyUpstreamResponse { operation: String },

    /// Réponse non décodable ou chemin obligatoire absent
    #[error("Malformed response from {operation}: {reason}")]
    MalformedUpstreamResponse { operation: String, reason: String },

    /// Erreur métier signalée par le service (référence invalide, numéro inexistant, ...)
    #[error("Catastro service error: {message}")]
    UpstreamServiceError {
        code: Option<String>,
        message: String,
    },

    /// La recherche couvre plusieurs biens: utiliser une collection
    #[error("Lookup {lookup} matches {count} properties, resolve it as a parcel collection")]
    AmbiguousIdentifier { lookup: String, count: u32 },

    /// Le callejero ne connaît pas la voie demandée
    #[error("Street not found: {street_type} {street} ({municipality}, {province})")]
    StreetNotFound {
        province: String,
        municipality: String,
        street_type: String,
        street: String,
    },

    /// Numéro de voie inexistant, avec les numéros valides rapportés par le service
    #[error("House number {number} does not exist. Valid numbers: {}", .valid.join(", "))]
    HouseNumberNotFound { number: String, valid: Vec<String> },

    /// Statut HTTP non exploitable
    #[error("HTTP error {status} from {url}")]
    HttpStatus { status: u16, url: String },

    /// Erreur de transport (connexion, timeout, TLS)
    #[error("Transport error for {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Argument hors du domaine accepté par un service
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Erreur d'écriture GeoJSON
    #[error("Export error: {0}")]
    Export(String),

    /// Erreur d'I/O lors d'un export
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration invalide
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl CatastroError {
    /// Crée une erreur de réponse vide
    pub fn empty(operation: impl Into<String>) -> Self {
        Self::EmptyUpstreamResponse {
            operation: operation.into(),
        }
    }

    /// Crée une erreur de réponse malformée avec contexte
    pub fn malformed(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedUpstreamResponse {
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    /// Crée une erreur de système de référence non supporté
    pub fn unsupported_srs(requested: impl Into<String>) -> Self {
        Self::UnsupportedReferenceSystem {
            requested: requested.into(),
            supported: crate::srs::ReferenceSystem::supported()
                .map(|srs| srs.to_string())
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}
