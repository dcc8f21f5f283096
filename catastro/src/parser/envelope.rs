//! Décodage de l'enveloppe JSON et classification des erreurs métier

use serde_json::Value;

use super::Operation;
use crate::transport::HttpResponse;
use crate::CatastroError;

/// Code d'erreur du service signifiant "numéro de voie inexistant"
pub const HOUSE_NUMBER_NOT_FOUND: &str = "43";

/// Erreur métier rapportée dans la liste `lerr`
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamFault {
    pub code: Option<String>,
    pub description: String,
}

impl From<UpstreamFault> for CatastroError {
    fn from(fault: UpstreamFault) -> Self {
        CatastroError::UpstreamServiceError {
            code: fault.code,
            message: fault.description,
        }
    }
}

/// Décode le corps d'une réponse: vide puis non-JSON, dans cet ordre
pub fn decode(operation: Operation, response: &HttpResponse) -> Result<Value, CatastroError> {
    if response.body.is_empty() {
        return Err(CatastroError::empty(operation.to_string()));
    }

    serde_json::from_slice(&response.body).map_err(|e| {
        CatastroError::malformed(
            operation.to_string(),
            format!(
                "not a JSON document ({}): {}",
                e,
                String::from_utf8_lossy(&response.body[..response.body.len().min(200)])
            ),
        )
    })
}

/// Première erreur de la liste `lerr` de l'unique valeur de premier niveau.
///
/// La description se trouve soit dans `lerr.err[0]`, soit dans `lerr[0]`;
/// la forme imbriquée est testée en premier. Une valeur absente ou nulle
/// n'est pas une erreur.
pub fn first_fault(response: &Value) -> Option<UpstreamFault> {
    let top = response.as_object()?.values().next()?;
    let lerr = top.as_object()?.get("lerr")?;

    let entry = lerr
        .get("err")
        .and_then(first_entry)
        .or_else(|| first_entry(lerr));

    Some(match entry {
        Some(entry) => UpstreamFault {
            code: entry.get("cod").and_then(scalar_text),
            description: entry
                .get("des")
                .and_then(scalar_text)
                .unwrap_or_else(|| "unspecified error".to_string()),
        },
        None => UpstreamFault {
            code: None,
            description: "unspecified error".to_string(),
        },
    })
}

/// Échoue avec `UpstreamServiceError` si la réponse signale une erreur
pub fn check_errors(response: &Value) -> Result<(), CatastroError> {
    match first_fault(response) {
        Some(fault) => Err(fault.into()),
        None => Ok(()),
    }
}

fn first_entry(value: &Value) -> Option<&Value> {
    match value {
        Value::Array(items) => items.first(),
        Value::Object(_) => Some(value),
        _ => None,
    }
}

/// Chaîne ou nombre JSON sous forme de texte
pub(crate) fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
