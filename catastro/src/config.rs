//! Configuration du client (URLs des services, timeout, user agent)

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::CatastroError;

/// URLs des services consommés
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Endpoints {
    /// Service JSON du callejero (Consulta_DNPRC, Consulta_DNPPP, Consulta_DNPLOC, ObtenerCallejero)
    pub callejero: String,

    /// WFS INSPIRE des parcelles cadastrales
    pub geografia: String,

    /// Redirection vers le croquis de la parcelle
    pub croquis: String,

    /// WFS INSPIRE des bâtiments
    pub edificios: String,

    /// Carte des valeurs urbaines
    pub valores_urbanos: String,

    /// WMS des modules de valeurs rustiques
    pub valores_rusticos: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            callejero:
                "https://ovc.catastro.meh.es/OVCServWeb/OVCWcfCallejero/COVCCallejero.svc/json"
                    .into(),
            geografia: "https://ovc.catastro.meh.es/INSPIRE/wfsCP.aspx".into(),
            croquis:
                "https://www1.sedecatastro.gob.es/CYCBienInmueble/SECImprimirCroquisYDatos.aspx"
                    .into(),
            edificios: "https://ovc.catastro.meh.es/INSPIRE/wfsBU.aspx".into(),
            valores_urbanos: "https://www1.sedecatastro.gob.es/Cartografia/GeneraMapaValores.aspx"
                .into(),
            valores_rusticos: "https://ovc.catastro.meh.es/Cartografia/WMS/ServidorWMS.aspx".into(),
        }
    }
}

impl Endpoints {
    /// Toutes les URLs sous une même racine (serveur de test, proxy)
    pub fn with_base(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            callejero: format!("{}/callejero", base),
            geografia: format!("{}/wfsCP", base),
            croquis: format!("{}/croquis", base),
            edificios: format!("{}/wfsBU", base),
            valores_urbanos: format!("{}/valores-urbanos", base),
            valores_rusticos: format!("{}/valores-rusticos", base),
        }
    }
}

/// Configuration principale du client
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatastroConfig {
    #[serde(default)]
    pub endpoints: Endpoints,

    /// Timeout d'une requête HTTP (secondes)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("catastro-rs/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for CatastroConfig {
    fn default() -> Self {
        Self {
            endpoints: Endpoints::default(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl CatastroConfig {
    /// Charge la configuration depuis les variables d'environnement
    pub fn from_env() -> Self {
        let defaults = Endpoints::default();
        let var = |name: &str, fallback: String| std::env::var(name).unwrap_or(fallback);

        Self {
            endpoints: Endpoints {
                callejero: var("CATASTRO_URL_CALLEJERO", defaults.callejero),
                geografia: var("CATASTRO_URL_GEOGRAFIA", defaults.geografia),
                croquis: var("CATASTRO_URL_CROQUIS", defaults.croquis),
                edificios: var("CATASTRO_URL_EDIFICIOS", defaults.edificios),
                valores_urbanos: var("CATASTRO_URL_VALORES_URBANOS", defaults.valores_urbanos),
                valores_rusticos: var("CATASTRO_URL_VALORES_RUSTICOS", defaults.valores_rusticos),
            },
            timeout_secs: std::env::var("CATASTRO_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or_else(default_timeout_secs),
            user_agent: var("CATASTRO_USER_AGENT", default_user_agent()),
        }
    }

    /// Charge une configuration depuis un fichier JSON
    pub fn load(path: &Path) -> Result<Self, CatastroError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CatastroError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;

        serde_json::from_str(&content).map_err(|e| {
            CatastroError::Config(format!("failed to parse {}: {}", path.display(), e))
        })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
