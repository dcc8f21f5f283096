//! Projections typées des réponses du callejero
//!
//! Chaque réponse est désérialisée dans des structures dont les champs
//! obligatoires échouent explicitement; les fonctions `*_record` projettent
//! ensuite ces structures vers les types du crate.

use serde::de::{self, DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::Value;

use super::Operation;
use crate::types::{
    DescriptiveRecord, LandUse, LandUseDetails, Region, RusticDetails, UrbanDetails,
};
use crate::CatastroError;

// ---------------------------------------------------------------------------
// Désérialiseurs tolérants (le service mélange chaînes et nombres)
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Integer(i64),
    Float(f64),
}

impl Scalar {
    fn into_text(self) -> String {
        match self {
            Scalar::Text(s) => s,
            Scalar::Integer(i) => i.to_string(),
            Scalar::Float(f) => f.to_string(),
        }
    }
}

fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Scalar::deserialize(deserializer).map(Scalar::into_text)
}

fn opt_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<Scalar>::deserialize(deserializer)?
        .map(Scalar::into_text)
        .filter(|s| !s.trim().is_empty()))
}

fn number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    match Scalar::deserialize(deserializer)? {
        Scalar::Integer(i) => Ok(i as f64),
        Scalar::Float(f) => Ok(f),
        Scalar::Text(s) => fast_float::parse(s.trim().replace(',', "."))
            .map_err(|_| de::Error::custom(format!("invalid number: {:?}", s))),
    }
}

fn count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    match Scalar::deserialize(deserializer)? {
        Scalar::Integer(i) => u32::try_from(i).map_err(de::Error::custom),
        Scalar::Text(s) => s.trim().parse().map_err(de::Error::custom),
        Scalar::Float(f) => Err(de::Error::custom(format!("invalid count: {}", f))),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

fn one_or_many<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::Many(items) => items,
        OneOrMany::One(item) => vec![item],
    })
}

// ---------------------------------------------------------------------------
// Formes des réponses Consulta_DNPRC / DNPPP / DNPLOC
// ---------------------------------------------------------------------------

/// Contenu de `consulta_dnp*Result`
#[derive(Debug, Deserialize)]
pub struct DnpResult {
    #[serde(default)]
    pub control: Control,
    pub bico: Option<Bico>,
    pub lrcdnp: Option<ReferenceList>,
}

/// Bloc de contrôle: `cudnp` est le compteur d'ambiguïté
#[derive(Debug, Deserialize)]
pub struct Control {
    #[serde(default = "one", deserialize_with = "count")]
    pub cudnp: u32,
}

fn one() -> u32 {
    1
}

impl Default for Control {
    fn default() -> Self {
        Self { cudnp: one() }
    }
}

/// Référence cadastrale découpée en morceaux
#[derive(Debug, Deserialize)]
pub struct RcParts {
    pub pc1: String,
    pub pc2: String,
    #[serde(default)]
    pub car: Option<String>,
    #[serde(default)]
    pub cc1: Option<String>,
    #[serde(default)]
    pub cc2: Option<String>,
}

impl RcParts {
    /// Référence complète (pc1 + pc2 + car + cc1 + cc2)
    pub fn joined(&self) -> String {
        [
            Some(self.pc1.as_str()),
            Some(self.pc2.as_str()),
            self.car.as_deref(),
            self.cc1.as_deref(),
            self.cc2.as_deref(),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

#[derive(Debug, Deserialize)]
pub struct Bico {
    pub bi: Bi,
    #[serde(default, deserialize_with = "one_or_many")]
    pub lcons: Vec<Construction>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub lspr: Vec<Subparcel>,
}

#[derive(Debug, Deserialize)]
pub struct Bi {
    pub idbi: Idbi,
    pub dt: Dt,
    pub debi: Option<Debi>,
}

#[derive(Debug, Deserialize)]
pub struct Idbi {
    #[serde(default)]
    pub cn: Option<String>,
    pub rc: RcParts,
}

#[derive(Debug, Deserialize)]
pub struct Dt {
    pub np: String,
    pub nm: String,
    pub locs: Option<Locs>,
}

#[derive(Debug, Deserialize)]
pub struct Locs {
    pub lous: Option<Lous>,
    pub lors: Option<Lors>,
}

#[derive(Debug, Deserialize)]
pub struct Lous {
    pub lourb: Lourb,
}

#[derive(Debug, Deserialize)]
pub struct Lourb {
    pub dir: Dir,
}

#[derive(Debug, Deserialize)]
pub struct Dir {
    pub tv: String,
    pub nv: String,
    #[serde(default, deserialize_with = "opt_text")]
    pub pnp: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Lors {
    pub lorus: Lorus,
}

#[derive(Debug, Deserialize)]
pub struct Lorus {
    pub cpp: Cpp,
    #[serde(default, deserialize_with = "opt_text")]
    pub npa: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Cpp {
    #[serde(deserialize_with = "text")]
    pub cpo: String,
    #[serde(deserialize_with = "text")]
    pub cpa: String,
}

#[derive(Debug, Deserialize)]
pub struct Debi {
    #[serde(default, deserialize_with = "opt_text")]
    pub luso: Option<String>,
    #[serde(default, deserialize_with = "opt_text")]
    pub ant: Option<String>,
}

/// Élément de `lcons` (urbain)
#[derive(Debug, Deserialize)]
pub struct Construction {
    #[serde(default, deserialize_with = "opt_text")]
    pub lcd: Option<String>,
    pub dfcons: Dfcons,
}

#[derive(Debug, Deserialize)]
pub struct Dfcons {
    #[serde(deserialize_with = "number")]
    pub stl: f64,
}

/// Élément de `lspr` (rustique)
#[derive(Debug, Deserialize)]
pub struct Subparcel {
    pub dspr: Dspr,
}

#[derive(Debug, Deserialize)]
pub struct Dspr {
    #[serde(default, deserialize_with = "opt_text")]
    pub dcc: Option<String>,
    #[serde(deserialize_with = "number")]
    pub ssp: f64,
}

#[derive(Debug, Deserialize)]
pub struct ReferenceList {
    #[serde(default, deserialize_with = "one_or_many")]
    pub rcdnp: Vec<ReferenceEntry>,
}

#[derive(Debug, Deserialize)]
pub struct ReferenceEntry {
    pub rc: RcParts,
}

/// Numéros valides d'une voie (accompagne l'erreur 43)
#[derive(Debug, Deserialize)]
pub struct Numerero {
    #[serde(default, deserialize_with = "one_or_many")]
    pub nump: Vec<NumberEntry>,
}

#[derive(Debug, Deserialize)]
pub struct NumberEntry {
    pub num: Option<NumberValue>,
}

#[derive(Debug, Deserialize)]
pub struct NumberValue {
    #[serde(default, deserialize_with = "opt_text")]
    pub pnp: Option<String>,
}

// ---------------------------------------------------------------------------
// Forme de la réponse ObtenerCallejero
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CallejeroResult {
    pub callejero: Option<Callejero>,
}

#[derive(Debug, Deserialize)]
pub struct Callejero {
    #[serde(default, deserialize_with = "one_or_many")]
    pub calle: Vec<CalleEntry>,
}

#[derive(Debug, Deserialize)]
pub struct CalleEntry {
    pub dir: CalleDir,
}

#[derive(Debug, Deserialize)]
pub struct CalleDir {
    #[serde(default, deserialize_with = "opt_text")]
    pub cv: Option<String>,
    pub tv: String,
    pub nv: String,
}

// ---------------------------------------------------------------------------
// Projections
// ---------------------------------------------------------------------------

/// Extrait et désérialise la valeur `operation.result_key()` de l'enveloppe
pub fn decode_result<T: DeserializeOwned>(
    operation: Operation,
    envelope: Value,
) -> Result<T, CatastroError> {
    let inner = match envelope {
        Value::Object(mut map) => map.remove(operation.result_key()),
        _ => None,
    }
    .filter(|value| !value.is_null())
    .ok_or_else(|| {
        CatastroError::malformed(
            operation.to_string(),
            format!("missing {}", operation.result_key()),
        )
    })?;

    serde_json::from_value(inner)
        .map_err(|e| CatastroError::malformed(operation.to_string(), e.to_string()))
}

/// Référence portée par le bloc `bico` (résultat direct)
pub fn direct_reference(operation: Operation, result: &DnpResult) -> Result<String, CatastroError> {
    result
        .bico
        .as_ref()
        .map(|bico| bico.bi.idbi.rc.joined())
        .ok_or_else(|| CatastroError::malformed(operation.to_string(), "missing bico.bi.idbi.rc"))
}

/// Les `count` premières références de `lrcdnp.rcdnp`
pub fn umbrella_references(
    operation: Operation,
    result: &DnpResult,
    count: u32,
) -> Result<Vec<String>, CatastroError> {
    let entries = result
        .lrcdnp
        .as_ref()
        .map(|list| list.rcdnp.as_slice())
        .ok_or_else(|| CatastroError::malformed(operation.to_string(), "missing lrcdnp.rcdnp"))?;

    let count = count as usize;
    if entries.len() < count {
        return Err(CatastroError::malformed(
            operation.to_string(),
            format!(
                "cudnp announces {} references but lrcdnp holds {}",
                count,
                entries.len()
            ),
        ));
    }

    Ok(entries[..count].iter().map(|e| e.rc.joined()).collect())
}

/// Résultat d'une consultation: liste parapluie ou bien unique
#[derive(Debug, Clone, PartialEq)]
pub enum ReferenceMatch {
    /// `lrcdnp`: une ou plusieurs références
    Umbrella(Vec<String>),
    /// `bico`: un bien unique
    Direct(String),
}

impl ReferenceMatch {
    /// Décode la forme présente, la liste parapluie étant prioritaire
    pub fn from_result(operation: Operation, result: &DnpResult) -> Result<Self, CatastroError> {
        if let Some(list) = &result.lrcdnp {
            let references: Vec<String> = list.rcdnp.iter().map(|e| e.rc.joined()).collect();
            if references.is_empty() {
                return Err(CatastroError::malformed(
                    operation.to_string(),
                    "empty lrcdnp.rcdnp",
                ));
            }
            return Ok(ReferenceMatch::Umbrella(references));
        }
        direct_reference(operation, result).map(ReferenceMatch::Direct)
    }
}

/// Numéros valides rapportés avec l'erreur 43.
///
/// Seul `numerero` est désérialisé: le reste de l'enveloppe peut être
/// incomplet quand le service signale une erreur.
pub fn valid_house_numbers(operation: Operation, envelope: &Value) -> Result<Vec<String>, CatastroError> {
    let numerero = match envelope
        .get(operation.result_key())
        .and_then(|result| result.get("numerero"))
    {
        Some(value) if !value.is_null() => Numerero::deserialize(value)
            .map_err(|e| CatastroError::malformed(operation.to_string(), e.to_string()))?,
        _ => return Ok(Vec::new()),
    };

    Ok(numerero
        .nump
        .into_iter()
        .filter_map(|entry| entry.num?.pnp)
        .collect())
}

/// Projette le bloc `bico` vers un enregistrement descriptif typé
pub fn descriptive_record(
    operation: Operation,
    result: &DnpResult,
) -> Result<DescriptiveRecord, CatastroError> {
    let missing = |path: &str| CatastroError::malformed(operation.to_string(), format!("missing {}", path));

    let bico = result.bico.as_ref().ok_or_else(|| missing("bico"))?;
    let bi = &bico.bi;
    let land_use = LandUse::from_code(bi.idbi.cn.as_deref());

    let (details, regions) = match land_use {
        LandUse::Urban => {
            let dir = &bi
                .dt
                .locs
                .as_ref()
                .and_then(|locs| locs.lous.as_ref())
                .ok_or_else(|| missing("bico.bi.dt.locs.lous.lourb.dir"))?
                .lourb
                .dir;
            let details = UrbanDetails {
                street: format!("{} {}", dir.tv, dir.nv),
                number: dir.pnp.clone(),
                construction_year: bi.debi.as_ref().and_then(|d| d.ant.clone()),
                use_category: bi.debi.as_ref().and_then(|d| d.luso.clone()),
            };
            let regions = bico
                .lcons
                .iter()
                .map(|c| Region {
                    description: c.lcd.clone().unwrap_or_default(),
                    surface: c.dfcons.stl,
                })
                .collect::<Vec<_>>();
            (LandUseDetails::Urban(details), regions)
        }
        LandUse::Rustic => {
            let lorus = &bi
                .dt
                .locs
                .as_ref()
                .and_then(|locs| locs.lors.as_ref())
                .ok_or_else(|| missing("bico.bi.dt.locs.lors.lorus"))?
                .lorus;
            let details = RusticDetails {
                polygon: lorus.cpp.cpo.clone(),
                parcel: lorus.cpp.cpa.clone(),
                place_name: lorus.npa.clone(),
            };
            let regions = bico
                .lspr
                .iter()
                .map(|s| Region {
                    description: s.dspr.dcc.clone().unwrap_or_default(),
                    surface: s.dspr.ssp,
                })
                .collect::<Vec<_>>();
            (LandUseDetails::Rustic(details), regions)
        }
    };

    if let Some(region) = regions.iter().find(|r| !(r.surface >= 0.0)) {
        return Err(CatastroError::malformed(
            operation.to_string(),
            format!("negative surface {} for {:?}", region.surface, region.description),
        ));
    }

    Ok(DescriptiveRecord {
        reference: bi.idbi.rc.joined(),
        province: bi.dt.np.clone(),
        municipality: bi.dt.nm.clone(),
        details,
        regions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn urban_envelope() -> Value {
        json!({
            "consulta_dnprcResult": {
                "control": {"cudnp": 1, "cucons": 2},
                "bico": {
                    "bi": {
                        "idbi": {
                            "cn": "UR",
                            "rc": {"pc1": "1541506", "pc2": "VK4714B", "car": "0002", "cc1": "P", "cc2": "K"}
                        },
                        "dt": {
                            "np": "MADRID",
                            "nm": "MADRID",
                            "locs": {"lous": {"lourb": {"dir": {"cv": "1", "tv": "CL", "nv": "MAYOR", "pnp": 4}}}}
                        },
                        "debi": {"luso": "Residencial", "sfc": "39", "ant": "1900"}
                    },
                    "lcons": [
                        {"lcd": "VIVIENDA", "dfcons": {"stl": "35"}},
                        {"lcd": "ELEMENTOS COMUNES", "dfcons": {"stl": 4}}
                    ]
                }
            }
        })
    }

    fn rustic_envelope() -> Value {
        json!({
            "consulta_dnprcResult": {
                "control": {"cudnp": 1},
                "bico": {
                    "bi": {
                        "idbi": {
                            "cn": "RU",
                            "rc": {"pc1": "28067A0", "pc2": "2300149", "car": "0000", "cc1": "F", "cc2": "J"}
                        },
                        "dt": {
                            "np": "MADRID",
                            "nm": "GUADALIX DE LA SIERRA",
                            "locs": {"lors": {"lorus": {"cpp": {"cpo": "23", "cpa": 149}, "npa": "LA DEHESA"}}}
                        },
                        "debi": {"luso": "Agrario"}
                    },
                    "lspr": {"cspr": "a", "dspr": {"ccc": "E-", "dcc": "PASTOS", "ssp": 439732}}
                }
            }
        })
    }

    #[test]
    fn test_urban_record() {
        let result: DnpResult = decode_result(Operation::Dnprc, urban_envelope()).unwrap();
        assert_eq!(result.control.cudnp, 1);

        let record = descriptive_record(Operation::Dnprc, &result).unwrap();
        assert_eq!(record.reference, "1541506VK4714B0002PK");
        assert_eq!(record.province, "MADRID");
        match &record.details {
            LandUseDetails::Urban(urban) => {
                assert_eq!(urban.street, "CL MAYOR");
                assert_eq!(urban.number.as_deref(), Some("4"));
                assert_eq!(urban.construction_year.as_deref(), Some("1900"));
                assert_eq!(urban.use_category.as_deref(), Some("Residencial"));
            }
            other => panic!("Expected urban details, got {:?}", other),
        }
        assert_eq!(record.regions.len(), 2);
        assert_eq!(record.regions[0].surface, 35.0);
        assert_eq!(record.regions[1].description, "ELEMENTOS COMUNES");
    }

    #[test]
    fn test_rustic_record_accepts_single_object_list() {
        let result: DnpResult = decode_result(Operation::Dnprc, rustic_envelope()).unwrap();
        let record = descriptive_record(Operation::Dnprc, &result).unwrap();

        assert_eq!(record.reference, "28067A023001490000FJ");
        assert_eq!(
            record.details,
            LandUseDetails::Rustic(RusticDetails {
                polygon: "23".to_string(),
                parcel: "149".to_string(),
                place_name: Some("LA DEHESA".to_string()),
            })
        );
        assert_eq!(record.regions.len(), 1);
        assert_eq!(record.regions[0].description, "PASTOS");
        assert_eq!(record.regions[0].surface, 439732.0);
    }

    #[test]
    fn test_missing_required_path_fails_explicitly() {
        let mut envelope = urban_envelope();
        envelope["consulta_dnprcResult"]["bico"]["bi"]["dt"]
            .as_object_mut()
            .unwrap()
            .remove("locs");
        let result: DnpResult = decode_result(Operation::Dnprc, envelope).unwrap();

        match descriptive_record(Operation::Dnprc, &result) {
            Err(CatastroError::MalformedUpstreamResponse { reason, .. }) => {
                assert!(reason.contains("lourb"), "{}", reason);
            }
            other => panic!("Expected MalformedUpstreamResponse, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_result_key() {
        let outcome: Result<DnpResult, _> = decode_result(Operation::Dnppp, urban_envelope());
        assert!(matches!(
            outcome,
            Err(CatastroError::MalformedUpstreamResponse { .. })
        ));
    }

    #[test]
    fn test_missing_control_defaults_to_one() {
        let result: DnpResult = decode_result(
            Operation::Dnprc,
            json!({"consulta_dnprcResult": {"bico": null}}),
        )
        .unwrap();
        assert_eq!(result.control.cudnp, 1);
    }

    #[test]
    fn test_umbrella_references() {
        let envelope = json!({
            "consulta_dnpppResult": {
                "control": {"cudnp": "2"},
                "lrcdnp": {"rcdnp": [
                    {"rc": {"pc1": "9872023", "pc2": "VH5797S", "car": "0001", "cc1": "W", "cc2": "X"}},
                    {"rc": {"pc1": "9872023", "pc2": "VH5797S", "car": "0002", "cc1": "E", "cc2": "M"}}
                ]}
            }
        });
        let result: DnpResult = decode_result(Operation::Dnppp, envelope).unwrap();
        assert_eq!(result.control.cudnp, 2);

        let references = umbrella_references(Operation::Dnppp, &result, 2).unwrap();
        assert_eq!(
            references,
            vec!["9872023VH5797S0001WX", "9872023VH5797S0002EM"]
        );
        assert!(umbrella_references(Operation::Dnppp, &result, 3).is_err());
    }

    #[test]
    fn test_reference_match_prefers_umbrella() {
        let envelope = json!({
            "consulta_dnplocResult": {
                "lrcdnp": {"rcdnp": [{"rc": {"pc1": "1111111", "pc2": "AA1111A", "car": "0001", "cc1": "A", "cc2": "A"}}]},
                "bico": {
                    "bi": {
                        "idbi": {"rc": {"pc1": "2222222", "pc2": "BB2222B", "car": "0001", "cc1": "B", "cc2": "B"}},
                        "dt": {"np": "MADRID", "nm": "MADRID"}
                    }
                }
            }
        });
        let result: DnpResult = decode_result(Operation::Dnploc, envelope).unwrap();
        assert_eq!(
            ReferenceMatch::from_result(Operation::Dnploc, &result).unwrap(),
            ReferenceMatch::Umbrella(vec!["1111111AA1111A0001AA".to_string()])
        );
    }

    #[test]
    fn test_reference_match_direct() {
        let result: DnpResult = decode_result(Operation::Dnprc, urban_envelope()).unwrap();
        assert_eq!(
            ReferenceMatch::from_result(Operation::Dnprc, &result).unwrap(),
            ReferenceMatch::Direct("1541506VK4714B0002PK".to_string())
        );
    }

    #[test]
    fn test_valid_house_numbers() {
        let envelope = json!({
            "consulta_dnplocResult": {
                "lerr": [{"cod": "43", "des": "EL NUMERO NO EXISTE"}],
                "numerero": {"nump": [
                    {"num": {"pnp": "1"}},
                    {"num": {"pnp": 3}},
                    {"num": null}
                ]}
            }
        });
        assert_eq!(
            valid_house_numbers(Operation::Dnploc, &envelope).unwrap(),
            vec!["1", "3"]
        );
    }

    #[test]
    fn test_valid_house_numbers_ignore_other_fields() {
        // `cudnp` flottant: le décodage complet échouerait
        let envelope = json!({
            "consulta_dnplocResult": {
                "control": {"cudnp": 1.0},
                "lerr": [{"cod": "43", "des": "EL NUMERO NO EXISTE"}],
                "numerero": {"nump": {"num": {"pnp": "7"}}}
            }
        });
        assert!(decode_result::<DnpResult>(Operation::Dnploc, envelope.clone()).is_err());
        assert_eq!(
            valid_house_numbers(Operation::Dnploc, &envelope).unwrap(),
            vec!["7"]
        );
    }

    #[test]
    fn test_valid_house_numbers_absent() {
        let envelope = json!({
            "consulta_dnplocResult": {"lerr": [{"cod": "43", "des": "EL NUMERO NO EXISTE"}]}
        });
        assert!(valid_house_numbers(Operation::Dnploc, &envelope).unwrap().is_empty());
    }

    #[test]
    fn test_number_rejects_garbage() {
        let mut envelope = urban_envelope();
        envelope["consulta_dnprcResult"]["bico"]["lcons"][0]["dfcons"]["stl"] = json!("abc");
        let outcome: Result<DnpResult, _> = decode_result(Operation::Dnprc, envelope);
        assert!(outcome.is_err());
    }
}
