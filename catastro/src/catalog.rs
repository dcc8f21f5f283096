//! Tables statiques en lecture seule (provinces, cultures, types de voie)

use std::collections::HashMap;
use std::sync::OnceLock;

/// Noms usuels -> noms attendus par le Catastro
const PROVINCE_MAPPINGS: &[(&str, &str)] = &[
    ("Alicante", "ALACANT"),
    ("Castellón", "CASTELLO"),
    ("Castellon", "CASTELLO"),
    ("Valencia", "VALENCIA"),
    ("La Coruña", "A CORUÑA"),
    ("La Coruna", "A CORUÑA"),
    ("Coruña", "A CORUÑA"),
    ("Orense", "OURENSE"),
    ("Gerona", "GIRONA"),
    ("Lérida", "LLEIDA"),
    ("Lerida", "LLEIDA"),
    ("Baleares", "ILLES BALEARS"),
    ("Islas Baleares", "ILLES BALEARS"),
    ("Álava", "ARABA"),
    ("Alava", "ARABA"),
    ("Guipúzcoa", "GIPUZKOA"),
    ("Vizcaya", "BIZKAIA"),
    ("Las Palmas", "PALMAS (LAS)"),
    ("La Rioja", "RIOJA (LA)"),
];

/// Codes de qualification des cultures (modules €/ha de l'IAMIR)
const CROP_CODES: &[(&str, &str)] = &[
    ("C-", "Labor o labradío secano"),
    ("CR", "Labor o labradío regadío"),
    ("HR", "Huerta regadío"),
    ("O-", "Olivos secano"),
    ("OR", "Olivos regadío"),
    ("V-", "Viña secano"),
    ("VR", "Viña regadío"),
    ("F-", "Frutales secano"),
    ("FR", "Frutales regadío"),
    ("AM", "Almendro secano"),
    ("NR", "Agrios regadío"),
    ("E-", "Pastos"),
    ("PR", "Prados o praderas"),
    ("MT", "Matorral"),
    ("MM", "Pinar maderable"),
    ("CE", "Encinar"),
    ("FE", "Frondosas"),
    ("I-", "Improductivo"),
];

/// Sigles des types de voie
const STREET_TYPES: &[(&str, &str)] = &[
    ("AV", "Avenida"),
    ("CL", "Calle"),
    ("CM", "Camino"),
    ("CR", "Carretera"),
    ("CT", "Carretera"),
    ("GV", "Gran Vía"),
    ("PJ", "Pasaje"),
    ("PL", "Plaza"),
    ("PZ", "Plaza"),
    ("PS", "Paseo"),
    ("RB", "Rambla"),
    ("RD", "Ronda"),
    ("TR", "Travesía"),
    ("UR", "Urbanización"),
    ("BO", "Barrio"),
    ("CJ", "Callejón"),
    ("GL", "Glorieta"),
    ("LG", "Lugar"),
    ("PG", "Polígono"),
    ("DS", "Diseminado"),
];

fn province_index() -> &'static HashMap<String, &'static str> {
    static INDEX: OnceLock<HashMap<String, &'static str>> = OnceLock::new();
    INDEX.get_or_init(|| {
        PROVINCE_MAPPINGS
            .iter()
            .map(|&(common, catastro)| (common.to_uppercase(), catastro))
            .collect()
    })
}

/// Nom de province tel qu'attendu par le Catastro (majuscules)
pub fn catastro_province_name(province: &str) -> String {
    let key = province.trim().to_uppercase();
    province_index()
        .get(&key)
        .map(|name| name.to_string())
        .unwrap_or(key)
}

/// Description d'un code de culture
pub fn crop_description(code: &str) -> Option<&'static str> {
    CROP_CODES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|&(_, description)| description)
}

/// Tous les codes de culture connus
pub fn crop_codes() -> impl Iterator<Item = (&'static str, &'static str)> {
    CROP_CODES.iter().copied()
}

/// Tous les sigles de voie connus
pub fn street_types() -> impl Iterator<Item = (&'static str, &'static str)> {
    STREET_TYPES.iter().copied()
}
