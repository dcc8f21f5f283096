//! Parser GML pour la requête WFS `GetParcel`
//!
//! Ordre des axes: le service renvoie les coordonnées dans l'ordre officiel du
//! système demandé (latitude d'abord pour EPSG:4326/4258, easting d'abord pour
//! les UTM). Les points produits ont toujours `x` = longitude/easting et
//! `y` = latitude/northing; le centroïde et l'anneau suivent la même règle.

use geo::{Coord, LineString, Point};
use quick_xml::events::Event;
use quick_xml::Reader;

use crate::srs::{AxisOrder, ReferenceSystem};
use crate::types::ParcelGeometry;
use crate::CatastroError;

const OPERATION: &str = "GetParcel";

/// Élément dont on accumule le texte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Capture {
    ReferencePoint,
    Exterior,
    Area,
}

/// Parse la réponse GML d'une parcelle
pub fn parse_parcel(xml: &[u8], srs: ReferenceSystem) -> Result<ParcelGeometry, CatastroError> {
    if xml.iter().all(u8::is_ascii_whitespace) {
        return Err(CatastroError::malformed(OPERATION, "empty geometry response"));
    }

    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut path: Vec<Vec<u8>> = Vec::new();
    let mut capture: Option<Capture> = None;

    let mut reference_point: Option<String> = None;
    let mut exterior: Option<String> = None;
    let mut area: Option<String> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let name = e.local_name().as_ref().to_vec();
                capture = match name.as_slice() {
                    b"pos" if reference_point.is_none() && within(&path, b"referencePoint") => {
                        Some(Capture::ReferencePoint)
                    }
                    b"posList" if exterior.is_none() && within(&path, b"exterior") => {
                        Some(Capture::Exterior)
                    }
                    b"areaValue" if area.is_none() => Some(Capture::Area),
                    _ => None,
                };
                path.push(name);
            }
            Ok(Event::End(_)) => {
                if let Some(target) = capture.take() {
                    let slot = match target {
                        Capture::ReferencePoint => &mut reference_point,
                        Capture::Exterior => &mut exterior,
                        Capture::Area => &mut area,
                    };
                    slot.get_or_insert_with(String::new);
                }
                path.pop();
            }
            Ok(Event::Text(ref e)) => {
                if let Some(target) = capture {
                    let text = e.unescape().map_err(|err| {
                        CatastroError::malformed(OPERATION, format!("invalid text: {}", err))
                    })?;
                    let slot = match target {
                        Capture::ReferencePoint => &mut reference_point,
                        Capture::Exterior => &mut exterior,
                        Capture::Area => &mut area,
                    };
                    let value = slot.get_or_insert_with(String::new);
                    if !value.is_empty() {
                        value.push(' ');
                    }
                    value.push_str(&text);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(CatastroError::malformed(
                    OPERATION,
                    format!("XML error at {}: {}", reader.buffer_position(), e),
                ))
            }
            _ => {}
        }
        buf.clear();
    }

    let reference_point = reference_point
        .ok_or_else(|| CatastroError::malformed(OPERATION, "missing cp:referencePoint"))?;
    let centroid = match parse_coords(&reference_point, srs.axis_order())?.as_slice() {
        [coord] => Point::from(*coord),
        other => {
            return Err(CatastroError::malformed(
                OPERATION,
                format!("reference point has {} positions", other.len()),
            ))
        }
    };

    let boundary = match exterior {
        Some(pos_list) => {
            let coords = parse_coords(&pos_list, srs.axis_order())?;
            if coords.len() < 3 {
                return Err(CatastroError::malformed(
                    OPERATION,
                    format!("boundary ring has {} points", coords.len()),
                ));
            }
            Some(LineString::new(coords))
        }
        None => None,
    };

    let area = area.ok_or_else(|| CatastroError::malformed(OPERATION, "missing cp:areaValue"))?;
    let area: f64 = fast_float::parse(area.trim())
        .map_err(|_| CatastroError::malformed(OPERATION, format!("invalid area: {:?}", area)))?;
    if !(area >= 0.0) {
        return Err(CatastroError::malformed(
            OPERATION,
            format!("negative area: {}", area),
        ));
    }

    Ok(ParcelGeometry {
        centroid,
        boundary,
        area,
    })
}

/// Vrai si un ancêtre porte ce nom local
fn within(path: &[Vec<u8>], name: &[u8]) -> bool {
    path.iter().any(|n| n.as_slice() == name)
}

/// Consomme une liste plate de valeurs, deux par deux
fn parse_coords(list: &str, order: AxisOrder) -> Result<Vec<Coord<f64>>, CatastroError> {
    let values = list
        .split_ascii_whitespace()
        .map(|v| {
            fast_float::parse::<f64, _>(v).map_err(|_| {
                CatastroError::malformed(OPERATION, format!("invalid coordinate: {:?}", v))
            })
        })
        .collect::<Result<Vec<f64>, _>>()?;

    if values.len() % 2 != 0 {
        return Err(CatastroError::malformed(
            OPERATION,
            format!("odd number of coordinate values: {}", values.len()),
        ));
    }

    Ok(values
        .chunks_exact(2)
        .map(|pair| match order {
            AxisOrder::LatLon => Coord {
                x: pair[1],
                y: pair[0],
            },
            AxisOrder::EastNorth => Coord {
                x: pair[0],
                y: pair[1],
            },
        })
        .collect())
}
