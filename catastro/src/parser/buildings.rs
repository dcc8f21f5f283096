//! Parser GML pour la requête WFS `GetBuildingPartByParcel`

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::types::BuildingPart;
use crate::CatastroError;

const OPERATION: &str = "GetBuildingPartByParcel";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Floors {
    Above,
    Below,
}

/// Parse les parties de bâtiment d'une parcelle
pub fn parse_building_parts(xml: &[u8]) -> Result<Vec<BuildingPart>, CatastroError> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut parts = Vec::new();
    let mut current: Option<BuildingPart> = None;
    let mut capture: Option<Floors> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"BuildingPart" => {
                    current = Some(BuildingPart {
                        id: gml_id(e),
                        floors_above_ground: None,
                        floors_below_ground: 0,
                    });
                }
                b"numberOfFloorsAboveGround" if current.is_some() => capture = Some(Floors::Above),
                b"numberOfFloorsBelowGround" if current.is_some() => capture = Some(Floors::Below),
                _ => {}
            },
            Ok(Event::Text(ref e)) => {
                if let (Some(floors), Some(part)) = (capture, current.as_mut()) {
                    let text = e.unescape().map_err(|err| {
                        CatastroError::malformed(OPERATION, format!("invalid text: {}", err))
                    })?;
                    let value: u32 = text.trim().parse().map_err(|_| {
                        CatastroError::malformed(OPERATION, format!("invalid floor count: {:?}", text))
                    })?;
                    match floors {
                        Floors::Above => part.floors_above_ground = Some(value),
                        Floors::Below => part.floors_below_ground = value,
                    }
                }
            }
            Ok(Event::End(ref e)) => {
                capture = None;
                if e.local_name().as_ref() == b"BuildingPart" {
                    if let Some(part) = current.take() {
                        parts.push(part);
                    }
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

    Ok(parts)
}

fn gml_id(e: &BytesStart<'_>) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.local_name().as_ref() == b"id")
        .map(|attr| String::from_utf8_lossy(&attr.value).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    const BUILDING_PARTS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gml:FeatureCollection xmlns:gml="http://www.opengis.net/gml/3.2" xmlns:bu-ext2d="http://inspire.jrc.ec.europa.eu/schemas/bu-ext2d/2.0">
  <gml:featureMember>
    <bu-ext2d:BuildingPart gml:id="ES.SDGC.BU.1541506VK4714B_part1">
      <bu-ext2d:numberOfFloorsAboveGround>6</bu-ext2d:numberOfFloorsAboveGround>
      <bu-ext2d:numberOfFloorsBelowGround>1</bu-ext2d:numberOfFloorsBelowGround>
    </bu-ext2d:BuildingPart>
  </gml:featureMember>
  <gml:featureMember>
    <bu-ext2d:BuildingPart gml:id="ES.SDGC.BU.1541506VK4714B_part2">
      <bu-ext2d:numberOfFloorsAboveGround>2</bu-ext2d:numberOfFloorsAboveGround>
      <bu-ext2d:numberOfFloorsBelowGround/>
    </bu-ext2d:BuildingPart>
  </gml:featureMember>
</gml:FeatureCollection>"#;

    #[test]
    fn test_parse_building_parts() {
        let parts = parse_building_parts(BUILDING_PARTS.as_bytes()).unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].id.as_deref(), Some("ES.SDGC.BU.1541506VK4714B_part1"));
        assert_eq!(parts[0].floors_above_ground, Some(6));
        assert_eq!(parts[0].floors_below_ground, 1);
        assert_eq!(parts[1].floors_above_ground, Some(2));
        assert_eq!(parts[1].floors_below_ground, 0);
    }

    #[test]
    fn test_no_building_parts() {
        let xml = r#"<gml:FeatureCollection xmlns:gml="http://www.opengis.net/gml/3.2"/>"#;
        assert!(parse_building_parts(xml.as_bytes()).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_floor_count() {
        let xml = r#"<BuildingPart><numberOfFloorsAboveGround>six</numberOfFloorsAboveGround></BuildingPart>"#;
        assert!(parse_building_parts(xml.as_bytes()).is_err());
    }
}
