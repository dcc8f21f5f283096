//! Projection Web Mercator (EPSG:3857)
//!
//! Modèle sphérique de rayon égal au demi-grand axe WGS84. Utilisée pour
//! construire la BBOX des requêtes WMS des valeurs rustiques.

use geo::{Coord, LineString};

/// Demi-grand axe WGS84 (mètres)
const WGS84_A: f64 = 6_378_137.0;

/// Latitude limite de la projection (degrés)
const MAX_LATITUDE: f64 = 85.0;

/// Convertit longitude/latitude (degrés) vers Web Mercator
pub fn to_web_mercator(lon: f64, lat: f64) -> Coord<f64> {
    let lat = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();

    Coord {
        x: WGS84_A * lon.to_radians(),
        // Y = R * ln(tan(π/4 + lat/2))
        y: WGS84_A * (std::f64::consts::FRAC_PI_4 + lat / 2.0).tan().ln(),
    }
}

/// Projette chaque point d'une ligne (x = longitude, y = latitude)
pub fn project_line(line: &LineString<f64>) -> LineString<f64> {
    line.coords().map(|c| to_web_mercator(c.x, c.y)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_madrid_to_web_mercator() {
        // Madrid: 3.7038°W, 40.4168°N
        let c = to_web_mercator(-3.7038, 40.4168);

        // X ≈ -412300, Y ≈ 4926700
        assert!((c.x + 412_300.0).abs() < 500.0, "x={}", c.x);
        assert!((c.y - 4_926_700.0).abs() < 1_000.0, "y={}", c.y);
    }

    #[test]
    fn test_origin() {
        let c = to_web_mercator(0.0, 0.0);
        assert!(c.x.abs() < 1e-9);
        assert!(c.y.abs() < 1e-9);
    }

    #[test]
    fn test_latitude_is_clamped() {
        assert_eq!(to_web_mercator(0.0, 90.0), to_web_mercator(0.0, 85.0));
    }

    #[test]
    fn test_project_line() {
        let line = LineString::from(vec![(0.0, 0.0), (1.0, 0.0)]);
        let projected = project_line(&line);
        assert_eq!(projected.0.len(), 2);
        assert!((projected.0[1].x - 111_319.49).abs() < 0.1);
    }
}
