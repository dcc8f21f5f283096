//! # catastro
//!
//! Client des services web du Catastro espagnol (Dirección General del Catastro).
//!
//! ## Features
//!
//! - Recherche d'une parcelle par référence cadastrale, par polygone/parcelle
//!   ou par adresse
//! - Résolution des références parapluie en collections de parcelles
//! - Géométrie INSPIRE (centroïde, contour, surface) dans le système demandé
//! - Niveaux des bâtiments, valeurs urbaines et modules rustiques
//! - Export JSON (serde) et GeoJSON (geozero)
//!
//! ## Usage
//!
//! ```rust,no_run
//! use catastro::{Catastro, CatastroConfig, ParcelQuery};
//!
//! let catastro = Catastro::new(CatastroConfig::default())?;
//!
//! let parcel = catastro.parcel(&ParcelQuery::by_reference("1541506VK4714B0002PK"))?;
//! println!("{}: {} m²", parcel.reference(), parcel.surface());
//!
//! let collection = catastro.parcel_collection(
//!     &ParcelQuery::by_polygon("MADRID", "GUADALIX DE LA SIERRA", "23", "149")
//!         .with_reference_system("EPSG:25830"),
//! )?;
//! for parcel in &collection {
//!     println!("{} {:?}", parcel.reference(), parcel.perimeter());
//! }
//! # Ok::<(), catastro::CatastroError>(())
//! ```

pub mod catalog;
pub mod config;
pub mod error;
pub mod export;
pub mod mercator;
pub mod parser;
pub mod resolve;
pub mod srs;
pub mod street;
pub mod transport;
pub mod types;

pub use config::{CatastroConfig, Endpoints};
pub use error::CatastroError;
pub use export::{export_to_geojson, write_geojson};
pub use resolve::{Catastro, Lookup, ParcelQuery};
pub use srs::ReferenceSystem;
pub use street::{CallejeroStreets, Street, StreetQuery, StreetResolver};
pub use transport::{HttpResponse, HttpTransport, Transport};
pub use types::{
    CropModules, FloorCount, LandUse, LandUseDetails, Parcel, ParcelCollection, Region,
    RusticDetails, UrbanDetails,
};
