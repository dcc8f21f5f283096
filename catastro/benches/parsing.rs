//! Benchmarks pour le parsing des réponses WFS

use catastro::parser::{buildings, wfs};
use catastro::ReferenceSystem;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

const URBAN_4326: &str = include_str!("../tests/fixtures/wfs_urban_4326.xml");
const RUSTIC_25830: &str = include_str!("../tests/fixtures/wfs_rustic_25830.xml");
const BUILDINGS: &str = include_str!("../tests/fixtures/wfs_buildings.xml");

/// Parcelle avec un contour de `points` sommets
fn large_parcel(points: usize) -> String {
    let ring: Vec<String> = (0..points)
        .map(|i| {
            let angle = i as f64 / points as f64 * std::f64::consts::TAU;
            format!("{:.7} {:.7}", 40.8 + 0.01 * angle.sin(), -3.69 + 0.01 * angle.cos())
        })
        .collect();

    format!(
        r#"<FeatureCollection xmlns:gml="http://www.opengis.net/gml/3.2" xmlns:cp="http://inspire.ec.europa.eu/schemas/cp/4.0"><member><cp:CadastralParcel>
<cp:areaValue uom="m2">1000</cp:areaValue>
<cp:geometry><gml:MultiSurface><gml:surfaceMember><gml:Surface><gml:patches><gml:PolygonPatch><gml:exterior><gml:LinearRing>
<gml:posList srsDimension="2">{}</gml:posList>
</gml:LinearRing></gml:exterior></gml:PolygonPatch></gml:patches></gml:Surface></gml:surfaceMember></gml:MultiSurface></cp:geometry>
<cp:referencePoint><gml:Point><gml:pos>40.8 -3.69</gml:pos></gml:Point></cp:referencePoint>
</cp:CadastralParcel></member></FeatureCollection>"#,
        ring.join(" ")
    )
}

fn bench_parse_parcel(c: &mut Criterion) {
    let projected = ReferenceSystem::from_epsg(25830).unwrap();

    let mut group = c.benchmark_group("parse_parcel");
    for (name, xml, srs) in [
        ("urban_4326", URBAN_4326, ReferenceSystem::WGS84),
        ("rustic_25830", RUSTIC_25830, projected),
    ] {
        group.throughput(Throughput::Bytes(xml.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(name), xml, |b, xml| {
            b.iter(|| black_box(wfs::parse_parcel(black_box(xml.as_bytes()), srs).unwrap()))
        });
    }
    group.finish();
}

fn bench_parse_large_ring(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_large_ring");
    for points in [100, 1_000, 10_000] {
        let xml = large_parcel(points);
        group.throughput(Throughput::Bytes(xml.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(points), &xml, |b, xml| {
            b.iter(|| {
                black_box(wfs::parse_parcel(black_box(xml.as_bytes()), ReferenceSystem::WGS84).unwrap())
            })
        });
    }
    group.finish();
}

fn bench_parse_buildings(c: &mut Criterion) {
    c.bench_function("parse_building_parts", |b| {
        b.iter(|| black_box(buildings::parse_building_parts(black_box(BUILDINGS.as_bytes())).unwrap()))
    });
}

criterion_group!(
    benches,
    bench_parse_parcel,
    bench_parse_large_ring,
    bench_parse_buildings
);
criterion_main!(benches);
