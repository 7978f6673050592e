//! Tests de bout en bout de la migration sur un stockage en mémoire

use std::collections::BTreeSet;
use std::io::Write;
use std::path::Path;

use anyhow::Result;
use geo::{polygon, Geometry, MultiPolygon};
use geoestadistico::{Feature, MarcoError};
use indicatif::ProgressBar;
use serde_json::{json, Value};

use marco_pg::export::{LocalityId, SpatialRef};
use marco_pg::migrate::{self, migrate_features, LevelOutcome, Lookups};
use marco_pg::{Level, MemoryStore, MigrationError, MigrationReport};
use shapefile::dbase::{FieldName, FieldValue, Record, TableWriterBuilder};
use shapefile::{Point, PolygonRing};
use zip::write::SimpleFileOptions;

const SRS: &str = "EPSG:4326";

fn square(x: f64, y: f64) -> geo::Polygon {
    polygon![(x: x, y: y), (x: x + 1.0, y: y), (x: x + 1.0, y: y + 1.0), (x: x, y: y)]
}

fn feature(index: usize, geometry: Geometry, properties: Value) -> Feature {
    Feature {
        index,
        geometry,
        properties: properties
            .as_object()
            .unwrap()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
    }
}

fn entity(index: usize, ent: &str) -> Feature {
    feature(
        index,
        Geometry::Polygon(square(0.0, 0.0)),
        json!({"CVEGEO": ent, "CVE_ENT": ent, "NOMGEO": format!("Entidad {}", ent)}),
    )
}

fn municipality(index: usize, ent: &str, mun: &str) -> Feature {
    feature(
        index,
        Geometry::Polygon(square(0.0, 0.0)),
        json!({"CVEGEO": format!("{}{}", ent, mun), "CVE_ENT": ent, "CVE_MUN": mun, "NOMGEO": format!("Municipio {}{}", ent, mun)}),
    )
}

fn locality(index: usize, ent: &str, mun: &str, loc: &str) -> Feature {
    feature(
        index,
        Geometry::MultiPolygon(MultiPolygon::new(vec![square(0.0, 0.0), square(5.0, 5.0)])),
        json!({"CVEGEO": format!("{}{}{}", ent, mun, loc), "CVE_ENT": ent, "CVE_MUN": mun, "CVE_LOC": loc, "NOMGEO": "Localidad"}),
    )
}

async fn pass(
    store: &mut MemoryStore,
    level: Level,
    features: Vec<Feature>,
    lookups: &Lookups,
) -> Result<LevelOutcome> {
    let features = features.into_iter().map(Ok::<_, MarcoError>);
    migrate_features(store, level, SRS, features, lookups, &ProgressBar::hidden()).await
}

/// Enchaîne les trois passes comme `migrate_all`
async fn migrate(
    store: &mut MemoryStore,
    entities: Vec<Feature>,
    municipalities: Vec<Feature>,
    localities: Vec<Feature>,
) -> Result<Vec<LevelOutcome>> {
    let mut lookups = Lookups::default();
    let mut outcomes = Vec::new();

    for (level, features) in [
        (Level::Entity, entities),
        (Level::Municipality, municipalities),
        (Level::Locality, localities),
    ] {
        let mut outcome = pass(store, level, features, &lookups).await?;
        if level.is_parent_level() {
            lookups.insert(level, std::mem::take(&mut outcome.index));
        }
        outcomes.push(outcome);
    }

    Ok(outcomes)
}

fn parents(store: &MemoryStore, id: LocalityId) -> BTreeSet<LocalityId> {
    store.locality(id).unwrap().is_part_of.clone()
}

fn find(store: &MemoryStore, cvegeo: &str) -> LocalityId {
    store
        .localities()
        .iter()
        .find(|l| l.record.metadata["CVEGEO"].as_str().map(str::trim) == Some(cvegeo))
        .unwrap_or_else(|| panic!("No locality with CVEGEO {}", cvegeo))
        .id
}

#[tokio::test]
async fn test_end_to_end_single_branch() {
    let mut store = MemoryStore::new(SpatialRef::epsg(4326));
    let outcomes = migrate(
        &mut store,
        vec![entity(0, "01")],
        vec![municipality(0, "01", "001")],
        vec![locality(0, "01", "001", "0001")],
    )
    .await
    .unwrap();

    assert_eq!(store.locality_types().len(), 3);
    assert_eq!(store.localities().len(), 3);

    let ent = find(&store, "01");
    let mun = find(&store, "01001");
    let loc = find(&store, "010010001");

    assert!(parents(&store, ent).is_empty());
    assert_eq!(parents(&store, mun), BTreeSet::from([ent]));
    assert_eq!(parents(&store, loc), BTreeSet::from([ent, mun]));

    let created: Vec<usize> = outcomes.iter().map(|o| o.created).collect();
    let links: Vec<usize> = outcomes.iter().map(|o| o.links).collect();
    assert_eq!(created, vec![1, 1, 1]);
    assert_eq!(links, vec![0, 1, 2]);
}

#[tokio::test]
async fn test_geometries_are_always_multipolygons() {
    let mut store = MemoryStore::new(SpatialRef::epsg(4326));
    migrate(
        &mut store,
        vec![entity(0, "01"), entity(1, "02")],
        vec![municipality(0, "01", "001")],
        vec![locality(0, "01", "001", "0001")],
    )
    .await
    .unwrap();

    for stored in store.localities() {
        assert!(
            stored.record.geometry_wkt.starts_with("MULTIPOLYGON"),
            "{} stored as {}",
            stored.record.name,
            stored.record.geometry_wkt
        );
        assert_eq!(stored.record.srid, 4326);
    }
}

#[tokio::test]
async fn test_locality_types_and_metadata_follow_levels() {
    let mut store = MemoryStore::new(SpatialRef::epsg(4326));
    let outcomes = migrate(
        &mut store,
        vec![entity(0, "01")],
        vec![municipality(0, "01", "001")],
        vec![locality(0, "01", "001", "0001")],
    )
    .await
    .unwrap();

    for outcome in &outcomes {
        let codes: Vec<&str> = outcome.level.attributes().iter().map(|(c, _)| *c).collect();

        let stored_type = store
            .locality_types()
            .iter()
            .find(|t| t.id == outcome.locality_type)
            .unwrap();
        let required: Vec<&str> = stored_type.record.metadata_schema["required"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap())
            .collect();
        assert_eq!(required, codes);
        assert_eq!(stored_type.record.original_datum, SRS);

        for stored in store.localities_of_type(outcome.locality_type) {
            let keys: Vec<&str> = stored.record.metadata.keys().map(|k| k.as_str()).collect();
            let mut expected = codes.clone();
            expected.sort_unstable();
            let mut keys = keys;
            keys.sort_unstable();
            assert_eq!(keys, expected);
            assert!(!stored.record.metadata.contains_key("NOMGEO"));
        }
    }
}

#[tokio::test]
async fn test_municipality_codes_are_scoped_by_entity() {
    // "001" existe dans chaque entité : chaque localité doit rester dans son entité
    let mut store = MemoryStore::new(SpatialRef::epsg(4326));
    migrate(
        &mut store,
        vec![entity(0, "01"), entity(1, "02")],
        vec![municipality(0, "01", "001"), municipality(1, "02", "001")],
        vec![
            locality(0, "01", "001", "0001"),
            locality(1, "02", "001", "0001"),
        ],
    )
    .await
    .unwrap();

    for stored in store.localities().iter().filter(|l| l.record.metadata.contains_key("CVE_LOC")) {
        let ent_code = &stored.record.metadata["CVE_ENT"];
        assert_eq!(stored.is_part_of.len(), 2);

        for parent in &stored.is_part_of {
            let parent = store.locality(*parent).unwrap();
            assert_eq!(&parent.record.metadata["CVE_ENT"], ent_code);
        }
    }
}

#[tokio::test]
async fn test_unknown_entity_aborts_before_any_municipality() {
    let mut store = MemoryStore::new(SpatialRef::epsg(4326));
    let err = migrate(
        &mut store,
        vec![entity(0, "01")],
        vec![municipality(0, "09", "001"), municipality(1, "01", "002")],
        vec![locality(0, "01", "002", "0001")],
    )
    .await
    .unwrap_err();

    match err.downcast_ref::<MigrationError>() {
        Some(MigrationError::MissingParent { level, parent, key, .. }) => {
            assert_eq!(*level, Level::Municipality);
            assert_eq!(*parent, Level::Entity);
            assert_eq!(key, "09");
        }
        other => panic!("Expected MissingParent, got {:?}", other),
    }

    // Seule l'entité a été créée ; le LocalityType du municipio existe déjà
    assert_eq!(store.localities().len(), 1);
    assert_eq!(store.locality_types().len(), 2);
}

#[tokio::test]
async fn test_unknown_municipality_stops_locality_pass() {
    let mut store = MemoryStore::new(SpatialRef::epsg(4326));
    let err = migrate(
        &mut store,
        vec![entity(0, "01")],
        vec![municipality(0, "01", "001")],
        vec![
            locality(0, "01", "001", "0001"),
            locality(1, "01", "002", "0001"),
            locality(2, "01", "001", "0002"),
        ],
    )
    .await
    .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<MigrationError>(),
        Some(MigrationError::MissingParent {
            parent: Level::Municipality,
            feature_index: 1,
            ..
        })
    ));
    // entité + municipio + première localité
    assert_eq!(store.localities().len(), 3);
}

#[tokio::test]
async fn test_rerun_duplicates_records() {
    let mut store = MemoryStore::new(SpatialRef::epsg(4326));
    for _ in 0..2 {
        migrate(
            &mut store,
            vec![entity(0, "01")],
            vec![municipality(0, "01", "001")],
            vec![locality(0, "01", "001", "0001")],
        )
        .await
        .unwrap();
    }

    assert_eq!(store.locality_types().len(), 6);
    assert_eq!(store.localities().len(), 6);
}

#[tokio::test]
async fn test_unsupported_geometry_aborts() {
    let mut store = MemoryStore::new(SpatialRef::epsg(4326));
    let point = feature(
        0,
        Geometry::Point(geo::point!(x: 1.0, y: 1.0)),
        json!({"CVEGEO": "01", "CVE_ENT": "01"}),
    );

    let err = pass(&mut store, Level::Entity, vec![point], &Lookups::default())
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<MarcoError>(),
        Some(MarcoError::UnsupportedGeometry { .. })
    ));
    assert!(store.localities().is_empty());
}

#[tokio::test]
async fn test_read_error_aborts_pass() {
    let mut store = MemoryStore::new(SpatialRef::epsg(4326));
    let features = vec![
        Ok(entity(0, "01")),
        Err(MarcoError::MissingFile("01_32_ent.dbf".into())),
        Ok(entity(2, "02")),
    ];

    let result = migrate_features(
        &mut store,
        Level::Entity,
        SRS,
        features,
        &Lookups::default(),
        &ProgressBar::hidden(),
    )
    .await;

    assert!(result.is_err());
    assert_eq!(store.localities().len(), 1);
}

// Archives INEGI reconstituées : vrais .shp/.shx/.dbf/.prj zippés

fn ring(x0: f64, y0: f64) -> Vec<Point> {
    // Sens horaire (anneau extérieur shapefile)
    vec![
        Point::new(x0, y0),
        Point::new(x0, y0 + 1.0),
        Point::new(x0 + 1.0, y0 + 1.0),
        Point::new(x0 + 1.0, y0),
        Point::new(x0, y0),
    ]
}

/// Écrit une couche d'un niveau : une feature par ligne de codes
fn write_layer(dir: &Path, level: Level, rows: &[(shapefile::Polygon, Vec<&str>)]) {
    let mut table = TableWriterBuilder::new()
        .add_character_field(FieldName::try_from("CVEGEO").unwrap(), 9);
    let codes: Vec<&str> = level.key_fields().to_vec();
    for code in &codes {
        table = table.add_character_field(FieldName::try_from(*code).unwrap(), 4);
    }
    table = table.add_character_field(FieldName::try_from("NOMGEO").unwrap(), 40);

    let shp = dir.join(level.file_name());
    {
        let mut writer = shapefile::Writer::from_path(&shp, table).unwrap();
        for (polygon, values) in rows {
            let mut record = Record::default();
            record.insert("CVEGEO".into(), FieldValue::Character(Some(values.concat())));
            for (code, value) in codes.iter().zip(values.iter()) {
                record.insert((*code).into(), FieldValue::Character(Some((*value).into())));
            }
            record.insert(
                "NOMGEO".into(),
                FieldValue::Character(Some(format!("{} {}", level.name(), values.concat()))),
            );
            writer.write_shape_and_record(polygon, &record).unwrap();
        }
    }
    std::fs::write(shp.with_extension("prj"), SRS).unwrap();
}

fn zip_layer(layer_dir: &Path, level: Level, archive: &Path) {
    let mut writer = zip::ZipWriter::new(std::fs::File::create(archive).unwrap());
    for ext in ["shp", "shx", "dbf", "prj"] {
        let path = layer_dir.join(level.file_name()).with_extension(ext);
        let name = path.file_name().unwrap().to_str().unwrap().to_string();
        writer.start_file(name, SimpleFileOptions::default()).unwrap();
        writer.write_all(&std::fs::read(&path).unwrap()).unwrap();
    }
    writer.finish().unwrap();
}

/// ent.zip (une entité à deux anneaux extérieurs), mun.zip, l.zip
fn write_archives(data_dir: &Path) {
    let staging = tempfile::tempdir().unwrap();
    let single = || shapefile::Polygon::new(PolygonRing::Outer(ring(0.0, 0.0)));

    write_layer(
        staging.path(),
        Level::Entity,
        &[(
            shapefile::Polygon::with_rings(vec![
                PolygonRing::Outer(ring(0.0, 0.0)),
                PolygonRing::Outer(ring(10.0, 10.0)),
            ]),
            vec!["01"],
        )],
    );
    write_layer(staging.path(), Level::Municipality, &[(single(), vec!["01", "001"])]);
    write_layer(staging.path(), Level::Locality, &[(single(), vec!["01", "001", "0001"])]);

    std::fs::create_dir_all(data_dir).unwrap();
    for (level, archive) in [
        (Level::Entity, "ent.zip"),
        (Level::Municipality, "mun.zip"),
        (Level::Locality, "l.zip"),
    ] {
        zip_layer(staging.path(), level, &data_dir.join(archive));
    }
}

#[tokio::test]
async fn test_run_from_zipped_shapefiles() {
    let dir = tempfile::tempdir().unwrap();
    let data_dir = dir.path().join("data");
    let extract_dir = dir.path().join("extracted_data");
    write_archives(&data_dir);

    let mut store = MemoryStore::new(SpatialRef::epsg(4326));

    let mut report = MigrationReport::new();
    migrate::run(&mut store, &data_dir, &extract_dir, &mut report, false)
        .await
        .unwrap();

    assert!(report.extracted);
    assert!(extract_dir.join("01_32_l.shp").is_file());
    assert_eq!(report.levels.len(), 3);
    assert_eq!(store.locality_types().len(), 3);
    assert_eq!(store.localities().len(), 3);

    let ent = find(&store, "01");
    let mun = find(&store, "01001");
    let loc = find(&store, "010010001");
    assert_eq!(parents(&store, mun), BTreeSet::from([ent]));
    assert_eq!(parents(&store, loc), BTreeSet::from([ent, mun]));

    // Deux anneaux extérieurs : deux polygones dans le MultiPolygon stocké
    let entity = store.locality(ent).unwrap();
    assert!(entity.record.geometry_wkt.starts_with("MULTIPOLYGON"));
    assert!(
        entity.record.geometry_wkt.replace(' ', "").contains(")),(("),
        "{}",
        entity.record.geometry_wkt
    );
    assert!(entity.record.name.starts_with("Entidad 01"));

    let locality = store.locality(loc).unwrap();
    assert!(locality.record.geometry_wkt.starts_with("MULTIPOLYGON"));
    assert_eq!(
        locality.record.metadata["CVE_LOC"].as_str().map(str::trim),
        Some("0001")
    );

    // Deuxième run : pas de nouvelle extraction, mais les enregistrements sont recréés
    let mut report = MigrationReport::new();
    migrate::run(&mut store, &data_dir, &extract_dir, &mut report, false)
        .await
        .unwrap();

    assert!(!report.extracted);
    assert_eq!(store.locality_types().len(), 6);
    assert_eq!(store.localities().len(), 6);
    assert_eq!(report.total_localities(), 3);
}
