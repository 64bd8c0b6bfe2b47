use std::io::Write;

use jalan_desa::loader::load_csv;
use jalan_desa::{
    apply_filter, compute_stats, longest_heavy_damage, resolve_options, Dataset, Dimension,
    RoadSegment, Selection, SelectionCriteria,
};

fn seg(kab: &str, kec: &str, desa: &str, good: f64, heavy: f64) -> RoadSegment {
    RoadSegment {
        province_region: Some(kab.into()),
        sub_region: Some(kec.into()),
        village: Some(desa.into()),
        segment_name: Some(format!("Ruas {desa}")),
        surface_type: Some("Aspal".into()),
        good: Some(good),
        light_damage: Some(0.0),
        moderate_damage: Some(0.0),
        heavy_damage: Some(heavy),
        total_length: Some(good + heavy),
        ..Default::default()
    }
}

fn three_rows() -> Dataset {
    Dataset::new(vec![
        seg("District A", "SubA", "VillageX", 100.0, 0.0),
        seg("District A", "SubB", "VillageY", 0.0, 50.0),
        seg("District B", "SubC", "VillageZ", 200.0, 0.0),
    ])
}

fn district(name: &str) -> SelectionCriteria {
    SelectionCriteria {
        province_region: Selection::parse(name),
        ..Default::default()
    }
}

#[test]
fn district_filter_and_stats() {
    let ds = three_rows();
    let filtered = apply_filter(&ds, &district("District A")).unwrap();
    assert_eq!(filtered.len(), 2);

    let s = compute_stats(filtered.rows());
    assert_eq!(s.good, 100.0);
    assert_eq!(s.heavy, 50.0);
    assert_eq!(s.total_length(), 150.0);
    assert!((s.pct(s.heavy) - 33.333).abs() < 0.01);
}

#[test]
fn longest_heavy_damage_over_everything() {
    let ds = three_rows();
    let all = apply_filter(&ds, &SelectionCriteria::all()).unwrap();
    let row = longest_heavy_damage(&all).unwrap();
    assert_eq!(row.village.as_deref(), Some("VillageY"));
    assert_eq!(row.heavy_damage, Some(50.0));
}

#[test]
fn empty_dataset_degrades_gracefully() {
    let ds = Dataset::empty();
    for dim in [
        Dimension::ProvinceRegion,
        Dimension::SubRegion,
        Dimension::Village,
        Dimension::SurfaceType,
    ] {
        assert_eq!(resolve_options(&ds, dim, None).unwrap(), vec!["all"]);
    }
    let a = Selection::parse("District A");
    assert_eq!(
        resolve_options(&ds, Dimension::SubRegion, Some((Dimension::ProvinceRegion, &a))).unwrap(),
        vec!["all"]
    );

    let filtered = apply_filter(&ds, &district("District A")).unwrap();
    assert!(filtered.is_empty());
    let s = compute_stats(filtered.rows());
    assert_eq!(s.total_segments, 0);
    assert_eq!(s.total_length(), 0.0);
    assert_eq!(s.pct(s.good), 0.0);
    assert!(longest_heavy_damage(&filtered).is_none());
}

#[test]
fn filtering_is_idempotent() {
    let ds = three_rows();
    for criteria in [
        SelectionCriteria::all(),
        district("District A"),
        SelectionCriteria {
            sub_region: Selection::parse("SubC"),
            surface_type: Selection::parse("Aspal"),
            ..Default::default()
        },
    ] {
        let once = apply_filter(&ds, &criteria).unwrap();
        let twice = apply_filter(&once, &criteria).unwrap();
        assert_eq!(once.rows(), twice.rows());
    }
}

#[test]
fn constrained_options_are_a_subset() {
    let ds = three_rows();
    let unconstrained = resolve_options(&ds, Dimension::SubRegion, None).unwrap();
    for province in resolve_options(&ds, Dimension::ProvinceRegion, None).unwrap() {
        let sel = Selection::parse(&province);
        let constrained = resolve_options(
            &ds,
            Dimension::SubRegion,
            Some((Dimension::ProvinceRegion, &sel)),
        )
        .unwrap();
        assert_eq!(constrained[0], "all");
        assert!(constrained.iter().all(|v| unconstrained.contains(v)));
    }
}

#[test]
fn resolving_twice_gives_the_same_list() {
    let ds = three_rows();
    let a = resolve_options(&ds, Dimension::Village, None).unwrap();
    let b = resolve_options(&ds, Dimension::Village, None).unwrap();
    assert_eq!(a, b);
    assert_eq!(a, vec!["all", "VillageX", "VillageY", "VillageZ"]);
}

#[test]
fn csv_file_round_through_filter() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "NO,KABUPATEN,KECAMATAN,DESA,NAMA RUAS JALAN DESA,JENIS PERKERASAN,BAIK (meter),RUSAK RINGAN (meter),RUSAK SEDANG (meter),RUSAK BERAT (meter),TOTAL PANJANG JALAN (meter),LAT AWAL,LNG AWAL,LAT AKHIR,LNG AKHIR"
    )
    .unwrap();
    writeln!(file, "1,Bogor,Ciawi,Bendungan,Jl. Mawar,Aspal,100,10,5,0,115,,,,").unwrap();
    writeln!(file, "2,Bogor,Ciawi,Citapen,Jl. Kenanga,Beton,40,0,0,60,100,,,,").unwrap();
    writeln!(file, "3,Garut,Cibatu,Wanakerta,Jl. Melati,Aspal,,,,,,,,,").unwrap();
    file.flush().unwrap();

    let (ds, report) = load_csv(file.path()).unwrap();
    assert_eq!(report.loaded_rows, 3);
    assert_eq!(report.quality.missing_lengths, 1);

    let filtered = apply_filter(
        &ds,
        &SelectionCriteria {
            surface_type: Selection::parse("Aspal"),
            ..Default::default()
        },
    )
    .unwrap();
    let s = compute_stats(filtered.rows());
    assert_eq!(s.total_segments, 2);
    assert_eq!(s.total_length(), 115.0);
    let sum = s.pct(s.good) + s.pct(s.light) + s.pct(s.moderate) + s.pct(s.heavy);
    assert!((sum - 100.0).abs() < 1e-9);
}
