use casemap::boundary::{join_with_report, BoundaryDocument};
use casemap::loader::load_rows_from_str;
use casemap::{aggregate, join, normalize, BoundaryFeature, ColorScale, Legend, RawRow, StatKind, ALL_STATES};

const REPORT: &str = "\
FIPS,Admin2,Province_State,Country_Region,Last_Update,Lat,Long_,Confirmed,Deaths,Recovered,Active,Combined_Key
48201,Harris,Texas,US,2020-04-20 23:36:47,29.8,-95.4,10,1,2,7,\"Harris, Texas, US\"
48453,Travis,Texas,US,2020-04-20 23:36:47,30.3,-97.8,5,0,1,4,\"Travis, Texas, US\"
36047,Kings,New York,US,2020-04-20 23:36:47,40.6,-73.9,400,40,0,360,\"Kings, New York, US\"
36081,Queens,New York,US,2020-04-20 23:36:47,40.7,-73.8,300,30,10,260,\"Queens, New York, US\"
,,Ontario,Canada,2020-04-20 23:36:47,51.2,-85.3,99,9,9,81,\"Ontario, Canada\"
,,Ontario,CA,2020-04-20 23:36:47,51.2,-85.3,7,0,0,7,\"Ontario, CA\"
";

const STATES_TOPOLOGY: &str = r#"{
    "type": "Topology",
    "arcs": [],
    "objects": {
        "all-states": {
            "type": "GeometryCollection",
            "geometries": [
                {"type": "Polygon", "arcs": [], "properties": {"NAME": "Texas"}},
                {"type": "Polygon", "arcs": [], "properties": {"NAME": "New York"}},
                {"type": "Polygon", "arcs": [], "properties": {"NAME": "Ohio"}}
            ]
        }
    }
}"#;

fn row(country: &str, state: &str, county: &str, c: u64, d: u64, r: u64) -> RawRow {
    RawRow {
        country: country.into(),
        state: state.into(),
        county: county.into(),
        confirmed: c,
        deaths: d,
        recovered: r,
    }
}

#[test]
fn texas_scenario() {
    let rows = vec![
        row("US", "Texas", "Harris", 10, 1, 2),
        row("US", "Texas", "Travis", 5, 0, 1),
    ];
    let store = aggregate(&rows, "US").unwrap();
    let texas = store.get("texas").unwrap();
    assert_eq!((texas.info.confirmed, texas.info.deaths, texas.info.recovered), (15, 1, 3));
    assert_eq!(texas.regions.len(), 2);

    let features = vec![
        BoundaryFeature::named("Harris"),
        BoundaryFeature::named("Travis"),
        BoundaryFeature::named("Bexar"),
    ];
    let joined = join(texas, &features);
    assert!(joined[0].has_data());
    assert!(joined[1].has_data());
    assert!(!joined[2].has_data());
}

#[test]
fn foreign_rows_contribute_nothing() {
    let rows = vec![
        row("US", "Texas", "Harris", 10, 1, 2),
        row("CA", "Texas", "Harris", 1000, 100, 10),
    ];
    let store = aggregate(&rows, "US").unwrap();
    assert_eq!(store.get("texas").unwrap().info.confirmed, 10);
    assert_eq!(store.all_states().unwrap().info.confirmed, 10);
}

#[test]
fn rollup_matches_sum_of_states() {
    let (rows, report) = load_rows_from_str("04-20-2020.csv", REPORT).unwrap();
    assert_eq!(report.loaded_rows, 6);
    let store = aggregate(&rows, "US").unwrap();
    let all = store.get(ALL_STATES).unwrap();
    for kind in StatKind::ALL {
        let sum: u64 = store.states().map(|(_, b)| b.info.value(kind)).sum();
        assert_eq!(all.info.value(kind), sum, "{}", kind);
    }
    assert_eq!(all.info.confirmed, 715);
    assert_eq!(all.regions.len(), 2);
}

#[test]
fn ui_keys_match_store_keys() {
    let (rows, _) = load_rows_from_str("r.csv", REPORT).unwrap();
    let store = aggregate(&rows, "US").unwrap();
    assert!(store.get(&normalize("New York")).is_some());
    assert!(store.get(&normalize(&normalize("New York"))).is_some());
}

#[test]
fn country_map_end_to_end() {
    let (rows, _) = load_rows_from_str("r.csv", REPORT).unwrap();
    let store = aggregate(&rows, "US").unwrap();
    let bucket = store.get(ALL_STATES).unwrap();

    let doc = BoundaryDocument::parse("all-states.json", STATES_TOPOLOGY, "NAME").unwrap();
    let features = doc.features_for(ALL_STATES).unwrap();
    let (joined, report) = join_with_report(bucket, features);
    assert_eq!(report.matched_features, 2);
    assert_eq!(report.unmatched_features, vec!["Ohio".to_string()]);

    let scale = ColorScale::build(&bucket.values(StatKind::Deaths), StatKind::Deaths).unwrap();
    assert_eq!(scale.domain(), (1.0, 70.0));
    let new_york = joined.iter().find(|f| f.name == "New York").unwrap();
    assert_eq!(
        scale.fill(new_york.stats.map(|s| s.deaths)),
        scale.palette.high
    );

    let legend = Legend::from_scale(&scale, 5);
    assert_eq!(legend.cells.first().unwrap().label, "Less than 15");
    assert!(legend.cells.last().unwrap().label.ends_with("or more"));
}
