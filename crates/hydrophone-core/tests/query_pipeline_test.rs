//! Query construction and distinct extraction end to end.

use hydrophone_core::{
    build_pipeline, extract_distinct, Error, Publisher, QueryTransaction, StudySite,
};
use serde_json::json;

fn faceted_query() -> QueryTransaction {
    QueryTransaction {
        publishers: vec![Publisher::new("Seger", "Kerri"), Publisher::new("Abadi", "Shima")],
        study_sites: vec![
            StudySite::new("Seattle", "WA", "", "USA"),
            StudySite::new("Vancouver", "", "BC", "Canada"),
            StudySite::new("Cape Town", "", "", "South Africa"),
        ],
        call_type_names: vec![],
        ground_types: vec!["beach".into()],
        sensor_types: vec!["BProbe".into()],
        sensor_names: vec!["Tag".into()],
        min_record_timestamp: 0,
        max_record_timestamp: 0,
    }
}

#[test]
fn test_query_build_scenario() {
    let rendered = build_pipeline(&faceted_query()).to_json();
    let stages = rendered.as_array().unwrap();
    assert_eq!(stages.len(), 1);

    let conjuncts = stages[0]["$match"]["$and"].as_array().unwrap();
    let expected = json!([
        {"publisherName.lastName": {"$in": ["Seger", "Abadi"]}},
        {"publisherName.firstName": {"$in": ["Kerri", "Shima"]}},
        {"studySite.city": {"$in": ["Seattle", "Vancouver", "Cape Town"]}},
        {"studySite.state": {"$in": ["WA"]}},
        {"studySite.province": {"$in": ["BC"]}},
        {"studySite.country": {"$in": ["USA", "Canada", "South Africa"]}},
        {"callTypeName": {"$in": [{"$regex": ".*"}]}},
        {"groundType": {"$in": ["beach"]}},
        {"sensorType": {"$in": ["BProbe"]}},
        {"sensorName": {"$in": ["Tag"]}},
        {"recordTimestamp": {"$gte": 0, "$lte": 0}},
    ]);
    assert_eq!(&json!(conjuncts), &expected);
}

#[test]
fn test_pipeline_output_is_byte_stable() {
    let query = faceted_query();
    let first = serde_json::to_string(&build_pipeline(&query).to_json()).unwrap();
    for _ in 0..10 {
        let again = serde_json::to_string(&build_pipeline(&query).to_json()).unwrap();
        assert_eq!(first, again);
    }
}

#[test]
fn test_whitespace_only_lists_become_sentinel() {
    let query = QueryTransaction {
        ground_types: vec!["   ".into(), "".into()],
        ..Default::default()
    };
    let rendered = build_pipeline(&query).to_json();
    assert_eq!(
        rendered[0]["$match"]["$and"][7]["groundType"],
        json!({"$in": [{"$regex": ".*"}]})
    );
}

#[test]
fn test_distinct_publishers_scenario() {
    let raw = vec![
        json!({"lastName": "Seger", "firstName": "Kerri"}),
        json!({"lastName": "Abadi", "firstName": "Shima"}),
    ];
    let mut result = QueryTransaction::default();
    extract_distinct(&mut result, "Publishers", &raw).unwrap();
    assert_eq!(
        result.publishers,
        vec![Publisher::new("Seger", "Kerri"), Publisher::new("Abadi", "Shima")]
    );

    let positional = vec![json!(["Seger", "Kerri"]), json!(["Abadi", "Shima"])];
    let mut by_position = QueryTransaction::default();
    extract_distinct(&mut by_position, "Publishers", &positional).unwrap();
    assert_eq!(by_position.publishers, result.publishers);
}

#[test]
fn test_distinct_rejects_seventh_field() {
    let mut result = QueryTransaction::default();
    let err = extract_distinct(&mut result, "Oceans", &[json!("Pacific")]).unwrap_err();
    assert!(matches!(err, Error::InvalidDistinctFieldName));
}
