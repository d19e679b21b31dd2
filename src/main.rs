use redquery::{
    EngineConfig, MockTransport, PropertyNormalizer, Query, QueryEngine, SystemClock,
};
use serde_json::json;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    println!("Redquery v{}", redquery::version());
    println!("==========================================");
    println!();

    let transport = Arc::new(demo_service());
    let queries = demo_queries();

    let engine = QueryEngine::new(
        EngineConfig::default(),
        queries,
        transport.clone(),
        Arc::new(PropertyNormalizer),
        Arc::new(SystemClock),
    );

    println!("=== Query: SensorCollector ===");
    println!("  Temps: /Chassis[*]/Thermal[*]/Temperatures[*]");
    println!("  Fans:  /Chassis[*]/Thermal[*]/Fans[*]");
    println!();

    let results = engine.execute(&["SensorCollector"]).await;
    for result in &results {
        for (subquery_id, data_set) in &result.subquery_output_by_id {
            println!("  [{}] {} rows", subquery_id, data_set.data_set.len());
            for row in &data_set.data_set {
                let rendered: Vec<String> = row
                    .values
                    .iter()
                    .map(|v| format!("{}={}", v.name, v.value))
                    .collect();
                println!("    → {}", rendered.join(", "));
            }
        }
    }

    println!();
    println!(
        "Backend GETs for the whole bundle: {} (shared prefixes fetched once)",
        transport.total_get_count()
    );
}

/// A small in-memory Redfish service: one chassis with a thermal
/// subsystem carrying two temperature sensors and one fan.
fn demo_service() -> MockTransport {
    let transport = MockTransport::new();
    transport.add_resource(
        "/redfish/v1",
        json!({
            "@odata.id": "/redfish/v1",
            "Id": "RootService",
            "Chassis": {"@odata.id": "/redfish/v1/Chassis"}
        }),
    );
    transport.add_resource(
        "/redfish/v1/Chassis",
        json!({
            "@odata.id": "/redfish/v1/Chassis",
            "Members": [{"@odata.id": "/redfish/v1/Chassis/chassis"}],
            "Members@odata.count": 1,
            "Name": "Chassis Collection"
        }),
    );
    transport.add_resource(
        "/redfish/v1/Chassis/chassis",
        json!({
            "@odata.id": "/redfish/v1/Chassis/chassis",
            "Id": "chassis",
            "Name": "chassis",
            "Thermal": {"@odata.id": "/redfish/v1/Chassis/chassis/Thermal"}
        }),
    );
    transport.add_resource(
        "/redfish/v1/Chassis/chassis/Thermal",
        json!({
            "@odata.id": "/redfish/v1/Chassis/chassis/Thermal",
            "Temperatures": [
                {"Name": "CPU0 Temp", "ReadingCelsius": 41.5},
                {"Name": "CPU1 Temp", "ReadingCelsius": 39.0}
            ],
            "Fans": [
                {"Name": "fan0", "Reading": 4200}
            ]
        }),
    );
    transport
}

fn demo_queries() -> Vec<Query> {
    let descriptor = r#"{
        "query_id": "SensorCollector",
        "subquery": [
            {
                "subquery_id": "Temps",
                "redpath": "/Chassis[*]/Thermal[*]/Temperatures[*]",
                "properties": [
                    {"property": "Name", "type": "string"},
                    {"property": "ReadingCelsius", "type": "double"}
                ]
            },
            {
                "subquery_id": "Fans",
                "redpath": "/Chassis[*]/Thermal[*]/Fans[*]",
                "properties": [
                    {"property": "Name", "type": "string"},
                    {"property": "Reading", "type": "integer"}
                ]
            }
        ]
    }"#;
    vec![Query::from_json(descriptor).expect("demo query descriptor is well-formed")]
}
