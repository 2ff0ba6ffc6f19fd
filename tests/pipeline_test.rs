use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use visitor_map::error::GeocodingError;
use visitor_map::services::projection::EQUATORIAL_RADIUS;
use visitor_map::{
    normalize_address, Address, AggregationEngine, App, Config, FaultPolicy, GeocodingClient,
    GeodeticCoordinate, PipelineDriver, PipelineError, RetryPolicy,
};

// ========== 桩实现 ==========

#[derive(Debug, Clone, Copy)]
enum Answer {
    Found(f64, f64),
    NotFound,
    Fault,
    /// 前 `failures` 次超时，之后返回坐标
    FlakyThenFound { failures: usize, lat: f64, lon: f64 },
}

/// 确定性的地理编码桩，记录每一次调用
#[derive(Default)]
struct StubGeocoder {
    answers: HashMap<String, Answer>,
    delays: HashMap<String, Duration>,
    calls: Mutex<Vec<String>>,
}

impl StubGeocoder {
    fn new() -> Self {
        Self::default()
    }

    fn with(mut self, address: &str, answer: Answer) -> Self {
        self.answers.insert(address.to_lowercase(), answer);
        self
    }

    fn with_delay(mut self, address: &str, delay: Duration) -> Self {
        self.delays.insert(address.to_lowercase(), delay);
        self
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn calls_for(&self, address: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.as_str() == address.to_lowercase())
            .count()
    }
}

#[async_trait]
impl GeocodingClient for StubGeocoder {
    async fn resolve(
        &self,
        address: &Address,
    ) -> Result<Option<GeodeticCoordinate>, GeocodingError> {
        let attempt = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(address.to_string());
            calls.iter().filter(|c| c.as_str() == address.as_str()).count()
        };

        if let Some(delay) = self.delays.get(address.as_str()) {
            tokio::time::sleep(*delay).await;
        }

        match self.answers.get(address.as_str()).copied().unwrap_or(Answer::NotFound) {
            Answer::Found(lat, lon) => Ok(GeodeticCoordinate::new(lat, lon)),
            Answer::NotFound => Ok(None),
            Answer::Fault => Err(GeocodingError::BadStatus {
                endpoint: "stub".to_string(),
                status: 503,
            }),
            Answer::FlakyThenFound { failures, lat, lon } => {
                if attempt <= failures {
                    Err(GeocodingError::Timeout {
                        endpoint: "stub".to_string(),
                    })
                } else {
                    Ok(GeodeticCoordinate::new(lat, lon))
                }
            }
        }
    }
}

fn engine(stub: &Arc<StubGeocoder>) -> AggregationEngine {
    AggregationEngine::new(stub.clone())
}

fn addr(raw: &str) -> Address {
    normalize_address(raw).unwrap()
}

// ========== 去重与分区 ==========

#[tokio::test]
async fn test_client_called_once_per_unique_address() {
    let stub = Arc::new(
        StubGeocoder::new()
            .with("berlin", Answer::Found(52.52, 13.40))
            .with("paris", Answer::Found(48.86, 2.35))
            .with("rome", Answer::Found(41.90, 12.50)),
    );

    let mut rows = Vec::new();
    for i in 0..100 {
        rows.push(["Berlin", "PARIS", "rome"][i % 3].to_string());
    }

    let result = engine(&stub).aggregate(&rows).await.unwrap();

    assert_eq!(stub.calls().len(), 3);
    assert_eq!(stub.calls_for("berlin"), 1);
    assert_eq!(stub.calls_for("paris"), 1);
    assert_eq!(stub.calls_for("rome"), 1);
    assert_eq!(result.total_rows, 100);
    assert_eq!(result.unique_addresses, 3);
    assert_eq!(result.markers.len(), 3);
}

#[tokio::test]
async fn test_partition_is_complete_and_disjoint() {
    let stub = Arc::new(
        StubGeocoder::new()
            .with("oslo", Answer::Found(59.91, 10.75))
            .with("lima", Answer::Found(-12.05, -77.04))
            .with("atlantis", Answer::NotFound)
            .with("el dorado", Answer::NotFound),
    );
    let rows = ["Oslo", "Atlantis", "Lima", "oslo", "El Dorado", "atlantis"];

    let result = engine(&stub).aggregate(&rows).await.unwrap();

    assert_eq!(
        result.markers.len() + result.unresolved.len(),
        result.unique_addresses
    );
    assert_eq!(result.unique_addresses, 4);
    for marker in &result.markers {
        assert!(!result.unresolved.contains(&marker.address));
    }
    assert_eq!(result.unresolved, vec![addr("atlantis"), addr("el dorado")]);
    assert!(result.is_clean());
}

#[tokio::test]
async fn test_marker_sizes_follow_capped_rule() {
    let stub = Arc::new(
        StubGeocoder::new()
            .with("once", Answer::Found(1.0, 1.0))
            .with("five", Answer::Found(2.0, 2.0))
            .with("ten", Answer::Found(3.0, 3.0)),
    );
    let mut rows = vec!["once"];
    rows.extend(std::iter::repeat("five").take(5));
    rows.extend(std::iter::repeat("ten").take(10));

    let result = engine(&stub).aggregate(&rows).await.unwrap();

    let sizes: Vec<(String, usize, u32)> = result
        .markers
        .iter()
        .map(|m| (m.address.to_string(), m.count, m.size))
        .collect();
    assert_eq!(
        sizes,
        vec![
            ("once".to_string(), 1, 4),
            ("five".to_string(), 5, 20),
            ("ten".to_string(), 10, 20),
        ]
    );
}

#[tokio::test]
async fn test_case_variants_share_one_lookup() {
    let stub = Arc::new(StubGeocoder::new().with("paris, france", Answer::Found(48.86, 2.35)));

    let result = engine(&stub)
        .aggregate(&["Paris, France", "paris, france"])
        .await
        .unwrap();

    assert_eq!(stub.calls(), vec!["paris, france".to_string()]);
    assert_eq!(result.markers.len(), 1);
    assert_eq!(result.markers[0].address, addr("paris, france"));
    assert_eq!(result.markers[0].count, 2);
    assert_eq!(result.markers[0].size, 8);
}

#[tokio::test]
async fn test_empty_input_performs_no_lookups() {
    let stub = Arc::new(StubGeocoder::new());
    let empty: Vec<String> = Vec::new();

    let err = engine(&stub).aggregate(&empty).await.unwrap_err();
    assert!(matches!(err, PipelineError::EmptyInput));

    let err = engine(&stub).aggregate(&["", "   "]).await.unwrap_err();
    assert!(matches!(err, PipelineError::EmptyInput));

    assert!(stub.calls().is_empty());
}

#[tokio::test]
async fn test_blank_cells_are_skipped() {
    let stub = Arc::new(StubGeocoder::new().with("quito", Answer::Found(-0.18, -78.47)));

    let result = engine(&stub).aggregate(&["Quito", "", "  "]).await.unwrap();

    assert_eq!(result.total_rows, 3);
    assert_eq!(result.unique_addresses, 1);
    assert_eq!(stub.calls().len(), 1);
}

// ========== 投影 ==========

#[tokio::test]
async fn test_markers_carry_projected_position() {
    let stub = Arc::new(
        StubGeocoder::new()
            .with("null island", Answer::Found(0.0, 0.0))
            .with("somewhere", Answer::Found(45.0, 90.0)),
    );

    let result = engine(&stub)
        .aggregate(&["Null Island", "Somewhere"])
        .await
        .unwrap();

    let origin = &result.markers[0].position;
    assert!(origin.x.abs() < 1e-6 && origin.y.abs() < 1e-6);

    let p = &result.markers[1].position;
    let expected_x = 90.0 * (EQUATORIAL_RADIUS * std::f64::consts::PI / 180.0);
    assert!((p.x - expected_x).abs() < 1e-3);
    assert!(p.y.is_finite() && p.y > 0.0);
}

#[tokio::test]
async fn test_polar_coordinate_is_unresolved() {
    let stub = Arc::new(
        StubGeocoder::new()
            .with("north pole", Answer::Found(90.0, 0.0))
            .with("south pole", Answer::Found(-90.0, 0.0))
            .with("reykjavik", Answer::Found(64.15, -21.94)),
    );

    let result = engine(&stub)
        .aggregate(&["North Pole", "Reykjavik", "South Pole"])
        .await
        .unwrap();

    assert_eq!(result.markers.len(), 1);
    assert_eq!(result.markers[0].address, addr("reykjavik"));
    assert_eq!(result.unresolved, vec![addr("north pole"), addr("south pole")]);
}

// ========== 故障处理 ==========

#[tokio::test]
async fn test_fault_halts_and_keeps_partial_results() {
    let stub = Arc::new(
        StubGeocoder::new()
            .with("x", Answer::Found(10.0, 10.0))
            .with("a", Answer::NotFound)
            .with("b", Answer::Fault)
            .with("y", Answer::Found(20.0, 20.0)),
    );

    let err = engine(&stub).aggregate(&["X", "A", "B", "Y"]).await.unwrap_err();

    match err {
        PipelineError::GeocodingFault {
            address,
            processed,
            total,
            partial,
            source,
        } => {
            assert_eq!(address, addr("b"));
            assert_eq!(processed, 2);
            assert_eq!(total, 4);
            assert_eq!(partial.markers.len(), 1);
            assert_eq!(partial.markers[0].address, addr("x"));
            assert_eq!(partial.unresolved, vec![addr("a")]);
            assert!(!partial.unresolved.contains(&addr("b")));
            assert!(matches!(source, GeocodingError::BadStatus { status: 503, .. }));
        }
        other => panic!("unexpected error: {other}"),
    }

    assert_eq!(stub.calls_for("y"), 0);
}

#[tokio::test]
async fn test_skip_and_continue_keeps_faults_separate() {
    let stub = Arc::new(
        StubGeocoder::new()
            .with("a", Answer::NotFound)
            .with("b", Answer::Fault)
            .with("c", Answer::Found(1.0, 2.0)),
    );

    let result = engine(&stub)
        .with_fault_policy(FaultPolicy::SkipAndContinue)
        .aggregate(&["A", "B", "C"])
        .await
        .unwrap();

    assert_eq!(result.unresolved, vec![addr("a")]);
    assert_eq!(result.faulted.len(), 1);
    assert_eq!(result.faulted[0].address, addr("b"));
    assert_eq!(result.markers.len(), 1);
    assert_eq!(result.processed(), 3);
    assert!(!result.is_clean());
}

#[tokio::test]
async fn test_transient_faults_are_retried() {
    let stub = Arc::new(StubGeocoder::new().with(
        "tokyo",
        Answer::FlakyThenFound {
            failures: 2,
            lat: 35.68,
            lon: 139.69,
        },
    ));
    let retry = RetryPolicy {
        max_retries: 3,
        delay: Duration::ZERO,
    };

    let result = engine(&stub)
        .with_retry_policy(retry)
        .aggregate(&["Tokyo"])
        .await
        .unwrap();

    assert_eq!(result.markers.len(), 1);
    assert_eq!(stub.calls_for("tokyo"), 3);
}

#[tokio::test]
async fn test_retries_exhausted_is_fault() {
    let stub = Arc::new(StubGeocoder::new().with(
        "tokyo",
        Answer::FlakyThenFound {
            failures: 5,
            lat: 35.68,
            lon: 139.69,
        },
    ));
    let retry = RetryPolicy {
        max_retries: 1,
        delay: Duration::ZERO,
    };

    let err = engine(&stub)
        .with_retry_policy(retry)
        .aggregate(&["Tokyo"])
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        PipelineError::GeocodingFault {
            source: GeocodingError::Timeout { .. },
            ..
        }
    ));
    assert_eq!(stub.calls_for("tokyo"), 2);
}

#[tokio::test]
async fn test_not_found_is_never_retried() {
    let stub = Arc::new(StubGeocoder::new().with("nowhere", Answer::NotFound));
    let retry = RetryPolicy {
        max_retries: 3,
        delay: Duration::ZERO,
    };

    let result = engine(&stub)
        .with_retry_policy(retry)
        .aggregate(&["Nowhere"])
        .await
        .unwrap();

    assert_eq!(result.unresolved, vec![addr("nowhere")]);
    assert_eq!(stub.calls_for("nowhere"), 1);
}

// ========== 进度与并发 ==========

#[tokio::test]
async fn test_progress_reports_each_unique_address_once() {
    let stub = Arc::new(
        StubGeocoder::new()
            .with("a", Answer::Found(1.0, 1.0))
            .with("b", Answer::NotFound)
            .with("c", Answer::Found(3.0, 3.0)),
    );
    let driver = PipelineDriver::new(engine(&stub));

    let mut progress = Vec::new();
    let result = driver
        .run(&["A", "b", "a", "C", "B"], |completed, total| {
            progress.push((completed, total))
        })
        .await
        .unwrap();

    assert_eq!(progress, vec![(1, 3), (2, 3), (3, 3)]);
    assert_eq!(result.markers.len(), 2);
    assert_eq!(result.unresolved, vec![addr("b")]);
}

#[tokio::test]
async fn test_progress_stops_at_fault() {
    let stub = Arc::new(
        StubGeocoder::new()
            .with("a", Answer::Found(1.0, 1.0))
            .with("b", Answer::Fault),
    );
    let driver = PipelineDriver::new(engine(&stub));

    let mut progress = Vec::new();
    let err = driver
        .run(&["A", "B", "C"], |completed, total| progress.push((completed, total)))
        .await
        .unwrap_err();

    assert_eq!(progress, vec![(1, 3)]);
    assert_eq!(err.partial_result().map(|p| p.processed()), Some(1));
}

#[tokio::test]
async fn test_concurrent_lookups_keep_call_count_and_order() {
    let stub = Arc::new(
        StubGeocoder::new()
            .with("a", Answer::Found(1.0, 1.0))
            .with("b", Answer::Found(2.0, 2.0))
            .with("c", Answer::NotFound)
            .with("d", Answer::Found(4.0, 4.0))
            .with_delay("a", Duration::from_millis(40))
            .with_delay("b", Duration::from_millis(20))
            .with_delay("c", Duration::from_millis(10)),
    );
    let driver = PipelineDriver::new(engine(&stub).with_max_concurrent_lookups(4));

    let rows = ["A", "B", "C", "D", "a", "b", "d", "D"];
    let mut progress = Vec::new();
    let result = driver
        .run(&rows, |completed, total| progress.push((completed, total)))
        .await
        .unwrap();

    assert_eq!(stub.calls().len(), 4);
    assert_eq!(progress, vec![(1, 4), (2, 4), (3, 4), (4, 4)]);
    let order: Vec<Address> = result.markers.iter().map(|m| m.address.clone()).collect();
    assert_eq!(order, vec![addr("a"), addr("b"), addr("d")]);
    assert_eq!(result.unresolved, vec![addr("c")]);
}

// ========== 应用端到端 ==========

fn temp_path(name: &str) -> String {
    std::env::temp_dir()
        .join(format!("visitor_map_it_{}_{}", std::process::id(), name))
        .display()
        .to_string()
}

#[tokio::test]
async fn test_app_writes_map_and_unresolved_files() {
    let input_file = temp_path("visitors.csv");
    std::fs::write(
        &input_file,
        "name,Address\nAda,\"Paris, France\"\nBob,Atlantis\nCy,\"paris, france\"\nDee,\n",
    )
    .unwrap();

    let config = Config {
        input_file: input_file.clone(),
        address_column: "Address".to_string(),
        output_file: temp_path("map.json"),
        unresolved_file: temp_path("unresolved.txt"),
        ..Config::default()
    };
    let stub = Arc::new(StubGeocoder::new().with("paris, france", Answer::Found(48.86, 2.35)));

    let app = App::with_client(config.clone(), stub.clone());
    let result = app.run().await.unwrap();

    assert_eq!(result.total_rows, 4);
    assert_eq!(stub.calls().len(), 2);

    let map: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&config.output_file).unwrap()).unwrap();
    assert_eq!(map["address"], serde_json::json!(["paris, france"]));
    assert_eq!(map["sizes"], serde_json::json!([8]));

    let unresolved = std::fs::read_to_string(&config.unresolved_file).unwrap();
    assert_eq!(unresolved, "atlantis\n");

    for path in [&input_file, &config.output_file, &config.unresolved_file] {
        let _ = std::fs::remove_file(path);
    }
}

#[tokio::test]
async fn test_app_reports_missing_column() {
    let input_file = temp_path("no_column.csv");
    std::fs::write(&input_file, "name,city\nAda,Paris\n").unwrap();

    let config = Config {
        input_file: input_file.clone(),
        address_column: "address".to_string(),
        output_file: temp_path("unused_map.json"),
        unresolved_file: temp_path("unused_unresolved.txt"),
        ..Config::default()
    };
    let stub = Arc::new(StubGeocoder::new());

    let err = App::with_client(config, stub.clone()).run().await.unwrap_err();

    assert!(err
        .downcast_ref::<visitor_map::InputError>()
        .is_some_and(|e| matches!(e, visitor_map::InputError::ColumnNotFound { .. })));
    assert!(stub.calls().is_empty());

    let _ = std::fs::remove_file(&input_file);
}

#[tokio::test]
async fn test_app_keeps_fault_when_partial_write_fails() {
    let input_file = temp_path("fault_visitors.csv");
    std::fs::write(&input_file, "address\nOslo\nBroken\n").unwrap();

    let config = Config {
        input_file: input_file.clone(),
        output_file: temp_path("no_such_dir/map.json"),
        unresolved_file: temp_path("no_such_dir/unresolved.txt"),
        ..Config::default()
    };
    let stub = Arc::new(
        StubGeocoder::new()
            .with("oslo", Answer::Found(59.91, 10.75))
            .with("broken", Answer::Fault),
    );

    let err = App::with_client(config, stub).run().await.unwrap_err();

    assert!(err
        .downcast_ref::<PipelineError>()
        .is_some_and(|e| matches!(e, PipelineError::GeocodingFault { processed: 1, .. })));

    let _ = std::fs::remove_file(&input_file);
}
