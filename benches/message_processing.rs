//! JSON-RPC message encode/decode throughput benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use serde_json::json;

use mcp_client::{JsonRpcMessageTrait, JsonRpcNotification, JsonRpcRequest, RequestId};

fn test_request(size_kb: usize) -> JsonRpcRequest {
    let data = "x".repeat(size_kb * 1024);
    JsonRpcRequest::new(
        "test_method",
        Some(json!({ "data": data, "size_kb": size_kb })),
        RequestId::new_string(format!("req_{size_kb}")).unwrap(),
    )
}

fn test_notification(size_kb: usize) -> JsonRpcNotification {
    let data = "y".repeat(size_kb * 1024);
    JsonRpcNotification::new(
        "test_notification",
        Some(json!({ "data": data, "size_kb": size_kb })),
    )
}

fn benchmark_serialization(c: &mut Criterion) {
    let mut group = c.benchmark_group("message_serialization");

    for size_kb in [1, 10, 100].iter() {
        let request = test_request(*size_kb);
        let notification = test_notification(*size_kb);

        group.throughput(Throughput::Bytes((*size_kb * 1024) as u64));

        group.bench_with_input(BenchmarkId::new("request_to_json", size_kb), size_kb, |b, _| {
            b.iter(|| black_box(request.to_json()).unwrap());
        });

        group.bench_with_input(
            BenchmarkId::new("notification_to_json", size_kb),
            size_kb,
            |b, _| {
                b.iter(|| black_box(notification.to_json()).unwrap());
            },
        );

        group.bench_with_input(BenchmarkId::new("request_to_bytes", size_kb), size_kb, |b, _| {
            b.iter(|| black_box(request.to_bytes()).unwrap());
        });
    }

    group.finish();
}

fn benchmark_deserialization(c: &mut Criterion) {
    let mut group = c.benchmark_group("message_deserialization");

    for size_kb in [1, 10, 100].iter() {
        let request = test_request(*size_kb);
        let json_str = request.to_json().unwrap();
        let bytes = request.to_bytes().unwrap();

        group.throughput(Throughput::Bytes((*size_kb * 1024) as u64));

        group.bench_with_input(
            BenchmarkId::new("request_from_json", size_kb),
            size_kb,
            |b, _| {
                b.iter(|| black_box(JsonRpcRequest::from_json(&json_str)).unwrap());
            },
        );

        group.bench_with_input(
            BenchmarkId::new("request_from_json_bytes", size_kb),
            size_kb,
            |b, _| {
                b.iter(|| black_box(JsonRpcRequest::from_json_bytes(&bytes)).unwrap());
            },
        );
    }

    group.finish();
}

fn benchmark_round_trip(c: &mut Criterion) {
    let mut group = c.benchmark_group("round_trip_processing");

    for size_kb in [1, 10, 100].iter() {
        group.throughput(Throughput::Bytes((*size_kb * 1024) as u64));

        group.bench_with_input(
            BenchmarkId::new("request_round_trip", size_kb),
            size_kb,
            |b, &size| {
                b.iter(|| {
                    let request = test_request(size);
                    let json = black_box(request.to_json()).unwrap();
                    let parsed = black_box(JsonRpcRequest::from_json(&json)).unwrap();
                    black_box(parsed);
                });
            },
        );
    }

    group.finish();
}

fn benchmark_batch_processing(c: &mut Criterion) {
    let mut group = c.benchmark_group("batch_processing");

    for batch_size in [10, 100, 1000].iter() {
        let requests: Vec<JsonRpcRequest> = (0..*batch_size)
            .map(|i| {
                JsonRpcRequest::new(
                    "batch_method",
                    Some(json!({ "index": i })),
                    RequestId::new_number(i as i64).unwrap(),
                )
            })
            .collect();

        group.throughput(Throughput::Elements(*batch_size as u64));

        group.bench_with_input(
            BenchmarkId::new("serialize_batch", batch_size),
            batch_size,
            |b, _| {
                b.iter(|| {
                    let serialized: Vec<String> =
                        requests.iter().map(|req| req.to_json().unwrap()).collect();
                    black_box(serialized);
                });
            },
        );

        let serialized_batch: Vec<String> =
            requests.iter().map(|req| req.to_json().unwrap()).collect();

        group.bench_with_input(
            BenchmarkId::new("deserialize_batch", batch_size),
            batch_size,
            |b, _| {
                b.iter(|| {
                    let parsed: Vec<JsonRpcRequest> = serialized_batch
                        .iter()
                        .map(|json| JsonRpcRequest::from_json(json).unwrap())
                        .collect();
                    black_box(parsed);
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    message_processing_benches,
    benchmark_serialization,
    benchmark_deserialization,
    benchmark_round_trip,
    benchmark_batch_processing
);

criterion_main!(message_processing_benches);
