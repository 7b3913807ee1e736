use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use roomlog::store::MemoryStore;
use roomlog::{MemberIdentity, Message, RoomLog};
use std::sync::Arc;

// Encoding cost and round trips through the in-memory store. Network stores
// add their own latency on top of these numbers.

fn message_codec_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("message");
    let msg = Message::new("alice", "Hello world, this is a typical chat line.", 1_700_000_000_000);
    let raw = msg.encode().unwrap();
    group.throughput(Throughput::Bytes(raw.len() as u64));

    group.bench_function("encode", |b| b.iter(|| msg.encode().unwrap()));
    group.bench_function("decode", |b| b.iter(|| Message::decode(&raw).unwrap()));

    group.finish();
}

fn room_log_benchmark(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let log = rt.block_on(async {
        let store = Arc::new(MemoryStore::new(MemberIdentity::Entry));
        RoomLog::with_store(store).await.unwrap()
    });

    let mut group = c.benchmark_group("room_log");
    group.throughput(Throughput::Elements(1));

    let mut ts = 0_i64;
    group.bench_function("append", |b| {
        b.to_async(&rt).iter(|| {
            ts += 1;
            let msg = Message::new("alice", "Hello world", ts);
            let log = log.clone();
            async move { log.append("#bench", &msg).await.unwrap() }
        })
    });

    group.bench_function("fetch_latest_50", |b| {
        b.to_async(&rt)
            .iter(|| async { log.fetch_range("#bench", 0, 49, true).await.unwrap() })
    });

    group.finish();
}

criterion_group!(benches, message_codec_benchmark, room_log_benchmark);
criterion_main!(benches);
