//! Marshaling throughput benchmarks.

use bytes::BytesMut;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use tokio_util::codec::{Decoder, Encoder};

use openwire_core::commands::{
    ActiveMqDestination, BrokerId, ConnectionId, ConsumerId, DataStructure, KeepAliveInfo,
    MessageDispatch, MessageId, PrimitiveValue, ProducerId, SessionId, TextMessage,
};
use openwire_core::marshal::{marshal, unmarshal};
use openwire_core::protocol::OpenWireCodec;

fn text_message(body_len: usize) -> TextMessage {
    let session = SessionId::new(&ConnectionId::new("ID:bench-host-1"), 1);
    let producer = ProducerId::new(&session, 1);
    let mut message = TextMessage::default();
    message.set_text(&"x".repeat(body_len)).unwrap();
    message.base.destination = Some(ActiveMqDestination::queue("bench.queue"));
    message.base.message_id = Some(MessageId::new(producer.clone(), 1));
    message.base.producer_id = Some(producer);
    message.base.broker_path = vec![BrokerId::new("broker-a")];
    message
        .base
        .properties
        .insert("JMSXDeliveryCount", PrimitiveValue::Int(1));
    message
}

fn dispatch(body_len: usize) -> MessageDispatch {
    let session = SessionId::new(&ConnectionId::new("ID:bench-host-1"), 1);
    MessageDispatch {
        consumer_id: Some(ConsumerId::new(&session, 1)),
        destination: Some(ActiveMqDestination::queue("bench.queue")),
        message: Some(Box::new(text_message(body_len))),
        ..MessageDispatch::default()
    }
}

fn bench_marshal(c: &mut Criterion) {
    let mut group = c.benchmark_group("marshal");

    group.bench_function("keep_alive", |b| {
        let command = KeepAliveInfo::default();
        b.iter(|| black_box(marshal(black_box(&command), 12).unwrap()))
    });

    for body_len in [64usize, 1024, 16 * 1024] {
        let command = dispatch(body_len);
        group.throughput(Throughput::Bytes(body_len as u64));
        group.bench_with_input(
            BenchmarkId::new("message_dispatch", body_len),
            &command,
            |b, command| b.iter(|| black_box(marshal(black_box(command), 12).unwrap())),
        );
    }

    group.finish();
}

fn bench_unmarshal(c: &mut Criterion) {
    let mut group = c.benchmark_group("unmarshal");

    for body_len in [64usize, 1024, 16 * 1024] {
        let bytes = marshal(&dispatch(body_len), 12).unwrap();
        group.throughput(Throughput::Bytes(bytes.len() as u64));
        group.bench_with_input(
            BenchmarkId::new("message_dispatch", body_len),
            &bytes,
            |b, bytes| b.iter(|| black_box(unmarshal(black_box(bytes), 12).unwrap())),
        );
    }

    group.finish();
}

fn bench_clone(c: &mut Criterion) {
    let command: Box<dyn DataStructure> = Box::new(dispatch(1024));
    c.bench_function("clone_message_dispatch", |b| {
        b.iter(|| black_box(command.clone_data_structure()))
    });
}

fn bench_codec(c: &mut Criterion) {
    let command = dispatch(1024);
    c.bench_function("codec_encode_decode", |b| {
        let mut codec = OpenWireCodec::new();
        let mut buf = BytesMut::with_capacity(4096);
        b.iter(|| {
            codec.encode(&command as &dyn DataStructure, &mut buf).unwrap();
            black_box(codec.decode(&mut buf).unwrap())
        })
    });
}

criterion_group!(benches, bench_marshal, bench_unmarshal, bench_clone, bench_codec);
criterion_main!(benches);
