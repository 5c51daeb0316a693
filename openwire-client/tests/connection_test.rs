//! End-to-end tests over an in-memory connection.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::SinkExt;
use tokio::io::AsyncWriteExt;
use tokio_util::codec::{Framed, FramedWrite};

use openwire_client::{
    handshake, ClientConfig, CommandPump, MessageDispatcher, ResponseCorrelator,
};
use openwire_core::commands::{
    ActiveMqDestination, ConnectionId, ConsumerId, ConsumerInfo, DataResponse, KeepAliveInfo,
    MessageDispatch, SessionId, TextMessage, WireFormatInfo,
};
use openwire_core::{DataStructure, Message, OpenWireCodec, OpenWireError, Pointer};

fn consumer_id() -> ConsumerId {
    ConsumerId::new(&SessionId::new(&ConnectionId::new("ID:it-host-1"), 1), 1)
}

fn text_dispatch(text: &str) -> Box<dyn DataStructure> {
    let mut message = TextMessage::default();
    message.set_text(text).unwrap();
    message.base.destination = Some(ActiveMqDestination::queue("it.queue"));
    Box::new(MessageDispatch {
        consumer_id: Some(consumer_id()),
        destination: Some(ActiveMqDestination::queue("it.queue")),
        message: Some(Box::new(message)),
        ..MessageDispatch::default()
    })
}

#[tokio::test]
async fn test_handshake_then_pump_routes_everything() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("openwire_client=debug")
        .with_test_writer()
        .try_init();

    let config = ClientConfig::builder()
        .response_timeout(Duration::from_secs(5))
        .build()
        .unwrap();
    let (client_io, broker_io) = tokio::io::duplex(64 * 1024);

    let mut client = Framed::new(client_io, OpenWireCodec::new());
    let mut broker = Framed::new(broker_io, OpenWireCodec::new());

    let correlator = Arc::new(ResponseCorrelator::from_config(&config));
    let dispatcher = Arc::new(MessageDispatcher::from_config(&config));

    let texts = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&texts);
    dispatcher.add_listener(consumer_id(), move |message: &Pointer<dyn Message>| {
        let text = message
            .try_deref()
            .unwrap()
            .as_any()
            .downcast_ref::<TextMessage>()
            .and_then(|m| m.text().unwrap());
        sink.lock().unwrap().push(text);
    });

    let others = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&others);
    let pump = Arc::new(
        CommandPump::new(Arc::clone(&correlator), Arc::clone(&dispatcher)).with_command_listener(
            Arc::new(move |_: &Pointer<dyn DataStructure>| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        ),
    );

    let broker_task = tokio::spawn(async move {
        use futures::StreamExt;

        let hello = broker.next().await.unwrap().unwrap();
        assert!(hello.downcast_ref::<WireFormatInfo>().is_some());
        broker
            .send(Box::new(WireFormatInfo::new(8)) as Box<dyn DataStructure>)
            .await
            .unwrap();
        broker.codec_mut().set_version(8);

        let request = broker.next().await.unwrap().unwrap();
        let request_id = request.as_command().unwrap().command_id();

        broker.send(text_dispatch("first")).await.unwrap();
        broker
            .send(Box::new(KeepAliveInfo::default()) as Box<dyn DataStructure>)
            .await
            .unwrap();
        broker
            .send(Box::new(DataResponse {
                correlation_id: request_id,
                data: Some(Box::new(ActiveMqDestination::topic("reply"))),
                ..DataResponse::default()
            }) as Box<dyn DataStructure>)
            .await
            .unwrap();
        broker.send(text_dispatch("second")).await.unwrap();
    });

    let negotiated = handshake(&mut client, &config.local_wire_format_info())
        .await
        .unwrap();
    assert_eq!(negotiated.version(), 8);

    let mut request = ConsumerInfo::new(consumer_id(), ActiveMqDestination::queue("it.queue"));
    let future = correlator.prepare(&mut request);
    client
        .send(Box::new(request) as Box<dyn DataStructure>)
        .await
        .unwrap();

    let parts = client.into_parts();
    assert!(parts.read_buf.is_empty());
    let reader = parts.io;
    let codec = parts.codec;
    let pump_task = {
        let pump = Arc::clone(&pump);
        tokio::spawn(async move { pump.run(reader, codec).await })
    };

    let waiter = {
        let correlator = Arc::clone(&correlator);
        tokio::task::spawn_blocking(move || correlator.await_response(&future))
    };
    let response = waiter.await.unwrap().unwrap();
    let response = response
        .try_deref()
        .unwrap()
        .downcast_ref::<DataResponse>()
        .unwrap();
    assert_eq!(
        response
            .data
            .as_ref()
            .and_then(|d| d.downcast_ref::<ActiveMqDestination>()),
        Some(&ActiveMqDestination::topic("reply"))
    );

    broker_task.await.unwrap();
    let summary = pump_task.await.unwrap().unwrap();
    assert_eq!(summary.responses, 1);
    assert_eq!(summary.dispatches, 2);
    assert_eq!(summary.other, 1);

    assert_eq!(
        *texts.lock().unwrap(),
        vec![Some("first".to_string()), Some("second".to_string())]
    );
    assert_eq!(others.load(Ordering::SeqCst), 1);
    assert_eq!(dispatcher.stats().messages_delivered(), 2);
    assert_eq!(correlator.pending_count(), 0);
}

#[tokio::test]
async fn test_pump_returns_decode_error() {
    let (reader, writer) = tokio::io::duplex(1024);
    let mut writer = FramedWrite::new(writer, OpenWireCodec::new());
    writer
        .send(Box::new(KeepAliveInfo::default()) as Box<dyn DataStructure>)
        .await
        .unwrap();
    let mut raw = writer.into_inner();
    raw.write_all(&[0, 0, 0, 1, 250]).await.unwrap();
    drop(raw);

    let pump = CommandPump::new(
        Arc::new(ResponseCorrelator::default()),
        Arc::new(MessageDispatcher::new()),
    );
    let result = pump.run(reader, OpenWireCodec::new()).await;
    assert!(matches!(result, Err(OpenWireError::UnknownTypeCode(250))));
}

#[tokio::test]
async fn test_pump_rejects_oversized_frame() {
    let (reader, mut writer) = tokio::io::duplex(1024);
    writer.write_all(&[0, 1, 0, 0]).await.unwrap();
    drop(writer);

    let pump = CommandPump::new(
        Arc::new(ResponseCorrelator::default()),
        Arc::new(MessageDispatcher::new()),
    );
    let result = pump
        .run(reader, OpenWireCodec::new().max_frame_size(1024))
        .await;
    assert!(matches!(result, Err(OpenWireError::Protocol(_))));
}

#[tokio::test]
async fn test_pump_ends_cleanly_on_eof() {
    let (reader, writer) = tokio::io::duplex(1024);
    drop(writer);

    let pump = CommandPump::new(
        Arc::new(ResponseCorrelator::default()),
        Arc::new(MessageDispatcher::new()),
    );
    let summary = pump.run(reader, OpenWireCodec::new()).await.unwrap();
    assert_eq!(summary.total(), 0);
}
