//! Common fixtures for integration tests.

#![allow(dead_code)]

use openwire_core::commands::*;
use openwire_core::Message;
use openwire_core::protocol::constants::{
    DESTINATION_ADD_OPERATION, INDIVIDUAL_ACK_TYPE, TRANSACTION_COMMIT_ONE_PHASE,
};

pub fn connection_id() -> ConnectionId {
    ConnectionId::new("ID:test-host-51234-1")
}

pub fn session_id() -> SessionId {
    SessionId::new(&connection_id(), 1)
}

pub fn consumer_id() -> ConsumerId {
    ConsumerId::new(&session_id(), 2)
}

pub fn producer_id() -> ProducerId {
    ProducerId::new(&session_id(), 3)
}

pub fn message_id(sequence: i64) -> MessageId {
    let mut id = MessageId::new(producer_id(), sequence);
    id.broker_sequence_id = sequence * 10;
    id
}

pub fn queue() -> ActiveMqDestination {
    let mut queue = ActiveMqDestination::queue("test.orders");
    queue.set_option("consumer.prefetchSize", "5");
    queue
}

pub fn local_transaction() -> TransactionId {
    LocalTransactionId::new(connection_id(), 7).into()
}

pub fn xa_transaction() -> TransactionId {
    XaTransactionId {
        format_id: 4660,
        global_transaction_id: vec![1, 2, 3, 4],
        branch_qualifier: vec![9],
    }
    .into()
}

pub fn broker_error() -> BrokerError {
    let mut error = BrokerError::new("javax.jms.JMSException", "failure");
    error.stack_trace.push(StackTraceElement {
        class_name: Some("org.apache.activemq.Broker".to_string()),
        method_name: Some("send".to_string()),
        file_name: Some("Broker.java".to_string()),
        line_number: 17,
    });
    error.cause = Some(Box::new(BrokerError::new("java.io.IOException", "cause")));
    error
}

fn header(command_id: i32) -> CommandHeader {
    CommandHeader {
        command_id,
        response_required: command_id % 2 == 0,
    }
}

fn properties() -> PrimitiveMap {
    let mut map = PrimitiveMap::new();
    map.insert("flag", true);
    map.insert("count", 3i32);
    map.insert("name", "value");
    map.insert("ratio", 0.25);
    map.insert("unset", f64::NAN);
    map.insert("scale", PrimitiveValue::Float(f32::NAN));
    map.insert("blob", vec![1u8, 2, 3]);
    map.insert(
        "list",
        PrimitiveValue::List(vec![PrimitiveValue::Long(1), PrimitiveValue::Null]),
    );
    map
}

pub fn message_base(sequence: i64) -> MessageBase {
    MessageBase {
        header: header(100 + sequence as i32),
        producer_id: Some(producer_id()),
        destination: Some(queue()),
        transaction_id: Some(local_transaction()),
        original_destination: Some(ActiveMqDestination::topic("test.original")),
        message_id: Some(message_id(sequence)),
        original_transaction_id: Some(xa_transaction()),
        group_id: Some("group".to_string()),
        group_sequence: 2,
        correlation_id: Some("corr-1".to_string()),
        persistent: true,
        expiration: 1_700_000_000_000,
        priority: 7,
        reply_to: Some(ActiveMqDestination::temp_queue("ID:test-host-51234-1:1")),
        timestamp: 1_690_000_000_000,
        message_type: Some("order".to_string()),
        content: vec![0, 0, 0, 2, b'h', b'i'],
        properties: properties(),
        data_structure: Some(Box::new(connection_id())),
        target_consumer_id: Some(consumer_id()),
        compressed: false,
        redelivery_counter: 1,
        broker_path: vec![BrokerId::new("broker-a"), BrokerId::new("broker-b")],
        arrival: 1_690_000_000_500,
        user_id: Some("alice".to_string()),
        droppable: true,
        cluster: vec![BrokerId::new("broker-c")],
        broker_in_time: 11,
        broker_out_time: 12,
    }
}

fn text_message() -> TextMessage {
    TextMessage {
        base: message_base(1),
    }
}

/// One fully populated instance of every registered variant.
pub fn populated_catalog() -> Vec<Box<dyn DataStructure>> {
    let mut wire_format = WireFormatInfo::new(12);
    wire_format.set_property("CacheEnabled", false);
    wire_format.set_property("MaxInactivityDuration", 30_000i64);
    wire_format.set_property("LoadFactor", f64::NAN);

    let peer = BrokerInfo {
        broker_id: Some(BrokerId::new("peer")),
        broker_url: Some("tcp://peer:61616".to_string()),
        ..BrokerInfo::default()
    };

    vec![
        Box::new(wire_format) as Box<dyn DataStructure>,
        Box::new(BrokerInfo {
            header: header(1),
            broker_id: Some(BrokerId::new("broker-a")),
            broker_url: Some("tcp://localhost:61616".to_string()),
            peer_broker_infos: vec![peer],
            broker_name: Some("localhost".to_string()),
            slave_broker: false,
            master_broker: true,
            fault_tolerant_configuration: true,
            duplex_connection: true,
            network_connection: true,
            connection_id: 5,
            broker_upload_url: Some("http://localhost/upload".to_string()),
            network_properties: Some("ttl=1".to_string()),
        }),
        Box::new(ConnectionInfo {
            header: header(2),
            connection_id: Some(connection_id()),
            client_id: Some("client".to_string()),
            password: Some("secret".to_string()),
            user_name: Some("alice".to_string()),
            broker_path: vec![BrokerId::new("broker-a")],
            broker_master_connector: false,
            manageable: true,
            client_master: true,
            fault_tolerant: true,
            failover_reconnect: true,
            client_ip: Some("10.0.0.5".to_string()),
        }),
        Box::new(SessionInfo {
            header: header(3),
            session_id: Some(session_id()),
        }),
        Box::new(ConsumerInfo {
            header: header(4),
            consumer_id: Some(consumer_id()),
            browser: false,
            destination: Some(queue()),
            prefetch_size: 1000,
            maximum_pending_message_limit: 10,
            dispatch_async: true,
            selector: Some("price > 10".to_string()),
            subscription_name: Some("durable".to_string()),
            no_local: true,
            exclusive: true,
            retroactive: false,
            priority: -1,
            broker_path: vec![BrokerId::new("broker-a")],
            additional_predicate: Some(Box::new(BrokerId::new("predicate"))),
            network_subscription: false,
            optimized_acknowledge: true,
            no_range_acks: true,
            network_consumer_path: vec![consumer_id()],
        }),
        Box::new(ProducerInfo {
            header: header(5),
            producer_id: Some(producer_id()),
            destination: Some(queue()),
            broker_path: vec![BrokerId::new("broker-a")],
            dispatch_async: true,
            window_size: 1024,
        }),
        Box::new(TransactionInfo {
            header: header(6),
            connection_id: Some(connection_id()),
            transaction_id: Some(xa_transaction()),
            transaction_type: TRANSACTION_COMMIT_ONE_PHASE,
        }),
        Box::new(DestinationInfo {
            header: header(7),
            connection_id: Some(connection_id()),
            destination: Some(ActiveMqDestination::temp_topic("ID:test-host-51234-1:2")),
            operation_type: DESTINATION_ADD_OPERATION,
            timeout: 500,
            broker_path: vec![BrokerId::new("broker-a")],
        }),
        Box::new(RemoveSubscriptionInfo {
            header: header(8),
            connection_id: Some(connection_id()),
            subscription_name: Some("durable".to_string()),
            client_id: Some("client".to_string()),
        }),
        Box::new(KeepAliveInfo { header: header(9) }),
        Box::new(ShutdownInfo { header: header(10) }),
        Box::new(RemoveInfo {
            header: header(11),
            object_id: Some(Box::new(consumer_id())),
            last_delivered_sequence_id: 99,
        }),
        Box::new(ControlCommand {
            header: header(12),
            command: Some("shutdown".to_string()),
        }),
        Box::new(FlushCommand { header: header(13) }),
        Box::new(ConnectionError {
            header: header(14),
            exception: Some(broker_error()),
            connection_id: Some(connection_id()),
        }),
        Box::new(ConsumerControl {
            header: header(15),
            destination: Some(queue()),
            close: false,
            consumer_id: Some(consumer_id()),
            prefetch: 10,
            flush: true,
            start: true,
            stop: false,
        }),
        Box::new(ConnectionControl {
            header: header(16),
            close: false,
            exit: false,
            fault_tolerant: true,
            resume: true,
            suspend: false,
            connected_brokers: Some("tcp://a,tcp://b".to_string()),
            reconnect_to: Some("tcp://b".to_string()),
            rebalance_connection: true,
            token: vec![7, 7, 7],
        }),
        Box::new(ProducerAck {
            header: header(17),
            producer_id: Some(producer_id()),
            size: 4096,
        }),
        Box::new(MessagePull {
            header: header(18),
            consumer_id: Some(consumer_id()),
            destination: Some(queue()),
            timeout: 1000,
            correlation_id: Some("pull".to_string()),
            message_id: Some(message_id(4)),
        }),
        Box::new(MessageDispatch {
            header: header(19),
            consumer_id: Some(consumer_id()),
            destination: Some(queue()),
            message: Some(Box::new(text_message())),
            redelivery_counter: 2,
        }),
        Box::new(MessageAck {
            header: header(20),
            destination: Some(queue()),
            transaction_id: Some(local_transaction()),
            consumer_id: Some(consumer_id()),
            ack_type: INDIVIDUAL_ACK_TYPE,
            first_message_id: Some(message_id(1)),
            last_message_id: Some(message_id(3)),
            message_count: 3,
            poison_cause: Some(broker_error()),
        }),
        Box::new(ActiveMqMessage {
            base: message_base(2),
        }),
        Box::new(BytesMessage {
            base: message_base(3),
        }),
        Box::new(MapMessage {
            base: message_base(4),
        }),
        Box::new(ObjectMessage {
            base: message_base(5),
        }),
        Box::new(StreamMessage {
            base: message_base(6),
        }),
        Box::new(text_message()),
        Box::new(BlobMessage {
            base: message_base(7),
            remote_blob_url: Some("http://localhost/blob/7".to_string()),
            mime_type: Some("image/png".to_string()),
            delete_when_done: true,
        }),
        Box::new(Response {
            header: header(21),
            correlation_id: 2,
        }),
        Box::new(ExceptionResponse {
            header: header(22),
            correlation_id: 3,
            exception: Some(broker_error()),
        }),
        Box::new(DataResponse {
            header: header(23),
            correlation_id: 4,
            data: Some(Box::new(queue())),
        }),
        Box::new(DataArrayResponse {
            header: header(24),
            correlation_id: 5,
            data: vec![
                Box::new(queue()) as Box<dyn DataStructure>,
                Box::new(connection_id()),
            ],
        }),
        Box::new(IntegerResponse {
            header: header(25),
            correlation_id: 6,
            result: -12,
        }),
        Box::new(DiscoveryEvent {
            service_name: Some("tcp://broker:61616".to_string()),
            broker_name: Some("broker".to_string()),
        }),
        Box::new(JournalTopicAck {
            destination: Some(ActiveMqDestination::topic("test.prices")),
            message_id: Some(message_id(5)),
            message_sequence_id: 55,
            subscription_name: Some("durable".to_string()),
            client_id: Some("client".to_string()),
            transaction_id: Some(local_transaction()),
        }),
        Box::new(JournalQueueAck {
            destination: Some(queue()),
            message_ack: Some(MessageAck {
                message_count: 1,
                ..MessageAck::default()
            }),
        }),
        Box::new(JournalTrace {
            message: Some("trace".to_string()),
        }),
        Box::new(JournalTransaction {
            transaction_id: Some(xa_transaction()),
            transaction_type: TRANSACTION_COMMIT_ONE_PHASE,
            was_prepared: true,
        }),
        Box::new(SubscriptionInfo {
            client_id: Some("client".to_string()),
            destination: Some(ActiveMqDestination::topic("test.prices")),
            selector: Some("a = 1".to_string()),
            subscription_name: Some("durable".to_string()),
            subscribed_destination: Some(ActiveMqDestination::topic("test.>")),
        }),
        Box::new(PartialCommand {
            header: header(26),
            data: vec![1, 2, 3],
        }),
        Box::new(LastPartialCommand {
            header: header(27),
            data: vec![4, 5],
        }),
        Box::new(ReplayCommand {
            header: header(28),
            first_nak_number: 3,
            last_nak_number: 8,
        }),
        Box::new(MessageDispatchNotification {
            header: header(29),
            consumer_id: Some(consumer_id()),
            destination: Some(queue()),
            delivery_sequence_id: 77,
            message_id: Some(message_id(6)),
        }),
        Box::new(NetworkBridgeFilter {
            network_broker_id: Some(BrokerId::new("broker-b")),
            network_ttl: 3,
        }),
        Box::new(queue()),
        Box::new(ActiveMqDestination::topic("test.prices")),
        Box::new(ActiveMqDestination::temp_queue("ID:test-host-51234-1:3")),
        Box::new(ActiveMqDestination::temp_topic("ID:test-host-51234-1:4")),
        Box::new(message_id(8)),
        Box::new(LocalTransactionId::new(connection_id(), 8)),
        Box::new(XaTransactionId {
            format_id: 1,
            global_transaction_id: vec![5],
            branch_qualifier: vec![6, 7],
        }),
        Box::new(connection_id()),
        Box::new(session_id()),
        Box::new(consumer_id()),
        Box::new(producer_id()),
        Box::new(BrokerId::new("broker-z")),
    ]
}

/// [`populated_catalog`] with every field newer than `version` left at its default, so each entry
/// survives a round trip at that version unchanged.
pub fn populated_catalog_at(version: u32) -> Vec<Box<dyn DataStructure>> {
    let mut catalog = populated_catalog();
    for command in &mut catalog {
        clear_newer_fields(command.as_mut(), version);
    }
    catalog
}

fn message_base_mut<'a>(command: &'a mut (dyn DataStructure + 'static)) -> Option<&'a mut MessageBase> {
    match command.type_code() {
        23 => command.downcast_mut::<ActiveMqMessage>().map(|m| &mut m.base),
        24 => command.downcast_mut::<BytesMessage>().map(|m| &mut m.base),
        25 => command.downcast_mut::<MapMessage>().map(|m| &mut m.base),
        26 => command.downcast_mut::<ObjectMessage>().map(|m| &mut m.base),
        27 => command.downcast_mut::<StreamMessage>().map(|m| &mut m.base),
        28 => command.downcast_mut::<TextMessage>().map(|m| &mut m.base),
        29 => command.downcast_mut::<BlobMessage>().map(|m| &mut m.base),
        _ => None,
    }
}

fn clear_newer_message_fields(base: &mut MessageBase, version: u32) {
    if version < 2 {
        base.droppable = false;
    }
    if version < 3 {
        base.cluster.clear();
        base.broker_in_time = 0;
        base.broker_out_time = 0;
    }
}

fn clear_newer_fields(command: &mut (dyn DataStructure + 'static), version: u32) {
    if let Some(base) = message_base_mut(command) {
        clear_newer_message_fields(base, version);
    }
    if let Some(dispatch) = command.downcast_mut::<MessageDispatch>() {
        if let Some(message) = dispatch.message.as_mut() {
            clear_newer_message_fields(message.message_mut(), version);
        }
    }
    if let Some(info) = command.downcast_mut::<BrokerInfo>() {
        if version < 2 {
            info.duplex_connection = false;
            info.network_connection = false;
            info.connection_id = 0;
        }
        if version < 3 {
            info.broker_upload_url = None;
            info.network_properties = None;
        }
    }
    if let Some(info) = command.downcast_mut::<ConnectionInfo>() {
        if version < 2 {
            info.client_master = false;
        }
        if version < 6 {
            info.fault_tolerant = false;
            info.failover_reconnect = false;
        }
        if version < 8 {
            info.client_ip = None;
        }
    }
    if let Some(info) = command.downcast_mut::<ConsumerInfo>() {
        if version < 4 {
            info.network_consumer_path.clear();
        }
    }
    if let Some(info) = command.downcast_mut::<ProducerInfo>() {
        if version < 2 {
            info.dispatch_async = false;
        }
        if version < 3 {
            info.window_size = 0;
        }
    }
    if let Some(info) = command.downcast_mut::<RemoveInfo>() {
        if version < 5 {
            info.last_delivered_sequence_id = 0;
        }
    }
    if let Some(control) = command.downcast_mut::<ConsumerControl>() {
        if version < 2 {
            control.flush = false;
            control.start = false;
            control.stop = false;
        }
        if version < 6 {
            control.destination = None;
        }
    }
    if let Some(control) = command.downcast_mut::<ConnectionControl>() {
        if version < 6 {
            control.connected_brokers = None;
            control.reconnect_to = None;
            control.rebalance_connection = false;
        }
        if version < 8 {
            control.token.clear();
        }
    }
    if let Some(pull) = command.downcast_mut::<MessagePull>() {
        if version < 3 {
            pull.correlation_id = None;
            pull.message_id = None;
        }
    }
    if let Some(ack) = command.downcast_mut::<MessageAck>() {
        if version < 7 {
            ack.poison_cause = None;
        }
    }
    if let Some(info) = command.downcast_mut::<SubscriptionInfo>() {
        if version < 3 {
            info.subscribed_destination = None;
        }
    }
}

/// Routes `tracing` output from the code under test to the test harness.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("openwire_core=trace")
        .with_test_writer()
        .try_init();
}
