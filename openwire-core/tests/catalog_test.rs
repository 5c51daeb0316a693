//! Catalog-wide marshaling, cloning and equality properties.

mod common;

use std::collections::BTreeSet;

use openwire_core::commands::{
    ActiveMqDestination, DataResponse, DataStructure, MessageDispatch, PrimitiveValue,
    TextMessage,
};
use openwire_core::marshal::{marshal, unmarshal, CommandRegistry};
use openwire_core::protocol::{MAX_VERSION, MIN_VERSION};
use openwire_core::OpenWireError;

use common::{init_tracing, populated_catalog, populated_catalog_at};

#[test]
fn test_catalog_covers_every_registered_code() {
    let codes: BTreeSet<u8> = populated_catalog().iter().map(|c| c.type_code()).collect();
    let registered: BTreeSet<u8> = CommandRegistry::global().type_codes().into_iter().collect();
    assert_eq!(codes, registered);
    assert_eq!(codes.len(), 56);
}

#[test]
fn test_round_trip_every_variant_at_latest_version() {
    for command in populated_catalog() {
        let bytes = marshal(command.as_ref(), MAX_VERSION).unwrap();
        let back = unmarshal(&bytes, MAX_VERSION)
            .unwrap_or_else(|e| panic!("type {} failed to decode: {e}", command.type_code()));
        assert!(
            back.equals(command.as_ref()),
            "type {} changed in transit: {}",
            command.type_code(),
            back.describe()
        );
    }
}

#[test]
fn test_round_trip_every_variant_at_every_version() {
    init_tracing();
    for version in MIN_VERSION..=MAX_VERSION {
        for command in populated_catalog_at(version) {
            let bytes = marshal(command.as_ref(), version).unwrap();
            let back = unmarshal(&bytes, version).unwrap_or_else(|e| {
                panic!("type {} v{version} failed to decode: {e}", command.type_code())
            });
            assert!(
                back.equals(command.as_ref()),
                "type {} v{version} changed in transit: {}",
                command.type_code(),
                back.describe()
            );
            assert_eq!(
                marshal(back.as_ref(), version).unwrap(),
                bytes,
                "type {} v{version} is not stable",
                command.type_code()
            );
        }
    }
}

#[test]
fn test_older_version_drops_newer_fields() {
    let full = populated_catalog();
    let trimmed = populated_catalog_at(1);
    let mut differing = 0;
    for (full, trimmed) in full.iter().zip(&trimmed) {
        let back = unmarshal(&marshal(full.as_ref(), 1).unwrap(), 1).unwrap();
        assert!(back.equals(trimmed.as_ref()), "type {}", full.type_code());
        if !trimmed.equals(full.as_ref()) {
            differing += 1;
        }
    }
    assert!(differing > 0);
}

#[test]
fn test_nan_property_survives_clone_and_round_trip() {
    let mut message = TextMessage::default();
    message.set_text("ratio").unwrap();
    message
        .base
        .properties
        .insert("ratio", PrimitiveValue::Double(f64::NAN));

    assert!(message.clone_data_structure().equals(&message));
    let back = unmarshal(&marshal(&message, MAX_VERSION).unwrap(), MAX_VERSION).unwrap();
    assert!(back.equals(&message));
}

#[test]
fn test_older_versions_never_write_more_bytes() {
    for command in populated_catalog() {
        let mut previous = 0;
        for version in MIN_VERSION..=MAX_VERSION {
            let len = marshal(command.as_ref(), version).unwrap().len();
            assert!(len >= previous, "type {} shrank at v{version}", command.type_code());
            previous = len;
        }
    }
}

#[test]
fn test_every_truncation_is_rejected() {
    for command in populated_catalog() {
        let bytes = marshal(command.as_ref(), MAX_VERSION).unwrap();
        for cut in 0..bytes.len() {
            let result = unmarshal(&bytes[..cut], MAX_VERSION);
            assert!(
                matches!(
                    result,
                    Err(OpenWireError::TruncatedStream { .. } | OpenWireError::MalformedField(_))
                ),
                "type {} cut at {cut} gave {result:?}",
                command.type_code()
            );
        }
    }
}

#[test]
fn test_clone_is_equal_and_independent() {
    for command in populated_catalog() {
        let copy = command.clone_data_structure();
        assert!(copy.equals(command.as_ref()));
        assert_eq!(copy.type_code(), command.type_code());
    }

    let mut original = MessageDispatch {
        message: Some(Box::new(TextMessage::default())),
        ..MessageDispatch::default()
    };
    let copy = original.clone_data_structure();
    original
        .message
        .as_mut()
        .unwrap()
        .message_mut()
        .broker_path
        .push(Default::default());
    assert!(!copy.equals(&original));
}

#[test]
fn test_copy_from_same_variant() {
    for command in populated_catalog() {
        let mut target = CommandRegistry::global()
            .create(command.type_code())
            .unwrap();
        target.copy_from(command.as_ref()).unwrap();
        assert!(target.equals(command.as_ref()));
    }
}

#[test]
fn test_distinct_variants_never_equal() {
    let catalog = populated_catalog();
    for (i, a) in catalog.iter().enumerate() {
        for (j, b) in catalog.iter().enumerate() {
            if i != j {
                assert!(
                    !a.equals(b.as_ref()),
                    "{} equals {}",
                    a.type_code(),
                    b.type_code()
                );
            }
        }
    }
}

#[test]
fn test_capability_views() {
    for command in populated_catalog() {
        let code = command.type_code();
        assert_eq!(
            command.as_message().is_some(),
            (23..=29).contains(&code),
            "message view of {code}"
        );
        assert_eq!(
            command
                .as_command()
                .is_some_and(|command| command.is_response()),
            (30..=34).contains(&code),
            "response view of {code}"
        );
    }
}

#[test]
fn test_deeply_nested_responses_rejected() {
    let mut command: Box<dyn DataStructure> = Box::new(ActiveMqDestination::queue("leaf"));
    for _ in 0..100 {
        command = Box::new(DataResponse {
            data: Some(command),
            ..DataResponse::default()
        });
    }
    let bytes = marshal(command.as_ref(), MAX_VERSION).unwrap();
    assert!(matches!(
        unmarshal(&bytes, MAX_VERSION),
        Err(OpenWireError::MalformedField(_))
    ));
}
