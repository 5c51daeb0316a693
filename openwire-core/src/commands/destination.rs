//! Queue and topic destinations.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::{OpenWireError, Result};
use crate::marshal::loose::{self, Nested};
use crate::marshal::{DataInput, DataOutput};
use crate::protocol::constants::{
    ACTIVEMQ_QUEUE, ACTIVEMQ_TEMP_QUEUE, ACTIVEMQ_TEMP_TOPIC, ACTIVEMQ_TOPIC,
};

use super::Variant;

const COMPOSITE_SEPARATOR: char = ',';

/// The public classification of a destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DestinationType {
    Queue,
    Topic,
    TemporaryQueue,
    TemporaryTopic,
}

impl DestinationType {
    /// Returns the wire type code of destinations of this type.
    pub fn type_code(self) -> u8 {
        match self {
            DestinationType::Queue => ACTIVEMQ_QUEUE,
            DestinationType::Topic => ACTIVEMQ_TOPIC,
            DestinationType::TemporaryQueue => ACTIVEMQ_TEMP_QUEUE,
            DestinationType::TemporaryTopic => ACTIVEMQ_TEMP_TOPIC,
        }
    }

    /// Returns the destination type written with `type_code`, if any.
    pub fn from_type_code(type_code: u8) -> Option<Self> {
        match type_code {
            ACTIVEMQ_QUEUE => Some(DestinationType::Queue),
            ACTIVEMQ_TOPIC => Some(DestinationType::Topic),
            ACTIVEMQ_TEMP_QUEUE => Some(DestinationType::TemporaryQueue),
            ACTIVEMQ_TEMP_TOPIC => Some(DestinationType::TemporaryTopic),
            _ => None,
        }
    }

    pub fn is_temporary(self) -> bool {
        matches!(
            self,
            DestinationType::TemporaryQueue | DestinationType::TemporaryTopic
        )
    }

    pub fn is_queue(self) -> bool {
        matches!(self, DestinationType::Queue | DestinationType::TemporaryQueue)
    }

    pub fn is_topic(self) -> bool {
        !self.is_queue()
    }
}

/// The messaging-API view of a destination.
pub trait Destination {
    /// Returns the destination's public type.
    fn destination_type(&self) -> DestinationType;

    /// Returns the provider-specific name of the destination.
    fn to_provider_string(&self) -> String;

    /// Returns the options attached to the destination.
    fn properties(&self) -> &BTreeMap<String, String>;

    /// Returns the queue name, for queue-like destinations.
    fn queue_name(&self) -> Option<&str>;

    /// Returns the topic name, for topic-like destinations.
    fn topic_name(&self) -> Option<&str>;

    fn is_temporary(&self) -> bool {
        self.destination_type().is_temporary()
    }
}

/// A queue, topic, temporary queue or temporary topic.
///
/// The destination type decides the type code, so one struct covers codes 100 through 103. A
/// physical name given as `name?key=value&...` has its query part moved into the options.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActiveMqDestination {
    kind: DestinationType,
    physical_name: String,
    options: BTreeMap<String, String>,
}

impl ActiveMqDestination {
    pub fn new(kind: DestinationType, physical_name: &str) -> Self {
        let mut destination = Self {
            kind,
            physical_name: String::new(),
            options: BTreeMap::new(),
        };
        destination.set_physical_name(physical_name);
        destination
    }

    pub fn queue(physical_name: &str) -> Self {
        Self::new(DestinationType::Queue, physical_name)
    }

    pub fn topic(physical_name: &str) -> Self {
        Self::new(DestinationType::Topic, physical_name)
    }

    pub fn temp_queue(physical_name: &str) -> Self {
        Self::new(DestinationType::TemporaryQueue, physical_name)
    }

    pub fn temp_topic(physical_name: &str) -> Self {
        Self::new(DestinationType::TemporaryTopic, physical_name)
    }

    pub fn kind(&self) -> DestinationType {
        self.kind
    }

    pub fn physical_name(&self) -> &str {
        &self.physical_name
    }

    /// Sets the physical name, moving any `?key=value&...` suffix into the options.
    pub fn set_physical_name(&mut self, physical_name: &str) {
        match physical_name.split_once('?') {
            Some((name, query)) => {
                self.physical_name = name.to_string();
                for pair in query.split('&').filter(|pair| !pair.is_empty()) {
                    let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
                    self.options.insert(key.to_string(), value.to_string());
                }
            }
            None => self.physical_name = physical_name.to_string(),
        }
    }

    pub fn options(&self) -> &BTreeMap<String, String> {
        &self.options
    }

    pub fn option(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(String::as_str)
    }

    pub fn set_option(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.options.insert(key.into(), value.into());
    }

    /// Returns `true` if the physical name lists several destinations.
    pub fn is_composite(&self) -> bool {
        self.physical_name.contains(COMPOSITE_SEPARATOR)
    }

    /// Splits a composite destination into its members, each of this destination's type.
    pub fn composite_destinations(&self) -> Vec<ActiveMqDestination> {
        self.physical_name
            .split(COMPOSITE_SEPARATOR)
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(|name| Self::new(self.kind, name))
            .collect()
    }
}

impl fmt::Display for ActiveMqDestination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.physical_name)
    }
}

impl Destination for ActiveMqDestination {
    fn destination_type(&self) -> DestinationType {
        self.kind
    }

    fn to_provider_string(&self) -> String {
        self.physical_name.clone()
    }

    fn properties(&self) -> &BTreeMap<String, String> {
        &self.options
    }

    fn queue_name(&self) -> Option<&str> {
        self.kind.is_queue().then_some(self.physical_name.as_str())
    }

    fn topic_name(&self) -> Option<&str> {
        self.kind.is_topic().then_some(self.physical_name.as_str())
    }
}

impl Variant for ActiveMqDestination {
    fn data_structure_type(&self) -> u8 {
        self.kind.type_code()
    }

    fn write_fields(&self, output: &mut dyn DataOutput, _version: u32) -> Result<()> {
        output.write_string(&self.physical_name)?;
        loose::write_string_map(output, &self.options)
    }

    fn read_fields(&mut self, input: &mut dyn DataInput, _version: u32) -> Result<()> {
        self.physical_name = input.read_string()?;
        self.options = loose::read_string_map(input)?;
        Ok(())
    }
}

impl Nested for ActiveMqDestination {
    fn write_nested(&self, output: &mut dyn DataOutput, version: u32) -> Result<()> {
        output.write_ubyte(self.data_structure_type())?;
        self.write_fields(output, version)
    }

    fn read_nested(type_code: u8, input: &mut dyn DataInput, version: u32) -> Result<Self> {
        let kind = DestinationType::from_type_code(type_code).ok_or_else(|| {
            OpenWireError::MalformedField(format!("type code {type_code} is not a destination"))
        })?;
        let mut destination = Self::new(kind, "");
        destination.read_fields(input, version)?;
        Ok(destination)
    }
}
