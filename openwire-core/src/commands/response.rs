//! Responses and the broker exception payload.

use std::fmt;

use crate::error::{OpenWireError, Result};
use crate::marshal::loose;
use crate::marshal::{DataInput, DataOutput};
use crate::protocol::constants::{
    DATA_ARRAY_RESPONSE, DATA_RESPONSE, EXCEPTION_RESPONSE, INTEGER_RESPONSE, RESPONSE,
};

use super::{Command, CommandHeader, DataStructure, Variant};

const MAX_CAUSE_DEPTH: usize = 32;

/// One frame of a broker-side stack trace.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StackTraceElement {
    pub class_name: Option<String>,
    pub method_name: Option<String>,
    pub file_name: Option<String>,
    pub line_number: i32,
}

/// An exception raised by the broker, with its stack trace and cause chain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BrokerError {
    pub exception_class: Option<String>,
    pub message: Option<String>,
    pub stack_trace: Vec<StackTraceElement>,
    pub cause: Option<Box<BrokerError>>,
}

impl BrokerError {
    pub fn new(exception_class: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            exception_class: Some(exception_class.into()),
            message: Some(message.into()),
            ..Self::default()
        }
    }

    /// Writes an optional error as a presence byte followed by its fields.
    pub(crate) fn write_optional(output: &mut dyn DataOutput, error: Option<&BrokerError>) -> Result<()> {
        output.write_bool(error.is_some())?;
        let Some(error) = error else {
            return Ok(());
        };
        loose::write_nullable_string(output, error.exception_class.as_deref())?;
        loose::write_nullable_string(output, error.message.as_deref())?;
        let frames = i16::try_from(error.stack_trace.len()).map_err(|_| {
            OpenWireError::MalformedField("stack trace has too many elements".to_string())
        })?;
        output.write_short(frames)?;
        for element in &error.stack_trace {
            loose::write_nullable_string(output, element.class_name.as_deref())?;
            loose::write_nullable_string(output, element.method_name.as_deref())?;
            loose::write_nullable_string(output, element.file_name.as_deref())?;
            output.write_int(element.line_number)?;
        }
        Self::write_optional(output, error.cause.as_deref())
    }

    pub(crate) fn read_optional(input: &mut dyn DataInput) -> Result<Option<BrokerError>> {
        Self::read_chain(input, 0)
    }

    fn read_chain(input: &mut dyn DataInput, depth: usize) -> Result<Option<BrokerError>> {
        if !input.read_bool()? {
            return Ok(None);
        }
        if depth >= MAX_CAUSE_DEPTH {
            return Err(OpenWireError::MalformedField(format!(
                "exception causes nested deeper than {MAX_CAUSE_DEPTH}"
            )));
        }
        let exception_class = loose::read_nullable_string(input)?;
        let message = loose::read_nullable_string(input)?;
        let frames = input.read_short()?;
        // Each element is at least three presence bytes and a line number.
        if frames < 0 || frames as usize * 7 > input.remaining() {
            return Err(OpenWireError::MalformedField(format!(
                "stack trace length {frames} with {} bytes remaining",
                input.remaining()
            )));
        }
        let mut stack_trace = Vec::with_capacity(frames as usize);
        for _ in 0..frames {
            stack_trace.push(StackTraceElement {
                class_name: loose::read_nullable_string(input)?,
                method_name: loose::read_nullable_string(input)?,
                file_name: loose::read_nullable_string(input)?,
                line_number: input.read_int()?,
            });
        }
        let cause = Self::read_chain(input, depth + 1)?.map(Box::new);
        Ok(Some(BrokerError {
            exception_class,
            message,
            stack_trace,
            cause,
        }))
    }
}

impl fmt::Display for BrokerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let class = self.exception_class.as_deref().unwrap_or("BrokerError");
        match &self.message {
            Some(message) => write!(f, "{class}: {message}"),
            None => f.write_str(class),
        }
    }
}

/// Implements [`Command`] for a response type with `header` and `correlation_id` fields.
macro_rules! impl_response {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl Command for $ty {
                fn header(&self) -> &CommandHeader {
                    &self.header
                }

                fn header_mut(&mut self) -> &mut CommandHeader {
                    &mut self.header
                }

                fn correlation_id(&self) -> Option<i32> {
                    Some(self.correlation_id)
                }
            }
        )+
    };
}

/// A plain acknowledgement of the command named by `correlation_id`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Response {
    pub header: CommandHeader,
    pub correlation_id: i32,
}

impl Response {
    pub fn new(correlation_id: i32) -> Self {
        Self {
            correlation_id,
            ..Self::default()
        }
    }
}

impl Variant for Response {
    fn data_structure_type(&self) -> u8 {
        RESPONSE
    }

    fn write_fields(&self, output: &mut dyn DataOutput, _version: u32) -> Result<()> {
        self.header.write(output)?;
        output.write_int(self.correlation_id)
    }

    fn read_fields(&mut self, input: &mut dyn DataInput, _version: u32) -> Result<()> {
        self.header.read(input)?;
        self.correlation_id = input.read_int()?;
        Ok(())
    }

    command_views!();
}

/// A response reporting that the command failed on the broker.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExceptionResponse {
    pub header: CommandHeader,
    pub correlation_id: i32,
    pub exception: Option<BrokerError>,
}

impl Variant for ExceptionResponse {
    fn data_structure_type(&self) -> u8 {
        EXCEPTION_RESPONSE
    }

    fn write_fields(&self, output: &mut dyn DataOutput, _version: u32) -> Result<()> {
        self.header.write(output)?;
        output.write_int(self.correlation_id)?;
        BrokerError::write_optional(output, self.exception.as_ref())
    }

    fn read_fields(&mut self, input: &mut dyn DataInput, _version: u32) -> Result<()> {
        self.header.read(input)?;
        self.correlation_id = input.read_int()?;
        self.exception = BrokerError::read_optional(input)?;
        Ok(())
    }

    command_views!();
}

/// A response carrying one data structure.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataResponse {
    pub header: CommandHeader,
    pub correlation_id: i32,
    pub data: Option<Box<dyn DataStructure>>,
}

impl Variant for DataResponse {
    fn data_structure_type(&self) -> u8 {
        DATA_RESPONSE
    }

    fn write_fields(&self, output: &mut dyn DataOutput, version: u32) -> Result<()> {
        self.header.write(output)?;
        output.write_int(self.correlation_id)?;
        loose::write_nested(output, self.data.as_ref(), version)
    }

    fn read_fields(&mut self, input: &mut dyn DataInput, version: u32) -> Result<()> {
        self.header.read(input)?;
        self.correlation_id = input.read_int()?;
        self.data = loose::read_nested(input, version)?;
        Ok(())
    }

    command_views!();
}

/// A response carrying several data structures.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataArrayResponse {
    pub header: CommandHeader,
    pub correlation_id: i32,
    pub data: Vec<Box<dyn DataStructure>>,
}

impl Variant for DataArrayResponse {
    fn data_structure_type(&self) -> u8 {
        DATA_ARRAY_RESPONSE
    }

    fn write_fields(&self, output: &mut dyn DataOutput, version: u32) -> Result<()> {
        self.header.write(output)?;
        output.write_int(self.correlation_id)?;
        loose::write_nested_array(output, &self.data, version)
    }

    fn read_fields(&mut self, input: &mut dyn DataInput, version: u32) -> Result<()> {
        self.header.read(input)?;
        self.correlation_id = input.read_int()?;
        self.data = loose::read_nested_array(input, version)?;
        Ok(())
    }

    command_views!();
}

/// A response carrying an integer result.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IntegerResponse {
    pub header: CommandHeader,
    pub correlation_id: i32,
    pub result: i32,
}

impl Variant for IntegerResponse {
    fn data_structure_type(&self) -> u8 {
        INTEGER_RESPONSE
    }

    fn write_fields(&self, output: &mut dyn DataOutput, _version: u32) -> Result<()> {
        self.header.write(output)?;
        output.write_int(self.correlation_id)?;
        output.write_int(self.result)
    }

    fn read_fields(&mut self, input: &mut dyn DataInput, _version: u32) -> Result<()> {
        self.header.read(input)?;
        self.correlation_id = input.read_int()?;
        self.result = input.read_int()?;
        Ok(())
    }

    command_views!();
}

impl_response!(
    Response,
    ExceptionResponse,
    DataResponse,
    DataArrayResponse,
    IntegerResponse,
);
