//! CBOR reader and writer for the token wire format.
//!
//! A thin stateful layer over [`minicbor`]: the engine provides the byte
//! grammar and minimal-width integer encoding, this module adds what the
//! token formats rely on beyond that — container-nesting bookkeeping with a
//! balanced `finish()`, typed unsigned/signed reads, indefinite-length chunk
//! concatenation, and break handling.

use crate::error::Error;
use minicbor::data::{Tag, Type};

/// The eight CBOR major types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MajorType {
    /// Major type 0
    UnsignedInteger,
    /// Major type 1
    NegativeInteger,
    /// Major type 2
    ByteString,
    /// Major type 3
    TextString,
    /// Major type 4
    Array,
    /// Major type 5
    Map,
    /// Major type 6
    Tag,
    /// Major type 7: floats, simple values, and the break code
    Simple,
}

/// Open-container state tracked by the encoder.
#[derive(Debug)]
enum Container {
    /// Definite-length array or map; `remaining` counts outstanding items
    /// (two per map entry)
    Definite { remaining: u64 },
    /// Indefinite-length array, map, byte string, or text string
    Indefinite,
}

/// CBOR encoder producing an owned buffer.
///
/// Every `push` appends one data item. Definite-length containers are
/// opened with their item count and closed with the matching `end_*` call;
/// indefinite-length containers are closed with [`push_break`]. Opening and
/// closing unevenly, or finishing with open containers, is reported as
/// [`Error::UnbalancedContainers`].
///
/// [`push_break`]: CborEncoder::push_break
#[derive(Debug)]
pub struct CborEncoder {
    enc: minicbor::Encoder<Vec<u8>>,
    stack: Vec<Container>,
}

impl Default for CborEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl CborEncoder {
    /// Create an empty encoder
    pub fn new() -> Self {
        Self {
            enc: minicbor::Encoder::new(Vec::new()),
            stack: Vec::new(),
        }
    }

    /// Account one data item against the innermost definite container.
    fn note_item(&mut self) -> Result<(), Error> {
        if let Some(Container::Definite { remaining }) = self.stack.last_mut() {
            if *remaining == 0 {
                return Err(Error::UnbalancedContainers);
            }
            *remaining -= 1;
        }
        Ok(())
    }

    /// Append a signed integer, selecting the smallest encoding
    pub fn push_int(&mut self, value: i64) -> Result<&mut Self, Error> {
        self.note_item()?;
        self.enc.i64(value)?;
        Ok(self)
    }

    /// Append an unsigned integer, selecting the smallest encoding
    pub fn push_uint(&mut self, value: u64) -> Result<&mut Self, Error> {
        self.note_item()?;
        self.enc.u64(value)?;
        Ok(self)
    }

    /// Append a boolean (simple value 20 or 21)
    pub fn push_bool(&mut self, value: bool) -> Result<&mut Self, Error> {
        self.note_item()?;
        self.enc.bool(value)?;
        Ok(self)
    }

    /// Append null (simple value 22)
    pub fn push_null(&mut self) -> Result<&mut Self, Error> {
        self.note_item()?;
        self.enc.null()?;
        Ok(self)
    }

    /// Append undefined (simple value 23)
    pub fn push_undefined(&mut self) -> Result<&mut Self, Error> {
        self.note_item()?;
        self.enc.undefined()?;
        Ok(self)
    }

    /// Append a half-precision float; no narrowing or widening is applied
    pub fn push_f16(&mut self, value: f32) -> Result<&mut Self, Error> {
        self.note_item()?;
        self.enc.f16(value)?;
        Ok(self)
    }

    /// Append a single-precision float
    pub fn push_f32(&mut self, value: f32) -> Result<&mut Self, Error> {
        self.note_item()?;
        self.enc.f32(value)?;
        Ok(self)
    }

    /// Append a double-precision float
    pub fn push_f64(&mut self, value: f64) -> Result<&mut Self, Error> {
        self.note_item()?;
        self.enc.f64(value)?;
        Ok(self)
    }

    /// Append a definite-length byte string, or a chunk of an open
    /// indefinite-length byte string
    pub fn push_bytes(&mut self, value: &[u8]) -> Result<&mut Self, Error> {
        self.note_item()?;
        self.enc.bytes(value)?;
        Ok(self)
    }

    /// Append a definite-length text string, or a chunk of an open
    /// indefinite-length text string
    pub fn push_text(&mut self, value: &str) -> Result<&mut Self, Error> {
        self.note_item()?;
        self.enc.str(value)?;
        Ok(self)
    }

    /// Open a definite-length array of `len` items
    pub fn begin_array(&mut self, len: u64) -> Result<&mut Self, Error> {
        self.note_item()?;
        self.enc.array(len)?;
        self.stack.push(Container::Definite { remaining: len });
        Ok(self)
    }

    /// Close the innermost definite-length array
    pub fn end_array(&mut self) -> Result<&mut Self, Error> {
        self.end_definite()
    }

    /// Open an indefinite-length array; close it with [`push_break`]
    ///
    /// [`push_break`]: CborEncoder::push_break
    pub fn begin_array_indefinite(&mut self) -> Result<&mut Self, Error> {
        self.note_item()?;
        self.enc.begin_array()?;
        self.stack.push(Container::Indefinite);
        Ok(self)
    }

    /// Open a definite-length map of `len` entries
    pub fn begin_map(&mut self, len: u64) -> Result<&mut Self, Error> {
        self.note_item()?;
        self.enc.map(len)?;
        let items = len
            .checked_mul(2)
            .ok_or_else(|| Error::InvalidArgument("map length overflow".to_string()))?;
        self.stack.push(Container::Definite { remaining: items });
        Ok(self)
    }

    /// Close the innermost definite-length map
    pub fn end_map(&mut self) -> Result<&mut Self, Error> {
        self.end_definite()
    }

    /// Open an indefinite-length map; close it with [`push_break`]
    ///
    /// [`push_break`]: CborEncoder::push_break
    pub fn begin_map_indefinite(&mut self) -> Result<&mut Self, Error> {
        self.note_item()?;
        self.enc.begin_map()?;
        self.stack.push(Container::Indefinite);
        Ok(self)
    }

    /// Open an indefinite-length byte string; push chunks with
    /// [`push_bytes`] and close with [`push_break`]
    ///
    /// [`push_bytes`]: CborEncoder::push_bytes
    /// [`push_break`]: CborEncoder::push_break
    pub fn begin_bytes_indefinite(&mut self) -> Result<&mut Self, Error> {
        self.note_item()?;
        self.enc.begin_bytes()?;
        self.stack.push(Container::Indefinite);
        Ok(self)
    }

    /// Open an indefinite-length text string; push chunks with
    /// [`push_text`] and close with [`push_break`]
    ///
    /// [`push_text`]: CborEncoder::push_text
    /// [`push_break`]: CborEncoder::push_break
    pub fn begin_text_indefinite(&mut self) -> Result<&mut Self, Error> {
        self.note_item()?;
        self.enc.begin_str()?;
        self.stack.push(Container::Indefinite);
        Ok(self)
    }

    /// Append a tag head; the next item pushed is the tagged value
    pub fn push_tag(&mut self, tag: u64) -> Result<&mut Self, Error> {
        self.enc.tag(Tag::new(tag))?;
        Ok(self)
    }

    /// Close the innermost indefinite-length container with a break code
    pub fn push_break(&mut self) -> Result<&mut Self, Error> {
        match self.stack.pop() {
            Some(Container::Indefinite) => {
                self.enc.end()?;
                Ok(self)
            }
            Some(c) => {
                self.stack.push(c);
                Err(Error::InvalidBreak)
            }
            None => Err(Error::InvalidBreak),
        }
    }

    /// Append pre-encoded CBOR bytes, counted as a single data item
    pub fn push_raw(&mut self, bytes: &[u8]) -> Result<&mut Self, Error> {
        self.note_item()?;
        self.enc.writer_mut().extend_from_slice(bytes);
        Ok(self)
    }

    /// Finish encoding and return the owned buffer.
    ///
    /// Fails if any container is still open or a definite-length container
    /// received fewer items than declared.
    pub fn finish(self) -> Result<Vec<u8>, Error> {
        if !self.stack.is_empty() {
            return Err(Error::UnbalancedContainers);
        }
        Ok(self.enc.into_writer())
    }

    fn end_definite(&mut self) -> Result<&mut Self, Error> {
        match self.stack.pop() {
            Some(Container::Definite { remaining: 0 }) => Ok(self),
            Some(c) => {
                self.stack.push(c);
                Err(Error::UnbalancedContainers)
            }
            None => Err(Error::UnbalancedContainers),
        }
    }
}

/// CBOR decoder over a borrowed buffer.
///
/// Reads advance a cursor in call order. `peek_*` operations inspect the
/// next item head without consuming it; indefinite-length containers report
/// `None` from the header reads and are consumed by looping until
/// [`is_break_code`] and calling [`read_break`].
///
/// [`is_break_code`]: CborDecoder::is_break_code
/// [`read_break`]: CborDecoder::read_break
#[derive(Debug)]
pub struct CborDecoder<'b> {
    dec: minicbor::Decoder<'b>,
}

impl<'b> CborDecoder<'b> {
    /// Create a decoder over `input`
    pub fn new(input: &'b [u8]) -> Self {
        Self {
            dec: minicbor::Decoder::new(input),
        }
    }

    /// Current cursor position in bytes
    pub fn position(&self) -> usize {
        self.dec.position()
    }

    /// Bytes left between the cursor and the end of the input
    pub fn remaining(&self) -> usize {
        self.dec.input().len().saturating_sub(self.dec.position())
    }

    fn peek_byte(&self) -> Result<u8, Error> {
        self.dec
            .input()
            .get(self.dec.position())
            .copied()
            .ok_or(Error::EndOfBuffer)
    }

    /// Major type of the next item head
    pub fn peek_major_type(&self) -> Result<MajorType, Error> {
        Ok(match self.peek_byte()? >> 5 {
            0 => MajorType::UnsignedInteger,
            1 => MajorType::NegativeInteger,
            2 => MajorType::ByteString,
            3 => MajorType::TextString,
            4 => MajorType::Array,
            5 => MajorType::Map,
            6 => MajorType::Tag,
            _ => MajorType::Simple,
        })
    }

    /// Additional-info bits (low five) of the next item head
    pub fn peek_additional_info(&self) -> Result<u8, Error> {
        Ok(self.peek_byte()? & 0x1f)
    }

    /// Whether the next byte is the break code terminating an
    /// indefinite-length container
    pub fn is_break_code(&self) -> Result<bool, Error> {
        Ok(self.peek_byte()? == 0xff)
    }

    /// Consume a break code
    pub fn read_break(&mut self) -> Result<(), Error> {
        if self.peek_byte()? == 0xff {
            self.dec.set_position(self.dec.position() + 1);
            Ok(())
        } else {
            Err(Error::InvalidBreak)
        }
    }

    /// Read an unsigned integer.
    ///
    /// A stored negative integer fails with
    /// [`Error::NegativeValueInUnsignedType`].
    pub fn read_u64(&mut self) -> Result<u64, Error> {
        match self.dec.datatype()? {
            Type::U8 | Type::U16 | Type::U32 | Type::U64 => Ok(self.dec.u64()?),
            Type::I8 | Type::I16 | Type::I32 | Type::I64 | Type::Int => {
                Err(Error::NegativeValueInUnsignedType)
            }
            other => Err(unexpected("unsigned integer", other)),
        }
    }

    /// Read a signed integer; major type 1 decodes to `-1 - value`.
    ///
    /// A magnitude that does not fit an `i64` fails with
    /// [`Error::CborValueOutOfRange`].
    pub fn read_i64(&mut self) -> Result<i64, Error> {
        match self.dec.datatype()? {
            Type::U8 | Type::U16 | Type::U32 | Type::U64 => {
                let v = self.dec.u64()?;
                i64::try_from(v).map_err(|_| Error::CborValueOutOfRange)
            }
            Type::I8 | Type::I16 | Type::I32 | Type::I64 => Ok(self.dec.i64()?),
            Type::Int => Err(Error::CborValueOutOfRange),
            other => Err(unexpected("integer", other)),
        }
    }

    /// Read a boolean
    pub fn read_bool(&mut self) -> Result<bool, Error> {
        match self.dec.datatype()? {
            Type::Bool => Ok(self.dec.bool()?),
            other => Err(unexpected("bool", other)),
        }
    }

    /// Read a null item
    pub fn read_null(&mut self) -> Result<(), Error> {
        match self.dec.datatype()? {
            Type::Null => {
                self.dec.null()?;
                Ok(())
            }
            other => Err(unexpected("null", other)),
        }
    }

    /// Read an undefined item
    pub fn read_undefined(&mut self) -> Result<(), Error> {
        match self.dec.datatype()? {
            Type::Undefined => {
                self.dec.undefined()?;
                Ok(())
            }
            other => Err(unexpected("undefined", other)),
        }
    }

    /// Read a float of any stored width, widened to `f64`
    pub fn read_float(&mut self) -> Result<f64, Error> {
        match self.dec.datatype()? {
            Type::F16 => Ok(f64::from(self.dec.f16()?)),
            Type::F32 => Ok(f64::from(self.dec.f32()?)),
            Type::F64 => Ok(self.dec.f64()?),
            other => Err(unexpected("float", other)),
        }
    }

    /// Read a byte string into an owned buffer.
    ///
    /// Indefinite-length strings are concatenated from their chunks; a
    /// chunk that is itself indefinite is malformed and rejected.
    pub fn read_bytes(&mut self) -> Result<Vec<u8>, Error> {
        match self.dec.datatype()? {
            Type::Bytes => Ok(self.dec.bytes()?.to_vec()),
            Type::BytesIndef => {
                let mut out = Vec::new();
                for chunk in self.dec.bytes_iter()? {
                    out.extend_from_slice(chunk?);
                }
                Ok(out)
            }
            other => Err(unexpected("byte string", other)),
        }
    }

    /// Read a text string into an owned buffer.
    ///
    /// Indefinite-length strings are concatenated from their chunks.
    pub fn read_text(&mut self) -> Result<String, Error> {
        match self.dec.datatype()? {
            Type::String => Ok(self.dec.str()?.to_string()),
            Type::StringIndef => {
                let mut out = String::new();
                for chunk in self.dec.str_iter()? {
                    out.push_str(chunk?);
                }
                Ok(out)
            }
            other => Err(unexpected("text string", other)),
        }
    }

    /// Read an array head. `None` means indefinite length: loop until
    /// [`is_break_code`] and then [`read_break`].
    ///
    /// [`is_break_code`]: CborDecoder::is_break_code
    /// [`read_break`]: CborDecoder::read_break
    pub fn read_array_header(&mut self) -> Result<Option<u64>, Error> {
        match self.dec.datatype()? {
            Type::Array | Type::ArrayIndef => Ok(self.dec.array()?),
            other => Err(unexpected("array", other)),
        }
    }

    /// Read a map head. `None` means indefinite length.
    pub fn read_map_header(&mut self) -> Result<Option<u64>, Error> {
        match self.dec.datatype()? {
            Type::Map | Type::MapIndef => Ok(self.dec.map()?),
            other => Err(unexpected("map", other)),
        }
    }

    /// Read a tag head and return the tag number; the tagged value follows
    pub fn read_tag(&mut self) -> Result<u64, Error> {
        match self.dec.datatype()? {
            Type::Tag => self.read_head_value(),
            other => Err(unexpected("tag", other)),
        }
    }

    /// Decode the argument of the item head at the cursor and advance past
    /// the head. Reserved additional-info values are rejected.
    fn read_head_value(&mut self) -> Result<u64, Error> {
        let input = self.dec.input();
        let pos = self.dec.position();
        let head = *input.get(pos).ok_or(Error::EndOfBuffer)?;

        let (value, advance) = match head & 0x1f {
            info @ 0..=23 => (u64::from(info), 1),
            24 => {
                let arg = input.get(pos + 1).ok_or(Error::EndOfBuffer)?;
                (u64::from(*arg), 2)
            }
            25 => {
                let arg = input.get(pos + 1..pos + 3).ok_or(Error::EndOfBuffer)?;
                (u64::from(u16::from_be_bytes([arg[0], arg[1]])), 3)
            }
            26 => {
                let arg = input.get(pos + 1..pos + 5).ok_or(Error::EndOfBuffer)?;
                (
                    u64::from(u32::from_be_bytes([arg[0], arg[1], arg[2], arg[3]])),
                    5,
                )
            }
            27 => {
                let arg = input.get(pos + 1..pos + 9).ok_or(Error::EndOfBuffer)?;
                let mut be = [0u8; 8];
                be.copy_from_slice(arg);
                (u64::from_be_bytes(be), 9)
            }
            info => return Err(Error::UnsupportedAdditionalInfo(info)),
        };

        self.dec.set_position(pos + advance);
        Ok(value)
    }

    /// Skip the next data item, recursing through containers and tags
    pub fn skip(&mut self) -> Result<(), Error> {
        self.dec.skip()?;
        Ok(())
    }
}

fn unexpected(expected: &'static str, found: Type) -> Error {
    Error::UnexpectedCborType {
        expected,
        found: type_name(found),
    }
}

fn type_name(t: Type) -> &'static str {
    match t {
        Type::Bool => "bool",
        Type::Null => "null",
        Type::Undefined => "undefined",
        Type::U8 | Type::U16 | Type::U32 | Type::U64 => "unsigned integer",
        Type::I8 | Type::I16 | Type::I32 | Type::I64 | Type::Int => "negative integer",
        Type::F16 | Type::F32 | Type::F64 => "float",
        Type::Simple => "simple value",
        Type::Bytes | Type::BytesIndef => "byte string",
        Type::String | Type::StringIndef => "text string",
        Type::Array | Type::ArrayIndef => "array",
        Type::Map | Type::MapIndef => "map",
        Type::Tag => "tag",
        Type::Break => "break",
        _ => "reserved",
    }
}
