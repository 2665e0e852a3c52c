//! Editable value model and text coercion
//!
//! Maps the runtime's primitive type codes to a closed set of editable
//! kinds, parses user-entered text into tagged values, formats values back
//! to text, and boxes primitives as little-endian bytes for call marshaling.

use smallvec::SmallVec;

/// Runtime type identifier for field, parameter and return types.
///
/// The numeric values mirror the managed runtime's element-type encoding;
/// codes the inspector has no special handling for are preserved in
/// [`TypeCode::Other`] so diagnostics can still show the raw id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeCode {
    Void,
    Bool,
    Char,
    I1,
    U1,
    I2,
    U2,
    I4,
    U4,
    R4,
    R8,
    Str,
    Pointer,
    ValueType,
    Class,
    Var,
    Array,
    Object,
    SzArray,
    Enum,
    Other(u32),
}

impl TypeCode {
    /// Decode a raw element-type id from host metadata.
    pub fn from_raw(raw: u32) -> Self {
        match raw {
            1 => TypeCode::Void,
            2 => TypeCode::Bool,
            3 => TypeCode::Char,
            4 => TypeCode::I1,
            5 => TypeCode::U1,
            6 => TypeCode::I2,
            7 => TypeCode::U2,
            8 => TypeCode::I4,
            9 => TypeCode::U4,
            12 => TypeCode::R4,
            13 => TypeCode::R8,
            14 => TypeCode::Str,
            15 => TypeCode::Pointer,
            17 => TypeCode::ValueType,
            18 => TypeCode::Class,
            19 => TypeCode::Var,
            20 => TypeCode::Array,
            28 => TypeCode::Object,
            29 => TypeCode::SzArray,
            85 => TypeCode::Enum,
            other => TypeCode::Other(other),
        }
    }

    /// Short display name for the primitive codes, `None` for class-like
    /// codes whose name must come from metadata instead.
    pub fn primitive_name(&self) -> Option<&'static str> {
        match self {
            TypeCode::Void => Some("void"),
            TypeCode::Bool => Some("bool"),
            TypeCode::Char => Some("char"),
            TypeCode::I1 => Some("sbyte"),
            TypeCode::U1 => Some("byte"),
            TypeCode::I2 => Some("short"),
            TypeCode::U2 => Some("ushort"),
            TypeCode::I4 => Some("int"),
            TypeCode::U4 => Some("uint"),
            TypeCode::R4 => Some("float"),
            TypeCode::R8 => Some("double"),
            TypeCode::Str => Some("string"),
            TypeCode::Array | TypeCode::SzArray => Some("array"),
            TypeCode::Pointer => Some("pointer"),
            _ => None,
        }
    }

    /// Byte size of the boxed primitive payload, `None` for non-primitives.
    pub fn byte_size(&self) -> Option<usize> {
        match self {
            TypeCode::Bool | TypeCode::I1 | TypeCode::U1 => Some(1),
            TypeCode::Char | TypeCode::I2 | TypeCode::U2 => Some(2),
            TypeCode::I4 | TypeCode::U4 | TypeCode::R4 => Some(4),
            TypeCode::R8 => Some(8),
            _ => None,
        }
    }
}

/// Editable kind a type code collapses to for UI purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditKind {
    Unsupported,
    Bool,
    Int,
    Float,
    Double,
    Short,
    Byte,
    Char,
    Text,
}

/// Collapse a type code into its editable kind.
///
/// Signed/unsigned pairs share a kind; width is what matters for widgets.
pub fn edit_kind(code: TypeCode) -> EditKind {
    match code {
        TypeCode::Bool => EditKind::Bool,
        TypeCode::Str => EditKind::Text,
        TypeCode::R4 => EditKind::Float,
        TypeCode::R8 => EditKind::Double,
        TypeCode::I4 | TypeCode::U4 => EditKind::Int,
        TypeCode::I2 | TypeCode::U2 => EditKind::Short,
        TypeCode::I1 | TypeCode::U1 => EditKind::Byte,
        TypeCode::Char => EditKind::Char,
        _ => EditKind::Unsupported,
    }
}

/// True for codes the inspector can parse, display and write back.
pub fn is_editable(code: TypeCode) -> bool {
    edit_kind(code) != EditKind::Unsupported
}

/// True for codes exposed as navigable reference previews instead of
/// edit fields.
pub fn is_reference(code: TypeCode) -> bool {
    matches!(
        code,
        TypeCode::Object | TypeCode::Class | TypeCode::Array | TypeCode::SzArray | TypeCode::Var
    )
}

/// A point-in-time member value, tagged with its source primitive kind.
///
/// The tag always matches the field or parameter's declared type code; a
/// mismatch is a parse or read failure, never reinterpretation.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    I4(i32),
    U4(u32),
    R4(f32),
    R8(f64),
    I2(i16),
    U2(u16),
    I1(i8),
    U1(u8),
    Char(u16),
    Text(String),
}

impl Value {
    /// Type code this value boxes as.
    pub fn code(&self) -> TypeCode {
        match self {
            Value::Bool(_) => TypeCode::Bool,
            Value::I4(_) => TypeCode::I4,
            Value::U4(_) => TypeCode::U4,
            Value::R4(_) => TypeCode::R4,
            Value::R8(_) => TypeCode::R8,
            Value::I2(_) => TypeCode::I2,
            Value::U2(_) => TypeCode::U2,
            Value::I1(_) => TypeCode::I1,
            Value::U1(_) => TypeCode::U1,
            Value::Char(_) => TypeCode::Char,
            Value::Text(_) => TypeCode::Str,
        }
    }

    /// Box a primitive as little-endian bytes for marshaling.
    ///
    /// `None` for text values; those are marshaled through the host's
    /// string allocator, not raw bytes.
    pub fn to_le_bytes(&self) -> Option<SmallVec<[u8; 8]>> {
        let mut out = SmallVec::new();
        match self {
            Value::Bool(v) => out.push(u8::from(*v)),
            Value::I1(v) => out.push(*v as u8),
            Value::U1(v) => out.push(*v),
            Value::I2(v) => out.extend_from_slice(&v.to_le_bytes()),
            Value::U2(v) => out.extend_from_slice(&v.to_le_bytes()),
            Value::Char(v) => out.extend_from_slice(&v.to_le_bytes()),
            Value::I4(v) => out.extend_from_slice(&v.to_le_bytes()),
            Value::U4(v) => out.extend_from_slice(&v.to_le_bytes()),
            Value::R4(v) => out.extend_from_slice(&v.to_le_bytes()),
            Value::R8(v) => out.extend_from_slice(&v.to_le_bytes()),
            Value::Text(_) => return None,
        }
        Some(out)
    }

    /// Unbox a primitive from little-endian bytes.
    ///
    /// Fails on a non-primitive code or a short slice.
    pub fn from_le_bytes(code: TypeCode, data: &[u8]) -> Option<Value> {
        let size = code.byte_size()?;
        if data.len() < size {
            return None;
        }
        let value = match code {
            TypeCode::Bool => Value::Bool(data[0] != 0),
            TypeCode::I1 => Value::I1(data[0] as i8),
            TypeCode::U1 => Value::U1(data[0]),
            TypeCode::I2 => Value::I2(i16::from_le_bytes([data[0], data[1]])),
            TypeCode::U2 => Value::U2(u16::from_le_bytes([data[0], data[1]])),
            TypeCode::Char => Value::Char(u16::from_le_bytes([data[0], data[1]])),
            TypeCode::I4 => Value::I4(i32::from_le_bytes([data[0], data[1], data[2], data[3]])),
            TypeCode::U4 => Value::U4(u32::from_le_bytes([data[0], data[1], data[2], data[3]])),
            TypeCode::R4 => Value::R4(f32::from_le_bytes([data[0], data[1], data[2], data[3]])),
            TypeCode::R8 => {
                let bytes: [u8; 8] = data[..8].try_into().ok()?;
                Value::R8(f64::from_le_bytes(bytes))
            }
            _ => return None,
        };
        Some(value)
    }
}

/// Why a text draft failed to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("empty input")]
    Empty,
    #[error("malformed input")]
    Malformed,
    #[error("value out of range for the target width")]
    OutOfRange,
    #[error("type is not editable as text")]
    Unsupported,
}

fn parse_signed(trimmed: &str, min: i64, max: i64) -> Result<i64, ParseError> {
    let value: i64 = trimmed.parse().map_err(|_| ParseError::Malformed)?;
    if value < min || value > max {
        return Err(ParseError::OutOfRange);
    }
    Ok(value)
}

fn parse_unsigned(trimmed: &str, max: u64) -> Result<u64, ParseError> {
    if trimmed.starts_with('-') {
        return Err(ParseError::Malformed);
    }
    let value: u64 = trimmed.parse().map_err(|_| ParseError::Malformed)?;
    if value > max {
        return Err(ParseError::OutOfRange);
    }
    Ok(value)
}

fn parse_bool(trimmed: &str) -> Result<bool, ParseError> {
    let lower = trimmed.to_ascii_lowercase();
    match lower.as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ParseError::Malformed),
    }
}

fn parse_char(trimmed: &str) -> Result<u16, ParseError> {
    let mut chars = trimmed.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        let code = c as u32;
        if code <= 0xFFFF {
            return Ok(code as u16);
        }
        return Err(ParseError::OutOfRange);
    }
    let code = parse_unsigned(trimmed, 0xFFFF)?;
    Ok(code as u16)
}

/// Parse user-entered text into a value of the given type code.
///
/// Leading/trailing ASCII whitespace is ignored; an empty remainder fails.
/// Integer kinds reject trailing garbage and enforce the target width's
/// range. Text is taken verbatim (untrimmed).
pub fn parse_value(code: TypeCode, text: &str) -> Result<Value, ParseError> {
    if code == TypeCode::Str {
        return Ok(Value::Text(text.to_string()));
    }

    let trimmed = text.trim_matches(|c: char| c.is_ascii_whitespace());
    if trimmed.is_empty() {
        return Err(ParseError::Empty);
    }

    match code {
        TypeCode::Bool => Ok(Value::Bool(parse_bool(trimmed)?)),
        TypeCode::I4 => parse_signed(trimmed, i64::from(i32::MIN), i64::from(i32::MAX))
            .map(|v| Value::I4(v as i32)),
        TypeCode::U4 => parse_unsigned(trimmed, u64::from(u32::MAX)).map(|v| Value::U4(v as u32)),
        TypeCode::I2 => parse_signed(trimmed, i64::from(i16::MIN), i64::from(i16::MAX))
            .map(|v| Value::I2(v as i16)),
        TypeCode::U2 => parse_unsigned(trimmed, u64::from(u16::MAX)).map(|v| Value::U2(v as u16)),
        TypeCode::I1 => parse_signed(trimmed, i64::from(i8::MIN), i64::from(i8::MAX))
            .map(|v| Value::I1(v as i8)),
        TypeCode::U1 => parse_unsigned(trimmed, u64::from(u8::MAX)).map(|v| Value::U1(v as u8)),
        TypeCode::R4 => trimmed
            .parse::<f32>()
            .map(Value::R4)
            .map_err(|_| ParseError::Malformed),
        TypeCode::R8 => trimmed
            .parse::<f64>()
            .map(Value::R8)
            .map_err(|_| ParseError::Malformed),
        TypeCode::Char => Ok(Value::Char(parse_char(trimmed)?)),
        _ => Err(ParseError::Unsupported),
    }
}

/// Format a value back to its canonical draft text.
///
/// Floats carry fixed fractional digits (6 for f32, 9 for f64) so a draft
/// buffer seeded from the current value is stable frame to frame.
pub fn format_value(value: &Value) -> String {
    match value {
        Value::Bool(v) => if *v { "true" } else { "false" }.to_string(),
        Value::I4(v) => v.to_string(),
        Value::U4(v) => v.to_string(),
        Value::R4(v) => format!("{v:.6}"),
        Value::R8(v) => format!("{v:.9}"),
        Value::I2(v) => v.to_string(),
        Value::U2(v) => v.to_string(),
        Value::I1(v) => v.to_string(),
        Value::U1(v) => v.to_string(),
        Value::Char(v) => {
            let byte = (*v & 0xFF) as u8;
            if *v <= 0x7E && byte >= 0x20 {
                (byte as char).to_string()
            } else {
                v.to_string()
            }
        }
        Value::Text(v) => match v.find('\0') {
            Some(pos) => v[..pos].to_string(),
            None => v.clone(),
        },
    }
}

/// Initial draft text for a freshly shown argument of the given code.
pub fn default_draft(code: TypeCode) -> String {
    match code {
        TypeCode::Bool => "false".to_string(),
        TypeCode::Str => String::new(),
        TypeCode::R4 | TypeCode::R8 => "0.0".to_string(),
        TypeCode::Char => "A".to_string(),
        _ => "0".to_string(),
    }
}
