//! Signature and property attribute encodings.
//!
//! Member descriptors carry their shape as opaque encoding strings in the
//! `@encode()` style. The registry never interprets them during lookups; this
//! module exists so catalogs can validate what they store and callers can
//! take an encoding apart.
//!
//! # Method signatures
//!
//! A signature is a return type followed by argument types. Every method
//! receives `@` (self) and `:` (selector) as its first two arguments. Decimal
//! stack offsets after a type character (`"v16@0:8"`) are accepted and
//! ignored.
//!
//! - `v` void, `@` object, `:` selector, `#` class
//! - `c` char, `s` short, `i` int, `l` long, `q` long long, `B` bool
//! - `f` float, `d` double
//! - `*` C string, `^` pointer, `?` unknown (blocks)
//!
//! # Property attributes
//!
//! A property attribute string is a comma separated list. The first character
//! of each item is the attribute key, the rest is its value:
//! `T@"NSString",C,N,V_name` has a type (`T`), copy (`C`), nonatomic (`N`) and
//! backing variable (`V`) attribute.

use crate::error::{Error, Result};

/// Type encoding constant definitions.
pub mod types {
    /// Void
    pub const VOID: char = 'v';
    /// Object (id)
    pub const OBJECT: char = '@';
    /// Selector (SEL)
    pub const SELECTOR: char = ':';
    /// Class
    pub const CLASS: char = '#';
    /// char
    pub const CHAR: char = 'c';
    /// short
    pub const SHORT: char = 's';
    /// int (i32)
    pub const INT: char = 'i';
    /// long (64-bit)
    pub const LONG: char = 'l';
    /// long long (i64)
    pub const LONG_LONG: char = 'q';
    /// bool
    pub const BOOL: char = 'B';
    /// float (f32)
    pub const FLOAT: char = 'f';
    /// double (f64)
    pub const DOUBLE: char = 'd';
    /// C string (char*)
    pub const C_STRING: char = '*';
    /// Pointer (void*)
    pub const POINTER: char = '^';
    /// Unknown / block
    pub const UNKNOWN: char = '?';
}

/// Well-known property attribute keys.
pub mod attributes {
    /// Type encoding of the property.
    pub const TYPE: char = 'T';
    /// Read-only.
    pub const READ_ONLY: char = 'R';
    /// Copy semantics.
    pub const COPY: char = 'C';
    /// Retain semantics.
    pub const RETAIN: char = '&';
    /// Non-atomic.
    pub const NON_ATOMIC: char = 'N';
    /// Custom getter.
    pub const GETTER: char = 'G';
    /// Custom setter.
    pub const SETTER: char = 'S';
    /// Dynamic.
    pub const DYNAMIC: char = 'D';
    /// Weak reference.
    pub const WEAK: char = 'W';
    /// Backing instance variable name.
    pub const IVAR: char = 'V';
}

/// One key/value attribute of a property.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PropertyAttribute {
    /// Attribute key (`"T"`, `"C"`, `"V"`, ...).
    pub name: String,
    /// Attribute value, empty for flag attributes such as `N`.
    pub value: String,
}

impl PropertyAttribute {
    /// Creates an attribute from a key and a value.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Returns the size in bytes of a type encoding character.
///
/// # Example
///
/// ```
/// use oxidex_reflect::encoding::size_of_type;
///
/// assert_eq!(size_of_type('i'), Some(4));
/// assert_eq!(size_of_type('q'), Some(8));
/// assert_eq!(size_of_type('v'), Some(0));
/// assert_eq!(size_of_type('x'), None);
/// ```
#[must_use]
pub const fn size_of_type(type_char: char) -> Option<usize> {
    match type_char {
        'v' => Some(0),
        'c' | 'B' => Some(1),
        's' => Some(2),
        'i' | 'f' => Some(4),
        'l' | 'q' | 'd' => Some(8),
        '@' | ':' | '#' | '*' | '^' | '?' => Some(size_of::<usize>()),
        _ => None,
    }
}

/// Checks if a character is a valid type encoding character.
#[must_use]
pub const fn is_valid_type_char(ch: char) -> bool {
    size_of_type(ch).is_some()
}

/// Validates a method signature encoding.
///
/// # Example
///
/// ```
/// use oxidex_reflect::encoding::validate_signature;
///
/// assert!(validate_signature("v@:").is_ok());
/// assert!(validate_signature("v24@0:8i16").is_ok());
/// assert!(validate_signature("@").is_err()); // missing self and _cmd
/// ```
///
/// # Errors
///
/// Returns [`Error::InvalidEncoding`] if the string is empty, contains an
/// unknown type character, or does not start its arguments with `@:`.
pub fn validate_signature(encoding: &str) -> Result<()> {
    parse_signature(encoding).map(|_| ())
}

/// Parses a method signature into its return type and argument types.
///
/// Stack offsets are dropped.
///
/// # Example
///
/// ```
/// use oxidex_reflect::encoding::parse_signature;
///
/// let (ret, args) = parse_signature("i@:if").unwrap();
/// assert_eq!(ret, 'i');
/// assert_eq!(args, vec!['@', ':', 'i', 'f']);
/// ```
///
/// # Errors
///
/// Returns [`Error::InvalidEncoding`] under the same conditions as
/// [`validate_signature`].
pub fn parse_signature(encoding: &str) -> Result<(char, Vec<char>)> {
    let mut type_chars = encoding.chars().filter(|ch| !ch.is_ascii_digit());

    let return_type = type_chars
        .next()
        .filter(|ch| is_valid_type_char(*ch))
        .ok_or_else(|| Error::invalid_encoding(encoding))?;

    let arg_types: Vec<char> = type_chars.collect();
    if arg_types.iter().any(|ch| !is_valid_type_char(*ch)) {
        return Err(Error::invalid_encoding(encoding));
    }

    // Every method receives self and _cmd.
    if arg_types.len() < 2 || arg_types[0] != '@' || arg_types[1] != ':' {
        return Err(Error::invalid_encoding(encoding));
    }

    Ok((return_type, arg_types))
}

/// Returns the number of explicit arguments a signature takes (excluding
/// self and `_cmd`).
///
/// # Errors
///
/// Returns [`Error::InvalidEncoding`] if the signature is invalid.
pub fn argument_count(encoding: &str) -> Result<usize> {
    let (_, args) = parse_signature(encoding)?;
    Ok(args.len() - 2)
}

/// Validates the encoding of a single value, as used by instance variables.
///
/// # Errors
///
/// Returns [`Error::InvalidEncoding`] unless the string is exactly one valid
/// type character.
pub fn validate_value_type(encoding: &str) -> Result<()> {
    let mut chars = encoding.chars();
    match (chars.next(), chars.next()) {
        (Some(ch), None) if ch != types::VOID && is_valid_type_char(ch) => Ok(()),
        _ => Err(Error::invalid_encoding(encoding)),
    }
}

/// Parses a property attribute string.
///
/// An empty string parses to an empty list. Commas inside double quotes (for
/// example in a quoted class name) do not split items.
///
/// # Example
///
/// ```
/// use oxidex_reflect::encoding::parse_property_attributes;
///
/// let attrs = parse_property_attributes("T@\"NSString\",C,N,V_name").unwrap();
/// assert_eq!(attrs.len(), 4);
/// assert_eq!(attrs[0].name, "T");
/// assert_eq!(attrs[0].value, "@\"NSString\"");
/// assert_eq!(attrs[3].value, "_name");
/// ```
///
/// # Errors
///
/// Returns [`Error::InvalidEncoding`] for empty items, unterminated quotes,
/// or a missing leading type attribute.
pub fn parse_property_attributes(encoding: &str) -> Result<Vec<PropertyAttribute>> {
    if encoding.is_empty() {
        return Ok(Vec::new());
    }

    let mut items = Vec::new();
    let mut start = 0;
    let mut quoted = false;
    for (idx, ch) in encoding.char_indices() {
        match ch {
            '"' => quoted = !quoted,
            ',' if !quoted => {
                items.push(&encoding[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    if quoted {
        return Err(Error::invalid_encoding(encoding));
    }
    items.push(&encoding[start..]);

    let mut attrs = Vec::with_capacity(items.len());
    for item in items {
        let mut chars = item.chars();
        let key = chars.next().ok_or_else(|| Error::invalid_encoding(encoding))?;
        attrs.push(PropertyAttribute::new(key.to_string(), chars.as_str()));
    }

    match attrs.first() {
        Some(first) if first.name.starts_with(attributes::TYPE) && !first.value.is_empty() => {
            Ok(attrs)
        }
        _ => Err(Error::invalid_encoding(encoding)),
    }
}

/// Formats an attribute list back into its string form.
#[must_use]
pub fn format_property_attributes(attrs: &[PropertyAttribute]) -> String {
    attrs
        .iter()
        .map(|attr| format!("{}{}", attr.name, attr.value))
        .collect::<Vec<_>>()
        .join(",")
}
