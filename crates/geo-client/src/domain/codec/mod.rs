//! # Cell-Address Codec
//!
//! Conversions between cells, slash-delimited topic paths and compact tokens.
//!
//! ```text
//! CellId 0x1001441540804bd5
//!    │ cell_to_topic
//!    ▼
//! "/0/2/0/0/0/0/0/2/2/0/2/0/0/2/2/2/2/0/0/1/0/0/0/0/2/1/1/3/2/2/2"
//!    │ topic_to_token
//!    ▼
//! "1001441540804bd5"
//! ```
//!
//! Decoding accepts any prefix length: a shorter topic is a coarser cell.
//! Slashes are optional on input, so the `face/digits` form (`0/1132231002223`)
//! decodes the same as the fully separated path.

use super::cell::{CellId, MAX_LEVEL, NUM_FACES};
use super::errors::TopicNameError;

/// Topic level separator.
pub const SEPARATOR: char = '/';

/// Suffix turning a cell topic into a subscription filter for its subtree.
pub const WILDCARD_SUFFIX: &str = "/#";

/// Render a cell as `/face/d1/d2/.../dn`.
pub fn cell_to_topic(cell: CellId) -> String {
    let digits = cell.digits();
    let mut topic = String::with_capacity(2 * (digits.len() + 1));
    topic.push(SEPARATOR);
    topic.push(char::from(b'0' + cell.face()));
    for digit in digits {
        topic.push(SEPARATOR);
        topic.push(char::from(b'0' + digit));
    }
    topic
}

/// Subscription filter covering a cell and everything below it.
pub fn wildcard_topic(cell: CellId) -> String {
    let mut topic = cell_to_topic(cell);
    topic.push_str(WILDCARD_SUFFIX);
    topic
}

/// Validate a topic and split it into `(face, digits)`.
pub fn parse_topic_digits(topic: &str) -> Result<(u8, Vec<u8>), TopicNameError> {
    let mut chars = topic.chars().filter(|&c| c != SEPARATOR);

    let root = chars.next().ok_or_else(|| TopicNameError::Empty {
        topic: topic.to_owned(),
    })?;
    let face = root
        .to_digit(10)
        .filter(|&d| d < u32::from(NUM_FACES))
        .ok_or_else(|| TopicNameError::InvalidRootDigit {
            topic: topic.to_owned(),
            digit: root,
        })? as u8;

    let mut digits = Vec::new();
    for (i, c) in chars.enumerate() {
        let digit = c
            .to_digit(4)
            .ok_or_else(|| TopicNameError::InvalidDigit {
                topic: topic.to_owned(),
                level: i + 1,
                digit: c,
            })?;
        digits.push(digit as u8);
    }

    if digits.len() > usize::from(MAX_LEVEL) {
        return Err(TopicNameError::TooDeep {
            topic: topic.to_owned(),
            depth: digits.len(),
        });
    }

    Ok((face, digits))
}

/// Decode a topic into the cell it addresses.
pub fn topic_to_cell(topic: &str) -> Result<CellId, TopicNameError> {
    let (face, digits) = parse_topic_digits(topic)?;
    CellId::from_face_digits(face, &digits).ok_or_else(|| TopicNameError::TooDeep {
        topic: topic.to_owned(),
        depth: digits.len(),
    })
}

/// Encode a topic as a compact hex token of `1 + floor(n / 2)` characters,
/// where `n` counts the root digit and every level digit.
pub fn topic_to_token(topic: &str) -> Result<String, TopicNameError> {
    let cell = topic_to_cell(topic)?;
    let digit_count = usize::from(cell.level()) + 1;
    let hex = format!("{:016x}", cell.raw());
    Ok(hex[..1 + digit_count / 2].to_owned())
}
