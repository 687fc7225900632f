//! The end-credits text pages and their single-byte character cipher

use crate::rom::image::Image;
use thiserror::Error;
use tracing::warn;

/// The pointer table: two little-endian words (title, names) per page
pub(crate) const TABLE_ADDRESS: usize = 0x015259;

/// Credits pointers are CPU addresses into the bank mapped at this offset
const BANK_OFFSET: usize = 0xc000;

/// The flag byte opening every credits string block
const STRING_FLAG: u8 = 0x22;

/// The number of credit pages
pub const PAGES: usize = 9;

/// The screen-position bytes of the three string slots on a page
const TITLE_POSITION: u8 = 0x47;
const NAME1_POSITION: u8 = 0x8b;
const NAME2_POSITION: u8 = 0xcb;

/// The text shown on one credits page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Text {
    pub title: String,
    pub name1: String,
    pub name2: String,
}

/// The full set of end-credits pages
///
/// Strings are stored through a substitution cipher covering digits, letters and a
/// little punctuation. Decoding is best-effort (unknown bytes become `?`); encoding
/// a character outside the set is a hard error, since a wrong byte garbles the
/// on-screen text.
#[derive(Debug, Clone, Default)]
pub struct Credits {
    pages: [Text; PAGES],
}

impl Credits {
    /// Parse the credit pages out of an image
    pub fn from_image(image: &Image) -> Self {
        let mut pages: [Text; PAGES] = Default::default();

        for (i, page) in pages.iter_mut().enumerate() {
            let address = TABLE_ADDRESS + 4 * i;

            let title = image.get_word(address) as usize + BANK_OFFSET;
            let names = image.get_word(address + 2) as usize + BANK_OFFSET;

            page.title = parse_string(image, title);
            page.name1 = parse_string(image, names);
            page.name2 = parse_string(image, names + page.name1.len() + 3);
        }

        Self { pages }
    }

    /// The text of one page
    pub fn get(&self, page: usize) -> Option<&Text> {
        self.pages.get(page)
    }

    /// Replace the text of one page
    pub fn set(&mut self, page: usize, text: Text) {
        if let Some(slot) = self.pages.get_mut(page) {
            *slot = text;
        }
    }

    /// Serialize the pointer table and string pool as one contiguous block
    ///
    /// A page with an empty title reuses the previous page's title pointer instead
    /// of spending pool bytes on a duplicate.
    pub(crate) fn serialize(&self) -> Result<Vec<u8>, CreditsEncodeError> {
        let mut table = Vec::with_capacity(4 * PAGES);
        let mut pool = Vec::new();
        let pool_base = TABLE_ADDRESS + 4 * PAGES;

        let mut last_title = None;

        for page in &self.pages {
            let title = match (&page.title, last_title) {
                (title, Some(pointer)) if title.is_empty() => pointer,
                (title, _) => {
                    let pointer = (pool_base + pool.len() - BANK_OFFSET) as u16;
                    pool.push(STRING_FLAG);
                    pool.push(TITLE_POSITION);
                    push_string(&mut pool, title)?;
                    pool.push(0xff);
                    last_title = Some(pointer);
                    pointer
                }
            };

            let names = (pool_base + pool.len() - BANK_OFFSET) as u16;
            pool.push(STRING_FLAG);
            pool.push(NAME1_POSITION);
            push_string(&mut pool, &page.name1)?;

            if !page.name2.is_empty() {
                pool.push(STRING_FLAG);
                pool.push(NAME2_POSITION);
                push_string(&mut pool, &page.name2)?;
            }
            pool.push(0xff);

            table.extend(title.to_le_bytes());
            table.extend(names.to_le_bytes());
        }

        table.extend(pool);
        Ok(table)
    }

    /// Write the pages back into an image
    pub(crate) fn commit(&self, image: &mut Image) -> Result<(), CreditsEncodeError> {
        let block = self.serialize()?;
        image.write(TABLE_ADDRESS, &block);
        Ok(())
    }
}

fn parse_string(image: &Image, address: usize) -> String {
    if image.get(address) != STRING_FLAG {
        return String::new();
    }

    let length = image.get(address + 2) as usize;
    (0..length)
        .map(|i| {
            let byte = image.get(address + 3 + i);
            decode_char(byte).unwrap_or_else(|| {
                warn!("cannot decode credits byte {byte:#04x}, substituting");
                '?'
            })
        })
        .collect()
}

fn push_string(pool: &mut Vec<u8>, s: &str) -> Result<(), CreditsEncodeError> {
    let length = u8::try_from(s.len()).map_err(|_| CreditsEncodeError::StringTooLong {
        length: s.len(),
    })?;

    pool.push(length);
    for ch in s.chars() {
        pool.push(encode_char(ch).ok_or(CreditsEncodeError::UnencodableCharacter { ch })?);
    }

    Ok(())
}

fn decode_char(byte: u8) -> Option<char> {
    match byte {
        0x07 => Some('!'),
        0xce => Some('/'),
        0xcf => Some('.'),
        0xf4 | 0xf5 => Some(' '),
        0xd0..=0xd9 => Some((byte - 0xa0) as char),
        0xda..=0xf3 => Some((byte - 0x99) as char),
        _ => None,
    }
}

fn encode_char(ch: char) -> Option<u8> {
    match ch {
        ' ' => Some(0xf4),
        '.' => Some(0xcf),
        '/' => Some(0xce),
        '!' => Some(0x07),
        '0'..='9' => Some(ch as u8 + 0xa0),
        'A'..='Z' => Some(ch as u8 + 0x99),
        'a'..='z' => Some(ch as u8 + 0x79),
        _ => None,
    }
}

/// Errors that can occur encoding credits text back into image bytes
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CreditsEncodeError {
    /// A character outside the credits character set
    #[error("character {ch:?} cannot be encoded in the credits character set")]
    UnencodableCharacter { ch: char },

    /// A string longer than its length byte can express
    #[error("credits string of {length} characters is too long")]
    StringTooLong { length: usize },
}
