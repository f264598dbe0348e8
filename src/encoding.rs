//! Character encoding profiles for the two physical formats
//!
//! The disk profile is ASCII with the DIN 66003 German reference positions
//! for umlauts; the tape profile is EBCDIC with the CP273-family positions.
//! Both profiles cover only the DTAUS charset: digits, `A`-`Z`, space,
//! `.,&-+*%/$` and `Ä Ö Ü ß`.

/// Byte tables for one physical encoding.
#[derive(Debug)]
pub struct Encoding {
    pub name: &'static str,
    /// Padding byte for text fields and absent dates.
    pub space: u8,
    digits: [u8; 10],
    table: &'static [(char, u8)],
    ascii: bool,
}

/// DIN 66003 positions: umlauts occupy `[ \ ] ~`.
static ASCII_TABLE: [(char, u8); 13] = [
    (' ', 0x20),
    ('.', 0x2E),
    (',', 0x2C),
    ('&', 0x26),
    ('-', 0x2D),
    ('+', 0x2B),
    ('*', 0x2A),
    ('%', 0x25),
    ('/', 0x2F),
    ('$', 0x24),
    ('Ä', 0x5B),
    ('Ö', 0x5C),
    ('Ü', 0x5D),
];

/// CP273-family positions for the special characters.
static EBCDIC_TABLE: [(char, u8); 14] = [
    (' ', 0x40),
    ('.', 0x4B),
    (',', 0x6B),
    ('&', 0x50),
    ('-', 0x60),
    ('+', 0x4E),
    ('*', 0x5C),
    ('%', 0x6C),
    ('/', 0x61),
    ('$', 0x5B),
    ('Ä', 0x4A),
    ('Ö', 0xE0),
    ('Ü', 0x5A),
    ('ß', 0xA1),
];

pub static ASCII: Encoding = Encoding {
    name: "ascii",
    space: 0x20,
    digits: [
        0x30, 0x31, 0x32, 0x33, 0x34, 0x35, 0x36, 0x37, 0x38, 0x39,
    ],
    table: &ASCII_TABLE,
    ascii: true,
};

pub static EBCDIC: Encoding = Encoding {
    name: "ebcdic",
    space: 0x40,
    digits: [
        0xF0, 0xF1, 0xF2, 0xF3, 0xF4, 0xF5, 0xF6, 0xF7, 0xF8, 0xF9,
    ],
    table: &EBCDIC_TABLE,
    ascii: false,
};

impl Encoding {
    /// Wire byte for a decimal digit 0-9.
    pub fn digit(&self, value: u8) -> u8 {
        self.digits[value as usize]
    }

    pub fn is_digit(&self, byte: u8) -> bool {
        self.digit_value(byte).is_some()
    }

    /// Decimal value of a digit byte, if it is one.
    pub fn digit_value(&self, byte: u8) -> Option<u8> {
        self.digits.iter().position(|&d| d == byte).map(|i| i as u8)
    }

    /// Encodes one DTAUS character, or `None` if outside the charset.
    ///
    /// Lowercase letters are folded to uppercase; DTAUS text is uppercase
    /// on the wire.
    pub fn encode_char(&self, c: char) -> Option<u8> {
        let c = fold_upper(c);
        if let Some(d) = c.to_digit(10) {
            return Some(self.digit(d as u8));
        }
        if c.is_ascii_uppercase() {
            return Some(self.letter(c));
        }
        // 'ß' has no uppercase form in the charset; the ASCII profile maps
        // it to the DIN 66003 tilde position.
        if c == 'ß' && self.ascii {
            return Some(0x7E);
        }
        self.table.iter().find(|(ch, _)| *ch == c).map(|&(_, b)| b)
    }

    /// Decodes one wire byte, or `None` for a byte outside the charset.
    pub fn decode_char(&self, byte: u8) -> Option<char> {
        if let Some(d) = self.digit_value(byte) {
            return Some((b'0' + d) as char);
        }
        if let Some(c) = self.decode_letter(byte) {
            return Some(c);
        }
        if self.ascii && byte == 0x7E {
            return Some('ß');
        }
        self.table
            .iter()
            .find(|(_, b)| *b == byte)
            .map(|&(ch, _)| ch)
    }

    fn letter(&self, c: char) -> u8 {
        let ord = c as u8 - b'A';
        if self.ascii {
            b'A' + ord
        } else {
            // EBCDIC letters sit in three runs: A-I, J-R, S-Z.
            match c {
                'A'..='I' => 0xC1 + ord,
                'J'..='R' => 0xD1 + (ord - 9),
                _ => 0xE2 + (ord - 18),
            }
        }
    }

    fn decode_letter(&self, byte: u8) -> Option<char> {
        if self.ascii {
            return byte.is_ascii_uppercase().then(|| byte as char);
        }
        match byte {
            0xC1..=0xC9 => Some((b'A' + (byte - 0xC1)) as char),
            0xD1..=0xD9 => Some((b'J' + (byte - 0xD1)) as char),
            0xE2..=0xE9 => Some((b'S' + (byte - 0xE2)) as char),
            _ => None,
        }
    }
}

fn fold_upper(c: char) -> char {
    match c {
        'a'..='z' => c.to_ascii_uppercase(),
        'ä' => 'Ä',
        'ö' => 'Ö',
        'ü' => 'Ü',
        _ => c,
    }
}

/// True for characters allowed in DTAUS text fields.
pub fn is_dtaus_char(c: char) -> bool {
    let c = fold_upper(c);
    c.is_ascii_digit()
        || c.is_ascii_uppercase()
        || matches!(c, ' ' | '.' | ',' | '&' | '-' | '+' | '*' | '%' | '/' | '$')
        || matches!(c, 'Ä' | 'Ö' | 'Ü' | 'ß')
}

/// True for characters allowed in alphabetic-only fields (the label).
pub fn is_dtaus_alpha(c: char) -> bool {
    fold_upper(c).is_ascii_uppercase()
}
