//! SMS-DELIVER PDU decoding (3GPP TS 23.040 / 23.038)
//!
//! Handles the subset an incoming-SMS broadcast carries:
//! - service centre address prefix
//! - numeric and alphanumeric originating addresses
//! - GSM 7-bit default alphabet with the extension table, 8-bit and UCS-2
//! - user data header skipping (concatenation, ports, ...)
//! - service centre timestamp with its timezone

use chrono::{FixedOffset, NaiveDate, TimeZone};

use nbridge_core::prelude::*;
use nbridge_core::SmsEvent;

// ─────────────────────────────────────────────────────────
// GSM 03.38 Alphabet
// ─────────────────────────────────────────────────────────

const ESCAPE: u8 = 0x1B;

#[rustfmt::skip]
const GSM7_BASIC: [char; 128] = [
    '@', '£', '$', '¥', 'è', 'é', 'ù', 'ì', 'ò', 'Ç', '\n', 'Ø', 'ø', '\r', 'Å', 'å',
    'Δ', '_', 'Φ', 'Γ', 'Λ', 'Ω', 'Π', 'Ψ', 'Σ', 'Θ', 'Ξ', ' ', 'Æ', 'æ', 'ß', 'É',
    ' ', '!', '"', '#', '¤', '%', '&', '\'', '(', ')', '*', '+', ',', '-', '.', '/',
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', ':', ';', '<', '=', '>', '?',
    '¡', 'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M', 'N', 'O',
    'P', 'Q', 'R', 'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z', 'Ä', 'Ö', 'Ñ', 'Ü', '§',
    '¿', 'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm', 'n', 'o',
    'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z', 'ä', 'ö', 'ñ', 'ü', 'à',
];

/// Extension table entries reached through the escape septet
fn gsm7_extension(septet: u8) -> Option<char> {
    let c = match septet {
        0x0A => '\u{0C}',
        0x14 => '^',
        0x28 => '{',
        0x29 => '}',
        0x2F => '\\',
        0x3C => '[',
        0x3D => '~',
        0x3E => ']',
        0x40 => '|',
        0x65 => '€',
        _ => return None,
    };
    Some(c)
}

/// Map a run of unpacked septets to text, resolving escapes.
/// Unknown extension codes fall back to the basic table.
fn septets_to_string(septets: impl IntoIterator<Item = u8>) -> String {
    let mut text = String::new();
    let mut escaped = false;
    for septet in septets {
        let septet = septet & 0x7F;
        if escaped {
            escaped = false;
            text.push(gsm7_extension(septet).unwrap_or(GSM7_BASIC[septet as usize]));
        } else if septet == ESCAPE {
            escaped = true;
        } else {
            text.push(GSM7_BASIC[septet as usize]);
        }
    }
    text
}

/// Unpack `count` septets from packed user data, skipping the first `skip`
fn unpack_septets(data: &[u8], count: usize, skip: usize) -> Result<Vec<u8>> {
    let needed = (count * 7 + 7) / 8;
    if data.len() < needed {
        return Err(Error::pdu(format!(
            "user data holds {} octets, {} septets need {}",
            data.len(),
            count,
            needed
        )));
    }

    let septets = (skip..count)
        .map(|i| {
            let bit = i * 7;
            let byte = bit / 8;
            let shift = bit % 8;
            let lo = data[byte] as u16;
            let hi = data.get(byte + 1).copied().unwrap_or(0) as u16;
            (((lo | (hi << 8)) >> shift) & 0x7F) as u8
        })
        .collect();
    Ok(septets)
}

// ─────────────────────────────────────────────────────────
// PDU Reader
// ─────────────────────────────────────────────────────────

struct PduReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> PduReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn octet(&mut self, field: &str) -> Result<u8> {
        Ok(self.take(1, field)?[0])
    }

    fn take(&mut self, len: usize, field: &str) -> Result<&'a [u8]> {
        let end = self.pos + len;
        if end > self.bytes.len() {
            return Err(Error::pdu(format!(
                "truncated at {} (need {} octets at offset {})",
                field, len, self.pos
            )));
        }
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn rest(&mut self) -> &'a [u8] {
        let slice = &self.bytes[self.pos..];
        self.pos = self.bytes.len();
        slice
    }
}

// ─────────────────────────────────────────────────────────
// Addresses
// ─────────────────────────────────────────────────────────

fn bcd_digit(nibble: u8) -> Option<char> {
    match nibble {
        0..=9 => Some((b'0' + nibble) as char),
        0xA => Some('*'),
        0xB => Some('#'),
        0xC => Some('a'),
        0xD => Some('b'),
        0xE => Some('c'),
        _ => None,
    }
}

/// Semi-octet digits, low nibble first; `F` is filler
fn decode_bcd(bytes: &[u8]) -> String {
    bytes
        .iter()
        .flat_map(|b| [b & 0x0F, b >> 4])
        .filter_map(bcd_digit)
        .collect()
}

fn is_international(toa: u8) -> bool {
    toa & 0x70 == 0x10
}

fn is_alphanumeric(toa: u8) -> bool {
    (toa >> 4) & 0x07 == 0x05
}

fn with_prefix(toa: u8, digits: String) -> String {
    if is_international(toa) && !digits.is_empty() {
        format!("+{}", digits)
    } else {
        digits
    }
}

fn read_service_center(reader: &mut PduReader<'_>) -> Result<Option<String>> {
    let len = reader.octet("SMSC length")? as usize;
    if len == 0 {
        return Ok(None);
    }
    let field = reader.take(len, "SMSC address")?;
    let toa = field[0];
    let digits = decode_bcd(&field[1..]);
    if digits.is_empty() {
        return Ok(None);
    }
    Ok(Some(with_prefix(toa, digits)))
}

fn read_originating_address(reader: &mut PduReader<'_>) -> Result<String> {
    let digit_count = reader.octet("originating address length")? as usize;
    let toa = reader.octet("originating address type")?;
    let field = reader.take((digit_count + 1) / 2, "originating address")?;

    if is_alphanumeric(toa) {
        let septets = digit_count * 4 / 7;
        return Ok(septets_to_string(unpack_septets(field, septets, 0)?));
    }

    let digits: String = decode_bcd(field).chars().take(digit_count).collect();
    Ok(with_prefix(toa, digits))
}

// ─────────────────────────────────────────────────────────
// Data Coding
// ─────────────────────────────────────────────────────────

/// Character set of the user data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Gsm7,
    EightBit,
    Ucs2,
}

impl Encoding {
    /// Resolve the data coding scheme octet (TS 23.038 §4)
    pub fn from_dcs(dcs: u8) -> Result<Self> {
        match dcs >> 4 {
            0x0..=0x7 => {
                if dcs & 0x20 != 0 {
                    return Err(Error::pdu("compressed user data is not supported"));
                }
                Ok(match (dcs >> 2) & 0x03 {
                    0b01 => Encoding::EightBit,
                    0b10 => Encoding::Ucs2,
                    _ => Encoding::Gsm7,
                })
            }
            0xC | 0xD => Ok(Encoding::Gsm7),
            0xE => Ok(Encoding::Ucs2),
            0xF if dcs & 0x04 != 0 => Ok(Encoding::EightBit),
            0xF => Ok(Encoding::Gsm7),
            _ => Err(Error::pdu(format!("reserved data coding scheme {:#04x}", dcs))),
        }
    }
}

// ─────────────────────────────────────────────────────────
// Timestamp
// ─────────────────────────────────────────────────────────

fn semi_octet(b: u8) -> u32 {
    (b & 0x0F) as u32 * 10 + (b >> 4) as u32
}

/// Service centre timestamp to epoch milliseconds
fn decode_timestamp(scts: &[u8]) -> Result<i64> {
    let yy = semi_octet(scts[0]) as i32;
    let year = if yy >= 90 { 1900 + yy } else { 2000 + yy };

    let tz = scts[6];
    let quarters = (tz & 0x07) as i32 * 10 + (tz >> 4) as i32;
    let offset_secs = quarters * 15 * 60;
    let offset_secs = if tz & 0x08 != 0 { -offset_secs } else { offset_secs };

    let naive = NaiveDate::from_ymd_opt(year, semi_octet(scts[1]), semi_octet(scts[2]))
        .and_then(|date| {
            date.and_hms_opt(
                semi_octet(scts[3]),
                semi_octet(scts[4]),
                semi_octet(scts[5]),
            )
        })
        .ok_or_else(|| Error::pdu("invalid service centre timestamp"))?;

    let offset = FixedOffset::east_opt(offset_secs)
        .ok_or_else(|| Error::pdu(format!("invalid timezone offset {}s", offset_secs)))?;

    offset
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.timestamp_millis())
        .ok_or_else(|| Error::pdu("ambiguous service centre timestamp"))
}

// ─────────────────────────────────────────────────────────
// User Data
// ─────────────────────────────────────────────────────────

fn header_octets(data: &[u8], has_header: bool) -> Result<usize> {
    if !has_header {
        return Ok(0);
    }
    let udhl = *data
        .first()
        .ok_or_else(|| Error::pdu("missing user data header length"))? as usize;
    let total = udhl + 1;
    if total > data.len() {
        return Err(Error::pdu("user data header exceeds user data"));
    }
    Ok(total)
}

fn decode_user_data(
    encoding: Encoding,
    udl: usize,
    data: &[u8],
    has_header: bool,
) -> Result<String> {
    let header = header_octets(data, has_header)?;

    match encoding {
        Encoding::Gsm7 => {
            // Header plus fill bits, rounded up to a septet boundary
            let skip = (header * 8 + 6) / 7;
            if skip > udl {
                return Err(Error::pdu("user data header longer than user data"));
            }
            Ok(septets_to_string(unpack_septets(data, udl, skip)?))
        }
        Encoding::EightBit => {
            let body = octet_body(data, udl, header)?;
            // GSM 8-bit unpacked; 0xFF is padding
            Ok(septets_to_string(
                body.iter().copied().take_while(|b| *b != 0xFF),
            ))
        }
        Encoding::Ucs2 => {
            let body = octet_body(data, udl, header)?;
            let units = body
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]));
            Ok(char::decode_utf16(units)
                .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
                .collect())
        }
    }
}

fn octet_body(data: &[u8], udl: usize, header: usize) -> Result<&[u8]> {
    if udl > data.len() {
        return Err(Error::pdu(format!(
            "user data length {} exceeds {} available octets",
            udl,
            data.len()
        )));
    }
    if header > udl {
        return Err(Error::pdu("user data header longer than user data"));
    }
    Ok(&data[header..udl])
}

// ─────────────────────────────────────────────────────────
// Message
// ─────────────────────────────────────────────────────────

/// A decoded SMS-DELIVER
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmsDeliver {
    pub service_center_address: Option<String>,
    pub originating_address: String,
    pub protocol_id: u8,
    pub encoding: Encoding,
    /// Service centre timestamp in epoch milliseconds
    pub timestamp_millis: i64,
    pub body: String,
}

impl SmsDeliver {
    /// Decode a single SMS-DELIVER PDU including its SMSC prefix
    pub fn decode(pdu: &[u8]) -> Result<Self> {
        let mut reader = PduReader::new(pdu);

        let service_center_address = read_service_center(&mut reader)?;

        let first_octet = reader.octet("first octet")?;
        if first_octet & 0x03 != 0x00 {
            return Err(Error::pdu(format!(
                "message type {} is not SMS-DELIVER",
                first_octet & 0x03
            )));
        }
        let has_header = first_octet & 0x40 != 0;

        let originating_address = read_originating_address(&mut reader)?;
        let protocol_id = reader.octet("protocol identifier")?;
        let encoding = Encoding::from_dcs(reader.octet("data coding scheme")?)?;
        let timestamp_millis = decode_timestamp(reader.take(7, "timestamp")?)?;
        let udl = reader.octet("user data length")? as usize;
        let body = decode_user_data(encoding, udl, reader.rest(), has_header)?;

        Ok(Self {
            service_center_address,
            originating_address,
            protocol_id,
            encoding,
            timestamp_millis,
            body,
        })
    }

    pub fn into_event(self) -> SmsEvent {
        SmsEvent {
            from: self.originating_address,
            message: self.body,
            timestamp: self.timestamp_millis,
            service_center_address: self.service_center_address,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn pdu(hex_str: &str) -> Vec<u8> {
        hex::decode(hex_str).unwrap()
    }

    fn utc_millis(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> i64 {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s)
            .unwrap()
            .timestamp_millis()
    }

    #[test]
    fn test_decode_gsm7_international_sender() {
        let sms = SmsDeliver::decode(&pdu(
            "07911326040000F0040B911346610089F60000208062917314080CC8F71D14969741F977FD07",
        ))
        .unwrap();

        assert_eq!(sms.service_center_address.as_deref(), Some("+31624000000"));
        assert_eq!(sms.originating_address, "+31641600986");
        assert_eq!(sms.encoding, Encoding::Gsm7);
        assert_eq!(sms.body, "How are you?");
        assert_eq!(sms.timestamp_millis, utc_millis(2002, 8, 26, 19, 37, 41));
    }

    #[test]
    fn test_decode_alphanumeric_sender_with_extension_chars() {
        let sms = SmsDeliver::decode(&pdu(
            "07911326040000F0040CD0C7F7FBCC2E030000423051010300800AC8346853DEA0F09B14",
        ))
        .unwrap();

        assert_eq!(sms.originating_address, "Google");
        assert_eq!(sms.body, "Hi €{x}");
        // +02:00
        assert_eq!(sms.timestamp_millis, utc_millis(2024, 3, 15, 8, 30, 0));
    }

    #[test]
    fn test_decode_ucs2_with_header_and_negative_timezone() {
        let sms = SmsDeliver::decode(&pdu(
            "00440B915155214365F700083221133295950A120500032A0201041F04400438043204350442",
        ))
        .unwrap();

        assert_eq!(sms.service_center_address, None);
        assert_eq!(sms.originating_address, "+15551234567");
        assert_eq!(sms.encoding, Encoding::Ucs2);
        assert_eq!(sms.body, "Привет");
        // -05:00
        assert_eq!(sms.timestamp_millis, utc_millis(2024, 1, 1, 4, 59, 59));
    }

    #[test]
    fn test_decode_gsm7_skips_user_data_header() {
        let sms = SmsDeliver::decode(&pdu(
            "0044048121430000322113329595000F0500032A0202E061391D44BFBF01",
        ))
        .unwrap();

        assert_eq!(sms.originating_address, "1234");
        assert_eq!(sms.body, "part two");
    }

    #[test]
    fn test_decode_eight_bit() {
        let sms = SmsDeliver::decode(&pdu("00040481214300043210100000000003414243")).unwrap();
        assert_eq!(sms.encoding, Encoding::EightBit);
        assert_eq!(sms.body, "ABC");
    }

    #[test]
    fn test_truncated_pdu_is_an_error() {
        let full = pdu("07911326040000F0040B911346610089F60000208062917314080CC8F71D14969741F977FD07");
        for len in [0, 1, 9, 14, 20, 30] {
            let err = SmsDeliver::decode(&full[..len]).unwrap_err();
            assert!(matches!(err, Error::Pdu { .. }), "len {}: {:?}", len, err);
        }
    }

    #[test]
    fn test_non_deliver_message_type_is_rejected() {
        // First octet 0x01 = SMS-SUBMIT
        let err = SmsDeliver::decode(&pdu("0001000B911346610089F6000000")).unwrap_err();
        assert!(err.to_string().contains("SMS-DELIVER"));
    }

    #[test]
    fn test_dcs_groups() {
        assert_eq!(Encoding::from_dcs(0x00).unwrap(), Encoding::Gsm7);
        assert_eq!(Encoding::from_dcs(0x04).unwrap(), Encoding::EightBit);
        assert_eq!(Encoding::from_dcs(0x08).unwrap(), Encoding::Ucs2);
        assert_eq!(Encoding::from_dcs(0xC8).unwrap(), Encoding::Gsm7);
        assert_eq!(Encoding::from_dcs(0xE0).unwrap(), Encoding::Ucs2);
        assert_eq!(Encoding::from_dcs(0xF4).unwrap(), Encoding::EightBit);
        assert_eq!(Encoding::from_dcs(0xF0).unwrap(), Encoding::Gsm7);
        assert!(Encoding::from_dcs(0x20).is_err());
        assert!(Encoding::from_dcs(0x80).is_err());
    }

    #[test]
    fn test_septets_to_string_unknown_extension_falls_back() {
        // ESC followed by 'A' (0x41) has no extension mapping
        assert_eq!(septets_to_string([ESCAPE, 0x41]), "A");
        assert_eq!(septets_to_string([0x00, 0x02]), "@$");
    }

    #[test]
    fn test_into_event() {
        let event = SmsDeliver::decode(&pdu(
            "07911326040000F0040B911346610089F60000208062917314080CC8F71D14969741F977FD07",
        ))
        .unwrap()
        .into_event();

        assert_eq!(event.from, "+31641600986");
        assert_eq!(event.message, "How are you?");
        assert_eq!(event.service_center_address.as_deref(), Some("+31624000000"));
    }
}
