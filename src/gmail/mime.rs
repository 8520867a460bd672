//! MIME message construction and base64url codec
//!
//! Outbound messages are serialized to RFC822 text and encoded with the
//! URL-safe base64 alphabet without padding, as the Gmail `raw` send
//! contract requires. Inbound message parts may arrive padded or unpadded;
//! the decoder re-pads before decoding and never fails the surrounding tool
//! call on malformed content.

use base64::engine::general_purpose::{STANDARD, URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine;

use crate::gmail::types::{Message, MessagePart};

/// An outbound plain-text email.
///
/// Recipient fields are comma-separated address lists. Constructed, encoded,
/// sent, and discarded within one tool call.
#[derive(Debug, Clone)]
pub struct OutboundMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
    pub cc: Option<String>,
    pub bcc: Option<String>,
}

/// Encode text for a MIME header (RFC 2047).
///
/// Plain ASCII passes through; anything else becomes a UTF-8 base64
/// encoded-word so the header block stays 7-bit clean.
pub fn encode_mime_header(text: &str) -> String {
    if text.chars().all(|c| c.is_ascii() && c != '\r' && c != '\n') {
        return text.to_string();
    }

    format!("=?UTF-8?B?{}?=", STANDARD.encode(text.as_bytes()))
}

/// Build the RFC822 message and encode it for the Gmail API.
///
/// The output uses the URL-safe alphabet with trailing `=` stripped.
pub fn encode_outbound(msg: &OutboundMessage) -> String {
    let mut lines = Vec::new();

    lines.push(format!("To: {}", msg.to));
    if let Some(ref cc) = msg.cc {
        lines.push(format!("Cc: {}", cc));
    }
    if let Some(ref bcc) = msg.bcc {
        lines.push(format!("Bcc: {}", bcc));
    }
    lines.push(format!("Subject: {}", encode_mime_header(&msg.subject)));
    lines.push("MIME-Version: 1.0".to_string());
    lines.push("Content-Type: text/plain; charset=utf-8".to_string());
    lines.push("Content-Transfer-Encoding: 8bit".to_string());
    lines.push(String::new());
    lines.push(msg.body.clone());

    let raw = lines.join("\r\n");
    URL_SAFE_NO_PAD.encode(raw.as_bytes())
}

/// Decode base64url data from the Gmail API.
///
/// The wire format may include or omit padding, so the input is re-padded to
/// a multiple of 4 before decoding.
pub fn decode_base64url(data: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let mut padded = data.to_string();
    while padded.len() % 4 != 0 {
        padded.push('=');
    }
    URL_SAFE.decode(padded.as_bytes())
}

/// Decode a base64url message part to text.
///
/// Malformed base64 yields an empty string; undecodable byte sequences
/// become replacement characters. Never an error.
pub fn decode_text(data: &str) -> String {
    match decode_base64url(data) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(e) => {
            tracing::debug!("failed to decode base64url message part: {}", e);
            String::new()
        }
    }
}

/// Find a header value by name (case-insensitive)
pub fn find_header<'a>(part: &'a MessagePart, name: &str) -> Option<&'a str> {
    part.headers
        .iter()
        .find(|h| h.name.eq_ignore_ascii_case(name))
        .map(|h| h.value.as_str())
}

/// Best-effort plain-text body of a message.
///
/// First `text/plain` part when the payload is multipart, else the top-level
/// body. `None` when no matching part carries data.
pub fn extract_plain_text(message: &Message) -> Option<String> {
    let payload = message.payload.as_ref()?;

    if !payload.parts.is_empty() {
        let part = payload
            .parts
            .iter()
            .find(|p| p.mime_type.as_deref() == Some("text/plain"))?;
        let data = part.body.as_ref()?.data.as_ref()?;
        return Some(decode_text(data));
    }

    let data = payload.body.as_ref()?.data.as_ref()?;
    Some(decode_text(data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gmail::types::{Header, MessagePartBody};

    fn outbound() -> OutboundMessage {
        OutboundMessage {
            to: "a@example.com, b@example.com".to_string(),
            subject: "Status update".to_string(),
            body: "All systems nominal.".to_string(),
            cc: Some("c@example.com".to_string()),
            bcc: None,
        }
    }

    #[test]
    fn test_encode_outbound_headers() {
        let encoded = encode_outbound(&outbound());
        let decoded = String::from_utf8(decode_base64url(&encoded).unwrap()).unwrap();
        assert!(decoded.contains("To: a@example.com, b@example.com"));
        assert!(decoded.contains("Cc: c@example.com"));
        assert!(!decoded.contains("Bcc:"));
        assert!(decoded.contains("Subject: Status update"));
        assert!(decoded.contains("Content-Type: text/plain; charset=utf-8"));
        assert!(decoded.ends_with("All systems nominal."));
    }

    #[test]
    fn test_encode_mime_header_ascii_passthrough() {
        assert_eq!(encode_mime_header("Status update"), "Status update");
    }

    #[test]
    fn test_encode_mime_header_unicode() {
        let encoded = encode_mime_header("Zpráva pro tým");
        assert!(encoded.starts_with("=?UTF-8?B?"));
        assert!(encoded.ends_with("?="));
        assert!(encoded.is_ascii());
    }

    #[test]
    fn test_encode_outbound_non_ascii_subject_is_encoded_word() {
        let mut msg = outbound();
        msg.subject = "Café ☕".to_string();
        let decoded =
            String::from_utf8(decode_base64url(&encode_outbound(&msg)).unwrap()).unwrap();

        let subject_line = decoded
            .split("\r\n")
            .find(|l| l.starts_with("Subject: "))
            .unwrap();
        assert!(subject_line.is_ascii(), "raw UTF-8 in header: {subject_line}");
        assert_eq!(
            subject_line,
            format!("Subject: =?UTF-8?B?{}?=", STANDARD.encode("Café ☕"))
        );
    }

    #[test]
    fn test_encode_outbound_never_padded() {
        // Vary the body length so the serialized byte count hits every
        // residue class mod 3.
        for len in 0..6 {
            let mut msg = outbound();
            msg.body = "x".repeat(len);
            let encoded = encode_outbound(&msg);
            assert!(!encoded.contains('='), "padding found for body len {len}");
        }
    }

    #[test]
    fn test_decode_roundtrip_arbitrary_bytes() {
        // Lengths covering 0, 1, and 2 chars of stripped padding.
        let cases: Vec<Vec<u8>> = vec![
            vec![],
            vec![0xff],
            vec![0xff, 0x00],
            vec![0xff, 0x00, 0x7f],
            vec![0xde, 0xad, 0xbe, 0xef],
            (0..=255u8).collect(),
        ];
        for bytes in cases {
            let unpadded = URL_SAFE_NO_PAD.encode(&bytes);
            assert_eq!(decode_base64url(&unpadded).unwrap(), bytes);
            let padded = URL_SAFE.encode(&bytes);
            assert_eq!(decode_base64url(&padded).unwrap(), bytes);
        }
    }

    #[test]
    fn test_decode_text_malformed_base64() {
        assert_eq!(decode_text("!!!not base64!!!"), "");
    }

    #[test]
    fn test_decode_text_invalid_utf8() {
        let encoded = URL_SAFE_NO_PAD.encode([0xff, 0xfe, b'h', b'i']);
        let decoded = decode_text(&encoded);
        assert!(decoded.contains('\u{fffd}'));
        assert!(decoded.contains("hi"));
    }

    fn part_with_data(mime_type: &str, text: &str) -> MessagePart {
        MessagePart {
            mime_type: Some(mime_type.to_string()),
            body: Some(MessagePartBody {
                data: Some(URL_SAFE_NO_PAD.encode(text.as_bytes())),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_extract_plain_text_multipart() {
        let message = Message {
            id: "m1".to_string(),
            payload: Some(MessagePart {
                mime_type: Some("multipart/alternative".to_string()),
                parts: vec![
                    part_with_data("text/html", "<b>hi</b>"),
                    part_with_data("text/plain", "hi"),
                ],
                ..Default::default()
            }),
            ..Default::default()
        };
        assert_eq!(extract_plain_text(&message), Some("hi".to_string()));
    }

    #[test]
    fn test_extract_plain_text_top_level() {
        let message = Message {
            id: "m1".to_string(),
            payload: Some(part_with_data("text/plain", "top-level body")),
            ..Default::default()
        };
        assert_eq!(
            extract_plain_text(&message),
            Some("top-level body".to_string())
        );
    }

    #[test]
    fn test_extract_plain_text_none_without_match() {
        let message = Message {
            id: "m1".to_string(),
            payload: Some(MessagePart {
                mime_type: Some("multipart/mixed".to_string()),
                parts: vec![part_with_data("text/html", "<b>only html</b>")],
                ..Default::default()
            }),
            ..Default::default()
        };
        assert_eq!(extract_plain_text(&message), None);
    }

    #[test]
    fn test_find_header_case_insensitive() {
        let part = MessagePart {
            headers: vec![Header {
                name: "SuBJect".to_string(),
                value: "hello".to_string(),
            }],
            ..Default::default()
        };
        assert_eq!(find_header(&part, "subject"), Some("hello"));
        assert_eq!(find_header(&part, "from"), None);
    }
}
