//! Synthesis of unique RFC 5322 test messages.
//!
//! Every payload embeds its index in the subject, the `Message-ID` and the body,
//! together with a microsecond timestamp and random filler text. Synthesis keeps
//! no shared state, so workers call it concurrently without locking.

use chrono::Local;
use rand::Rng;

/// Characters used for filler text. The repeated spaces give word-like gaps.
const FILLER_ALPHABET: &[u8] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789     ";

/// Length of the random subject suffix.
pub const SUBJECT_FILLER_LEN: usize = 10;

/// Length of the random body payload line.
pub const BODY_FILLER_LEN: usize = 200;

/// A synthesized message ready for the DATA phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    /// Job index this message was built for.
    pub index: u64,
    /// Envelope and header sender.
    pub sender: String,
    /// Envelope and header recipient.
    pub recipient: String,
    /// Value of the `Message-ID` header, including angle brackets.
    pub message_id: String,
    headers: Vec<(String, String)>,
    body: String,
}

impl Payload {
    /// Append an extra header line after the standard ones.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Look up the first header with the given name (case-insensitive).
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Message body with CRLF line endings.
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Full message text (headers, blank line, body) with CRLF line endings.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(self.body.len() + 256);
        for (name, value) in &self.headers {
            out.push_str(name);
            out.push_str(": ");
            out.push_str(value);
            out.push_str("\r\n");
        }
        out.push_str("\r\n");
        out.push_str(&self.body);
        out
    }
}

/// Build the message for `index` using the thread-local RNG.
#[must_use]
pub fn synthesize(index: u64, sender: &str, recipient: &str) -> Payload {
    synthesize_with_rng(index, sender, recipient, &mut rand::rng())
}

/// Build the message for `index`, drawing filler text from `rng`.
pub fn synthesize_with_rng<R: Rng>(
    index: u64,
    sender: &str,
    recipient: &str,
    rng: &mut R,
) -> Payload {
    let now = Local::now();
    let message_id = format!("<loadtest-{index}-{}@local>", now.timestamp_micros());
    let subject = format!(
        "owlmail load test #{index} {}",
        random_text(rng, SUBJECT_FILLER_LEN)
    );

    let headers = vec![
        ("From".to_string(), sender.to_string()),
        ("To".to_string(), recipient.to_string()),
        ("Subject".to_string(), subject),
        ("Message-ID".to_string(), message_id.clone()),
        ("Date".to_string(), now.to_rfc2822()),
        ("MIME-Version".to_string(), "1.0".to_string()),
        (
            "Content-Type".to_string(),
            "text/plain; charset=\"utf-8\"".to_string(),
        ),
        ("Content-Transfer-Encoding".to_string(), "7bit".to_string()),
    ];

    let body = format!(
        "Index: {index}\r\nTime: {}\r\nPayload: {}\r\n",
        now.format("%Y-%m-%d %H:%M:%S"),
        random_text(rng, BODY_FILLER_LEN),
    );

    Payload {
        index,
        sender: sender.to_string(),
        recipient: recipient.to_string(),
        message_id,
        headers,
        body,
    }
}

/// Random filler of up to `len` characters, trimmed. Falls back to `hello`
/// when the draw is all whitespace.
pub fn random_text<R: Rng>(rng: &mut R, len: usize) -> String {
    let raw: String = (0..len)
        .map(|_| char::from(FILLER_ALPHABET[rng.random_range(0..FILLER_ALPHABET.len())]))
        .collect();
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        "hello".to_string()
    } else {
        trimmed.to_string()
    }
}
