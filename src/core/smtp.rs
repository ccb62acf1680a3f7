//! Plain-TCP SMTP client used as the default send executor.
//!
//! One transaction per job: connect, greeting, EHLO (falling back to HELO),
//! MAIL FROM, RCPT TO, DATA, QUIT. The whole exchange runs under the target's
//! timeout. No TLS, no authentication, no pipelining.

use std::io;

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::trace;

use crate::core::error::SendError;
use crate::core::executor::SendExecutor;
use crate::core::job::Target;
use crate::core::message::Payload;

/// Name announced in EHLO/HELO when none is configured.
pub const DEFAULT_HELO_NAME: &str = "localhost";

/// A parsed (possibly multi-line) server reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Three-digit status code.
    pub code: u16,
    /// Text of each line, without the code and separator.
    pub lines: Vec<String>,
}

impl Reply {
    /// 5xx.
    #[must_use]
    pub const fn is_permanent_failure(&self) -> bool {
        self.code >= 500 && self.code < 600
    }

    fn summary(&self) -> String {
        format!("{} {}", self.code, self.lines.join(" / "))
    }
}

/// SMTP send executor over plain TCP.
#[derive(Debug, Clone)]
pub struct SmtpExecutor {
    helo_name: String,
}

impl Default for SmtpExecutor {
    fn default() -> Self {
        Self::new(DEFAULT_HELO_NAME)
    }
}

impl SmtpExecutor {
    /// Create an executor announcing itself as `helo_name`.
    pub fn new(helo_name: impl Into<String>) -> Self {
        Self {
            helo_name: helo_name.into(),
        }
    }

    async fn transaction(&self, target: &Target, payload: &Payload) -> Result<(), SendError> {
        let mut stream = TcpStream::connect((target.host.as_str(), target.port))
            .await
            .map_err(|e| SendError::Connect(format!("{target}: {e}")))?;
        let (read_half, mut writer) = stream.split();
        let mut reader = BufReader::new(read_half);

        let greeting = read_reply(&mut reader).await?;
        expect(&greeting, &[220], "greeting")?;

        let ehlo = command(&mut reader, &mut writer, &format!("EHLO {}", self.helo_name)).await?;
        if ehlo.is_permanent_failure() {
            trace!(reply = %ehlo.summary(), "EHLO refused, falling back to HELO");
            let helo = command(&mut reader, &mut writer, &format!("HELO {}", self.helo_name)).await?;
            expect(&helo, &[250], "HELO")?;
        } else {
            expect(&ehlo, &[250], "EHLO")?;
        }

        let mail = command(&mut reader, &mut writer, &format!("MAIL FROM:<{}>", payload.sender)).await?;
        expect(&mail, &[250], "MAIL FROM")?;

        let rcpt = command(&mut reader, &mut writer, &format!("RCPT TO:<{}>", payload.recipient)).await?;
        expect(&rcpt, &[250, 251], "RCPT TO")?;

        let data = command(&mut reader, &mut writer, "DATA").await?;
        expect(&data, &[354], "DATA")?;

        writer
            .write_all(encode_data(&payload.render()).as_bytes())
            .await
            .map_err(io_error)?;
        writer.flush().await.map_err(io_error)?;
        let accepted = read_reply(&mut reader).await?;
        expect(&accepted, &[250], "message body")?;

        // The message is accepted at this point; a sloppy QUIT does not fail the job.
        if let Err(e) = command(&mut reader, &mut writer, "QUIT").await {
            trace!(error = %e, "QUIT not acknowledged");
        }
        Ok(())
    }
}

#[async_trait]
impl SendExecutor for SmtpExecutor {
    async fn send(&self, target: &Target, payload: &Payload) -> Result<(), SendError> {
        match tokio::time::timeout(target.timeout, self.transaction(target, payload)).await {
            Ok(result) => result,
            Err(_) => Err(SendError::Timeout(target.timeout)),
        }
    }
}

/// Read one reply, following `NNN-` continuation lines until `NNN `.
///
/// # Errors
///
/// `Connect` on I/O failure or EOF, `Protocol` on a malformed line.
pub async fn read_reply<R>(reader: &mut R) -> Result<Reply, SendError>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = Vec::new();
    loop {
        let mut raw = String::new();
        let n = reader.read_line(&mut raw).await.map_err(io_error)?;
        if n == 0 {
            return Err(SendError::Connect("connection closed by server".to_string()));
        }
        let line = raw.trim_end_matches(['\r', '\n']);
        let (code, rest) = match line.get(..3) {
            Some(digits) if digits.bytes().all(|b| b.is_ascii_digit()) => (digits, &line[3..]),
            _ => return Err(SendError::Protocol(format!("malformed reply line: {line:?}"))),
        };
        let code: u16 = code
            .parse()
            .map_err(|_| SendError::Protocol(format!("bad reply code: {code:?}")))?;
        let continued = rest.starts_with('-');
        lines.push(rest.get(1..).unwrap_or_default().to_string());
        if !continued {
            return Ok(Reply { code, lines });
        }
    }
}

/// Encode a message for the DATA phase: CRLF line endings, leading dots
/// doubled, terminated by `.` on its own line.
#[must_use]
pub fn encode_data(message: &str) -> String {
    let mut out = String::with_capacity(message.len() + 8);
    for line in message.lines() {
        if line.starts_with('.') {
            out.push('.');
        }
        out.push_str(line);
        out.push_str("\r\n");
    }
    out.push_str(".\r\n");
    out
}

async fn command<R, W>(reader: &mut R, writer: &mut W, line: &str) -> Result<Reply, SendError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    trace!(command = line, "SMTP >");
    writer
        .write_all(format!("{line}\r\n").as_bytes())
        .await
        .map_err(io_error)?;
    writer.flush().await.map_err(io_error)?;
    let reply = read_reply(reader).await?;
    trace!(code = reply.code, "SMTP <");
    Ok(reply)
}

fn expect(reply: &Reply, codes: &[u16], stage: &str) -> Result<(), SendError> {
    if codes.contains(&reply.code) {
        Ok(())
    } else {
        Err(SendError::Protocol(format!("{stage} rejected: {}", reply.summary())))
    }
}

#[allow(clippy::needless_pass_by_value)]
fn io_error(e: io::Error) -> SendError {
    SendError::Connect(format!("connection lost: {e}"))
}
