//! The Assuan line protocol.
//!
//! Requests and responses are single lines terminated by a line
//! feed.  A request is a command verb with optional arguments; a
//! response is any number of `D` (data), `S` (status), `#`
//! (comment), and `INQUIRE` lines followed by exactly one `OK` or
//! `ERR` terminator.  Binary bytes travel percent-escaped.
//!
//! An `INQUIRE` reverses the direction: the server asks the client
//! for data, which the client supplies as `D` lines terminated by
//! `END`, or refuses with `CAN`.

use std::io::{BufRead, BufReader, Read, Write};

use crate::AgentError;
use crate::Error;
use crate::Result;

const TRACE: bool = false;

/// The maximum length of an Assuan line, including the terminating
/// line feed.
pub const MAX_LINE_LENGTH: usize = 1000;

/// One line received from the peer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Response {
    /// Success terminator, with an optional comment.
    Ok(Option<String>),
    /// Failure terminator.
    Error {
        /// The numeric error composite.
        code: u32,
        /// Optional human-readable text.
        message: Option<String>,
    },
    /// A status update.
    Status {
        /// The status keyword.
        keyword: String,
        /// Everything after the keyword.
        info: String,
    },
    /// A chunk of data; chunks concatenate.
    Data(Vec<u8>),
    /// The peer asks us to supply data.
    Inquire {
        /// The inquiry keyword.
        keyword: String,
        /// Everything after the keyword.
        params: String,
    },
    /// A comment line, to be ignored.
    Comment(String),
}

/// The client's answer to an inquiry.
pub enum Inquiry {
    /// Supply the given bytes.
    Provide(Vec<u8>),
    /// Refuse the inquiry.
    Cancel,
}

/// Percent-escapes `%`, CR, and LF, the characters that would break
/// the line framing.
pub fn escape(data: &[u8]) -> String {
    let mut out = Vec::with_capacity(data.len());
    escape_into(data, &mut out);
    String::from_utf8(out).expect("escaped data is ASCII")
}

/// Escapes into a caller-provided buffer, so that buffers holding
/// secrets can be wiped after the write.
fn escape_into(data: &[u8], out: &mut Vec<u8>) {
    const HEX: &[u8; 16] = b"0123456789ABCDEF";
    for &b in data {
        match b {
            b'%' | b'\r' | b'\n' => {
                out.push(b'%');
                out.push(HEX[(b >> 4) as usize]);
                out.push(HEX[(b & 0xf) as usize]);
            },
            b if b < 0x20 || b == 0x7f => {
                out.push(b'%');
                out.push(HEX[(b >> 4) as usize]);
                out.push(HEX[(b & 0xf) as usize]);
            },
            b => out.push(b),
        }
    }
}

/// Like [`escape`], but additionally encodes space as `+`, for
/// values embedded in command arguments.
pub fn escape_plus(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len());
    for &b in data {
        match b {
            b' ' => out.push('+'),
            b'+' => out.push_str("%2B"),
            b'%' => out.push_str("%25"),
            b'\r' => out.push_str("%0D"),
            b'\n' => out.push_str("%0A"),
            b if b < 0x20 || b == 0x7f =>
                out.push_str(&format!("%{:02X}", b)),
            b => out.push(b as char),
        }
    }
    out
}

/// Decodes percent escapes.  `%XX` becomes the byte `0xXX`; a bare
/// `%` not followed by two hex digits is a protocol violation.
pub fn unescape(s: &str) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(s.len());
    let mut bytes = s.bytes();
    while let Some(b) = bytes.next() {
        if b == b'%' {
            let hi = bytes.next();
            let lo = bytes.next();
            let decode = |b: Option<u8>| -> Option<u8> {
                (b? as char).to_digit(16).map(|d| d as u8)
            };
            match (decode(hi), decode(lo)) {
                (Some(hi), Some(lo)) => out.push(hi << 4 | lo),
                _ => return Err(Error::Protocol(
                    format!("Bare '%' in {:?}", s)).into()),
            }
        } else {
            out.push(b);
        }
    }
    Ok(out)
}

/// Like [`unescape`], but additionally decodes `+` as space.
pub fn unescape_plus(s: &str) -> Result<Vec<u8>> {
    unescape(&s.replace('+', " "))
}

/// A connection to an Assuan server.
///
/// The transport is any bidirectional byte stream; in production a
/// Unix domain socket, in the tests an in-memory pipe.  Reads are
/// buffered; writes go straight through.
pub struct Connection<S: Read + Write> {
    stream: BufReader<S>,
}

impl<S: Read + Write> Connection<S> {
    /// Creates a connection over the given stream.
    ///
    /// No greeting is consumed; the caller decides whether one is
    /// expected.
    pub fn new(stream: S) -> Self {
        Connection { stream: BufReader::new(stream) }
    }

    /// Sends a command line.
    pub fn send(&mut self, command: &str) -> Result<()> {
        tracer!(TRACE, "Connection::send");
        t!("-> {}", command);

        if command.contains(['\r', '\n']) {
            return Err(Error::Protocol(
                format!("Line break in command {:?}", command)).into());
        }
        if command.len() + 1 > MAX_LINE_LENGTH {
            return Err(Error::LineTooLong(command.len() + 1).into());
        }

        let w = self.stream.get_mut();
        w.write_all(command.as_bytes())?;
        w.write_all(b"\n")?;
        w.flush()?;
        Ok(())
    }

    /// Reads one line, tolerating CRLF, enforcing the length limit.
    fn read_line(&mut self) -> Result<String> {
        let mut line = String::new();
        let n = self.stream.read_line(&mut line)?;
        if n == 0 {
            return Err(Error::Protocol(
                "Connection closed by the agent".into()).into());
        }
        if n > MAX_LINE_LENGTH {
            return Err(Error::LineTooLong(n).into());
        }
        while line.ends_with('\n') || line.ends_with('\r') {
            line.pop();
        }
        Ok(line)
    }

    /// Reads and parses one response line.
    pub fn read_response(&mut self) -> Result<Response> {
        tracer!(TRACE, "Connection::read_response");

        let line = self.read_line()?;
        t!("<- {}", line);

        let (verb, rest) = match line.find(' ') {
            Some(pos) => (&line[..pos], &line[pos + 1..]),
            None => (&line[..], ""),
        };

        match verb {
            "OK" => Ok(Response::Ok(
                if rest.is_empty() { None } else { Some(rest.into()) })),
            "ERR" => {
                let (code, message) = match rest.find(' ') {
                    Some(pos) => (&rest[..pos], Some(rest[pos + 1..].into())),
                    None => (rest, None),
                };
                let code = code.parse::<u32>().map_err(|_| {
                    Error::Protocol(format!("Bad error code in {:?}", line))
                })?;
                Ok(Response::Error { code, message })
            },
            "S" => {
                let (keyword, info) = match rest.find(' ') {
                    Some(pos) => (&rest[..pos], &rest[pos + 1..]),
                    None => (rest, ""),
                };
                if keyword.is_empty() {
                    return Err(Error::Protocol(
                        "Status line without keyword".into()).into());
                }
                Ok(Response::Status {
                    keyword: keyword.into(),
                    info: info.into(),
                })
            },
            "D" => Ok(Response::Data(unescape(rest)?)),
            "INQUIRE" => {
                let (keyword, params) = match rest.find(' ') {
                    Some(pos) => (&rest[..pos], &rest[pos + 1..]),
                    None => (rest, ""),
                };
                if keyword.is_empty() {
                    return Err(Error::Protocol(
                        "Inquiry without keyword".into()).into());
                }
                Ok(Response::Inquire {
                    keyword: keyword.into(),
                    params: params.into(),
                })
            },
            "#" => Ok(Response::Comment(rest.into())),
            _ if verb.starts_with('#') =>
                Ok(Response::Comment(line[1..].into())),
            _ => Err(Error::Protocol(
                format!("Unexpected line {:?}", line)).into()),
        }
    }

    /// Sends a data payload as `D` lines followed by `END`.
    ///
    /// The payload may be a passphrase; the line buffer is wiped
    /// after each write.
    fn send_data(&mut self, data: &[u8]) -> Result<()> {
        // Leave room for "D ", the escape expansion, and the line
        // feed.
        const CHUNK: usize = (MAX_LINE_LENGTH - 3) / 3;
        for chunk in data.chunks(CHUNK) {
            let mut line = Vec::with_capacity(3 + chunk.len() * 3);
            line.extend_from_slice(b"D ");
            escape_into(chunk, &mut line);
            line.push(b'\n');

            let r = self.stream.get_mut().write_all(&line)
                .and_then(|_| self.stream.get_mut().flush());
            unsafe {
                memsec::memzero(line.as_mut_ptr(), line.len());
            }
            r?;
        }
        self.send("END")
    }

    /// Runs one transaction: sends `command`, then processes the
    /// response stream until the terminator.
    ///
    /// `on_data` receives each data chunk, `on_status` each status
    /// line, and `on_inquire` each inquiry.  Returns the comment of
    /// the `OK` line.  An `ERR` terminator is mapped through
    /// [`AgentError`].
    pub fn transact(&mut self,
                    command: &str,
                    on_data: &mut dyn FnMut(&[u8]),
                    on_status: &mut dyn FnMut(&str, &str),
                    on_inquire: &mut dyn FnMut(&str, &str)
                                              -> Result<Inquiry>)
                    -> Result<Option<String>>
    {
        self.send(command)?;

        loop {
            match self.read_response()? {
                Response::Data(d) => on_data(&d),
                Response::Status { keyword, info } =>
                    on_status(&keyword, &info),
                Response::Comment(_) => (),
                Response::Inquire { keyword, params } => {
                    match on_inquire(&keyword, &params)? {
                        Inquiry::Provide(data) => self.send_data(&data)?,
                        Inquiry::Cancel => self.send("CAN")?,
                    }
                },
                Response::Ok(comment) => return Ok(comment),
                Response::Error { code, message } =>
                    return Err(crate::Error::from_agent(
                        AgentError::new(code, message)).into()),
            }
        }
    }

    /// Runs a transaction that expects no data and no inquiries.
    pub fn transact_simple(&mut self, command: &str)
                           -> Result<Option<String>>
    {
        self.transact(command,
                      &mut |_| (),
                      &mut |_, _| (),
                      &mut |_, _| Ok(Inquiry::Cancel))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    #[test]
    fn escaping() {
        assert_eq!(escape(b"hello"), "hello");
        assert_eq!(escape(b"50%\n"), "50%25%0A");
        assert_eq!(unescape("50%25%0A").unwrap(), b"50%\n");
        assert_eq!(unescape("%00").unwrap(), vec![0u8]);
        assert!(unescape("100%").is_err());
        assert!(unescape("100%f").is_err());
    }

    #[test]
    fn plus_escaping() {
        assert_eq!(escape_plus(b"a key description"),
                   "a+key+description");
        assert_eq!(escape_plus(b"1+1"), "1%2B1");
        assert_eq!(unescape_plus("a+key").unwrap(), b"a key");
        assert_eq!(unescape_plus("1%2B1").unwrap(), b"1+1");
    }

    /// A fixed response stream; writes are collected.
    struct Script {
        input: VecDeque<u8>,
        output: Vec<u8>,
    }

    impl Script {
        fn new(input: &str) -> Self {
            Script {
                input: input.bytes().collect(),
                output: Vec::new(),
            }
        }
    }

    impl Read for Script {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            let n = std::cmp::min(buf.len(), self.input.len());
            for b in buf.iter_mut().take(n) {
                *b = self.input.pop_front().unwrap();
            }
            Ok(n)
        }
    }

    impl Write for Script {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.output.extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn response_parsing() {
        let script = "S KEY-CREATED-AT 1700000000\n\
                      D (public-key (rsa\n\
                      D  (n #00A1#)(e #010001#)))\n\
                      # ignore me\n\
                      OK\n";
        let mut conn = Connection::new(Script::new(script));

        let mut data = Vec::new();
        let mut statuses = Vec::new();
        let comment = conn.transact(
            "GENKEY",
            &mut |d| data.extend_from_slice(d),
            &mut |k, i| statuses.push((k.to_string(), i.to_string())),
            &mut |_, _| Ok(Inquiry::Cancel)).unwrap();

        assert_eq!(comment, None);
        // Status lines and terminators never leak into the data
        // payload.
        assert_eq!(data,
                   b"(public-key (rsa (n #00A1#)(e #010001#)))");
        assert_eq!(statuses,
                   vec![("KEY-CREATED-AT".to_string(),
                         "1700000000".to_string())]);
    }

    #[test]
    fn error_terminator() {
        let script = "ERR 67108963 Operation cancelled <GPG Agent>\n";
        let mut conn = Connection::new(Script::new(script));
        let err = conn.transact_simple("PKSIGN").unwrap_err();
        match err.downcast_ref::<Error>() {
            Some(Error::Canceled) => (),
            e => panic!("unexpected error {:?}", e),
        }
    }

    #[test]
    fn inquiry_flow() {
        let script = "INQUIRE KEYPARAM\nOK\n";
        let mut conn = Connection::new(Script::new(script));
        let mut asked = Vec::new();
        conn.transact(
            "GENKEY",
            &mut |_| (),
            &mut |_, _| (),
            &mut |k, _| {
                asked.push(k.to_string());
                Ok(Inquiry::Provide(b"(genkey)".to_vec()))
            }).unwrap();
        assert_eq!(asked, vec!["KEYPARAM"]);

        let written =
            String::from_utf8(conn.stream.into_inner().output).unwrap();
        assert_eq!(written, "GENKEY\nD (genkey)\nEND\n");
    }

    #[test]
    fn crlf_is_tolerated() {
        let script = "OK Pleased to meet you\r\n";
        let mut conn = Connection::new(Script::new(script));
        match conn.read_response().unwrap() {
            Response::Ok(Some(c)) => assert_eq!(c, "Pleased to meet you"),
            r => panic!("unexpected response {:?}", r),
        }
    }

    #[test]
    fn overlong_line_is_rejected() {
        let mut conn = Connection::new(Script::new(""));
        let long = "X".repeat(MAX_LINE_LENGTH);
        assert!(conn.send(&long).is_err());
    }
}
