use std::io::{self, BufRead};

/// Line-oriented wrapper around the optional input bound to `READ`.
///
/// Holds whatever `BufRead` the caller supplies (an open file, or
/// `stdin().lock()`) behind a trait object so the interpreter doesn't care
/// which one it's reading from. Opening the underlying file and turning a
/// missing-file error into exit code 11 is the CLI's job, by the time an
/// `InputSource` exists, the stream is already open.
pub struct InputSource {
    reader: Option<Box<dyn BufRead>>,
}

impl InputSource {
    pub fn new(reader: Box<dyn BufRead>) -> InputSource {
        InputSource {
            reader: Some(reader),
        }
    }

    /// No input source bound at all (neither `--input` nor stdin available);
    /// every `READ` immediately behaves as EOF.
    pub fn none() -> InputSource {
        InputSource { reader: None }
    }

    /// Reads one line, stripping a single trailing `\n` (and a preceding
    /// `\r`, for inputs with CRLF line endings). Returns `None` on EOF.
    pub fn read_line(&mut self) -> io::Result<Option<String>> {
        let reader = match &mut self.reader {
            Some(r) => r,
            None => return Ok(None),
        };

        let mut line = String::new();
        let bytes_read = reader.read_line(&mut line)?;
        if bytes_read == 0 {
            return Ok(None);
        }
        if line.ends_with('\n') {
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
        }
        Ok(Some(line))
    }
}
