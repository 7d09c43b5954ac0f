use std::cell::RefCell;
use std::io::{BufRead, Cursor, Read, Result as IoResult, Write};
use std::rc::Rc;

struct Sinks {
    out: Box<dyn Write>,
    err: Box<dyn Write>,
}

/// Shared handle to the shell's normal and error output channels.
///
/// Cloning is cheap and every clone writes to the same place, so modules keep
/// a clone inside their command and hook closures. [`Output::redirect`] swaps
/// the underlying writers for all clones at once.
#[derive(Clone)]
pub struct Output {
    sinks: Rc<RefCell<Sinks>>,
}

impl Output {
    /// Create an output writing to the given streams.
    pub fn new(out: impl Write + 'static, err: impl Write + 'static) -> Self {
        Self {
            sinks: Rc::new(RefCell::new(Sinks {
                out: Box::new(out),
                err: Box::new(err),
            })),
        }
    }

    /// Output bound to the process' standard output and standard error.
    pub fn stdio() -> Self {
        Self::new(std::io::stdout(), std::io::stderr())
    }

    /// Output collected in memory, plus a handle to read it back.
    pub fn capture() -> (Self, Captured) {
        let (out, out_rc) = MemWriter::with_handle();
        let (err, err_rc) = MemWriter::with_handle();
        (
            Self::new(out, err),
            Captured {
                out: out_rc,
                err: err_rc,
            },
        )
    }

    /// Replace the writers behind this handle and all of its clones.
    pub fn redirect(&self, out: impl Write + 'static, err: impl Write + 'static) {
        let mut sinks = self.sinks.borrow_mut();
        sinks.out = Box::new(out);
        sinks.err = Box::new(err);
    }

    /// Write to the normal output channel and flush.
    pub fn wout(&self, data: &str) -> IoResult<()> {
        let mut sinks = self.sinks.borrow_mut();
        sinks.out.write_all(data.as_bytes())?;
        sinks.out.flush()
    }

    /// Write to the error output channel and flush.
    pub fn werr(&self, data: &str) -> IoResult<()> {
        let mut sinks = self.sinks.borrow_mut();
        sinks.err.write_all(data.as_bytes())?;
        sinks.err.flush()
    }
}

impl Default for Output {
    fn default() -> Self {
        Self::stdio()
    }
}

/// Read side of [`Output::capture`].
#[derive(Clone)]
pub struct Captured {
    out: Rc<RefCell<Vec<u8>>>,
    err: Rc<RefCell<Vec<u8>>>,
}

impl Captured {
    /// Everything written to the normal channel so far.
    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.out.borrow()).into_owned()
    }

    /// Everything written to the error channel so far.
    pub fn stderr(&self) -> String {
        String::from_utf8_lossy(&self.err.borrow()).into_owned()
    }

    /// Forget everything captured so far.
    pub fn clear(&self) {
        self.out.borrow_mut().clear();
        self.err.borrow_mut().clear();
    }
}

/// Memory-backed reader, handy for feeding scripted input to a shell.
pub struct MemReader {
    cursor: Cursor<Vec<u8>>,
}

impl MemReader {
    /// Create a MemReader that will read from the provided buffer.
    pub fn new(buf: Vec<u8>) -> Self {
        Self {
            cursor: Cursor::new(buf),
        }
    }

    /// Convenience: one input line per element.
    pub fn from_lines(lines: &[&str]) -> Self {
        let mut buf = String::new();
        for line in lines {
            buf.push_str(line);
            buf.push('\n');
        }
        Self::new(buf.into_bytes())
    }
}

impl Read for MemReader {
    fn read(&mut self, out: &mut [u8]) -> IoResult<usize> {
        self.cursor.read(out)
    }
}

impl BufRead for MemReader {
    fn fill_buf(&mut self) -> IoResult<&[u8]> {
        self.cursor.fill_buf()
    }

    fn consume(&mut self, amt: usize) {
        self.cursor.consume(amt)
    }
}

/// Memory-backed writer for capturing output.
pub struct MemWriter {
    buf: Rc<RefCell<Vec<u8>>>,
}

impl MemWriter {
    /// Public constructor.
    pub fn new() -> Self {
        Self {
            buf: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Convenience: create writer and return (writer, rc_handle).
    pub fn with_handle() -> (Self, Rc<RefCell<Vec<u8>>>) {
        let mw = MemWriter::new();
        let rc = mw.buf.clone();
        (mw, rc)
    }
}

impl Default for MemWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl Write for MemWriter {
    fn write(&mut self, data: &[u8]) -> IoResult<usize> {
        self.buf.borrow_mut().extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> IoResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captured_output_is_shared_by_clones() {
        let (output, captured) = Output::capture();
        let clone = output.clone();
        output.wout("one ").unwrap();
        clone.wout("two").unwrap();
        clone.werr("oops").unwrap();
        assert_eq!(captured.stdout(), "one two");
        assert_eq!(captured.stderr(), "oops");
        captured.clear();
        assert_eq!(captured.stdout(), "");
    }

    #[test]
    fn redirect_affects_all_clones() {
        let (output, first) = Output::capture();
        let clone = output.clone();
        let (out, out_rc) = MemWriter::with_handle();
        output.redirect(out, MemWriter::new());
        clone.wout("moved").unwrap();
        assert_eq!(first.stdout(), "");
        assert_eq!(&*out_rc.borrow(), b"moved");
    }

    #[test]
    fn mem_reader_lines() {
        let reader = MemReader::from_lines(&["a", "b c"]);
        let lines: Vec<String> = reader.lines().map(|l| l.unwrap()).collect();
        assert_eq!(lines, vec!["a", "b c"]);
    }
}
