use std::io::{self, Write};

/// Sink for named scalar values keyed by step.
pub trait ScalarWriter {
    fn add_scalar(&mut self, tag: &str, value: f64, step: usize) -> io::Result<()>;

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Writes `tag,step,value` rows.
pub struct CsvScalarWriter<W: Write> {
    writer: W,
}

impl<W: Write> CsvScalarWriter<W> {
    pub fn new(mut writer: W) -> io::Result<Self> {
        writeln!(writer, "tag,step,value")?;
        Ok(Self { writer })
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ScalarWriter for CsvScalarWriter<W> {
    fn add_scalar(&mut self, tag: &str, value: f64, step: usize) -> io::Result<()> {
        writeln!(self.writer, "{},{},{}", tag, step, value)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

/// Sends scalars to the debug log.
#[derive(Default)]
pub struct LogScalarWriter;

impl ScalarWriter for LogScalarWriter {
    fn add_scalar(&mut self, tag: &str, value: f64, step: usize) -> io::Result<()> {
        log::debug!("[{}] {} = {:.6}", step, tag, value);
        Ok(())
    }
}

/// Keeps every scalar in memory.
#[derive(Debug, Default, Clone)]
pub struct ScalarLog {
    entries: Vec<(String, usize, f64)>,
}

impl ScalarLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(step, value)` pairs recorded under `tag`, in insertion order.
    pub fn series(&self, tag: &str) -> Vec<(usize, f64)> {
        self.entries
            .iter()
            .filter(|(t, _, _)| t == tag)
            .map(|&(_, step, value)| (step, value))
            .collect()
    }
}

impl ScalarWriter for ScalarLog {
    fn add_scalar(&mut self, tag: &str, value: f64, step: usize) -> io::Result<()> {
        self.entries.push((tag.to_string(), step, value));
        Ok(())
    }
}

/// Fans every scalar out to both writers.
impl<A: ScalarWriter, B: ScalarWriter> ScalarWriter for (A, B) {
    fn add_scalar(&mut self, tag: &str, value: f64, step: usize) -> io::Result<()> {
        self.0.add_scalar(tag, value, step)?;
        self.1.add_scalar(tag, value, step)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.flush()?;
        self.1.flush()
    }
}
