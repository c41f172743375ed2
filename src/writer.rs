use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use prost::Message;

use crate::proto::tensorboard as pb;
use crate::tf_record::TfRecord;

pub struct TensorboardWriter<W> {
    writer: W,
}

impl<W> TensorboardWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

fn time_f64(time: SystemTime) -> std::io::Result<f64> {
    Ok(time
        .duration_since(std::time::UNIX_EPOCH)
        .map_err(io::Error::other)?
        .as_secs_f64())
}

impl<W: Write> TensorboardWriter<W> {
    /// Writes a raw TFRecord to the output stream. You may find it more convenient to use
    /// [`write_event`][Self::write_event] instead, which computes the record checksum for you.
    pub fn write_record(&mut self, record: &TfRecord) -> io::Result<()> {
        record.write(&mut self.writer)
    }

    /// Writes an `Event` to the output stream.
    pub fn write_event(&mut self, event: &pb::Event) -> io::Result<()> {
        let data = event.encode_to_vec();
        let record = TfRecord::from_data(data);
        self.write_record(&record)
    }

    /// Writes a file version header event. This reads the current system time.
    pub fn write_file_version(&mut self) -> io::Result<()> {
        const FILE_VERSION: &str = "brain.Event:2";
        const WRITER: &str = "rust:tensorboard-summary";

        let mut event = pb::Event::default();
        event.wall_time = time_f64(SystemTime::now())?;
        event.what = Some(pb::event::What::FileVersion(FILE_VERSION.to_string()));
        let mut source_metadata = pb::SourceMetadata::default();
        source_metadata.writer = WRITER.to_string();
        event.source_metadata = Some(source_metadata);
        self.write_event(&event)
    }

    /// Writes a summary to the output stream, wrapped in an `Event` with the given step and wall
    /// time.
    pub fn write_summary(
        &mut self,
        wall_time: SystemTime,
        step: i64,
        summary: pb::Summary,
    ) -> io::Result<()> {
        let mut event = pb::Event::default();
        event.wall_time = time_f64(wall_time)?;
        event.step = step;
        event.what = Some(pb::event::What::Summary(summary));
        self.write_event(&event)
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

/// A [`TensorboardWriter`] over an event file on disk.
///
/// Creating one creates the log directory, opens a fresh event file named so
/// that TensorBoard will discover it (`events.out.tfevents.<time>.<host>`),
/// and writes the file version header.
pub struct EventFileWriter {
    writer: TensorboardWriter<BufWriter<File>>,
    path: PathBuf,
}

impl EventFileWriter {
    /// Opens a new event file in `logdir`, creating the directory if needed.
    pub fn create<P: AsRef<Path>>(logdir: P) -> io::Result<Self> {
        let logdir = logdir.as_ref();
        std::fs::create_dir_all(logdir)?;
        let secs = SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map_err(io::Error::other)?
            .as_secs();
        let path = logdir.join(format!("events.out.tfevents.{}.{}", secs, host_name()));
        let file = File::create(&path)?;
        let mut writer = TensorboardWriter::new(BufWriter::new(file));
        writer.write_file_version()?;
        Ok(Self { writer, path })
    }

    /// Path of the event file being written.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write_summary(
        &mut self,
        wall_time: SystemTime,
        step: i64,
        summary: pb::Summary,
    ) -> io::Result<()> {
        self.writer.write_summary(wall_time, step, summary)
    }

    /// Flushes buffered records to the operating system.
    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    /// Flushes and syncs the event file all the way to disk.
    pub fn sync_all(&mut self) -> io::Result<()> {
        self.writer.flush()?;
        self.writer.writer.get_ref().sync_all()
    }
}

fn host_name() -> String {
    match hostname::get() {
        Ok(name) => name.to_string_lossy().into_owned(),
        Err(_) => "localhost".to_string(),
    }
}
