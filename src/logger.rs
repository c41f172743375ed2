//! Buffered, tag-oriented front end over an event file.
//!
//! A [`SummaryLogger`] collects named values (scalars, images, histograms)
//! across a training step and writes them out as a single `Summary` event
//! when flushed. Sequences fan out to indexed tags (`tag/0`, `tag/1`, ...),
//! so a batch of per-head losses or sample images lands as sibling charts in
//! TensorBoard.

use std::path::Path;
use std::time::SystemTime;

use image::DynamicImage;

use crate::proto::tensorboard as pb;
use crate::summary::{self, SummaryError};
use crate::writer::EventFileWriter;

/// One loggable value, for use with [`SummaryLogger::add`].
pub enum SummaryValue {
    Scalar(f32),
    Scalars(Vec<f32>),
    Image(DynamicImage),
    Images(Vec<DynamicImage>),
    /// Pre-rendered PNG bytes, e.g. a plot rasterized by a charting library.
    Png(Vec<u8>),
}

pub struct SummaryLogger {
    writer: EventFileWriter,
    values: Vec<pb::summary::Value>,
}

impl SummaryLogger {
    /// Opens a logger writing into a fresh event file under `logdir`.
    pub fn create<P: AsRef<Path>>(logdir: P) -> Result<Self, SummaryError> {
        let writer = EventFileWriter::create(logdir)?;
        Ok(Self {
            writer,
            values: Vec::new(),
        })
    }

    /// Opens a logger for a named run, writing under `logdir/run_name`.
    /// Use one run per experiment variant, e.g. `train` and `eval`.
    pub fn create_named<P: AsRef<Path>>(logdir: P, run_name: &str) -> Result<Self, SummaryError> {
        Self::create(logdir.as_ref().join(run_name))
    }

    /// Path of the underlying event file.
    pub fn path(&self) -> &Path {
        self.writer.path()
    }

    /// Number of values buffered since the last flush.
    pub fn pending(&self) -> usize {
        self.values.len()
    }

    /// Buffers a single scalar under `tag`.
    pub fn add_scalar(&mut self, tag: &str, value: f32) {
        self.values.push(summary::scalar_value(tag, value));
    }

    /// Buffers a sequence of scalars under `tag/0`, `tag/1`, ...
    pub fn add_scalars(&mut self, tag: &str, values: &[f32]) {
        for (i, &value) in values.iter().enumerate() {
            self.add_scalar(&indexed(tag, i), value);
        }
    }

    /// PNG-encodes `image` and buffers it under `tag`.
    pub fn add_image(&mut self, tag: &str, image: &DynamicImage) -> Result<(), SummaryError> {
        let encoded = summary::encode_image(image)?;
        self.values.push(summary::image_value(tag, encoded));
        Ok(())
    }

    /// Buffers a sequence of images under `tag/0`, `tag/1`, ...
    ///
    /// If an encode fails partway, earlier images in the sequence stay
    /// buffered; the failing one buffers nothing.
    pub fn add_images(&mut self, tag: &str, images: &[DynamicImage]) -> Result<(), SummaryError> {
        for (i, image) in images.iter().enumerate() {
            self.add_image(&indexed(tag, i), image)?;
        }
        Ok(())
    }

    /// Buffers already-encoded PNG bytes under `tag`. The image dimensions
    /// are not recovered from the stream and are left unset.
    pub fn add_png(&mut self, tag: &str, png: Vec<u8>) {
        let mut encoded = pb::summary::Image::default();
        encoded.encoded_image_string = png;
        self.values.push(summary::image_value(tag, encoded));
    }

    /// Buffers a histogram of `values` with `bins` equal-width buckets.
    pub fn add_histogram(&mut self, tag: &str, bins: usize, values: &[f64]) {
        self.values.push(summary::histogram_value(tag, bins, values));
    }

    /// Buffers a batch of tagged values, dispatching on their kind.
    pub fn add<T, I>(&mut self, entries: I) -> Result<(), SummaryError>
    where
        T: AsRef<str>,
        I: IntoIterator<Item = (T, SummaryValue)>,
    {
        for (tag, value) in entries {
            let tag = tag.as_ref();
            match value {
                SummaryValue::Scalar(scalar) => self.add_scalar(tag, scalar),
                SummaryValue::Scalars(scalars) => self.add_scalars(tag, &scalars),
                SummaryValue::Image(image) => self.add_image(tag, &image)?,
                SummaryValue::Images(images) => self.add_images(tag, &images)?,
                SummaryValue::Png(png) => self.add_png(tag, png),
            }
        }
        Ok(())
    }

    /// Writes all buffered values as one summary event at `step`, stamped
    /// with the current wall time, and clears the buffer. An empty buffer
    /// still produces an (empty) summary event.
    pub fn flush(&mut self, step: i64) -> Result<(), SummaryError> {
        let summary = pb::Summary {
            value: std::mem::take(&mut self.values),
        };
        self.writer.write_summary(SystemTime::now(), step, summary)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Syncs the event file to disk. Call once at the end of a run.
    pub fn sync_all(&mut self) -> Result<(), SummaryError> {
        self.writer.sync_all()?;
        Ok(())
    }
}

fn indexed(tag: &str, i: usize) -> String {
    format!("{}/{}", tag, i)
}
