use image::{ColorType, DynamicImage, GenericImageView};

use super::proto::tensorboard as pb;
use pb::summary::value::Value as InnerValue;

/// Error from constructing a summary value.
#[derive(Debug, thiserror::Error)]
pub enum SummaryError {
    #[error("failed to encode image: {0}")]
    Image(#[from] image::ImageError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Builds a `Summary` proto from a sequence of tagged values.
#[derive(Default)]
pub struct SummaryBuilder {
    summary: pb::Summary,
}

impl SummaryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn build(self) -> pb::Summary {
        self.summary
    }

    pub fn value(mut self, value: pb::summary::Value) -> Self {
        self.summary.value.push(value);
        self
    }

    pub fn scalar(self, tag: &str, scalar: f32) -> Self {
        self.value(scalar_value(tag, scalar))
    }

    pub fn image(self, tag: &str, image: pb::summary::Image) -> Self {
        self.value(image_value(tag, image))
    }

    pub fn histogram(self, tag: &str, bins: usize, values: &[f64]) -> Self {
        self.value(histogram_value(tag, bins, values))
    }
}

fn tag_and_inner_value(tag: &str, inner: InnerValue) -> pb::summary::Value {
    let mut outer = pb::summary::Value::default();
    outer.tag = tag.to_string();
    outer.value = Some(inner);
    outer
}

/// A scalar time series point, shown by TensorBoard's scalars dashboard.
pub fn scalar_value(tag: &str, scalar: f32) -> pb::summary::Value {
    tag_and_inner_value(tag, InnerValue::SimpleValue(scalar))
}

/// An already-encoded image, shown by TensorBoard's images dashboard.
pub fn image_value(tag: &str, image: pb::summary::Image) -> pb::summary::Value {
    tag_and_inner_value(tag, InnerValue::Image(image))
}

/// Buckets `values` into `bins` equal-width buckets spanning their range.
pub fn histogram_value(tag: &str, bins: usize, values: &[f64]) -> pb::summary::Value {
    let mut histo = pb::HistogramProto::default();
    if !values.is_empty() && bins > 0 {
        histo.min = values.iter().copied().min_by(f64::total_cmp).unwrap();
        histo.max = values.iter().copied().max_by(f64::total_cmp).unwrap();
        // `bucket` has the counts in each bucket
        histo.bucket = vec![0.0; bins];
        // `bucket_limit` has the right edge of each bucket
        histo.bucket_limit = Vec::with_capacity(bins);
        let bucket_width = (histo.max - histo.min) / bins as f64;
        for i in 0..bins {
            histo
                .bucket_limit
                .push(histo.min + (i + 1) as f64 * bucket_width);
        }
        for &z in values {
            let idx = f64::floor((z - histo.min) / bucket_width);
            // Clamp in case of any floating point weirdness.
            let idx = idx.clamp(0.0, (bins - 1) as f64);
            histo.bucket[idx as usize] += 1.0;
        }
        histo.num = values.len() as f64;
        histo.sum = values.iter().sum();
        histo.sum_squares = values.iter().map(|z| z * z).sum();
    }
    tag_and_inner_value(tag, InnerValue::Histo(histo))
}

/// Encodes a raster image as PNG and wraps it in an image proto, recording
/// its dimensions and TensorBoard colorspace code.
pub fn encode_image(image: &DynamicImage) -> Result<pb::summary::Image, SummaryError> {
    let mut png = Vec::new();
    image.write_to(&mut png, image::ImageOutputFormat::Png)?;
    let mut proto = pb::summary::Image::default();
    proto.height = image.height() as i32;
    proto.width = image.width() as i32;
    proto.colorspace = colorspace(image.color());
    proto.encoded_image_string = png;
    Ok(proto)
}

fn colorspace(color: ColorType) -> i32 {
    match color {
        ColorType::L8 | ColorType::L16 => 1,
        ColorType::La8 | ColorType::La16 => 2,
        ColorType::Rgb8 | ColorType::Rgb16 | ColorType::Bgr8 => 3,
        ColorType::Rgba8 | ColorType::Rgba16 => 4,
        ColorType::Bgra8 => 6,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_value() {
        let value = scalar_value("loss", 0.25);
        assert_eq!(value.tag, "loss");
        assert_eq!(value.value, Some(InnerValue::SimpleValue(0.25)));
    }

    #[test]
    fn test_builder_preserves_order() {
        let summary = SummaryBuilder::new()
            .scalar("loss", 1.0)
            .scalar("accuracy", 0.5)
            .build();
        let tags: Vec<&str> = summary.value.iter().map(|v| v.tag.as_str()).collect();
        assert_eq!(tags, vec!["loss", "accuracy"]);
    }

    #[test]
    fn test_histogram_buckets() {
        let values = [0.0, 0.1, 0.9, 1.0, 1.0];
        let value = histogram_value("weights", 2, &values);
        let histo = match value.value {
            Some(InnerValue::Histo(h)) => h,
            other => panic!("expected histogram, got {:?}", other),
        };
        assert_eq!(histo.min, 0.0);
        assert_eq!(histo.max, 1.0);
        assert_eq!(histo.bucket_limit, vec![0.5, 1.0]);
        // Max values clamp into the last bucket.
        assert_eq!(histo.bucket, vec![2.0, 3.0]);
        assert_eq!(histo.num, 5.0);
    }

    #[test]
    fn test_histogram_empty_input() {
        let value = histogram_value("weights", 10, &[]);
        let histo = match value.value {
            Some(InnerValue::Histo(h)) => h,
            other => panic!("expected histogram, got {:?}", other),
        };
        assert!(histo.bucket.is_empty());
        assert!(histo.bucket_limit.is_empty());
    }

    #[test]
    fn test_histogram_constant_input() {
        // Zero-width buckets must not panic or index out of bounds.
        let value = histogram_value("weights", 4, &[3.0, 3.0, 3.0]);
        let histo = match value.value {
            Some(InnerValue::Histo(h)) => h,
            other => panic!("expected histogram, got {:?}", other),
        };
        assert_eq!(histo.bucket.iter().sum::<f64>(), 3.0);
    }

    #[test]
    fn test_encode_image_rgb() {
        let mut rgb = image::RgbImage::new(3, 2);
        rgb.put_pixel(0, 0, image::Rgb([255, 0, 0]));
        let proto = encode_image(&DynamicImage::ImageRgb8(rgb)).unwrap();
        assert_eq!(proto.width, 3);
        assert_eq!(proto.height, 2);
        assert_eq!(proto.colorspace, 3);
        // PNG magic number.
        assert_eq!(&proto.encoded_image_string[..4], b"\x89PNG");
    }

    #[test]
    fn test_encode_image_grayscale() {
        let gray = image::GrayImage::new(4, 4);
        let proto = encode_image(&DynamicImage::ImageLuma8(gray)).unwrap();
        assert_eq!(proto.colorspace, 1);
    }
}
