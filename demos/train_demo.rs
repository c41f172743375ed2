use rand::prelude::*;

use tensorboard_summary::{SummaryLogger, SummaryValue};

fn main() -> Result<(), tensorboard_summary::summary::SummaryError> {
    let logdir = std::env::args_os().nth(1).unwrap_or_else(|| {
        eprintln!("fatal: specify LOGDIR as first argument");
        std::process::exit(1);
    });

    let mut logger = SummaryLogger::create_named(logdir, "train")?;

    const STEPS: usize = 50;
    const NUM_HISTOGRAM_BINS: usize = 30;
    for step in 0..STEPS {
        // get your values from somewhere... here, we just make them up
        let loss: f32 = 10.0 / (step + 1) as f32;
        let head_losses: [f32; 4] = std::array::from_fn(|i| loss / (i + 1) as f32);
        let weights_layer1: [f64; 10000] = normal(step as f64, 10.0 / (step as f64 + 1.0).sqrt());

        logger.add(vec![
            ("loss", SummaryValue::Scalar(loss)),
            ("loss_per_head", SummaryValue::Scalars(head_losses.to_vec())),
        ])?;
        logger.add_histogram("weights/layer1", NUM_HISTOGRAM_BINS, &weights_layer1);
        if step % 10 == 0 {
            logger.add_image(&format!("sample/{}", step), &noise_image(64, 64))?;
        }
        logger.flush(step as i64)?;
    }

    // Make sure everything lands on disk without error.
    logger.sync_all()?;

    println!(
        "wrote event file {} with {} steps",
        logger.path().display(),
        STEPS
    );

    Ok(())
}

fn normal<const N: usize>(mu: f64, sigma: f64) -> [f64; N] {
    let mut rng = rand::thread_rng();
    let dist = rand_distr::Normal::new(mu, sigma).unwrap();
    std::array::from_fn(|_| dist.sample(&mut rng))
}

fn noise_image(width: u32, height: u32) -> image::DynamicImage {
    let mut rng = rand::thread_rng();
    let buf = image::RgbImage::from_fn(width, height, |_, _| image::Rgb(rng.gen()));
    image::DynamicImage::ImageRgb8(buf)
}
