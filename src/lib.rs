pub mod proto {
    pub mod tensorboard {
        include!("tensorboard.pb.rs");
    }
}

pub mod logger;
pub mod masked_crc;
pub mod summary;
pub mod tf_record;
pub mod writer;

pub use logger::{SummaryLogger, SummaryValue};
