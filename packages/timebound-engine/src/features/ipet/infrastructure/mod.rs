pub mod encoder;
pub mod lp_writer;

pub use encoder::IpetEncoder;
pub use lp_writer::write_lp;
