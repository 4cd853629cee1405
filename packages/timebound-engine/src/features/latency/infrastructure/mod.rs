pub mod msp430;

pub use msp430::Msp430Latency;
